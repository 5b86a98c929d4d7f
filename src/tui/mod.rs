mod dashboard;
mod environment;
mod layout;
mod packages;
mod plot;
pub mod state;
mod theme;

use crate::bridge::RuntimeHandle;
use crate::config::Config;
use crate::host::HostRuntime;
use crate::packages::{PackageLister, Runtimes};
use crate::runtime::Runtime;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use state::{App, AppEvent, AppMode};
use std::io;
use tokio::sync::mpsc;

pub async fn run(config: Config) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    let (tx, mut rx) = mpsc::channel(32);

    // 探测 R / Python，整个进程只做一次
    let tx_clone = tx.clone();
    let python_config = app.config.python.clone();
    let r_config = app.config.r.clone();
    let packages_config = app.config.packages.clone();
    tokio::spawn(async move {
        let runtimes = tokio::task::spawn_blocking(move || Runtimes {
            host: HostRuntime::detect(&r_config),
            python: RuntimeHandle::initialize(&python_config),
        })
        .await
        .unwrap_or_else(|e| {
            log::error!("运行时探测任务异常退出: {}", e);
            Runtimes {
                host: HostRuntime::unavailable(),
                python: RuntimeHandle::unavailable(),
            }
        });
        let lister = PackageLister::new(runtimes, &packages_config);
        let _ = tx_clone.send(AppEvent::RuntimesReady(lister)).await;
    });

    // 主循环
    let result = event_loop(&mut terminal, &mut app, &tx, &mut rx).await;

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // 处理按键
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let term_size = terminal.size()?;
                handle_key(key, app, tx, term_size.height);
            }
        }

        // 处理异步事件
        while let Ok(event) = rx.try_recv() {
            handle_event(event, app, tx);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(key: KeyEvent, app: &mut App, tx: &mpsc::Sender<AppEvent>, term_height: u16) {
    match key.code {
        // q 仅在 Dashboard 退出
        KeyCode::Char('q') if app.mode == AppMode::Dashboard => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        // 视图切换快捷键 (Shift + 字母)
        KeyCode::Char('R') => enter_mode(app, AppMode::RPackages, tx),
        KeyCode::Char('P') => enter_mode(app, AppMode::PythonPackages, tx),
        KeyCode::Char('E') => enter_mode(app, AppMode::Environment, tx),
        KeyCode::Char('G') => enter_mode(app, AppMode::Plot, tx),
        // 委托给当前视图处理
        _ => {
            match app.mode {
                AppMode::Dashboard => {}
                AppMode::RPackages => {
                    packages::handle_packages_key(key, app, Runtime::R, tx);
                }
                AppMode::PythonPackages => {
                    packages::handle_packages_key(key, app, Runtime::Python, tx);
                }
                AppMode::Environment => {
                    environment::handle_environment_key(key, app, tx, term_height);
                }
                AppMode::Plot => {
                    plot::handle_plot_key(key, app, tx);
                }
            }
        }
    }
}

/// 切换视图，并重新查询该视图的数据
fn enter_mode(app: &mut App, mode: AppMode, tx: &mpsc::Sender<AppEvent>) {
    app.mode = mode;
    load_current_view(app, tx);
}

fn load_current_view(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    match app.mode {
        AppMode::Dashboard => {}
        AppMode::RPackages => packages::spawn_listing(app, Runtime::R, tx),
        AppMode::PythonPackages => packages::spawn_listing(app, Runtime::Python, tx),
        AppMode::Environment => {
            app.environment.scroll = 0;
            environment::spawn_environment(app, tx);
        }
        AppMode::Plot => plot::spawn_dataset(app, tx),
    }
}

fn handle_event(event: AppEvent, app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::RuntimesReady(lister) => {
            app.lister = Some(lister);
            // 探测期间已进入的视图，此时补发查询
            if app.mode != AppMode::Dashboard {
                load_current_view(app, tx);
            }
        }
        AppEvent::ListingLoaded {
            runtime,
            result,
            seq,
        } => {
            packages::handle_listing_loaded(app, runtime, result, seq);
        }
        AppEvent::MetadataLoaded { name, result } => {
            packages::handle_metadata_loaded(app, name, result);
        }
        AppEvent::EnvironmentLoaded { report, seq } => {
            if seq == app.environment.seq {
                app.environment.report = Some(report);
                app.environment.loading = false;
            }
        }
        AppEvent::DatasetReady { result, seq } => {
            if seq == app.plot.seq {
                if let Err(e) = &result {
                    log::warn!("散点数据生成失败 [{}]: {}", e.kind(), e);
                }
                app.plot.result = Some(result);
                app.plot.loading = false;
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    match app.mode {
        AppMode::Dashboard => dashboard::render_dashboard(f, app),
        AppMode::RPackages => packages::render_packages(f, app, Runtime::R),
        AppMode::PythonPackages => packages::render_packages(f, app, Runtime::Python),
        AppMode::Environment => environment::render_environment(f, app),
        AppMode::Plot => plot::render_plot(f, app),
    }
}
