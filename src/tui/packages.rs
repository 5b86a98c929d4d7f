use super::layout;
use super::state::{App, AppEvent, AppMode, DetailState};
use super::theme::{ACCENT, BRIGHT_WHITE, DIM, SEL_BG, WARN};
use crate::packages::package_metadata;
use crate::runtime::Runtime;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

/// 后台执行一次列表查询；每次进入视图或刷新都会重新查询
pub fn spawn_listing(app: &mut App, runtime: Runtime, tx: &mpsc::Sender<AppEvent>) {
    let query = app.query(runtime);
    let lister = app.lister.clone();
    let view = app.view_mut(runtime);
    view.loading = true;
    view.detail = None;
    view.seq += 1;
    let seq = view.seq;

    // 运行时尚未就绪时，RuntimesReady 事件到达后会重新触发
    let Some(lister) = lister else { return };

    let tx = tx.clone();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || lister.list(&query)).await;
        match result {
            Ok(result) => {
                let _ = tx
                    .send(AppEvent::ListingLoaded {
                        runtime,
                        result,
                        seq,
                    })
                    .await;
            }
            Err(e) => log::error!("包列表任务异常退出: {}", e),
        }
    });
}

fn spawn_metadata(app: &mut App, name: String, tx: &mpsc::Sender<AppEvent>) {
    let Some(lister) = app.lister.clone() else { return };
    app.python_view.detail = Some(DetailState {
        name: name.clone(),
        fields: None,
    });

    let tx = tx.clone();
    tokio::spawn(async move {
        let handle = lister.runtimes().python.clone();
        let lookup = name.clone();
        let result = tokio::task::spawn_blocking(move || package_metadata(&handle, &lookup)).await;
        match result {
            Ok(result) => {
                let _ = tx.send(AppEvent::MetadataLoaded { name, result }).await;
            }
            Err(e) => log::error!("元数据任务异常退出: {}", e),
        }
    });
}

/// 处理列表查询结果，过期序号直接丢弃
pub fn handle_listing_loaded(
    app: &mut App,
    runtime: Runtime,
    result: crate::packages::ListingResult,
    seq: u64,
) {
    let view = app.view_mut(runtime);
    if seq != view.seq {
        return;
    }
    view.result = Some(result);
    view.loading = false;
    view.refreshed_at = Some(Local::now());
    view.selected = view.selected.min(view.last_selectable());
}

pub fn handle_metadata_loaded(
    app: &mut App,
    name: String,
    result: Result<Vec<(String, String)>, crate::error::RuntimeError>,
) {
    if let Some(detail) = app.python_view.detail.as_mut() {
        if detail.name == name {
            detail.fields = Some(result);
        }
    }
}

/// 处理包列表视图按键
pub fn handle_packages_key(
    key: KeyEvent,
    app: &mut App,
    runtime: Runtime,
    tx: &mpsc::Sender<AppEvent>,
) -> bool {
    match key.code {
        KeyCode::Esc => {
            if app.view(runtime).detail.is_some() {
                app.view_mut(runtime).detail = None;
            } else {
                app.mode = AppMode::Dashboard;
            }
            true
        }
        KeyCode::Up => {
            app.view_mut(runtime).select_prev();
            true
        }
        KeyCode::Down => {
            app.view_mut(runtime).select_next();
            true
        }
        KeyCode::Char('a') => {
            app.show_all = !app.show_all;
            app.view_mut(runtime).selected = 0;
            spawn_listing(app, runtime, tx);
            true
        }
        KeyCode::Char('r') => {
            spawn_listing(app, runtime, tx);
            true
        }
        KeyCode::Enter if runtime == Runtime::Python => {
            if let Some(name) = app.python_view.selected_package().map(str::to_string) {
                spawn_metadata(app, name, tx);
            }
            true
        }
        _ => false,
    }
}

pub fn render_packages(f: &mut Frame, app: &App, runtime: Runtime) {
    let chunks = layout::main_layout(f.area());
    let view = app.view(runtime);
    let scope = if app.show_all { "all" } else { "default subset" };
    layout::render_header(f, &format!("{} Packages ({})", runtime, scope), chunks[0]);

    let body = if view.detail.is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1])
            .to_vec()
    } else {
        vec![chunks[1]]
    };

    render_list(f, app, runtime, body[0]);
    if let (Some(detail), Some(area)) = (&view.detail, body.get(1)) {
        render_detail(f, detail, *area);
    }

    let mut footer = String::from("↑↓ select  a show all  r refresh");
    if runtime == Runtime::Python {
        footer.push_str("  Enter details");
    }
    footer.push_str("  Esc back");
    if view.loading {
        footer.push_str("  │ loading...");
    } else if let Some(at) = view.refreshed_at {
        footer.push_str(&format!("  │ refreshed {}", at.format("%H:%M:%S")));
    }
    layout::render_footer(f, &footer, chunks[2]);
}

fn render_list(f: &mut Frame, app: &App, runtime: Runtime, area: Rect) {
    let view = app.view(runtime);
    let is_placeholder = matches!(view.result, Some(Err(_)));
    let record_count = match &view.result {
        Some(Ok(listing)) => listing.records.len(),
        _ => 0,
    };

    let lines: Vec<Line<'static>> = if view.result.is_none() {
        vec![Line::from(Span::styled(
            "Querying installed packages...",
            Style::default().fg(DIM),
        ))]
    } else if matches!(&view.result, Some(Ok(listing)) if listing.records.is_empty()) {
        let hint = if app.show_all {
            "No matching packages"
        } else {
            "No matching packages (press a to show all)"
        };
        vec![Line::from(Span::styled(hint, Style::default().fg(DIM)))]
    } else {
        view.lines()
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if is_placeholder {
                    Style::default().fg(WARN)
                } else if i >= record_count {
                    // 截断提示行
                    Style::default().fg(DIM).add_modifier(Modifier::ITALIC)
                } else if i == view.selected {
                    Style::default()
                        .fg(BRIGHT_WHITE)
                        .bg(SEL_BG)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(BRIGHT_WHITE)
                };
                Line::from(Span::styled(text, style))
            })
            .collect()
    };

    let visible = area.height.saturating_sub(2) as usize;
    let scroll = layout::scroll_for_selection(view.selected, visible);
    layout::render_scrollable_lines(f, &format!("{} packages", runtime), lines, scroll, area);
}

fn render_detail(f: &mut Frame, detail: &DetailState, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", detail.name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let lines: Vec<Line> = match &detail.fields {
        None => vec![Line::from(Span::styled("Loading metadata...", Style::default().fg(DIM)))],
        Some(Err(e)) => vec![Line::from(Span::styled(e.to_string(), Style::default().fg(WARN)))],
        Some(Ok(fields)) => fields
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(
                        format!("{key}: "),
                        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(value.clone(), Style::default().fg(BRIGHT_WHITE)),
                ])
            })
            .collect(),
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
