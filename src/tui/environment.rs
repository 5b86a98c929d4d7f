use super::layout;
use super::state::{App, AppEvent, AppMode};
use crate::sysinfo::EnvironmentReport;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    Frame,
};
use tokio::sync::mpsc;

use super::theme::{ACCENT, BRIGHT_WHITE, WARN};

pub fn spawn_environment(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    app.environment.loading = true;
    app.environment.seq += 1;
    let seq = app.environment.seq;
    let Some(lister) = app.lister.clone() else { return };

    let tx = tx.clone();
    tokio::spawn(async move {
        let report =
            tokio::task::spawn_blocking(move || EnvironmentReport::collect(lister.runtimes())).await;
        match report {
            Ok(report) => {
                let _ = tx.send(AppEvent::EnvironmentLoaded { report, seq }).await;
            }
            Err(e) => log::error!("环境信息任务异常退出: {}", e),
        }
    });
}

pub fn handle_environment_key(
    key: KeyEvent,
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    term_height: u16,
) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Dashboard;
            true
        }
        KeyCode::Up => {
            app.environment.scroll = app.environment.scroll.saturating_sub(1);
            true
        }
        KeyCode::Down => {
            let total = app
                .environment
                .report
                .as_ref()
                .map(|r| r.lines().len())
                .unwrap_or(0);
            let visible = layout::visible_content_height(term_height);
            app.environment.scroll =
                layout::clamp_scroll(app.environment.scroll + 1, total, visible);
            true
        }
        KeyCode::Char('r') => {
            spawn_environment(app, tx);
            true
        }
        _ => false,
    }
}

pub fn render_environment(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());
    layout::render_header(f, "Environment", chunks[0]);

    let lines: Vec<Line<'static>> = match &app.environment.report {
        None => vec![Line::from("Probing runtimes...")],
        Some(report) => report.lines().into_iter().map(style_line).collect(),
    };
    layout::render_scrollable_lines(f, "Diagnostics", lines, app.environment.scroll, chunks[1]);

    let status = if app.environment.loading { "  │ probing..." } else { "" };
    layout::render_footer(f, &format!("↑↓ scroll  r re-probe  Esc back{status}"), chunks[2]);
}

fn style_line(text: String) -> Line<'static> {
    let style = if text.starts_with("──") {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else if text.ends_with("not available") || text.starts_with("Reason:") {
        Style::default().fg(WARN)
    } else {
        Style::default().fg(BRIGHT_WHITE)
    };
    Line::from(Span::styled(text, style))
}
