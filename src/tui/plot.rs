use super::layout;
use super::state::{App, AppEvent, AppMode};
use super::theme::{ACCENT, DIM, WARN};
use crate::bridge::RuntimeHandle;
use crate::dataset;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Alignment,
    style::Style,
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

pub fn spawn_dataset(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    app.plot.loading = true;
    app.plot.seq += 1;
    let seq = app.plot.seq;
    let source = app.plot.source;
    let n = app.plot.point_count;
    // 本地数据不依赖运行时检测结果
    let handle = app
        .lister
        .as_ref()
        .map(|l| l.runtimes().python.clone())
        .unwrap_or_else(RuntimeHandle::unavailable);

    let tx = tx.clone();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || dataset::generate(source, n, &handle)).await;
        match result {
            Ok(result) => {
                let _ = tx.send(AppEvent::DatasetReady { result, seq }).await;
            }
            Err(e) => log::error!("数据生成任务异常退出: {}", e),
        }
    });
}

pub fn handle_plot_key(key: KeyEvent, app: &mut App, tx: &mpsc::Sender<AppEvent>) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Dashboard;
            true
        }
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
            app.plot.increase();
            spawn_dataset(app, tx);
            true
        }
        KeyCode::Char('-') | KeyCode::Left => {
            app.plot.decrease();
            spawn_dataset(app, tx);
            true
        }
        KeyCode::Char('d') => {
            app.plot.source = app.plot.source.toggle();
            spawn_dataset(app, tx);
            true
        }
        KeyCode::Char('r') => {
            spawn_dataset(app, tx);
            true
        }
        _ => false,
    }
}

pub fn render_plot(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());
    layout::render_header(
        f,
        &format!(
            "Scatter Plot: {} ({} points)",
            app.plot.source.label(),
            app.plot.point_count
        ),
        chunks[0],
    );

    match &app.plot.result {
        Some(Ok(data)) => {
            let points = data.points();
            let (x0, x1, y0, y1) = data.bounds();
            let chart = Chart::new(vec![Dataset::default()
                .name(data.source.label())
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(ACCENT))
                .data(&points)])
            .block(
                Block::default()
                    .title(format!(" {} rows ", data.len()))
                    .borders(Borders::ALL),
            )
            .x_axis(
                Axis::default()
                    .title("x")
                    .style(Style::default().fg(DIM))
                    .bounds([x0, x1])
                    .labels(axis_labels(x0, x1)),
            )
            .y_axis(
                Axis::default()
                    .title("y")
                    .style(Style::default().fg(DIM))
                    .bounds([y0, y1])
                    .labels(axis_labels(y0, y1)),
            );
            f.render_widget(chart, chunks[1]);
        }
        Some(Err(e)) => {
            let message = Paragraph::new(format!("Could not generate data: {e}"))
                .style(Style::default().fg(WARN))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(message, chunks[1]);
        }
        None => {
            let message = Paragraph::new("Generating data...")
                .style(Style::default().fg(DIM))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center);
            f.render_widget(message, chunks[1]);
        }
    }

    let status = if app.plot.loading { "  │ generating..." } else { "" };
    layout::render_footer(
        f,
        &format!("+/- points (50–500)  d switch dataset  r regenerate  Esc back{status}"),
        chunks[2],
    );
}

fn axis_labels(lo: f64, hi: f64) -> Vec<Span<'static>> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi]
        .iter()
        .map(|v| Span::raw(format!("{v:.1}")))
        .collect()
}
