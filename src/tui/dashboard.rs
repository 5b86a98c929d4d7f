use super::state::App;
use crate::presenter::{python_version_text, r_version_text};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const ASCII_LOGO: &str = r#"
 ███████ ███    ██ ██    ██ ██████   █████  ███████ ██   ██
 ██      ████   ██ ██    ██ ██   ██ ██   ██ ██      ██   ██
 █████   ██ ██  ██ ██    ██ ██   ██ ███████ ███████ ███████
 ██      ██  ██ ██  ██  ██  ██   ██ ██   ██      ██ ██   ██
 ███████ ██   ████   ████   ██████  ██   ██ ███████ ██   ██"#;

pub fn render_dashboard(f: &mut Frame, app: &App) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(""));

    for logo_line in ASCII_LOGO.lines() {
        lines.push(Line::from(vec![Span::styled(
            logo_line.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    lines.push(section_title("── Runtimes ──"));
    lines.push(Line::from(""));

    // 运行时状态：启动时探测一次
    match &app.lister {
        Some(lister) => {
            let runtimes = lister.runtimes();
            lines.push(info_line("R  ", &r_version_text(runtimes.host.status())));
            lines.push(info_line(
                "Python  ",
                &python_version_text(runtimes.python.status()),
            ));
        }
        None => {
            lines.push(info_line("R  ", "detecting..."));
            lines.push(info_line("Python  ", "detecting..."));
        }
    }
    let scope = if app.show_all { "all packages" } else { "default subset" };
    lines.push(info_line("Listing  ", scope));

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    lines.push(section_title("── Shortcuts ──"));
    lines.push(Line::from(""));

    lines.push(shortcut_line("R", " R packages          "));
    lines.push(shortcut_line("P", " Python packages     "));
    lines.push(shortcut_line("E", " Environment         "));
    lines.push(shortcut_line("G", " Scatter plot demo   "));
    lines.push(shortcut_line("q", " Quit                "));

    lines.push(Line::from(""));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![Span::styled(
        format!("envdash v{}  ", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    )]));

    let content_height = lines.len() as u16;
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);

    // 垂直居中
    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(content_height),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(paragraph, vertical[1]);
}

fn section_title(text: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )])
}

/// 信息行: "标签: 值"
fn info_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

/// 快捷键行: "  X  描述"
fn shortcut_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {key}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}
