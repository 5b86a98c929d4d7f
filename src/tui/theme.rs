use ratatui::style::Color;

/// 标题 / 强调色
pub const ACCENT: Color = Color::Rgb(91, 206, 250);
/// 诊断信息（占位结果）
pub const WARN: Color = Color::Rgb(245, 169, 184);
/// 选中行背景色
pub const SEL_BG: Color = Color::Rgb(45, 35, 55);
/// 亮白色
pub const BRIGHT_WHITE: Color = Color::Rgb(255, 255, 255);
/// 暗灰色（次要信息）
pub const DIM: Color = Color::Rgb(130, 130, 140);
