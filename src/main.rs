mod bridge;
mod config;
mod dataset;
mod error;
mod fallback;
mod host;
mod packages;
mod presenter;
mod runtime;
mod sysinfo;
mod tui;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 加载配置（~/.config/lian-envdash/config.toml，环境变量可覆盖解释器路径）
    let config = config::Config::load_or_default()?;
    log::debug!("配置: {:?}", config);

    tui::run(config).await?;

    Ok(())
}
