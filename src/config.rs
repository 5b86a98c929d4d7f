use crate::dataset::DatasetSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 散点图点数范围
pub const MIN_POINTS: u32 = 50;
pub const MAX_POINTS: u32 = 500;
pub const POINT_STEP: u32 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub python: PythonConfig,
    pub r: RConfig,
    pub packages: PackagesConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// 指定解释器路径；为空时按 ENVDASH_PYTHON → PATH 查找
    pub interpreter: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RConfig {
    /// 指定 Rscript 路径；为空时按 ENVDASH_RSCRIPT → PATH 查找
    pub rscript: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    pub show_all: bool,
    /// 只显示这些包名（为空表示不过滤）
    pub filter: Vec<String>,
    pub python_defaults: Vec<String>,
    pub r_defaults: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            show_all: false,
            filter: Vec::new(),
            python_defaults: ["numpy", "pandas", "matplotlib", "scipy"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            r_defaults: ["dplyr", "ggplot2", "jsonlite", "tidyr"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub point_count: u32,
    pub dataset: DatasetSource,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            point_count: 100,
            dataset: DatasetSource::Native,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/lian-envdash/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            log::debug!("配置文件不存在，使用默认配置: {}", config_path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.plot.point_count = clamp_points(config.plot.point_count);
        Ok(config)
    }

    /// 配置文件 > 环境变量：仅在配置未指定路径时读取环境变量
    fn apply_env<F>(&mut self, env_fn: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |key: &str| {
            env_fn(key)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        };
        if self.python.interpreter.is_none() {
            self.python.interpreter = from_env("ENVDASH_PYTHON");
        }
        if self.r.rscript.is_none() {
            self.r.rscript = from_env("ENVDASH_RSCRIPT");
        }
    }
}

pub fn clamp_points(n: u32) -> u32 {
    n.clamp(MIN_POINTS, MAX_POINTS)
}
