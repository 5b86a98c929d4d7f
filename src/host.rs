use crate::config::RConfig;
use crate::error::RuntimeError;
use crate::packages::PackageRecord;
use crate::runtime::{find_on_path, RuntimeStatus};
use std::path::PathBuf;
use std::process::Command;

pub const R_NOT_AVAILABLE: &str = "R not available";

const VERSION_EXPR: &str = r#"cat(R.version.string, R.home(), paste(.libPaths(), collapse = ":"), R.version$platform, sep = "\n")"#;

const PACKAGES_EXPR: &str = r#"ip <- installed.packages(fields = character())[, c("Package", "Version"), drop = FALSE]; write.table(ip, sep = "\t", quote = FALSE, row.names = FALSE, col.names = FALSE)"#;

#[derive(Debug, Clone)]
pub struct HostRuntime {
    rscript: Option<PathBuf>,
    status: RuntimeStatus,
}

impl HostRuntime {
    /// 查找 Rscript 并探测一次
    pub fn detect(config: &RConfig) -> Self {
        let rscript = config
            .rscript
            .clone()
            .or_else(|| find_on_path(&["Rscript"]));
        let mut host = Self {
            rscript,
            status: RuntimeStatus::default(),
        };
        host.status = host.probe();
        if let Some(e) = &host.status.error {
            log::warn!("R 不可用: {}", e);
        }
        host
    }

    pub fn unavailable() -> Self {
        Self {
            rscript: None,
            status: RuntimeStatus::unavailable(R_NOT_AVAILABLE),
        }
    }

    pub fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn is_available(&self) -> bool {
        self.status.available
    }

    /// 重新探测。从不返回错误
    pub fn probe(&self) -> RuntimeStatus {
        match self.eval(VERSION_EXPR) {
            Ok(out) => parse_version_output(&out),
            Err(e) => RuntimeStatus::unavailable(e.to_string()),
        }
    }

    /// 列出全部库路径下的已安装包（未排序、可能重复）
    pub fn installed_packages(&self) -> Result<Vec<PackageRecord>, RuntimeError> {
        let not_available = || RuntimeError::RuntimeUnavailable(R_NOT_AVAILABLE.to_string());
        if !self.is_available() {
            return Err(not_available());
        }
        let out = self.eval(PACKAGES_EXPR).map_err(|e| match e {
            RuntimeError::RuntimeUnavailable(detail) => {
                log::warn!("Rscript 不可用: {}", detail);
                not_available()
            }
            other => other,
        })?;
        Ok(parse_package_table(&out))
    }

    fn eval(&self, expr: &str) -> Result<String, RuntimeError> {
        let rscript = self
            .rscript
            .as_ref()
            .ok_or_else(|| RuntimeError::RuntimeUnavailable(R_NOT_AVAILABLE.to_string()))?;

        let output = Command::new(rscript)
            .args(["--vanilla", "-e", expr])
            .output()
            .map_err(|e| {
                RuntimeError::RuntimeUnavailable(format!("failed to start {}: {}", rscript.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("Rscript exited with an error")
                .trim()
                .to_string();
            return Err(RuntimeError::ExecutionFailure(reason));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// 解析版本表达式输出：版本串、R_HOME、库路径、平台各占一行
pub fn parse_version_output(out: &str) -> RuntimeStatus {
    let mut lines = out.lines().map(str::trim);
    let Some(version_line) = lines.next().filter(|l| !l.is_empty()) else {
        return RuntimeStatus::unavailable("Rscript returned no version information");
    };

    // "R version 4.3.1 (2023-06-16)" → "4.3.1"
    let version = version_line
        .strip_prefix("R version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(version_line)
        .to_string();

    let home = lines.next().filter(|l| !l.is_empty()).map(str::to_string);
    let mut details = vec![("Version string".to_string(), version_line.to_string())];
    if let Some(libs) = lines.next().filter(|l| !l.is_empty()) {
        details.push(("Library paths".to_string(), libs.replace(':', ", ")));
    }
    if let Some(platform) = lines.next().filter(|l| !l.is_empty()) {
        details.push(("Platform".to_string(), platform.to_string()));
    }

    RuntimeStatus {
        available: true,
        version: Some(version),
        path: home,
        error: None,
        details,
    }
}

/// 解析 `Package<TAB>Version` 表
pub fn parse_package_table(out: &str) -> Vec<PackageRecord> {
    out.lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let name = cols.next()?.trim();
            let version = cols.next()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(PackageRecord::new(name, version))
        })
        .collect()
}
