use crate::packages::Runtimes;
use crate::presenter::{python_version_text, r_version_text, status_lines};
use crate::{bridge, runtime::RuntimeStatus};
use std::process::Command;

/// 宿主系统信息，显示在环境视图顶部
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub kernel: String,
    pub distro: String,
}

impl SystemInfo {
    /// 自动检测系统环境信息
    pub fn detect() -> Self {
        Self {
            kernel: run_cmd("uname", &["-sr"]),
            distro: Self::get_distro(),
        }
    }

    fn get_distro() -> String {
        // 解析 PRETTY_NAME="Arch Linux"
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| parse_pretty_name(&content))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn run_cmd(cmd: &str, args: &[&str]) -> String {
    Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                let s = String::from_utf8_lossy(&o.stdout).trim().to_string();
                if s.is_empty() { None } else { Some(s) }
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_pretty_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|v| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

/// 环境诊断视图的内容；每次进入视图时重新探测
#[derive(Debug, Clone)]
pub struct EnvironmentReport {
    pub system: SystemInfo,
    pub r: RuntimeStatus,
    pub python: RuntimeStatus,
}

impl EnvironmentReport {
    pub fn collect(runtimes: &Runtimes) -> Self {
        Self {
            system: SystemInfo::detect(),
            r: runtimes.host.probe(),
            python: bridge::probe(&runtimes.python),
        }
    }

    pub fn python_version_text(&self) -> String {
        python_version_text(&self.python)
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            "── System ──".to_string(),
            String::new(),
            format!("OS: {}", self.system.distro),
            format!("Kernel: {}", self.system.kernel),
            String::new(),
        ];
        lines.extend(status_lines("R", r_version_text(&self.r), &self.r));
        lines.extend(status_lines("Python", self.python_version_text(), &self.python));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{RuntimeHandle, PYTHON_NOT_AVAILABLE};
    use crate::host::HostRuntime;

    #[test]
    fn pretty_name_is_unquoted() {
        let content = "NAME=\"Arch Linux\"\nPRETTY_NAME=\"Arch Linux\"\nID=arch\n";
        assert_eq!(parse_pretty_name(content).as_deref(), Some("Arch Linux"));
        assert_eq!(parse_pretty_name("ID=arch\n"), None);
    }

    #[test]
    fn report_without_runtimes_shows_placeholders() {
        let runtimes = Runtimes {
            host: HostRuntime::unavailable(),
            python: RuntimeHandle::unavailable(),
        };
        let report = EnvironmentReport::collect(&runtimes);
        assert_eq!(report.python_version_text(), PYTHON_NOT_AVAILABLE);
        let lines = report.lines();
        assert!(lines.contains(&"Python not available".to_string()));
        assert!(lines.contains(&"R not available".to_string()));
    }
}
