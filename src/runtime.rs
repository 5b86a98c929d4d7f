use std::fmt;
use std::path::{Path, PathBuf};

/// 仪表盘展示的两个运行时
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    /// 宿主运行时，经 Rscript 查询
    R,
    /// 外部运行时，经 bridge 调用解释器
    Python,
}

impl Runtime {
    pub fn label(&self) -> &'static str {
        match self {
            Runtime::R => "R",
            Runtime::Python => "Python",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 一次探测的结果。探测本身从不失败，失败信息放在 `error` 中
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeStatus {
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<String>,
    pub error: Option<String>,
    /// 附加信息（prefix、虚拟环境、平台等），按显示顺序
    pub details: Vec<(String, String)>,
}

impl RuntimeStatus {
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            available: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// 在 PATH 中按顺序查找候选程序名，返回第一个可执行文件
pub fn find_on_path(candidates: &[&str]) -> Option<PathBuf> {
    let path_entries: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    find_in_dirs(candidates, &path_entries)
}

pub fn find_in_dirs(candidates: &[&str], dirs: &[PathBuf]) -> Option<PathBuf> {
    for name in candidates {
        for dir in dirs {
            let candidate = dir.join(name);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_status_is_well_formed() {
        let status = RuntimeStatus::unavailable("not found");
        assert!(!status.available);
        assert!(status.version.is_none());
        assert!(status.path.is_none());
        assert_eq!(status.error.as_deref(), Some("not found"));
    }

    #[test]
    fn find_in_dirs_skips_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let found = find_in_dirs(&["no-such-python"], &[dir.path().to_path_buf()]);
        assert!(found.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn find_in_dirs_prefers_earlier_candidate_names() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["python3", "python"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let plain = dir.path().join("not-exec");
        std::fs::write(&plain, "").unwrap();

        let found = find_in_dirs(&["python3", "python"], &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(dir.path().join("python3")));
        assert!(find_in_dirs(&["not-exec"], &[dir.path().to_path_buf()]).is_none());
    }
}
