use thiserror::Error;

/// R / Python 运行时查询失败的原因
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// 解释器找不到或无法启动
    #[error("{0}")]
    RuntimeUnavailable(String),

    /// 片段 import 了未安装的模块
    #[error("module '{module}' not found: {message}")]
    ModuleNotFound { module: String, message: String },

    /// 片段执行抛出异常，或子进程异常退出
    #[error("execution failed: {0}")]
    ExecutionFailure(String),

    /// 结果无法转换为 Rust 端的值
    #[error("could not read result: {0}")]
    MarshalFailure(String),
}

impl RuntimeError {
    /// 错误类别名，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::RuntimeUnavailable(_) => "RuntimeUnavailable",
            RuntimeError::ModuleNotFound { .. } => "ModuleNotFound",
            RuntimeError::ExecutionFailure(_) => "ExecutionFailure",
            RuntimeError::MarshalFailure(_) => "MarshalFailure",
        }
    }
}
