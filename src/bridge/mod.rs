//! Python 桥接：定位解释器、执行代码片段、取回结果变量
//!
//! 每次调用都启动一个独立的解释器进程：片段、绑定变量和输出变量名以 JSON
//! 写入 stdin，`bootstrap.py` 执行片段后把结果作为最后一行 JSON 写回 stdout。
//! 片段自身的 print 输出被重定向，不会混入结果行。

pub mod value;

pub use value::{Bindings, ForeignValue};

use crate::config::PythonConfig;
use crate::error::RuntimeError;
use crate::runtime::{find_on_path, RuntimeStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

const BOOTSTRAP: &str = include_str!("bootstrap.py");

/// 未找到解释器时的诊断文本
pub const PYTHON_NOT_AVAILABLE: &str = "Python not available";

const PROBE_SNIPPET: &str = r#"
import platform
import sys
info = {
    "version": platform.python_version(),
    "executable": sys.executable,
    "prefix": sys.prefix,
    "virtualenv": sys.prefix != getattr(sys, "base_prefix", sys.prefix),
    "platform": platform.platform(),
}
"#;

/// 解释器句柄：进程内初始化一次，之后随每次调用传入
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    interpreter: Option<PathBuf>,
    status: RuntimeStatus,
}

impl RuntimeHandle {
    /// 查找解释器并探测一次，结果缓存在句柄中
    pub fn initialize(config: &PythonConfig) -> Self {
        let interpreter = config
            .interpreter
            .clone()
            .or_else(|| find_on_path(&["python3", "python"]));
        let mut handle = Self {
            interpreter,
            status: RuntimeStatus::default(),
        };
        handle.status = probe(&handle);
        match &handle.status.error {
            None => log::info!(
                "Python {} ({})",
                handle.status.version.as_deref().unwrap_or("?"),
                handle.status.path.as_deref().unwrap_or("?")
            ),
            Some(e) => log::warn!("Python 不可用: {}", e),
        }
        handle
    }

    /// 不经探测直接构造，供测试和已知解释器使用
    pub fn with_status(interpreter: Option<PathBuf>, status: RuntimeStatus) -> Self {
        Self { interpreter, status }
    }

    pub fn unavailable() -> Self {
        Self::with_status(None, RuntimeStatus::unavailable(PYTHON_NOT_AVAILABLE))
    }

    pub fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn is_available(&self) -> bool {
        self.status.available
    }

    pub fn interpreter(&self) -> Option<&Path> {
        self.interpreter.as_deref()
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    code: &'a str,
    bindings: serde_json::Map<String, serde_json::Value>,
    output: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response {
    #[serde(rename = "ok")]
    Success {
        value: serde_json::Value,
        #[serde(default)]
        stdout: String,
    },
    ModuleNotFound {
        module: String,
        message: String,
    },
    ExecutionFailure {
        message: String,
    },
    MarshalFailure {
        message: String,
    },
}

/// 重新探测解释器。从不返回错误：失败时 `available = false` 并附带原因
pub fn probe(handle: &RuntimeHandle) -> RuntimeStatus {
    let Some(interpreter) = handle.interpreter() else {
        return RuntimeStatus::unavailable(PYTHON_NOT_AVAILABLE);
    };

    match execute(interpreter, PROBE_SNIPPET, &Bindings::new(), Some("info")) {
        Ok(info) => status_from_info(&info, interpreter),
        Err(e) => RuntimeStatus::unavailable(e.to_string()),
    }
}

fn status_from_info(info: &ForeignValue, interpreter: &Path) -> RuntimeStatus {
    let text = |key: &str| info.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let mut details = Vec::new();
    if let Some(prefix) = text("prefix") {
        details.push(("Prefix".to_string(), prefix));
    }
    if let Some(ForeignValue::Bool(venv)) = info.get("virtualenv") {
        details.push((
            "Virtualenv".to_string(),
            if *venv { "yes" } else { "no" }.to_string(),
        ));
    }
    if let Some(platform) = text("platform") {
        details.push(("Platform".to_string(), platform));
    }

    RuntimeStatus {
        available: true,
        version: text("version"),
        path: text("executable").or_else(|| Some(interpreter.display().to_string())),
        error: None,
        details,
    }
}

/// 在解释器中执行片段，返回 `output` 指定变量的值（为 None 时返回 Null）
pub fn run(
    handle: &RuntimeHandle,
    snippet: &str,
    bindings: &Bindings,
    output: Option<&str>,
) -> Result<ForeignValue, RuntimeError> {
    // 具体原因留在 status.error 和日志里，对外统一为 "Python not available"
    let not_available = || RuntimeError::RuntimeUnavailable(PYTHON_NOT_AVAILABLE.to_string());
    if !handle.is_available() {
        return Err(not_available());
    }
    let interpreter = handle.interpreter().ok_or_else(not_available)?;
    execute(interpreter, snippet, bindings, output).map_err(|e| match e {
        RuntimeError::RuntimeUnavailable(detail) => {
            log::warn!("Python 解释器不可用: {}", detail);
            not_available()
        }
        other => other,
    })
}

fn execute(
    interpreter: &Path,
    snippet: &str,
    bindings: &Bindings,
    output: Option<&str>,
) -> Result<ForeignValue, RuntimeError> {
    let request = Request {
        code: snippet,
        bindings: bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
        output,
    };
    let payload = serde_json::to_vec(&request)
        .map_err(|e| RuntimeError::MarshalFailure(e.to_string()))?;

    let started = Instant::now();
    let result = duct::cmd(interpreter, ["-c", BOOTSTRAP])
        .stdin_bytes(payload)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| {
            RuntimeError::RuntimeUnavailable(format!(
                "failed to start {}: {}",
                interpreter.display(),
                e
            ))
        })?;
    log::debug!(
        "{} 执行完毕 ({:?}, exit={:?})",
        interpreter.display(),
        started.elapsed(),
        result.status.code()
    );

    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    parse_response(&stdout, &stderr, result.status.success())
}

/// 解析 bootstrap 写回的最后一行 JSON
fn parse_response(stdout: &str, stderr: &str, success: bool) -> Result<ForeignValue, RuntimeError> {
    let last_line = stdout.lines().rev().find(|l| !l.trim().is_empty());

    let Some(line) = last_line else {
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or(if success { "no output" } else { "interpreter exited with an error" });
        return Err(RuntimeError::ExecutionFailure(reason.trim().to_string()));
    };

    let response: Response = serde_json::from_str(line.trim())
        .map_err(|e| RuntimeError::MarshalFailure(format!("malformed response: {e}")))?;

    match response {
        Response::Success { value, stdout } => {
            if !stdout.is_empty() {
                log::debug!("片段输出: {}", stdout.trim_end());
            }
            ForeignValue::from_json(value)
        }
        Response::ModuleNotFound { module, message } => {
            log::warn!("缺少 Python 模块: {}", module);
            Err(RuntimeError::ModuleNotFound { module, message })
        }
        Response::ExecutionFailure { message } => Err(RuntimeError::ExecutionFailure(message)),
        Response::MarshalFailure { message } => Err(RuntimeError::MarshalFailure(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 使用本机解释器；不存在时返回 None，调用方直接跳过
    fn live_handle() -> Option<RuntimeHandle> {
        let handle = RuntimeHandle::initialize(&PythonConfig::default());
        handle.is_available().then_some(handle)
    }

    #[test]
    fn missing_interpreter_probe_reports_unavailable() {
        let handle = RuntimeHandle::with_status(
            Some(PathBuf::from("/nonexistent/bin/python3")),
            RuntimeStatus::default(),
        );
        let status = probe(&handle);
        assert!(!status.available);
        assert!(status.error.is_some());
        assert!(status.version.is_none());
    }

    #[test]
    fn probe_without_interpreter_says_not_available() {
        let status = probe(&RuntimeHandle::unavailable());
        assert!(!status.available);
        assert_eq!(status.error.as_deref(), Some(PYTHON_NOT_AVAILABLE));
    }

    #[test]
    fn run_on_unavailable_handle_never_spawns() {
        let handle = RuntimeHandle::with_status(
            Some(PathBuf::from("/nonexistent/bin/python3")),
            RuntimeStatus::unavailable("not found"),
        );
        let result = run(&handle, "x = 1", &Bindings::new(), Some("x"));
        assert_eq!(
            result,
            Err(RuntimeError::RuntimeUnavailable(PYTHON_NOT_AVAILABLE.to_string()))
        );
    }

    #[test]
    fn missing_configured_interpreter_keeps_detail_in_status_only() {
        let handle = RuntimeHandle::initialize(&PythonConfig {
            interpreter: Some(PathBuf::from("/nonexistent/bin/python3")),
        });
        assert!(!handle.is_available());
        let detail = handle.status().error.clone().unwrap();
        assert!(detail.starts_with("failed to start /nonexistent/bin/python3"));

        let result = run(&handle, "x = 1", &Bindings::new(), Some("x"));
        assert_eq!(
            result,
            Err(RuntimeError::RuntimeUnavailable(PYTHON_NOT_AVAILABLE.to_string()))
        );
    }

    #[test]
    fn ok_response_is_decoded() {
        let stdout = "{\"status\": \"ok\", \"value\": [[\"numpy\", \"1.26.4\"]], \"stdout\": \"\"}\n";
        let value = parse_response(stdout, "", true).unwrap();
        assert_eq!(
            value.into_pairs().unwrap(),
            vec![("numpy".to_string(), "1.26.4".to_string())]
        );
    }

    #[test]
    fn module_not_found_response_maps_to_typed_error() {
        let stdout = r#"{"status": "module_not_found", "module": "numpy", "message": "No module named 'numpy'"}"#;
        assert_eq!(
            parse_response(stdout, "", true),
            Err(RuntimeError::ModuleNotFound {
                module: "numpy".to_string(),
                message: "No module named 'numpy'".to_string(),
            })
        );
    }

    #[test]
    fn crash_without_output_uses_last_stderr_line() {
        let stderr = "Traceback (most recent call last):\n  ...\nSyntaxError: bad\n";
        assert_eq!(
            parse_response("", stderr, false),
            Err(RuntimeError::ExecutionFailure("SyntaxError: bad".to_string()))
        );
    }

    #[test]
    fn garbage_output_is_a_marshal_failure() {
        let result = parse_response("hello world\n", "", true);
        assert!(matches!(result, Err(RuntimeError::MarshalFailure(_))));
    }

    #[test]
    fn status_from_probe_info() {
        let info = ForeignValue::from_json(serde_json::json!({
            "version": "3.12.1",
            "executable": "/usr/bin/python3",
            "prefix": "/usr",
            "virtualenv": false,
            "platform": "Linux-6.8-x86_64",
        }))
        .unwrap();
        let status = status_from_info(&info, Path::new("python3"));
        assert!(status.available);
        assert_eq!(status.version.as_deref(), Some("3.12.1"));
        assert_eq!(status.path.as_deref(), Some("/usr/bin/python3"));
        assert_eq!(status.details[1], ("Virtualenv".to_string(), "no".to_string()));
    }

    #[test]
    fn live_run_returns_bound_result() {
        let Some(handle) = live_handle() else { return };
        let mut bindings = Bindings::new();
        bindings.insert("n".to_string(), ForeignValue::Int(21));
        let value = run(&handle, "print('noise')\nresult = [n * 2, str(n)]", &bindings, Some("result")).unwrap();
        assert_eq!(
            value,
            ForeignValue::List(vec![ForeignValue::Int(42), ForeignValue::Str("21".to_string())])
        );
    }

    #[test]
    fn live_run_reports_missing_module_and_exceptions() {
        let Some(handle) = live_handle() else { return };
        let missing = run(&handle, "import envdash_no_such_module", &Bindings::new(), None);
        assert!(matches!(
            missing,
            Err(RuntimeError::ModuleNotFound { ref module, .. }) if module == "envdash_no_such_module"
        ));

        let failed = run(&handle, "raise ValueError('boom')", &Bindings::new(), None);
        assert_eq!(
            failed,
            Err(RuntimeError::ExecutionFailure("ValueError: boom".to_string()))
        );

        let undefined = run(&handle, "x = 1", &Bindings::new(), Some("y"));
        assert!(matches!(undefined, Err(RuntimeError::MarshalFailure(_))));
    }
}
