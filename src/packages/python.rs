use super::types::PackageRecord;
use crate::bridge::{self, Bindings, ForeignValue, RuntimeHandle};
use crate::error::RuntimeError;

const DISTRIBUTIONS_SNIPPET: &str = r#"
from importlib import metadata
packages = []
for dist in metadata.distributions():
    name = dist.metadata.get("Name")
    if name:
        packages.append([name, dist.version or ""])
"#;

const METADATA_SNIPPET: &str = r#"
from importlib import metadata
meta = metadata.metadata(name)
fields = [["Name", meta.get("Name") or name], ["Version", metadata.version(name)]]
for key in ("Summary", "License", "Home-page", "Author", "Requires-Python"):
    value = meta.get(key)
    if value:
        fields.append([key, value])
requires = metadata.requires(name) or []
if requires:
    fields.append(["Requires", ", ".join(requires)])
"#;

/// `sys.path` 上所有可见的发行包
pub fn installed_packages(handle: &RuntimeHandle) -> Result<Vec<PackageRecord>, RuntimeError> {
    let value = bridge::run(handle, DISTRIBUTIONS_SNIPPET, &Bindings::new(), Some("packages"))?;
    Ok(value
        .into_pairs()?
        .into_iter()
        .map(|(name, version)| PackageRecord::new(name, version))
        .collect())
}

/// 单个包的元数据（字段, 值），按显示顺序
pub fn package_metadata(
    handle: &RuntimeHandle,
    name: &str,
) -> Result<Vec<(String, String)>, RuntimeError> {
    let mut bindings = Bindings::new();
    bindings.insert("name".to_string(), ForeignValue::from(name));
    bridge::run(handle, METADATA_SNIPPET, &bindings, Some("fields"))
        .map_err(|e| name_missing_package(name, e))?
        .into_pairs()
}

/// PackageNotFoundError 不带 name，用查询的发行包名补上
fn name_missing_package(name: &str, err: RuntimeError) -> RuntimeError {
    match err {
        RuntimeError::ModuleNotFound { module, message } if module.is_empty() => {
            RuntimeError::ModuleNotFound {
                module: name.to_string(),
                message,
            }
        }
        other => other,
    }
}
