use crate::error::RuntimeError;
use crate::packages::{Listing, PackageRecord};

/// 占位条目的名称列
pub const DIAGNOSTIC_NAME: &str = "Error";

/// 把错误转换为只含一条诊断记录的列表，保证界面总有内容可显示
pub fn fallback(err: &RuntimeError) -> Listing {
    let message = match err {
        RuntimeError::RuntimeUnavailable(msg) if !msg.trim().is_empty() => msg.clone(),
        RuntimeError::RuntimeUnavailable(_) => "runtime not available".to_string(),
        other => other.to_string(),
    };
    Listing {
        records: vec![PackageRecord::new(DIAGNOSTIC_NAME, message)],
        total: 1,
    }
}
