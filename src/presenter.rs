use crate::bridge::PYTHON_NOT_AVAILABLE;
use crate::fallback::fallback;
use crate::host::R_NOT_AVAILABLE;
use crate::packages::{Listing, ListingResult, PackageRecord};
use crate::runtime::RuntimeStatus;

/// 失败时先走 fallback，保证结果非空
pub fn resolve(result: &ListingResult) -> Listing {
    match result {
        Ok(listing) => listing.clone(),
        Err(e) => fallback(e),
    }
}

pub fn record_line(record: &PackageRecord) -> String {
    format!("{}: {}", record.name, record.version)
}

/// 截断提示行
pub fn truncation_marker(listing: &Listing) -> Option<String> {
    listing.is_truncated().then(|| {
        format!(
            "... showing first {} of {} packages",
            listing.records.len(),
            listing.total
        )
    })
}

/// `"{name}: {version}"` 每行一条，超出上限时追加截断提示
pub fn lines(result: &ListingResult) -> Vec<String> {
    let listing = resolve(result);
    let mut lines: Vec<String> = listing.records.iter().map(record_line).collect();
    if let Some(marker) = truncation_marker(&listing) {
        lines.push(marker);
    }
    lines
}

pub fn python_version_text(status: &RuntimeStatus) -> String {
    version_text("Python", PYTHON_NOT_AVAILABLE, status)
}

pub fn r_version_text(status: &RuntimeStatus) -> String {
    version_text("R", R_NOT_AVAILABLE, status)
}

fn version_text(label: &str, unavailable: &str, status: &RuntimeStatus) -> String {
    match (status.available, &status.version) {
        (true, Some(version)) => format!("{label} {version}"),
        (true, None) => format!("{label} (unknown version)"),
        (false, _) => unavailable.to_string(),
    }
}

/// 环境视图中一个运行时的段落
pub fn status_lines(title: &str, version_text: String, status: &RuntimeStatus) -> Vec<String> {
    let mut lines = vec![format!("── {title} ──"), String::new(), version_text];
    if let Some(path) = &status.path {
        lines.push(format!("Path: {path}"));
    }
    for (label, value) in &status.details {
        lines.push(format!("{label}: {value}"));
    }
    if let Some(error) = &status.error {
        lines.push(format!("Reason: {error}"));
    }
    lines.push(String::new());
    lines
}
