//! 包列表模块：查询 R / Python 已安装包，按过滤条件整理成列表

pub mod python;
pub mod types;

pub use python::package_metadata;
pub use types::{Listing, ListingQuery, ListingResult, PackageRecord, MAX_RECORDS};

use crate::bridge::RuntimeHandle;
use crate::config::PackagesConfig;
use crate::host::HostRuntime;
use crate::runtime::Runtime;
use std::collections::{BTreeSet, HashSet};

/// 进程内初始化一次的两个运行时
#[derive(Debug, Clone)]
pub struct Runtimes {
    pub host: HostRuntime,
    pub python: RuntimeHandle,
}

/// 包列表查询器
#[derive(Debug, Clone)]
pub struct PackageLister {
    runtimes: Runtimes,
    python_defaults: BTreeSet<String>,
    r_defaults: BTreeSet<String>,
}

impl PackageLister {
    pub fn new(runtimes: Runtimes, config: &PackagesConfig) -> Self {
        Self {
            runtimes,
            python_defaults: config.python_defaults.iter().cloned().collect(),
            r_defaults: config.r_defaults.iter().cloned().collect(),
        }
    }

    pub fn runtimes(&self) -> &Runtimes {
        &self.runtimes
    }

    pub fn defaults(&self, runtime: Runtime) -> &BTreeSet<String> {
        match runtime {
            Runtime::R => &self.r_defaults,
            Runtime::Python => &self.python_defaults,
        }
    }

    /// 执行一次查询。错误以 Err 返回，不会 panic
    pub fn list(&self, query: &ListingQuery) -> ListingResult {
        let records = match query.runtime {
            Runtime::R => self.runtimes.host.installed_packages(),
            Runtime::Python => python::installed_packages(&self.runtimes.python),
        };
        match records {
            Ok(records) => Ok(shape(records, query, self.defaults(query.runtime))),
            Err(e) => {
                log::warn!("{} 包列表查询失败 [{}]: {}", query.runtime, e.kind(), e);
                Err(e)
            }
        }
    }
}

/// 包名归一化：小写，`_` 和 `.` 视同 `-`
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// 过滤、去重、排序、截断
pub fn shape(
    records: Vec<PackageRecord>,
    query: &ListingQuery,
    defaults: &BTreeSet<String>,
) -> Listing {
    let defaults: HashSet<String> = defaults.iter().map(|n| normalize_name(n)).collect();
    let filter: Option<HashSet<String>> = query
        .filter
        .as_ref()
        .map(|f| f.iter().map(|n| normalize_name(n)).collect());

    let mut seen = HashSet::new();
    let mut kept: Vec<PackageRecord> = records
        .into_iter()
        .filter(|r| {
            let key = normalize_name(&r.name);
            if !query.show_all && !defaults.contains(&key) {
                return false;
            }
            if let Some(filter) = &filter {
                if !filter.contains(&key) {
                    return false;
                }
            }
            // 同名包出现在多个库路径时保留第一个
            seen.insert(key)
        })
        .collect();

    kept.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    let total = kept.len();
    kept.truncate(MAX_RECORDS);
    Listing {
        records: kept,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    fn defaults() -> BTreeSet<String> {
        ["numpy", "pandas", "matplotlib", "scipy"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("requests", "2.31.0"),
            PackageRecord::new("scipy", "1.12.0"),
            PackageRecord::new("numpy", "1.26.4"),
            PackageRecord::new("Pandas", "2.2.1"),
            PackageRecord::new("typing_extensions", "4.10.0"),
        ]
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn default_subset_when_not_showing_all() {
        let listing = shape(sample(), &ListingQuery::new(Runtime::Python), &defaults());
        assert_eq!(names(&listing), vec!["numpy", "Pandas", "scipy"]);
        assert!(!listing.is_truncated());
    }

    #[test]
    fn filter_cannot_escape_default_subset() {
        let filters: Vec<Vec<&str>> = vec![
            vec!["requests"],
            vec!["requests", "numpy"],
            vec!["typing-extensions", "scipy", "pandas"],
            vec![],
        ];
        for filter in filters {
            let query = ListingQuery::new(Runtime::Python).with_filter(filter.clone());
            let listing = shape(sample(), &query, &defaults());
            for record in &listing.records {
                assert!(
                    defaults().contains(&normalize_name(&record.name)),
                    "{} leaked through filter {:?}",
                    record.name,
                    filter
                );
            }
        }
    }

    #[test]
    fn show_all_with_filter_matches_normalized_names() {
        let query = ListingQuery::new(Runtime::Python)
            .show_all(true)
            .with_filter(["Typing-Extensions", "requests"]);
        let listing = shape(sample(), &query, &defaults());
        assert_eq!(names(&listing), vec!["requests", "typing_extensions"]);
    }

    #[test]
    fn show_all_sorts_case_insensitively() {
        let query = ListingQuery::new(Runtime::Python).show_all(true);
        let listing = shape(sample(), &query, &defaults());
        assert_eq!(
            names(&listing),
            vec!["numpy", "Pandas", "requests", "scipy", "typing_extensions"]
        );
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let records = vec![
            PackageRecord::new("ggplot2", "3.5.0"),
            PackageRecord::new("ggplot2", "3.4.4"),
        ];
        let query = ListingQuery::new(Runtime::R).show_all(true);
        let listing = shape(records, &query, &BTreeSet::new());
        assert_eq!(listing.records, vec![PackageRecord::new("ggplot2", "3.5.0")]);
    }

    #[test]
    fn long_listings_are_truncated_to_limit() {
        let records: Vec<PackageRecord> = (0..250)
            .map(|i| PackageRecord::new(format!("pkg{i:03}"), "1.0"))
            .collect();
        let query = ListingQuery::new(Runtime::Python).show_all(true);
        let listing = shape(records, &query, &defaults());
        assert_eq!(listing.records.len(), MAX_RECORDS);
        assert_eq!(listing.total, 250);
        assert!(listing.is_truncated());
        assert_eq!(listing.records[0].name, "pkg000");
    }

    #[test]
    fn exactly_limit_is_not_truncated() {
        let records: Vec<PackageRecord> = (0..MAX_RECORDS)
            .map(|i| PackageRecord::new(format!("pkg{i:03}"), "1.0"))
            .collect();
        let query = ListingQuery::new(Runtime::Python).show_all(true);
        let listing = shape(records, &query, &defaults());
        assert!(!listing.is_truncated());
    }

    #[test]
    fn shaping_is_idempotent() {
        let query = ListingQuery::new(Runtime::Python)
            .show_all(true)
            .with_filter(["numpy", "requests"]);
        assert_eq!(
            shape(sample(), &query, &defaults()),
            shape(sample(), &query, &defaults())
        );
    }

    #[test]
    fn lister_without_runtimes_returns_errors() {
        let lister = PackageLister::new(
            Runtimes {
                host: HostRuntime::unavailable(),
                python: RuntimeHandle::unavailable(),
            },
            &PackagesConfig::default(),
        );
        for runtime in [Runtime::R, Runtime::Python] {
            let query = ListingQuery::new(runtime);
            let first = lister.list(&query);
            assert!(matches!(first, Err(RuntimeError::RuntimeUnavailable(_))));
            assert_eq!(first, lister.list(&query));
        }
    }
}
