use crate::error::RuntimeError;
use crate::runtime::Runtime;
use std::collections::BTreeSet;

/// 列表最多保留的条目数
pub const MAX_RECORDS: usize = 100;

/// 一个已安装包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// 一次列表查询的参数
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub runtime: Runtime,
    /// 只保留这些包名；None 表示不过滤
    pub filter: Option<BTreeSet<String>>,
    /// false 时只保留默认子集
    pub show_all: bool,
}

impl ListingQuery {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            filter: None,
            show_all: false,
        }
    }

    /// 空列表视为不过滤
    pub fn with_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.filter = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }
}

/// 查询结果：截断后的条目和截断前的总数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub records: Vec<PackageRecord>,
    pub total: usize,
}

impl Listing {
    pub fn is_truncated(&self) -> bool {
        self.total > self.records.len()
    }
}

pub type ListingResult = Result<Listing, RuntimeError>;
