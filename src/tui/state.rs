use crate::config::{clamp_points, Config, POINT_STEP};
use crate::dataset::{Dataset, DatasetSource};
use crate::error::RuntimeError;
use crate::packages::{ListingQuery, ListingResult, PackageLister};
use crate::presenter;
use crate::runtime::Runtime;
use crate::sysinfo::EnvironmentReport;
use chrono::{DateTime, Local};

// ========== 枚举 ==========

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Dashboard,
    RPackages,      // Shift+R
    PythonPackages, // Shift+P
    Environment,    // Shift+E
    Plot,           // Shift+G
}

// ========== 事件 ==========

#[derive(Debug)]
pub enum AppEvent {
    RuntimesReady(PackageLister),
    ListingLoaded {
        runtime: Runtime,
        result: ListingResult,
        seq: u64,
    },
    MetadataLoaded {
        name: String,
        result: Result<Vec<(String, String)>, RuntimeError>,
    },
    EnvironmentLoaded {
        report: EnvironmentReport,
        seq: u64,
    },
    DatasetReady {
        result: Result<Dataset, RuntimeError>,
        seq: u64,
    },
}

// ========== 子状态结构体 ==========

/// 包详情面板（仅 Python）
pub struct DetailState {
    pub name: String,
    pub fields: Option<Result<Vec<(String, String)>, RuntimeError>>,
}

pub struct PackageViewState {
    pub result: Option<ListingResult>,
    pub selected: usize,
    pub loading: bool,
    /// 丢弃过期结果用的序号
    pub seq: u64,
    pub refreshed_at: Option<DateTime<Local>>,
    pub detail: Option<DetailState>,
}

impl PackageViewState {
    fn new() -> Self {
        Self {
            result: None,
            selected: 0,
            loading: false,
            seq: 0,
            refreshed_at: None,
            detail: None,
        }
    }

    /// 当前显示的行（失败时为诊断行）
    pub fn lines(&self) -> Vec<String> {
        match &self.result {
            Some(result) => presenter::lines(result),
            None => Vec::new(),
        }
    }

    /// 选中行对应的真实包名；诊断行和截断提示行返回 None
    pub fn selected_package(&self) -> Option<&str> {
        match &self.result {
            Some(Ok(listing)) => listing.records.get(self.selected).map(|r| r.name.as_str()),
            _ => None,
        }
    }

    /// 可选中的最后一行，截断提示行不计入
    pub fn last_selectable(&self) -> usize {
        match &self.result {
            Some(Ok(listing)) => listing.records.len().saturating_sub(1),
            _ => 0,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected < self.last_selectable() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub struct EnvironmentState {
    pub report: Option<EnvironmentReport>,
    pub loading: bool,
    pub scroll: usize,
    pub seq: u64,
}

pub struct PlotState {
    pub source: DatasetSource,
    pub point_count: u32,
    pub result: Option<Result<Dataset, RuntimeError>>,
    pub loading: bool,
    pub seq: u64,
}

impl PlotState {
    pub fn increase(&mut self) {
        self.point_count = clamp_points(self.point_count.saturating_add(POINT_STEP));
    }

    pub fn decrease(&mut self) {
        self.point_count = clamp_points(self.point_count.saturating_sub(POINT_STEP));
    }
}

// ========== App ==========

pub struct App {
    pub mode: AppMode,
    pub config: Config,
    pub lister: Option<PackageLister>,
    pub show_all: bool,
    pub r_view: PackageViewState,
    pub python_view: PackageViewState,
    pub environment: EnvironmentState,
    pub plot: PlotState,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            mode: AppMode::Dashboard,
            show_all: config.packages.show_all,
            r_view: PackageViewState::new(),
            python_view: PackageViewState::new(),
            environment: EnvironmentState {
                report: None,
                loading: false,
                scroll: 0,
                seq: 0,
            },
            plot: PlotState {
                source: config.plot.dataset,
                point_count: clamp_points(config.plot.point_count),
                result: None,
                loading: false,
                seq: 0,
            },
            lister: None,
            should_quit: false,
            config,
        }
    }

    pub fn view(&self, runtime: Runtime) -> &PackageViewState {
        match runtime {
            Runtime::R => &self.r_view,
            Runtime::Python => &self.python_view,
        }
    }

    pub fn view_mut(&mut self, runtime: Runtime) -> &mut PackageViewState {
        match runtime {
            Runtime::R => &mut self.r_view,
            Runtime::Python => &mut self.python_view,
        }
    }

    /// 根据当前开关和配置构造查询
    pub fn query(&self, runtime: Runtime) -> ListingQuery {
        ListingQuery::new(runtime)
            .show_all(self.show_all)
            .with_filter(self.config.packages.filter.iter().cloned())
    }
}
