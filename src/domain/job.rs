// ==========================================
// 钣金产能排程系统 - 工单领域模型
// ==========================================
// 红线: due_date 为业务承诺, 任何引擎与模拟都不得改写
// 用途: 外部导入的工单快照 + 排程引擎输出的标注结果
// ==========================================

use crate::domain::types::{JobStatus, StageCursor};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// JobOverrides - 单工单覆写
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOverrides {
    /// 跳过的工序代码 (已规范化, 如 PRESS_BRAKE)
    #[serde(default)]
    pub skip_departments: BTreeSet<String>,

    /// 取消工序之间的等待间隔 (连续排布)
    #[serde(default)]
    pub no_gaps: bool,

    /// 需外协喷涂 (喷涂工序工期加长)
    #[serde(default)]
    pub offsite_paint: bool,
}

// ==========================================
// DepartmentWindow - 工序时间窗
// ==========================================
// 起止日期均为工作日, 闭区间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentWindow {
    pub stage: usize,       // 工序序列下标
    pub department: String, // 工序代码
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: f64, // 该时间窗承载的点数
}

impl DepartmentWindow {
    /// 判断本窗口是否被另一窗口完全包含
    pub fn is_within(&self, outer: &DepartmentWindow) -> bool {
        self.department == outer.department && self.start >= outer.start && self.end <= outer.end
    }
}

// ==========================================
// Job - 工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    // ===== 主键 =====
    pub job_id: String,

    // ===== 工作量与承诺 =====
    pub points: f64,                   // 工作量点数
    pub due_date: Option<NaiveDate>,   // 承诺交期 (只读)
    #[serde(default)]
    pub product_category: String,

    // ===== 进度 =====
    pub current_department: String, // 当前工序代码
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub priority: bool,

    // ===== 覆写与分组 =====
    #[serde(default)]
    pub overrides: JobOverrides,
    #[serde(default)]
    pub sales_order: Option<String>, // 销售订单号 (分组键, 非所有权)

    /// 剩余工序最早开工日 (计划暂缓 / 模拟推移)
    #[serde(default)]
    pub hold_until: Option<NaiveDate>,

    // ===== 排程结果 =====
    #[serde(default)]
    pub department_schedule: Vec<DepartmentWindow>, // 完整工序窗
    #[serde(default)]
    pub remaining_schedule: Vec<DepartmentWindow>, // 当前工序起的剩余窗
}

impl Job {
    /// 创建一个未排程的工单
    pub fn new(
        job_id: impl Into<String>,
        points: f64,
        due_date: Option<NaiveDate>,
        current_department: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            points,
            due_date,
            product_category: String::new(),
            current_department: current_department.into(),
            status: JobStatus::NotStarted,
            priority: false,
            overrides: JobOverrides::default(),
            sales_order: None,
            hold_until: None,
            department_schedule: Vec::new(),
            remaining_schedule: Vec::new(),
        }
    }

    /// 查找完整排程中某工序的时间窗
    pub fn full_window(&self, department: &str) -> Option<&DepartmentWindow> {
        self.department_schedule
            .iter()
            .find(|w| w.department == department)
    }

    /// 销售订单键 (空字符串视为无分组)
    pub fn sales_order_key(&self) -> Option<&str> {
        self.sales_order
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ==========================================
// ScheduledJob - 排程后的工单标注
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    /// 已写入 department_schedule / remaining_schedule 的工单
    pub job: Job,
    pub cursor: StageCursor,
    pub forecast_start: Option<NaiveDate>,
    pub forecast_completion: Option<NaiveDate>,
    /// 预测完工晚于交期 (无有效交期时恒为 false)
    pub late: bool,
    /// 因产能等待而推迟开工的工序 (按工序顺序)
    pub capacity_delayed_departments: Vec<String>,
    /// 搜索窗口内找不到产能、被强制排入的工序
    pub forced_departments: Vec<String>,
}

impl ScheduledJob {
    pub fn job_id(&self) -> &str {
        &self.job.job_id
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.job.due_date
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == StageCursor::Done
    }

    /// 剩余排程的首个开工日
    pub fn first_remaining_start(&self) -> Option<NaiveDate> {
        self.job.remaining_schedule.first().map(|w| w.start)
    }
}

// ==========================================
// 工单诊断 (Job Diagnostic)
// ==========================================
// 红线: 单条坏数据不得中断整批排程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// 交期缺失: 仍参与排程, 不参与延期统计
    MissingDueDate,
    /// 点数为负或非有限值: 不参与排程
    InvalidPoints { points: f64 },
    /// 当前工序不在工序序列中: 视为工单损坏
    UnknownDepartment { department: String },
    /// 跳过列表中的未知工序: 忽略该项
    UnknownSkipDepartment { department: String },
    /// 搜索窗口内找不到产能: 强制排入
    NoSlotFound { department: String, horizon_weeks: u32 },
    /// 工单号重复: 后出现的记录不参与排程
    DuplicateJobId,
}

impl DiagnosticKind {
    /// 是否将工单排除出排程
    pub fn excludes_job(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::InvalidPoints { .. }
                | DiagnosticKind::UnknownDepartment { .. }
                | DiagnosticKind::DuplicateJobId
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingDueDate => write!(f, "交期缺失"),
            DiagnosticKind::InvalidPoints { points } => write!(f, "点数无效: {}", points),
            DiagnosticKind::UnknownDepartment { department } => {
                write!(f, "当前工序不存在: {}", department)
            }
            DiagnosticKind::UnknownSkipDepartment { department } => {
                write!(f, "跳过工序不存在: {}", department)
            }
            DiagnosticKind::NoSlotFound {
                department,
                horizon_weeks,
            } => write!(f, "{} 周内无可用产能: {}", horizon_weeks, department),
            DiagnosticKind::DuplicateJobId => write!(f, "工单号重复"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDiagnostic {
    pub job_id: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl JobDiagnostic {
    pub fn new(job_id: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
        }
    }
}

impl fmt::Display for JobDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.job_id, self.kind)
    }
}
