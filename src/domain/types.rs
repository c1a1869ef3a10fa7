// ==========================================
// 钣金产能排程系统 - 领域类型定义
// ==========================================
// 职责: 枚举与值类型 (状态、范围、风险、推荐结论)
// 红线: 工序序列不在此硬编码, 由配置注入
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 规范化代码: 去空白、转大写、空格和连字符转下划线
///
/// 工序代码与状态文本共用
pub fn normalize_department(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

// ==========================================
// 工单生命周期状态 (Job Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与导入文件一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    NotStarted, // 未开工
    InProgress, // 在制 (当前工序已上线)
    OnHold,     // 暂停
    Complete,   // 已完工
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::NotStarted => write!(f, "NOT_STARTED"),
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::OnHold => write!(f, "ON_HOLD"),
            JobStatus::Complete => write!(f, "COMPLETE"),
        }
    }
}

impl JobStatus {
    /// 从字符串解析状态 (宽松匹配, 未识别返回 None)
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_department(s).as_str() {
            "" | "NOT_STARTED" | "OPEN" | "RELEASED" => Some(JobStatus::NotStarted),
            "IN_PROGRESS" | "WIP" | "STARTED" => Some(JobStatus::InProgress),
            "ON_HOLD" | "HOLD" => Some(JobStatus::OnHold),
            "COMPLETE" | "COMPLETED" | "DONE" | "SHIPPED" => Some(JobStatus::Complete),
            _ => None,
        }
    }
}

// ==========================================
// 工序游标 (Stage Cursor)
// ==========================================
// 六个有序状态 + 终态; At(i) 为工序序列下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageCursor {
    At(usize),
    Done,
}

impl StageCursor {
    /// 判断某工序是否位于当前工序或其之后
    ///
    /// 终态 Done 时所有工序都在游标之前
    pub fn is_at_or_after(&self, stage: usize) -> bool {
        match self {
            StageCursor::At(current) => stage >= *current,
            StageCursor::Done => false,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            StageCursor::At(current) => Some(*current),
            StageCursor::Done => None,
        }
    }
}

// ==========================================
// 产能汇总口径 (Schedule Basis)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleBasis {
    Remaining, // 剩余工序 (当前负荷视图)
    Full,      // 完整工序 (原始计划视图)
}

// ==========================================
// 调整范围 (Move Scope)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveScope {
    WorkOrder,  // 单个工单
    SalesOrder, // 同一销售订单下全部工单
}

impl fmt::Display for MoveScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveScope::WorkOrder => write!(f, "WO"),
            MoveScope::SalesOrder => write!(f, "SO"),
        }
    }
}

// ==========================================
// 调整风险 (Move Risk)
// ==========================================
// SAFE: 调整范围内所有工单仍按期完成
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveRisk {
    Safe,
    Moderate,
}

impl fmt::Display for MoveRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRisk::Safe => write!(f, "SAFE"),
            MoveRisk::Moderate => write!(f, "MODERATE"),
        }
    }
}

// ==========================================
// 推移周数 (Push Weeks)
// ==========================================
// 红线: 只允许 1 周或 2 周
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PushWeeks {
    One,
    Two,
}

impl PushWeeks {
    pub const ALL: [PushWeeks; 2] = [PushWeeks::One, PushWeeks::Two];

    pub fn weeks(&self) -> u8 {
        match self {
            PushWeeks::One => 1,
            PushWeeks::Two => 2,
        }
    }

    /// 推移对应的日历天数
    pub fn calendar_days(&self) -> i64 {
        i64::from(self.weeks()) * 7
    }
}

impl From<PushWeeks> for u8 {
    fn from(value: PushWeeks) -> Self {
        value.weeks()
    }
}

impl TryFrom<u8> for PushWeeks {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PushWeeks::One),
            2 => Ok(PushWeeks::Two),
            other => Err(format!("推移周数只允许 1 或 2, 实际 {}", other)),
        }
    }
}

impl fmt::Display for PushWeeks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w", self.weeks())
    }
}

// ==========================================
// 报价可行性层级 (Feasibility Tier)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeasibilityTier {
    AsCommitted,  // Tier 1: 不扰动现有排程
    WithMoves,    // Tier 2: 推移有缓冲的工单
    WithOvertime, // Tier 3: 加班产能上限
}

impl fmt::Display for FeasibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeasibilityTier::AsCommitted => write!(f, "TIER1_AS_COMMITTED"),
            FeasibilityTier::WithMoves => write!(f, "TIER2_WITH_MOVES"),
            FeasibilityTier::WithOvertime => write!(f, "TIER3_WITH_OVERTIME"),
        }
    }
}

// ==========================================
// 报价推荐结论 (Recommendation)
// ==========================================
// 顺序: 按层级严格评估, 第一个成功的层级决定结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Accept,
    AcceptWithMoves,
    AcceptWithOvertime,
    Decline,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Accept => write!(f, "ACCEPT"),
            Recommendation::AcceptWithMoves => write!(f, "ACCEPT_WITH_MOVES"),
            Recommendation::AcceptWithOvertime => write!(f, "ACCEPT_WITH_OVERTIME"),
            Recommendation::Decline => write!(f, "DECLINE"),
        }
    }
}
