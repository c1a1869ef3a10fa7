// ==========================================
// 钣金产能排程系统 - 报价可行性领域模型
// ==========================================
// 用途: 未下单报价的三级可行性评估输入与结果
// ==========================================

use crate::domain::capacity::WeekKey;
use crate::domain::job::DepartmentWindow;
use crate::domain::types::{FeasibilityTier, PushWeeks, Recommendation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// BigRock - 高价值明细项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigRock {
    pub description: String,
    pub value: f64,
}

// ==========================================
// QuoteRequest - 报价输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub quote_id: String,
    pub total_value: f64, // 报价总金额
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub big_rocks: Vec<BigRock>,
    #[serde(default)]
    pub customer_program: bool, // 指定客户项目
    pub engineering_ready: NaiveDate,
    #[serde(default)]
    pub product_category: String,
    /// None 表示求最早可完工日
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub skip_departments: BTreeSet<String>,
    #[serde(default)]
    pub offsite_paint: bool,
}

fn default_quantity() -> u32 {
    1
}

// ==========================================
// CapacityBottleneck - 报价瓶颈桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityBottleneck {
    pub week: WeekKey,
    pub department: String,
    pub existing_points: f64,
    pub quote_points: f64,
    pub capacity: f64,
    pub shortfall: f64,
}

// ==========================================
// QuoteMove - 为报价腾挪的工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteMove {
    pub job_id: String,
    pub push_weeks: PushWeeks,
    pub buffer_days: i64,
    pub due_date: Option<NaiveDate>,
    pub completion_before: Option<NaiveDate>,
    pub completion_after: Option<NaiveDate>,
}

// ==========================================
// OvertimeWeek - 报价需要加班的周
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeWeek {
    pub week: WeekKey,
    pub department: String,
    pub scheduled_points: f64,
    pub baseline_capacity: f64,
    pub overtime_points: f64,
}

// ==========================================
// TierResult - 单层级评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierResult {
    pub tier: FeasibilityTier,
    pub feasible: bool,
    pub capacity_ceiling: f64,
    /// None 表示搜索窗口内无可用产能 (见 no_slot_department)
    pub completion: Option<NaiveDate>,
    pub no_slot_department: Option<String>,
    pub windows: Vec<DepartmentWindow>,
    pub bottlenecks: Vec<CapacityBottleneck>,
    pub moves: Vec<QuoteMove>,
    pub overtime_weeks: Vec<OvertimeWeek>,
}

// ==========================================
// QuoteFeasibility - 报价可行性结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteFeasibility {
    pub quote_id: String,
    pub points: f64,
    pub start_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub tier1: TierResult,
    pub tier2: Option<TierResult>,
    pub tier3: Option<TierResult>,
    pub recommendation: Recommendation,
}

impl QuoteFeasibility {
    /// 结论对应层级的完工日
    pub fn recommended_completion(&self) -> Option<NaiveDate> {
        match self.recommendation {
            Recommendation::Accept => self.tier1.completion,
            Recommendation::AcceptWithMoves => self.tier2.as_ref().and_then(|t| t.completion),
            Recommendation::AcceptWithOvertime => self.tier3.as_ref().and_then(|t| t.completion),
            Recommendation::Decline => None,
        }
    }
}
