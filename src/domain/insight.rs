// ==========================================
// 钣金产能排程系统 - 排程洞察领域模型
// ==========================================
// 用途: 延期工单 / 超载周 / 调整方案 / 加班建议 / 汇总报告
// 生命周期: 每次调用重新计算, 调用方读取后即丢弃
// ==========================================

use crate::domain::capacity::WeekKey;
use crate::domain::job::{JobDiagnostic, ScheduledJob};
use crate::domain::types::{MoveRisk, MoveScope, PushWeeks};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// LateJob - 延期工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateJob {
    pub job_id: String,
    pub due_date: NaiveDate,
    pub completion: NaiveDate,
    pub lateness_days: i64,            // 延期工作日数
    pub bottleneck_department: String, // 瓶颈工序
}

// ==========================================
// OverloadedWeek - 超载周
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadedWeek {
    pub week: WeekKey,
    pub stage: usize,
    pub department: String,
    pub scheduled_points: f64,
    pub capacity: f64,
    pub excess: f64, // scheduled - capacity
}

// ==========================================
// MoveOption - 推移调整方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveOption {
    pub option_id: String,
    pub scope: MoveScope,
    pub scope_key: String,    // 工单号或销售订单号
    pub job_ids: Vec<String>, // 本方案推移的全部工单
    pub week: WeekKey,        // 目标超载周
    pub department: String,
    pub push_weeks: PushWeeks,
    pub risk: MoveRisk,
    pub relieves_overload: bool,
    pub buffer_days: i64, // 触发工单的原始缓冲

    // ===== 模拟影响 =====
    pub late_before: usize,
    pub late_after: usize,
    pub newly_on_time: Vec<String>,
}

// ==========================================
// OtRecommendation - 加班建议
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtRecommendation {
    pub week: WeekKey,
    pub department: String,
    pub excess: f64,
    pub tier: u8,
    pub weekday_hours: f64,
    pub saturday_hours: f64,
    pub bonus_points: f64,
    pub clears_excess: bool,
    pub remaining_excess: f64, // 最高档仍无法消化的点数
}

// ==========================================
// ProjectedView - 调整后预测视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedView {
    pub applied_moves: Vec<String>, // 应用的方案ID
    pub overtime_weeks: Vec<String>, // 应用加班的桶 (周/工序)
    pub late_jobs: Vec<LateJob>,
    pub overloaded_weeks: Vec<OverloadedWeek>,
}

// ==========================================
// InsightSummary - 汇总计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightSummary {
    pub total_jobs: usize,
    pub scheduled_jobs: usize,
    pub excluded_jobs: usize,
    pub on_time_count: usize,
    pub late_count: usize,
    pub weeks_needing_overtime: usize,
    pub total_excess_points: f64,
    pub projected_late_after_moves: usize,
    pub projected_late_after_moves_and_ot: usize,
}

// ==========================================
// InsightReport - 洞察报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub now: NaiveDate,
    pub late_jobs: Vec<LateJob>,
    pub overloaded_weeks: Vec<OverloadedWeek>,
    pub move_options: Vec<MoveOption>,
    pub ot_recommendations: Vec<OtRecommendation>,
    pub projected_after_moves: ProjectedView,
    pub projected_after_moves_and_ot: ProjectedView,
    pub summary: InsightSummary,
    pub diagnostics: Vec<JobDiagnostic>,
}

// ==========================================
// AnalysisResult - 全链路输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub jobs: Vec<ScheduledJob>,
    pub report: InsightReport,
}
