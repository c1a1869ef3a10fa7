// ==========================================
// 钣金产能排程系统 - 领域模型层
// ==========================================
// 职责: 定义工单、产能桶、洞察与报价实体
// 红线: 不含引擎逻辑, 不含文件读写
// ==========================================

pub mod calendar;
pub mod capacity;
pub mod insight;
pub mod job;
pub mod quote;
pub mod types;

// 重导出核心类型
pub use calendar::{CalendarOverride, DayKind, OvertimeTier};
pub use capacity::{
    BucketKey, BucketLoad, CapacityCeilings, CapacityConstraint, CapacityMap, WeekBucket, WeekKey,
};
pub use insight::{
    AnalysisResult, InsightReport, InsightSummary, LateJob, MoveOption, OtRecommendation,
    OverloadedWeek, ProjectedView,
};
pub use job::{DepartmentWindow, DiagnosticKind, Job, JobDiagnostic, JobOverrides, ScheduledJob};
pub use quote::{
    BigRock, CapacityBottleneck, OvertimeWeek, QuoteFeasibility, QuoteMove, QuoteRequest,
    TierResult,
};
pub use types::{
    FeasibilityTier, JobStatus, MoveRisk, MoveScope, PushWeeks, Recommendation, ScheduleBasis,
    StageCursor,
};
