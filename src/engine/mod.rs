// ==========================================
// 钣金产能排程系统 - 引擎层
// ==========================================
// 职责: 排程、产能汇总、洞察、调整方案、报价评估
// 红线: 引擎不做文件读写; now 一律由调用方注入
// ==========================================

pub mod calendar;
pub mod capacity_map;
pub mod error;
pub mod insights;
pub mod mitigation;
pub mod orchestrator;
pub mod pipeline;
pub mod quote;
pub mod scenario;
pub mod scheduler;
pub mod snapshot;

// 重导出核心引擎
pub use calendar::ShopCalendar;
pub use capacity_map::{BucketContributions, CapacityMapBuilder, SpreadModel};
pub use error::{EngineError, EngineResult};
pub use insights::InsightsAnalyzer;
pub use mitigation::{MitigationEngine, MitigationPlan, SalesOrderIndex};
pub use orchestrator::Orchestrator;
pub use pipeline::{normalize_department, DepartmentPipeline, StagePlan};
pub use quote::QuoteFeasibilityEngine;
pub use scenario::{ScenarioResult, ScenarioRunner};
pub use scheduler::{ChainPlacement, ChainRequest, ScheduleOutcome, Scheduler, SlotPolicy};
pub use snapshot::canonical_text;
