// ==========================================
// 钣金产能排程系统 - 核心库
// ==========================================
// 工序: 工程 → 激光 → 折弯 → 焊接 → 抛光 → 装配
// 系统定位: 决策支持系统 (只给建议, 不改写承诺交期)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 排程与分析
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    FeasibilityTier, JobStatus, MoveRisk, MoveScope, PushWeeks, Recommendation, ScheduleBasis,
    StageCursor,
};

// 领域实体
pub use domain::{
    AnalysisResult, CapacityCeilings, CapacityMap, InsightReport, Job, JobDiagnostic,
    QuoteFeasibility, QuoteRequest, ScheduledJob, WeekKey,
};

// 配置
pub use config::{ConfigManager, EngineConfig};

// 引擎
pub use engine::{
    CapacityMapBuilder, DepartmentPipeline, InsightsAnalyzer, MitigationEngine, Orchestrator,
    QuoteFeasibilityEngine, ScenarioRunner, Scheduler, ShopCalendar,
};

// 导入
pub use importer::{JobImporter, load_calendar_overrides};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "钣金产能排程系统";
