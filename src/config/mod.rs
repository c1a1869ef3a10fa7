// ==========================================
// 钣金产能排程系统 - 配置层
// ==========================================
// 职责: 引擎配置定义、加载、校验
// 存储: JSON 文件 / 环境变量 / 内置默认值
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;

// 重导出核心配置
pub use config_manager::{ConfigManager, CONFIG_PATH_ENV};
pub use engine_config::{
    default_pipeline, CapacityConstants, DepartmentSpec, EngineConfig, MitigationRules,
    QuoteSizing, SchedulingRules,
};
pub use error::ConfigError;
