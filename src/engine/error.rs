// ==========================================
// 钣金产能排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单条工单问题走诊断列表, 不走错误类型
// ==========================================

use crate::config::ConfigError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("引擎配置无效: {0}")]
    Config(#[from] ConfigError),

    #[error("报价输入无效 (quote_id={quote_id}): {message}")]
    InvalidQuote { quote_id: String, message: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
