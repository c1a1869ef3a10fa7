// ==========================================
// 钣金产能排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载 (文件 / 环境变量 / 默认值)、校验、快照
// 存储: JSON 文件 (部分字段缺省时回落默认值)
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::ConfigError;
use std::path::Path;
use tracing::{debug, info};

/// 环境变量: 配置文件路径
pub const CONFIG_PATH_ENV: &str = "FAB_APS_CONFIG";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EngineConfig,
    source: String,
}

impl ConfigManager {
    /// 使用默认配置
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
            source: "default".to_string(),
        }
    }

    /// 使用已构造的配置 (会先校验)
    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            source: "inline".to_string(),
        })
    }

    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// - Ok(ConfigManager): 加载并校验成功
    /// - Err(ConfigError): 读取/解析/校验失败
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::parse_json(&raw)?;
        info!(path = %path.display(), "配置文件加载完成");

        Ok(Self {
            config,
            source: path.display().to_string(),
        })
    }

    /// 从 JSON 字符串解析配置
    pub fn parse_json(raw: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 按优先级加载: 显式路径 > 环境变量 > 默认值
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            return Self::load_from_file(path);
        }

        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(path.trim()),
            _ => {
                debug!("未指定配置文件, 使用默认配置");
                Ok(Self::with_defaults())
            }
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 获取当前配置的快照 (JSON 格式)
    ///
    /// # 用途
    /// - 回归基线中记录配置, 保证重放一致
    pub fn config_snapshot(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.config)?)
    }
}
