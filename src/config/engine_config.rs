// ==========================================
// 钣金产能排程系统 - 引擎配置项
// ==========================================
// 职责: 工序序列、产能常量、排程规则、加班档位、报价折算
// 红线: 工序序列与产能常量只在这里定义, 引擎通过注入读取
// ==========================================

use crate::config::error::ConfigError;
use crate::domain::calendar::OvertimeTier;
use crate::domain::types::normalize_department;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// DepartmentSpec - 工序定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSpec {
    /// 工序代码 (规范化大写, 如 PRESS_BRAKE)
    pub code: String,

    /// 显示名称
    pub name: String,

    /// 点数分摊权重 (整数, 便于精确分摊)
    pub share_weight: u32,

    /// 单工单每个工作日可推进的点数
    pub points_per_day: f64,
}

impl DepartmentSpec {
    pub fn new(code: &str, name: &str, share_weight: u32, points_per_day: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            share_weight,
            points_per_day,
        }
    }
}

/// 默认六工序: 工程 → 激光 → 折弯 → 焊接 → 抛光 → 装配
pub fn default_pipeline() -> Vec<DepartmentSpec> {
    vec![
        DepartmentSpec::new("ENGINEERING", "Engineering", 10, 8.0),
        DepartmentSpec::new("LASER", "Laser", 15, 12.0),
        DepartmentSpec::new("PRESS_BRAKE", "Press Brake", 15, 10.0),
        DepartmentSpec::new("WELDING", "Welding", 30, 8.0),
        DepartmentSpec::new("POLISHING", "Polishing", 10, 10.0),
        DepartmentSpec::new("ASSEMBLY", "Assembly", 20, 10.0),
    ]
}

// ==========================================
// CapacityConstants - 产能常量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConstants {
    /// 基准周产能上限 (点/工序/周)
    pub baseline_weekly_points: f64,

    /// 加班周产能上限 (报价 Tier 3 使用)
    pub overtime_weekly_points: f64,
}

impl Default for CapacityConstants {
    fn default() -> Self {
        Self {
            baseline_weekly_points: 850.0,
            overtime_weekly_points: 1000.0,
        }
    }
}

// ==========================================
// SchedulingRules - 排程规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingRules {
    /// 相邻工序之间的交接间隔 (工作日)
    pub department_gap_days: u32,

    /// 外协喷涂追加工期 (工作日)
    pub offsite_paint_days: u32,

    /// 承载外协喷涂追加工期的工序
    pub paint_department: String,

    /// 产能搜索窗口 (周)
    pub search_horizon_weeks: u32,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            department_gap_days: 1,
            offsite_paint_days: 8,
            paint_department: "ASSEMBLY".to_string(),
            search_horizon_weeks: 52,
        }
    }
}

// ==========================================
// MitigationRules - 调整方案规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MitigationRules {
    /// 每个超载周最多评估的候选工单数
    pub max_candidates_per_week: usize,
}

impl Default for MitigationRules {
    fn default() -> Self {
        Self {
            max_candidates_per_week: 5,
        }
    }
}

// ==========================================
// QuoteSizing - 报价点数折算
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSizing {
    /// 每点对应金额
    pub dollars_per_point: f64,

    /// 高价值外购件的工作量系数 (相对普通金额)
    pub big_rock_effort_factor: f64,

    /// 第二件起每件追加点数
    pub extra_unit_points: f64,

    /// 指定客户项目的点数系数
    pub program_multiplier: f64,

    /// 最小点数
    pub min_points: f64,

    /// Tier 2 最多推移的工单数
    pub max_moves: usize,
}

impl Default for QuoteSizing {
    fn default() -> Self {
        Self {
            dollars_per_point: 1000.0,
            big_rock_effort_factor: 0.35,
            extra_unit_points: 0.5,
            program_multiplier: 0.9,
            min_points: 1.0,
            max_moves: 6,
        }
    }
}

// ==========================================
// EngineConfig - 引擎总配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_pipeline")]
    pub pipeline: Vec<DepartmentSpec>,
    #[serde(default)]
    pub capacity: CapacityConstants,
    #[serde(default)]
    pub scheduling: SchedulingRules,
    #[serde(default = "OvertimeTier::standard_tiers")]
    pub overtime_tiers: Vec<OvertimeTier>,
    #[serde(default)]
    pub mitigation: MitigationRules,
    #[serde(default)]
    pub quote: QuoteSizing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline(),
            capacity: CapacityConstants::default(),
            scheduling: SchedulingRules::default(),
            overtime_tiers: OvertimeTier::standard_tiers(),
            mitigation: MitigationRules::default(),
            quote: QuoteSizing::default(),
        }
    }
}

impl EngineConfig {
    /// 校验配置
    ///
    /// 规则:
    /// 1) 工序序列非空、代码唯一 (按规范化代码比较)、权重与产出率为正
    /// 2) 产能上限为正, 加班上限不低于基准上限
    /// 3) 加班档位编号与奖励点数严格递增且为正
    /// 4) 喷涂工序必须在工序序列中
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.is_empty() {
            return Err(ConfigError::Invalid("工序序列为空".to_string()));
        }

        let mut codes = BTreeSet::new();
        for dept in &self.pipeline {
            if dept.code.trim().is_empty() {
                return Err(ConfigError::Invalid("工序代码为空".to_string()));
            }
            if !codes.insert(normalize_department(&dept.code)) {
                return Err(ConfigError::Invalid(format!("工序代码重复: {}", dept.code)));
            }
            if dept.share_weight == 0 {
                return Err(ConfigError::InvalidField {
                    field: format!("pipeline.{}.share_weight", dept.code),
                    message: "必须大于 0".to_string(),
                });
            }
            if !(dept.points_per_day.is_finite() && dept.points_per_day > 0.0) {
                return Err(ConfigError::InvalidField {
                    field: format!("pipeline.{}.points_per_day", dept.code),
                    message: format!("必须为正数, 实际 {}", dept.points_per_day),
                });
            }
        }

        let cap = &self.capacity;
        if !(cap.baseline_weekly_points.is_finite() && cap.baseline_weekly_points > 0.0) {
            return Err(ConfigError::InvalidField {
                field: "capacity.baseline_weekly_points".to_string(),
                message: format!("必须为正数, 实际 {}", cap.baseline_weekly_points),
            });
        }
        if !(cap.overtime_weekly_points.is_finite()
            && cap.overtime_weekly_points >= cap.baseline_weekly_points)
        {
            return Err(ConfigError::InvalidField {
                field: "capacity.overtime_weekly_points".to_string(),
                message: "不得低于基准周产能".to_string(),
            });
        }

        if !codes.contains(&normalize_department(&self.scheduling.paint_department)) {
            return Err(ConfigError::InvalidField {
                field: "scheduling.paint_department".to_string(),
                message: format!("工序不存在: {}", self.scheduling.paint_department),
            });
        }
        if self.scheduling.search_horizon_weeks == 0 {
            return Err(ConfigError::InvalidField {
                field: "scheduling.search_horizon_weeks".to_string(),
                message: "必须大于 0".to_string(),
            });
        }

        if self.overtime_tiers.is_empty() {
            return Err(ConfigError::Invalid("加班档位为空".to_string()));
        }
        if self.overtime_tiers[0].bonus_points <= 0.0 {
            return Err(ConfigError::Invalid("加班档位奖励点数必须为正".to_string()));
        }
        for pair in self.overtime_tiers.windows(2) {
            if pair[1].tier <= pair[0].tier || pair[1].bonus_points <= pair[0].bonus_points {
                return Err(ConfigError::Invalid(format!(
                    "加班档位必须严格递增: tier {} -> tier {}",
                    pair[0].tier, pair[1].tier
                )));
            }
        }

        if !(self.quote.dollars_per_point.is_finite() && self.quote.dollars_per_point > 0.0) {
            return Err(ConfigError::InvalidField {
                field: "quote.dollars_per_point".to_string(),
                message: "必须为正数".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.len(), 6);
        assert_eq!(config.capacity.baseline_weekly_points, 850.0);
        assert_eq!(config.capacity.overtime_weekly_points, 1000.0);
        let total: u32 = config.pipeline.iter().map(|d| d.share_weight).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_duplicate_department_rejected() {
        let mut config = EngineConfig::default();
        config.pipeline[1].code = "ENGINEERING".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_after_normalization_rejected() {
        let mut config = EngineConfig::default();
        config.pipeline[3].code = "Press Brake".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.pipeline[3].code = "press-brake".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paint_department_matched_after_normalization() {
        let mut config = EngineConfig::default();
        config.scheduling.paint_department = "assembly".to_string();
        assert!(config.validate().is_ok());

        config.scheduling.paint_department = "PAINT".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_non_increasing_tiers_rejected() {
        let mut config = EngineConfig::default();
        config.overtime_tiers[2].bonus_points = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "capacity": { "baseline_weekly_points": 900.0 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.capacity.baseline_weekly_points, 900.0);
        assert_eq!(config.capacity.overtime_weekly_points, 1000.0);
        assert_eq!(config.pipeline, default_pipeline());
        assert_eq!(config.scheduling.search_horizon_weeks, 52);
    }
}
