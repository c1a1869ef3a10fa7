// ==========================================
// 钣金产能排程系统 - 车间日历领域模型
// ==========================================
// 用途: 日历覆写 (节假日 / 加班日) 与加班档位工时配置
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// DayKind - 日历覆写类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayKind {
    Work,     // 强制工作日
    Off,      // 停工 (节假日)
    Overtime, // 加班工作日 (如周六)
}

impl DayKind {
    pub fn is_work(&self) -> bool {
        matches!(self, DayKind::Work | DayKind::Overtime)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WORK" | "WORKDAY" | "OPEN" => Some(DayKind::Work),
            "OFF" | "HOLIDAY" | "CLOSED" => Some(DayKind::Off),
            "OT" | "OVERTIME" => Some(DayKind::Overtime),
            _ => None,
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayKind::Work => write!(f, "WORK"),
            DayKind::Off => write!(f, "OFF"),
            DayKind::Overtime => write!(f, "OVERTIME"),
        }
    }
}

// ==========================================
// CalendarOverride - 单日覆写
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarOverride {
    pub date: NaiveDate,
    pub kind: DayKind,
    #[serde(default)]
    pub note: Option<String>,
}

// ==========================================
// OvertimeTier - 加班档位
// ==========================================
// 红线: 奖励点数为固定常量, 档位越高奖励越大
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeTier {
    pub tier: u8,
    pub weekday_hours: f64,  // 工作日每日工时
    pub saturday_hours: f64, // 周六工时
    pub bonus_points: f64,   // 约等的周产能增量
}

impl OvertimeTier {
    pub fn new(tier: u8, weekday_hours: f64, saturday_hours: f64, bonus_points: f64) -> Self {
        Self {
            tier,
            weekday_hours,
            saturday_hours,
            bonus_points,
        }
    }

    /// 默认四档加班配置 (基准 8 小时/工作日)
    pub fn standard_tiers() -> Vec<OvertimeTier> {
        vec![
            OvertimeTier::new(1, 9.0, 0.0, 105.0),
            OvertimeTier::new(2, 10.0, 0.0, 210.0),
            OvertimeTier::new(3, 10.0, 4.0, 295.0),
            OvertimeTier::new(4, 10.0, 8.0, 380.0),
        ]
    }

    /// 相对 8 小时基准的每周额外工时
    pub fn extra_weekly_hours(&self) -> f64 {
        (self.weekday_hours - 8.0).max(0.0) * 5.0 + self.saturday_hours
    }
}
