// ==========================================
// 钣金产能排程系统 - 产能桶领域模型
// ==========================================
// 红线: 产能是计划信号, 不是硬约束; 超载由分析层标记
// 用途: 工序 × ISO 周 的点数汇总与上限
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// 浮点比较容差 (点数)
pub const POINTS_EPSILON: f64 = 1e-6;

// ==========================================
// WeekKey - ISO 周键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub iso_year: i32,
    pub week: u32,
}

impl WeekKey {
    /// 取日期所在的 ISO 周
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            iso_year: iso.year(),
            week: iso.week(),
        }
    }

    /// 该周周一
    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.iso_year, self.week, Weekday::Mon)
    }

    /// 解析 "2026-W06" 形式
    pub fn parse(s: &str) -> Option<Self> {
        let (year, week) = s.trim().split_once("-W")?;
        let key = Self {
            iso_year: year.parse().ok()?,
            week: week.parse().ok()?,
        };
        key.monday().map(|_| key)
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.iso_year, self.week)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WeekKey::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("无效的 ISO 周: {}", raw)))
    }
}

// ==========================================
// BucketKey - 产能桶键 (周 × 工序)
// ==========================================
// 排序: 先按周, 再按工序顺序
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub week: WeekKey,
    pub stage: usize,
    pub department: String,
}

impl BucketKey {
    pub fn new(week: WeekKey, stage: usize, department: impl Into<String>) -> Self {
        Self {
            week,
            stage,
            department: department.into(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.week, self.department)
    }
}

// ==========================================
// WeekBucket - 周产能桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub week: WeekKey,
    pub stage: usize,
    pub department: String,
    pub points: f64, // 已分配点数
}

// ==========================================
// CapacityCeilings - 周产能上限
// ==========================================
// 基准上限 + 按桶覆写 (加班模拟时抬升)
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityCeilings {
    pub baseline: f64,
    pub overrides: BTreeMap<BucketKey, f64>,
}

impl CapacityCeilings {
    pub fn uniform(baseline: f64) -> Self {
        Self {
            baseline,
            overrides: BTreeMap::new(),
        }
    }

    pub fn ceiling_for(&self, key: &BucketKey) -> f64 {
        self.overrides.get(key).copied().unwrap_or(self.baseline)
    }

    /// 在某个桶上叠加加班奖励点数
    pub fn add_bonus(&mut self, key: BucketKey, bonus: f64) {
        let current = self.ceiling_for(&key);
        self.overrides.insert(key, current + bonus);
    }
}

// ==========================================
// CapacityMap - 产能负荷表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityMap {
    buckets: BTreeMap<BucketKey, f64>,
}

impl CapacityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加点数 (唯一写入口)
    pub fn add(&mut self, key: BucketKey, points: f64) {
        *self.buckets.entry(key).or_insert(0.0) += points;
    }

    pub fn load(&self, key: &BucketKey) -> f64 {
        self.buckets.get(key).copied().unwrap_or(0.0)
    }

    /// 某桶在给定上限下的负荷视图
    pub fn bucket_load(&self, key: &BucketKey, ceilings: &CapacityCeilings) -> BucketLoad {
        BucketLoad {
            used: self.load(key),
            limit: ceilings.ceiling_for(key),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &f64)> {
        self.buckets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// 导出为有序的周产能桶列表
    pub fn buckets(&self) -> Vec<WeekBucket> {
        self.buckets
            .iter()
            .map(|(key, points)| WeekBucket {
                week: key.week,
                stage: key.stage,
                department: key.department.clone(),
                points: *points,
            })
            .collect()
    }
}

// ==========================================
// BucketLoad - 单桶负荷
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketLoad {
    pub used: f64,
    pub limit: f64,
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: 排程器与报价引擎的产能检查接口
pub trait CapacityConstraint {
    /// 检查是否可再加入给定点数
    fn can_add_points(&self, points: f64) -> bool;

    /// 检查是否超载
    fn is_overloaded(&self) -> bool;

    /// 剩余产能 (点)
    fn remaining_points(&self) -> f64;

    /// 超载点数
    fn excess_points(&self) -> f64;
}

impl CapacityConstraint for BucketLoad {
    fn can_add_points(&self, points: f64) -> bool {
        self.used + points <= self.limit + POINTS_EPSILON
    }

    fn is_overloaded(&self) -> bool {
        self.used > self.limit + POINTS_EPSILON
    }

    fn remaining_points(&self) -> f64 {
        (self.limit - self.used).max(0.0)
    }

    fn excess_points(&self) -> f64 {
        if self.is_overloaded() {
            self.used - self.limit
        } else {
            0.0
        }
    }
}
