// ==========================================
// 钣金产能排程系统 - 产能负荷表构建器
// ==========================================
// 职责: 工序时间窗 → 周 × 工序 点数汇总
// 输入: 已排程工单 + 汇总口径 (剩余 / 完整)
// 输出: CapacityMap + 每桶的工单贡献明细
// ==========================================

use crate::domain::capacity::{BucketKey, CapacityMap, WeekKey};
use crate::domain::job::{DepartmentWindow, ScheduledJob};
use crate::domain::types::ScheduleBasis;
use crate::engine::calendar::ShopCalendar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 每桶的工单贡献: 桶 → (工单号 → 点数)
pub type BucketContributions = BTreeMap<BucketKey, BTreeMap<String, f64>>;

// ==========================================
// SpreadModel - 点数摊分模型
// ==========================================
// EvenSpread: 时间窗点数按工作日平均摊到每一天, 再按 ISO 周汇总
// 这是近似模型, 不反映工序内部的真实负荷曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadModel {
    #[default]
    EvenSpread,
}

impl SpreadModel {
    /// 将时间窗点数摊到各 ISO 周
    pub fn spread(
        &self,
        calendar: &ShopCalendar,
        window: &DepartmentWindow,
    ) -> BTreeMap<WeekKey, f64> {
        match self {
            SpreadModel::EvenSpread => {
                let mut by_week = BTreeMap::new();
                let days = calendar.work_days_in(window.start, window.end);
                if days.is_empty() {
                    by_week.insert(WeekKey::of(window.start), window.points);
                    return by_week;
                }

                let per_day = window.points / days.len() as f64;
                for day in days {
                    *by_week.entry(WeekKey::of(day)).or_insert(0.0) += per_day;
                }
                by_week
            }
        }
    }
}

// ==========================================
// CapacityMapBuilder - 产能负荷表构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct CapacityMapBuilder {
    calendar: ShopCalendar,
    model: SpreadModel,
}

impl CapacityMapBuilder {
    pub fn new(calendar: ShopCalendar) -> Self {
        Self {
            calendar,
            model: SpreadModel::EvenSpread,
        }
    }

    /// 单个时间窗的桶分布
    pub fn window_buckets(&self, window: &DepartmentWindow) -> Vec<(BucketKey, f64)> {
        self.model
            .spread(&self.calendar, window)
            .into_iter()
            .map(|(week, points)| {
                (
                    BucketKey::new(week, window.stage, window.department.clone()),
                    points,
                )
            })
            .collect()
    }

    /// 将单个时间窗累加进负荷表
    pub fn add_window(&self, map: &mut CapacityMap, window: &DepartmentWindow) {
        for (key, points) in self.window_buckets(window) {
            map.add(key, points);
        }
    }

    /// 构建负荷表
    ///
    /// # 参数
    /// - `jobs`: 已排程工单
    /// - `basis`: Remaining 只统计剩余工序, Full 统计完整工序
    #[instrument(skip(self, jobs), fields(jobs_count = jobs.len()))]
    pub fn build(&self, jobs: &[ScheduledJob], basis: ScheduleBasis) -> CapacityMap {
        let mut map = CapacityMap::new();
        for job in jobs {
            for window in Self::windows(job, basis) {
                self.add_window(&mut map, window);
            }
        }
        debug!(buckets = map.buckets().len(), "产能负荷表构建完成");
        map
    }

    /// 每桶的工单贡献明细
    pub fn contributions(
        &self,
        jobs: &[ScheduledJob],
        basis: ScheduleBasis,
    ) -> BucketContributions {
        let mut contributions = BucketContributions::new();
        for job in jobs {
            for window in Self::windows(job, basis) {
                for (key, points) in self.window_buckets(window) {
                    *contributions
                        .entry(key)
                        .or_default()
                        .entry(job.job_id().to_string())
                        .or_insert(0.0) += points;
                }
            }
        }
        contributions
    }

    fn windows(job: &ScheduledJob, basis: ScheduleBasis) -> &[DepartmentWindow] {
        match basis {
            ScheduleBasis::Remaining => &job.job.remaining_schedule,
            ScheduleBasis::Full => &job.job.department_schedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate, points: f64) -> DepartmentWindow {
        DepartmentWindow {
            stage: 3,
            department: "WELDING".to_string(),
            start,
            end,
            points,
        }
    }

    #[test]
    fn test_even_spread_across_week_boundary() {
        let cal = ShopCalendar::standard();
        // 周四到下周三: 本周 2 天, 下周 3 天
        let spread =
            SpreadModel::EvenSpread.spread(&cal, &window(d(2026, 2, 5), d(2026, 2, 11), 50.0));
        assert_eq!(spread.len(), 2);
        assert_eq!(spread[&WeekKey::of(d(2026, 2, 5))], 20.0);
        assert_eq!(spread[&WeekKey::of(d(2026, 2, 11))], 30.0);
    }

    #[test]
    fn test_spread_preserves_points() {
        let cal = ShopCalendar::standard();
        let spread =
            SpreadModel::EvenSpread.spread(&cal, &window(d(2026, 2, 2), d(2026, 2, 24), 77.0));
        let total: f64 = spread.values().sum();
        assert!((total - 77.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_window_accumulates() {
        let builder = CapacityMapBuilder::new(ShopCalendar::standard());
        let mut map = CapacityMap::new();
        builder.add_window(&mut map, &window(d(2026, 2, 2), d(2026, 2, 6), 40.0));
        builder.add_window(&mut map, &window(d(2026, 2, 2), d(2026, 2, 3), 10.0));
        let key = BucketKey::new(WeekKey::of(d(2026, 2, 2)), 3, "WELDING");
        assert_eq!(map.load(&key), 50.0);
    }
}
