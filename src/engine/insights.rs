// ==========================================
// 钣金产能排程系统 - 排程洞察分析器
// ==========================================
// 职责: 延期工单识别、瓶颈定位、超载周识别、缓冲计算
// 输入: 排程后工单 + 产能负荷表 + 周产能上限
// 输出: LateJob / OverloadedWeek 列表
// 红线: 只读分析, 不修改任何工单
// ==========================================

use crate::domain::capacity::{CapacityCeilings, CapacityConstraint, CapacityMap};
use crate::domain::insight::{LateJob, OverloadedWeek};
use crate::domain::job::ScheduledJob;
use crate::engine::calendar::ShopCalendar;
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// InsightsAnalyzer - 排程洞察分析器
// ==========================================
#[derive(Debug, Clone)]
pub struct InsightsAnalyzer {
    calendar: ShopCalendar,
}

impl InsightsAnalyzer {
    pub fn new(calendar: ShopCalendar) -> Self {
        Self { calendar }
    }

    // ==========================================
    // 延期工单
    // ==========================================

    /// 识别延期工单 (按工单号排序)
    ///
    /// 已完工或无交期的工单不参与
    pub fn late_jobs(&self, jobs: &[ScheduledJob]) -> Vec<LateJob> {
        let mut late: Vec<LateJob> = jobs
            .iter()
            .filter(|job| !job.is_complete())
            .filter_map(|job| {
                let due = job.due_date()?;
                let completion = job.forecast_completion?;
                if completion <= due {
                    return None;
                }
                Some(LateJob {
                    job_id: job.job_id().to_string(),
                    due_date: due,
                    completion,
                    lateness_days: self.calendar.business_days_between(due, completion),
                    bottleneck_department: Self::bottleneck_department(job),
                })
            })
            .collect();
        late.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        debug!(late_count = late.len(), "延期工单识别完成");
        late
    }

    /// 瓶颈工序: 链路中最后一个结束日不早于完工日的工序
    pub fn bottleneck_department(job: &ScheduledJob) -> String {
        let completion = job.forecast_completion;
        job.job
            .department_schedule
            .iter()
            .rev()
            .find(|w| Some(w.end) >= completion)
            .map(|w| w.department.clone())
            .unwrap_or_else(|| job.job.current_department.clone())
    }

    // ==========================================
    // 超载周
    // ==========================================

    /// 识别超载的 周 × 工序 桶 (按周 → 工序顺序)
    pub fn overloaded_weeks(
        &self,
        map: &CapacityMap,
        ceilings: &CapacityCeilings,
    ) -> Vec<OverloadedWeek> {
        map.iter()
            .filter_map(|(key, _)| {
                let load = map.bucket_load(key, ceilings);
                load.is_overloaded().then(|| OverloadedWeek {
                    week: key.week,
                    stage: key.stage,
                    department: key.department.clone(),
                    scheduled_points: load.used,
                    capacity: load.limit,
                    excess: load.excess_points(),
                })
            })
            .collect()
    }

    // ==========================================
    // 缓冲
    // ==========================================

    /// 工单缓冲 (工作日, 正数为富余)
    ///
    /// 已完工 / 无交期 / 无预测完工日时返回 None
    pub fn buffer_days(&self, job: &ScheduledJob) -> Option<i64> {
        if job.is_complete() {
            return None;
        }
        let due = job.due_date()?;
        let completion = job.forecast_completion?;
        Some(self.calendar.business_days_between(completion, due))
    }

    /// 全部工单的缓冲表
    pub fn buffers(&self, jobs: &[ScheduledJob]) -> BTreeMap<String, i64> {
        jobs.iter()
            .filter_map(|job| {
                self.buffer_days(job)
                    .map(|buffer| (job.job_id().to_string(), buffer))
            })
            .collect()
    }

    /// 按期工单数 (未完工且有交期)
    pub fn on_time_count(jobs: &[ScheduledJob]) -> usize {
        jobs.iter()
            .filter(|job| !job.is_complete() && job.due_date().is_some() && !job.late)
            .count()
    }
}
