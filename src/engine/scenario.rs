// ==========================================
// 钣金产能排程系统 - 场景模拟器
// ==========================================
// 职责: 排程 → 负荷表 → 洞察 的整链重算
// 红线: 只在副本上模拟, 不回写基准排程; 交期不可改写
// ==========================================

use crate::config::EngineConfig;
use crate::domain::capacity::{CapacityCeilings, CapacityMap};
use crate::domain::insight::{LateJob, OverloadedWeek};
use crate::domain::job::{Job, JobDiagnostic, ScheduledJob};
use crate::domain::types::{PushWeeks, ScheduleBasis};
use crate::engine::calendar::ShopCalendar;
use crate::engine::insights::InsightsAnalyzer;
use crate::engine::scheduler::Scheduler;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

// ==========================================
// ScenarioResult - 一次整链计算的结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub jobs: Vec<ScheduledJob>,
    pub diagnostics: Vec<JobDiagnostic>,
    /// 剩余口径负荷表
    pub capacity: CapacityMap,
    pub ceilings: CapacityCeilings,
    pub late_jobs: Vec<LateJob>,
    pub overloaded_weeks: Vec<OverloadedWeek>,
}

impl ScenarioResult {
    pub fn job(&self, job_id: &str) -> Option<&ScheduledJob> {
        self.jobs.iter().find(|j| j.job_id() == job_id)
    }

    pub fn late_ids(&self) -> BTreeSet<String> {
        self.late_jobs.iter().map(|l| l.job_id.clone()).collect()
    }

    /// 排程后工单快照 (可作为下一次模拟的输入)
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.iter().map(|j| j.job.clone()).collect()
    }

    /// 工单在本场景中是否按期 (必须有交期)
    pub fn is_on_time(&self, job_id: &str) -> bool {
        self.job(job_id)
            .is_some_and(|j| j.due_date().is_some() && !j.late)
    }
}

// ==========================================
// ScenarioRunner - 场景模拟器
// ==========================================
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    scheduler: Scheduler,
    analyzer: InsightsAnalyzer,
}

impl ScenarioRunner {
    pub fn new(config: &EngineConfig, calendar: ShopCalendar) -> Self {
        Self {
            scheduler: Scheduler::new(config, calendar.clone()),
            analyzer: InsightsAnalyzer::new(calendar),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn analyzer(&self) -> &InsightsAnalyzer {
        &self.analyzer
    }

    /// 整链计算
    #[instrument(skip(self, jobs, ceilings), fields(jobs_count = jobs.len()))]
    pub fn run(&self, jobs: &[Job], now: NaiveDate, ceilings: &CapacityCeilings) -> ScenarioResult {
        let outcome = self.scheduler.schedule(jobs, now, ceilings);
        let capacity = self
            .scheduler
            .builder()
            .build(&outcome.jobs, ScheduleBasis::Remaining);
        let late_jobs = self.analyzer.late_jobs(&outcome.jobs);
        let overloaded_weeks = self.analyzer.overloaded_weeks(&capacity, ceilings);

        ScenarioResult {
            jobs: outcome.jobs,
            diagnostics: outcome.diagnostics,
            capacity,
            ceilings: ceilings.clone(),
            late_jobs,
            overloaded_weeks,
        }
    }

    /// 推移模拟: 在基准结果的副本上设置暂缓日后重算
    ///
    /// 暂缓日 = 剩余排程首个开工日 + 推移周数 × 7 天
    pub fn simulate_push(
        &self,
        baseline: &ScenarioResult,
        pushes: &BTreeMap<String, PushWeeks>,
        now: NaiveDate,
        ceilings: &CapacityCeilings,
    ) -> ScenarioResult {
        let jobs = Self::apply_pushes(&baseline.jobs, pushes);
        debug!(pushes = pushes.len(), "推移模拟");
        self.run(&jobs, now, ceilings)
    }

    /// 生成带暂缓日的工单副本
    pub fn apply_pushes(jobs: &[ScheduledJob], pushes: &BTreeMap<String, PushWeeks>) -> Vec<Job> {
        jobs.iter()
            .map(|scheduled| {
                let mut job = scheduled.job.clone();
                if let (Some(push), Some(start)) =
                    (pushes.get(job.job_id.as_str()), scheduled.first_remaining_start())
                {
                    job.hold_until = Some(start + Duration::days(push.calendar_days()));
                }
                job
            })
            .collect()
    }
}
