// ==========================================
// 钣金产能排程系统 - 产能排程器
// ==========================================
// 职责: 为工单的剩余工序分配时间窗, 遵守周产能上限
// 输入: 工单快照 + now + 周产能上限
// 输出: ScheduleOutcome (排程后工单 + 诊断)
// ==========================================
// 流程:
// 1) 计划阶段: 逐工单解析游标 / 分摊点数 / 换算工期 (纯映射)
// 2) 排序: 优先单 → 交期早 → 工单号
// 3) 在制阶段: 在制工单的当前工序保持在线, 先占用产能
// 4) 串联阶段: 逐工序搜索最早可用产能, 单线程累加负荷
// 5) 回填: 当前工序之前的时间窗保留记录或向前推算
// ==========================================

use crate::config::EngineConfig;
use crate::domain::capacity::{CapacityCeilings, CapacityConstraint, CapacityMap};
use crate::domain::job::{DepartmentWindow, DiagnosticKind, Job, JobDiagnostic, ScheduledJob};
use crate::domain::types::{JobStatus, StageCursor};
use crate::engine::calendar::ShopCalendar;
use crate::engine::capacity_map::CapacityMapBuilder;
use crate::engine::pipeline::{DepartmentPipeline, StagePlan};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

// ==========================================
// SlotPolicy - 搜索窗口耗尽时的处理策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// 强制排在最早开工日并记录 (常规排程)
    ForceOnExhaustion,
    /// 停止串联并报告无产能工序 (报价评估)
    FailOnExhaustion,
    /// 不检查产能, 计算理想链路
    IgnoreCapacity,
}

/// 一条待串联的工序链
#[derive(Debug, Clone)]
pub struct ChainRequest<'a> {
    pub stages: &'a [StagePlan],
    /// 最早开工日 (now / 暂缓日 / 报价工程就绪日)
    pub earliest: NaiveDate,
    /// 已在线工序的结束日 (有则从其后串联)
    pub prev_end: Option<NaiveDate>,
    pub gap_days: u32,
    pub no_gaps: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainPlacement {
    pub windows: Vec<DepartmentWindow>,
    pub capacity_delayed: Vec<String>,
    pub forced: Vec<String>,
    /// FailOnExhaustion 下找不到产能的工序
    pub no_slot: Option<String>,
}

impl ChainPlacement {
    pub fn completion(&self) -> Option<NaiveDate> {
        if self.no_slot.is_some() {
            return None;
        }
        self.windows.last().map(|w| w.end)
    }
}

// ==========================================
// ScheduleOutcome - 排程输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// 按排程顺序输出, 不含被排除的工单
    pub jobs: Vec<ScheduledJob>,
    pub diagnostics: Vec<JobDiagnostic>,
}

struct JobPlan {
    job: Job,
    cursor: StageCursor,
    stages: Vec<StagePlan>,
}

/// 在线工序: 完整窗 + 从 now 起的剩余窗
struct PinnedWindow {
    full: DepartmentWindow,
    remaining: DepartmentWindow,
}

// ==========================================
// Scheduler - 产能排程器
// ==========================================
#[derive(Debug, Clone)]
pub struct Scheduler {
    pipeline: DepartmentPipeline,
    calendar: ShopCalendar,
    builder: CapacityMapBuilder,
    horizon_weeks: u32,
}

impl Scheduler {
    /// 构造函数
    ///
    /// # 参数
    /// - `config`: 引擎配置 (工序序列 / 排程规则)
    /// - `calendar`: 车间日历
    pub fn new(config: &EngineConfig, calendar: ShopCalendar) -> Self {
        Self {
            pipeline: DepartmentPipeline::new(config.pipeline.clone(), &config.scheduling),
            builder: CapacityMapBuilder::new(calendar.clone()),
            calendar,
            horizon_weeks: config.scheduling.search_horizon_weeks,
        }
    }

    pub fn pipeline(&self) -> &DepartmentPipeline {
        &self.pipeline
    }

    pub fn calendar(&self) -> &ShopCalendar {
        &self.calendar
    }

    pub fn builder(&self) -> &CapacityMapBuilder {
        &self.builder
    }

    pub fn horizon_weeks(&self) -> u32 {
        self.horizon_weeks
    }

    /// 搜索窗口折算的工作日数 (每周 5 天)
    fn horizon_work_days(&self) -> u32 {
        self.horizon_weeks.saturating_mul(5)
    }

    // ==========================================
    // 主入口
    // ==========================================

    /// 排程全部工单
    ///
    /// # 参数
    /// - `jobs`: 工单快照 (不会被修改)
    /// - `now`: 排程基准日
    /// - `ceilings`: 周产能上限
    ///
    /// # 返回
    /// 排程后工单 (含完整 / 剩余时间窗) 与诊断列表
    #[instrument(skip(self, jobs, ceilings), fields(jobs_count = jobs.len(), now = %now))]
    pub fn schedule(
        &self,
        jobs: &[Job],
        now: NaiveDate,
        ceilings: &CapacityCeilings,
    ) -> ScheduleOutcome {
        let today = self.calendar.next_work_day(now);

        // 1) 计划阶段
        let (mut plans, mut diagnostics) = self.plan_jobs(jobs);

        // 2) 排序
        plans.sort_by(|a, b| order_key(&a.job).cmp(&order_key(&b.job)));

        // 3) 在制阶段: 先占用在线工序的产能
        let mut ledger = CapacityMap::new();
        let pinned: Vec<Option<PinnedWindow>> = plans
            .iter()
            .map(|plan| self.pin_current(plan, now, today))
            .collect();
        for pin in pinned.iter().flatten() {
            self.builder.add_window(&mut ledger, &pin.remaining);
        }

        // 4) 串联阶段
        let mut scheduled = Vec::with_capacity(plans.len());
        for (plan, pin) in plans.into_iter().zip(pinned) {
            let job = self.chain_job(plan, pin, today, &mut ledger, ceilings, &mut diagnostics);
            scheduled.push(job);
        }

        let late = scheduled.iter().filter(|j| j.late).count();
        info!(
            scheduled = scheduled.len(),
            late,
            diagnostics = diagnostics.len(),
            "排程完成"
        );

        ScheduleOutcome {
            jobs: scheduled,
            diagnostics,
        }
    }

    // ==========================================
    // 计划阶段
    // ==========================================

    fn plan_jobs(&self, jobs: &[Job]) -> (Vec<JobPlan>, Vec<JobDiagnostic>) {
        let mut seen = BTreeSet::new();
        let mut plans = Vec::with_capacity(jobs.len());
        let mut diagnostics = Vec::new();

        for job in jobs {
            if !seen.insert(job.job_id.as_str()) {
                warn!(job_id = %job.job_id, "工单号重复, 忽略后出现的记录");
                diagnostics.push(JobDiagnostic::new(&job.job_id, DiagnosticKind::DuplicateJobId));
                continue;
            }

            match self.plan_job(job) {
                Ok((plan, warnings)) => {
                    diagnostics.extend(
                        warnings
                            .into_iter()
                            .map(|kind| JobDiagnostic::new(&job.job_id, kind)),
                    );
                    plans.push(plan);
                }
                Err(kind) => {
                    warn!(job_id = %job.job_id, reason = %kind, "工单不参与排程");
                    diagnostics.push(JobDiagnostic::new(&job.job_id, kind));
                }
            }
        }

        (plans, diagnostics)
    }

    /// 单工单计划 (纯函数)
    ///
    /// # 返回
    /// - Ok((计划, 警告)): 参与排程
    /// - Err(诊断): 工单被排除
    fn plan_job(&self, job: &Job) -> Result<(JobPlan, Vec<DiagnosticKind>), DiagnosticKind> {
        if !job.points.is_finite() || job.points < 0.0 {
            return Err(DiagnosticKind::InvalidPoints { points: job.points });
        }
        let cursor = self.pipeline.cursor_for(job)?;

        let mut warnings: Vec<DiagnosticKind> = self
            .pipeline
            .unknown_skips(job)
            .into_iter()
            .map(|department| DiagnosticKind::UnknownSkipDepartment { department })
            .collect();
        if job.due_date.is_none() && cursor != StageCursor::Done {
            warnings.push(DiagnosticKind::MissingDueDate);
        }

        let plan = JobPlan {
            stages: self.pipeline.stage_plans(job),
            job: job.clone(),
            cursor,
        };
        Ok((plan, warnings))
    }

    // ==========================================
    // 在制阶段
    // ==========================================

    /// 在制工单的当前工序: 从记录开工日 (或 today) 起, 不受产能等待影响
    ///
    /// 已超期的工序延长到 today; 剩余窗点数按剩余工作日折算
    fn pin_current(
        &self,
        plan: &JobPlan,
        now: NaiveDate,
        today: NaiveDate,
    ) -> Option<PinnedWindow> {
        if plan.job.status != JobStatus::InProgress {
            return None;
        }
        if plan.job.hold_until.is_some_and(|hold| hold > now) {
            return None;
        }
        let current = plan.cursor.index()?;
        let stage = plan.stages.iter().find(|s| s.stage >= current)?;
        if stage.stage != current {
            return None;
        }

        let recorded_start = plan
            .job
            .full_window(&stage.department)
            .map(|w| w.start)
            .filter(|start| *start <= today);
        let full_start = self.calendar.next_work_day(recorded_start.unwrap_or(today));
        let full_end = self
            .calendar
            .window_end(full_start, stage.duration_days)
            .max(today);
        let remaining_start = full_start.max(today);

        let full_days = self.calendar.work_days_in(full_start, full_end).len().max(1);
        let remaining_days = self.calendar.work_days_in(remaining_start, full_end).len();
        let remaining_points = stage.points * remaining_days as f64 / full_days as f64;

        debug!(
            job_id = %plan.job.job_id,
            department = %stage.department,
            start = %full_start,
            end = %full_end,
            "在线工序保持"
        );

        Some(PinnedWindow {
            full: DepartmentWindow {
                stage: stage.stage,
                department: stage.department.clone(),
                start: full_start,
                end: full_end,
                points: stage.points,
            },
            remaining: DepartmentWindow {
                stage: stage.stage,
                department: stage.department.clone(),
                start: remaining_start,
                end: full_end,
                points: remaining_points,
            },
        })
    }

    // ==========================================
    // 串联阶段
    // ==========================================

    fn chain_job(
        &self,
        plan: JobPlan,
        pin: Option<PinnedWindow>,
        today: NaiveDate,
        ledger: &mut CapacityMap,
        ceilings: &CapacityCeilings,
        diagnostics: &mut Vec<JobDiagnostic>,
    ) -> ScheduledJob {
        let gap = self.pipeline.gap_for(&plan.job);

        let (past_stages, mut remaining_stages): (Vec<StagePlan>, Vec<StagePlan>) = plan
            .stages
            .iter()
            .cloned()
            .partition(|s| !plan.cursor.is_at_or_after(s.stage));

        let mut remaining = Vec::new();
        let mut prev_end = None;
        if let Some(pin) = &pin {
            remaining_stages.remove(0);
            remaining.push(pin.remaining.clone());
            prev_end = Some(pin.remaining.end);
        }

        let anchor = match plan.job.hold_until {
            Some(hold) if hold > today => self.calendar.next_work_day(hold),
            _ => today,
        };
        let request = ChainRequest {
            stages: &remaining_stages,
            earliest: anchor,
            prev_end,
            gap_days: gap,
            no_gaps: plan.job.overrides.no_gaps,
        };
        let placement = self.place_chain(ledger, ceilings, &request, SlotPolicy::ForceOnExhaustion);

        for department in &placement.forced {
            warn!(
                job_id = %plan.job.job_id,
                department = %department,
                "搜索窗口内无可用产能, 强制排入"
            );
            diagnostics.push(JobDiagnostic::new(
                &plan.job.job_id,
                DiagnosticKind::NoSlotFound {
                    department: department.clone(),
                    horizon_weeks: self.horizon_weeks,
                },
            ));
        }
        remaining.extend(placement.windows.iter().cloned());

        // 5) 回填当前工序之前的时间窗
        let next_start = pin
            .as_ref()
            .map(|p| p.full.start)
            .or_else(|| remaining.first().map(|w| w.start))
            .unwrap_or(today);
        let mut full = self.past_windows(&plan.job, &past_stages, next_start, gap);
        match pin {
            Some(pin) => {
                full.push(pin.full);
                full.extend(placement.windows.iter().cloned());
            }
            None => full.extend(remaining.iter().cloned()),
        }

        let forecast_start = remaining.first().or(full.first()).map(|w| w.start);
        let forecast_completion = remaining.last().or(full.last()).map(|w| w.end);
        let late = plan.cursor != StageCursor::Done
            && matches!(
                (plan.job.due_date, forecast_completion),
                (Some(due), Some(done)) if done > due
            );

        let mut job = plan.job;
        job.department_schedule = full;
        job.remaining_schedule = remaining;

        ScheduledJob {
            job,
            cursor: plan.cursor,
            forecast_start,
            forecast_completion,
            late,
            capacity_delayed_departments: placement.capacity_delayed,
            forced_departments: placement.forced,
        }
    }

    /// 当前工序之前的时间窗: 有记录保留记录, 无记录自 next_start 向前推算
    fn past_windows(
        &self,
        job: &Job,
        stages: &[StagePlan],
        next_start: NaiveDate,
        gap: u32,
    ) -> Vec<DepartmentWindow> {
        let mut next_start = next_start;
        let mut windows = Vec::with_capacity(stages.len());

        for stage in stages.iter().rev() {
            let (start, end) = match job.full_window(&stage.department) {
                Some(recorded) => (recorded.start, recorded.end),
                None => {
                    let end = self.calendar.subtract_business_days(next_start, 1 + gap);
                    let start = self
                        .calendar
                        .subtract_business_days(end, stage.duration_days.saturating_sub(1));
                    (start, end)
                }
            };
            next_start = start;
            windows.push(DepartmentWindow {
                stage: stage.stage,
                department: stage.department.clone(),
                start,
                end,
                points: stage.points,
            });
        }

        windows.reverse();
        windows
    }

    /// 串联一条工序链并写入负荷表
    ///
    /// 规则:
    /// 1) 首工序从 earliest 起; 其后每道工序从上一工序结束 + 1 + 间隔起
    /// 2) 逐工作日向后搜索, 直到时间窗涉及的每个周都不超上限
    /// 3) no_gaps: 首个剩余窗之后的工序紧接排布, 不做产能等待
    /// 4) 搜索窗口耗尽时按 policy 处理
    pub fn place_chain(
        &self,
        ledger: &mut CapacityMap,
        ceilings: &CapacityCeilings,
        request: &ChainRequest<'_>,
        policy: SlotPolicy,
    ) -> ChainPlacement {
        let mut placement = ChainPlacement::default();
        let gap = if request.no_gaps { 0 } else { request.gap_days };
        let mut prev_end = request.prev_end;

        for stage in request.stages {
            let earliest = match prev_end {
                Some(end) => self
                    .calendar
                    .add_business_days(end, 1 + gap)
                    .max(request.earliest),
                None => request.earliest,
            };
            let earliest = self.calendar.next_work_day(earliest);
            let chained = request.no_gaps && prev_end.is_some();

            let start = if chained || policy == SlotPolicy::IgnoreCapacity {
                earliest
            } else {
                match self.find_slot(ledger, ceilings, stage, earliest) {
                    Some(start) => start,
                    None if policy == SlotPolicy::FailOnExhaustion => {
                        placement.no_slot = Some(stage.department.clone());
                        return placement;
                    }
                    None => {
                        placement.forced.push(stage.department.clone());
                        earliest
                    }
                }
            };
            if start > earliest {
                placement.capacity_delayed.push(stage.department.clone());
            }

            let window = self.window_at(stage, start);
            self.builder.add_window(ledger, &window);
            prev_end = Some(window.end);
            placement.windows.push(window);
        }

        placement
    }

    /// 搜索窗口内最早可容纳该工序的开工日
    ///
    /// 工期超过整个搜索窗口的工序直接返回 None
    fn find_slot(
        &self,
        ledger: &CapacityMap,
        ceilings: &CapacityCeilings,
        stage: &StagePlan,
        earliest: NaiveDate,
    ) -> Option<NaiveDate> {
        if stage.duration_days > self.horizon_work_days() {
            return None;
        }
        let limit = earliest + Duration::weeks(i64::from(self.horizon_weeks));
        let mut candidate = earliest;
        while candidate <= limit {
            let window = self.window_at(stage, candidate);
            if self.fits(ledger, ceilings, &window) {
                return Some(candidate);
            }
            candidate = self.calendar.add_business_days(candidate, 1);
        }
        None
    }

    /// 时间窗涉及的每个周都能容纳其摊分点数
    pub fn fits(
        &self,
        ledger: &CapacityMap,
        ceilings: &CapacityCeilings,
        window: &DepartmentWindow,
    ) -> bool {
        self.builder
            .window_buckets(window)
            .iter()
            .all(|(key, points)| ledger.bucket_load(key, ceilings).can_add_points(*points))
    }

    fn window_at(&self, stage: &StagePlan, start: NaiveDate) -> DepartmentWindow {
        let start = self.calendar.next_work_day(start);
        DepartmentWindow {
            stage: stage.stage,
            department: stage.department.clone(),
            start,
            end: self.calendar.window_end(start, stage.duration_days),
            points: stage.points,
        }
    }
}

/// 排程顺序: 优先单 → 交期早 (无交期排最后) → 工单号
fn order_key(job: &Job) -> (bool, bool, Option<NaiveDate>, &str) {
    (
        !job.priority,
        job.due_date.is_none(),
        job.due_date,
        job.job_id.as_str(),
    )
}
