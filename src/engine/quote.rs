// ==========================================
// 钣金产能排程系统 - 报价可行性引擎
// ==========================================
// 职责: 评估未下单报价能否在目标日前完工
// 输入: 报价描述 + 已排程工单 + now
// 输出: QuoteFeasibility (三级评估 + 推荐结论)
// ==========================================
// 层级 (严格按顺序, 前一层成功则不再评估后续层级):
// Tier 1: 基准产能上限, 不扰动现有工单
// Tier 2: 推移缓冲充足且占用瓶颈桶的工单 (1 或 2 周)
// Tier 3: 报价按加班产能上限排入, 再按需推移
// ==========================================

use crate::config::{CapacityConstants, EngineConfig, QuoteSizing};
use crate::domain::capacity::{BucketKey, CapacityCeilings, CapacityMap, POINTS_EPSILON};
use crate::domain::job::{Job, ScheduledJob};
use crate::domain::quote::{
    CapacityBottleneck, OvertimeWeek, QuoteFeasibility, QuoteMove, QuoteRequest, TierResult,
};
use crate::domain::types::{FeasibilityTier, PushWeeks, Recommendation, ScheduleBasis};
use crate::engine::calendar::ShopCalendar;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::pipeline::StagePlan;
use crate::engine::scenario::ScenarioRunner;
use crate::engine::scheduler::{ChainPlacement, ChainRequest, SlotPolicy};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

/// Tier 2 候选工单的最小缓冲 (工作日)
pub const MIN_MOVE_BUFFER_DAYS: i64 = 5;

/// 报价在流水线中的排布参数
struct QuoteChain {
    stages: Vec<StagePlan>,
    start: NaiveDate,
    gap_days: u32,
    target: Option<NaiveDate>,
}

/// 单层级搜索结果 + 最终使用的负荷表
struct TierSearch {
    result: TierResult,
    ledger: CapacityMap,
}

// ==========================================
// QuoteFeasibilityEngine - 报价可行性引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct QuoteFeasibilityEngine {
    runner: ScenarioRunner,
    capacity: CapacityConstants,
    sizing: QuoteSizing,
}

impl QuoteFeasibilityEngine {
    pub fn new(config: &EngineConfig, calendar: ShopCalendar) -> Self {
        Self {
            runner: ScenarioRunner::new(config, calendar),
            capacity: config.capacity.clone(),
            sizing: config.quote.clone(),
        }
    }

    // ==========================================
    // 点数折算
    // ==========================================

    /// 报价金额 → 工作量点数
    ///
    /// points = ((总额 - 大件) / 每点金额 + 大件 × 系数 / 每点金额 + (数量 - 1) × 追加点数)
    ///          × (客户项目系数), 不低于最小点数
    pub fn size_points(&self, quote: &QuoteRequest) -> EngineResult<f64> {
        let invalid = |message: String| EngineError::InvalidQuote {
            quote_id: quote.quote_id.clone(),
            message,
        };

        if !(quote.total_value.is_finite() && quote.total_value >= 0.0) {
            return Err(invalid(format!("报价总额无效: {}", quote.total_value)));
        }
        if quote.quantity == 0 {
            return Err(invalid("数量必须大于 0".to_string()));
        }
        if let Some(rock) = quote
            .big_rocks
            .iter()
            .find(|r| !(r.value.is_finite() && r.value >= 0.0))
        {
            return Err(invalid(format!("大件金额无效: {} = {}", rock.description, rock.value)));
        }

        let sizing = &self.sizing;
        let big_rocks: f64 = quote
            .big_rocks
            .iter()
            .map(|r| r.value)
            .sum::<f64>()
            .min(quote.total_value);
        let base = (quote.total_value - big_rocks) / sizing.dollars_per_point;
        let rocks = big_rocks * sizing.big_rock_effort_factor / sizing.dollars_per_point;
        let extra_units = f64::from(quote.quantity - 1) * sizing.extra_unit_points;

        let mut points = base + rocks + extra_units;
        if quote.customer_program {
            points *= sizing.program_multiplier;
        }
        Ok(points.max(sizing.min_points))
    }

    // ==========================================
    // 主入口
    // ==========================================

    /// 评估报价可行性
    ///
    /// # 参数
    /// - `quote`: 报价描述
    /// - `scheduled`: 已排程工单 (基准排程, 不会被修改)
    /// - `now`: 排程基准日
    #[instrument(
        skip(self, quote, scheduled),
        fields(quote_id = %quote.quote_id, jobs = scheduled.len())
    )]
    pub fn evaluate(
        &self,
        quote: &QuoteRequest,
        scheduled: &[ScheduledJob],
        now: NaiveDate,
    ) -> EngineResult<QuoteFeasibility> {
        let points = self.size_points(quote)?;
        let chain = self.quote_chain(quote, points, now)?;
        info!(points, start = %chain.start, "报价点数折算完成");

        let baseline = self.capacity.baseline_weekly_points;
        let overtime = self.capacity.overtime_weekly_points;
        let ledger = self
            .runner
            .scheduler()
            .builder()
            .build(scheduled, ScheduleBasis::Remaining);

        let mut feasibility = QuoteFeasibility {
            quote_id: quote.quote_id.clone(),
            points,
            start_date: chain.start,
            target_date: chain.target,
            tier1: self
                .as_committed(FeasibilityTier::AsCommitted, &chain, &ledger, baseline)
                .result,
            tier2: None,
            tier3: None,
            recommendation: Recommendation::Decline,
        };
        if feasibility.tier1.feasible {
            feasibility.recommendation = Recommendation::Accept;
            return Ok(feasibility);
        }

        let tier2 = self
            .with_moves(FeasibilityTier::WithMoves, &chain, scheduled, now, baseline)
            .result;
        let tier2_feasible = tier2.feasible;
        feasibility.tier2 = Some(tier2);
        if tier2_feasible {
            feasibility.recommendation = Recommendation::AcceptWithMoves;
            return Ok(feasibility);
        }

        let first = self.as_committed(FeasibilityTier::WithOvertime, &chain, &ledger, overtime);
        let mut search = if first.result.feasible {
            first
        } else {
            self.with_moves(FeasibilityTier::WithOvertime, &chain, scheduled, now, overtime)
        };
        search.result.overtime_weeks = self.overtime_weeks(&search.ledger, &search.result);
        if search.result.feasible {
            feasibility.recommendation = Recommendation::AcceptWithOvertime;
        }
        feasibility.tier3 = Some(search.result);

        info!(recommendation = %feasibility.recommendation, "报价评估完成");
        Ok(feasibility)
    }

    fn quote_chain(
        &self,
        quote: &QuoteRequest,
        points: f64,
        now: NaiveDate,
    ) -> EngineResult<QuoteChain> {
        let scheduler = self.runner.scheduler();
        let pipeline = scheduler.pipeline();

        let mut job = Job::new(
            quote.quote_id.clone(),
            points,
            quote.target_date,
            pipeline.code(0).to_string(),
        );
        job.product_category = quote.product_category.clone();
        job.overrides.skip_departments = quote.skip_departments.clone();
        job.overrides.offsite_paint = quote.offsite_paint;

        let stages = pipeline.stage_plans(&job);
        if stages.is_empty() {
            return Err(EngineError::InvalidQuote {
                quote_id: quote.quote_id.clone(),
                message: "全部工序被跳过".to_string(),
            });
        }

        Ok(QuoteChain {
            stages,
            start: scheduler
                .calendar()
                .next_work_day(quote.engineering_ready.max(now)),
            gap_days: pipeline.gap_for(&job),
            target: quote.target_date,
        })
    }

    // ==========================================
    // 排布与瓶颈
    // ==========================================

    /// 在负荷表副本上排入报价
    fn place(
        &self,
        ledger: &CapacityMap,
        ceiling: f64,
        chain: &QuoteChain,
        policy: SlotPolicy,
    ) -> ChainPlacement {
        let mut scratch = ledger.clone();
        let request = ChainRequest {
            stages: &chain.stages,
            earliest: chain.start,
            prev_end: None,
            gap_days: chain.gap_days,
            no_gaps: false,
        };
        self.runner.scheduler().place_chain(
            &mut scratch,
            &CapacityCeilings::uniform(ceiling),
            &request,
            policy,
        )
    }

    /// 报价理想链路 (不等产能) 的每桶点数
    fn ideal_quote_load(&self, chain: &QuoteChain) -> BTreeMap<BucketKey, f64> {
        let ideal = self.place(&CapacityMap::new(), f64::MAX, chain, SlotPolicy::IgnoreCapacity);
        let builder = self.runner.scheduler().builder();
        let mut load = BTreeMap::new();
        for window in &ideal.windows {
            for (key, points) in builder.window_buckets(window) {
                *load.entry(key).or_insert(0.0) += points;
            }
        }
        load
    }

    /// 瓶颈桶: 现有负荷 + 报价理想链路负荷 超过上限
    fn bottlenecks(
        &self,
        ledger: &CapacityMap,
        ceiling: f64,
        chain: &QuoteChain,
    ) -> BTreeMap<BucketKey, CapacityBottleneck> {
        self.ideal_quote_load(chain)
            .into_iter()
            .filter_map(|(key, quote_points)| {
                let existing = ledger.load(&key);
                let shortfall = existing + quote_points - ceiling;
                (shortfall > POINTS_EPSILON).then(|| {
                    let bottleneck = CapacityBottleneck {
                        week: key.week,
                        department: key.department.clone(),
                        existing_points: existing,
                        quote_points,
                        capacity: ceiling,
                        shortfall,
                    };
                    (key, bottleneck)
                })
            })
            .collect()
    }

    fn tier_result(
        tier: FeasibilityTier,
        ceiling: f64,
        chain: &QuoteChain,
        placement: ChainPlacement,
        bottlenecks: Vec<CapacityBottleneck>,
        moves: Vec<QuoteMove>,
    ) -> TierResult {
        let completion = placement.completion();
        TierResult {
            tier,
            feasible: is_feasible(completion, chain.target),
            capacity_ceiling: ceiling,
            completion,
            no_slot_department: placement.no_slot,
            windows: placement.windows,
            bottlenecks,
            moves,
            overtime_weeks: Vec::new(),
        }
    }

    // ==========================================
    // Tier 1 / Tier 3 首轮: 不扰动现有工单
    // ==========================================

    fn as_committed(
        &self,
        tier: FeasibilityTier,
        chain: &QuoteChain,
        ledger: &CapacityMap,
        ceiling: f64,
    ) -> TierSearch {
        let placement = self.place(ledger, ceiling, chain, SlotPolicy::FailOnExhaustion);
        let bottlenecks = self.bottlenecks(ledger, ceiling, chain).into_values().collect();
        let result = Self::tier_result(tier, ceiling, chain, placement, bottlenecks, Vec::new());
        debug!(
            tier = %tier,
            feasible = result.feasible,
            completion = ?result.completion,
            "报价层级评估"
        );
        TierSearch {
            result,
            ledger: ledger.clone(),
        }
    }

    // ==========================================
    // Tier 2 / Tier 3 次轮: 推移工单腾出产能
    // ==========================================

    /// 贪心推移
    ///
    /// 规则:
    /// 1) 候选: 缓冲 ≥ 5 个工作日且占用瓶颈桶的工单, 缓冲大者优先
    /// 2) 每个候选先推 1 周, 再推 2 周; 所有已推移工单仍按期才保留
    /// 3) 每次保留后重新排入报价, 可行即停止; 最多 max_moves 个
    fn with_moves(
        &self,
        tier: FeasibilityTier,
        chain: &QuoteChain,
        scheduled: &[ScheduledJob],
        now: NaiveDate,
        ceiling: f64,
    ) -> TierSearch {
        let job_ceilings = CapacityCeilings::uniform(self.capacity.baseline_weekly_points);
        let builder = self.runner.scheduler().builder();
        let mut ledger = builder.build(scheduled, ScheduleBasis::Remaining);

        let hot: BTreeSet<BucketKey> = self
            .bottlenecks(&ledger, ceiling, chain)
            .into_keys()
            .collect();
        let contributions = builder.contributions(scheduled, ScheduleBasis::Remaining);
        let mut candidates: Vec<(String, i64)> = self
            .runner
            .analyzer()
            .buffers(scheduled)
            .into_iter()
            .filter(|(_, buffer)| *buffer >= MIN_MOVE_BUFFER_DAYS)
            .filter(|(job_id, _)| {
                hot.iter().any(|key| {
                    contributions
                        .get(key)
                        .is_some_and(|jobs| jobs.contains_key(job_id))
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        debug!(tier = %tier, candidates = candidates.len(), hot_buckets = hot.len(), "推移候选");

        let mut placement = self.place(&ledger, ceiling, chain, SlotPolicy::FailOnExhaustion);
        let mut pushes: BTreeMap<String, PushWeeks> = BTreeMap::new();
        let mut moves = Vec::new();

        for (job_id, buffer) in candidates {
            if is_feasible(placement.completion(), chain.target)
                || moves.len() >= self.sizing.max_moves
            {
                break;
            }

            for push in PushWeeks::ALL {
                let mut trial = pushes.clone();
                trial.insert(job_id.clone(), push);
                let jobs = ScenarioRunner::apply_pushes(scheduled, &trial);
                let sim = self.runner.run(&jobs, now, &job_ceilings);
                if !trial.keys().all(|id| sim.is_on_time(id)) {
                    continue;
                }

                let before = scheduled.iter().find(|j| j.job_id() == job_id);
                moves.push(QuoteMove {
                    job_id: job_id.clone(),
                    push_weeks: push,
                    buffer_days: buffer,
                    due_date: before.and_then(|j| j.due_date()),
                    completion_before: before.and_then(|j| j.forecast_completion),
                    completion_after: sim.job(&job_id).and_then(|j| j.forecast_completion),
                });
                debug!(job_id = %job_id, push = %push, "推移保留");

                pushes = trial;
                ledger = sim.capacity;
                placement = self.place(&ledger, ceiling, chain, SlotPolicy::FailOnExhaustion);
                break;
            }
        }

        let bottlenecks = self.bottlenecks(&ledger, ceiling, chain).into_values().collect();
        let result = Self::tier_result(tier, ceiling, chain, placement, bottlenecks, moves);
        debug!(
            tier = %tier,
            feasible = result.feasible,
            moves = result.moves.len(),
            "报价层级评估"
        );
        TierSearch { result, ledger }
    }

    // ==========================================
    // 加班周
    // ==========================================

    /// 报价占用且超过基准上限的桶
    fn overtime_weeks(&self, ledger: &CapacityMap, result: &TierResult) -> Vec<OvertimeWeek> {
        let baseline = self.capacity.baseline_weekly_points;
        let builder = self.runner.scheduler().builder();

        let mut quote_load: BTreeMap<BucketKey, f64> = BTreeMap::new();
        for window in &result.windows {
            for (key, points) in builder.window_buckets(window) {
                *quote_load.entry(key).or_insert(0.0) += points;
            }
        }

        quote_load
            .into_iter()
            .filter_map(|(key, quote_points)| {
                let scheduled_points = ledger.load(&key) + quote_points;
                (scheduled_points > baseline + POINTS_EPSILON).then(|| OvertimeWeek {
                    week: key.week,
                    department: key.department,
                    scheduled_points,
                    baseline_capacity: baseline,
                    overtime_points: scheduled_points - baseline,
                })
            })
            .collect()
    }
}

/// 成功: 全部工序排入且 (无目标日 或 完工 ≤ 目标日)
fn is_feasible(completion: Option<NaiveDate>, target: Option<NaiveDate>) -> bool {
    match (completion, target) {
        (Some(done), Some(target)) => done <= target,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
