// ==========================================
// 钣金产能排程系统 - 调整方案引擎
// ==========================================
// 职责: 为超载周生成推移方案 (工单 / 销售订单) 与加班建议
// 输入: 基准场景结果 (排程 + 负荷表 + 洞察)
// 输出: MoveOption / OtRecommendation / 两个预测视图
// 红线: 所有方案都在副本上模拟, 不提交; 推移只允许 1 或 2 周
// ==========================================

use crate::config::{EngineConfig, MitigationRules};
use crate::domain::calendar::OvertimeTier;
use crate::domain::capacity::{BucketKey, CapacityConstraint, POINTS_EPSILON};
use crate::domain::insight::{MoveOption, OtRecommendation, OverloadedWeek, ProjectedView};
use crate::domain::job::ScheduledJob;
use crate::domain::types::{MoveRisk, MoveScope, PushWeeks, ScheduleBasis};
use crate::engine::calendar::ShopCalendar;
use crate::engine::capacity_map::BucketContributions;
use crate::engine::scenario::{ScenarioResult, ScenarioRunner};
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

// ==========================================
// SalesOrderIndex - 销售订单二级索引
// ==========================================
// 销售订单号 → 未完工工单号列表 (按需构建, 不持久化)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesOrderIndex {
    orders: BTreeMap<String, Vec<String>>,
}

impl SalesOrderIndex {
    pub fn build(jobs: &[ScheduledJob]) -> Self {
        let mut orders: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for job in jobs.iter().filter(|j| !j.is_complete()) {
            if let Some(key) = job.job.sales_order_key() {
                orders
                    .entry(key.to_string())
                    .or_default()
                    .push(job.job_id().to_string());
            }
        }
        for members in orders.values_mut() {
            members.sort();
        }
        Self { orders }
    }

    /// 工单所在的销售订单 (仅当存在兄弟工单)
    pub fn group_for(&self, job: &ScheduledJob) -> Option<(&str, &[String])> {
        let key = job.job.sales_order_key()?;
        let (order, members) = self.orders.get_key_value(key)?;
        (members.len() > 1).then_some((order.as_str(), members.as_slice()))
    }
}

// ==========================================
// MitigationPlan - 调整方案输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MitigationPlan {
    pub move_options: Vec<MoveOption>,
    pub ot_recommendations: Vec<OtRecommendation>,
    pub projected_after_moves: ProjectedView,
    pub projected_after_moves_and_ot: ProjectedView,
}

/// 单次推移试算
struct PushTrial {
    push: PushWeeks,
    result: ScenarioResult,
    relieves: bool,
}

// ==========================================
// MitigationEngine - 调整方案引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct MitigationEngine {
    runner: ScenarioRunner,
    tiers: Vec<OvertimeTier>,
    rules: MitigationRules,
}

impl MitigationEngine {
    pub fn new(config: &EngineConfig, calendar: ShopCalendar) -> Self {
        Self {
            runner: ScenarioRunner::new(config, calendar),
            tiers: config.overtime_tiers.clone(),
            rules: config.mitigation.clone(),
        }
    }

    /// 生成全部调整方案
    ///
    /// # 参数
    /// - `baseline`: 基准场景结果
    /// - `now`: 排程基准日
    #[instrument(skip(self, baseline), fields(overloaded = baseline.overloaded_weeks.len()))]
    pub fn generate(&self, baseline: &ScenarioResult, now: NaiveDate) -> MitigationPlan {
        let move_options = self.move_options(baseline, now);
        let ot_recommendations: Vec<OtRecommendation> = baseline
            .overloaded_weeks
            .iter()
            .filter_map(|week| self.recommend_overtime(week))
            .collect();

        let (pushes, applied_moves) = Self::best_moves(baseline, &move_options);
        let after_moves = self
            .runner
            .simulate_push(baseline, &pushes, now, &baseline.ceilings);

        // 仍超载的桶叠加加班奖励后重算
        let mut ceilings = baseline.ceilings.clone();
        let mut overtime_weeks = Vec::new();
        for (week, rec) in baseline.overloaded_weeks.iter().zip(&ot_recommendations) {
            let key = bucket_key(week);
            if after_moves
                .capacity
                .bucket_load(&key, &baseline.ceilings)
                .is_overloaded()
            {
                overtime_weeks.push(key.to_string());
                ceilings.add_bonus(key, rec.bonus_points);
            }
        }
        let after_moves_and_ot = self.runner.simulate_push(baseline, &pushes, now, &ceilings);

        info!(
            move_options = move_options.len(),
            ot_recommendations = ot_recommendations.len(),
            late_after_moves = after_moves.late_jobs.len(),
            late_after_moves_and_ot = after_moves_and_ot.late_jobs.len(),
            "调整方案生成完成"
        );

        MitigationPlan {
            move_options,
            ot_recommendations,
            projected_after_moves: ProjectedView {
                applied_moves: applied_moves.clone(),
                overtime_weeks: Vec::new(),
                late_jobs: after_moves.late_jobs,
                overloaded_weeks: after_moves.overloaded_weeks,
            },
            projected_after_moves_and_ot: ProjectedView {
                applied_moves,
                overtime_weeks,
                late_jobs: after_moves_and_ot.late_jobs,
                overloaded_weeks: after_moves_and_ot.overloaded_weeks,
            },
        }
    }

    // ==========================================
    // 推移方案
    // ==========================================

    /// 为每个超载周生成推移方案
    ///
    /// 规则:
    /// 1) 候选: 对该桶有贡献且缓冲 > 0 的工单, 缓冲大者优先 (同缓冲按工单号)
    /// 2) 每周最多 max_candidates_per_week 个候选
    /// 3) 每个候选生成工单方案; 有兄弟工单时再生成销售订单方案 (每周每单一次)
    pub fn move_options(&self, baseline: &ScenarioResult, now: NaiveDate) -> Vec<MoveOption> {
        let analyzer = self.runner.analyzer();
        let buffers = analyzer.buffers(&baseline.jobs);
        let contributions = self
            .runner
            .scheduler()
            .builder()
            .contributions(&baseline.jobs, ScheduleBasis::Remaining);
        let index = SalesOrderIndex::build(&baseline.jobs);

        let mut options = Vec::new();
        for week in &baseline.overloaded_weeks {
            let key = bucket_key(week);
            let candidates = self.candidates(&key, &contributions, &buffers);
            debug!(bucket = %key, candidates = candidates.len(), "超载周候选工单");

            let mut emitted_orders = BTreeSet::new();
            for (job_id, buffer) in candidates {
                options.push(self.evaluate_move(
                    baseline,
                    &key,
                    MoveScope::WorkOrder,
                    &job_id,
                    vec![job_id.clone()],
                    buffer,
                    now,
                ));

                let group = baseline
                    .job(&job_id)
                    .and_then(|job| index.group_for(job));
                if let Some((order, members)) = group {
                    if emitted_orders.insert(order.to_string()) {
                        options.push(self.evaluate_move(
                            baseline,
                            &key,
                            MoveScope::SalesOrder,
                            order,
                            members.to_vec(),
                            buffer,
                            now,
                        ));
                    }
                }
            }
        }
        options
    }

    fn candidates(
        &self,
        key: &BucketKey,
        contributions: &BucketContributions,
        buffers: &BTreeMap<String, i64>,
    ) -> Vec<(String, i64)> {
        let mut candidates: Vec<(String, i64)> = contributions
            .get(key)
            .into_iter()
            .flat_map(|jobs| jobs.keys())
            .filter_map(|job_id| {
                buffers
                    .get(job_id)
                    .filter(|buffer| **buffer > 0)
                    .map(|buffer| (job_id.clone(), *buffer))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(self.rules.max_candidates_per_week);
        candidates
    }

    /// 模拟一个推移方案: 先推 1 周, 未解除超载再推 2 周
    #[allow(clippy::too_many_arguments)]
    fn evaluate_move(
        &self,
        baseline: &ScenarioResult,
        key: &BucketKey,
        scope: MoveScope,
        scope_key: &str,
        job_ids: Vec<String>,
        buffer_days: i64,
        now: NaiveDate,
    ) -> MoveOption {
        let one_week = self.trial(baseline, key, &job_ids, PushWeeks::One, now);
        let trial = if one_week.relieves {
            one_week
        } else {
            self.trial(baseline, key, &job_ids, PushWeeks::Two, now)
        };

        let risk = if job_ids.iter().all(|id| trial.result.is_on_time(id)) {
            MoveRisk::Safe
        } else {
            MoveRisk::Moderate
        };
        let late_after = trial.result.late_ids();
        let newly_on_time: Vec<String> = baseline
            .late_ids()
            .difference(&late_after)
            .cloned()
            .collect();

        MoveOption {
            option_id: format!("{}-{}-{}-{}", key.week, key.department, scope, scope_key),
            scope,
            scope_key: scope_key.to_string(),
            job_ids,
            week: key.week,
            department: key.department.clone(),
            push_weeks: trial.push,
            risk,
            relieves_overload: trial.relieves,
            buffer_days,
            late_before: baseline.late_jobs.len(),
            late_after: late_after.len(),
            newly_on_time,
        }
    }

    fn trial(
        &self,
        baseline: &ScenarioResult,
        key: &BucketKey,
        job_ids: &[String],
        push: PushWeeks,
        now: NaiveDate,
    ) -> PushTrial {
        let pushes: BTreeMap<String, PushWeeks> =
            job_ids.iter().map(|id| (id.clone(), push)).collect();
        let result = self
            .runner
            .simulate_push(baseline, &pushes, now, &baseline.ceilings);
        let relieves = !result
            .capacity
            .bucket_load(key, &baseline.ceilings)
            .is_overloaded();
        PushTrial {
            push,
            result,
            relieves,
        }
    }

    /// 每个超载周选一个最佳方案 (解除超载且 SAFE), 合并为一组推移
    ///
    /// 最佳: 新增按期工单最多 → 推移后延期最少 → 推移周数少 → 生成顺序
    fn best_moves(
        baseline: &ScenarioResult,
        options: &[MoveOption],
    ) -> (BTreeMap<String, PushWeeks>, Vec<String>) {
        let mut pushes = BTreeMap::new();
        let mut applied = Vec::new();

        for week in &baseline.overloaded_weeks {
            let best = options
                .iter()
                .filter(|o| o.week == week.week && o.department == week.department)
                .filter(|o| o.relieves_overload && o.risk == MoveRisk::Safe)
                .min_by_key(|o| (Reverse(o.newly_on_time.len()), o.late_after, o.push_weeks));
            if let Some(option) = best {
                for job_id in &option.job_ids {
                    pushes.entry(job_id.clone()).or_insert(option.push_weeks);
                }
                applied.push(option.option_id.clone());
            }
        }

        (pushes, applied)
    }

    // ==========================================
    // 加班建议
    // ==========================================

    /// 选择能消化超载点数的最低加班档位
    ///
    /// 最高档仍不足时返回最高档, clears_excess = false
    pub fn recommend_overtime(&self, week: &OverloadedWeek) -> Option<OtRecommendation> {
        let tier = self
            .tiers
            .iter()
            .find(|t| t.bonus_points + POINTS_EPSILON >= week.excess)
            .or_else(|| self.tiers.last())?;
        let clears_excess = tier.bonus_points + POINTS_EPSILON >= week.excess;

        Some(OtRecommendation {
            week: week.week,
            department: week.department.clone(),
            excess: week.excess,
            tier: tier.tier,
            weekday_hours: tier.weekday_hours,
            saturday_hours: tier.saturday_hours,
            bonus_points: tier.bonus_points,
            clears_excess,
            remaining_excess: if clears_excess {
                0.0
            } else {
                week.excess - tier.bonus_points
            },
        })
    }
}

fn bucket_key(week: &OverloadedWeek) -> BucketKey {
    BucketKey::new(week.week, week.stage, week.department.clone())
}
