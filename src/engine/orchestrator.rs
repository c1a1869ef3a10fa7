// ==========================================
// 钣金产能排程系统 - 引擎编排器
// ==========================================
// 用途: 协调 排程 → 负荷表 → 洞察 → 调整方案 的执行顺序
// 红线: now 由调用方注入; 同一输入必须得到同一输出
// ==========================================

use crate::config::{ConfigManager, EngineConfig};
use crate::domain::capacity::CapacityCeilings;
use crate::domain::insight::{AnalysisResult, InsightReport, InsightSummary};
use crate::domain::job::{Job, ScheduledJob};
use crate::domain::quote::{QuoteFeasibility, QuoteRequest};
use crate::engine::calendar::ShopCalendar;
use crate::engine::error::EngineResult;
use crate::engine::insights::InsightsAnalyzer;
use crate::engine::mitigation::MitigationEngine;
use crate::engine::quote::QuoteFeasibilityEngine;
use crate::engine::scenario::ScenarioRunner;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

// ==========================================
// Orchestrator - 引擎编排器
// ==========================================
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: EngineConfig,
    runner: ScenarioRunner,
    mitigation: MitigationEngine,
    quotes: QuoteFeasibilityEngine,
}

impl Orchestrator {
    /// 创建编排器 (配置会先校验)
    ///
    /// # 参数
    /// - config: 引擎配置
    /// - calendar: 车间日历 (含节假日 / 加班日覆写)
    pub fn new(config: EngineConfig, calendar: ShopCalendar) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            runner: ScenarioRunner::new(&config, calendar.clone()),
            mitigation: MitigationEngine::new(&config, calendar.clone()),
            quotes: QuoteFeasibilityEngine::new(&config, calendar),
            config,
        })
    }

    /// 从配置管理器创建
    pub fn from_manager(manager: &ConfigManager, calendar: ShopCalendar) -> EngineResult<Self> {
        Self::new(manager.config().clone(), calendar)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    fn baseline_ceilings(&self) -> CapacityCeilings {
        CapacityCeilings::uniform(self.config.capacity.baseline_weekly_points)
    }

    // ==========================================
    // 全链路分析
    // ==========================================

    /// 执行完整分析流程
    ///
    /// # 参数
    /// - jobs: 工单快照
    /// - now: 排程基准日
    ///
    /// # 返回
    /// 排程后工单 + 洞察报告
    #[instrument(skip(self, jobs), fields(jobs_count = jobs.len(), now = %now))]
    pub fn analyze(&self, jobs: &[Job], now: NaiveDate) -> AnalysisResult {
        info!("开始执行排程分析");

        // ==========================================
        // 步骤1: 排程 + 负荷表 + 洞察
        // ==========================================
        let baseline = self.runner.run(jobs, now, &self.baseline_ceilings());
        debug!(
            late = baseline.late_jobs.len(),
            overloaded = baseline.overloaded_weeks.len(),
            "基准排程完成"
        );

        // ==========================================
        // 步骤2: 调整方案 (模拟, 不提交)
        // ==========================================
        let plan = self.mitigation.generate(&baseline, now);

        // ==========================================
        // 步骤3: 汇总
        // ==========================================
        let excluded_jobs = baseline
            .diagnostics
            .iter()
            .filter(|d| d.kind.excludes_job())
            .count();
        let summary = InsightSummary {
            total_jobs: jobs.len(),
            scheduled_jobs: baseline.jobs.len(),
            excluded_jobs,
            on_time_count: InsightsAnalyzer::on_time_count(&baseline.jobs),
            late_count: baseline.late_jobs.len(),
            weeks_needing_overtime: plan.ot_recommendations.len(),
            total_excess_points: baseline
                .overloaded_weeks
                .iter()
                .fold(0.0, |total, w| total + w.excess),
            projected_late_after_moves: plan.projected_after_moves.late_jobs.len(),
            projected_late_after_moves_and_ot: plan.projected_after_moves_and_ot.late_jobs.len(),
        };

        info!(
            scheduled = summary.scheduled_jobs,
            late = summary.late_count,
            overloaded = baseline.overloaded_weeks.len(),
            move_options = plan.move_options.len(),
            "排程分析完成"
        );

        AnalysisResult {
            report: InsightReport {
                now,
                late_jobs: baseline.late_jobs,
                overloaded_weeks: baseline.overloaded_weeks,
                move_options: plan.move_options,
                ot_recommendations: plan.ot_recommendations,
                projected_after_moves: plan.projected_after_moves,
                projected_after_moves_and_ot: plan.projected_after_moves_and_ot,
                summary,
                diagnostics: baseline.diagnostics,
            },
            jobs: baseline.jobs,
        }
    }

    // ==========================================
    // 报价评估
    // ==========================================

    /// 评估报价可行性
    ///
    /// # 参数
    /// - quote: 报价描述
    /// - scheduled: analyze 输出的排程后工单
    /// - now: 排程基准日
    pub fn evaluate_quote(
        &self,
        quote: &QuoteRequest,
        scheduled: &[ScheduledJob],
        now: NaiveDate,
    ) -> EngineResult<QuoteFeasibility> {
        self.quotes.evaluate(quote, scheduled, now)
    }
}
