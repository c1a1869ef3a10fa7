// ==========================================
// 洞察与调整方案集成测试
// ==========================================
// 场景: 焊接 W06 超载 50 点
// - 22 个在制焊接工单, 交期 = 预测完工 (缓冲 0, 不可推移)
// - 2 个同属 SO-9 的在制焊接工单, 交期充裕
// 期望: 单工单推移不足以解除超载, 整单推移 1 周解除且 SAFE
// ==========================================

mod helpers;

use fab_pipeline_aps::domain::capacity::WeekKey;
use fab_pipeline_aps::domain::job::Job;
use fab_pipeline_aps::domain::types::{MoveRisk, MoveScope, PushWeeks};
use helpers::test_data_builder::JobBuilder;
use helpers::{d, now, orchestrator, skip_all_but};

fn welding_overload_jobs() -> Vec<Job> {
    let mut jobs: Vec<Job> = (0..22)
        .map(|i| {
            JobBuilder::new(&format!("F{:02}", i))
                .points(200.0)
                .due(d(2026, 2, 23))
                .at("WELDING")
                .in_progress()
                .build()
        })
        .collect();
    for id in ["SO9-A", "SO9-B"] {
        jobs.push(
            JobBuilder::new(id)
                .points(200.0)
                .due(d(2026, 4, 30))
                .at("WELDING")
                .in_progress()
                .sales_order("SO-9")
                .build(),
        );
    }
    jobs
}

#[test]
fn test_overloaded_week_detected() {
    let result = orchestrator().analyze(&welding_overload_jobs(), now());
    let report = &result.report;

    assert!(report.late_jobs.is_empty());
    assert_eq!(report.overloaded_weeks.len(), 1);
    let week = &report.overloaded_weeks[0];
    assert_eq!(week.week, WeekKey::parse("2026-W06").unwrap());
    assert_eq!(week.department, "WELDING");
    assert!((week.scheduled_points - 900.0).abs() < 1e-6);
    assert!((week.excess - 50.0).abs() < 1e-6);

    // 缓冲为 0 的工单恰好按期
    let filler = result.jobs.iter().find(|j| j.job_id() == "F00").unwrap();
    assert_eq!(filler.forecast_completion, Some(d(2026, 2, 23)));
    assert!(!filler.late);
}

#[test]
fn test_move_options_for_sales_order_group() {
    let report = orchestrator().analyze(&welding_overload_jobs(), now()).report;

    // 候选只有 SO-9 两个工单: WO(A), SO(SO-9), WO(B)
    assert_eq!(report.move_options.len(), 3);
    let wo_a = &report.move_options[0];
    let so = &report.move_options[1];
    let wo_b = &report.move_options[2];

    assert_eq!(wo_a.scope, MoveScope::WorkOrder);
    assert_eq!(wo_a.job_ids, vec!["SO9-A".to_string()]);
    assert!(!wo_a.relieves_overload);
    assert_eq!(wo_a.push_weeks, PushWeeks::Two);
    assert_eq!(wo_a.risk, MoveRisk::Safe);

    assert_eq!(so.scope, MoveScope::SalesOrder);
    assert_eq!(so.option_id, "2026-W06-WELDING-SO-SO-9");
    assert_eq!(so.job_ids, vec!["SO9-A".to_string(), "SO9-B".to_string()]);
    assert!(so.relieves_overload);
    assert_eq!(so.push_weeks, PushWeeks::One);
    assert_eq!(so.risk, MoveRisk::Safe);
    assert_eq!(so.late_after, 0);

    assert_eq!(wo_b.scope_key, "SO9-B");

    // 缓冲为 0 的工单不参与推移
    assert!(report
        .move_options
        .iter()
        .all(|o| o.job_ids.iter().all(|id| id.starts_with("SO9"))));
}

#[test]
fn test_overtime_recommendation_picks_lowest_tier() {
    let report = orchestrator().analyze(&welding_overload_jobs(), now()).report;

    assert_eq!(report.ot_recommendations.len(), 1);
    let rec = &report.ot_recommendations[0];
    assert_eq!(rec.tier, 1);
    assert_eq!(rec.weekday_hours, 9.0);
    assert_eq!(rec.saturday_hours, 0.0);
    assert!(rec.clears_excess);
    assert_eq!(rec.remaining_excess, 0.0);
    assert_eq!(report.summary.weeks_needing_overtime, 1);
}

#[test]
fn test_projected_views_after_best_moves() {
    let report = orchestrator().analyze(&welding_overload_jobs(), now()).report;

    let after_moves = &report.projected_after_moves;
    assert_eq!(after_moves.applied_moves, vec!["2026-W06-WELDING-SO-SO-9".to_string()]);
    assert!(after_moves.overloaded_weeks.is_empty());
    assert!(after_moves.late_jobs.is_empty());

    // 推移后已不超载, 不叠加加班
    let after_ot = &report.projected_after_moves_and_ot;
    assert!(after_ot.overtime_weeks.is_empty());
    assert!(after_ot.late_jobs.is_empty());

    assert_eq!(report.summary.projected_late_after_moves, 0);
    assert_eq!(report.summary.projected_late_after_moves_and_ot, 0);
}

#[test]
fn test_analysis_never_rewrites_due_dates() {
    let jobs = welding_overload_jobs();
    let result = orchestrator().analyze(&jobs, now());
    for job in &jobs {
        let scheduled = result.jobs.iter().find(|j| j.job_id() == job.job_id).unwrap();
        assert_eq!(scheduled.due_date(), job.due_date);
        assert_eq!(scheduled.job.hold_until, None);
    }
}

#[test]
fn test_late_job_reports_bottleneck() {
    let jobs = vec![JobBuilder::new("LATE")
        .points(185.0)
        .due(d(2026, 2, 27))
        .build()];
    let report = orchestrator().analyze(&jobs, now()).report;

    assert_eq!(report.late_jobs.len(), 1);
    let late = &report.late_jobs[0];
    assert_eq!(late.completion, d(2026, 3, 10));
    // 2/27 → 3/10: 7 个工作日
    assert_eq!(late.lateness_days, 7);
    assert!(!late.bottleneck_department.is_empty());
    assert_eq!(report.summary.late_count, 1);
    assert_eq!(report.summary.on_time_count, 0);
}

/// 装配 W07 / W08 各超载 20 点
/// - 17 个在制装配工单 (150 点, 2/2 → 2/20), 每周各 50 点, 缓冲 0
/// - TAIL: 焊接 → 装配, 无间隔; 装配 2/12 → 2/17 每周 20 点, 交期 2/24 (缓冲 5 天)
fn assembly_tail_jobs() -> Vec<Job> {
    let mut jobs: Vec<Job> = (0..17)
        .map(|i| {
            JobBuilder::new(&format!("A{:02}", i))
                .points(150.0)
                .due(d(2026, 2, 20))
                .at("ASSEMBLY")
                .in_progress()
                .skip(&skip_all_but("ASSEMBLY"))
                .build()
        })
        .collect();
    jobs.push(
        JobBuilder::new("TAIL")
            .points(100.0)
            .due(d(2026, 2, 24))
            .at("WELDING")
            .no_gaps()
            .skip(&["ENGINEERING", "LASER", "PRESS_BRAKE", "POLISHING"])
            .build(),
    );
    jobs
}

#[test]
fn test_two_week_push_past_buffer_is_moderate() {
    let report = orchestrator().analyze(&assembly_tail_jobs(), now()).report;

    let weeks: Vec<String> = report
        .overloaded_weeks
        .iter()
        .map(|w| format!("{}/{}", w.week, w.department))
        .collect();
    assert_eq!(weeks, vec!["2026-W07/ASSEMBLY", "2026-W08/ASSEMBLY"]);
    assert!(report
        .overloaded_weeks
        .iter()
        .all(|w| (w.excess - 20.0).abs() < 1e-6));
    assert!(report.late_jobs.is_empty());

    assert_eq!(report.move_options.len(), 2);
    let w07 = &report.move_options[0];
    let w08 = &report.move_options[1];

    // W07: 推 1 周后装配整段移出, 仍按期
    assert_eq!(w07.option_id, "2026-W07-ASSEMBLY-WO-TAIL");
    assert_eq!(w07.push_weeks, PushWeeks::One);
    assert!(w07.relieves_overload);
    assert_eq!(w07.risk, MoveRisk::Safe);

    // W08: 推 1 周仍有 2 天落在 W08; 推 2 周解除超载但 3/3 完工, 超过交期
    assert_eq!(w08.option_id, "2026-W08-ASSEMBLY-WO-TAIL");
    assert_eq!(w08.job_ids, vec!["TAIL".to_string()]);
    assert_eq!(w08.buffer_days, 5);
    assert_eq!(w08.push_weeks, PushWeeks::Two);
    assert!(w08.relieves_overload);
    assert_eq!(w08.risk, MoveRisk::Moderate);
    assert_eq!(w08.late_before, 0);
    assert_eq!(w08.late_after, 1);
    assert!(w08.newly_on_time.is_empty());

    // 只采用 SAFE 方案; W08 剩余超载由加班消化
    let after_moves = &report.projected_after_moves;
    assert_eq!(after_moves.applied_moves, vec![w07.option_id.clone()]);
    assert_eq!(after_moves.overloaded_weeks.len(), 1);
    assert_eq!(
        after_moves.overloaded_weeks[0].week,
        WeekKey::parse("2026-W08").unwrap()
    );
    assert!(after_moves.late_jobs.is_empty());

    let after_ot = &report.projected_after_moves_and_ot;
    assert_eq!(after_ot.overtime_weeks, vec!["2026-W08/ASSEMBLY".to_string()]);
    assert!(after_ot.overloaded_weeks.is_empty());
    assert!(after_ot.late_jobs.is_empty());
}
