// ==========================================
// 排程引擎集成测试
// ==========================================
// 职责: 工序链排布、产能等待、日历覆写、导入快照重算
// ==========================================

mod helpers;

use fab_pipeline_aps::config::EngineConfig;
use fab_pipeline_aps::domain::calendar::{CalendarOverride, DayKind};
use fab_pipeline_aps::domain::capacity::CapacityCeilings;
use fab_pipeline_aps::domain::job::DiagnosticKind;
use fab_pipeline_aps::engine::{ScenarioRunner, Scheduler, ShopCalendar};
use helpers::test_data_builder::JobBuilder;
use helpers::{d, now};

fn scheduler() -> Scheduler {
    Scheduler::new(&EngineConfig::default(), ShopCalendar::standard())
}

fn ceilings() -> CapacityCeilings {
    CapacityCeilings::uniform(850.0)
}

#[test]
fn test_department_points_sum_to_job_points() {
    let jobs = vec![
        JobBuilder::new("A").points(185.0).due(d(2026, 3, 20)).build(),
        JobBuilder::new("B")
            .points(73.0)
            .due(d(2026, 3, 20))
            .skip(&["POLISHING", "LASER"])
            .build(),
        JobBuilder::new("C").points(0.0).due(d(2026, 3, 20)).build(),
    ];

    let outcome = scheduler().schedule(&jobs, now(), &ceilings());
    for (job, scheduled) in jobs.iter().zip(&outcome.jobs) {
        let total: f64 = scheduled.job.department_schedule.iter().map(|w| w.points).sum();
        assert!((total - job.points).abs() < 1e-9, "{} 点数合计不符", job.job_id);
    }

    let skipped = outcome.jobs.iter().find(|j| j.job_id() == "B").unwrap();
    assert_eq!(skipped.job.department_schedule.len(), 4);
    assert!(skipped.job.full_window("LASER").is_none());
}

#[test]
fn test_remaining_windows_follow_pipeline_order() {
    let job = JobBuilder::new("J1").points(240.0).due(d(2026, 4, 1)).at("LASER").build();
    let outcome = scheduler().schedule(&[job], now(), &ceilings());
    let windows = &outcome.jobs[0].job.remaining_schedule;

    assert_eq!(windows.len(), 5);
    for pair in windows.windows(2) {
        assert!(pair[0].stage < pair[1].stage);
        assert!(pair[0].end < pair[1].start);
    }
}

#[test]
fn test_priority_job_is_placed_first() {
    let mut jobs: Vec<_> = (0..24)
        .map(|i| {
            JobBuilder::new(&format!("W{:02}", i))
                .points(200.0)
                .due(d(2026, 3, 1))
                .at("WELDING")
                .build()
        })
        .collect();
    jobs.push(
        JobBuilder::new("ZZ-HOT")
            .points(200.0)
            .due(d(2026, 6, 1))
            .at("WELDING")
            .priority()
            .build(),
    );

    let outcome = scheduler().schedule(&jobs, now(), &ceilings());
    let hot = outcome.jobs.iter().find(|j| j.job_id() == "ZZ-HOT").unwrap();
    assert_eq!(hot.forecast_start, Some(now()));
    assert!(hot.capacity_delayed_departments.is_empty());
    assert!(outcome
        .jobs
        .iter()
        .any(|j| !j.capacity_delayed_departments.is_empty()));
}

#[test]
fn test_offsite_paint_extends_paint_department() {
    let plain = JobBuilder::new("PLAIN").due(d(2026, 3, 1)).at("ASSEMBLY").build();
    let paint = JobBuilder::new("PAINT")
        .due(d(2026, 3, 1))
        .at("ASSEMBLY")
        .offsite_paint()
        .build();

    let outcome = scheduler().schedule(&[plain, paint], now(), &ceilings());
    let end_of = |id: &str| {
        outcome
            .jobs
            .iter()
            .find(|j| j.job_id() == id)
            .and_then(|j| j.forecast_completion)
            .unwrap()
    };

    assert_eq!(end_of("PLAIN"), d(2026, 2, 3));
    assert_eq!(end_of("PAINT"), d(2026, 2, 13));
}

#[test]
fn test_holiday_shifts_windows() {
    let calendar = ShopCalendar::with_overrides(&[CalendarOverride {
        date: d(2026, 2, 4),
        kind: DayKind::Off,
        note: Some("停电检修".to_string()),
    }]);
    let scheduler = Scheduler::new(&EngineConfig::default(), calendar);
    let job = JobBuilder::new("Q").points(185.0).due(d(2026, 3, 12)).build();

    let outcome = scheduler.schedule(&[job], now(), &ceilings());
    let engineering = &outcome.jobs[0].job.remaining_schedule[0];
    assert_eq!(engineering.start, d(2026, 2, 2));
    assert_eq!(engineering.end, d(2026, 2, 5));
    assert_eq!(outcome.jobs[0].forecast_completion, Some(d(2026, 3, 11)));
}

#[test]
fn test_late_job_detected_and_due_date_kept() {
    let job = JobBuilder::new("LATE").points(185.0).due(d(2026, 2, 20)).build();
    let outcome = scheduler().schedule(&[job], now(), &ceilings());

    let scheduled = &outcome.jobs[0];
    assert!(scheduled.late);
    assert_eq!(scheduled.due_date(), Some(d(2026, 2, 20)));
    assert_eq!(scheduled.forecast_completion, Some(d(2026, 3, 10)));
}

#[test]
fn test_unknown_skip_department_is_warning_only() {
    let job = JobBuilder::new("J1")
        .due(d(2026, 3, 1))
        .skip(&["DEBURR"])
        .build();
    let outcome = scheduler().schedule(&[job], now(), &ceilings());

    assert_eq!(outcome.jobs.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].kind,
        DiagnosticKind::UnknownSkipDepartment {
            department: "DEBURR".to_string()
        }
    );
    assert_eq!(outcome.jobs[0].job.department_schedule.len(), 6);
}

#[test]
fn test_rescheduling_annotated_snapshot_is_idempotent() {
    let runner = ScenarioRunner::new(&EngineConfig::default(), ShopCalendar::standard());
    let jobs = vec![
        JobBuilder::new("WIP")
            .points(160.0)
            .due(d(2026, 3, 2))
            .at("PRESS_BRAKE")
            .in_progress()
            .recorded(2, "PRESS_BRAKE", d(2026, 1, 30), d(2026, 2, 4))
            .build(),
        JobBuilder::new("NEW").points(90.0).due(d(2026, 3, 20)).build(),
        JobBuilder::new("DONE").points(50.0).due(d(2026, 1, 15)).at("ASSEMBLY").complete().build(),
    ];

    let first = runner.run(&jobs, now(), &ceilings());
    let second = runner.run(&first.snapshot(), now(), &ceilings());
    assert_eq!(first.jobs, second.jobs);
    assert_eq!(first.late_jobs, second.late_jobs);
    assert_eq!(first.overloaded_weeks, second.overloaded_weeks);
}
