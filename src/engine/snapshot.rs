// ==========================================
// 钣金产能排程系统 - 规范化快照
// ==========================================
// 用途: 回归测试基线 (同一输入 → 逐字节相同的文本)
// 规则: 工单按工单号排序, 点数固定两位小数, 日期 ISO 格式
// ==========================================

use crate::domain::insight::{AnalysisResult, LateJob, OverloadedWeek, ProjectedView};
use crate::domain::job::DepartmentWindow;
use crate::domain::quote::{QuoteFeasibility, TierResult};
use chrono::NaiveDate;
use std::fmt::{self, Write};

/// 渲染分析结果 (及可选报价结论) 为规范化文本
pub fn canonical_text(result: &AnalysisResult, quote: Option<&QuoteFeasibility>) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    if render(&mut out, result, quote).is_err() {
        out.clear();
    }
    out
}

fn render(
    out: &mut String,
    result: &AnalysisResult,
    quote: Option<&QuoteFeasibility>,
) -> fmt::Result {
    let report = &result.report;
    writeln!(out, "NOW {}", report.now)?;

    writeln!(out, "## JOBS")?;
    let mut jobs: Vec<_> = result.jobs.iter().collect();
    jobs.sort_by(|a, b| a.job_id().cmp(b.job_id()));
    for job in jobs {
        writeln!(
            out,
            "JOB {} cursor={} start={} completion={} late={} delayed=[{}] forced=[{}]",
            job.job_id(),
            job.cursor
                .index()
                .map(|i| i.to_string())
                .unwrap_or_else(|| "DONE".to_string()),
            date(job.forecast_start),
            date(job.forecast_completion),
            job.late,
            job.capacity_delayed_departments.join(","),
            job.forced_departments.join(","),
        )?;
        for window in &job.job.department_schedule {
            write_window(out, "FULL", window)?;
        }
        for window in &job.job.remaining_schedule {
            write_window(out, "REM", window)?;
        }
    }

    writeln!(out, "## LATE")?;
    write_late(out, &report.late_jobs)?;

    writeln!(out, "## OVERLOADED")?;
    write_overloaded(out, &report.overloaded_weeks)?;

    writeln!(out, "## MOVES")?;
    for option in &report.move_options {
        writeln!(
            out,
            "MOVE {} scope={} key={} jobs=[{}] push={} risk={} relieves={} buffer={} late={}->{} newly_on_time=[{}]",
            option.option_id,
            option.scope,
            option.scope_key,
            option.job_ids.join(","),
            option.push_weeks,
            option.risk,
            option.relieves_overload,
            option.buffer_days,
            option.late_before,
            option.late_after,
            option.newly_on_time.join(","),
        )?;
    }

    writeln!(out, "## OVERTIME")?;
    for rec in &report.ot_recommendations {
        writeln!(
            out,
            "OT {} {} excess={:.2} tier={} hours={:.1}/{:.1} bonus={:.2} clears={} remaining={:.2}",
            rec.week,
            rec.department,
            rec.excess,
            rec.tier,
            rec.weekday_hours,
            rec.saturday_hours,
            rec.bonus_points,
            rec.clears_excess,
            rec.remaining_excess,
        )?;
    }

    write_projection(out, "PROJECTED_AFTER_MOVES", &report.projected_after_moves)?;
    write_projection(
        out,
        "PROJECTED_AFTER_MOVES_AND_OT",
        &report.projected_after_moves_and_ot,
    )?;

    let s = &report.summary;
    writeln!(out, "## SUMMARY")?;
    writeln!(
        out,
        "total={} scheduled={} excluded={} on_time={} late={} ot_weeks={} excess={:.2} late_after_moves={} late_after_moves_and_ot={}",
        s.total_jobs,
        s.scheduled_jobs,
        s.excluded_jobs,
        s.on_time_count,
        s.late_count,
        s.weeks_needing_overtime,
        s.total_excess_points,
        s.projected_late_after_moves,
        s.projected_late_after_moves_and_ot,
    )?;

    writeln!(out, "## DIAGNOSTICS")?;
    for diagnostic in &report.diagnostics {
        writeln!(out, "DIAG {}", diagnostic)?;
    }

    if let Some(quote) = quote {
        writeln!(out, "## QUOTE")?;
        writeln!(
            out,
            "QUOTE {} points={:.2} start={} target={} recommendation={}",
            quote.quote_id,
            quote.points,
            quote.start_date,
            date(quote.target_date),
            quote.recommendation,
        )?;
        write_tier(out, &quote.tier1)?;
        for tier in [&quote.tier2, &quote.tier3].into_iter().flatten() {
            write_tier(out, tier)?;
        }
    }

    Ok(())
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn write_window(out: &mut String, label: &str, window: &DepartmentWindow) -> fmt::Result {
    writeln!(
        out,
        "  {} {} {} {} {:.2}",
        label, window.department, window.start, window.end, window.points
    )
}

fn write_late(out: &mut String, late_jobs: &[LateJob]) -> fmt::Result {
    for late in late_jobs {
        writeln!(
            out,
            "LATE {} due={} completion={} lateness={} bottleneck={}",
            late.job_id,
            late.due_date,
            late.completion,
            late.lateness_days,
            late.bottleneck_department
        )?;
    }
    Ok(())
}

fn write_overloaded(out: &mut String, weeks: &[OverloadedWeek]) -> fmt::Result {
    for week in weeks {
        writeln!(
            out,
            "OVER {} {} scheduled={:.2} capacity={:.2} excess={:.2}",
            week.week, week.department, week.scheduled_points, week.capacity, week.excess
        )?;
    }
    Ok(())
}

fn write_projection(out: &mut String, title: &str, view: &ProjectedView) -> fmt::Result {
    writeln!(out, "## {}", title)?;
    writeln!(
        out,
        "applied=[{}] overtime=[{}]",
        view.applied_moves.join(","),
        view.overtime_weeks.join(",")
    )?;
    write_late(out, &view.late_jobs)?;
    write_overloaded(out, &view.overloaded_weeks)
}

fn write_tier(out: &mut String, tier: &TierResult) -> fmt::Result {
    writeln!(
        out,
        "TIER {} feasible={} ceiling={:.2} completion={} no_slot={}",
        tier.tier,
        tier.feasible,
        tier.capacity_ceiling,
        date(tier.completion),
        tier.no_slot_department.as_deref().unwrap_or("-"),
    )?;
    for window in &tier.windows {
        write_window(out, "WIN", window)?;
    }
    for b in &tier.bottlenecks {
        writeln!(
            out,
            "  BOTTLENECK {} {} existing={:.2} quote={:.2} capacity={:.2} shortfall={:.2}",
            b.week, b.department, b.existing_points, b.quote_points, b.capacity, b.shortfall
        )?;
    }
    for m in &tier.moves {
        writeln!(
            out,
            "  MOVE {} push={} buffer={} due={} completion={}->{}",
            m.job_id,
            m.push_weeks,
            m.buffer_days,
            date(m.due_date),
            date(m.completion_before),
            date(m.completion_after),
        )?;
    }
    for w in &tier.overtime_weeks {
        writeln!(
            out,
            "  OT_WEEK {} {} scheduled={:.2} baseline={:.2} overtime={:.2}",
            w.week, w.department, w.scheduled_points, w.baseline_capacity, w.overtime_points
        )?;
    }
    Ok(())
}
