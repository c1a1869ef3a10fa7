// ==========================================
// 钣金产能排程系统 - 命令行入口
// ==========================================
// 用法:
//   fab-pipeline-aps <jobs.csv|jobs.xlsx> [--now YYYY-MM-DD] [--config F.json]
//                    [--calendar F.csv] [--quote F.json] [--canonical] [--json-log]
// 输出: stdout 为 JSON 报告 (或 --canonical 规范化文本); 日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use fab_pipeline_aps::config::ConfigManager;
use fab_pipeline_aps::domain::QuoteRequest;
use fab_pipeline_aps::engine::{canonical_text, Orchestrator, ShopCalendar};
use fab_pipeline_aps::importer::{load_calendar_overrides, parse_date_value, JobImporter};
use fab_pipeline_aps::{logging, APP_NAME, VERSION};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

const USAGE: &str = "用法: fab-pipeline-aps <jobs.csv|jobs.xlsx> [--now D] [--config F] \
                     [--calendar F] [--quote F.json] [--canonical] [--json-log]";

#[derive(Debug, Default)]
struct CliArgs {
    jobs_path: PathBuf,
    now: Option<NaiveDate>,
    config_path: Option<PathBuf>,
    calendar_path: Option<PathBuf>,
    quote_path: Option<PathBuf>,
    canonical: bool,
    json_log: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut cli = CliArgs::default();
    let mut jobs_path = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("参数 {} 缺少取值", flag))
        };
        match arg.as_str() {
            "--now" => {
                let raw = value("--now")?;
                cli.now = Some(
                    parse_date_value(&raw).ok_or_else(|| anyhow!("--now 日期无效: {}", raw))?,
                );
            }
            "--config" => cli.config_path = Some(PathBuf::from(value("--config")?)),
            "--calendar" => cli.calendar_path = Some(PathBuf::from(value("--calendar")?)),
            "--quote" => cli.quote_path = Some(PathBuf::from(value("--quote")?)),
            "--canonical" => cli.canonical = true,
            "--json-log" => cli.json_log = true,
            flag if flag.starts_with("--") => bail!("未知参数: {}", flag),
            path => jobs_path = Some(PathBuf::from(path)),
        }
    }

    cli.jobs_path = jobs_path.ok_or_else(|| anyhow!(USAGE))?;
    Ok(cli)
}

fn main() -> Result<()> {
    let cli = parse_args()?;

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }
    tracing::info!("{} v{}", APP_NAME, VERSION);

    // ===== 配置 =====
    let manager = ConfigManager::resolve(cli.config_path.as_deref())
        .context("加载引擎配置失败")?;
    tracing::info!(source = %manager.source(), "引擎配置已加载");

    // ===== 日历 =====
    let calendar = match &cli.calendar_path {
        Some(path) => ShopCalendar::with_overrides(
            &load_calendar_overrides(path)
                .with_context(|| format!("读取日历覆写失败: {}", path.display()))?,
        ),
        None => ShopCalendar::standard(),
    };

    let orchestrator = Orchestrator::from_manager(&manager, calendar)?;

    // ===== 工单导入 =====
    let importer = JobImporter::new(orchestrator.runner().scheduler().pipeline());
    let import = importer
        .import(&cli.jobs_path)
        .with_context(|| format!("导入工单失败: {}", cli.jobs_path.display()))?;
    for issue in &import.issues {
        tracing::warn!(row = issue.row, job_id = ?issue.job_id, "{}", issue.message);
    }

    // ===== 分析 =====
    let now = cli.now.unwrap_or_else(|| Local::now().date_naive());
    let analysis = orchestrator.analyze(&import.jobs, now);

    // ===== 报价 =====
    let quote = match &cli.quote_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("读取报价文件失败: {}", path.display()))?;
            let request: QuoteRequest = serde_json::from_str(&raw)
                .with_context(|| format!("报价文件格式错误: {}", path.display()))?;
            Some(orchestrator.evaluate_quote(&request, &analysis.jobs, now)?)
        }
        None => None,
    };

    if cli.canonical {
        print!("{}", canonical_text(&analysis, quote.as_ref()));
    } else {
        let output = json!({
            "report": &analysis.report,
            "jobs": &analysis.jobs,
            "import_issues": &import.issues,
            "quote": &quote,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
