// ==========================================
// 钣金产能排程系统 - 工单字段映射器
// ==========================================
// 职责: 原始行记录 → Job + 行级问题清单
// 红线: 单行坏数据不中断整批导入
// ==========================================
// 列名: 不区分大小写, 空格/连字符视为下划线, 支持别名
// 日期: YYYY-MM-DD / YYYYMMDD / M/D/YYYY / Excel 序列号
// 布尔: Y/N, YES/NO, TRUE/FALSE, 1/0, X
// 工序窗: <工序代码>_START / <工序代码>_END (如 WELDING_START)
// ==========================================

use crate::domain::job::{DepartmentWindow, Job, JobOverrides};
use crate::domain::types::JobStatus;
use crate::engine::pipeline::{normalize_department, DepartmentPipeline};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

// ==========================================
// ImportIssue - 行级问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub row: usize, // 数据行号 (表头为第 1 行)
    pub job_id: Option<String>,
    pub message: String,
}

// ==========================================
// JobImport - 导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobImport {
    pub jobs: Vec<Job>,
    pub issues: Vec<ImportIssue>,
}

const JOB_ID: &[&str] = &["JOB_ID", "JOB", "JOB_NO", "JOB_NUMBER", "WORK_ORDER", "WO"];
const POINTS: &[&str] = &["POINTS", "PTS", "WORKLOAD"];
const DUE_DATE: &[&str] = &["DUE_DATE", "DUE", "SHIP_DATE", "PROMISE_DATE"];
const CATEGORY: &[&str] = &["PRODUCT_CATEGORY", "CATEGORY", "PRODUCT"];
const DEPARTMENT: &[&str] = &["CURRENT_DEPARTMENT", "DEPARTMENT", "DEPT", "STAGE"];
const STATUS: &[&str] = &["STATUS", "JOB_STATUS"];
const PRIORITY: &[&str] = &["PRIORITY", "FAST_SHIP", "HOT"];
const SKIP: &[&str] = &["SKIP_DEPARTMENTS", "SKIP", "SKIPPED"];
const NO_GAPS: &[&str] = &["NO_GAPS"];
const OFFSITE_PAINT: &[&str] = &["OFFSITE_PAINT", "OUTSIDE_PAINT"];
const SALES_ORDER: &[&str] = &["SALES_ORDER", "SO", "SALES_ORDER_NO"];
const HOLD_UNTIL: &[&str] = &["HOLD_UNTIL", "HOLD"];

/// 规范化列名
fn normalize_header(raw: &str) -> String {
    normalize_department(raw)
}

// ==========================================
// JobMapper - 工单字段映射器
// ==========================================
pub struct JobMapper {
    departments: Vec<(usize, String)>,
}

impl JobMapper {
    /// 构造函数
    ///
    /// # 参数
    /// - pipeline: 工序序列 (用于识别工序窗列)
    pub fn new(pipeline: &DepartmentPipeline) -> Self {
        let departments = pipeline
            .departments()
            .iter()
            .enumerate()
            .map(|(stage, d)| (stage, normalize_department(&d.code)))
            .collect();
        Self { departments }
    }

    /// 批量映射
    ///
    /// 映射失败的行记入 issues 并跳过, 其余行继续
    pub fn map_records(&self, records: Vec<RawRecord>) -> JobImport {
        let mut import = JobImport::default();

        for (idx, record) in records.into_iter().enumerate() {
            let row_number = idx + 2;
            let row = Self::normalize_row(record);
            match self.map_row(&row, row_number) {
                Ok(job) => import.jobs.push(job),
                Err(err) => {
                    warn!(row = row_number, error = %err, "工单行映射失败, 已跳过");
                    import.issues.push(ImportIssue {
                        row: row_number,
                        job_id: Self::get(&row, JOB_ID),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            jobs = import.jobs.len(),
            issues = import.issues.len(),
            "工单映射完成"
        );
        import
    }

    fn normalize_row(record: RawRecord) -> HashMap<String, String> {
        record
            .into_iter()
            .map(|(key, value)| (normalize_header(&key), value))
            .collect()
    }

    /// 映射单行
    pub fn map_row(&self, row: &HashMap<String, String>, row_number: usize) -> ImportResult<Job> {
        let job_id = Self::get(row, JOB_ID).ok_or(ImportError::PrimaryKeyMissing(row_number))?;
        let points = parse_f64(row, POINTS, row_number)?.ok_or_else(|| {
            ImportError::FieldMappingError {
                row: row_number,
                message: "points 为空".to_string(),
            }
        })?;
        let department = Self::get(row, DEPARTMENT).ok_or_else(|| ImportError::FieldMappingError {
            row: row_number,
            message: "current_department 为空".to_string(),
        })?;

        let status = match Self::get(row, STATUS) {
            None => JobStatus::NotStarted,
            Some(raw) => JobStatus::parse(&raw).ok_or_else(|| ImportError::TypeConversionError {
                row: row_number,
                field: "status".to_string(),
                message: format!("未知状态: {}", raw),
            })?,
        };

        let mut job = Job::new(
            job_id,
            points,
            parse_date(row, DUE_DATE, row_number)?,
            normalize_department(&department),
        );
        job.status = status;
        job.product_category = Self::get(row, CATEGORY).unwrap_or_default();
        job.priority = parse_bool(row, PRIORITY, row_number)?;
        job.sales_order = Self::get(row, SALES_ORDER);
        job.hold_until = parse_date(row, HOLD_UNTIL, row_number)?;
        job.overrides = JobOverrides {
            skip_departments: parse_skip_list(Self::get(row, SKIP).as_deref()),
            no_gaps: parse_bool(row, NO_GAPS, row_number)?,
            offsite_paint: parse_bool(row, OFFSITE_PAINT, row_number)?,
        };
        job.department_schedule = self.recorded_windows(row, row_number)?;

        Ok(job)
    }

    /// 读取已记录的工序窗 (起止日期都存在才采用)
    fn recorded_windows(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<Vec<DepartmentWindow>> {
        let mut windows = Vec::new();
        for (stage, code) in &self.departments {
            let start_key = format!("{}_START", code);
            let end_key = format!("{}_END", code);
            let start = parse_date(row, &[start_key.as_str()], row_number)?;
            let end = parse_date(row, &[end_key.as_str()], row_number)?;
            if let (Some(start), Some(end)) = (start, end) {
                if end < start {
                    return Err(ImportError::FieldMappingError {
                        row: row_number,
                        message: format!("{} 结束日早于开工日", code),
                    });
                }
                windows.push(DepartmentWindow {
                    stage: *stage,
                    department: code.clone(),
                    start,
                    end,
                    points: 0.0,
                });
            }
        }
        Ok(windows)
    }

    /// 按别名取非空字段
    fn get(row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

// ==========================================
// 字段解析
// ==========================================

fn parse_f64(
    row: &HashMap<String, String>,
    aliases: &[&str],
    row_number: usize,
) -> ImportResult<Option<f64>> {
    match JobMapper::get(row, aliases) {
        None => Ok(None),
        Some(value) => value
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: aliases[0].to_lowercase(),
                message: format!("无法解析为数值: {}", value),
            }),
    }
}

fn parse_bool(
    row: &HashMap<String, String>,
    aliases: &[&str],
    row_number: usize,
) -> ImportResult<bool> {
    match JobMapper::get(row, aliases) {
        None => Ok(false),
        Some(value) => match value.to_uppercase().as_str() {
            "Y" | "YES" | "TRUE" | "1" | "X" => Ok(true),
            "N" | "NO" | "FALSE" | "0" => Ok(false),
            _ => Err(ImportError::TypeConversionError {
                row: row_number,
                field: aliases[0].to_lowercase(),
                message: format!("无法解析为布尔值: {}", value),
            }),
        },
    }
}

fn parse_date(
    row: &HashMap<String, String>,
    aliases: &[&str],
    row_number: usize,
) -> ImportResult<Option<NaiveDate>> {
    match JobMapper::get(row, aliases) {
        None => Ok(None),
        Some(value) => parse_date_value(&value)
            .map(Some)
            .ok_or_else(|| ImportError::DateFormatError {
                row: row_number,
                field: aliases[0].to_lowercase(),
                value,
            }),
    }
}

/// 解析日期文本
///
/// 支持 YYYY-MM-DD / YYYYMMDD / M/D/YYYY / Excel 序列号 (1900 日期系统)
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Some(date);
    }
    if value.len() == 8 {
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
            return Some(date);
        }
    }
    // Excel 序列号 (可能带时间小数)
    let serial = value.parse::<f64>().ok()?;
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 跳过工序列表: 以 ; | , 分隔, 工序代码规范化
pub fn parse_skip_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|raw| {
        raw.split(|c| c == ';' || c == '|' || c == ',')
            .map(normalize_department)
            .filter(|code| !code.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn mapper() -> JobMapper {
        let config = EngineConfig::default();
        JobMapper::new(&DepartmentPipeline::new(config.pipeline, &config.scheduling))
    }

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_full_row_with_aliases() {
        let import = mapper().map_records(vec![record(&[
            ("Job", "J-100"),
            ("Points", "1,250.5"),
            ("Due Date", "3/15/2026"),
            ("Dept", "Press Brake"),
            ("Status", "In Progress"),
            ("Fast Ship", "Y"),
            ("Skip Departments", "polishing; Assembly"),
            ("Sales Order", "SO-9"),
            ("Press-Brake_Start", "2026-01-29"),
            ("PRESS_BRAKE_END", "2026-02-04"),
        ])]);

        assert!(import.issues.is_empty());
        let job = &import.jobs[0];
        assert_eq!(job.job_id, "J-100");
        assert_eq!(job.points, 1250.5);
        assert_eq!(job.due_date, Some(d(2026, 3, 15)));
        assert_eq!(job.current_department, "PRESS_BRAKE");
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.priority);
        assert!(job.overrides.skip_departments.contains("POLISHING"));
        assert!(job.overrides.skip_departments.contains("ASSEMBLY"));
        assert_eq!(job.sales_order.as_deref(), Some("SO-9"));
        assert_eq!(job.department_schedule.len(), 1);
        assert_eq!(job.department_schedule[0].start, d(2026, 1, 29));
    }

    #[test]
    fn test_bad_rows_become_issues() {
        let import = mapper().map_records(vec![
            record(&[("job_id", ""), ("points", "10"), ("department", "LASER")]),
            record(&[("job_id", "J-2"), ("points", "abc"), ("department", "LASER")]),
            record(&[
                ("job_id", "J-3"),
                ("points", "10"),
                ("department", "LASER"),
                ("due_date", "next week"),
            ]),
            record(&[("job_id", "J-4"), ("points", "10"), ("department", "LASER")]),
        ]);

        assert_eq!(import.jobs.len(), 1);
        assert_eq!(import.jobs[0].job_id, "J-4");
        assert_eq!(import.issues.len(), 3);
        assert_eq!(import.issues[0].row, 2);
        assert_eq!(import.issues[1].job_id.as_deref(), Some("J-2"));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_value("2026-02-02"), Some(d(2026, 2, 2)));
        assert_eq!(parse_date_value("20260202"), Some(d(2026, 2, 2)));
        assert_eq!(parse_date_value("2/2/2026"), Some(d(2026, 2, 2)));
        // Excel 序列号 46055 = 2026-02-02
        assert_eq!(parse_date_value("46055"), Some(d(2026, 2, 2)));
        assert_eq!(parse_date_value("46055.5"), Some(d(2026, 2, 2)));
        assert_eq!(parse_date_value("soon"), None);
    }

    #[test]
    fn test_parse_skip_list_separators() {
        let skips = parse_skip_list(Some("laser|Press Brake;;welding"));
        assert_eq!(skips.len(), 3);
        assert!(skips.contains("PRESS_BRAKE"));
        assert!(parse_skip_list(None).is_empty());
    }
}
