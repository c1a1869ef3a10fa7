// ==========================================
// 钣金产能排程系统 - 日历覆写导入
// ==========================================
// 文件列: date, kind[, note]
// kind: WORK / OFF (HOLIDAY) / OVERTIME (OT)
// 红线: 日历是整体输入, 任一行无效即整批拒绝
// ==========================================

use crate::domain::calendar::{CalendarOverride, DayKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::importer::job_mapper::parse_date_value;
use std::path::Path;
use tracing::info;

/// 从 CSV / Excel 读取日历覆写
pub fn load_calendar_overrides<P: AsRef<Path>>(path: P) -> ImportResult<Vec<CalendarOverride>> {
    let records = UniversalFileParser.parse(path.as_ref())?;
    let overrides = map_calendar_records(&records)?;
    info!(
        path = %path.as_ref().display(),
        overrides = overrides.len(),
        "日历覆写加载完成"
    );
    Ok(overrides)
}

/// 原始行 → 日历覆写 (按日期排序, 同一日期以最后一行为准)
pub fn map_calendar_records(records: &[RawRecord]) -> ImportResult<Vec<CalendarOverride>> {
    let mut overrides: Vec<CalendarOverride> = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 2;
        let field = |name: &str| {
            record
                .iter()
                .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
        };

        let raw_date = field("date").ok_or_else(|| ImportError::FieldMappingError {
            row,
            message: "date 为空".to_string(),
        })?;
        let date = parse_date_value(raw_date).ok_or_else(|| ImportError::DateFormatError {
            row,
            field: "date".to_string(),
            value: raw_date.to_string(),
        })?;

        let raw_kind = field("kind").unwrap_or("OFF");
        let kind = DayKind::parse(raw_kind).ok_or_else(|| ImportError::TypeConversionError {
            row,
            field: "kind".to_string(),
            message: format!("未知日历类型: {}", raw_kind),
        })?;

        overrides.retain(|o| o.date != date);
        overrides.push(CalendarOverride {
            date,
            kind,
            note: field("note").map(str::to_string),
        });
    }

    overrides.sort_by_key(|o| o.date);
    Ok(overrides)
}
