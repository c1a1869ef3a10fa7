// ==========================================
// 钣金产能排程系统 - 导入层
// ==========================================
// 职责: 外部文件 → 工单快照 / 日历覆写
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

pub mod calendar_loader;
pub mod error;
pub mod file_parser;
pub mod job_importer;
pub mod job_mapper;

// 重导出核心类型
pub use calendar_loader::{load_calendar_overrides, map_calendar_records};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use job_importer::JobImporter;
pub use job_mapper::{parse_date_value, ImportIssue, JobImport, JobMapper};
