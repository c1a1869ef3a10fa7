// ==========================================
// 钣金产能排程系统 - 工单导入器
// ==========================================
// 流程: 解析 (CSV / Excel) → 映射 → 行级问题汇总
// 红线: 只产出工单快照, 不触发排程
// ==========================================

use crate::engine::pipeline::DepartmentPipeline;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::job_mapper::{JobImport, JobMapper};
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

// ==========================================
// JobImporter - 工单导入器
// ==========================================
pub struct JobImporter {
    parser: UniversalFileParser,
    mapper: JobMapper,
}

impl JobImporter {
    pub fn new(pipeline: &DepartmentPipeline) -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: JobMapper::new(pipeline),
        }
    }

    /// 从文件导入工单快照
    ///
    /// # 返回
    /// - Ok(JobImport): 工单 + 行级问题 (坏行已跳过)
    /// - Err: 文件不存在、格式不支持、解析失败
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<JobImport> {
        let start_time = Instant::now();

        let records = self.parser.parse(file_path.as_ref())?;
        info!(records = records.len(), "文件解析完成");

        let import = self.mapper.map_records(records);
        if !import.issues.is_empty() {
            warn!(issues = import.issues.len(), "部分行未导入");
        }

        info!(
            jobs = import.jobs.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "工单导入完成"
        );
        Ok(import)
    }
}
