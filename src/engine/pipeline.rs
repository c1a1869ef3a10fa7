// ==========================================
// 钣金产能排程系统 - 工序流水线模型
// ==========================================
// 职责: 工序序列、点数分摊、工期换算、单工单覆写
// 输入: 工单 (点数 + 当前工序 + 覆写)
// 输出: StagePlan 列表 (工序下标 / 点数 / 工期)
// ==========================================

use crate::config::{DepartmentSpec, SchedulingRules};
use crate::domain::job::{DiagnosticKind, Job};
use crate::domain::types::{JobStatus, StageCursor};
use serde::{Deserialize, Serialize};

pub use crate::domain::types::normalize_department;

/// 单工序工期上限 (工作日, 约十年); 更长的工期按上限计, 由排程器报告无可用产能
pub const MAX_STAGE_DAYS: u32 = 2_600;

// ==========================================
// StagePlan - 单工序计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePlan {
    pub stage: usize,
    pub department: String,
    pub points: f64,
    pub duration_days: u32,
}

// ==========================================
// DepartmentPipeline - 工序流水线
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentPipeline {
    departments: Vec<DepartmentSpec>,
    gap_days: u32,
    paint_days: u32,
    paint_stage: Option<usize>,
}

impl DepartmentPipeline {
    /// 构造函数
    ///
    /// # 参数
    /// - `departments`: 有序工序定义 (来自配置)
    /// - `rules`: 排程规则 (间隔 / 外协喷涂)
    pub fn new(departments: Vec<DepartmentSpec>, rules: &SchedulingRules) -> Self {
        let paint_code = normalize_department(&rules.paint_department);
        let paint_stage = departments
            .iter()
            .position(|d| normalize_department(&d.code) == paint_code);
        Self {
            departments,
            gap_days: rules.department_gap_days,
            paint_days: rules.offsite_paint_days,
            paint_stage,
        }
    }

    pub fn departments(&self) -> &[DepartmentSpec] {
        &self.departments
    }

    pub fn code(&self, stage: usize) -> &str {
        &self.departments[stage].code
    }

    /// 工序代码 → 下标
    pub fn index_of(&self, department: &str) -> Option<usize> {
        let code = normalize_department(department);
        self.departments
            .iter()
            .position(|d| normalize_department(&d.code) == code)
    }

    // ==========================================
    // 工序游标
    // ==========================================

    /// 解析工单当前工序
    ///
    /// 已完工 → Done; 当前工序不在序列中 → 工单损坏
    pub fn cursor_for(&self, job: &Job) -> Result<StageCursor, DiagnosticKind> {
        if job.status == JobStatus::Complete {
            return Ok(StageCursor::Done);
        }
        self.index_of(&job.current_department)
            .map(StageCursor::At)
            .ok_or_else(|| DiagnosticKind::UnknownDepartment {
                department: job.current_department.clone(),
            })
    }

    /// 跳过列表中不存在于序列的工序
    pub fn unknown_skips(&self, job: &Job) -> Vec<String> {
        job.overrides
            .skip_departments
            .iter()
            .filter(|code| self.index_of(code).is_none())
            .cloned()
            .collect()
    }

    fn is_skipped(&self, job: &Job, stage: usize) -> bool {
        let code = normalize_department(&self.departments[stage].code);
        job.overrides
            .skip_departments
            .iter()
            .any(|s| normalize_department(s) == code)
    }

    // ==========================================
    // 点数分摊与工期换算
    // ==========================================

    /// 全部未跳过工序的计划 (按工序顺序)
    ///
    /// 点数按权重在未跳过工序之间分摊, 合计等于工单点数
    pub fn stage_plans(&self, job: &Job) -> Vec<StagePlan> {
        let active: Vec<usize> = (0..self.departments.len())
            .filter(|&stage| !self.is_skipped(job, stage))
            .collect();
        let total_weight: u32 = active
            .iter()
            .map(|&stage| self.departments[stage].share_weight)
            .sum();
        if total_weight == 0 {
            return Vec::new();
        }

        active
            .into_iter()
            .map(|stage| {
                let weight = self.departments[stage].share_weight;
                let points = job.points * f64::from(weight) / f64::from(total_weight);
                StagePlan {
                    stage,
                    department: self.departments[stage].code.clone(),
                    points,
                    duration_days: self.duration_for_points(job, stage, points),
                }
            })
            .collect()
    }

    /// 工单在某工序的工期 (工作日); 跳过的工序为 0
    pub fn duration_for(&self, job: &Job, stage: usize) -> u32 {
        self.stage_plans(job)
            .into_iter()
            .find(|plan| plan.stage == stage)
            .map(|plan| plan.duration_days)
            .unwrap_or(0)
    }

    fn duration_for_points(&self, job: &Job, stage: usize, points: f64) -> u32 {
        let rate = self.departments[stage].points_per_day;
        let base = (points / rate).ceil().clamp(1.0, f64::from(MAX_STAGE_DAYS)) as u32;
        if job.overrides.offsite_paint && Some(stage) == self.paint_stage {
            base.saturating_add(self.paint_days).min(MAX_STAGE_DAYS)
        } else {
            base
        }
    }

    /// 相邻工序之间插入的交接间隔 (无间隔覆写时为 0)
    pub fn gap_for(&self, job: &Job) -> u32 {
        if job.overrides.no_gaps {
            0
        } else {
            self.gap_days
        }
    }
}
