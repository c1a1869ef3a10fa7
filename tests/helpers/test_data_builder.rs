// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use fab_pipeline_aps::domain::job::{DepartmentWindow, Job};
use fab_pipeline_aps::domain::quote::QuoteRequest;
use fab_pipeline_aps::domain::types::JobStatus;
use std::collections::BTreeSet;

// ==========================================
// Job 构建器
// ==========================================

pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn new(job_id: &str) -> Self {
        Self {
            job: Job::new(job_id, 100.0, None, "ENGINEERING"),
        }
    }

    pub fn points(mut self, points: f64) -> Self {
        self.job.points = points;
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.job.due_date = Some(date);
        self
    }

    pub fn at(mut self, department: &str) -> Self {
        self.job.current_department = department.to_string();
        self
    }

    pub fn in_progress(mut self) -> Self {
        self.job.status = JobStatus::InProgress;
        self
    }

    pub fn complete(mut self) -> Self {
        self.job.status = JobStatus::Complete;
        self
    }

    pub fn priority(mut self) -> Self {
        self.job.priority = true;
        self
    }

    pub fn sales_order(mut self, sales_order: &str) -> Self {
        self.job.sales_order = Some(sales_order.to_string());
        self
    }

    pub fn skip(mut self, departments: &[&str]) -> Self {
        self.job
            .overrides
            .skip_departments
            .extend(departments.iter().map(|d| d.to_string()));
        self
    }

    pub fn no_gaps(mut self) -> Self {
        self.job.overrides.no_gaps = true;
        self
    }

    pub fn offsite_paint(mut self) -> Self {
        self.job.overrides.offsite_paint = true;
        self
    }

    pub fn hold_until(mut self, date: NaiveDate) -> Self {
        self.job.hold_until = Some(date);
        self
    }

    /// 记录已发生的工序窗
    pub fn recorded(
        mut self,
        stage: usize,
        department: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        self.job.department_schedule.push(DepartmentWindow {
            stage,
            department: department.to_string(),
            start,
            end,
            points: 0.0,
        });
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}

// ==========================================
// QuoteRequest 构建器
// ==========================================

pub struct QuoteBuilder {
    quote: QuoteRequest,
}

impl QuoteBuilder {
    pub fn new(quote_id: &str, total_value: f64, engineering_ready: NaiveDate) -> Self {
        Self {
            quote: QuoteRequest {
                quote_id: quote_id.to_string(),
                total_value,
                quantity: 1,
                big_rocks: Vec::new(),
                customer_program: false,
                engineering_ready,
                product_category: String::new(),
                target_date: None,
                skip_departments: BTreeSet::new(),
                offsite_paint: false,
            },
        }
    }

    pub fn target(mut self, date: NaiveDate) -> Self {
        self.quote.target_date = Some(date);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quote.quantity = quantity;
        self
    }

    pub fn customer_program(mut self) -> Self {
        self.quote.customer_program = true;
        self
    }

    pub fn build(self) -> QuoteRequest {
        self.quote
    }
}
