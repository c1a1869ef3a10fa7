// ==========================================
// 集成测试公共辅助
// ==========================================

#![allow(dead_code)]

pub mod test_data_builder;

use chrono::NaiveDate;
use fab_pipeline_aps::config::EngineConfig;
use fab_pipeline_aps::engine::{Orchestrator, ShopCalendar};
use fab_pipeline_aps::logging;

/// 固定基准日: 2026-02-02 (周一, ISO W06)
pub fn now() -> NaiveDate {
    d(2026, 2, 2)
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 默认配置 + 标准日历的编排器
pub fn orchestrator() -> Orchestrator {
    logging::init_test();
    Orchestrator::new(EngineConfig::default(), ShopCalendar::standard()).unwrap()
}

/// 六道工序中除指定工序外全部跳过
pub fn skip_all_but(department: &str) -> Vec<&'static str> {
    ["ENGINEERING", "LASER", "PRESS_BRAKE", "WELDING", "POLISHING", "ASSEMBLY"]
        .into_iter()
        .filter(|code| *code != department)
        .collect()
}
