// ==========================================
// 钣金产能排程系统 - 车间日历
// ==========================================
// 职责: 工作日判定、工作日加减、区间工作日枚举
// 红线: 纯函数, 只依赖 (日期, 覆写表)
// ==========================================

use crate::domain::calendar::{CalendarOverride, DayKind};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

// ==========================================
// ShopCalendar - 车间日历
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopCalendar {
    overrides: BTreeMap<NaiveDate, DayKind>,
}

impl ShopCalendar {
    /// 标准日历 (周一至周五工作)
    pub fn standard() -> Self {
        Self::default()
    }

    /// 带覆写表的日历 (同一日期多次出现时以最后一条为准)
    pub fn with_overrides(overrides: &[CalendarOverride]) -> Self {
        let overrides = overrides.iter().map(|o| (o.date, o.kind)).collect();
        Self { overrides }
    }

    pub fn set_override(&mut self, date: NaiveDate, kind: DayKind) {
        self.overrides.insert(date, kind);
    }

    /// 是否工作日
    ///
    /// 覆写优先; 无覆写时周六周日为非工作日
    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        match self.overrides.get(&date) {
            Some(kind) => kind.is_work(),
            None => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }

    /// 是否加班日
    pub fn is_overtime_day(&self, date: NaiveDate) -> bool {
        self.overrides.get(&date) == Some(&DayKind::Overtime)
    }

    /// 当日或之后的第一个工作日
    pub fn next_work_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_work_day(current) {
            current += Duration::days(1);
        }
        current
    }

    /// 向后推 n 个工作日 (n = 0 返回原日期)
    pub fn add_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        let mut remaining = n;
        while remaining > 0 {
            current += Duration::days(1);
            if self.is_work_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    /// 向前推 n 个工作日 (n = 0 返回原日期)
    pub fn subtract_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        let mut remaining = n;
        while remaining > 0 {
            current -= Duration::days(1);
            if self.is_work_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    /// 闭区间内的全部工作日
    pub fn work_days_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_work_day(current) {
                days.push(current);
            }
            current += Duration::days(1);
        }
        days
    }

    /// 带符号的工作日差
    ///
    /// to > from: (from, to] 内的工作日数
    /// to < from: -(to, from] 内的工作日数
    pub fn business_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if to == from {
            return 0;
        }
        let (lo, hi, sign) = if to > from { (from, to, 1) } else { (to, from, -1) };
        let count = self.work_days_in(lo + Duration::days(1), hi).len() as i64;
        sign * count
    }

    /// 从 start (对齐到工作日) 起占用 duration 个工作日的结束日
    pub fn window_end(&self, start: NaiveDate, duration: u32) -> NaiveDate {
        let start = self.next_work_day(start);
        self.add_business_days(start, duration.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekend_is_not_work_day() {
        let cal = ShopCalendar::standard();
        assert!(cal.is_work_day(d(2026, 2, 6))); // 周五
        assert!(!cal.is_work_day(d(2026, 2, 7))); // 周六
        assert!(!cal.is_work_day(d(2026, 2, 8))); // 周日
    }

    #[test]
    fn test_overtime_saturday_is_work_day() {
        let cal = ShopCalendar::with_overrides(&[CalendarOverride {
            date: d(2026, 2, 7),
            kind: DayKind::Overtime,
            note: None,
        }]);
        assert!(cal.is_work_day(d(2026, 2, 7)));
        assert!(cal.is_overtime_day(d(2026, 2, 7)));
        assert_eq!(cal.add_business_days(d(2026, 2, 6), 1), d(2026, 2, 7));
    }

    #[test]
    fn test_holiday_is_skipped() {
        let mut cal = ShopCalendar::standard();
        cal.set_override(d(2026, 2, 16), DayKind::Off);
        assert!(!cal.is_work_day(d(2026, 2, 16)));
        assert_eq!(cal.add_business_days(d(2026, 2, 13), 1), d(2026, 2, 17));
    }

    #[test]
    fn test_add_and_subtract_business_days() {
        let cal = ShopCalendar::standard();
        assert_eq!(cal.add_business_days(d(2026, 2, 6), 1), d(2026, 2, 9));
        assert_eq!(cal.add_business_days(d(2026, 2, 2), 26), d(2026, 3, 10));
        assert_eq!(cal.subtract_business_days(d(2026, 2, 9), 1), d(2026, 2, 6));
        assert_eq!(cal.subtract_business_days(d(2026, 2, 9), 0), d(2026, 2, 9));
    }

    #[test]
    fn test_business_days_between_is_signed() {
        let cal = ShopCalendar::standard();
        assert_eq!(cal.business_days_between(d(2026, 2, 2), d(2026, 2, 9)), 5);
        assert_eq!(cal.business_days_between(d(2026, 2, 9), d(2026, 2, 2)), -5);
        assert_eq!(cal.business_days_between(d(2026, 2, 6), d(2026, 2, 8)), 0);
        assert_eq!(cal.business_days_between(d(2026, 2, 6), d(2026, 2, 6)), 0);
    }

    #[test]
    fn test_window_end_aligns_start() {
        let cal = ShopCalendar::standard();
        // 周六开工 → 周一对齐, 3 个工作日到周三
        assert_eq!(cal.window_end(d(2026, 2, 7), 3), d(2026, 2, 11));
        assert_eq!(cal.window_end(d(2026, 2, 2), 1), d(2026, 2, 2));
        assert_eq!(cal.work_days_in(d(2026, 2, 5), d(2026, 2, 10)).len(), 4);
    }
}
