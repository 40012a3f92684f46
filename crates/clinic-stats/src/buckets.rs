//! 周/月时间分桶
//!
//! 周以周日为起点：`[周日 00:00:00.000, 周六 23:59:59.999]`。所有计算按 UTC。

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use clinic_core::utils::start_of_day;
use clinic_core::Consultation;

/// 一周的时间区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekBucket {
    /// 包含 `at` 的那一周
    pub fn containing(at: DateTime<Utc>) -> Self {
        let offset = at.weekday().num_days_from_sunday() as i64;
        let start = start_of_day(at) - Duration::days(offset);
        Self {
            start,
            end: start + Duration::days(7) - Duration::milliseconds(1),
        }
    }

    /// `日/月`，取周起始日
    pub fn label(&self) -> String {
        format!("{}/{}", self.start.day(), self.start.month())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// 截至 `as_of` 所在周的连续 `count` 周，最近的一周在最后
pub fn weeks_ending_at(as_of: DateTime<Utc>, count: usize) -> Vec<WeekBucket> {
    let current = WeekBucket::containing(as_of);
    (0..count)
        .rev()
        .map(|back| {
            let start = current.start - Duration::weeks(back as i64);
            WeekBucket {
                start,
                end: start + Duration::days(7) - Duration::milliseconds(1),
            }
        })
        .collect()
}

/// 日历月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }
}

/// 单月诊疗量与收入
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub key: MonthKey,
    pub count: u64,
    pub revenue: f64,
}

/// 按月汇总诊疗记录，按 `(年, 月)` 升序；只输出有数据的月份
///
/// 调用方负责先按时间区间筛选。
pub fn monthly_buckets(consultations: &[Consultation]) -> Vec<MonthBucket> {
    let mut months: BTreeMap<MonthKey, (u64, f64)> = BTreeMap::new();
    for consultation in consultations {
        let entry = months.entry(MonthKey::of(consultation.date)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += consultation.montant.unwrap_or(0.0);
    }
    months
        .into_iter()
        .map(|(key, (count, revenue))| MonthBucket { key, count, revenue })
        .collect()
}
