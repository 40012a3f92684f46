//! # Clinic Stats
//!
//! 诊所统计引擎：分组汇总、时间分桶、历史状态重建与仪表盘组装。
//! 引擎只依赖 [`clinic_core::RecordStore`]，不持有任何全局状态。

pub mod buckets;
pub mod dashboard;
pub mod entity_stats;
pub mod grouping;
pub mod series;
pub mod snapshot;

pub use buckets::{weeks_ending_at, MonthKey, WeekBucket};
pub use dashboard::{compute_dashboard, DashboardOptions, DashboardSummary};
pub use entity_stats::{compute_entity_stats, EntityKind, EntityStatsSummary};
pub use grouping::{age_band, flag_counts, group_count, group_rollup, GroupCount, GroupRollup};
pub use snapshot::{status_as_of, PreHistoryFallback};

#[cfg(test)]
pub(crate) mod fixtures;
