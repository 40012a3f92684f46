//! 状态历史记录
//!
//! 患者与医生的状态历史都是只追加的 `(状态, 时间)` 日志。日志按插入顺序保存，
//! 不保证按时间排序，同一天可以有多条记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::parse_flexible_datetime;

/// 一次状态变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    #[serde(rename = "statut", alias = "status")]
    pub status: S,
    /// 无法解析的日期读取为 `None`
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date: Option<DateTime<Utc>>,
}

impl<S> StatusChange<S> {
    pub fn new(status: S, date: DateTime<Utc>) -> Self {
        Self {
            status,
            date: Some(date),
        }
    }
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        serde_json::Value::String(text) => parse_flexible_datetime(&text),
        serde_json::Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }))
}

/// 状态历史日志
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory<S> {
    entries: Vec<StatusChange<S>>,
}

impl<S> Default for StatusHistory<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> StatusHistory<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<StatusChange<S>>) -> Self {
        Self { entries }
    }

    /// 追加一条记录
    pub fn record(&mut self, status: S, date: DateTime<Utc>) {
        self.entries.push(StatusChange::new(status, date));
    }

    pub fn entries(&self) -> &[StatusChange<S>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 日期无法解析的记录数
    pub fn malformed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.date.is_none()).count()
    }

    /// 截至 `cutoff`（含）最近的一条记录
    ///
    /// 日期相同时，后插入的记录优先。日期无法解析的记录被跳过。
    pub fn latest_at(&self, cutoff: DateTime<Utc>) -> Option<&StatusChange<S>> {
        let mut best: Option<(&StatusChange<S>, DateTime<Utc>)> = None;
        for entry in &self.entries {
            let Some(date) = entry.date else { continue };
            if date > cutoff {
                continue;
            }
            match best {
                Some((_, best_date)) if date < best_date => {}
                _ => best = Some((entry, date)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// 截至 `cutoff` 的状态，仅依据日志本身
    pub fn status_at(&self, cutoff: DateTime<Utc>) -> Option<&S> {
        self.latest_at(cutoff).map(|entry| &entry.status)
    }

    /// 按日期升序排列的有效记录
    pub fn chronological(&self) -> Vec<&StatusChange<S>> {
        let mut dated: Vec<&StatusChange<S>> =
            self.entries.iter().filter(|entry| entry.date.is_some()).collect();
        dated.sort_by_key(|entry| entry.date);
        dated
    }
}
