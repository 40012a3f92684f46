//! 分组统计
//!
//! 所有分组结果按键首次出现的顺序输出。空集合返回空结果，各组计数之和等于集合大小。

use std::collections::HashMap;
use std::hash::Hash;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// 分组计数，`_id` 为分组键
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount<K> {
    #[serde(rename = "_id")]
    pub key: K,
    pub count: u64,
}

/// 分组汇总：计数、求和与均值
///
/// 求和时缺失值按 0 计；均值只统计存在的值，全部缺失时为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRollup<K> {
    #[serde(rename = "_id")]
    pub key: K,
    pub count: u64,
    pub sum: f64,
    pub avg: Option<f64>,
}

/// 按键计数，分组顺序为键首次出现的顺序
pub fn group_count<T, K, F>(items: &[T], key_fn: F) -> Vec<GroupCount<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<GroupCount<K>> = Vec::new();
    for item in items {
        let key = key_fn(item);
        match index.get(&key) {
            Some(&position) => groups[position].count += 1,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(GroupCount { key, count: 1 });
            }
        }
    }
    groups
}

/// 按键计数并累加数值，均值只统计有值的记录
pub fn group_rollup<T, K, F, V>(items: &[T], key_fn: F, value_fn: V) -> Vec<GroupRollup<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    V: Fn(&T) -> Option<f64>,
{
    struct Acc<K> {
        key: K,
        count: u64,
        sum: f64,
        present: u64,
    }

    let mut index: HashMap<K, usize> = HashMap::new();
    let mut accs: Vec<Acc<K>> = Vec::new();
    for item in items {
        let key = key_fn(item);
        let position = match index.get(&key) {
            Some(&position) => position,
            None => {
                index.insert(key.clone(), accs.len());
                accs.push(Acc {
                    key,
                    count: 0,
                    sum: 0.0,
                    present: 0,
                });
                accs.len() - 1
            }
        };
        let acc = &mut accs[position];
        acc.count += 1;
        if let Some(value) = value_fn(item) {
            acc.sum += value;
            acc.present += 1;
        }
    }

    accs.into_iter()
        .map(|acc| GroupRollup {
            key: acc.key,
            count: acc.count,
            sum: acc.sum,
            avg: (acc.present > 0).then(|| acc.sum / acc.present as f64),
        })
        .collect()
}

/// 具名布尔标志计数，序列化为保持顺序的 JSON 对象
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagCounts(pub Vec<(&'static str, u64)>);

impl FlagCounts {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, count)| *count)
    }
}

impl Serialize for FlagCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// 统计每个标志为真的条目数
pub fn flag_counts<T>(items: &[T], flags: &[(&'static str, fn(&T) -> bool)]) -> FlagCounts {
    FlagCounts(
        flags
            .iter()
            .map(|(name, predicate)| {
                (*name, items.iter().filter(|item| predicate(*item)).count() as u64)
            })
            .collect(),
    )
}

/// 年龄段表：`(上界（不含）, 标签)`，按顺序首个匹配
pub const AGE_BANDS: [(u32, &str); 3] = [(30, "18-29"), (50, "30-49"), (70, "50-69")];

pub const OLDEST_AGE_BAND: &str = "70+";

pub fn age_band(age: u32) -> &'static str {
    AGE_BANDS
        .iter()
        .find(|(upper, _)| age < *upper)
        .map(|(_, label)| *label)
        .unwrap_or(OLDEST_AGE_BAND)
}
