//! 数据模型模块

pub mod consultation;
pub mod medecin;
pub mod patient;
pub mod rendez_vous;

pub use consultation::*;
pub use medecin::*;
pub use patient::*;
pub use rendez_vous::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClinicError, Result};

/// 把部分更新覆盖到现有写入模型上
///
/// 只替换请求体中出现的顶层字段（嵌套子记录整体替换），其余字段保持原值。
pub fn merge_patch<I>(current: &I, patch: Value) -> Result<I>
where
    I: Serialize + DeserializeOwned,
{
    let Value::Object(fields) = patch else {
        return Err(ClinicError::Validation("请求体必须是JSON对象".to_string()));
    };
    debug!("Merging update of {} field(s)", fields.len());

    let mut merged = serde_json::to_value(current)?;
    if let Some(target) = merged.as_object_mut() {
        target.extend(fields);
    }
    serde_json::from_value(merged).map_err(|err| ClinicError::Validation(err.to_string()))
}

/// 对患者或医生的弱引用
///
/// 旧数据只保存了显示名，新数据通常只保存ID；两者至少其一存在。
/// 显示名缺失时由存储层按ID补全。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonRef {
    pub id: Option<Uuid>,
    pub display_name: Option<String>,
}

impl PersonRef {
    pub fn new(id: Option<Uuid>, display_name: Option<String>) -> Self {
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self { id, display_name }
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::new(Some(id), None)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(None, Some(name.into()))
    }

    /// ID与显示名都缺失
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.display_name.is_none()
    }

    /// 是否指向同一个人：双方都有ID时比较ID，否则比较显示名（忽略大小写）
    pub fn same_person(&self, other: &PersonRef) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        match (&self.display_name, &other.display_name) {
            (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => false,
        }
    }

    /// 是否匹配给定ID或显示名
    pub fn matches(&self, id: Option<Uuid>, name: Option<&str>) -> bool {
        let by_id = matches!((self.id, id), (Some(a), Some(b)) if a == b);
        let by_name = match (&self.display_name, name) {
            (Some(a), Some(b)) => a.to_lowercase() == b.trim().to_lowercase(),
            _ => false,
        };
        by_id || by_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_patch_rejects_non_objects_and_bad_labels() {
        let current = PersonRef::by_name("Dr. Benali");
        assert!(matches!(
            merge_patch(&current, serde_json::json!(["id"])),
            Err(ClinicError::Validation(_))
        ));

        let input = RendezVousInput {
            heure: "09:00".into(),
            ..Default::default()
        };
        let merged = merge_patch(&input, serde_json::json!({ "heure": "10:30" })).unwrap();
        assert_eq!(merged.heure, "10:30");
        assert!(matches!(
            merge_patch(&input, serde_json::json!({ "statut": "Reporté" })),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_name_is_dropped() {
        let person = PersonRef::new(None, Some("   ".into()));
        assert!(person.is_empty());
    }

    #[test]
    fn test_same_person_prefers_ids() {
        let id = Uuid::new_v4();
        let a = PersonRef::new(Some(id), Some("Dr. Benali".into()));
        let b = PersonRef::new(Some(Uuid::new_v4()), Some("Dr. Benali".into()));
        assert!(!a.same_person(&b));
        assert!(a.same_person(&PersonRef::by_id(id)));
        assert!(a.same_person(&PersonRef::by_name("DR. BENALI")));
    }
}
