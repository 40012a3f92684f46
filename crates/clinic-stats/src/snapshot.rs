//! 时间点状态重建
//!
//! 根据状态历史推算实体在某一时刻的状态。历史中没有截止时间之前的记录时，
//! 交由 [`PreHistoryFallback`] 决定结果。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{Medecin, MedecinStatus, Patient, PatientStatut, StatusHistory};

/// 历史缺失时的回退策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreHistoryFallback {
    /// 实体在截止时间之前已创建，则取其当前状态
    #[default]
    CurrentStatus,
    /// 视为无数据
    Exclude,
}

impl PreHistoryFallback {
    pub fn resolve<S: Copy>(self, current: S, created_at: DateTime<Utc>, cutoff: DateTime<Utc>) -> Option<S> {
        match self {
            PreHistoryFallback::CurrentStatus if created_at <= cutoff => Some(current),
            PreHistoryFallback::CurrentStatus | PreHistoryFallback::Exclude => None,
        }
    }
}

/// 带状态历史的实体
pub trait Tracked {
    type Status: Copy;

    fn current_status(&self) -> Self::Status;
    fn created_at(&self) -> DateTime<Utc>;
    fn history(&self) -> Option<&StatusHistory<Self::Status>>;
}

impl Tracked for Patient {
    type Status = PatientStatut;

    fn current_status(&self) -> PatientStatut {
        self.statut
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn history(&self) -> Option<&StatusHistory<PatientStatut>> {
        Some(&self.statut_history)
    }
}

impl Tracked for Medecin {
    type Status = MedecinStatus;

    fn current_status(&self) -> MedecinStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn history(&self) -> Option<&StatusHistory<MedecinStatus>> {
        self.status_history.as_ref()
    }
}

/// 实体在 `cutoff` 时刻的状态；`None` 表示无数据
pub fn status_as_of<E: Tracked>(
    entity: &E,
    cutoff: DateTime<Utc>,
    fallback: PreHistoryFallback,
) -> Option<E::Status> {
    entity
        .history()
        .and_then(|history| history.status_at(cutoff).copied())
        .or_else(|| fallback.resolve(entity.current_status(), entity.created_at(), cutoff))
}

/// 一组实体中日期无法解析的历史记录总数
pub fn malformed_history_entries<E: Tracked>(entities: &[E]) -> usize {
    entities
        .iter()
        .filter_map(|entity| entity.history())
        .map(|history| history.malformed_count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use clinic_core::{MedecinInput, PatientInput, Sexe};
    use uuid::Uuid;

    fn day(n: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-04-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::days(n)
    }

    fn patient(created: DateTime<Utc>, statut: PatientStatut) -> Patient {
        PatientInput {
            nom: "Saidi".into(),
            prenom: "Nadia".into(),
            age: 61,
            sexe: Some(Sexe::Femme),
            statut,
            ..Default::default()
        }
        .into_patient(Uuid::new_v4(), created)
    }

    #[test]
    fn test_reconstruction_from_history() {
        let mut p = patient(day(0), PatientStatut::Decede);
        p.statut_history.record(PatientStatut::Nouveau, day(1));
        p.statut_history.record(PatientStatut::SousTraitement, day(3));

        let fallback = PreHistoryFallback::CurrentStatus;
        assert_eq!(status_as_of(&p, day(2), fallback), Some(PatientStatut::Nouveau));
        assert_eq!(status_as_of(&p, day(3), fallback), Some(PatientStatut::SousTraitement));
        assert_eq!(status_as_of(&p, day(9), fallback), Some(PatientStatut::SousTraitement));
    }

    #[test]
    fn test_fallback_before_first_history_entry() {
        let mut p = patient(day(0), PatientStatut::ApresTraitement);
        p.statut_history.record(PatientStatut::Nouveau, day(1));
        p.statut_history.record(PatientStatut::SousTraitement, day(3));

        let before_history = day(0) + Duration::hours(1);
        assert_eq!(
            status_as_of(&p, before_history, PreHistoryFallback::CurrentStatus),
            Some(PatientStatut::ApresTraitement)
        );
        assert_eq!(status_as_of(&p, before_history, PreHistoryFallback::Exclude), None);
        // 创建之前：无数据
        assert_eq!(status_as_of(&p, day(-1), PreHistoryFallback::CurrentStatus), None);
    }

    #[test]
    fn test_medecin_without_history_uses_fallback() {
        let m = MedecinInput {
            prenom: "Yacine".into(),
            email: "y.haddad@clinique.dz".into(),
            status: MedecinStatus::EnConge,
            ..Default::default()
        }
        .into_medecin(Uuid::new_v4(), day(0));

        assert!(m.status_history.is_none());
        assert_eq!(
            status_as_of(&m, day(5), PreHistoryFallback::CurrentStatus),
            Some(MedecinStatus::EnConge)
        );
        assert_eq!(status_as_of(&m, day(5), PreHistoryFallback::Exclude), None);
    }

    #[test]
    fn test_fallback_deserializes_from_snake_case() {
        let fallback: PreHistoryFallback = serde_json::from_str("\"exclude\"").unwrap();
        assert_eq!(fallback, PreHistoryFallback::Exclude);
    }
}
