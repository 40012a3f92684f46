//! 预约模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PersonRef;

labeled_enum! {
    /// 预约类型
    pub enum RendezVousType {
        Consultation => "Consultation",
        Controle => "Contrôle",
        Urgence => "Urgence",
        SuiviTraitement => "Suivi traitement",
        ConsultationInitiale => "Consultation initiale",
    }
}

labeled_enum! {
    /// 预约状态
    #[derive(Default)]
    pub enum RendezVousStatut {
        Confirme => "Confirmé",
        #[default]
        EnAttente => "En attente",
        Annule => "Annulé",
        Termine => "Terminé",
    }
}

impl RendezVousStatut {
    /// 已实际发生（或确认发生）的预约
    pub const REALIZED: [RendezVousStatut; 2] = [RendezVousStatut::Confirme, RendezVousStatut::Termine];

    /// 仍待进行的预约
    pub const OPEN: [RendezVousStatut; 2] = [RendezVousStatut::Confirme, RendezVousStatut::EnAttente];
}

pub const DEFAULT_RENDEZ_VOUS_DUREE: u32 = 30;

/// 预约
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendezVous {
    pub id: Uuid,
    pub patient: PersonRef,
    pub medecin: PersonRef,
    pub date: DateTime<Utc>,
    /// `HH:MM`
    pub heure: String,
    #[serde(rename = "type")]
    pub kind: RendezVousType,
    pub statut: RendezVousStatut,
    /// 分钟
    pub duree: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RendezVous {
    /// 同一医生、同一天、同一时刻
    pub fn occupies_slot(&self, medecin: &PersonRef, date: DateTime<Utc>, heure: &str) -> bool {
        self.medecin.same_person(medecin)
            && self.date.date_naive() == date.date_naive()
            && self.heure.trim() == heure.trim()
    }

    pub fn is_realized(&self) -> bool {
        RendezVousStatut::REALIZED.contains(&self.statut)
    }
}

/// 预约写入模型
///
/// 接口层沿用 `patient`/`patientId` 与 `medecin`/`medecinId` 两组字段，
/// 入库前合并为 [`PersonRef`]。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RendezVousInput {
    pub patient: Option<String>,
    pub patient_id: Option<Uuid>,
    pub medecin: Option<String>,
    pub medecin_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub heure: String,
    #[serde(rename = "type")]
    pub kind: Option<RendezVousType>,
    pub statut: Option<RendezVousStatut>,
    pub duree: Option<u32>,
    pub notes: Option<String>,
}

impl RendezVousInput {
    pub fn patient_ref(&self) -> PersonRef {
        PersonRef::new(self.patient_id, self.patient.clone())
    }

    pub fn medecin_ref(&self) -> PersonRef {
        PersonRef::new(self.medecin_id, self.medecin.clone())
    }

    /// 新预约一律从“待确认”开始
    pub fn into_rendez_vous(self, id: Uuid, now: DateTime<Utc>) -> RendezVous {
        RendezVous {
            id,
            patient: self.patient_ref(),
            medecin: self.medecin_ref(),
            date: self.date.unwrap_or(now),
            heure: self.heure.trim().to_string(),
            kind: self.kind.unwrap_or(RendezVousType::Consultation),
            statut: RendezVousStatut::EnAttente,
            duree: self.duree.unwrap_or(DEFAULT_RENDEZ_VOUS_DUREE),
            notes: self.notes.or_else(|| Some(String::new())),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, existing: &RendezVous, now: DateTime<Utc>) -> RendezVous {
        let statut = self.statut.unwrap_or(existing.statut);
        let mut updated = self.into_rendez_vous(existing.id, existing.created_at);
        updated.statut = statut;
        updated.updated_at = now;
        updated
    }
}

impl From<&RendezVous> for RendezVousInput {
    fn from(rdv: &RendezVous) -> Self {
        let rdv = rdv.clone();
        Self {
            patient: rdv.patient.display_name,
            patient_id: rdv.patient.id,
            medecin: rdv.medecin.display_name,
            medecin_id: rdv.medecin.id,
            date: Some(rdv.date),
            heure: rdv.heure,
            kind: Some(rdv.kind),
            statut: Some(rdv.statut),
            duree: Some(rdv.duree),
            notes: rdv.notes,
        }
    }
}
