//! 诊疗记录模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PersonRef;

labeled_enum! {
    /// 诊疗类型
    pub enum ConsultationType {
        Consultation => "Consultation",
        Urgence => "Urgence",
        Controle => "Contrôle",
        Suivi => "Suivi",
        ConsultationInitiale => "Consultation initiale",
    }
}

labeled_enum! {
    /// 诊疗状态
    #[derive(Default)]
    pub enum ConsultationStatut {
        #[default]
        Planifie => "Planifié",
        EnCours => "En cours",
        Termine => "Terminé",
        Annule => "Annulé",
    }
}

labeled_enum! {
    /// 付款状态
    #[derive(Default)]
    pub enum Paiement {
        #[default]
        NonPaye => "Non payé",
        Paye => "Payé",
        PartiellementPaye => "Partiellement payé",
    }
}

pub const DEFAULT_CONSULTATION_DUREE: u32 = 30;

/// 诊疗记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ConsultationType,
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub diagnostic: Option<String>,
    pub traitement: Option<String>,
    pub notes: Option<String>,
    /// 分钟
    pub duree: Option<u32>,
    pub statut: ConsultationStatut,
    pub montant: Option<f64>,
    pub paiement: Paiement,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 列表视图：诊疗记录加上患者与医生的引用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultationWithNames {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient: PersonRef,
    pub medecin: PersonRef,
}

/// 诊疗记录写入模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsultationInput {
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<ConsultationType>,
    pub patient_id: Option<Uuid>,
    pub medecin_id: Option<Uuid>,
    pub diagnostic: Option<String>,
    pub traitement: Option<String>,
    pub notes: Option<String>,
    pub duree: Option<u32>,
    pub statut: ConsultationStatut,
    pub montant: Option<f64>,
    pub paiement: Paiement,
}

impl ConsultationInput {
    /// 调用前应先通过验证（患者与医生ID必填）
    pub fn into_consultation(self, id: Uuid, now: DateTime<Utc>) -> Consultation {
        Consultation {
            id,
            date: self.date.unwrap_or(now),
            kind: self.kind.unwrap_or(ConsultationType::Consultation),
            patient_id: self.patient_id.unwrap_or_default(),
            medecin_id: self.medecin_id.unwrap_or_default(),
            diagnostic: self.diagnostic,
            traitement: self.traitement,
            notes: self.notes,
            duree: Some(self.duree.unwrap_or(DEFAULT_CONSULTATION_DUREE)),
            statut: self.statut,
            montant: Some(self.montant.unwrap_or(0.0)),
            paiement: self.paiement,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, existing: &Consultation, now: DateTime<Utc>) -> Consultation {
        let mut updated = self.into_consultation(existing.id, existing.created_at);
        updated.updated_at = now;
        updated
    }
}

impl From<&Consultation> for ConsultationInput {
    fn from(consultation: &Consultation) -> Self {
        let consultation = consultation.clone();
        Self {
            date: Some(consultation.date),
            kind: Some(consultation.kind),
            patient_id: Some(consultation.patient_id),
            medecin_id: Some(consultation.medecin_id),
            diagnostic: consultation.diagnostic,
            traitement: consultation.traitement,
            notes: consultation.notes,
            duree: consultation.duree,
            statut: consultation.statut,
            montant: consultation.montant,
            paiement: consultation.paiement,
        }
    }
}
