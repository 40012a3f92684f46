//! 医生模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::StatusHistory;

labeled_enum! {
    /// 医生专科
    pub enum Specialite {
        Diabetologue => "Diabétologue",
        Endocrinologue => "Endocrinologue",
        Podologue => "Podologue",
        Cardiologue => "Cardiologue",
        Nephrologue => "Néphrologue",
        Autre => "Autre",
    }
}

labeled_enum! {
    /// 医生在岗状态
    #[derive(Default)]
    pub enum MedecinStatus {
        #[default]
        EnService => "En service",
        EnConge => "En congé",
        EnFormation => "En formation",
    }
}

/// 单日排班
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plage {
    pub debut: Option<String>,
    pub fin: Option<String>,
}

/// 每周排班
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Horaires {
    pub lundi: Plage,
    pub mardi: Plage,
    pub mercredi: Plage,
    pub jeudi: Plage,
    pub vendredi: Plage,
    pub samedi: Plage,
    pub dimanche: Plage,
}

/// 医生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medecin {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub specialite: Specialite,
    pub email: String,
    pub telephone: String,
    pub status: MedecinStatus,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub horaires: Horaires,
    /// 部分历史数据没有状态日志
    pub status_history: Option<StatusHistory<MedecinStatus>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medecin {
    pub fn nom_complet(&self) -> String {
        format!("{} {}", self.nom, self.prenom)
    }

    pub fn disponible(&self) -> bool {
        self.status == MedecinStatus::EnService
    }

    /// 修改在岗状态并追加历史记录
    pub fn change_status(&mut self, status: MedecinStatus, at: DateTime<Utc>) {
        self.status = status;
        self.status_history
            .get_or_insert_with(StatusHistory::new)
            .record(status, at);
        self.updated_at = at;
    }
}

/// 医生写入模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedecinInput {
    pub nom: String,
    pub prenom: String,
    pub specialite: Option<Specialite>,
    pub email: String,
    pub telephone: String,
    pub status: MedecinStatus,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub horaires: Horaires,
    pub status_history: Option<StatusHistory<MedecinStatus>>,
}

impl MedecinInput {
    pub fn into_medecin(self, id: Uuid, now: DateTime<Utc>) -> Medecin {
        let nom = match self.nom.trim() {
            "" => "Dr.".to_string(),
            nom => nom.to_string(),
        };
        Medecin {
            id,
            nom,
            prenom: self.prenom.trim().to_string(),
            specialite: self.specialite.unwrap_or(Specialite::Autre),
            email: self.email.trim().to_lowercase(),
            telephone: self.telephone.trim().to_string(),
            status: self.status,
            photo_url: self.photo_url,
            notes: self.notes,
            horaires: self.horaires,
            status_history: self.status_history,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, existing: &Medecin, now: DateTime<Utc>) -> Medecin {
        let history = self
            .status_history
            .clone()
            .or_else(|| existing.status_history.clone());
        let mut medecin = MedecinInput {
            status_history: history,
            ..self
        }
        .into_medecin(existing.id, existing.created_at);
        medecin.updated_at = now;
        medecin
    }
}

impl From<&Medecin> for MedecinInput {
    fn from(medecin: &Medecin) -> Self {
        let medecin = medecin.clone();
        Self {
            nom: medecin.nom,
            prenom: medecin.prenom,
            specialite: Some(medecin.specialite),
            email: medecin.email,
            telephone: medecin.telephone,
            status: medecin.status,
            photo_url: medecin.photo_url,
            notes: medecin.notes,
            horaires: medecin.horaires,
            status_history: medecin.status_history,
        }
    }
}
