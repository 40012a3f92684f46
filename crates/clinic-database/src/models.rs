//! 数据库模型
//!
//! 可筛选的字段存为独立列，嵌套的临床子记录与状态历史存为 JSONB。
//! 枚举以其法语标签存储，读取时无法识别的标签视为数据库错误。

use std::str::FromStr;

use chrono::{DateTime, Utc};
use clinic_core::models::*;
use clinic_core::{ClinicError, Result, StatusHistory};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

fn label<T: FromStr<Err = ClinicError>>(column: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| ClinicError::Database(format!("列 {} 含有无法识别的值: '{}'", column, raw)))
}

fn non_negative(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ClinicError::Database(format!("列 {} 含有负值: {}", column, value)))
}

/// 数据库患者表
#[derive(Debug, FromRow)]
pub struct DbPatient {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub age: i32,
    pub sexe: String,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub photo_url: Option<String>,
    pub date_consultation: Option<DateTime<Utc>>,
    pub derniere_visite: Option<DateTime<Utc>>,
    pub profession: Option<String>,
    pub origine: Option<String>,
    pub diabete: String,
    pub statut: String,
    pub habitudes_toxiques: Json<HabitudesToxiques>,
    pub diagnostic: Json<Diagnostic>,
    pub antecedents: Json<Antecedents>,
    pub clinique: Json<Clinique>,
    pub admission: Json<Admission>,
    pub anesthesie: Json<Anesthesie>,
    pub evolution: Json<Evolution>,
    pub notes: Option<String>,
    pub ordonnances: Json<Vec<String>>,
    pub statut_history: Json<StatusHistory<PatientStatut>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbPatient> for Patient {
    type Error = ClinicError;

    fn try_from(row: DbPatient) -> Result<Self> {
        Ok(Patient {
            id: row.id,
            nom: row.nom,
            prenom: row.prenom,
            age: non_negative("age", row.age)?,
            sexe: label("sexe", &row.sexe)?,
            telephone: row.telephone,
            email: row.email,
            adresse: row.adresse,
            photo_url: row.photo_url,
            date_consultation: row.date_consultation,
            derniere_visite: row.derniere_visite,
            profession: row.profession,
            habitudes_toxiques: row.habitudes_toxiques.0,
            origine: row.origine,
            diabete: label("diabete", &row.diabete)?,
            diagnostic: row.diagnostic.0,
            antecedents: row.antecedents.0,
            clinique: row.clinique.0,
            consultation: row.admission.0,
            anesthesie: row.anesthesie.0,
            notes: row.notes,
            ordonnances: row.ordonnances.0,
            evolution: row.evolution.0,
            statut: label("statut", &row.statut)?,
            statut_history: row.statut_history.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库医生表
#[derive(Debug, FromRow)]
pub struct DbMedecin {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub specialite: String,
    pub email: String,
    pub telephone: String,
    pub status: String,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub horaires: Json<Horaires>,
    pub status_history: Option<Json<StatusHistory<MedecinStatus>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbMedecin> for Medecin {
    type Error = ClinicError;

    fn try_from(row: DbMedecin) -> Result<Self> {
        Ok(Medecin {
            id: row.id,
            nom: row.nom,
            prenom: row.prenom,
            specialite: label("specialite", &row.specialite)?,
            email: row.email,
            telephone: row.telephone,
            status: label("status", &row.status)?,
            photo_url: row.photo_url,
            notes: row.notes,
            horaires: row.horaires.0,
            status_history: row.status_history.map(|history| history.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库预约表；患者与医生引用拆为ID列与显示名列
#[derive(Debug, FromRow)]
pub struct DbRendezVous {
    pub id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_nom: Option<String>,
    pub medecin_id: Option<Uuid>,
    pub medecin_nom: Option<String>,
    pub date: DateTime<Utc>,
    pub heure: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub statut: String,
    pub duree: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbRendezVous> for RendezVous {
    type Error = ClinicError;

    fn try_from(row: DbRendezVous) -> Result<Self> {
        Ok(RendezVous {
            id: row.id,
            patient: PersonRef::new(row.patient_id, row.patient_nom),
            medecin: PersonRef::new(row.medecin_id, row.medecin_nom),
            date: row.date,
            heure: row.heure,
            kind: label("type", &row.kind)?,
            statut: label("statut", &row.statut)?,
            duree: non_negative("duree", row.duree)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库诊疗记录表
#[derive(Debug, FromRow)]
pub struct DbConsultation {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub diagnostic: Option<String>,
    pub traitement: Option<String>,
    pub notes: Option<String>,
    pub duree: Option<i32>,
    pub statut: String,
    pub montant: Option<f64>,
    pub paiement: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbConsultation> for Consultation {
    type Error = ClinicError;

    fn try_from(row: DbConsultation) -> Result<Self> {
        Ok(Consultation {
            id: row.id,
            date: row.date,
            kind: label("type", &row.kind)?,
            patient_id: row.patient_id,
            medecin_id: row.medecin_id,
            diagnostic: row.diagnostic,
            traitement: row.traitement,
            notes: row.notes,
            duree: row.duree.map(|duree| non_negative("duree", duree)).transpose()?,
            statut: label("statut", &row.statut)?,
            montant: row.montant,
            paiement: label("paiement", &row.paiement)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 批量转换查询结果
pub fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = ClinicError>,
{
    rows.into_iter().map(T::try_from).collect()
}
