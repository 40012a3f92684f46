//! 查询过滤器
//!
//! 每个过滤器既能在内存中逐条匹配（[`matches`](PatientFilter::matches)），
//! 也能被数据库实现翻译为 SQL 条件。所有时间区间均为闭区间。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Consultation, ConsultationStatut, DiabetesType, Medecin, MedecinStatus, Patient,
    PatientStatut, RendezVous, RendezVousStatut, RendezVousType, Specialite,
};

/// 闭区间 `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn within(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |from| at >= from) && to.map_or(true, |to| at <= to)
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.map_or(false, |value| value.to_lowercase().contains(needle))
}

/// 规范化搜索词，空白搜索词视为不过滤
pub fn normalize_search(query: Option<&str>) -> Option<String> {
    query
        .map(|query| query.trim().to_lowercase())
        .filter(|query| !query.is_empty())
}

/// 患者过滤器；结果按创建时间倒序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientFilter {
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub statut: Option<PatientStatut>,
    pub diabete: Option<DiabetesType>,
    /// 匹配姓、名、邮箱、电话（不区分大小写）
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl PatientFilter {
    pub fn created_between(range: DateRange) -> Self {
        Self {
            created_from: Some(range.start),
            created_to: Some(range.end),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        if !within(patient.created_at, self.created_from, self.created_to) {
            return false;
        }
        if self.statut.is_some_and(|statut| statut != patient.statut) {
            return false;
        }
        if self.diabete.is_some_and(|diabete| diabete != patient.diabete) {
            return false;
        }
        match normalize_search(self.search.as_deref()) {
            Some(needle) => {
                contains_ci(Some(&patient.nom), &needle)
                    || contains_ci(Some(&patient.prenom), &needle)
                    || contains_ci(patient.email.as_deref(), &needle)
                    || contains_ci(patient.telephone.as_deref(), &needle)
            }
            None => true,
        }
    }
}

/// 医生过滤器；结果按创建时间倒序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedecinFilter {
    pub specialite: Option<Specialite>,
    pub status: Option<MedecinStatus>,
    /// 匹配姓、名、邮箱、专科（不区分大小写）
    pub search: Option<String>,
    /// 精确匹配（小写）
    pub email: Option<String>,
    pub limit: Option<usize>,
}

impl MedecinFilter {
    pub fn with_status(status: MedecinStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            email: Some(email.trim().to_lowercase()),
            ..Default::default()
        }
    }

    pub fn matches(&self, medecin: &Medecin) -> bool {
        if self.specialite.is_some_and(|specialite| specialite != medecin.specialite) {
            return false;
        }
        if self.status.is_some_and(|status| status != medecin.status) {
            return false;
        }
        if let Some(email) = &self.email {
            if medecin.email.to_lowercase() != *email {
                return false;
            }
        }
        match normalize_search(self.search.as_deref()) {
            Some(needle) => {
                contains_ci(Some(&medecin.nom), &needle)
                    || contains_ci(Some(&medecin.prenom), &needle)
                    || contains_ci(Some(&medecin.email), &needle)
                    || contains_ci(Some(medecin.specialite.as_str()), &needle)
            }
            None => true,
        }
    }
}

/// 预约过滤器；结果按日期、时刻升序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RendezVousFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// 为空表示不限
    pub statuts: Vec<RendezVousStatut>,
    /// 为空表示不限
    pub kinds: Vec<RendezVousType>,
    pub medecin_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub heure: Option<String>,
    pub limit: Option<usize>,
}

impl RendezVousFilter {
    pub fn between(range: DateRange) -> Self {
        Self {
            date_from: Some(range.start),
            date_to: Some(range.end),
            ..Default::default()
        }
    }

    pub fn with_statuts(mut self, statuts: &[RendezVousStatut]) -> Self {
        self.statuts = statuts.to_vec();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, rdv: &RendezVous) -> bool {
        within(rdv.date, self.date_from, self.date_to)
            && (self.statuts.is_empty() || self.statuts.contains(&rdv.statut))
            && (self.kinds.is_empty() || self.kinds.contains(&rdv.kind))
            && self.medecin_id.map_or(true, |id| rdv.medecin.id == Some(id))
            && self.patient_id.map_or(true, |id| rdv.patient.id == Some(id))
            && self
                .heure
                .as_deref()
                .map_or(true, |heure| rdv.heure.trim() == heure.trim())
    }
}

/// 诊疗记录过滤器；结果按日期倒序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultationFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub patient_id: Option<Uuid>,
    pub medecin_id: Option<Uuid>,
    pub statut: Option<ConsultationStatut>,
    pub limit: Option<usize>,
}

impl ConsultationFilter {
    pub fn between(range: DateRange) -> Self {
        Self {
            date_from: Some(range.start),
            date_to: Some(range.end),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, consultation: &Consultation) -> bool {
        within(consultation.date, self.date_from, self.date_to)
            && self.patient_id.map_or(true, |id| consultation.patient_id == id)
            && self.medecin_id.map_or(true, |id| consultation.medecin_id == id)
            && self.statut.map_or(true, |statut| consultation.statut == statut)
    }
}
