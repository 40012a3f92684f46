//! 单类实体统计

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use clinic_core::store::{
    ConsultationFilter, DateRange, MedecinFilter, PatientFilter, RecordStore, RendezVousFilter,
};
use clinic_core::utils::{end_of_day, end_of_month, start_of_day, start_of_month, start_of_year};
use clinic_core::{
    ConsultationStatut, ConsultationType, DiabetesType, MedecinStatus, RendezVousStatut, Result,
    Sexe, Specialite,
};

use crate::buckets::{monthly_buckets, MonthKey};
use crate::grouping::{age_band, group_count, group_rollup, GroupCount};

/// 统计对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Patients,
    Medecins,
    RendezVous,
    Consultations,
}

/// 近期新增患者的统计窗口
pub const RECENT_PATIENT_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiabetesGroup {
    #[serde(rename = "_id")]
    pub key: DiabetesType,
    pub count: u64,
    pub avg_age: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_patients: u64,
    pub recent_patients: u64,
    pub by_diabetes_type: Vec<DiabetesGroup>,
    pub age_distribution: Vec<GroupCount<&'static str>>,
    pub gender_distribution: Vec<GroupCount<Sexe>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedecinStats {
    pub total_medecins: u64,
    pub available_medecins: u64,
    pub by_speciality: Vec<GroupCount<Specialite>>,
    pub by_status: Vec<GroupCount<MedecinStatus>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RendezVousStats {
    pub total_rendez_vous: u64,
    pub today_rendez_vous: u64,
    pub this_month: u64,
    pub this_month_by_status: Vec<GroupCount<RendezVousStatut>>,
}

/// `(类型, 状态)` 组合键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConsultationKey {
    #[serde(rename = "type")]
    pub kind: ConsultationType,
    pub statut: ConsultationStatut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationGroup {
    #[serde(rename = "_id")]
    pub key: ConsultationKey,
    pub count: u64,
    pub total_montant: f64,
    pub avg_duree: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStat {
    #[serde(rename = "_id")]
    pub key: MonthKey,
    pub count: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationStats {
    pub total_consultations: u64,
    pub total_revenue: f64,
    pub stats: Vec<ConsultationGroup>,
    pub monthly_stats: Vec<MonthlyStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityStatsSummary {
    Patients(PatientStats),
    Medecins(MedecinStats),
    RendezVous(RendezVousStats),
    Consultations(ConsultationStats),
}

pub async fn patient_stats(store: &dyn RecordStore, as_of: DateTime<Utc>) -> Result<PatientStats> {
    let recent = PatientFilter {
        created_from: Some(as_of - Duration::days(RECENT_PATIENT_DAYS)),
        ..Default::default()
    };
    let all = PatientFilter::default();
    let (patients, recent_patients) =
        tokio::try_join!(store.find_patients(&all), store.count_patients(&recent))?;

    let by_diabetes_type = group_rollup(&patients, |p| p.diabete, |p| Some(p.age as f64))
        .into_iter()
        .map(|group| DiabetesGroup {
            key: group.key,
            count: group.count,
            avg_age: group.avg,
        })
        .collect();

    Ok(PatientStats {
        total_patients: patients.len() as u64,
        recent_patients,
        by_diabetes_type,
        age_distribution: group_count(&patients, |p| age_band(p.age)),
        gender_distribution: group_count(&patients, |p| p.sexe),
    })
}

pub async fn medecin_stats(store: &dyn RecordStore) -> Result<MedecinStats> {
    let medecins = store.find_medecins(&MedecinFilter::default()).await?;
    let available_medecins = medecins.iter().filter(|m| m.disponible()).count() as u64;

    Ok(MedecinStats {
        total_medecins: medecins.len() as u64,
        available_medecins,
        by_speciality: group_count(&medecins, |m| m.specialite),
        by_status: group_count(&medecins, |m| m.status),
    })
}

pub async fn rendez_vous_stats(store: &dyn RecordStore, as_of: DateTime<Utc>) -> Result<RendezVousStats> {
    let all = RendezVousFilter::default();
    let today = RendezVousFilter::between(DateRange::new(start_of_day(as_of), end_of_day(as_of)));
    let month = RendezVousFilter::between(DateRange::new(start_of_month(as_of), end_of_month(as_of)));

    let (total_rendez_vous, today_rendez_vous, this_month) = tokio::try_join!(
        store.count_rendez_vous(&all),
        store.count_rendez_vous(&today),
        store.find_rendez_vous(&month),
    )?;

    Ok(RendezVousStats {
        total_rendez_vous,
        today_rendez_vous,
        this_month: this_month.len() as u64,
        this_month_by_status: group_count(&this_month, |r| r.statut),
    })
}

/// 默认区间：当年1月1日至 `as_of` 当天结束
pub fn default_consultation_range(as_of: DateTime<Utc>) -> DateRange {
    DateRange::new(start_of_year(as_of), end_of_day(as_of))
}

pub async fn consultation_stats(
    store: &dyn RecordStore,
    as_of: DateTime<Utc>,
    range: Option<DateRange>,
) -> Result<ConsultationStats> {
    let range = range.unwrap_or_else(|| default_consultation_range(as_of));
    let consultations = store
        .find_consultations(&ConsultationFilter::between(range))
        .await?;

    let by_amount = group_rollup(
        &consultations,
        |c| ConsultationKey {
            kind: c.kind,
            statut: c.statut,
        },
        |c| c.montant,
    );
    let by_duration = group_rollup(
        &consultations,
        |c| ConsultationKey {
            kind: c.kind,
            statut: c.statut,
        },
        |c| c.duree.map(f64::from),
    );
    // 两次分组的键与顺序一致
    let stats = by_amount
        .into_iter()
        .zip(by_duration)
        .map(|(amount, duration)| ConsultationGroup {
            key: amount.key,
            count: amount.count,
            total_montant: amount.sum,
            avg_duree: duration.avg,
        })
        .collect();

    let monthly_stats = monthly_buckets(&consultations)
        .into_iter()
        .map(|bucket| MonthlyStat {
            key: bucket.key,
            count: bucket.count,
            revenue: bucket.revenue,
        })
        .collect();

    Ok(ConsultationStats {
        total_consultations: consultations.len() as u64,
        total_revenue: consultations.iter().map(|c| c.montant.unwrap_or(0.0)).sum(),
        stats,
        monthly_stats,
    })
}

/// 按实体类别计算统计；`range` 仅对诊疗记录生效
pub async fn compute_entity_stats(
    store: &dyn RecordStore,
    kind: EntityKind,
    as_of: DateTime<Utc>,
    range: Option<DateRange>,
) -> Result<EntityStatsSummary> {
    tracing::debug!("Computing {:?} stats as of {}", kind, as_of);
    let summary = match kind {
        EntityKind::Patients => EntityStatsSummary::Patients(patient_stats(store, as_of).await?),
        EntityKind::Medecins => EntityStatsSummary::Medecins(medecin_stats(store).await?),
        EntityKind::RendezVous => {
            EntityStatsSummary::RendezVous(rendez_vous_stats(store, as_of).await?)
        }
        EntityKind::Consultations => {
            EntityStatsSummary::Consultations(consultation_stats(store, as_of, range).await?)
        }
    };
    Ok(summary)
}
