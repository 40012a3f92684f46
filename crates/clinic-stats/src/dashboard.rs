//! 仪表盘汇总
//!
//! 一次请求内并发执行全部子查询，任何一个失败则整体失败，不返回部分结果。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinic_core::store::{
    ConsultationFilter, DateRange, MedecinFilter, PatientFilter, RecordStore, RendezVousFilter,
};
use clinic_core::utils::{end_of_day, end_of_month, start_of_day, start_of_month, start_of_year};
use clinic_core::{
    ConsultationType, DiabetesType, Laterality, MaladieCardiovasculaire, Medecin, MedecinStatus,
    OuiNon, Patient, PersonRef, RendezVous, RendezVousStatut, Result, Sexe, Specialite,
    TypeOperation,
};

use crate::buckets::{monthly_buckets, weeks_ending_at, MonthKey};
use crate::grouping::{age_band, flag_counts, group_count, FlagCounts, GroupCount};
use crate::series::{
    weekly_medecins_in_service, weekly_patient_status, weekly_visits, WeeklyMedecinsInService,
    WeeklyPatientStatus, WeeklyVisits,
};
use crate::snapshot::{malformed_history_entries, PreHistoryFallback};

/// 仪表盘计算参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardOptions {
    pub history_fallback: PreHistoryFallback,
    /// 最近动态各列表的条数
    pub recent_limit: usize,
    /// 周度序列的周数
    pub weeks: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            history_fallback: PreHistoryFallback::CurrentStatus,
            recent_limit: 5,
            weeks: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_patients: u64,
    pub total_medecins: u64,
    pub total_rendez_vous: u64,
    pub total_consultations: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThisMonth {
    pub new_patients: u64,
    pub rendez_vous: u64,
    pub consultations: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Today {
    pub rendez_vous: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub patients_by_diabetes_type: Vec<GroupCount<DiabetesType>>,
    pub medecins_by_speciality: Vec<GroupCount<Specialite>>,
    pub rendez_vous_by_status: Vec<GroupCount<RendezVousStatut>>,
    pub age_distribution: Vec<GroupCount<&'static str>>,
    pub operation_types: Vec<GroupCount<TypeOperation>>,
    pub operation_laterality: Vec<GroupCount<Laterality>>,
    pub operation_reprise: Vec<GroupCount<OuiNon>>,
    pub risk_factors: FlagCounts,
    pub antecedents_medicaux: FlagCounts,
    pub amputation_anterieure: Vec<GroupCount<OuiNon>>,
    pub amputation_familiale: Vec<GroupCount<OuiNon>>,
    pub maladie_cardio_types: Vec<GroupCount<MaladieCardiovasculaire>>,
    #[serde(rename = "maladieCardioFE")]
    pub maladie_cardio_fe: Vec<GroupCount<String>>,
    pub sex_distribution: Vec<GroupCount<Sexe>>,
}

/// 单月诊疗趋势
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    #[serde(rename = "_id")]
    pub key: MonthKey,
    pub consultations: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub monthly: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPatient {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub age: u32,
    pub diabete: DiabetesType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentConsultation {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ConsultationType,
    pub patient: PersonRef,
    pub medecin: PersonRef,
    pub montant: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub patients: Vec<RecentPatient>,
    pub consultations: Vec<RecentConsultation>,
    pub upcoming_rendez_vous: Vec<RendezVous>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available_medecins: u64,
    pub unavailable_medecins: u64,
}

/// 仪表盘汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub overview: Overview,
    pub this_month: ThisMonth,
    pub today: Today,
    pub breakdowns: Breakdowns,
    pub trends: Trends,
    pub recent_activity: RecentActivity,
    pub availability: Availability,
    pub patients_evolution_data: Vec<WeeklyPatientStatus>,
    pub consultations_urgences_data: Vec<WeeklyVisits>,
    pub medecins_service_data: Vec<WeeklyMedecinsInService>,
}

type PatientFlag = (&'static str, fn(&Patient) -> bool);

fn risk_factor_flags() -> [PatientFlag; 6] {
    [
        ("hta", |p| p.diagnostic.facteurs_risque.hta),
        ("diabete", |p| p.diagnostic.facteurs_risque.diabete),
        ("tabac", |p| p.diagnostic.facteurs_risque.tabac),
        ("cancer", |p| p.diagnostic.facteurs_risque.cancer),
        ("dyslipidemie", |p| p.diagnostic.facteurs_risque.dyslipidemie),
        ("obesite", |p| p.diagnostic.facteurs_risque.obesite),
    ]
}

fn antecedent_flags() -> [PatientFlag; 5] {
    [
        ("angorEffort", |p| p.antecedents.medicaux_details.angor_effort),
        ("sca", |p| p.antecedents.medicaux_details.sca),
        ("idm", |p| p.antecedents.medicaux_details.idm),
        ("aomi", |p| p.antecedents.medicaux_details.aomi),
        ("avc", |p| p.antecedents.medicaux_details.avc),
    ]
}

fn sum_montant<'a>(consultations: impl IntoIterator<Item = &'a clinic_core::Consultation>) -> f64 {
    consultations
        .into_iter()
        .map(|consultation| consultation.montant.unwrap_or(0.0))
        .sum()
}

/// 患者相关的分类统计
pub fn patient_breakdowns(patients: &[Patient]) -> Breakdowns {
    let with_fe: Vec<&Patient> = patients
        .iter()
        .filter(|p| {
            p.diagnostic
                .maladie_cardiovasculaire_fe
                .as_deref()
                .is_some_and(|fe| !fe.trim().is_empty())
        })
        .collect();

    Breakdowns {
        patients_by_diabetes_type: group_count(patients, |p| p.diabete),
        medecins_by_speciality: Vec::new(),
        rendez_vous_by_status: Vec::new(),
        age_distribution: group_count(patients, |p| age_band(p.age)),
        operation_types: group_count(patients, |p| p.diagnostic.type_operation),
        operation_laterality: group_count(patients, |p| p.diagnostic.laterality),
        operation_reprise: group_count(patients, |p| p.diagnostic.reprise),
        risk_factors: flag_counts(patients, &risk_factor_flags()),
        antecedents_medicaux: flag_counts(patients, &antecedent_flags()),
        amputation_anterieure: group_count(patients, |p| {
            p.antecedents.chirurgicaux_details.amputation_anterieure
        }),
        amputation_familiale: group_count(patients, |p| {
            p.antecedents.chirurgicaux_details.amputation_familiale
        }),
        maladie_cardio_types: group_count(patients, |p| p.diagnostic.maladie_cardiovasculaire),
        maladie_cardio_fe: group_count(&with_fe, |p| {
            p.diagnostic
                .maladie_cardiovasculaire_fe
                .clone()
                .unwrap_or_default()
        }),
        sex_distribution: group_count(patients, |p| p.sexe),
    }
}

fn fill_names(rendez_vous: &mut [RendezVous], patients: &HashMap<Uuid, &Patient>, medecins: &HashMap<Uuid, &Medecin>) {
    for rdv in rendez_vous.iter_mut() {
        if rdv.patient.display_name.is_none() {
            rdv.patient.display_name = rdv
                .patient
                .id
                .and_then(|id| patients.get(&id))
                .map(|p| p.nom_complet());
        }
        if rdv.medecin.display_name.is_none() {
            rdv.medecin.display_name = rdv
                .medecin
                .id
                .and_then(|id| medecins.get(&id))
                .map(|m| m.nom_complet());
        }
    }
}

/// 计算仪表盘汇总
pub async fn compute_dashboard(
    store: &dyn RecordStore,
    as_of: DateTime<Utc>,
    options: &DashboardOptions,
) -> Result<DashboardSummary> {
    tracing::debug!("Computing dashboard as of {}", as_of);

    let month = DateRange::new(start_of_month(as_of), end_of_month(as_of));
    let today = DateRange::new(start_of_day(as_of), end_of_day(as_of));
    let year = DateRange::new(start_of_year(as_of), as_of);
    let weeks = weeks_ending_at(as_of, options.weeks.max(1));
    let window = DateRange::new(
        weeks.first().map_or(as_of, |week| week.start),
        weeks.last().map_or(as_of, |week| week.end),
    );

    let upcoming_filter = RendezVousFilter {
        date_from: Some(as_of),
        ..Default::default()
    }
    .with_statuts(&RendezVousStatut::OPEN)
    .with_limit(options.recent_limit);
    let weekly_filter = RendezVousFilter::between(window).with_statuts(&RendezVousStatut::REALIZED);
    let patients_this_month = PatientFilter::created_between(month);
    let rdv_this_month = RendezVousFilter::between(month);
    let rdv_today = RendezVousFilter::between(today);
    let consultations_this_month = ConsultationFilter::between(month);
    let consultations_this_year = ConsultationFilter::between(year);
    let recent_consultations_filter = ConsultationFilter::default().with_limit(options.recent_limit);
    let all_patients = PatientFilter::default();
    let all_medecins = MedecinFilter::default();
    let all_rendez_vous = RendezVousFilter::default();
    let all_consultations = ConsultationFilter::default();

    let queries = async {
        tokio::try_join!(
            store.find_patients(&all_patients),
            store.find_medecins(&all_medecins),
            store.find_rendez_vous(&all_rendez_vous),
            store.find_consultations(&all_consultations),
            store.count_patients(&patients_this_month),
            store.count_rendez_vous(&rdv_this_month),
            store.count_rendez_vous(&rdv_today),
            store.find_consultations(&consultations_this_month),
            store.find_consultations(&consultations_this_year),
            store.find_rendez_vous(&weekly_filter),
            store.find_rendez_vous(&upcoming_filter),
            store.find_consultations(&recent_consultations_filter),
        )
    };
    let (
        patients,
        medecins,
        rendez_vous,
        consultations,
        new_patients,
        month_rdv,
        today_rdv,
        month_consultations,
        year_consultations,
        weekly_rdv,
        mut upcoming,
        recent_consultations,
    ) = queries.await.map_err(|err| {
        tracing::error!("Dashboard computation aborted: {}", err);
        err
    })?;

    let malformed = malformed_history_entries(&patients) + malformed_history_entries(&medecins);
    if malformed > 0 {
        tracing::warn!("Skipped {} status history entries with unreadable dates", malformed);
    }

    let patients_by_id: HashMap<Uuid, &Patient> = patients.iter().map(|p| (p.id, p)).collect();
    let medecins_by_id: HashMap<Uuid, &Medecin> = medecins.iter().map(|m| (m.id, m)).collect();
    fill_names(&mut upcoming, &patients_by_id, &medecins_by_id);

    let recent_consultations = recent_consultations
        .into_iter()
        .map(|consultation| RecentConsultation {
            id: consultation.id,
            date: consultation.date,
            kind: consultation.kind,
            patient: PersonRef::new(
                Some(consultation.patient_id),
                patients_by_id
                    .get(&consultation.patient_id)
                    .map(|p| p.nom_complet()),
            ),
            medecin: PersonRef::new(
                Some(consultation.medecin_id),
                medecins_by_id
                    .get(&consultation.medecin_id)
                    .map(|m| m.nom_complet()),
            ),
            montant: consultation.montant,
        })
        .collect();

    let recent_patients = patients
        .iter()
        .take(options.recent_limit)
        .map(|p| RecentPatient {
            id: p.id,
            nom: p.nom.clone(),
            prenom: p.prenom.clone(),
            age: p.age,
            diabete: p.diabete,
            created_at: p.created_at,
        })
        .collect();

    let available = medecins
        .iter()
        .filter(|m| m.status == MedecinStatus::EnService)
        .count() as u64;

    let mut breakdowns = patient_breakdowns(&patients);
    breakdowns.medecins_by_speciality = group_count(&medecins, |m| m.specialite);
    breakdowns.rendez_vous_by_status = group_count(&rendez_vous, |r| r.statut);

    let monthly = monthly_buckets(&year_consultations)
        .into_iter()
        .map(|bucket| MonthlyTrend {
            key: bucket.key,
            consultations: bucket.count,
            revenue: bucket.revenue,
        })
        .collect();

    let fallback = options.history_fallback;
    let summary = DashboardSummary {
        overview: Overview {
            total_patients: patients.len() as u64,
            total_medecins: medecins.len() as u64,
            total_rendez_vous: rendez_vous.len() as u64,
            total_consultations: consultations.len() as u64,
            total_revenue: sum_montant(&consultations),
        },
        this_month: ThisMonth {
            new_patients,
            rendez_vous: month_rdv,
            consultations: month_consultations.len() as u64,
            revenue: sum_montant(&month_consultations),
        },
        today: Today {
            rendez_vous: today_rdv,
        },
        breakdowns,
        trends: Trends { monthly },
        recent_activity: RecentActivity {
            patients: recent_patients,
            consultations: recent_consultations,
            upcoming_rendez_vous: upcoming,
        },
        availability: Availability {
            available_medecins: available,
            unavailable_medecins: medecins.len() as u64 - available,
        },
        patients_evolution_data: weekly_patient_status(&weeks, &patients, fallback),
        consultations_urgences_data: weekly_visits(&weeks, &weekly_rdv),
        medecins_service_data: weekly_medecins_in_service(&weeks, &medecins, fallback),
    };

    tracing::info!(
        "Dashboard computed: {} patients, {} medecins, {} rendez-vous, {} consultations",
        summary.overview.total_patients,
        summary.overview.total_medecins,
        summary.overview.total_rendez_vous,
        summary.overview.total_consultations
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{as_of, clinic_store, FaultyStore};
    use clinic_core::ClinicError;

    #[tokio::test]
    async fn test_dashboard_totals_and_this_month() {
        let store = clinic_store().await;
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.overview.total_patients, 4);
        assert_eq!(summary.overview.total_medecins, 2);
        assert_eq!(summary.overview.total_rendez_vous, 6);
        assert_eq!(summary.overview.total_consultations, 4);
        assert_eq!(summary.overview.total_revenue, 5000.0);

        assert_eq!(summary.this_month.new_patients, 2);
        assert_eq!(summary.this_month.rendez_vous, 6);
        assert_eq!(summary.this_month.consultations, 2);
        assert_eq!(summary.this_month.revenue, 2000.0);
        assert_eq!(summary.today.rendez_vous, 1);

        assert_eq!(summary.availability.available_medecins, 1);
        assert_eq!(summary.availability.unavailable_medecins, 1);
    }

    #[tokio::test]
    async fn test_dashboard_weekly_series() {
        let store = clinic_store().await;
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.consultations_urgences_data.len(), 12);
        let current = summary.consultations_urgences_data.last().unwrap();
        assert_eq!(current.week, "12/5");
        assert_eq!(current.consultations, 1);
        assert_eq!(current.urgences, 1);

        let in_service = summary.medecins_service_data.last().unwrap();
        assert_eq!(in_service.en_service, 1);

        // 未记录历史的患者按当前状态计入其创建之后的各周
        let evolution = summary.patients_evolution_data.last().unwrap();
        assert_eq!(evolution.nouveau, 4);
        // 首周（2/25 - 3/2）只有两位患者已创建
        assert_eq!(summary.patients_evolution_data[0].nouveau, 2);
    }

    #[tokio::test]
    async fn test_dashboard_breakdowns_and_trends() {
        let store = clinic_store().await;
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();

        let total: u64 = summary.breakdowns.age_distribution.iter().map(|g| g.count).sum();
        assert_eq!(total, 4);
        assert_eq!(summary.breakdowns.risk_factors.get("hta"), Some(1));
        assert_eq!(summary.breakdowns.maladie_cardio_fe.len(), 1);
        assert_eq!(summary.breakdowns.maladie_cardio_fe[0].key, "FE 45%");

        let months: Vec<(u32, u64)> = summary
            .trends
            .monthly
            .iter()
            .map(|m| (m.key.month, m.consultations))
            .collect();
        assert_eq!(months, vec![(1, 1), (5, 2)]);
    }

    #[tokio::test]
    async fn test_dashboard_recent_activity() {
        let store = clinic_store().await;
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();
        let recent = &summary.recent_activity;

        assert_eq!(recent.patients[0].nom, "Cherif");
        assert_eq!(recent.consultations.len(), 4);
        assert_eq!(
            recent.consultations[0].patient.display_name.as_deref(),
            Some("Bouzid Test")
        );
        assert_eq!(
            recent.consultations[0].medecin.display_name.as_deref(),
            Some("Benali Test")
        );

        let upcoming: Vec<&str> = recent
            .upcoming_rendez_vous
            .iter()
            .map(|r| r.heure.as_str())
            .collect();
        assert_eq!(upcoming, vec!["09:00", "10:00"]);
        assert_eq!(
            recent.upcoming_rendez_vous[0].patient.display_name.as_deref(),
            Some("Amrani Test")
        );
    }

    #[tokio::test]
    async fn test_dashboard_json_keys() {
        let store = clinic_store().await;
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert!(json["overview"]["totalRevenue"].is_number());
        assert!(json["breakdowns"]["maladieCardioFE"].is_array());
        assert_eq!(json["trends"]["monthly"][0]["_id"]["month"], 1);
        assert!(json["consultationsUrgencesData"][11]["urgences"].is_number());
        assert!(json["medecinsServiceData"][0]["enService"].is_number());
        assert!(json["patientsEvolutionData"][0]["sous_trt"].is_number());
    }

    #[tokio::test]
    async fn test_empty_store_yields_zero_dashboard() {
        let store = clinic_core::MemoryStore::new();
        let summary = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.overview.total_patients, 0);
        assert!(summary.breakdowns.patients_by_diabetes_type.is_empty());
        assert!(summary.trends.monthly.is_empty());
        assert_eq!(summary.patients_evolution_data.len(), 12);
    }

    #[tokio::test]
    async fn test_failed_query_aborts_dashboard() {
        let store = FaultyStore {
            inner: clinic_store().await,
        };
        let err = compute_dashboard(&store, as_of(), &DashboardOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Database(_)));
    }

    #[tokio::test]
    async fn test_exclude_fallback_drops_entities_without_history() {
        let store = clinic_store().await;
        let options = DashboardOptions {
            history_fallback: PreHistoryFallback::Exclude,
            ..Default::default()
        };
        let summary = compute_dashboard(&store, as_of(), &options).await.unwrap();

        assert!(summary.medecins_service_data.iter().all(|w| w.en_service == 0));
        assert!(summary.patients_evolution_data.iter().all(|w| w.nouveau == 0));
    }
}
