//! 周度趋势序列

use serde::Serialize;

use clinic_core::{Medecin, MedecinStatus, Patient, PatientStatut, RendezVous, RendezVousType};

use crate::buckets::WeekBucket;
use crate::snapshot::{status_as_of, PreHistoryFallback};

/// 每周的门诊与急诊预约数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyVisits {
    pub week: String,
    pub consultations: u64,
    pub urgences: u64,
}

/// 每周各状态的患者数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyPatientStatus {
    pub week: String,
    pub nouveau: u64,
    pub sous_trt: u64,
    pub apres_trt: u64,
    pub decede: u64,
}

impl WeeklyPatientStatus {
    fn empty(week: String) -> Self {
        Self {
            week,
            nouveau: 0,
            sous_trt: 0,
            apres_trt: 0,
            decede: 0,
        }
    }

    fn add(&mut self, statut: PatientStatut) {
        match statut {
            PatientStatut::Nouveau => self.nouveau += 1,
            PatientStatut::SousTraitement => self.sous_trt += 1,
            PatientStatut::ApresTraitement => self.apres_trt += 1,
            PatientStatut::Decede => self.decede += 1,
        }
    }
}

/// 每周在岗医生数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMedecinsInService {
    pub week: String,
    pub en_service: u64,
}

/// 只统计已确认或已完成的预约；`Consultation` 与 `Urgence` 之外的类型不计
pub fn weekly_visits(weeks: &[WeekBucket], rendez_vous: &[RendezVous]) -> Vec<WeeklyVisits> {
    weeks
        .iter()
        .map(|week| {
            let mut row = WeeklyVisits {
                week: week.label(),
                consultations: 0,
                urgences: 0,
            };
            for rdv in rendez_vous
                .iter()
                .filter(|rdv| rdv.is_realized() && week.contains(rdv.date))
            {
                match rdv.kind {
                    RendezVousType::Urgence => row.urgences += 1,
                    RendezVousType::Consultation => row.consultations += 1,
                    _ => {}
                }
            }
            row
        })
        .collect()
}

/// 以每周最后一刻为截止时间重建患者状态
pub fn weekly_patient_status(
    weeks: &[WeekBucket],
    patients: &[Patient],
    fallback: PreHistoryFallback,
) -> Vec<WeeklyPatientStatus> {
    weeks
        .iter()
        .map(|week| {
            let mut row = WeeklyPatientStatus::empty(week.label());
            for patient in patients {
                if let Some(statut) = status_as_of(patient, week.end, fallback) {
                    row.add(statut);
                }
            }
            row
        })
        .collect()
}

pub fn weekly_medecins_in_service(
    weeks: &[WeekBucket],
    medecins: &[Medecin],
    fallback: PreHistoryFallback,
) -> Vec<WeeklyMedecinsInService> {
    weeks
        .iter()
        .map(|week| WeeklyMedecinsInService {
            week: week.label(),
            en_service: medecins
                .iter()
                .filter(|medecin| {
                    status_as_of(*medecin, week.end, fallback) == Some(MedecinStatus::EnService)
                })
                .count() as u64,
        })
        .collect()
}
