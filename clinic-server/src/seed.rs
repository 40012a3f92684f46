//! 演示数据

use chrono::{DateTime, Duration, Utc};
use clinic_core::store::PatientFilter;
use clinic_core::utils::{new_id, start_of_day, start_of_year};
use clinic_core::{
    ConsultationInput, ConsultationStatut, ConsultationType, DiabetesType, MedecinInput,
    MedecinStatus, Paiement, PatientInput, PatientStatut, PersonRef, RecordStore, RendezVousInput,
    RendezVousStatut, RendezVousType, Result, Sexe, Specialite, StatusHistory,
};
use tracing::info;

const PATIENTS: [(&str, &str, u32, Sexe, DiabetesType, i64); 6] = [
    ("Khenouna", "Mohammed", 61, Sexe::Homme, DiabetesType::Type2, 80),
    ("Sayah", "Ouadi", 47, Sexe::Homme, DiabetesType::Type1, 64),
    ("Larassi", "Amine", 35, Sexe::Homme, DiabetesType::Type2, 40),
    ("Tlemcani", "Imane", 29, Sexe::Femme, DiabetesType::Gestationnel, 21),
    ("Bouzidi", "Zahra", 72, Sexe::Femme, DiabetesType::Type2, 12),
    ("Mansouri", "Leila", 54, Sexe::Femme, DiabetesType::NonSpecifie, 3),
];

const MEDECINS: [(&str, Specialite, MedecinStatus); 3] = [
    ("Boudinni", Specialite::Diabetologue, MedecinStatus::EnService),
    ("Maouchi", Specialite::Endocrinologue, MedecinStatus::EnService),
    ("Benali", Specialite::Podologue, MedecinStatus::EnConge),
];

/// 生成患者状态历史：创建时为新患者，之后按天数推进，不记录未来的变更
fn patient_history(
    created: DateTime<Utc>,
    now: DateTime<Utc>,
    steps: &[(PatientStatut, i64)],
) -> StatusHistory<PatientStatut> {
    let mut history = StatusHistory::new();
    history.record(PatientStatut::Nouveau, created);
    for (statut, after_days) in steps {
        let at = created + Duration::days(*after_days);
        if at <= now {
            history.record(*statut, at);
        }
    }
    history
}

/// 不早于当年1月1日
fn this_year(now: DateTime<Utc>, days_ago: i64) -> DateTime<Utc> {
    (now - Duration::days(days_ago)).max(start_of_year(now))
}

/// 患者表为空时写入演示数据，返回是否写入
pub async fn seed_if_empty(store: &dyn RecordStore, now: DateTime<Utc>) -> Result<bool> {
    if store.count_patients(&PatientFilter::default()).await? > 0 {
        info!("Store already populated, skipping seed");
        return Ok(false);
    }

    let mut patients = Vec::new();
    for (index, (nom, prenom, age, sexe, diabete, days_ago)) in PATIENTS.into_iter().enumerate() {
        let created = now - Duration::days(days_ago);
        let steps: &[(PatientStatut, i64)] = match index % 3 {
            0 => &[(PatientStatut::SousTraitement, 7), (PatientStatut::ApresTraitement, 35)],
            1 => &[(PatientStatut::SousTraitement, 2)],
            _ => &[],
        };
        let history = patient_history(created, now, steps);
        let statut = history
            .chronological()
            .last()
            .map(|change| change.status)
            .unwrap_or_default();

        let patient = PatientInput {
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            age,
            sexe: Some(sexe),
            email: Some(format!("{}.{}@example.com", prenom.to_lowercase(), nom.to_lowercase())),
            diabete,
            statut,
            statut_history: Some(history),
            ..Default::default()
        }
        .into_patient(new_id(), created);
        store.insert_patient(&patient).await?;
        patients.push(patient);
    }

    let mut medecins = Vec::new();
    for (nom, specialite, status) in MEDECINS {
        let created = now - Duration::days(120);
        let mut history = StatusHistory::new();
        history.record(MedecinStatus::EnService, created);
        if status != MedecinStatus::EnService {
            history.record(status, now - Duration::days(10));
        }
        let medecin = MedecinInput {
            nom: nom.to_string(),
            prenom: "Dr.".to_string(),
            specialite: Some(specialite),
            email: format!("{}@clinique.dz", nom.to_lowercase()),
            telephone: "0550 00 00 00".to_string(),
            status,
            status_history: Some(history),
            ..Default::default()
        }
        .into_medecin(new_id(), created);
        store.insert_medecin(&medecin).await?;
        medecins.push(medecin);
    }

    // 过去四周到下周的预约
    let kinds = [
        RendezVousType::Consultation,
        RendezVousType::Urgence,
        RendezVousType::Controle,
        RendezVousType::SuiviTraitement,
    ];
    for offset in 0..10_i64 {
        let patient = &patients[offset as usize % patients.len()];
        let medecin = &medecins[offset as usize % medecins.len()];
        let date = start_of_day(now) + Duration::days(offset * 3 - 24);
        let mut rdv = RendezVousInput {
            heure: format!("{:02}:30", 9 + offset % 6),
            date: Some(date),
            kind: Some(kinds[offset as usize % kinds.len()]),
            ..Default::default()
        }
        .into_rendez_vous(new_id(), now);
        rdv.patient = PersonRef::new(Some(patient.id), Some(patient.nom_complet()));
        rdv.medecin = PersonRef::new(Some(medecin.id), Some(medecin.nom_complet()));
        rdv.statut = if date < now {
            if offset % 4 == 3 { RendezVousStatut::Annule } else { RendezVousStatut::Termine }
        } else if offset % 2 == 0 {
            RendezVousStatut::Confirme
        } else {
            RendezVousStatut::EnAttente
        };
        store.insert_rendez_vous(&rdv).await?;
    }

    for (offset, patient) in patients.iter().enumerate() {
        let urgent = offset % 3 == 1;
        let consultation = ConsultationInput {
            date: Some(this_year(now, offset as i64 * 9)),
            kind: Some(if urgent { ConsultationType::Urgence } else { ConsultationType::Consultation }),
            patient_id: Some(patient.id),
            medecin_id: Some(medecins[offset % medecins.len()].id),
            duree: Some(if urgent { 45 } else { 30 }),
            statut: ConsultationStatut::Termine,
            montant: Some(if urgent { 3000.0 } else { 1500.0 }),
            paiement: if offset % 2 == 0 { Paiement::Paye } else { Paiement::NonPaye },
            ..Default::default()
        }
        .into_consultation(new_id(), now);
        store.insert_consultation(&consultation).await?;
    }

    info!(
        "Seeded {} patients, {} medecins, 10 rendez-vous, {} consultations",
        patients.len(),
        medecins.len(),
        patients.len()
    );
    Ok(true)
}
