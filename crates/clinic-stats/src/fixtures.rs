//! 测试数据构造

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clinic_core::store::{
    ConsultationFilter, MedecinFilter, PatientFilter, RecordStore, RendezVousFilter,
};
use clinic_core::{
    ClinicError, Consultation, ConsultationInput, ConsultationType, DiabetesType, MemoryStore,
    Medecin, MedecinInput, Patient, PatientInput, RendezVous, RendezVousInput, RendezVousStatut,
    RendezVousType, Result, Sexe, Specialite,
};

pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

pub fn patient(nom: &str, age: u32, diabete: DiabetesType, created: DateTime<Utc>) -> Patient {
    PatientInput {
        nom: nom.into(),
        prenom: "Test".into(),
        age,
        sexe: Some(if age % 2 == 0 { Sexe::Homme } else { Sexe::Femme }),
        diabete,
        ..Default::default()
    }
    .into_patient(Uuid::new_v4(), created)
}

pub fn medecin(nom: &str, specialite: Specialite, created: DateTime<Utc>) -> Medecin {
    MedecinInput {
        nom: nom.into(),
        prenom: "Test".into(),
        specialite: Some(specialite),
        email: format!("{}@clinique.dz", nom.to_lowercase()),
        telephone: "0550000000".into(),
        ..Default::default()
    }
    .into_medecin(Uuid::new_v4(), created)
}

pub fn rdv(
    patient: &Patient,
    medecin: &Medecin,
    date: DateTime<Utc>,
    kind: RendezVousType,
    statut: RendezVousStatut,
) -> RendezVous {
    let mut rdv = RendezVousInput {
        patient_id: Some(patient.id),
        medecin_id: Some(medecin.id),
        date: Some(date),
        heure: date.format("%H:%M").to_string(),
        kind: Some(kind),
        ..Default::default()
    }
    .into_rendez_vous(Uuid::new_v4(), date);
    rdv.statut = statut;
    rdv
}

pub fn consultation(
    patient: &Patient,
    medecin: &Medecin,
    date: DateTime<Utc>,
    kind: ConsultationType,
    montant: f64,
) -> Consultation {
    ConsultationInput {
        date: Some(date),
        kind: Some(kind),
        patient_id: Some(patient.id),
        medecin_id: Some(medecin.id),
        montant: Some(montant),
        ..Default::default()
    }
    .into_consultation(Uuid::new_v4(), date)
}

/// 诊疗记录查询总是失败，其余委托给内存存储
pub struct FaultyStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn find_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        self.inner.find_patients(filter).await
    }

    async fn count_patients(&self, filter: &PatientFilter) -> Result<u64> {
        self.inner.count_patients(filter).await
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        self.inner.get_patient(id).await
    }

    async fn insert_patient(&self, patient: &Patient) -> Result<()> {
        self.inner.insert_patient(patient).await
    }

    async fn update_patient(&self, patient: &Patient) -> Result<()> {
        self.inner.update_patient(patient).await
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_patient(id).await
    }

    async fn find_medecins(&self, filter: &MedecinFilter) -> Result<Vec<Medecin>> {
        self.inner.find_medecins(filter).await
    }

    async fn count_medecins(&self, filter: &MedecinFilter) -> Result<u64> {
        self.inner.count_medecins(filter).await
    }

    async fn get_medecin(&self, id: Uuid) -> Result<Option<Medecin>> {
        self.inner.get_medecin(id).await
    }

    async fn insert_medecin(&self, medecin: &Medecin) -> Result<()> {
        self.inner.insert_medecin(medecin).await
    }

    async fn update_medecin(&self, medecin: &Medecin) -> Result<()> {
        self.inner.update_medecin(medecin).await
    }

    async fn delete_medecin(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_medecin(id).await
    }

    async fn find_rendez_vous(&self, filter: &RendezVousFilter) -> Result<Vec<RendezVous>> {
        self.inner.find_rendez_vous(filter).await
    }

    async fn count_rendez_vous(&self, filter: &RendezVousFilter) -> Result<u64> {
        self.inner.count_rendez_vous(filter).await
    }

    async fn get_rendez_vous(&self, id: Uuid) -> Result<Option<RendezVous>> {
        self.inner.get_rendez_vous(id).await
    }

    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        self.inner.insert_rendez_vous(rdv).await
    }

    async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        self.inner.update_rendez_vous(rdv).await
    }

    async fn delete_rendez_vous(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_rendez_vous(id).await
    }

    async fn find_consultations(&self, _filter: &ConsultationFilter) -> Result<Vec<Consultation>> {
        Err(ClinicError::Database("connection reset".into()))
    }

    async fn count_consultations(&self, _filter: &ConsultationFilter) -> Result<u64> {
        Err(ClinicError::Database("connection reset".into()))
    }

    async fn get_consultation(&self, id: Uuid) -> Result<Option<Consultation>> {
        self.inner.get_consultation(id).await
    }

    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        self.inner.insert_consultation(consultation).await
    }

    async fn update_consultation(&self, consultation: &Consultation) -> Result<()> {
        self.inner.update_consultation(consultation).await
    }

    async fn delete_consultation(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_consultation(id).await
    }
}

/// 统计基准时刻：2024-05-15（周三）16:00 UTC
pub fn as_of() -> DateTime<Utc> {
    at("2024-05-15T16:00:00Z")
}

/// 构造一个小型诊所数据集
pub async fn clinic_store() -> MemoryStore {
    let store = MemoryStore::new();

    let young = patient("Amrani", 29, DiabetesType::Type2, at("2024-05-02T09:00:00Z"));
    let old = patient("Bouzid", 70, DiabetesType::Type1, at("2024-02-10T09:00:00Z"));
    let mut recent = patient("Cherif", 50, DiabetesType::Type2, at("2024-05-14T09:00:00Z"));
    recent.diagnostic.facteurs_risque.hta = true;
    recent.diagnostic.maladie_cardiovasculaire_fe = Some("FE 45%".into());
    let mut other = patient("Djebbar", 41, DiabetesType::NonSpecifie, at("2024-03-01T09:00:00Z"));
    other.diagnostic.maladie_cardiovasculaire_fe = Some(String::new());
    for p in [&young, &old, &recent, &other] {
        store.insert_patient(p).await.unwrap();
    }

    let on_duty = medecin("Benali", Specialite::Diabetologue, at("2024-01-01T08:00:00Z"));
    let mut on_leave = medecin("Haddad", Specialite::Podologue, at("2024-01-01T08:00:00Z"));
    on_leave.status = clinic_core::MedecinStatus::EnConge;
    store.insert_medecin(&on_duty).await.unwrap();
    store.insert_medecin(&on_leave).await.unwrap();

    let appointments = [
        (at("2024-05-13T09:00:00Z"), RendezVousType::Consultation, RendezVousStatut::Confirme),
        (at("2024-05-14T10:00:00Z"), RendezVousType::Urgence, RendezVousStatut::Termine),
        (at("2024-05-15T11:00:00Z"), RendezVousType::Consultation, RendezVousStatut::EnAttente),
        (at("2024-05-16T09:00:00Z"), RendezVousType::Controle, RendezVousStatut::Confirme),
        (at("2024-05-17T09:00:00Z"), RendezVousType::Consultation, RendezVousStatut::Annule),
        (at("2024-05-20T10:00:00Z"), RendezVousType::SuiviTraitement, RendezVousStatut::EnAttente),
    ];
    for (date, kind, statut) in appointments {
        store
            .insert_rendez_vous(&rdv(&young, &on_duty, date, kind, statut))
            .await
            .unwrap();
    }

    let visits = [
        (at("2023-12-30T10:00:00Z"), ConsultationType::Consultation, 1000.0),
        (at("2024-01-20T10:00:00Z"), ConsultationType::Consultation, 2000.0),
        (at("2024-05-03T10:00:00Z"), ConsultationType::Urgence, 1500.0),
        (at("2024-05-10T10:00:00Z"), ConsultationType::Consultation, 500.0),
    ];
    for (date, kind, montant) in visits {
        store
            .insert_consultation(&consultation(&old, &on_duty, date, kind, montant))
            .await
            .unwrap();
    }

    store
}
