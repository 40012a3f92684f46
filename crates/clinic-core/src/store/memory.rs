//! 进程内存储
//!
//! 用于测试与演示模式。数据保存在内存中，进程退出即丢失。

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConsultationFilter, MedecinFilter, PatientFilter, RecordStore, RendezVousFilter};
use crate::error::{ClinicError, Result};
use crate::models::{Consultation, Medecin, Patient, RendezVous};

trait Record: Clone + Send + Sync {
    const KIND: &'static str;

    fn record_id(&self) -> Uuid;
}

impl Record for Patient {
    const KIND: &'static str = "patient";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl Record for Medecin {
    const KIND: &'static str = "medecin";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl Record for RendezVous {
    const KIND: &'static str = "rendez-vous";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl Record for Consultation {
    const KIND: &'static str = "consultation";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

struct Table<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    async fn select<P, C>(&self, predicate: P, order: C, limit: Option<usize>) -> Vec<T>
    where
        P: Fn(&T) -> bool,
        C: Fn(&T, &T) -> Ordering,
    {
        let rows = self.rows.read().await;
        let mut selected: Vec<T> = rows.iter().filter(|row| predicate(row)).cloned().collect();
        selected.sort_by(order);
        if let Some(limit) = limit {
            selected.truncate(limit);
        }
        selected
    }

    async fn count<P: Fn(&T) -> bool>(&self, predicate: P) -> u64 {
        self.rows.read().await.iter().filter(|row| predicate(row)).count() as u64
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.record_id() == id)
            .cloned()
    }

    /// `clashes` 判断已有记录是否与新记录冲突（ID之外的唯一约束）
    async fn insert<F: Fn(&T) -> bool>(&self, row: &T, clashes: F) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|existing| existing.record_id() == row.record_id()) {
            return Err(ClinicError::Conflict(format!(
                "{} {} 已存在",
                T::KIND,
                row.record_id()
            )));
        }
        if rows.iter().any(|existing| clashes(existing)) {
            return Err(ClinicError::Conflict(format!("{} 违反唯一约束", T::KIND)));
        }
        rows.push(row.clone());
        Ok(())
    }

    async fn update<F: Fn(&T) -> bool>(&self, row: &T, clashes: F) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|existing| existing.record_id() != row.record_id() && clashes(existing))
        {
            return Err(ClinicError::Conflict(format!("{} 违反唯一约束", T::KIND)));
        }
        match rows.iter_mut().find(|existing| existing.record_id() == row.record_id()) {
            Some(slot) => {
                *slot = row.clone();
                Ok(())
            }
            None => Err(ClinicError::NotFound(format!("{} {}", T::KIND, row.record_id()))),
        }
    }

    async fn delete(&self, id: Uuid) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.record_id() != id);
        rows.len() != before
    }
}

fn newest_patient_first(a: &Patient, b: &Patient) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn newest_medecin_first(a: &Medecin, b: &Medecin) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn by_slot(a: &RendezVous, b: &RendezVous) -> Ordering {
    a.date.cmp(&b.date).then_with(|| a.heure.cmp(&b.heure))
}

fn latest_consultation_first(a: &Consultation, b: &Consultation) -> Ordering {
    b.date.cmp(&a.date)
}

fn no_clash<T>(_: &T) -> bool {
    false
}

/// 内存存储
pub struct MemoryStore {
    patients: Table<Patient>,
    medecins: Table<Medecin>,
    rendez_vous: Table<RendezVous>,
    consultations: Table<Consultation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            patients: Table::new(),
            medecins: Table::new(),
            rendez_vous: Table::new(),
            consultations: Table::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        Ok(self
            .patients
            .select(|p| filter.matches(p), newest_patient_first, filter.limit)
            .await)
    }

    async fn count_patients(&self, filter: &PatientFilter) -> Result<u64> {
        Ok(self.patients.count(|p| filter.matches(p)).await)
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.get(id).await)
    }

    async fn insert_patient(&self, patient: &Patient) -> Result<()> {
        self.patients.insert(patient, no_clash).await
    }

    async fn update_patient(&self, patient: &Patient) -> Result<()> {
        self.patients.update(patient, no_clash).await
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool> {
        Ok(self.patients.delete(id).await)
    }

    async fn find_medecins(&self, filter: &MedecinFilter) -> Result<Vec<Medecin>> {
        Ok(self
            .medecins
            .select(|m| filter.matches(m), newest_medecin_first, filter.limit)
            .await)
    }

    async fn count_medecins(&self, filter: &MedecinFilter) -> Result<u64> {
        Ok(self.medecins.count(|m| filter.matches(m)).await)
    }

    async fn get_medecin(&self, id: Uuid) -> Result<Option<Medecin>> {
        Ok(self.medecins.get(id).await)
    }

    async fn insert_medecin(&self, medecin: &Medecin) -> Result<()> {
        let email = medecin.email.to_lowercase();
        self.medecins
            .insert(medecin, |existing| existing.email.to_lowercase() == email)
            .await
    }

    async fn update_medecin(&self, medecin: &Medecin) -> Result<()> {
        let email = medecin.email.to_lowercase();
        self.medecins
            .update(medecin, |existing| existing.email.to_lowercase() == email)
            .await
    }

    async fn delete_medecin(&self, id: Uuid) -> Result<bool> {
        Ok(self.medecins.delete(id).await)
    }

    async fn find_rendez_vous(&self, filter: &RendezVousFilter) -> Result<Vec<RendezVous>> {
        Ok(self
            .rendez_vous
            .select(|r| filter.matches(r), by_slot, filter.limit)
            .await)
    }

    async fn count_rendez_vous(&self, filter: &RendezVousFilter) -> Result<u64> {
        Ok(self.rendez_vous.count(|r| filter.matches(r)).await)
    }

    async fn get_rendez_vous(&self, id: Uuid) -> Result<Option<RendezVous>> {
        Ok(self.rendez_vous.get(id).await)
    }

    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        self.rendez_vous.insert(rdv, no_clash).await
    }

    async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        self.rendez_vous.update(rdv, no_clash).await
    }

    async fn delete_rendez_vous(&self, id: Uuid) -> Result<bool> {
        Ok(self.rendez_vous.delete(id).await)
    }

    async fn find_consultations(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>> {
        Ok(self
            .consultations
            .select(|c| filter.matches(c), latest_consultation_first, filter.limit)
            .await)
    }

    async fn count_consultations(&self, filter: &ConsultationFilter) -> Result<u64> {
        Ok(self.consultations.count(|c| filter.matches(c)).await)
    }

    async fn get_consultation(&self, id: Uuid) -> Result<Option<Consultation>> {
        Ok(self.consultations.get(id).await)
    }

    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        self.consultations.insert(consultation, no_clash).await
    }

    async fn update_consultation(&self, consultation: &Consultation) -> Result<()> {
        self.consultations.update(consultation, no_clash).await
    }

    async fn delete_consultation(&self, id: Uuid) -> Result<bool> {
        Ok(self.consultations.delete(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MedecinInput, PatientInput, PersonRef, RendezVousInput, RendezVousStatut, Sexe,
    };
    use crate::store::resolve_person_names;
    use chrono::{DateTime, Duration, Utc};

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn patient(nom: &str, created: DateTime<Utc>) -> Patient {
        PatientInput {
            nom: nom.into(),
            prenom: "Amine".into(),
            age: 52,
            sexe: Some(Sexe::Homme),
            ..Default::default()
        }
        .into_patient(Uuid::new_v4(), created)
    }

    fn medecin(email: &str) -> Medecin {
        MedecinInput {
            nom: "Benali".into(),
            prenom: "Karim".into(),
            email: email.into(),
            telephone: "0550000000".into(),
            ..Default::default()
        }
        .into_medecin(Uuid::new_v4(), Utc::now())
    }

    #[tokio::test]
    async fn test_patients_newest_first_with_limit() {
        let store = MemoryStore::new();
        let base = at("2024-03-01T10:00:00Z");
        for (i, nom) in ["Ali", "Bouzid", "Cherif"].iter().enumerate() {
            store
                .insert_patient(&patient(nom, base + Duration::days(i as i64)))
                .await
                .unwrap();
        }

        let recent = store
            .find_patients(&PatientFilter::default().with_limit(2))
            .await
            .unwrap();
        let noms: Vec<&str> = recent.iter().map(|p| p.nom.as_str()).collect();
        assert_eq!(noms, vec!["Cherif", "Bouzid"]);
        assert_eq!(store.count_patients(&PatientFilter::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store.insert_patient(&patient("Khenouna", Utc::now())).await.unwrap();
        store.insert_patient(&patient("Haddad", Utc::now())).await.unwrap();

        let filter = PatientFilter {
            search: Some("KHEN".into()),
            ..Default::default()
        };
        let found = store.find_patients(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Khenouna");
    }

    #[tokio::test]
    async fn test_duplicate_medecin_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_medecin(&medecin("k.benali@clinique.dz")).await.unwrap();

        let err = store
            .insert_medecin(&medecin("K.Benali@clinique.dz"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_patient(&patient("Absent", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::NotFound(_)));
        assert!(!store.delete_patient(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_rendez_vous_sorted_by_date_then_heure() {
        let store = MemoryStore::new();
        let day = at("2024-05-02T00:00:00Z");
        for (offset, heure) in [(1, "08:00"), (0, "14:30"), (0, "09:15")] {
            let rdv = RendezVousInput {
                patient: Some("Patient".into()),
                medecin: Some("Dr. Benali".into()),
                date: Some(day + Duration::days(offset)),
                heure: heure.into(),
                ..Default::default()
            }
            .into_rendez_vous(Uuid::new_v4(), day);
            store.insert_rendez_vous(&rdv).await.unwrap();
        }

        let filter = RendezVousFilter::default().with_statuts(&RendezVousStatut::OPEN);
        let heures: Vec<String> = store
            .find_rendez_vous(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.heure)
            .collect();
        assert_eq!(heures, vec!["09:15", "14:30", "08:00"]);
    }

    #[tokio::test]
    async fn test_resolve_person_names_fills_missing_names() {
        let store = MemoryStore::new();
        let p = patient("Khenouna", Utc::now());
        store.insert_patient(&p).await.unwrap();

        let mut rdv = RendezVousInput {
            patient_id: Some(p.id),
            medecin_id: Some(Uuid::new_v4()),
            heure: "10:00".into(),
            ..Default::default()
        }
        .into_rendez_vous(Uuid::new_v4(), Utc::now());
        rdv.medecin = PersonRef::by_id(rdv.medecin.id.unwrap());

        let mut list = vec![rdv];
        resolve_person_names(&store, &mut list).await.unwrap();
        assert_eq!(list[0].patient.display_name.as_deref(), Some("Khenouna Amine"));
        assert!(list[0].medecin.display_name.is_none());
    }
}
