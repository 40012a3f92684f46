//! 记录存储接口
//!
//! 统计引擎与接口层只依赖 [`RecordStore`]，具体实现可以是 PostgreSQL
//! （`clinic-database`）或进程内的 [`MemoryStore`]。
//!
//! 排序约定：患者与医生按创建时间倒序，预约按 `(date, heure)` 升序，
//! 诊疗记录按日期倒序。`limit` 在排序之后生效。

mod filter;
mod memory;

pub use filter::*;
pub use memory::MemoryStore;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Consultation, ConsultationWithNames, Medecin, Patient, PersonRef, RendezVous};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 检查存储是否可用
    async fn ping(&self) -> Result<()>;

    async fn find_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>>;
    async fn count_patients(&self, filter: &PatientFilter) -> Result<u64>;
    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>>;
    async fn insert_patient(&self, patient: &Patient) -> Result<()>;
    /// 记录不存在时返回 `NotFound`
    async fn update_patient(&self, patient: &Patient) -> Result<()>;
    /// 返回是否确实删除了记录
    async fn delete_patient(&self, id: Uuid) -> Result<bool>;

    async fn find_medecins(&self, filter: &MedecinFilter) -> Result<Vec<Medecin>>;
    async fn count_medecins(&self, filter: &MedecinFilter) -> Result<u64>;
    async fn get_medecin(&self, id: Uuid) -> Result<Option<Medecin>>;
    /// 邮箱重复时返回 `Conflict`
    async fn insert_medecin(&self, medecin: &Medecin) -> Result<()>;
    async fn update_medecin(&self, medecin: &Medecin) -> Result<()>;
    async fn delete_medecin(&self, id: Uuid) -> Result<bool>;

    async fn find_rendez_vous(&self, filter: &RendezVousFilter) -> Result<Vec<RendezVous>>;
    async fn count_rendez_vous(&self, filter: &RendezVousFilter) -> Result<u64>;
    async fn get_rendez_vous(&self, id: Uuid) -> Result<Option<RendezVous>>;
    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> Result<()>;
    async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<()>;
    async fn delete_rendez_vous(&self, id: Uuid) -> Result<bool>;

    async fn find_consultations(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>>;
    async fn count_consultations(&self, filter: &ConsultationFilter) -> Result<u64>;
    async fn get_consultation(&self, id: Uuid) -> Result<Option<Consultation>>;
    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()>;
    async fn update_consultation(&self, consultation: &Consultation) -> Result<()>;
    async fn delete_consultation(&self, id: Uuid) -> Result<bool>;
}

/// 按ID查询显示名，同一次请求内每个ID只查一次
#[derive(Default)]
struct NameCache {
    patients: HashMap<Uuid, Option<String>>,
    medecins: HashMap<Uuid, Option<String>>,
}

impl NameCache {
    async fn patient(&mut self, store: &dyn RecordStore, id: Uuid) -> Result<Option<String>> {
        if !self.patients.contains_key(&id) {
            let name = store.get_patient(id).await?.map(|p| p.nom_complet());
            self.patients.insert(id, name);
        }
        Ok(self.patients.get(&id).cloned().flatten())
    }

    async fn medecin(&mut self, store: &dyn RecordStore, id: Uuid) -> Result<Option<String>> {
        if !self.medecins.contains_key(&id) {
            let name = store.get_medecin(id).await?.map(|m| m.nom_complet());
            self.medecins.insert(id, name);
        }
        Ok(self.medecins.get(&id).cloned().flatten())
    }
}

/// 按ID补全引用中缺失的显示名，找不到的引用保持原样
pub async fn resolve_person_names(store: &dyn RecordStore, rendez_vous: &mut [RendezVous]) -> Result<()> {
    let mut names = NameCache::default();
    for rdv in rendez_vous.iter_mut() {
        if let Some(id) = unresolved(&rdv.patient) {
            rdv.patient.display_name = names.patient(store, id).await?;
        }
        if let Some(id) = unresolved(&rdv.medecin) {
            rdv.medecin.display_name = names.medecin(store, id).await?;
        }
    }
    debug!(
        "Resolved names for {} rendez-vous ({} patients, {} medecins looked up)",
        rendez_vous.len(),
        names.patients.len(),
        names.medecins.len()
    );
    Ok(())
}

/// 为诊疗记录附上患者与医生的显示名
pub async fn resolve_consultation_names(
    store: &dyn RecordStore,
    consultations: Vec<Consultation>,
) -> Result<Vec<ConsultationWithNames>> {
    let mut names = NameCache::default();
    let mut resolved = Vec::with_capacity(consultations.len());
    for consultation in consultations {
        let patient = PersonRef::new(
            Some(consultation.patient_id),
            names.patient(store, consultation.patient_id).await?,
        );
        let medecin = PersonRef::new(
            Some(consultation.medecin_id),
            names.medecin(store, consultation.medecin_id).await?,
        );
        resolved.push(ConsultationWithNames {
            consultation,
            patient,
            medecin,
        });
    }
    Ok(resolved)
}

fn unresolved(person: &PersonRef) -> Option<Uuid> {
    match (&person.id, &person.display_name) {
        (Some(id), None) => Some(*id),
        _ => None,
    }
}
