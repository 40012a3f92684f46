//! 患者模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::StatusHistory;
use crate::utils::round_to;

labeled_enum! {
    /// 性别
    pub enum Sexe {
        Homme => "Homme",
        Femme => "Femme",
    }
}

labeled_enum! {
    /// 糖尿病类型
    #[derive(Default)]
    pub enum DiabetesType {
        Type1 => "Type 1",
        Type2 => "Type 2",
        Gestationnel => "Gestationnel",
        Autre => "Autre",
        #[default]
        NonSpecifie => "Non spécifié",
    }
}

labeled_enum! {
    /// 患者状态
    #[derive(Default)]
    pub enum PatientStatut {
        #[default]
        Nouveau => "nouveau",
        SousTraitement => "sous_trt",
        ApresTraitement => "apres_trt",
        Decede => "decede",
    }
}

labeled_enum! {
    /// 截肢手术类型
    #[derive(Default)]
    pub enum TypeOperation {
        Chopart => "Chopart",
        Lisfranc => "Lisfranc",
        TransTibial => "Trans tibial",
        TransFemoral => "Trans fémoral",
        DesarticulationHanche => "Désarticulation hanche",
        DesarticulationOrteil => "Désarticulation orteil",
        Autre => "Autre",
        #[default]
        NonSpecifie => "Non spécifié",
    }
}

labeled_enum! {
    /// 单侧/双侧
    #[derive(Default)]
    pub enum Laterality {
        Unilateral => "Unilatéral",
        Bilateral => "Bilatéral",
        #[default]
        NonSpecifie => "Non spécifié",
    }
}

labeled_enum! {
    /// 是/否/未指定
    #[derive(Default)]
    pub enum OuiNon {
        Oui => "Oui",
        Non => "Non",
        #[default]
        NonSpecifie => "Non spécifié",
    }
}

labeled_enum! {
    /// 心血管疾病
    #[derive(Default)]
    pub enum MaladieCardiovasculaire {
        Avc => "AVC",
        Ischemique => "Ischémique",
        Coronarien => "Coronarien",
        Autre => "Autre",
        #[default]
        Aucune => "Aucune",
    }
}

labeled_enum! {
    /// 收治科室
    #[derive(Default)]
    pub enum SpecialiteAdmission {
        #[default]
        Medecine => "Médecine",
        Chirurgie => "Chirurgie",
        Cardiologie => "Cardiologie",
        Endocrinologie => "Endocrinologie",
        Autre => "Autre",
    }
}

labeled_enum! {
    /// 就诊方式
    #[derive(Default)]
    pub enum TypeAdmission {
        Publique => "Publique",
        Privee => "Privée",
        #[default]
        Externe => "Externe",
        Urgence => "Urgence",
        Hospitalisation => "Hospitalisation",
    }
}

labeled_enum! {
    /// ASA 麻醉分级
    pub enum AsaClass {
        I => "ASA I",
        II => "ASA II",
        III => "ASA III",
        IV => "ASA IV",
        V => "ASA V",
    }
}

labeled_enum! {
    /// 愈合时间单位
    #[derive(Default)]
    pub enum UniteDelai {
        #[default]
        Jour => "jour",
        Mois => "mois",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitudesToxiques {
    pub tabac: bool,
    pub alcool: bool,
    pub autres: Option<String>,
}

/// 危险因素
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacteursRisque {
    pub hta: bool,
    pub hta_depuis: Option<String>,
    pub hta_trt: Option<String>,
    pub diabete: bool,
    pub diabete_depuis: Option<String>,
    pub diabete_trt: Option<String>,
    pub dyslipidemie: bool,
    pub obesite: bool,
    pub tabac: bool,
    pub tabac_depuis: Option<String>,
    pub tabac_trt: Option<String>,
    pub cancer: bool,
    pub autres: Option<String>,
    pub autres_depuis: Option<String>,
}

/// 诊断信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnostic {
    pub type_operation: TypeOperation,
    pub type_operation_preciser: Option<String>,
    pub laterality: Laterality,
    pub reprise: OuiNon,
    pub date_operation: Option<DateTime<Utc>>,
    pub facteurs_risque: FacteursRisque,
    pub maladie_cardiovasculaire: MaladieCardiovasculaire,
    #[serde(rename = "maladieCardiovasculaireFE")]
    pub maladie_cardiovasculaire_fe: Option<String>,
    pub maladie_cardiovasculaire_autre: Option<String>,
    pub depuis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntecedentsMedicauxDetails {
    pub angor_effort: bool,
    pub sca: bool,
    pub idm: bool,
    pub aomi: bool,
    pub avc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntecedentsChirurgicauxDetails {
    pub amputation_anterieure: OuiNon,
    pub amputation_anterieure_type: Option<String>,
    pub amputation_familiale: OuiNon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntecedentsFamiliaux {
    pub hta: bool,
    pub dt2: bool,
    pub autres: Option<String>,
}

/// 既往史
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Antecedents {
    pub medicaux: Option<String>,
    pub medicaux_details: AntecedentsMedicauxDetails,
    pub chirurgicaux: Option<String>,
    pub chirurgicaux_details: AntecedentsChirurgicauxDetails,
    pub familiaux: AntecedentsFamiliaux,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TensionArterielle {
    pub systolique: Option<f64>,
    pub diastolique: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamenNeurologique {
    pub effectue: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// 临床测量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Clinique {
    pub tension_arterielle: TensionArterielle,
    pub frequence_cardiaque: Option<f64>,
    /// 体重 (kg)
    pub poids: Option<f64>,
    /// 身高 (cm)
    pub taille: Option<f64>,
    pub bmi: Option<f64>,
    pub examen_neurologique: ExamenNeurologique,
}

impl Clinique {
    /// 体重与身高都存在时重新计算BMI，保留一位小数
    pub fn refresh_bmi(&mut self) {
        if let (Some(poids), Some(taille)) = (self.poids, self.taille) {
            if poids > 0.0 && taille > 0.0 {
                let metres = taille / 100.0;
                self.bmi = Some(round_to(poids / (metres * metres), 1));
            }
        }
    }
}

/// 收治信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Admission {
    pub date_admission: Option<DateTime<Utc>>,
    pub transfert: bool,
    pub specialite: SpecialiteAdmission,
    pub type_consultation: TypeAdmission,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnesthesieLocoRegionale {
    pub al: bool,
    pub ra: bool,
    pub peridural: bool,
    pub perirachicombine: bool,
    pub bloc_peripherique: bool,
}

/// 麻醉信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Anesthesie {
    pub ag: bool,
    pub alr: AnesthesieLocoRegionale,
    pub asa: Option<AsaClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cicatrisation {
    pub delai: Option<f64>,
    pub unite: UniteDelai,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerieCrp {
    pub initial: Option<f64>,
    pub un_mois: Option<f64>,
    pub deux_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerieHba1c {
    pub avant: Option<f64>,
    pub un_mois: Option<f64>,
    pub trois_mois: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerieTroponine {
    pub avant_operation: Option<f64>,
    pub apres_operation: Option<f64>,
}

/// 术后演变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Evolution {
    pub cicatrisation: Cicatrisation,
    pub prothese_date: Option<DateTime<Utc>>,
    pub crp: SerieCrp,
    pub hemoglobine_glyquee: SerieHba1c,
    pub troponine: SerieTroponine,
    pub cycle: Option<String>,
    pub autre: Option<String>,
}

/// 患者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub age: u32,
    pub sexe: Sexe,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub photo_url: Option<String>,
    pub date_consultation: Option<DateTime<Utc>>,
    pub derniere_visite: Option<DateTime<Utc>>,
    pub profession: Option<String>,
    pub habitudes_toxiques: HabitudesToxiques,
    pub origine: Option<String>,
    pub diabete: DiabetesType,
    pub diagnostic: Diagnostic,
    pub antecedents: Antecedents,
    pub clinique: Clinique,
    pub consultation: Admission,
    pub anesthesie: Anesthesie,
    pub notes: Option<String>,
    pub ordonnances: Vec<String>,
    pub evolution: Evolution,
    pub statut: PatientStatut,
    pub statut_history: StatusHistory<PatientStatut>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn nom_complet(&self) -> String {
        format!("{} {}", self.nom, self.prenom)
    }

    /// 修改当前状态并追加一条历史记录
    pub fn change_statut(&mut self, statut: PatientStatut, at: DateTime<Utc>) {
        self.statut = statut;
        self.statut_history.record(statut, at);
        self.updated_at = at;
    }
}

/// 患者写入模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInput {
    pub nom: String,
    pub prenom: String,
    pub age: u32,
    pub sexe: Option<Sexe>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub adresse: Option<String>,
    pub photo_url: Option<String>,
    pub date_consultation: Option<DateTime<Utc>>,
    pub derniere_visite: Option<DateTime<Utc>>,
    pub profession: Option<String>,
    pub habitudes_toxiques: HabitudesToxiques,
    pub origine: Option<String>,
    pub diabete: DiabetesType,
    pub diagnostic: Diagnostic,
    pub antecedents: Antecedents,
    pub clinique: Clinique,
    pub consultation: Admission,
    pub anesthesie: Anesthesie,
    pub notes: Option<String>,
    pub ordonnances: Vec<String>,
    pub evolution: Evolution,
    pub statut: PatientStatut,
    pub statut_history: Option<StatusHistory<PatientStatut>>,
}

impl PatientInput {
    /// 生成新患者；调用前应先通过验证（`sexe` 缺失时按验证失败处理）
    pub fn into_patient(self, id: Uuid, now: DateTime<Utc>) -> Patient {
        let mut clinique = self.clinique;
        clinique.refresh_bmi();
        Patient {
            id,
            nom: self.nom.trim().to_string(),
            prenom: self.prenom.trim().to_string(),
            age: self.age,
            sexe: self.sexe.unwrap_or(Sexe::Homme),
            telephone: self.telephone,
            email: self.email.map(|email| email.trim().to_lowercase()),
            adresse: self.adresse,
            photo_url: self.photo_url,
            date_consultation: self.date_consultation.or(Some(now)),
            derniere_visite: self.derniere_visite.or(Some(now)),
            profession: self.profession,
            habitudes_toxiques: self.habitudes_toxiques,
            origine: self.origine,
            diabete: self.diabete,
            diagnostic: self.diagnostic,
            antecedents: self.antecedents,
            clinique,
            consultation: self.consultation,
            anesthesie: self.anesthesie,
            notes: self.notes,
            ordonnances: self.ordonnances,
            evolution: self.evolution,
            statut: self.statut,
            statut_history: self.statut_history.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 用写入模型替换已有患者，保留ID与创建时间
    pub fn apply_to(self, existing: &Patient, now: DateTime<Utc>) -> Patient {
        let history = self
            .statut_history
            .clone()
            .unwrap_or_else(|| existing.statut_history.clone());
        let mut patient = PatientInput {
            statut_history: Some(history),
            ..self
        }
        .into_patient(existing.id, existing.created_at);
        patient.updated_at = now;
        patient
    }
}

impl From<&Patient> for PatientInput {
    fn from(patient: &Patient) -> Self {
        let patient = patient.clone();
        Self {
            nom: patient.nom,
            prenom: patient.prenom,
            age: patient.age,
            sexe: Some(patient.sexe),
            telephone: patient.telephone,
            email: patient.email,
            adresse: patient.adresse,
            photo_url: patient.photo_url,
            date_consultation: patient.date_consultation,
            derniere_visite: patient.derniere_visite,
            profession: patient.profession,
            habitudes_toxiques: patient.habitudes_toxiques,
            origine: patient.origine,
            diabete: patient.diabete,
            diagnostic: patient.diagnostic,
            antecedents: patient.antecedents,
            clinique: patient.clinique,
            consultation: patient.consultation,
            anesthesie: patient.anesthesie,
            notes: patient.notes,
            ordonnances: patient.ordonnances,
            evolution: patient.evolution,
            statut: patient.statut,
            statut_history: Some(patient.statut_history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_refresh() {
        let mut clinique = Clinique {
            poids: Some(80.0),
            taille: Some(180.0),
            ..Default::default()
        };
        clinique.refresh_bmi();
        assert_eq!(clinique.bmi, Some(24.7));

        let mut missing = Clinique {
            poids: Some(80.0),
            ..Default::default()
        };
        missing.refresh_bmi();
        assert_eq!(missing.bmi, None);
    }

    #[test]
    fn test_labels_roundtrip_through_json() {
        let json = serde_json::to_string(&PatientStatut::SousTraitement).unwrap();
        assert_eq!(json, "\"sous_trt\"");
        let parsed: DiabetesType = serde_json::from_str("\"Non spécifié\"").unwrap();
        assert_eq!(parsed, DiabetesType::NonSpecifie);
        assert!(serde_json::from_str::<Sexe>("\"Autre\"").is_err());
    }

    #[test]
    fn test_partial_input_uses_defaults() {
        let raw = r#"{"nom": " Sayah ", "prenom": "Ouadi", "age": 38, "sexe": "Homme",
                      "diagnostic": {"typeOperation": "Chopart"}}"#;
        let input: PatientInput = serde_json::from_str(raw).unwrap();
        let now = Utc::now();
        let patient = input.into_patient(Uuid::new_v4(), now);

        assert_eq!(patient.nom, "Sayah");
        assert_eq!(patient.diagnostic.type_operation, TypeOperation::Chopart);
        assert_eq!(patient.diagnostic.laterality, Laterality::NonSpecifie);
        assert_eq!(patient.statut, PatientStatut::Nouveau);
        assert!(patient.statut_history.is_empty());
        assert_eq!(patient.created_at, now);
    }

    #[test]
    fn test_update_keeps_history_when_omitted() {
        let now = Utc::now();
        let mut original = PatientInput {
            nom: "Bouzidi".into(),
            prenom: "Zahra".into(),
            age: 28,
            sexe: Some(Sexe::Femme),
            ..Default::default()
        }
        .into_patient(Uuid::new_v4(), now);
        original.change_statut(PatientStatut::SousTraitement, now);

        let update = PatientInput {
            nom: "Bouzidi".into(),
            prenom: "Zahra".into(),
            age: 29,
            sexe: Some(Sexe::Femme),
            statut: PatientStatut::SousTraitement,
            ..Default::default()
        };
        let later = now + chrono::Duration::hours(1);
        let updated = update.apply_to(&original, later);

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.age, 29);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.statut_history.len(), 1);
    }

    #[test]
    fn test_patch_keeps_unsent_fields() {
        let now = Utc::now();
        let mut original = PatientInput {
            nom: "Khelifi".into(),
            prenom: "Amine".into(),
            age: 61,
            sexe: Some(Sexe::Homme),
            diabete: DiabetesType::Type2,
            diagnostic: Diagnostic {
                type_operation: TypeOperation::Chopart,
                ..Default::default()
            },
            ..Default::default()
        }
        .into_patient(Uuid::new_v4(), now);
        original.change_statut(PatientStatut::ApresTraitement, now);

        let patch = serde_json::json!({ "age": 62, "notes": "contrôle" });
        let merged = crate::models::merge_patch(&PatientInput::from(&original), patch).unwrap();
        let updated = merged.apply_to(&original, now);

        assert_eq!(updated.age, 62);
        assert_eq!(updated.notes.as_deref(), Some("contrôle"));
        assert_eq!(updated.statut, PatientStatut::ApresTraitement);
        assert_eq!(updated.diabete, DiabetesType::Type2);
        assert_eq!(updated.diagnostic.type_operation, TypeOperation::Chopart);
        assert_eq!(updated.statut_history, original.statut_history);
    }
}
