//! 写入模型验证
//!
//! 所有错误一次性收集，最终合并为一个 [`ClinicError::Validation`]。

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ClinicError, Result};
use crate::models::{ConsultationInput, MedecinInput, PatientInput, RendezVousInput};

/// 验证结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// 条件不成立时记录错误
    pub fn require(&mut self, condition: bool, error: &str) {
        if !condition {
            self.add_error(error);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ClinicError::Validation(self.errors.join("; ")))
        }
    }
}

pub trait Validate {
    fn validate(&self) -> ValidationReport;

    fn check(&self) -> Result<()> {
        self.validate().into_result()
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

fn heure_regex() -> &'static Regex {
    static HEURE: OnceLock<Regex> = OnceLock::new();
    HEURE.get_or_init(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("heure pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// `HH:MM`，00:00 至 23:59
pub fn is_valid_heure(heure: &str) -> bool {
    heure_regex().is_match(heure.trim())
}

impl Validate for PatientInput {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require(!self.nom.trim().is_empty(), "患者姓氏不能为空");
        report.require(!self.prenom.trim().is_empty(), "患者名字不能为空");
        report.require((1..=150).contains(&self.age), "年龄必须在 1 到 150 之间");
        report.require(self.sexe.is_some(), "性别为必填项");
        if let Some(email) = self.email.as_deref().filter(|email| !email.trim().is_empty()) {
            report.require(is_valid_email(email), "邮箱格式无效");
        }
        for (label, value) in [
            ("体重", self.clinique.poids),
            ("身高", self.clinique.taille),
        ] {
            if let Some(value) = value {
                report.require(value > 0.0, &format!("{}必须为正数", label));
            }
        }
        report
    }
}

impl Validate for MedecinInput {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require(!self.prenom.trim().is_empty(), "医生名字不能为空");
        report.require(self.specialite.is_some(), "专科为必填项");
        report.require(is_valid_email(&self.email), "邮箱格式无效");
        report.require(!self.telephone.trim().is_empty(), "电话不能为空");
        report
    }
}

impl Validate for RendezVousInput {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require(!self.patient_ref().is_empty(), "必须指定患者（ID或姓名）");
        report.require(!self.medecin_ref().is_empty(), "必须指定医生（ID或姓名）");
        report.require(self.date.is_some(), "预约日期为必填项");
        report.require(is_valid_heure(&self.heure), "时间格式必须为 HH:MM");
        report.require(self.kind.is_some(), "预约类型为必填项");
        if let Some(duree) = self.duree {
            report.require((15..=180).contains(&duree), "预约时长必须在 15 到 180 分钟之间");
        }
        report
    }
}

impl Validate for ConsultationInput {
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.require(self.patient_id.is_some(), "患者ID为必填项");
        report.require(self.medecin_id.is_some(), "医生ID为必填项");
        report.require(self.kind.is_some(), "诊疗类型为必填项");
        if let Some(duree) = self.duree {
            report.require((5..=240).contains(&duree), "诊疗时长必须在 5 到 240 分钟之间");
        }
        if let Some(montant) = self.montant {
            report.require(montant >= 0.0, "金额不能为负数");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RendezVousType, Sexe, Specialite};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_heure_format() {
        assert!(is_valid_heure("00:00"));
        assert!(is_valid_heure("23:59"));
        assert!(!is_valid_heure("24:00"));
        assert!(!is_valid_heure("9:30"));
        assert!(!is_valid_heure("09h30"));
    }

    #[test]
    fn test_patient_errors_are_collected() {
        let input = PatientInput {
            nom: " ".into(),
            age: 0,
            email: Some("pas-un-email".into()),
            ..Default::default()
        };
        let report = input.validate();
        // 姓、名、年龄、性别、邮箱
        assert_eq!(report.errors.len(), 5);
        assert!(matches!(input.check(), Err(ClinicError::Validation(_))));
    }

    #[test]
    fn test_valid_patient_passes() {
        let input = PatientInput {
            nom: "Khenouna".into(),
            prenom: "Mohammed".into(),
            age: 150,
            sexe: Some(Sexe::Homme),
            ..Default::default()
        };
        assert!(input.check().is_ok());
    }

    #[test]
    fn test_medecin_requires_email_and_speciality() {
        let mut input = MedecinInput {
            prenom: "Karim".into(),
            email: "k.benali@clinique.dz".into(),
            telephone: "0550000000".into(),
            ..Default::default()
        };
        assert_eq!(input.validate().errors.len(), 1);
        input.specialite = Some(Specialite::Podologue);
        assert!(input.check().is_ok());
    }

    #[test]
    fn test_rendez_vous_requires_a_person_reference() {
        let input = RendezVousInput {
            patient_id: Some(Uuid::new_v4()),
            date: Some(Utc::now()),
            heure: "10:00".into(),
            kind: Some(RendezVousType::Urgence),
            duree: Some(10),
            ..Default::default()
        };
        let report = input.validate();
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_consultation_amount_and_duration_bounds() {
        let input = ConsultationInput {
            patient_id: Some(Uuid::new_v4()),
            medecin_id: Some(Uuid::new_v4()),
            kind: Some(crate::models::ConsultationType::Suivi),
            duree: Some(241),
            montant: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(input.validate().errors.len(), 2);
    }
}
