//! 数据库查询操作

use async_trait::async_trait;
use clinic_core::store::{
    normalize_search, ConsultationFilter, MedecinFilter, PatientFilter, RecordStore,
    RendezVousFilter,
};
use clinic_core::{ClinicError, Consultation, Medecin, Patient, RendezVous, Result};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::models::*;

/// 转义 `ILIKE` 通配符并包裹为子串匹配
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_limit(builder: &mut QueryBuilder<'_, Postgres>, limit: Option<usize>) {
    if let Some(limit) = limit {
        builder.push(" LIMIT ").push_bind(limit as i64);
    }
}

fn push_patient_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PatientFilter) {
    builder.push(" WHERE TRUE");
    if let Some(from) = filter.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(statut) = filter.statut {
        builder.push(" AND statut = ").push_bind(statut.as_str());
    }
    if let Some(diabete) = filter.diabete {
        builder.push(" AND diabete = ").push_bind(diabete.as_str());
    }
    if let Some(search) = normalize_search(filter.search.as_deref()) {
        let pattern = like_pattern(&search);
        builder.push(" AND (nom ILIKE ").push_bind(pattern.clone());
        builder.push(" OR prenom ILIKE ").push_bind(pattern.clone());
        builder.push(" OR email ILIKE ").push_bind(pattern.clone());
        builder.push(" OR telephone ILIKE ").push_bind(pattern);
        builder.push(")");
    }
}

fn push_medecin_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MedecinFilter) {
    builder.push(" WHERE TRUE");
    if let Some(specialite) = filter.specialite {
        builder.push(" AND specialite = ").push_bind(specialite.as_str());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(email) = &filter.email {
        builder.push(" AND LOWER(email) = ").push_bind(email.clone());
    }
    if let Some(search) = normalize_search(filter.search.as_deref()) {
        let pattern = like_pattern(&search);
        builder.push(" AND (nom ILIKE ").push_bind(pattern.clone());
        builder.push(" OR prenom ILIKE ").push_bind(pattern.clone());
        builder.push(" OR email ILIKE ").push_bind(pattern.clone());
        builder.push(" OR specialite ILIKE ").push_bind(pattern);
        builder.push(")");
    }
}

fn push_rendez_vous_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RendezVousFilter) {
    builder.push(" WHERE TRUE");
    if let Some(from) = filter.date_from {
        builder.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        builder.push(" AND date <= ").push_bind(to);
    }
    if !filter.statuts.is_empty() {
        let statuts: Vec<String> = filter.statuts.iter().map(|s| s.as_str().to_string()).collect();
        builder.push(" AND statut = ANY(").push_bind(statuts).push(")");
    }
    if !filter.kinds.is_empty() {
        let kinds: Vec<String> = filter.kinds.iter().map(|k| k.as_str().to_string()).collect();
        builder.push(" AND type = ANY(").push_bind(kinds).push(")");
    }
    if let Some(medecin_id) = filter.medecin_id {
        builder.push(" AND medecin_id = ").push_bind(medecin_id);
    }
    if let Some(patient_id) = filter.patient_id {
        builder.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(heure) = &filter.heure {
        builder.push(" AND heure = ").push_bind(heure.trim().to_string());
    }
}

fn push_consultation_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ConsultationFilter) {
    builder.push(" WHERE TRUE");
    if let Some(from) = filter.date_from {
        builder.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        builder.push(" AND date <= ").push_bind(to);
    }
    if let Some(patient_id) = filter.patient_id {
        builder.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(medecin_id) = filter.medecin_id {
        builder.push(" AND medecin_id = ").push_bind(medecin_id);
    }
    if let Some(statut) = filter.statut {
        builder.push(" AND statut = ").push_bind(statut.as_str());
    }
}

fn not_found_unless_affected(rows: u64, kind: &str, id: Uuid) -> Result<()> {
    if rows == 0 {
        Err(ClinicError::NotFound(format!("{} {}", kind, id)))
    } else {
        Ok(())
    }
}

/// PostgreSQL 记录存储
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: DatabasePool,
}

impl PgRecordStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 创建患者表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY,
                nom VARCHAR(100) NOT NULL,
                prenom VARCHAR(100) NOT NULL,
                age INTEGER NOT NULL,
                sexe VARCHAR(16) NOT NULL,
                telephone VARCHAR(32),
                email VARCHAR(255),
                adresse TEXT,
                photo_url TEXT,
                date_consultation TIMESTAMP WITH TIME ZONE,
                derniere_visite TIMESTAMP WITH TIME ZONE,
                profession VARCHAR(100),
                origine VARCHAR(100),
                diabete VARCHAR(32) NOT NULL,
                statut VARCHAR(16) NOT NULL,
                habitudes_toxiques JSONB NOT NULL DEFAULT '{}',
                diagnostic JSONB NOT NULL DEFAULT '{}',
                antecedents JSONB NOT NULL DEFAULT '{}',
                clinique JSONB NOT NULL DEFAULT '{}',
                admission JSONB NOT NULL DEFAULT '{}',
                anesthesie JSONB NOT NULL DEFAULT '{}',
                evolution JSONB NOT NULL DEFAULT '{}',
                notes TEXT,
                ordonnances JSONB NOT NULL DEFAULT '[]',
                statut_history JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建医生表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS medecins (
                id UUID PRIMARY KEY,
                nom VARCHAR(100) NOT NULL,
                prenom VARCHAR(100) NOT NULL,
                specialite VARCHAR(32) NOT NULL,
                email VARCHAR(255) UNIQUE NOT NULL,
                telephone VARCHAR(32) NOT NULL,
                status VARCHAR(32) NOT NULL,
                photo_url TEXT,
                notes TEXT,
                horaires JSONB NOT NULL DEFAULT '{}',
                status_history JSONB,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建预约表：引用不设外键，删除患者或医生不级联
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS rendez_vous (
                id UUID PRIMARY KEY,
                patient_id UUID,
                patient_nom VARCHAR(255),
                medecin_id UUID,
                medecin_nom VARCHAR(255),
                date TIMESTAMP WITH TIME ZONE NOT NULL,
                heure VARCHAR(5) NOT NULL,
                type VARCHAR(32) NOT NULL,
                statut VARCHAR(16) NOT NULL,
                duree INTEGER NOT NULL DEFAULT 30,
                notes TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await?;

        // 创建诊疗记录表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS consultations (
                id UUID PRIMARY KEY,
                date TIMESTAMP WITH TIME ZONE NOT NULL,
                type VARCHAR(32) NOT NULL,
                patient_id UUID NOT NULL,
                medecin_id UUID NOT NULL,
                diagnostic TEXT,
                traitement TEXT,
                notes TEXT,
                duree INTEGER,
                statut VARCHAR(16) NOT NULL,
                montant DOUBLE PRECISION,
                paiement VARCHAR(32) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await?;

        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_patients_nom_prenom ON patients(nom, prenom)",
            "CREATE INDEX IF NOT EXISTS idx_patients_email ON patients(email)",
            "CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_medecins_nom_prenom ON medecins(nom, prenom)",
            "CREATE INDEX IF NOT EXISTS idx_medecins_specialite ON medecins(specialite)",
            "CREATE INDEX IF NOT EXISTS idx_medecins_status ON medecins(status)",
            "CREATE INDEX IF NOT EXISTS idx_rendez_vous_date_heure ON rendez_vous(date, heure)",
            "CREATE INDEX IF NOT EXISTS idx_rendez_vous_medecin_date ON rendez_vous(medecin_id, date)",
            "CREATE INDEX IF NOT EXISTS idx_rendez_vous_patient ON rendez_vous(patient_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_medecin ON consultations(medecin_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_date ON consultations(date)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql).execute(pool).await?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========== 患者相关操作 ==========

    async fn find_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM patients");
        push_patient_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        push_limit(&mut builder, filter.limit);

        tracing::debug!("Patient query: {}", builder.sql());
        let rows = builder
            .build_query_as::<DbPatient>()
            .fetch_all(self.pool.pool())
            .await?;
        convert_rows(rows)
    }

    async fn count_patients(&self, filter: &PatientFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM patients");
        push_patient_filter(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count as u64)
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        let row = sqlx::query_as::<_, DbPatient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Patient::try_from).transpose()
    }

    async fn insert_patient(&self, patient: &Patient) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO patients (
                id, nom, prenom, age, sexe, telephone, email, adresse, photo_url,
                date_consultation, derniere_visite, profession, origine, diabete, statut,
                habitudes_toxiques, diagnostic, antecedents, clinique, admission, anesthesie,
                evolution, notes, ordonnances, statut_history, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
        "#)
        .bind(patient.id)
        .bind(&patient.nom)
        .bind(&patient.prenom)
        .bind(patient.age as i32)
        .bind(patient.sexe.as_str())
        .bind(&patient.telephone)
        .bind(&patient.email)
        .bind(&patient.adresse)
        .bind(&patient.photo_url)
        .bind(patient.date_consultation)
        .bind(patient.derniere_visite)
        .bind(&patient.profession)
        .bind(&patient.origine)
        .bind(patient.diabete.as_str())
        .bind(patient.statut.as_str())
        .bind(Json(&patient.habitudes_toxiques))
        .bind(Json(&patient.diagnostic))
        .bind(Json(&patient.antecedents))
        .bind(Json(&patient.clinique))
        .bind(Json(&patient.consultation))
        .bind(Json(&patient.anesthesie))
        .bind(Json(&patient.evolution))
        .bind(&patient.notes)
        .bind(Json(&patient.ordonnances))
        .bind(Json(&patient.statut_history))
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(self.pool.pool())
        .await?;

        tracing::info!("Inserted patient {}", patient.id);
        Ok(())
    }

    async fn update_patient(&self, patient: &Patient) -> Result<()> {
        let result = sqlx::query(r#"
            UPDATE patients SET
                nom = $2, prenom = $3, age = $4, sexe = $5, telephone = $6, email = $7,
                adresse = $8, photo_url = $9, date_consultation = $10, derniere_visite = $11,
                profession = $12, origine = $13, diabete = $14, statut = $15,
                habitudes_toxiques = $16, diagnostic = $17, antecedents = $18, clinique = $19,
                admission = $20, anesthesie = $21, evolution = $22, notes = $23,
                ordonnances = $24, statut_history = $25, updated_at = $26
            WHERE id = $1
        "#)
        .bind(patient.id)
        .bind(&patient.nom)
        .bind(&patient.prenom)
        .bind(patient.age as i32)
        .bind(patient.sexe.as_str())
        .bind(&patient.telephone)
        .bind(&patient.email)
        .bind(&patient.adresse)
        .bind(&patient.photo_url)
        .bind(patient.date_consultation)
        .bind(patient.derniere_visite)
        .bind(&patient.profession)
        .bind(&patient.origine)
        .bind(patient.diabete.as_str())
        .bind(patient.statut.as_str())
        .bind(Json(&patient.habitudes_toxiques))
        .bind(Json(&patient.diagnostic))
        .bind(Json(&patient.antecedents))
        .bind(Json(&patient.clinique))
        .bind(Json(&patient.consultation))
        .bind(Json(&patient.anesthesie))
        .bind(Json(&patient.evolution))
        .bind(&patient.notes)
        .bind(Json(&patient.ordonnances))
        .bind(Json(&patient.statut_history))
        .bind(patient.updated_at)
        .execute(self.pool.pool())
        .await?;

        not_found_unless_affected(result.rows_affected(), "patient", patient.id)
    }

    async fn delete_patient(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========== 医生相关操作 ==========

    async fn find_medecins(&self, filter: &MedecinFilter) -> Result<Vec<Medecin>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM medecins");
        push_medecin_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        push_limit(&mut builder, filter.limit);

        let rows = builder
            .build_query_as::<DbMedecin>()
            .fetch_all(self.pool.pool())
            .await?;
        convert_rows(rows)
    }

    async fn count_medecins(&self, filter: &MedecinFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM medecins");
        push_medecin_filter(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count as u64)
    }

    async fn get_medecin(&self, id: Uuid) -> Result<Option<Medecin>> {
        let row = sqlx::query_as::<_, DbMedecin>("SELECT * FROM medecins WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Medecin::try_from).transpose()
    }

    async fn insert_medecin(&self, medecin: &Medecin) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO medecins (
                id, nom, prenom, specialite, email, telephone, status, photo_url, notes,
                horaires, status_history, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#)
        .bind(medecin.id)
        .bind(&medecin.nom)
        .bind(&medecin.prenom)
        .bind(medecin.specialite.as_str())
        .bind(&medecin.email)
        .bind(&medecin.telephone)
        .bind(medecin.status.as_str())
        .bind(&medecin.photo_url)
        .bind(&medecin.notes)
        .bind(Json(&medecin.horaires))
        .bind(medecin.status_history.as_ref().map(Json))
        .bind(medecin.created_at)
        .bind(medecin.updated_at)
        .execute(self.pool.pool())
        .await?;

        tracing::info!("Inserted medecin {}", medecin.id);
        Ok(())
    }

    async fn update_medecin(&self, medecin: &Medecin) -> Result<()> {
        let result = sqlx::query(r#"
            UPDATE medecins SET
                nom = $2, prenom = $3, specialite = $4, email = $5, telephone = $6,
                status = $7, photo_url = $8, notes = $9, horaires = $10,
                status_history = $11, updated_at = $12
            WHERE id = $1
        "#)
        .bind(medecin.id)
        .bind(&medecin.nom)
        .bind(&medecin.prenom)
        .bind(medecin.specialite.as_str())
        .bind(&medecin.email)
        .bind(&medecin.telephone)
        .bind(medecin.status.as_str())
        .bind(&medecin.photo_url)
        .bind(&medecin.notes)
        .bind(Json(&medecin.horaires))
        .bind(medecin.status_history.as_ref().map(Json))
        .bind(medecin.updated_at)
        .execute(self.pool.pool())
        .await?;

        not_found_unless_affected(result.rows_affected(), "medecin", medecin.id)
    }

    async fn delete_medecin(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM medecins WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========== 预约相关操作 ==========

    async fn find_rendez_vous(&self, filter: &RendezVousFilter) -> Result<Vec<RendezVous>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM rendez_vous");
        push_rendez_vous_filter(&mut builder, filter);
        builder.push(" ORDER BY date ASC, heure ASC");
        push_limit(&mut builder, filter.limit);

        let rows = builder
            .build_query_as::<DbRendezVous>()
            .fetch_all(self.pool.pool())
            .await?;
        convert_rows(rows)
    }

    async fn count_rendez_vous(&self, filter: &RendezVousFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rendez_vous");
        push_rendez_vous_filter(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count as u64)
    }

    async fn get_rendez_vous(&self, id: Uuid) -> Result<Option<RendezVous>> {
        let row = sqlx::query_as::<_, DbRendezVous>("SELECT * FROM rendez_vous WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(RendezVous::try_from).transpose()
    }

    async fn insert_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO rendez_vous (
                id, patient_id, patient_nom, medecin_id, medecin_nom, date, heure, type,
                statut, duree, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#)
        .bind(rdv.id)
        .bind(rdv.patient.id)
        .bind(&rdv.patient.display_name)
        .bind(rdv.medecin.id)
        .bind(&rdv.medecin.display_name)
        .bind(rdv.date)
        .bind(&rdv.heure)
        .bind(rdv.kind.as_str())
        .bind(rdv.statut.as_str())
        .bind(rdv.duree as i32)
        .bind(&rdv.notes)
        .bind(rdv.created_at)
        .bind(rdv.updated_at)
        .execute(self.pool.pool())
        .await?;

        tracing::info!("Inserted rendez-vous {} at {} {}", rdv.id, rdv.date.date_naive(), rdv.heure);
        Ok(())
    }

    async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<()> {
        let result = sqlx::query(r#"
            UPDATE rendez_vous SET
                patient_id = $2, patient_nom = $3, medecin_id = $4, medecin_nom = $5,
                date = $6, heure = $7, type = $8, statut = $9, duree = $10, notes = $11,
                updated_at = $12
            WHERE id = $1
        "#)
        .bind(rdv.id)
        .bind(rdv.patient.id)
        .bind(&rdv.patient.display_name)
        .bind(rdv.medecin.id)
        .bind(&rdv.medecin.display_name)
        .bind(rdv.date)
        .bind(&rdv.heure)
        .bind(rdv.kind.as_str())
        .bind(rdv.statut.as_str())
        .bind(rdv.duree as i32)
        .bind(&rdv.notes)
        .bind(rdv.updated_at)
        .execute(self.pool.pool())
        .await?;

        not_found_unless_affected(result.rows_affected(), "rendez-vous", rdv.id)
    }

    async fn delete_rendez_vous(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rendez_vous WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========== 诊疗记录相关操作 ==========

    async fn find_consultations(&self, filter: &ConsultationFilter) -> Result<Vec<Consultation>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM consultations");
        push_consultation_filter(&mut builder, filter);
        builder.push(" ORDER BY date DESC");
        push_limit(&mut builder, filter.limit);

        let rows = builder
            .build_query_as::<DbConsultation>()
            .fetch_all(self.pool.pool())
            .await?;
        convert_rows(rows)
    }

    async fn count_consultations(&self, filter: &ConsultationFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM consultations");
        push_consultation_filter(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count as u64)
    }

    async fn get_consultation(&self, id: Uuid) -> Result<Option<Consultation>> {
        let row = sqlx::query_as::<_, DbConsultation>("SELECT * FROM consultations WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Consultation::try_from).transpose()
    }

    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO consultations (
                id, date, type, patient_id, medecin_id, diagnostic, traitement, notes,
                duree, statut, montant, paiement, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#)
        .bind(consultation.id)
        .bind(consultation.date)
        .bind(consultation.kind.as_str())
        .bind(consultation.patient_id)
        .bind(consultation.medecin_id)
        .bind(&consultation.diagnostic)
        .bind(&consultation.traitement)
        .bind(&consultation.notes)
        .bind(consultation.duree.map(|duree| duree as i32))
        .bind(consultation.statut.as_str())
        .bind(consultation.montant)
        .bind(consultation.paiement.as_str())
        .bind(consultation.created_at)
        .bind(consultation.updated_at)
        .execute(self.pool.pool())
        .await?;

        tracing::info!("Inserted consultation {}", consultation.id);
        Ok(())
    }

    async fn update_consultation(&self, consultation: &Consultation) -> Result<()> {
        let result = sqlx::query(r#"
            UPDATE consultations SET
                date = $2, type = $3, patient_id = $4, medecin_id = $5, diagnostic = $6,
                traitement = $7, notes = $8, duree = $9, statut = $10, montant = $11,
                paiement = $12, updated_at = $13
            WHERE id = $1
        "#)
        .bind(consultation.id)
        .bind(consultation.date)
        .bind(consultation.kind.as_str())
        .bind(consultation.patient_id)
        .bind(consultation.medecin_id)
        .bind(&consultation.diagnostic)
        .bind(&consultation.traitement)
        .bind(&consultation.notes)
        .bind(consultation.duree.map(|duree| duree as i32))
        .bind(consultation.statut.as_str())
        .bind(consultation.montant)
        .bind(consultation.paiement.as_str())
        .bind(consultation.updated_at)
        .execute(self.pool.pool())
        .await?;

        not_found_unless_affected(result.rows_affected(), "consultation", consultation.id)
    }

    async fn delete_consultation(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM consultations WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::store::DateRange;
    use clinic_core::{PatientStatut, RendezVousStatut};
    use chrono::Utc;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ben"), "%ben%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_patient_filter_sql() {
        let filter = PatientFilter {
            statut: Some(PatientStatut::SousTraitement),
            search: Some("  Khen ".into()),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM patients");
        push_patient_filter(&mut builder, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM patients WHERE TRUE AND statut = $1 AND (nom ILIKE $2 OR prenom ILIKE $3 OR email ILIKE $4 OR telephone ILIKE $5)"
        );
    }

    #[test]
    fn test_rendez_vous_filter_sql() {
        let now = Utc::now();
        let filter = RendezVousFilter::between(DateRange::new(now, now))
            .with_statuts(&RendezVousStatut::OPEN)
            .with_limit(10);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM rendez_vous");
        push_rendez_vous_filter(&mut builder, &filter);
        push_limit(&mut builder, filter.limit);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM rendez_vous WHERE TRUE AND date >= $1 AND date <= $2 AND statut = ANY($3) LIMIT $4"
        );
    }

    #[test]
    fn test_empty_filter_has_no_conditions() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM consultations");
        push_consultation_filter(&mut builder, &ConsultationFilter::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM consultations WHERE TRUE");
    }
}
