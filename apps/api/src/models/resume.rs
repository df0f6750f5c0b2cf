use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::ContactInfo;
use crate::models::sections::{
    normalize_section_order, Education, Project, SectionConfigs, SectionContent, Skill,
    WorkExperience,
};
use crate::pdf::settings::DocumentSettings;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Null for base resumes, set for tailored ones.
    pub job_id: Option<Uuid>,
    pub name: String,
    pub target_role: String,
    pub is_base_resume: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub work_experience: Json<Vec<WorkExperience>>,
    pub education: Json<Vec<Education>>,
    pub skills: Json<Vec<Skill>>,
    pub projects: Json<Vec<Project>>,
    pub document_settings: Json<DocumentSettings>,
    pub section_order: Vec<String>,
    pub section_configs: Json<SectionConfigs>,
    pub has_cover_letter: bool,
    pub cover_letter: Option<Value>,
    pub s3_pdf_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn sections(&self) -> SectionContent {
        SectionContent {
            work_experience: self.work_experience.0.clone(),
            education: self.education.0.clone(),
            skills: self.skills.0.clone(),
            projects: self.projects.0.clone(),
        }
    }

    pub fn contact(&self) -> ContactInfo {
        ContactInfo {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            location: self.location.clone(),
            website: self.website.clone(),
            linkedin_url: self.linkedin_url.clone(),
            github_url: self.github_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeKind {
    Base,
    Tailored,
}

/// Checks the base/tailored invariant: tailored resumes carry a job, base resumes never do.
pub fn check_job_link(is_base_resume: bool, job_id: Option<Uuid>) -> Result<(), String> {
    match (is_base_resume, job_id) {
        (true, Some(_)) => Err("A base resume cannot be linked to a job".to_string()),
        (false, None) => Err("A tailored resume requires a job_id".to_string()),
        _ => Ok(()),
    }
}

/// Partial update for a resume. Absent fields stay untouched; `job_id: null` unlinks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResumePatch {
    pub name: Option<String>,
    pub target_role: Option<String>,
    pub is_base_resume: Option<bool>,
    #[serde(deserialize_with = "double_option")]
    pub job_id: Option<Option<Uuid>>,
    pub contact: Option<ContactInfo>,
    pub work_experience: Option<Vec<WorkExperience>>,
    pub education: Option<Vec<Education>>,
    pub skills: Option<Vec<Skill>>,
    pub projects: Option<Vec<Project>>,
    pub document_settings: Option<DocumentSettings>,
    pub section_order: Option<Vec<String>>,
    pub section_configs: Option<SectionConfigs>,
}

impl ResumePatch {
    /// Applies the patch in place, then re-checks the job link. Callers persist only on `Ok`.
    pub fn apply(self, resume: &mut ResumeRow) -> Result<(), String> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err("name cannot be empty".to_string());
            }
            resume.name = name;
        }
        if let Some(v) = self.target_role {
            resume.target_role = v;
        }
        if let Some(v) = self.is_base_resume {
            resume.is_base_resume = v;
        }
        if let Some(v) = self.job_id {
            resume.job_id = v;
        }
        if let Some(contact) = self.contact {
            resume.set_contact(contact);
        }
        if let Some(v) = self.work_experience {
            resume.work_experience = Json(v);
        }
        if let Some(v) = self.education {
            resume.education = Json(v);
        }
        if let Some(v) = self.skills {
            resume.skills = Json(v);
        }
        if let Some(v) = self.projects {
            resume.projects = Json(v);
        }
        if let Some(v) = self.document_settings {
            resume.document_settings = Json(v);
        }
        if let Some(order) = self.section_order {
            resume.section_order = normalize_section_order(&order)?;
        }
        if let Some(v) = self.section_configs {
            resume.section_configs = Json(v);
        }
        check_job_link(resume.is_base_resume, resume.job_id)
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ResumeRow {
    pub fn set_contact(&mut self, contact: ContactInfo) {
        self.first_name = contact.first_name;
        self.last_name = contact.last_name;
        self.email = contact.email;
        self.phone_number = contact.phone_number;
        self.location = contact.location;
        self.website = contact.website;
        self.linkedin_url = contact.linkedin_url;
        self.github_url = contact.github_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(is_base: bool, job_id: Option<Uuid>) -> ResumeRow {
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_id,
            name: "Backend".to_string(),
            target_role: "Engineer".to_string(),
            is_base_resume: is_base,
            first_name: None,
            last_name: None,
            email: None,
            phone_number: None,
            location: None,
            website: None,
            linkedin_url: None,
            github_url: None,
            work_experience: Json(vec![]),
            education: Json(vec![]),
            skills: Json(vec![]),
            projects: Json(vec![]),
            document_settings: Json(DocumentSettings::default()),
            section_order: vec![],
            section_configs: Json(SectionConfigs::default()),
            has_cover_letter: false,
            cover_letter: None,
            s3_pdf_key: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_patch_cannot_unlink_tailored_job() {
        let mut row = resume(false, Some(Uuid::new_v4()));
        let patch: ResumePatch = serde_json::from_str(r#"{"job_id":null}"#).unwrap();
        assert!(patch.apply(&mut row).is_err());
    }

    #[test]
    fn test_patch_converting_to_base_must_drop_job() {
        let mut row = resume(false, Some(Uuid::new_v4()));
        let patch: ResumePatch =
            serde_json::from_str(r#"{"is_base_resume":true,"job_id":null}"#).unwrap();
        patch.apply(&mut row).unwrap();
        assert!(row.is_base_resume);
        assert_eq!(row.job_id, None);
    }

    #[test]
    fn test_patch_absent_job_id_is_untouched() {
        let job = Uuid::new_v4();
        let mut row = resume(false, Some(job));
        let patch: ResumePatch = serde_json::from_str(r#"{"name":"Renamed"}"#).unwrap();
        patch.apply(&mut row).unwrap();
        assert_eq!(row.job_id, Some(job));
        assert_eq!(row.name, "Renamed");
    }

    #[test]
    fn test_patch_normalizes_section_order() {
        let mut row = resume(true, None);
        let patch: ResumePatch =
            serde_json::from_str(r#"{"section_order":["skills","projects"]}"#).unwrap();
        patch.apply(&mut row).unwrap();
        assert_eq!(
            row.section_order,
            vec!["skills", "projects", "work_experience", "education"]
        );

        let bad: ResumePatch =
            serde_json::from_str(r#"{"section_order":["skills","skills"]}"#).unwrap();
        assert!(bad.apply(&mut row).is_err());
    }

    #[test]
    fn test_job_link_invariant() {
        assert!(check_job_link(true, None).is_ok());
        assert!(check_job_link(false, Some(Uuid::new_v4())).is_ok());
        assert!(check_job_link(true, Some(Uuid::new_v4())).is_err());
        assert!(check_job_link(false, None).is_err());
    }

    #[test]
    fn test_resume_kind_serde() {
        let kind: ResumeKind = serde_json::from_str(r#""tailored""#).unwrap();
        assert_eq!(kind, ResumeKind::Tailored);
    }
}
