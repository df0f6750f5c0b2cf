use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position_title: String,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub keywords: Vec<String>,
    pub work_location: Option<String>,
    pub employment_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkLocation {
    Remote,
    InPerson,
    Hybrid,
}

impl WorkLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLocation::Remote => "remote",
            WorkLocation::InPerson => "in_person",
            WorkLocation::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    CoOp,
    Internship,
    Contract,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::CoOp => "co_op",
            EmploymentType::Internship => "internship",
            EmploymentType::Contract => "contract",
        }
    }
}

/// Fields a user (or the job-listing formatter) supplies to create a job.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobDraft {
    pub company_name: String,
    pub position_title: String,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub work_location: Option<WorkLocation>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub employment_type: Option<EmploymentType>,
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.company_name.trim().is_empty() {
            return Err("company_name cannot be empty".to_string());
        }
        if self.position_title.trim().is_empty() {
            return Err("position_title cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Partial update for a job. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobPatch {
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub work_location: Option<WorkLocation>,
    pub employment_type: Option<EmploymentType>,
    pub is_active: Option<bool>,
}

impl JobPatch {
    pub fn apply(self, job: &mut JobRow) -> Result<(), String> {
        if let Some(v) = self.company_name {
            job.company_name = v;
        }
        if let Some(v) = self.position_title {
            job.position_title = v;
        }
        if let Some(v) = self.job_url {
            job.job_url = Some(v);
        }
        if let Some(v) = self.description {
            job.description = Some(v);
        }
        if let Some(v) = self.location {
            job.location = Some(v);
        }
        if let Some(v) = self.salary_range {
            job.salary_range = Some(v);
        }
        if let Some(v) = self.keywords {
            job.keywords = v;
        }
        if let Some(v) = self.work_location {
            job.work_location = Some(v.as_str().to_string());
        }
        if let Some(v) = self.employment_type {
            job.employment_type = Some(v.as_str().to_string());
        }
        if let Some(v) = self.is_active {
            job.is_active = v;
        }
        if job.company_name.trim().is_empty() || job.position_title.trim().is_empty() {
            return Err("company_name and position_title cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Unknown enum strings become `None` instead of failing the whole draft.
fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_name: "Acme".to_string(),
            position_title: "Engineer".to_string(),
            job_url: None,
            description: None,
            location: None,
            salary_range: None,
            keywords: vec![],
            work_location: None,
            employment_type: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut row = job();
        let patch: JobPatch =
            serde_json::from_str(r#"{"work_location":"hybrid","keywords":["rust"]}"#).unwrap();
        patch.apply(&mut row).unwrap();
        assert_eq!(row.company_name, "Acme");
        assert_eq!(row.work_location.as_deref(), Some("hybrid"));
        assert_eq!(row.keywords, vec!["rust".to_string()]);
    }

    #[test]
    fn test_patch_rejects_blank_title() {
        let mut row = job();
        let patch = JobPatch {
            position_title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(patch.apply(&mut row).is_err());
    }

    #[test]
    fn test_draft_validation() {
        let draft: JobDraft =
            serde_json::from_str(r#"{"company_name":"","position_title":"Engineer"}"#).unwrap();
        assert!(draft.validate().is_err());
    }
}
