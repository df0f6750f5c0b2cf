use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::sections::{Education, Project, SectionContent, Skill, WorkExperience};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn sections(&self) -> SectionContent {
        SectionContent {
            work_experience: self.work_experience.0.clone(),
            education: self.education.0.clone(),
            skills: self.skills.0.clone(),
            projects: self.projects.0.clone(),
        }
    }
}

/// Contact details shared by profiles and resumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

impl From<&ProfileRow> for ContactInfo {
    fn from(p: &ProfileRow) -> Self {
        Self {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            phone_number: p.phone_number.clone(),
            location: p.location.clone(),
            website: p.website.clone(),
            linkedin_url: p.linkedin_url.clone(),
            github_url: p.github_url.clone(),
        }
    }
}

impl ContactInfo {
    /// Copies fields from `other` only where this one has none.
    pub fn fill_missing(&mut self, other: &ContactInfo) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            let empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
            if empty && value.is_some() {
                *slot = value.clone();
            }
        }
        fill(&mut self.first_name, &other.first_name);
        fill(&mut self.last_name, &other.last_name);
        fill(&mut self.email, &other.email);
        fill(&mut self.phone_number, &other.phone_number);
        fill(&mut self.location, &other.location);
        fill(&mut self.website, &other.website);
        fill(&mut self.linkedin_url, &other.linkedin_url);
        fill(&mut self.github_url, &other.github_url);
    }
}

/// Partial profile update. Sections present in the body replace the stored array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub contact: Option<ContactInfo>,
    pub work_experience: Option<Vec<WorkExperience>>,
    pub education: Option<Vec<Education>>,
    pub skills: Option<Vec<Skill>>,
    pub projects: Option<Vec<Project>>,
}

impl ProfilePatch {
    pub fn apply(self, contact: &mut ContactInfo, sections: &mut SectionContent) {
        if let Some(c) = self.contact {
            *contact = c;
        }
        if let Some(v) = self.work_experience {
            sections.work_experience = v;
        }
        if let Some(v) = self.education {
            sections.education = v;
        }
        if let Some(v) = self.skills {
            sections.skills = v;
        }
        if let Some(v) = self.projects {
            sections.projects = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut contact = ContactInfo {
            first_name: Some("Ada".to_string()),
            email: Some(" ".to_string()),
            ..Default::default()
        };
        let imported = ContactInfo {
            first_name: Some("Grace".to_string()),
            email: Some("ada@example.com".to_string()),
            github_url: Some("https://github.com/ada".to_string()),
            ..Default::default()
        };
        contact.fill_missing(&imported);
        assert_eq!(contact.first_name.as_deref(), Some("Ada"));
        assert_eq!(contact.email.as_deref(), Some("ada@example.com"));
        assert_eq!(contact.github_url.as_deref(), Some("https://github.com/ada"));
    }

    #[test]
    fn test_patch_replaces_only_given_sections() {
        let mut contact = ContactInfo::default();
        let mut sections = SectionContent {
            skills: vec![Skill {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string()],
            }],
            ..Default::default()
        };
        let patch: ProfilePatch =
            serde_json::from_str(r#"{"projects":[{"name":"forge"}]}"#).unwrap();
        patch.apply(&mut contact, &mut sections);
        assert_eq!(sections.skills.len(), 1);
        assert_eq!(sections.projects[0].name, "forge");
    }
}
