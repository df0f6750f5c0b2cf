//! Pure construction rules for new resumes.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::profile::ContactInfo;
use crate::models::resume::ResumeRow;
use crate::models::sections::{default_section_order, SectionConfigs, SectionContent};
use crate::pdf::settings::DocumentSettings;
use crate::resumes::repo::NewResume;

pub const COPY_SUFFIX: &str = " (Copy)";

/// Where a new base resume takes its content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportOption {
    ImportProfile,
    Fresh,
    ImportResume,
}

/// Keeps only the named sections. `None` keeps everything.
pub fn select_sections(content: SectionContent, selected: Option<&[String]>) -> SectionContent {
    let Some(selected) = selected else {
        return content;
    };
    let keep = |key: &str| selected.iter().any(|s| s == key);
    SectionContent {
        work_experience: if keep("work_experience") {
            content.work_experience
        } else {
            Vec::new()
        },
        education: if keep("education") {
            content.education
        } else {
            Vec::new()
        },
        skills: if keep("skills") {
            content.skills
        } else {
            Vec::new()
        },
        projects: if keep("projects") {
            content.projects
        } else {
            Vec::new()
        },
    }
}

pub fn copy_name(name: &str) -> String {
    format!("{name}{COPY_SUFFIX}")
}

/// A new base resume with default layout. Base resumes never carry a job.
pub fn new_base_resume(
    user_id: Uuid,
    name: String,
    target_role: String,
    contact: ContactInfo,
    sections: SectionContent,
) -> NewResume {
    NewResume {
        user_id,
        job_id: None,
        name,
        target_role,
        is_base_resume: true,
        contact,
        sections,
        document_settings: DocumentSettings::default(),
        section_order: default_section_order(),
        section_configs: SectionConfigs::default(),
    }
}

/// A tailored copy of `base` for `job_id`, keeping the base resume's layout.
pub fn new_tailored_resume(
    base: &ResumeRow,
    job_id: Uuid,
    name: String,
    target_role: Option<String>,
    sections: Option<SectionContent>,
) -> NewResume {
    let mut resume = NewResume::from_existing(base, name);
    resume.is_base_resume = false;
    resume.job_id = Some(job_id);
    if let Some(role) = target_role {
        resume.target_role = role;
    }
    if let Some(sections) = sections {
        resume.sections = sections;
    }
    resume
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sections::{Skill, WorkExperience};

    fn content() -> SectionContent {
        SectionContent {
            work_experience: vec![WorkExperience {
                company: "Acme".to_string(),
                ..Default::default()
            }],
            skills: vec![Skill {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_select_sections_filters() {
        let selected = vec!["skills".to_string()];
        let picked = select_sections(content(), Some(&selected));
        assert!(picked.work_experience.is_empty());
        assert_eq!(picked.skills.len(), 1);
        assert_eq!(select_sections(content(), None), content());
    }

    #[test]
    fn test_import_option_parses_kebab_case() {
        let opt: ImportOption = serde_json::from_str(r#""import-profile""#).unwrap();
        assert_eq!(opt, ImportOption::ImportProfile);
        assert!(serde_json::from_str::<ImportOption>(r#""import_profile""#).is_err());
    }

    #[test]
    fn test_base_resume_has_no_job_and_default_order() {
        let resume = new_base_resume(
            Uuid::new_v4(),
            "Base".to_string(),
            "Engineer".to_string(),
            ContactInfo::default(),
            content(),
        );
        assert!(resume.is_base_resume);
        assert_eq!(resume.job_id, None);
        assert_eq!(resume.section_order, default_section_order());
    }

    #[test]
    fn test_copy_name() {
        assert_eq!(copy_name("Backend"), "Backend (Copy)");
    }
}
