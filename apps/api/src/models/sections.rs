//! Resume/profile section items, stored as JSONB arrays on both `profiles` and `resumes`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub date: String,
    pub description: Vec<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub location: Option<String>,
    pub date: String,
    pub gpa: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: Vec<String>,
    pub date: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
    pub github_url: Option<String>,
}

/// The four content sections shared by profiles and resumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionContent {
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
}

impl SectionContent {
    /// Appends `other`'s items, skipping ones already present verbatim.
    pub fn merge(&mut self, other: SectionContent) {
        append_unique(&mut self.work_experience, other.work_experience);
        append_unique(&mut self.education, other.education);
        append_unique(&mut self.skills, other.skills);
        append_unique(&mut self.projects, other.projects);
    }

    pub fn is_empty(&self) -> bool {
        self.work_experience.is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
            && self.projects.is_empty()
    }
}

fn append_unique<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Section keys in their default render order.
pub const DEFAULT_SECTION_ORDER: [&str; 4] = ["work_experience", "education", "skills", "projects"];

/// Per-section display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub visible: bool,
    pub max_items: Option<usize>,
    /// Skills only: "grouped" (category: items) or "list".
    pub style: Option<String>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            visible: true,
            max_items: None,
            style: None,
        }
    }
}

pub type SectionConfigs = BTreeMap<String, SectionConfig>;

/// Validates a requested section order: only known keys, no duplicates.
/// Known sections missing from the request are appended in default order.
pub fn normalize_section_order(requested: &[String]) -> Result<Vec<String>, String> {
    let mut order: Vec<String> = Vec::with_capacity(DEFAULT_SECTION_ORDER.len());
    for key in requested {
        if !DEFAULT_SECTION_ORDER.contains(&key.as_str()) {
            return Err(format!("Unknown section '{key}'"));
        }
        if order.contains(key) {
            return Err(format!("Section '{key}' listed more than once"));
        }
        order.push(key.clone());
    }
    for key in DEFAULT_SECTION_ORDER {
        if !order.iter().any(|k| k == key) {
            order.push(key.to_string());
        }
    }
    Ok(order)
}

pub fn default_section_order() -> Vec<String> {
    DEFAULT_SECTION_ORDER.iter().map(|s| s.to_string()).collect()
}
