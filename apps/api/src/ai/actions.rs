//! AI actions. Each is one prompt and one model call with a JSON response,
//! plus whatever pure post-processing keeps the result safe to store.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::prompts::*;
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, BULLET_STYLE, GROUNDING_INSTRUCTION};
use crate::llm_client::{ChatMessage, LlmClient, ModelTarget};
use crate::models::job::{JobDraft, JobRow};
use crate::models::profile::ContactInfo;
use crate::models::sections::{Project, SectionContent, WorkExperience};

pub const MAX_POINTS: u8 = 8;
pub const MAX_CHAT_TURNS: usize = 40;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulletPoints {
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CategoryScore {
    pub name: String,
    pub score: u32,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResumeScore {
    pub overall_score: u32,
    #[serde(default)]
    pub categories: Vec<CategoryScore>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ResumeScore {
    /// Models occasionally answer out of range; scores are stored as 0-100.
    pub fn clamped(mut self) -> Self {
        self.overall_score = self.overall_score.min(100);
        for category in &mut self.categories {
            category.score = category.score.min(100);
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoverLetter {
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ImportedProfile {
    pub contact: ContactInfo,
    pub sections: SectionContent,
}

/// Inputs for bullet generation on a work experience entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkPointsRequest {
    pub position: String,
    pub company: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub target_role: String,
    #[serde(default = "default_num_points")]
    pub num_points: u8,
    #[serde(default)]
    pub custom_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPointsRequest {
    pub name: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub target_role: String,
    #[serde(default = "default_num_points")]
    pub num_points: u8,
    #[serde(default)]
    pub custom_prompt: String,
}

fn default_num_points() -> u8 {
    3
}

fn llm_err(action: &str) -> impl Fn(crate::llm_client::LlmError) -> AppError + '_ {
    move |e| AppError::Llm(format!("{action} failed: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize prompt input: {e}")))
}

fn job_prompt_json(job: &JobRow) -> serde_json::Value {
    json!({
        "company_name": job.company_name,
        "position_title": job.position_title,
        "description": job.description,
        "keywords": job.keywords,
        "location": job.location,
    })
}

/// Rewrites the resume's sections for one job. Sections the model drops are kept as-is.
pub async fn tailor_resume_to_job(
    llm: &LlmClient,
    target: &ModelTarget,
    sections: &SectionContent,
    job: &JobRow,
) -> Result<SectionContent, AppError> {
    let prompt = TAILOR_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{bullet_style}", BULLET_STYLE)
        .replace("{job_json}", &to_json(&job_prompt_json(job))?)
        .replace("{resume_json}", &to_json(sections)?);

    let tailored: SectionContent = llm
        .call_json(target, &prompt, &json_system(RESUME_WRITER_ROLE))
        .await
        .map_err(llm_err("Resume tailoring"))?;

    Ok(apply_tailoring(sections, tailored))
}

pub fn apply_tailoring(base: &SectionContent, tailored: SectionContent) -> SectionContent {
    fn pick<T: Clone>(base: &[T], tailored: Vec<T>) -> Vec<T> {
        if tailored.is_empty() {
            base.to_vec()
        } else {
            tailored
        }
    }
    SectionContent {
        work_experience: pick(&base.work_experience, tailored.work_experience),
        education: pick(&base.education, tailored.education),
        skills: pick(&base.skills, tailored.skills),
        projects: pick(&base.projects, tailored.projects),
    }
}

pub async fn generate_work_experience_points(
    llm: &LlmClient,
    target: &ModelTarget,
    request: &WorkPointsRequest,
) -> Result<Vec<String>, AppError> {
    let num_points = clamp_points(request.num_points);
    let prompt = WORK_POINTS_PROMPT_TEMPLATE
        .replace("{num_points}", &num_points.to_string())
        .replace("{position}", &request.position)
        .replace("{company}", &request.company)
        .replace("{technologies}", &request.technologies.join(", "))
        .replace("{target_role}", &request.target_role)
        .replace("{custom_prompt}", &request.custom_prompt)
        .replace("{bullet_style}", BULLET_STYLE);

    let points: BulletPoints = llm
        .call_json(target, &prompt, &json_system(RESUME_WRITER_ROLE))
        .await
        .map_err(llm_err("Work experience generation"))?;
    Ok(clean_points(points.points, num_points))
}

pub async fn generate_project_points(
    llm: &LlmClient,
    target: &ModelTarget,
    request: &ProjectPointsRequest,
) -> Result<Vec<String>, AppError> {
    let num_points = clamp_points(request.num_points);
    let prompt = PROJECT_POINTS_PROMPT_TEMPLATE
        .replace("{num_points}", &num_points.to_string())
        .replace("{name}", &request.name)
        .replace("{technologies}", &request.technologies.join(", "))
        .replace("{target_role}", &request.target_role)
        .replace("{custom_prompt}", &request.custom_prompt)
        .replace("{bullet_style}", BULLET_STYLE);

    let points: BulletPoints = llm
        .call_json(target, &prompt, &json_system(RESUME_WRITER_ROLE))
        .await
        .map_err(llm_err("Project point generation"))?;
    Ok(clean_points(points.points, num_points))
}

pub async fn improve_work_experience(
    llm: &LlmClient,
    target: &ModelTarget,
    entry: &WorkExperience,
    custom_prompt: &str,
) -> Result<WorkExperience, AppError> {
    let prompt = IMPROVE_EXPERIENCE_PROMPT_TEMPLATE
        .replace("{custom_prompt}", custom_prompt)
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{bullet_style}", BULLET_STYLE)
        .replace("{entry_json}", &to_json(entry)?);

    let improved: WorkExperience = llm
        .call_json(target, &prompt, &json_system(RESUME_WRITER_ROLE))
        .await
        .map_err(llm_err("Work experience improvement"))?;

    // Identity fields are never the model's to change.
    Ok(WorkExperience {
        company: entry.company.clone(),
        position: entry.position.clone(),
        location: entry.location.clone(),
        date: entry.date.clone(),
        description: improved.description,
        technologies: if improved.technologies.is_empty() {
            entry.technologies.clone()
        } else {
            improved.technologies
        },
    })
}

pub async fn improve_project(
    llm: &LlmClient,
    target: &ModelTarget,
    project: &Project,
    custom_prompt: &str,
) -> Result<Project, AppError> {
    let prompt = IMPROVE_PROJECT_PROMPT_TEMPLATE
        .replace("{custom_prompt}", custom_prompt)
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{bullet_style}", BULLET_STYLE)
        .replace("{entry_json}", &to_json(project)?);

    let improved: Project = llm
        .call_json(target, &prompt, &json_system(RESUME_WRITER_ROLE))
        .await
        .map_err(llm_err("Project improvement"))?;

    Ok(Project {
        name: project.name.clone(),
        date: project.date.clone(),
        url: project.url.clone(),
        github_url: project.github_url.clone(),
        description: improved.description,
        technologies: if improved.technologies.is_empty() {
            project.technologies.clone()
        } else {
            improved.technologies
        },
    })
}

pub async fn score_resume(
    llm: &LlmClient,
    target: &ModelTarget,
    resume_json: &serde_json::Value,
    job: Option<&JobRow>,
) -> Result<ResumeScore, AppError> {
    let job_context = match job {
        Some(job) => format!(
            "Score relevance against this job:\n{}",
            to_json(&job_prompt_json(job))?
        ),
        None => "No job is attached; score relevance against the resume's target role.".to_string(),
    };
    let prompt = SCORE_PROMPT_TEMPLATE
        .replace("{job_context}", &job_context)
        .replace("{resume_json}", &to_json(resume_json)?);

    let score: ResumeScore = llm
        .call_json(target, &prompt, &json_system(RESUME_REVIEWER_ROLE))
        .await
        .map_err(llm_err("Resume scoring"))?;
    Ok(score.clamped())
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    target: &ModelTarget,
    resume_json: &serde_json::Value,
    job: &JobRow,
    custom_prompt: &str,
) -> Result<CoverLetter, AppError> {
    let prompt = COVER_LETTER_PROMPT_TEMPLATE
        .replace("{custom_prompt}", custom_prompt)
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{job_json}", &to_json(&job_prompt_json(job))?)
        .replace("{resume_json}", &to_json(resume_json)?);

    let letter: CoverLetter = llm
        .call_json(target, &prompt, &json_system(COVER_LETTER_ROLE))
        .await
        .map_err(llm_err("Cover letter generation"))?;

    if letter.content.trim().is_empty() {
        return Err(AppError::Llm("Cover letter came back empty".to_string()));
    }
    Ok(letter)
}

/// Multi-turn assistant over one resume. Keeps only the most recent turns.
pub async fn chat(
    llm: &LlmClient,
    target: &ModelTarget,
    resume_json: &serde_json::Value,
    messages: &[ChatMessage],
) -> Result<String, AppError> {
    let messages = trim_history(messages);
    if messages.is_empty() {
        return Err(AppError::Validation("messages cannot be empty".to_string()));
    }
    let system = format!("{CHAT_SYSTEM}\n\nCURRENT RESUME:\n{}", to_json(resume_json)?);
    let response = llm
        .chat(target, messages, &system)
        .await
        .map_err(llm_err("Chat"))?;
    Ok(response.text)
}

pub async fn text_import(
    llm: &LlmClient,
    target: &ModelTarget,
    text: &str,
) -> Result<ImportedProfile, AppError> {
    let prompt = TEXT_IMPORT_PROMPT_TEMPLATE.replace("{text}", text);
    llm.call_json(target, &prompt, &json_system(PARSER_ROLE))
        .await
        .map_err(llm_err("Resume text import"))
}

pub async fn format_job_listing(
    llm: &LlmClient,
    target: &ModelTarget,
    text: &str,
) -> Result<JobDraft, AppError> {
    let prompt = JOB_FORMAT_PROMPT_TEMPLATE.replace("{text}", text);
    let mut draft: JobDraft = llm
        .call_json(target, &prompt, &json_system(PARSER_ROLE))
        .await
        .map_err(llm_err("Job listing formatting"))?;
    draft.keywords = dedup_keywords(draft.keywords);
    Ok(draft)
}

fn clamp_points(requested: u8) -> u8 {
    requested.clamp(1, MAX_POINTS)
}

fn clean_points(points: Vec<String>, max: u8) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.trim().trim_start_matches(['-', '•', '*']).trim().to_string())
        .filter(|p| !p.is_empty())
        .take(max as usize)
        .collect()
}

fn trim_history(messages: &[ChatMessage]) -> &[ChatMessage] {
    let start = messages.len().saturating_sub(MAX_CHAT_TURNS);
    let mut window = &messages[start..];
    // Providers require the conversation to open with a user turn.
    while window.first().is_some_and(|m| m.role != "user") {
        window = &window[1..];
    }
    window
}

fn dedup_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .take(15)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::EmploymentType;
    use crate::models::sections::{Education, Skill};

    #[test]
    fn test_apply_tailoring_keeps_dropped_sections() {
        let base = SectionContent {
            education: vec![Education {
                school: "MIT".to_string(),
                ..Default::default()
            }],
            skills: vec![Skill {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string()],
            }],
            ..Default::default()
        };
        let tailored = SectionContent {
            skills: vec![Skill {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string(), "Go".to_string()],
            }],
            ..Default::default()
        };
        let merged = apply_tailoring(&base, tailored);
        assert_eq!(merged.education, base.education);
        assert_eq!(merged.skills[0].items.len(), 2);
    }

    #[test]
    fn test_clean_points_strips_bullets_and_limits() {
        let points = vec![
            "- Built a thing".to_string(),
            "  ".to_string(),
            "• Shipped another".to_string(),
            "Third".to_string(),
        ];
        assert_eq!(
            clean_points(points, 2),
            vec!["Built a thing".to_string(), "Shipped another".to_string()]
        );
    }

    #[test]
    fn test_clamp_points() {
        assert_eq!(clamp_points(0), 1);
        assert_eq!(clamp_points(3), 3);
        assert_eq!(clamp_points(50), MAX_POINTS);
    }

    #[test]
    fn test_score_is_clamped() {
        let score = ResumeScore {
            overall_score: 140,
            categories: vec![CategoryScore {
                name: "impact".to_string(),
                score: 101,
                feedback: String::new(),
            }],
            suggestions: vec![],
        }
        .clamped();
        assert_eq!(score.overall_score, 100);
        assert_eq!(score.categories[0].score, 100);
    }

    #[test]
    fn test_trim_history_starts_with_user_turn() {
        let mut messages = vec![ChatMessage {
            role: "assistant".to_string(),
            content: "hello".to_string(),
        }];
        messages.push(ChatMessage::user("rewrite my summary"));
        let window = trim_history(&messages);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role, "user");

        let long: Vec<ChatMessage> = (0..100).map(|i| ChatMessage::user(i.to_string())).collect();
        assert_eq!(trim_history(&long).len(), MAX_CHAT_TURNS);
    }

    #[test]
    fn test_job_draft_tolerates_unknown_enums() {
        let draft: JobDraft = serde_json::from_str(
            r#"{"company_name":"Acme","position_title":"Engineer","work_location":"on the moon","employment_type":"full_time"}"#,
        )
        .unwrap();
        assert_eq!(draft.work_location, None);
        assert_eq!(draft.employment_type, Some(EmploymentType::FullTime));
    }

    #[test]
    fn test_dedup_keywords_case_insensitive() {
        let keywords = vec!["Rust".to_string(), "rust".to_string(), " SQL ".to_string()];
        assert_eq!(dedup_keywords(keywords), vec!["Rust".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn test_imported_profile_defaults() {
        let imported: ImportedProfile =
            serde_json::from_str(r#"{"contact":{"first_name":"Lin"}}"#).unwrap();
        assert_eq!(imported.contact.first_name.as_deref(), Some("Lin"));
        assert!(imported.sections.is_empty());
    }
}
