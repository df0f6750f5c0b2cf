// All LLM prompt constants for the AI actions.
// Reuses cross-cutting fragments from llm_client::prompts.
// Templates use `{placeholder}` markers replaced before sending.

pub const RESUME_WRITER_ROLE: &str =
    "You are an expert technical resume writer who tailors resumes to specific job descriptions.";

pub const RESUME_REVIEWER_ROLE: &str =
    "You are a senior recruiter who reviews resumes and scores them honestly.";

pub const PARSER_ROLE: &str =
    "You are a precise parser that converts unstructured text into structured data.";

pub const COVER_LETTER_ROLE: &str =
    "You are a professional career writer who drafts concise, specific cover letters.";

pub const CHAT_SYSTEM: &str = "\
You are a helpful resume assistant. You are given the user's current resume as JSON. \
Answer questions about it, suggest concrete edits, and rewrite sections on request. \
Keep answers short and actionable. Never invent experience the user does not have.";

pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Tailor the following resume to the job below.

Rules:
- Reorder and rephrase bullet points to emphasise what the job asks for.
- Mirror the job's keywords where the resume genuinely supports them.
- Keep every employer, title, school, and date exactly as given.
- Keep the same number of entries per section. You may drop weak bullets.
{grounding_instruction}
{bullet_style}

Return a JSON object with this EXACT schema:
{
  "work_experience": [{"company": "", "position": "", "location": "", "date": "", "description": [""], "technologies": [""]}],
  "education": [{"school": "", "degree": "", "field": "", "location": "", "date": "", "gpa": "", "achievements": [""]}],
  "skills": [{"category": "", "items": [""]}],
  "projects": [{"name": "", "description": [""], "date": "", "technologies": [""], "url": "", "github_url": ""}]
}

JOB:
{job_json}

RESUME:
{resume_json}"#;

pub const WORK_POINTS_PROMPT_TEMPLATE: &str = r#"Write {num_points} resume bullet points for this role.

Position: {position}
Company: {company}
Technologies: {technologies}
Target role: {target_role}
Additional instructions: {custom_prompt}

{bullet_style}

Return a JSON object: {"points": ["..."]}"#;

pub const PROJECT_POINTS_PROMPT_TEMPLATE: &str = r#"Write {num_points} resume bullet points for this project.

Project: {name}
Technologies: {technologies}
Target role: {target_role}
Additional instructions: {custom_prompt}

{bullet_style}

Return a JSON object: {"points": ["..."]}"#;

pub const IMPROVE_EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Improve the bullet points of this work experience entry.
Keep company, position, location, and date unchanged.
Additional instructions: {custom_prompt}

{grounding_instruction}
{bullet_style}

Return the entry as JSON with the same schema:
{"company": "", "position": "", "location": "", "date": "", "description": [""], "technologies": [""]}

ENTRY:
{entry_json}"#;

pub const IMPROVE_PROJECT_PROMPT_TEMPLATE: &str = r#"Improve the description bullets of this project.
Keep name, date, and links unchanged.
Additional instructions: {custom_prompt}

{grounding_instruction}
{bullet_style}

Return the project as JSON with the same schema:
{"name": "", "description": [""], "date": "", "technologies": [""], "url": "", "github_url": ""}

PROJECT:
{entry_json}"#;

pub const SCORE_PROMPT_TEMPLATE: &str = r#"Score this resume from 0 to 100.
{job_context}

Score these categories, each 0-100, with one or two sentences of feedback:
- "impact": quantified, outcome-focused bullets
- "clarity": concise wording and consistent formatting
- "relevance": fit for the target role or job
- "completeness": contact info, dates, and all expected sections present
- "ats": keyword coverage and machine readability

Return a JSON object with this EXACT schema:
{
  "overall_score": 0,
  "categories": [{"name": "impact", "score": 0, "feedback": ""}],
  "suggestions": [""]
}

RESUME:
{resume_json}"#;

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the job below using only facts from the resume.
Three to four short paragraphs, no placeholders, no greeting line with a made-up name.
Additional instructions: {custom_prompt}

{grounding_instruction}

Return a JSON object: {"content": "..."}

JOB:
{job_json}

RESUME:
{resume_json}"#;

pub const TEXT_IMPORT_PROMPT_TEMPLATE: &str = r#"Extract structured resume data from the text below.
Only include information that is present in the text.

Return a JSON object with this EXACT schema (omit unknown optional fields):
{
  "contact": {"first_name": "", "last_name": "", "email": "", "phone_number": "", "location": "", "website": "", "linkedin_url": "", "github_url": ""},
  "sections": {
    "work_experience": [{"company": "", "position": "", "location": "", "date": "", "description": [""], "technologies": [""]}],
    "education": [{"school": "", "degree": "", "field": "", "location": "", "date": "", "gpa": "", "achievements": [""]}],
    "skills": [{"category": "", "items": [""]}],
    "projects": [{"name": "", "description": [""], "date": "", "technologies": [""], "url": "", "github_url": ""}]
  }
}

TEXT:
{text}"#;

pub const JOB_FORMAT_PROMPT_TEMPLATE: &str = r#"Extract a structured job listing from the text below.

work_location must be one of: "remote", "in_person", "hybrid", or null.
employment_type must be one of: "full_time", "part_time", "co_op", "internship", "contract", or null.
keywords: up to 15 skills or technologies the listing asks for.

Return a JSON object with this EXACT schema:
{
  "company_name": "",
  "position_title": "",
  "job_url": null,
  "description": "",
  "location": null,
  "salary_range": null,
  "keywords": [""],
  "work_location": null,
  "employment_type": null
}

TEXT:
{text}"#;
