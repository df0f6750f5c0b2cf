//! Document builder: renders a resume plus its style sheet into LaTeX source.
//!
//! Layout, line breaking, and pagination belong to the typesetting engine; this module
//! only emits markup with the style sheet's concrete point values.

use serde::Serialize;

use crate::models::profile::ContactInfo;
use crate::models::resume::ResumeRow;
use crate::models::sections::{SectionConfig, SectionConfigs, SectionContent};
use crate::pdf::settings::DocumentSettings;
use crate::pdf::styles::{SectionStyle, StyleSheet};

/// Everything that affects the rendered output. Also the input of the cache key.
#[derive(Debug, Clone, Serialize)]
pub struct RenderInput {
    pub contact: ContactInfo,
    pub target_role: String,
    pub sections: SectionContent,
    pub section_order: Vec<String>,
    pub section_configs: SectionConfigs,
    pub document_settings: DocumentSettings,
}

impl From<&ResumeRow> for RenderInput {
    fn from(resume: &ResumeRow) -> Self {
        Self {
            contact: resume.contact(),
            target_role: resume.target_role.clone(),
            sections: resume.sections(),
            section_order: resume.section_order.clone(),
            section_configs: resume.section_configs.0.clone(),
            document_settings: resume.document_settings.0.clone(),
        }
    }
}

pub fn build_document(input: &RenderInput, style: &StyleSheet) -> String {
    let page = &style.page;
    let mut doc = String::with_capacity(4096);

    doc.push_str("\\documentclass{article}\n");
    doc.push_str(&format!(
        "\\usepackage[paperwidth={}pt,paperheight={}pt,top={}pt,bottom={}pt,left={}pt,right={}pt]{{geometry}}\n",
        page.width_pt,
        page.height_pt,
        page.margin_top_pt,
        page.margin_bottom_pt,
        page.margin_left_pt,
        page.margin_right_pt
    ));
    doc.push_str("\\usepackage[T1]{fontenc}\n\\usepackage{enumitem}\n\\usepackage[hidelinks]{hyperref}\n");
    doc.push_str("\\pagestyle{empty}\n\\setlength{\\parindent}{0pt}\n");
    doc.push_str("\\begin{document}\n");
    doc.push_str(&format!(
        "\\fontsize{{{}pt}}{{{}pt}}\\selectfont\n",
        page.font_size_pt, page.line_height_pt
    ));

    write_header(&mut doc, input, style);

    for key in &input.section_order {
        let Some(section_style) = style.section(key) else {
            continue;
        };
        let config = input.section_configs.get(key).cloned().unwrap_or_default();
        if !config.visible {
            continue;
        }
        let body = section_body(key, &input.sections, &config, style);
        if body.is_empty() {
            continue;
        }
        write_section_heading(&mut doc, section_title(key), section_style);
        doc.push_str(&format!(
            "\\begin{{list}}{{}}{{\\leftmargin={}pt\\rightmargin={}pt\\itemsep={}pt\\topsep=0pt\\parsep=0pt}}\n",
            section_style.margin_horizontal_pt,
            section_style.margin_horizontal_pt,
            section_style.item_spacing_pt
        ));
        doc.push_str(&body);
        doc.push_str("\\end{list}\n");
        doc.push_str(&format!("\\vspace{{{}pt}}\n", section_style.margin_bottom_pt));
    }

    if let Some(footer) = &style.footer {
        doc.push_str(&format!(
            "\\vfill\n\\begin{{center}}\\rule{{{}pt}}{{0.4pt}}\\end{{center}}\n",
            footer.width_pt
        ));
    }

    doc.push_str("\\end{document}\n");
    doc
}

fn write_header(doc: &mut String, input: &RenderInput, style: &StyleSheet) {
    let contact = &input.contact;
    let name = [contact.first_name.as_deref(), contact.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    doc.push_str("\\begin{center}\n");
    if !name.is_empty() {
        let size = style.header.name_size_pt;
        doc.push_str(&format!(
            "{{\\fontsize{{{size}pt}}{{{}pt}}\\selectfont\\textbf{{{}}}}}\\\\[{}pt]\n",
            size * 1.2,
            escape_latex(&name),
            style.header.name_bottom_spacing_pt
        ));
    }

    let parts: Vec<String> = [
        contact.email.as_deref(),
        contact.phone_number.as_deref(),
        contact.location.as_deref(),
        contact.website.as_deref(),
        contact.linkedin_url.as_deref(),
        contact.github_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .map(escape_latex)
    .collect();

    if !parts.is_empty() {
        let size = style.header.contact_size_pt;
        doc.push_str(&format!(
            "{{\\fontsize{{{size}pt}}{{{}pt}}\\selectfont {}}}\n",
            size * 1.2,
            parts.join(" \\textbar{} ")
        ));
    }
    doc.push_str("\\end{center}\n");
}

fn write_section_heading(doc: &mut String, title: &str, style: &SectionStyle) {
    doc.push_str(&format!("\\vspace{{{}pt}}\n", style.margin_top_pt));
    doc.push_str(&format!(
        "{{\\fontsize{{{}pt}}{{{}pt}}\\selectfont\\textbf{{{}}}}}\\\\\n",
        style.heading_size_pt,
        style.heading_size_pt * 1.2,
        title
    ));
    if style.divider {
        doc.push_str("\\vspace{-4pt}\\rule{\\linewidth}{0.4pt}\n");
    }
}

fn section_title(key: &str) -> &'static str {
    match key {
        "work_experience" => "Experience",
        "education" => "Education",
        "skills" => "Skills",
        "projects" => "Projects",
        _ => "",
    }
}

fn section_body(
    key: &str,
    sections: &SectionContent,
    config: &SectionConfig,
    style: &StyleSheet,
) -> String {
    let limit = config.max_items.unwrap_or(usize::MAX);
    let mut body = String::new();
    let title = |text: &str, date: &str| {
        format!(
            "\\item {{\\fontsize{{{}pt}}{{{}pt}}\\selectfont\\textbf{{{}}}}}\\hfill{{\\fontsize{{{}pt}}{{{}pt}}\\selectfont {}}}\\\\\n",
            style.item.title_size_pt,
            style.item.title_size_pt * 1.2,
            text,
            style.item.date_size_pt,
            style.item.date_size_pt * 1.2,
            escape_latex(date)
        )
    };

    match key {
        "work_experience" => {
            for exp in sections.work_experience.iter().take(limit) {
                let heading = format!(
                    "{} -- {}",
                    escape_latex(&exp.position),
                    escape_latex(&exp.company)
                );
                body.push_str(&title(&heading, &exp.date));
                push_bullets(&mut body, &exp.description, style);
                if !exp.technologies.is_empty() {
                    body.push_str(&format!(
                        "\\textit{{{}}}\n",
                        escape_latex(&exp.technologies.join(", "))
                    ));
                }
            }
        }
        "education" => {
            for edu in sections.education.iter().take(limit) {
                let mut heading = escape_latex(&edu.school);
                if !edu.degree.is_empty() || !edu.field.is_empty() {
                    heading.push_str(&format!(
                        " -- {} {}",
                        escape_latex(&edu.degree),
                        escape_latex(&edu.field)
                    ));
                }
                body.push_str(&title(heading.trim_end(), &edu.date));
                if let Some(gpa) = edu.gpa.as_deref().filter(|g| !g.is_empty()) {
                    body.push_str(&format!("GPA: {}\\\\\n", escape_latex(gpa)));
                }
                push_bullets(&mut body, &edu.achievements, style);
            }
        }
        "skills" => {
            let grouped = config.style.as_deref() != Some("list");
            for skill in sections.skills.iter().take(limit) {
                let items = escape_latex(&skill.items.join(", "));
                if grouped && !skill.category.is_empty() {
                    body.push_str(&format!(
                        "\\item \\textbf{{{}:}} {}\n",
                        escape_latex(&skill.category),
                        items
                    ));
                } else {
                    body.push_str(&format!("\\item {items}\n"));
                }
            }
        }
        "projects" => {
            for project in sections.projects.iter().take(limit) {
                body.push_str(&title(
                    &escape_latex(&project.name),
                    project.date.as_deref().unwrap_or_default(),
                ));
                push_bullets(&mut body, &project.description, style);
                if !project.technologies.is_empty() {
                    body.push_str(&format!(
                        "\\textit{{{}}}\n",
                        escape_latex(&project.technologies.join(", "))
                    ));
                }
            }
        }
        _ => {}
    }

    body
}

fn push_bullets(body: &mut String, bullets: &[String], style: &StyleSheet) {
    let bullets: Vec<&String> = bullets.iter().filter(|b| !b.trim().is_empty()).collect();
    if bullets.is_empty() {
        return;
    }
    body.push_str(&format!(
        "\\begin{{itemize}}[leftmargin={}pt,itemsep=0pt,topsep=0pt]\n",
        style.item.bullet_indent_pt
    ));
    for bullet in bullets {
        body.push_str(&format!("\\item {}\n", escape_latex(bullet)));
    }
    body.push_str("\\end{itemize}\n");
}

/// Escapes LaTeX special characters in user-supplied text.
/// Line breaks collapse to one space: a blank line would end the paragraph inside
/// `\textbf{..}` and similar groups.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        let is_break = c == '\n' || c == '\r';
        if is_break {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
            continue;
        }
        in_break = false;
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sections::{default_section_order, Skill, WorkExperience};
    use crate::pdf::styles::build_style_sheet;

    fn sample_input() -> RenderInput {
        RenderInput {
            contact: ContactInfo {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
            target_role: "Engineer".to_string(),
            sections: SectionContent {
                work_experience: vec![WorkExperience {
                    company: "Analytical Engines & Co".to_string(),
                    position: "Programmer".to_string(),
                    date: "1842 - 1843".to_string(),
                    description: vec!["Cut runtime by 40%".to_string()],
                    ..Default::default()
                }],
                skills: vec![Skill {
                    category: "Languages".to_string(),
                    items: vec!["Rust".to_string(), "C#".to_string()],
                }],
                ..Default::default()
            },
            section_order: default_section_order(),
            section_configs: SectionConfigs::new(),
            document_settings: DocumentSettings::default(),
        }
    }

    #[test]
    fn test_escape_latex_specials() {
        assert_eq!(escape_latex("40% & $5"), "40\\% \\& \\$5");
        assert_eq!(escape_latex("a_b"), "a\\_b");
        assert_eq!(escape_latex("C#"), "C\\#");
    }

    #[test]
    fn test_line_breaks_never_end_a_paragraph() {
        assert_eq!(escape_latex("Acme\r\n\r\nLabs"), "Acme Labs");

        let mut input = sample_input();
        input.sections.work_experience[0].company = "Analytical\n\nEngines".to_string();
        input.sections.work_experience[0].position = "Lead\n\n\nProgrammer".to_string();
        let source = build_document(&input, &build_style_sheet(&input.document_settings));
        assert!(source.contains("Lead Programmer"));
        assert!(source.contains("Analytical Engines"));
    }

    #[test]
    fn test_document_contains_escaped_content_and_geometry() {
        let input = sample_input();
        let doc = build_document(&input, &build_style_sheet(&input.document_settings));
        assert!(doc.starts_with("\\documentclass{article}"));
        assert!(doc.contains("left=36pt"));
        assert!(doc.contains("Ada Lovelace"));
        assert!(doc.contains("Analytical Engines \\& Co"));
        assert!(doc.contains("Cut runtime by 40\\%"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn test_section_order_is_respected() {
        let mut input = sample_input();
        input.section_order = vec!["skills".to_string(), "work_experience".to_string()];
        let doc = build_document(&input, &build_style_sheet(&input.document_settings));
        let skills_at = doc.find("{Skills}").unwrap();
        let experience_at = doc.find("{Experience}").unwrap();
        assert!(skills_at < experience_at);
    }

    #[test]
    fn test_hidden_and_empty_sections_are_skipped() {
        let mut input = sample_input();
        input.section_configs.insert(
            "skills".to_string(),
            SectionConfig {
                visible: false,
                ..Default::default()
            },
        );
        let doc = build_document(&input, &build_style_sheet(&input.document_settings));
        assert!(!doc.contains("{Skills}"));
        assert!(!doc.contains("{Projects}"));
        assert!(doc.contains("{Experience}"));
    }
}
