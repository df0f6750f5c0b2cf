//! Document settings: the typography and spacing knobs a user tunes per resume.
//!
//! Stored as JSONB on `resumes.document_settings`. Every field has a default, so a
//! partial (or empty) JSON object deserializes to a complete settings record.
//! Sizes and spacings are in PostScript points unless noted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    // Page
    pub document_font_size: f32,
    /// Multiplier applied to the font size to get the baseline skip.
    pub document_line_height: f32,
    pub document_margin_vertical: f32,
    pub document_margin_horizontal: f32,

    // Header
    pub header_name_size: f32,
    pub header_name_bottom_spacing: f32,
    pub header_contact_size: f32,

    // Shared section typography
    pub section_heading_size: f32,
    pub item_title_size: f32,
    pub date_size: f32,
    pub bullet_indent: f32,
    pub show_section_dividers: bool,

    // Skills
    pub skills_margin_top: f32,
    pub skills_margin_bottom: f32,
    pub skills_margin_horizontal: f32,
    pub skills_item_spacing: f32,

    // Experience
    pub experience_margin_top: f32,
    pub experience_margin_bottom: f32,
    pub experience_margin_horizontal: f32,
    pub experience_item_spacing: f32,

    // Projects
    pub projects_margin_top: f32,
    pub projects_margin_bottom: f32,
    pub projects_margin_horizontal: f32,
    pub projects_item_spacing: f32,

    // Education
    pub education_margin_top: f32,
    pub education_margin_bottom: f32,
    pub education_margin_horizontal: f32,
    pub education_item_spacing: f32,

    // Footer
    pub show_footer: bool,
    /// Footer width as a percentage of the text width.
    pub footer_width: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            document_font_size: 10.0,
            document_line_height: 1.5,
            document_margin_vertical: 36.0,
            document_margin_horizontal: 36.0,
            header_name_size: 24.0,
            header_name_bottom_spacing: 24.0,
            header_contact_size: 10.0,
            section_heading_size: 12.0,
            item_title_size: 11.0,
            date_size: 9.0,
            bullet_indent: 10.0,
            show_section_dividers: true,
            skills_margin_top: 2.0,
            skills_margin_bottom: 2.0,
            skills_margin_horizontal: 0.0,
            skills_item_spacing: 2.0,
            experience_margin_top: 2.0,
            experience_margin_bottom: 2.0,
            experience_margin_horizontal: 0.0,
            experience_item_spacing: 4.0,
            projects_margin_top: 2.0,
            projects_margin_bottom: 2.0,
            projects_margin_horizontal: 0.0,
            projects_item_spacing: 4.0,
            education_margin_top: 2.0,
            education_margin_bottom: 2.0,
            education_margin_horizontal: 0.0,
            education_item_spacing: 4.0,
            show_footer: false,
            footer_width: 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let settings: DocumentSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, DocumentSettings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings: DocumentSettings =
            serde_json::from_str(r#"{"document_font_size": 11.5, "show_footer": true}"#).unwrap();
        assert_eq!(settings.document_font_size, 11.5);
        assert!(settings.show_footer);
        assert_eq!(settings.header_name_size, 24.0);
    }
}
