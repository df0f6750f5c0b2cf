//! Style sheet compiler: turns `DocumentSettings` into concrete point values.
//!
//! Pure function, no I/O. Out-of-range settings are clamped so a bad value in the
//! database never produces an unrenderable document.

use serde::{Deserialize, Serialize};

use crate::pdf::settings::DocumentSettings;

/// US letter, in points.
pub const PAGE_WIDTH_PT: f32 = 612.0;
pub const PAGE_HEIGHT_PT: f32 = 792.0;

const FONT_SIZE_RANGE: (f32, f32) = (6.0, 20.0);
const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 3.0);
const MARGIN_RANGE: (f32, f32) = (0.0, 144.0);
const NAME_SIZE_RANGE: (f32, f32) = (10.0, 48.0);
const SPACING_RANGE: (f32, f32) = (0.0, 72.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStyle {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
    pub margin_left_pt: f32,
    pub margin_right_pt: f32,
    pub font_size_pt: f32,
    pub line_height_pt: f32,
}

impl PageStyle {
    pub fn text_width_pt(&self) -> f32 {
        self.width_pt - self.margin_left_pt - self.margin_right_pt
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderStyle {
    pub name_size_pt: f32,
    pub name_bottom_spacing_pt: f32,
    pub contact_size_pt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStyle {
    pub heading_size_pt: f32,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
    pub margin_horizontal_pt: f32,
    pub item_spacing_pt: f32,
    pub divider: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    pub title_size_pt: f32,
    pub date_size_pt: f32,
    pub bullet_indent_pt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterStyle {
    pub width_pt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub page: PageStyle,
    pub header: HeaderStyle,
    pub work_experience: SectionStyle,
    pub education: SectionStyle,
    pub skills: SectionStyle,
    pub projects: SectionStyle,
    pub item: ItemStyle,
    pub footer: Option<FooterStyle>,
}

impl StyleSheet {
    /// Looks up the style for a section key from `DEFAULT_SECTION_ORDER`.
    pub fn section(&self, key: &str) -> Option<&SectionStyle> {
        match key {
            "work_experience" => Some(&self.work_experience),
            "education" => Some(&self.education),
            "skills" => Some(&self.skills),
            "projects" => Some(&self.projects),
            _ => None,
        }
    }
}

pub fn build_style_sheet(settings: &DocumentSettings) -> StyleSheet {
    let font_size = clamp(settings.document_font_size, FONT_SIZE_RANGE);
    let line_height = clamp(settings.document_line_height, LINE_HEIGHT_RANGE);
    let margin_v = clamp(settings.document_margin_vertical, MARGIN_RANGE);
    let margin_h = clamp(settings.document_margin_horizontal, MARGIN_RANGE);

    let page = PageStyle {
        width_pt: PAGE_WIDTH_PT,
        height_pt: PAGE_HEIGHT_PT,
        margin_top_pt: margin_v,
        margin_bottom_pt: margin_v,
        margin_left_pt: margin_h,
        margin_right_pt: margin_h,
        font_size_pt: font_size,
        line_height_pt: round2(font_size * line_height),
    };

    let heading_size = clamp(settings.section_heading_size, FONT_SIZE_RANGE);
    let divider = settings.show_section_dividers;
    let section = |top: f32, bottom: f32, horizontal: f32, spacing: f32| SectionStyle {
        heading_size_pt: heading_size,
        margin_top_pt: clamp(top, SPACING_RANGE),
        margin_bottom_pt: clamp(bottom, SPACING_RANGE),
        margin_horizontal_pt: clamp(horizontal, SPACING_RANGE),
        item_spacing_pt: clamp(spacing, SPACING_RANGE),
        divider,
    };

    let footer = settings.show_footer.then(|| FooterStyle {
        width_pt: round2(page.text_width_pt() * settings.footer_width.clamp(10.0, 100.0) / 100.0),
    });

    StyleSheet {
        header: HeaderStyle {
            name_size_pt: clamp(settings.header_name_size, NAME_SIZE_RANGE),
            name_bottom_spacing_pt: clamp(settings.header_name_bottom_spacing, SPACING_RANGE),
            contact_size_pt: clamp(settings.header_contact_size, FONT_SIZE_RANGE),
        },
        work_experience: section(
            settings.experience_margin_top,
            settings.experience_margin_bottom,
            settings.experience_margin_horizontal,
            settings.experience_item_spacing,
        ),
        education: section(
            settings.education_margin_top,
            settings.education_margin_bottom,
            settings.education_margin_horizontal,
            settings.education_item_spacing,
        ),
        skills: section(
            settings.skills_margin_top,
            settings.skills_margin_bottom,
            settings.skills_margin_horizontal,
            settings.skills_item_spacing,
        ),
        projects: section(
            settings.projects_margin_top,
            settings.projects_margin_bottom,
            settings.projects_margin_horizontal,
            settings.projects_item_spacing,
        ),
        item: ItemStyle {
            title_size_pt: clamp(settings.item_title_size, FONT_SIZE_RANGE),
            date_size_pt: clamp(settings.date_size, FONT_SIZE_RANGE),
            bullet_indent_pt: clamp(settings.bullet_indent, SPACING_RANGE),
        },
        footer,
        page,
    }
}

/// NaN falls back to the lower bound.
fn clamp(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile_to_expected_page() {
        let sheet = build_style_sheet(&DocumentSettings::default());
        assert_eq!(sheet.page.font_size_pt, 10.0);
        assert_eq!(sheet.page.line_height_pt, 15.0);
        assert_eq!(sheet.page.margin_left_pt, 36.0);
        assert_eq!(sheet.page.text_width_pt(), 540.0);
        assert!(sheet.footer.is_none());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings = DocumentSettings {
            document_font_size: 200.0,
            document_margin_horizontal: -5.0,
            experience_item_spacing: f32::NAN,
            ..Default::default()
        };
        let sheet = build_style_sheet(&settings);
        assert_eq!(sheet.page.font_size_pt, 20.0);
        assert_eq!(sheet.page.margin_left_pt, 0.0);
        assert_eq!(sheet.work_experience.item_spacing_pt, 0.0);
    }

    #[test]
    fn test_footer_width_is_fraction_of_text_width() {
        let settings = DocumentSettings {
            show_footer: true,
            footer_width: 50.0,
            ..Default::default()
        };
        let sheet = build_style_sheet(&settings);
        assert_eq!(sheet.footer, Some(FooterStyle { width_pt: 270.0 }));
    }

    #[test]
    fn test_section_settings_flow_to_their_own_section() {
        let settings = DocumentSettings {
            projects_margin_top: 12.0,
            ..Default::default()
        };
        let sheet = build_style_sheet(&settings);
        assert_eq!(sheet.section("projects").unwrap().margin_top_pt, 12.0);
        assert_eq!(sheet.section("education").unwrap().margin_top_pt, 2.0);
        assert!(sheet.section("hobbies").is_none());
    }
}
