//! crates/nutrifit_core/src/layout.rs
//!
//! Page layout for generated reports, independent of any PDF library.
//!
//! Lines are placed top-down at a fixed line height. Before every line the cursor is
//! checked against the bottom threshold and a new page is started when it has crossed
//! it, so a line is never split across pages. There is no keep-with-next rule: a
//! heading can end up alone at the bottom of a page. Text is never word-wrapped;
//! over-long lines simply run past the right edge.

use crate::domain::{AnalysisReport, EvidenceItem, HabitItem, PersonalizedNutrition};

/// US Letter, in PDF points.
pub const LETTER_WIDTH_PT: f64 = 612.0;
pub const LETTER_HEIGHT_PT: f64 = 792.0;

pub const REPORT_TITLE: &str = "NutriFit AI - Structured Health Report";
pub const RAW_REPORT_TITLE: &str = "NutriFit AI Report";

pub const BULLET: &str = "- ";
const PLACEHOLDER: &str = "N/A";

//=========================================================================================
// Geometry and styles
//=========================================================================================

/// Fixed page geometry. All values are PDF points measured from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    /// Baseline of the first line on every page.
    pub top: f64,
    /// A line whose baseline would fall below this starts a new page.
    pub bottom: f64,
    pub line_height: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: LETTER_WIDTH_PT,
            height: LETTER_HEIGHT_PT,
            margin_left: 40.0,
            top: LETTER_HEIGHT_PT - 50.0,
            bottom: 50.0,
            line_height: 14.0,
        }
    }
}

impl PageGeometry {
    /// How many lines fit on one page.
    pub fn lines_per_page(&self) -> usize {
        if self.top < self.bottom {
            return 1;
        }
        ((self.top - self.bottom) / self.line_height).floor() as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Heading,
    Body,
}

impl LineStyle {
    pub fn font_size(self) -> f64 {
        match self {
            LineStyle::Title => 16.0,
            LineStyle::Heading => 12.0,
            LineStyle::Body => 10.0,
        }
    }

    pub fn is_bold(self) -> bool {
        !matches!(self, LineStyle::Body)
    }
}

//=========================================================================================
// Layout output
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: LineStyle,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    pub lines: Vec<PlacedLine>,
}

/// A fully paginated document, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<LayoutPage>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All placed lines in drawing order.
    pub fn lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    /// Finds the page index holding the first line with exactly this text.
    pub fn page_of(&self, text: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.lines.iter().any(|line| line.text == text))
    }
}

//=========================================================================================
// Cursor
//=========================================================================================

struct PageCursor {
    geometry: PageGeometry,
    pages: Vec<LayoutPage>,
    y: f64,
}

impl PageCursor {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![LayoutPage::default()],
            y: geometry.top,
        }
    }

    fn emit(&mut self, text: impl Into<String>, style: LineStyle) {
        if self.y < self.geometry.bottom {
            self.pages.push(LayoutPage::default());
            self.y = self.geometry.top;
        }
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text: text.into(),
                style,
                x: self.geometry.margin_left,
                y: self.y,
            });
        }
        self.y -= self.geometry.line_height;
    }

    fn blank(&mut self) {
        self.emit(String::new(), LineStyle::Body);
    }

    fn body_lines(&mut self, text: &str) {
        for line in text.split('\n') {
            self.emit(line, LineStyle::Body);
        }
    }

    fn finish(self, title: &str) -> ReportLayout {
        ReportLayout {
            title: title.to_string(),
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

//=========================================================================================
// Document builders
//=========================================================================================

/// Lays out a structured report: title, summary, the non-empty itemized sections and
/// the personalized nutrition section.
pub fn layout_report(report: &AnalysisReport, geometry: PageGeometry) -> ReportLayout {
    let mut cursor = PageCursor::new(geometry);

    cursor.emit(REPORT_TITLE, LineStyle::Title);
    cursor.blank();
    cursor.emit("Summary", LineStyle::Heading);
    cursor.body_lines(&report.summary);

    if !report.key_health_concerns.is_empty() {
        cursor.blank();
        cursor.emit("Key Health Concerns", LineStyle::Heading);
        for concern in &report.key_health_concerns {
            cursor.emit(evidence_line(concern), LineStyle::Body);
        }
    }

    if !report.dietary_habits.is_empty() {
        cursor.blank();
        cursor.emit("Dietary Habits", LineStyle::Heading);
        for habit in &report.dietary_habits {
            cursor.emit(habit_line(habit), LineStyle::Body);
        }
    }

    if !report.suggested_improvements.is_empty() {
        cursor.blank();
        cursor.emit("Suggested Improvements", LineStyle::Heading);
        for improvement in &report.suggested_improvements {
            cursor.emit(format!("{}{}", BULLET, improvement), LineStyle::Body);
        }
    }

    cursor.blank();
    cursor.emit("Personalized Nutrition", LineStyle::Heading);
    nutrition_lines(&mut cursor, &report.personalized_nutrition);

    cursor.finish(REPORT_TITLE)
}

/// Lays out unstructured text verbatim, one line per newline-separated segment.
pub fn layout_text(text: &str, geometry: PageGeometry) -> ReportLayout {
    let mut cursor = PageCursor::new(geometry);
    cursor.body_lines(text);
    cursor.finish(RAW_REPORT_TITLE)
}

fn nutrition_lines(cursor: &mut PageCursor, nutrition: &PersonalizedNutrition) {
    let calories = nutrition.calorie_target.as_deref().unwrap_or(PLACEHOLDER);
    cursor.emit(format!("Calorie target: {}", calories), LineStyle::Body);

    let split = &nutrition.macro_split;
    cursor.emit(
        format!(
            "Macro split: Protein {} | Carbs {} | Fat {}",
            percent(split.protein_pct),
            percent(split.carb_pct),
            percent(split.fat_pct)
        ),
        LineStyle::Body,
    );

    if let Some(litres) = nutrition.hydration_l_per_day {
        cursor.emit(format!("Hydration: {} L/day", litres), LineStyle::Body);
    }

    if !nutrition.sample_meal_plan.is_empty() {
        cursor.emit("Sample meal plan:", LineStyle::Body);
        for meal in &nutrition.sample_meal_plan {
            cursor.emit(format!("{}{}", BULLET, meal), LineStyle::Body);
        }
    }

    if !nutrition.supplements.is_empty() {
        cursor.emit(
            format!("Supplements: {}", nutrition.supplements.join(", ")),
            LineStyle::Body,
        );
    }
}

fn evidence_line(item: &EvidenceItem) -> String {
    labelled_line(&item.label, &item.evidence, item.confidence.value())
}

fn habit_line(item: &HabitItem) -> String {
    labelled_line(&item.label, &item.details, item.confidence.value())
}

fn labelled_line(label: &str, detail: &str, confidence: f64) -> String {
    if detail.is_empty() {
        format!("{}{} (confidence {:.2})", BULLET, label, confidence)
    } else {
        format!("{}{}: {} (confidence {:.2})", BULLET, label, detail, confidence)
    }
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{}%", pct),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, MacroSplit};

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn texts(layout: &ReportLayout) -> Vec<&str> {
        layout.lines().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn letter_page_holds_fifty_lines() {
        assert_eq!(PageGeometry::default().lines_per_page(), 50);
    }

    #[test]
    fn raw_text_paginates_to_ceiling_of_lines_over_capacity() {
        let geometry = PageGeometry::default();
        let capacity = geometry.lines_per_page();

        for count in [1, capacity - 1, capacity, capacity + 1, 3 * capacity + 7] {
            let layout = layout_text(&numbered_lines(count), geometry);
            assert_eq!(
                layout.page_count(),
                count.div_ceil(capacity),
                "{} lines",
                count
            );
        }
    }

    #[test]
    fn small_geometry_paginates_the_same_way() {
        let geometry = PageGeometry {
            top: 100.0,
            bottom: 50.0,
            line_height: 10.0,
            ..PageGeometry::default()
        };
        assert_eq!(geometry.lines_per_page(), 6);

        let layout = layout_text(&numbered_lines(13), geometry);
        let per_page: Vec<usize> = layout.pages.iter().map(|page| page.lines.len()).collect();
        assert_eq!(per_page, vec![6, 6, 1]);
    }

    #[test]
    fn every_line_is_placed_whole_and_above_the_bottom_threshold() {
        let geometry = PageGeometry::default();
        let layout = layout_text(&numbered_lines(140), geometry);

        let expected: Vec<String> = (1..=140).map(|i| format!("line {}", i)).collect();
        assert_eq!(texts(&layout), expected);
        for page in &layout.pages {
            assert_eq!(page.lines.first().map(|line| line.y), Some(geometry.top));
            assert!(page.lines.iter().all(|line| line.y >= geometry.bottom));
            assert!(page.lines.iter().all(|line| line.x == geometry.margin_left));
        }
    }

    #[test]
    fn long_lines_are_not_wrapped() {
        let long_line = "x".repeat(600);
        let layout = layout_text(&long_line, PageGeometry::default());

        assert_eq!(texts(&layout), vec![long_line.as_str()]);
    }

    #[test]
    fn raw_text_splits_only_on_newlines() {
        let layout = layout_text("first\n\nthird line, with words\n", PageGeometry::default());
        assert_eq!(texts(&layout), vec!["first", "", "third line, with words", ""]);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let report = AnalysisReport {
            summary: "Short call.".to_string(),
            key_health_concerns: vec![EvidenceItem {
                label: "Anaemia".to_string(),
                evidence: "Low iron reported".to_string(),
                confidence: Confidence::new(0.75),
            }],
            ..AnalysisReport::default()
        };
        let layout = layout_report(&report, PageGeometry::default());
        let lines = texts(&layout);

        assert!(lines.contains(&"Key Health Concerns"));
        assert!(lines.contains(&"- Anaemia: Low iron reported (confidence 0.75)"));
        assert!(!lines.contains(&"Dietary Habits"));
        assert!(!lines.contains(&"Suggested Improvements"));
        assert!(lines.contains(&"Personalized Nutrition"));
    }

    #[test]
    fn sections_follow_the_documented_order() {
        let report = AnalysisReport {
            summary: "Line one\nLine two".to_string(),
            key_health_concerns: vec![EvidenceItem {
                label: "Reflux".to_string(),
                ..EvidenceItem::default()
            }],
            dietary_habits: vec![HabitItem {
                label: "Skips breakfast".to_string(),
                details: "Most weekdays".to_string(),
                confidence: Confidence::new(0.9),
            }],
            suggested_improvements: vec!["Eat breakfast".to_string()],
            ..AnalysisReport::default()
        };
        let layout = layout_report(&report, PageGeometry::default());

        assert_eq!(
            texts(&layout),
            vec![
                REPORT_TITLE,
                "",
                "Summary",
                "Line one",
                "Line two",
                "",
                "Key Health Concerns",
                "- Reflux (confidence 0.00)",
                "",
                "Dietary Habits",
                "- Skips breakfast: Most weekdays (confidence 0.90)",
                "",
                "Suggested Improvements",
                "- Eat breakfast",
                "",
                "Personalized Nutrition",
                "Calorie target: N/A",
                "Macro split: Protein N/A | Carbs N/A | Fat N/A",
            ]
        );
        assert_eq!(layout.pages[0].lines[0].style, LineStyle::Title);
        assert_eq!(layout.pages[0].lines[2].style, LineStyle::Heading);
    }

    #[test]
    fn nutrition_section_includes_optional_lines_when_present() {
        let report = AnalysisReport {
            personalized_nutrition: PersonalizedNutrition {
                calorie_target: Some("1800 kcal".to_string()),
                macro_split: MacroSplit {
                    protein_pct: Some(30.0),
                    carb_pct: Some(45.0),
                    fat_pct: None,
                },
                sample_meal_plan: vec!["Oats with berries".to_string(), "Lentil soup".to_string()],
                hydration_l_per_day: Some(2.5),
                supplements: vec!["Vitamin D".to_string(), "Omega-3".to_string()],
            },
            ..AnalysisReport::default()
        };
        let layout = layout_report(&report, PageGeometry::default());
        let lines = texts(&layout);
        let nutrition = &lines[lines.iter().position(|l| *l == "Personalized Nutrition").unwrap()..];

        assert_eq!(
            nutrition,
            &[
                "Personalized Nutrition",
                "Calorie target: 1800 kcal",
                "Macro split: Protein 30% | Carbs 45% | Fat N/A",
                "Hydration: 2.5 L/day",
                "Sample meal plan:",
                "- Oats with berries",
                "- Lentil soup",
                "Supplements: Vitamin D, Omega-3",
            ]
        );
    }

    #[test]
    fn heading_can_be_orphaned_at_page_bottom() {
        let geometry = PageGeometry {
            top: 100.0,
            bottom: 80.0,
            line_height: 10.0,
            ..PageGeometry::default()
        };
        let report = AnalysisReport {
            summary: "Body of the summary".to_string(),
            ..AnalysisReport::default()
        };
        let layout = layout_report(&report, geometry);

        assert_eq!(layout.page_of("Summary"), Some(0));
        assert_eq!(layout.page_of("Body of the summary"), Some(1));
    }
}
