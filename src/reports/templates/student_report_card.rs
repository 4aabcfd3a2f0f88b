//! Template for the student report card (ព្រឹត្តិបត្រពិន្ទុ).
//!
//! One term's subject grades, an attendance summary with the attendance rate,
//! teacher and principal comments, and signature blocks.

use serde::Deserialize;
use serde_json::Value;

use super::{document_shell, field_table, mapped, section, signature_blocks, string_or_number, text};
use crate::reports::common::{escape_html, format_grade_khmer, get_gender_khmer, to_khmer_digits};
use crate::reports::traits::{parse_payload, RenderedHtml, ReportTemplate, TemplateContext};
use crate::reports::types::ReportType;
use crate::reports::ReportError;

/// One subject line on the report card.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeRow {
    pub subject: String,
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub letter_grade: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

fn default_max_score() -> f64 {
    100.0
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

impl AttendanceSummary {
    /// Present days as a whole percentage of total days, e.g. "90%".
    /// `None` when no school days were recorded.
    pub fn rate(&self) -> Option<String> {
        if self.total == 0 {
            return None;
        }
        let pct = (f64::from(self.present) * 100.0 / f64::from(self.total)).round();
        Some(format!("{}%", pct as u32))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentReportCardData {
    pub student_id: String,
    pub student_name: String,
    #[serde(default)]
    pub student_name_latin: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub grade: String,
    #[serde(default)]
    pub class_section: Option<String>,
    pub school_year: String,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub grades: Vec<GradeRow>,
    #[serde(default)]
    pub attendance: AttendanceSummary,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub class_size: Option<u32>,
    #[serde(default)]
    pub teacher_comment: Option<String>,
    #[serde(default)]
    pub principal_comment: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub principal_name: Option<String>,
}

/// Khmer mention for a percentage score.
pub fn grade_mention(percentage: f64) -> (&'static str, &'static str) {
    match percentage {
        p if p >= 90.0 => ("A", "ល្អប្រសើរ"),
        p if p >= 80.0 => ("B", "ល្អណាស់"),
        p if p >= 70.0 => ("C", "ល្អ"),
        p if p >= 60.0 => ("D", "ល្អបង្គួរ"),
        p if p >= 50.0 => ("E", "មធ្យម"),
        _ => ("F", "ខ្សោយ"),
    }
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        let s = format!("{:.2}", score);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn percentage(score: f64, max: f64) -> f64 {
    if max > 0.0 {
        score * 100.0 / max
    } else {
        0.0
    }
}

pub struct StudentReportCardTemplate;

impl StudentReportCardTemplate {
    pub fn render_data(&self, data: &StudentReportCardData, ctx: &TemplateContext) -> RenderedHtml {
        let title = ReportType::StudentReportCard.metadata().title;

        let student_name = escape_html(&data.student_name);
        let summary = field_table(&[
            ("អត្តលេខសិស្ស", escape_html(&data.student_id)),
            ("ឈ្មោះសិស្ស", student_name),
            ("ឈ្មោះឡាតាំង", text(data.student_name_latin.as_deref())),
            ("ភេទ", mapped(data.gender.as_deref(), get_gender_khmer)),
            ("ថ្នាក់", escape_html(&format_grade_khmer(&data.grade))),
            ("ផ្នែក", text(data.class_section.as_deref())),
            ("ឆ្នាំសិក្សា", escape_html(&data.school_year)),
            ("ឆមាស", text(data.term.as_deref())),
        ]);

        let mut body = section("ព័ត៌មានសិស្ស", &summary);
        body.push_str(&section("លទ្ធផលសិក្សា", &self.grade_table(&data.grades)));
        body.push_str(&section("វត្តមាន", &self.attendance_table(&data.attendance)));

        let rank = match (data.rank, data.class_size) {
            (Some(rank), Some(size)) => format!(
                "{} / {}",
                to_khmer_digits(&rank.to_string()),
                to_khmer_digits(&size.to_string())
            ),
            (Some(rank), None) => to_khmer_digits(&rank.to_string()),
            _ => text(None),
        };
        let comments = field_table(&[
            ("ចំណាត់ថ្នាក់", rank),
            ("មតិគ្រូបន្ទុកថ្នាក់", text(data.teacher_comment.as_deref())),
            ("មតិនាយកសាលា", text(data.principal_comment.as_deref())),
        ]);
        body.push_str(&section("មតិយោបល់", &comments));

        body.push_str(&signature_blocks(&[
            ("គ្រូបន្ទុកថ្នាក់", data.teacher_name.as_deref()),
            ("នាយកសាលា", data.principal_name.as_deref()),
        ]));

        let identifier = match &data.student_name_latin {
            Some(latin) if !latin.trim().is_empty() => format!("{} {}", data.student_id, latin),
            _ => data.student_id.clone(),
        };

        RenderedHtml {
            html: document_shell(title, ctx, &body),
            identifier,
            title: title.to_string(),
        }
    }

    fn grade_table(&self, grades: &[GradeRow]) -> String {
        if grades.is_empty() {
            return format!("<p>{}</p>", text(None));
        }

        let mut html = String::from(
            "<table class=\"grid\">\n<tr><th>ល.រ</th><th>មុខវិជ្ជា</th><th>ពិន្ទុ</th><th>ពិន្ទុអតិបរមា</th><th>និទ្ទេស</th><th>សម្គាល់</th></tr>\n",
        );
        let mut total = 0.0;
        let mut total_max = 0.0;

        for (i, row) in grades.iter().enumerate() {
            total += row.score;
            total_max += row.max_score;
            let letter = match &row.letter_grade {
                Some(letter) if !letter.trim().is_empty() => escape_html(letter),
                _ => {
                    let (letter, mention) = grade_mention(percentage(row.score, row.max_score));
                    format!("{} ({})", letter, mention)
                }
            };
            html.push_str(&format!(
                "<tr><td class=\"num\">{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                escape_html(&row.subject),
                format_score(row.score),
                format_score(row.max_score),
                letter,
                text(row.remark.as_deref()),
            ));
        }

        let average = percentage(total, total_max);
        let (letter, mention) = grade_mention(average);
        html.push_str(&format!(
            "<tr><th colspan=\"2\">សរុប</th><th class=\"num\">{}</th><th class=\"num\">{}</th><th colspan=\"2\">{:.2}% {} ({})</th></tr>\n</table>",
            format_score(total),
            format_score(total_max),
            average,
            letter,
            mention,
        ));
        html
    }

    fn attendance_table(&self, attendance: &AttendanceSummary) -> String {
        format!(
            "<table class=\"grid\">\n<tr><th>ថ្ងៃសិក្សាសរុប</th><th>មានវត្តមាន</th><th>អវត្តមាន</th><th>មកយឺត</th><th>អត្រាវត្តមាន</th></tr>\n<tr><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n</table>",
            attendance.total,
            attendance.present,
            attendance.absent,
            attendance.late,
            attendance.rate().unwrap_or_else(|| text(None)),
        )
    }
}

impl ReportTemplate for StudentReportCardTemplate {
    fn report_type(&self) -> ReportType {
        ReportType::StudentReportCard
    }

    fn render(&self, payload: &Value, ctx: &TemplateContext) -> Result<RenderedHtml, ReportError> {
        let data: StudentReportCardData = parse_payload(self.report_type(), payload)?;
        Ok(self.render_data(&data, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> TemplateContext {
        TemplateContext::new(
            "វិទ្យាល័យព្រះស៊ីសុវត្ថិ",
            Utc.with_ymd_and_hms(2024, 3, 15, 2, 0, 0).unwrap(),
        )
    }

    fn payload() -> Value {
        json!({
            "studentId": "STU-2024-001",
            "studentName": "សុខ សុខា",
            "studentNameLatin": "Sok Sokha",
            "gender": "female",
            "grade": 9,
            "schoolYear": "2023-2024",
            "grades": [
                { "subject": "Mathematics", "score": 92 },
                { "subject": "Khmer Literature", "score": 78.5 },
                { "subject": "Physics", "score": 41, "remark": "needs support" }
            ],
            "attendance": { "total": 20, "present": 18, "absent": 1, "late": 1 }
        })
    }

    #[test]
    fn test_render_contains_rate_and_subjects() {
        let rendered = StudentReportCardTemplate.render(&payload(), &ctx()).unwrap();
        assert!(rendered.html.contains("90%"));
        for subject in ["Mathematics", "Khmer Literature", "Physics"] {
            assert!(rendered.html.contains(subject));
        }
        assert!(rendered.html.contains("ថ្នាក់ទី៩"));
        assert!(rendered.html.contains("ស្រី"));
        assert_eq!(rendered.identifier, "STU-2024-001 Sok Sokha");
    }

    #[test]
    fn test_render_is_deterministic() {
        let first = StudentReportCardTemplate.render(&payload(), &ctx()).unwrap();
        let second = StudentReportCardTemplate.render(&payload(), &ctx()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_optional_fields_use_placeholder() {
        let rendered = StudentReportCardTemplate.render(&payload(), &ctx()).unwrap();
        // no teacher comment, principal name, term, rank...
        assert!(rendered.html.contains("មិនមាន"));
        assert!(!rendered.html.contains("undefined"));
    }

    #[test]
    fn test_attendance_rate_without_days() {
        assert_eq!(AttendanceSummary::default().rate(), None);
        let summary = AttendanceSummary { total: 3, present: 2, absent: 1, late: 0 };
        assert_eq!(summary.rate().as_deref(), Some("67%"));
    }

    #[test]
    fn test_grade_mention_bands() {
        assert_eq!(grade_mention(95.0).0, "A");
        assert_eq!(grade_mention(50.0).0, "E");
        assert_eq!(grade_mention(49.9).0, "F");
    }

    #[test]
    fn test_invalid_payload() {
        let err = StudentReportCardTemplate
            .render(&json!({ "studentId": 7 }), &ctx())
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidPayload { report_type: ReportType::StudentReportCard, .. }
        ));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(92.0), "92");
        assert_eq!(format_score(78.5), "78.5");
        assert_eq!(format_score(66.667), "66.67");
    }
}
