//! Template for the class attendance register.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{document_shell, field_table, mapped, opt_string_or_number, section, signature_blocks, text};
use crate::reports::common::{
    escape_html, format_date_khmer, format_grade_khmer, get_attendance_status_khmer,
    get_gender_khmer, normalize_code,
};
use crate::reports::traits::{parse_payload, RenderedHtml, ReportTemplate, TemplateContext};
use crate::reports::types::ReportType;
use crate::reports::ReportError;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    pub status: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReportData {
    pub class_name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub grade: Option<String>,
    #[serde(default)]
    pub school_year: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceReportData {
    /// Record count per normalized status code, sorted by code.
    pub fn status_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts
                .entry(normalize_code(&record.status))
                .or_insert(0) += 1;
        }
        counts
    }
}

pub struct AttendanceReportTemplate;

impl AttendanceReportTemplate {
    pub fn render_data(&self, data: &AttendanceReportData, ctx: &TemplateContext) -> RenderedHtml {
        let title = ReportType::AttendanceReport.metadata().title;

        let overview = field_table(&[
            ("ថ្នាក់រៀន", escape_html(&data.class_name)),
            ("កម្រិតថ្នាក់", mapped(data.grade.as_deref(), format_grade_khmer)),
            ("ឆ្នាំសិក្សា", text(data.school_year.as_deref())),
            ("ចាប់ពី", mapped(data.start_date.as_deref(), format_date_khmer)),
            ("ដល់", mapped(data.end_date.as_deref(), format_date_khmer)),
            ("គ្រូបន្ទុកថ្នាក់", text(data.teacher_name.as_deref())),
        ]);

        let mut body = section("ព័ត៌មានថ្នាក់", &overview);
        body.push_str(&section("បញ្ជីវត្តមាន", &record_table(&data.records)));
        body.push_str(&section("សង្ខេប", &summary_table(data)));
        body.push_str(&signature_blocks(&[
            ("គ្រូបន្ទុកថ្នាក់", data.teacher_name.as_deref()),
            ("នាយកសាលា", None),
        ]));

        let identifier = match &data.start_date {
            Some(start) if !start.trim().is_empty() => format!("{} {}", data.class_name, start),
            _ => data.class_name.clone(),
        };

        RenderedHtml {
            html: document_shell(title, ctx, &body),
            identifier,
            title: title.to_string(),
        }
    }
}

fn record_table(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return format!("<p>{}</p>", text(None));
    }

    let mut html = String::from(
        "<table class=\"grid\">\n<tr><th>ល.រ</th><th>អត្តលេខ</th><th>ឈ្មោះ</th><th>ភេទ</th><th>កាលបរិច្ឆេទ</th><th>ស្ថានភាព</th><th>សម្គាល់</th></tr>\n",
    );
    for (i, record) in records.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td class=\"num\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            escape_html(&record.student_id),
            escape_html(&record.name),
            mapped(record.gender.as_deref(), get_gender_khmer),
            mapped(record.date.as_deref(), format_date_khmer),
            mapped(Some(record.status.as_str()), get_attendance_status_khmer),
            text(record.note.as_deref()),
        ));
    }
    html.push_str("</table>");
    html
}

fn summary_table(data: &AttendanceReportData) -> String {
    let counts = data.status_counts();
    let mut html = String::from("<table class=\"grid\">\n<tr><th>ស្ថានភាព</th><th>ចំនួន</th></tr>\n");
    for (status, count) in &counts {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"num\">{}</td></tr>\n",
            mapped(Some(status.as_str()), get_attendance_status_khmer),
            count
        ));
    }
    html.push_str(&format!(
        "<tr><th>សរុប</th><th class=\"num\">{}</th></tr>\n</table>",
        data.records.len()
    ));
    html
}

impl ReportTemplate for AttendanceReportTemplate {
    fn report_type(&self) -> ReportType {
        ReportType::AttendanceReport
    }

    fn render(&self, payload: &Value, ctx: &TemplateContext) -> Result<RenderedHtml, ReportError> {
        let data: AttendanceReportData = parse_payload(self.report_type(), payload)?;
        Ok(self.render_data(&data, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_register_counts_statuses() {
        let payload = json!({
            "className": "7A",
            "grade": 7,
            "startDate": "2024-01-08",
            "records": [
                { "studentId": "S1", "name": "Dara", "status": "present", "date": "2024-01-08" },
                { "studentId": "S2", "name": "Vanna", "status": "Absent" },
                { "studentId": "S3", "name": "Bopha", "status": "present" },
                { "studentId": "S4", "name": "Nita", "status": "field-trip" }
            ]
        });
        let ctx = TemplateContext::new("School", Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());

        let data: AttendanceReportData = serde_json::from_value(payload.clone()).unwrap();
        let counts = data.status_counts();
        assert_eq!(counts.get("present"), Some(&2));
        assert_eq!(counts.get("absent"), Some(&1));

        let rendered = AttendanceReportTemplate.render(&payload, &ctx).unwrap();
        assert!(rendered.html.contains("មានវត្តមាន"));
        assert!(rendered.html.contains("អវត្តមាន"));
        assert!(rendered.html.contains("field-trip"));
        assert!(rendered.html.contains("ថ្នាក់ទី៧"));
        assert_eq!(rendered.identifier, "7A 2024-01-08");
    }

    #[test]
    fn test_blank_status_uses_placeholder() {
        let payload = json!({
            "className": "8C",
            "records": [
                { "studentId": "S1", "name": "Dara", "status": "  " }
            ]
        });
        let ctx = TemplateContext::new("School", Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());

        let html = AttendanceReportTemplate.render(&payload, &ctx).unwrap().html;
        assert!(!html.contains("<td></td>"));
        assert!(html.contains("<tr><td>មិនមាន</td><td class=\"num\">1</td></tr>"));
    }

    #[test]
    fn test_status_spellings_share_one_count() {
        let data: AttendanceReportData = serde_json::from_value(json!({
            "className": "8C",
            "records": [
                { "studentId": "S1", "name": "A", "status": "field_trip" },
                { "studentId": "S2", "name": "B", "status": "Field Trip" },
                { "studentId": "S3", "name": "C", "status": "field-trip" }
            ]
        }))
        .unwrap();

        let counts = data.status_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("field-trip"), Some(&3));
    }
}
