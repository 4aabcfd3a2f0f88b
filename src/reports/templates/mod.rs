//! HTML templates, one module per implemented report type, plus the shared
//! document layout they all render into.

pub mod attendance_report;
pub mod student_registration;
pub mod student_report_card;

pub use attendance_report::{AttendanceRecord, AttendanceReportData, AttendanceReportTemplate};
pub use student_registration::{
    GuardianInfo, StudentRegistrationData, StudentRegistrationTemplate,
};
pub use student_report_card::{
    AttendanceSummary, GradeRow, StudentReportCardData, StudentReportCardTemplate,
};

use chrono::FixedOffset;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::common::{escape_html, format_khmer_date, or_placeholder};
use super::traits::TemplateContext;

/// Cambodia is UTC+7 year round.
const LOCAL_OFFSET_SECS: i32 = 7 * 3600;

const STYLESHEET: &str = r#"
@font-face {
  font-family: 'Khmer Report';
  src: local('Khmer OS Battambang'), local('Battambang'), local('Noto Sans Khmer');
  font-weight: 400;
}
@font-face {
  font-family: 'Khmer Report Title';
  src: local('Khmer OS Muol Light'), local('Moul'), local('Noto Serif Khmer');
  font-weight: 400;
}
* { box-sizing: border-box; }
body {
  font-family: 'Khmer Report', 'Battambang', 'Noto Sans Khmer', sans-serif;
  font-size: 12px;
  line-height: 1.7;
  color: #1f2933;
  margin: 0;
}
.kingdom { text-align: center; font-family: 'Khmer Report Title', 'Moul', serif; }
.kingdom .motto { font-size: 11px; }
.institution { font-weight: 700; font-size: 14px; margin-top: 8px; }
h1.title {
  text-align: center;
  font-family: 'Khmer Report Title', 'Moul', serif;
  font-size: 16px;
  font-weight: 400;
  margin: 16px 0;
}
section {
  border: 1px solid #9aa5b1;
  border-radius: 4px;
  padding: 8px 12px;
  margin-bottom: 12px;
  page-break-inside: avoid;
}
section h2 {
  font-size: 13px;
  margin: 0 0 6px;
  padding-bottom: 4px;
  border-bottom: 1px solid #cbd2d9;
}
table { width: 100%; border-collapse: collapse; }
table.fields td { padding: 2px 4px; vertical-align: top; }
table.fields td.label { width: 38%; color: #52606d; }
table.grid th, table.grid td { border: 1px solid #9aa5b1; padding: 4px 6px; }
table.grid th { background: #e4e7eb; }
td.num { text-align: right; }
.signatures { display: flex; justify-content: space-between; margin-top: 24px; }
.signature { width: 40%; text-align: center; }
.signature .line { margin-top: 56px; border-top: 1px dotted #52606d; }
footer.generated { margin-top: 16px; font-size: 10px; color: #7b8794; text-align: right; }
"#;

/// Wrap a rendered body in the full document: head, fonts, institution header
/// and a footer carrying the injected generation date.
pub fn document_shell(title: &str, ctx: &TemplateContext, body: &str) -> String {
    let local = FixedOffset::east_opt(LOCAL_OFFSET_SECS)
        .map(|offset| ctx.generated_at.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| ctx.generated_at.date_naive());

    format!(
        r#"<!DOCTYPE html>
<html lang="km">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{styles}</style>
</head>
<body>
<header class="kingdom">
  <div>ព្រះរាជាណាចក្រកម្ពុជា</div>
  <div class="motto">ជាតិ សាសនា ព្រះមហាក្សត្រ</div>
  <div class="institution">{institution}</div>
</header>
<h1 class="title">{title}</h1>
{body}
<footer class="generated">កាលបរិច្ឆេទបង្កើត៖ {generated}</footer>
</body>
</html>
"#,
        title = escape_html(title),
        styles = STYLESHEET,
        institution = escape_html(or_placeholder(Some(&ctx.institution_name))),
        body = body,
        generated = format_khmer_date(local),
    )
}

/// Titled, bordered section.
pub fn section(heading: &str, inner: &str) -> String {
    format!(
        "<section>\n<h2>{}</h2>\n{}\n</section>\n",
        escape_html(heading),
        inner
    )
}

/// Two-column label/value table. Values are expected to be escaped already.
pub fn field_table(rows: &[(&str, String)]) -> String {
    let mut html = String::from("<table class=\"fields\">\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "<tr><td class=\"label\">{}</td><td>{}</td></tr>\n",
            escape_html(label),
            value
        ));
    }
    html.push_str("</table>");
    html
}

/// Escaped value, or the placeholder label when missing.
pub fn text(value: Option<&str>) -> String {
    escape_html(or_placeholder(value))
}

/// Apply a mapper to an optional value, falling back to the placeholder.
pub fn mapped(value: Option<&str>, mapper: impl Fn(&str) -> String) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => escape_html(&mapper(v)),
        _ => text(None),
    }
}

/// Signature blocks, left to right.
pub fn signature_blocks(signers: &[(&str, Option<&str>)]) -> String {
    let mut html = String::from("<div class=\"signatures\">\n");
    for (role, name) in signers {
        html.push_str(&format!(
            "<div class=\"signature\"><div>{}</div><div class=\"line\"></div><div>{}</div></div>\n",
            escape_html(role),
            text(*name)
        ));
    }
    html.push_str("</div>");
    html
}

/// Accept a JSON string or number as a string field.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Optional variant of [`string_or_number`]; use with `#[serde(default)]`.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}
