//! Common utilities for report generation.
//!
//! Khmer label mappers, date and currency formatting, HTML escaping and
//! filename helpers. Every mapper is total: an unrecognized code comes back
//! unchanged so rendering degrades to the raw value instead of failing.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Label printed wherever an optional field is missing.
pub const NOT_AVAILABLE: &str = "មិនមាន";

/// Label printed for a zero amount.
pub const ZERO_AMOUNT: &str = "ឥតគិតថ្លៃ";

const CURRENCY_UNIT: &str = "រៀល";

const KHMER_MONTHS: [&str; 12] = [
    "មករា",
    "កុម្ភៈ",
    "មីនា",
    "មេសា",
    "ឧសភា",
    "មិថុនា",
    "កក្កដា",
    "សីហា",
    "កញ្ញា",
    "តុលា",
    "វិច្ឆិកា",
    "ធ្នូ",
];

/// Replace ASCII digits with Khmer numerals (០-៩). Other characters pass through.
pub fn to_khmer_digits(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch.to_digit(10) {
            Some(d) if ch.is_ascii_digit() => char::from_u32(0x17E0 + d).unwrap_or(ch),
            _ => ch,
        })
        .collect()
}

/// Returns the value, or [`NOT_AVAILABLE`] when it is missing or blank.
pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Grade number to label, e.g. `7` -> "ថ្នាក់ទី៧".
pub fn format_grade_khmer(grade: &str) -> String {
    let trimmed = grade.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let number = lowered
        .strip_prefix("grade")
        .unwrap_or(&lowered)
        .trim()
        .trim_start_matches('-')
        .trim();

    match number {
        "k" | "kg" | "kindergarten" => "មត្តេយ្យ".to_string(),
        _ => match number.parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => format!("ថ្នាក់ទី{}", to_khmer_digits(&n.to_string())),
            _ => grade.to_string(),
        },
    }
}

pub fn get_gender_khmer(gender: &str) -> String {
    match normalize_code(gender).as_str() {
        "m" | "male" | "boy" | "ប្រុស" => "ប្រុស".to_string(),
        "f" | "female" | "girl" | "ស្រី" => "ស្រី".to_string(),
        _ => gender.to_string(),
    }
}

pub fn get_relation_khmer(relation: &str) -> String {
    let label = match normalize_code(relation).as_str() {
        "father" => "ឪពុក",
        "mother" => "ម្ដាយ",
        "guardian" => "អាណាព្យាបាល",
        "grandfather" => "ជីតា",
        "grandmother" => "ជីដូន",
        "brother" => "បងប្អូនប្រុស",
        "sister" => "បងប្អូនស្រី",
        "uncle" => "ពូ",
        "aunt" => "មីង",
        "stepfather" | "step-father" => "ឪពុកចុង",
        "stepmother" | "step-mother" => "ម្ដាយចុង",
        "other" => "ផ្សេងៗ",
        _ => return relation.to_string(),
    };
    label.to_string()
}

pub fn format_boolean_khmer(value: bool) -> &'static str {
    if value {
        "បាន"
    } else {
        "មិនទាន់"
    }
}

pub fn get_vaccination_status_khmer(status: &str) -> String {
    let label = match normalize_code(status).as_str() {
        "complete" | "completed" | "full" | "fully-vaccinated" => "បានចាក់គ្រប់ដូស",
        "partial" | "partially-vaccinated" | "incomplete" => "បានចាក់មិនគ្រប់ដូស",
        "none" | "not-vaccinated" | "unvaccinated" => "មិនទាន់ចាក់",
        "unknown" => "មិនដឹង",
        _ => return status.to_string(),
    };
    label.to_string()
}

pub fn get_attendance_status_khmer(status: &str) -> String {
    let label = match normalize_code(status).as_str() {
        "present" => "មានវត្តមាន",
        "absent" => "អវត្តមាន",
        "late" => "មកយឺត",
        "excused" | "permission" => "សុំច្បាប់",
        "sick" => "ឈឺ",
        _ => return status.to_string(),
    };
    label.to_string()
}

/// Riel amount with thousands separators, e.g. `1500000` -> "1,500,000 រៀល".
///
/// Zero prints [`ZERO_AMOUNT`]. Amounts are rounded to whole riel.
pub fn format_currency_khmer(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let rounded = amount.round() as i64;
    if rounded == 0 {
        return ZERO_AMOUNT.to_string();
    }

    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{grouped} {CURRENCY_UNIT}")
}

/// Long-form Khmer date, e.g. "ថ្ងៃទី១៥ ខែមីនា ឆ្នាំ២០២៤".
pub fn format_khmer_date(date: NaiveDate) -> String {
    let month = KHMER_MONTHS[(date.month0() as usize).min(KHMER_MONTHS.len() - 1)];
    format!(
        "ថ្ងៃទី{} ខែ{} ឆ្នាំ{}",
        to_khmer_digits(&date.day().to_string()),
        month,
        to_khmer_digits(&date.year().to_string())
    )
}

/// Parse an ISO date (`2024-03-15`) or RFC 3339 timestamp and format it in
/// long form. Unparseable input is returned unchanged.
pub fn format_date_khmer(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return format_khmer_date(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return format_khmer_date(datetime.date_naive());
    }
    value.to_string()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Sanitize a string for use in filenames: lowercase ASCII alphanumerics
/// separated by single hyphens. Common accented Latin letters are folded.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        let ch = fold_latin(ch);
        if ch.is_ascii_alphanumeric() {
            result.push(ch);
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_' || ch == '.')
            && !last_dash
            && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        return fallback.to_string();
    }
    result.to_string()
}

/// Build `<prefix>-<identifier>[-<timestamp>].<extension>` using the current time.
pub fn generate_safe_filename(
    prefix: &str,
    identifier: &str,
    extension: &str,
    include_timestamp: bool,
) -> String {
    let timestamp = include_timestamp.then(Utc::now);
    generate_safe_filename_at(prefix, identifier, extension, timestamp)
}

/// Same as [`generate_safe_filename`] with an explicit timestamp.
pub fn generate_safe_filename_at(
    prefix: &str,
    identifier: &str,
    extension: &str,
    timestamp: Option<DateTime<Utc>>,
) -> String {
    let prefix = sanitize_filename(prefix, "report");
    let identifier = sanitize_filename(identifier, "document");
    let extension: String = extension
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let extension = if extension.is_empty() { "pdf".to_string() } else { extension };

    match timestamp {
        Some(ts) => format!(
            "{}-{}-{}.{}",
            prefix,
            identifier,
            ts.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
            extension
        ),
        None => format!("{}-{}.{}", prefix, identifier, extension),
    }
}

/// Lowercased code with `_` and spaces folded to `-`.
pub(crate) fn normalize_code(value: &str) -> String {
    value.trim().to_lowercase().replace(['_', ' '], "-")
}

fn fold_latin(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' => 'a',
        'ç' | 'č' | 'ć' => 'c',
        'đ' | 'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ơ' => 'o',
        'ś' | 'š' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ư' => 'u',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_safe_filename_is_ascii_without_timestamp() {
        let name = generate_safe_filename("report", "Ménh Sokha 2024", "pdf", false);
        assert_eq!(name, "report-menh-sokha-2024.pdf");
        assert!(name
            .trim_end_matches(".pdf")
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_safe_filename_with_clock_timestamp() {
        let name = generate_safe_filename("report", "STU 1", "pdf", true);
        assert!(name.starts_with("report-stu-1-"));
        assert!(name.ends_with("Z.pdf"));
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(get_gender_khmer("male"), "ប្រុស");
        assert_eq!(get_gender_khmer(" F "), "ស្រី");
        assert_eq!(get_gender_khmer("unknown-code"), "unknown-code");
    }

    #[test]
    fn test_grade_labels() {
        assert_eq!(format_grade_khmer("7"), "ថ្នាក់ទី៧");
        assert_eq!(format_grade_khmer("Grade 12"), "ថ្នាក់ទី១២");
        assert_eq!(format_grade_khmer("13"), "13");
        assert_eq!(format_grade_khmer("7A"), "7A");
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency_khmer(0.0), ZERO_AMOUNT);
        assert_eq!(format_currency_khmer(1_500_000.0), "1,500,000 រៀល");
        assert_eq!(format_currency_khmer(999.0), "999 រៀល");
        assert_eq!(format_currency_khmer(-25_000.4), "-25,000 រៀល");
    }

    #[test]
    fn test_date_formatting() {
        assert_eq!(format_date_khmer("2024-03-15"), "ថ្ងៃទី១៥ ខែមីនា ឆ្នាំ២០២៤");
        assert_eq!(
            format_date_khmer("2024-12-01T08:00:00+07:00"),
            "ថ្ងៃទី១ ខែធ្នូ ឆ្នាំ២០២៤"
        );
        assert_eq!(format_date_khmer("next tuesday"), "next tuesday");
    }

    #[test]
    fn test_fallbacks_return_raw_input() {
        assert_eq!(get_relation_khmer("cousin"), "cousin");
        assert_eq!(get_vaccination_status_khmer("pending"), "pending");
        assert_eq!(get_attendance_status_khmer("remote"), "remote");
    }

    #[test]
    fn test_or_placeholder() {
        assert_eq!(or_placeholder(None), NOT_AVAILABLE);
        assert_eq!(or_placeholder(Some("  ")), NOT_AVAILABLE);
        assert_eq!(or_placeholder(Some("Sokha")), "Sokha");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("John Doe", "fallback"), "john-doe");
        assert_eq!(sanitize_filename("  Spaces  ", "fallback"), "spaces");
        assert_eq!(sanitize_filename("", "fallback"), "fallback");
        assert_eq!(sanitize_filename("Test--Name", "fb"), "test-name");
        assert_eq!(sanitize_filename("សុខា", "student"), "student");
    }

    #[test]
    fn test_generate_safe_filename_with_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 5).unwrap();
        let name = generate_safe_filename_at("Report Card", "STU-001", ".PDF", Some(ts));
        assert_eq!(name, "report-card-stu-001-2024-03-15T10-30-05-000Z.pdf");
    }
}
