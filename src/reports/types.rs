//! Core report types: the report-type tag, static metadata, and render options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::ReportError;

/// Every report the system knows about. Not every variant has a working renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    StudentRegistration,
    StudentReportCard,
    AttendanceReport,
    GradeReport,
    SchoolYearReport,
    FinancialReport,
    GuardianReport,
    FamilyReport,
    CustomReport,
}

impl ReportType {
    /// All variants, in declaration order.
    pub const ALL: [ReportType; 9] = [
        ReportType::StudentRegistration,
        ReportType::StudentReportCard,
        ReportType::AttendanceReport,
        ReportType::GradeReport,
        ReportType::SchoolYearReport,
        ReportType::FinancialReport,
        ReportType::GuardianReport,
        ReportType::FamilyReport,
        ReportType::CustomReport,
    ];

    /// Wire name, e.g. `student-report-card`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::StudentRegistration => "student-registration",
            ReportType::StudentReportCard => "student-report-card",
            ReportType::AttendanceReport => "attendance-report",
            ReportType::GradeReport => "grade-report",
            ReportType::SchoolYearReport => "school-year-report",
            ReportType::FinancialReport => "financial-report",
            ReportType::GuardianReport => "guardian-report",
            ReportType::FamilyReport => "family-report",
            ReportType::CustomReport => "custom-report",
        }
    }

    /// Compiled-in metadata. Total over the enum.
    pub fn metadata(&self) -> &'static ReportMetadata {
        match self {
            ReportType::StudentRegistration => &STUDENT_REGISTRATION_META,
            ReportType::StudentReportCard => &STUDENT_REPORT_CARD_META,
            ReportType::AttendanceReport => &ATTENDANCE_REPORT_META,
            ReportType::GradeReport => &GRADE_REPORT_META,
            ReportType::SchoolYearReport => &SCHOOL_YEAR_REPORT_META,
            ReportType::FinancialReport => &FINANCIAL_REPORT_META,
            ReportType::GuardianReport => &GUARDIAN_REPORT_META,
            ReportType::FamilyReport => &FAMILY_REPORT_META,
            ReportType::CustomReport => &CUSTOM_REPORT_META,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ReportType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| ReportError::UnknownReportType(needle.to_string()))
    }
}

/// Static description of a report type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub title: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
    pub data_source: &'static str,
}

const AUTHOR: &str = "School Administration System";

static STUDENT_REGISTRATION_META: ReportMetadata = ReportMetadata {
    title: "ទម្រង់ចុះឈ្មោះសិស្ស",
    description: "Student registration form with identity, health, and guardian details",
    version: "1.0.0",
    author: AUTHOR,
    data_source: "students",
};

static STUDENT_REPORT_CARD_META: ReportMetadata = ReportMetadata {
    title: "ព្រឹត្តិបត្រពិន្ទុសិស្ស",
    description: "Per-term report card with subject grades, attendance, and comments",
    version: "1.0.0",
    author: AUTHOR,
    data_source: "grades, attendance",
};

static ATTENDANCE_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍វត្តមានសិស្ស",
    description: "Class attendance register for a date range",
    version: "1.0.0",
    author: AUTHOR,
    data_source: "attendance",
};

static GRADE_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍ពិន្ទុ",
    description: "Grade distribution across a class or grade level",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "grades",
};

static SCHOOL_YEAR_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍ឆ្នាំសិក្សា",
    description: "End-of-year summary for a school year",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "school_years",
};

static FINANCIAL_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍ហិរញ្ញវត្ថុ",
    description: "Fee collection and expense summary",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "payments",
};

static GUARDIAN_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍អាណាព្យាបាល",
    description: "Guardian contact directory",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "guardians",
};

static FAMILY_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍ព័ត៌មានគ្រួសារ",
    description: "Family background and social support overview",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "families",
};

static CUSTOM_REPORT_META: ReportMetadata = ReportMetadata {
    title: "របាយការណ៍ផ្ទាល់ខ្លួន",
    description: "User-defined report layout",
    version: "0.1.0",
    author: AUTHOR,
    data_source: "custom",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageFormat {
    /// Paper width and height in inches, portrait.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins as CSS lengths (`15mm`, `1in`, `2cm`, `40px`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Margins {
    pub fn uniform(value: &str) -> Self {
        Self {
            top: value.to_string(),
            right: value.to_string(),
            bottom: value.to_string(),
            left: value.to_string(),
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform("15mm")
    }
}

/// Fully resolved rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
    pub include_header: bool,
    pub include_footer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            include_header: true,
            include_footer: true,
            watermark: None,
            password: None,
        }
    }
}

/// Per-side margin overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MarginOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
}

/// Caller-supplied options. Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_format: Option<PageFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<MarginOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_footer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A single generation request, consumed once.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: ReportType,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub options: Option<ReportOptions>,
}
