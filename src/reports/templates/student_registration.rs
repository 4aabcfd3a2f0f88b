//! Template for the student registration form (ទម្រង់ចុះឈ្មោះសិស្ស).

use serde::Deserialize;
use serde_json::Value;

use super::{
    document_shell, field_table, mapped, opt_string_or_number, section, signature_blocks, text,
};
use crate::reports::common::{
    escape_html, format_boolean_khmer, format_date_khmer, format_grade_khmer, get_gender_khmer,
    get_relation_khmer, get_vaccination_status_khmer,
};
use crate::reports::traits::{parse_payload, RenderedHtml, ReportTemplate, TemplateContext};
use crate::reports::types::ReportType;
use crate::reports::ReportError;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInfo {
    pub name: String,
    pub relation: String,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistrationData {
    pub student_id: String,
    pub name_khmer: String,
    #[serde(default)]
    pub name_latin: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub grade: Option<String>,
    #[serde(default)]
    pub school_year: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub previous_school: Option<String>,

    #[serde(default)]
    pub vaccination_status: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_notes: Option<String>,
    #[serde(default)]
    pub has_disability: bool,

    #[serde(default)]
    pub guardians: Vec<GuardianInfo>,
    #[serde(default)]
    pub is_orphan: bool,
    #[serde(default)]
    pub lives_with: Option<String>,
    #[serde(default)]
    pub has_poor_card: bool,
    #[serde(default)]
    pub receives_scholarship: bool,

    #[serde(default)]
    pub notes: Option<String>,
}

pub struct StudentRegistrationTemplate;

impl StudentRegistrationTemplate {
    pub fn render_data(
        &self,
        data: &StudentRegistrationData,
        ctx: &TemplateContext,
    ) -> RenderedHtml {
        let title = ReportType::StudentRegistration.metadata().title;

        let identity = field_table(&[
            ("អត្តលេខសិស្ស", escape_html(&data.student_id)),
            ("ឈ្មោះជាអក្សរខ្មែរ", escape_html(&data.name_khmer)),
            ("ឈ្មោះជាអក្សរឡាតាំង", text(data.name_latin.as_deref())),
            ("ភេទ", mapped(data.gender.as_deref(), get_gender_khmer)),
            ("ថ្ងៃខែឆ្នាំកំណើត", mapped(data.date_of_birth.as_deref(), format_date_khmer)),
            ("ទីកន្លែងកំណើត", text(data.place_of_birth.as_deref())),
            ("សញ្ជាតិ", text(data.nationality.as_deref())),
            ("អាសយដ្ឋាន", text(data.address.as_deref())),
            ("លេខទូរស័ព្ទ", text(data.phone.as_deref())),
        ]);

        let enrollment = field_table(&[
            ("ថ្នាក់", mapped(data.grade.as_deref(), format_grade_khmer)),
            ("ឆ្នាំសិក្សា", text(data.school_year.as_deref())),
            ("ថ្ងៃចុះឈ្មោះ", mapped(data.enrollment_date.as_deref(), format_date_khmer)),
            ("សាលាមុន", text(data.previous_school.as_deref())),
        ]);

        let health = field_table(&[
            (
                "ការចាក់វ៉ាក់សាំង",
                mapped(data.vaccination_status.as_deref(), get_vaccination_status_khmer),
            ),
            ("អាឡែកហ្ស៊ី", text(data.allergies.as_deref())),
            ("កំណត់សម្គាល់សុខភាព", text(data.medical_notes.as_deref())),
            ("ពិការភាព", yes_no(data.has_disability).to_string()),
        ]);

        let family = field_table(&[
            ("កុមារកំព្រា", yes_no(data.is_orphan).to_string()),
            ("រស់នៅជាមួយ", mapped(data.lives_with.as_deref(), get_relation_khmer)),
            ("បណ្ណក្រីក្រ", yes_no(data.has_poor_card).to_string()),
            ("ទទួលអាហារូបករណ៍", format_boolean_khmer(data.receives_scholarship).to_string()),
        ]);

        let mut body = section("ព័ត៌មានផ្ទាល់ខ្លួន", &identity);
        body.push_str(&section("ការចុះឈ្មោះចូលរៀន", &enrollment));
        body.push_str(&section("សុខភាព", &health));
        body.push_str(&section("អាណាព្យាបាល", &guardian_table(&data.guardians)));
        body.push_str(&section("ស្ថានភាពគ្រួសារ", &family));
        body.push_str(&section("កំណត់សម្គាល់", &format!("<p>{}</p>", text(data.notes.as_deref()))));

        let guardian_name = data.guardians.first().map(|g| g.name.as_str());
        body.push_str(&signature_blocks(&[
            ("ហត្ថលេខាអាណាព្យាបាល", guardian_name),
            ("នាយកសាលា", None),
        ]));

        let identifier = match &data.name_latin {
            Some(latin) if !latin.trim().is_empty() => format!("{} {}", data.student_id, latin),
            _ => data.student_id.clone(),
        };

        RenderedHtml {
            html: document_shell(title, ctx, &body),
            identifier,
            title: title.to_string(),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "មាន"
    } else {
        "គ្មាន"
    }
}

fn guardian_table(guardians: &[GuardianInfo]) -> String {
    if guardians.is_empty() {
        return format!("<p>{}</p>", text(None));
    }

    let mut html = String::from(
        "<table class=\"grid\">\n<tr><th>ឈ្មោះ</th><th>ត្រូវជា</th><th>មុខរបរ</th><th>លេខទូរស័ព្ទ</th></tr>\n",
    );
    for guardian in guardians {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&guardian.name),
            escape_html(&get_relation_khmer(&guardian.relation)),
            text(guardian.occupation.as_deref()),
            text(guardian.phone.as_deref()),
        ));
    }
    html.push_str("</table>");
    html
}

impl ReportTemplate for StudentRegistrationTemplate {
    fn report_type(&self) -> ReportType {
        ReportType::StudentRegistration
    }

    fn render(&self, payload: &Value, ctx: &TemplateContext) -> Result<RenderedHtml, ReportError> {
        let data: StudentRegistrationData = parse_payload(self.report_type(), payload)?;
        Ok(self.render_data(&data, ctx))
    }
}
