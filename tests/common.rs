#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use school_reports::config::ReportConfig;
use school_reports::reports::{
    BrowserLauncher, BrowserSession, HtmlToPdfEngine, PdfLayout, ReportError, ReportManager,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MOCK_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

/// In-memory browser that records what it was asked to print.
#[derive(Clone, Default)]
pub struct MockBrowser {
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub last_html: Arc<Mutex<Option<String>>>,
    pub last_layout: Arc<Mutex<Option<PdfLayout>>>,
    pub fail_print: bool,
}

impl MockBrowser {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn html(&self) -> String {
        self.last_html.lock().clone().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ReportError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl BrowserSession for MockBrowser {
    async fn load(&mut self, html: &str) -> Result<(), ReportError> {
        *self.last_html.lock() = Some(html.to_string());
        Ok(())
    }

    async fn wait_for_fonts(&mut self, _max_wait: Duration) -> Result<(), ReportError> {
        Ok(())
    }

    async fn print_pdf(&mut self, layout: &PdfLayout) -> Result<Vec<u8>, ReportError> {
        *self.last_layout.lock() = Some(layout.clone());
        if self.fail_print {
            return Err(ReportError::PdfExport("target closed".to_string()));
        }
        Ok(MOCK_PDF.to_vec())
    }

    async fn close(&mut self) -> Result<(), ReportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_config() -> ReportConfig {
    ReportConfig {
        institution_name: "វិទ្យាល័យព្រះស៊ីសុវត្ថិ".to_string(),
        include_timestamp: false,
        settle_delay_ms: 0,
        ..Default::default()
    }
}

pub fn manager_with(config: ReportConfig, browser: &MockBrowser) -> ReportManager {
    let engine = HtmlToPdfEngine::new(Arc::new(browser.clone()), Duration::ZERO);
    ReportManager::new(config, engine)
}

pub fn report_card_payload() -> Value {
    json!({
        "studentId": "STU-2024-015",
        "studentName": "សុខ វណ្ណា",
        "studentNameLatin": "Sok Vanna",
        "gender": "F",
        "grade": 9,
        "schoolYear": "2024-2025",
        "term": "ឆមាសទី១",
        "grades": [
            { "subject": "គណិតវិទ្យា", "score": 92 },
            { "subject": "ភាសាខ្មែរ", "score": 81.5 },
            { "subject": "រូបវិទ្យា", "score": 67 }
        ],
        "attendance": { "total": 20, "present": 18, "absent": 1, "late": 1 },
        "teacherComment": "ខិតខំប្រឹងប្រែង"
    })
}

pub fn registration_payload() -> Value {
    json!({
        "studentId": "REG-0100",
        "nameKhmer": "ចាន់ ដារ៉ា",
        "nameLatin": "Chan Dara",
        "gender": "M",
        "dateOfBirth": "2016-02-11",
        "grade": "2",
        "guardians": [
            { "name": "Chan Sophal", "relation": "father", "phone": "012345678" }
        ]
    })
}

pub fn attendance_payload() -> Value {
    json!({
        "className": "9B",
        "grade": 9,
        "startDate": "2024-02-05",
        "records": [
            { "studentId": "S1", "name": "Dara", "status": "present" },
            { "studentId": "S2", "name": "Vanna", "status": "late" }
        ]
    })
}
