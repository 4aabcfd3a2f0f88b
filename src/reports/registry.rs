//! Report registry - maps each report type to its template.

use std::collections::HashMap;
use std::sync::Arc;

use super::templates::{
    AttendanceReportTemplate, StudentRegistrationTemplate, StudentReportCardTemplate,
};
use super::traits::ReportTemplate;
use super::types::ReportType;
use super::ReportError;

/// What the registry holds for a report type.
#[derive(Clone)]
pub enum RegistryEntry {
    Implemented(Arc<dyn ReportTemplate>),
    NotImplemented,
}

/// Dispatch table from report type to template.
///
/// A type with no entry is unknown; a type registered as
/// [`RegistryEntry::NotImplemented`] is known but has no renderer yet.
#[derive(Clone, Default)]
pub struct ReportRegistry {
    entries: HashMap<ReportType, RegistryEntry>,
}

impl ReportRegistry {
    /// Registry with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every report type, with the built-in templates wired in.
    pub fn with_builtin_templates() -> Self {
        let mut registry = Self::empty();
        for report_type in ReportType::ALL {
            registry.mark_not_implemented(report_type);
        }
        registry.register(Arc::new(StudentRegistrationTemplate));
        registry.register(Arc::new(StudentReportCardTemplate));
        registry.register(Arc::new(AttendanceReportTemplate));
        registry
    }

    /// Register a template under its own report type, replacing any entry.
    pub fn register(&mut self, template: Arc<dyn ReportTemplate>) {
        self.entries
            .insert(template.report_type(), RegistryEntry::Implemented(template));
    }

    pub fn mark_not_implemented(&mut self, report_type: ReportType) {
        self.entries.insert(report_type, RegistryEntry::NotImplemented);
    }

    /// Resolve the template for a report type.
    pub fn resolve(&self, report_type: ReportType) -> Result<Arc<dyn ReportTemplate>, ReportError> {
        match self.entries.get(&report_type) {
            Some(RegistryEntry::Implemented(template)) => Ok(template.clone()),
            Some(RegistryEntry::NotImplemented) => Err(ReportError::NotImplemented(report_type)),
            None => Err(ReportError::UnknownReportType(report_type.to_string())),
        }
    }

    /// Types with a working template, in declaration order.
    pub fn available(&self) -> Vec<ReportType> {
        ReportType::ALL
            .into_iter()
            .filter(|t| matches!(self.entries.get(t), Some(RegistryEntry::Implemented(_))))
            .collect()
    }
}
