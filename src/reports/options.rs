//! Render option merging and CSS length conversion.

use super::types::{Margins, RenderOptions, ReportOptions};
use super::ReportError;

/// Merge caller overrides onto the defaults.
///
/// Top-level fields replace the default wholesale, except `margins`, which is
/// merged side by side so a caller can override `top` alone. An empty
/// `watermark` or `password` clears the default.
pub fn merge_report_options(custom: Option<&ReportOptions>, defaults: &RenderOptions) -> RenderOptions {
    let Some(custom) = custom else {
        return defaults.clone();
    };

    let margins = match &custom.margins {
        Some(overrides) => Margins {
            top: overrides.top.clone().unwrap_or_else(|| defaults.margins.top.clone()),
            right: overrides.right.clone().unwrap_or_else(|| defaults.margins.right.clone()),
            bottom: overrides.bottom.clone().unwrap_or_else(|| defaults.margins.bottom.clone()),
            left: overrides.left.clone().unwrap_or_else(|| defaults.margins.left.clone()),
        },
        None => defaults.margins.clone(),
    };

    RenderOptions {
        page_format: custom.page_format.unwrap_or(defaults.page_format),
        orientation: custom.orientation.unwrap_or(defaults.orientation),
        margins,
        include_header: custom.include_header.unwrap_or(defaults.include_header),
        include_footer: custom.include_footer.unwrap_or(defaults.include_footer),
        watermark: override_text(&custom.watermark, &defaults.watermark),
        password: override_text(&custom.password, &defaults.password),
    }
}

fn override_text(custom: &Option<String>, default: &Option<String>) -> Option<String> {
    match custom {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.clone()),
        None => default.clone(),
    }
}

/// Check that every margin is a length the printer accepts.
pub fn validate_margins(margins: &Margins) -> Result<(), ReportError> {
    for side in [&margins.top, &margins.right, &margins.bottom, &margins.left] {
        css_length_to_inches(side)?;
    }
    Ok(())
}

/// Convert a CSS length (`mm`, `cm`, `in`, `px`, `pt`) into inches.
///
/// A bare number is read as pixels, matching how the browser treats it.
pub fn css_length_to_inches(value: &str) -> Result<f64, ReportError> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let amount: f64 = number
        .trim()
        .parse()
        .map_err(|_| ReportError::InvalidOptions(format!("invalid length '{}'", value)))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(ReportError::InvalidOptions(format!(
            "length '{}' must be a non-negative number",
            value
        )));
    }

    let inches = match unit.to_ascii_lowercase().as_str() {
        "mm" => amount / 25.4,
        "cm" => amount / 2.54,
        "in" => amount,
        "pt" => amount / 72.0,
        "px" | "" => amount / 96.0,
        other => {
            return Err(ReportError::InvalidOptions(format!(
                "unsupported length unit '{}' in '{}'",
                other, value
            )))
        }
    };

    Ok(inches)
}
