use crate::civil::CivilDate;
use crate::error::{Result, TicklineError};

/// Label formatting policy for axis ticks.
///
/// Implementations must be pure: the label depends on the date alone, never
/// on the process locale or timezone.
pub trait Locale: Send + Sync {
    fn key(&self) -> &'static str;

    fn format_day_label(&self, date: CivilDate) -> String;

    fn format_month_label(&self, date: CivilDate) -> String;
}

/// `11/24` and `11月`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Japanese;

impl Locale for Japanese {
    fn key(&self) -> &'static str {
        "ja"
    }

    fn format_day_label(&self, date: CivilDate) -> String {
        format!("{}/{}", date.month(), date.day())
    }

    fn format_month_label(&self, date: CivilDate) -> String {
        format!("{}月", date.month())
    }
}

/// `11/24` and `11`.
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Locale for English {
    fn key(&self) -> &'static str {
        "en"
    }

    fn format_day_label(&self, date: CivilDate) -> String {
        format!("{}/{}", date.month(), date.day())
    }

    fn format_month_label(&self, date: CivilDate) -> String {
        date.month().to_string()
    }
}

/// `11-24` and `2025-11`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso;

impl Locale for Iso {
    fn key(&self) -> &'static str {
        "iso"
    }

    fn format_day_label(&self, date: CivilDate) -> String {
        format!("{:02}-{:02}", date.month(), date.day())
    }

    fn format_month_label(&self, date: CivilDate) -> String {
        format!("{:04}-{:02}", date.year(), date.month())
    }
}

#[must_use]
pub fn known_locale_keys() -> Vec<&'static str> {
    vec!["ja", "en", "iso"]
}

pub fn locale_from_key(key: &str) -> Result<Box<dyn Locale>> {
    match key.trim().to_ascii_lowercase().as_str() {
        "ja" | "ja-jp" => Ok(Box::new(Japanese)),
        "en" | "en-us" => Ok(Box::new(English)),
        "iso" => Ok(Box::new(Iso)),
        other => Err(TicklineError::UnsupportedLocale(other.to_string())),
    }
}
