use crate::utils::error::{Result, WisherError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const GREETING_TEMPLATE: &str = "🎉 Happy Birthday! {name}🎂\nWishing you a day filled with laughter, love, and all the things that make you smile. May this year bring new adventures, exciting challenges, and beautiful memories.";

/// Builds the birthday message for `name`.
pub fn greeting(name: &str) -> String {
    GREETING_TEMPLATE.replace("{name}", name)
}

/// A contact record as it is stored on disk.
///
/// Every field is optional; the notifier decides per contact whether the
/// record is usable. Unknown keys, and known keys holding a value of the
/// wrong JSON type, are carried in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, serde_json::Value>")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sent_year: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn take_string(record: &mut Map<String, Value>, key: &str) -> Option<String> {
    match record.remove(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            record.insert(key.to_string(), other);
            None
        }
    }
}

fn take_year(record: &mut Map<String, Value>, key: &str) -> Option<i32> {
    match record.remove(key) {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_i64().and_then(|y| i32::try_from(y).ok()) {
            Some(year) => Some(year),
            None => {
                record.insert(key.to_string(), value);
                None
            }
        },
    }
}

impl From<Map<String, Value>> for Contact {
    fn from(mut record: Map<String, Value>) -> Self {
        Self {
            name: take_string(&mut record, "name"),
            phone: take_string(&mut record, "phone"),
            birthdate: take_string(&mut record, "birthdate"),
            last_sent_year: take_year(&mut record, "last_sent_year"),
            extra: record,
        }
    }
}

impl Contact {
    pub fn new(name: &str, phone: &str, birthdate: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            birthdate: Some(birthdate.to_string()),
            ..Default::default()
        }
    }

    pub fn with_last_sent_year(mut self, year: i32) -> Self {
        self.mark_sent(year);
        self
    }

    /// Records a successful greeting, replacing any wrongly typed stored value.
    pub fn mark_sent(&mut self, year: i32) {
        self.extra.remove("last_sent_year");
        self.last_sent_year = Some(year);
    }

    /// Known field that is present but holds a value of the wrong JSON type.
    pub fn is_mistyped(&self, field: &str) -> bool {
        self.extra.contains_key(field)
    }

    /// The stored birthdate when it is present but cannot be read as `MM-DD`.
    pub fn malformed_birthdate(&self) -> Option<String> {
        if let Some(raw) = self.extra.get("birthdate") {
            return Some(raw.to_string());
        }
        match &self.birthdate {
            Some(raw) if raw.parse::<MonthDay>().is_err() => Some(format!("{:?}", raw)),
            _ => None,
        }
    }

    /// `None` when the birthdate is missing or malformed.
    pub fn month_day(&self) -> Option<MonthDay> {
        self.birthdate.as_deref()?.parse().ok()
    }

    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        self.month_day().is_some_and(|md| md.matches(date))
    }

    pub fn notified_in(&self, year: i32) -> bool {
        self.last_sent_year == Some(year)
    }

    /// Name used in logs, falls back to the phone number.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.phone.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Calendar month and day, independent of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self> {
        // 2000 是閏年，02-29 也算合法生日
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(WisherError::InvalidBirthdate {
                value: format!("{:02}-{:02}", month, day),
            });
        }
        Ok(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.month == date.month() && self.day == date.day()
    }
}

impl FromStr for MonthDay {
    type Err = WisherError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WisherError::InvalidBirthdate {
            value: s.to_string(),
        };

        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let part = |p: &str| -> Result<u32> {
            if p.is_empty() || p.len() > 2 || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            p.parse().map_err(|_| invalid())
        };

        MonthDay::new(part(month)?, part(day)?).map_err(|_| invalid())
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// What happened to a single matching contact during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactEvent {
    Notified { index: usize, name: String },
    AlreadyNotified { index: usize, name: String },
    Skipped { index: usize, reason: String },
    Failed { index: usize, name: String, reason: String },
}

/// Result of one pass of the notifier over the contact sequence.
#[derive(Debug, Clone)]
pub struct NotifyOutcome {
    pub found_birthday: bool,
    pub updated: bool,
    pub contacts: Vec<Contact>,
    pub events: Vec<ContactEvent>,
}

impl NotifyOutcome {
    pub fn count(&self, pred: impl Fn(&ContactEvent) -> bool) -> usize {
        self.events.iter().filter(|&e| pred(e)).count()
    }
}

/// A greeting the notifier would send today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedGreeting {
    pub index: usize,
    pub name: String,
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    NotNeeded,
    Saved,
    Failed(String),
}

/// Per-run summary reported to the operator.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub contacts_loaded: usize,
    pub birthdays_found: bool,
    pub notified: usize,
    pub already_notified: usize,
    pub failed: usize,
    pub skipped: usize,
    pub persistence: Persistence,
    pub load_error: Option<String>,
}

impl RunSummary {
    pub fn persisted(&self) -> bool {
        self.persistence == Persistence::Saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_month_day() {
        let md: MonthDay = "11-02".parse().unwrap();
        assert_eq!((md.month(), md.day()), (11, 2));
        assert_eq!(md.to_string(), "11-02");

        let md: MonthDay = " 3-7 ".parse().unwrap();
        assert_eq!(md.to_string(), "03-07");

        assert!("02-29".parse::<MonthDay>().is_ok());
    }

    #[test]
    fn test_reject_malformed_month_day() {
        for bad in ["", "1102", "13-01", "00-10", "02-30", "11-2x", "011-02", "11/02", "-", "2024-11-02"] {
            assert!(bad.parse::<MonthDay>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_matches_ignores_year() {
        let md: MonthDay = "11-02".parse().unwrap();
        assert!(md.matches(date(2025, 11, 2)));
        assert!(md.matches(date(1990, 11, 2)));
        assert!(!md.matches(date(2025, 2, 11)));
        assert_eq!(MonthDay::of(date(2025, 11, 2)), md);
    }

    #[test]
    fn test_contact_birthday_checks() {
        let ann = Contact::new("Ann", "+1555", "11-02");
        assert!(ann.has_birthday_on(date(2025, 11, 2)));
        assert!(!ann.notified_in(2025));
        assert!(ann.clone().with_last_sent_year(2025).notified_in(2025));

        let broken = Contact {
            birthdate: Some("Nov 2".to_string()),
            ..ann.clone()
        };
        assert!(!broken.has_birthday_on(date(2025, 11, 2)));
        assert!(broken.month_day().is_none());
        assert_eq!(broken.malformed_birthdate().as_deref(), Some("\"Nov 2\""));
        assert_eq!(ann.malformed_birthdate(), None);
    }

    #[test]
    fn test_contact_serde_keeps_unknown_fields() {
        let json = r#"{"name":"Ann","phone":"+1555","birthdate":"11-02","note":"cousin"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.last_sent_year, None);
        assert_eq!(contact.extra["note"], "cousin");

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value, serde_json::from_str::<serde_json::Value>(json).unwrap());
        assert!(value.get("last_sent_year").is_none());
    }

    #[test]
    fn test_mistyped_fields_stay_with_the_record() {
        let json = r#"{"name":"Bad","phone":"+1","birthdate":1102,"last_sent_year":"2025"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();

        assert_eq!(contact.name.as_deref(), Some("Bad"));
        assert_eq!(contact.birthdate, None);
        assert_eq!(contact.last_sent_year, None);
        assert!(contact.is_mistyped("birthdate"));
        assert!(contact.is_mistyped("last_sent_year"));
        assert_eq!(contact.malformed_birthdate().as_deref(), Some("1102"));
        assert!(!contact.has_birthday_on(date(2025, 11, 2)));

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }

    #[test]
    fn test_mark_sent_replaces_mistyped_year() {
        let mut contact: Contact =
            serde_json::from_str(r#"{"name":"Ann","last_sent_year":"last year"}"#).unwrap();
        contact.mark_sent(2025);

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value, serde_json::json!({"name": "Ann", "last_sent_year": 2025}));
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let contact: Contact =
            serde_json::from_str(r#"{"name":"Ann","phone":null,"last_sent_year":null}"#).unwrap();
        assert_eq!(contact.phone, None);
        assert_eq!(contact.last_sent_year, None);
        assert!(contact.extra.is_empty());
    }

    #[test]
    fn test_greeting_uses_name() {
        let message = greeting("Ann");
        assert!(message.starts_with("🎉 Happy Birthday! Ann🎂\n"));
        assert!(!message.contains("{name}"));
    }

    #[test]
    fn test_label_fallbacks() {
        let mut c = Contact::new("", "+1555", "01-01");
        assert_eq!(c.label(), "+1555");
        c.phone = None;
        assert_eq!(c.label(), "<unnamed>");
    }
}
