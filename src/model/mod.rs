//! # Recipient & Training Records
//!
//! Read-only inputs for one batch: the training being certified and the
//! people receiving certificates. Records come from an external store that
//! has changed shape over the years, so several legacy field names and value
//! types are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CertError, Result};
use crate::score::{ScoreInput, ScoreSummary};
use crate::template::{lenient_f64, lenient_opt_string, lenient_string};

/// Which kind of certificate a recipient gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    Participant,
    Monitor,
    Speaker,
}

impl RecipientKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "participant" | "participante" => Some(Self::Participant),
            "monitor" => Some(Self::Monitor),
            "speaker" | "palestrante" => Some(Self::Speaker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rg: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    /// Job function printed as `funcao`.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub kappa: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub kappa_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub exam_kappa: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub nota: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub exam_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub final_score: Option<f64>,
}

impl Participant {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The exam result, taking the first populated legacy field of each kind.
    pub fn score_summary(&self) -> ScoreSummary {
        let kappa = self.kappa.or(self.kappa_score).or(self.exam_kappa);
        let score = self
            .score
            .or(self.nota)
            .or(self.exam_score)
            .or(self.final_score);
        ScoreSummary::resolve(ScoreInput::from_legacy(kappa, score))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Monitor {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rg: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    /// The lecture this monitor assisted, printed as `aula`.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub lecture: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Speaker {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rg: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub lecture: Option<String>,
}

/// Any recipient, as read from a job file.
#[derive(Debug, Clone)]
pub enum Recipient {
    Participant(Participant),
    Monitor(Monitor),
    Speaker(Speaker),
}

impl Recipient {
    /// Read a recipient record. The `kind` field picks the variant; records
    /// without one use `default_kind`.
    pub fn from_value(value: Value, default_kind: RecipientKind) -> Result<Self> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .and_then(RecipientKind::from_name)
            .unwrap_or(default_kind);
        let parse = |e: serde_json::Error| CertError::parse("recipient", e);
        Ok(match kind {
            RecipientKind::Participant => {
                Recipient::Participant(serde_json::from_value(value).map_err(parse)?)
            }
            RecipientKind::Monitor => Recipient::Monitor(serde_json::from_value(value).map_err(parse)?),
            RecipientKind::Speaker => Recipient::Speaker(serde_json::from_value(value).map_err(parse)?),
        })
    }

    pub fn kind(&self) -> RecipientKind {
        match self {
            Recipient::Participant(_) => RecipientKind::Participant,
            Recipient::Monitor(_) => RecipientKind::Monitor,
            Recipient::Speaker(_) => RecipientKind::Speaker,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Recipient::Participant(p) => &p.name,
            Recipient::Monitor(m) => &m.name,
            Recipient::Speaker(s) => &s.name,
        }
    }
}

/// One entry of a training's date list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateEntry {
    Text(String),
    Object { date: String },
    /// Anything else (`null`, numbers, `{ "date": null }`); never parses.
    Other(Value),
}

impl DateEntry {
    fn as_str(&self) -> Option<&str> {
        match self {
            DateEntry::Text(s) => Some(s),
            DateEntry::Object { date } => Some(date),
            DateEntry::Other(_) => None,
        }
    }
}

/// Training dates as stored: a list or a single value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrainingDates {
    Many(Vec<DateEntry>),
    One(DateEntry),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Training {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub coordinator: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub instructor: Option<String>,
    /// Workload in hours.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub dates: Option<TrainingDates>,
}

impl Training {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CertError::parse("training", e))
    }

    /// Parsed dates, deduplicated and in chronological order. Entries that do
    /// not parse are dropped.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let entries: Vec<&DateEntry> = match &self.dates {
            None => Vec::new(),
            Some(TrainingDates::One(entry)) => vec![entry],
            Some(TrainingDates::Many(entries)) => entries.iter().collect(),
        };

        let mut dates: Vec<NaiveDate> = entries
            .into_iter()
            .filter_map(|entry| {
                let parsed = entry.as_str().and_then(parse_date);
                if parsed.is_none() {
                    log::debug!("Dropping unparsable training date {:?}", entry);
                }
                parsed
            })
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// `""`, `"DD/MM/YYYY"`, or `"de D1 a Dn"`.
    pub fn period(&self) -> String {
        let dates = self.dates();
        match dates.as_slice() {
            [] => String::new(),
            [only] => format_date(*only),
            [first, .., last] => format!("de {} a {}", format_date(*first), format_date(*last)),
        }
    }

    /// Every date, joined with `", "`.
    pub fn all_dates(&self) -> String {
        self.dates()
            .into_iter()
            .map(format_date)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates().last().copied()
    }

    /// Duration with integral values printed without decimals.
    pub fn duration_label(&self) -> String {
        match self.duration {
            None => String::new(),
            Some(h) if h.fract() == 0.0 => format!("{}", h as i64),
            Some(h) => format!("{}", h).replace('.', ","),
        }
    }
}

/// `YYYY-MM-DD`, ISO timestamps, or `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
