use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    NotFound,
    OffTopic,
    /// The query path failed before a model answer existed. Never produced
    /// by [`Classifier::classify`]; see [`crate::Pipeline::respond`].
    Error,
}

impl AnswerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerStatus::Answered => "answered",
            AnswerStatus::NotFound => "not_found",
            AnswerStatus::OffTopic => "off_topic",
            AnswerStatus::Error => "error",
        }
    }
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAnswer {
    pub status: AnswerStatus,
    pub text: String,
}

/// Control words a locale's prompt tells the model to emit instead of an
/// answer. Each sentinel is listed in Latin and Cyrillic spelling because the
/// model drifts between scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentinelTable {
    pub off_topic: [&'static str; 2],
    pub not_found: [&'static str; 2],
}

const UZBEK_SENTINELS: SentinelTable = SentinelTable {
    off_topic: ["MAVZUGA_ALOQASIZ", "МАВЗУГА_АЛОҚАСИЗ"],
    not_found: ["JAVOB_TOPILMADI", "ЖАВОБ_ТОПИЛМАДИ"],
};

const RUSSIAN_SENTINELS: SentinelTable = SentinelTable {
    off_topic: ["VNE_TEMY", "ВНЕ_ТЕМЫ"],
    not_found: ["OTVET_NE_NAYDEN", "ОТВЕТ_НЕ_НАЙДЕН"],
};

pub fn sentinels(locale: Locale) -> &'static SentinelTable {
    match locale {
        Locale::Latin | Locale::Cyrillic => &UZBEK_SENTINELS,
        Locale::Russian => &RUSSIAN_SENTINELS,
    }
}

fn contains_any(raw: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| raw.contains(t))
}

/// Maps raw model output to a status and the text to show.
#[derive(Clone, Debug)]
pub struct Classifier {
    contact: String,
}

impl Classifier {
    pub fn new(contact: &str) -> Self {
        Self {
            contact: contact.to_string(),
        }
    }

    /// Off-topic wins over not-found; output with neither sentinel passes
    /// through unchanged as `answered`.
    pub fn classify(&self, raw: &str, locale: Locale) -> ClassifiedAnswer {
        let table = sentinels(locale);
        if contains_any(raw, &table.off_topic) {
            return ClassifiedAnswer {
                status: AnswerStatus::OffTopic,
                text: locale.messages(&self.contact).off_topic,
            };
        }
        if contains_any(raw, &table.not_found) {
            return ClassifiedAnswer {
                status: AnswerStatus::NotFound,
                text: locale.messages(&self.contact).not_found,
            };
        }
        ClassifiedAnswer {
            status: AnswerStatus::Answered,
            text: raw.to_string(),
        }
    }

    pub fn technical_failure(&self, locale: Locale) -> ClassifiedAnswer {
        ClassifiedAnswer {
            status: AnswerStatus::Error,
            text: locale.messages(&self.contact).technical_error,
        }
    }
}
