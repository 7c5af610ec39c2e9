use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index_store::Partition;

/// Script/language of a single input string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Uzbek written in the Latin alphabet.
    Latin,
    /// Uzbek written in Cyrillic.
    Cyrillic,
    Russian,
}

const UZBEK_CYRILLIC_LETTERS: [char; 8] = ['ў', 'қ', 'ғ', 'ҳ', 'Ў', 'Қ', 'Ғ', 'Ҳ'];

/// Majority vote between Cyrillic (`U+0400..=U+04FF`) and ASCII Latin
/// letters. Cyrillic text counts as Uzbek when any of ў қ ғ ҳ appears,
/// Russian otherwise. Ties go to Latin.
///
/// This is a counting heuristic, not a language classifier: a Russian
/// sentence quoting one Uzbek word is reported as Cyrillic Uzbek.
pub fn detect(text: &str) -> Locale {
    let mut cyrillic = 0usize;
    let mut latin = 0usize;
    let mut uzbek_letter = false;

    for c in text.chars() {
        if ('\u{0400}'..='\u{04FF}').contains(&c) {
            cyrillic += 1;
            if UZBEK_CYRILLIC_LETTERS.contains(&c) {
                uzbek_letter = true;
            }
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    if cyrillic > latin {
        if uzbek_letter {
            Locale::Cyrillic
        } else {
            Locale::Russian
        }
    } else {
        Locale::Latin
    }
}

/// Fixed user-facing strings for one locale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CannedMessages {
    pub waiting: String,
    pub off_topic: String,
    pub not_found: String,
    pub technical_error: String,
    /// Substituted for an empty retrieval context in the prompt.
    pub no_context: String,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Latin, Locale::Cyrillic, Locale::Russian];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Latin => "latin",
            Locale::Cyrillic => "cyrillic",
            Locale::Russian => "russian",
        }
    }

    pub fn partition(self) -> Partition {
        match self {
            Locale::Russian => Partition::Ru,
            Locale::Latin | Locale::Cyrillic => Partition::Uz,
        }
    }

    pub fn messages(self, contact: &str) -> CannedMessages {
        match self {
            Locale::Latin => CannedMessages {
                waiting: "Iltimos kuting, javob tayyorlanmoqda...".to_string(),
                off_topic: "Kechirasiz, men faqat Ekologik ekspertiza markazi faoliyati, \
                            qonun-qoidalar va ekspertiza jarayonlari bo'yicha savollarga javob beraman.\n\
                            Iltimos, shu mavzuga oid savol bering."
                    .to_string(),
                not_found: format!(
                    "Kechirasiz, bu savol bo'yicha aniq ma'lumot topilmadi.\n\
                     Iltimos, mutaxassis bilan bog'laning: {}",
                    contact
                ),
                technical_error: format!(
                    "Kechirasiz, texnik xatolik yuz berdi. Iltimos, keyinroq urinib ko'ring \
                     yoki mutaxassis bilan bog'laning:\n{}",
                    contact
                ),
                no_context: "Ma'lumot topilmadi".to_string(),
            },
            Locale::Cyrillic => CannedMessages {
                waiting: "Илтимос кутинг, жавоб тайёрланмоқда...".to_string(),
                off_topic: "Кечирасиз, мен фақат Экологик экспертиза маркази фаолияти, \
                            қонун-қоидалар ва экспертиза жараёнлари бўйича саволларга жавоб бераман.\n\
                            Илтимос, шу мавзуга оид савол беринг."
                    .to_string(),
                not_found: format!(
                    "Кечирасиз, бу савол бўйича аниқ маълумот топилмади.\n\
                     Илтимос, мутахассис билан боғланинг: {}",
                    contact
                ),
                technical_error: format!(
                    "Кечирасиз, техник хатолик юз берди. Илтимос, кейинроқ уриниб кўринг \
                     ёки мутахассис билан боғланинг:\n{}",
                    contact
                ),
                no_context: "Маълумот топилмади".to_string(),
            },
            Locale::Russian => CannedMessages {
                waiting: "Пожалуйста, подождите, ответ готовится...".to_string(),
                off_topic: "Извините, я отвечаю только на вопросы о деятельности Центра \
                            экологической экспертизы, нормативных требованиях и процедурах экспертизы.\n\
                            Пожалуйста, задайте вопрос по этой теме."
                    .to_string(),
                not_found: format!(
                    "Извините, точная информация по этому вопросу не найдена.\n\
                     Пожалуйста, свяжитесь со специалистом: {}",
                    contact
                ),
                technical_error: format!(
                    "Извините, произошла техническая ошибка. Пожалуйста, попробуйте позже \
                     или свяжитесь со специалистом:\n{}",
                    contact
                ),
                no_context: "Информация не найдена".to_string(),
            },
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
