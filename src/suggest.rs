//! Incremental autocomplete over a prefix-keyed product dictionary.

use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
}

impl SuggestionRecord {
    pub fn new(text: &str, icon: &str, category: &str) -> Self {
        Self {
            text: text.to_string(),
            icon: icon.to_string(),
            category: category.to_string(),
        }
    }
}

/// Static dictionary keyed by lowercase prefixes. Keys keep insertion order,
/// which is also the order results are produced in.
#[derive(Debug, Clone, Default)]
pub struct SuggestionIndex {
    entries: Vec<(String, Vec<SuggestionRecord>)>,
}

impl SuggestionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records under `key`, extending the key if it already exists.
    pub fn insert(&mut self, key: &str, records: Vec<SuggestionRecord>) {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(records),
            None => self.entries.push((key, records)),
        }
    }

    /// Builds an index where every term is reachable from each of its
    /// prefixes up to `max_key_len` characters.
    pub fn from_terms(terms: &[SuggestionRecord], max_key_len: usize) -> Self {
        let mut index = Self::new();
        for record in terms {
            let lowered = record.text.to_lowercase();
            let chars: Vec<char> = lowered.chars().collect();
            for len in 1..=chars.len().min(max_key_len) {
                let key: String = chars[..len].iter().collect();
                if key.ends_with(' ') {
                    continue;
                }
                index.insert(&key, vec![record.clone()]);
            }
        }
        index
    }

    pub fn builtin(locale: Locale) -> Self {
        match locale {
            Locale::Tr => {
                let mut index = Self::new();
                for (key, records) in TR_DICTIONARY {
                    index.insert(
                        key,
                        records
                            .iter()
                            .map(|(text, icon, category)| SuggestionRecord::new(text, icon, category))
                            .collect(),
                    );
                }
                index
            }
            Locale::En => {
                let terms: Vec<SuggestionRecord> = EN_POPULAR
                    .iter()
                    .map(|(text, icon, category)| SuggestionRecord::new(text, icon, category))
                    .collect();
                Self::from_terms(&terms, 6)
            }
        }
    }

    /// Prefix-anchored matches first (keys the query starts with), then any
    /// record whose text contains the query. Deduplicated by text ignoring
    /// case, capped at [`MAX_SUGGESTIONS`].
    pub fn suggest(&self, query: &str) -> Vec<SuggestionRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        let prefix_hits = self
            .entries
            .iter()
            .filter(|(key, _)| query.starts_with(key.as_str()))
            .flat_map(|(_, records)| records.iter());
        let substring_hits = self
            .entries
            .iter()
            .flat_map(|(_, records)| records.iter())
            .filter(|record| record.text.to_lowercase().contains(&query));

        for record in prefix_hits.chain(substring_hits) {
            if results.len() == MAX_SUGGESTIONS {
                break;
            }
            if seen.insert(record.text.to_lowercase()) {
                results.push(record.clone());
            }
        }

        results
    }
}

/// Appends backend suggestions after the local ones, keeping the same dedup
/// and cap rules.
pub fn merge_remote(local: Vec<SuggestionRecord>, remote: Vec<SuggestionRecord>) -> Vec<SuggestionRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    local
        .into_iter()
        .chain(remote)
        .filter(|record| !record.text.trim().is_empty())
        .filter(|record| seen.insert(record.text.to_lowercase()))
        .take(MAX_SUGGESTIONS)
        .collect()
}

type Entry = (&'static str, &'static str, &'static str);

const KULAKLIK: Entry = ("Kulaklık", "🎧", "Headphones");
const KLAVYE: Entry = ("Klavye", "⌨️", "Keyboard");
const KAMERA: Entry = ("Kamera", "📷", "Camera");
const KLIMA: Entry = ("Klima", "❄️", "Air Conditioner");
const LAPTOP: Entry = ("Laptop", "💻", "Laptop");
const MOUSE: Entry = ("Mouse", "🖱️", "Mouse");
const MOUSE_GAMING: Entry = ("Mouse Gaming", "🖱️", "Mouse");
const MOUSE_KABLOSUZ: Entry = ("Mouse Kablosuz", "🖱️", "Mouse");
const MOUSE_BLUETOOTH: Entry = ("Mouse Bluetooth", "🖱️", "Mouse");
const MOUSE_LOGITECH: Entry = ("Mouse Logitech", "🖱️", "Mouse");
const MOUSE_RAZER: Entry = ("Mouse Razer", "🖱️", "Mouse");
const TELEFON: Entry = ("Telefon", "📱", "Phone");
const TELEFON_IPHONE: Entry = ("Telefon iPhone", "📱", "Phone");
const TELEFON_SAMSUNG: Entry = ("Telefon Samsung", "📱", "Phone");
const TELEFON_XIAOMI: Entry = ("Telefon Xiaomi", "📱", "Phone");
const TELEFON_HUAWEI: Entry = ("Telefon Huawei", "📱", "Phone");
const TABLET: Entry = ("Tablet", "📱", "Tablet");
const TV: Entry = ("TV", "📺", "TV");
const TELEVIZYON: Entry = ("Televizyon", "📺", "TV");

const TR_DICTIONARY: &[(&str, &[Entry])] = &[
    (
        "k",
        &[KULAKLIK, KLAVYE, KAMERA, KLIMA, ("Kettle", "☕", "Kitchen"), ("Konsol", "🎮", "Gaming")],
    ),
    ("kl", &[KLIMA, KLAVYE]),
    ("kli", &[KLIMA]),
    ("klim", &[KLIMA]),
    ("l", &[LAPTOP]),
    ("la", &[LAPTOP]),
    ("lap", &[LAPTOP]),
    ("lapt", &[LAPTOP]),
    ("lapto", &[LAPTOP]),
    (
        "laptop",
        &[
            ("Laptop Gaming", "💻", "Laptop"),
            ("Laptop Ultrabook", "💻", "Laptop"),
            ("Laptop 2 in 1", "💻", "Laptop"),
            ("Laptop MacBook", "💻", "Laptop"),
            ("Laptop Dell", "💻", "Laptop"),
            ("Laptop HP", "💻", "Laptop"),
            ("Laptop Lenovo", "💻", "Laptop"),
            ("Laptop Asus", "💻", "Laptop"),
        ],
    ),
    (
        "m",
        &[
            MOUSE,
            MOUSE_GAMING,
            MOUSE_KABLOSUZ,
            MOUSE_BLUETOOTH,
            MOUSE_LOGITECH,
            MOUSE_RAZER,
            ("Mouse SteelSeries", "🖱️", "Mouse"),
            ("Mouse Corsair", "🖱️", "Mouse"),
        ],
    ),
    ("mo", &[MOUSE, MOUSE_GAMING, MOUSE_KABLOSUZ, MOUSE_BLUETOOTH]),
    ("mou", &[MOUSE, MOUSE_GAMING, MOUSE_KABLOSUZ, MOUSE_BLUETOOTH, MOUSE_LOGITECH]),
    (
        "mouse",
        &[
            MOUSE_GAMING,
            MOUSE_KABLOSUZ,
            MOUSE_BLUETOOTH,
            MOUSE_LOGITECH,
            MOUSE_RAZER,
            ("Mouse HyperX", "🖱️", "Mouse"),
        ],
    ),
    (
        "t",
        &[TELEFON, TABLET, TV, TELEVIZYON, TELEFON_IPHONE, TELEFON_SAMSUNG, TELEFON_XIAOMI, TELEFON_HUAWEI],
    ),
    ("te", &[TELEFON, TABLET, TV, TELEVIZYON]),
    ("tel", &[TELEFON, TELEFON_IPHONE, TELEFON_SAMSUNG, TELEFON_XIAOMI, TELEFON_HUAWEI]),
    (
        "telefon",
        &[
            TELEFON_IPHONE,
            TELEFON_SAMSUNG,
            TELEFON_XIAOMI,
            TELEFON_HUAWEI,
            ("Telefon OnePlus", "📱", "Phone"),
            ("Telefon Google", "📱", "Phone"),
        ],
    ),
    ("gaming", &[("Gaming Laptop", "💻", "Laptop"), ("Gaming Mouse", "🖱️", "Mouse")]),
    ("kablosuz", &[("Kablosuz Kulaklık", "🎧", "Headphones")]),
    ("akıllı", &[("Akıllı Saat", "⌚", "Smartwatch"), ("Akıllı Telefon", "📱", "Phone")]),
];

const EN_POPULAR: &[Entry] = &[
    ("wireless headphones", "🎧", "Headphones"),
    ("gaming laptop", "💻", "Laptop"),
    ("smartphone", "📱", "Phone"),
    ("bluetooth speaker", "🔊", "Speaker"),
    ("tablet", "📱", "Tablet"),
    ("smartwatch", "⌚", "Smartwatch"),
    ("drone", "🚁", "Drone"),
    ("camera", "📷", "Camera"),
    ("gaming keyboard", "⌨️", "Keyboard"),
    ("gaming mouse", "🖱️", "Mouse"),
    ("power bank", "🔋", "Accessory"),
    ("wifi router", "📶", "Network"),
    ("external drive", "💾", "Storage"),
    ("microphone", "🎤", "Audio"),
    ("webcam", "📹", "Video"),
    ("vr headset", "🥽", "VR"),
    ("smart tv", "📺", "TV"),
    ("gaming console", "🎮", "Gaming"),
    ("fitness tracker", "⌚", "Smartwatch"),
    ("laptop", "💻", "Laptop"),
    ("mouse", "🖱️", "Mouse"),
    ("monitor", "🖥️", "Monitor"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(records: &[SuggestionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn empty_query_yields_nothing() {
        let index = SuggestionIndex::builtin(Locale::Tr);
        assert!(index.suggest("").is_empty());
        assert!(index.suggest("   ").is_empty());
    }

    #[test]
    fn prefix_matches_precede_substring_matches() {
        let mut index = SuggestionIndex::new();
        index.insert("lap", vec![SuggestionRecord::new("Laptop", "💻", "Laptop")]);
        index.insert("gam", vec![SuggestionRecord::new("Gaming Laptop", "💻", "Laptop")]);

        let results = index.suggest("laptop");
        assert_eq!(texts(&results), vec!["Laptop", "Gaming Laptop"]);
    }

    #[test]
    fn deduplicates_ignoring_case() {
        let mut index = SuggestionIndex::new();
        index.insert("t", vec![SuggestionRecord::new("Tablet", "", "Tablet")]);
        index.insert("ta", vec![SuggestionRecord::new("tablet", "", "Tablet")]);
        let results = index.suggest("tab");
        assert_eq!(texts(&results), vec!["Tablet"]);
    }

    #[test]
    fn results_are_capped() {
        let index = SuggestionIndex::builtin(Locale::Tr);
        let results = index.suggest("telefon");
        assert_eq!(results.len(), MAX_SUGGESTIONS);
        let unique: HashSet<String> = results.iter().map(|r| r.text.to_lowercase()).collect();
        assert_eq!(unique.len(), results.len());
    }

    #[test]
    fn short_query_still_matches_substrings() {
        let mut index = SuggestionIndex::new();
        index.insert("mouse", vec![SuggestionRecord::new("Mouse Razer", "", "Mouse")]);
        assert_eq!(texts(&index.suggest("raz")), vec!["Mouse Razer"]);
        assert!(index.suggest("zzz").is_empty());
    }

    #[test]
    fn english_terms_reachable_by_prefix() {
        let index = SuggestionIndex::builtin(Locale::En);
        let results = index.suggest("gam");
        assert_eq!(results[0].text, "gaming laptop");
        assert!(texts(&results).contains(&"gaming console"));
    }

    #[test]
    fn remote_results_follow_local_ones() {
        let local = vec![SuggestionRecord::new("Laptop", "", "Laptop")];
        let remote = vec![
            SuggestionRecord::new("laptop", "", "Laptop"),
            SuggestionRecord::new("Laptop Çantası", "", "Accessory"),
        ];
        assert_eq!(texts(&merge_remote(local, remote)), vec!["Laptop", "Laptop Çantası"]);
    }
}
