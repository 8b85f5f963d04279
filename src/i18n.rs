use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface language. Sent with every backend request and used for every
/// message the controller shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Tr,
    En,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Tr => "tr",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tr" | "turkish" | "türkçe" => Ok(Locale::Tr),
            "en" | "english" => Ok(Locale::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    EmptyQuery,
    CategoryNotFound,
    ServerUnreachable,
    Timeout,
    UnexpectedResponse,
    CategoriesFailed,
    RequestInFlight,
    UnknownOption,
    Detecting,
    PreparingQuestion,
    Analysing,
    Landing,
    Recommended,
    BuyNow,
    Reviews,
    Pros,
    Cons,
    Features,
    NoSuggestions,
}

/// Localized text for a controller message.
pub fn text(message: Message, locale: Locale) -> &'static str {
    use Message::*;
    match (message, locale) {
        (EmptyQuery, Locale::Tr) => "Lütfen bir ürün yazın",
        (EmptyQuery, Locale::En) => "Please enter a product",
        (CategoryNotFound, Locale::Tr) => "Aradığınız kategoriyi bulamadım. Lütfen başka bir şey deneyin.",
        (CategoryNotFound, Locale::En) => "Could not find the category you are looking for. Please try something else.",
        (ServerUnreachable, Locale::Tr) => "Sunucuya erişilemiyor: ",
        (ServerUnreachable, Locale::En) => "Cannot access server: ",
        (Timeout, Locale::Tr) => "İstek zaman aşımına uğradı. AI analizi uzun sürdü, lütfen tekrar deneyin.",
        (Timeout, Locale::En) => "Request timed out. AI analysis took too long, please try again.",
        (UnexpectedResponse, Locale::Tr) => "Beklenmeyen bir yanıt alındı. Lütfen tekrar deneyin.",
        (UnexpectedResponse, Locale::En) => "An unexpected response was received. Please try again.",
        (CategoriesFailed, Locale::Tr) => "Kategoriler yüklenemedi.",
        (CategoriesFailed, Locale::En) => "Categories could not be loaded.",
        (RequestInFlight, Locale::Tr) => "Önceki istek hâlâ işleniyor, lütfen bekleyin.",
        (RequestInFlight, Locale::En) => "The previous request is still running, please wait.",
        (UnknownOption, Locale::Tr) => "Lütfen listedeki seçeneklerden birini seçin.",
        (UnknownOption, Locale::En) => "Please pick one of the listed options.",
        (Detecting, Locale::Tr) => "Kategori belirleniyor...",
        (Detecting, Locale::En) => "Detecting category...",
        (PreparingQuestion, Locale::Tr) => "Soru hazırlanıyor...",
        (PreparingQuestion, Locale::En) => "Preparing question...",
        (Analysing, Locale::Tr) => "AI ürünleri analiz ediyor, bu biraz sürebilir...",
        (Analysing, Locale::En) => "AI is analysing products, this may take a while...",
        (Landing, Locale::Tr) => "Ne arıyorsunuz? Bir ürün yazın veya kategori seçin.",
        (Landing, Locale::En) => "What are you looking for? Type a product or pick a category.",
        (Recommended, Locale::Tr) => "Önerilen Ürünler",
        (Recommended, Locale::En) => "Recommended Products",
        (BuyNow, Locale::Tr) => "Satın Al",
        (BuyNow, Locale::En) => "Buy Now",
        (Reviews, Locale::Tr) => "değerlendirme",
        (Reviews, Locale::En) => "reviews",
        (Pros, Locale::Tr) => "Artılar",
        (Pros, Locale::En) => "Pros",
        (Cons, Locale::Tr) => "Eksiler",
        (Cons, Locale::En) => "Cons",
        (Features, Locale::Tr) => "Özellikler",
        (Features, Locale::En) => "Features",
        (NoSuggestions, Locale::Tr) => "Öneri bulunamadı",
        (NoSuggestions, Locale::En) => "No suggestions",
    }
}

/// Display name for a backend category key. Unknown keys are shown as-is.
pub fn category_label(category: &str, locale: Locale) -> String {
    let translated = match (category, locale) {
        ("Headphones", Locale::Tr) => Some("Kulaklık"),
        ("Phone", Locale::Tr) => Some("Telefon"),
        ("Keyboard", Locale::Tr) => Some("Klavye"),
        ("Monitor", Locale::Tr) => Some("Monitör"),
        ("Speaker", Locale::Tr) => Some("Hoparlör"),
        ("Camera", Locale::Tr) => Some("Kamera"),
        ("Smartwatch", Locale::Tr) => Some("Akıllı Saat"),
        ("Air Conditioner", Locale::Tr) => Some("Klima"),
        _ => None,
    };
    translated.unwrap_or(category).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_codes() {
        assert_eq!("TR".parse::<Locale>(), Ok(Locale::Tr));
        assert_eq!(" en ".parse::<Locale>(), Ok(Locale::En));
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn labels_fall_back_to_key() {
        assert_eq!(category_label("Headphones", Locale::Tr), "Kulaklık");
        assert_eq!(category_label("Headphones", Locale::En), "Headphones");
        assert_eq!(category_label("Drone", Locale::Tr), "Drone");
    }

    #[test]
    fn timeout_message_mentions_duration() {
        assert!(text(Message::Timeout, Locale::En).contains("took too long"));
        assert!(text(Message::Timeout, Locale::Tr).contains("uzun sürdü"));
    }
}
