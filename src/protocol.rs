//! Request and reply types exchanged with the recommendation backend.
//!
//! Replies arrive in loosely shaped JSON. Everything is decoded here, once,
//! into typed values so the controller never probes raw fields.

use crate::i18n::Locale;
use crate::suggest::SuggestionRecord;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_QUESTION_EMOJI: &str = "🔍";

#[derive(Debug, Clone, Serialize)]
pub struct DetectRequest<'a> {
    pub query: &'a str,
    pub language: Locale,
}

/// Outcome of category detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectReply {
    pub category: Option<String>,
    pub error: Option<String>,
}

impl DetectReply {
    /// Accepts `{category: "Laptop"}`, `{category: {name: "Laptop"}}` and
    /// treats `success: false` or an empty category as a miss.
    pub fn from_value(value: &Value) -> Self {
        let error = value.get("error").and_then(non_empty_text);
        let rejected = value.get("success").and_then(Value::as_bool) == Some(false);

        let category = match value.get("category") {
            Some(Value::Object(obj)) => obj.get("name").and_then(non_empty_text),
            Some(other) => non_empty_text(other),
            None => None,
        };

        Self {
            category: if rejected { None } else { category },
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRequest {
    pub step: u32,
    pub category: String,
    pub answers: Vec<String>,
    pub language: Locale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
    pub emoji: String,
    pub tooltip: Option<String>,
    pub is_budget_step: bool,
}

impl QuestionView {
    /// Finds the offered option matching `answer`, ignoring case.
    pub fn option_for(&self, answer: &str) -> Option<&str> {
        let answer = answer.trim();
        self.options
            .iter()
            .find(|opt| opt.as_str() == answer)
            .or_else(|| {
                self.options
                    .iter()
                    .find(|opt| opt.to_lowercase() == answer.to_lowercase())
            })
            .map(String::as_str)
    }
}

/// A step reply, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum StepReply {
    Question(QuestionView),
    Recommendations(Vec<RecommendationItem>),
    CategoryList(Vec<CategoryDescriptor>),
    Error(String),
    Unrecognized,
}

impl StepReply {
    /// Classifies a reply. Precedence: question with options, then
    /// recommendations, then categories, then error.
    pub fn from_value(value: &Value) -> Self {
        let question = value.get("question").and_then(non_empty_text);
        let options = value.get("options").and_then(Value::as_array);

        if let (Some(question), Some(options)) = (question, options) {
            let options = options.iter().filter_map(non_empty_text).collect();
            return StepReply::Question(QuestionView {
                question,
                options,
                emoji: value
                    .get("emoji")
                    .and_then(non_empty_text)
                    .unwrap_or_else(|| DEFAULT_QUESTION_EMOJI.to_string()),
                tooltip: value.get("tooltip").and_then(non_empty_text),
                is_budget_step: value
                    .get("is_budget_step")
                    .or_else(|| value.get("isBudgetStep"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            });
        }

        if let Some(items) = value.get("recommendations").and_then(Value::as_array) {
            let items = items
                .iter()
                .filter_map(|item| match serde_json::from_value(item.clone()) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        tracing::warn!("skipping malformed recommendation: {}", e);
                        None
                    }
                })
                .collect();
            return StepReply::Recommendations(items);
        }

        if let Some(categories) = value.get("categories").filter(|v| !v.is_null()) {
            return StepReply::CategoryList(parse_categories(categories));
        }

        if let Some(error) = value.get("error").filter(|v| !v.is_null()) {
            let message = non_empty_text(error).unwrap_or_else(|| error.to_string());
            return StepReply::Error(message);
        }

        StepReply::Unrecognized
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDescriptor {
    pub name: String,
    pub specs: Vec<String>,
    pub emoji: Option<String>,
    pub icon: Option<String>,
}

impl CategoryDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn from_object(name: String, obj: &serde_json::Map<String, Value>) -> Self {
        let specs = obj
            .get("specs")
            .and_then(Value::as_array)
            .map(|specs| {
                specs
                    .iter()
                    .filter_map(|spec| match spec {
                        Value::Object(o) => o.get("name").and_then(non_empty_text),
                        other => non_empty_text(other),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name,
            specs,
            emoji: obj.get("emoji").and_then(non_empty_text),
            icon: obj.get("icon").and_then(non_empty_text),
        }
    }
}

/// Reads a category listing given as a name-keyed map, an array of names or
/// descriptor objects, or either of those wrapped in `{categories: ...}`.
pub fn parse_categories(value: &Value) -> Vec<CategoryDescriptor> {
    match value {
        Value::Object(map) => {
            if let Some(inner) = map.get("categories") {
                return parse_categories(inner);
            }
            map.iter()
                .map(|(name, meta)| match meta {
                    Value::Object(obj) => CategoryDescriptor::from_object(name.clone(), obj),
                    _ => CategoryDescriptor::named(name.clone()),
                })
                .collect()
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => obj
                    .get("name")
                    .and_then(non_empty_text)
                    .map(|name| CategoryDescriptor::from_object(name, obj)),
                other => non_empty_text(other).map(CategoryDescriptor::named),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// One product as returned by the backend. Field aliases are kept apart and
/// resolved through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub product_url: Option<String>,
    pub link: Option<String>,
    pub url: Option<String>,
    pub source_site: Option<String>,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub match_score: Option<f64>,
    #[serde(default, deserialize_with = "string_list")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub cons: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub reviews: Option<f64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub why_recommended: Option<String>,
}

impl RecommendationItem {
    pub fn title(&self) -> &str {
        first_filled(&[&self.title, &self.name]).unwrap_or("")
    }

    /// The candidate purchase URL, before any repair.
    pub fn raw_url(&self) -> &str {
        first_filled(&[&self.product_url, &self.link, &self.url]).unwrap_or("")
    }

    pub fn source_site(&self) -> Option<&str> {
        first_filled(&[&self.source_site, &self.source])
    }

    pub fn price(&self) -> Option<Price> {
        self.price.as_ref().and_then(Price::from_value)
    }
}

fn first_filled<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| field.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    Amount {
        value: Option<f64>,
        display: Option<String>,
        currency: Option<String>,
    },
    Number(f64),
    Text(String),
}

impl Price {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Price::Number),
            Value::String(s) if !s.trim().is_empty() => Some(Price::Text(s.trim().to_string())),
            Value::Object(obj) => {
                let value = obj.get("value").and_then(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => parse_price_text(s),
                    _ => None,
                });
                let display = obj.get("display").and_then(non_empty_text);
                if value.is_none() && display.is_none() {
                    return None;
                }
                Some(Price::Amount {
                    value,
                    display,
                    currency: obj.get("currency").and_then(non_empty_text),
                })
            }
            _ => None,
        }
    }

    /// Best-effort numeric amount, understanding `12.499 ₺`, `1.299,90 TL`,
    /// `$1,299.99` and `2.5k`.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Price::Amount { value: Some(v), .. } => Some(*v),
            Price::Amount {
                display: Some(d), ..
            } => parse_price_text(d),
            Price::Amount { .. } => None,
            Price::Number(n) => Some(*n),
            Price::Text(s) => parse_price_text(s),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Price::Amount {
                display: Some(d), ..
            } => d.clone(),
            Price::Amount {
                value: Some(v),
                currency,
                ..
            } => match currency {
                Some(c) => format!("{:.2} {}", v, c),
                None => format!("{:.2}", v),
            },
            Price::Amount { .. } => String::new(),
            Price::Number(n) => format!("{:.2}", n),
            Price::Text(s) => s.clone(),
        }
    }
}

pub fn parse_price_text(raw: &str) -> Option<f64> {
    let mut cleaned = raw.to_lowercase();
    for symbol in ["₺", "try", "tl", "$", "usd", "€", "eur"] {
        cleaned = cleaned.replace(symbol, "");
    }
    let cleaned = cleaned.trim();
    let (cleaned, multiplier) = match cleaned.strip_suffix('k') {
        Some(rest) => (rest.trim_end(), 1000.0),
        None => (cleaned, 1.0),
    };

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(comma), None) => {
            if group_of_three(&cleaned[comma + 1..]) {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, Some(dot)) => {
            if cleaned.matches('.').count() > 1 || group_of_three(&cleaned[dot + 1..]) {
                cleaned.replace('.', "")
            } else {
                cleaned.to_string()
            }
        }
        (None, None) => cleaned.to_string(),
    };

    let number: String = normalized
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .map(|v| v * multiplier)
}

fn group_of_three(tail: &str) -> bool {
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    digits.len() == 3
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingRequest {
    pub query: String,
    pub country: String,
    pub language: Locale,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShoppingProduct {
    pub title: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub link: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub reviews: Option<f64>,
    pub thumbnail: Option<String>,
}

impl From<ShoppingProduct> for RecommendationItem {
    fn from(product: ShoppingProduct) -> Self {
        RecommendationItem {
            title: product.title,
            name: product.name,
            price: product.price,
            link: product.link,
            url: product.url,
            source: product.source,
            rating: product.rating,
            reviews: product.reviews,
            image: product.thumbnail,
            ..RecommendationItem::default()
        }
    }
}

/// Products from the shopping lookup: a bare array, or an object carrying
/// `products`, `results` or `recommendations`. An `error` field wins.
pub fn parse_shopping(value: &Value) -> Result<Vec<ShoppingProduct>, String> {
    if let Some(error) = value.get("error").and_then(non_empty_text) {
        return Err(error);
    }
    let list = match value {
        Value::Array(_) => Some(value),
        Value::Object(_) => ["products", "results", "recommendations"]
            .iter()
            .find_map(|key| value.get(*key).filter(|v| v.is_array())),
        _ => None,
    };
    Ok(list
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteReply {
    #[serde(default)]
    pub suggestions: Vec<SuggestionRecord>,
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(non_empty_text).collect(),
        other => non_empty_text(&other).into_iter().collect(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').replace(',', ".").parse().ok(),
        _ => None,
    })
}
