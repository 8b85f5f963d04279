//! Purchase-link normalization and repair.
//!
//! Links from the backend are often schemeless, percent-encoded twice or
//! hallucinated outright. [`resolve_link`] turns whatever arrived into a
//! browsable URL, falling back to a retailer site search or a web search.

use crate::protocol::RecommendationItem;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Repaired,
    Fallback,
    Failed,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "valid",
            LinkStatus::Repaired => "repaired",
            LinkStatus::Fallback => "fallback",
            LinkStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub url: Option<String>,
    pub status: LinkStatus,
}

/// A recommendation paired with its resolved link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecommendation {
    pub item: RecommendationItem,
    pub link: ResolvedLink,
}

impl ResolvedRecommendation {
    pub fn resolve(item: RecommendationItem, category: &str) -> Self {
        let link = resolve_link(item.raw_url(), &item, category);
        Self { item, link }
    }
}

enum PriceWindow {
    None,
    /// Separate lower and upper bound parameters.
    Bounds(&'static str, &'static str),
    /// A single `min-max` parameter.
    Range(&'static str),
}

struct Retailer {
    domain: &'static str,
    search_url: &'static str,
    query_param: &'static str,
    price: PriceWindow,
    category_paths: bool,
}

const RETAILERS: &[Retailer] = &[
    Retailer {
        domain: "hepsiburada.com",
        search_url: "https://www.hepsiburada.com/ara",
        query_param: "q",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "trendyol.com",
        search_url: "https://www.trendyol.com/sr",
        query_param: "q",
        price: PriceWindow::Range("prc"),
        category_paths: false,
    },
    Retailer {
        domain: "n11.com",
        search_url: "https://www.n11.com/arama",
        query_param: "q",
        price: PriceWindow::None,
        category_paths: true,
    },
    Retailer {
        domain: "amazon.com.tr",
        search_url: "https://www.amazon.com.tr/s",
        query_param: "k",
        price: PriceWindow::Bounds("low-price", "high-price"),
        category_paths: false,
    },
    Retailer {
        domain: "teknosa.com",
        search_url: "https://www.teknosa.com/arama",
        query_param: "q",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "vatanbilgisayar.com",
        search_url: "https://www.vatanbilgisayar.com/arama/",
        query_param: "text",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "mediamarkt.com.tr",
        search_url: "https://www.mediamarkt.com.tr/tr/search.html",
        query_param: "query",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "gittigidiyor.com",
        search_url: "https://www.gittigidiyor.com/arama/",
        query_param: "k",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "itopya.com",
        search_url: "https://www.itopya.com/arama/",
        query_param: "q",
        price: PriceWindow::None,
        category_paths: false,
    },
    Retailer {
        domain: "incehesap.com",
        search_url: "https://www.incehesap.com/arama",
        query_param: "q",
        price: PriceWindow::None,
        category_paths: false,
    },
];

/// n11 listing paths, searched with the same query parameter.
const N11_CATEGORY_PATHS: &[(&str, &str)] = &[
    ("laptop", "/bilgisayar/dizustu-bilgisayar"),
    ("phone", "/telefon-ve-aksesuarlari/cep-telefonu"),
    ("headphones", "/telefon-ve-aksesuarlari/kulaklik"),
    ("mouse", "/bilgisayar/cevre-birimleri/mouse"),
    ("keyboard", "/bilgisayar/cevre-birimleri/klavye"),
    ("monitor", "/bilgisayar/monitor-ve-ekran"),
    ("tablet", "/bilgisayar/tablet"),
];

/// Checked in order; the first substring hit wins.
const KNOWN_BRANDS: &[&str] = &[
    "apple", "samsung", "xiaomi", "huawei", "oneplus", "google", "nokia", "sony", "logitech",
    "razer", "steelseries", "corsair", "hyperx", "lenovo", "asus", "acer", "dell", "msi",
    "monster", "casper", "sennheiser", "jbl", "bose", "anker", "philips", "canon", "nikon",
    "lg", "hp",
];

const GENERIC_SEARCH: &str = "https://www.google.com/search";

/// Letters and digits mixed in one token, e.g. `G502`, `WH-1000XM5` yields `1000XM5`.
/// Bare numbers such as screen sizes never match.
static MODEL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:[a-z]+\d+|\d+[a-z]+)[a-z0-9]*\b").ok());

/// Resolves `raw_url` into a usable link for `item`.
///
/// Only an empty input yields [`LinkStatus::Failed`]; anything else produces
/// a well-formed absolute URL.
pub fn resolve_link(raw_url: &str, item: &RecommendationItem, category: &str) -> ResolvedLink {
    let raw = raw_url.trim();
    if raw.is_empty() {
        return ResolvedLink {
            url: None,
            status: LinkStatus::Failed,
        };
    }

    // Valid absolute input is returned undecoded so escaped `%26`/`%2F` survive.
    if has_http_scheme(raw) {
        if let Some(url) = strict_url(raw) {
            let status = if raw == raw_url {
                LinkStatus::Valid
            } else {
                LinkStatus::Repaired
            };
            return ResolvedLink {
                url: Some(url.into()),
                status,
            };
        }
    }

    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("keeping undecodable url {:?}: {}", raw, e);
            raw.to_string()
        }
    };
    let candidates = if decoded == raw {
        vec![decoded]
    } else {
        vec![decoded, raw.to_string()]
    };

    for candidate in candidates.iter().filter_map(|c| with_scheme(c)) {
        if let Some(url) = strict_url(&candidate) {
            return ResolvedLink {
                url: Some(url.into()),
                status: LinkStatus::Repaired,
            };
        }
    }

    debug!("link {:?} failed validation, building fallback", raw);
    ResolvedLink {
        url: Some(fallback_url(raw, item, category)),
        status: LinkStatus::Fallback,
    }
}

/// Adds `https://` when the input is a bare domain. Returns `None` for
/// schemeless input that is not one.
fn with_scheme(candidate: &str) -> Option<String> {
    if has_http_scheme(candidate) {
        return Some(candidate.to_string());
    }
    let lowered = candidate.to_lowercase();
    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if looks_like_bare_domain(&lowered) {
        return Some(format!("https://{}", candidate));
    }
    None
}

fn has_http_scheme(candidate: &str) -> bool {
    let lowered = candidate.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// `www.` anything, or a lone host name such as `trendyol.com` or `n11.com/`.
fn looks_like_bare_domain(lowered: &str) -> bool {
    if lowered.starts_with("www.") {
        return true;
    }
    let host = lowered.strip_suffix('/').unwrap_or(lowered);
    if host.contains(&['/', '?', '#', ' ', ':'][..]) {
        return false;
    }
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && labels
            .last()
            .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

fn strict_url(candidate: &str) -> Option<Url> {
    if candidate.chars().any(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    let tld = host.rsplit('.').next()?;
    if !host.contains('.') || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(url)
}

/// First known brand contained in the title.
pub fn detect_brand(title: &str) -> Option<&'static str> {
    let lowered = title.to_lowercase();
    KNOWN_BRANDS.iter().copied().find(|brand| {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *brand)
            || (brand.len() > 3 && lowered.contains(brand))
    })
}

pub fn detect_model(title: &str) -> Option<String> {
    MODEL_PATTERN
        .as_ref()?
        .find(title)
        .map(|m| m.as_str().to_string())
}

/// Title words followed by brand and model, each word once.
pub fn enhanced_query(title: &str) -> String {
    let mut words: Vec<String> = title.split_whitespace().map(str::to_string).collect();
    let extra = [detect_brand(title).map(str::to_string), detect_model(title)];
    for token in extra.into_iter().flatten() {
        if !words.iter().any(|w| w.eq_ignore_ascii_case(&token)) {
            words.push(token);
        }
    }
    words.join(" ")
}

fn fallback_url(raw: &str, item: &RecommendationItem, category: &str) -> String {
    let title = match item.title() {
        "" => category.trim(),
        title => title,
    };
    let site = item.source_site().map(str::to_lowercase);

    let retailer = site
        .as_deref()
        .and_then(find_retailer)
        .or_else(|| find_retailer(&raw.to_lowercase()));

    if let Some(retailer) = retailer {
        let query = enhanced_query(title);
        if let Some(url) = retailer_search(retailer, &query, item, category) {
            debug!("retailer fallback on {}", retailer.domain);
            return url;
        }
    }

    let query = match site.as_deref().map(site_host) {
        Some(host) if !host.is_empty() && host.contains('.') => format!("{} site:{}", title, host),
        _ => title.to_string(),
    };
    generic_search(&query)
}

fn find_retailer(haystack: &str) -> Option<&'static Retailer> {
    RETAILERS.iter().find(|r| haystack.contains(r.domain))
}

fn site_host(site: &str) -> &str {
    let site = site.trim();
    let site = site
        .strip_prefix("https://")
        .or_else(|| site.strip_prefix("http://"))
        .unwrap_or(site);
    site.split('/').next().unwrap_or(site)
}

fn retailer_search(
    retailer: &Retailer,
    query: &str,
    item: &RecommendationItem,
    category: &str,
) -> Option<String> {
    let mut url = Url::parse_with_params(retailer.search_url, &[(retailer.query_param, query)]).ok()?;

    if retailer.category_paths {
        let key = category.trim().to_lowercase();
        if let Some((_, path)) = N11_CATEGORY_PATHS.iter().find(|(name, _)| *name == key) {
            url.set_path(path);
        }
    }

    if let Some(price) = item.price().and_then(|p| p.numeric()).filter(|p| *p > 0.0) {
        let low = (price * 0.8).floor() as u64;
        let high = (price * 1.2).ceil() as u64;
        match retailer.price {
            PriceWindow::Bounds(min, max) => {
                url.query_pairs_mut()
                    .append_pair(min, &low.to_string())
                    .append_pair(max, &high.to_string());
            }
            PriceWindow::Range(param) => {
                url.query_pairs_mut()
                    .append_pair(param, &format!("{}-{}", low, high));
            }
            PriceWindow::None => {}
        }
    }

    Some(url.into())
}

fn generic_search(query: &str) -> String {
    match Url::parse_with_params(GENERIC_SEARCH, &[("q", query)]) {
        Ok(url) => url.into(),
        Err(_) => format!("{}?q={}", GENERIC_SEARCH, urlencoding::encode(query)),
    }
}
