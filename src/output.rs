use crate::error::{Failure, FailureKind};
use crate::i18n::{self, Locale, Message};
use crate::links::{LinkStatus, ResolvedLink, ResolvedRecommendation};
use crate::protocol::{CategoryDescriptor, QuestionView};
use crate::render::{LoadingKind, Renderer};
use crate::suggest::SuggestionRecord;
use console::style;
use reedline::ExternalPrinter;

/// Terminal renderer. While the line editor owns the terminal, output goes
/// through its external printer so the prompt is redrawn underneath.
pub struct OutputHandler {
    debug: bool,
    printer: Option<ExternalPrinter<String>>,
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            debug: false,
            printer: None,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_printer(mut self, printer: ExternalPrinter<String>) -> Self {
        self.printer = Some(printer);
        self
    }

    fn emit(&self, text: String) {
        match &self.printer {
            Some(printer) => {
                if printer.print(text.clone()).is_err() {
                    println!("{}", text);
                }
            }
            None => println!("{}", text),
        }
    }

    pub fn print_banner(&self) {
        self.emit(format!(
            "{}\n{}\n{}",
            style("╔═══════════════════════════════════════╗").cyan().bold(),
            style("║   SwipeStyle - Product Recommender    ║").cyan().bold(),
            style("╚═══════════════════════════════════════╝").cyan().bold()
        ));
    }

    pub fn print_help(&self) {
        let lines = [
            ("<text>", "search for a product, or answer the current question"),
            ("<number>", "pick a numbered option or category"),
            ("?<prefix>", "show suggestions for a prefix"),
            ("/cat <name>", "start with a category"),
            ("/categories", "reload the category list"),
            ("/lang tr|en", "switch language"),
            ("/reset", "back to the landing screen"),
            ("/quit", "exit"),
        ];
        let mut out = String::new();
        for (command, description) in lines {
            out.push_str(&format!("  {:<14} {}\n", style(command).cyan(), style(description).dim()));
        }
        self.emit(out.trim_end().to_string());
    }

    pub fn print_system(&self, content: &str) {
        self.emit(style(content).yellow().dim().to_string());
    }

    pub fn print_debug(&self, content: &str) {
        if self.debug {
            self.emit(style(format!("[debug] {}", content)).dim().to_string());
        }
    }

    pub fn print_suggestions(&self, suggestions: &[SuggestionRecord], locale: Locale) {
        if suggestions.is_empty() {
            self.print_system(i18n::text(Message::NoSuggestions, locale));
            return;
        }
        self.emit(format_suggestions(suggestions));
    }

    pub fn print_link(&self, link: &ResolvedLink) {
        self.emit(format!(
            "{} {}",
            status_badge(link.status),
            link.url.as_deref().unwrap_or("-")
        ));
    }

    pub fn print_recommendations(&self, items: &[ResolvedRecommendation], locale: Locale) {
        self.emit(format!(
            "\n{}",
            style(format!("⭐ {}", i18n::text(Message::Recommended, locale))).green().bold()
        ));
        for (index, rec) in items.iter().enumerate() {
            self.emit(format_recommendation(index + 1, rec, locale));
        }
    }
}

impl Renderer for OutputHandler {
    fn landing(&mut self, categories: &[CategoryDescriptor], locale: Locale) {
        if !categories.is_empty() {
            self.emit(format_categories(categories, locale));
        }
        self.emit(style(i18n::text(Message::Landing, locale)).cyan().to_string());
    }

    fn loading(&mut self, kind: LoadingKind, locale: Locale) {
        let message = match kind {
            LoadingKind::Detecting => Message::Detecting,
            LoadingKind::Question => Message::PreparingQuestion,
            LoadingKind::Analysing => Message::Analysing,
        };
        self.emit(style(format!("⏳ {}", i18n::text(message, locale))).dim().to_string());
    }

    fn question(&mut self, question: &QuestionView, step: u32) {
        self.emit(format_question(question, step));
    }

    fn recommendations(&mut self, items: &[ResolvedRecommendation], locale: Locale) {
        self.print_recommendations(items, locale);
    }

    fn error(&mut self, failure: &Failure) {
        let label = match failure.kind {
            FailureKind::Timeout => "Timeout:",
            _ => "Error:",
        };
        self.emit(format!("{} {}", style(label).red().bold(), failure.message));
    }

    fn notice(&mut self, message: &str) {
        self.print_system(message);
    }

    fn reset(&mut self) {
        self.emit(style("─".repeat(40)).dim().to_string());
    }
}

fn status_badge(status: LinkStatus) -> String {
    let badge = format!("[{}]", status.as_str());
    match status {
        LinkStatus::Valid => style(badge).green().to_string(),
        LinkStatus::Repaired => style(badge).yellow().to_string(),
        LinkStatus::Fallback => style(badge).magenta().to_string(),
        LinkStatus::Failed => style(badge).red().to_string(),
    }
}

fn stars(rating: f64) -> String {
    let full = rating.clamp(0.0, 5.0).round() as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

pub fn format_categories(categories: &[CategoryDescriptor], locale: Locale) -> String {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let emoji = c.emoji.as_deref().unwrap_or("•");
            format!(
                "  {}. {} {}",
                style(i + 1).cyan(),
                emoji,
                i18n::category_label(&c.name, locale)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_question(question: &QuestionView, step: u32) -> String {
    let mut out = format!(
        "\n{} {} {}",
        question.emoji,
        style(&question.question).bold(),
        style(format!("(#{})", step + 1)).dim()
    );
    if question.is_budget_step {
        out.push_str(" 💰");
    }
    if let Some(tooltip) = &question.tooltip {
        out.push_str(&format!("\n   {}", style(tooltip).dim().italic()));
    }
    for (i, option) in question.options.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", style(i + 1).cyan(), option));
    }
    out
}

pub fn format_suggestions(suggestions: &[SuggestionRecord]) -> String {
    suggestions
        .iter()
        .map(|s| format!("  {} {} {}", s.icon, s.text, style(format!("({})", s.category)).dim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_recommendation(index: usize, rec: &ResolvedRecommendation, locale: Locale) -> String {
    let item = &rec.item;
    let mut out = format!("\n{} {}", style(format!("{}.", index)).cyan(), style(item.title()).bold());

    if let Some(price) = item.price() {
        out.push_str(&format!("  {}", style(price.display()).green()));
    }
    if let Some(score) = item.match_score {
        out.push_str(&format!("  {}", style(format!("%{:.0}", score)).yellow()));
    }
    if let Some(rating) = item.rating {
        out.push_str(&format!("\n   {} {:.1}", stars(rating), rating));
        if let Some(reviews) = item.reviews {
            out.push_str(&format!(" ({:.0} {})", reviews, i18n::text(Message::Reviews, locale)));
        }
    }
    if let Some(description) = item.description.as_deref().or(item.why_recommended.as_deref()) {
        out.push_str(&format!("\n   {}", style(description).dim()));
    }
    for (label, values) in [
        (Message::Features, &item.features),
        (Message::Pros, &item.pros),
        (Message::Cons, &item.cons),
    ] {
        if !values.is_empty() {
            out.push_str(&format!("\n   {}: {}", i18n::text(label, locale), values.join(", ")));
        }
    }

    let source = item
        .source_site()
        .map(|s| format!(" · {}", s))
        .unwrap_or_default();
    match &rec.link.url {
        Some(url) => out.push_str(&format!(
            "\n   {} {} {}{}",
            status_badge(rec.link.status),
            i18n::text(Message::BuyNow, locale),
            style(url).underlined(),
            source
        )),
        None => out.push_str(&format!("\n   {}{}", status_badge(rec.link.status), source)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RecommendationItem;

    fn plain() {
        console::set_colors_enabled(false);
    }

    #[test]
    fn recommendation_lists_link_and_status() {
        plain();
        let item = RecommendationItem {
            title: Some("Logitech G502".to_string()),
            pros: vec!["Hafif".to_string()],
            rating: Some(4.4),
            reviews: Some(120.0),
            source_site: Some("trendyol.com".to_string()),
            ..RecommendationItem::default()
        };
        let rec = ResolvedRecommendation {
            item,
            link: ResolvedLink {
                url: Some("https://www.trendyol.com/sr?q=G502".to_string()),
                status: LinkStatus::Fallback,
            },
        };
        let text = format_recommendation(1, &rec, Locale::En);
        assert!(text.contains("1. Logitech G502"));
        assert!(text.contains("★★★★☆ 4.4 (120 reviews)"));
        assert!(text.contains("Pros: Hafif"));
        assert!(text.contains("[fallback] Buy Now https://www.trendyol.com/sr?q=G502 · trendyol.com"));
    }

    #[test]
    fn question_numbers_options() {
        plain();
        let view = QuestionView {
            question: "Renk?".to_string(),
            options: vec!["Siyah".to_string(), "Beyaz".to_string()],
            emoji: "🎨".to_string(),
            tooltip: None,
            is_budget_step: false,
        };
        let text = format_question(&view, 1);
        assert!(text.contains("🎨 Renk? (#2)"));
        assert!(text.contains("1. Siyah"));
        assert!(text.contains("2. Beyaz"));
    }

    #[test]
    fn categories_use_localized_labels() {
        plain();
        let text = format_categories(&[CategoryDescriptor::named("Headphones")], Locale::Tr);
        assert_eq!(text, "  1. • Kulaklık");
    }
}
