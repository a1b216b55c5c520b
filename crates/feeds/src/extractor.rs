//! Price extraction from visible page text.
//!
//! This is a best-effort text scan, not a product parser: every occurrence of
//! the currency marker followed by a numeric token is a candidate price. In
//! labeled mode a candidate must be preceded (within a bounded window) by one
//! of the configured product keywords, which becomes the start of its label.

use crate::error::ExtractError;
use pricewatch_core::{Observation, ObservationSet, Price};
use regex::{Captures, Regex};
use tracing::trace;

/// Whether observations carry product labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Bare prices; deduplicated and sorted ascending.
    #[default]
    Unlabeled,
    /// Prices tied to the nearest preceding product keyword.
    Labeled,
}

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Text that precedes every advertised price (e.g. `S/`).
    pub currency_marker: String,
    /// Plausibility floor; smaller values are placeholders or stray matches.
    pub min_price: Price,
    pub mode: ExtractMode,
    /// Product-name markers that start a label (labeled mode only).
    pub product_keywords: Vec<String>,
    /// Promotional words stripped from either end of a label.
    pub noise_words: Vec<String>,
    /// Maximum characters between a keyword and the currency marker.
    pub max_label_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            currency_marker: "S/".to_string(),
            min_price: Price::from_f64(10.0),
            mode: ExtractMode::Unlabeled,
            product_keywords: ["iPhone", "Samsung", "Xiaomi", "Motorola", "Honor"]
                .into_iter()
                .map(String::from)
                .collect(),
            noise_words: ["desde", "from", "oferta", "precio", "antes", "ahora"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_label_chars: 120,
        }
    }
}

impl ExtractorConfig {
    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Turns page text into an `ObservationSet`.
#[derive(Debug)]
pub struct PriceExtractor {
    config: ExtractorConfig,
    pattern: Regex,
    keyword_pattern: Option<Regex>,
}

impl PriceExtractor {
    /// Compile the scan patterns for `config`.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let marker = config.currency_marker.trim();
        if marker.is_empty() {
            return Err(ExtractError::EmptyMarker);
        }
        if config.min_price == Price(0) {
            return Err(ExtractError::NonPositiveFloor);
        }
        let marker = regex::escape(marker);

        let (pattern, keyword_pattern) = match config.mode {
            ExtractMode::Unlabeled => {
                let pattern = Regex::new(&format!(r"{marker}\s*(?P<price>[\d.]+)"))?;
                (pattern, None)
            }
            ExtractMode::Labeled => {
                let keywords = keyword_alternation(&config.product_keywords)
                    .ok_or(ExtractError::NoKeywords)?;
                let pattern = Regex::new(&format!(
                    r"(?P<label>(?i:{keywords})(?s:.){{0,{max}}}?){marker}\s*(?P<price>[\d.]+)",
                    max = config.max_label_chars,
                ))?;
                let keyword_pattern = Regex::new(&format!("(?i:{keywords})"))?;
                (pattern, Some(keyword_pattern))
            }
        };

        Ok(Self {
            config,
            pattern,
            keyword_pattern,
        })
    }

    pub fn mode(&self) -> ExtractMode {
        self.config.mode
    }

    /// Scan `text` for prices. Returns an empty set when nothing qualifies.
    pub fn extract(&self, text: &str) -> ObservationSet {
        match self.config.mode {
            ExtractMode::Unlabeled => ObservationSet::unlabeled(
                self.pattern
                    .captures_iter(text)
                    .filter_map(|caps| self.accept_price(&caps)),
            ),
            ExtractMode::Labeled => ObservationSet::labeled(
                self.pattern.captures_iter(text).filter_map(|caps| {
                    let price = self.accept_price(&caps)?;
                    let label = self.clean_label(&caps["label"]);
                    Some(Observation::labeled(label, price))
                }),
            ),
        }
    }

    fn accept_price(&self, caps: &Captures<'_>) -> Option<Price> {
        let token = &caps["price"];
        match token.parse::<Price>() {
            Ok(price) if price >= self.config.min_price => Some(price),
            Ok(price) => {
                trace!(%price, floor = %self.config.min_price, "Discarding implausible price");
                None
            }
            Err(e) => {
                trace!(token, error = %e, "Discarding unparsable price token");
                None
            }
        }
    }

    /// Start the label at the last keyword inside the captured run, collapse
    /// whitespace and strip promotional words from both ends.
    fn clean_label(&self, raw: &str) -> String {
        let keyword = self
            .keyword_pattern
            .as_ref()
            .and_then(|kw| kw.find_iter(raw).last());
        let start = keyword.map(|m| m.start()).unwrap_or(0);
        let keyword = keyword.map(|m| m.as_str()).unwrap_or_default();
        let raw = &raw[start..];

        let words: Vec<&str> = raw.split_whitespace().collect();
        let is_noise = |word: &&str| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            bare.is_empty()
                || self
                    .config
                    .noise_words
                    .iter()
                    .any(|noise| noise.eq_ignore_ascii_case(bare))
        };

        let first = words.iter().position(|w| !is_noise(w));
        let last = words.iter().rposition(|w| !is_noise(w));
        match (first, last) {
            (Some(first), Some(last)) => words[first..=last].join(" "),
            _ => keyword.to_string(),
        }
    }
}

fn keyword_alternation(keywords: &[String]) -> Option<String> {
    let escaped: Vec<String> = keywords
        .iter()
        .map(|kw| kw.trim())
        .filter(|kw| !kw.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}
