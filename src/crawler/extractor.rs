//! Listing extraction from rendered catalog markup
//!
//! This module turns the HTML of one catalog page into [`ListingRecord`]s:
//! - Locating listing cards and their content/description fragments
//! - Reading title, price and the spec entries of each card
//! - Dropping individual cards that lack a required field
//!
//! Extraction is a pure function of the markup; it performs no I/O.

use crate::config::{compile_selector, SelectorConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One apartment listing as shown on the catalog
///
/// Optional fields are `None` when the card did not carry them. On the wire
/// every field is a string and an absent field is written as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,

    /// Raw price text with any `/period` suffix removed
    pub price: String,

    #[serde(with = "empty_as_none", default)]
    pub beds: Option<String>,

    #[serde(with = "empty_as_none", default)]
    pub living_rooms: Option<String>,

    #[serde(with = "empty_as_none", default)]
    pub bathrooms: Option<String>,

    /// Numeric part of the area spec, unit stripped, thousands separators kept
    #[serde(with = "empty_as_none", default)]
    pub area: Option<String>,

    #[serde(with = "empty_as_none", default)]
    pub description: Option<String>,
}

mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}

/// Why a single listing card was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("listing card has no {0}")]
    MissingField(&'static str),
}

/// Compiled selectors and markers for one catalog markup
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    card: Selector,
    content: Selector,
    description: Selector,
    title: Selector,
    price: Selector,
    specs: Selector,
    spec: Selector,
    spec_icon: Selector,
    area_pattern: Regex,
    bed_icon: String,
    couch_icon: String,
    bath_icon: String,
}

impl ListingExtractor {
    /// Compiles the selectors of a [`SelectorConfig`]
    ///
    /// # Returns
    ///
    /// * `Ok(ListingExtractor)` - Ready to extract
    /// * `Err(ConfigError)` - A selector failed to parse
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        let area_pattern = Regex::new(&format!(
            r"(\d[\d,]*(?:\.\d+)?)\s*{}",
            regex::escape(config.area_unit.trim())
        ))
        .map_err(|e| ConfigError::Validation(format!("invalid area-unit: {}", e)))?;

        Ok(Self {
            card: compile_selector(&config.listing_card)?,
            content: compile_selector(&config.content)?,
            description: compile_selector(&config.description)?,
            title: compile_selector(&config.title)?,
            price: compile_selector(&config.price)?,
            specs: compile_selector(&config.specs)?,
            spec: compile_selector(&config.spec)?,
            spec_icon: compile_selector(&config.spec_icon)?,
            area_pattern,
            bed_icon: config.bed_icon.clone(),
            couch_icon: config.couch_icon.clone(),
            bath_icon: config.bath_icon.clone(),
        })
    }

    /// Extracts every well-formed listing of a page, in document order
    ///
    /// Cards missing a title, a price or a specs container are skipped and
    /// logged; their siblings are still extracted.
    ///
    /// # Example
    ///
    /// ```
    /// use listing_harvester::config::SelectorConfig;
    /// use listing_harvester::crawler::ListingExtractor;
    ///
    /// let extractor = ListingExtractor::new(&SelectorConfig::default()).unwrap();
    /// assert!(extractor.extract("<html><body></body></html>").is_empty());
    /// ```
    pub fn extract(&self, html: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for (index, card) in document.select(&self.card).enumerate() {
            match self.extract_listing(card) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!("Skipping listing card {}: {}", index, e),
            }
        }

        records
    }

    /// Extracts a single listing card
    pub fn extract_listing(&self, card: ElementRef<'_>) -> Result<ListingRecord, ExtractError> {
        let content = card
            .select(&self.content)
            .next()
            .ok_or(ExtractError::MissingField("content"))?;
        let title = content
            .select(&self.title)
            .next()
            .ok_or(ExtractError::MissingField("title"))?;
        let price = content
            .select(&self.price)
            .next()
            .ok_or(ExtractError::MissingField("price"))?;
        let specs = content
            .select(&self.specs)
            .next()
            .ok_or(ExtractError::MissingField("specs"))?;

        let mut record = ListingRecord {
            title: stripped_text(title),
            price: strip_rate_suffix(&stripped_text(price)),
            ..Default::default()
        };

        for spec in specs.select(&self.spec) {
            self.apply_spec(&mut record, spec);
        }

        record.description = card
            .select(&self.description)
            .next()
            .map(|element| stripped_text(element).replace('\n', ""));

        Ok(record)
    }

    /// Assigns one spec entry to its field; later entries overwrite earlier ones
    fn apply_spec(&self, record: &mut ListingRecord, spec: ElementRef<'_>) {
        let text = stripped_text(spec);

        if let Some(captures) = self.area_pattern.captures(&text) {
            record.area = Some(captures[1].to_string());
            return;
        }

        let Some(icon) = spec
            .select(&self.spec_icon)
            .next()
            .and_then(|img| img.value().attr("alt"))
        else {
            return;
        };

        if icon == self.bed_icon {
            record.beds = Some(text);
        } else if icon == self.couch_icon {
            record.living_rooms = Some(text);
        } else if icon == self.bath_icon {
            record.bathrooms = Some(text);
        }
    }
}

/// Concatenates the descendant text nodes of an element, each trimmed,
/// dropping the empty ones
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drops a trailing rate unit such as `/month` from a price
pub fn strip_rate_suffix(price: &str) -> String {
    price.split('/').next().unwrap_or_default().trim().to_string()
}
