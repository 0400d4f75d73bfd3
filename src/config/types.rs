use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Listing Harvester
///
/// Every section is optional; a missing section takes its defaults, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub browser: RendererConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// How many pages a crawl run visits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Keep going until a page comes back with no listings
    #[default]
    Unbounded,
    /// Visit exactly `page-count` pages
    Fixed,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages rendered at the same time (fixed strategy)
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Pagination strategy
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Number of pages for the fixed strategy
    #[serde(rename = "page-count", default)]
    pub page_count: Option<u32>,

    /// Delay between page load and reading the DOM (milliseconds)
    #[serde(rename = "settle-jitter-ms", default = "default_settle_jitter")]
    pub settle_jitter_ms: JitterRange,

    /// Delay after extraction, before the next page is taken (milliseconds)
    #[serde(rename = "cooldown-jitter-ms", default = "default_cooldown_jitter")]
    pub cooldown_jitter_ms: JitterRange,

    /// Upper bound on loading a single page (milliseconds)
    #[serde(rename = "page-load-timeout-ms", default = "default_page_load_timeout")]
    pub page_load_timeout_ms: u64,

    /// Consecutive failed pages after which an unbounded crawl gives up
    #[serde(
        rename = "max-consecutive-failures",
        default = "default_max_consecutive_failures"
    )]
    pub max_consecutive_failures: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            strategy: StrategyKind::default(),
            page_count: None,
            settle_jitter_ms: default_settle_jitter(),
            cooldown_jitter_ms: default_cooldown_jitter(),
            page_load_timeout_ms: default_page_load_timeout(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// A uniform delay interval `[min, max)` in milliseconds
///
/// Written in TOML as a two element array, e.g. `[0, 4000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never sleeps
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Draws a delay uniformly from the range
    ///
    /// An empty range (`min == max`) always yields `min`.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..self.max_ms))
    }
}

impl From<[u64; 2]> for JitterRange {
    fn from([min_ms, max_ms]: [u64; 2]) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Which renderer produces page markup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium, executes client-side scripts
    #[default]
    Chromium,
    /// Plain HTTP GET, for catalogs rendered server side
    Http,
}

/// Rendering session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub renderer: RendererKind,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Skip image downloads in the browser session
    #[serde(rename = "block-images", default = "default_true")]
    pub block_images: bool,

    /// Skip stylesheet downloads in the browser session
    #[serde(rename = "block-stylesheets", default = "default_true")]
    pub block_stylesheets: bool,

    /// Path to a Chrome/Chromium binary; autodetected when absent
    #[serde(rename = "chrome-executable", default)]
    pub chrome_executable: Option<PathBuf>,

    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            headless: true,
            block_images: true,
            block_stylesheets: true,
            chrome_executable: None,
            user_agent: None,
        }
    }
}

/// Catalog areas and the one selected for this run
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Name of the area to crawl, a key of `areas`
    #[serde(default = "default_area")]
    pub area: String,

    /// Area name to base catalog URL
    #[serde(default = "default_areas")]
    pub areas: BTreeMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            area: default_area(),
            areas: default_areas(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON-lines file receiving the records
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// CSS selectors and markers used by the record extractor
///
/// The defaults track the current catalog markup. They are expected to drift
/// when the site is redesigned, hence configurable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    /// Boundary of one listing
    pub listing_card: String,
    pub content: String,
    pub description: String,
    pub title: String,
    pub price: String,
    pub specs: String,
    /// One spec entry inside the specs container
    pub spec: String,
    /// Icon inside a spec entry; its `alt` text names the field
    pub spec_icon: String,
    /// Unit marker that identifies the area spec
    pub area_unit: String,
    pub bed_icon: String,
    pub couch_icon: String,
    pub bath_icon: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_card: "div._listingCard__PoR_B".to_string(),
            content: "div._content__W4gas".to_string(),
            description: "._description__zVaD6".to_string(),
            title: "h4".to_string(),
            price: "p._price__X51mi".to_string(),
            specs: "div._specs__nbsgm".to_string(),
            spec: "div._spec__SIJiK".to_string(),
            spec_icon: "span img".to_string(),
            area_unit: "م²".to_string(),
            bed_icon: "Bed".to_string(),
            couch_icon: "Couch".to_string(),
            bath_icon: "Bath".to_string(),
        }
    }
}

fn default_concurrency() -> u32 {
    5
}

fn default_settle_jitter() -> JitterRange {
    JitterRange::new(0, 4000)
}

fn default_cooldown_jitter() -> JitterRange {
    JitterRange::new(0, 6000)
}

fn default_page_load_timeout() -> u64 {
    30_000
}

fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_area() -> String {
    "north-riyadh".to_string()
}

fn default_output_path() -> String {
    "listings.jsonl".to_string()
}

fn default_areas() -> BTreeMap<String, String> {
    const RENTALS: &str =
        "https://sa.aqar.fm/%D8%B4%D9%82%D9%82-%D9%84%D9%84%D8%A5%D9%8A%D8%AC%D8%A7%D8%B1/%D8%A7%D9%84%D8%B1%D9%8A%D8%A7%D8%B6";

    [
        ("north-riyadh", "%D8%B4%D9%85%D8%A7%D9%84-%D8%A7%D9%84%D8%B1%D9%8A%D8%A7%D8%B6"),
        ("west-riyadh", "%D8%BA%D8%B1%D8%A8-%D8%A7%D9%84%D8%B1%D9%8A%D8%A7%D8%B6"),
        ("east-riyadh", "%D8%B4%D8%B1%D9%82-%D8%A7%D9%84%D8%B1%D9%8A%D8%A7%D8%B6"),
        ("south-riyadh", "%D8%AC%D9%86%D9%88%D8%A8-%D8%A7%D9%84%D8%B1%D9%8A%D8%A7%D8%B6"),
    ]
    .into_iter()
    .map(|(name, district)| (name.to_string(), format!("{}/{}", RENTALS, district)))
    .collect()
}
