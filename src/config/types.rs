use serde::Deserialize;

/// Default catalogue collection published by OpenActive
pub const DEFAULT_COLLECTION_URL: &str =
    "https://openactive.io/data-catalogs/data-catalog-collection.jsonld";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Resilient fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Maximum number of GET attempts per URL
    #[serde(default = "default_max_attempts", rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms", rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(
        default = "default_request_timeout_secs",
        rename = "request-timeout-secs"
    )]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(
        default = "default_connect_timeout_secs",
        rename = "connect-timeout-secs"
    )]
    pub connect_timeout_secs: u64,

    /// Log every attempt at info level
    #[serde(default)]
    pub verbose: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            verbose: false,
        }
    }
}

/// RPDE consumer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    /// Pacing delay between successive page fetches (milliseconds)
    #[serde(default = "default_page_delay_ms", rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Maximum pages fetched per run, 0 for no limit
    #[serde(default, rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum number of feeds walked at the same time
    #[serde(
        default = "default_max_concurrent_feeds",
        rename = "max-concurrent-feeds"
    )]
    pub max_concurrent_feeds: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            max_pages: 0,
            max_concurrent_feeds: default_max_concurrent_feeds(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Version of the client
    #[serde(default = "default_agent_version")]
    pub version: String,

    /// URL with information about the operator
    #[serde(default, rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            version: default_agent_version(),
            contact_url: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.name, self.version)
        } else {
            format!("{}/{} (+{})", self.name, self.version, self.contact_url)
        }
    }
}

/// Catalogue discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// URL of the catalogue collection
    #[serde(default = "default_collection_url", rename = "collection-url")]
    pub collection_url: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            collection_url: default_collection_url(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_page_delay_ms() -> u64 {
    200
}

fn default_max_concurrent_feeds() -> usize {
    4
}

fn default_agent_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_collection_url() -> String {
    DEFAULT_COLLECTION_URL.to_string()
}
