use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `OFFERLINK__` and optional TOML config files.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub assignment: AssignmentConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Progressive disclosure of the partner list.
#[derive(Debug, Clone, Deserialize)]
pub struct RevealConfig {
    /// Partners revealed per page.
    #[serde(default = "default_partners_per_page")]
    pub partners_per_page: usize,
    /// Simulated load latency applied by `load_more`, in milliseconds.
    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,
}

/// Bulk-assignment batching parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentConfig {
    /// Items assigned concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_delay_between_batches_ms")]
    pub delay_between_batches_ms: u64,
    /// Retries run with a smaller batch and a longer pause.
    #[serde(default = "default_retry_batch_size")]
    pub retry_batch_size: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Mock executor behavior for demos and tests.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// Probability in `[0, 1]` that a single assignment fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
}

fn default_node_id() -> String {
    "offerlink-local".to_string()
}

fn default_partners_per_page() -> usize {
    10
}

fn default_load_latency_ms() -> u64 {
    150
}

fn default_batch_size() -> usize {
    3
}

fn default_delay_between_batches_ms() -> u64 {
    500
}

fn default_retry_batch_size() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    750
}

fn default_failure_rate() -> f64 {
    0.2
}

fn default_min_latency_ms() -> u64 {
    5
}

fn default_max_latency_ms() -> u64 {
    40
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            reveal: RevealConfig::default(),
            assignment: AssignmentConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            partners_per_page: default_partners_per_page(),
            load_latency_ms: default_load_latency_ms(),
        }
    }
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            delay_between_batches_ms: default_delay_between_batches_ms(),
            retry_batch_size: default_retry_batch_size(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("OFFERLINK")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
