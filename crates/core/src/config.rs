use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::mining::{CountingStrategy, MiningParams, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_SUPPORT};
use crate::recommend::{DEFAULT_FALLBACK_LIMIT, DEFAULT_RECOMMENDATION_LIMIT, MIN_HISTORY_TRANSACTIONS};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mining: MiningConfig,
    pub recommend: RecommendConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MiningConfig {
    pub min_support: f64,
    pub min_confidence: f64,
    pub max_itemset_size: Option<usize>,
    pub max_candidates: Option<usize>,
    pub counting: CountingStrategy,
}

impl MiningConfig {
    pub fn params(&self) -> MiningParams {
        MiningParams {
            min_support: self.min_support,
            min_confidence: self.min_confidence,
            max_itemset_size: self.max_itemset_size,
            max_candidates: self.max_candidates,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecommendConfig {
    pub limit: usize,
    pub fallback_limit: usize,
    pub min_history: usize,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub counting: Option<CountingStrategy>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://cartwise.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            mining: MiningConfig {
                min_support: DEFAULT_MIN_SUPPORT,
                min_confidence: DEFAULT_MIN_CONFIDENCE,
                max_itemset_size: None,
                max_candidates: None,
                counting: CountingStrategy::Scan,
            },
            recommend: RecommendConfig {
                limit: DEFAULT_RECOMMENDATION_LIMIT,
                fallback_limit: DEFAULT_FALLBACK_LIMIT,
                min_history: MIN_HISTORY_TRANSACTIONS,
            },
            cache: CacheConfig { enabled: false, capacity: DEFAULT_CACHE_CAPACITY },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(min_confidence) = mining.min_confidence {
                self.mining.min_confidence = min_confidence;
            }
            if let Some(max_itemset_size) = mining.max_itemset_size {
                self.mining.max_itemset_size = Some(max_itemset_size);
            }
            if let Some(max_candidates) = mining.max_candidates {
                self.mining.max_candidates = Some(max_candidates);
            }
            if let Some(counting) = mining.counting {
                self.mining.counting = counting;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(limit) = recommend.limit {
                self.recommend.limit = limit;
            }
            if let Some(fallback_limit) = recommend.fallback_limit {
                self.recommend.fallback_limit = fallback_limit;
            }
            if let Some(min_history) = recommend.min_history {
                self.recommend.min_history = min_history;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(enabled) = cache.enabled {
                self.cache.enabled = enabled;
            }
            if let Some(capacity) = cache.capacity {
                self.cache.capacity = capacity;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTWISE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CARTWISE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("CARTWISE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("CARTWISE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_env("CARTWISE_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MIN_CONFIDENCE") {
            self.mining.min_confidence = parse_env("CARTWISE_MINING_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_MINING_MAX_ITEMSET_SIZE") {
            self.mining.max_itemset_size =
                Some(parse_env("CARTWISE_MINING_MAX_ITEMSET_SIZE", &value)?);
        }
        if let Some(value) = read_env("CARTWISE_MINING_MAX_CANDIDATES") {
            self.mining.max_candidates = Some(parse_env("CARTWISE_MINING_MAX_CANDIDATES", &value)?);
        }
        if let Some(value) = read_env("CARTWISE_MINING_COUNTING") {
            self.mining.counting = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "CARTWISE_MINING_COUNTING".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = read_env("CARTWISE_RECOMMEND_LIMIT") {
            self.recommend.limit = parse_env("CARTWISE_RECOMMEND_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMEND_FALLBACK_LIMIT") {
            self.recommend.fallback_limit = parse_env("CARTWISE_RECOMMEND_FALLBACK_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_RECOMMEND_MIN_HISTORY") {
            self.recommend.min_history = parse_env("CARTWISE_RECOMMEND_MIN_HISTORY", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_CACHE_ENABLED") {
            self.cache.enabled = parse_env("CARTWISE_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_CACHE_CAPACITY") {
            self.cache.capacity = parse_env("CARTWISE_CACHE_CAPACITY", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CARTWISE_SERVER_PORT") {
            self.server.port = parse_env("CARTWISE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("CARTWISE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("CARTWISE_LOGGING_LEVEL").or_else(|| read_env("CARTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTWISE_LOGGING_FORMAT").or_else(|| read_env("CARTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.mining.min_confidence = min_confidence;
        }
        if let Some(counting) = overrides.counting {
            self.mining.counting = counting;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_mining(&self.mining)?;
        validate_recommend(&self.recommend)?;
        validate_cache(&self.cache)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartwise.toml"), PathBuf::from("config/cartwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_mining(mining: &MiningConfig) -> Result<(), ConfigError> {
    for (name, value) in
        [("mining.min_support", mining.min_support), ("mining.min_confidence", mining.min_confidence)]
    {
        if !(value > 0.0 && value <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "{name} must be in range (0, 1], got {value}"
            )));
        }
    }

    if mining.max_itemset_size == Some(0) {
        return Err(ConfigError::Validation(
            "mining.max_itemset_size must be at least 1".to_string(),
        ));
    }

    if mining.max_candidates == Some(0) {
        return Err(ConfigError::Validation(
            "mining.max_candidates must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.limit == 0 {
        return Err(ConfigError::Validation(
            "recommend.limit must be greater than zero".to_string(),
        ));
    }

    if recommend.fallback_limit == 0 {
        return Err(ConfigError::Validation(
            "recommend.fallback_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.enabled && cache.capacity == 0 {
        return Err(ConfigError::Validation(
            "cache.capacity must be greater than zero when the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    mining: Option<MiningPatch>,
    recommend: Option<RecommendPatch>,
    cache: Option<CachePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    min_confidence: Option<f64>,
    max_itemset_size: Option<usize>,
    max_candidates: Option<usize>,
    counting: Option<CountingStrategy>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    limit: Option<usize>,
    fallback_limit: Option<usize>,
    min_history: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    enabled: Option<bool>,
    capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
