use std::env;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub generation: GenerationConfig,
    pub langbase: Option<LangbaseConfig>,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipes: PipeConfig,
    pub pipeline: PipelineConfig,
}

/// Which generation contract backs the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBackend {
    /// Fixed deterministic records, no network access.
    Stub,
    /// Candidate thoughts produced by a Langbase pipe.
    Langbase,
}

impl std::str::FromStr for GenerationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stub" | "mock" => Ok(GenerationBackend::Stub),
            "langbase" => Ok(GenerationBackend::Langbase),
            _ => Err(format!("Unknown generation backend: {}", s)),
        }
    }
}

/// Generation contract configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub backend: GenerationBackend,
    pub model: String,
    pub temperature: f64,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Langbase pipe name configuration
#[derive(Debug, Clone)]
pub struct PipeConfig {
    pub generate: String,
}

/// Tree expansion, relation and clustering parameters for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of tree levels, counting the initial generation.
    pub depth: usize,
    /// Parents expanded per level.
    pub branching_factor: usize,
    /// Upper bound for a single generation contract call.
    pub generation_timeout_ms: u64,
    /// Total score gap above which two thoughts relate as `better_than`.
    pub relation_score_gap: f64,
    pub clustering: ClusteringConfig,
}

/// Community detection backend selection
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Backend name, `louvain` or `single`.
    pub backend: String,
    /// Seed for the node visit order of modularity optimisation.
    pub seed: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match env::var("GENERATION_BACKEND") {
            Ok(value) => value
                .parse::<GenerationBackend>()
                .map_err(|message| AppError::Config { message })?,
            Err(_) => GenerationBackend::Stub,
        };

        let generation = GenerationConfig {
            backend,
            model: env::var("LANGBASE_MODEL").unwrap_or_else(|_| "openai:gpt-4o-mini".to_string()),
            temperature: parse_env("GENERATION_TEMPERATURE", 0.8),
        };

        let langbase = match env::var("LANGBASE_API_KEY") {
            Ok(api_key) => Some(LangbaseConfig {
                api_key,
                base_url: env::var("LANGBASE_BASE_URL")
                    .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
            }),
            Err(_) if backend == GenerationBackend::Langbase => {
                return Err(AppError::Config {
                    message: "LANGBASE_API_KEY is required for the langbase backend".to_string(),
                })
            }
            Err(_) => None,
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_env("REQUEST_TIMEOUT_MS", 30000),
            max_retries: parse_env("MAX_RETRIES", 0),
            retry_delay_ms: parse_env("RETRY_DELAY_MS", 1000),
        };

        let pipes = PipeConfig {
            generate: env::var("PIPE_GENERATE")
                .unwrap_or_else(|_| "brainstorm-thoughts-v1".to_string()),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            depth: parse_env("TOT_DEPTH", defaults.depth),
            branching_factor: parse_env("TOT_BRANCHING_FACTOR", defaults.branching_factor),
            generation_timeout_ms: parse_env(
                "GENERATION_TIMEOUT_MS",
                defaults.generation_timeout_ms,
            ),
            relation_score_gap: parse_env("RELATION_SCORE_GAP", defaults.relation_score_gap),
            clustering: ClusteringConfig {
                backend: env::var("CLUSTERING_BACKEND")
                    .unwrap_or(defaults.clustering.backend),
                seed: parse_env("CLUSTERING_SEED", defaults.clustering.seed),
            },
        };

        Ok(Config {
            generation,
            langbase,
            logging,
            request,
            pipes,
            pipeline,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 0,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            backend: "louvain".to_string(),
            seed: 42,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            branching_factor: 4,
            generation_timeout_ms: 60000,
            relation_score_gap: 2.0,
            clustering: ClusteringConfig::default(),
        }
    }
}
