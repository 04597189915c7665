//! Note Graph Analytics
//!
//! Structural analysis of a note-taking knowledge graph:
//! - Shortest and bounded simple paths between notes
//! - Degree, closeness, betweenness and PageRank centrality
//! - Clustering, density, bridges and articulation points
//! - Louvain community detection and modularity scoring
//! - Similarity, influence ranking and degree anomalies
//! - Trends across snapshot history

pub mod graph;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use graph::{AnalyticsConfig, CommunityAlgorithm};

const DEFAULT_LOG_FILTER: &str = "warn,notegraph_analytics=info";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub analytics: AnalyticsConfig,
    pub logging: LoggingYamlConfig,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingYamlConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub log_filter: String,
    /// Problems found while loading (bad YAML, unparsable env values).
    /// Loading runs before the subscriber exists, so the caller logs these.
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. The resulting
    /// analytics parameters are validated. Values that could not be used are
    /// skipped and described in [`Config::warnings`].
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let mut warnings = Vec::new();

        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path, &mut warnings);
        let mut analytics = yaml.analytics;

        // 2. Env var overrides
        if let Some(damping) = env_parse::<f64>("PAGERANK_DAMPING", &mut warnings) {
            analytics.pagerank_damping = damping;
        }
        if let Some(iterations) = env_parse::<usize>("PAGERANK_MAX_ITERATIONS", &mut warnings) {
            analytics.pagerank_max_iterations = iterations;
        }
        if let Some(ms) = env_parse::<u64>("ANALYSIS_TIMEOUT_MS", &mut warnings) {
            analytics.timeout_ms = Some(ms);
        }
        if let Some(algorithm) = env_parse::<CommunityAlgorithm>("COMMUNITY_ALGORITHM", &mut warnings) {
            analytics.community_algorithm = algorithm;
        }

        analytics.validate()?;

        Ok(Self {
            analytics,
            log_filter: std::env::var("GRAPH_ANALYTICS_LOG").unwrap_or(yaml.logging.filter),
            warnings,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>, warnings: &mut Vec<String>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warnings.push(format!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Parse an env var. Values that do not parse are ignored and reported in `warnings`.
fn env_parse<T>(var: &str, warnings: &mut Vec<String>) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warnings.push(format!("Ignoring {}={:?}: {}", var, raw, e));
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
analytics:
  pagerank_damping: 0.9
  max_path_length: 3
  community_algorithm: modularity
  timeout_ms: 2500

logging:
  filter: debug
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.analytics.pagerank_damping - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.analytics.max_path_length, 3);
        assert_eq!(config.analytics.community_algorithm, CommunityAlgorithm::Louvain);
        assert_eq!(config.analytics.timeout_ms, Some(2500));
        // Unset fields keep their defaults
        assert_eq!(config.analytics.influence_top_k, 10);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.analytics.pagerank_max_iterations, 100);
        assert!(config.analytics.timeout_ms.is_none());
    }

    #[test]
    fn test_yaml_components_selector() {
        let yaml = "analytics:\n  community_algorithm: components\n";
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.analytics.community_algorithm,
            CommunityAlgorithm::ConnectedComponents
        );
    }

    /// Combined test for YAML file loading, env var overrides, and fallbacks.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "PAGERANK_DAMPING",
                "PAGERANK_MAX_ITERATIONS",
                "ANALYSIS_TIMEOUT_MS",
                "COMMUNITY_ALGORITHM",
                "GRAPH_ANALYTICS_LOG",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
analytics:
  pagerank_damping: 0.7
  pagerank_max_iterations: 40
  community_algorithm: connected_components
logging:
  filter: trace
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!((config.analytics.pagerank_damping - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.analytics.pagerank_max_iterations, 40);
        assert_eq!(
            config.analytics.community_algorithm,
            CommunityAlgorithm::ConnectedComponents
        );
        assert_eq!(config.log_filter, "trace");
        assert!(config.warnings.is_empty());

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("PAGERANK_DAMPING", "0.5");
        std::env::set_var("ANALYSIS_TIMEOUT_MS", "1500");
        std::env::set_var("COMMUNITY_ALGORITHM", "louvain");
        std::env::set_var("GRAPH_ANALYTICS_LOG", "info");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!((config.analytics.pagerank_damping - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.analytics.timeout_ms, Some(1500));
        assert_eq!(config.analytics.community_algorithm, CommunityAlgorithm::Louvain);
        assert_eq!(config.log_filter, "info");
        // YAML value still used where no env override
        assert_eq!(config.analytics.pagerank_max_iterations, 40);

        // --- Phase 3: Unparsable env values are ignored ---
        std::env::set_var("PAGERANK_MAX_ITERATIONS", "lots");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.analytics.pagerank_max_iterations, 40);
        assert_eq!(config.warnings.len(), 1);
        assert!(
            config.warnings[0].contains("PAGERANK_MAX_ITERATIONS"),
            "got: {:?}",
            config.warnings
        );

        // --- Phase 4: Out-of-range values are rejected ---
        std::env::set_var("PAGERANK_DAMPING", "1.5");
        let err = Config::from_yaml_and_env(Some(&file_path)).unwrap_err();
        assert!(err.to_string().contains("pagerank_damping"), "got: {err}");

        clear_env();

        // --- Phase 5: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-graph-analytics-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert!((config.analytics.pagerank_damping - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.warnings.is_empty());

        // --- Phase 6: Malformed YAML → defaults ---
        std::fs::write(&file_path, "analytics: [not, a, map").unwrap();
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.analytics.max_path_length, 5);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].starts_with("Failed to parse"), "got: {:?}", config.warnings);
    }
}
