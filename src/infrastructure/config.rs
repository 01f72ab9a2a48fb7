use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::graph::{AssemblyOptions, HeaderFooterPolicy, HeadingFormat};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(variable) => write!(f, "{} not set", variable),
            ConfigError::Invalid {
                variable,
                value,
                reason,
            } => write!(f, "Invalid {}={}: {}", variable, value, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub server_port: u16,
    pub fragment_dir: PathBuf,
    pub identifier_table_path: PathBuf,
    pub ingest_workers: usize,
    pub assembly: AssemblyOptions,
    pub embed_on_ingest: bool,
    pub embeddings_service_url: String,
    pub embedding_model_name: String,
    pub embedding_dimension: usize,
}

impl AppConfig {
    /// Reads the process environment; call after `dotenv` has loaded any `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let ingest_workers: usize = parse_or(&lookup, "INGEST_WORKERS", 3)?;
        if ingest_workers == 0 {
            return Err(ConfigError::Invalid {
                variable: "INGEST_WORKERS",
                value: "0".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }

        let embedding_dimension: usize = parse_or(&lookup, "EMBEDDING_DIMENSION", 1536)?;
        if embedding_dimension == 0 {
            return Err(ConfigError::Invalid {
                variable: "EMBEDDING_DIMENSION",
                value: "0".to_string(),
                reason: "dimension must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url,
            database_pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 10)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            fragment_dir: PathBuf::from(
                lookup("FRAGMENT_DIR").unwrap_or_else(|| "./fragments".to_string()),
            ),
            identifier_table_path: PathBuf::from(
                lookup("IDENTIFIER_TABLE_PATH")
                    .unwrap_or_else(|| "./identifier_table.json".to_string()),
            ),
            ingest_workers,
            assembly: AssemblyOptions {
                header_footer_policy: parse_or(
                    &lookup,
                    "HEADER_FOOTER_POLICY",
                    HeaderFooterPolicy::Discard,
                )?,
                heading_format: parse_or(&lookup, "HEADING_FORMAT", HeadingFormat::Plain)?,
                emit_continuation_edges: parse_or(&lookup, "EMIT_CONTINUATION_EDGES", false)?,
            },
            embed_on_ingest: parse_or(&lookup, "EMBED_ON_INGEST", false)?,
            embeddings_service_url: lookup("EMBEDDINGS_SERVICE_URL")
                .unwrap_or_else(|| "https://example.workers.dev".to_string()),
            embedding_model_name: lookup("EMBEDDING_MODEL_NAME")
                .unwrap_or_else(|| "default".to_string()),
            embedding_dimension,
        })
    }
}

fn parse_or<F, T>(lookup: &F, variable: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(variable) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            variable,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/docgraph")]).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.fragment_dir, PathBuf::from("./fragments"));
        assert_eq!(config.ingest_workers, 3);
        assert_eq!(config.assembly, AssemblyOptions::default());
        assert!(!config.embed_on_ingest);
        assert_eq!(config.embedding_model_name, "default");
        assert_eq!(config.embedding_dimension, 1536);
    }

    #[test]
    fn test_missing_database_url() {
        assert_eq!(config_from(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/graph"),
            ("SERVER_PORT", "8080"),
            ("HEADER_FOOTER_POLICY", "nodes"),
            ("HEADING_FORMAT", "Markdown"),
            ("EMIT_CONTINUATION_EDGES", "true"),
            ("INGEST_WORKERS", "8"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.assembly.header_footer_policy, HeaderFooterPolicy::Nodes);
        assert_eq!(config.assembly.heading_format, HeadingFormat::Markdown);
        assert!(config.assembly.emit_continuation_edges);
        assert_eq!(config.ingest_workers, 8);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://db/graph"),
            ("HEADING_FORMAT", "html"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                variable: "HEADING_FORMAT",
                ..
            }
        ));

        let err = config_from(&[("DATABASE_URL", "postgres://db/graph"), ("INGEST_WORKERS", "0")])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                variable: "INGEST_WORKERS",
                ..
            }
        ));
    }
}
