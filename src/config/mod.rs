//! Layered configuration for the analysis core.
//!
//! Mirrors the connection / search-tuning / model-path grouping enumerated
//! in the external-interfaces contract: every recognized option lands in
//! exactly one of the nested structs below, each with an explicit
//! [`Default`] so a partial TOML document still produces a usable config.
//! There is no process-wide config singleton — every component constructor
//! takes an `&AppConfig` (or a narrower sub-config) explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_es_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_app_version() -> String {
    "1.0.0".to_string()
}

fn default_max_query_terms() -> u32 {
    50
}

fn default_min_doc_freq() -> u32 {
    1
}

fn default_min_term_freq() -> u32 {
    1
}

fn default_min_word_length() -> usize {
    2
}

fn default_min_should_match() -> String {
    "80%".to_string()
}

fn default_search_logs_min_similarity() -> f64 {
    0.9
}

fn default_search_logs_min_should_match() -> String {
    "95%".to_string()
}

fn default_boost_unique_id() -> f64 {
    2.0
}

fn default_boost_aa() -> f64 {
    -2.0
}

fn default_boost_launch() -> f64 {
    2.0
}

fn default_boost_model_folder() -> Option<PathBuf> {
    Some(dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".rp-aa-analyzer").join("boost_model"))
}

/// Connection details for the Elasticsearch-compatible index store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EsConnectionConfig {
    #[serde(default = "default_es_host")]
    pub host: String,
    pub use_ssl: bool,
    pub verify_certs: bool,
    pub ssl_show_warn: bool,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub turn_off_ssl_verification: bool,
}

impl Default for EsConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_es_host(),
            use_ssl: false,
            verify_certs: true,
            ssl_show_warn: true,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            turn_off_ssl_verification: false,
        }
    }
}

/// Message-bus publish target. The core only ever depends on
/// [`crate::message_bus::MessageBus`]; this struct just carries the
/// addressing an external AMQP producer would need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmqpConfig {
    pub url: String,
    pub exchange_name: String,
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            exchange_name: "analyzer".to_string(),
        }
    }
}

/// Retrieval and boosting tuning knobs (see §6 of the spec for the full
/// enumeration of recognized options).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTuningConfig {
    #[serde(default = "default_max_query_terms")]
    pub max_query_terms: u32,
    #[serde(default = "default_min_doc_freq")]
    pub min_doc_freq: u32,
    #[serde(default = "default_min_term_freq")]
    pub min_term_freq: u32,
    #[serde(default = "default_min_word_length")]
    pub min_word_length: usize,
    #[serde(default = "default_min_should_match")]
    pub min_should_match: String,
    #[serde(default = "default_search_logs_min_similarity")]
    pub search_logs_min_similarity: f64,
    #[serde(default = "default_search_logs_min_should_match")]
    pub search_logs_min_should_match: String,
    #[serde(default = "default_boost_unique_id")]
    pub boost_unique_id: f64,
    #[serde(default = "default_boost_aa")]
    pub boost_aa: f64,
    #[serde(default = "default_boost_launch")]
    pub boost_launch: f64,
}

impl Default for SearchTuningConfig {
    fn default() -> Self {
        Self {
            max_query_terms: default_max_query_terms(),
            min_doc_freq: default_min_doc_freq(),
            min_term_freq: default_min_term_freq(),
            min_word_length: default_min_word_length(),
            min_should_match: default_min_should_match(),
            search_logs_min_similarity: default_search_logs_min_similarity(),
            search_logs_min_should_match: default_search_logs_min_should_match(),
            boost_unique_id: default_boost_unique_id(),
            boost_aa: default_boost_aa(),
            boost_launch: default_boost_launch(),
        }
    }
}

/// Filesystem locations of trained model artifacts. Paths are per-project
/// folders except `boost_model_folder`, which is the global default the
/// ranker falls back to on a per-project model-load error (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPathsConfig {
    pub similarity_weights_folder: Option<PathBuf>,
    pub suggest_boost_model_folder: Option<PathBuf>,
    #[serde(default = "default_boost_model_folder")]
    pub boost_model_folder: Option<PathBuf>,
    pub defect_type_model_folders: Vec<PathBuf>,
}

impl Default for ModelPathsConfig {
    fn default() -> Self {
        Self {
            similarity_weights_folder: None,
            suggest_boost_model_folder: None,
            boost_model_folder: default_boost_model_folder(),
            defect_type_model_folders: Vec::new(),
        }
    }
}

/// The composed configuration tree. Constructed once by the embedding
/// process and passed down explicitly to every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub es: EsConnectionConfig,
    pub amqp: AmqpConfig,
    pub search_tuning: SearchTuningConfig,
    pub model_paths: ModelPathsConfig,
    #[serde(default = "default_app_version")]
    pub app_version: String,
}

impl AppConfig {
    /// Load from a TOML file at `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Parse from an in-memory TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}
