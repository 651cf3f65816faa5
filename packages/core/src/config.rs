//! Service configuration and tracing setup
//!
//! `MediaTreeConfig` can be built from defaults, a JSON document, or the
//! process environment:
//!
//! | Variable                    | Field                    | Default |
//! |-----------------------------|--------------------------|---------|
//! | `MEDIATREE_FOLDER_TYPE_ID`  | `folder_content_type_id` | `1031`  |
//! | `MEDIATREE_IMAGE_TYPE_ID`   | `image_content_type_id`  | `1032`  |
//! | `MEDIATREE_FILE_TYPE_ID`    | `file_content_type_id`   | `1033`  |
//! | `MEDIATREE_IMAGE_EXTENSIONS` | `image_extensions`      | `jpeg,jpg,gif,bmp,png,tiff,tif` |
//! | `MEDIATREE_DISALLOWED_EXTENSIONS` | `disallowed_extensions` | `ashx,aspx,ascx,config,cshtml,vbhtml,asmx,air,axd` |
//! | `MEDIATREE_EVENT_CAPACITY`  | `event_channel_capacity` | `128`   |
//! | `MEDIATREE_SORT_RETRIES`    | `sort_retry_limit`       | `3`     |
//! | `MEDIATREE_LOG`             | `log_filter`             | `info`  |

use crate::models::ContentTypeId;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Content type used by `add_folder`
pub const DEFAULT_FOLDER_CONTENT_TYPE_ID: ContentTypeId = 1031;

/// Content type given to uploads with an image extension
pub const DEFAULT_IMAGE_CONTENT_TYPE_ID: ContentTypeId = 1032;

/// Content type given to every other allowed upload
pub const DEFAULT_FILE_CONTENT_TYPE_ID: ContentTypeId = 1033;

pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "gif", "bmp", "png", "tiff", "tif"];

/// Upload extensions that are skipped instead of stored
pub const DEFAULT_DISALLOWED_EXTENSIONS: &[&str] = &[
    "ashx", "aspx", "ascx", "config", "cshtml", "vbhtml", "asmx", "air", "axd",
];

/// Domain event broadcast channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Reorder retries after a version conflict
pub const DEFAULT_SORT_RETRY_LIMIT: usize = 3;

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaTreeConfig {
    pub folder_content_type_id: ContentTypeId,
    pub image_content_type_id: ContentTypeId,
    pub file_content_type_id: ContentTypeId,
    /// Lowercase extensions, without the dot
    pub image_extensions: Vec<String>,
    pub disallowed_extensions: Vec<String>,
    pub event_channel_capacity: usize,
    pub sort_retry_limit: usize,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for MediaTreeConfig {
    fn default() -> Self {
        Self {
            folder_content_type_id: DEFAULT_FOLDER_CONTENT_TYPE_ID,
            image_content_type_id: DEFAULT_IMAGE_CONTENT_TYPE_ID,
            file_content_type_id: DEFAULT_FILE_CONTENT_TYPE_ID,
            image_extensions: extension_list(DEFAULT_IMAGE_EXTENSIONS.iter().copied()),
            disallowed_extensions: extension_list(DEFAULT_DISALLOWED_EXTENSIONS.iter().copied()),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            sort_retry_limit: DEFAULT_SORT_RETRY_LIMIT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl MediaTreeConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `MEDIATREE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("MEDIATREE_FOLDER_TYPE_ID") {
            config.folder_content_type_id = raw.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("MEDIATREE_FOLDER_TYPE_ID is not an integer: '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("MEDIATREE_IMAGE_TYPE_ID") {
            config.image_content_type_id = raw.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("MEDIATREE_IMAGE_TYPE_ID is not an integer: '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("MEDIATREE_FILE_TYPE_ID") {
            config.file_content_type_id = raw.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("MEDIATREE_FILE_TYPE_ID is not an integer: '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("MEDIATREE_IMAGE_EXTENSIONS") {
            config.image_extensions = extension_list(raw.split(','));
        }

        if let Some(raw) = lookup("MEDIATREE_DISALLOWED_EXTENSIONS") {
            config.disallowed_extensions = extension_list(raw.split(','));
        }

        if let Some(raw) = lookup("MEDIATREE_EVENT_CAPACITY") {
            config.event_channel_capacity = raw.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("MEDIATREE_EVENT_CAPACITY is not a number: '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("MEDIATREE_SORT_RETRIES") {
            config.sort_retry_limit = raw.trim().parse().map_err(|_| {
                ConfigError::Parse(format!("MEDIATREE_SORT_RETRIES is not a number: '{}'", raw))
            })?;
        }

        if let Some(filter) = lookup("MEDIATREE_LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, id) in [
            ("folder", self.folder_content_type_id),
            ("image", self.image_content_type_id),
            ("file", self.file_content_type_id),
        ] {
            if id <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} content type id must be positive, got {}",
                    label, id
                )));
            }
        }
        // tokio's broadcast channel panics on zero capacity
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event channel capacity must be greater than zero".to_string(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log filter cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Content type for an uploaded file, or `None` when its extension is
    /// disallowed
    ///
    /// The extension is whatever follows the last dot, compared
    /// case-insensitively. A name without a dot is its own extension.
    pub fn media_type_for(&self, file_name: &str) -> Option<ContentTypeId> {
        let extension = file_name
            .rsplit_once('.')
            .map_or(file_name, |(_, ext)| ext)
            .to_lowercase();

        if self.disallowed_extensions.contains(&extension) {
            return None;
        }
        if self.image_extensions.contains(&extension) {
            Some(self.image_content_type_id)
        } else {
            Some(self.file_content_type_id)
        }
    }
}

fn extension_list<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw.into_iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over `config.log_filter`. Calling this more than once is
/// harmless; only the first subscriber is installed.
pub fn init_tracing(config: &MediaTreeConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}
