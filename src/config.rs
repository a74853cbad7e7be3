//! Schema files.
//!
//! A schema declares the fields of one blueprint set plus the provider and
//! override settings that go with it. YAML and JSON are both accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::blueprint::{Blueprint, Origin};
use crate::error::ParamsError;
use crate::overrides::OverridesConfig;
use crate::provider::ProviderConfig;
use crate::set::BlueprintSet;
use crate::{DEFAULT_NOT_TOKEN, DEFAULT_OMIT_TOKEN};

const INLINE: &str = "<inline>";

/// Top-level schema document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Store key for persisted default overrides.
    #[serde(default)]
    pub storage_key: String,
    #[serde(default)]
    pub hidden: Vec<String>,
    #[serde(default)]
    pub enforced: Vec<String>,
    #[serde(default)]
    pub ignored: Vec<String>,
    pub fields: Vec<FieldConfig>,
}

/// One field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub key: String,
    #[serde(flatten)]
    pub kind: KindConfig,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub origin: Origin,
}

/// Field type and its type-specific settings, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindConfig {
    Boolean {
        #[serde(default)]
        default: bool,
    },
    Number {
        #[serde(default)]
        default: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    String {
        #[serde(default)]
        default: String,
    },
    Enum {
        default: String,
        options: Vec<String>,
    },
    Filters {
        #[serde(default)]
        default: Vec<String>,
        #[serde(default = "default_not_token")]
        not: String,
        #[serde(default = "default_omit_token")]
        omit: String,
    },
}

fn default_not_token() -> String {
    DEFAULT_NOT_TOKEN.to_string()
}

fn default_omit_token() -> String {
    DEFAULT_OMIT_TOKEN.to_string()
}

impl FieldConfig {
    /// Build the blueprint this declaration describes.
    pub fn blueprint(&self) -> Blueprint {
        let bp = match &self.kind {
            KindConfig::Boolean { default } => Blueprint::boolean(*default),
            KindConfig::Number { default, min, max } => {
                let mut bp = Blueprint::number(*default);
                if let Some(min) = min {
                    bp = bp.min(*min);
                }
                if let Some(max) = max {
                    bp = bp.max(*max);
                }
                bp
            }
            KindConfig::String { default } => Blueprint::string(default.clone()),
            KindConfig::Enum { default, options } => {
                Blueprint::enumeration(default.clone(), options.iter().cloned())
            }
            KindConfig::Filters { default, not, omit } => {
                Blueprint::filters(default.iter().cloned())
                    .not_token(not.clone())
                    .omit_token(omit.clone())
            }
        };
        bp.ephemeral(self.ephemeral)
            .ignored(self.ignored)
            .locked(self.locked)
            .nullable(self.nullable)
            .origin(self.origin)
    }
}

impl SchemaConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ParamsError> {
        serde_yaml::from_str(content).map_err(|e| ParamsError::config(INLINE, e))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ParamsError> {
        serde_json::from_str(content).map_err(|e| ParamsError::config(INLINE, e))
    }

    /// Load a schema file. `.json` files are parsed as JSON, anything else
    /// as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let schema: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| ParamsError::config(path, e))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ParamsError::config(path, e))?
        };

        info!(
            path = %path.display(),
            fields = schema.fields.len(),
            "loaded parameter schema"
        );
        Ok(schema)
    }

    /// Build the blueprint set and check every key list against it.
    pub fn blueprint_set(&self) -> Result<BlueprintSet, ParamsError> {
        let set = self
            .fields
            .iter()
            .fold(BlueprintSet::builder(), |b, f| b.field(f.key.clone(), f.blueprint()))
            .build()?;
        set.check_keys(&self.hidden)?;
        set.check_keys(&self.enforced)?;
        set.check_keys(&self.ignored)?;
        Ok(set)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            hidden: self.hidden.clone(),
            enforced: self.enforced.clone(),
        }
    }

    pub fn overrides_config(&self) -> OverridesConfig {
        OverridesConfig {
            storage_key: self.storage_key.clone(),
            enforced: self.enforced.clone(),
            ignored: self.ignored.clone(),
        }
    }
}
