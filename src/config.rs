//! Design assistant configuration, persisted as TOML.
//!
//! Lives at `$XDG_CONFIG_HOME/progreval/config.toml` unless a path is given.
//! A missing file means defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::design::session::DEFAULT_MAX_RESULTS;
use crate::error::{ConfigError, ConfigResult};
use crate::query::TemplateCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Serialized ontology to load at startup.
    #[serde(default)]
    pub ontology_path: Option<PathBuf>,
    /// Base IRI for resolving relative IRIs in the ontology.
    #[serde(default = "default_base_iri")]
    pub base_iri: String,
    /// Media type (or short name) of the ontology file.
    #[serde(default = "default_media_type")]
    pub media_type: String,
    /// Example exercises returned per submission.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Fixed shuffle seed; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Template name -> replacement query text.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

fn default_base_iri() -> String {
    "urn:protege:ontology:progreval".into()
}
fn default_media_type() -> String {
    "application/rdf+xml".into()
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            ontology_path: None,
            base_iri: default_base_iri(),
            media_type: default_media_type(),
            max_results: default_max_results(),
            seed: None,
            templates: BTreeMap::new(),
        }
    }
}

impl DesignConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load if the file exists, else defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        self.catalog().map(|_| ())
    }

    /// Built-in templates with this config's overrides applied.
    pub fn catalog(&self) -> ConfigResult<TemplateCatalog> {
        Ok(TemplateCatalog::with_overrides(&self.templates)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::query::TemplateKind;

    #[test]
    fn defaults() {
        let cfg = DesignConfig::default();
        assert_eq!(cfg.max_results, 3);
        assert_eq!(cfg.media_type, "application/rdf+xml");
        assert!(cfg.templates.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn config_roundtrip_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let mut cfg = DesignConfig {
            ontology_path: Some(PathBuf::from("ProgrEval-Ontology.owl")),
            seed: Some(42),
            ..Default::default()
        };
        cfg.templates.insert(
            "audience".into(),
            "SELECT ?Label ?Instance_URI WHERE { ?Instance_URI ?p ?Label }".into(),
        );
        cfg.save(&path).unwrap();

        let loaded = DesignConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        let catalog = loaded.catalog().unwrap();
        assert!(catalog.get(TemplateKind::Audience).text.starts_with("SELECT"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "max_results = 5\n").unwrap();
        let cfg = DesignConfig::load(&path).unwrap();
        assert_eq!(cfg.max_results, 5);
        assert_eq!(cfg.base_iri, "urn:protege:ontology:progreval");
    }

    #[test]
    fn missing_file_is_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = DesignConfig::load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, DesignConfig::default());
    }

    #[test]
    fn rejects_zero_max_results() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "max_results = 0\n").unwrap();
        assert!(matches!(
            DesignConfig::load(&path),
            Err(ConfigError::ZeroMaxResults)
        ));
    }

    #[test]
    fn rejects_misspelled_placeholder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[templates]\nactivity = \"SELECT * WHERE { ?s ?p {{FORMATO_URI}} }\"\n",
        )
        .unwrap();
        assert!(matches!(
            DesignConfig::load(&path),
            Err(ConfigError::Template(TemplateError::UnknownPlaceholder { .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "max_results = = 3").unwrap();
        assert!(matches!(DesignConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
