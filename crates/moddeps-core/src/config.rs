use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ResolveError, Result};

/// Whether dependency files must carry a `defineModule(...)` declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationPolicy {
    #[serde(rename = "require")]
    #[default]
    Require,
    #[serde(rename = "optional")]
    Optional,
}

impl DeclarationPolicy {
    pub fn is_required(self) -> bool {
        self == DeclarationPolicy::Require
    }
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Directories searched, in order, after the requesting module's own directory
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// File extension of module sources (default: js)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Declaration policy for dependencies; entry points always need one (default: require)
    #[serde(default)]
    pub dependency_declarations: DeclarationPolicy,
}

fn default_extension() -> String {
    "js".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extension: default_extension(),
            dependency_declarations: DeclarationPolicy::Require,
        }
    }
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub search_paths: Option<Vec<PathBuf>>,
    pub extension: Option<String>,
    pub dependency_declarations: Option<DeclarationPolicy>,
}

impl ResolverConfig {
    /// Load configuration from a JSON (`.json`) or YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content).map_err(|e| ResolveError::Config(e.to_string()))
        } else {
            serde_yaml::from_str(&content).map_err(|e| ResolveError::Config(e.to_string()))
        }
    }

    /// Merge CLI overrides into this configuration.
    ///
    /// Search paths given on the command line are searched before the
    /// configured ones.
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(ref paths) = overrides.search_paths {
            let mut merged = paths.clone();
            merged.append(&mut self.search_paths);
            self.search_paths = merged;
        }
        if let Some(ref extension) = overrides.extension {
            self.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(policy) = overrides.dependency_declarations {
            self.dependency_declarations = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert!(config.search_paths.is_empty());
        assert_eq!(config.extension, "js");
        assert_eq!(config.dependency_declarations, DeclarationPolicy::Require);
    }

    #[test]
    fn test_deserialize_json_config() {
        let json = r#"{
            "searchPaths": ["src", "third_party"],
            "dependencyDeclarations": "optional"
        }"#;
        let config: ResolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("src"), PathBuf::from("third_party")]
        );
        assert_eq!(config.extension, "js");
        assert_eq!(config.dependency_declarations, DeclarationPolicy::Optional);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "searchPaths:\n  - lib\nextension: mjs").unwrap();
        file.flush().unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search_paths, vec![PathBuf::from("lib")]);
        assert_eq!(config.extension, "mjs");
    }

    #[test]
    fn test_from_invalid_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(b"{ not json").unwrap();
        file.flush().unwrap();

        let err = ResolverConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = ResolverConfig {
            search_paths: vec![PathBuf::from("configured")],
            ..ResolverConfig::default()
        };
        config.merge(&CliOverrides {
            search_paths: Some(vec![PathBuf::from("cli")]),
            extension: Some(".mjs".to_string()),
            dependency_declarations: Some(DeclarationPolicy::Optional),
        });

        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("cli"), PathBuf::from("configured")]
        );
        assert_eq!(config.extension, "mjs");
        assert_eq!(config.dependency_declarations, DeclarationPolicy::Optional);
    }
}
