use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolver::LoadSequence;

/// Serializable summary of a load sequence for include-list and bundle emitters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadManifest {
    /// Scripts in load order
    pub scripts: Vec<ScriptEntry>,

    /// Stylesheet names in the order their modules load, duplicates kept
    pub style_sheets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl LoadManifest {
    pub fn from_sequence(sequence: &LoadSequence) -> Self {
        let mut manifest = LoadManifest::default();

        for module in sequence.modules() {
            manifest
                .style_sheets
                .extend(module.style_sheet_names().iter().cloned());
            manifest.scripts.push(ScriptEntry {
                name: module.display_name(),
                filename: module.filename().map(PathBuf::from),
                dependencies: module.dependent_module_names().to_vec(),
            });
        }

        manifest
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
