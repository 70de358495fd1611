//! Scenario files: a configuration, a controller, and a sequence of passes

use aidroute_core::{parse_aid_map, AidIntent, AidMap, RoutingConfig, RoutingDefect};
use aidroute_nfcc::ControllerConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: RoutingConfig,
    pub controller: ControllerConfig,
    pub passes: Vec<PassSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSpec {
    /// Raw AID registration strings, `*`/`#` markers included
    pub aids: BTreeMap<String, AidIntent>,
    pub force: bool,
    pub override_pass: bool,
    /// Power cycle the controller before this pass
    pub clear_before: bool,
}

impl PassSpec {
    pub fn parsed_aids(&self) -> (AidMap, Vec<RoutingDefect>) {
        parse_aid_map(
            self.aids
                .iter()
                .map(|(raw, intent)| (raw.as_str(), intent.clone())),
        )
    }
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_json::from_str(text)?;
        if scenario.passes.is_empty() {
            anyhow::bail!("scenario has no passes");
        }
        Ok(scenario)
    }
}

/// Display name used in records: the file name without directories
pub fn scenario_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
