use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::constants::INSTRUMENT_GROUP_FILE;
use crate::error::{Error, Result};

/// Instrument groups organized by sector/category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentGroups {
    #[serde(flatten)]
    pub groups: HashMap<String, Vec<String>>,
}

impl InstrumentGroups {
    /// Load instrument groups from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let groups: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .map_err(|e| Error::Parse(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Self { groups })
    }

    /// Load from the default location (instrument_group.json in the cwd)
    pub fn load_default() -> Result<Self> {
        Self::from_file(INSTRUMENT_GROUP_FILE)
    }

    /// All instruments across all groups, uppercased, deduplicated, sorted
    pub fn all_instruments(&self) -> Vec<String> {
        let mut instruments: Vec<String> = self
            .groups
            .values()
            .flatten()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        instruments.sort();
        instruments.dedup();
        instruments
    }

    /// Instruments in a specific group
    pub fn get_group(&self, group_name: &str) -> Option<&Vec<String>> {
        self.groups.get(group_name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn instrument_count(&self) -> usize {
        self.all_instruments().len()
    }
}
