//! Plain-data export/import of the whole fog state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::SNAPSHOT_VERSION;

use super::error::FogError;
use super::region::FogRegion;
use super::settings::FogSettings;
use super::viewport::Viewport;

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    pub regions: Vec<FogRegion>,
    #[serde(default)]
    pub settings: FogSettings,
    #[serde(default)]
    pub viewport: Viewport,
}

impl FogSnapshot {
    pub fn new(regions: Vec<FogRegion>, settings: FogSettings, viewport: Viewport) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            regions,
            settings,
            viewport,
        }
    }

    pub fn to_json(&self) -> Result<String, FogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a snapshot
    pub fn from_json(json: &str) -> Result<Self, FogError> {
        let snapshot: FogSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the whole snapshot before any of it is applied
    pub fn validate(&self) -> Result<(), FogError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(FogError::UnsupportedSnapshotVersion(self.version));
        }

        let mut seen = HashSet::with_capacity(self.regions.len());
        for region in &self.regions {
            if !seen.insert(region.id) {
                return Err(FogError::InvalidSnapshot(format!(
                    "duplicate region id {}",
                    region.id
                )));
            }
            if !region.shape.is_valid() {
                return Err(FogError::InvalidSnapshot(format!(
                    "region {} has invalid {} geometry",
                    region.id,
                    region.shape.kind()
                )));
            }
            if !region.opacity.is_finite() || !(0.0..=1.0).contains(&region.opacity) {
                return Err(FogError::InvalidSnapshot(format!(
                    "region {} opacity {} outside [0, 1]",
                    region.id, region.opacity
                )));
            }
        }

        self.settings.validate()?;

        if !self.viewport.is_valid() {
            return Err(FogError::InvalidSnapshot(format!(
                "invalid viewport {:?}",
                self.viewport
            )));
        }
        Ok(())
    }
}
