//! Fog panel UI module.
//!
//! Right-side panel for authoring fog: global settings, bulk actions, the
//! selected region and the region list, with renderer metrics at the bottom.
//!
//! ## Module Structure
//!
//! - [`settings`] - Global fog settings editor
//! - [`regions`] - Bulk actions, selected region properties and region list
//! - [`metrics`] - Renderer metrics readout
//! - [`main_panel`] - Main panel orchestration

mod main_panel;
mod metrics;
mod regions;
mod settings;

pub use main_panel::fog_panel_ui;
