//! Global fog settings.
//!
//! Settings are changed only through an explicit update that sanitizes the result, so
//! the renderer and animation scheduler can trust every field.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ANIMATION_DURATION_MS, MAX_EDGE_BLUR, MAX_PATTERN_SCALE, MIN_PATTERN_SCALE,
};

use super::error::FogError;

/// Fill pattern used for fog regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Solid,
    Crosshatch,
    Diagonal,
    Dots,
}

impl PatternKind {
    pub fn all() -> &'static [PatternKind] {
        &[
            PatternKind::Solid,
            PatternKind::Crosshatch,
            PatternKind::Diagonal,
            PatternKind::Dots,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PatternKind::Solid => "Solid",
            PatternKind::Crosshatch => "Crosshatch",
            PatternKind::Diagonal => "Diagonal",
            PatternKind::Dots => "Dots",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Low,
    Medium,
    #[default]
    High,
    /// High plus an attempt at the GPU compositor
    Ultra,
}

impl RenderQuality {
    pub fn all() -> &'static [RenderQuality] {
        &[
            RenderQuality::Low,
            RenderQuality::Medium,
            RenderQuality::High,
            RenderQuality::Ultra,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RenderQuality::Low => "Low",
            RenderQuality::Medium => "Medium",
            RenderQuality::High => "High",
            RenderQuality::Ultra => "Ultra",
        }
    }

    /// Number of segments used to flatten a circle outline
    pub fn circle_segments(&self) -> usize {
        match self {
            RenderQuality::Low => 16,
            RenderQuality::Medium => 32,
            RenderQuality::High | RenderQuality::Ultra => 64,
        }
    }

    pub fn allows_blur(&self) -> bool {
        !matches!(self, RenderQuality::Low)
    }

    pub fn wants_gpu(&self) -> bool {
        matches!(self, RenderQuality::Ultra)
    }
}

impl fmt::Display for RenderQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub enabled: bool,
    /// Multiplier applied to every region's opacity
    pub global_opacity: f32,
    pub animation_duration_ms: f64,
    /// Edge blur radius in screen pixels
    pub edge_blur: f32,
    #[serde(with = "color_serde")]
    pub color: Color,
    pub pattern: PatternKind,
    /// Pattern tile size in screen pixels
    pub pattern_scale: f32,
    pub smooth_transitions: bool,
    pub quality: RenderQuality,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            global_opacity: 1.0,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            edge_blur: 0.0,
            color: Color::srgb(0.0, 0.0, 0.0),
            pattern: PatternKind::Solid,
            pattern_scale: 16.0,
            smooth_transitions: true,
            quality: RenderQuality::High,
        }
    }
}

impl FogSettings {
    /// Clamp every numeric field into its allowed range.
    ///
    /// Non-finite values fall back to the defaults.
    pub fn sanitize(&mut self) {
        let defaults = FogSettings::default();

        self.global_opacity =
            finite_or(self.global_opacity, defaults.global_opacity).clamp(0.0, 1.0);
        self.animation_duration_ms = if self.animation_duration_ms.is_finite() {
            self.animation_duration_ms.max(0.0)
        } else {
            defaults.animation_duration_ms
        };
        self.edge_blur = finite_or(self.edge_blur, defaults.edge_blur).clamp(0.0, MAX_EDGE_BLUR);
        self.pattern_scale = finite_or(self.pattern_scale, defaults.pattern_scale)
            .clamp(MIN_PATTERN_SCALE, MAX_PATTERN_SCALE);
    }

    /// Strict check used when importing a snapshot
    pub fn validate(&self) -> Result<(), FogError> {
        if !self.global_opacity.is_finite() || !(0.0..=1.0).contains(&self.global_opacity) {
            return Err(FogError::InvalidSnapshot(format!(
                "global opacity {} outside [0, 1]",
                self.global_opacity
            )));
        }
        if !self.animation_duration_ms.is_finite() || self.animation_duration_ms < 0.0 {
            return Err(FogError::InvalidSnapshot(format!(
                "animation duration {} is negative or not finite",
                self.animation_duration_ms
            )));
        }
        if !self.edge_blur.is_finite() || !(0.0..=MAX_EDGE_BLUR).contains(&self.edge_blur) {
            return Err(FogError::InvalidSnapshot(format!(
                "edge blur {} outside [0, {}]",
                self.edge_blur, MAX_EDGE_BLUR
            )));
        }
        if !self.pattern_scale.is_finite()
            || !(MIN_PATTERN_SCALE..=MAX_PATTERN_SCALE).contains(&self.pattern_scale)
        {
            return Err(FogError::InvalidSnapshot(format!(
                "pattern scale {} outside [{}, {}]",
                self.pattern_scale, MIN_PATTERN_SCALE, MAX_PATTERN_SCALE
            )));
        }
        Ok(())
    }

    /// Blur radius actually applied at the current quality
    pub fn effective_blur(&self) -> f32 {
        if self.quality.allows_blur() {
            self.edge_blur
        } else {
            0.0
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Serialize colors as `[r, g, b, a]` in sRGB, the same way saved annotations do
pub(crate) mod color_serde {
    use bevy::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn to_array(color: Color) -> [f32; 4] {
        let srgba = color.to_srgba();
        [srgba.red, srgba.green, srgba.blue, srgba.alpha]
    }

    pub fn from_array(arr: [f32; 4]) -> Color {
        Color::srgba(arr[0], arr[1], arr[2], arr[3])
    }

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        to_array(*color).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        <[f32; 4]>::deserialize(deserializer).map(from_array)
    }
}
