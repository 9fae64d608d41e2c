//! Material description as seen by buckets
//!
//! Materials are loaded elsewhere; a bucket only needs the texture, the
//! alpha mode that selects its pipelines, and the two kinds of texture
//! animation (frame sequence and UV scrolling).

use crate::render::device::TextureId;

/// Alpha blending mode of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaMode {
    /// Opaque geometry
    #[default]
    Solid,
    /// Per-pixel cutout
    AlphaTest,
    /// Alpha blended
    Transparent,
    /// Additive blending, never lit or shadowed
    AdditiveLight,
    /// Multiplicative blending
    Multiply,
    /// Multiplicative blending with 2x scale
    Multiply2,
    /// Unresolved material; every pass is disabled
    Invalid,
}

impl AlphaMode {
    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Solid => "Solid",
            Self::AlphaTest => "AlphaTest",
            Self::Transparent => "Transparent",
            Self::AdditiveLight => "AdditiveLight",
            Self::Multiply => "Multiply",
            Self::Multiply2 => "Multiply2",
            Self::Invalid => "Invalid",
        }
    }
}

impl std::fmt::Display for AlphaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Material referenced by a bucket
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base texture
    pub texture: TextureId,
    /// Blend mode
    pub alpha: AlphaMode,
    /// Animated texture sequence; empty for static textures
    pub frames: Vec<TextureId>,
    /// Ticks each animation frame stays on screen
    pub frame_ticks: u64,
    /// UV scroll period per axis in ticks, zero disables the axis.
    /// The sign gives the scroll direction.
    pub scroll_period: (i32, i32),
}

impl Material {
    /// Create a material with a single static texture
    pub fn new(texture: TextureId, alpha: AlphaMode) -> Self {
        Self {
            texture,
            alpha,
            frames: Vec::new(),
            frame_ticks: 0,
            scroll_period: (0, 0),
        }
    }

    /// Use an animated frame sequence
    pub fn with_frames(mut self, frames: Vec<TextureId>, frame_ticks: u64) -> Self {
        self.frames = frames;
        self.frame_ticks = frame_ticks;
        self
    }

    /// Scroll UVs with the given per-axis periods
    pub fn with_scroll(mut self, period_x: i32, period_y: i32) -> Self {
        self.scroll_period = (period_x, period_y);
        self
    }

    /// Whether the material cycles through a texture sequence
    pub fn is_animated(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Texture to show `elapsed` ticks into the sequence
    pub fn frame_at(&self, elapsed: u64) -> TextureId {
        if self.frames.is_empty() {
            return self.texture;
        }
        let frame = if self.frame_ticks == 0 { 0 } else { elapsed / self.frame_ticks };
        self.frames[(frame % self.frames.len() as u64) as usize]
    }

    /// UV scroll phase for `tick`, one component per axis
    pub fn scroll_phase(&self, tick: u64) -> [f32; 2] {
        let axis = |period: i32| {
            if period == 0 {
                return 0.0;
            }
            let magnitude = u64::from(period.unsigned_abs());
            (tick % magnitude) as f32 / period as f32
        };
        [axis(self.scroll_period.0), axis(self.scroll_period.1)]
    }
}
