use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{skeleton::BodyDimensions, PldError, Result};

/// Slowest frame rate a host may drive; one frame every ten seconds.
const MIN_FPS: f32 = 0.1;
/// Shortest cycle or duration accepted as an override, in seconds.
const MIN_DURATION: f32 = 1e-3;

/// Top-level configuration structure for a stimulus session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub animation: AnimationOptions,
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Playback options accepted by [`create_animation`](crate::create_animation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    /// Frame rate of the host loop, used by [`Animation::step`](crate::Animation::step).
    pub fps: f32,
    /// Replaces the (modulated) cycle length or duration, in seconds.
    pub duration_override: Option<f32>,
    /// Transitional actions restart instead of completing.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Custom segment lengths; anthropometric defaults when absent.
    pub dimensions: Option<BodyDimensions>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            fps: 60.0,
            duration_override: None,
            looping: false,
            dimensions: None,
        }
    }
}

impl AnimationOptions {
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration_override = Some(seconds);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps < MIN_FPS {
            return Err(PldError::options(format!(
                "fps must be a finite number of at least {MIN_FPS}, got {}",
                self.fps
            )));
        }
        if let Some(seconds) = self.duration_override {
            if !seconds.is_finite() || seconds < MIN_DURATION {
                return Err(PldError::options(format!(
                    "duration override must be a finite number of at least {MIN_DURATION} seconds, got {seconds}"
                )));
            }
        }
        if let Some(dims) = &self.dimensions {
            dims.validate()?;
        }
        Ok(())
    }
}

/// Presentation settings for hosts that draw the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// Pixels per metre of body space.
    pub scale: f32,
    pub point_radius: f32,
    pub background: [u8; 3],
    pub foreground: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            scale: 200.0,
            point_radius: 5.0,
            background: [0, 0, 0],
            foreground: [255, 255, 255],
        }
    }
}
