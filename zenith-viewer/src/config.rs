//! Viewer configuration

use serde::{Deserialize, Serialize};
use zenith_algorithms::DEFAULT_PICK_THRESHOLD;
use zenith_core::{Error, Result};

/// Frame-rate limits for animated layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub fps_min: f32,
    pub fps_max: f32,
    pub default_fps: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps_min: 1.0,
            fps_max: 200.0,
            default_fps: 30.0,
        }
    }
}

impl PlaybackConfig {
    /// Rejects a non-positive minimum, an empty range and a default outside it
    pub fn validate(&self) -> Result<()> {
        if !(self.fps_min > 0.0 && self.fps_min.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "fps_min must be positive, got {}",
                self.fps_min
            )));
        }
        if !(self.fps_max >= self.fps_min && self.fps_max.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "fps range [{}, {}] is empty",
                self.fps_min, self.fps_max
            )));
        }
        if !(self.fps_min..=self.fps_max).contains(&self.default_fps) {
            return Err(Error::InvalidConfig(format!(
                "default fps {} lies outside [{}, {}]",
                self.default_fps, self.fps_min, self.fps_max
            )));
        }
        Ok(())
    }
}

/// Mouse and projection parameters for [`crate::CameraState`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial zoom: half-extent scale for orthographic views, eye distance for perspective ones
    pub initial_zoom: f32,
    pub rotate_speed: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_zoom: 100.0,
            rotate_speed: 3.0,
            fov_degrees: 90.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub playback: PlaybackConfig,
    pub camera: CameraConfig,
    /// Maximum world-space distance for a pick to count
    pub pick_threshold: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            camera: CameraConfig::default(),
            pick_threshold: DEFAULT_PICK_THRESHOLD,
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;
        if !(self.pick_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pick threshold must be positive, got {}",
                self.pick_threshold
            )));
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(Error::InvalidConfig(format!(
                "invalid clip planes near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(Error::InvalidConfig(format!(
                "field of view must lie in (0, 180) degrees, got {}",
                camera.fov_degrees
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pick_threshold, 0.5);
        assert_eq!(config.playback.default_fps, 30.0);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = ViewerConfig::from_json_str(r#"{ "playback": { "default_fps": 60.0 } }"#).unwrap();
        assert_eq!(config.playback.default_fps, 60.0);
        assert_eq!(config.playback.fps_max, 200.0);
        assert_eq!(config.pick_threshold, 0.5);
        assert_eq!(config.camera.far, 1000.0);
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        assert!(matches!(
            ViewerConfig::from_json_str("not json"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{ "playback": { "fps_min": 0.0 } }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{ "playback": { "default_fps": 500.0 } }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{ "pick_threshold": -1.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
    }
}
