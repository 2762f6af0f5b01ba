/// Demo configuration loaded from TOML
use std::path::Path;
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use simple3d_core::{Camera, DeliveryMode};

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but makes no sense
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Settings for the terminal demo. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub target_fps: u32,
    pub delivery_mode: DeliveryMode,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    /// Height of a terminal cell divided by its width
    pub cell_aspect: f32,
    pub light_direction: [f32; 3],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            delivery_mode: DeliveryMode::AllHits,
            camera_position: [0.0, 3.0, 8.0],
            camera_target: [0.0, 0.0, 0.0],
            cell_aspect: 2.0,
            light_direction: [-0.4, 1.0, 0.6],
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }
        if !(self.cell_aspect.is_finite() && self.cell_aspect > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_aspect must be positive, got {}",
                self.cell_aspect
            )));
        }
        if Vector3::from(self.light_direction).norm() <= f32::EPSILON {
            return Err(ConfigError::Invalid("light_direction must be non-zero".to_string()));
        }
        if self.camera_position == self.camera_target {
            return Err(ConfigError::Invalid(
                "camera_position and camera_target must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    pub fn light(&self) -> Vector3<f32> {
        Vector3::from(self.light_direction)
    }

    /// Camera for a terminal of `columns` x `rows` character cells
    pub fn camera(&self, columns: u16, rows: u16) -> Camera {
        let mut camera = Camera::new(u32::from(columns.max(1)), u32::from(rows.max(1)));
        camera.position = Point3::from(self.camera_position);
        camera.look_at(Point3::from(self.camera_target));
        self.fit_aspect(&mut camera, columns, rows);
        camera
    }

    /// Correct the aspect ratio for cells that are taller than they are wide
    pub fn fit_aspect(&self, camera: &mut Camera, columns: u16, rows: u16) {
        if columns > 0 && rows > 0 {
            camera.aspect = f32::from(columns) / (f32::from(rows) * self.cell_aspect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(DemoConfig::from_toml_str("").unwrap(), DemoConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = DemoConfig::from_toml_str(
            r#"
            target_fps = 60
            delivery_mode = "nearest_hit"
            camera_position = [4.0, 4.0, 4.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.delivery_mode, DeliveryMode::NearestHit);
        assert_eq!(config.camera_position, [4.0, 4.0, 4.0]);
        assert_eq!(config.cell_aspect, 2.0);
        assert_eq!(config.frame_time(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            DemoConfig::from_toml_str("fps = 30"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DemoConfig::from_toml_str("target_fps = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DemoConfig::from_toml_str("light_direction = [0.0, 0.0, 0.0]"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_camera_uses_cell_aspect() {
        let config = DemoConfig::default();
        let camera = config.camera(80, 20);
        assert!((camera.aspect - 2.0).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(0.0, 3.0, 8.0));
    }

    #[test]
    fn test_camera_looks_at_configured_target() {
        let config = DemoConfig::from_toml_str("camera_target = [1.0, 0.5, -2.0]").unwrap();
        let camera = config.camera(80, 24);
        assert_eq!(camera.target, Point3::new(1.0, 0.5, -2.0));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DemoConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
