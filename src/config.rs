use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KioskConfig {
    pub api: ApiConfig,
    pub camera: CameraConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the remote verification service
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_api_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second for the preview stream
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Video format (MJPG, YUYV, etc.)
    #[serde(default = "default_camera_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConsoleConfig {
    /// Location string recorded on registrations and check-ins
    #[serde(default = "default_console_location")]
    pub location: String,

    /// Device identifier reported to the service
    #[serde(default = "default_console_device_id")]
    pub device_id: String,

    /// Operator name recorded as `created_by` on registrations
    #[serde(default = "default_console_operator")]
    pub operator: String,

    /// Page size for the employee roster fetch
    #[serde(default = "default_employees_per_page")]
    pub employees_per_page: u32,

    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl KioskConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("biokiosk.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("api.base_url", default_api_base_url())?
            .set_default("api.timeout_ms", default_api_timeout_ms())?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.format", default_camera_format())?
            .set_default("console.location", default_console_location())?
            .set_default("console.device_id", default_console_device_id())?
            .set_default("console.operator", default_console_operator())?
            .set_default(
                "console.employees_per_page",
                default_employees_per_page(),
            )?
            .set_default(
                "console.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with BIOKIOSK_ prefix
            .add_source(Environment::with_prefix("BIOKIOSK").separator("_"))
            .build()?;

        let config: KioskConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "API base_url must not be empty".to_string(),
            ));
        }

        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "API timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.console.employees_per_page == 0 {
            return Err(ConfigError::Message(
                "Employee page size must be greater than 0".to_string(),
            ));
        }

        if self.console.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: default_api_base_url(),
                timeout_ms: default_api_timeout_ms(),
            },
            camera: CameraConfig {
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                format: default_camera_format(),
            },
            console: ConsoleConfig {
                location: default_console_location(),
                device_id: default_console_device_id(),
                operator: default_console_operator(),
                employees_per_page: default_employees_per_page(),
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_api_timeout_ms() -> u64 {
    10_000
}

fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_camera_format() -> String {
    "MJPG".to_string()
}

fn default_console_location() -> String {
    "Main Office".to_string()
}
fn default_console_device_id() -> String {
    "KIOSK-01".to_string()
}
fn default_console_operator() -> String {
    "system".to_string()
}
fn default_employees_per_page() -> u32 {
    50
}
fn default_event_bus_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KioskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.camera.fps, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = KioskConfig::default();

        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());

        config.camera.resolution = (640, 480);
        assert!(config.validate().is_ok());

        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "http://kiosk-api.internal:5000".to_string();
        config.console.employees_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://verify.example.net\"\n\n[camera]\nfps = 15\n"
        )
        .unwrap();

        let config = KioskConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://verify.example.net");
        assert_eq!(config.camera.fps, 15);
        // Untouched sections fall back to defaults
        assert_eq!(config.console.employees_per_page, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = KioskConfig::load_from_file("/nonexistent/biokiosk.toml").unwrap();
        assert_eq!(config.api.timeout_ms, default_api_timeout_ms());
        assert_eq!(config.camera.resolution, (640, 480));
    }
}
