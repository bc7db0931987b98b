//! Configuration module for the memory site backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::models::MAX_PHOTOS;

/// Default per-file upload ceiling (100 MiB).
pub const DEFAULT_UPLOAD_MAX_SIZE: usize = 100 * 1024 * 1024;

/// Room for the text fields of a multipart form.
const FORM_FIELDS_ALLOWANCE: usize = 1024 * 1024;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding admin routes (unset disables auth)
    pub admin_psk: Option<String>,
    /// Path to the JSON content document
    pub content_path: PathBuf,
    /// Root directory holding the photos, videos and timeline folders
    pub uploads_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Maximum size of one uploaded file in bytes
    pub upload_max_size: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_psk = env::var("ADMIN_PSK").ok().filter(|s| !s.is_empty());

        let content_path = env::var("CONTENT_FILE")
            .unwrap_or_else(|_| "./data/content.json".to_string())
            .into();

        let uploads_dir = env::var("UPLOADS_DIR")
            .unwrap_or_else(|_| "./public/uploads".to_string())
            .into();

        let host = env::var("HOST")
            .ok()
            .and_then(|h| h.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let upload_max_size = env::var("UPLOAD_MAX_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_UPLOAD_MAX_SIZE);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            admin_psk,
            content_path,
            uploads_dir,
            bind_addr: SocketAddr::new(host, port),
            upload_max_size,
            log_level,
            log_json,
        }
    }

    /// Ceiling on a whole multipart request: a full batch of photos at the
    /// per-file limit plus the form fields.
    pub fn upload_request_limit(&self) -> usize {
        self.upload_max_size
            .saturating_mul(MAX_PHOTOS)
            .saturating_add(FORM_FIELDS_ALLOWANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    /// Serializes tests that mutate process environment.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: &[&str] = &[
        "ADMIN_PSK",
        "CONTENT_FILE",
        "UPLOADS_DIR",
        "HOST",
        "PORT",
        "UPLOAD_MAX_SIZE",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env();

        assert!(config.admin_psk.is_none());
        assert_eq!(config.content_path, PathBuf::from("./data/content.json"));
        assert_eq!(config.uploads_dir, PathBuf::from("./public/uploads"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3001");
        assert_eq!(config.upload_max_size, DEFAULT_UPLOAD_MAX_SIZE);
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("PORT", "8088");
        env::set_var("HOST", "0.0.0.0");
        env::set_var("UPLOAD_MAX_SIZE", "not-a-number");
        env::set_var("ADMIN_PSK", "");
        env::set_var("LOG_FORMAT", "JSON");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8088");
        assert_eq!(config.upload_max_size, DEFAULT_UPLOAD_MAX_SIZE);
        assert!(config.admin_psk.is_none());
        assert!(config.log_json);
    }

    #[test]
    fn test_request_limit_covers_a_full_batch() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("UPLOAD_MAX_SIZE", "1000");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.upload_max_size, 1000);
        assert!(config.upload_request_limit() >= 1000 * MAX_PHOTOS);

        let huge = Config {
            upload_max_size: usize::MAX,
            ..config
        };
        assert_eq!(huge.upload_request_limit(), usize::MAX);
    }
}
