use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the DICOM backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind (default: "0.0.0.0")
    pub host: String,

    /// Port to bind (default: 5000)
    pub port: u16,

    /// Directory holding the stored `<uuid>.dcm` files (default: "./uploads")
    pub uploads_dir: PathBuf,

    /// Maximum upload size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Simulated enhancement latency in milliseconds (default: 2000)
    pub processing_delay_ms: u64,

    /// Reject uploads lacking the `DICM` preamble instead of warning (default: false)
    pub strict_dicom_preamble: bool,
}

/// Extra room on top of `max_file_size` for multipart boundaries and headers.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            uploads_dir: PathBuf::from("uploads"),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            processing_delay_ms: 2000,
            strict_dicom_preamble: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.uploads_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            processing_delay_ms: env::var("PROCESSING_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.processing_delay_ms),

            strict_dicom_preamble: env::var("STRICT_DICOM_PREAMBLE")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.strict_dicom_preamble),
        }
    }

    /// Config rooted at `uploads_dir` with no processing delay, for tests and tooling.
    pub fn ephemeral(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            processing_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// Upper bound for a whole request body, multipart framing included.
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", addr, e))
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value != "false" && value != "0" && !value.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.processing_delay(), Duration::from_secs(2));
        assert_eq!(config.port, 5000);
        assert!(!config.strict_dicom_preamble);
    }

    #[test]
    fn test_ephemeral_config() {
        let config = AppConfig::ephemeral("/tmp/dicom-test");
        assert_eq!(config.uploads_dir, PathBuf::from("/tmp/dicom-test"));
        assert_eq!(config.processing_delay_ms, 0);
        assert_eq!(config.max_file_size, AppConfig::default().max_file_size);
    }

    #[test]
    fn test_body_limit_includes_overhead() {
        let config = AppConfig::default();
        assert_eq!(config.body_limit(), config.max_file_size + MULTIPART_OVERHEAD);

        let config = AppConfig {
            max_file_size: usize::MAX,
            ..AppConfig::default()
        };
        assert_eq!(config.body_limit(), usize::MAX);
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("FALSE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
