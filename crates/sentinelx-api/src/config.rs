//! API configuration.

use std::path::PathBuf;

/// Video used when nothing else is configured, relative to the working directory.
pub const DEFAULT_VIDEO_PATH: &str = "videos/smoke.mp4";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Frame source: a video file or a directory of images
    pub video_path: PathBuf,
    /// Directory snapshots are written to and served from
    pub snapshot_dir: PathBuf,
    /// Max request body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            video_path: PathBuf::from(DEFAULT_VIDEO_PATH),
            snapshot_dir: PathBuf::from("."),
            max_body_size: 64 * 1024,
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            video_path: std::env::var("SENTINEL_VIDEO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_VIDEO_PATH)),
            snapshot_dir: std::env::var("SENTINEL_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Frame source paths to try in order: the configured path, then the
    /// default video under the working directory.
    pub fn video_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.video_path.clone()];
        if let Ok(cwd) = std::env::current_dir() {
            let fallback = cwd.join(DEFAULT_VIDEO_PATH);
            if fallback != self.video_path {
                candidates.push(fallback);
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(!config.is_production());
    }

    #[test]
    fn test_video_candidates_start_with_configured_path() {
        let config = ApiConfig {
            video_path: PathBuf::from("/data/kitchen.mp4"),
            ..Default::default()
        };
        let candidates = config.video_candidates();
        assert_eq!(candidates[0], PathBuf::from("/data/kitchen.mp4"));
        assert!(candidates.len() <= 2);
    }
}
