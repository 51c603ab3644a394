use std::net::SocketAddr;

/// User-Agent fragments that mark a request as coming from a script or crawler.
pub const DEFAULT_BLOCKED_USER_AGENTS: [&str; 11] = [
    "curl",
    "wget",
    "bot",
    "crawler",
    "spider",
    "scrapy",
    "python-requests",
    "java",
    "httpclient",
    "okhttp",
    "php",
];

/// Request guards applied in front of every API route.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Frontend origins allowed to call the API. Empty disables the
    /// origin check and lets CORS accept any origin.
    pub allowed_origins: Vec<String>,
    /// Lower-case User-Agent fragments rejected with 403.
    pub blocked_user_agents: Vec<String>,
    /// Mutating requests (POST, PUT, DELETE) allowed per IP per window.
    pub rate_limit_requests: usize,
    /// Length of the rate limit window in seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            blocked_user_agents: DEFAULT_BLOCKED_USER_AGENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_limit_requests: 600,
            rate_limit_window_secs: 60,
        }
    }
}

impl GuardConfig {
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    pub fn origin_check_enabled(&self) -> bool {
        !self.allowed_origins.is_empty()
    }
}

/// Object storage settings for presigned photo uploads.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Lifetime of a presigned URL in seconds.
    pub expires_secs: u64,
    /// Overrides the virtual-hosted `<bucket>.s3.<region>.amazonaws.com` host,
    /// e.g. for S3-compatible stores.
    pub endpoint_host: Option<String>,
}

impl UploadConfig {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            expires_secs: 15 * 60,
            endpoint_host: None,
        }
    }

    pub fn host(&self) -> String {
        self.endpoint_host
            .clone()
            .unwrap_or_else(|| format!("{}.s3.{}.amazonaws.com", self.bucket, self.region))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Upper bound on stored jobs.
    pub max_jobs: usize,
    pub guard: GuardConfig,
    /// `None` disables the presigned upload endpoint.
    pub uploads: Option<UploadConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_jobs: 10_000,
            guard: GuardConfig::default(),
            uploads: None,
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_uploads(mut self, uploads: UploadConfig) -> Self {
        self.uploads = Some(uploads);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_config_default() {
        let cfg = GuardConfig::default();
        assert!(cfg.allowed_origins.is_empty());
        assert!(!cfg.origin_check_enabled());
        assert_eq!(cfg.blocked_user_agents.len(), 11);
        assert!(cfg.blocked_user_agents.contains(&"python-requests".to_string()));
        assert_eq!(cfg.rate_limit_requests, 600);
        assert_eq!(cfg.rate_limit_window_secs, 60);
    }

    #[test]
    fn guard_config_with_origin() {
        let cfg = GuardConfig::default().with_allowed_origin("https://app.example.com");
        assert!(cfg.origin_check_enabled());
        assert_eq!(cfg.allowed_origins, vec!["https://app.example.com"]);
    }

    #[test]
    fn upload_config_defaults_and_host() {
        let cfg = UploadConfig::new("photos", "us-east-2", "AKID", "secret");
        assert_eq!(cfg.expires_secs, 900);
        assert_eq!(cfg.host(), "photos.s3.us-east-2.amazonaws.com");

        let custom = UploadConfig {
            endpoint_host: Some("minio.local:9000".to_string()),
            ..cfg
        };
        assert_eq!(custom.host(), "minio.local:9000");
    }

    #[test]
    fn server_config_default() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.max_jobs, 10_000);
        assert!(cfg.uploads.is_none());
    }

    #[test]
    fn server_config_new_and_uploads() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        let cfg = ServerConfig::new(addr)
            .with_uploads(UploadConfig::new("photos", "us-east-2", "AKID", "secret"));
        assert_eq!(cfg.listen_addr, addr);
        assert_eq!(cfg.uploads.map(|u| u.bucket), Some("photos".to_string()));
    }
}
