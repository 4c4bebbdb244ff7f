//! MedTriage core library
//!
//! Clinical assessment and disposition workflow for first-responder triage:
//! intake, assessment, severity override, hospital matching, navigation and
//! handoff.

pub mod core;
pub mod error;
pub mod models;
pub mod providers;
pub mod report;
pub mod workflow;

pub use error::{Result, TriageError};

/// Application configuration
pub mod config {
    use serde::Deserialize;
    use url::Url;
    use validator::Validate;

    use crate::error::TriageError;
    use crate::models::GeoPoint;

    pub const DEFAULT_BASE_URL: &str = "https://vrxlwtzfff.execute-api.us-east-1.amazonaws.com/dev";
    pub const DEFAULT_TRIAGE_PATH: &str = "/triage";

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct Config {
        #[validate]
        pub classifier: ClassifierConfig,
        #[serde(default)]
        pub dispatch: DispatchConfig,
        pub session: SessionConfig,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ClassifierMode {
        Remote,
        Local,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    pub struct ClassifierConfig {
        #[validate(url)]
        pub base_url: String,
        pub triage_path: String,
        #[validate(range(min = 1, max = 300))]
        pub timeout_secs: u64,
        pub mode: ClassifierMode,
    }

    impl ClassifierConfig {
        /// `{base_url}{triage_path}`, tolerant of slashes on either side.
        pub fn endpoint(&self) -> Result<Url, TriageError> {
            let base = if self.base_url.ends_with('/') {
                Url::parse(&self.base_url)?
            } else {
                Url::parse(&format!("{}/", self.base_url))?
            };
            Ok(base.join(self.triage_path.trim_start_matches('/'))?)
        }
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct DispatchConfig {
        pub last_known_lat: Option<f64>,
        pub last_known_lng: Option<f64>,
    }

    impl DispatchConfig {
        pub fn last_known(&self) -> Option<GeoPoint> {
            self.last_known_lat
                .zip(self.last_known_lng)
                .map(|(lat, lng)| GeoPoint::new(lat, lng))
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SessionConfig {
        pub role: String,
        pub operator: Option<String>,
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("classifier.base_url", DEFAULT_BASE_URL)?
            .set_default("classifier.triage_path", DEFAULT_TRIAGE_PATH)?
            .set_default("classifier.timeout_secs", 30i64)?
            .set_default("classifier.mode", "remote")?
            .set_default("session.role", "RMP")
    }

    fn finish(settings: config::Config) -> Result<Config, TriageError> {
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<Config, TriageError> {
        finish(builder()?.build()?)
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, TriageError> {
        let env = std::env::var("MEDTRIAGE_ENV").unwrap_or_else(|_| "development".into());

        let settings = builder()?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("MEDTRIAGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        finish(settings)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_point_at_the_triage_endpoint() {
            let config = defaults().unwrap();
            assert_eq!(config.classifier.mode, ClassifierMode::Remote);
            assert_eq!(config.classifier.timeout_secs, 30);
            assert_eq!(
                config.classifier.endpoint().unwrap().as_str(),
                "https://vrxlwtzfff.execute-api.us-east-1.amazonaws.com/dev/triage"
            );
            assert_eq!(config.session.role, "RMP");
            assert!(config.dispatch.last_known().is_none());
        }

        #[test]
        fn endpoint_handles_slashes() {
            let config = ClassifierConfig {
                base_url: "http://localhost:9000/api/".into(),
                triage_path: "triage".into(),
                timeout_secs: 5,
                mode: ClassifierMode::Remote,
            };
            assert_eq!(config.endpoint().unwrap().as_str(), "http://localhost:9000/api/triage");
        }

        #[test]
        fn rejects_out_of_range_timeout() {
            let settings = builder()
                .unwrap()
                .set_override("classifier.timeout_secs", 0i64)
                .unwrap()
                .build()
                .unwrap();
            assert!(matches!(finish(settings), Err(TriageError::Config(_))));
        }
    }
}
