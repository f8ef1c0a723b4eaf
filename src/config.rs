use crate::error::{PipelineError, Result};

/// Runtime configuration for the control-plane process
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    /// Whether `resume_all` runs automatically at startup
    pub resume_on_startup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/pipeline_control_development".to_string(),
            resume_on_startup: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(resume) = std::env::var("PIPELINE_RESUME_ON_STARTUP") {
            config.resume_on_startup = resume.parse().map_err(|e| {
                PipelineError::configuration(format!("Invalid resume_on_startup: {e}"))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.resume_on_startup);
        assert!(config.database_url.starts_with("postgresql://"));
    }
}
