use crate::model::error::InitError;
use serde::{Deserialize, Serialize};

/// Caller-supplied settings, merged over the defaults at initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Upload POST url
    pub url: String,
    /// Id of the form wrapping the file control
    pub form_id: String,
    /// Id of the element showing the progress bar
    pub progressbar_id: String,
    /// Prefix of the element id holding each uploading file
    pub upload_prefix: String,
    /// Maximum file size in bytes, 0 for none. Not enforced by the queue.
    pub limit: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            url: String::new(),
            form_id: "uploader_form".to_string(),
            progressbar_id: "progress".to_string(),
            upload_prefix: "upload_".to_string(),
            limit: 0,
        }
    }
}

/// Immutable configuration of an upload session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionConfig {
    endpoint_url: String,
    form_id: String,
    progressbar_id: String,
    upload_prefix: String,
    size_limit: u64,
}

impl SessionConfig {
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn progressbar_id(&self) -> &str {
        &self.progressbar_id
    }

    pub fn upload_prefix(&self) -> &str {
        &self.upload_prefix
    }

    pub fn size_limit(&self) -> Option<u64> {
        (self.size_limit > 0).then_some(self.size_limit)
    }

    /// Element id for the given display index
    pub fn display_id(&self, display_index: u64) -> String {
        format!("{}{}", self.upload_prefix, display_index)
    }

    /// Check that the options describe a usable session
    pub fn validate(&self) -> Result<(), InitError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(InitError::MissingConfig("url"));
        }
        Ok(())
    }
}

impl From<SessionOptions> for SessionConfig {
    fn from(options: SessionOptions) -> Self {
        SessionConfig {
            endpoint_url: options.url,
            form_id: options.form_id,
            progressbar_id: options.progressbar_id,
            upload_prefix: options.upload_prefix,
            size_limit: options.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from(SessionOptions::default());
        assert_eq!(config.form_id(), "uploader_form");
        assert_eq!(config.progressbar_id(), "progress");
        assert_eq!(config.upload_prefix(), "upload_");
        assert_eq!(config.size_limit(), None);
        assert_eq!(config.display_id(4), "upload_4");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let config = SessionConfig::from(SessionOptions::default());
        assert_eq!(config.validate(), Err(InitError::MissingConfig("url")));

        let config = SessionConfig::from(SessionOptions {
            url: "   ".into(),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"url":"http://localhost/upload","limit":1024}"#).unwrap();
        let config = SessionConfig::from(options);
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint_url(), "http://localhost/upload");
        assert_eq!(config.size_limit(), Some(1024));
        assert_eq!(config.upload_prefix(), "upload_");
    }
}
