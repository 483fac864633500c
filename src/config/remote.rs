//! Remote capability endpoint configuration.

use secrecy::Secret;
use serde::Deserialize;

use super::error::ValidationError;

/// Settings for the HTTP capability adapter.
///
/// Unset means the deployment wires capability adapters some other way
/// (in-process, scripted for tests).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the capability service.
    pub base_url: Option<String>,

    /// Bearer token for the capability service.
    pub api_key: Option<Secret<String>>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl RemoteSettings {
    /// Returns true when a remote endpoint is configured.
    pub fn is_configured(&self) -> bool {
        self.base_url.as_ref().is_some_and(|url| !url.is_empty())
    }

    /// Validate remote settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_configured() {
            let url = self.base_url.as_deref().unwrap_or_default();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::invalid_value(
                    "remote.base_url",
                    "must start with http:// or https://",
                ));
            }
            if self.api_key.is_none() {
                return Err(ValidationError::MissingRequired("remote.api_key"));
            }
        }
        Ok(())
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_remote_is_valid() {
        let settings = RemoteSettings::default();
        assert!(!settings.is_configured());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn configured_remote_requires_api_key() {
        let settings = RemoteSettings {
            base_url: Some("https://capabilities.example.com".to_string()),
            api_key: None,
            request_timeout_secs: 30,
        };
        assert_eq!(
            settings.validate(),
            Err(ValidationError::MissingRequired("remote.api_key"))
        );
    }

    #[test]
    fn base_url_must_be_http() {
        let settings = RemoteSettings {
            base_url: Some("ftp://capabilities.example.com".to_string()),
            api_key: Some(Secret::new("key".to_string())),
            request_timeout_secs: 30,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn valid_remote_configuration_passes() {
        let settings = RemoteSettings {
            base_url: Some("https://capabilities.example.com".to_string()),
            api_key: Some(Secret::new("key".to_string())),
            request_timeout_secs: 30,
        };
        assert!(settings.is_configured());
        assert!(settings.validate().is_ok());
    }
}
