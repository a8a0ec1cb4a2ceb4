use std::fmt::{self, Debug, Formatter};

/// The default endpoint of the Mistral platform.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Builder for [`MistralConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MistralConfigBuilder {
    api_key: String,
    agent_id: String,
    base_url: Option<String>,
}

impl MistralConfigBuilder {
    /// Creates a builder with the given API key and the identifier of the
    /// agent to talk to.
    #[inline]
    pub fn with_credentials<K, A>(api_key: K, agent_id: A) -> Self
    where
        K: Into<String>,
        A: Into<String>,
    {
        Self {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            base_url: None,
        }
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> MistralConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        MistralConfig {
            api_key: self.api_key,
            agent_id: self.agent_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Debug for MistralConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MistralConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("agent_id", &self.agent_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Mistral agents provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MistralConfig {
    pub(crate) api_key: String,
    pub(crate) agent_id: String,
    pub(crate) base_url: String,
}

impl MistralConfig {
    /// Returns the identifier of the agent this configuration is bound to.
    #[inline]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Returns the base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Debug for MistralConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MistralConfig")
            .field("api_key", &"<redacted>")
            .field("agent_id", &self.agent_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let config =
            MistralConfigBuilder::with_credentials("secret", "ag:1234").build();
        assert_eq!(config.agent_id(), "ag:1234");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);

        let config = MistralConfigBuilder::with_credentials("secret", "ag:1234")
            .with_base_url("http://localhost:8080/v1/")
            .build();
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let builder = MistralConfigBuilder::with_credentials("secret", "ag:1");
        assert!(!format!("{builder:?}").contains("secret"));
        let config = builder.build();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
