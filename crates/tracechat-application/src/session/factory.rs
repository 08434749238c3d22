use std::sync::Arc;

use tracechat_core::config::ClientConfig;
use tracechat_core::error::Result;
use tracechat_infrastructure::HttpChatBackend;

use super::controller::ChatController;

/// Builds controllers wired to the HTTP backend.
pub struct ControllerFactory {
    config: ClientConfig,
}

impl ControllerFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates the shared backend and a controller that uses it.
    ///
    /// The backend is returned as well so callers can run trace and log
    /// queries over the same HTTP client.
    pub fn http(&self) -> Result<(ChatController<HttpChatBackend>, Arc<HttpChatBackend>)> {
        let backend = Arc::new(HttpChatBackend::new(self.config.clone())?);
        let controller = ChatController::new(Arc::clone(&backend), &self.config);
        Ok((controller, backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TurnPhase;

    #[test]
    fn test_http_controller_uses_config() {
        let config = ClientConfig {
            api_base: "http://analysis.local:9000".to_string(),
            ..ClientConfig::default()
        };
        let (controller, backend) = ControllerFactory::new(config).http().unwrap();

        assert_eq!(controller.phase(), TurnPhase::Idle);
        assert_eq!(
            controller.state().links.download_endpoint(),
            "http://analysis.local:9000/download/"
        );
        assert_eq!(backend.config().api_base, "http://analysis.local:9000");
    }
}
