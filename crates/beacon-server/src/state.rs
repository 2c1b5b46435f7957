//! Shared application state.

use std::sync::Arc;

use beacon_core::Relay;

use crate::auth::{IdentityVerifier, JwtVerifier};
use crate::config::Config;

/// State shared by every handler.
///
/// The chat and video namespaces each own a fully separate [`Relay`]; a
/// registration or room in one is invisible to the other. Only the verifier
/// and the configuration are common.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<Relay>,
    pub signal: Arc<Relay>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build production state from configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let verifier: Arc<dyn IdentityVerifier> =
            Arc::new(JwtVerifier::new(&config.auth.jwt_secret));
        Self {
            chat: Arc::new(Relay::new()),
            signal: Arc::new(Relay::new()),
            verifier,
            config: Arc::new(config),
        }
    }
}
