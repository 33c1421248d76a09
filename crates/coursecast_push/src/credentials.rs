//! Credential selection per partner.
//!
//! The table is built once from configuration at startup and read-only
//! afterwards; every push looks its partner up here before any recipient is
//! resolved.

use crate::error::PushError;
use coursecast_common::CredentialContext;
use coursecast_config::AppConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Maps partner tags to their delivery credentials
#[derive(Debug, Clone, Default)]
pub struct CredentialSelector {
    contexts: HashMap<String, Arc<CredentialContext>>,
}

impl CredentialSelector {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::from_contexts(
            config
                .partners
                .iter()
                .map(|(partner, firebase)| CredentialContext::from_config(partner, firebase)),
        )
    }

    pub fn from_contexts(contexts: impl IntoIterator<Item = CredentialContext>) -> Self {
        let contexts = contexts
            .into_iter()
            .map(|ctx| {
                if ctx.service_account_json.is_none() && ctx.key_path.is_none() {
                    warn!(
                        "Partner {} has no service account configured; sends will fail",
                        ctx.partner
                    );
                }
                (ctx.partner.clone(), Arc::new(ctx))
            })
            .collect();
        Self { contexts }
    }

    /// Configured partner tags, sorted
    pub fn partners(&self) -> Vec<&str> {
        let mut partners: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        partners.sort_unstable();
        partners
    }

    /// Look up the credentials of `partner`.
    ///
    /// An unknown partner is a server-side misconfiguration and is logged as
    /// such.
    pub fn resolve(&self, partner: &str) -> Result<Arc<CredentialContext>, PushError> {
        match self.contexts.get(partner) {
            Some(ctx) => Ok(Arc::clone(ctx)),
            None => {
                let known = self.partners().join(", ");
                error!(
                    "No delivery credentials configured for partner '{}' (configured: {})",
                    partner, known
                );
                Err(PushError::InvalidPartner {
                    partner: partner.to_string(),
                    known,
                })
            }
        }
    }
}
