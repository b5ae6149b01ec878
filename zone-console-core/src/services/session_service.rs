//! Sign-in with saved or freshly entered credentials

use std::sync::Arc;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Credential, CredentialOrder};

/// Result of a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutcome {
    pub identifier: String,
    /// Whether the credential is now saved for later sessions.
    ///
    /// `false` when the caller did not ask to remember it or the save failed;
    /// neither blocks the sign-in.
    pub credential_saved: bool,
}

/// Session service
pub struct SessionService {
    ctx: Arc<ServiceContext>,
}

impl SessionService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Validate freshly entered credentials and optionally remember them
    pub async fn sign_in(
        &self,
        identifier: &str,
        secret: &str,
        remember: bool,
    ) -> CoreResult<SignInOutcome> {
        let identifier = identifier.trim();
        if identifier.is_empty() || secret.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Email and API key are required".to_string(),
            ));
        }

        self.validate(identifier, secret).await?;
        self.ctx
            .set_active_identifier(Some(identifier.to_string()))
            .await;

        let credential_saved = remember
            && match self.ctx.credentials.save(identifier, secret).await {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("Signed in as {identifier} but could not save the credential: {e}");
                    false
                }
            };

        log::info!("Signed in as {identifier}");
        Ok(SignInOutcome {
            identifier: identifier.to_string(),
            credential_saved,
        })
    }

    /// Sign in with a saved credential.
    ///
    /// A credential the provider rejects is removed from the store.
    pub async fn sign_in_with_saved(&self, identifier: &str) -> CoreResult<SignInOutcome> {
        let credential = self
            .ctx
            .credentials
            .get(identifier)
            .await?
            .ok_or_else(|| {
                CoreError::ValidationError(format!("No saved credential for {identifier}"))
            })?;

        if let Err(e) = self.validate(&credential.identifier, &credential.secret).await {
            if e.is_auth() {
                log::warn!("Saved credential for {identifier} was rejected, removing it");
                if let Err(remove_err) = self.ctx.credentials.remove(identifier).await {
                    log::error!("Failed to remove rejected credential for {identifier}: {remove_err}");
                }
            }
            return Err(e);
        }

        self.ctx
            .set_active_identifier(Some(credential.identifier.clone()))
            .await;
        log::info!("Signed in as {identifier} with a saved credential");
        Ok(SignInOutcome {
            identifier: credential.identifier,
            credential_saved: true,
        })
    }

    /// Saved credentials for the sign-in form; never fails
    pub async fn saved_credentials(&self) -> Vec<Credential> {
        self.ctx
            .credentials
            .all_or_empty(CredentialOrder::Insertion)
            .await
    }

    /// Credential to preselect in the sign-in form
    pub async fn default_credential(&self) -> Option<Credential> {
        self.ctx
            .credentials
            .all_or_empty(CredentialOrder::MostRecentFirst)
            .await
            .into_iter()
            .next()
    }

    /// Forget one saved credential
    pub async fn forget(&self, identifier: &str) -> CoreResult<bool> {
        let removed = self.ctx.credentials.remove(identifier).await?;
        if removed && self.ctx.active_identifier().await.as_deref() == Some(identifier) {
            self.ctx.set_active_identifier(None).await;
        }
        Ok(removed)
    }

    /// End the session, optionally forgetting its credential
    pub async fn sign_out(&self, forget: bool) -> CoreResult<()> {
        let Some(identifier) = self.ctx.active_identifier().await else {
            return Ok(());
        };
        self.ctx.set_active_identifier(None).await;
        if forget {
            self.ctx.credentials.remove(&identifier).await?;
        }
        log::info!("Signed out {identifier}");
        Ok(())
    }

    /// A 401 during validation means the credential itself is wrong
    async fn validate(&self, identifier: &str, secret: &str) -> CoreResult<()> {
        match self
            .ctx
            .zone_api
            .validate_credentials(identifier, secret)
            .await
        {
            Ok(()) => Ok(()),
            Err(CoreError::Unauthenticated) => {
                Err(CoreError::InvalidCredentials(identifier.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
