//! Verifies relay assertions against Steam's OpenID endpoint.

use crate::{IdentityAssertion, IdentityError, VerifiedIdentity};

/// Replays assertions to Steam (`openid.mode=check_authentication`).
///
/// Holds a clone of the shared HTTP client, whose timeout bounds every
/// verification.
#[derive(Debug, Clone)]
pub struct RelayVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RelayVerifier {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Asks Steam about `assertion` and returns its verdict, valid or not.
    ///
    /// # Errors
    /// [`IdentityError::ProviderUnreachable`] on connection failure,
    /// timeout, or an unreadable body. A negative verdict is *not* an
    /// error here; see [`verify`](Self::verify).
    pub async fn check(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let params = assertion.verification_params();

        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "relay verification request failed");
                IdentityError::ProviderUnreachable(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to read relay verdict body");
            IdentityError::ProviderUnreachable(e)
        })?;

        let verdict = VerifiedIdentity::from_verdict(&body, assertion.claimed_id());
        tracing::debug!(%status, valid = verdict.valid, "relay verdict received");
        Ok(verdict)
    }

    /// Like [`check`](Self::check), but a negative verdict becomes
    /// [`IdentityError::AssertionRejected`].
    pub async fn verify(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let verdict = self.check(assertion).await?;
        if !verdict.valid {
            tracing::info!(
                claimed_id = %verdict.claimed_id,
                "relay assertion rejected"
            );
            return Err(IdentityError::AssertionRejected);
        }
        Ok(verdict)
    }
}
