//! Google OAuth 2.0 identity provider.
//!
//! Authorization-code flow with PKCE against Google's endpoints, requesting the
//! `profile` and `email` scopes. The CSRF state and PKCE verifier are handed
//! back to the caller, which keeps them in the session until the callback.
//! After the code exchange the userinfo endpoint yields the stable subject id
//! that keys the local record.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::AuthUrl;
use oauth2::AuthorizationCode;
use oauth2::ClientId;
use oauth2::ClientSecret;
use oauth2::CsrfToken;
use oauth2::EndpointNotSet;
use oauth2::EndpointSet;
use oauth2::PkceCodeChallenge;
use oauth2::PkceCodeVerifier;
use oauth2::RedirectUrl;
use oauth2::Scope;
use oauth2::TokenResponse;
use oauth2::TokenUrl;
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::domain::user::models::AuthorizationRequest;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::ports::IdentityProvider;
use crate::user::errors::FederationError;

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Profile returned by the userinfo endpoint.
///
/// v3 reports the subject as `sub`, v2 as `id`.
#[derive(Debug, Deserialize)]
struct GoogleProfile {
    #[serde(alias = "sub")]
    id: String,
    email: Option<String>,
}

impl From<GoogleProfile> for ProviderProfile {
    fn from(profile: GoogleProfile) -> Self {
        ProviderProfile {
            subject: profile.id,
            email: profile.email,
        }
    }
}

pub struct GoogleIdentityProvider {
    /// `None` when no client id is configured; the rest of the site still works.
    client: Option<ConfiguredClient>,
    http_client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    /// Build the provider from configuration.
    ///
    /// # Errors
    /// * `NotConfigured` - An endpoint URL is malformed or the HTTP client
    ///   could not be built
    pub fn new(config: &GoogleConfig) -> Result<Self, FederationError> {
        let client = if config.client_id.trim().is_empty() {
            tracing::warn!("Google client id not configured, federated sign-in disabled");
            None
        } else {
            Some(Self::create_client(config)?)
        };

        // Token endpoint responses must not be followed across redirects.
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FederationError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            http_client,
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    fn create_client(config: &GoogleConfig) -> Result<ConfiguredClient, FederationError> {
        let invalid = |e: oauth2::url::ParseError| FederationError::NotConfigured(e.to_string());

        Ok(BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone()).map_err(invalid)?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).map_err(invalid)?)
            .set_redirect_uri(RedirectUrl::new(config.callback_url.clone()).map_err(invalid)?))
    }

    fn client(&self) -> Result<&ConfiguredClient, FederationError> {
        self.client
            .as_ref()
            .ok_or_else(|| FederationError::NotConfigured("google.client_id is empty".to_string()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, FederationError> {
        self.http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FederationError::Profile(e.to_string()))?
            .json()
            .await
            .map_err(|e| FederationError::Profile(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorization_request(&self) -> Result<AuthorizationRequest, FederationError> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderProfile, FederationError> {
        let client = self.client()?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| FederationError::TokenExchange(e.to_string()))?;

        let profile = self.fetch_profile(token.access_token().secret()).await?;
        tracing::debug!(subject = %profile.id, "Fetched Google profile");

        Ok(profile.into())
    }
}
