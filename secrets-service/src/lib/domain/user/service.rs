use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::models::AuthorizationRequest;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::IdentityProvider;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, IP>
where
    UR: UserRepository,
    IP: IdentityProvider,
{
    repository: Arc<UR>,
    identity_provider: Arc<IP>,
    authenticator: Arc<Authenticator>,
}

impl<UR, IP> UserService<UR, IP>
where
    UR: UserRepository,
    IP: IdentityProvider,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `identity_provider` - Federated sign-in implementation
    /// * `authenticator` - Password codec for local accounts
    pub fn new(
        repository: Arc<UR>,
        identity_provider: Arc<IP>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            repository,
            identity_provider,
            authenticator,
        }
    }

    async fn authenticate_local(&self, username: &str, password: &str) -> Result<User, UserError> {
        // Malformed usernames cannot exist in the store.
        let username =
            Username::new(username.to_string()).map_err(|_| UserError::InvalidCredentials)?;

        let user = self
            .repository
            .find_by_username(&username)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let stored = match (&user.provider, &user.password) {
            (Provider::Local, Some(stored)) => stored,
            _ => return Err(UserError::InvalidCredentials),
        };

        match self.authenticator.authenticate(password, stored) {
            Ok(()) => Ok(user),
            Err(AuthenticationError::InvalidCredentials) => Err(UserError::InvalidCredentials),
            Err(AuthenticationError::PasswordError(e)) => Err(UserError::Password(e)),
        }
    }

    async fn authenticate_google(&self, code: &str, pkce_verifier: &str) -> Result<User, UserError> {
        let profile = self
            .identity_provider
            .exchange_code(code, pkce_verifier)
            .await?;

        self.find_or_create_federated(profile).await
    }

    /// Look up the record keyed by the provider subject, creating it on first
    /// sign-in.
    ///
    /// A concurrent first sign-in can win the insert; the unique constraint
    /// rejects ours and the winner's record is returned instead.
    async fn find_or_create_federated(&self, profile: ProviderProfile) -> Result<User, UserError> {
        let username = Username::new(profile.subject)?;

        if let Some(user) = self.repository.find_by_username(&username).await? {
            return federated_only(user);
        }

        let email = profile.email.and_then(|email| {
            EmailAddress::new(email)
                .inspect_err(|e| {
                    tracing::warn!(username = %username, error = %e, "Ignoring provider email")
                })
                .ok()
        });

        let user = User {
            id: UserId::new(),
            username: username.clone(),
            password: None,
            provider: Provider::Google,
            email,
            secret: None,
            created_at: Utc::now(),
        };

        match self.repository.create(user).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, "Created federated user");
                Ok(created)
            }
            Err(UserError::UsernameAlreadyExists(_)) => {
                tracing::debug!(username = %username, "Lost federated sign-up race, re-reading");
                let winner = self
                    .repository
                    .find_by_username(&username)
                    .await?
                    .ok_or(UserError::NotFound(username.to_string()))?;
                federated_only(winner)
            }
            Err(e) => Err(e),
        }
    }
}

/// Local accounts never sign in through a provider, even on a subject match.
fn federated_only(user: User) -> Result<User, UserError> {
    match user.provider {
        Provider::Google => Ok(user),
        Provider::Local => Err(UserError::UsernameAlreadyExists(
            user.username.to_string(),
        )),
    }
}

#[async_trait]
impl<UR, IP> UserServicePort for UserService<UR, IP>
where
    UR: UserRepository,
    IP: IdentityProvider,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, UserError> {
        let password = self.authenticator.encode_password(&command.password)?;

        let user = User {
            id: UserId::new(),
            username: command.username,
            password: Some(password),
            provider: Provider::Local,
            email: Some(command.email),
            secret: None,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            scheme = %self.authenticator.scheme(),
            "Registered local user"
        );

        Ok(created_user)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<User, UserError> {
        tracing::debug!(provider = %credentials.provider(), "Authenticating");

        match credentials {
            Credentials::Local { username, password } => {
                self.authenticate_local(&username, &password).await
            }
            Credentials::Google {
                code,
                pkce_verifier,
            } => self.authenticate_google(&code, &pkce_verifier).await,
        }
    }

    fn begin_federated_login(&self) -> Result<AuthorizationRequest, UserError> {
        Ok(self.identity_provider.authorization_request()?)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }
}
