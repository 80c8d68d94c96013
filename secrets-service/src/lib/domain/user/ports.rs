use async_trait::async_trait;

use crate::domain::user::models::AuthorizationRequest;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::FederationError;
use crate::user::errors::UserError;
use crate::user::models::Username;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a local account with an encoded password.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `Password` - Password encoding failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<User, UserError>;

    /// Resolve credentials to a principal using the strategy they carry.
    ///
    /// Local credentials are checked against the stored password. Google
    /// credentials are exchanged with the provider and the matching local
    /// record is found or created.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user, wrong password, or non-local account
    /// * `Federation` - Provider exchange failed
    /// * `Password` - Stored password could not be interpreted
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, credentials: Credentials) -> Result<User, UserError>;

    /// Start a federated sign-in.
    ///
    /// # Errors
    /// * `Federation` - Provider is not configured
    fn begin_federated_login(&self) -> Result<AuthorizationRequest, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
}

/// External identity provider speaking the authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Build the consent-screen URL together with fresh CSRF state and PKCE
    /// verifier.
    fn authorization_request(&self) -> Result<AuthorizationRequest, FederationError>;

    /// Exchange an authorization code for the signed-in user's profile.
    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderProfile, FederationError>;
}
