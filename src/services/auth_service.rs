use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{PasswordHasher, TokenService};
use crate::models::{LoginForm, User, Validate};

use super::{ResourceService, ServiceError};

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

/// Credential checks and token issuing on top of the users collection.
#[derive(Clone)]
pub struct AuthService {
    users: ResourceService<User>,
    tokens: TokenService,
    passwords: PasswordHasher,
}

impl AuthService {
    pub fn new(users: ResourceService<User>, tokens: TokenService, passwords: PasswordHasher) -> Self {
        Self { users, tokens, passwords }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn login(&self, form: LoginForm) -> Result<LoginResponse, ServiceError> {
        form.validate().map_err(ServiceError::validation)?;

        let user = self
            .users
            .find_by("username", &form.username)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !self.passwords.verify(form.password, user.password_hash.clone()).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        let expires_in = self.tokens.lifetime_secs()?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse { token, expires_in })
    }

    /// Resolves the user named by a verified token, straight from the store.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = match self.users.fetch(user_id).await {
            Ok(user) => user,
            Err(ServiceError::NotFound(_)) => return Err(ServiceError::InactiveAccount),
            Err(e) => return Err(e),
        };
        if user.is_deleted {
            return Err(ServiceError::InactiveAccount);
        }
        Ok(user)
    }
}
