mod password;
mod token;

use thiserror::Error;

pub use password::PasswordHasher;
pub use token::{Claims, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
