pub mod auth_service;
pub mod error;
pub mod resource;

pub use auth_service::{AuthService, LoginResponse};
pub use error::ServiceError;
pub use resource::{Resource, ResourceService};
