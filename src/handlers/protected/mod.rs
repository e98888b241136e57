// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Routes here sit behind `jwt_auth_middleware`, which puts `AuthUser` into
// the request extensions.
pub mod auth;
