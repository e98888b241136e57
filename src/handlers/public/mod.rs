// handlers/public/mod.rs - Public handlers (no authentication required)
pub mod articles;
pub mod auth;
pub mod system;
pub mod users;
