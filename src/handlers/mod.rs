// handlers/mod.rs - Handler tiers
//
// Public (no auth): service info, health, resource CRUD, login
// Protected (bearer token): current user
pub mod protected;
pub mod public;
pub mod utils;
