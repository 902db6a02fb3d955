pub mod backends;
pub mod files;
pub mod health;
