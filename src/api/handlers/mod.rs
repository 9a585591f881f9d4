pub mod files;
pub mod health;
