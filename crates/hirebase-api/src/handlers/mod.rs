pub mod auth;
pub mod health;
pub mod registration;
pub mod tenant;
