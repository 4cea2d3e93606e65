pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod merchant;
pub mod orders;
pub mod public;
pub mod views;
