pub mod admin;
pub mod auth;
pub mod auth_context;
pub mod catalog;
pub mod customer;
pub mod merchant;
pub mod order;
pub mod revenue;
