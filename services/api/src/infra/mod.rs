pub mod catalog;
pub mod db;
pub mod orders;
pub mod password;
