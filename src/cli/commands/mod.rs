pub mod account;
pub mod comment;
pub mod config;
pub mod feed;
pub mod init;
pub mod interact;
pub mod points;
pub mod prompt;
pub mod status;
