pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod policy;
pub mod question;
pub mod roster;
pub mod scores;
pub mod server;
