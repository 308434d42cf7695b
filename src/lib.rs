pub mod advisor;
pub mod chat;
pub mod cli;
pub mod config;
pub mod errors;
pub mod image;
pub mod log;
pub mod normalize;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod store;
pub mod ux;
pub mod wire;
