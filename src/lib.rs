//! Farm Assist — farmer-assistance flows over a hosted LLM.

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod llm;
pub mod server;
pub mod store;
pub mod timeline;
pub mod validate;
pub mod weather;
