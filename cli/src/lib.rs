//! MavensMate client library
//!
//! Command dispatch and remote orchestration for metadata projects.

pub mod cli;
pub mod client;
pub mod commands;
pub mod deploy;
pub mod editor;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod payload;
pub mod project;
pub mod sfdc;
pub mod storage;
pub mod utils;
