//! Metadata API models
//!
//! Types exchanged between the command layer and the remote metadata
//! platform. Field names follow the platform's camelCase JSON.

pub mod models;

pub use models::{
    AsyncResult, ComponentFailure, DeployOptions, DeployResult, PackageDescriptor, PackageMembers,
    RetrieveResult, TestFailure, TestLevel,
};
