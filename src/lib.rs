//! Deployment readiness gate.
//!
//! A fixed battery of environment checks (tooling, auth, versions, cloud
//! resources, local files) is run in order and folded into a [`Report`]
//! whose `can_deploy` verdict drives the process exit code.
//!
//! [`Report`]: types::Report

pub mod check;
pub mod cli;
pub mod config;
pub mod exec;
pub mod probes;
pub mod progress;
pub mod registry;
pub mod report;
pub mod types;
