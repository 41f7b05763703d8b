//! HTTP route handlers

pub mod auth;
pub mod stats;
pub mod tasks;
