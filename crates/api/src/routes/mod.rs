//! HTTP route handlers

pub mod predict;
pub mod status;
