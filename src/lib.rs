//! Avatar Generation Service
//!
//! This library provides the core functionality for the avatar-forge system,
//! which accepts uploaded face/body images, generates a 3D avatar mesh as a
//! binary glTF (GLB) asset in the background, and exposes job status to
//! polling clients.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
