//! Trailpost - Content moderation for the hiking club back office
//!
//! This library provides the moderation workflow (draft, review, published,
//! archived), the role rules that gate it, and the HTTP API the back office
//! uses to drive it against a remote content store.

pub mod api;
pub mod config;
pub mod hooks;
pub mod identity;
pub mod models;
pub mod moderation;
pub mod services;
pub mod store;
