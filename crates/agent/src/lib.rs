//! Locator relay agent.
//!
//! Authenticates against the Locator REST API and relays periodic device
//! GPS fixes to it while running as a background process.
//!
//! This crate provides:
//! - Locator API HTTP client for login and location submission
//! - Device location source abstraction with a gpsd implementation
//! - Tracker state machine that samples fixes and relays them fire-and-forget
//! - Consent (permission) gating for foreground and background tracking

pub mod client;
pub mod config;
pub mod location;
pub mod permissions;
pub mod session;
pub mod tracker;

pub use client::ApiClient;
pub use config::AgentConfig;
pub use location::{LocationSample, LocationSource};
pub use session::UserSession;
pub use tracker::{Tracker, TrackerHandle, TrackerState};
