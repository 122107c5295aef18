//! Shared data models for the SentinelX backend.
//!
//! This crate provides Serde-serializable types for:
//! - Smoke alerts and their identifiers
//! - Live detector status snapshots

pub mod alert;
pub mod status;

// Re-export common types
pub use alert::{Alert, AlertId, AlertKind, AlertSeverity};
pub use status::{DetectorPhase, DetectorStatus, RiskLevel};
