//! Argos - Signature-Driven File Carver
//!
//! A forensic recovery toolkit: a streaming, signature-driven file carver
//! with a pluggable format registry, plus an exFAT directory/cluster
//! walker for volumes that still carry their own metadata.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::entities::*;
pub use domain::repositories::*;
