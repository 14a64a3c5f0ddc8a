//! Presentation layer
//!
//! The CLI surface; out of scope for the core per spec section 1, listed
//! here only for completeness of the collaborator interface.

pub mod cli;
