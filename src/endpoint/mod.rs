//! Destination endpoint selection
//!
//! This module provides:
//! - `RefreshStrategy`: when the configured endpoint is re-resolved
//! - `EndpointResolver`: the current destination and its refresh state
//! - `Resolve` / `DnsResolver`: the name-resolution seam

pub mod resolver;
pub mod strategy;

pub use resolver::{DnsResolver, EndpointResolver, EndpointState, Resolve, ResolutionError};
pub use strategy::{RefreshPoint, RefreshStrategy};
