//! API types for the host bridge.
//!
//! This module defines stable types returned to hosts and printed by the CLI,
//! isolating toolchain complexity from callers.

pub mod types;
