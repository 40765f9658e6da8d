//! Runtime modules for locating, probing and driving the toolchain.
//!
//! The runtime domain handles the mechanics underneath the server manager:
//! paths, toolchain versions, subprocesses and the lifecycle state machine.

pub mod lifecycle;
pub mod path;
pub mod toolchain;
pub mod version;
