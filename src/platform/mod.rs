//! Platform abstraction layer.
//!
//! Provides consistent interfaces for:
//! - Named endpoints that execute shell commands
//! - The inventory resolving endpoint names used by the catalogue
//! - Process-backed endpoints (network namespaces, container exec, local shell)

pub mod endpoint;
pub mod shell;
