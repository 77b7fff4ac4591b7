//! Version and build information.
//!
//! Values are captured by `build.rs` at compile time; any that could not be
//! determined are simply omitted.

use std::fmt;

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
    pub target: &'static str,
    pub rustc_version: Option<&'static str>,
    pub features: Vec<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "infra-validator {}", self.version)?;

        if let Some(commit) = self.commit {
            writeln!(f, "Commit: {}", commit)?;
        }

        if let Some(date) = self.build_date {
            writeln!(f, "Built: {}", date)?;
        }

        writeln!(f, "Target: {}", self.target)?;

        if !self.features.is_empty() {
            writeln!(f, "Features: {}", self.features.join(", "))?;
        }

        if let Some(rustc) = self.rustc_version {
            write!(f, "Rustc: {}", rustc)?;
        }

        Ok(())
    }
}

/// Get build information
pub fn get_build_info() -> BuildInfo {
    let mut features = Vec::new();
    if cfg!(feature = "junit") {
        features.push("junit");
    }

    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("INFRA_VALIDATOR_GIT_HASH"),
        build_date: option_env!("INFRA_VALIDATOR_BUILD_DATE"),
        target: option_env!("INFRA_VALIDATOR_TARGET").unwrap_or(std::env::consts::ARCH),
        rustc_version: option_env!("INFRA_VALIDATOR_RUSTC_VERSION"),
        features,
    }
}
