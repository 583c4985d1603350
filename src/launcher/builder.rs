//! Launch configuration and builder.
//!
//! Provides a fluent API for describing how the browser is started.
//!
//! # Example
//!
//! ```no_run
//! use chrome_devtools::{ChromeOptions, LaunchConfig};
//!
//! # fn example() -> chrome_devtools::Result<()> {
//! let config = LaunchConfig::builder()
//!     .binary("/usr/bin/chromium")
//!     .options(ChromeOptions::headless())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use crate::error::{Error, Result};

use super::options::ChromeOptions;

// ============================================================================
// LaunchConfig
// ============================================================================

/// Validated configuration for launching the browser.
///
/// Built via [`LaunchConfig::builder()`].
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Path to the Chrome binary executable.
    pub(crate) binary: PathBuf,

    /// User-data directory override; defaults to `<output dir>/profile`.
    pub(crate) user_data_dir: Option<PathBuf>,

    /// Chrome launch options.
    pub(crate) options: ChromeOptions,
}

impl LaunchConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> LaunchConfigBuilder {
        LaunchConfigBuilder::new()
    }

    /// Returns the configured binary path.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }
}

// ============================================================================
// LaunchConfigBuilder
// ============================================================================

/// Builder for [`LaunchConfig`].
#[derive(Debug, Default, Clone)]
pub struct LaunchConfigBuilder {
    /// Path to Chrome binary.
    binary: Option<PathBuf>,
    /// User-data directory override.
    user_data_dir: Option<PathBuf>,
    /// Chrome launch options.
    options: ChromeOptions,
}

impl LaunchConfigBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path to the Chrome binary executable.
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Overrides the user-data directory.
    ///
    /// Without this, each session gets a fresh `profile/` inside its
    /// output directory.
    #[inline]
    #[must_use]
    pub fn user_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(path.into());
        self
    }

    /// Sets the Chrome launch options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ChromeOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the binary is not set or options are invalid
    /// - [`Error::ChromeNotFound`] if the binary path doesn't exist
    pub fn build(self) -> Result<LaunchConfig> {
        let binary = self.binary.ok_or_else(|| {
            Error::config(
                "Chrome binary path is required. Use .binary() to set it.\n\
                 Example: LaunchConfig::builder().binary(\"/usr/bin/chromium\")",
            )
        })?;

        if !binary.exists() {
            return Err(Error::chrome_not_found(&binary));
        }

        self.options.validate().map_err(Error::config)?;

        Ok(LaunchConfig {
            binary,
            user_data_dir: self.user_data_dir,
            options: self.options,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
