//! Native library loader configuration.
//!
//! [`LoaderConfig`] lists the library names tried, in order, when the
//! MagickWand library is resolved, and whether the process's own symbol table
//! is used as a last resort (for statically linked or preloaded builds).

use std::ffi::OsString;

/// Environment variable holding extra library names or paths, tried first.
///
/// Uses the platform path-list syntax (`:` on Unix, `;` on Windows).
pub const LIBRARY_ENV: &str = "ZENMAGICK_LIBRARY";

/// Default candidates, covering the common ImageMagick 7 and 6 builds.
///
/// Bare names are decorated with the platform prefix and suffix
/// (`libMagickWand-7.Q16HDRI.so`, `MagickWand-7.Q16HDRI.dll`, ...).
/// Paths and versioned sonames are passed to the loader unchanged.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "MagickWand-7.Q16HDRI",
    "MagickWand-7.Q16",
    "MagickWand-7",
    "MagickWand",
    "libMagickWand-7.Q16HDRI.so.10",
    "libMagickWand-7.Q16.so.10",
    "libMagickWand-6.Q16.so.7",
    "libMagickWand-6.Q16.so.6",
];

/// Library resolution settings.
///
/// # Example
///
/// ```
/// use zenmagick::LoaderConfig;
///
/// let config = LoaderConfig::default()
///     .with_library("/opt/im7/lib/libMagickWand-7.Q16HDRI.so")
///     .with_process_fallback(false);
/// assert_eq!(config.candidates()[0], "/opt/im7/lib/libMagickWand-7.Q16HDRI.so");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    candidates: Vec<String>,
    process_fallback: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            process_fallback: true,
        }
    }
}

impl LoaderConfig {
    /// Default candidates, with any entries from [`LIBRARY_ENV`] tried first.
    pub fn from_env() -> Self {
        Self::default().with_env_value(std::env::var_os(LIBRARY_ENV))
    }

    fn with_env_value(mut self, value: Option<OsString>) -> Self {
        if let Some(value) = value {
            let extra: Vec<String> = std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            self.candidates.splice(0..0, extra);
        }
        self
    }

    /// Try `name` before every other candidate.
    pub fn with_library(mut self, name: impl Into<String>) -> Self {
        self.candidates.insert(0, name.into());
        self
    }

    /// Replace the candidate list entirely.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable binding against the process symbol table when no
    /// candidate library loads.
    pub fn with_process_fallback(mut self, enabled: bool) -> Self {
        self.process_fallback = enabled;
        self
    }

    /// Candidates in resolution order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Whether the process symbol table is the last resort.
    pub fn process_fallback(&self) -> bool {
        self.process_fallback
    }

    /// File name handed to the dynamic loader for a candidate.
    pub(crate) fn loader_name(candidate: &str) -> OsString {
        if is_file_name(candidate) {
            OsString::from(candidate)
        } else {
            libloading::library_filename(candidate)
        }
    }
}

fn is_file_name(candidate: &str) -> bool {
    candidate.contains(['/', '\\'])
        || candidate.contains(".so.")
        || candidate.ends_with(".so")
        || candidate.ends_with(".dylib")
        || candidate.ends_with(".dll")
}
