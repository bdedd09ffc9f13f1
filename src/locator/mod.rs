//! Discovery of the FS-UAE executable.
//!
//! Release and development builds are stored as `fs-uae_<version>_<os>_<arch>`
//! directories, optionally below a `dist/<os>` subdirectory. When several
//! builds match, the most recently modified one wins so a fresh local build
//! is preferred over an older release.

mod platform;

pub use platform::{Arch, Platform};

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::Span;

/// Fixed prefix of every build directory name.
const BUILD_PREFIX: &str = "fs-uae_";

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("Unable to detect {what} of this machine")]
    Detection { what: &'static str },

    #[error("Failed to scan '{path}': {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Standard install directory for the current platform.
pub fn default_binary_directory() -> Option<PathBuf> {
    Platform::current().and_then(|p| p.default_binary_directory())
}

/// Expected executable name for the current platform.
pub fn default_binary_name() -> Option<&'static str> {
    Platform::current().map(|p| p.default_binary_name())
}

struct BinaryCandidate {
    path: PathBuf,
    modified: SystemTime,
}

/// Finds FS-UAE builds below a base directory.
///
/// Platform and architecture default to the running machine. Explicit
/// values skip detection; an explicit architecture outside the known
/// vocabulary matches nothing.
pub struct Locator {
    span: Span,
    platform: Option<Platform>,
    arch: Option<ArchChoice>,
}

enum ArchChoice {
    Known(Arch),
    Unknown,
}

impl Locator {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            platform: None,
            arch: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_arch(mut self, arch: &str) -> Self {
        self.arch = Some(match Arch::parse(arch) {
            Some(arch) => ArchChoice::Known(arch),
            None => ArchChoice::Unknown,
        });
        self
    }

    fn platform(&self) -> Result<Platform, LocatorError> {
        match self.platform {
            Some(platform) => Ok(platform),
            None => Platform::current().ok_or(LocatorError::Detection { what: "platform" }),
        }
    }

    fn arch(&self) -> Result<Option<Arch>, LocatorError> {
        match &self.arch {
            Some(ArchChoice::Known(arch)) => Ok(Some(*arch)),
            Some(ArchChoice::Unknown) => Ok(None),
            None => Arch::current()
                .map(Some)
                .ok_or(LocatorError::Detection {
                    what: "CPU architecture",
                }),
        }
    }

    /// Find the build matching `version_hint` below `base_dir`.
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub fn find_binary_directory(
        &self,
        base_dir: &Path,
        version_hint: Option<&str>,
    ) -> Result<Option<PathBuf>, LocatorError> {
        let platform = self.platform()?;
        let Some(arch) = self.arch()? else {
            tracing::debug!(parent: &self.span, "unrecognized architecture, no build can match");
            return Ok(None);
        };

        let dist_dir = base_dir.join("dist").join(platform.as_str());
        let search_dir = if dist_dir.is_dir() {
            dist_dir
        } else {
            base_dir.to_path_buf()
        };

        let prefix = format!("{}{}", BUILD_PREFIX, version_hint.unwrap_or(""));
        let suffix = format!("_{}_{}", platform.as_str(), arch.as_str());
        tracing::debug!(
            parent: &self.span,
            dir = %search_dir.display(),
            pattern = %format!("{}*{}", prefix, suffix),
            "searching builds"
        );

        let mut candidates = collect_candidates(&search_dir, &prefix, &suffix)?;
        tracing::debug!(parent: &self.span, matches = candidates.len(), "search finished");

        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop().map(|c| c.path)),
            _ => {
                candidates.sort_by(|a, b| a.path.cmp(&b.path));
                candidates.sort_by_key(|c| c.modified);
                Ok(candidates.pop().map(|c| c.path))
            }
        }
    }
}

fn collect_candidates(
    dir: &Path,
    prefix: &str,
    suffix: &str,
) -> Result<Vec<BinaryCandidate>, LocatorError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LocatorError::Scan {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LocatorError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !matches_build_name(name, prefix, suffix) {
            continue;
        }
        let path = entry.path();
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|source| LocatorError::Scan {
                path: path.clone(),
                source,
            })?;
        candidates.push(BinaryCandidate { path, modified });
    }
    Ok(candidates)
}

/// Equivalent of the glob `<prefix>*<suffix>` for a single path component.
fn matches_build_name(name: &str, prefix: &str, suffix: &str) -> bool {
    !name.starts_with('.')
        && name.len() >= prefix.len() + suffix.len()
        && name.starts_with(prefix)
        && name.ends_with(suffix)
}

#[cfg(test)]
mod tests {
    use super::matches_build_name;

    #[test]
    fn wildcard_may_be_empty() {
        assert!(matches_build_name("fs-uae__linux_x86", "fs-uae_", "_linux_x86"));
    }

    #[test]
    fn prefix_and_suffix_may_not_overlap() {
        assert!(!matches_build_name("fs-uae_x86", "fs-uae_", "_x86"));
    }

    #[test]
    fn version_hint_is_a_prefix() {
        assert!(matches_build_name(
            "fs-uae_2.1.3_linux_x86-64",
            "fs-uae_2.1",
            "_linux_x86-64"
        ));
        assert!(!matches_build_name(
            "fs-uae_2.0.9_linux_x86-64",
            "fs-uae_2.1",
            "_linux_x86-64"
        ));
    }

    #[test]
    fn other_arch_does_not_match() {
        assert!(!matches_build_name(
            "fs-uae_2.1.3_linux_x86",
            "fs-uae_",
            "_linux_x86-64"
        ));
    }
}
