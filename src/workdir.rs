//! Staging of an FS-UAE working directory.
//!
//! Layout below the work directory:
//!
//! ```text
//! <work_dir>/cfg.fs-uae          emulator configuration
//! <work_dir>/root/               Amiga root volume
//! <work_dir>/root/Devs/MountList
//! <work_dir>/root/S/Startup-Sequence
//! <work_dir>/root/S/Shell-Startup
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Span;

#[derive(Debug, Error)]
pub enum WorkDirError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct WorkDir {
    span: Span,
    fs_root: PathBuf,
    cfg_file: PathBuf,
}

impl WorkDir {
    /// Use `work_dir`, creating its `root` volume directory if needed.
    pub fn new(work_dir: &Path, span: Span) -> Result<Self, WorkDirError> {
        let fs_root = work_dir.join("root");
        if fs_root.is_dir() {
            tracing::info!(parent: &span, "found root dir: {}", fs_root.display());
        } else {
            tracing::info!(parent: &span, "creating root dir: {}", fs_root.display());
            create_dir(&fs_root)?;
        }
        Ok(Self {
            span,
            cfg_file: work_dir.join("cfg.fs-uae"),
            fs_root,
        })
    }

    pub fn fs_root(&self) -> &Path {
        &self.fs_root
    }

    /// Create subdirectories of the root volume.
    pub fn create_dirs<S: AsRef<str>>(&self, dirs: &[S]) -> Result<(), WorkDirError> {
        for dir in dirs {
            let path = self.fs_root.join(dir.as_ref());
            if path.is_dir() {
                tracing::info!(parent: &self.span, "found sub dir: {}", dir.as_ref());
            } else {
                tracing::info!(parent: &self.span, "create sub dir: {}", dir.as_ref());
                create_dir(&path)?;
            }
        }
        Ok(())
    }

    /// Copy `files` (relative paths) from `src_dir` into the root volume.
    ///
    /// Existing files are kept unless `force` is set.
    pub fn copy_files<S: AsRef<str>>(
        &self,
        src_dir: &Path,
        files: &[S],
        force: bool,
    ) -> Result<(), WorkDirError> {
        for file in files {
            let from = src_dir.join(file.as_ref());
            let to = self.fs_root.join(file.as_ref());
            if let Some(parent) = to.parent() {
                if !parent.is_dir() {
                    tracing::info!(parent: &self.span, "create sub dir: {}", parent.display());
                    create_dir(parent)?;
                }
            }
            if to.is_file() && !force {
                continue;
            }
            fs::copy(&from, &to).map_err(|source| WorkDirError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            tracing::info!(parent: &self.span, "copy: {} -> {}", from.display(), to.display());
        }
        Ok(())
    }

    pub fn create_mountlist<S: AsRef<str>>(&self, lines: &[S]) -> Result<PathBuf, WorkDirError> {
        tracing::info!(parent: &self.span, "creating mountlist");
        let path = self.fs_root.join("Devs").join("MountList");
        write_lines(&path, None, lines)?;
        Ok(path)
    }

    pub fn create_startup_sequence<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<PathBuf, WorkDirError> {
        tracing::info!(parent: &self.span, "creating startup-sequence");
        let path = self.fs_root.join("S").join("Startup-Sequence");
        write_lines(&path, None, lines)?;
        Ok(path)
    }

    pub fn create_shell_startup<S: AsRef<str>>(&self, lines: &[S]) -> Result<PathBuf, WorkDirError> {
        tracing::info!(parent: &self.span, "creating shell-startup");
        let path = self.fs_root.join("S").join("Shell-Startup");
        write_lines(&path, None, lines)?;
        Ok(path)
    }

    /// Write the emulator configuration (`[config]` section) and return its
    /// path.
    pub fn create_fsuae_config<S: AsRef<str>>(&self, lines: &[S]) -> Result<PathBuf, WorkDirError> {
        tracing::info!(parent: &self.span, "creating fsuae config");
        write_lines(&self.cfg_file, Some("[config]"), lines)?;
        Ok(self.cfg_file.clone())
    }
}

fn create_dir(path: &Path) -> Result<(), WorkDirError> {
    fs::create_dir_all(path).map_err(|source| WorkDirError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_lines<S: AsRef<str>>(
    path: &Path,
    header: Option<&str>,
    lines: &[S],
) -> Result<(), WorkDirError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    let mut content = String::new();
    for line in header.into_iter().chain(lines.iter().map(|l| l.as_ref())) {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content).map_err(|source| WorkDirError::Write {
        path: path.to_path_buf(),
        source,
    })
}
