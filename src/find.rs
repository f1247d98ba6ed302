//! Artifact resolution across build execution layouts.
//!
//! A target path handed over by a build orchestrator may be relative to the
//! current directory, to the directory the user invoked the build from, or
//! only reachable through runfiles. The first layout where the path exists
//! wins; later layouts are never consulted once a candidate exists.
use crate::runfiles::RunfilesLookup;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cwd,
    BuildDir,
    Runfiles,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cwd => "CWD",
            Self::BuildDir => "BUILD_DIR",
            Self::Runfiles => "RUNFILES",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label logged when no layout contains the requested path.
pub const NOT_FOUND_LABEL: &str = "NOT_FOUND";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Path as requested, before resolution.
    pub requested: PathBuf,
    /// Absolute path of the artifact on disk.
    pub path: PathBuf,
    /// Where the path was found. Diagnostic only.
    pub origin: Origin,
}

pub struct Finder {
    build_working_directory: Option<PathBuf>,
    runfiles: Box<dyn RunfilesLookup>,
}

impl Finder {
    pub fn new(
        build_working_directory: Option<PathBuf>,
        runfiles: Box<dyn RunfilesLookup>,
    ) -> Self {
        Self {
            build_working_directory,
            runfiles,
        }
    }

    /// Resolve `file` to a concrete path, or `None` when no layout has it.
    pub fn resolve(&self, file: &Path) -> Option<ResolvedFile> {
        let found = self.find(file);
        match &found {
            Some(resolved) => {
                tracing::debug!("  found: {} # {}", resolved.path.display(), resolved.origin)
            }
            None => tracing::debug!("  missing: {} # {NOT_FOUND_LABEL}", file.display()),
        }
        found
    }

    fn find(&self, file: &Path) -> Option<ResolvedFile> {
        tracing::trace!("  try {}: {}", Origin::Cwd, file.display());
        if file.exists() {
            return Some(ResolvedFile {
                requested: file.to_path_buf(),
                path: absolute(file),
                origin: Origin::Cwd,
            });
        }

        if let Some(build_dir) = &self.build_working_directory {
            let candidate = build_dir.join(file);
            tracing::trace!("  try {}: {}", Origin::BuildDir, candidate.display());
            if candidate.exists() {
                return Some(ResolvedFile {
                    requested: file.to_path_buf(),
                    path: absolute(&candidate),
                    origin: Origin::BuildDir,
                });
            }
        }

        let logical = file.to_string_lossy();
        let Some(rlocation) = self.runfiles.rlocation(&logical) else {
            tracing::trace!(
                "  try {} ({}): no entry for {logical}",
                Origin::Runfiles,
                self.runfiles.describe()
            );
            return None;
        };
        tracing::trace!(
            "  try {} ({}): {}",
            Origin::Runfiles,
            self.runfiles.describe(),
            rlocation.display()
        );
        rlocation.exists().then(|| ResolvedFile {
            requested: file.to_path_buf(),
            path: absolute(&rlocation),
            origin: Origin::Runfiles,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
