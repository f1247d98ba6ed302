//! Runfiles lookup for build outputs.
//!
//! Build systems expose a target's data files either as a manifest mapping
//! logical paths to real ones, or as a directory tree mirroring the logical
//! layout. The Finder only sees the [`RunfilesLookup`] capability.
use crate::env::LaunchEnv;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Repository name used when a logical path carries no repository prefix.
pub const MAIN_REPOSITORY: &str = "_main";

/// Maps a logical runfiles path to a concrete path, if known.
pub trait RunfilesLookup {
    fn rlocation(&self, logical: &str) -> Option<PathBuf>;

    /// Short label for diagnostics.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum Runfiles {
    Manifest {
        path: PathBuf,
        entries: BTreeMap<String, PathBuf>,
    },
    Directory(PathBuf),
    Unavailable,
}

impl Runfiles {
    /// Locate runfiles the way a launched binary would: explicit manifest,
    /// explicit directory, then the `<argv0>.runfiles*` conventions.
    pub fn discover(env: &LaunchEnv) -> Self {
        if let Some(path) = &env.runfiles_manifest_file {
            match Self::from_manifest(path) {
                Ok(runfiles) => return runfiles,
                Err(err) => tracing::debug!("  runfiles manifest unusable: {err:#}"),
            }
        }
        if let Some(dir) = env.runfiles_dir.as_ref().filter(|dir| dir.is_dir()) {
            return Self::Directory(dir.clone());
        }
        if let Some(argv0) = &env.argv0 {
            let manifest = append_to_path(argv0, ".runfiles_manifest");
            if manifest.is_file() {
                if let Ok(runfiles) = Self::from_manifest(&manifest) {
                    return runfiles;
                }
            }
            let dir = append_to_path(argv0, ".runfiles");
            if dir.is_dir() {
                return Self::Directory(dir);
            }
        }
        Self::Unavailable
    }

    pub fn from_manifest(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read runfiles manifest {}", path.display()))?;
        Ok(Self::Manifest {
            path: path.to_path_buf(),
            entries: parse_manifest(&text),
        })
    }

    fn lookup_key(&self, key: &str) -> Option<PathBuf> {
        match self {
            Self::Manifest { entries, .. } => entries.get(key).cloned(),
            Self::Directory(dir) => Some(dir.join(key)),
            Self::Unavailable => None,
        }
    }
}

impl RunfilesLookup for Runfiles {
    fn rlocation(&self, logical: &str) -> Option<PathBuf> {
        if logical.is_empty() {
            return None;
        }
        if Path::new(logical).is_absolute() {
            return Some(PathBuf::from(logical));
        }
        if let Some(found) = self.lookup_key(logical) {
            if !matches!(self, Self::Directory(_)) || found.exists() {
                return Some(found);
            }
        }
        let main_prefix = format!("{MAIN_REPOSITORY}/");
        if logical.starts_with(&main_prefix) {
            return None;
        }
        self.lookup_key(&format!("{main_prefix}{logical}"))
    }

    fn describe(&self) -> String {
        match self {
            Self::Manifest { path, .. } => format!("manifest {}", path.display()),
            Self::Directory(dir) => format!("directory {}", dir.display()),
            Self::Unavailable => "unavailable".to_string(),
        }
    }
}

/// Parse `<logical> <actual>` lines. A leading space marks the escaped form
/// where `\s`, `\n` and `\b` stand for space, newline and backslash.
pub fn parse_manifest(text: &str) -> BTreeMap<String, PathBuf> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = match line.strip_prefix(' ') {
            Some(escaped) => match escaped.split_once(' ') {
                Some((key, value)) => (unescape(key), unescape(value)),
                None => (unescape(escaped), String::new()),
            },
            None => match line.split_once(' ') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (line.to_string(), String::new()),
            },
        };
        // Empty targets mark directories created for the layout only.
        if !value.is_empty() {
            entries.insert(key, PathBuf::from(value));
        }
    }
    entries
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('b') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lines_map_logical_to_actual() {
        let entries = parse_manifest(
            "_main/app/demo /cache/out/app/demo\n_main/app/empty \n\n_main/app/demo.html /cache/out/app/demo.html\n",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get("_main/app/demo"),
            Some(&PathBuf::from("/cache/out/app/demo"))
        );
        assert!(!entries.contains_key("_main/app/empty"));
    }

    #[test]
    fn escaped_manifest_lines_are_decoded() {
        let entries = parse_manifest(" _main/my\\sdir/file /real/my\\sdir/back\\bslash\n");
        assert_eq!(
            entries.get("_main/my dir/file"),
            Some(&PathBuf::from("/real/my dir/back\\slash"))
        );
    }

    #[test]
    fn lookup_falls_back_to_main_repository() {
        let runfiles = Runfiles::Manifest {
            path: PathBuf::from("MANIFEST"),
            entries: parse_manifest("_main/app/bundle /cache/bundle.tar\n"),
        };
        assert_eq!(
            runfiles.rlocation("app/bundle"),
            Some(PathBuf::from("/cache/bundle.tar"))
        );
        assert_eq!(runfiles.rlocation("app/other"), None);
        assert_eq!(runfiles.rlocation(""), None);
        let absolute = std::env::temp_dir().join("elsewhere-tool");
        assert_eq!(runfiles.rlocation(&absolute.to_string_lossy()), Some(absolute.clone()));
    }

    #[test]
    fn repository_named_like_main_still_gets_the_fallback() {
        let runfiles = Runfiles::Manifest {
            path: PathBuf::from("MANIFEST"),
            entries: parse_manifest(
                "_main/_mainline/tool /cache/mainline-tool\n_main/direct /cache/direct\n",
            ),
        };
        assert_eq!(
            runfiles.rlocation("_mainline/tool"),
            Some(PathBuf::from("/cache/mainline-tool"))
        );
        assert_eq!(runfiles.rlocation("_main/direct"), Some(PathBuf::from("/cache/direct")));
        assert_eq!(runfiles.rlocation("_main/missing"), None);
    }

    #[test]
    fn directory_lookup_joins_existing_paths() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("_main/app")).expect("create layout");
        fs::write(temp.path().join("_main/app/tool"), b"").expect("write file");

        let runfiles = Runfiles::Directory(temp.path().to_path_buf());
        assert_eq!(
            runfiles.rlocation("app/tool"),
            Some(temp.path().join("_main/app/tool"))
        );
    }

    #[test]
    fn discover_prefers_manifest_then_directory() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let manifest = temp.path().join("MANIFEST");
        fs::write(&manifest, "_main/a /x/a\n").expect("write manifest");

        let env = LaunchEnv {
            runfiles_manifest_file: Some(manifest),
            runfiles_dir: Some(temp.path().to_path_buf()),
            ..LaunchEnv::default()
        };
        assert!(matches!(Runfiles::discover(&env), Runfiles::Manifest { .. }));

        let env = LaunchEnv {
            runfiles_dir: Some(temp.path().to_path_buf()),
            ..LaunchEnv::default()
        };
        assert!(matches!(Runfiles::discover(&env), Runfiles::Directory(_)));
    }

    #[test]
    fn discover_uses_argv0_conventions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let argv0 = temp.path().join("launcher");
        fs::create_dir_all(temp.path().join("launcher.runfiles")).expect("create runfiles dir");

        let env = LaunchEnv {
            argv0: Some(argv0),
            ..LaunchEnv::default()
        };
        assert!(matches!(Runfiles::discover(&env), Runfiles::Directory(_)));
        assert!(matches!(
            Runfiles::discover(&LaunchEnv::default()),
            Runfiles::Unavailable
        ));
    }
}
