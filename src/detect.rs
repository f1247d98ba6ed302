//! Platform detection for `--platform auto`.
//!
//! Priority, first positive signal wins:
//! 1. content sniffing reveals a tar archive, plain or gzip (packaged WASM bundle)
//! 2. the real path carries a WASM extension
//! 3. a sibling with the same stem and a WASM extension exists
//!
//! Anything else runs natively. The shebang line is logged but never decides.
use crate::platform::ExecPlatform;
use crate::wasm::archive;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Extensions produced by WASM toolchains next to the module.
pub const WASM_EXTENSIONS: [&str; 3] = ["html", "js", "wasm"];

const SNIFF_LEN: usize = 512;
const SHEBANG_MAX_LEN: u64 = 1024;

/// File kinds recognized by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Tar,
    Gzip,
    Elf,
    MachO,
    Wasm,
}

impl Kind {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Tar => "application/x-tar",
            Self::Gzip => "application/gzip",
            Self::Elf => "application/x-executable",
            Self::MachO => "application/x-mach-binary",
            Self::Wasm => "application/wasm",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Gzip => "gz",
            Self::Elf => "elf",
            Self::MachO => "macho",
            Self::Wasm => "wasm",
        }
    }
}

/// Identify a file from its leading bytes. Unreadable files yield `None`.
pub fn sniff(path: &Path) -> Option<Kind> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .ok()?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .ok()?;
    sniff_bytes(&head)
}

pub fn sniff_bytes(head: &[u8]) -> Option<Kind> {
    if head.len() >= 262 && &head[257..262] == b"ustar" {
        return Some(Kind::Tar);
    }
    if head.starts_with(&[0x1f, 0x8b]) {
        return Some(Kind::Gzip);
    }
    if head.starts_with(b"\x7fELF") {
        return Some(Kind::Elf);
    }
    if head.starts_with(b"\0asm") {
        return Some(Kind::Wasm);
    }
    let macho: [[u8; 4]; 4] = [
        [0xfe, 0xed, 0xfa, 0xce],
        [0xfe, 0xed, 0xfa, 0xcf],
        [0xce, 0xfa, 0xed, 0xfe],
        [0xcf, 0xfa, 0xed, 0xfe],
    ];
    if macho.iter().any(|magic| head.starts_with(magic)) {
        return Some(Kind::MachO);
    }
    None
}

/// First line of the file when it starts with `#!`.
///
/// Decoded as UTF-8, falling back to Latin-1 so every byte survives.
pub fn read_shebang(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut line = Vec::new();
    BufReader::new(file.take(SHEBANG_MAX_LEN))
        .read_until(b'\n', &mut line)
        .ok()?;
    let text = match String::from_utf8(line) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&byte| char::from(byte)).collect(),
    };
    let text = text.trim();
    text.starts_with("#!").then(|| text.to_string())
}

pub fn has_wasm_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WASM_EXTENSIONS.contains(&ext))
}

/// First sibling sharing the stem of `path` with a WASM extension.
pub fn wasm_sibling(path: &Path) -> Option<PathBuf> {
    WASM_EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.exists())
}

/// Classify `file` for auto mode. Never fails; no signal means native.
pub fn detect_platform(file: &Path) -> ExecPlatform {
    let platform = classify(file);
    tracing::info!("  Detected: {platform}");
    platform
}

fn classify(file: &Path) -> ExecPlatform {
    let real = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    if real != file {
        tracing::info!("  Real: {}", real.display());
    }

    let kind = sniff(&real);
    if let Some(kind) = kind {
        tracing::info!("  Type: {} ({})", kind.mime(), kind.extension());
    }
    if let Some(shebang) = read_shebang(&real) {
        tracing::info!("  Shebang: {shebang}");
    }

    if kind == Some(Kind::Tar) || (kind == Some(Kind::Gzip) && archive::is_tar(&real)) {
        tracing::info!("  Revealed: tar with WASM content");
        return ExecPlatform::Wasm;
    }
    if has_wasm_extension(&real) {
        tracing::info!("  Found WASM extension in realpath");
        return ExecPlatform::Wasm;
    }
    if let Some(sibling) = wasm_sibling(&real) {
        tracing::info!(
            "  Found WASM extension in realpath+ext: {}",
            sibling.display()
        );
        return ExecPlatform::Wasm;
    }
    ExecPlatform::Exec
}
