//! Program loading.
//!
//! An HPX program is a `.hpx` text file.  Lines keep their terminators so a
//! blank line still has the one-character indentation the block resolver
//! expects.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Required program file extension.
pub const EXTENSION: &str = "hpx";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: HPX programs must have the .hpx extension", .path.display())]
    WrongExtension { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read `path` and split it into program lines.
pub fn load_program(path: &Path) -> Result<Vec<String>, LoadError> {
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return Err(LoadError::WrongExtension {
            path: path.to_path_buf(),
        });
    }
    let src = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = split_lines(&src);
    debug!(path = %path.display(), lines = lines.len(), "loaded program");
    Ok(lines)
}

/// Split source text into lines, keeping each line's `\n` terminator.
pub fn split_lines(src: &str) -> Vec<String> {
    src.split_inclusive('\n').map(str::to_owned).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
