//! Process-wide TrueType font registration for chart text.

use once_cell::sync::OnceCell;
use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Family name every text style in the renderer refers to.
pub const FONT_FAMILY: &str = "sans-serif";

static REGISTERED: OnceCell<Option<PathBuf>> = OnceCell::new();

/// Registers the first readable font among `candidates`, once per process.
///
/// Returns whether text can be drawn. Later calls return the first outcome
/// whatever their candidates.
pub fn ensure_font(candidates: &[PathBuf]) -> bool {
    REGISTERED
        .get_or_init(|| {
            let found = candidates.iter().find(|path| try_register(path)).cloned();
            if found.is_none() {
                warn!(
                    tried = candidates.len(),
                    "No usable TrueType font found, charts will be drawn without text"
                );
            }
            found
        })
        .is_some()
}

fn try_register(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Font candidate not readable");
            return false;
        }
    };

    // plotters keeps a 'static reference for the rest of the process
    let data: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, data) {
        Ok(()) => {
            info!(path = %path.display(), "Registered chart font");
            true
        }
        Err(_) => {
            warn!(path = %path.display(), "File is not a usable TrueType font");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_candidate_is_skipped() {
        assert!(!try_register(Path::new("/nonexistent/font.ttf")));
    }

    #[test]
    fn test_invalid_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(!try_register(&path));
    }
}
