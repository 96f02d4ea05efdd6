//! Basic image decodability checking via content sniffing.

use mosaic_core::{Error, Result};

/// Check that `data` sniffs as an image before it is spent on a remote
/// embedding call.
///
/// This is deliberately shallow — magic bytes only, no decode — matching
/// the pipeline's contract of "basic decodability" validation. Fails with
/// [`Error::MalformedInput`] naming the offending identifier.
pub fn ensure_image(id: &str, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::MalformedInput(format!("{}: empty file", id)));
    }
    match infer::get(data) {
        Some(kind) if kind.mime_type().starts_with("image/") => Ok(()),
        Some(kind) => Err(Error::MalformedInput(format!(
            "{}: not an image (detected {})",
            id,
            kind.mime_type()
        ))),
        None => Err(Error::MalformedInput(format!(
            "{}: unrecognized content",
            id
        ))),
    }
}
