//! PDFium-backed glyph reader. Behind feature `pdfium`.

#![cfg(feature = "pdfium")]

use crate::reader_pdf::PdfError;
use pdfium_render::prelude::*;
use section_model::GlyphChar;
use std::path::PathBuf;

/// Library files to try, in order: `PDFIUM_DLL_PATH` (file or directory),
/// `PDFIUM_DIR`, then copies bundled under this crate's `bin/`.
fn library_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = std::env::var_os("PDFIUM_DLL_PATH").map(PathBuf::from) {
        candidates.push(if path.is_dir() { Pdfium::pdfium_platform_library_name_at_path(&path) } else { path });
    }
    if let Some(dir) = std::env::var_os("PDFIUM_DIR").map(PathBuf::from) {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(&dir));
    }
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("bin");
    for dir in [bundled.join("pdfium").join("lib"), bundled] {
        let lib = Pdfium::pdfium_platform_library_name_at_path(&dir);
        if lib.exists() {
            candidates.push(lib);
        }
    }
    candidates
}

/// First candidate library that binds, else the system library.
fn bind_pdfium() -> Result<Pdfium, String> {
    for lib in library_candidates() {
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(err) => tracing::debug!(library = %lib.display(), error = %err, "pdfium bind failed"),
        }
    }
    Pdfium::bind_to_system_library().map(Pdfium::new).map_err(|err| {
        tracing::warn!(error = %err, "pdfium library unavailable");
        err.to_string()
    })
}

thread_local! {
    // Bound on first use, then reused for the life of the thread.
    static PDFIUM: Result<Pdfium, String> = bind_pdfium();
}

pub fn read_pdf_glyphs_pdfium(path: &str) -> Result<Vec<GlyphChar>, PdfError> {
    PDFIUM.with(|bound| match bound {
        Ok(pdfium) => read_with(pdfium, path),
        Err(message) => Err(PdfError::Bind { message: message.clone() }),
    })
}

#[allow(deprecated)] // PdfRect field access is deprecated in later 0.8 releases
fn read_with(pdfium: &Pdfium, path: &str) -> Result<Vec<GlyphChar>, PdfError> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|err| PdfError::Open { path: path.to_string(), message: err.to_string() })?;

    let mut out = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_num = (idx as u32) + 1;
        let page_height = page.height().value as f64;
        let text = page
            .text()
            .map_err(|err| PdfError::Page { page: page_num, message: err.to_string() })?;

        for ch in text.chars().iter() {
            let (Some(unicode), Ok(rect)) = (ch.unicode_char(), ch.loose_bounds()) else {
                continue;
            };
            out.push(GlyphChar::new(
                unicode,
                page_height - rect.top.value as f64,
                ch.scaled_font_size().value as f64,
                ch.font_name(),
                page_num,
            ));
        }
    }
    tracing::debug!(path, glyphs = out.len(), "pdfium glyphs read");
    Ok(out)
}
