use section_model::GlyphChar;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfBackend {
    PureRust,
    Pdfium,
}

impl PdfBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfBackend::PureRust => "pure-pdf",
            PdfBackend::Pdfium => "pdfium",
        }
    }
}

/// Failure to obtain glyphs from a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{backend} backend not enabled in this build")]
    BackendUnavailable { backend: &'static str },
    #[error("failed to bind pdfium: {message}")]
    Bind { message: String },
    #[error("failed to open PDF `{path}`: {message}")]
    Open { path: String, message: String },
    #[error("failed to read page {page}: {message}")]
    Page { page: u32, message: String },
}

/// Select the default backend based on enabled cargo features.
pub fn default_backend() -> PdfBackend {
    #[cfg(feature = "pdfium")] { return PdfBackend::Pdfium; }
    #[cfg(not(feature = "pdfium"))] { return PdfBackend::PureRust; }
}

/// Read every glyph of the PDF at `path`, in page order and within a page
/// in the order the provider reports them.
///
/// When pdfium cannot be bound and `pure-pdf` is compiled in, the pure reader
/// is used instead.
pub fn read_pdf_glyphs_with(path: &str, backend: PdfBackend) -> Result<Vec<GlyphChar>, PdfError> {
    match backend {
        PdfBackend::PureRust => {
            #[cfg(feature = "pure-pdf")]
            {
                return crate::reader_pdf_pure::read_pdf_glyphs_pure(path);
            }
            #[allow(unreachable_code)]
            {
                let _ = path;
                Err(PdfError::BackendUnavailable { backend: backend.as_str() })
            }
        }
        PdfBackend::Pdfium => {
            #[cfg(feature = "pdfium")]
            {
                let result = crate::reader_pdf_pdfium::read_pdf_glyphs_pdfium(path);
                // Bind failures are environmental, not a property of the document.
                #[cfg(feature = "pure-pdf")]
                {
                    if let Err(PdfError::Bind { message }) = &result {
                        tracing::debug!(path, error = %message, "pdfium unavailable, using pure-pdf reader");
                        return crate::reader_pdf_pure::read_pdf_glyphs_pure(path);
                    }
                }
                return result;
            }
            #[allow(unreachable_code)]
            {
                let _ = path;
                Err(PdfError::BackendUnavailable { backend: backend.as_str() })
            }
        }
    }
}

pub fn read_pdf_glyphs(path: &str) -> Result<Vec<GlyphChar>, PdfError> {
    read_pdf_glyphs_with(path, default_backend())
}
