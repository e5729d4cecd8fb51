use std::panic::{self, AssertUnwindSafe};

use pdf_extract::{Document, PlainTextOutput};
use tracing::{debug, warn};

use super::{join_units, ExtractError};

/// Extracts text from a PDF page by page.
///
/// Only a document that cannot be loaded at all is `CorruptDocument`. Each page is decoded on
/// its own: a page that errors or panics the decoder is skipped along with pages that carry no
/// text layer, and the remaining pages are still returned in order.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractError::CorruptDocument(
            "missing %PDF header".to_string(),
        ));
    }

    let mut doc = panic::catch_unwind(AssertUnwindSafe(|| Document::load_mem(bytes)))
        .map_err(|_| ExtractError::CorruptDocument("PDF decoder panicked".to_string()))?
        .map_err(|e| ExtractError::CorruptDocument(format!("failed to open PDF: {e}")))?;

    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| ExtractError::CorruptDocument(format!("encrypted PDF: {e}")))?;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let page_count = page_numbers.len();

    let text = join_units(page_numbers.into_iter().map(|page_num| {
        match page_text(&doc, page_num) {
            Ok(page) if !page.is_empty() => Some(page),
            Ok(_) => {
                warn!("PDF page {page_num} has no extractable text, skipping");
                None
            }
            Err(reason) => {
                warn!("Skipping PDF page {page_num}: {reason}");
                None
            }
        }
    }));

    debug!("Extracted {} chars from {} PDF pages", text.len(), page_count);
    Ok(text)
}

fn page_text(doc: &Document, page_num: u32) -> Result<String, String> {
    let mut out = String::new();
    panic::catch_unwind(AssertUnwindSafe(|| {
        let mut output = PlainTextOutput::new(&mut out);
        pdf_extract::output_doc_page(doc, &mut output, page_num)
    }))
    .map_err(|_| "decoder panicked".to_string())?
    .map_err(|e| e.to_string())?;
    Ok(out.trim().to_string())
}
