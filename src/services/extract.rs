//! Plain-text extraction for uploaded documents.
//!
//! PDFs go through `pdf-extract` first and fall back to page-by-page
//! extraction with `lopdf` when the first pass fails or yields nothing.
//! Both run on the blocking pool; a panic inside either extractor is
//! treated as an empty result.

use tracing::{debug, warn};

pub fn plain_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim().to_string()
}

pub async fn pdf_text(data: Vec<u8>) -> String {
    let primary_input = data.clone();
    let primary = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&primary_input)
    })
    .await;

    match primary {
        Ok(Ok(text)) if !text.trim().is_empty() => return text.trim().to_string(),
        Ok(Ok(_)) => debug!("pdf-extract produced no text, trying lopdf"),
        Ok(Err(e)) => debug!(error = %e, "pdf-extract failed, trying lopdf"),
        Err(e) => debug!(error = %e, "pdf-extract panicked, trying lopdf"),
    }

    match tokio::task::spawn_blocking(move || lopdf_text(&data)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to extract PDF text");
            String::new()
        }
        Err(e) => {
            warn!(error = %e, "lopdf extraction panicked");
            String::new()
        }
    }
}

fn lopdf_text(data: &[u8]) -> Result<String, lopdf::Error> {
    let document = lopdf::Document::load_mem(data)?;
    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .filter_map(|page| document.extract_text(&[*page]).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    Ok(pages.join("\n\n"))
}
