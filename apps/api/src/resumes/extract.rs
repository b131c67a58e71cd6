use bytes::Bytes;

use crate::errors::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Cheap sniff for the `%PDF-` header so a mislabelled upload fails fast
/// instead of deep inside the parser.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Pulls the text layer out of a PDF. Parsing is CPU-bound, so it runs on
/// the blocking pool.
pub async fn extract_text(pdf: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Validation(format!("Failed to extract text from PDF: {e}")))?;
    Ok(normalize_text(&text))
}

/// Trims trailing whitespace per line and collapses runs of blank lines.
fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
