#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;

const SEPARATOR: &str = "---";

/// Split a multi-document YAML stream on `---` separator lines.
///
/// A separator line may carry trailing whitespace and a `#` comment; anything else after the
/// dashes is rejected. Whitespace-only documents in front of a separator are dropped, while
/// the trailing document is always returned.
pub fn split_documents(text: &str) -> Result<Vec<String>, AppError> {
    let mut docs = Vec::new();
    if text.is_empty() {
        return Ok(docs);
    }

    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_end = offset + line.len();
        if is_separator_line(line)? {
            let segment = &text[start..offset];
            if !segment.trim().is_empty() {
                docs.push(segment.to_string());
            }
            start = line_end;
        }
        offset = line_end;
    }
    docs.push(text[start..].to_string());
    Ok(docs)
}

fn is_separator_line(line: &str) -> Result<bool, AppError> {
    let Some(rest) = line.strip_prefix(SEPARATOR) else {
        return Ok(false);
    };
    let trailing = rest.trim();
    if trailing.is_empty() || trailing.starts_with('#') {
        return Ok(true);
    }
    Err(AppError::new(
        ErrorCategory::MalformedSeparator,
        format!("invalid document separator: {}", line.trim()),
    )
    .with_code("KCL-YAML-001")
    .with_context("line", line.trim()))
}
