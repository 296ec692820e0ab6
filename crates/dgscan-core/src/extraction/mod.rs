pub mod pdftotext;
pub mod xlsx;

use crate::error::DgError;

/// Text extracted from a single page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, DgError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Join pages into one text and record the byte offset where each page starts.
pub fn pages_to_text(pages: &[PageContent]) -> (String, Vec<usize>) {
    let mut text = String::new();
    let mut boundaries = Vec::with_capacity(pages.len());

    for page in pages {
        boundaries.push(text.len());
        for line in &page.lines {
            text.push_str(line);
            text.push('\n');
        }
    }

    // Trailing empty pages would start at the text end; drop repeats so
    // the boundaries stay strictly increasing.
    boundaries.dedup();
    (text, boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, lines: &[&str]) -> PageContent {
        PageContent {
            page_number: n,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_pages_to_text() {
        let (text, bounds) = pages_to_text(&[page(1, &["a", "bb"]), page(2, &["ccc"])]);
        assert_eq!(text, "a\nbb\nccc\n");
        assert_eq!(bounds, vec![0, 5]);
    }

    #[test]
    fn test_empty_pages_collapse() {
        let (text, bounds) = pages_to_text(&[page(1, &["a"]), page(2, &[]), page(3, &[])]);
        assert_eq!(text, "a\n");
        assert_eq!(bounds, vec![0, 2]);
    }

    #[test]
    fn test_no_pages() {
        let (text, bounds) = pages_to_text(&[]);
        assert!(text.is_empty());
        assert!(bounds.is_empty());
    }
}
