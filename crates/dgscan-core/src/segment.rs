use crate::error::DgError;
use crate::model::TextSegment;

/// Split extracted document text into line segments.
///
/// `page_boundaries` holds the byte offset at which each page starts. The
/// offsets must be strictly increasing, fall on UTF-8 character boundaries
/// and not exceed the text length. If the first boundary is not 0, the text
/// before it forms an implicit first page. Whitespace-only lines produce no
/// segment but still count towards `line_index`.
pub fn segment(raw_text: &str, page_boundaries: &[usize]) -> Result<Vec<TextSegment>, DgError> {
    validate_boundaries(raw_text, page_boundaries)?;

    let leading_page = usize::from(page_boundaries.first() != Some(&0));
    let mut segments = Vec::new();
    let mut current_page = 0;
    let mut line_index = 0;
    let mut offset = 0;

    for raw_line in raw_text.split_inclusive('\n') {
        let page = leading_page + page_boundaries.iter().take_while(|&&b| b <= offset).count();
        if page != current_page {
            current_page = page;
            line_index = 0;
        }

        let text = raw_line.trim_end_matches(['\n', '\r']);
        if !text.trim().is_empty() {
            segments.push(TextSegment {
                id: format!("seg_{}_{}", page, line_index),
                page,
                line_index,
                text: text.to_string(),
                char_offset: offset,
            });
        }

        line_index += 1;
        offset += raw_line.len();
    }

    Ok(segments)
}

fn validate_boundaries(raw_text: &str, page_boundaries: &[usize]) -> Result<(), DgError> {
    for pair in page_boundaries.windows(2) {
        if pair[1] <= pair[0] {
            return Err(DgError::MalformedInput(format!(
                "page boundaries must be strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }
    }

    for &b in page_boundaries {
        if b > raw_text.len() {
            return Err(DgError::MalformedInput(format!(
                "page boundary {} exceeds text length {}",
                b,
                raw_text.len()
            )));
        }
        if !raw_text.is_char_boundary(b) {
            return Err(DgError::MalformedInput(format!(
                "page boundary {} splits a UTF-8 character",
                b
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_lines() {
        let segs = segment("UN1263 Paint\n\nUN1090 Acetone\n", &[]).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].page, 1);
        assert_eq!(segs[0].line_index, 0);
        assert_eq!(segs[1].line_index, 2);
        assert_eq!(segs[1].char_offset, 14);
        assert_eq!(segs[1].text, "UN1090 Acetone");
    }

    #[test]
    fn test_page_assignment() {
        let text = "page one\nline two\npage two\n";
        let segs = segment(text, &[0, 18]).unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].page, 1);
        assert_eq!(segs[2].page, 2);
        assert_eq!(segs[2].line_index, 0);
        assert_eq!(segs[2].id, "seg_2_0");
    }

    #[test]
    fn test_implicit_first_page() {
        let segs = segment("cover\ncontent\n", &[6]).unwrap();
        assert_eq!(segs[0].page, 1);
        assert_eq!(segs[1].page, 2);
    }

    #[test]
    fn test_crlf_stripped() {
        let segs = segment("Acetone\r\nPaint\r\n", &[0]).unwrap();
        assert_eq!(segs[0].text, "Acetone");
        assert_eq!(segs[1].char_offset, 9);
    }

    #[test]
    fn test_non_monotonic_rejected() {
        assert!(matches!(
            segment("abc\ndef\n", &[0, 4, 4]),
            Err(DgError::MalformedInput(_))
        ));
        assert!(matches!(
            segment("abc\ndef\n", &[4, 0]),
            Err(DgError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_boundary_past_end_rejected() {
        assert!(matches!(
            segment("abc", &[0, 10]),
            Err(DgError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_boundary_at_end_allowed() {
        let segs = segment("abc", &[0, 3]).unwrap();
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(segment("", &[]).unwrap().is_empty());
    }
}
