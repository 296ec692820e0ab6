use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::error::DgError;
use crate::extraction::PageContent;

/// Read a spreadsheet manifest (packing list) into pages.
///
/// Each worksheet becomes one page and each non-empty row one line, with
/// cells joined by two spaces, which is what `pdftotext -layout` produces
/// for table rows.
pub fn extract_xlsx_pages(bytes: &[u8]) -> Result<Vec<PageContent>, DgError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| DgError::Extraction(format!("failed to open xlsx: {e}")))?;

    let mut pages = Vec::new();
    for (i, name) in workbook.sheet_names().into_iter().enumerate() {
        let sheet = workbook
            .worksheet_range(&name)
            .map_err(|e| DgError::Extraction(format!("sheet '{name}' unreadable: {e}")))?;

        let lines = sheet
            .rows()
            .map(|row| {
                row.iter()
                    .filter_map(cell_as_string)
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .filter(|line| !line.is_empty())
            .collect();

        pages.push(PageContent {
            page_number: i + 1,
            lines,
        });
    }

    tracing::debug!(sheets = pages.len(), "xlsx extraction done");
    Ok(pages)
}

fn cell_as_string(cell: &calamine::Data) -> Option<String> {
    match cell {
        calamine::Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        calamine::Data::Float(f) => Some(f.to_string()),
        calamine::Data::Int(i) => Some(i.to_string()),
        calamine::Data::Bool(b) => Some(b.to_string()),
        calamine::Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_string() {
        assert_eq!(
            cell_as_string(&calamine::Data::Float(1263.0)).as_deref(),
            Some("1263")
        );
        assert_eq!(
            cell_as_string(&calamine::Data::String("  Paint ".into())).as_deref(),
            Some("Paint")
        );
        assert_eq!(cell_as_string(&calamine::Data::String("   ".into())), None);
        assert_eq!(cell_as_string(&calamine::Data::Empty), None);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(matches!(
            extract_xlsx_pages(b"not a spreadsheet"),
            Err(DgError::Extraction(_))
        ));
    }
}
