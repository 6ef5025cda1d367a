//! Plain Letter-size documents for development and tests.
//!
//! Real templates are supplied by the deployment. A blank template has the same page count and
//! geometry, so layouts can be checked end to end without them.

use crate::{PdfError, PdfResult};
use lopdf::{dictionary, Document, Object, Stream};

const LETTER_WIDTH: i64 = 612;
const LETTER_HEIGHT: i64 = 792;

/// Builds a `page_count`-page Letter document. Each page carries a small footer label drawn
/// with a font that is declared on the page tree root, so pages inherit their resources.
///
/// # Errors
///
/// Returns [`PdfError::Structure`] for a zero page count and [`PdfError::Write`] if
/// serialization fails.
pub fn blank_template(page_count: usize) -> PdfResult<Vec<u8>> {
    if page_count == 0 {
        return Err(PdfError::Structure(
            "a template needs at least one page".into(),
        ));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Font".to_vec()),
        "Subtype" => Object::Name(b"Type1".to_vec()),
        "BaseFont" => Object::Name(b"Helvetica".to_vec()),
    });

    let mut kids = Vec::with_capacity(page_count);
    for number in 1..=page_count {
        let label = format!("BT /F1 8 Tf 540 24 Td (Page {} of {}) Tj ET", number, page_count);
        let content_id = doc.add_object(Stream::new(dictionary! {}, label.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(page_count as i64),
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(LETTER_WIDTH),
                Object::Integer(LETTER_HEIGHT),
            ]),
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => Object::Reference(font_id),
                },
            },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(PdfError::Write)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_template_page_count() {
        let bytes = blank_template(4).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
    }

    #[test]
    fn test_blank_template_rejects_zero_pages() {
        assert!(matches!(blank_template(0), Err(PdfError::Structure(_))));
    }
}
