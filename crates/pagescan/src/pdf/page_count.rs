use super::error::{PdfError, Result};
use crate::types::PageSize;
use lopdf::{Document, Object, ObjectId};

/// Page tree nesting deeper than this is treated as having no MediaBox.
const MAX_INHERITANCE_DEPTH: usize = 32;

fn load(pdf_bytes: &[u8]) -> Result<Document> {
    if pdf_bytes.is_empty() {
        return Err(PdfError::InvalidPdf("document is empty".to_string()));
    }
    Ok(Document::load_mem(pdf_bytes)?)
}

/// Number of pages in a PDF held in memory.
///
/// # Errors
///
/// `PdfError::InvalidPdf` when the bytes do not parse as a PDF or the page tree
/// cannot be walked.
pub fn count_pages(pdf_bytes: &[u8]) -> Result<usize> {
    let document = load(pdf_bytes)?;
    let page_count = document.get_pages().len();

    tracing::debug!(page_count, bytes = pdf_bytes.len(), "Counted PDF pages");

    Ok(page_count)
}

/// MediaBox size of every page, in page order.
///
/// The vector length is the page count. A page whose MediaBox is missing or
/// malformed, on the page and on every ancestor, yields `None`.
pub fn page_sizes(pdf_bytes: &[u8]) -> Result<Vec<Option<PageSize>>> {
    let document = load(pdf_bytes)?;
    let sizes: Vec<Option<PageSize>> = document
        .get_pages()
        .values()
        .map(|page_id| media_box(&document, *page_id))
        .collect();

    tracing::debug!(page_count = sizes.len(), bytes = pdf_bytes.len(), "Read PDF page sizes");

    Ok(sizes)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(document: &Document, object: &Object) -> Option<f64> {
    match resolve(document, object)? {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// MediaBox is inheritable, so walk `Parent` links until one is found.
fn media_box(document: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut node = page_id;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = document.get_dictionary(node).ok()?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            let corners = resolve(document, media_box)?.as_array().ok()?;
            if corners.len() != 4 {
                return None;
            }
            let [llx, lly, urx, ury] = [
                number(document, &corners[0])?,
                number(document, &corners[1])?,
                number(document, &corners[2])?,
                number(document, &corners[3])?,
            ];
            let size = PageSize {
                width: (urx - llx).abs(),
                height: (ury - lly).abs(),
            };
            return (size.width > 0.0 && size.height > 0.0).then_some(size);
        }

        node = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }

    None
}

/// Synthetic PDF builder shared by unit tests across the crate.
///
/// Each page shows its text. With `inherit_media_box` the MediaBox sits on the
/// page tree root instead of on the pages.
#[cfg(test)]
pub(crate) fn create_test_pdf(page_texts: &[&str], media_box: [i64; 4], inherit_media_box: bool) -> Vec<u8> {
    use lopdf::{Stream, dictionary};

    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let box_object = || Object::Array(media_box.iter().map(|v| Object::Integer(*v)).collect());

    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for text in page_texts {
        let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        };
        if !inherit_media_box {
            page.set("MediaBox", box_object());
        }
        kids.push(Object::from(doc.add_object(page)));
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_texts.len() as i64),
    };
    if inherit_media_box {
        pages.set("MediaBox", box_object());
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
