//! Page overlay stamping.
//!
//! Drawing calls are queued per page and only written into the document by
//! [`Stamper::finish`]. Each touched page then gets:
//!
//! - the original content wrapped in `q` ... `Q`, so whatever graphics state the template leaves
//!   behind cannot shift the overlay;
//! - one appended overlay content stream holding every queued operation for that page;
//! - its own `/Resources` dictionary (inherited resources are resolved and copied down) with the
//!   stamping font and any signature images registered under names that cannot collide with the
//!   template's own.

use crate::encoding::encode_win_ansi;
use crate::signature::SignatureImage;
use crate::{PdfError, PdfResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

const FONT_RESOURCE: &str = "FStamp";
const IMAGE_RESOURCE_PREFIX: &str = "ImStamp";
const MAX_PAGE_TREE_DEPTH: usize = 32;

#[derive(Debug, Default)]
struct PageOverlay {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    uses_font: bool,
}

/// A template being filled.
#[derive(Debug)]
pub struct Stamper {
    doc: Document,
    pages: Vec<ObjectId>,
    font_id: Option<ObjectId>,
    save_state_id: Option<ObjectId>,
    overlays: BTreeMap<usize, PageOverlay>,
    image_count: usize,
}

impl Stamper {
    /// Loads a template from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::TemplateNotFound`] if the file does not exist,
    /// [`PdfError::TemplateRead`] for other I/O failures, and the errors of
    /// [`Stamper::from_bytes`] otherwise.
    pub fn open(path: &Path) -> PdfResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PdfError::TemplateNotFound(path.to_path_buf()),
            _ => PdfError::TemplateRead(e),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parses a template held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Parse`] if the bytes are not a readable PDF and
    /// [`PdfError::Structure`] if it has no pages.
    pub fn from_bytes(bytes: &[u8]) -> PdfResult<Self> {
        let doc = Document::load_mem(bytes).map_err(PdfError::Parse)?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(PdfError::Structure("document has no pages".into()));
        }

        Ok(Self {
            doc,
            pages,
            font_id: None,
            save_state_id: None,
            overlays: BTreeMap::new(),
            image_count: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn check_page(&self, page: usize) -> PdfResult<()> {
        if page >= self.pages.len() {
            return Err(PdfError::PageOutOfRange {
                page,
                count: self.pages.len(),
            });
        }
        Ok(())
    }

    /// Queues a single line of Helvetica text with its baseline starting at `(x, y)`.
    pub fn draw_text(&mut self, page: usize, x: f32, y: f32, size: f32, text: &str) -> PdfResult<()> {
        self.check_page(page)?;
        if text.is_empty() {
            return Ok(());
        }

        let overlay = self.overlays.entry(page).or_default();
        overlay.uses_font = true;
        overlay.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), real(size)],
            ),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    /// Queues a stroked checkmark inside the `size` x `size` box anchored at `(x, y)`.
    pub fn draw_check(&mut self, page: usize, x: f32, y: f32, size: f32) -> PdfResult<()> {
        self.check_page(page)?;

        let overlay = self.overlays.entry(page).or_default();
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("G", vec![real(0.0)]),
            Operation::new("w", vec![real(size * 0.12)]),
            Operation::new("J", vec![Object::Integer(1)]),
            Operation::new("j", vec![Object::Integer(1)]),
            Operation::new("m", vec![real(x + size * 0.15), real(y + size * 0.5)]),
            Operation::new("l", vec![real(x + size * 0.4), real(y + size * 0.2)]),
            Operation::new("l", vec![real(x + size * 0.85), real(y + size * 0.85)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    /// Queues an image drawn into the `width` x `height` rectangle anchored at `(x, y)`.
    pub fn draw_image(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: &SignatureImage,
    ) -> PdfResult<()> {
        self.check_page(page)?;

        let image_id = self.add_image(image);
        self.image_count += 1;
        let name = format!("{}{}", IMAGE_RESOURCE_PREFIX, self.image_count);

        let overlay = self.overlays.entry(page).or_default();
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        overlay.images.push((name, image_id));
        Ok(())
    }

    /// Writes all queued overlays into the document and serializes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the page tree is malformed, an overlay cannot be encoded, or the
    /// document cannot be written.
    pub fn finish(mut self) -> PdfResult<Vec<u8>> {
        self.apply_overlays()?;
        self.doc.compress();

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).map_err(PdfError::Write)?;
        Ok(buf)
    }

    fn apply_overlays(&mut self) -> PdfResult<()> {
        let overlays = std::mem::take(&mut self.overlays);
        for (page, overlay) in overlays {
            let page_id = self.pages[page];
            self.attach_resources(page_id, &overlay)?;
            self.attach_contents(page_id, overlay.operations)?;
            tracing::trace!(page, images = overlay.images.len(), "applied page overlay");
        }
        Ok(())
    }

    fn add_image(&mut self, image: &SignatureImage) -> ObjectId {
        let width = i64::from(image.width());
        let height = i64::from(image.height());

        let smask_id = image.alpha().map(|alpha| {
            let mask = Stream::new(
                dictionary! {
                    "Type" => Object::Name(b"XObject".to_vec()),
                    "Subtype" => Object::Name(b"Image".to_vec()),
                    "Width" => Object::Integer(width),
                    "Height" => Object::Integer(height),
                    "ColorSpace" => Object::Name(b"DeviceGray".to_vec()),
                    "BitsPerComponent" => Object::Integer(8),
                },
                alpha.to_vec(),
            );
            self.doc.add_object(mask)
        });

        let mut dict = dictionary! {
            "Type" => Object::Name(b"XObject".to_vec()),
            "Subtype" => Object::Name(b"Image".to_vec()),
            "Width" => Object::Integer(width),
            "Height" => Object::Integer(height),
            "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
            "BitsPerComponent" => Object::Integer(8),
        };
        if let Some(id) = smask_id {
            dict.set("SMask", Object::Reference(id));
        }
        self.doc.add_object(Stream::new(dict, image.rgb().to_vec()))
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => Object::Name(b"Font".to_vec()),
            "Subtype" => Object::Name(b"Type1".to_vec()),
            "BaseFont" => Object::Name(b"Helvetica".to_vec()),
            "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
        });
        self.font_id = Some(id);
        id
    }

    fn save_state_stream(&mut self) -> ObjectId {
        if let Some(id) = self.save_state_id {
            return id;
        }
        let id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        self.save_state_id = Some(id);
        id
    }

    fn attach_resources(&mut self, page_id: ObjectId, overlay: &PageOverlay) -> PdfResult<()> {
        let mut resources = self.effective_resources(page_id)?;

        if overlay.uses_font {
            let font_id = self.font();
            let mut fonts = self.resolve_subdict(&resources, b"Font")?;
            fonts.set(FONT_RESOURCE, Object::Reference(font_id));
            resources.set("Font", Object::Dictionary(fonts));
        }

        if !overlay.images.is_empty() {
            let mut xobjects = self.resolve_subdict(&resources, b"XObject")?;
            for (name, id) in &overlay.images {
                xobjects.set(name.as_str(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn attach_contents(&mut self, page_id: ObjectId, mut operations: Vec<Operation>) -> PdfResult<()> {
        let existing = self.existing_contents(page_id)?;

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            contents.push(Object::Reference(self.save_state_stream()));
            contents.extend(existing);
            operations.insert(0, Operation::new("Q", vec![]));
        }

        let encoded = Content { operations }.encode().map_err(PdfError::Encode)?;
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));
        contents.push(Object::Reference(overlay_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Content stream references currently attached to the page, flattened to a list.
    fn existing_contents(&self, page_id: ObjectId) -> PdfResult<Vec<Object>> {
        let page = self.doc.get_dictionary(page_id).map_err(PdfError::Parse)?;
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => Ok(items.clone()),
                Ok(_) => Ok(vec![Object::Reference(*id)]),
                Err(e) => Err(PdfError::Parse(e)),
            },
            Ok(_) => Err(PdfError::Structure(
                "page /Contents must be a reference or an array".into(),
            )),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// The page's resources, taking inheritance through `/Parent` into account. Returned as an
    /// owned copy so it can be written back onto the page without touching shared ancestors.
    fn effective_resources(&self, page_id: ObjectId) -> PdfResult<Dictionary> {
        let mut current = page_id;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let node = self.doc.get_dictionary(current).map_err(PdfError::Parse)?;
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dict(resources).cloned();
            }
            match node.get(b"Parent").and_then(|p| p.as_reference()) {
                Ok(parent) => current = parent,
                Err(_) => return Ok(Dictionary::new()),
            }
        }
        Err(PdfError::Structure("page tree is too deep".into()))
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> PdfResult<&'a Dictionary> {
        match obj {
            Object::Dictionary(dict) => Ok(dict),
            Object::Reference(id) => self.doc.get_dictionary(*id).map_err(PdfError::Parse),
            _ => Err(PdfError::Structure("expected a dictionary".into())),
        }
    }

    fn resolve_subdict(&self, parent: &Dictionary, key: &[u8]) -> PdfResult<Dictionary> {
        match parent.get(key) {
            Ok(obj) => self.resolve_dict(obj).cloned(),
            Err(_) => Ok(Dictionary::new()),
        }
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> PdfResult<&mut Dictionary> {
        self.doc
            .get_object_mut(page_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(PdfError::Parse)
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::tests::signature_png_base64;
    use crate::template::blank_template;

    fn overlay_content(stamper: &Stamper, page: usize) -> String {
        let page_id = stamper.pages[page];
        let contents = stamper.existing_contents(page_id).unwrap();
        let last = contents.last().unwrap().as_reference().unwrap();
        let stream = stamper.doc.get_object(last).unwrap().as_stream().unwrap();
        String::from_utf8_lossy(&stream.content).into_owned()
    }

    #[test]
    fn test_from_bytes_counts_pages() {
        let stamper = Stamper::from_bytes(&blank_template(3).unwrap()).unwrap();
        assert_eq!(stamper.page_count(), 3);
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(matches!(
            Stamper::from_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_open_missing_template() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing.pdf");
        assert!(matches!(
            Stamper::open(&path),
            Err(PdfError::TemplateNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_page_out_of_range() {
        let mut stamper = Stamper::from_bytes(&blank_template(1).unwrap()).unwrap();
        let err = stamper.draw_text(1, 10.0, 10.0, 10.0, "x").unwrap_err();
        assert!(matches!(err, PdfError::PageOutOfRange { page: 1, count: 1 }));
    }

    #[test]
    fn test_text_overlay_wraps_original_content() {
        let mut stamper = Stamper::from_bytes(&blank_template(2).unwrap()).unwrap();
        stamper
            .draw_text(1, 72.0, 700.0, 10.0, "Jane (Doe)")
            .unwrap();
        stamper.apply_overlays().unwrap();

        let page_id = stamper.pages[1];
        let contents = stamper.existing_contents(page_id).unwrap();
        // q-stream, original content, overlay
        assert_eq!(contents.len(), 3);

        let overlay = overlay_content(&stamper, 1);
        assert!(overlay.starts_with('Q'));
        assert!(overlay.contains("/FStamp"));
        assert!(overlay.contains("Tj"));

        let resources = stamper.effective_resources(page_id).unwrap();
        let fonts = stamper.resolve_subdict(&resources, b"Font").unwrap();
        assert!(fonts.has(b"FStamp"));
        // Inherited template font survives the copy-down.
        assert!(fonts.has(b"F1"));

        // Untouched page keeps its original single content stream.
        let untouched = stamper.existing_contents(stamper.pages[0]).unwrap();
        assert_eq!(untouched.len(), 1);
    }

    #[test]
    fn test_check_and_image_register_resources() {
        let mut stamper = Stamper::from_bytes(&blank_template(1).unwrap()).unwrap();
        let sig = SignatureImage::decode(&signature_png_base64(30, 10)).unwrap();
        stamper.draw_check(0, 100.0, 100.0, 10.0).unwrap();
        stamper.draw_image(0, 200.0, 100.0, 90.0, 30.0, &sig).unwrap();
        stamper.apply_overlays().unwrap();

        let page_id = stamper.pages[0];
        let resources = stamper.effective_resources(page_id).unwrap();
        let xobjects = stamper.resolve_subdict(&resources, b"XObject").unwrap();
        let image_id = xobjects
            .get(b"ImStamp1")
            .and_then(|o| o.as_reference())
            .unwrap();
        let image = stamper.doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert!(image.dict.has(b"SMask"));
        assert_eq!(image.content.len(), 30 * 10 * 3);

        let overlay = overlay_content(&stamper, 0);
        assert!(overlay.contains("/ImStamp1 Do"));
        assert!(overlay.contains("\nS\n"));
    }

    #[test]
    fn test_finish_produces_loadable_pdf() {
        let mut stamper = Stamper::from_bytes(&blank_template(2).unwrap()).unwrap();
        stamper.draw_text(0, 72.0, 720.0, 12.0, "Start of Care").unwrap();
        stamper.draw_check(1, 72.0, 600.0, 10.0).unwrap();
        let bytes = stamper.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn test_finish_without_drawing_is_a_copy() {
        let stamper = Stamper::from_bytes(&blank_template(1).unwrap()).unwrap();
        let bytes = stamper.finish().unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }
}
