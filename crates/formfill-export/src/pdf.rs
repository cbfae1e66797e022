//! Self-contained PDF 1.4 writer for laid-out documents.
//!
//! Emits uncompressed content streams, Helvetica text, and image XObjects
//! (JPEG via `DCTDecode`, PNG via `FlateDecode` with PNG predictors). All
//! objects are written in id order so the cross-reference table is a single
//! contiguous section.

use std::fmt::Write as _;

use crate::image::{ImageData, PngColor};
use crate::layout::{Block, BlockKind, LaidOutDocument, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const MM_TO_PT: f64 = 72.0 / 25.4;
const TITLE_FONT_PT: f64 = 16.0;
const BODY_FONT_PT: f64 = 12.0;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;
const FIRST_IMAGE_ID: usize = 4;

/// Serializes the laid-out pages into finished PDF bytes.
pub fn write_document(document: &LaidOutDocument) -> Vec<u8> {
    let images = collect_images(document);
    let image_count = images.len();
    let first_page_id = FIRST_IMAGE_ID + image_count;

    let page_ids: Vec<usize> = (0..document.pages.len())
        .map(|k| first_page_id + 2 * k)
        .collect();

    let mut builder = PdfBuilder::new();

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    builder.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
    );
    builder.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            document.pages.len()
        )
        .as_bytes(),
    );
    builder.object(
        FONT_ID,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (offset, image) in images.iter().enumerate() {
        write_image_object(&mut builder, FIRST_IMAGE_ID + offset, image);
    }

    let resources = build_resources(image_count);
    let mut next_image = FIRST_IMAGE_ID;
    for (k, page) in document.pages.iter().enumerate() {
        let page_id = page_ids[k];
        let contents_id = page_id + 1;
        builder.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources {resources} /Contents {contents_id} 0 R >>",
                PAGE_WIDTH_MM * MM_TO_PT,
                PAGE_HEIGHT_MM * MM_TO_PT,
            )
            .as_bytes(),
        );
        let content = page_content(page, &mut next_image);
        builder.stream_object(contents_id, "", content.as_bytes());
    }

    builder.finish()
}

fn collect_images(document: &LaidOutDocument) -> Vec<ImageData> {
    document
        .pages
        .iter()
        .flat_map(|page| page.blocks.iter())
        .filter_map(|block| match &block.kind {
            BlockKind::Image(image) => image.image.clone(),
            _ => None,
        })
        .collect()
}

fn build_resources(image_count: usize) -> String {
    let mut resources = format!("<< /Font << /F1 {FONT_ID} 0 R >>");
    if image_count > 0 {
        resources.push_str(" /XObject <<");
        for id in FIRST_IMAGE_ID..FIRST_IMAGE_ID + image_count {
            let _ = write!(resources, " /Im{id} {id} 0 R");
        }
        resources.push_str(" >>");
    }
    resources.push_str(" >>");
    resources
}

fn write_image_object(builder: &mut PdfBuilder, id: usize, image: &ImageData) {
    match image {
        ImageData::Jpeg {
            width,
            height,
            grayscale,
            data,
        } => {
            let colorspace = if *grayscale {
                "/DeviceGray"
            } else {
                "/DeviceRGB"
            };
            builder.stream_object(
                id,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {width} /Height {height} \
                     /ColorSpace {colorspace} /BitsPerComponent 8 /Filter /DCTDecode "
                ),
                data,
            );
        }
        ImageData::Png {
            width,
            height,
            color,
            data,
        } => {
            let colorspace = match color {
                PngColor::Gray => "/DeviceGray",
                PngColor::Rgb => "/DeviceRGB",
            };
            builder.stream_object(
                id,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {width} /Height {height} \
                     /ColorSpace {colorspace} /BitsPerComponent 8 /Filter /FlateDecode \
                     /DecodeParms << /Predictor 15 /Colors {} /BitsPerComponent 8 /Columns {width} >> ",
                    color.channels(),
                ),
                data,
            );
        }
    }
}

fn page_content(page: &crate::layout::Page, next_image: &mut usize) -> String {
    let mut ops = String::new();
    for block in &page.blocks {
        match &block.kind {
            BlockKind::Title(text) => text_op(&mut ops, block, TITLE_FONT_PT, text),
            BlockKind::Label(text) | BlockKind::Answer(text) => {
                text_op(&mut ops, block, BODY_FONT_PT, text)
            }
            BlockKind::Image(image_block) => {
                let w = image_block.width_mm * MM_TO_PT;
                let h = image_block.height_mm * MM_TO_PT;
                let x = block.x_mm * MM_TO_PT;
                let y = (PAGE_HEIGHT_MM - block.y_mm - image_block.height_mm) * MM_TO_PT;
                match image_block.image {
                    Some(_) => {
                        let id = *next_image;
                        *next_image += 1;
                        let _ = writeln!(
                            ops,
                            "q {w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm /Im{id} Do Q"
                        );
                    }
                    None => {
                        let _ = writeln!(ops, "q {x:.2} {y:.2} {w:.2} {h:.2} re S Q");
                        let baseline = Block {
                            x_mm: block.x_mm + 4.0,
                            y_mm: block.y_mm + 10.0,
                            kind: BlockKind::Answer(String::new()),
                        };
                        text_op(&mut ops, &baseline, BODY_FONT_PT, "image unavailable");
                    }
                }
            }
        }
    }
    ops
}

fn text_op(ops: &mut String, block: &Block, size_pt: f64, text: &str) {
    let x = block.x_mm * MM_TO_PT;
    let y = (PAGE_HEIGHT_MM - block.y_mm) * MM_TO_PT;
    let _ = writeln!(
        ops,
        "BT /F1 {size_pt:.0} Tf 1 0 0 1 {x:.2} {y:.2} Tm ({}) Tj ET",
        escape_text(text)
    );
}

/// Escapes a string literal and narrows it to single-byte WinAnsi-ish
/// characters. Latin-1 code points above ASCII become octal escapes so the
/// stream stays single-byte; anything outside Latin-1 becomes `?`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\\' => escaped.push_str("\\\\"),
            '\n' | '\r' | '\t' => escaped.push(' '),
            c if (c as u32) < 0x20 => escaped.push(' '),
            c if c.is_ascii() => escaped.push(c),
            c if (c as u32) <= 0xff => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        debug_assert_eq!(id, self.offsets.len() + 1, "objects must be written in id order");
        self.offsets.push(self.buf.len());
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream_object(&mut self, id: usize, dict_entries: &str, stream: &[u8]) {
        debug_assert_eq!(id, self.offsets.len() + 1, "objects must be written in id order");
        self.offsets.push(self.buf.len());
        self.buf.extend_from_slice(
            format!(
                "{id} 0 obj\n<< {dict_entries}/Length {} >>\nstream\n",
                stream.len()
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(stream);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(self) -> Vec<u8> {
        let mut buf = self.buf;
        let xref_start = buf.len();
        let count = self.offsets.len();
        buf.extend_from_slice(format!("xref\n0 {}\n", count + 1).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
                count + 1
            )
            .as_bytes(),
        );
        buf
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use formfill_spec::{CleanAnswer, Question};

    use super::*;
    use crate::layout::layout_document;

    #[test]
    fn writes_a_parseable_shell() {
        let questions = vec![Question::TextBox {
            question: "Name".into(),
            required: true,
        }];
        let mut answers = BTreeMap::new();
        answers.insert(0, CleanAnswer::Text("Ada".into()));
        let document = layout_document(&questions, &answers, &BTreeMap::new());
        let bytes = write_document(&document);

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Q1: Name) Tj"));
        assert!(text.contains("(A: Ada) Tj"));
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(escape_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_text("héllo\u{1F600}"), "h\\351llo?");
    }
}
