//! Pure pagination stage: positions fixed-height blocks on A4 pages.
//!
//! Coordinates are millimeters with the origin at the top-left of the page;
//! the PDF writer converts to points when drawing.

use std::collections::BTreeMap;

use tracing::warn;

use formfill_spec::{CleanAnswer, Question, QuestionList, decode_image};

use crate::image::{ImageData, parse_image};

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 20.0;

const TITLE_TEXT: &str = "Form Responses";
const TITLE_ADVANCE_MM: f64 = 12.0;
const LABEL_HEIGHT_MM: f64 = 7.0;
const ANSWER_HEIGHT_MM: f64 = 10.0;
const IMAGE_SIZE_MM: f64 = 80.0;
const IMAGE_PADDING_MM: f64 = 5.0;
const QUESTION_SPACING_MM: f64 = 3.0;

const LABEL_X_MM: f64 = 10.0;
const ANSWER_X_MM: f64 = 14.0;

const NO_ANSWER_TEXT: &str = "No answer provided";

/// A positioned block. `y_mm` is the pen position measured from the top of
/// the page: the text baseline for text blocks, the top edge for images.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub x_mm: f64,
    pub y_mm: f64,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Title(String),
    Label(String),
    Answer(String),
    Image(ImageBlock),
}

/// An embedded image of fixed size; `image` is `None` when the payload could
/// not be embedded, in which case the writer draws an outlined placeholder
/// of the same size so pagination is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub width_mm: f64,
    pub height_mm: f64,
    pub image: Option<ImageData>,
}

impl Block {
    /// Vertical extent the pagination check reserves for the block.
    pub fn height_mm(&self) -> f64 {
        match &self.kind {
            BlockKind::Title(_) => TITLE_ADVANCE_MM,
            BlockKind::Label(_) => LABEL_HEIGHT_MM,
            BlockKind::Answer(_) => ANSWER_HEIGHT_MM,
            BlockKind::Image(image) => image.height_mm,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct Pen {
    pages: Vec<Page>,
    y_mm: f64,
}

impl Pen {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y_mm: MARGIN_MM,
        }
    }

    /// Starts a new page when the block would cross the bottom margin, then
    /// places it and advances the pen. Blocks are never split.
    fn place(&mut self, x_mm: f64, kind: BlockKind, advance_mm: f64) {
        let mut block = Block {
            x_mm,
            y_mm: self.y_mm,
            kind,
        };
        if self.y_mm + block.height_mm() > PAGE_HEIGHT_MM - MARGIN_MM {
            self.pages.push(Page::default());
            self.y_mm = MARGIN_MM;
            block.y_mm = self.y_mm;
        }
        let page = self.pages.last_mut().expect("at least one page");
        page.blocks.push(block);
        self.y_mm += advance_mm;
    }
}

/// Lays out the title and every question/answer pair across pages.
pub fn layout_document(
    questions: &QuestionList,
    answers: &BTreeMap<usize, CleanAnswer>,
    images: &BTreeMap<usize, String>,
) -> LaidOutDocument {
    let mut pen = Pen::new();
    pen.place(
        LABEL_X_MM,
        BlockKind::Title(TITLE_TEXT.to_string()),
        TITLE_ADVANCE_MM,
    );

    for (index, question) in questions.iter().enumerate() {
        pen.place(
            LABEL_X_MM,
            BlockKind::Label(format!("Q{}: {}", index + 1, question.prompt())),
            LABEL_HEIGHT_MM,
        );

        match embedded_image(question, images.get(&index)) {
            Some(image) => {
                pen.place(
                    LABEL_X_MM,
                    BlockKind::Image(ImageBlock {
                        width_mm: IMAGE_SIZE_MM,
                        height_mm: IMAGE_SIZE_MM,
                        image,
                    }),
                    IMAGE_SIZE_MM + IMAGE_PADDING_MM,
                );
            }
            None => {
                let text = answers
                    .get(&index)
                    .map(CleanAnswer::display_text)
                    .unwrap_or_else(|| NO_ANSWER_TEXT.to_string());
                pen.place(
                    ANSWER_X_MM,
                    BlockKind::Answer(format!("A: {text}")),
                    ANSWER_HEIGHT_MM,
                );
            }
        }

        pen.y_mm += QUESTION_SPACING_MM;
    }

    LaidOutDocument { pages: pen.pages }
}

/// Decides whether a question renders as an image block.
///
/// Outer `None` means "render a text answer line"; `Some(None)` means the
/// payload exists but cannot be embedded, so a placeholder of the same size
/// is drawn.
fn embedded_image(question: &Question, payload: Option<&String>) -> Option<Option<ImageData>> {
    if !question.takes_file() {
        return None;
    }
    let payload = payload?;
    match decode_image(payload).and_then(|(_, bytes)| parse_image(&bytes)) {
        Some(image) => Some(Some(image)),
        None => {
            warn!("image payload is not embeddable, drawing placeholder");
            Some(None)
        }
    }
}
