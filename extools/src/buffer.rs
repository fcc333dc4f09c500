use std::path::Path;

use crate::variables::RowCol;

/// Row/column of a character offset in `text`.
///
/// Offsets count Unicode scalar values; `\n` ends a row. Offsets past the end
/// clamp to the end of the text.
pub fn row_col(text: &str, offset: usize) -> RowCol {
    let mut pos = RowCol::default();
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            pos.row += 1;
            pos.col = 0;
        } else {
            pos.col += 1;
        }
    }
    pos
}

/// In-memory text of the active document.
#[derive(Clone, Debug, Default)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn open(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn row_col(&self, offset: usize) -> RowCol {
        row_col(&self.text, offset)
    }
}
