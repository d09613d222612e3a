//! Horizontal scrolling for text wider than the display.

/// Blank run appended before a long text loops back to its start.
pub const MARQUEE_GAP: &str = "   ";

/// Scroll position of one text line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marquee {
    text: String,
    offset: usize,
}

impl Marquee {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the marquee for the next tick.
    ///
    /// The offset moves one character per call and wraps at the end of the
    /// looped text. A different `text` restarts at offset 0, and text that
    /// fits in `width` never scrolls.
    pub fn advance(&self, text: &str, width: usize) -> Marquee {
        if text != self.text || text.chars().count() <= width {
            return Marquee {
                text: text.to_string(),
                offset: 0,
            };
        }

        Marquee {
            text: self.text.clone(),
            offset: (self.offset + 1) % loop_len(text),
        }
    }

    /// The `width` characters visible at the current offset.
    pub fn visible(&self, width: usize) -> String {
        if self.text.chars().count() <= width {
            return self.text.clone();
        }

        let looped: Vec<char> = self.text.chars().chain(MARQUEE_GAP.chars()).collect();
        looped
            .iter()
            .cycle()
            .skip(self.offset)
            .take(width)
            .collect()
    }
}

/// Length of one full scroll cycle for `text`.
pub fn loop_len(text: &str) -> usize {
    text.chars().count() + MARQUEE_GAP.chars().count()
}

/// Marquee state of every scrolled line, threaded from one frame to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub track: Marquee,
    pub artist: Marquee,
    pub album: Marquee,
}
