/// Small pictograms drawn on the status row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Play,
    Pause,
    Online,
    Offline,
    PrivateSession,
}

impl Glyph {
    /// Character used when the page is rasterised to text cells.
    pub fn symbol(self) -> char {
        match self {
            Glyph::Play => '\u{25B6}',
            Glyph::Pause => '\u{2016}',
            Glyph::Online => '\u{25CF}',
            Glyph::Offline => '\u{25CB}',
            Glyph::PrivateSession => '\u{25C6}',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    Text { row: usize, col: usize, text: String },
    Glyph { row: usize, col: usize, glyph: Glyph },
}

/// Drawing instructions for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderPage {
    ops: Vec<DrawOp>,
}

impl RenderPage {
    pub(crate) fn new(ops: Vec<DrawOp>) -> Self {
        RenderPage { ops }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn glyphs(&self) -> impl Iterator<Item = Glyph> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Glyph { glyph, .. } => Some(*glyph),
            DrawOp::Text { .. } => None,
        })
    }

    pub fn has_glyph(&self, glyph: Glyph) -> bool {
        self.glyphs().any(|g| g == glyph)
    }

    /// Text drawn on `row`, if any.
    pub fn text_at(&self, row: usize) -> Option<&str> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Text { row: r, text, .. } if *r == row => Some(text.as_str()),
            _ => None,
        })
    }

    /// Rasterises the page into `rows` lines of exactly `columns` cells.
    ///
    /// Anything drawn outside the grid is clipped.
    pub fn to_rows(&self, columns: usize, rows: usize) -> Vec<String> {
        let mut grid = vec![vec![' '; columns]; rows];

        let mut put = |row: usize, col: usize, c: char| {
            if let Some(cell) = grid.get_mut(row).and_then(|line| line.get_mut(col)) {
                *cell = c;
            }
        };

        for op in &self.ops {
            match op {
                DrawOp::Text { row, col, text } => {
                    for (i, c) in text.chars().enumerate() {
                        put(*row, col + i, c);
                    }
                }
                DrawOp::Glyph { row, col, glyph } => put(*row, *col, glyph.symbol()),
            }
        }

        grid.into_iter().map(|line| line.into_iter().collect()).collect()
    }
}
