//! Page composition for the LCD: layout, marquee scrolling and time format.

pub mod marquee;
pub mod page;
pub mod surface;
pub mod time_utils;

pub use marquee::{Marquee, ScrollState};
pub use page::{DrawOp, Glyph, RenderPage};
pub use surface::{MONOCHROME_COLUMNS, PAGE_ROWS, RenderSurface};
