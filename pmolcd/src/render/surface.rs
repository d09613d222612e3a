use crate::model::{DisplayCapabilities, PlayerSnapshot};
use crate::render::marquee::{Marquee, ScrollState};
use crate::render::page::{DrawOp, Glyph, RenderPage};
use crate::render::time_utils::format_play_time;

/// Text rows of the monochrome page.
pub const PAGE_ROWS: usize = 4;
/// Text columns of the monochrome page (160 px wide, 6 px font).
pub const MONOCHROME_COLUMNS: usize = 26;

pub const TITLE_ROW: usize = 0;
pub const ARTIST_ROW: usize = 1;
pub const ALBUM_ROW: usize = 2;
pub const STATUS_ROW: usize = 3;

const PLAY_STATE_COL: usize = 0;
const ONLINE_COL: usize = 2;
const PRIVATE_COL: usize = 4;

/// Composes player snapshots into now-playing pages.
#[derive(Clone, Debug)]
pub struct RenderSurface {
    columns: usize,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new(MONOCHROME_COLUMNS)
    }
}

impl RenderSurface {
    pub fn new(columns: usize) -> Self {
        RenderSurface { columns }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        PAGE_ROWS
    }

    /// Builds the page for `snapshot` and the scroll state for the next tick.
    ///
    /// With titles hidden the scroll state is carried over untouched. With
    /// no track loaded it is reset, so the next track starts at offset 0.
    pub fn compose(
        &self,
        snapshot: &PlayerSnapshot,
        capabilities: DisplayCapabilities,
        previous: &ScrollState,
    ) -> (RenderPage, ScrollState) {
        let mut ops = Vec::with_capacity(7);

        let scroll = match &snapshot.track {
            Some(track) if capabilities.show_titles => {
                let scroll = ScrollState {
                    track: previous.track.advance(&track.title, self.columns),
                    artist: previous.artist.advance(&track.artist, self.columns),
                    album: previous.album.advance(&track.album, self.columns),
                };
                self.push_line(&mut ops, TITLE_ROW, &scroll.track);
                self.push_line(&mut ops, ARTIST_ROW, &scroll.artist);
                self.push_line(&mut ops, ALBUM_ROW, &scroll.album);
                scroll
            }
            Some(_) => previous.clone(),
            None => ScrollState::default(),
        };

        ops.push(DrawOp::Glyph {
            row: STATUS_ROW,
            col: PLAY_STATE_COL,
            glyph: if snapshot.is_playing {
                Glyph::Play
            } else {
                Glyph::Pause
            },
        });
        ops.push(DrawOp::Glyph {
            row: STATUS_ROW,
            col: ONLINE_COL,
            glyph: if snapshot.is_online {
                Glyph::Online
            } else {
                Glyph::Offline
            },
        });

        if snapshot.has_track() {
            if snapshot.is_private_session {
                ops.push(DrawOp::Glyph {
                    row: STATUS_ROW,
                    col: PRIVATE_COL,
                    glyph: Glyph::PrivateSession,
                });
            }

            let time = format_play_time(snapshot.elapsed_seconds, snapshot.total_seconds);
            let col = self.columns.saturating_sub(time.chars().count());
            ops.push(DrawOp::Text {
                row: STATUS_ROW,
                col,
                text: time,
            });
        }

        (RenderPage::new(ops), scroll)
    }

    fn push_line(&self, ops: &mut Vec<DrawOp>, row: usize, marquee: &Marquee) {
        if marquee.text().is_empty() {
            return;
        }
        ops.push(DrawOp::Text {
            row,
            col: 0,
            text: marquee.visible(self.columns),
        });
    }
}
