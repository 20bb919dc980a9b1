//! Collision detection against the tile map
//!
//! The player never moves horizontally, so collision reduces to two checks:
//! the ground line (handled in the tick) and axis-aligned overlap with the
//! spikes in the one or two columns under the player's body.

use glam::Vec2;

use super::level::{Level, TileKind};
use crate::consts::{GROUND_LINE, TILE_WIDTH};
use crate::tuning::Tuning;

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Strict overlap test; rectangles that only touch edges do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }
}

/// Map column under a screen x at the given scroll distance
#[inline]
pub fn column_at(screen_x: f32, scroll: f32) -> i64 {
    ((screen_x + scroll) / TILE_WIDTH).floor() as i64
}

/// Distinct columns under a body's left and right edges
pub fn columns_under(body: &Rect, scroll: f32) -> ([i64; 2], usize) {
    let left = column_at(body.pos.x, scroll);
    let right = column_at(body.pos.x + body.size.x, scroll);
    if left == right {
        ([left, left], 1)
    } else {
        ([left, right], 2)
    }
}

/// Screen-space hit-box of the spike in `col`
///
/// Narrower than the tile by `spike_inset` on each side and as tall as the
/// drawn spike triangle.
pub fn spike_hitbox(col: i64, scroll: f32, tuning: &Tuning) -> Rect {
    let tile_x = col as f32 * TILE_WIDTH - scroll;
    Rect::new(
        tile_x + tuning.spike_inset,
        GROUND_LINE - tuning.spike_height,
        TILE_WIDTH - 2.0 * tuning.spike_inset,
        tuning.spike_height,
    )
}

/// Column of the first spike the body overlaps, if any
pub fn spike_hit(body: &Rect, level: &Level, scroll: f32, tuning: &Tuning) -> Option<i64> {
    let (cols, n) = columns_under(body, scroll);
    cols[..n]
        .iter()
        .copied()
        .filter(|&c| level.tile(c) == TileKind::Spike)
        .find(|&c| body.overlaps(&spike_hitbox(c, scroll, tuning)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PLAYER_SIZE, PLAYER_X};
    use crate::sim::level::{Overlay, OverlayWindow};

    fn level_with(tiles: Vec<TileKind>) -> Level {
        Level {
            id: 1,
            name: "test".into(),
            track: "test.mp3".into(),
            tempo_bpm: 120.0,
            tiles,
            overlay: Overlay {
                year: String::new(),
                text: String::new(),
                window: OverlayWindow::new(0.0, 1.0),
            },
        }
    }

    fn grounded_body() -> Rect {
        Rect::new(PLAYER_X, GROUND_LINE - PLAYER_SIZE, PLAYER_SIZE, PLAYER_SIZE)
    }

    #[test]
    fn test_rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges only
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 10.0, 10.0, 10.0)));
    }

    #[test]
    fn test_columns_under_body() {
        let body = grounded_body();
        // x 140..172 at scroll 0 spans columns 3 and 4
        assert_eq!(columns_under(&body, 0.0), ([3, 4], 2));
        // At scroll 20 the body spans 160..192, one column
        assert_eq!(columns_under(&body, 20.0), ([4, 4], 1));
    }

    #[test]
    fn test_spike_hit_on_ground() {
        let mut tiles = vec![TileKind::Ground; 20];
        tiles[4] = TileKind::Spike;
        let level = level_with(tiles);
        let tuning = Tuning::default();
        assert_eq!(spike_hit(&grounded_body(), &level, 0.0, &tuning), Some(4));
    }

    #[test]
    fn test_spike_inset_margin_forgives_edge_contact() {
        let mut tiles = vec![TileKind::Ground; 20];
        tiles[5] = TileKind::Spike;
        let level = level_with(tiles);
        let tuning = Tuning::default();
        // Right edge at 172 + scroll; spike hit-box starts at 200 + 6 - scroll.
        // scroll 30: right edge world 202 < 206, column 5 occupied but no overlap
        assert_eq!(spike_hit(&grounded_body(), &level, 30.0, &tuning), None);
        assert_eq!(spike_hit(&grounded_body(), &level, 40.0, &tuning), Some(5));
    }

    #[test]
    fn test_airborne_body_clears_spike() {
        let mut tiles = vec![TileKind::Ground; 20];
        tiles[4] = TileKind::Spike;
        let level = level_with(tiles);
        let tuning = Tuning::default();
        let body = Rect::new(PLAYER_X, GROUND_LINE - 36.0 - PLAYER_SIZE, PLAYER_SIZE, PLAYER_SIZE);
        assert_eq!(spike_hit(&body, &level, 0.0, &tuning), None);
    }

    #[test]
    fn test_spikes_outside_map_are_tolerated() {
        let mut tiles = vec![TileKind::Ground; 3];
        tiles[0] = TileKind::Spike;
        tiles[2] = TileKind::Spike;
        let level = level_with(tiles);
        let tuning = Tuning::default();
        // Body is past the end of the map
        assert_eq!(spike_hit(&grounded_body(), &level, 500.0, &tuning), None);
    }
}
