//! Level model and built-in catalog
//!
//! Levels are immutable once the catalog is built. Everything the physics
//! needs from a level is a tile lookup by column and the map length.

use serde::{Deserialize, Serialize};

use crate::consts::{OVERLAY_HIDE_RATIO, TILE_WIDTH};

/// Classification of one map column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Ground,
    Spike,
}

/// Scroll-distance range over which the caption fades out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayWindow {
    pub start: f32,
    pub end: f32,
}

impl OverlayWindow {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Caption opacity at the given scroll distance (0 = hidden)
    ///
    /// Fully visible before the window, fading linearly inside it, and hidden
    /// once the fade passes [`OVERLAY_HIDE_RATIO`] or the window ends.
    pub fn opacity(&self, distance: f32) -> f32 {
        if distance < self.start {
            return 1.0;
        }
        if distance > self.end {
            return 0.0;
        }
        let span = self.end - self.start;
        if span <= 0.0 {
            return 0.0;
        }
        let t = (distance - self.start) / span;
        if t > OVERLAY_HIDE_RATIO {
            0.0
        } else {
            (1.0 - t).max(0.0)
        }
    }
}

/// Historical caption shown at the start of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub year: String,
    pub text: String,
    pub window: OverlayWindow,
}

/// One playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: u32,
    pub name: String,
    /// Music track handed to the audio transport
    pub track: String,
    pub tempo_bpm: f32,
    pub tiles: Vec<TileKind>,
    pub overlay: Overlay,
}

impl Level {
    /// Tile at a column; anything outside the map is empty
    pub fn tile(&self, col: i64) -> TileKind {
        if col < 0 {
            return TileKind::Empty;
        }
        self.tiles.get(col as usize).copied().unwrap_or_default()
    }

    /// Total scrollable length in world units
    pub fn length(&self) -> f32 {
        self.tiles.len() as f32 * TILE_WIDTH
    }

    /// Seconds per beat
    pub fn beat_interval(&self) -> f64 {
        60.0 / self.tempo_bpm.max(1.0) as f64
    }

    /// Columns holding spikes, in order
    pub fn spike_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == TileKind::Spike)
            .map(|(c, _)| c)
    }
}

/// Build a ground-only map with spikes at the given columns
///
/// Spikes in the first five columns or the last two are dropped so the
/// player always gets a run-up and a clean finish.
pub fn flat_with_spikes(len: usize, spike_cols: &[usize]) -> Vec<TileKind> {
    let mut tiles = vec![TileKind::Ground; len];
    for &c in spike_cols {
        if c >= 5 && c + 2 < len {
            tiles[c] = TileKind::Spike;
        }
    }
    tiles
}

/// Ordered, non-empty sequence of levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogData")]
pub struct Catalog {
    levels: Vec<Level>,
}

/// Wire form of a catalog, checked before it becomes a [`Catalog`]
#[derive(Deserialize)]
struct CatalogData {
    levels: Vec<Level>,
}

impl TryFrom<CatalogData> for Catalog {
    type Error = &'static str;

    fn try_from(data: CatalogData) -> Result<Self, Self::Error> {
        Catalog::new(data.levels).ok_or("catalog has no levels")
    }
}

impl Catalog {
    /// Build a catalog; returns `None` for an empty level list
    pub fn new(levels: Vec<Level>) -> Option<Self> {
        if levels.is_empty() {
            None
        } else {
            Some(Self { levels })
        }
    }

    /// Deserialize a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Clamp an arbitrary index into the valid range
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.levels.len().saturating_sub(1))
    }

    /// Level at an index, clamped to the last level
    pub fn get(&self, index: usize) -> &Level {
        &self.levels[self.clamp_index(index)]
    }

    /// The five built-in levels
    pub fn builtin() -> Self {
        let window = OverlayWindow::new(700.0, 2200.0);
        let level = |id: u32, bpm: f32, len: usize, spikes: &[usize], year: &str, text: &str| Level {
            id,
            name: format!("Level {id}"),
            track: format!("level{id}.mp3"),
            tempo_bpm: bpm,
            tiles: flat_with_spikes(len, spikes),
            overlay: Overlay {
                year: year.to_string(),
                text: text.to_string(),
                window,
            },
        };

        Self {
            levels: vec![
                level(
                    1,
                    120.0,
                    320,
                    &[60, 120, 180, 240, 300],
                    "2006",
                    "Early Roblox era: basic UI, blocky avatars, physics-focused beginnings.",
                ),
                level(
                    2,
                    128.0,
                    340,
                    &[70, 140, 200, 260, 320],
                    "2008",
                    "Image Modding, first Eggstravaganza, Builders Club via PayPal.",
                ),
                level(
                    3,
                    110.0,
                    360,
                    &[60, 110, 170, 230, 290, 350],
                    "2016",
                    "Xbox release, Microsoft Store app, R15 avatar updates.",
                ),
                level(
                    4,
                    122.0,
                    380,
                    &[80, 160, 220, 280, 340],
                    "2018",
                    "MeepCity 1B visits; clearer \u{201c}Public/Private\u{201d}; dev roadmap transparency.",
                ),
                level(
                    5,
                    118.0,
                    400,
                    &[90, 170, 240, 310, 380],
                    "2025",
                    "Safety and scale: age checks for chat, engine optimizations, growth at RDC.",
                ),
            ],
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_opacity_curve() {
        let window = OverlayWindow::new(700.0, 2200.0);
        assert_eq!(window.opacity(0.0), 1.0);
        assert_eq!(window.opacity(700.0), 1.0);
        assert!((window.opacity(1450.0) - 0.5).abs() < 1e-6);
        // t = 0.933 is past the hide ratio
        assert_eq!(window.opacity(2100.0), 0.0);
        assert_eq!(window.opacity(5000.0), 0.0);
    }

    #[test]
    fn test_overlay_visible_just_before_hide_ratio() {
        let window = OverlayWindow::new(700.0, 2200.0);
        let d = 700.0 + 1500.0 * 0.84;
        assert!(window.opacity(d) > 0.15);
    }

    #[test]
    fn test_map_builder_drops_edge_spikes() {
        let tiles = flat_with_spikes(20, &[0, 4, 5, 17, 18, 19]);
        assert_eq!(tiles[0], TileKind::Ground);
        assert_eq!(tiles[4], TileKind::Ground);
        assert_eq!(tiles[5], TileKind::Spike);
        assert_eq!(tiles[17], TileKind::Spike);
        assert_eq!(tiles[18], TileKind::Ground);
        assert_eq!(tiles[19], TileKind::Ground);
    }

    #[test]
    fn test_tile_out_of_range_is_empty() {
        let level = Catalog::builtin().get(0).clone();
        assert_eq!(level.tile(-1), TileKind::Empty);
        assert_eq!(level.tile(10_000), TileKind::Empty);
        assert_eq!(level.tile(60), TileKind::Spike);
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 5);
        // Column 320 of a 340-wide map is clear of the tail guard
        assert_eq!(catalog.get(1).spike_columns().count(), 5);
        assert_eq!(catalog.get(2).tempo_bpm, 110.0);
        assert!((catalog.get(0).beat_interval() - 0.5).abs() < 1e-12);
        assert_eq!(catalog.get(0).length(), 320.0 * TILE_WIDTH);
    }

    #[test]
    fn test_index_clamping() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.clamp_index(99), 4);
        assert_eq!(catalog.get(99).id, 5);
    }

    #[test]
    fn test_catalog_json_round_trip_rejects_empty() {
        assert!(Catalog::from_json(r#"{ "levels": [] }"#).is_err());
        let err = serde_json::from_str::<Catalog>(r#"{ "levels": [] }"#).unwrap_err();
        assert!(err.to_string().contains("no levels"));
        let json = serde_json::to_string(&Catalog::builtin()).unwrap();
        let parsed = Catalog::from_json(&json).unwrap();
        assert_eq!(parsed, Catalog::builtin());
    }
}
