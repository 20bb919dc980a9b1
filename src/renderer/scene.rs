//! Snapshot → triangle list
//!
//! Pure function of a [`FrameSnapshot`] plus a fixed [`SceneStyle`]; no GPU
//! state, so it runs (and is tested) natively.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::PI;

use super::shapes::{arc_band, band_below, circle, rect, triangle, vertical_gradient};
use super::vertex::{Vertex, colors};
use crate::consts::*;
use crate::game::FrameSnapshot;
use crate::lerp_color;
use crate::settings::Settings;
use crate::sim::{ParticleKind, PlayerBody, SessionState, TileKind};

/// Parallax speed of each star layer (scroll units per unit)
const STAR_LAYER_SPEED: [f32; 3] = [0.4, 0.8, 1.2];
const STAR_LAYER_COUNT: [usize; 3] = [60, 40, 20];
const PARTICLE_SIZE: f32 = 3.0;
const SPIKE_DRAW_INSET: f32 = 6.0;
const SPIKE_DRAW_HEIGHT: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Star {
    pos: Vec2,
    radius: f32,
    layer: usize,
}

/// Fixed per-session decoration and visual toggles
#[derive(Debug, Clone)]
pub struct SceneStyle {
    stars: Vec<Star>,
    pub starfield: bool,
    pub squash_stretch: bool,
    pub beat_bar: bool,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SceneStyle {
    /// Scatter the starfield from `seed`
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut stars = Vec::new();
        for (layer, &count) in STAR_LAYER_COUNT.iter().enumerate() {
            for _ in 0..count {
                stars.push(Star {
                    pos: Vec2::new(
                        rng.random::<f32>() * VIEW_WIDTH,
                        rng.random::<f32>() * VIEW_HEIGHT,
                    ),
                    radius: rng.random::<f32>() * 1.6 + 0.4,
                    layer,
                });
            }
        }
        Self {
            stars,
            starfield: true,
            squash_stretch: true,
            beat_bar: true,
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.apply_settings(settings);
        self
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.starfield = settings.effective_starfield();
        self.squash_stretch = settings.effective_squash();
        self.beat_bar = settings.beat_bar;
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }
}

/// Seconds of simulated time, for idle animation
fn seconds(ticks: u64) -> f32 {
    ticks as f32 * SIM_DT
}

fn particle_color(kind: ParticleKind) -> [f32; 4] {
    match kind {
        ParticleKind::Jump => colors::PARTICLE_JUMP,
        ParticleKind::Land => colors::PARTICLE_LAND,
        ParticleKind::Death => colors::PARTICLE_DEATH,
    }
}

/// Build every triangle for one frame, back to front
pub fn build_scene(snapshot: &FrameSnapshot<'_>, style: &SceneStyle) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(4096);
    let t = seconds(snapshot.time_ticks);

    match snapshot.session {
        SessionState::Menu => menu_scene(&mut out, t),
        _ => level_scene(&mut out, snapshot, style, t),
    }

    if style.beat_bar && snapshot.beat_proximity > 0.0 {
        let width = VIEW_WIDTH * snapshot.beat_proximity;
        out.extend(rect(
            Vec2::new((VIEW_WIDTH - width) / 2.0, 0.0),
            Vec2::new(width, 4.0),
            lerp_color(colors::WAVE, colors::BEAT_BAR, snapshot.beat_proximity),
        ));
    }

    if snapshot.fade_opacity > 0.0 {
        let mut color = colors::FADE;
        color[3] = snapshot.fade_opacity.min(1.0);
        out.extend(rect(Vec2::ZERO, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), color));
    }

    out
}

fn menu_scene(out: &mut Vec<Vertex>, t: f32) {
    out.extend(vertical_gradient(
        Vec2::ZERO,
        Vec2::new(VIEW_WIDTH, VIEW_HEIGHT),
        colors::MENU_SKY_TOP,
        colors::MENU_SKY_BOTTOM,
    ));

    // Soft waves
    let mut wave = colors::WAVE;
    wave[3] = 0.15;
    for i in 0..3 {
        let fi = i as f32;
        let base = 120.0 + fi * 100.0 + (t * 0.8 + fi).sin() * 10.0;
        let points: Vec<Vec2> = (0..=(VIEW_WIDTH as i32 / 40))
            .map(|k| {
                let x = k as f32 * 40.0;
                Vec2::new(x, base + ((x + t * 60.0) / 160.0 + fi).sin() * 8.0)
            })
            .collect();
        out.extend(band_below(&points, VIEW_HEIGHT, wave));
    }

    // Selector arrows either side of the level name
    let mid = VIEW_WIDTH / 2.0;
    let y = 228.0;
    out.extend(triangle(
        Vec2::new(mid - 150.0, y - 14.0),
        Vec2::new(mid - 150.0, y + 14.0),
        Vec2::new(mid - 170.0, y),
        colors::PLAYER,
    ));
    out.extend(triangle(
        Vec2::new(mid + 150.0, y - 14.0),
        Vec2::new(mid + 170.0, y),
        Vec2::new(mid + 150.0, y + 14.0),
        colors::PLAYER,
    ));

    // Bouncing mascot
    let center = Vec2::new(mid, 380.0 + (t * 4.0).sin() * 10.0);
    player_block(out, center, Vec2::splat(PLAYER_SIZE), Vec2::ONE);
}

fn level_scene(out: &mut Vec<Vertex>, snapshot: &FrameSnapshot<'_>, style: &SceneStyle, t: f32) {
    let scroll = snapshot.scroll;

    out.extend(vertical_gradient(
        Vec2::ZERO,
        Vec2::new(VIEW_WIDTH, VIEW_HEIGHT),
        colors::SKY_TOP,
        colors::SKY_BOTTOM,
    ));

    if style.starfield {
        for star in &style.stars {
            let drift = scroll * STAR_LAYER_SPEED[star.layer] * 0.02;
            let x = (star.pos.x - drift).rem_euclid(VIEW_WIDTH);
            out.extend(circle(
                Vec2::new(x, star.pos.y),
                star.radius,
                colors::STAR_LAYERS[star.layer],
                6,
            ));
        }
    }

    // Waves near the horizon
    for i in 0..3 {
        let fi = i as f32;
        let base = VIEW_HEIGHT - 160.0 + fi * 30.0 + (t * 1.2 + fi).sin() * 6.0;
        let points: Vec<Vec2> = (0..=(VIEW_WIDTH as i32 / 30))
            .map(|k| {
                let x = k as f32 * 30.0;
                Vec2::new(x, base + ((x + scroll * 0.1) / 120.0 + fi).sin() * 6.0)
            })
            .collect();
        out.extend(band_below(&points, VIEW_HEIGHT, colors::WAVE));
    }

    tiles(out, snapshot);

    let player = snapshot.player;
    let bounce = if player.on_ground && style.squash_stretch {
        (t * 6.0).sin()
    } else {
        0.0
    };
    let scale = if style.squash_stretch {
        squash_scale(player)
    } else {
        Vec2::ONE
    };
    player_block(out, player.center() + Vec2::new(0.0, bounce), player.size, scale);

    for p in snapshot.particles.iter() {
        let mut color = particle_color(p.kind);
        color[3] = p.alpha();
        out.extend(rect(p.pos, Vec2::splat(PARTICLE_SIZE), color));
    }

    if matches!(snapshot.session, SessionState::Dead(_)) {
        out.extend(rect(Vec2::ZERO, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), colors::DEATH_DIM));
    }
}

/// Ground and spikes for the visible columns
fn tiles(out: &mut Vec<Vertex>, snapshot: &FrameSnapshot<'_>) {
    let scroll = snapshot.scroll;
    let first = (scroll / TILE_WIDTH).floor() as i64;
    let visible = (VIEW_WIDTH / TILE_WIDTH).ceil() as i64 + 2;

    for col in first..first + visible {
        let x = (col as f32 * TILE_WIDTH - scroll).floor();
        match snapshot.level.tile(col) {
            TileKind::Ground | TileKind::Spike => {
                out.extend(rect(
                    Vec2::new(x, GROUND_LINE),
                    Vec2::new(TILE_WIDTH, GROUND_DEPTH),
                    colors::GROUND,
                ));
                out.extend(rect(
                    Vec2::new(x, GROUND_LINE - 2.0),
                    Vec2::new(TILE_WIDTH, 2.0),
                    colors::GROUND_BEVEL,
                ));
            }
            TileKind::Empty => {}
        }
        if snapshot.level.tile(col) == TileKind::Spike {
            out.extend(triangle(
                Vec2::new(x + TILE_WIDTH / 2.0, GROUND_LINE - SPIKE_DRAW_HEIGHT),
                Vec2::new(x + TILE_WIDTH - SPIKE_DRAW_INSET, GROUND_LINE),
                Vec2::new(x + SPIKE_DRAW_INSET, GROUND_LINE),
                colors::SPIKE,
            ));
        }
    }
}

/// Horizontal squash and vertical stretch while the jump phase decays
pub fn squash_scale(player: &PlayerBody) -> Vec2 {
    if player.squash <= 0.0 {
        return Vec2::ONE;
    }
    Vec2::new(
        (1.0 - player.squash * 0.15).max(0.85),
        (1.0 + player.squash * 0.20).min(1.20),
    )
}

/// The block with its face, scaled about `center`
fn player_block(out: &mut Vec<Vertex>, center: Vec2, size: Vec2, scale: Vec2) {
    let half = size / 2.0;
    // Local coordinates are relative to the block's top-left corner
    let place = |local: Vec2| center + (local - half) * scale;
    let body_start = out.len();

    out.extend(rect(Vec2::ZERO, size, colors::PLAYER));
    out.extend(rect(Vec2::new(8.0, 10.0), Vec2::splat(6.0), colors::PLAYER_FACE));
    out.extend(rect(Vec2::new(size.x - 14.0, 10.0), Vec2::splat(6.0), colors::PLAYER_FACE));
    out.extend(arc_band(
        Vec2::new(size.x / 2.0, size.y - 10.0),
        8.0,
        3.0,
        (0.0, PI),
        colors::PLAYER_FACE,
        10,
    ));

    for v in &mut out[body_start..] {
        let p = place(Vec2::from(v.position));
        v.position = p.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioStatus;
    use crate::sim::{Catalog, Level, Particle, ParticlePool};

    struct Fixture {
        player: PlayerBody,
        level: Level,
        particles: ParticlePool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                player: PlayerBody::default(),
                level: Catalog::builtin().get(0).clone(),
                particles: ParticlePool::with_capacity(8),
            }
        }

        fn snapshot(&self, session: SessionState, scroll: f32) -> FrameSnapshot<'_> {
            FrameSnapshot {
                player: &self.player,
                scroll,
                level: &self.level,
                session,
                overlay_opacity: 1.0,
                fade_opacity: 0.0,
                beat_proximity: 0.0,
                particles: &self.particles,
                status_text: String::new(),
                menu_cursor: 0,
                audio: AudioStatus::Idle,
                time_ticks: 0,
            }
        }
    }

    fn count_color(vertices: &[Vertex], color: [f32; 4]) -> usize {
        vertices.iter().filter(|v| v.color == color).count()
    }

    #[test]
    fn test_whole_triangles() {
        let fx = Fixture::new();
        let style = SceneStyle::new(3);
        for session in [SessionState::Menu, SessionState::Playing(0), SessionState::Dead(0)] {
            assert_eq!(build_scene(&fx.snapshot(session, 0.0), &style).len() % 3, 0);
        }
    }

    #[test]
    fn test_visible_spikes_drawn() {
        let fx = Fixture::new();
        let style = SceneStyle::new(3);
        // Level 1 has a spike at column 60 (x = 2400); scroll it into view
        let near = build_scene(&fx.snapshot(SessionState::Playing(0), 2000.0), &style);
        assert_eq!(count_color(&near, colors::SPIKE), 3);

        let far = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &style);
        assert_eq!(count_color(&far, colors::SPIKE), 0);
    }

    #[test]
    fn test_menu_has_no_tiles() {
        let fx = Fixture::new();
        let v = build_scene(&fx.snapshot(SessionState::Menu, 2000.0), &SceneStyle::new(3));
        assert_eq!(count_color(&v, colors::GROUND), 0);
        assert_eq!(count_color(&v, colors::SPIKE), 0);
    }

    #[test]
    fn test_fade_quad_drawn_last() {
        let fx = Fixture::new();
        let mut snapshot = fx.snapshot(SessionState::Playing(0), 0.0);
        snapshot.fade_opacity = 0.4;
        let v = build_scene(&snapshot, &SceneStyle::new(3));
        let tail = &v[v.len() - 6..];
        assert!(tail.iter().all(|v| v.color == [0.0, 0.0, 0.0, 0.4]));
    }

    #[test]
    fn test_death_dims_screen() {
        let fx = Fixture::new();
        let style = SceneStyle::new(3);
        let dead = build_scene(&fx.snapshot(SessionState::Dead(0), 0.0), &style);
        let alive = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &style);
        assert_eq!(count_color(&dead, colors::DEATH_DIM), 6);
        assert_eq!(count_color(&alive, colors::DEATH_DIM), 0);
    }

    #[test]
    fn test_particles_fade_with_life() {
        let mut fx = Fixture::new();
        fx.particles.insert(Particle {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            life: 20.0,
            kind: ParticleKind::Death,
        });
        let v = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &SceneStyle::new(3));
        let mut color = colors::PARTICLE_DEATH;
        color[3] = 0.5;
        assert_eq!(count_color(&v, color), 6);
    }

    #[test]
    fn test_squash_scale_bounds() {
        let mut player = PlayerBody::default();
        assert_eq!(squash_scale(&player), Vec2::ONE);
        player.squash = 1.0;
        let s = squash_scale(&player);
        assert!((s.x - 0.85).abs() < 1e-6);
        assert!((s.y - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_beat_bar_follows_proximity_and_toggle() {
        let fx = Fixture::new();
        let mut style = SceneStyle::new(3);
        let idle = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &style).len();

        let mut snapshot = fx.snapshot(SessionState::Playing(0), 0.0);
        snapshot.beat_proximity = 0.5;
        let v = build_scene(&snapshot, &style);
        assert_eq!(v.len(), idle + 6);
        let bar = &v[v.len() - 6..];
        let width = bar.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max)
            - bar.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        assert!((width - VIEW_WIDTH * 0.5).abs() < 1e-3);

        style.beat_bar = false;
        assert_eq!(build_scene(&snapshot, &style).len(), idle);
    }

    #[test]
    fn test_starfield_toggle() {
        let fx = Fixture::new();
        let mut style = SceneStyle::new(3);
        assert_eq!(style.star_count(), 120);
        let with = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &style).len();
        style.starfield = false;
        let without = build_scene(&fx.snapshot(SessionState::Playing(0), 0.0), &style).len();
        assert_eq!(with - without, 120 * 6 * 3);
    }
}
