//! Fixed-capacity particle pool
//!
//! Particles are purely visual. The pool never grows past its capacity: slots
//! are allocated from a free list and returned to it when a particle expires.
//! Spawns that find the pool full are dropped.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

/// Downward pull on particles per tick
pub const PARTICLE_GRAVITY: f32 = 0.05;
/// Life used to normalize particle alpha
pub const PARTICLE_MAX_LIFE: f32 = 40.0;
/// Default pool capacity
pub const DEFAULT_PARTICLE_CAPACITY: usize = 256;

/// What kind of burst produced a particle (drives its color)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Jump,
    Land,
    Death,
}

impl ParticleKind {
    /// Particle count and velocity spread for this burst
    pub fn burst(self) -> (usize, f32) {
        match self {
            ParticleKind::Jump => (16, 5.0),
            ParticleKind::Land => (10, 4.0),
            ParticleKind::Death => (28, 6.0),
        }
    }
}

/// A single particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in ticks
    pub life: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Opacity derived from remaining life
    pub fn alpha(&self) -> f32 {
        (self.life / PARTICLE_MAX_LIFE).clamp(0.0, 1.0)
    }
}

/// Arena of particles with a free list
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Option<Particle>>,
    free: Vec<usize>,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PARTICLE_CAPACITY)
    }
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            // Reverse so the lowest slot is handed out first
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a particle; returns false when the pool is full
    pub fn insert(&mut self, particle: Particle) -> bool {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(particle);
                true
            }
            None => false,
        }
    }

    /// Spawn a burst around `origin`; returns how many particles fit
    pub fn spawn_burst(&mut self, rng: &mut Pcg32, origin: Vec2, kind: ParticleKind) -> usize {
        let (amount, spread) = kind.burst();
        let mut spawned = 0;
        for _ in 0..amount {
            let vel = Vec2::new(
                (rng.random::<f32>() - 0.5) * spread,
                (rng.random::<f32>() - 0.5) * spread - rng.random::<f32>() * 1.5,
            );
            let life = 28.0 + rng.random::<f32>() * 12.0;
            if !self.insert(Particle {
                pos: origin,
                vel,
                life,
                kind,
            }) {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    /// Advance every particle one tick and recycle the expired ones
    pub fn update(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            let Some(p) = entry else { continue };
            p.pos += p.vel;
            p.vel.y += PARTICLE_GRAVITY;
            p.life -= 1.0;
            if p.life <= 0.0 {
                *entry = None;
                self.free.push(slot);
            }
        }
    }

    /// Drop every particle (level transitions)
    pub fn clear(&mut self) {
        let capacity = self.slots.len();
        self.slots.iter_mut().for_each(|s| *s = None);
        self.free.clear();
        self.free.extend((0..capacity).rev());
    }

    /// Live particles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn particle(life: f32) -> Particle {
        Particle {
            pos: Vec2::ZERO,
            vel: Vec2::new(1.0, 0.0),
            life,
            kind: ParticleKind::Jump,
        }
    }

    #[test]
    fn test_pool_never_exceeds_capacity() {
        let mut pool = ParticlePool::with_capacity(20);
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(pool.spawn_burst(&mut rng, Vec2::ZERO, ParticleKind::Jump), 16);
        assert_eq!(pool.spawn_burst(&mut rng, Vec2::ZERO, ParticleKind::Jump), 4);
        assert_eq!(pool.len(), 20);
        assert!(!pool.insert(particle(5.0)));
    }

    #[test]
    fn test_expired_slots_are_reused() {
        let mut pool = ParticlePool::with_capacity(2);
        assert!(pool.insert(particle(1.0)));
        assert!(pool.insert(particle(10.0)));
        assert!(!pool.insert(particle(10.0)));

        pool.update();
        assert_eq!(pool.len(), 1);
        assert!(pool.insert(particle(3.0)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_update_applies_motion_and_gravity() {
        let mut pool = ParticlePool::with_capacity(1);
        pool.insert(particle(10.0));
        pool.update();
        let p = pool.iter().next().unwrap();
        assert_eq!(p.pos, Vec2::new(1.0, 0.0));
        assert!((p.vel.y - PARTICLE_GRAVITY).abs() < 1e-6);
        assert_eq!(p.life, 9.0);
    }

    #[test]
    fn test_clear_restores_free_list() {
        let mut pool = ParticlePool::with_capacity(8);
        let mut rng = Pcg32::seed_from_u64(1);
        pool.spawn_burst(&mut rng, Vec2::ZERO, ParticleKind::Land);
        assert_eq!(pool.len(), 8);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.spawn_burst(&mut rng, Vec2::ZERO, ParticleKind::Land), 8);
    }

    #[test]
    fn test_bursts_are_deterministic() {
        let mut a = ParticlePool::default();
        let mut b = ParticlePool::default();
        let mut rng_a = Pcg32::seed_from_u64(42);
        let mut rng_b = Pcg32::seed_from_u64(42);
        a.spawn_burst(&mut rng_a, Vec2::new(10.0, 20.0), ParticleKind::Death);
        b.spawn_burst(&mut rng_b, Vec2::new(10.0, 20.0), ParticleKind::Death);
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x == y));
    }
}
