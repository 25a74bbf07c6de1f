use std::collections::HashMap;

pub const PARTICLE_COUNT: usize = 50;
/// Rendered particle diameter, display px. Also the minimum center distance
/// enforced by the separation pass.
pub const PARTICLE_SIZE: f32 = 12.0;
/// Spatial hash cell size for the separation pass.
pub const CELL_SIZE: f32 = 50.0;
/// Bond lines connect particles no farther apart than this.
pub const BOND_DISTANCE: f32 = 50.0;
/// Each particle bonds to at most this many nearest neighbors.
pub const MAX_BONDS: usize = 3;

const DAMPING: f32 = 0.95;
const SEPARATION_DAMPING: f32 = 0.85;
const ENERGY_SMOOTHING: f32 = 0.95;
/// Per-frame easing of the bulk speed toward the transition target.
const EASE_RATE: f32 = 0.02;
/// A transition completes once the bulk speed is this close to its target.
const TRANSITION_TOLERANCE: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Solid,
    Liquid,
    Gas,
    Plasma,
}

impl Phase {
    pub fn target_speed(self) -> f32 {
        match self {
            Phase::Solid => 0.3,
            Phase::Liquid => 1.0,
            Phase::Gas => 3.0,
            Phase::Plasma => 5.0,
        }
    }

    /// Spring coefficient pulling particles toward the container center.
    /// Solids are bound tightly, liquids loosely, gases and plasma not at all.
    pub fn center_pull(self) -> f32 {
        match self {
            Phase::Solid => 0.00036,
            Phase::Liquid => 0.00012,
            Phase::Gas | Phase::Plasma => 0.0,
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            Phase::Solid => [0, 102, 255],
            Phase::Liquid => [0, 204, 255],
            Phase::Gas => [255, 255, 0],
            Phase::Plasma => [255, 0, 255],
        }
    }

    pub fn energy_label(self) -> &'static str {
        match self {
            Phase::Solid => "Low",
            Phase::Liquid => "Medium",
            Phase::Gas => "High",
            Phase::Plasma => "Very High",
        }
    }

    pub fn motion_label(self) -> &'static str {
        match self {
            Phase::Solid => "Vibrates in place",
            Phase::Liquid => "Slides past each other",
            Phase::Gas => "Moves freely and randomly",
            Phase::Plasma => "Moves extremely fast and chaotic",
        }
    }

    pub fn attraction_label(self) -> &'static str {
        match self {
            Phase::Solid => "Very Strong Bonds",
            Phase::Liquid => "Medium Strength Bonds",
            Phase::Gas => "Weak Attraction",
            Phase::Plasma => "No Bonds (Ionized Particles)",
        }
    }

    /// Bond lines are only meaningful while particles are condensed.
    pub fn draws_bonds(self) -> bool {
        matches!(self, Phase::Solid | Phase::Liquid)
    }

    /// The transitions that can start from this phase, in display order.
    pub fn transitions(self) -> &'static [Transition] {
        match self {
            Phase::Solid => &[Transition::Melting, Transition::Sublimation],
            Phase::Liquid => &[Transition::Freezing, Transition::Vaporization],
            Phase::Gas => &[
                Transition::Condensation,
                Transition::Deposition,
                Transition::Ionization,
            ],
            Phase::Plasma => &[Transition::Recombination],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Melting,
    Freezing,
    Vaporization,
    Condensation,
    Sublimation,
    Deposition,
    Ionization,
    Recombination,
}

impl Transition {
    pub fn label(self) -> &'static str {
        match self {
            Transition::Melting => "Melt",
            Transition::Freezing => "Freeze",
            Transition::Vaporization => "Vaporize",
            Transition::Condensation => "Condense",
            Transition::Sublimation => "Sublimate",
            Transition::Deposition => "Deposit",
            Transition::Ionization => "Ionize",
            Transition::Recombination => "Recombine",
        }
    }

    pub fn from(self) -> Phase {
        match self {
            Transition::Melting | Transition::Sublimation => Phase::Solid,
            Transition::Freezing | Transition::Vaporization => Phase::Liquid,
            Transition::Condensation | Transition::Deposition | Transition::Ionization => {
                Phase::Gas
            }
            Transition::Recombination => Phase::Plasma,
        }
    }

    pub fn to(self) -> Phase {
        match self {
            Transition::Freezing | Transition::Deposition => Phase::Solid,
            Transition::Melting | Transition::Condensation | Transition::Recombination => {
                Phase::Liquid
            }
            Transition::Vaporization | Transition::Sublimation => Phase::Gas,
            Transition::Ionization => Phase::Plasma,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Low-passed kinetic energy in [0, 1], drives marker opacity.
    pub energy: f32,
}

/// Particle box with phase transitions, thermal jitter and short-range
/// separation. Purely numerical; the app draws the particles, bonds and lens.
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    phase: Phase,
    target: Option<Transition>,
    speed: f32,
    grid: HashMap<(i32, i32), Vec<usize>>,
    seed_state: u64,
}

impl ParticleField {
    pub fn new(width: f32, height: f32) -> Self {
        let mut field = Self {
            particles: Vec::with_capacity(PARTICLE_COUNT),
            width,
            height,
            phase: Phase::Solid,
            target: None,
            speed: Phase::Solid.target_speed(),
            grid: HashMap::new(),
            seed_state: 0xD1B5_4A32_9C8E_2711 ^ ((width as u64) << 16) ^ height as u64,
        };
        for _ in 0..PARTICLE_COUNT {
            let x = field.rand01() * width;
            let y = field.rand01() * height;
            field.particles.push(Particle {
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                energy: 0.2,
            });
        }
        field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> Option<Transition> {
        self.target
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Request a phase transition. Only accepted from its starting phase;
    /// anything else degrades to no visible change.
    pub fn begin_transition(&mut self, transition: Transition) -> bool {
        if self.phase != transition.from() {
            return false;
        }
        self.target = Some(transition);
        true
    }

    /// Advance one frame. Returns the new phase when a pending transition
    /// completes this frame.
    pub fn step(&mut self) -> Option<Phase> {
        if let Some(transition) = self.target {
            let target_speed = transition.to().target_speed();
            self.speed += (target_speed - self.speed) * EASE_RATE;
        }

        self.rebuild_grid();

        let cx = self.width * 0.5;
        let cy = self.height * 0.5;
        let pull = self.phase.center_pull();
        let max_speed = Phase::Plasma.target_speed();

        for i in 0..self.particles.len() {
            // Thermal kick on roughly half of the frames.
            let (kx, ky) = if self.rand01() < 0.5 {
                (
                    (self.rand01() - 0.5) * self.speed * 0.5,
                    (self.rand01() - 0.5) * self.speed * 0.5,
                )
            } else {
                (0.0, 0.0)
            };

            let p = &mut self.particles[i];
            p.vx *= DAMPING;
            p.vy *= DAMPING;
            p.vx += (cx - p.x) * pull + kx;
            p.vy += (cy - p.y) * pull + ky;
            p.x += p.vx;
            p.y += p.vy;

            self.separate(i);

            let p = &mut self.particles[i];
            p.energy = p.energy * ENERGY_SMOOTHING + (self.speed / max_speed) * 0.05;

            if p.x < 0.0 || p.x > self.width - PARTICLE_SIZE {
                p.vx = -p.vx;
            }
            if p.y < 0.0 || p.y > self.height - PARTICLE_SIZE {
                p.vy = -p.vy;
            }
        }

        if let Some(transition) = self.target {
            let target_speed = transition.to().target_speed();
            if (self.speed - target_speed).abs() < TRANSITION_TOLERANCE {
                self.phase = transition.to();
                self.speed = target_speed;
                self.target = None;
                return Some(self.phase);
            }
        }
        None
    }

    /// Nearest-neighbor bond pairs (each pair once, first index smaller).
    /// Empty outside the condensed phases.
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        if !self.phase.draws_bonds() {
            return Vec::new();
        }

        let max_sq = BOND_DISTANCE * BOND_DISTANCE;
        let mut bonds = Vec::new();
        let mut neighbors: Vec<(usize, f32)> = Vec::new();

        for i in 0..self.particles.len() {
            neighbors.clear();
            for j in 0..self.particles.len() {
                if i == j {
                    continue;
                }
                let dx = self.particles[j].x - self.particles[i].x;
                let dy = self.particles[j].y - self.particles[i].y;
                let d2 = dx * dx + dy * dy;
                if d2 <= max_sq {
                    neighbors.push((j, d2));
                }
            }
            neighbors.sort_by(|a, b| a.1.total_cmp(&b.1));
            for &(j, _) in neighbors.iter().take(MAX_BONDS) {
                if j > i {
                    bonds.push((i, j));
                }
            }
        }
        bonds
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (i, p) in self.particles.iter().enumerate() {
            self.grid.entry(Self::cell_of(p.x, p.y)).or_default().push(i);
        }
    }

    fn cell_of(x: f32, y: f32) -> (i32, i32) {
        ((x / CELL_SIZE).floor() as i32, (y / CELL_SIZE).floor() as i32)
    }

    /// Push overlapping neighbors apart along the contact normal, checking
    /// only the 3×3 block of hash cells around the particle.
    fn separate(&mut self, i: usize) {
        let min_sq = PARTICLE_SIZE * PARTICLE_SIZE;
        let (gx, gy) = Self::cell_of(self.particles[i].x, self.particles[i].y);

        for cy in (gy - 1)..=(gy + 1) {
            for cx in (gx - 1)..=(gx + 1) {
                let Some(cell) = self.grid.get(&(cx, cy)) else {
                    continue;
                };
                for &j in cell {
                    if j == i {
                        continue;
                    }
                    let dx = self.particles[j].x - self.particles[i].x;
                    let dy = self.particles[j].y - self.particles[i].y;
                    let d2 = dx * dx + dy * dy;
                    if d2 <= 0.0 || d2 >= min_sq {
                        continue;
                    }
                    let d = d2.sqrt().max(1.0e-4);
                    let overlap = (PARTICLE_SIZE - d) / 2.0;
                    let nx = dx / d;
                    let ny = dy / d;

                    self.particles[i].x -= nx * overlap;
                    self.particles[i].y -= ny * overlap;
                    self.particles[j].x += nx * overlap;
                    self.particles[j].y += ny * overlap;

                    self.particles[i].vx *= SEPARATION_DAMPING;
                    self.particles[i].vy *= SEPARATION_DAMPING;
                    self.particles[j].vx *= SEPARATION_DAMPING;
                    self.particles[j].vy *= SEPARATION_DAMPING;
                }
            }
        }
    }

    fn next_rand_u64(&mut self) -> u64 {
        let mut x = self.seed_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.seed_state = x;
        x.wrapping_mul(2685821657736338717)
    }

    /// Uniform in [0, 1]. Keeps the top 24 bits of the generator, so the
    /// divisor must be the 24-bit maximum for the draws to span the interval.
    fn rand01(&mut self) -> f32 {
        let v = (self.next_rand_u64() >> 40) as u32;
        v as f32 / ((1u32 << 24) - 1) as f32
    }

    #[cfg(test)]
    fn place(&mut self, i: usize, x: f32, y: f32) {
        self.particles[i].x = x;
        self.particles[i].y = y;
        self.particles[i].vx = 0.0;
        self.particles[i].vy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> ParticleField {
        ParticleField::new(600.0, 400.0)
    }

    #[test]
    fn transition_map_is_consistent() {
        let all = [
            Transition::Melting,
            Transition::Freezing,
            Transition::Vaporization,
            Transition::Condensation,
            Transition::Sublimation,
            Transition::Deposition,
            Transition::Ionization,
            Transition::Recombination,
        ];
        for t in all {
            assert_ne!(t.from(), t.to());
            assert!(t.from().transitions().contains(&t));
        }
    }

    #[test]
    fn melting_eases_into_the_liquid_phase() {
        let mut f = field();
        assert!(f.begin_transition(Transition::Melting));

        let mut completed = None;
        for _ in 0..300 {
            if let Some(phase) = f.step() {
                completed = Some(phase);
                break;
            }
        }
        assert_eq!(completed, Some(Phase::Liquid));
        assert_eq!(f.phase(), Phase::Liquid);
        assert_eq!(f.target(), None);
        assert!((f.speed() - Phase::Liquid.target_speed()).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut f = field();
        assert!(!f.begin_transition(Transition::Freezing));
        assert!(!f.begin_transition(Transition::Ionization));
        assert_eq!(f.target(), None);
        for _ in 0..50 {
            f.step();
        }
        assert_eq!(f.phase(), Phase::Solid);
    }

    #[test]
    fn bonds_respect_count_distance_and_phase() {
        let mut f = field();
        for _ in 0..60 {
            f.step();
        }

        let bonds = f.bonds();
        let max_sq = BOND_DISTANCE * BOND_DISTANCE;
        let mut per_particle = vec![0usize; PARTICLE_COUNT];
        let mut seen = std::collections::HashSet::new();

        for &(i, j) in &bonds {
            assert!(i < j, "pairs must be emitted once, smaller index first");
            assert!(seen.insert((i, j)), "duplicate bond ({}, {})", i, j);
            let dx = f.particles()[j].x - f.particles()[i].x;
            let dy = f.particles()[j].y - f.particles()[i].y;
            assert!(dx * dx + dy * dy <= max_sq + 1.0e-3);
            per_particle[i] += 1;
        }
        for count in per_particle {
            assert!(count <= MAX_BONDS);
        }

        // No bonds once the particles have vaporized.
        assert!(f.begin_transition(Transition::Sublimation));
        for _ in 0..400 {
            f.step();
        }
        assert_eq!(f.phase(), Phase::Gas);
        assert!(f.bonds().is_empty());
    }

    #[test]
    fn rand_draws_span_the_unit_interval() {
        let mut f = field();
        let mut min = 1.0f32;
        let mut max = 0.0f32;
        for _ in 0..10_000 {
            let v = f.rand01();
            assert!((0.0..=1.0).contains(&v));
            min = min.min(v);
            max = max.max(v);
        }
        assert!(max > 0.9, "draws never left the low end, max {}", max);
        assert!(min < 0.1, "draws never reached the low end, min {}", min);
    }

    #[test]
    fn initial_positions_span_the_container() {
        let f = field();
        let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in f.particles() {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        assert!(
            max_x - min_x > 300.0 && max_y - min_y > 200.0,
            "particles clumped into ({:.1}, {:.1})..({:.1}, {:.1})",
            min_x,
            min_y,
            max_x,
            max_y
        );
    }

    #[test]
    fn separation_pushes_overlapping_particles_apart() {
        let mut f = field();
        f.place(0, 200.0, 200.0);
        f.place(1, 204.0, 200.0);
        f.step();

        let dx = f.particles()[1].x - f.particles()[0].x;
        let dy = f.particles()[1].y - f.particles()[0].y;
        assert!(
            (dx * dx + dy * dy).sqrt() > 10.0,
            "particles still overlapping after separation"
        );
    }

    #[test]
    fn energy_stays_normalized() {
        let mut f = field();
        f.begin_transition(Transition::Sublimation);
        for _ in 0..500 {
            f.step();
        }
        for p in f.particles() {
            assert!(p.vx.is_finite() && p.vy.is_finite());
            assert!((0.0..=1.05).contains(&p.energy), "energy {}", p.energy);
        }
    }
}
