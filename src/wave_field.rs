use crate::types::{
    Point, WaveParams, AMPLITUDE_CEIL, DISTANCE_EPS, EDGE_MARGIN, OBSERVER_PICK_RADIUS,
    PALETTE_BASE, PALETTE_CREST, PALETTE_TROUGH, SOURCE_PICK_RADIUS, SOURCE_RESET_X,
    SOURCE_RESET_Y,
};

/// Logical sampling resolution of the field. The display scales this up;
/// the resolution itself never changes.
pub const FIELD_WIDTH: usize = 180;
pub const FIELD_HEIGHT: usize = 120;

/// A draggable entity on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickTarget {
    Observer,
    Source(usize),
}

/// Two-source interference simulation. Owns all mutable state; rendering
/// back ends consume the RGBA buffer and the overlay positions, so tests can
/// assert against the buffer instead of drawn pixels.
pub struct WaveField {
    sources: [Point; 2],
    observer: Point,
    time: f32,
    width: f32,
    height: f32,
    selected: usize,
    pub params: WaveParams,
    pub paused: bool,
    pub show_grid: bool,
}

impl WaveField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            sources: [
                Point::new(width * SOURCE_RESET_X[0], height * SOURCE_RESET_Y),
                Point::new(width * SOURCE_RESET_X[1], height * SOURCE_RESET_Y),
            ],
            observer: Point::new(width * 0.5, height * 0.25),
            time: 0.0,
            width,
            height,
            selected: 0,
            params: WaveParams::default(),
            paused: false,
            show_grid: false,
        }
    }

    /// Track the current canvas size. Entity positions keep their absolute
    /// display coordinates; only the grid-to-display scale changes.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.width / FIELD_WIDTH as f32,
            self.height / FIELD_HEIGHT as f32,
        )
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.paused {
            self.time += dt;
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn sources(&self) -> &[Point; 2] {
        &self.sources
    }

    pub fn observer(&self) -> Point {
        self.observer
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        if index < self.sources.len() {
            self.selected = index;
        }
    }

    /// Superposed amplitude at a field-grid coordinate. Each source
    /// contributes sin(k·r − ω·t) at unit amplitude, with a small positive
    /// offset on r so the phase stays defined at the source itself.
    pub fn amplitude_at(&self, fx: f32, fy: f32, t: f32) -> f32 {
        let (sx, sy) = self.scale();
        let cx = fx * sx;
        let cy = fy * sy;
        let k = self.params.wave_number();

        let mut total = 0.0;
        for source in &self.sources {
            let r = (cx - source.x).hypot(cy - source.y) + DISTANCE_EPS;
            total += (k * r - self.params.omega * t).sin();
        }
        total
    }

    /// Amplitude at a display coordinate at the current simulated time.
    pub fn amplitude_at_point(&self, p: Point) -> f32 {
        let (sx, sy) = self.scale();
        self.amplitude_at(p.x / sx, p.y / sy, self.time)
    }

    /// Rasterize the field at cell centers into a FIELD_WIDTH×FIELD_HEIGHT
    /// RGBA buffer.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(FIELD_WIDTH * FIELD_HEIGHT * 4);
        for fy in 0..FIELD_HEIGHT {
            for fx in 0..FIELD_WIDTH {
                let a = self.amplitude_at(fx as f32 + 0.5, fy as f32 + 0.5, self.time);
                let [r, g, b] = amplitude_to_color(a);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
        rgba
    }

    /// Hit test in display coordinates. The observer wins within its radius;
    /// otherwise sources are tested top-first (reverse index order) so the
    /// later-drawn source takes ties.
    pub fn pick(&self, p: Point) -> Option<PickTarget> {
        if p.distance_to(self.observer) <= OBSERVER_PICK_RADIUS {
            return Some(PickTarget::Observer);
        }
        for i in (0..self.sources.len()).rev() {
            if p.distance_to(self.sources[i]) <= SOURCE_PICK_RADIUS {
                return Some(PickTarget::Source(i));
            }
        }
        None
    }

    pub fn position_of(&self, target: PickTarget) -> Point {
        match target {
            PickTarget::Observer => self.observer,
            PickTarget::Source(i) => self.sources[i],
        }
    }

    /// Move an entity, clamped to the edge margin. Takes effect immediately.
    pub fn move_target(&mut self, target: PickTarget, x: f32, y: f32) {
        let p = self.clamp_to_margin(x, y);
        match target {
            PickTarget::Observer => self.observer = p,
            PickTarget::Source(i) => self.sources[i] = p,
        }
    }

    /// Arrow-key step for the currently selected source.
    pub fn nudge_selected(&mut self, dx: f32, dy: f32) {
        let s = self.sources[self.selected];
        self.sources[self.selected] = self.clamp_to_margin(s.x + dx, s.y + dy);
    }

    /// Restore both sources to their fractional home positions. Observer,
    /// time and wave parameters are left alone.
    pub fn reset_sources(&mut self) {
        self.sources[0] = Point::new(self.width * SOURCE_RESET_X[0], self.height * SOURCE_RESET_Y);
        self.sources[1] = Point::new(self.width * SOURCE_RESET_X[1], self.height * SOURCE_RESET_Y);
    }

    fn clamp_to_margin(&self, x: f32, y: f32) -> Point {
        Point::new(
            x.clamp(EDGE_MARGIN, self.width - EDGE_MARGIN),
            y.clamp(EDGE_MARGIN, self.height - EDGE_MARGIN),
        )
    }
}

/// Map an amplitude to RGB. Normalized by the soft-clamp ceiling, then
/// linearly interpolated from the shared dark base toward the crest color for
/// positive values and the trough color for negative ones; symmetric and
/// continuous around zero.
pub fn amplitude_to_color(a: f32) -> [u8; 3] {
    let n = (a / AMPLITUDE_CEIL).clamp(-1.0, 1.0);
    let (highlight, t) = if n >= 0.0 {
        (PALETTE_CREST, n)
    } else {
        (PALETTE_TROUGH, -n)
    };

    let mut rgb = [0u8; 3];
    for (channel, out) in rgb.iter_mut().enumerate() {
        let base = PALETTE_BASE[channel] as f32;
        let hi = highlight[channel] as f32;
        *out = (base + (hi - base) * t).round() as u8;
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEY_STEP;
    use approx::assert_relative_eq;

    const W: f32 = 720.0;
    const H: f32 = 480.0;

    fn field() -> WaveField {
        WaveField::new(W, H)
    }

    #[test]
    fn amplitude_stays_bounded() {
        let mut f = field();
        for &t in &[0.0, 0.37, 1.0, 12.5] {
            f.params.wavelength = 17.0;
            f.params.omega = 6.3;
            for fy in 0..FIELD_HEIGHT {
                for fx in 0..FIELD_WIDTH {
                    let a = f.amplitude_at(fx as f32 + 0.5, fy as f32 + 0.5, t);
                    assert!(a.is_finite());
                    assert!(a.abs() <= 2.2, "amplitude {} out of range", a);
                }
            }
        }
    }

    #[test]
    fn zero_amplitude_is_the_dark_base() {
        assert_eq!(amplitude_to_color(0.0), PALETTE_BASE);
    }

    #[test]
    fn clamp_boundaries_saturate() {
        assert_eq!(amplitude_to_color(AMPLITUDE_CEIL), PALETTE_CREST);
        assert_eq!(amplitude_to_color(-AMPLITUDE_CEIL), PALETTE_TROUGH);
        // Beyond the ceiling the mapping stays pinned.
        assert_eq!(amplitude_to_color(5.0), PALETTE_CREST);
        assert_eq!(amplitude_to_color(-5.0), PALETTE_TROUGH);
    }

    #[test]
    fn color_map_is_continuous_at_zero() {
        let above = amplitude_to_color(1.0e-4);
        let below = amplitude_to_color(-1.0e-4);
        for c in 0..3 {
            assert!(
                (above[c] as i16 - below[c] as i16).abs() <= 1,
                "channel {} jumps across zero: {:?} vs {:?}",
                c,
                above,
                below
            );
        }
    }

    #[test]
    fn dragging_clamps_to_the_edge_margin() {
        let mut f = field();
        f.move_target(PickTarget::Source(0), -50.0, 9999.0);
        assert_eq!(f.sources()[0], Point::new(EDGE_MARGIN, H - EDGE_MARGIN));

        // The new position is visible immediately, no frame delay.
        f.move_target(PickTarget::Observer, 300.0, 200.0);
        assert_eq!(f.observer(), Point::new(300.0, 200.0));
    }

    #[test]
    fn reset_restores_sources_only() {
        let mut f = field();
        f.params.wavelength = 23.0;
        f.advance(1.5);
        f.move_target(PickTarget::Source(0), 100.0, 100.0);
        f.move_target(PickTarget::Source(1), 500.0, 400.0);
        f.move_target(PickTarget::Observer, 222.0, 111.0);

        f.reset_sources();

        assert_eq!(f.sources()[0], Point::new(W * 0.35, H * 0.5));
        assert_eq!(f.sources()[1], Point::new(W * 0.65, H * 0.5));
        assert_eq!(f.observer(), Point::new(222.0, 111.0));
        assert_relative_eq!(f.time(), 1.5);
        assert_relative_eq!(f.params.wavelength, 23.0);
    }

    #[test]
    fn pausing_freezes_the_field() {
        let mut f = field();
        f.advance(0.4);
        f.paused = true;
        let before = f.to_rgba8();
        f.advance(0.3);
        f.advance(1.7);
        assert_eq!(before, f.to_rgba8());

        f.paused = false;
        f.advance(0.3);
        assert_ne!(before, f.to_rgba8());
    }

    #[test]
    fn wavelength_change_applies_to_the_next_sample() {
        let mut f = field();
        let a1 = f.amplitude_at(30.5, 40.5, 0.8);
        f.params.wavelength = 77.0;
        let a2 = f.amplitude_at(30.5, 40.5, 0.8);
        assert_ne!(a1, a2);

        // Matches a field that always had the new wavelength.
        let mut fresh = field();
        fresh.params.wavelength = 77.0;
        assert_relative_eq!(a2, fresh.amplitude_at(30.5, 40.5, 0.8));
    }

    #[test]
    fn amplitude_at_a_source_is_epsilon_only() {
        let mut f = field();
        f.params.omega = 2.0;
        // Stack both sources so the query point sees only the epsilon phase.
        f.move_target(PickTarget::Source(0), 100.0, 100.0);
        f.move_target(PickTarget::Source(1), 100.0, 100.0);
        let a = f.amplitude_at_point(Point::new(100.0, 100.0));
        assert!(a.abs() < 1.0e-3, "expected near-zero amplitude, got {}", a);
    }

    #[test]
    fn observer_wins_picks_and_sources_resolve_top_first() {
        let mut f = field();
        f.move_target(PickTarget::Observer, 200.0, 200.0);
        f.move_target(PickTarget::Source(0), 205.0, 200.0);
        assert_eq!(f.pick(Point::new(200.0, 200.0)), Some(PickTarget::Observer));

        f.move_target(PickTarget::Source(0), 400.0, 300.0);
        f.move_target(PickTarget::Source(1), 408.0, 300.0);
        assert_eq!(
            f.pick(Point::new(404.0, 300.0)),
            Some(PickTarget::Source(1))
        );

        assert_eq!(f.pick(Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn arrow_nudges_move_the_selected_source_and_clamp() {
        let mut f = field();
        f.select(1);
        let start = f.sources()[1];
        f.nudge_selected(-KEY_STEP, 0.0);
        assert_eq!(f.sources()[1].x, start.x - KEY_STEP);
        assert_eq!(f.sources()[0], Point::new(W * 0.35, H * 0.5));

        for _ in 0..200 {
            f.nudge_selected(-KEY_STEP, 0.0);
        }
        assert_eq!(f.sources()[1].x, EDGE_MARGIN);
    }
}
