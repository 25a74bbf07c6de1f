/// A point in display (canvas) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WaveParams {
    /// Wavelength in display pixels. Kept strictly positive by the slider bounds.
    pub wavelength: f32,
    /// Angular frequency in radians per second.
    pub omega: f32,
}

impl WaveParams {
    /// Spatial frequency, 2π/λ. Derived on use so slider changes apply to the
    /// very next sample.
    pub fn wave_number(&self) -> f32 {
        std::f32::consts::TAU / self.wavelength
    }
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            wavelength: 40.0,
            omega: 2.0,
        }
    }
}

pub const WAVELENGTH_RANGE: std::ops::RangeInclusive<f32> = 12.0..=120.0;
pub const OMEGA_RANGE: std::ops::RangeInclusive<f32> = 0.0..=10.0;

/// Pick radius around the observer probe, display px. The observer wins ties
/// against sources.
pub const OBSERVER_PICK_RADIUS: f32 = 12.0;
/// Pick radius around a wave source, display px.
pub const SOURCE_PICK_RADIUS: f32 = 16.0;
/// Draggable entities never get closer than this to a canvas edge.
pub const EDGE_MARGIN: f32 = 10.0;
/// Arrow-key nudge step for the selected source, display px.
pub const KEY_STEP: f32 = 8.0;
/// Fractional reset positions of the two sources.
pub const SOURCE_RESET_X: [f32; 2] = [0.35, 0.65];
pub const SOURCE_RESET_Y: f32 = 0.5;
/// Spacing of the optional grid overlay, display px.
pub const GRID_LINE_STEP: f32 = 40.0;

/// Small positive offset added to every source distance so the phase is
/// defined at the source position itself.
pub const DISTANCE_EPS: f32 = 1.0e-4;
/// Soft-clamp ceiling for the color mapping; two unit sources stay roughly
/// within [-2, 2].
pub const AMPLITUDE_CEIL: f32 = 2.0;

/// Shared dark base of the palette, the color of zero amplitude.
pub const PALETTE_BASE: [u8; 3] = [12, 14, 30];
/// Saturated crest color (amplitude at the positive clamp boundary).
pub const PALETTE_CREST: [u8; 3] = [255, 95, 108];
/// Saturated trough color (amplitude at the negative clamp boundary).
pub const PALETTE_TROUGH: [u8; 3] = [60, 190, 255];
