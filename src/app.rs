use eframe::egui::{
    self, pos2, vec2, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, Stroke,
    TextureHandle, TextureOptions, Vec2,
};

use crate::particles::{ParticleField, PARTICLE_SIZE};
use crate::types::{Point, GRID_LINE_STEP, KEY_STEP, OMEGA_RANGE, WAVELENGTH_RANGE};
use crate::wave_field::{amplitude_to_color, PickTarget, WaveField, FIELD_HEIGHT, FIELD_WIDTH};

const LENS_RADIUS: f32 = 80.0;
const LENS_ZOOM: f32 = 1.7;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interference,
    PhasesOfMatter,
}

pub struct WaveLabApp {
    mode: Mode,
    wave: WaveField,
    matter: ParticleField,
    texture: Option<TextureHandle>,
    /// Active drag and the grab offset from the entity center.
    drag: Option<(PickTarget, Vec2)>,
    /// Lens center in canvas-local coordinates while the pointer hovers.
    lens: Option<Pos2>,
}

impl WaveLabApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            mode: Mode::Interference,
            wave: WaveField::new(960.0, 640.0),
            matter: ParticleField::new(960.0, 640.0),
            texture: None,
            drag: None,
            lens: None,
        }
    }

    fn update_texture(&mut self, ctx: &egui::Context) {
        let image = ColorImage::from_rgba_unmultiplied(
            [FIELD_WIDTH, FIELD_HEIGHT],
            &self.wave.to_rgba8(),
        );

        if let Some(texture) = &mut self.texture {
            texture.set(image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture("wave-field", image, TextureOptions::LINEAR));
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Wave Lab");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.mode, Mode::Interference, "Interference");
            ui.selectable_value(&mut self.mode, Mode::PhasesOfMatter, "Phases of matter");
        });
        ui.separator();

        match self.mode {
            Mode::Interference => self.draw_wave_controls(ui),
            Mode::PhasesOfMatter => self.draw_matter_controls(ui),
        }
    }

    fn draw_wave_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Two-Source Interference");
        ui.add(
            egui::Slider::new(&mut self.wave.params.wavelength, WAVELENGTH_RANGE)
                .text("wavelength"),
        );
        ui.label(format!("λ ≈ {:.0} px", self.wave.params.wavelength));
        ui.add(egui::Slider::new(&mut self.wave.params.omega, OMEGA_RANGE).text("frequency"));
        ui.label(format!("ω ≈ {:.1} rad/s", self.wave.params.omega));

        ui.horizontal(|ui| {
            if ui
                .button(if self.wave.paused { "Play" } else { "Pause" })
                .clicked()
            {
                self.wave.paused = !self.wave.paused;
            }
            if ui.button("Reset sources").clicked() {
                self.wave.reset_sources();
            }
        });
        ui.checkbox(&mut self.wave.show_grid, "Show grid");

        ui.separator();
        ui.label(format!("Selected source: S{}", self.wave.selected() + 1));
        let a = self.wave.amplitude_at_point(self.wave.observer());
        ui.label(format!("Detector: S ≈ {:.2}", a));
        ui.label(format!("t = {:.1} s", self.wave.time()));

        ui.separator();
        ui.small("Drag the sources or the detector. Keys 1/2 select a source, arrows move it.");
    }

    fn draw_matter_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Phases of Matter");
        let phase = self.matter.phase();

        ui.horizontal(|ui| {
            for &transition in phase.transitions() {
                if ui.button(transition.label()).clicked() && self.matter.begin_transition(transition)
                {
                    log::debug!("phase transition started: {:?}", transition);
                }
            }
        });
        if let Some(transition) = self.matter.target() {
            ui.label(format!("{}…", transition.label()));
        }

        ui.separator();
        ui.label(format!("Energy: {}", phase.energy_label()));
        ui.label(format!("Motion: {}", phase.motion_label()));
        ui.label(format!("Attraction: {}", phase.attraction_label()));

        ui.separator();
        ui.small("Hover the container to magnify the particles.");
    }

    fn draw_wave_canvas(&mut self, ui: &mut egui::Ui, dt: f32) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.wave.set_display_size(rect.width(), rect.height());
        self.handle_wave_keys(ui.ctx());
        self.handle_wave_drag(&response, rect);
        self.wave.advance(dt);
        self.update_texture(ui.ctx());

        let painter = ui.painter_at(rect);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if self.wave.show_grid {
            let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 10));
            let mut x = rect.left() + GRID_LINE_STEP;
            while x < rect.right() {
                painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
                x += GRID_LINE_STEP;
            }
            let mut y = rect.top() + GRID_LINE_STEP;
            while y < rect.bottom() {
                painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
                y += GRID_LINE_STEP;
            }
        }

        self.draw_sources(&painter, rect);
        self.draw_observer(&painter, rect);
    }

    fn handle_wave_keys(&mut self, ctx: &egui::Context) {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Num1) {
                self.wave.select(0);
            }
            if i.key_pressed(egui::Key::Num2) {
                self.wave.select(1);
            }
        });

        // A source is always selected, so every arrow press moves it; consume
        // the key so nothing else scrolls.
        let nudges = [
            (egui::Key::ArrowLeft, -KEY_STEP, 0.0),
            (egui::Key::ArrowRight, KEY_STEP, 0.0),
            (egui::Key::ArrowUp, 0.0, -KEY_STEP),
            (egui::Key::ArrowDown, 0.0, KEY_STEP),
        ];
        for (key, dx, dy) in nudges {
            if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, key)) {
                self.wave.nudge_selected(dx, dy);
            }
        }
    }

    fn handle_wave_drag(&mut self, response: &egui::Response, rect: Rect) {
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = Point::new(pos.x - rect.left(), pos.y - rect.top());
                if let Some(target) = self.wave.pick(local) {
                    if let PickTarget::Source(i) = target {
                        self.wave.select(i);
                    }
                    let grab = self.wave.position_of(target);
                    self.drag = Some((target, vec2(local.x - grab.x, local.y - grab.y)));
                }
            }
        }

        if let Some((target, offset)) = self.drag {
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.wave.move_target(
                        target,
                        pos.x - rect.left() - offset.x,
                        pos.y - rect.top() - offset.y,
                    );
                }
            }
        }

        if response.drag_stopped() {
            self.drag = None;
        }
    }

    fn draw_sources(&self, painter: &egui::Painter, rect: Rect) {
        for (i, s) in self.wave.sources().iter().enumerate() {
            let center = to_screen(rect, *s);
            let selected = i == self.wave.selected();

            // Glow, approximated with concentric translucent discs.
            painter.circle_filled(center, 26.0, Color32::from_rgba_unmultiplied(255, 95, 108, 28));
            painter.circle_filled(
                center,
                14.0,
                Color32::from_rgba_unmultiplied(255, 170, 150, 60),
            );

            let fill = if selected {
                Color32::from_rgb(255, 253, 250)
            } else {
                Color32::from_rgb(255, 225, 212)
            };
            let ring = if selected {
                Color32::from_rgb(255, 179, 71)
            } else {
                Color32::from_rgb(255, 95, 108)
            };
            painter.circle(
                center,
                7.0,
                fill,
                Stroke::new(if selected { 2.4 } else { 1.6 }, ring),
            );
            painter.text(
                center + vec2(0.0, -14.0),
                Align2::CENTER_CENTER,
                format!("S{}", i + 1),
                FontId::proportional(10.0),
                Color32::from_rgba_unmultiplied(255, 255, 255, 217),
            );
        }
    }

    fn draw_observer(&self, painter: &egui::Painter, rect: Rect) {
        let observer = self.wave.observer();
        let a = self.wave.amplitude_at_point(observer);
        let [r, g, b] = amplitude_to_color(a);
        let ring = Color32::from_rgb(r, g, b);
        let center = to_screen(rect, observer);

        painter.circle_filled(center, 22.0, Color32::from_rgba_unmultiplied(r, g, b, 50));
        painter.circle(
            center,
            8.0,
            Color32::from_rgb(11, 16, 34),
            Stroke::new(2.0, ring),
        );
        painter.text(
            center + vec2(0.0, -16.0),
            Align2::CENTER_CENTER,
            "Detector",
            FontId::proportional(10.0),
            Color32::from_rgba_unmultiplied(255, 255, 255, 230),
        );
        painter.text(
            center + vec2(0.0, 18.0),
            Align2::CENTER_CENTER,
            format!("S ≈ {:.2}", a),
            FontId::proportional(9.0),
            Color32::from_rgba_unmultiplied(200, 210, 255, 230),
        );
    }

    fn draw_matter_canvas(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        self.matter.set_bounds(rect.width(), rect.height());
        if let Some(phase) = self.matter.step() {
            log::debug!("phase transition complete: {:?}", phase);
        }
        self.lens = response
            .hover_pos()
            .map(|p| pos2(p.x - rect.left(), p.y - rect.top()));

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_rgb(8, 10, 18));

        let [pr, pg, pb] = self.matter.phase().color();
        let bonds = self.matter.bonds();
        let bond_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(pr, pg, pb, 77));
        for &(i, j) in &bonds {
            painter.line_segment(
                [
                    particle_center(rect, &self.matter, i),
                    particle_center(rect, &self.matter, j),
                ],
                bond_stroke,
            );
        }

        for p in self.matter.particles() {
            let alpha = ((0.6 + p.energy * 0.4).clamp(0.0, 1.0) * 255.0) as u8;
            painter.circle_filled(
                to_screen(rect, Point::new(p.x, p.y)) + vec2(PARTICLE_SIZE, PARTICLE_SIZE) / 2.0,
                PARTICLE_SIZE / 2.0,
                Color32::from_rgba_unmultiplied(pr, pg, pb, alpha),
            );
        }

        if let Some(lens) = self.lens {
            self.draw_lens(&painter, rect, lens, &bonds);
        }
    }

    /// Magnifying lens: particles and bonds re-drawn scaled about the lens
    /// center, clipped to the lens circle.
    fn draw_lens(&self, painter: &egui::Painter, rect: Rect, lens: Pos2, bonds: &[(usize, usize)]) {
        let center = pos2(rect.left() + lens.x, rect.top() + lens.y);
        painter.circle_filled(center, LENS_RADIUS, Color32::from_rgb(10, 12, 22));

        let magnify = |p: Pos2| -> Pos2 { center + (p - center) * LENS_ZOOM };
        let inside = |p: Pos2, slack: f32| (p - center).length() < LENS_RADIUS - slack;

        let [pr, pg, pb] = self.matter.phase().color();
        let bond_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(pr, pg, pb, 102));
        for &(i, j) in bonds {
            let a = magnify(particle_center(rect, &self.matter, i));
            let b = magnify(particle_center(rect, &self.matter, j));
            if inside(a, 2.0) && inside(b, 2.0) {
                painter.line_segment([a, b], bond_stroke);
            }
        }

        let radius = PARTICLE_SIZE / 2.0 * LENS_ZOOM;
        for p in self.matter.particles() {
            let m = magnify(
                to_screen(rect, Point::new(p.x, p.y)) + vec2(PARTICLE_SIZE, PARTICLE_SIZE) / 2.0,
            );
            if inside(m, radius) {
                let alpha = ((0.6 + p.energy * 0.4).clamp(0.0, 1.0) * 255.0) as u8;
                painter.circle_filled(m, radius, Color32::from_rgba_unmultiplied(pr, pg, pb, alpha));
            }
        }

        painter.circle_stroke(
            center,
            LENS_RADIUS,
            Stroke::new(2.0, Color32::from_rgba_unmultiplied(255, 255, 255, 90)),
        );
    }
}

fn to_screen(rect: Rect, p: Point) -> Pos2 {
    pos2(rect.left() + p.x, rect.top() + p.y)
}

fn particle_center(rect: Rect, matter: &ParticleField, i: usize) -> Pos2 {
    let p = &matter.particles()[i];
    to_screen(rect, Point::new(p.x, p.y)) + vec2(PARTICLE_SIZE, PARTICLE_SIZE) / 2.0
}

impl eframe::App for WaveLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt).min(0.1);

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(290.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_controls(ui);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.mode {
            Mode::Interference => self.draw_wave_canvas(ui, dt),
            Mode::PhasesOfMatter => self.draw_matter_canvas(ui),
        });

        ctx.request_repaint();
    }
}
