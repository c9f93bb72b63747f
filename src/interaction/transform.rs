use eframe::egui::{Pos2, Rect, Vec2, vec2};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;

/// World to screen mapping: `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.translate).to_pos2()
    }

    pub fn to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.translate) / self.scale).to_pos2()
    }

    pub fn to_screen_length(&self, world: f32) -> f32 {
        world * self.scale
    }

    /// Multiplies the scale by `factor`, keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = anchor.to_vec2() - world.to_vec2() * self.scale;
    }

    pub fn pan(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.translate += delta;
        }
    }

    pub fn fit_canvas(&mut self, viewport: Rect, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 || viewport.width() <= 0.0 || viewport.height() <= 0.0 {
            return;
        }

        self.scale = (viewport.width() / width)
            .min(viewport.height() / height)
            .clamp(MIN_SCALE, MAX_SCALE);
        let world_center = vec2(width * 0.5, height * 0.5);
        self.translate = viewport.center().to_vec2() - world_center * self.scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
