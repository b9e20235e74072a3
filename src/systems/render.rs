// colors and the 2d draw sink every population paints through
use bevy::prelude::*;
use bevy_egui::egui;

use crate::config::{Config, ConfigError};

/// Hue in degrees, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let srgba = Srgba::hex(hex).map_err(|_| ConfigError::InvalidColor(hex.to_string()))?;
        let hsla = Hsla::from(srgba);
        Ok(Self::new(hsla.hue, hsla.saturation * 100.0, hsla.lightness * 100.0))
    }

    // saturation scaled, lightness shifted, both kept within [0, 100]
    fn tone(self, sat_scale: f32, lit_shift: f32) -> Self {
        Self::new(
            self.h,
            (self.s * sat_scale).clamp(0.0, 100.0),
            (self.l + lit_shift).clamp(0.0, 100.0),
        )
    }

    pub fn to_color32(self, alpha: f32) -> egui::Color32 {
        let c = Color::hsla(self.h, self.s / 100.0, self.l / 100.0, alpha.clamp(0.0, 1.0)).to_srgba();
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        egui::Color32::from_rgba_unmultiplied(byte(c.red), byte(c.green), byte(c.blue), byte(c.alpha))
    }
}

/// Every color the scene uses, derived once from the primary and accent colors.
#[derive(Clone, Debug)]
pub struct Palette {
    pub hue: f32,
    pub sat: f32,
    pub lit: f32,
    pub road: [Hsl; 2],
    pub people: Hsl,
    pub block: Hsl,
    pub ground: [Hsl; 2],
    pub ripple_dot: Hsl,
    pub ripple_ring: Hsl,
    world_h: f32,
}

impl Palette {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let primary = Hsl::from_hex(&config.primary)?;
        let accent = Hsl::from_hex(&config.accent)?;
        let hue = config.hue.unwrap_or(primary.h);

        Ok(Self {
            hue,
            sat: config.sat.unwrap_or(primary.s),
            lit: config.lit.unwrap_or(primary.l + 8.0),
            road: [primary, accent],
            people: accent.tone(0.85, -10.0),
            block: Hsl::new(hue, 70.0, 45.0),
            ground: [primary.tone(0.92, 4.0), accent.tone(0.98, 6.0)],
            ripple_dot: primary.tone(0.9, 20.0),
            ripple_ring: primary.tone(0.8, 15.0),
            world_h: config.world_h,
        })
    }

    /// Higher points and points further up the world read slightly lighter.
    pub fn depth_lightness(&self, z: f32, y: f32) -> f32 {
        let tz = (z / 600.0).clamp(0.0, 1.0);
        let ty = ((y + self.world_h * 0.6) / (self.world_h * 1.3)).clamp(0.0, 1.0);
        (self.lit + tz * 6.0 + ty * 4.0).clamp(40.0, 75.0)
    }

    pub fn runner_core(&self, z: f32, y: f32) -> Hsl {
        Hsl::new(self.hue, self.sat, self.depth_lightness(z, y))
    }

    pub fn runner_halo(&self, z: f32, y: f32) -> Hsl {
        Hsl::new(self.hue, self.sat * 0.9, (self.depth_lightness(z, y) + 12.0).min(95.0))
    }
}

/// Immediate-mode 2d drawing in screen coordinates.
pub trait DrawSink {
    fn set_fill(&mut self, color: Hsl, alpha: f32);
    fn disc(&mut self, x: f32, y: f32, diameter: f32);
    fn set_stroke(&mut self, color: Hsl, alpha: f32, weight: f32);
    fn circle_outline(&mut self, x: f32, y: f32, diameter: f32);
}

/// Paints onto an egui layer.
pub struct EguiSink {
    painter: egui::Painter,
    fill: egui::Color32,
    stroke: egui::Stroke,
}

impl EguiSink {
    pub fn new(painter: egui::Painter) -> Self {
        Self {
            painter,
            fill: egui::Color32::TRANSPARENT,
            stroke: egui::Stroke::NONE,
        }
    }
}

impl DrawSink for EguiSink {
    fn set_fill(&mut self, color: Hsl, alpha: f32) {
        self.fill = color.to_color32(alpha);
    }

    fn disc(&mut self, x: f32, y: f32, diameter: f32) {
        self.painter.circle_filled(egui::pos2(x, y), diameter * 0.5, self.fill);
    }

    fn set_stroke(&mut self, color: Hsl, alpha: f32, weight: f32) {
        self.stroke = egui::Stroke::new(weight, color.to_color32(alpha));
    }

    fn circle_outline(&mut self, x: f32, y: f32, diameter: f32) {
        self.painter.circle_stroke(egui::pos2(x, y), diameter * 0.5, self.stroke);
    }
}

#[cfg(test)]
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Fill(Hsl, f32),
    Disc(f32, f32, f32),
    Stroke(Hsl, f32, f32),
    Outline(f32, f32, f32),
}

/// Records every call, for tests.
#[cfg(test)]
#[derive(Default, Debug)]
pub struct RecordingSink {
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn discs(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Disc(..))).count()
    }

    pub fn outlines(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Outline(..))).count()
    }

    /// True if every coordinate, size and alpha passed in is finite.
    pub fn all_finite(&self) -> bool {
        self.calls.iter().all(|c| match *c {
            DrawCall::Fill(color, a) => a.is_finite() && color.h.is_finite() && color.l.is_finite(),
            DrawCall::Stroke(_, a, w) => a.is_finite() && w.is_finite(),
            DrawCall::Disc(x, y, d) | DrawCall::Outline(x, y, d) => x.is_finite() && y.is_finite() && d.is_finite(),
        })
    }
}

#[cfg(test)]
impl DrawSink for RecordingSink {
    fn set_fill(&mut self, color: Hsl, alpha: f32) {
        self.calls.push(DrawCall::Fill(color, alpha));
    }

    fn disc(&mut self, x: f32, y: f32, diameter: f32) {
        self.calls.push(DrawCall::Disc(x, y, diameter));
    }

    fn set_stroke(&mut self, color: Hsl, alpha: f32, weight: f32) {
        self.calls.push(DrawCall::Stroke(color, alpha, weight));
    }

    fn circle_outline(&mut self, x: f32, y: f32, diameter: f32) {
        self.calls.push(DrawCall::Outline(x, y, diameter));
    }
}
