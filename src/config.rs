// Configuration file, all measurements in world units (roughly one screen pixel at the look-at distance)
// Option names are the short query-style keys,
// so a RON file or `key=value` pairs can override any of them.

use std::path::Path;

use bevy::prelude::*;
use ron::extensions::Extensions;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const INITIAL_SEED: u64 = 1512086461918454205;

// reference viewport for particle counts, counts scale with sqrt of screen area
pub const REFERENCE_AREA: f32 = 1280.0 * 720.0;

// particle count bases at reference viewport and density 1.0
pub const ROAD_PARTICLE_BASE: f32 = 900.0;
pub const PEDESTRIAN_BASE: f32 = 360.0;
pub const RUNNER_BASE: f32 = 1200.0;
pub const BLOCK_PARTICLE_BASE: f32 = 2600.0;

// road layout
pub const ROAD_MAIN_WIDTH: f32 = 60.0;
pub const ROAD_GRID_WIDTH: f32 = 36.0;
pub const ROAD_OVERHANG: f32 = 400.0; // grid roads run past the world edge by this much

// target sampling
pub const ROAD_SAMPLE_STEP: f32 = 8.0;
pub const LANE_SPACING: f32 = 6.0;
pub const BLOCK_FILL_STEP: f32 = 7.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid option value: {0}")]
    InvalidOption(#[from] serde_json::Error),

    #[error("Invalid hex color: {0:?}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerMode {
    Scoop,
    Attract,
    Repel,
    Swirl,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RippleMode {
    Dot,
    Grad,
    Both,
}

impl RippleMode {
    pub fn dots(self) -> bool {
        matches!(self, RippleMode::Dot | RippleMode::Both)
    }

    pub fn band(self) -> bool {
        matches!(self, RippleMode::Grad | RippleMode::Both)
    }
}

// flags accept `true`/`false` as well as the 1/0 the query strings used
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0.0,
        Flag::Text(s) => s != "0" && !s.eq_ignore_ascii_case("false"),
    })
}

/// Immutable startup configuration, shared by reference with every component.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seed: u64,

    // palette
    pub primary: String,
    pub accent: String,
    pub hue: Option<f32>,
    pub sat: Option<f32>,
    pub lit: Option<f32>,

    // per-category density multipliers
    #[serde(rename = "denEdge")]
    pub den_edge: f32,
    #[serde(rename = "denRoad")]
    pub den_road: f32,
    #[serde(rename = "denPeople")]
    pub den_people: f32,
    #[serde(rename = "denBlock")]
    pub den_block: f32,
    #[serde(rename = "denGround")]
    pub den_ground: f32,
    pub rden: f32, // road target thinning
    pub bden: f32, // building target thinning

    // drifter motion
    pub flow: f32,
    pub fnoise: f32,
    pub turb: f32,
    pub gust: f32,
    pub jump: f32,

    // plane wave
    #[serde(deserialize_with = "de_flag")]
    pub wave: bool,
    pub wlambda: f32,
    pub wspeed: f32,
    pub wdir: f32, // degrees
    pub wpush: f32,
    pub wdepth: f32,

    // ripples
    #[serde(deserialize_with = "de_flag")]
    pub ripple: bool,
    pub rmode: RippleMode,
    pub rmax: usize,
    pub remit: f32,
    pub rspeed: f32,
    pub rspeed_auto: f32,
    pub rthick: f32,
    pub rsegs: usize,
    pub rjit: f32,
    pub ralpha: f32,
    pub ralpha_auto: f32,
    pub hubrate: f32,

    // pointer dynamics
    #[serde(deserialize_with = "de_flag")]
    pub mint: bool,
    pub mmode: PointerMode,
    pub mr: f32,
    pub ms: f32,
    pub msw: f32,
    pub mboost: f32,
    pub mpulse: f32,

    // edge runners
    pub ering: f32,
    pub erjit: f32,
    pub erstep: f32,
    pub ersizeh: f32,
    pub ersizev: f32,
    pub eralpha: f32,
    pub ertwinkle: f32,

    // ground scatter
    pub gstep: f32,
    pub gmin: f32,
    pub gsize: f32,
    pub gjit: f32,
    pub gshrink: f32,
    pub ggamma: f32,
    pub galpha: f32,

    // world and grid
    #[serde(rename = "worldW")]
    pub world_w: f32,
    #[serde(rename = "worldH")]
    pub world_h: f32,
    #[serde(rename = "gridX")]
    pub grid_x: f32,
    #[serde(rename = "gridY")]
    pub grid_y: f32,
    pub fill: f32, // building fill probability per grid cell
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: INITIAL_SEED,
            primary: "#FFD400".to_string(),
            accent: "#F9DE83".to_string(),
            hue: None,
            sat: None,
            lit: None,
            den_edge: 1.6,
            den_road: 0.26,
            den_people: 0.28,
            den_block: 0.1,
            den_ground: 0.7,
            rden: 1.0,
            bden: 0.5,
            flow: 1.0,
            fnoise: 0.1,
            turb: 1.0,
            gust: 2.0,
            jump: 0.004,
            wave: true,
            wlambda: 420.0,
            wspeed: 0.35,
            wdir: 20.0,
            wpush: 0.12,
            wdepth: 0.8,
            ripple: true,
            rmode: RippleMode::Both,
            rmax: 40,
            remit: 0.4,
            rspeed: 20.0,
            rspeed_auto: 3.0,
            rthick: 28.0,
            rsegs: 128,
            rjit: 2.0,
            ralpha: 1.2,
            ralpha_auto: 0.8,
            hubrate: 0.55,
            mint: true,
            mmode: PointerMode::Hybrid,
            mr: 360.0,
            ms: -0.5,
            msw: 0.8,
            mboost: 0.6,
            mpulse: 1.2,
            ering: 6.0,
            erjit: 1.0,
            erstep: 1.05,
            ersizeh: 2.8,
            ersizev: 2.3,
            eralpha: 0.95,
            ertwinkle: 0.35,
            gstep: 14.0,
            gmin: 1.0,
            gsize: 2.5,
            gjit: 0.25,
            gshrink: 1.0,
            ggamma: 0.2,
            galpha: 1.0,
            world_w: 1600.0,
            world_h: 2200.0,
            grid_x: 220.0,
            grid_y: 200.0,
            fill: 0.92,
        }
    }
}

impl Config {
    /// Loads options from a RON file, e.g. `(denEdge: 2.0, rmode: dot, mmode: swirl)`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Palette overrides may be written bare (`hue: 215.0`) as well as `Some(215.0)`.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)?;
        Ok(config.sanitized())
    }

    /// Builds a config from flat `key=value` pairs.
    /// Unknown keys are ignored, missing keys keep their defaults.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::default().with_pairs(pairs)
    }

    /// Overrides options of this config with `key=value` pairs.
    pub fn with_pairs<'a, I>(self, pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut value = serde_json::to_value(&self)?;
        if let serde_json::Value::Object(map) = &mut value {
            for (key, raw) in pairs {
                map.insert(key.to_string(), option_value(raw));
            }
        }
        let config: Config = serde_json::from_value(value)?;
        Ok(config.sanitized())
    }

    /// Command line: an optional RON file, then `key=value` overrides.
    /// An argument may hold several pairs joined query style, e.g. `?hue=215&rmode=dot`.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let (pairs, paths): (Vec<String>, Vec<String>) = args.into_iter().partition(|a| a.contains('='));
        let base = match paths.first() {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.with_pairs(
            pairs
                .iter()
                .flat_map(|arg| arg.trim_start_matches('?').split('&'))
                .filter_map(|pair| pair.split_once('=')),
        )
    }

    /// Clamps out-of-range values to safe minimums so the scene always renders something.
    pub fn sanitized(mut self) -> Self {
        self.den_edge = at_least("denEdge", self.den_edge, 0.0);
        self.den_road = at_least("denRoad", self.den_road, 0.0);
        self.den_people = at_least("denPeople", self.den_people, 0.0);
        self.den_block = at_least("denBlock", self.den_block, 0.0);
        self.den_ground = at_least("denGround", self.den_ground, 0.0);
        self.rden = within("rden", self.rden, 0.0, 1.0);
        self.bden = within("bden", self.bden, 0.0, 1.0);
        self.jump = within("jump", self.jump, 0.0, 1.0);
        self.remit = within("remit", self.remit, 0.0, 1.0);
        self.hubrate = within("hubrate", self.hubrate, 0.0, 1.0);
        self.fill = within("fill", self.fill, 0.0, 1.0);
        self.wlambda = at_least("wlambda", self.wlambda, 1.0);
        self.mr = at_least("mr", self.mr, 1.0);
        self.rmax = self.rmax.max(1);
        self.rsegs = self.rsegs.max(1);
        self.gstep = at_least("gstep", self.gstep, 1.0);
        self.gmin = at_least("gmin", self.gmin, 1.0);
        self.gshrink = within("gshrink", self.gshrink, 0.0, 1.0);
        self.world_w = at_least("worldW", self.world_w, 1.0);
        self.world_h = at_least("worldH", self.world_h, 1.0);
        self.grid_x = at_least("gridX", self.grid_x, 1.0);
        self.grid_y = at_least("gridY", self.grid_y, 1.0);
        self
    }

    pub fn world_extent(&self) -> Vec2 {
        Vec2::new(self.world_w, self.world_h)
    }

    pub fn grid_spacing(&self) -> Vec2 {
        Vec2::new(self.grid_x, self.grid_y)
    }

    pub fn world_diagonal(&self) -> f32 {
        self.world_extent().length()
    }

    /// Unit direction the plane wave travels in.
    pub fn wave_direction(&self) -> Vec2 {
        Vec2::from_angle(self.wdir.to_radians())
    }
}

fn option_value(raw: &str) -> serde_json::Value {
    let raw = raw.trim();
    if let Ok(b) = raw.parse::<bool>() {
        return serde_json::Value::Bool(b);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return serde_json::Value::from(n);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return serde_json::Value::Number(n);
    }
    serde_json::Value::String(raw.to_string())
}

fn at_least(name: &str, value: f32, min: f32) -> f32 {
    within(name, value, min, f32::MAX)
}

fn within(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        warn!("option {name} is not finite, using {min}");
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("option {name}={value} out of range, clamped to {clamped}");
    }
    clamped
}
