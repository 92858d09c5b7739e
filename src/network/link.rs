use serde::{Deserialize, Serialize};

/// Width the controller uses for UE → neighbour cell measurements.
pub const NEIGHBOR_CELL_WIDTH: f32 = 4.0;

const DEFAULT_LINK_WIDTH: f32 = 2.0;

/// A link as it appears in `graphData.links`; `src`/`dst` are surrogate node
/// ids of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLink {
    pub src: u64,
    pub dst: u64,
    #[serde(default)]
    pub rsrp: Option<f64>,
    #[serde(default)]
    pub rsrq: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GRAY: Rgb = Rgb(128, 128, 128);

    /// Parse the handful of CSS colour names the controller emits, plus
    /// `#rgb` / `#rrggbb`. Unknown names fall back to gray.
    pub fn parse_css(value: &str) -> Rgb {
        let value = value.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex).unwrap_or(Self::GRAY);
        }
        match value.as_str() {
            "black" => Rgb(0, 0, 0),
            "white" => Rgb(255, 255, 255),
            "orange" => Rgb(255, 165, 0),
            "red" => Rgb(255, 0, 0),
            "green" => Rgb(0, 128, 0),
            "blue" => Rgb(0, 0, 255),
            "yellow" => Rgb(255, 255, 0),
            "purple" => Rgb(128, 0, 128),
            "gray" | "grey" => Self::GRAY,
            _ => Self::GRAY,
        }
    }

    fn parse_hex(hex: &str) -> Option<Rgb> {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                let short = |s: &str| channel(s).map(|v| v * 17);
                Some(Rgb(short(&hex[0..1])?, short(&hex[1..2])?, short(&hex[2..3])?))
            }
            _ => None,
        }
    }
}

/// A resolved link of the live graph. `source` and `target` index into
/// `NetworkGraph::nodes` and are only valid for the snapshot they were built
/// from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub rsrp: Option<f64>,
    pub rsrq: Option<f64>,
    pub color: Rgb,
    pub width: f32,
}

impl Link {
    pub fn new(source: usize, target: usize, wire: WireLink) -> Self {
        Self {
            source,
            target,
            rsrp: wire.rsrp,
            rsrq: wire.rsrq,
            color: wire.color.as_deref().map(Rgb::parse_css).unwrap_or(Rgb::GRAY),
            width: wire.width.unwrap_or(DEFAULT_LINK_WIDTH),
        }
    }

    pub fn is_neighbor_cell(&self) -> bool {
        (self.width - NEIGHBOR_CELL_WIDTH).abs() < f32::EPSILON
    }
}
