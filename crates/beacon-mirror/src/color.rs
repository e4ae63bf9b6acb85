// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Agent colors: palette indices or explicit RGBA, packed to ARGB for the
//! renderer's per-pixel lookups.

use serde::{Deserialize, Serialize};

/// Width of the palette index space; indices wrap modulo this value.
pub const PALETTE_SPAN: f64 = 140.0;

/// Base hues at shade 5 of each band of ten palette indices.
const BASE_HUES: [[u8; 3]; 14] = [
    [141, 141, 141], // gray
    [215, 50, 41],   // red
    [241, 105, 19],  // orange
    [156, 109, 70],  // brown
    [237, 237, 47],  // yellow
    [87, 176, 58],   // green
    [42, 209, 57],   // lime
    [27, 158, 119],  // turquoise
    [82, 196, 196],  // cyan
    [43, 140, 190],  // sky
    [52, 93, 169],   // blue
    [124, 80, 164],  // violet
    [167, 27, 106],  // magenta
    [224, 127, 150], // pink
];

/// Color as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentColor {
    /// Palette index in `[0, 140)`; out-of-range values wrap.
    Indexed(f64),
    /// Explicit red, green, blue, alpha.
    Rgba([u8; 4]),
}

impl Default for AgentColor {
    fn default() -> Self {
        Self::Indexed(0.0)
    }
}

impl AgentColor {
    /// Opaque color from red, green, blue.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgba([r, g, b, 255])
    }

    /// Resolve to `[r, g, b, a]`.
    pub fn to_rgba(self) -> [u8; 4] {
        match self {
            Self::Rgba(rgba) => rgba,
            Self::Indexed(index) => {
                let [r, g, b] = shade(index);
                [r, g, b, 255]
            }
        }
    }

    /// Resolve to a packed `0xAARRGGBB` word.
    pub fn to_argb(self) -> u32 {
        let [r, g, b, a] = self.to_rgba();
        u32::from_be_bytes([a, r, g, b])
    }
}

fn shade(index: f64) -> [u8; 3] {
    let index = if index.is_finite() {
        index.rem_euclid(PALETTE_SPAN)
    } else {
        0.0
    };
    let band_floor = (index / 10.0).floor();
    let step = index - band_floor * 10.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let band = (band_floor as usize).min(BASE_HUES.len() - 1);
    let base = BASE_HUES[band];
    let channel = |c: u8| -> u8 {
        let c = f64::from(c);
        let out = if step < 5.0 {
            c * step / 5.0
        } else {
            c + (255.0 - c) * (step - 5.0) / 5.0
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let out = out.round().clamp(0.0, 255.0) as u8;
        out
    };
    [channel(base[0]), channel(base[1]), channel(base[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_black_and_band_centers_are_base_hues() {
        assert_eq!(AgentColor::Indexed(0.0).to_rgba(), [0, 0, 0, 255]);
        assert_eq!(AgentColor::Indexed(15.0).to_rgba(), [215, 50, 41, 255]);
        assert_eq!(AgentColor::Indexed(105.0).to_rgba(), [52, 93, 169, 255]);
    }

    #[test]
    fn indices_wrap_around_the_palette() {
        assert_eq!(
            AgentColor::Indexed(155.0).to_rgba(),
            AgentColor::Indexed(15.0).to_rgba()
        );
        assert_eq!(
            AgentColor::Indexed(-125.0).to_rgba(),
            AgentColor::Indexed(15.0).to_rgba()
        );
        assert_eq!(AgentColor::Indexed(f64::NAN).to_rgba(), [0, 0, 0, 255]);
    }

    #[test]
    fn upper_shades_lighten_toward_white() {
        let [r, g, b, _] = AgentColor::Indexed(9.9).to_rgba();
        assert!(r > 245 && g > 245 && b > 245);
    }

    #[test]
    fn argb_packs_alpha_first() {
        let c = AgentColor::Rgba([0x11, 0x22, 0x33, 0x44]);
        assert_eq!(c.to_argb(), 0x4411_2233);
        assert_eq!(AgentColor::rgb(255, 0, 0).to_argb(), 0xFFFF_0000);
    }
}
