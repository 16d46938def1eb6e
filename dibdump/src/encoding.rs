use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Bitmap, DibErr, Result, Rgb};

/// How the pixels of a bitmap map to perceptron activations.
///
/// Every channel value `c` becomes the activation `c / 255`, going back the activations are
/// clamped to `[0, 1]`, scaled by 255 and rounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelEncoding {
    /// One activation per pixel, its Rec. 601 luma.
    #[default]
    Gray,
    /// Three activations per pixel in red, green, blue order.
    Rgb,
}

impl PixelEncoding {
    /// The amount of activations per pixel.
    pub fn channels(&self) -> usize {
        match self {
            PixelEncoding::Gray => 1,
            PixelEncoding::Rgb => 3,
        }
    }

    /// Returns the amount of activations a `width` by `height` image encodes to.
    pub fn activations(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.channels()
    }

    /// Encodes every pixel of `bitmap`, top row first.
    pub fn encode(&self, bitmap: &Bitmap) -> Vec<f32> {
        let pixels = bitmap.pixels();

        match self {
            PixelEncoding::Gray => pixels.iter().map(|&px| luma(px) / 255.).collect(),
            PixelEncoding::Rgb => pixels
                .iter()
                .flat_map(|px| [px.r, px.g, px.b])
                .map(|c| c as f32 / 255.)
                .collect(),
        }
    }

    /// Decodes `activations` into a `width` by `height` bitmap.
    ///
    /// # Returns
    /// The bitmap or an error if the amount of activations doesn't fill the image exactly.
    pub fn decode(&self, width: u32, height: u32, activations: &[f32]) -> Result<Bitmap> {
        let expected = self.activations(width, height);
        if activations.len() != expected {
            return Err(DibErr::ActivationCount {
                got: activations.len(),
                expected,
            });
        }

        let pixels = match self {
            PixelEncoding::Gray => activations.iter().map(|&a| Rgb::gray(level(a))).collect(),
            PixelEncoding::Rgb => activations
                .chunks_exact(3)
                .map(|c| Rgb::new(level(c[0]), level(c[1]), level(c[2])))
                .collect(),
        };

        Bitmap::new(width, height, pixels)
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelEncoding::Gray => write!(f, "gray"),
            PixelEncoding::Rgb => write!(f, "rgb"),
        }
    }
}

impl FromStr for PixelEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(PixelEncoding::Gray),
            "rgb" => Ok(PixelEncoding::Rgb),
            other => Err(format!("unknown pixel encoding {other:?}, expected gray or rgb")),
        }
    }
}

fn luma(px: Rgb) -> f32 {
    0.299 * px.r as f32 + 0.587 * px.g as f32 + 0.114 * px.b as f32
}

/// Maps an activation back to a channel value, NaN goes to 0.
fn level(a: f32) -> u8 {
    if a.is_nan() {
        return 0;
    }

    (a.clamp(0., 1.) * 255.).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_uses_luma() {
        let bitmap = Bitmap::new(
            3,
            1,
            vec![Rgb::gray(255), Rgb::new(255, 0, 0), Rgb::gray(0)],
        )
        .unwrap();

        let activations = PixelEncoding::Gray.encode(&bitmap);
        assert_eq!(activations.len(), 3);
        assert!((activations[0] - 1.).abs() < 1e-5);
        assert!((activations[1] - 0.299).abs() < 1e-5);
        assert_eq!(activations[2], 0.);
    }

    #[test]
    fn rgb_keeps_channel_order() {
        let bitmap = Bitmap::new(1, 1, vec![Rgb::new(255, 51, 0)]).unwrap();

        assert_eq!(PixelEncoding::Rgb.encode(&bitmap), vec![1., 0.2, 0.]);
    }

    #[test]
    fn decode_clamps_and_rounds() {
        let bitmap = PixelEncoding::Gray
            .decode(2, 2, &[-0.5, 0.5, 1.7, f32::NAN])
            .unwrap();

        let levels: Vec<u8> = bitmap.pixels().iter().map(|px| px.r).collect();
        assert_eq!(levels, vec![0, 128, 255, 0]);
        assert!(bitmap.pixels().iter().all(|px| px.r == px.g && px.g == px.b));
    }

    #[test]
    fn decode_rgb_groups_three_activations_per_pixel() {
        let bitmap = PixelEncoding::Rgb
            .decode(2, 1, &[1., 0., 0., 0., 0., 1.])
            .unwrap();

        assert_eq!(bitmap.pixels(), &[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
    }

    #[test]
    fn decode_needs_exact_activation_count() {
        let err = PixelEncoding::Rgb.decode(2, 1, &[0.; 5]).unwrap_err();

        assert!(matches!(
            err,
            DibErr::ActivationCount {
                got: 5,
                expected: 6
            }
        ));
    }

    #[test]
    fn encodings_parse_and_serialize_by_name() {
        assert_eq!("RGB".parse::<PixelEncoding>(), Ok(PixelEncoding::Rgb));
        assert_eq!("gray".parse::<PixelEncoding>(), Ok(PixelEncoding::Gray));
        assert!("cmyk".parse::<PixelEncoding>().is_err());
        assert_eq!(PixelEncoding::Rgb.to_string(), "rgb");
    }
}
