//! RGBA colours with CSS string parsing.

use std::fmt;

/// Linear RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

/// Error returned when a CSS colour string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS colour: {0}")]
pub struct ParseColorError(pub String);

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);

    pub const fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// Builds a colour from 8-bit channels.
    pub fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            red: f32::from(r) / 255.0,
            green: f32::from(g) / 255.0,
            blue: f32::from(b) / 255.0,
            alpha: f32::from(a) / 255.0,
        }
    }

    /// Returns a copy with the given alpha.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Returns `[r, g, b, a]` as bytes, rounding each channel.
    pub fn to_bytes(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.red), q(self.green), q(self.blue), q(self.alpha)]
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
    /// or one of a handful of named colours.
    pub fn from_css_color_string(s: &str) -> Result<Self, ParseColorError> {
        let input = s.trim().to_ascii_lowercase();
        let err = || ParseColorError(s.to_string());

        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }
        if let Some(body) = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))
        {
            let body = body.strip_suffix(')').ok_or_else(err)?;
            return parse_rgb_function(body).ok_or_else(err);
        }
        named(&input).ok_or_else(err)
    }
}

impl fmt::Display for Color {
    /// Formats as `#rrggbb`, appending alpha only when not opaque.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_bytes();
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize, width: usize| -> Option<u8> {
        let v = u8::from_str_radix(hex.get(i * width..(i + 1) * width)?, 16).ok()?;
        // #abc expands each nibble: a -> aa
        Some(if width == 1 { v * 17 } else { v })
    };
    match hex.len() {
        3 => Some(Color::from_bytes(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 255)),
        6 => Some(Color::from_bytes(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 255)),
        8 => Some(Color::from_bytes(
            channel(0, 2)?,
            channel(1, 2)?,
            channel(2, 2)?,
            channel(3, 2)?,
        )),
        _ => None,
    }
}

fn parse_rgb_function(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = part.parse::<u8>().ok()?;
    }
    let alpha = match parts.get(3) {
        Some(a) => {
            let a: f32 = a.parse().ok()?;
            if !(0.0..=1.0).contains(&a) {
                return None;
            }
            a
        }
        None => 1.0,
    };
    Some(Color::from_bytes(rgb[0], rgb[1], rgb[2], 255).with_alpha(alpha))
}

fn named(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Color::from_bytes(r, g, b, 255))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        let c = Color::from_css_color_string("#00ff66").unwrap();
        assert_eq!(c.to_bytes(), [0x00, 0xff, 0x66, 0xff]);
    }

    #[test]
    fn parses_short_hex_and_alpha_hex() {
        assert_eq!(
            Color::from_css_color_string("#0f6").unwrap().to_bytes(),
            [0x00, 0xff, 0x66, 0xff]
        );
        assert_eq!(
            Color::from_css_color_string("#11223380").unwrap().to_bytes(),
            [0x11, 0x22, 0x33, 0x80]
        );
    }

    #[test]
    fn parses_rgb_functions_and_names() {
        assert_eq!(
            Color::from_css_color_string("rgb(10, 20, 30)").unwrap().to_bytes(),
            [10, 20, 30, 255]
        );
        let c = Color::from_css_color_string("rgba(10,20,30,0.5)").unwrap();
        assert!((c.alpha - 0.5).abs() < f32::EPSILON);
        assert_eq!(Color::from_css_color_string(" Yellow ").unwrap(), Color::YELLOW);
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", "#12", "#gggggg", "rgb(1,2)", "rgb(300,0,0)", "chartreuse-ish"] {
            assert!(Color::from_css_color_string(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn with_alpha_keeps_channels() {
        let c = Color::BLACK.with_alpha(0.4);
        assert_eq!(c.red, 0.0);
        assert!((c.alpha - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Color::from_bytes(0, 255, 102, 255).to_string(), "#00ff66");
        assert_eq!(Color::from_bytes(0, 255, 102, 242).to_string(), "#00ff66f2");
    }
}
