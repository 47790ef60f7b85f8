use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::model::KitColorEntry;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const GREY: Rgb = Rgb::new(0x80, 0x80, 0x80);
    pub const WHITESMOKE: Rgb = Rgb::new(0xf5, 0xf5, 0xf5);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to the 0..=1 range used by PDF color operators.
    pub fn unit_components(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|value| f32::from(value) / 255.0)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if !hex.chars().all(|character| character.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{input}': expected hex digits"));
        }

        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|digit| [digit, digit]).collect::<String>(),
            6 => hex.to_string(),
            _ => {
                return Err(format!(
                    "invalid color '{input}': expected #RRGGBB or #RGB"
                ));
            }
        };

        let channel = |index: usize| {
            u8::from_str_radix(&expanded[index..index + 2], 16)
                .map_err(|err| format!("invalid color '{input}': {err}"))
        };

        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// One `NAME=COLOR` pair from the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KitColor {
    pub kit: String,
    pub color: Rgb,
}

pub fn parse_kit_color(input: &str) -> Result<KitColor, String> {
    let (kit, color) = input
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=COLOR, got '{input}'"))?;

    let kit = kit.trim();
    if kit.is_empty() {
        return Err(format!("missing kit name in '{input}'"));
    }

    Ok(KitColor {
        kit: kit.to_string(),
        color: color.parse()?,
    })
}

/// Background color per kit for one report. Kits without an entry render on white.
#[derive(Clone, Debug, Default)]
pub struct KitColorMap {
    colors: BTreeMap<String, Rgb>,
}

impl KitColorMap {
    /// Later pairs for the same kit replace earlier ones.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = KitColor>,
    {
        let colors = pairs
            .into_iter()
            .map(|pair| (pair.kit, pair.color))
            .collect::<BTreeMap<String, Rgb>>();
        Self { colors }
    }

    pub fn color_for(&self, kit: &str) -> Rgb {
        self.colors.get(kit).copied().unwrap_or(Rgb::WHITE)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn entries(&self) -> Vec<KitColorEntry> {
        self.colors
            .iter()
            .map(|(kit, color)| KitColorEntry {
                kit: kit.clone(),
                color: color.to_string(),
            })
            .collect()
    }
}
