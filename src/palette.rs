use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A named list of swatches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    colors: Vec<Color>,
}

impl Default for Palette {
    /// The 16-color palette new documents start with
    fn default() -> Self {
        const SWATCHES: [[u8; 3]; 16] = [
            [0x00, 0x00, 0x00],
            [0x1d, 0x2b, 0x53],
            [0x7e, 0x25, 0x53],
            [0x00, 0x87, 0x51],
            [0xab, 0x52, 0x36],
            [0x5f, 0x57, 0x4f],
            [0xc2, 0xc3, 0xc7],
            [0xff, 0xf1, 0xe8],
            [0xff, 0x00, 0x4d],
            [0xff, 0xa3, 0x00],
            [0xff, 0xec, 0x27],
            [0x00, 0xe4, 0x36],
            [0x29, 0xad, 0xff],
            [0x83, 0x76, 0x9c],
            [0xff, 0x77, 0xa8],
            [0xff, 0xcc, 0xaa],
        ];
        Self {
            name: "Default".to_owned(),
            colors: SWATCHES
                .iter()
                .map(|[r, g, b]| Color::from_rgba8([*r, *g, *b, 0xff]))
                .collect(),
        }
    }
}

impl Palette {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            colors: Vec::new(),
        }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Appends `color` unless it is already present; returns its index
    pub fn add(&mut self, color: Color) -> usize {
        if let Some(index) = self.colors.iter().position(|c| *c == color) {
            return index;
        }
        self.colors.push(color);
        self.colors.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Color> {
        (index < self.colors.len()).then(|| self.colors.remove(index))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 16);
        assert_eq!(palette.get(0), Some(Color::BLACK));
        assert!(palette.colors().iter().all(|c| c.a == 1.0));
    }

    #[test]
    fn test_add_deduplicates() {
        let mut palette = Palette::new("test");
        assert_eq!(palette.add(Color::RED), 0);
        assert_eq!(palette.add(Color::BLUE), 1);
        assert_eq!(palette.add(Color::RED), 0);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut palette = Palette::new("test");
        palette.add(Color::RED);
        assert_eq!(palette.remove(3), None);
        assert_eq!(palette.remove(0), Some(Color::RED));
        assert!(palette.is_empty());
    }
}
