use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::color::Color;
use crate::pixel_buffer::{PixelPos, PixelRect};

/// The pixel writes produced by a stamp, a line or a whole gesture.
///
/// Keyed by position: inserting at a position that already holds a write
/// replaces it, and iteration follows position order rather than insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawData {
    writes: BTreeMap<PixelPos, Color>,
}

impl DrawData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: PixelPos, color: Color) {
        self.writes.insert(pos, color);
    }

    /// Merges `other` into `self`; writes from `other` win
    pub fn merge(&mut self, other: DrawData) {
        self.writes.extend(other.writes);
    }

    pub fn get(&self, pos: PixelPos) -> Option<Color> {
        self.writes.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PixelPos, Color> {
        self.writes.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = PixelPos> + '_ {
        self.writes.keys().copied()
    }

    /// Smallest rectangle covering every non-negative position
    pub fn bounds(&self) -> Option<PixelRect> {
        let mut iter = self.positions().filter(|p| p.x >= 0 && p.y >= 0);
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min = PixelPos::new(min.x.min(p.x), min.y.min(p.y));
            max = PixelPos::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(PixelRect::new(
            min.x as u32,
            min.y as u32,
            (max.x - min.x + 1) as u32,
            (max.y - min.y + 1) as u32,
        ))
    }
}

impl<'a> IntoIterator for &'a DrawData {
    type Item = (&'a PixelPos, &'a Color);
    type IntoIter = btree_map::Iter<'a, PixelPos, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.iter()
    }
}

impl FromIterator<(PixelPos, Color)> for DrawData {
    fn from_iter<T: IntoIterator<Item = (PixelPos, Color)>>(iter: T) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}
