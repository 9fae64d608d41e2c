//! Group and per-object visibility

use super::{ObjectsBucket, ShaderVariant};
use crate::render::bounds::Bounds;
use crate::render::culling::CullTest;

/// Cached union of a static bucket's indexed-geometry bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Aggregate {
    /// Member bounds changed since the last fold
    Stale,
    /// No indexed geometry to fold
    Empty,
    Bounds(Bounds),
}

impl ObjectsBucket {
    /// Union of the world bounds of all indexed objects, folded lazily.
    ///
    /// `None` when the bucket holds no indexed geometry.
    pub fn aggregate_bounds(&mut self) -> Option<Bounds> {
        if self.aggregate == Aggregate::Stale {
            self.aggregate = self
                .objects
                .iter()
                .filter(|slot| slot.geometry.is_indexed())
                .map(|slot| slot.bounds)
                .reduce(|mut acc, b| {
                    acc.merge(&b);
                    acc
                })
                .map_or(Aggregate::Empty, Aggregate::Bounds);
        }

        match self.aggregate {
            Aggregate::Bounds(b) => Some(b),
            Aggregate::Stale | Aggregate::Empty => None,
        }
    }

    /// Whether the bucket as a whole may be visible.
    ///
    /// Only static buckets are tested as a group; the others move too often
    /// for a cached union to pay off.
    fn group_visibility(&mut self, cull: &dyn CullTest) -> bool {
        if self.variant != ShaderVariant::Static {
            return true;
        }
        self.aggregate_bounds().map_or(true, |b| cull.is_visible(&b))
    }

    /// Rebuild the visible list for this frame.
    ///
    /// Morph objects are kept regardless of their bounds since their
    /// vertices are deformed after the bounds were set.
    pub fn visibility_pass(&mut self, cull: &dyn CullTest) {
        self.visible.clear();
        if !self.group_visibility(cull) {
            return;
        }

        for (index, slot) in self.objects.iter().enumerate() {
            if slot.geometry.is_none() {
                continue;
            }
            if slot.geometry.is_morph() || cull.is_visible(&slot.bounds) {
                self.visible.push(index);
            }
        }
    }

    /// Ids in the current visible list, in storage order
    pub fn visible(&self) -> impl Iterator<Item = super::ObjectId> + '_ {
        self.visible.iter().map(|&index| super::ObjectId(index))
    }
}
