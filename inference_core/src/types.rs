//! Fundamental types shared by the predictor, the query layer and metrics.

use floor_model::{AnchorId, DetectorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Id carried by particles that stand for no real object.
    pub const SYNTHETIC: ObjectId = ObjectId(-1);
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// One timestep of one object's sensor output: the detector that saw it, or a miss.
pub type Reading = Option<DetectorId>;

/// Predicted occupancy: object id → probability mass.
pub type Occupancy = BTreeMap<ObjectId, f64>;

// ---------------------------------------------------------------------------
// AnchorMap
// ---------------------------------------------------------------------------

/// Probability mass per anchor per object.
///
/// One successful prediction for one object adds a total mass of 1 spread
/// over the anchors its particles ended on.
#[derive(Clone, Debug, Default)]
pub struct AnchorMap {
    mass: BTreeMap<AnchorId, Occupancy>,
}

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, anchor: AnchorId, object: ObjectId, mass: f64) {
        *self
            .mass
            .entry(anchor)
            .or_default()
            .entry(object)
            .or_insert(0.0) += mass;
    }

    pub fn get(&self, anchor: AnchorId) -> Option<&Occupancy> {
        self.mass.get(&anchor)
    }

    /// Mass of `object` summed over every anchor.
    pub fn total_mass(&self, object: ObjectId) -> f64 {
        self.mass.values().filter_map(|m| m.get(&object)).sum()
    }

    /// Sum the mass of every listed anchor per object.
    pub fn accumulate<'a, I>(&self, anchors: I) -> Occupancy
    where
        I: IntoIterator<Item = &'a AnchorId>,
    {
        let mut occupancy = Occupancy::new();
        for anchor in anchors {
            if let Some(objects) = self.mass.get(anchor) {
                for (&object, &mass) in objects {
                    *occupancy.entry(object).or_insert(0.0) += mass;
                }
            }
        }
        occupancy
    }

    /// Number of anchors holding any mass.
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn clear(&mut self) {
        self.mass.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn accumulate_sums_mass_across_anchors() {
        let mut map = AnchorMap::new();
        map.add(AnchorId(1), ObjectId(7), 0.25);
        map.add(AnchorId(2), ObjectId(7), 0.5);
        map.add(AnchorId(2), ObjectId(8), 1.0);
        map.add(AnchorId(3), ObjectId(7), 0.25);

        let occ = map.accumulate(&[AnchorId(1), AnchorId(2), AnchorId(9)]);
        assert_abs_diff_eq!(occ[&ObjectId(7)], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(occ[&ObjectId(8)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(map.total_mass(ObjectId(7)), 1.0, epsilon = 1e-12);
    }
}
