use std::f32::consts::TAU;

/// How rotation angles are compared when diffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationCompare {
    /// Angular distance along the shorter arc, so `-π` and `π` are equal
    ShortestArc,
    /// Plain absolute difference of the raw values
    Raw,
}

impl RotationCompare {
    pub fn distance(&self, a: f32, b: f32) -> f32 {
        match self {
            RotationCompare::Raw => (a - b).abs(),
            RotationCompare::ShortestArc => {
                let turn = (a - b).rem_euclid(TAU);
                turn.min(TAU - turn)
            }
        }
    }
}

/// Contains config properties which will be used by the snapshot differ
#[derive(Clone, Debug)]
pub struct DiffConfig {
    /// Minimum change, absolute for scalars and Euclidean for vectors, for a
    /// field to be included in a delta
    pub tolerance: f32,
    /// Comparison used for rotation fields
    pub rotation: RotationCompare,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            rotation: RotationCompare::ShortestArc,
        }
    }
}
