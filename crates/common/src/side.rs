use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// One of the six faces of a block.
///
/// World axes: `Top` is +Y, `Right` is +X and `Front` is -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Front,
    Back,
}

/// Horizontal faces in clockwise order seen from above.
const YAW_RING: [Side; 4] = [Side::Front, Side::Right, Side::Back, Side::Left];
/// Faces swept when pitching a block forward over its east-west axis.
const PITCH_RING: [Side; 4] = [Side::Front, Side::Top, Side::Back, Side::Bottom];

impl Side {
    pub const ALL: [Side; 6] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::Front,
        Self::Back,
    ];

    /// Outward unit normal of this face.
    pub fn normal(self) -> IVec3 {
        match self {
            Self::Top => IVec3::Y,
            Self::Bottom => IVec3::NEG_Y,
            Self::Left => IVec3::NEG_X,
            Self::Right => IVec3::X,
            Self::Front => IVec3::NEG_Z,
            Self::Back => IVec3::Z,
        }
    }

    pub fn vector(self) -> Vec3 {
        self.normal().as_vec3()
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Map a block-relative face to world space for a block whose front
    /// points towards `facing`.
    ///
    /// Horizontal facings turn the block about the vertical axis; `Top` and
    /// `Bottom` facings pitch it over the east-west axis.
    pub fn relative_to(self, facing: Side) -> Side {
        let (ring, turns) = match facing {
            Self::Top => (&PITCH_RING, 1),
            Self::Bottom => (&PITCH_RING, 3),
            horizontal => (&YAW_RING, ring_index(&YAW_RING, horizontal).unwrap_or(0)),
        };
        match ring_index(ring, self) {
            Some(i) => ring[(i + turns) % 4],
            None => self,
        }
    }
}

fn ring_index(ring: &[Side; 4], side: Side) -> Option<usize> {
    ring.iter().position(|s| *s == side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normals_are_unit_axes() {
        for side in Side::ALL {
            let n = side.normal();
            assert_eq!(n.abs().element_sum(), 1);
            assert_eq!(side.opposite().normal(), -n);
        }
    }

    #[test]
    fn default_facing_is_identity() {
        for side in Side::ALL {
            assert_eq!(side.relative_to(Side::Front), side);
        }
    }

    #[test]
    fn yaw_turns_horizontal_faces_only() {
        assert_eq!(Side::Front.relative_to(Side::Right), Side::Right);
        assert_eq!(Side::Left.relative_to(Side::Right), Side::Front);
        assert_eq!(Side::Front.relative_to(Side::Back), Side::Back);
        assert_eq!(Side::Top.relative_to(Side::Left), Side::Top);
    }

    #[test]
    fn pitch_turns_vertical_ring() {
        assert_eq!(Side::Front.relative_to(Side::Top), Side::Top);
        assert_eq!(Side::Top.relative_to(Side::Top), Side::Back);
        assert_eq!(Side::Front.relative_to(Side::Bottom), Side::Bottom);
        assert_eq!(Side::Left.relative_to(Side::Bottom), Side::Left);
    }

    #[test]
    fn relative_to_is_a_permutation() {
        for facing in Side::ALL {
            let seen: Vec<Side> = Side::ALL.iter().map(|s| s.relative_to(facing)).collect();
            for side in Side::ALL {
                assert!(seen.contains(&side));
            }
        }
    }
}
