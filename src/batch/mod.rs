//! Static mesh batching: classify render nodes by shadow behaviour, group
//! them by material, pack each group into vertex-bounded bins and merge
//! every bin into a single mesh.

pub mod classify;
pub mod combine;
pub mod orchestrator;
pub mod packer;

pub use classify::{classify, MeshInstance, ShadowClasses};
pub use combine::{combine_meshes, CombinePart};
pub use orchestrator::{MeshBatcher, RunReport, SceneBatch, UnitOutcome, UnitReport};
pub use packer::{group_by_material, pack_bins, Bin, MaterialGroup};

use crate::scene::ShadowCasting;

/// Largest vertex count a merged mesh may address with 16-bit indices.
pub const VERTEX_LIMIT: usize = 65_536;

/// Shadow class a mesh instance is batched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowMode {
    CastAndReceive,
    CastOnly,
    NoCast,
}

impl ShadowMode {
    /// Processing order of the classes within one scene unit.
    pub const ALL: [ShadowMode; 3] = [
        ShadowMode::CastOnly,
        ShadowMode::CastAndReceive,
        ShadowMode::NoCast,
    ];

    /// `None` for renderer flags the batcher does not handle.
    pub fn from_casting(casting: ShadowCasting) -> Option<Self> {
        match casting {
            ShadowCasting::On => Some(ShadowMode::CastAndReceive),
            ShadowCasting::ShadowsOnly => Some(ShadowMode::CastOnly),
            ShadowCasting::Off => Some(ShadowMode::NoCast),
            ShadowCasting::TwoSided => None,
        }
    }

    pub fn casting(self) -> ShadowCasting {
        match self {
            ShadowMode::CastAndReceive => ShadowCasting::On,
            ShadowMode::CastOnly => ShadowCasting::ShadowsOnly,
            ShadowMode::NoCast => ShadowCasting::Off,
        }
    }

    /// Short tag used in generated asset names.
    pub fn label(self) -> &'static str {
        match self {
            ShadowMode::CastAndReceive => "shadows",
            ShadowMode::CastOnly => "shadows_only",
            ShadowMode::NoCast => "no_shadows",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casting_round_trips_for_handled_modes() {
        for mode in ShadowMode::ALL {
            assert_eq!(ShadowMode::from_casting(mode.casting()), Some(mode));
        }
        assert_eq!(ShadowMode::from_casting(ShadowCasting::TwoSided), None);
    }
}
