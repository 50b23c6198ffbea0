//! Offline static mesh batching for hierarchical scenes.
//!
//! Scene units are loaded through a [`store::SceneStore`], their leaf render
//! nodes are split by shadow behaviour and material, packed into bins under a
//! vertex limit and merged. Result nodes replace the sources and merged
//! meshes are written through an [`store::AssetStore`].

pub mod asset;
pub mod batch;
pub mod error;
pub(crate) mod io;
pub mod scene;
pub mod settings;
pub mod store;

pub use batch::{MeshBatcher, RunReport, UnitOutcome, UnitReport, VERTEX_LIMIT};
pub use error::{BatchError, BatchResult};
pub use settings::{BatchSettings, FailurePolicy};

/// Install the `env_logger` backend at info level. `RUST_LOG` overrides the
/// level and calling this twice is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
