pub mod engine;

pub use engine::{ProgressionEngine, SceneView};
