pub mod loader;
pub mod schema;

pub use loader::{build_engine, load_engine, load_scene, load_scene_dir, DataLoadError};
pub use schema::SceneData;
