//! Scene loading: locate a scene file, deserialize it by extension, and
//! build a ready-to-run engine from it.

use std::path::{Path, PathBuf};

use factotum_core::config::ConfigError;
use factotum_core::engine::Engine;
use factotum_core::mineral::MineralRegistry;
use factotum_core::object::BuildingKind;
use factotum_core::validation::PlacementRejection;
use serde::de::DeserializeOwned;

use crate::schema::SceneData;

/// Base name of the scene file looked up by [`load_scene_dir`].
pub const SCENE_FILE: &str = "scene";

// ===========================================================================
// Errors
// ===========================================================================

/// Why a scene could not be turned into an engine.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {file}.ron, {file}.toml or {file}.json in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file} is not a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// `scene.ron` and `scene.json` side by side, for example.
    #[error("both {a} and {b} exist; keep only one")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A pre-placed building was refused by the placement validator.
    #[error("building #{index} ({kind}) rejected: {reason}")]
    Placement {
        index: usize,
        kind: BuildingKind,
        reason: PlacementRejection,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order used when scanning a directory.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Pick the format from the file extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// The single `{base_name}.{ron,toml,json}` file in `dir`, if there is one.
/// Two or more candidates is an error rather than a silent pick.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut candidates = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|p| p.is_file());

    match (candidates.next(), candidates.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (first, _) => Ok(first),
    }
}

/// [`find_data_file`] for files the scene cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_owned(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read `path` and hand its text to the deserializer matching its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    let parsed = match format {
        Format::Ron => ron::from_str(&text).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(&text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

// ===========================================================================
// Scene pipeline
// ===========================================================================

/// Deserialize a scene file and check its simulation parameters.
pub fn load_scene(path: &Path) -> Result<SceneData, DataLoadError> {
    let scene: SceneData = deserialize_file(path)?;
    scene.simulation.validate()?;
    tracing::info!(
        path = %path.display(),
        minerals = scene.minerals.len(),
        buildings = scene.buildings.len(),
        "scene loaded"
    );
    Ok(scene)
}

/// Load `scene.{ron,toml,json}` from a directory.
pub fn load_scene_dir(dir: &Path) -> Result<SceneData, DataLoadError> {
    load_scene(&require_data_file(dir, SCENE_FILE)?)
}

/// Build an engine from a scene: deposits first, then every listed building
/// in file order through the placement validator.
pub fn build_engine(scene: &SceneData) -> Result<Engine, DataLoadError> {
    let minerals = MineralRegistry::new(
        scene.minerals.iter().map(|m| m.position),
        scene.simulation.mineral_amount,
    );
    let mut engine = Engine::new(scene.simulation.clone(), minerals)?;

    for (index, building) in scene.buildings.iter().enumerate() {
        engine
            .place(building.kind, building.position, building.rotation_radians())
            .map_err(|reason| DataLoadError::Placement {
                index,
                kind: building.kind,
                reason,
            })?;
    }

    Ok(engine)
}

/// Load a scene file and build its engine in one step.
pub fn load_engine(path: &Path) -> Result<Engine, DataLoadError> {
    build_engine(&load_scene(path)?)
}

// ===========================================================================
// Tests
// ===========================================================================
