// trackmeas_sim/src/simulation/config/catalog.rs

//! Loading of the detector layer catalog from disk.

use figment::{
    providers::{Format, Toml},
    Figment,
};
use std::{collections::HashSet, path::Path};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::structs::LayerConfig;
use crate::error::SimError;

/// The detector description: every layer, sorted by ascending radius.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorCatalog {
    pub layers: Vec<LayerConfig>,
}

impl DetectorCatalog {
    pub fn new(mut layers: Vec<LayerConfig>) -> Result<Self, SimError> {
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.geometry_id()) {
                return Err(SimError::DuplicateLayer(layer.geometry_id()));
            }
        }
        layers.sort_by(|a, b| a.radius.total_cmp(&b.radius));
        Ok(Self { layers })
    }
}

/// Walks `catalog_path`, parses every `.toml` file as a [`LayerConfig`] and
/// validates it.
pub fn load_detector_catalog(catalog_path: &Path) -> Result<DetectorCatalog, SimError> {
    if !catalog_path.is_dir() {
        return Err(SimError::MissingCatalog(catalog_path.to_path_buf()));
    }

    info!("Loading detector catalog from: {:?}", catalog_path);

    let mut layers = Vec::new();
    for entry in WalkDir::new(catalog_path).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() || path.extension().map_or(true, |ext| ext != "toml") {
            continue;
        }

        let layer: LayerConfig = Figment::new().merge(Toml::file(path)).extract()?;
        layer.validate().map_err(|source| SimError::InvalidLayer {
            file: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded layer {} from '{}'", layer.geometry_id(), path.display());
        layers.push(layer);
    }

    if layers.is_empty() {
        return Err(SimError::EmptyCatalog(catalog_path.to_path_buf()));
    }

    let catalog = DetectorCatalog::new(layers)?;
    info!("Detector catalog holds {} layers", catalog.layers.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use trackmeas_core::prelude::BoundIndices;

    fn write_layer(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    const INNER: &str = r#"
        volume = 1
        layer = 2
        radius = 32.0
        indices = ["loc0", "loc1"]
        resolutions = [0.015, 0.05]
    "#;

    const OUTER: &str = r#"
        volume = 1
        layer = 4
        radius = 72.0
        half_length = 400.0
        indices = ["loc0"]
        resolutions = [0.02]
    "#;

    #[test]
    fn test_layers_are_loaded_and_sorted_by_radius() {
        let dir = TempDir::new().unwrap();
        // The outer layer sorts first by file name.
        write_layer(dir.path(), "a_outer.toml", OUTER);
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_layer(&dir.path().join("nested"), "inner.toml", INNER);
        write_layer(dir.path(), "README.md", "not a layer");

        let catalog = load_detector_catalog(dir.path()).unwrap();
        assert_eq!(catalog.layers.len(), 2);
        assert_eq!(catalog.layers[0].layer, 2);
        assert_eq!(
            catalog.layers[0].indices,
            vec![BoundIndices::Loc0, BoundIndices::Loc1]
        );
        assert!(catalog.layers[0].half_length.is_infinite());
        assert_eq!(catalog.layers[1].layer, 4);
        assert_eq!(catalog.layers[1].half_length, 400.0);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_detector_catalog(&missing),
            Err(SimError::MissingCatalog(path)) if path == missing
        ));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_detector_catalog(dir.path()),
            Err(SimError::EmptyCatalog(_))
        ));
    }

    #[test]
    fn test_invalid_layer_names_the_file() {
        let dir = TempDir::new().unwrap();
        write_layer(
            dir.path(),
            "bad.toml",
            r#"
            volume = 1
            layer = 2
            radius = 32.0
            indices = ["loc0", "loc0"]
            resolutions = [0.1, 0.1]
            "#,
        );

        match load_detector_catalog(dir.path()) {
            Err(SimError::InvalidLayer { file, .. }) => assert!(file.ends_with("bad.toml")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_index_name_fails_to_parse() {
        let dir = TempDir::new().unwrap();
        write_layer(
            dir.path(),
            "bad.toml",
            r#"
            volume = 1
            layer = 2
            radius = 32.0
            indices = ["loc2"]
            resolutions = [0.1]
            "#,
        );
        assert!(matches!(
            load_detector_catalog(dir.path()),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_layers_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_layer(dir.path(), "one.toml", INNER);
        write_layer(dir.path(), "two.toml", INNER);
        assert!(matches!(
            load_detector_catalog(dir.path()),
            Err(SimError::DuplicateLayer(id)) if id.layer == 2
        ));
    }
}
