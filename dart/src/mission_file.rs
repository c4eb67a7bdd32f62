//! Parses the optional `--mission` TOML file into waypoints, following
//! the same `serde` + `#[serde(deny_unknown_fields)]` discipline as
//! `dart_common::config`.

use std::path::Path;

use dart_common::mission::Waypoint;
use dart_units::{Frame, Vec3};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaypointSpec {
    position: [f64; 3],
    tolerance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MissionFile {
    #[serde(default)]
    waypoint: Vec<WaypointSpec>,
}

#[derive(Debug, thiserror::Error)]
pub enum MissionFileError {
    #[error("failed to read mission file: {0}")]
    Io(String),
    #[error("failed to parse mission file: {0}")]
    Parse(String),
}

pub fn load_waypoints<F: Frame>(path: &Path) -> Result<Vec<Waypoint<F>>, MissionFileError> {
    let text = std::fs::read_to_string(path).map_err(|e| MissionFileError::Io(e.to_string()))?;
    let parsed: MissionFile = toml::from_str(&text).map_err(|e| MissionFileError::Parse(e.to_string()))?;
    Ok(parsed
        .waypoint
        .into_iter()
        .map(|w| Waypoint { position: Vec3::new(w.position[0], w.position[1], w.position[2]), tolerance: w.tolerance })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    #[test]
    fn parses_waypoint_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mission.toml");
        std::fs::write(&path, "[[waypoint]]\nposition = [1.0, 2.0, 3.0]\ntolerance = 0.5\n").unwrap();
        let wps = load_waypoints::<Enu>(&path).unwrap();
        assert_eq!(wps.len(), 1);
        assert_eq!(wps[0].position.x(), 1.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_waypoints::<Enu>(Path::new("/nonexistent/mission.toml")).unwrap_err();
        assert!(matches!(err, MissionFileError::Io(_)));
    }
}
