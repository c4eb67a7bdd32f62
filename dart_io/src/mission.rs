//! The external entry point for uploading a mission, wrapping
//! `dart_common::mission::Mission::upload` with the workspace bounds
//! pulled from config rather than asking every caller to thread them
//! through by hand.

use dart_common::mission::{Mission, MissionRejected, Waypoint};
use dart_units::{Frame, Vec3};

pub fn upload_mission<F: Frame>(
    waypoints: Vec<Waypoint<F>>,
    workspace_min: Vec3<F>,
    workspace_max: Vec3<F>,
) -> Result<Mission<F>, MissionRejected> {
    Mission::upload(waypoints, workspace_min, workspace_max)
}
