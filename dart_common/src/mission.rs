//! Ordered waypoint missions. Immutable once accepted.

use dart_units::{Frame, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Waypoint<F: Frame> {
    pub position: Vec3<F>,
    /// Meters; the waypoint is considered reached within this radius.
    pub tolerance: f64,
}

#[derive(Clone, Debug)]
pub struct Mission<F: Frame> {
    waypoints: Vec<Waypoint<F>>,
}

/// A mission rejected at `upload_mission` time; enumerates every violated
/// constraint rather than failing on the first one, matching the
/// "structured error enumerating violated constraints" contract.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionRejected {
    pub violations: Vec<String>,
}

impl std::fmt::Display for MissionRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mission rejected: {}", self.violations.join("; "))
    }
}

impl std::error::Error for MissionRejected {}

impl<F: Frame> Mission<F> {
    /// Validate waypoints against workspace bounds and accept, or return
    /// every violation found.
    pub fn upload(
        waypoints: Vec<Waypoint<F>>,
        workspace_min: Vec3<F>,
        workspace_max: Vec3<F>,
    ) -> Result<Self, MissionRejected> {
        let mut violations = Vec::new();
        if waypoints.is_empty() {
            violations.push("mission has no waypoints".to_string());
        }
        for (i, wp) in waypoints.iter().enumerate() {
            if !wp.position.is_finite() {
                violations.push(format!("waypoint {i} is non-finite"));
                continue;
            }
            if wp.position.x() < workspace_min.x()
                || wp.position.x() > workspace_max.x()
                || wp.position.y() < workspace_min.y()
                || wp.position.y() > workspace_max.y()
                || wp.position.z() < workspace_min.z()
                || wp.position.z() > workspace_max.z()
            {
                violations.push(format!("waypoint {i} outside workspace bounds"));
            }
            if wp.tolerance <= 0.0 {
                violations.push(format!("waypoint {i} has non-positive tolerance"));
            }
        }

        if violations.is_empty() {
            Ok(Self { waypoints })
        } else {
            Err(MissionRejected { violations })
        }
    }

    pub fn waypoints(&self) -> &[Waypoint<F>] {
        &self.waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_units::Enu;

    #[test]
    fn accepts_waypoints_in_bounds() {
        let wps = vec![Waypoint { position: Vec3::new(1.0, 1.0, 1.0), tolerance: 0.5 }];
        let m = Mission::<Enu>::upload(wps, Vec3::new(-10.0, -10.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        assert!(m.is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_waypoint_with_reason() {
        let wps = vec![Waypoint { position: Vec3::new(100.0, 1.0, 1.0), tolerance: 0.5 }];
        let err = Mission::<Enu>::upload(wps, Vec3::new(-10.0, -10.0, 0.0), Vec3::new(10.0, 10.0, 10.0))
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn rejects_empty_mission() {
        let err = Mission::<Enu>::upload(vec![], Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
            .unwrap_err();
        assert!(err.violations.iter().any(|v| v.contains("no waypoints")));
    }
}
