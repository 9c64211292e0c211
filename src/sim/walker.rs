//! Walk-mesh constrained stepping.
//!
//! One call moves a [`WalkPoint`] by a world-space displacement, hopping
//! over shared edges and sliding along boundary edges.  The loop is bounded
//! so a point wedged in an awkward corner can never hang the tick.

use glam::{Quat, Vec3};

use crate::world::{WalkMesh, WalkPoint};

/// Safety bound on triangle hops / wall contacts per call.
pub const MAX_WALK_STEPS: u32 = 10;
/// Outward component is pushed back inward by this factor (> 1 = bounce).
pub const WALL_BOUNCE: f32 = 1.25;
/// Inward nudge for steps already parallel to / leaving a wall.
pub const WALL_NUDGE: f32 = 0.01;

/// What the caller gets back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkResult {
    pub at: WalkPoint,
    /// unconsumed displacement; non-zero only if the budget ran out
    pub remain: Vec3,
    /// loop iterations used
    pub steps: u32,
    /// touched any boundary edge
    pub hit_wall: bool,
}

pub fn walk(mesh: &WalkMesh, start: WalkPoint, step: Vec3) -> WalkResult {
    let mut at = start;
    let mut remain = step;
    let mut steps = 0;
    let mut hit_wall = false;

    for _ in 0..MAX_WALK_STEPS {
        if remain == Vec3::ZERO {
            break;
        }
        steps += 1;

        let (end, time) = mesh.walk_in_triangle(&at, remain);
        at = end;
        if time == 1.0 {
            remain = Vec3::ZERO;
            break;
        }

        remain *= 1.0 - time;
        match mesh.cross_edge(&at) {
            Some((next, rotation)) => {
                at = next;
                remain = rotation * remain;
            }
            None => {
                remain = slide_along_wall(mesh, &at, remain);
                hit_wall = true;
            }
        }
    }

    if remain != Vec3::ZERO {
        log::warn!(
            "walk used its full budget of {MAX_WALK_STEPS} steps, dropping {:.4} units",
            remain.length()
        );
    }

    WalkResult {
        at,
        remain,
        steps,
        hit_wall,
    }
}

/// Bend `remain` away from the boundary edge `at` is sitting on.
///
/// `at` must be laid out as [`WalkMesh::walk_in_triangle`] leaves it: the
/// wall is `indices.x → indices.y`.
pub fn slide_along_wall(mesh: &WalkMesh, at: &WalkPoint, remain: Vec3) -> Vec3 {
    let [a, b, c] = mesh.corners(at.indices);
    let along = (b - a).normalize();
    let normal = (b - a).cross(c - a).normalize();
    let inward = normal.cross(along);

    let d = remain.dot(inward);
    if d < 0.0 {
        remain + (-WALL_BOUNCE * d) * inward
    } else {
        remain + WALL_NUDGE * d * inward
    }
}

/*──────────────────────── orientation helpers ────────────────────────*/

/// Turn `rotation` by `angle` about `up` (world space).
#[inline]
pub fn yaw_about(rotation: Quat, up: Vec3, angle: f32) -> Quat {
    (Quat::from_axis_angle(up, angle) * rotation).normalize()
}

/// Smallest extra rotation that makes local +Z of `rotation` point along `up`.
#[inline]
pub fn align_to_normal(rotation: Quat, up: Vec3) -> Quat {
    let adjust = Quat::from_rotation_arc(rotation * Vec3::Z, up);
    (adjust * rotation).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    const EPS: f32 = 1e-4;

    /// 2×1 strip on z = 0: two unit squares, four triangles.
    fn strip() -> WalkMesh {
        WalkMesh::with_smooth_normals(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
            vec![
                UVec3::new(0, 1, 4),
                UVec3::new(0, 4, 3),
                UVec3::new(1, 2, 5),
                UVec3::new(1, 5, 4),
            ],
        )
        .unwrap()
    }

    /// Flat unit square joined to a ramp rising along +Y.
    fn ramp() -> WalkMesh {
        WalkMesh::with_smooth_normals(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 2.0, 1.0),
                Vec3::new(0.0, 2.0, 1.0),
            ],
            vec![
                UVec3::new(0, 1, 2),
                UVec3::new(0, 2, 3),
                UVec3::new(3, 2, 4),
                UVec3::new(3, 4, 5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn zero_step_changes_nothing() {
        let mesh = strip();
        let start = mesh.nearest_walk_point(Vec3::new(0.6, 0.3, 0.0));
        let out = walk(&mesh, start, Vec3::ZERO);
        assert_eq!(out.at, start);
        assert_eq!(out.steps, 0);
        assert!(!out.hit_wall);

        let rotation = Quat::from_rotation_z(0.3);
        let up = mesh.to_world_smooth_normal(&out.at);
        assert!(align_to_normal(rotation, up).angle_between(rotation) < 1e-3);
    }

    #[test]
    fn crosses_several_triangles_continuously() {
        let mesh = strip();
        let start = mesh.nearest_walk_point(Vec3::new(0.2, 0.5, 0.0));
        let out = walk(&mesh, start, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(out.remain, Vec3::ZERO);
        assert!(!out.hit_wall);
        assert!(out.steps > 1);
        assert!((mesh.to_world_point(&out.at) - Vec3::new(1.7, 0.5, 0.0)).length() < EPS);
    }

    #[test]
    fn seam_crossing_matches_boundary_point() {
        let mesh = strip();
        let start = mesh.nearest_walk_point(Vec3::new(0.7, 0.2, 0.0));
        // straight up: leaves triangle (0,1,4) through the diagonal 4 → 0
        let (edge, time) = mesh.walk_in_triangle(&start, Vec3::new(0.0, 0.6, 0.0));
        assert!(time < 1.0);
        let (next, _) = mesh.cross_edge(&edge).unwrap();
        assert!((mesh.to_world_point(&next) - mesh.to_world_point(&edge)).length() < EPS);

        let out = walk(&mesh, start, Vec3::new(0.0, 0.6, 0.0));
        assert!((mesh.to_world_point(&out.at) - Vec3::new(0.7, 0.8, 0.0)).length() < EPS);
    }

    #[test]
    fn remaining_step_follows_the_ramp() {
        let mesh = ramp();
        let start = mesh.nearest_walk_point(Vec3::new(0.5, 0.5, 0.0));
        let out = walk(&mesh, start, Vec3::new(0.0, 1.0, 0.0));
        let end = mesh.to_world_point(&out.at);
        // the half step left after the fold is turned up the slope
        assert!(end.z > 0.2, "did not climb: {end}");
        let rise = 0.5 * std::f32::consts::FRAC_1_SQRT_2;
        assert!((end - Vec3::new(0.5, 1.0 + rise, rise)).length() < EPS, "{end}");
    }

    #[test]
    fn wall_bounce_points_inward() {
        let mesh = strip();
        let on_wall = WalkPoint::new(UVec3::new(0, 1, 4), Vec3::new(0.5, 0.5, 0.0));
        for dir in [
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.7, -0.3, 0.0),
            Vec3::new(-0.2, -2.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.4, 0.0),
        ] {
            let out = slide_along_wall(&mesh, &on_wall, dir);
            assert!(out.dot(Vec3::Y) >= 0.0, "{dir} -> {out}");
        }
        // bounce keeps a quarter of the outward component, reversed
        let out = slide_along_wall(&mesh, &on_wall, Vec3::new(0.0, -1.0, 0.0));
        assert!((out - Vec3::new(0.0, 0.25, 0.0)).length() < EPS);
    }

    #[test]
    fn long_step_stops_at_budget_on_a_valid_point() {
        // 12 unit squares in a row; every square costs two hops
        let n = 12;
        let bottom = |i: u32| i;
        let top = |i: u32| n + 1 + i;
        let vertices = (0..=n)
            .map(|i| Vec3::new(i as f32, 0.0, 0.0))
            .chain((0..=n).map(|i| Vec3::new(i as f32, 1.0, 0.0)))
            .collect();
        let triangles = (0..n)
            .flat_map(|i| {
                [
                    UVec3::new(bottom(i), bottom(i + 1), top(i + 1)),
                    UVec3::new(bottom(i), top(i + 1), top(i)),
                ]
            })
            .collect();
        let mesh = WalkMesh::with_smooth_normals(vertices, triangles).unwrap();

        let start = mesh.nearest_walk_point(Vec3::new(0.2, 0.5, 0.0));
        let out = walk(&mesh, start, Vec3::new(11.0, 0.0, 0.0));
        assert_eq!(out.steps, MAX_WALK_STEPS);
        assert_ne!(out.remain, Vec3::ZERO);
        assert!(!out.hit_wall);

        assert!(out.at.weights.cmpge(Vec3::ZERO).all() && out.at.weights.cmple(Vec3::ONE).all());
        let w = out.at.weights;
        assert!((w.x + w.y + w.z - 1.0).abs() < EPS);
        let end = mesh.to_world_point(&out.at);
        assert!(end.is_finite());
        assert!(end.x > 0.2 && end.x < 11.2, "{end}");
        assert!((end.y - 0.5).abs() < EPS && end.z == 0.0);
    }

    #[test]
    fn walking_into_wall_stays_on_mesh() {
        let mesh = strip();
        let start = mesh.nearest_walk_point(Vec3::new(0.6, 0.3, 0.0));
        let out = walk(&mesh, start, Vec3::new(0.0, -1.0, 0.0));
        assert!(out.hit_wall);
        let end = mesh.to_world_point(&out.at);
        // hits y = 0 after 0.3, bounces 0.25 × 0.7 back in
        assert!((end - Vec3::new(0.6, 0.175, 0.0)).length() < EPS, "{end}");
        assert!(out.at.weights.cmpge(Vec3::ZERO).all());
    }

    #[test]
    fn yaw_turns_about_given_axis() {
        let turned = yaw_about(Quat::IDENTITY, Vec3::Z, std::f32::consts::FRAC_PI_2);
        assert!((turned * Vec3::X - Vec3::Y).length() < EPS);
        assert!((turned * Vec3::Z - Vec3::Z).length() < EPS);
    }

    #[test]
    fn align_brings_local_up_onto_normal() {
        let up = Vec3::new(0.0, -1.0, 1.0).normalize();
        let aligned = align_to_normal(Quat::from_rotation_z(0.7), up);
        assert!((aligned * Vec3::Z - up).length() < EPS);
        assert!((aligned.length() - 1.0).abs() < EPS);
    }
}
