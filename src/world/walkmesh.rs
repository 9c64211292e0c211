//! Walkable triangle surface and the locator that lives on it.
//!
//! * A [`WalkPoint`] is a triangle (three vertex ids in winding order) plus
//!   barycentric weights.
//! * Whenever a walk stops on an edge the point is re-ordered so the edge is
//!   `indices.x → indices.y` and `weights.z == 0`.  [`WalkMesh::cross_edge`]
//!   relies on that layout.
//! * Adjacency is a map from a directed edge `(a, b)` to the third vertex of
//!   the triangle owning it.  Across `(a, b)` lives whoever owns `(b, a)`.

use std::collections::HashMap;

use glam::{Quat, UVec3, Vec3};

pub type VertexId = u32;

/// Position on the walk mesh: a triangle plus barycentric weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkPoint {
    pub indices: UVec3,
    pub weights: Vec3,
}

impl WalkPoint {
    #[inline]
    pub fn new(indices: UVec3, weights: Vec3) -> Self {
        Self { indices, weights }
    }
}

/// Things that make a triangle soup unusable as a walk mesh.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WalkMeshError {
    #[error("walk mesh has no triangles")]
    Empty,

    #[error("triangle {triangle} references vertex {index} but only {count} vertices exist")]
    BadIndex {
        triangle: usize,
        index: VertexId,
        count: usize,
    },

    #[error("triangle {0} has no area")]
    Degenerate(usize),

    /// Two triangles claim the same oriented edge (non-manifold or flipped winding).
    #[error("directed edge ({0}, {1}) appears in more than one triangle")]
    DuplicateEdge(VertexId, VertexId),

    #[error("{normals} normals supplied for {vertices} vertices")]
    NormalCount { vertices: usize, normals: usize },
}

/// Immutable walkable surface.
#[derive(Clone, Debug)]
pub struct WalkMesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<UVec3>,
    /// directed edge → opposite vertex of the triangle owning that edge
    next_vertex: HashMap<(VertexId, VertexId), VertexId>,
}

/*───────────────────────────── construction ─────────────────────────────*/

impl WalkMesh {
    /// Build a walk mesh from positions, per-vertex smooth normals and
    /// triangles (CCW when seen from the walkable side).
    pub fn new(
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        triangles: Vec<UVec3>,
    ) -> Result<Self, WalkMeshError> {
        if triangles.is_empty() {
            return Err(WalkMeshError::Empty);
        }
        if normals.len() != vertices.len() {
            return Err(WalkMeshError::NormalCount {
                vertices: vertices.len(),
                normals: normals.len(),
            });
        }

        let mut next_vertex = HashMap::with_capacity(triangles.len() * 3);
        for (t, tri) in triangles.iter().enumerate() {
            for index in tri.to_array() {
                if index as usize >= vertices.len() {
                    return Err(WalkMeshError::BadIndex {
                        triangle: t,
                        index,
                        count: vertices.len(),
                    });
                }
            }
            if tri.x == tri.y || tri.y == tri.z || tri.z == tri.x {
                return Err(WalkMeshError::Degenerate(t));
            }
            let [p0, p1, p2] = tri.to_array().map(|i| vertices[i as usize]);
            let (ab, ac) = (p1 - p0, p2 - p0);
            // zero area relative to the edge lengths: coincident or collinear corners
            if ab.cross(ac).length_squared() <= f32::EPSILON * ab.length_squared() * ac.length_squared() {
                return Err(WalkMeshError::Degenerate(t));
            }
            for (a, b, c) in [(tri.x, tri.y, tri.z), (tri.y, tri.z, tri.x), (tri.z, tri.x, tri.y)] {
                if next_vertex.insert((a, b), c).is_some() {
                    return Err(WalkMeshError::DuplicateEdge(a, b));
                }
            }
        }

        let normals = normals.into_iter().map(Vec3::normalize_or_zero).collect();

        Ok(Self {
            vertices,
            normals,
            triangles,
            next_vertex,
        })
    }

    /// Same as [`WalkMesh::new`] but synthesises smooth normals.
    ///
    /// Face normals are accumulated unnormalised, so every face contributes
    /// in proportion to its area.
    pub fn with_smooth_normals(
        vertices: Vec<Vec3>,
        triangles: Vec<UVec3>,
    ) -> Result<Self, WalkMeshError> {
        let mut normals = vec![Vec3::ZERO; vertices.len()];
        for tri in &triangles {
            let (Some(&a), Some(&b), Some(&c)) = (
                vertices.get(tri.x as usize),
                vertices.get(tri.y as usize),
                vertices.get(tri.z as usize),
            ) else {
                // out-of-range ids are reported by `new`
                continue;
            };
            let weighted = (b - a).cross(c - a);
            normals[tri.x as usize] += weighted;
            normals[tri.y as usize] += weighted;
            normals[tri.z as usize] += weighted;
        }
        Self::new(vertices, normals, triangles)
    }
}

/*─────────────────────────────── accessors ──────────────────────────────*/

impl WalkMesh {
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    pub fn triangles(&self) -> &[UVec3] {
        &self.triangles
    }

    /// World positions of the three corners of `indices`.
    #[inline]
    pub fn corners(&self, indices: UVec3) -> [Vec3; 3] {
        [
            self.vertices[indices.x as usize],
            self.vertices[indices.y as usize],
            self.vertices[indices.z as usize],
        ]
    }

    /// Vertex on the far side of edge `a → b`, if a neighbouring triangle exists.
    #[inline]
    pub fn across(&self, a: VertexId, b: VertexId) -> Option<VertexId> {
        self.next_vertex.get(&(b, a)).copied()
    }

    /// Unit geometric normal of a triangle.
    pub fn triangle_normal(&self, indices: UVec3) -> Vec3 {
        let [a, b, c] = self.corners(indices);
        (b - a).cross(c - a).normalize_or(Vec3::Z)
    }
}

/*──────────────────────────────── queries ───────────────────────────────*/

impl WalkMesh {
    /// Closest point of the whole surface to `world_point` (linear scan).
    pub fn nearest_walk_point(&self, world_point: Vec3) -> WalkPoint {
        let mut closest = WalkPoint::new(self.triangles[0], Vec3::new(1.0, 0.0, 0.0));
        let mut closest_dis2 = f32::INFINITY;

        for &tri in &self.triangles {
            let [a, b, c] = self.corners(tri);
            let weights = closest_weights(world_point, a, b, c);
            let close = a * weights.x + b * weights.y + c * weights.z;
            let dis2 = world_point.distance_squared(close);
            if dis2 < closest_dis2 {
                closest_dis2 = dis2;
                closest = WalkPoint::new(tri, weights);
            }
        }

        closest.weights = renormalise(closest.weights);
        closest
    }

    pub fn to_world_point(&self, wp: &WalkPoint) -> Vec3 {
        let [a, b, c] = self.corners(wp.indices);
        a * wp.weights.x + b * wp.weights.y + c * wp.weights.z
    }

    /// Blend of the three vertex normals, renormalised.
    pub fn to_world_smooth_normal(&self, wp: &WalkPoint) -> Vec3 {
        let n = self.normals[wp.indices.x as usize] * wp.weights.x
            + self.normals[wp.indices.y as usize] * wp.weights.y
            + self.normals[wp.indices.z as usize] * wp.weights.z;
        n.try_normalize()
            .unwrap_or_else(|| self.triangle_normal(wp.indices))
    }

    /// Move `start` by `step` (world space) without leaving its triangle.
    ///
    /// Returns the end point and the fraction of `step` that was used.
    /// `1.0` means the whole step fit; anything less means the point stopped
    /// on an edge and the result is laid out with `weights.z == 0`.  A step
    /// that ends exactly on an edge also reports `1.0`, already laid out on
    /// that edge.
    pub fn walk_in_triangle(&self, start: &WalkPoint, step: Vec3) -> (WalkPoint, f32) {
        let [a, b, c] = self.corners(start.indices);
        let target = self.to_world_point(start) + step;
        let step_weights = barycentric_weights(a, b, c, target) - start.weights;

        let mut time = 1.0_f32;
        let mut hit = None;
        for i in 0..3 {
            if step_weights[i] < 0.0 {
                let t = (-start.weights[i] / step_weights[i]).max(0.0);
                if t <= time {
                    time = t;
                    hit = Some(i);
                }
            }
        }

        let mut weights = start.weights + step_weights * time;
        match hit {
            None => (
                WalkPoint::new(start.indices, renormalise(weights)),
                1.0,
            ),
            Some(edge) => {
                weights[edge] = 0.0;
                let weights = renormalise(weights);
                (settle_on_edge(start.indices, weights, edge), time)
            }
        }
    }

    /// Step a point sitting on edge `x → y` into the neighbouring triangle.
    ///
    /// Returns the re-expressed point and the rotation carrying the old
    /// triangle's plane onto the new one, or `None` for a boundary edge.
    pub fn cross_edge(&self, start: &WalkPoint) -> Option<(WalkPoint, Quat)> {
        debug_assert_eq!(start.weights.z, 0.0, "walk point is not on an edge");

        let (a, b) = (start.indices.x, start.indices.y);
        let c = self.across(a, b)?;

        let end = WalkPoint::new(
            UVec3::new(b, a, c),
            Vec3::new(start.weights.y, start.weights.x, 0.0),
        );
        let rotation = Quat::from_rotation_arc(
            self.triangle_normal(start.indices),
            self.triangle_normal(end.indices),
        );
        Some((end, rotation))
    }
}

/*──────────────────────────────── helpers ───────────────────────────────*/

/// Barycentric weights of `pt` projected onto the plane of `a, b, c`.
pub(crate) fn barycentric_weights(a: Vec3, b: Vec3, c: Vec3, pt: Vec3) -> Vec3 {
    let n = (b - a).cross(c - a);
    let inv = 1.0 / n.length_squared();
    Vec3::new(
        (c - b).cross(pt - b).dot(n) * inv,
        (a - c).cross(pt - c).dot(n) * inv,
        (b - a).cross(pt - a).dot(n) * inv,
    )
}

/// Barycentric weights of the point of triangle `a, b, c` closest to `p`.
///
/// Voronoi-region walk from Ericson, *Real-Time Collision Detection* §5.1.5.
fn closest_weights(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Vec3::X;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Vec3::Y;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Vec3::new(1.0 - v, v, 0.0);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Vec3::Z;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Vec3::new(1.0 - w, 0.0, w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Vec3::new(0.0, 1.0 - w, w);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    Vec3::new(1.0 - v - w, v, w)
}

/// Clamp into [0,1] and make the weights sum to exactly one.
fn renormalise(weights: Vec3) -> Vec3 {
    let w = weights.max(Vec3::ZERO);
    let sum = w.x + w.y + w.z;
    if sum > 0.0 { w / sum } else { Vec3::X }
}

/// Rotate indices/weights so the zero weight lands in `z`, keeping winding.
fn settle_on_edge(indices: UVec3, weights: Vec3, zero: usize) -> WalkPoint {
    match zero {
        0 => WalkPoint::new(
            UVec3::new(indices.y, indices.z, indices.x),
            Vec3::new(weights.y, weights.z, 0.0),
        ),
        1 => WalkPoint::new(
            UVec3::new(indices.z, indices.x, indices.y),
            Vec3::new(weights.z, weights.x, 0.0),
        ),
        _ => WalkPoint::new(indices, Vec3::new(weights.x, weights.y, 0.0)),
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    /// Unit square on z = 0 split along the 0–2 diagonal.
    fn square() -> WalkMesh {
        WalkMesh::with_smooth_normals(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
        )
        .unwrap()
    }

    /// Same square with vertex 3 lifted, so the second triangle is tilted.
    fn folded() -> WalkMesh {
        WalkMesh::with_smooth_normals(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
        )
        .unwrap()
    }

    fn centroid(indices: UVec3) -> WalkPoint {
        WalkPoint::new(indices, Vec3::splat(1.0 / 3.0))
    }

    fn sum(w: Vec3) -> f32 {
        w.x + w.y + w.z
    }

    #[test]
    fn rejects_broken_soups() {
        let v = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert_eq!(
            WalkMesh::with_smooth_normals(v.clone(), vec![]).unwrap_err(),
            WalkMeshError::Empty
        );
        assert_eq!(
            WalkMesh::with_smooth_normals(v.clone(), vec![UVec3::new(0, 1, 7)]).unwrap_err(),
            WalkMeshError::BadIndex {
                triangle: 0,
                index: 7,
                count: 3
            }
        );
        assert_eq!(
            WalkMesh::with_smooth_normals(v.clone(), vec![UVec3::new(0, 1, 1)]).unwrap_err(),
            WalkMeshError::Degenerate(0)
        );
        // distinct ids, but the corners sit on one line
        assert_eq!(
            WalkMesh::with_smooth_normals(
                vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0],
                vec![UVec3::new(0, 1, 2)]
            )
            .unwrap_err(),
            WalkMeshError::Degenerate(0)
        );
        assert_eq!(
            WalkMesh::with_smooth_normals(
                vec![Vec3::ZERO, Vec3::Y, Vec3::Y],
                vec![UVec3::new(0, 1, 2)]
            )
            .unwrap_err(),
            WalkMeshError::Degenerate(0)
        );
        // small but well-shaped triangles are fine
        assert!(
            WalkMesh::with_smooth_normals(
                vec![Vec3::ZERO, Vec3::X * 1e-3, Vec3::Y * 1e-3],
                vec![UVec3::new(0, 1, 2)]
            )
            .is_ok()
        );
        assert_eq!(
            WalkMesh::with_smooth_normals(
                v.clone(),
                vec![UVec3::new(0, 1, 2), UVec3::new(1, 2, 0)]
            )
            .unwrap_err(),
            WalkMeshError::DuplicateEdge(1, 2)
        );
        assert_eq!(
            WalkMesh::new(v, vec![Vec3::Z], vec![UVec3::new(0, 1, 2)]).unwrap_err(),
            WalkMeshError::NormalCount {
                vertices: 3,
                normals: 1
            }
        );
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mesh = square();
        // shared diagonal, seen from either triangle
        assert_eq!(mesh.across(2, 0), Some(3));
        assert_eq!(mesh.across(0, 2), Some(1));
        // outer boundary
        assert_eq!(mesh.across(0, 1), None);
        assert_eq!(mesh.across(2, 3), None);
    }

    #[test]
    fn nearest_projects_onto_surface() {
        let mesh = square();
        let wp = mesh.nearest_walk_point(Vec3::new(0.75, 0.25, 5.0));
        assert_eq!(wp.indices, UVec3::new(0, 1, 2));
        assert!((mesh.to_world_point(&wp) - Vec3::new(0.75, 0.25, 0.0)).length() < EPS);
        assert!((sum(wp.weights) - 1.0).abs() < EPS);
    }

    #[test]
    fn nearest_clamps_outside_points() {
        let mesh = square();
        let wp = mesh.nearest_walk_point(Vec3::new(5.0, -3.0, 0.0));
        assert!(wp.weights.cmpge(Vec3::ZERO).all() && wp.weights.cmple(Vec3::ONE).all());
        assert!((sum(wp.weights) - 1.0).abs() < EPS);
        assert!((mesh.to_world_point(&wp) - Vec3::new(1.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn smooth_normal_is_unit_and_blended() {
        let flat = square();
        let n = flat.to_world_smooth_normal(&centroid(UVec3::new(0, 1, 2)));
        assert!((n - Vec3::Z).length() < EPS);

        let bent = folded();
        let tilted = bent.triangle_normal(UVec3::new(0, 2, 3));
        // vertex 1 only touches the flat face, vertex 3 only the tilted one
        let at_1 = WalkPoint::new(UVec3::new(0, 1, 2), Vec3::Y);
        let at_3 = WalkPoint::new(UVec3::new(0, 2, 3), Vec3::Z);
        assert!((bent.to_world_smooth_normal(&at_1) - Vec3::Z).length() < EPS);
        assert!((bent.to_world_smooth_normal(&at_3) - tilted).length() < EPS);
        // on the crease the normal sits strictly between the two faces
        let crease = WalkPoint::new(UVec3::new(0, 1, 2), Vec3::new(0.5, 0.0, 0.5));
        let n = bent.to_world_smooth_normal(&crease);
        assert!((n.length() - 1.0).abs() < EPS);
        assert!(n.dot(Vec3::Z) < 1.0 - EPS && n.dot(tilted) < 1.0 - EPS);
    }

    #[test]
    fn step_inside_triangle_completes() {
        let mesh = square();
        let (end, time) = mesh.walk_in_triangle(&centroid(UVec3::new(0, 1, 2)), Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(time, 1.0);
        assert!(end.weights.cmpgt(Vec3::ZERO).all());
        assert!((sum(end.weights) - 1.0).abs() < EPS);
        let expected = Vec3::new(2.0 / 3.0 + 0.1, 1.0 / 3.0, 0.0);
        assert!((mesh.to_world_point(&end) - expected).length() < EPS);
    }

    #[test]
    fn step_ending_on_edge_settles_onto_it() {
        let mesh = square();
        let start = WalkPoint::new(UVec3::new(0, 1, 2), Vec3::new(0.5, 0.25, 0.25));
        let (end, time) = mesh.walk_in_triangle(&start, Vec3::new(0.0, -0.25, 0.0));
        assert_eq!(time, 1.0);
        assert_eq!(end.weights.z, 0.0);
        assert_eq!((end.indices.x, end.indices.y), (0, 1));
        assert!((mesh.to_world_point(&end) - Vec3::new(0.5, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn out_of_plane_component_is_ignored() {
        let mesh = square();
        let start = centroid(UVec3::new(0, 1, 2));
        let (end, time) = mesh.walk_in_triangle(&start, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(time, 1.0);
        assert!((end.weights - start.weights).length() < EPS);
    }

    #[test]
    fn step_stops_on_edge_with_zero_z_weight() {
        let mesh = square();
        let start = centroid(UVec3::new(0, 1, 2));
        let (end, time) = mesh.walk_in_triangle(&start, Vec3::new(0.0, -1.0, 0.0));
        assert!((time - 1.0 / 3.0).abs() < EPS);
        assert_eq!(end.weights.z, 0.0);
        // the edge is the bottom one, 0 → 1
        assert_eq!((end.indices.x, end.indices.y), (0, 1));
        assert!((mesh.to_world_point(&end) - Vec3::new(2.0 / 3.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn crossing_keeps_world_position() {
        let mesh = square();
        let start = centroid(UVec3::new(0, 1, 2));
        let (edge, time) = mesh.walk_in_triangle(&start, Vec3::new(-1.0, 0.0, 0.0));
        assert!(time < 1.0);
        assert_eq!((edge.indices.x, edge.indices.y), (2, 0));

        let (next, rotation) = mesh.cross_edge(&edge).expect("diagonal has a neighbour");
        assert_eq!(next.indices, UVec3::new(0, 2, 3));
        assert!((mesh.to_world_point(&next) - mesh.to_world_point(&edge)).length() < EPS);
        // coplanar triangles: no rotation needed
        assert!(rotation.angle_between(Quat::IDENTITY) < 1e-3);
    }

    #[test]
    fn crossing_rotates_between_planes() {
        let mesh = folded();
        let edge = WalkPoint::new(UVec3::new(2, 0, 1), Vec3::new(0.5, 0.5, 0.0));
        let (next, rotation) = mesh.cross_edge(&edge).unwrap();
        let from = mesh.triangle_normal(edge.indices);
        let to = mesh.triangle_normal(next.indices);
        assert!((rotation * from - to).length() < EPS);
        assert!((mesh.to_world_point(&next) - mesh.to_world_point(&edge)).length() < EPS);
    }

    #[test]
    fn boundary_edge_is_a_wall() {
        let mesh = square();
        let on_bottom = WalkPoint::new(UVec3::new(0, 1, 2), Vec3::new(0.5, 0.5, 0.0));
        assert!(mesh.cross_edge(&on_bottom).is_none());
    }
}
