//! Ray queries against bounding spheres

use glam::Vec3;

/// Distance along a ray to its first intersection with a sphere
///
/// `direction` must be normalized. Returns `None` when the ray misses or the
/// hit lies beyond `length`. A ray starting inside the sphere hits at 0.
pub fn trace_sphere(
    origin: Vec3,
    direction: Vec3,
    length: f32,
    center: Vec3,
    radius_sq: f32,
) -> Option<f32> {
    // With O the origin, C the centre, P the closest point on the ray to C and
    // Q the first intersection: |QP|² = r² - |OC|² + |OP|²
    let to_center = center - origin;
    let op = to_center.dot(direction);
    let qp_sq = radius_sq + op * op - to_center.length_squared();
    if qp_sq < 0.0 {
        return None;
    }
    let dist = (op - qp_sq.sqrt()).max(0.0);
    (dist <= length).then_some(dist)
}
