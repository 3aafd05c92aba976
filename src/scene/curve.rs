//! Cubic Bezier arcs between surface points.

use super::geo::Vec3;

const ARC_DIVISIONS: usize = 200;

#[derive(Clone, Debug)]
pub struct CubicBezier {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
    /// Cumulative arc length at `ARC_DIVISIONS + 1` evenly spaced `t` values.
    lengths: Vec<f32>,
}

impl CubicBezier {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut curve = Self { p0, p1, p2, p3, lengths: Vec::new() };
        curve.lengths = curve.arc_lengths();
        curve
    }

    /// Arc that bows outward from a sphere centred at the origin.
    ///
    /// The chord midpoint is pushed out by 0.4 of the chord length and the two
    /// inner control points straddle it along the chord direction.
    pub fn surface_arc(start: Vec3, end: Vec3) -> Self {
        let distance = start.distance(end);
        let mid = start.lerp(end, 0.5);
        let lifted = mid.normalize() * (mid.length() + distance * 0.4);
        let along = (start - end).normalize();
        let mid_start = lifted + along * (distance * 0.2);
        let mid_end = lifted + along * (-distance * 0.2);
        Self::new(start, mid_start, mid_end, end)
    }

    /// Point at curve parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    /// Point at fraction `u` of the total arc length.
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.arc_to_t(u.clamp(0.0, 1.0)))
    }

    /// `n + 1` points evenly spaced in `t`.
    pub fn points(&self, n: usize) -> Vec<Vec3> {
        (0..=n).map(|i| self.point(i as f32 / n as f32)).collect()
    }

    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    fn arc_lengths(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(ARC_DIVISIONS + 1);
        let mut prev = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=ARC_DIVISIONS {
            let p = self.point(i as f32 / ARC_DIVISIONS as f32);
            sum += p.distance(prev);
            lengths.push(sum);
            prev = p;
        }
        lengths
    }

    fn arc_to_t(&self, u: f32) -> f32 {
        let total = self.length();
        if total == 0.0 {
            return u;
        }
        let target = u * total;
        let i = self.lengths.partition_point(|&l| l < target);
        if i == 0 {
            return 0.0;
        }
        if i >= self.lengths.len() {
            return 1.0;
        }
        let (before, after) = (self.lengths[i - 1], self.lengths[i]);
        let span = after - before;
        let frac = if span > 0.0 { (target - before) / span } else { 0.0 };
        ((i - 1) as f32 + frac) / ARC_DIVISIONS as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geo::lat_lon_to_vec3;

    #[test]
    fn endpoints_are_exact() {
        let a = lat_lon_to_vec3(35.7, 139.7, 5.0);
        let b = lat_lon_to_vec3(51.5, -0.1, 5.0);
        let curve = CubicBezier::surface_arc(a, b);
        assert!(curve.point_at(0.0).distance(a) < 1e-4);
        assert!(curve.point_at(1.0).distance(b) < 1e-3);
    }

    #[test]
    fn arc_bows_above_surface() {
        let a = lat_lon_to_vec3(35.7, 139.7, 5.0);
        let b = lat_lon_to_vec3(51.5, -0.1, 5.0);
        let curve = CubicBezier::surface_arc(a, b);
        let apex = curve.point_at(0.5);
        assert!(apex.length() > 5.0);
        for p in curve.points(50).iter().skip(5).take(40) {
            assert!(p.length() > 5.0);
        }
    }

    #[test]
    fn arc_length_parameterisation_is_uniform() {
        let a = lat_lon_to_vec3(0.0, 0.0, 5.0);
        let b = lat_lon_to_vec3(0.0, 120.0, 5.0);
        let curve = CubicBezier::surface_arc(a, b);
        let step = curve.length() / 10.0;
        let pts: Vec<Vec3> = (0..=10).map(|i| curve.point_at(i as f32 / 10.0)).collect();
        for w in pts.windows(2) {
            // chord of an arc-length step is close to the step itself
            assert!((w[0].distance(w[1]) - step).abs() < step * 0.1);
        }
    }

    #[test]
    fn coincident_endpoints_do_not_panic() {
        let a = lat_lon_to_vec3(52.37, 4.89, 5.0);
        let curve = CubicBezier::surface_arc(a, a);
        assert_eq!(curve.length(), 0.0);
        assert!(curve.point_at(0.3).distance(a) < 1e-4);
    }
}
