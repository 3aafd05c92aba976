//! Orbit camera: globe rotation, zoom distance, perspective projection.

use super::geo::{ray_sphere, Vec3};

pub const MIN_DISTANCE: f32 = 8.0;
pub const MAX_DISTANCE: f32 = 30.0;
pub const DEFAULT_DISTANCE: f32 = 15.0;

/// Radians of rotation per pixel of drag.
const DRAG_SPEED: f32 = 0.005;
/// Distance change per unit of wheel delta.
const ZOOM_SPEED: f32 = 0.01;
const NEAR_PLANE: f32 = 0.1;
const FOV_Y_DEG: f32 = 75.0;

/// Screen size in the units pointer coordinates are given in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    /// Globe rotation about X (tilt), radians.
    pub rotation_x: f32,
    /// Globe rotation about Y (spin), radians.
    pub rotation_y: f32,
    pub distance: f32,
    fov_y: f32,
    drag_from: Option<(f32, f32)>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE)
    }
}

impl Camera {
    pub fn new(distance: f32) -> Self {
        Self {
            rotation_x: 0.0,
            rotation_y: 0.0,
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            fov_y: FOV_Y_DEG.to_radians(),
            drag_from: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_from = Some((x, y));
    }

    /// Rotate proportionally to the pointer delta since the last drag event.
    pub fn drag_to(&mut self, x: f32, y: f32) {
        let Some((px, py)) = self.drag_from else {
            return;
        };
        self.rotation_y += (x - px) * DRAG_SPEED;
        self.rotation_x += (y - py) * DRAG_SPEED;
        self.drag_from = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    /// Move the camera along its axis; positive delta zooms out.
    pub fn zoom(&mut self, wheel_delta: f32) {
        self.distance = (self.distance + wheel_delta * ZOOM_SPEED).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Constant spin applied once per frame unless dragging or paused.
    pub fn auto_rotate(&mut self, step: f32, paused: bool) {
        if !paused && !self.is_dragging() {
            self.rotation_y += step;
        }
    }

    /// World point to view space (camera at `+distance` on Z, looking toward the origin).
    pub fn to_view(&self, p: Vec3) -> Vec3 {
        p.rotate_y(self.rotation_y).rotate_x(self.rotation_x)
    }

    fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// Project a world point to screen coordinates plus its depth from the eye.
    pub fn project(&self, p: Vec3, viewport: Viewport) -> Option<(f32, f32, f32)> {
        let v = self.to_view(p);
        let depth = self.distance - v.z;
        if depth <= NEAR_PLANE {
            return None;
        }
        let f = 1.0 / (self.fov_y / 2.0).tan();
        let ndc_x = v.x * f / (depth * viewport.aspect());
        let ndc_y = v.y * f / depth;
        let sx = (ndc_x + 1.0) * 0.5 * viewport.width;
        let sy = (1.0 - ndc_y) * 0.5 * viewport.height;
        Some((sx, sy, depth))
    }

    /// True when the straight line from the eye to `p` does not pass through the globe first.
    pub fn is_visible(&self, p: Vec3, globe_radius: f32) -> bool {
        let v = self.to_view(p);
        let eye = self.eye();
        let to_point = v - eye;
        let dist = to_point.length();
        if dist == 0.0 {
            return false;
        }
        match ray_sphere(eye, to_point * (1.0 / dist), Vec3::ZERO, globe_radius) {
            Some(t) => t >= dist - 0.01 * globe_radius,
            None => true,
        }
    }

    /// Ray from the eye through a screen point, in view space (origin, unit direction).
    pub fn pick_ray(&self, sx: f32, sy: f32, viewport: Viewport) -> (Vec3, Vec3) {
        let ndc_x = sx / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - sy / viewport.height * 2.0;
        let half = (self.fov_y / 2.0).tan();
        let dir = Vec3::new(ndc_x * half * viewport.aspect(), ndc_y * half, -1.0).normalize();
        (self.eye(), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geo::lat_lon_to_vec3;

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut cam = Camera::default();
        cam.zoom(100.0);
        assert!((cam.distance - 16.0).abs() < 1e-5);
        cam.zoom(10_000.0);
        assert_eq!(cam.distance, MAX_DISTANCE);
        cam.zoom(-10_000.0);
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    #[test]
    fn drag_rotates_proportionally() {
        let mut cam = Camera::default();
        cam.drag_to(50.0, 50.0);
        assert_eq!(cam.rotation_y, 0.0, "no rotation without an active drag");
        cam.begin_drag(10.0, 10.0);
        cam.drag_to(30.0, 0.0);
        assert!((cam.rotation_y - 0.1).abs() < 1e-6);
        assert!((cam.rotation_x + 0.05).abs() < 1e-6);
        cam.end_drag();
        assert!(!cam.is_dragging());
    }

    #[test]
    fn auto_rotation_respects_drag_and_pause() {
        let mut cam = Camera::default();
        cam.auto_rotate(0.01, false);
        assert!((cam.rotation_y - 0.01).abs() < 1e-6);
        cam.auto_rotate(0.01, true);
        assert!((cam.rotation_y - 0.01).abs() < 1e-6);
        cam.begin_drag(0.0, 0.0);
        cam.auto_rotate(0.01, false);
        assert!((cam.rotation_y - 0.01).abs() < 1e-6);
    }

    #[test]
    fn globe_centre_projects_to_screen_centre() {
        let cam = Camera::default();
        let vp = Viewport::new(200.0, 100.0);
        let (x, y, depth) = cam.project(Vec3::ZERO, vp).unwrap();
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 50.0).abs() < 1e-3);
        assert!((depth - 15.0).abs() < 1e-4);
    }

    #[test]
    fn far_side_is_hidden() {
        let cam = Camera::default();
        // lon -90 maps to +Z, facing the camera
        let front = lat_lon_to_vec3(0.0, -90.0, 5.0);
        let back = lat_lon_to_vec3(0.0, 90.0, 5.0);
        assert!(cam.is_visible(front, 5.0));
        assert!(!cam.is_visible(back, 5.0));
    }

    #[test]
    fn pick_ray_through_projected_point_hits_it() {
        let cam = Camera { rotation_x: 0.3, rotation_y: 1.1, ..Camera::default() };
        let vp = Viewport::new(160.0, 96.0);
        let p = lat_lon_to_vec3(20.0, -60.0, 5.0);
        let (sx, sy, depth) = cam.project(p, vp).unwrap();
        let (origin, dir) = cam.pick_ray(sx, sy, vp);
        let hit = origin + dir * (depth / -dir.z);
        assert!(hit.distance(cam.to_view(p)) < 1e-2);
    }
}
