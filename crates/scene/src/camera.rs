use glam::{Mat4, Vec3};

const WORLD_UP: Vec3 = Vec3::Y;

/// Movement directions understood by [`Camera::apply_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Free-fly camera with an explicit orthonormal basis and degree-based
/// yaw/pitch.
///
/// The basis vectors are recomputed from yaw/pitch on every
/// [`Camera::update_angle`] call; `up` is always derived as
/// cross(forward, right) so the basis cannot drift. Pitch is intentionally
/// unclamped.
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// A camera at the origin looking down -Z (yaw -90, pitch 0).
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: WORLD_UP,
            yaw: -90.0,
            pitch: 0.0,
            speed: 0.02,
            view: Mat4::IDENTITY,
        }
    }

    /// Place the camera and derive an initial right/up basis from the
    /// direction toward `target`.
    ///
    /// `forward` is deliberately left untouched: it stays at its default
    /// until the first [`Camera::update_angle`] syncs it from yaw/pitch.
    pub fn init(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        let dir = (position - target).normalize();
        self.right = up.cross(dir).normalize();
        self.up = dir.cross(self.right).normalize();
    }

    /// Accumulate yaw/pitch deltas (degrees) and rebuild the basis.
    pub fn update_angle(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;

        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.right = WORLD_UP.cross(self.forward).normalize();
        self.up = self.forward.cross(self.right).normalize();
    }

    /// Step the position one `speed` unit along a basis direction.
    ///
    /// Left adds `right` and Right subtracts it: with `right` derived as
    /// cross(world_up, forward) the stored vector points to the camera's
    /// left, and the movement keys depend on that sign convention.
    pub fn apply_move(&mut self, direction: MoveDirection) {
        match direction {
            MoveDirection::Forward => self.position += self.forward * self.speed,
            MoveDirection::Backward => self.position -= self.forward * self.speed,
            MoveDirection::Left => self.position += self.right * self.speed,
            MoveDirection::Right => self.position -= self.right * self.speed,
            MoveDirection::Up => self.position += self.up * self.speed,
            MoveDirection::Down => self.position -= self.up * self.speed,
        }
    }

    /// Refresh the cached view matrix. Call once per frame before any draw
    /// that consumes it.
    pub fn update(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let mut cam = Camera::new();
        cam.update_angle(0.0, 0.0);
        assert_vec3_near(cam.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn basis_stays_orthonormal_under_rotation() {
        let mut cam = Camera::new();
        for (dy, dp) in [(13.0, 7.0), (-111.5, 42.0), (360.0, -95.0), (0.25, 0.25)] {
            cam.update_angle(dy, dp);
            assert!((cam.forward.length() - 1.0).abs() < EPS);
            assert!(cam.forward.dot(cam.right).abs() < EPS);
            assert!(cam.forward.dot(cam.up).abs() < EPS);
            assert!(cam.right.dot(cam.up).abs() < EPS);
        }
    }

    #[test]
    fn pitch_is_not_clamped() {
        let mut cam = Camera::new();
        cam.update_angle(0.0, 120.0);
        assert_eq!(cam.pitch, 120.0);
        // Past 90 degrees the forward vector flips over the pole.
        assert!(cam.forward.y < 1.0);
    }

    #[test]
    fn forward_then_backward_round_trips() {
        let mut cam = Camera::new();
        cam.update_angle(33.0, -12.0);
        let start = cam.position();
        cam.apply_move(MoveDirection::Forward);
        cam.apply_move(MoveDirection::Backward);
        assert_vec3_near(cam.position(), start);
    }

    #[test]
    fn left_moves_along_stored_right_vector() {
        let mut cam = Camera::new();
        cam.update_angle(0.0, 0.0);
        // At yaw -90 the stored right vector is -X, so Left moves toward -X.
        cam.apply_move(MoveDirection::Left);
        assert!(cam.position().x < 0.0);
    }

    #[test]
    fn init_leaves_forward_at_default() {
        let mut cam = Camera::new();
        cam.init(Vec3::new(11.0, 3.2, 10.5), Vec3::ZERO, Vec3::Y);
        assert_vec3_near(cam.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn view_matches_direct_look_at_after_angle_sync() {
        let mut cam = Camera::new();
        let position = Vec3::new(0.0, 0.0, 10.3);
        cam.init(position, Vec3::ZERO, Vec3::Y);
        cam.update_angle(0.0, 0.0);
        cam.update();

        // The documented quirk: the camera looks down -Z from its position,
        // not at the init target.
        let expected = Mat4::look_at_rh(position, position + cam.forward(), cam.up);
        let got = cam.view().to_cols_array();
        let want = expected.to_cols_array();
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < EPS);
        }
    }

    #[test]
    fn view_is_cached_until_update() {
        let mut cam = Camera::new();
        cam.update_angle(0.0, 0.0);
        cam.update();
        let before = cam.view();
        cam.apply_move(MoveDirection::Forward);
        assert_eq!(cam.view(), before);
        cam.update();
        assert_ne!(cam.view(), before);
    }
}
