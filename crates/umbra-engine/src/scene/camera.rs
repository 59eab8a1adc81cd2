use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Mat4, Vec3};

use crate::input::{InputFrame, InputState, Key, MouseButton};

use super::Transform;

/// Free-fly perspective camera.
///
/// Left-handed, depth range 0..1. The view matrix is refreshed every
/// `update`; the projection only on aspect changes.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,
    pub transform: Transform,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Radians per pixel of pointer motion.
    pub look_speed: f32,

    aspect: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(name: impl Into<String>, position: Vec3, aspect: f32) -> Self {
        let mut cam = Self {
            name: name.into(),
            transform: Transform::from_position(position),
            fov: FRAC_PI_4,
            near: 0.1,
            far: 1000.0,
            move_speed: 5.0,
            look_speed: 0.005,
            aspect,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        cam.update_view_matrix();
        cam.update_projection_matrix(aspect);
        cam
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self.update_projection_matrix(self.aspect);
        self
    }

    /// Points the camera at `(pitch, yaw)` radians.
    pub fn with_orientation(mut self, pitch: f32, yaw: f32) -> Self {
        self.transform.set_rotation(Vec3::new(pitch, yaw, 0.0));
        self.update_view_matrix();
        self
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn update_view_matrix(&mut self) {
        self.view = Mat4::look_to_lh(self.transform.position(), self.transform.forward(), Vec3::Y);
    }

    pub fn update_projection_matrix(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = Mat4::perspective_lh(self.fov, aspect, self.near, self.far);
    }

    /// Applies held movement keys and mouse-look, then refreshes the view.
    ///
    /// W/S forward/back, A/D left/right, Space/X up/down. Look is active
    /// while the right mouse button is held.
    pub fn update(&mut self, dt: f32, input: &InputState, frame: &InputFrame) {
        let step = self.move_speed * dt;
        let axis = |pos: Key, neg: Key| -> f32 {
            (input.key_down(pos) as i32 - input.key_down(neg) as i32) as f32
        };

        let offset = Vec3::new(
            axis(Key::D, Key::A),
            axis(Key::Space, Key::X),
            axis(Key::W, Key::S),
        ) * step;
        if offset != Vec3::ZERO {
            self.transform.move_relative(offset);
        }

        if input.button_down(MouseButton::Right) {
            let (dx, dy) = frame.pointer_delta;
            self.look(dx, dy);
        }

        self.update_view_matrix();
    }

    /// Turns by a pointer delta in pixels; pitch is clamped to ±π/2.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.transform
            .rotate(Vec3::new(dy * self.look_speed, dx * self.look_speed, 0.0));

        let mut rot = self.transform.rotation();
        let clamped = rot.x.clamp(-FRAC_PI_2, FRAC_PI_2);
        if clamped != rot.x {
            rot.x = clamped;
            self.transform.set_rotation(rot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState, MouseButtonState};

    // ── look ──────────────────────────────────────────────────────────────

    #[test]
    fn pitch_never_exceeds_half_pi() {
        let mut cam = Camera::new("c", Vec3::ZERO, 16.0 / 9.0);
        for _ in 0..500 {
            cam.look(3.0, 40.0);
            assert!(cam.transform.rotation().x.abs() <= FRAC_PI_2);
        }
        for _ in 0..1000 {
            cam.look(-1.0, -40.0);
            assert!(cam.transform.rotation().x.abs() <= FRAC_PI_2);
        }
        assert_eq!(cam.transform.rotation().x, -FRAC_PI_2);
    }

    #[test]
    fn look_requires_right_button() {
        let mut cam = Camera::new("c", Vec3::ZERO, 1.0);
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 50.0, y: 0.0 });

        cam.update(0.016, &state, &frame);
        assert_eq!(cam.transform.rotation(), Vec3::ZERO);

        state.apply_event(
            &mut frame,
            InputEvent::PointerButton { button: MouseButton::Right, state: MouseButtonState::Pressed },
        );
        cam.update(0.016, &state, &frame);
        assert!((cam.transform.rotation().y - 50.0 * cam.look_speed).abs() < 1e-6);
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn w_moves_along_forward_and_refreshes_view() {
        let mut cam = Camera::new("c", Vec3::ZERO, 1.0);
        let before = cam.view();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::Key { key: Key::W, state: KeyState::Pressed, repeat: false });

        cam.update(1.0, &state, &frame);
        assert!((cam.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
        assert_ne!(cam.view(), before);
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn aspect_change_only_touches_horizontal_term() {
        let mut cam = Camera::new("c", Vec3::ZERO, 4.0 / 3.0);
        let a = cam.projection();
        cam.update_projection_matrix(16.0 / 9.0);
        let b = cam.projection();

        assert_ne!(a.x_axis.x, b.x_axis.x);
        assert_eq!(a.y_axis, b.y_axis);
        assert_eq!(a.z_axis, b.z_axis);
        assert_eq!(a.w_axis, b.w_axis);
        assert_eq!(a.x_axis.y, b.x_axis.y);
    }

    #[test]
    fn projection_maps_near_far_to_unit_depth() {
        let cam = Camera::new("c", Vec3::ZERO, 1.0);
        let near = cam.projection().project_point3(Vec3::new(0.0, 0.0, cam.near));
        let far = cam.projection().project_point3(Vec3::new(0.0, 0.0, cam.far));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }
}
