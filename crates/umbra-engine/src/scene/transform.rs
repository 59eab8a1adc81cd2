use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position / rotation / scale with lazily derived world matrices.
///
/// Rotation is stored as (pitch, yaw, roll) in radians. Every mutator marks the
/// cached matrices dirty; only the matrix getters recompute them.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,

    world: Mat4,
    world_inverse_transpose: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            world_inverse_transpose: Mat4::IDENTITY,
            dirty: false,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        let mut t = Self::new();
        t.set_position(position);
        t
    }

    // ── absolute setters ──────────────────────────────────────────────────

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Sets (pitch, yaw, roll) in radians.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    // ── relative mutators ─────────────────────────────────────────────────

    /// World-space translation.
    pub fn move_absolute(&mut self, offset: Vec3) {
        self.position += offset;
        self.dirty = true;
    }

    /// Translation along the transform's own axes.
    pub fn move_relative(&mut self, offset: Vec3) {
        self.position += self.orientation() * offset;
        self.dirty = true;
    }

    /// Adds (pitch, yaw, roll) to the current rotation.
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
        self.dirty = true;
    }

    /// Multiplies the current scale component-wise.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.dirty = true;
    }

    // ── getters ───────────────────────────────────────────────────────────

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    pub fn world_matrix(&mut self) -> Mat4 {
        self.refresh();
        self.world
    }

    /// Transpose of the inverse world matrix, for transforming normals.
    pub fn world_inverse_transpose_matrix(&mut self) -> Mat4 {
        self.refresh();
        self.world_inverse_transpose
    }

    /// Roll about Z, then pitch about X, then yaw about Y.
    fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        // Scale, then rotate, then translate.
        self.world = Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position);
        self.world_inverse_transpose = self.world.inverse().transpose();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    // ── caching ───────────────────────────────────────────────────────────

    #[test]
    fn new_is_identity() {
        let mut t = Transform::new();
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
        assert_eq!(t.world_inverse_transpose_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn mutators_mark_dirty_and_getters_clean() {
        let mut t = Transform::new();
        t.move_absolute(Vec3::X);
        assert!(t.is_dirty());
        let _ = t.world_matrix();
        assert!(!t.is_dirty());
        t.scale_by(Vec3::splat(2.0));
        assert!(t.is_dirty());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 2.0, 3.0));
        t.set_rotation(Vec3::new(0.3, -1.1, 0.7));
        t.set_scale(Vec3::new(2.0, 0.5, 1.5));
        let a = t.world_matrix();
        let b = t.world_matrix();
        let c = t.world_matrix();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn world_is_scale_then_rotate_then_translate() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(5.0, 0.0, 0.0));
        t.set_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        t.set_scale(Vec3::new(2.0, 1.0, 1.0));

        // (1,0,0) -> scaled (2,0,0) -> yawed (0,0,-2) -> translated (5,0,-2).
        let p = t.world_matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(5.0, 0.0, -2.0)), "{p:?}");

        let expected = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::from_rotation_y(FRAC_PI_2)
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        assert!(t.world_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn last_set_values_win() {
        let mut t = Transform::new();
        t.set_position(Vec3::splat(9.0));
        let _ = t.world_matrix();
        t.set_position(Vec3::new(1.0, 0.0, 0.0));
        t.move_absolute(Vec3::new(0.0, 1.0, 0.0));
        let expected = Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0));
        assert!(t.world_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn inverse_transpose_handles_non_uniform_scale() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(4.0, 1.0, 1.0));
        let n = t.world_inverse_transpose_matrix().transform_vector3(Vec3::X);
        assert!(approx(n, Vec3::new(0.25, 0.0, 0.0)));
    }

    // ── basis ─────────────────────────────────────────────────────────────

    #[test]
    fn move_relative_follows_yaw() {
        let mut t = Transform::new();
        t.set_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        t.move_relative(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(t.position(), Vec3::new(0.0, 0.0, -1.0)), "{:?}", t.position());
    }

    #[test]
    fn basis_vectors_rotate_together() {
        let mut t = Transform::new();
        assert!(approx(t.forward(), Vec3::Z));
        t.rotate(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!(approx(t.forward(), Vec3::X));
        assert!(approx(t.right(), -Vec3::Z));
        assert!(approx(t.up(), Vec3::Y));
    }
}
