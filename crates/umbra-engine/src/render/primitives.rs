//! Procedural geometry.
//!
//! Stands in for a model loader. All shapes use left-handed, clockwise-front
//! winding with outward normals.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::{MeshData, Vertex};

/// Axis-aligned cube centered on the origin.
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    // (normal, right, up) per face; corners are n ± right ± up.
    let faces = [
        (Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (n, right, up) in faces {
        let base = vertices.len() as u32;
        let corners = [
            (-right + up, [0.0, 0.0]),
            (right + up, [1.0, 0.0]),
            (right - up, [1.0, 1.0]),
            (-right - up, [0.0, 1.0]),
        ];
        for (offset, uv) in corners {
            let p = (n + offset) * h;
            vertices.push(Vertex::new(p.to_array(), n.to_array(), uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut data = MeshData::new("cube", vertices, indices);
    fix_winding(&mut data);
    data
}

/// UV sphere with `segments` around and `rings` from pole to pole.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let theta = v * PI;
        for s in 0..=segments {
            let u = s as f32 / segments as f32;
            let phi = u * TAU;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(Vertex::new((n * radius).to_array(), n.to_array(), [u, v]));
        }
    }

    let row = segments + 1;
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for r in 0..rings {
        for s in 0..segments {
            let i0 = r * row + s;
            let i1 = i0 + row;
            // Skip the triangles that collapse onto a pole.
            if r != 0 {
                indices.extend_from_slice(&[i0, i1, i0 + 1]);
            }
            if r != rings - 1 {
                indices.extend_from_slice(&[i0 + 1, i1, i1 + 1]);
            }
        }
    }

    let mut data = MeshData::new("sphere", vertices, indices);
    fix_winding(&mut data);
    data
}

/// Flat square on the XZ plane facing +Y; UVs repeat `tiles` times.
pub fn plane(size: f32, tiles: f32) -> MeshData {
    let h = size * 0.5;
    let n = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([-h, 0.0, h], n, [0.0, 0.0]),
        Vertex::new([h, 0.0, h], n, [tiles, 0.0]),
        Vertex::new([h, 0.0, -h], n, [tiles, tiles]),
        Vertex::new([-h, 0.0, -h], n, [0.0, tiles]),
    ];
    let mut data = MeshData::new("plane", vertices, vec![0, 1, 2, 0, 2, 3]);
    fix_winding(&mut data);
    data
}

/// Reorders each triangle so it is clockwise when seen from the side its
/// vertex normals point to.
fn fix_winding(data: &mut MeshData) {
    let pos = |i: u32| Vec3::from_array(data.vertices[i as usize].position);
    let nrm = |i: u32| Vec3::from_array(data.vertices[i as usize].normal);

    let mut flips = Vec::new();
    for (t, tri) in data.indices.chunks_exact(3).enumerate() {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let face = (pos(b) - pos(a)).cross(pos(c) - pos(a));
        if face.dot(nrm(a) + nrm(b) + nrm(c)) <= 0.0 {
            flips.push(t);
        }
    }
    for t in flips {
        data.indices.swap(t * 3 + 1, t * 3 + 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clockwise_front(data: &MeshData) {
        for tri in data.indices.chunks_exact(3) {
            let v = |i: u32| data.vertices[i as usize];
            let (a, b, c) = (v(tri[0]), v(tri[1]), v(tri[2]));
            let pa = Vec3::from_array(a.position);
            let face = (Vec3::from_array(b.position) - pa).cross(Vec3::from_array(c.position) - pa);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let n = Vec3::from_array(a.normal) + Vec3::from_array(b.normal) + Vec3::from_array(c.normal);
            assert!(face.dot(n) > 0.0, "{} triangle {tri:?} is counter-clockwise", data.label);
        }
    }

    // ── winding ───────────────────────────────────────────────────────────

    #[test]
    fn cube_is_clockwise_and_outward() {
        let c = cube(2.0);
        assert_eq!(c.vertices.len(), 24);
        assert_eq!(c.indices.len(), 36);
        assert_clockwise_front(&c);
        for v in &c.vertices {
            let p = Vec3::from_array(v.position);
            assert!(p.dot(Vec3::from_array(v.normal)) > 0.0);
            assert!(p.abs().max_element() <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn sphere_is_clockwise_and_on_radius() {
        let s = sphere(3.0, 16, 8);
        assert_clockwise_front(&s);
        for v in &s.vertices {
            assert!((Vec3::from_array(v.position).length() - 3.0).abs() < 1e-4);
        }
        assert!(s.indices.iter().all(|&i| (i as usize) < s.vertices.len()));
    }

    #[test]
    fn plane_front_faces_up() {
        let p = plane(10.0, 4.0);
        assert_clockwise_front(&p);
        // Seen from above (looking down -Y), a clockwise triangle in LH has
        // its cross product pointing up.
        let pa = Vec3::from_array(p.vertices[p.indices[0] as usize].position);
        let pb = Vec3::from_array(p.vertices[p.indices[1] as usize].position);
        let pc = Vec3::from_array(p.vertices[p.indices[2] as usize].position);
        assert!((pb - pa).cross(pc - pa).y > 0.0);
    }
}
