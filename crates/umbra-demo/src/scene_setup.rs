//! Sample scene: a lit floor, a few shapes, three lights, three cameras and a sky.

use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3, Vec4};

use umbra_engine::render::shader::ShaderLibrary;
use umbra_engine::render::{
    primitives, CubeData, SamplerDesc, SamplerRef, TextureData, TextureRef,
};
use umbra_engine::scene::{
    Assets, Camera, CubeSource, Entity, Light, Material, Scene, SkyDesc, TextureId, Transform,
};

/// Face file names in cube layer order (+X, -X, +Y, -Y, +Z, -Z).
const SKY_FACES: [&str; 6] = ["right", "left", "up", "down", "front", "back"];
const SKY_FACE_SIZE: u32 = 64;

pub fn build(library: &ShaderLibrary, aspect: f32) -> Result<Scene> {
    let mut scene = Scene::new();
    scene.ambient = Vec3::splat(0.08);

    // ── assets ────────────────────────────────────────────────────────────

    let cube = scene.assets.add_mesh(primitives::cube(1.0));
    let sphere = scene.assets.add_mesh(primitives::sphere(0.75, 32, 16));
    let floor = scene.assets.add_mesh(primitives::plane(40.0, 10.0));

    let tiles = scene.assets.add_texture(TextureData::checker(
        "tiles",
        256,
        8,
        [200, 200, 200, 255],
        [90, 90, 100, 255],
    ));
    let crate_tex = scene.assets.add_texture(TextureData::checker(
        "crate",
        128,
        4,
        [170, 120, 70, 255],
        [120, 80, 45, 255],
    ));
    let white = scene
        .assets
        .add_texture(TextureData::solid("white", [255, 255, 255, 255]));

    let repeat = scene.assets.add_sampler(SamplerDesc::default());
    let clamp = scene.assets.add_sampler(SamplerDesc::clamp());

    // ── materials ─────────────────────────────────────────────────────────

    let lit = |name: &str, texture: TextureId| {
        Material::new(name, library.lit_vs.clone(), library.lit_ps.clone())
            .with_texture("surface_texture", TextureRef::Asset(texture))
            .with_sampler("basic_sampler", SamplerRef::Asset(repeat))
    };

    let floor_mat = scene.add_material(lit("floor", tiles).with_uv(Vec2::splat(4.0), Vec2::ZERO));
    let crate_mat = scene.add_material(lit("crate", crate_tex));
    let red_mat = scene.add_material(lit("red", white).with_tint(Vec4::new(0.9, 0.2, 0.2, 1.0)));
    let blue_mat = scene.add_material(lit("blue", white).with_tint(Vec4::new(0.2, 0.4, 0.9, 1.0)));

    // ── entities ──────────────────────────────────────────────────────────

    scene.add_entity(Entity::new("floor", floor, floor_mat));

    let mut t = Transform::from_position(Vec3::new(-2.5, 1.0, 0.0));
    t.set_scale(Vec3::splat(2.0));
    scene.add_entity(Entity::new("big crate", cube, crate_mat).with_transform(t));

    let mut t = Transform::from_position(Vec3::new(1.5, 0.5, -1.5));
    t.set_rotation(Vec3::new(0.0, 0.6, 0.0));
    scene.add_entity(Entity::new("small crate", cube, crate_mat).with_transform(t));

    scene.add_entity(
        Entity::new("red ball", sphere, red_mat)
            .with_transform(Transform::from_position(Vec3::new(2.0, 0.75, 2.0))),
    );
    scene.add_entity(
        Entity::new("blue ball", sphere, blue_mat)
            .with_transform(Transform::from_position(Vec3::new(-0.5, 2.5, 3.0))),
    );

    // ── lights ────────────────────────────────────────────────────────────

    scene.lights.push(Light::directional(
        Vec3::new(0.0, -1.0, 1.0),
        Vec3::new(1.0, 0.96, 0.9),
        1.0,
    ));
    scene.lights.push(Light::point(
        Vec3::new(3.0, 2.0, -3.0),
        8.0,
        Vec3::new(1.0, 0.5, 0.2),
        1.5,
    ));
    scene.lights.push(Light::spot(
        Vec3::new(-4.0, 5.0, -4.0),
        Vec3::new(0.5, -1.0, 0.5),
        15.0,
        24.0,
        Vec3::new(0.4, 0.7, 1.0),
        2.0,
    ));

    // ── cameras ───────────────────────────────────────────────────────────

    scene.add_camera(
        Camera::new("main", Vec3::new(0.0, 3.0, -10.0), aspect).with_orientation(0.2, 0.0),
    );
    scene.add_camera(
        Camera::new("side", Vec3::new(10.0, 4.0, 0.0), aspect)
            .with_orientation(0.3, -std::f32::consts::FRAC_PI_2),
    );
    scene.add_camera(
        Camera::new("wide", Vec3::new(0.0, 12.0, -12.0), aspect)
            .with_orientation(0.8, 0.0)
            .with_fov(1.2),
    );

    // ── sky ───────────────────────────────────────────────────────────────

    let source = sky_source(&mut scene.assets, Path::new("assets/skybox"))?;
    let sky_mesh = scene.assets.add_mesh(primitives::cube(1.0));
    scene.sky = Some(SkyDesc {
        source,
        mesh: sky_mesh,
        sampler: clamp,
        vertex_shader: library.sky_vs.clone(),
        pixel_shader: library.sky_ps.clone(),
    });

    log::info!(
        "scene built: {} entities, {} lights, {} cameras",
        scene.entities.len(),
        scene.lights.len(),
        scene.cameras().len()
    );

    Ok(scene)
}

/// Picks the sky source from `dir`: `strip.png` (six faces stacked
/// vertically), else `<face>.png` for every face, else a generated gradient.
fn sky_source(assets: &mut Assets, dir: &Path) -> Result<CubeSource> {
    let strip = dir.join("strip.png");
    if strip.is_file() {
        let data = TextureData::load(&strip)
            .with_context(|| format!("failed to load sky strip {}", strip.display()))?;
        return Ok(CubeSource::Strip(assets.add_texture(data)));
    }

    if !dir.is_dir() {
        log::info!("{} not found, using a generated sky", dir.display());
        let faces = SKY_FACES.map(|name| gradient_face(name, SKY_FACE_SIZE));
        let cube = CubeData::new("generated sky", faces).context("generated sky faces")?;
        return Ok(CubeSource::Cube(assets.add_cube(cube)));
    }

    let mut ids = Vec::with_capacity(6);
    for name in SKY_FACES {
        let path = dir.join(format!("{name}.png"));
        let face = TextureData::load(&path)
            .with_context(|| format!("failed to load sky face {}", path.display()))?;
        ids.push(assets.add_texture(face));
    }
    let ids: [TextureId; 6] = ids
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected six sky faces"))?;
    Ok(CubeSource::Faces(ids))
}

/// Horizon-to-zenith gradient; the top face is all zenith, the bottom all ground.
fn gradient_face(name: &str, size: u32) -> TextureData {
    let zenith = Vec3::new(0.25, 0.45, 0.85);
    let horizon = Vec3::new(0.75, 0.85, 0.95);
    let ground = Vec3::new(0.3, 0.28, 0.25);

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        // Row 0 is the top of the face.
        let v = 1.0 - (y as f32 + 0.5) / size as f32;
        let color = match name {
            "up" => zenith,
            "down" => ground,
            _ if v >= 0.5 => horizon.lerp(zenith, (v - 0.5) * 2.0),
            _ => ground.lerp(horizon, v * 2.0),
        };
        let rgba = [
            (color.x * 255.0) as u8,
            (color.y * 255.0) as u8,
            (color.z * 255.0) as u8,
            255,
        ];
        for _ in 0..size {
            pixels.extend_from_slice(&rgba);
        }
    }

    TextureData {
        label: format!("sky {name}"),
        width: size,
        height: size,
        pixels,
    }
}
