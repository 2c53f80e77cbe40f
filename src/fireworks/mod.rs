//! Fireworks overlay: launch, burst, and trail-fade animation over the page.
//!
//! ## Design
//!
//! The engine is split into three layers:
//!
//! | Module      | Purpose                                                     |
//! |-------------|-------------------------------------------------------------|
//! | [`sim`]     | Pure `step(scene) -> scene` physics, no graphics at all     |
//! | [`render`]  | Draws a scene onto any [`render::Surface`]                  |
//! | [`trails`]  | Retained marks with alpha fade, the surface used at runtime |
//!
//! The marks are mirrored onto pooled `Mesh2d` entities (one shared circle
//! mesh, one shared unit-quad mesh for strokes) on their own render layer.  A
//! second 2D camera draws that layer after the page camera without clearing,
//! so the fireworks sit above the UI and never take input.
//!
//! ## State machine
//!
//! [`FireworksState`] is the activation signal.  The page composition layer
//! requests `Active` when a draw is revealed and `Inactive` on reset or when a
//! new spin starts.
//!
//! | System                   | Schedule                  | Purpose                                   |
//! |--------------------------|---------------------------|-------------------------------------------|
//! | `acquire_frame_loop`     | `OnEnter(Active)`         | Create the trail layer and overlay rig    |
//! | `release_frame_loop`     | `OnExit(Active)`          | Drop the scene and the overlay at once    |
//! | `resize_surface_system`  | `Update / in Active`      | Reset the trail layer to the new size     |
//! | `fireworks_frame_system` | `Update / in Active`      | Step the scene and draw it                |
//! | `sync_overlay_system`    | `Update / in Active`      | Mirror marks onto the pooled entities     |
//!
//! [`FrameLoop`] is the single owned handle for an active run.  It only exists
//! between `OnEnter(Active)` and `OnExit(Active)`; removing it (or tearing the
//! world down) releases the trail layer and the overlay rig.

pub mod render;
pub mod sim;
pub mod trails;

use std::collections::HashMap;

use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::FireworksConfig;
use crate::constants::{
    FALLBACK_VIEWPORT_HEIGHT, FALLBACK_VIEWPORT_WIDTH, FIREWORKS_RENDER_LAYER, MARK_ALPHA_LEVELS,
};
pub use sim::FireworksScene;
use trails::{Mark, MarkShape, TrailLayer};

/// Draw order of the overlay camera; the page camera keeps the default 0.
pub const OVERLAY_CAMERA_ORDER: isize = 1;

/// Depth between consecutive marks so newer marks draw on top.
const MARK_Z_STEP: f32 = 0.01;

// ── State ─────────────────────────────────────────────────────────────────────

/// Activation signal for the overlay.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FireworksState {
    /// No frames are scheduled and the scene is empty.
    #[default]
    Inactive,
    /// The frame loop runs every `Update`.
    Active,
}

// ── Resources & components ────────────────────────────────────────────────────

/// Marks the overlay camera.
#[derive(Component)]
pub struct FireworksOverlay;

/// A pooled entity showing one trail mark.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailMark {
    Circle,
    Line,
}

/// Rendering side of an active run: the overlay camera, the shared meshes,
/// the mark entity pools and one material per quantized colour.
#[derive(Debug)]
pub struct OverlayRig {
    pub camera: Entity,
    circle_mesh: Handle<Mesh>,
    line_mesh: Handle<Mesh>,
    circles: Vec<Entity>,
    lines: Vec<Entity>,
    materials: HashMap<MaterialKey, Handle<ColorMaterial>>,
}

/// Colour and alpha level of a mark material.
type MaterialKey = ([u8; 3], u8);

impl OverlayRig {
    /// Every entity the rig spawned, camera included.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        std::iter::once(self.camera)
            .chain(self.circles.iter().copied())
            .chain(self.lines.iter().copied())
    }

    fn material(&mut self, mark: &Mark, assets: &mut Assets<ColorMaterial>) -> Handle<ColorMaterial> {
        let level = alpha_level(mark.alpha);
        self.materials
            .entry((mark.color, level))
            .or_insert_with(|| {
                let [r, g, b] = mark.color;
                assets.add(ColorMaterial::from_color(Color::srgba(
                    f32::from(r) / 255.0,
                    f32::from(g) / 255.0,
                    f32::from(b) / 255.0,
                    f32::from(level) / f32::from(MARK_ALPHA_LEVELS),
                )))
            })
            .clone()
    }
}

/// Everything an active run owns: the trail layer, the overlay rig and the
/// random source.
#[derive(Resource)]
pub struct FrameLoop {
    pub trails: TrailLayer,
    /// Logical viewport size used by the simulation.
    pub viewport: Vec2,
    /// `None` when no mesh or material assets exist (headless runs).
    pub rig: Option<OverlayRig>,
    rng: StdRng,
}

impl FrameLoop {
    /// A frame loop without an overlay rig, sized to `viewport`.
    pub fn new(viewport: Vec2) -> Self {
        Self::with_rng(viewport, StdRng::from_entropy())
    }

    pub fn with_rng(viewport: Vec2, rng: StdRng) -> Self {
        Self {
            trails: TrailLayer::new(viewport),
            viewport,
            rig: None,
            rng,
        }
    }

    /// Reset the surface for a new viewport.  Drawn marks are discarded;
    /// the scene itself lives elsewhere and is unaffected.
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.trails.resize(viewport);
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        debug!(
            "Fireworks frame loop released ({}x{})",
            self.viewport.x, self.viewport.y
        );
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct FireworksPlugin;

impl Plugin for FireworksPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<FireworksState>()
            .init_resource::<FireworksConfig>()
            .init_resource::<FireworksScene>()
            .add_message::<WindowResized>()
            .add_systems(OnEnter(FireworksState::Active), acquire_frame_loop)
            .add_systems(OnExit(FireworksState::Active), release_frame_loop)
            .add_systems(
                Update,
                (
                    resize_surface_system,
                    fireworks_frame_system,
                    sync_overlay_system,
                )
                    .chain()
                    .run_if(in_state(FireworksState::Active)),
            );
    }
}

// ── OnEnter / OnExit ──────────────────────────────────────────────────────────

/// Acquire the frame loop: size the trail layer to the primary window (or the
/// fallback viewport when there is none) and build the overlay rig.
pub fn acquire_frame_loop(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<Res<Assets<ColorMaterial>>>,
    mut scene: ResMut<FireworksScene>,
) {
    let viewport = windows
        .single()
        .map(|window| Vec2::new(window.width(), window.height()))
        .unwrap_or(Vec2::new(FALLBACK_VIEWPORT_WIDTH, FALLBACK_VIEWPORT_HEIGHT));

    *scene = FireworksScene::default();
    let mut frame = FrameLoop::new(viewport);

    match (meshes, materials) {
        (Some(mut meshes), Some(_)) => {
            let camera = commands
                .spawn((
                    Camera2d,
                    Camera {
                        order: OVERLAY_CAMERA_ORDER,
                        clear_color: ClearColorConfig::None,
                        ..default()
                    },
                    RenderLayers::layer(FIREWORKS_RENDER_LAYER),
                    FireworksOverlay,
                ))
                .id();
            frame.rig = Some(OverlayRig {
                camera,
                circle_mesh: meshes.add(Circle::new(1.0)),
                line_mesh: meshes.add(Rectangle::new(1.0, 1.0)),
                circles: Vec::new(),
                lines: Vec::new(),
                materials: HashMap::new(),
            });
        }
        _ => debug!("No mesh or material assets available; fireworks run without an overlay"),
    }

    info!("Fireworks active ({}x{})", viewport.x, viewport.y);
    commands.insert_resource(frame);
}

/// Release the frame loop: the live scene is emptied immediately (no
/// fade-out), the overlay camera and every mark entity are despawned, and the
/// [`FrameLoop`] resource is removed so no further frames run.
pub fn release_frame_loop(
    mut commands: Commands,
    frame: Option<Res<FrameLoop>>,
    mut scene: ResMut<FireworksScene>,
) {
    *scene = FireworksScene::default();

    if let Some(rig) = frame.as_ref().and_then(|frame| frame.rig.as_ref()) {
        for entity in rig.entities() {
            if let Ok(mut entity) = commands.get_entity(entity) {
                entity.despawn();
            }
        }
    }

    commands.remove_resource::<FrameLoop>();
    info!("Fireworks inactive");
}

// ── Update (Active only) ──────────────────────────────────────────────────────

/// Track window size changes.  Only the latest resize of a frame matters.
pub fn resize_surface_system(
    mut resized: MessageReader<WindowResized>,
    frame: Option<ResMut<FrameLoop>>,
) {
    let Some(last) = resized.read().last() else {
        return;
    };
    let Some(mut frame) = frame else {
        return;
    };
    frame.resize(Vec2::new(last.width, last.height));
    debug!("Fireworks surface resized to {}x{}", last.width, last.height);
}

/// Advance the scene by one step and draw it onto the trail layer.
pub fn fireworks_frame_system(
    frame: Option<ResMut<FrameLoop>>,
    mut scene: ResMut<FireworksScene>,
    config: Res<FireworksConfig>,
) {
    let Some(mut frame) = frame else {
        return;
    };
    let frame = &mut *frame;

    if frame.trails.budget() != config.trail_mark_budget {
        frame.trails.set_budget(config.trail_mark_budget);
    }
    *scene = sim::step(&scene, &config, frame.viewport, &mut frame.rng);
    render::draw_scene(&scene, &config, &mut frame.trails);
}

/// Mirror the trail layer onto the pooled mark entities.
///
/// Mark `i` (oldest first) goes to the next free entity of its shape at depth
/// `i * MARK_Z_STEP`.  Pools only grow; entities without a mark this frame
/// are hidden.
#[allow(clippy::type_complexity)]
pub fn sync_overlay_system(
    mut commands: Commands,
    frame: Option<ResMut<FrameLoop>>,
    materials: Option<ResMut<Assets<ColorMaterial>>>,
    mut entities: Query<
        (
            &mut Transform,
            &mut MeshMaterial2d<ColorMaterial>,
            &mut Visibility,
        ),
        With<TrailMark>,
    >,
) {
    let (Some(mut frame), Some(mut materials)) = (frame, materials) else {
        return;
    };
    let FrameLoop {
        trails,
        viewport,
        rig,
        ..
    } = &mut *frame;
    let Some(rig) = rig.as_mut() else {
        return;
    };

    let mut used_circles = 0;
    let mut used_lines = 0;
    for (i, mark) in trails.marks().enumerate() {
        let transform = mark_transform(mark, *viewport, i as f32 * MARK_Z_STEP);
        let material = rig.material(mark, &mut materials);
        let (kind, slot) = match mark.shape {
            MarkShape::Circle { .. } => {
                used_circles += 1;
                (TrailMark::Circle, used_circles - 1)
            }
            MarkShape::Line { .. } => {
                used_lines += 1;
                (TrailMark::Line, used_lines - 1)
            }
        };
        let (pool, mesh) = match kind {
            TrailMark::Circle => (&mut rig.circles, &rig.circle_mesh),
            TrailMark::Line => (&mut rig.lines, &rig.line_mesh),
        };

        match pool.get(slot) {
            Some(entity) => {
                if let Ok((mut current, mut current_material, mut visibility)) =
                    entities.get_mut(*entity)
                {
                    *current = transform;
                    if current_material.0 != material {
                        current_material.0 = material;
                    }
                    visibility.set_if_neq(Visibility::Inherited);
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        Mesh2d(mesh.clone()),
                        MeshMaterial2d(material),
                        transform,
                        Visibility::Inherited,
                        RenderLayers::layer(FIREWORKS_RENDER_LAYER),
                        kind,
                    ))
                    .id();
                pool.push(entity);
            }
        }
    }

    let unused = rig
        .circles
        .iter()
        .skip(used_circles)
        .chain(rig.lines.iter().skip(used_lines));
    for entity in unused {
        if let Ok((_, _, mut visibility)) = entities.get_mut(*entity) {
            visibility.set_if_neq(Visibility::Hidden);
        }
    }
}

/// Surface coordinates (origin top-left, `y` down) to world coordinates of
/// a 2D camera centred on the window (origin centre, `y` up).
pub fn surface_to_world(point: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(point.x - viewport.x / 2.0, viewport.y / 2.0 - point.y)
}

/// Transform placing the unit circle or unit quad mesh over `mark`.
pub fn mark_transform(mark: &Mark, viewport: Vec2, z: f32) -> Transform {
    match mark.shape {
        MarkShape::Circle { center, radius } => {
            Transform::from_translation(surface_to_world(center, viewport).extend(z))
                .with_scale(Vec3::new(radius, radius, 1.0))
        }
        MarkShape::Line { from, to, width } => {
            let a = surface_to_world(from, viewport);
            let b = surface_to_world(to, viewport);
            let delta = b - a;
            Transform {
                translation: ((a + b) / 2.0).extend(z),
                rotation: Quat::from_rotation_z(delta.y.atan2(delta.x)),
                scale: Vec3::new(delta.length(), width, 1.0),
            }
        }
    }
}

/// Alpha quantized to `1..=MARK_ALPHA_LEVELS`.
fn alpha_level(alpha: f32) -> u8 {
    let levels = f32::from(MARK_ALPHA_LEVELS);
    (alpha.clamp(0.0, 1.0) * levels).round().clamp(1.0, levels) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use render::Surface;

    fn circle(center: Vec2, radius: f32) -> Mark {
        Mark {
            shape: MarkShape::Circle { center, radius },
            color: [255, 0, 0],
            alpha: 1.0,
        }
    }

    #[test]
    fn frame_loop_layer_matches_viewport() {
        let frame = FrameLoop::new(Vec2::new(320.0, 200.0));
        assert_eq!(frame.trails.size(), Vec2::new(320.0, 200.0));
        assert!(frame.trails.is_empty());
        assert!(frame.rig.is_none());
    }

    #[test]
    fn resize_discards_drawn_marks() {
        let mut frame = FrameLoop::new(Vec2::new(64.0, 64.0));
        frame
            .trails
            .fill_circle(Vec2::splat(32.0), 8.0, [255; 3], 1.0);
        frame.resize(Vec2::new(100.0, 50.0));
        assert_eq!(frame.viewport, Vec2::new(100.0, 50.0));
        assert_eq!(frame.trails.size(), Vec2::new(100.0, 50.0));
        assert!(frame.trails.is_empty());
    }

    #[test]
    fn surface_corners_map_to_window_corners() {
        let viewport = Vec2::new(800.0, 600.0);
        assert_eq!(surface_to_world(Vec2::ZERO, viewport), Vec2::new(-400.0, 300.0));
        assert_eq!(surface_to_world(viewport, viewport), Vec2::new(400.0, -300.0));
        assert_eq!(surface_to_world(viewport / 2.0, viewport), Vec2::ZERO);
    }

    #[test]
    fn circle_transform_scales_the_unit_mesh() {
        let t = mark_transform(&circle(Vec2::new(10.0, 20.0), 3.0), Vec2::new(100.0, 100.0), 0.5);
        assert_eq!(t.translation, Vec3::new(-40.0, 30.0, 0.5));
        assert_eq!(t.scale, Vec3::new(3.0, 3.0, 1.0));
    }

    #[test]
    fn vertical_stroke_is_a_rotated_quad() {
        let mark = Mark {
            shape: MarkShape::Line {
                from: Vec2::new(50.0, 100.0),
                to: Vec2::new(50.0, 40.0),
                width: 2.0,
            },
            color: [255; 3],
            alpha: 0.6,
        };
        let t = mark_transform(&mark, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(t.translation, Vec3::new(0.0, -20.0, 0.0));
        assert!((t.scale.x - 60.0).abs() < 1e-4);
        assert_eq!(t.scale.y, 2.0);
        // Rising stroke: +90 degrees about z.
        let along = t.rotation * Vec3::X;
        assert!((along.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn alpha_levels_never_reach_zero() {
        assert_eq!(alpha_level(1.0), MARK_ALPHA_LEVELS);
        assert_eq!(alpha_level(0.0), 1);
        assert_eq!(alpha_level(0.5), MARK_ALPHA_LEVELS / 2);
    }
}
