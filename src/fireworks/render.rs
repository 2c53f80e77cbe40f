//! Drawing a [`FireworksScene`] onto a [`Surface`].
//!
//! Rendering never mutates the scene; it only reads positions, ages and
//! colours.  The surface is a trait so the frame pipeline can be exercised
//! against a recording double in tests; at runtime it is the retained
//! [`TrailLayer`](super::trails::TrailLayer).

use bevy::math::Vec2;

use super::sim::FireworksScene;
use crate::config::FireworksConfig;

/// Colour of the launch trail (warm white).
pub const TRAIL_COLOR: [u8; 3] = [255, 244, 214];

/// Minimal 2D drawing API the engine needs.
pub trait Surface {
    /// Surface size in pixels.  A zero dimension means "nothing to draw on".
    fn size(&self) -> Vec2;

    /// Cover the whole surface with a translucent fill of opacity `alpha`,
    /// fading previously drawn content instead of clearing it.
    fn fade(&mut self, alpha: f32);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: [u8; 3], width: f32, alpha: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [u8; 3], alpha: f32);
}

/// Draw one frame: trail fade, rocket trails, then every particle.
///
/// A surface with a zero dimension is treated as not attached: the call
/// returns without drawing anything.
pub fn draw_scene<S: Surface + ?Sized>(
    scene: &FireworksScene,
    params: &FireworksConfig,
    surface: &mut S,
) {
    let size = surface.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return;
    }

    surface.fade(params.trail_fade_alpha);

    for firework in scene.fireworks.iter().filter(|fw| !fw.exploded) {
        surface.stroke_line(
            Vec2::new(firework.position.x, size.y),
            firework.position,
            TRAIL_COLOR,
            params.trail_width,
            params.trail_opacity,
        );
    }

    for particle in scene.fireworks.iter().flat_map(|fw| fw.particles.iter()) {
        let opacity = particle.opacity();
        if opacity <= 0.0 {
            continue;
        }
        // Glow halo first so the solid core stays crisp on top.
        surface.fill_circle(
            particle.position,
            particle.radius * params.glow_scale,
            particle.color,
            opacity * params.glow_opacity,
        );
        surface.fill_circle(particle.position, particle.radius, particle.color, opacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::trails::{MarkShape, TrailLayer};
    use crate::fireworks::sim::{Firework, Particle};

    #[derive(Debug, PartialEq)]
    enum Call {
        Fade,
        Line { to: Vec2 },
        Circle { alpha: f32 },
    }

    struct Recorder {
        size: Vec2,
        calls: Vec<Call>,
    }

    impl Surface for Recorder {
        fn size(&self) -> Vec2 {
            self.size
        }
        fn fade(&mut self, _alpha: f32) {
            self.calls.push(Call::Fade);
        }
        fn stroke_line(&mut self, _from: Vec2, to: Vec2, _c: [u8; 3], _w: f32, _a: f32) {
            self.calls.push(Call::Line { to });
        }
        fn fill_circle(&mut self, _center: Vec2, _r: f32, _c: [u8; 3], alpha: f32) {
            self.calls.push(Call::Circle { alpha });
        }
    }

    fn particle_at(position: Vec2, age: u32) -> Particle {
        Particle {
            position,
            velocity: Vec2::ZERO,
            age,
            max_life: 10,
            color: [0, 255, 0],
            radius: 2.0,
            gravity: 0.0,
            friction: 0.9,
        }
    }

    fn mixed_scene() -> FireworksScene {
        FireworksScene {
            fireworks: vec![
                Firework::launch(30.0, 100.0, 0),
                Firework {
                    position: Vec2::new(50.0, 20.0),
                    particles: vec![particle_at(Vec2::new(50.0, 20.0), 5)],
                    exploded: true,
                    created_at: 0,
                },
            ],
            frame: 0,
        }
    }

    #[test]
    fn frame_fades_before_drawing_trails_and_particles() {
        let mut surface = Recorder {
            size: Vec2::new(100.0, 100.0),
            calls: Vec::new(),
        };
        draw_scene(&mixed_scene(), &FireworksConfig::default(), &mut surface);

        assert_eq!(surface.calls.len(), 4);
        assert_eq!(surface.calls[0], Call::Fade);
        assert_eq!(
            surface.calls[1],
            Call::Line {
                to: Vec2::new(30.0, 100.0)
            }
        );
        // Halo then core, the core at the particle's linear-fade opacity.
        assert_eq!(surface.calls[3], Call::Circle { alpha: 0.5 });
    }

    #[test]
    fn detached_surface_receives_no_calls() {
        let mut surface = Recorder {
            size: Vec2::ZERO,
            calls: Vec::new(),
        };
        draw_scene(&mixed_scene(), &FireworksConfig::default(), &mut surface);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn particles_land_on_the_layer_in_their_colour() {
        let mut layer = TrailLayer::new(Vec2::new(100.0, 100.0));
        draw_scene(&mixed_scene(), &FireworksConfig::default(), &mut layer);

        let cores: Vec<_> = layer
            .marks()
            .filter(|m| m.color == [0, 255, 0])
            .filter_map(|m| match m.shape {
                MarkShape::Circle { center, radius } => Some((center, radius, m.alpha)),
                MarkShape::Line { .. } => None,
            })
            .collect();
        // Halo then core.
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[1], (Vec2::new(50.0, 20.0), 2.0, 0.5));
        assert!(cores[0].1 > cores[1].1);
    }

    #[test]
    fn trail_runs_from_the_bottom_edge_to_the_rocket() {
        let scene = FireworksScene {
            fireworks: vec![Firework {
                position: Vec2::new(30.0, 60.0),
                particles: Vec::new(),
                exploded: false,
                created_at: 0,
            }],
            frame: 0,
        };
        let mut layer = TrailLayer::new(Vec2::new(100.0, 100.0));
        draw_scene(&scene, &FireworksConfig::default(), &mut layer);

        let marks: Vec<_> = layer.marks().copied().collect();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].color, TRAIL_COLOR);
        assert_eq!(
            marks[0].shape,
            MarkShape::Line {
                from: Vec2::new(30.0, 100.0),
                to: Vec2::new(30.0, 60.0),
                width: FireworksConfig::default().trail_width,
            }
        );
    }

    #[test]
    fn consecutive_frames_fade_earlier_marks() {
        let config = FireworksConfig::default();
        let mut layer = TrailLayer::new(Vec2::new(100.0, 100.0));
        draw_scene(&mixed_scene(), &config, &mut layer);
        let first = layer.len();
        draw_scene(&mixed_scene(), &config, &mut layer);

        assert_eq!(layer.len(), first * 2);
        let older = layer.marks().next().map(|m| m.alpha).unwrap_or_default();
        let newer = layer.marks().nth(first).map(|m| m.alpha).unwrap_or_default();
        assert!((older - newer * (1.0 - config.trail_fade_alpha)).abs() < 1e-6);
    }
}
