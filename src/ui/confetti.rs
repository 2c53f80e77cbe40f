use super::*;

/// One falling confetti square.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ConfettiPiece {
    /// Horizontal position, percent of the window width.
    pub left_percent: f32,
    pub delay_secs: f32,
    pub fall_secs: f32,
}

impl ConfettiPiece {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> (Self, [u8; 3]) {
        let piece = Self {
            left_percent: rng.gen_range(0.0..100.0),
            delay_secs: rng.gen_range(0.0..0.5),
            fall_secs: rng.gen_range(2.0..4.0),
        };
        (piece, PALETTE[rng.gen_range(0..PALETTE.len())])
    }

    /// Vertical offset (percent of window height) and opacity at `elapsed`
    /// seconds into the burst.  `None` while the piece is still waiting.
    pub fn frame(&self, elapsed: f32) -> Option<(f32, f32)> {
        if elapsed < self.delay_secs {
            return None;
        }
        let t = if self.fall_secs > 0.0 {
            ((elapsed - self.delay_secs) / self.fall_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        Some((eased * 100.0, 1.0 - t))
    }
}

/// Age of the current burst; `None` when no confetti is on screen.
#[derive(Resource, Debug, Default)]
pub struct ConfettiBurst(pub Option<Timer>);

pub fn spawn_confetti(commands: &mut Commands, burst: &mut ConfettiBurst) {
    let mut rng = rand::thread_rng();
    for _ in 0..CONFETTI_COUNT {
        let (piece, [r, g, b]) = ConfettiPiece::random(&mut rng);
        commands.spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(piece.left_percent),
                top: Val::Percent(0.0),
                width: Val::Px(10.0),
                height: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgb_u8(r, g, b)),
            GlobalZIndex(i32::MAX - 1),
            FocusPolicy::Pass,
            Pickable::IGNORE,
            Visibility::Hidden,
            piece,
        ));
    }
    burst.0 = Some(Timer::from_seconds(CONFETTI_CLEAR_SECS, TimerMode::Once));
}

pub fn clear_confetti(
    commands: &mut Commands,
    burst: &mut ConfettiBurst,
    pieces: &Query<Entity, With<ConfettiPiece>>,
) {
    for entity in pieces.iter() {
        commands.entity(entity).despawn();
    }
    burst.0 = None;
}

/// Move every piece down its fall path and remove the burst once it expires.
pub fn animate_confetti(
    mut commands: Commands,
    time: Res<Time>,
    mut burst: ResMut<ConfettiBurst>,
    mut pieces: Query<(&ConfettiPiece, &mut Node, &mut BackgroundColor, &mut Visibility)>,
    all: Query<Entity, With<ConfettiPiece>>,
) {
    let Some(timer) = burst.0.as_mut() else {
        return;
    };
    if timer.tick(time.delta()).just_finished() {
        clear_confetti(&mut commands, &mut burst, &all);
        return;
    }
    let elapsed = timer.elapsed_secs();

    for (piece, mut node, mut color, mut visibility) in pieces.iter_mut() {
        match piece.frame(elapsed) {
            Some((top, alpha)) => {
                node.top = Val::Percent(top);
                color.0.set_alpha(alpha);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn piece() -> ConfettiPiece {
        ConfettiPiece {
            left_percent: 50.0,
            delay_secs: 0.5,
            fall_secs: 2.0,
        }
    }

    #[test]
    fn waits_for_its_delay() {
        assert_eq!(piece().frame(0.2), None);
        assert_eq!(piece().frame(0.5), Some((0.0, 1.0)));
    }

    #[test]
    fn falls_to_the_bottom_and_fades_out() {
        let (top, alpha) = piece().frame(2.5).expect("started");
        assert_eq!(top, 100.0);
        assert_eq!(alpha, 0.0);
        // Past the end it stays down.
        assert_eq!(piece().frame(10.0), Some((100.0, 0.0)));
    }

    #[test]
    fn fall_eases_out() {
        let (halfway, alpha) = piece().frame(1.5).expect("started");
        assert!(halfway > 50.0);
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn random_pieces_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let (p, color) = ConfettiPiece::random(&mut rng);
            assert!((0.0..100.0).contains(&p.left_percent));
            assert!((0.0..0.5).contains(&p.delay_secs));
            assert!((2.0..4.0).contains(&p.fall_secs));
            assert!(PALETTE.contains(&color));
        }
    }
}
