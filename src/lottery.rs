//! Lottery number generation and the spinning-digits animation.
//!
//! A draw is a uniformly random integer in `[1, max_range]`, zero-padded to
//! the digit width of `max_range`.  While the spinner rolls, every tick shows
//! a fresh set of random digits; the final tick settles on the real draw.
//!
//! ## States
//!
//! | State      | Description                                         |
//! |------------|-----------------------------------------------------|
//! | `Idle`     | Initial state; digits show zeros                    |
//! | `Spinning` | Digits roll every `SPIN_TICK_MS`                    |
//! | `Revealed` | Final draw is shown; a [`DrawCompleted`] was sent   |
//!
//! ## Systems (registered by `LotteryPlugin`)
//!
//! | System                  | Schedule               | Purpose                           |
//! |-------------------------|------------------------|-----------------------------------|
//! | `handle_spin_requests`  | `Update`               | Start a spin unless one is running |
//! | `spin_tick_system`      | `Update / in Spinning` | Roll digits, settle, announce     |
//! | `handle_reset_requests` | `Update`               | Zero the digits and go `Idle`     |
//! | `auto_spin_system`      | `Update`               | Periodic spins when enabled       |

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use crate::constants::SPIN_TICK_MS;
use crate::storage::ActiveSettings;

// ── Pure draw helpers ─────────────────────────────────────────────────────────

/// Number of decimal digits needed to print `max_range` (at least 1).
pub fn digit_width(max_range: u32) -> usize {
    let mut width = 1;
    let mut rest = max_range / 10;
    while rest > 0 {
        width += 1;
        rest /= 10;
    }
    width
}

/// Uniform draw in `[1, max_range]`; a `max_range` of 0 behaves like 1.
pub fn draw_number<R: Rng + ?Sized>(rng: &mut R, max_range: u32) -> u32 {
    rng.gen_range(1..=max_range.max(1))
}

/// Zero-padded decimal digits of `value`, most significant first.
///
/// Values wider than `width` keep only their lowest `width` digits.
pub fn to_digits(value: u32, width: usize) -> Vec<u8> {
    let mut digits = vec![0_u8; width];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = (rest % 10) as u8;
        rest /= 10;
    }
    digits
}

/// `width` independent random digits, used while the spinner rolls.
pub fn scramble<R: Rng + ?Sized>(rng: &mut R, width: usize) -> Vec<u8> {
    (0..width).map(|_| rng.gen_range(0..10_u8)).collect()
}

/// Join digits into the string shown on the result banner.
pub fn format_digits(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d % 10)).collect()
}

/// Ticks in a spin of `duration_ms`; always at least one.
pub fn total_ticks(duration_ms: u64) -> u32 {
    (duration_ms / SPIN_TICK_MS).clamp(1, u64::from(u32::MAX)) as u32
}

// ── Spin machine ──────────────────────────────────────────────────────────────

/// Outcome of one spinner tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinTick {
    /// Intermediate random digits.
    Rolling(Vec<u8>),
    /// The final draw.  Produced exactly once per spin.
    Settled { value: u32, digits: Vec<u8> },
}

/// Tick counter behind the spinner animation.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct SpinMachine {
    remaining: u32,
    rolling: bool,
}

impl SpinMachine {
    /// Begin a spin lasting `ticks` ticks, the last of which settles.
    pub fn start(&mut self, ticks: u32) {
        self.remaining = ticks.max(1);
        self.rolling = true;
    }

    #[inline]
    pub fn is_rolling(&self) -> bool {
        self.rolling
    }

    /// Advance one tick.  Returns `None` when no spin is in progress.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, max_range: u32) -> Option<SpinTick> {
        if !self.rolling {
            return None;
        }
        let width = digit_width(max_range);
        if self.remaining > 1 {
            self.remaining -= 1;
            return Some(SpinTick::Rolling(scramble(rng, width)));
        }
        self.remaining = 0;
        self.rolling = false;
        let value = draw_number(rng, max_range);
        Some(SpinTick::Settled {
            value,
            digits: to_digits(value, width),
        })
    }
}

// ── Bevy surface ──────────────────────────────────────────────────────────────

/// Spinner lifecycle.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    Revealed,
}

/// Digits currently on the cards and the last settled draw.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct LotteryDisplay {
    pub digits: Vec<u8>,
    pub last_draw: Option<u32>,
}

/// Ask for a new spin.  Ignored while a spin is running.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct SpinRequested;

/// Return to the idle, all-zero display.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ResetRequested;

/// Sent once when a spin settles on its final draw.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct DrawCompleted {
    pub value: u32,
    pub digits: Vec<u8>,
}

/// Paces the rolling digits.
#[derive(Resource, Debug, Clone)]
pub struct SpinTimer(pub Timer);

impl Default for SpinTimer {
    fn default() -> Self {
        Self(Timer::new(
            Duration::from_millis(SPIN_TICK_MS),
            TimerMode::Repeating,
        ))
    }
}

/// Countdown to the next automatic spin.
#[derive(Resource, Debug, Clone, Default)]
pub struct AutoSpinTimer(pub Option<Timer>);

pub struct LotteryPlugin;

impl Plugin for LotteryPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SpinPhase>()
            .init_resource::<ActiveSettings>()
            .init_resource::<SpinMachine>()
            .init_resource::<SpinTimer>()
            .init_resource::<AutoSpinTimer>()
            .init_resource::<LotteryDisplay>()
            .add_message::<SpinRequested>()
            .add_message::<ResetRequested>()
            .add_message::<DrawCompleted>()
            .add_systems(Startup, reset_display)
            .add_systems(
                Update,
                (
                    auto_spin_system,
                    handle_spin_requests,
                    spin_tick_system.run_if(in_state(SpinPhase::Spinning)),
                    handle_reset_requests,
                )
                    .chain(),
            );
    }
}

fn reset_display(settings: Res<ActiveSettings>, mut display: ResMut<LotteryDisplay>) {
    display.digits = vec![0; digit_width(settings.0.max_range)];
    display.last_draw = None;
}

/// Start a spin on request unless one is already rolling.
pub fn handle_spin_requests(
    mut requests: MessageReader<SpinRequested>,
    phase: Res<State<SpinPhase>>,
    settings: Res<ActiveSettings>,
    mut machine: ResMut<SpinMachine>,
    mut timer: ResMut<SpinTimer>,
    mut next_phase: ResMut<NextState<SpinPhase>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if *phase.get() == SpinPhase::Spinning || machine.is_rolling() {
        debug!("Spin requested while already spinning; ignored");
        return;
    }

    let ticks = total_ticks(settings.0.spin_duration_ms);
    machine.start(ticks);
    timer.0.reset();
    next_phase.set(SpinPhase::Spinning);
    info!("Spin started ({} ticks)", ticks);
}

/// Roll the digits on every elapsed tick and settle on the final draw.
pub fn spin_tick_system(
    time: Res<Time>,
    settings: Res<ActiveSettings>,
    mut timer: ResMut<SpinTimer>,
    mut machine: ResMut<SpinMachine>,
    mut display: ResMut<LotteryDisplay>,
    mut completed: MessageWriter<DrawCompleted>,
    mut next_phase: ResMut<NextState<SpinPhase>>,
) {
    timer.0.tick(time.delta());
    let mut rng = rand::thread_rng();

    for _ in 0..timer.0.times_finished_this_tick() {
        match machine.tick(&mut rng, settings.0.max_range) {
            Some(SpinTick::Rolling(digits)) => display.digits = digits,
            Some(SpinTick::Settled { value, digits }) => {
                info!("Draw settled on {}", format_digits(&digits));
                display.digits = digits.clone();
                display.last_draw = Some(value);
                completed.write(DrawCompleted { value, digits });
                next_phase.set(SpinPhase::Revealed);
                break;
            }
            None => break,
        }
    }
}

/// Return to `Idle` with zeroed digits.  A running spin is abandoned.
pub fn handle_reset_requests(
    mut requests: MessageReader<ResetRequested>,
    settings: Res<ActiveSettings>,
    mut machine: ResMut<SpinMachine>,
    mut display: ResMut<LotteryDisplay>,
    mut next_phase: ResMut<NextState<SpinPhase>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    *machine = SpinMachine::default();
    display.digits = vec![0; digit_width(settings.0.max_range)];
    display.last_draw = None;
    next_phase.set(SpinPhase::Idle);
}

/// Request a spin every `auto_spin_interval_secs` while auto-spin is on and
/// the spinner is not already rolling.
pub fn auto_spin_system(
    time: Res<Time>,
    settings: Res<ActiveSettings>,
    phase: Res<State<SpinPhase>>,
    mut auto: ResMut<AutoSpinTimer>,
    mut requests: MessageWriter<SpinRequested>,
) {
    if !settings.0.auto_spin {
        auto.0 = None;
        return;
    }

    let interval = Duration::from_secs(u64::from(settings.0.auto_spin_interval_secs.max(1)));
    let timer = auto
        .0
        .get_or_insert_with(|| Timer::new(interval, TimerMode::Repeating));
    if timer.duration() != interval {
        timer.set_duration(interval);
    }
    if *phase.get() == SpinPhase::Spinning {
        return;
    }
    if timer.tick(time.delta()).just_finished() {
        requests.write(SpinRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn digit_width_counts_decimal_digits() {
        assert_eq!(digit_width(0), 1);
        assert_eq!(digit_width(9), 1);
        assert_eq!(digit_width(10), 2);
        assert_eq!(digit_width(99_999), 5);
        assert_eq!(digit_width(100_000), 6);
    }

    #[test]
    fn to_digits_zero_pads() {
        assert_eq!(to_digits(42, 5), vec![0, 0, 0, 4, 2]);
        assert_eq!(to_digits(0, 3), vec![0, 0, 0]);
        assert_eq!(to_digits(12_345, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn to_digits_keeps_low_digits_when_too_wide() {
        assert_eq!(to_digits(123_456, 3), vec![4, 5, 6]);
    }

    #[test]
    fn format_digits_joins_without_separators() {
        assert_eq!(format_digits(&[0, 0, 7, 1, 9]), "00719");
    }

    #[test]
    fn draws_stay_within_one_and_max_range() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..2_000 {
            let v = draw_number(&mut rng, 12);
            assert!((1..=12).contains(&v));
        }
        assert_eq!(draw_number(&mut rng, 0), 1);
    }

    #[test]
    fn total_ticks_matches_the_classic_spin() {
        assert_eq!(total_ticks(2_460), 41);
        assert_eq!(total_ticks(0), 1);
    }

    #[test]
    fn machine_rolls_then_settles_exactly_once() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut machine = SpinMachine::default();
        assert_eq!(machine.tick(&mut rng, 99_999), None);

        machine.start(4);
        for _ in 0..3 {
            match machine.tick(&mut rng, 99_999) {
                Some(SpinTick::Rolling(d)) => {
                    assert_eq!(d.len(), 5);
                    assert!(d.iter().all(|x| *x < 10));
                }
                other => panic!("expected rolling tick, got {other:?}"),
            }
        }
        match machine.tick(&mut rng, 99_999) {
            Some(SpinTick::Settled { value, digits }) => {
                assert!((1..=99_999).contains(&value));
                assert_eq!(digits, to_digits(value, 5));
            }
            other => panic!("expected settled tick, got {other:?}"),
        }
        assert!(!machine.is_rolling());
        assert_eq!(machine.tick(&mut rng, 99_999), None);
    }

    #[test]
    fn single_tick_spin_settles_immediately() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut machine = SpinMachine::default();
        machine.start(0);
        assert!(matches!(
            machine.tick(&mut rng, 9),
            Some(SpinTick::Settled { .. })
        ));
    }
}
