//! Headless tests for the draw flow across plugins: spinner, persistence,
//! page reactions and the fireworks activation signal.
//!
//! Time advances by one spin tick per `update()` through
//! `TimeUpdateStrategy::ManualDuration`, and every app stores its data in a
//! fresh temporary directory.

use std::fs;
use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use luckydraw::audio::AudioCuePlugin;
use luckydraw::fireworks::{FireworksPlugin, FireworksState, FrameLoop};
use luckydraw::lottery::{LotteryDisplay, LotteryPlugin, ResetRequested, SpinPhase, SpinRequested};
use luckydraw::storage::{
    HistoryView, RemoveFavoriteRequested, SaveFavoriteRequested, Storage, StoragePlugin,
};
use luckydraw::ui::{ConfettiPiece, PagePlugin};
use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Full app without windowing, with `settings` written to the data directory
/// before the storage plugin opens it.
fn flow_app(settings: &str) -> (TempDir, App) {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("app_settings.toml"), settings).expect("write settings");

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(60)))
        .add_plugins(StoragePlugin {
            root: dir.path().to_path_buf(),
        })
        .add_plugins((LotteryPlugin, AudioCuePlugin, FireworksPlugin, PagePlugin));
    app.update();
    (dir, app)
}

fn phase(app: &App) -> SpinPhase {
    *app.world().resource::<State<SpinPhase>>().get()
}

fn fireworks(app: &App) -> FireworksState {
    *app.world().resource::<State<FireworksState>>().get()
}

fn confetti_count(app: &mut App) -> usize {
    app.world_mut()
        .query::<&ConfettiPiece>()
        .iter(app.world())
        .count()
}

fn request_spin(app: &mut App) {
    app.world_mut()
        .resource_mut::<Messages<SpinRequested>>()
        .write(SpinRequested);
}

fn request_reset(app: &mut App) {
    app.world_mut()
        .resource_mut::<Messages<ResetRequested>>()
        .write(ResetRequested);
}

/// Update until `target` is reached or `max_frames` have passed.
fn run_until(app: &mut App, target: SpinPhase, max_frames: usize) -> bool {
    for _ in 0..max_frames {
        app.update();
        if phase(app) == target {
            return true;
        }
    }
    false
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn persisted_settings_shape_the_display() {
    let (_dir, mut app) = flow_app("max_range = 999\n");
    app.update();
    assert!(app.world().get_resource::<Storage>().is_some());
    let display = app.world().resource::<LotteryDisplay>();
    assert_eq!(display.digits, vec![0, 0, 0]);
    assert_eq!(phase(&app), SpinPhase::Idle);
    assert_eq!(fireworks(&app), FireworksState::Inactive);
}

#[test]
fn spin_reveals_a_draw_and_starts_the_celebration() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 180\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Spinning, 3));
    assert!(run_until(&mut app, SpinPhase::Revealed, 10));
    for _ in 0..3 {
        app.update();
    }

    let display = app.world().resource::<LotteryDisplay>().clone();
    let value = display.last_draw.expect("a settled draw");
    assert!((1..=99_999).contains(&value));
    assert_eq!(display.digits.len(), 5);

    assert_eq!(fireworks(&app), FireworksState::Active);
    assert!(app.world().get_resource::<FrameLoop>().is_some());
    assert_eq!(confetti_count(&mut app), 100);

    let history = app.world().resource::<HistoryView>();
    assert_eq!(history.recent.len(), 1);
    assert_eq!(history.recent[0].numbers, display.digits);
    assert_eq!(history.stats.total_games, 1);
}

#[test]
fn spin_requests_are_ignored_while_spinning() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 600\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Spinning, 3));
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Revealed, 20));
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(app.world().resource::<HistoryView>().recent.len(), 1);
}

#[test]
fn reset_clears_the_celebration() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 120\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Revealed, 10));
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(fireworks(&app), FireworksState::Active);

    request_reset(&mut app);
    assert!(run_until(&mut app, SpinPhase::Idle, 3));
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(fireworks(&app), FireworksState::Inactive);
    assert!(app.world().get_resource::<FrameLoop>().is_none());
    assert_eq!(confetti_count(&mut app), 0);
    let display = app.world().resource::<LotteryDisplay>();
    assert_eq!(display.digits, vec![0; 5]);
    assert_eq!(display.last_draw, None);
    // History survives a reset.
    assert_eq!(app.world().resource::<HistoryView>().recent.len(), 1);
}

#[test]
fn new_spin_stops_the_fireworks() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 600\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Revealed, 20));
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(fireworks(&app), FireworksState::Active);

    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Spinning, 3));
    for _ in 0..2 {
        app.update();
    }
    assert_eq!(phase(&app), SpinPhase::Spinning);
    assert_eq!(fireworks(&app), FireworksState::Inactive);
    assert_eq!(confetti_count(&mut app), 0);
}

#[test]
fn confetti_clears_itself_after_four_seconds() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 120\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Revealed, 10));
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(confetti_count(&mut app), 100);

    // 4 s at 60 ms per frame, plus slack.
    for _ in 0..75 {
        app.update();
    }
    assert_eq!(confetti_count(&mut app), 0);
    assert_eq!(phase(&app), SpinPhase::Revealed);
}

#[test]
fn auto_spin_draws_without_input() {
    let (_dir, mut app) = flow_app(
        "auto_spin = true\nauto_spin_interval_secs = 1\nspin_duration_ms = 120\n",
    );
    assert!(run_until(&mut app, SpinPhase::Revealed, 40));
}

#[test]
fn revealed_draw_can_be_saved_and_forgotten() {
    let (_dir, mut app) = flow_app("spin_duration_ms = 180\n");
    request_spin(&mut app);
    assert!(run_until(&mut app, SpinPhase::Revealed, 15));
    let digits = app.world().resource::<LotteryDisplay>().digits.clone();

    app.world_mut()
        .resource_mut::<Messages<SaveFavoriteRequested>>()
        .write(SaveFavoriteRequested(digits.clone()));
    app.update();
    assert_eq!(app.world().resource::<HistoryView>().favorites, vec![digits]);

    app.world_mut()
        .resource_mut::<Messages<RemoveFavoriteRequested>>()
        .write(RemoveFavoriteRequested(0));
    app.update();
    assert!(app.world().resource::<HistoryView>().favorites.is_empty());
}
