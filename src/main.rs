use bevy::prelude::*;
use bevy::window::WindowResolution;

use luckydraw::audio::AudioCuePlugin;
use luckydraw::config::{self, FireworksConfig};
use luckydraw::fireworks::FireworksPlugin;
use luckydraw::graphics;
use luckydraw::lottery::LotteryPlugin;
use luckydraw::storage::StoragePlugin;
use luckydraw::ui::PagePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Lucky Draw".into(),
                resolution: WindowResolution::new(1200, 680),
                ..Default::default()
            }),
            ..Default::default()
        }))
        // Compiled defaults; load_fireworks_config overwrites them from
        // assets/fireworks.toml (if present) in the Startup schedule.
        .insert_resource(FireworksConfig::default())
        // Storage first: it inserts the persisted settings every other
        // plugin reads during Startup.
        .add_plugins(StoragePlugin::default())
        .add_plugins((LotteryPlugin, AudioCuePlugin, FireworksPlugin, PagePlugin))
        .add_systems(
            Startup,
            (
                config::load_fireworks_config,
                graphics::setup_camera.after(config::load_fireworks_config),
            ),
        )
        .run();
}
