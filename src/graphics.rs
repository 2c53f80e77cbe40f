use bevy::prelude::*;
use bevy::ui::IsDefaultUiCamera;

use crate::storage::{ActiveSettings, Theme};

/// Colours of one page theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub background: Color,
    pub card: Color,
    pub card_border: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
}

/// Palette for `theme`.  `Auto` does not query the OS and uses the dark palette.
pub fn theme_palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Light => ThemePalette {
            background: Color::srgb(0.976, 0.980, 0.984),
            card: Color::WHITE,
            card_border: Color::srgb(0.82, 0.84, 0.88),
            text: Color::srgb(0.07, 0.09, 0.15),
            muted: Color::srgb(0.42, 0.45, 0.50),
            accent: Color::srgb(0.86, 0.15, 0.15),
        },
        Theme::Dark | Theme::Auto => ThemePalette {
            background: Color::srgb(0.07, 0.09, 0.15),
            card: Color::srgb(0.12, 0.16, 0.23),
            card_border: Color::srgb(0.22, 0.26, 0.34),
            text: Color::srgb(0.95, 0.96, 0.97),
            muted: Color::srgb(0.61, 0.64, 0.69),
            accent: Color::srgb(0.98, 0.80, 0.08),
        },
    }
}

/// Setup camera for the UI page.  The fireworks overlay adds a second camera
/// with a higher order, so the page camera is pinned as the UI target.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, IsDefaultUiCamera));
    info!("[SETUP] Camera spawned");
}

/// Keep the window clear colour in step with the active theme.
pub fn apply_theme_clear_color(settings: Res<ActiveSettings>, mut clear: ResMut<ClearColor>) {
    let background = theme_palette(settings.0.theme).background;
    if clear.0 != background {
        clear.0 = background;
    }
}
