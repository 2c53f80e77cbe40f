//! Page composition: digit cards, controls, result banner, history and the
//! celebration that follows every draw.
//!
//! The page owns the coupling between the spinner and the fireworks engine.
//! The engine itself only sees `FireworksState` transitions.
//!
//! ## Phase reactions
//!
//! | Schedule              | Fireworks  | Confetti     | Cue    |
//! |-----------------------|------------|--------------|--------|
//! | `OnEnter(Spinning)`   | `Inactive` | cleared      | `Spin` |
//! | `OnEnter(Revealed)`   | `Active`   | new burst    | `Win`  |
//! | `OnEnter(Idle)`       | `Inactive` | cleared      |        |
//!
//! ## Systems (registered by `PagePlugin`)
//!
//! | System                  | Schedule  | Purpose                                  |
//! |-------------------------|-----------|------------------------------------------|
//! | `setup_page`            | `Startup` | Spawn the page layout                    |
//! | `page_button_system`    | `Update`  | Button presses and hover feedback        |
//! | `keyboard_input_system` | `Update`  | Space spins, R resets                    |
//! | `sync_digit_cards`      | `Update`  | Mirror `LotteryDisplay` onto the cards   |
//! | `update_banner`         | `Update`  | Result banner text                       |
//! | `update_history_panel`  | `Update`  | History, stats and favourites text       |
//! | `update_button_labels`  | `Update`  | Toggle captions after settings change    |
//! | `apply_theme_colors`    | `Update`  | Recolour themed nodes                    |
//! | `animate_confetti`      | `Update`  | Fall animation and 4 s expiry            |

mod common;
mod confetti;

pub use common::{banner_text, button_label, favorites_text, history_text, stats_text};
pub use confetti::{animate_confetti, ConfettiBurst, ConfettiPiece};

use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;
use rand::Rng;

use crate::audio::{Cue, PlayCue};
use crate::constants::{CONFETTI_CLEAR_SECS, CONFETTI_COUNT, PALETTE};
use crate::fireworks::FireworksState;
use crate::graphics::{apply_theme_clear_color, theme_palette, ThemePalette};
use crate::lottery::{
    format_digits, LotteryDisplay, ResetRequested, SpinPhase, SpinRequested,
};
use crate::storage::{
    ActiveSettings, AppSettings, ClearHistoryRequested, HistoryStats, HistoryView,
    LotteryResult, RemoveFavoriteRequested, SaveFavoriteRequested, SettingsPatch, UpdateSettings,
};
use common::{panel_text, spacer, spawn_button, spawn_digit_card};
use confetti::{clear_confetti, spawn_confetti};

// ── Component markers ─────────────────────────────────────────────────────────

/// Row holding the digit cards; rebuilt when the digit count changes.
#[derive(Component)]
pub struct DigitRow;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitCard(pub usize);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitText(pub usize);

#[derive(Component)]
pub struct ResultBanner;

#[derive(Component)]
pub struct HistoryPanelText;

#[derive(Component)]
pub struct StatsPanelText;

#[derive(Component)]
pub struct FavoritesPanelText;

/// Caption text inside a [`PageButton`].
#[derive(Component)]
pub struct ButtonLabel;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Spin,
    Reset,
    Sound,
    Theme,
    ClearHistory,
    /// Saves the revealed number, or forgets it when already saved.
    ToggleFavorite,
}

/// Which palette colour a text node takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeRole {
    Text,
    Muted,
    Accent,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Themed(pub ThemeRole);

impl ThemeRole {
    fn color(self, palette: &ThemePalette) -> Color {
        match self {
            ThemeRole::Text => palette.text,
            ThemeRole::Muted => palette.muted,
            ThemeRole::Accent => palette.accent,
        }
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct PagePlugin;

impl Plugin for PagePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConfettiBurst>()
            .init_resource::<ClearColor>()
            .init_resource::<ActiveSettings>()
            .init_resource::<HistoryView>()
            .init_resource::<LotteryDisplay>()
            .add_message::<SpinRequested>()
            .add_message::<ResetRequested>()
            .add_message::<PlayCue>()
            .add_message::<UpdateSettings>()
            .add_message::<ClearHistoryRequested>()
            .add_message::<SaveFavoriteRequested>()
            .add_message::<RemoveFavoriteRequested>()
            .add_systems(Startup, setup_page)
            .add_systems(OnEnter(SpinPhase::Spinning), on_spin_started)
            .add_systems(OnEnter(SpinPhase::Revealed), on_draw_revealed)
            .add_systems(OnEnter(SpinPhase::Idle), on_idle)
            .add_systems(
                Update,
                (
                    page_button_system,
                    keyboard_input_system,
                    sync_digit_cards.run_if(resource_changed::<LotteryDisplay>),
                    update_banner,
                    update_history_panel.run_if(resource_changed::<HistoryView>),
                    (
                        update_button_labels,
                        apply_theme_colors,
                        apply_theme_clear_color,
                    )
                        .run_if(resource_changed::<ActiveSettings>),
                    animate_confetti,
                ),
            );
    }
}

// ── Startup: spawn page ───────────────────────────────────────────────────────

/// Spawn the page.
///
/// Layout:
/// ```text
/// ┌─────────────────────────────────────────────┐
/// │               LUCKY DRAW                    │
/// │       [0] [0] [0] [0] [0]                   │
/// │      Press SPIN or Space to draw            │
/// │          [ SPIN ]  [ RESET ]                │
/// │  [SOUND] [THEME] [CLEAR HISTORY] [FAVOURITE]│
/// │   stats line                                │
/// │   latest five draws                         │
/// └─────────────────────────────────────────────┘
/// ```
pub fn setup_page(
    mut commands: Commands,
    settings: Res<ActiveSettings>,
    display: Res<LotteryDisplay>,
    history: Res<HistoryView>,
) {
    let palette = theme_palette(settings.0.theme);

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                ..default()
            },
        ))
        .with_children(|root| {
            root.spawn((
                Text::new("LUCKY DRAW"),
                TextFont {
                    font_size: 52.0,
                    ..default()
                },
                TextColor(palette.accent),
                Themed(ThemeRole::Accent),
            ));

            spacer(root, 28.0);

            root.spawn((
                Node {
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(14.0),
                    ..default()
                },
                DigitRow,
            ))
            .with_children(|row| {
                for (i, digit) in display.digits.iter().enumerate() {
                    spawn_digit_card(row, i, *digit, &palette);
                }
            });

            spacer(root, 20.0);

            root.spawn((
                Text::new(banner_text(SpinPhase::Idle, &display)),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(palette.text),
                ResultBanner,
                Themed(ThemeRole::Text),
            ));

            spacer(root, 24.0);

            root.spawn(Node {
                flex_direction: FlexDirection::Row,
                column_gap: Val::Px(12.0),
                ..default()
            })
            .with_children(|row| {
                spawn_button(row, PageButton::Spin, &settings.0, &palette);
                spawn_button(row, PageButton::Reset, &settings.0, &palette);
            });

            spacer(root, 12.0);

            root.spawn(Node {
                flex_direction: FlexDirection::Row,
                column_gap: Val::Px(12.0),
                ..default()
            })
            .with_children(|row| {
                for button in [
                    PageButton::Sound,
                    PageButton::Theme,
                    PageButton::ClearHistory,
                    PageButton::ToggleFavorite,
                ] {
                    spawn_button(row, button, &settings.0, &palette);
                }
            });

            spacer(root, 28.0);

            root.spawn((
                panel_text(stats_text(&history.stats), &palette),
                StatsPanelText,
            ));
            spacer(root, 8.0);
            root.spawn((
                panel_text(favorites_text(&history.favorites), &palette),
                FavoritesPanelText,
            ));
            spacer(root, 8.0);
            root.spawn((
                panel_text(history_text(&history.recent), &palette),
                HistoryPanelText,
            ));
        });

    info!("[SETUP] Page spawned");
}

// ── Phase reactions ───────────────────────────────────────────────────────────

fn on_spin_started(
    mut commands: Commands,
    mut fireworks: ResMut<NextState<FireworksState>>,
    mut burst: ResMut<ConfettiBurst>,
    pieces: Query<Entity, With<ConfettiPiece>>,
    mut cues: MessageWriter<PlayCue>,
) {
    fireworks.set(FireworksState::Inactive);
    clear_confetti(&mut commands, &mut burst, &pieces);
    cues.write(PlayCue(Cue::Spin));
}

fn on_draw_revealed(
    mut commands: Commands,
    mut fireworks: ResMut<NextState<FireworksState>>,
    mut burst: ResMut<ConfettiBurst>,
    pieces: Query<Entity, With<ConfettiPiece>>,
    mut cues: MessageWriter<PlayCue>,
) {
    fireworks.set(FireworksState::Active);
    clear_confetti(&mut commands, &mut burst, &pieces);
    spawn_confetti(&mut commands, &mut burst);
    cues.write(PlayCue(Cue::Win));
}

fn on_idle(
    mut commands: Commands,
    mut fireworks: ResMut<NextState<FireworksState>>,
    mut burst: ResMut<ConfettiBurst>,
    pieces: Query<Entity, With<ConfettiPiece>>,
) {
    fireworks.set(FireworksState::Inactive);
    clear_confetti(&mut commands, &mut burst, &pieces);
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Dispatch button presses and tint captions on hover.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn page_button_system(
    buttons: Query<(&Interaction, &PageButton, &Children), Changed<Interaction>>,
    mut labels: Query<&mut TextColor, With<ButtonLabel>>,
    settings: Res<ActiveSettings>,
    display: Res<LotteryDisplay>,
    history: Res<HistoryView>,
    mut spin: MessageWriter<SpinRequested>,
    mut reset: MessageWriter<ResetRequested>,
    mut update: MessageWriter<UpdateSettings>,
    mut clear: MessageWriter<ClearHistoryRequested>,
    mut save_favorite: MessageWriter<SaveFavoriteRequested>,
    mut remove_favorite: MessageWriter<RemoveFavoriteRequested>,
    mut cues: MessageWriter<PlayCue>,
) {
    let palette = theme_palette(settings.0.theme);

    for (interaction, button, children) in buttons.iter() {
        let tint = match interaction {
            Interaction::Pressed => {
                cues.write(PlayCue(Cue::Click));
                match button {
                    PageButton::Spin => {
                        spin.write(SpinRequested);
                    }
                    PageButton::Reset => {
                        reset.write(ResetRequested);
                    }
                    PageButton::Sound => {
                        update.write(UpdateSettings(SettingsPatch {
                            sound_enabled: Some(!settings.0.sound_enabled),
                            ..default()
                        }));
                    }
                    PageButton::Theme => {
                        update.write(UpdateSettings(SettingsPatch {
                            theme: Some(settings.0.theme.next()),
                            ..default()
                        }));
                    }
                    PageButton::ClearHistory => {
                        clear.write(ClearHistoryRequested);
                    }
                    PageButton::ToggleFavorite if display.last_draw.is_some() => {
                        match favorite_index(&history.favorites, &display.digits) {
                            Some(index) => {
                                remove_favorite.write(RemoveFavoriteRequested(index));
                            }
                            None => {
                                save_favorite.write(SaveFavoriteRequested(display.digits.clone()));
                            }
                        }
                    }
                    PageButton::ToggleFavorite => {}
                }
                palette.accent
            }
            Interaction::Hovered => palette.accent,
            Interaction::None => palette.text,
        };
        for child in children.iter() {
            if let Ok(mut color) = labels.get_mut(child) {
                *color = TextColor(tint);
            }
        }
    }
}

/// Position of `digits` among the saved favourites.
pub fn favorite_index(favorites: &[Vec<u8>], digits: &[u8]) -> Option<usize> {
    favorites.iter().position(|fav| fav.as_slice() == digits)
}

pub fn keyboard_input_system(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut spin: MessageWriter<SpinRequested>,
    mut reset: MessageWriter<ResetRequested>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Space) {
        spin.write(SpinRequested);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        reset.write(ResetRequested);
    }
}

// ── Display sync ──────────────────────────────────────────────────────────────

/// Update card digits, rebuilding the row when the digit count changed.
pub fn sync_digit_cards(
    mut commands: Commands,
    display: Res<LotteryDisplay>,
    settings: Res<ActiveSettings>,
    rows: Query<Entity, With<DigitRow>>,
    cards: Query<&DigitCard>,
    mut texts: Query<(&DigitText, &mut Text)>,
) {
    if cards.iter().count() != display.digits.len() {
        let palette = theme_palette(settings.0.theme);
        for row in rows.iter() {
            commands.entity(row).despawn_related::<Children>();
            commands.entity(row).with_children(|row| {
                for (i, digit) in display.digits.iter().enumerate() {
                    spawn_digit_card(row, i, *digit, &palette);
                }
            });
        }
        return;
    }

    for (DigitText(i), mut text) in texts.iter_mut() {
        if let Some(digit) = display.digits.get(*i) {
            let value = digit.to_string();
            if text.0 != value {
                text.0 = value;
            }
        }
    }
}

pub fn update_banner(
    phase: Res<State<SpinPhase>>,
    display: Res<LotteryDisplay>,
    mut banners: Query<&mut Text, With<ResultBanner>>,
) {
    let value = banner_text(*phase.get(), &display);
    for mut text in banners.iter_mut() {
        if text.0 != value {
            text.0 = value.clone();
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn update_history_panel(
    history: Res<HistoryView>,
    mut stats: Query<
        &mut Text,
        (
            With<StatsPanelText>,
            Without<HistoryPanelText>,
            Without<FavoritesPanelText>,
        ),
    >,
    mut recent: Query<&mut Text, (With<HistoryPanelText>, Without<FavoritesPanelText>)>,
    mut favorites: Query<&mut Text, With<FavoritesPanelText>>,
) {
    for mut text in stats.iter_mut() {
        text.0 = stats_text(&history.stats);
    }
    for mut text in recent.iter_mut() {
        text.0 = history_text(&history.recent);
    }
    for mut text in favorites.iter_mut() {
        text.0 = favorites_text(&history.favorites);
    }
}

pub fn update_button_labels(
    settings: Res<ActiveSettings>,
    buttons: Query<(&PageButton, &Children)>,
    mut labels: Query<&mut Text, With<ButtonLabel>>,
) {
    for (button, children) in buttons.iter() {
        let value = button_label(*button, &settings.0);
        for child in children.iter() {
            if let Ok(mut text) = labels.get_mut(child) {
                if text.0 != value {
                    text.0 = value.clone();
                }
            }
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn apply_theme_colors(
    settings: Res<ActiveSettings>,
    mut texts: Query<(&Themed, &mut TextColor)>,
    mut surfaces: Query<
        (&mut BackgroundColor, &mut BorderColor),
        Or<(With<DigitCard>, With<PageButton>)>,
    >,
) {
    let palette = theme_palette(settings.0.theme);
    for (Themed(role), mut color) in texts.iter_mut() {
        color.0 = role.color(&palette);
    }
    for (mut background, mut border) in surfaces.iter_mut() {
        background.0 = palette.card;
        *border = BorderColor::all(palette.card_border);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Theme;

    #[test]
    fn banner_follows_the_phase() {
        let display = LotteryDisplay {
            digits: vec![0, 4, 2, 1, 7],
            last_draw: Some(4_217),
        };
        assert!(banner_text(SpinPhase::Idle, &display).contains("SPIN"));
        assert_eq!(banner_text(SpinPhase::Spinning, &display), "Spinning...");
        assert_eq!(
            banner_text(SpinPhase::Revealed, &display),
            "Winning number: 04217"
        );
    }

    #[test]
    fn toggle_labels_show_the_current_value() {
        let mut settings = AppSettings::default();
        assert_eq!(button_label(PageButton::Sound, &settings), "SOUND: ON");
        settings.sound_enabled = false;
        settings.theme = Theme::Auto;
        assert_eq!(button_label(PageButton::Sound, &settings), "SOUND: OFF");
        assert_eq!(button_label(PageButton::Theme, &settings), "THEME: AUTO");
    }

    #[test]
    fn history_panel_lists_date_and_digits() {
        assert_eq!(history_text(&[]), "No draws yet");
        let recent = vec![LotteryResult {
            id: "1".to_string(),
            numbers: vec![1, 2, 3],
            timestamp: 0,
            date: "10:00:00 01/02/2026".to_string(),
        }];
        assert_eq!(history_text(&recent), "10:00:00 01/02/2026   123");
    }

    #[test]
    fn stats_line_is_blank_without_games() {
        assert_eq!(stats_text(&HistoryStats::default()), "");
        let stats = HistoryStats {
            total_games: 2,
            average_sum: 11,
            most_frequent_numbers: vec![7, 1],
            recent_numbers: Vec::new(),
        };
        assert_eq!(
            stats_text(&stats),
            "Games: 2  ·  Avg sum: 11  ·  Hot digits: 7 1"
        );
    }

    #[test]
    fn favourites_are_joined_on_one_line() {
        assert_eq!(favorites_text(&[]), "");
        assert_eq!(
            favorites_text(&[vec![1, 2], vec![0, 9]]),
            "Favourites: 12  09"
        );
    }

    #[test]
    fn favourite_toggle_finds_saved_digits() {
        let favorites = vec![vec![1, 2], vec![0, 9]];
        assert_eq!(favorite_index(&favorites, &[0, 9]), Some(1));
        assert_eq!(favorite_index(&favorites, &[9, 0]), None);
        assert_eq!(favorite_index(&[], &[1, 2]), None);
    }
}
