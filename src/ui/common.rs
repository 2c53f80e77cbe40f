use super::*;

/// Text on the result banner for the current phase.
pub fn banner_text(phase: SpinPhase, display: &LotteryDisplay) -> String {
    match phase {
        SpinPhase::Idle => "Press SPIN or Space to draw".to_string(),
        SpinPhase::Spinning => "Spinning...".to_string(),
        SpinPhase::Revealed => format!("Winning number: {}", format_digits(&display.digits)),
    }
}

/// Caption of a page button; toggles show their current value.
pub fn button_label(button: PageButton, settings: &AppSettings) -> String {
    match button {
        PageButton::Spin => "SPIN".to_string(),
        PageButton::Reset => "RESET".to_string(),
        PageButton::Sound => {
            if settings.sound_enabled {
                "SOUND: ON".to_string()
            } else {
                "SOUND: OFF".to_string()
            }
        }
        PageButton::Theme => format!("THEME: {}", settings.theme.label()),
        PageButton::ClearHistory => "CLEAR HISTORY".to_string(),
        PageButton::ToggleFavorite => "FAVOURITE".to_string(),
    }
}

pub fn history_text(recent: &[LotteryResult]) -> String {
    if recent.is_empty() {
        return "No draws yet".to_string();
    }
    recent
        .iter()
        .map(|r| format!("{}   {}", r.date, format_digits(&r.numbers)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stats_text(stats: &HistoryStats) -> String {
    if stats.total_games == 0 {
        return String::new();
    }
    let hot = stats
        .most_frequent_numbers
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Games: {}  ·  Avg sum: {}  ·  Hot digits: {}",
        stats.total_games, stats.average_sum, hot
    )
}

pub fn favorites_text(favorites: &[Vec<u8>]) -> String {
    if favorites.is_empty() {
        return String::new();
    }
    let joined = favorites
        .iter()
        .map(|f| format_digits(f))
        .collect::<Vec<_>>()
        .join("  ");
    format!("Favourites: {joined}")
}

pub(super) fn spacer(parent: &mut ChildSpawnerCommands<'_>, px: f32) {
    parent.spawn(Node {
        height: Val::Px(px),
        ..default()
    });
}

pub(super) fn panel_text(value: String, palette: &ThemePalette) -> impl Bundle {
    (
        Text::new(value),
        TextFont {
            font_size: 15.0,
            ..default()
        },
        TextColor(palette.muted),
        Themed(ThemeRole::Muted),
    )
}

pub(super) fn spawn_digit_card(
    parent: &mut ChildSpawnerCommands<'_>,
    index: usize,
    digit: u8,
    palette: &ThemePalette,
) {
    parent
        .spawn((
            Node {
                width: Val::Px(84.0),
                height: Val::Px(112.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(3.0)),
                ..default()
            },
            BackgroundColor(palette.card),
            BorderColor::all(palette.card_border),
            DigitCard(index),
        ))
        .with_children(|card| {
            card.spawn((
                Text::new(digit.to_string()),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(palette.text),
                DigitText(index),
                Themed(ThemeRole::Text),
            ));
        });
}

pub(super) fn spawn_button(
    parent: &mut ChildSpawnerCommands<'_>,
    button: PageButton,
    settings: &AppSettings,
    palette: &ThemePalette,
) {
    parent
        .spawn((
            Button,
            Node {
                min_width: Val::Px(150.0),
                height: Val::Px(44.0),
                padding: UiRect::horizontal(Val::Px(14.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BackgroundColor(palette.card),
            BorderColor::all(palette.card_border),
            button,
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(button_label(button, settings)),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(palette.text),
                ButtonLabel,
                Themed(ThemeRole::Text),
            ));
        });
}
