//! Procedural sound cues and user-supplied replacements.
//!
//! Every cue is a handful of oscillator [`Tone`]s with exponential frequency
//! and gain ramps.  Tones are mixed offline into a mono buffer, wrapped in a
//! 16-bit PCM WAV container and handed to Bevy as an `AudioSource`, so no
//! sound files ship with the app.  The short cues are built at startup; the
//! half-minute ambient pad is only synthesized the first time it is played,
//! at a lower sample rate.
//!
//! Custom sounds are opened with `rodio`, the decoder behind Bevy's audio
//! player, before they replace a cue.  A file that rodio cannot open keeps
//! the synthesized cue.
//!
//! ## Systems (registered by `AudioCuePlugin`)
//!
//! | System                 | Schedule  | Purpose                                    |
//! |------------------------|-----------|--------------------------------------------|
//! | `build_audio_cues`     | `Startup` | Synthesize cues, apply custom sounds       |
//! | `start_ambient_music`  | `Startup` | Queue the ambient pad when enabled         |
//! | `refresh_custom_sounds`| `Update`  | Reload custom sounds when settings change  |
//! | `play_cue_system`      | `Update`  | Spawn one-shot players for `PlayCue`       |
//! | `mute_system`          | `Update`  | Stop everything when sound is turned off   |

use std::f32::consts::TAU;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::audio::{AudioPlayer, AudioSource, PlaybackSettings};
use bevy::prelude::*;

use crate::constants::{AMBIENT_SAMPLE_RATE, RAMP_FLOOR, SAMPLE_RATE};
use crate::error::{AudioError, AudioResult};
use crate::storage::{ActiveSettings, AppSettings};

// ── Tones ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

/// One oscillator with an optional hold followed by exponential ramps.
///
/// Frequency and gain stay at their start values for `hold_secs`, then ramp
/// exponentially to their end values over `ramp_secs`, after which the tone
/// stops.  The whole tone is shifted by `delay_secs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_freq: f32,
    pub end_freq: f32,
    pub start_gain: f32,
    pub end_gain: f32,
    pub delay_secs: f32,
    pub hold_secs: f32,
    pub ramp_secs: f32,
}

impl Tone {
    /// A tone ramping over its whole length.
    pub fn ramp(waveform: Waveform, freq: (f32, f32), gain: (f32, f32), secs: f32) -> Self {
        Self {
            waveform,
            start_freq: freq.0,
            end_freq: freq.1,
            start_gain: gain.0,
            end_gain: gain.1,
            delay_secs: 0.0,
            hold_secs: 0.0,
            ramp_secs: secs,
        }
    }

    pub fn delayed(mut self, secs: f32) -> Self {
        self.delay_secs = secs;
        self
    }

    pub fn held(mut self, secs: f32) -> Self {
        self.hold_secs = secs;
        self
    }

    /// Seconds from the start of the cue until this tone falls silent.
    pub fn end_secs(&self) -> f32 {
        self.delay_secs.max(0.0) + self.hold_secs.max(0.0) + self.ramp_secs.max(0.0)
    }

    /// Frequency and gain at `t` seconds into the tone (after the delay).
    pub fn envelope(&self, t: f32) -> (f32, f32) {
        let progress = if self.ramp_secs > 0.0 {
            ((t - self.hold_secs) / self.ramp_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (
            exponential(self.start_freq, self.end_freq, progress),
            exponential(self.start_gain, self.end_gain, progress),
        )
    }
}

/// Exponential interpolation; both ends are floored so the ramp is defined.
fn exponential(from: f32, to: f32, progress: f32) -> f32 {
    let from = from.max(RAMP_FLOOR);
    let to = to.max(RAMP_FLOOR);
    from * (to / from).powf(progress)
}

fn oscillate(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => phase.sin(),
        Waveform::Square => {
            if phase.rem_euclid(TAU) < TAU / 2.0 {
                1.0
            } else {
                -1.0
            }
        }
    }
}

/// Mix `tones` into one mono buffer at `sample_rate`, clamped to `[-1, 1]`.
pub fn synthesize(tones: &[Tone], sample_rate: u32) -> Vec<f32> {
    if sample_rate == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f32;
    let end = tones.iter().map(Tone::end_secs).fold(0.0_f32, f32::max);
    let mut out = vec![0.0_f32; (end * rate).ceil() as usize];

    for tone in tones {
        let first = (tone.delay_secs.max(0.0) * rate).round() as usize;
        let len = ((tone.hold_secs.max(0.0) + tone.ramp_secs.max(0.0)) * rate).round() as usize;
        let mut phase = 0.0_f32;
        for (i, sample) in out.iter_mut().skip(first).take(len).enumerate() {
            let (freq, gain) = tone.envelope(i as f32 / rate);
            *sample += oscillate(tone.waveform, phase) * gain;
            phase = (phase + TAU * freq / rate) % TAU;
        }
    }

    for sample in &mut out {
        *sample = sample.clamp(-1.0, 1.0);
    }
    out
}

/// Wrap mono samples in a 16-bit PCM WAV container.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let data_len = (samples.len() * usize::from(block_align)) as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        out.extend_from_slice(&pcm.to_le_bytes());
    }
    out
}

// ── Cues ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Rising sweep while the digits roll.
    Spin,
    /// Major arpeggio on reveal.
    Win,
    /// Short square blip for buttons.
    Click,
    /// Soft two-note pad that fades after half a minute.
    Ambient,
}

impl Cue {
    pub fn tones(self) -> Vec<Tone> {
        match self {
            Cue::Spin => vec![Tone::ramp(
                Waveform::Sine,
                (200.0, 800.0),
                (0.1, 0.01),
                2.0,
            )],
            // C5 E5 G5 C6
            Cue::Win => [523.25, 659.25, 783.99, 1046.50]
                .iter()
                .enumerate()
                .map(|(i, freq)| {
                    Tone::ramp(Waveform::Sine, (*freq, *freq), (0.3, 0.01), 0.5)
                        .delayed(i as f32 * 0.1)
                })
                .collect(),
            Cue::Click => vec![Tone::ramp(
                Waveform::Square,
                (800.0, 800.0),
                (0.1, 0.01),
                0.1,
            )],
            // A3 + C#4
            Cue::Ambient => [220.0, 277.18]
                .iter()
                .map(|freq| {
                    Tone::ramp(Waveform::Sine, (*freq, *freq), (0.05, 0.01), 2.0).held(30.0)
                })
                .collect(),
        }
    }

    /// The ambient pad stays below 300 Hz and is rendered at a lower rate.
    pub fn sample_rate(self) -> u32 {
        match self {
            Cue::Ambient => AMBIENT_SAMPLE_RATE,
            Cue::Spin | Cue::Win | Cue::Click => SAMPLE_RATE,
        }
    }

    /// The synthesized cue as WAV bytes.
    pub fn render_wav(self) -> Vec<u8> {
        let rate = self.sample_rate();
        encode_wav(&synthesize(&self.tones(), rate), rate)
    }
}

// ── Custom sounds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Wav,
    Ogg,
    Mp3,
    Flac,
}

/// Identify a container by its leading bytes.
pub fn detect_format(bytes: &[u8]) -> Option<SoundFormat> {
    match bytes {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(SoundFormat::Wav),
        [b'O', b'g', b'g', b'S', ..] => Some(SoundFormat::Ogg),
        [b'f', b'L', b'a', b'C', ..] => Some(SoundFormat::Flac),
        [b'I', b'D', b'3', ..] => Some(SoundFormat::Mp3),
        // Bare MPEG audio frame sync.  Layer bits `00` are reserved and mark
        // an AAC ADTS stream instead.
        [0xFF, second, ..] if second & 0xE0 == 0xE0 && second & 0x06 != 0 => {
            Some(SoundFormat::Mp3)
        }
        _ => None,
    }
}

/// Read a user sound file and check that the audio backend can decode it.
///
/// The signature check names the container; rodio then has to open the
/// stream, so a truncated header or junk behind a valid signature is
/// rejected here instead of failing at playback.
pub fn load_custom_sound(path: &Path) -> AudioResult<(SoundFormat, Vec<u8>)> {
    let bytes = fs::read(path).map_err(|source| AudioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_error = |reason: String| AudioError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.is_empty() {
        return Err(decode_error("file is empty".to_string()));
    }
    let format = detect_format(&bytes)
        .ok_or_else(|| decode_error("not a WAV, OGG, MP3 or FLAC file".to_string()))?;
    rodio::Decoder::new(Cursor::new(bytes.clone()))
        .map_err(|err| decode_error(format!("{format:?} stream does not decode: {err}")))?;
    Ok((format, bytes))
}

// ── Bevy surface ──────────────────────────────────────────────────────────────

/// Handles of the playable cues.  Custom sounds replace `spin` and `win`.
#[derive(Resource, Debug, Clone)]
pub struct AudioCues {
    pub spin: Handle<AudioSource>,
    pub win: Handle<AudioSource>,
    pub click: Handle<AudioSource>,
    /// `None` until the pad is first requested.
    pub ambient: Option<Handle<AudioSource>>,
    synth_spin: Handle<AudioSource>,
    synth_win: Handle<AudioSource>,
}

impl AudioCues {
    /// Handle for `cue`, synthesizing the ambient pad on first use.
    pub fn handle(&mut self, cue: Cue, sources: &mut Assets<AudioSource>) -> Handle<AudioSource> {
        match cue {
            Cue::Spin => self.spin.clone(),
            Cue::Win => self.win.clone(),
            Cue::Click => self.click.clone(),
            Cue::Ambient => self
                .ambient
                .get_or_insert_with(|| {
                    debug!("Synthesizing ambient pad");
                    sources.add(source(Cue::Ambient.render_wav()))
                })
                .clone(),
        }
    }
}

/// Request playback of a cue.  Dropped silently while sound is off.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayCue(pub Cue);

/// Marks a spawned cue player so muting can stop it.
#[derive(Component)]
pub struct CuePlayback;

pub struct AudioCuePlugin;

impl Plugin for AudioCuePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveSettings>()
            .add_message::<PlayCue>()
            .add_systems(Startup, (build_audio_cues, start_ambient_music).chain())
            .add_systems(
                Update,
                (
                    refresh_custom_sounds.run_if(resource_changed::<ActiveSettings>),
                    play_cue_system,
                    mute_system.run_if(resource_changed::<ActiveSettings>),
                )
                    .chain(),
            );
    }
}

fn source(bytes: Vec<u8>) -> AudioSource {
    AudioSource {
        bytes: Arc::from(bytes),
    }
}

/// Custom bytes for `path`, or `None` (logged) when unset or unusable.
fn custom_bytes(path: Option<&Path>) -> Option<Vec<u8>> {
    let path = path?;
    match load_custom_sound(path) {
        Ok((format, bytes)) => {
            info!("Using custom {format:?} sound {}", path.display());
            Some(bytes)
        }
        Err(err) => {
            warn!("{err}; keeping the built-in cue");
            None
        }
    }
}

/// Synthesize every cue into the audio asset store.  Without an asset store
/// (headless runs) no cues exist and playback is a no-op.
pub fn build_audio_cues(
    mut commands: Commands,
    sources: Option<ResMut<Assets<AudioSource>>>,
    settings: Res<ActiveSettings>,
) {
    let Some(mut sources) = sources else {
        debug!("No audio assets available; cues disabled");
        return;
    };

    let synth_spin = sources.add(source(Cue::Spin.render_wav()));
    let synth_win = sources.add(source(Cue::Win.render_wav()));
    let mut cues = AudioCues {
        spin: synth_spin.clone(),
        win: synth_win.clone(),
        click: sources.add(source(Cue::Click.render_wav())),
        ambient: None,
        synth_spin,
        synth_win,
    };
    apply_custom_sounds(&mut cues, &mut sources, &settings.0);

    info!("[SETUP] Audio cues synthesized");
    commands.insert_resource(cues);
}

fn apply_custom_sounds(cues: &mut AudioCues, sources: &mut Assets<AudioSource>, settings: &AppSettings) {
    cues.spin = match custom_bytes(settings.custom_spin_sound.as_deref()) {
        Some(bytes) => sources.add(source(bytes)),
        None => cues.synth_spin.clone(),
    };
    cues.win = match custom_bytes(settings.custom_win_sound.as_deref()) {
        Some(bytes) => sources.add(source(bytes)),
        None => cues.synth_win.clone(),
    };
}

pub fn start_ambient_music(settings: Res<ActiveSettings>, mut cues: MessageWriter<PlayCue>) {
    if settings.0.ambient_music {
        cues.write(PlayCue(Cue::Ambient));
    }
}

/// Re-read custom sound paths after a settings change.
pub fn refresh_custom_sounds(
    settings: Res<ActiveSettings>,
    cues: Option<ResMut<AudioCues>>,
    sources: Option<ResMut<Assets<AudioSource>>>,
    mut applied: Local<Option<(Option<PathBuf>, Option<PathBuf>)>>,
) {
    let (Some(mut cues), Some(mut sources)) = (cues, sources) else {
        return;
    };
    let current = (
        settings.0.custom_spin_sound.clone(),
        settings.0.custom_win_sound.clone(),
    );
    // Startup already applied the initial paths.
    let previous = applied.get_or_insert_with(|| current.clone());
    if *previous == current {
        return;
    }
    *previous = current;
    apply_custom_sounds(&mut cues, &mut sources, &settings.0);
}

pub fn play_cue_system(
    mut commands: Commands,
    mut requests: MessageReader<PlayCue>,
    settings: Res<ActiveSettings>,
    cues: Option<ResMut<AudioCues>>,
    sources: Option<ResMut<Assets<AudioSource>>>,
) {
    let (Some(mut cues), Some(mut sources)) = (cues, sources) else {
        requests.clear();
        return;
    };
    if !settings.0.sound_enabled {
        requests.clear();
        return;
    }
    for PlayCue(cue) in requests.read() {
        commands.spawn((
            AudioPlayer::new(cues.handle(*cue, &mut sources)),
            PlaybackSettings::DESPAWN,
            CuePlayback,
        ));
    }
}

/// Despawn every playing cue once sound is switched off.
pub fn mute_system(
    mut commands: Commands,
    settings: Res<ActiveSettings>,
    playing: Query<Entity, With<CuePlayback>>,
) {
    if settings.0.sound_enabled {
        return;
    }
    for entity in playing.iter() {
        commands.entity(entity).despawn();
    }
}
