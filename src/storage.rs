//! Local persistence: a small file-backed key-value store plus the three
//! record collections built on it (draw history, settings, favourites).
//!
//! Each key maps to `<data dir>/<key>.toml`.  Every record is a TOML table
//! carrying a `version` field; files without one are read as the current
//! version, anything else is rejected.  Reads of corrupt records fall back to
//! defaults (logged), so a damaged file never stops the app.

use std::fs;
use std::path::PathBuf;

use bevy::prelude::*;
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DATA_DIR_ENV, DEFAULT_AUTO_SPIN_INTERVAL_SECS, DEFAULT_DATA_DIR, DEFAULT_MAX_RANGE,
    DEFAULT_SPIN_DURATION_MS, HISTORY_CAP, STATS_TOP_N, STORE_VERSION,
};
use crate::error::{StoreError, StoreResult};
use crate::lottery::DrawCompleted;

const HISTORY_KEY: &str = "lottery_history";
const SETTINGS_KEY: &str = "app_settings";
const FAVORITES_KEY: &str = "favorite_numbers";

// ── Key-value store ───────────────────────────────────────────────────────────

/// Directory of versioned TOML records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvStore {
    root: PathBuf,
}

impl KvStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    fn path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.toml")))
    }

    /// Read and decode the record under `key`; `Ok(None)` when absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.path(key)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut value: toml::Value =
            toml::from_str(&contents).map_err(|err| StoreError::Malformed {
                key: key.to_string(),
                reason: err.to_string(),
            })?;
        migrate_record(key, &mut value)?;

        value
            .try_into::<T>()
            .map(Some)
            .map_err(|err| StoreError::Malformed {
                key: key.to_string(),
                reason: err.to_string(),
            })
    }

    /// Encode `value` and write it under `key`, replacing any previous record.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let path = self.path(key)?;
        let serialize_err = |reason: String| StoreError::Serialize {
            key: key.to_string(),
            reason,
        };

        let mut record = toml::Value::try_from(value).map_err(|err| serialize_err(err.to_string()))?;
        let table = record
            .as_table_mut()
            .ok_or_else(|| serialize_err("record must serialize to a table".to_string()))?;
        table.insert(
            "version".to_string(),
            toml::Value::Integer(i64::from(STORE_VERSION)),
        );
        let serialized =
            toml::to_string_pretty(&record).map_err(|err| serialize_err(err.to_string()))?;

        // Write beside the target and rename so readers never see half a file.
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, serialized).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    /// Delete the record under `key`.  Removing a missing key succeeds.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn migrate_record(key: &str, value: &mut toml::Value) -> StoreResult<()> {
    let table = value.as_table_mut().ok_or_else(|| StoreError::Malformed {
        key: key.to_string(),
        reason: "record root must be a TOML table".to_string(),
    })?;

    if !table.contains_key("version") {
        table.insert(
            "version".to_string(),
            toml::Value::Integer(i64::from(STORE_VERSION)),
        );
    }

    let version = table
        .get("version")
        .and_then(toml::Value::as_integer)
        .ok_or_else(|| StoreError::Malformed {
            key: key.to_string(),
            reason: "version is not an integer".to_string(),
        })?;

    if version != i64::from(STORE_VERSION) {
        return Err(StoreError::UnsupportedVersion {
            key: key.to_string(),
            found: version,
            expected: STORE_VERSION,
        });
    }
    Ok(())
}

// ── History ───────────────────────────────────────────────────────────────────

/// One settled draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryResult {
    pub id: String,
    pub numbers: Vec<u8>,
    /// Unix time in milliseconds.
    pub timestamp: i64,
    /// Local time, `HH:MM:SS DD/MM/YYYY`.
    pub date: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryRecord {
    #[serde(default)]
    results: Vec<LotteryResult>,
}

/// Summary figures over the stored history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_games: usize,
    /// Rounded mean of each draw's digit sum.
    pub average_sum: u32,
    /// Most frequent digits, most frequent first; ties favour the smaller digit.
    pub most_frequent_numbers: Vec<u8>,
    pub recent_numbers: Vec<Vec<u8>>,
}

/// Most-recent-first draw history, capped at [`HISTORY_CAP`] entries.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    kv: KvStore,
}

impl HistoryStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Stored draws, newest first.  Unreadable history reads as empty.
    pub fn history(&self) -> Vec<LotteryResult> {
        match self.kv.get::<HistoryRecord>(HISTORY_KEY) {
            Ok(record) => record.map(|r| r.results).unwrap_or_default(),
            Err(err) => {
                warn!("Error reading lottery history: {err}");
                Vec::new()
            }
        }
    }

    /// Record a draw that settled now.
    pub fn add_result(&self, numbers: &[u8]) -> StoreResult<LotteryResult> {
        self.add_result_at(numbers, Local::now())
    }

    /// Record a draw that settled at `at`, evicting the oldest entries beyond
    /// the cap.
    pub fn add_result_at(&self, numbers: &[u8], at: DateTime<Local>) -> StoreResult<LotteryResult> {
        let mut results = self.history();
        let timestamp = at.timestamp_millis();
        let result = LotteryResult {
            id: unique_id(timestamp, &results),
            numbers: numbers.to_vec(),
            timestamp,
            date: at.format("%H:%M:%S %d/%m/%Y").to_string(),
        };

        results.insert(0, result.clone());
        results.truncate(HISTORY_CAP);
        self.kv.set(HISTORY_KEY, &HistoryRecord { results })?;
        Ok(result)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.kv.remove(HISTORY_KEY)
    }

    pub fn stats(&self) -> HistoryStats {
        compute_stats(&self.history())
    }
}

fn unique_id(timestamp: i64, existing: &[LotteryResult]) -> String {
    let base = timestamp.to_string();
    let taken = |id: &str| existing.iter().any(|r| r.id == id);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 1;
    loop {
        let id = format!("{base}-{suffix}");
        if !taken(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Statistics over `history` (newest first).
pub fn compute_stats(history: &[LotteryResult]) -> HistoryStats {
    if history.is_empty() {
        return HistoryStats::default();
    }

    let total: u64 = history
        .iter()
        .map(|r| r.numbers.iter().map(|n| u64::from(*n)).sum::<u64>())
        .sum();
    let average_sum = (total as f64 / history.len() as f64).round() as u32;

    let mut frequency = [0_usize; 256];
    for n in history.iter().flat_map(|r| r.numbers.iter()) {
        frequency[usize::from(*n)] += 1;
    }
    let mut ranked: Vec<(u8, usize)> = frequency
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(n, count)| (n as u8, *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    HistoryStats {
        total_games: history.len(),
        average_sum,
        most_frequent_numbers: ranked.into_iter().take(STATS_TOP_N).map(|(n, _)| n).collect(),
        recent_numbers: history
            .iter()
            .take(STATS_TOP_N)
            .map(|r| r.numbers.clone())
            .collect(),
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follows the dark palette; the OS theme is not queried.
    Auto,
}

impl Theme {
    /// Next theme in the Light → Dark → Auto cycle.
    pub fn next(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Auto,
            Theme::Auto => Theme::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
            Theme::Auto => "AUTO",
        }
    }
}

/// User settings.  Absent keys take their defaults on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub sound_enabled: bool,
    pub theme: Theme,
    pub auto_spin: bool,
    pub auto_spin_interval_secs: u32,
    /// Upper bound of the winning integer; also fixes the digit count.
    pub max_range: u32,
    pub spin_duration_ms: u64,
    /// Replaces the synthesized spin cue when set and loadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_spin_sound: Option<PathBuf>,
    /// Replaces the synthesized win cue when set and loadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_win_sound: Option<PathBuf>,
    pub ambient_music: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            theme: Theme::Light,
            auto_spin: false,
            auto_spin_interval_secs: DEFAULT_AUTO_SPIN_INTERVAL_SECS,
            max_range: DEFAULT_MAX_RANGE,
            spin_duration_ms: DEFAULT_SPIN_DURATION_MS,
            custom_spin_sound: None,
            custom_win_sound: None,
            ambient_music: false,
        }
    }
}

/// Partial settings update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub sound_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub auto_spin: Option<bool>,
    pub auto_spin_interval_secs: Option<u32>,
    pub max_range: Option<u32>,
    pub spin_duration_ms: Option<u64>,
    pub custom_spin_sound: Option<Option<PathBuf>>,
    pub custom_win_sound: Option<Option<PathBuf>>,
    pub ambient_music: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(self, mut settings: AppSettings) -> AppSettings {
        if let Some(v) = self.sound_enabled {
            settings.sound_enabled = v;
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
        if let Some(v) = self.auto_spin {
            settings.auto_spin = v;
        }
        if let Some(v) = self.auto_spin_interval_secs {
            settings.auto_spin_interval_secs = v;
        }
        if let Some(v) = self.max_range {
            settings.max_range = v;
        }
        if let Some(v) = self.spin_duration_ms {
            settings.spin_duration_ms = v;
        }
        if let Some(v) = self.custom_spin_sound {
            settings.custom_spin_sound = v;
        }
        if let Some(v) = self.custom_win_sound {
            settings.custom_win_sound = v;
        }
        if let Some(v) = self.ambient_music {
            settings.ambient_music = v;
        }
        settings
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    kv: KvStore,
}

impl SettingsStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Stored settings merged over the defaults.
    pub fn settings(&self) -> AppSettings {
        match self.kv.get::<AppSettings>(SETTINGS_KEY) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                warn!("Error reading settings: {err}");
                AppSettings::default()
            }
        }
    }

    /// Merge `patch` into the current settings, persist, and return the result.
    pub fn update(&self, patch: SettingsPatch) -> StoreResult<AppSettings> {
        let updated = patch.apply(self.settings());
        self.kv.set(SETTINGS_KEY, &updated)?;
        Ok(updated)
    }

    /// Drop the stored record so every field reads as its default.
    pub fn reset(&self) -> StoreResult<()> {
        self.kv.remove(SETTINGS_KEY)
    }
}

// ── Favourites ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesRecord {
    #[serde(default)]
    sets: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct FavoritesStore {
    kv: KvStore,
}

impl FavoritesStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub fn favorites(&self) -> Vec<Vec<u8>> {
        match self.kv.get::<FavoritesRecord>(FAVORITES_KEY) {
            Ok(record) => record.map(|r| r.sets).unwrap_or_default(),
            Err(err) => {
                warn!("Error reading favourites: {err}");
                Vec::new()
            }
        }
    }

    /// Append `numbers` unless the same digit string is already saved.
    /// Returns whether anything was added.
    pub fn add(&self, numbers: &[u8]) -> StoreResult<bool> {
        let mut sets = self.favorites();
        let key = joined(numbers);
        if sets.iter().any(|fav| joined(fav) == key) {
            return Ok(false);
        }
        sets.push(numbers.to_vec());
        self.kv.set(FAVORITES_KEY, &FavoritesRecord { sets })?;
        Ok(true)
    }

    /// Remove the favourite at `index`; out-of-range indices are ignored.
    pub fn remove(&self, index: usize) -> StoreResult<()> {
        let mut sets = self.favorites();
        if index >= sets.len() {
            return Ok(());
        }
        sets.remove(index);
        self.kv.set(FAVORITES_KEY, &FavoritesRecord { sets })
    }
}

fn joined(numbers: &[u8]) -> String {
    numbers.iter().map(u8::to_string).collect()
}

// ── Bevy surface ──────────────────────────────────────────────────────────────

/// The opened stores.  Absent when the data directory cannot be created.
#[derive(Resource, Debug, Clone)]
pub struct Storage {
    pub history: HistoryStore,
    pub settings: SettingsStore,
    pub favorites: FavoritesStore,
}

impl Storage {
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let kv = KvStore::open(root)?;
        Ok(Self {
            history: HistoryStore::new(kv.clone()),
            settings: SettingsStore::new(kv.clone()),
            favorites: FavoritesStore::new(kv),
        })
    }
}

/// Settings in effect for this session.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSettings(pub AppSettings);

/// Cached history shown by the page, refreshed after every write.
#[derive(Resource, Debug, Clone, Default)]
pub struct HistoryView {
    pub recent: Vec<LotteryResult>,
    pub stats: HistoryStats,
    pub favorites: Vec<Vec<u8>>,
}

impl HistoryView {
    fn refresh(&mut self, storage: &Storage) {
        let history = storage.history.history();
        self.stats = compute_stats(&history);
        self.recent = history.into_iter().take(STATS_TOP_N).collect();
        self.favorites = storage.favorites.favorites();
    }
}

/// Merge a partial update into the stored and active settings.
#[derive(Message, Debug, Clone)]
pub struct UpdateSettings(pub SettingsPatch);

#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ClearHistoryRequested;

#[derive(Message, Debug, Clone)]
pub struct SaveFavoriteRequested(pub Vec<u8>);

/// Forget the favourite at this index of `HistoryView::favorites`.
#[derive(Message, Debug, Clone, Copy)]
pub struct RemoveFavoriteRequested(pub usize);

/// Data directory from `$LUCKYDRAW_DATA_DIR`, else `./saves`.
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Opens the stores at build time so every `Startup` system already sees the
/// persisted settings.
pub struct StoragePlugin {
    pub root: PathBuf,
}

impl Default for StoragePlugin {
    fn default() -> Self {
        Self { root: data_dir() }
    }
}

impl Plugin for StoragePlugin {
    fn build(&self, app: &mut App) {
        let mut view = HistoryView::default();
        let settings = match Storage::open(&self.root) {
            Ok(storage) => {
                view.refresh(&storage);
                let settings = storage.settings.settings();
                info!("Opened data directory {}", self.root.display());
                app.insert_resource(storage);
                settings
            }
            Err(err) => {
                error!("Persistence disabled: {err}");
                AppSettings::default()
            }
        };

        app.insert_resource(ActiveSettings(settings))
            .insert_resource(view)
            .add_message::<DrawCompleted>()
            .add_message::<UpdateSettings>()
            .add_message::<ClearHistoryRequested>()
            .add_message::<SaveFavoriteRequested>()
            .add_message::<RemoveFavoriteRequested>()
            .add_systems(
                Update,
                (
                    record_draw_system,
                    apply_settings_updates,
                    clear_history_system,
                    save_favorite_system,
                    remove_favorite_system,
                ),
            );
    }
}

/// Append every settled draw to the history.
pub fn record_draw_system(
    mut draws: MessageReader<DrawCompleted>,
    storage: Option<Res<Storage>>,
    mut view: ResMut<HistoryView>,
) {
    let Some(storage) = storage else {
        draws.clear();
        return;
    };
    let mut changed = false;
    for draw in draws.read() {
        match storage.history.add_result(&draw.digits) {
            Ok(result) => {
                debug!("Saved draw {} at {}", result.id, result.date);
                changed = true;
            }
            Err(err) => error!("Error saving lottery result: {err}"),
        }
    }
    if changed {
        view.refresh(&storage);
    }
}

/// Apply settings patches to the active settings and persist them.
pub fn apply_settings_updates(
    mut updates: MessageReader<UpdateSettings>,
    storage: Option<Res<Storage>>,
    mut active: ResMut<ActiveSettings>,
) {
    for UpdateSettings(patch) in updates.read() {
        let merged = match storage.as_ref() {
            Some(storage) => match storage.settings.update(patch.clone()) {
                Ok(saved) => saved,
                Err(err) => {
                    warn!("Error saving settings: {err}");
                    patch.clone().apply(active.0.clone())
                }
            },
            None => patch.clone().apply(active.0.clone()),
        };
        if active.0 != merged {
            active.0 = merged;
        }
    }
}

pub fn clear_history_system(
    mut requests: MessageReader<ClearHistoryRequested>,
    storage: Option<Res<Storage>>,
    mut view: ResMut<HistoryView>,
) {
    if requests.read().count() == 0 {
        return;
    }
    let Some(storage) = storage else {
        return;
    };
    if let Err(err) = storage.history.clear() {
        warn!("Error clearing history: {err}");
    }
    view.refresh(&storage);
}

pub fn save_favorite_system(
    mut requests: MessageReader<SaveFavoriteRequested>,
    storage: Option<Res<Storage>>,
    mut view: ResMut<HistoryView>,
) {
    let Some(storage) = storage else {
        requests.clear();
        return;
    };
    let mut changed = false;
    for SaveFavoriteRequested(numbers) in requests.read() {
        match storage.favorites.add(numbers) {
            Ok(added) => changed |= added,
            Err(err) => warn!("Error saving favourite: {err}"),
        }
    }
    if changed {
        view.refresh(&storage);
    }
}

pub fn remove_favorite_system(
    mut requests: MessageReader<RemoveFavoriteRequested>,
    storage: Option<Res<Storage>>,
    mut view: ResMut<HistoryView>,
) {
    let Some(storage) = storage else {
        requests.clear();
        return;
    };
    let mut changed = false;
    for RemoveFavoriteRequested(index) in requests.read() {
        match storage.favorites.remove(*index) {
            Ok(()) => changed = true,
            Err(err) => warn!("Error removing favourite: {err}"),
        }
    }
    if changed {
        view.refresh(&storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store() -> (TempDir, Storage) {
        let dir = TempDir::new().expect("temp dir");
        let storage = Storage::open(dir.path()).expect("open store");
        (dir, storage)
    }

    fn at(secs: i64) -> DateTime<Local> {
        Local
            .timestamp_opt(secs, 0)
            .single()
            .expect("unambiguous timestamp")
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn kv_round_trips_and_reports_absent_keys() {
        let dir = TempDir::new().expect("temp dir");
        let kv = KvStore::open(dir.path().join("nested")).expect("open");
        assert_eq!(kv.get::<Sample>("sample").expect("read"), None);

        let sample = Sample {
            name: "spin".to_string(),
            count: 3,
        };
        kv.set("sample", &sample).expect("write");
        assert_eq!(kv.get::<Sample>("sample").expect("read"), Some(sample));

        kv.remove("sample").expect("remove");
        kv.remove("sample").expect("second remove is fine");
        assert_eq!(kv.get::<Sample>("sample").expect("read"), None);
    }

    #[test]
    fn kv_rejects_path_like_keys() {
        let (_dir, storage) = store();
        let kv = storage.settings.kv.clone();
        assert!(matches!(
            kv.get::<Sample>("../escape"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(kv.remove(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn kv_accepts_records_without_version_and_rejects_future_ones() {
        let dir = TempDir::new().expect("temp dir");
        let kv = KvStore::open(dir.path()).expect("open");
        fs::write(dir.path().join("old.toml"), "name = \"a\"\ncount = 1\n").expect("write");
        assert!(kv.get::<Sample>("old").expect("legacy record").is_some());

        fs::write(
            dir.path().join("new.toml"),
            "version = 9\nname = \"a\"\ncount = 1\n",
        )
        .expect("write");
        assert!(matches!(
            kv.get::<Sample>("new"),
            Err(StoreError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let (_dir, storage) = store();
        for i in 0..(HISTORY_CAP as i64 + 5) {
            storage
                .history
                .add_result_at(&[(i % 10) as u8, 1, 2, 3, 4], at(1_700_000_000 + i))
                .expect("add");
        }
        let history = storage.history.history();
        assert_eq!(history.len(), HISTORY_CAP);
        assert!(history[0].timestamp > history[1].timestamp);
        assert_eq!(history[0].timestamp, (1_700_000_000 + HISTORY_CAP as i64 + 4) * 1000);
    }

    #[test]
    fn results_carry_unique_ids_and_a_formatted_date() {
        let (_dir, storage) = store();
        let first = storage
            .history
            .add_result_at(&[1, 2, 3], at(1_700_000_000))
            .expect("add");
        let second = storage
            .history
            .add_result_at(&[4, 5, 6], at(1_700_000_000))
            .expect("add");
        assert_ne!(first.id, second.id);
        assert_eq!(first.date.len(), "00:00:00 01/01/2000".len());
        assert_eq!(&first.date[2..3], ":");
        assert_eq!(&first.date[11..12], "/");
    }

    #[test]
    fn clear_empties_history() {
        let (_dir, storage) = store();
        storage.history.add_result(&[9, 9]).expect("add");
        storage.history.clear().expect("clear");
        assert!(storage.history.history().is_empty());
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let (dir, storage) = store();
        fs::write(dir.path().join("lottery_history.toml"), "results = [[[").expect("write");
        assert!(storage.history.history().is_empty());
    }

    #[test]
    fn stats_follow_the_history() {
        let mk = |numbers: Vec<u8>| LotteryResult {
            id: String::new(),
            numbers,
            timestamp: 0,
            date: String::new(),
        };
        let history = vec![mk(vec![1, 1, 2]), mk(vec![3, 3, 3]), mk(vec![1, 0, 0])];
        let stats = compute_stats(&history);
        assert_eq!(stats.total_games, 3);
        // Sums 4, 9, 1 → mean 4.67 → 5.
        assert_eq!(stats.average_sum, 5);
        assert_eq!(stats.most_frequent_numbers, vec![1, 3, 0, 2]);
        assert_eq!(stats.recent_numbers.len(), 3);
        assert_eq!(compute_stats(&[]), HistoryStats::default());
    }

    #[test]
    fn settings_merge_stored_keys_over_defaults() {
        let (dir, storage) = store();
        assert_eq!(storage.settings.settings(), AppSettings::default());

        fs::write(
            dir.path().join("app_settings.toml"),
            "theme = \"dark\"\nmax_range = 999\n",
        )
        .expect("write");
        let settings = storage.settings.settings();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.max_range, 999);
        assert!(settings.sound_enabled);
        assert_eq!(settings.spin_duration_ms, DEFAULT_SPIN_DURATION_MS);
    }

    #[test]
    fn settings_update_is_partial_and_reset_restores_defaults() {
        let (_dir, storage) = store();
        let updated = storage
            .settings
            .update(SettingsPatch {
                sound_enabled: Some(false),
                custom_win_sound: Some(Some(PathBuf::from("win.ogg"))),
                ..SettingsPatch::default()
            })
            .expect("update");
        assert!(!updated.sound_enabled);
        assert_eq!(storage.settings.settings(), updated);
        assert_eq!(updated.max_range, DEFAULT_MAX_RANGE);

        storage.settings.reset().expect("reset");
        assert_eq!(storage.settings.settings(), AppSettings::default());
    }

    #[test]
    fn favourites_deduplicate_and_remove_by_index() {
        let (_dir, storage) = store();
        assert!(storage.favorites.add(&[1, 2, 3]).expect("add"));
        assert!(!storage.favorites.add(&[1, 2, 3]).expect("duplicate"));
        assert!(storage.favorites.add(&[4, 5, 6]).expect("add"));
        assert_eq!(storage.favorites.favorites().len(), 2);

        storage.favorites.remove(0).expect("remove");
        storage.favorites.remove(10).expect("out of range is ignored");
        assert_eq!(storage.favorites.favorites(), vec![vec![4, 5, 6]]);
    }

    #[test]
    fn theme_cycles_through_all_variants() {
        assert_eq!(Theme::Light.next(), Theme::Dark);
        assert_eq!(Theme::Dark.next(), Theme::Auto);
        assert_eq!(Theme::Auto.next(), Theme::Light);
    }
}
