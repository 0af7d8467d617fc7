//! Preferences file backed store.
//!
//! The file is a RON map of named floats, e.g. `{"font_scale": 1.3}`, so
//! other preferences written by the app next to the font scale survive a
//! save. Writes go to a sibling temp file that is synced and renamed over the
//! original, so a crash mid-write leaves the previous value intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use ron::ser::PrettyConfig;
use tokio::sync::{Mutex, watch};

use super::bounds::DEFAULT_SCALE;
use super::error::StoreError;
use super::store::{FONT_SCALE_KEY, SaveFuture, ScalePreferenceStore, ScaleStream};

/// File name used by [`FileStore::open_default`].
pub const PREFERENCES_FILE: &str = "font_resizify_prefs.ron";

type Preferences = BTreeMap<String, f32>;

struct FileStoreInner {
    path: PathBuf,
    slot: watch::Sender<f32>,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

/// Store persisting the font scale to a preferences file.
///
/// Clones share the same file, subscribers and write ordering. Stores opened
/// separately on the same path only share the file: each sees its own writes
/// and not the other's until reopened, and concurrent saves through them are
/// last-write-wins.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

impl FileStore {
    /// Open the preferences file at `path`, reading the current record.
    ///
    /// A missing file is not an error: the store starts at the default scale
    /// and the file is created on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let value = read_preferences(&path)?
            .get(FONT_SCALE_KEY)
            .copied()
            .unwrap_or(DEFAULT_SCALE);
        info!("Font scale preferences at {} (scale {value})", path.display());

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                path,
                slot: watch::Sender::new(value),
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Open `<config dir>/<app_name>/font_resizify_prefs.ron`.
    pub fn open_default(app_name: &str) -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Self::open(dir.join(app_name).join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl ScalePreferenceStore for FileStore {
    fn observe(&self) -> ScaleStream {
        ScaleStream::new(self.inner.slot.subscribe())
    }

    fn save(&self, value: f32) -> SaveFuture {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _guard = inner.write_lock.lock().await;
            let path = inner.path.clone();
            tokio::task::spawn_blocking(move || write_record(&path, value)).await??;
            debug!("Saved font scale {value} to {}", inner.path.display());
            inner.slot.send_replace(value);
            Ok(())
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Preferences::new()),
        Err(err) => return Err(io_error(path, err)),
    };
    if text.trim().is_empty() {
        return Ok(Preferences::new());
    }
    ron::from_str(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_record(path: &Path, value: f32) -> Result<(), StoreError> {
    let mut preferences = match read_preferences(path) {
        Ok(preferences) => preferences,
        Err(StoreError::Parse { source, .. }) => {
            warn!(
                "Replacing unreadable preferences file {}: {source}",
                path.display()
            );
            Preferences::new()
        }
        Err(err) => return Err(err),
    };
    preferences.insert(FONT_SCALE_KEY.to_string(), value);

    let text = ron::ser::to_string_pretty(&preferences, PrettyConfig::default())?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| io_error(dir, err))?;
    }
    write_atomically(path, text.as_bytes())
}

/// Replace `path` with `contents` through a synced sibling temp file. The
/// temp file is removed if any step fails.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let tmp_path = temp_path(path);
    let result = fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .map_err(|err| io_error(&tmp_path, err))
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|err| io_error(path, err)));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        return result;
    }
    sync_parent(path)
}

// Unique per write, so stores opened separately on one path never share a
// temp file
fn temp_path(path: &Path) -> PathBuf {
    static NEXT_TEMP: AtomicU64 = AtomicU64::new(0);
    let n = NEXT_TEMP.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("ron.{}.{n}.tmp", std::process::id()))
}

// Makes the rename itself durable
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<(), StoreError> {
    let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::File::open(dir)
        .and_then(|dir| dir.sync_all())
        .map_err(|err| io_error(dir, err))
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_starts_at_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join(PREFERENCES_FILE)).unwrap();
        assert_eq!(store.observe().latest(), 1.0);
    }

    #[tokio::test]
    async fn save_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE);

        let store = FileStore::open(&path).unwrap();
        store.save(1.3).await.unwrap();
        assert_eq!(store.observe().latest(), 1.3);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.observe().latest(), 1.3);
    }

    #[tokio::test]
    async fn save_keeps_other_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, r#"{"line_spacing": 1.5, "font_scale": 0.9}"#).unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.observe().latest(), 0.9);
        store.save(1.1).await.unwrap();

        let preferences = read_preferences(&path).unwrap();
        assert_eq!(preferences.get("line_spacing"), Some(&1.5));
        assert_eq!(preferences.get(FONT_SCALE_KEY), Some(&1.1));
    }

    #[test]
    fn open_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "not ron at all {").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn save_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let store = FileStore::open(&path).unwrap();

        fs::write(&path, "garbage").unwrap();
        store.save(1.2).await.unwrap();

        assert_eq!(read_preferences(&path).unwrap().get(FONT_SCALE_KEY), Some(&1.2));
    }

    #[tokio::test]
    async fn save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("settings");
        let store = FileStore::open(parent.join(PREFERENCES_FILE)).unwrap();

        // The parent "directory" is now a regular file
        fs::write(&parent, "").unwrap();
        let result = store.save(1.2).await;

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.observe().latest(), 1.0);
    }

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be replaced by a file
        let path = dir.path().join(PREFERENCES_FILE);
        fs::create_dir(&path).unwrap();

        let result = write_atomically(&path, b"{}");

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn stores_opened_separately_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();

        first.save(1.1).await.unwrap();
        second.save(1.2).await.unwrap();

        assert_eq!(first.observe().latest(), 1.1);
        assert_eq!(FileStore::open(&path).unwrap().observe().latest(), 1.2);
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn temp_paths_are_unique() {
        let path = Path::new("prefs").join(PREFERENCES_FILE);
        assert_ne!(temp_path(&path), temp_path(&path));
        assert_eq!(temp_path(&path).parent(), path.parent());
    }
}
