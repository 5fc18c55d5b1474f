//! Persisted tracking results for the Load/Save tracking modes.
//!
//! Results are keyed by source position and kind (translation or rotation)
//! behind an injectable backend, so callers choose between plain-text side
//! files, an in-memory map, or no persistence at all. The filesystem backend
//! keeps the historical text formats: `"{dx} {dy}\n"` in quarter-pixel
//! integers for translation and a decimal degree value for rotation.

use crate::util::{BlockMatchError, BlockMatchResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Backend for persisted per-position scan results.
///
/// `load_*` returns `None` both for missing entries and for entries that fail
/// to parse; the engine then falls back to skip-with-zero semantics rather
/// than erroring.
pub trait TrackingStore: Send + Sync {
    fn load_translation(&self, position: i64) -> Option<(i32, i32)>;
    fn save_translation(&self, position: i64, dx: i32, dy: i32) -> BlockMatchResult<()>;
    fn load_rotation(&self, position: i64) -> Option<f64>;
    fn save_rotation(&self, position: i64, dr_deg: f64) -> BlockMatchResult<()>;
}

/// Store that never persists anything.
#[derive(Default)]
pub struct NullStore;

impl TrackingStore for NullStore {
    fn load_translation(&self, _position: i64) -> Option<(i32, i32)> {
        None
    }

    fn save_translation(&self, _position: i64, _dx: i32, _dy: i32) -> BlockMatchResult<()> {
        Ok(())
    }

    fn load_rotation(&self, _position: i64) -> Option<f64> {
        None
    }

    fn save_rotation(&self, _position: i64, _dr_deg: f64) -> BlockMatchResult<()> {
        Ok(())
    }
}

/// In-memory store, useful for tests and single-process pipelines.
#[derive(Default)]
pub struct MemoryStore {
    translations: Mutex<HashMap<i64, (i32, i32)>>,
    rotations: Mutex<HashMap<i64, f64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackingStore for MemoryStore {
    fn load_translation(&self, position: i64) -> Option<(i32, i32)> {
        self.translations
            .lock()
            .expect("store poisoned")
            .get(&position)
            .copied()
    }

    fn save_translation(&self, position: i64, dx: i32, dy: i32) -> BlockMatchResult<()> {
        self.translations
            .lock()
            .expect("store poisoned")
            .insert(position, (dx, dy));
        Ok(())
    }

    fn load_rotation(&self, position: i64) -> Option<f64> {
        self.rotations
            .lock()
            .expect("store poisoned")
            .get(&position)
            .copied()
    }

    fn save_rotation(&self, position: i64, dr_deg: f64) -> BlockMatchResult<()> {
        self.rotations
            .lock()
            .expect("store poisoned")
            .insert(position, dr_deg);
        Ok(())
    }
}

/// Filesystem store writing one text file per position and kind.
pub struct FsStore {
    dir: PathBuf,
    translation_prefix: String,
    rotation_prefix: String,
}

impl FsStore {
    /// Creates a store rooted at `dir` with the default `m`/`r` prefixes.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_prefixes(dir, "m", "r")
    }

    /// Creates a store with explicit file-name prefixes.
    pub fn with_prefixes<P: AsRef<Path>>(
        dir: P,
        translation_prefix: &str,
        rotation_prefix: &str,
    ) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            translation_prefix: translation_prefix.to_string(),
            rotation_prefix: rotation_prefix.to_string(),
        }
    }

    fn path(&self, prefix: &str, position: i64) -> PathBuf {
        self.dir.join(format!("{prefix}{position:06}"))
    }

    fn write(&self, path: PathBuf, contents: String) -> BlockMatchResult<()> {
        fs::write(&path, contents).map_err(|source| BlockMatchError::StoreWrite { path, source })
    }
}

impl TrackingStore for FsStore {
    fn load_translation(&self, position: i64) -> Option<(i32, i32)> {
        let text = fs::read_to_string(self.path(&self.translation_prefix, position)).ok()?;
        let mut fields = text.split_whitespace();
        let dx = fields.next()?.parse().ok()?;
        let dy = fields.next()?.parse().ok()?;
        Some((dx, dy))
    }

    fn save_translation(&self, position: i64, dx: i32, dy: i32) -> BlockMatchResult<()> {
        self.write(
            self.path(&self.translation_prefix, position),
            format!("{dx} {dy}\n"),
        )
    }

    fn load_rotation(&self, position: i64) -> Option<f64> {
        let text = fs::read_to_string(self.path(&self.rotation_prefix, position)).ok()?;
        text.split_whitespace().next()?.parse().ok()
    }

    fn save_rotation(&self, position: i64, dr_deg: f64) -> BlockMatchResult<()> {
        self.write(
            self.path(&self.rotation_prefix, position),
            format!("{dr_deg:.6}\n"),
        )
    }
}
