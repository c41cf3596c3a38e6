use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{Header, Record, remove_with_side_files, shadow_path, side_files};
use crate::error::{Error, Result};

const ZSTD_LEVEL: i32 = 6;

type Encoder = zstd::Encoder<'static, BufWriter<File>>;

/// Single-writer builder for a new snapshot.
///
/// `init` starts a fresh shadow file, `store` appends, and `save` publishes
/// by renaming over the live file. `close`, or dropping an unsaved builder,
/// discards the shadow and leaves the previous snapshot in place.
pub struct SizeCacheBuilder {
    live: PathBuf,
    shadow: PathBuf,
    encoder: Option<Encoder>,
    stored: u64,
}

impl SizeCacheBuilder {
    pub fn init(live: &Path) -> Result<Self> {
        let shadow = shadow_path(live);
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        // Leftovers from a builder that died mid-run.
        remove_with_side_files(&shadow);

        let file = File::create(&shadow).map_err(|e| Error::io(&shadow, e))?;
        let mut encoder = zstd::Encoder::new(BufWriter::new(file), ZSTD_LEVEL)
            .map_err(|e| Error::cache(&shadow, format!("zstd encoder: {e}")))?;
        encoder
            .include_checksum(true)
            .map_err(|e| Error::cache(&shadow, format!("zstd checksum: {e}")))?;
        postcard::to_io(&Header::current(), &mut encoder)
            .map_err(|e| Error::cache(&shadow, format!("header: {e}")))?;

        log::debug!("size cache builder writing {}", shadow.display());
        Ok(Self {
            live: live.to_path_buf(),
            shadow,
            encoder: Some(encoder),
            stored: 0,
        })
    }

    /// Append one directory. Paths that are not valid UTF-8 are skipped.
    pub fn store(&mut self, path: &Path, size: u64, file_count: u64) -> Result<()> {
        let Some(text) = path.to_str() else {
            log::debug!("skipping non-UTF-8 path {}", path.display());
            return Ok(());
        };
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::cache(&self.shadow, "builder already finished"))?;
        let record = Record {
            path: text.to_string(),
            size,
            files: file_count,
        };
        postcard::to_io(&Some(record), encoder)
            .map_err(|e| Error::cache(&self.shadow, format!("append: {e}")))?;
        self.stored += 1;
        Ok(())
    }

    pub fn stored(&self) -> u64 {
        self.stored
    }

    pub fn shadow(&self) -> &Path {
        &self.shadow
    }

    /// Flush the shadow and rename it over the live file.
    pub fn save(mut self) -> Result<()> {
        let Some(mut encoder) = self.encoder.take() else {
            return Err(Error::cache(&self.shadow, "builder already finished"));
        };
        let result = finish(&mut encoder, &self.shadow).and_then(|()| {
            let writer = encoder
                .finish()
                .map_err(|e| Error::cache(&self.shadow, format!("finish: {e}")))?;
            let file = writer
                .into_inner()
                .map_err(|e| Error::io(&self.shadow, e.into_error()))?;
            file.sync_all().map_err(|e| Error::io(&self.shadow, e))
        });
        if let Err(e) = result {
            remove_with_side_files(&self.shadow);
            return Err(e);
        }

        for side in side_files(&self.shadow) {
            let _ = fs::remove_file(side);
        }
        if let Err(e) = fs::rename(&self.shadow, &self.live) {
            remove_with_side_files(&self.shadow);
            return Err(Error::cache(&self.live, format!("publish failed: {e}")));
        }
        log::debug!(
            "published {} cached sizes to {}",
            self.stored,
            self.live.display()
        );
        Ok(())
    }

    /// Abandon the build; the live file is untouched.
    pub fn close(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if self.encoder.take().is_some() {
            remove_with_side_files(&self.shadow);
        }
    }
}

fn finish(encoder: &mut Encoder, shadow: &Path) -> Result<()> {
    postcard::to_io(&None::<Record>, &mut *encoder)
        .map_err(|e| Error::cache(shadow, format!("terminator: {e}")))?;
    encoder.flush().map_err(|e| Error::io(shadow, e))
}

impl Drop for SizeCacheBuilder {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::SizeCache;
    use tempfile::TempDir;

    #[test]
    fn test_store_save_then_lookup() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");
        assert!(SizeCache::open(&live).is_none());

        let mut builder = SizeCacheBuilder::init(&live).unwrap();
        builder.store(Path::new("/x"), 1024, 3).unwrap();
        builder.store(Path::new("/y"), 7, 1).unwrap();
        assert_eq!(builder.stored(), 2);
        builder.save().unwrap();

        let cache = SizeCache::open(&live).unwrap();
        assert_eq!(cache.lookup(Path::new("/x")), Some((1024, 3)));
        assert_eq!(cache.lookup(Path::new("/y")), Some((7, 1)));
        assert_eq!(cache.lookup(Path::new("/z")), None);
        assert!(!shadow_path(&live).exists());
    }

    #[test]
    fn test_open_reader_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");

        let mut first = SizeCacheBuilder::init(&live).unwrap();
        first.store(Path::new("/x"), 1, 1).unwrap();
        first.save().unwrap();

        let before = SizeCache::open(&live).unwrap();

        let mut second = SizeCacheBuilder::init(&live).unwrap();
        second.store(Path::new("/x"), 2, 2).unwrap();
        // Unpublished rows are invisible.
        assert_eq!(
            SizeCache::open(&live).unwrap().lookup(Path::new("/x")),
            Some((1, 1))
        );
        second.save().unwrap();

        assert_eq!(before.lookup(Path::new("/x")), Some((1, 1)));
        let after = SizeCache::open(&live).unwrap();
        assert_eq!(after.lookup(Path::new("/x")), Some((2, 2)));
    }

    #[test]
    fn test_close_and_drop_discard_shadow() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");

        let mut builder = SizeCacheBuilder::init(&live).unwrap();
        builder.store(Path::new("/x"), 1, 1).unwrap();
        assert!(builder.shadow().exists());
        builder.close();
        assert!(!shadow_path(&live).exists());
        assert!(!live.exists());

        {
            let mut builder = SizeCacheBuilder::init(&live).unwrap();
            builder.store(Path::new("/x"), 1, 1).unwrap();
        }
        assert!(!shadow_path(&live).exists());
        assert!(!live.exists());
    }

    #[test]
    fn test_init_removes_stale_shadow_and_side_files() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");
        let shadow = shadow_path(&live);
        fs::write(&shadow, b"half written").unwrap();
        let journal = dir.path().join("sizes.db.tmp-journal");
        fs::write(&journal, b"stale").unwrap();

        let builder = SizeCacheBuilder::init(&live).unwrap();
        assert!(!journal.exists());
        builder.save().unwrap();
        assert!(SizeCache::open(&live).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_insert_keeps_first() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");
        let mut builder = SizeCacheBuilder::init(&live).unwrap();
        builder.store(Path::new("/dup"), 10, 1).unwrap();
        builder.store(Path::new("/dup"), 20, 2).unwrap();
        builder.save().unwrap();

        let cache = SizeCache::open(&live).unwrap();
        assert_eq!(cache.lookup(Path::new("/dup")), Some((10, 1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");
        fs::write(&live, b"not a cache").unwrap();
        assert!(SizeCache::open(&live).is_none());
    }

    #[test]
    fn test_publish_failure_removes_shadow() {
        let dir = TempDir::new().unwrap();
        let live = dir.path().join("sizes.db");
        // A non-empty directory at the live path makes the rename fail.
        fs::create_dir(&live).unwrap();
        fs::write(live.join("occupied"), b"x").unwrap();

        let mut builder = SizeCacheBuilder::init(&live).unwrap();
        builder.store(Path::new("/x"), 1, 1).unwrap();
        let err = builder.save().unwrap_err();
        assert!(matches!(err, Error::Cache { .. }));
        assert!(!shadow_path(&live).exists());
    }
}
