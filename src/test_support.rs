//! Fixture e collaboratori finti condivisi dai test dei moduli.

use crate::error::PickerError;
use crate::library::{FsMediaLibrary, MediaLibrary};
use crate::picker::{AssetHandle, MediaPicker, PickerOutcome, SelectionMode};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Gradient image saved in the format implied by `name`'s extension
pub fn write_photo(dir: &Path, name: &str, width: u32, height: u32) -> AssetHandle {
    let path = dir.join(name);
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    image.save(&path).unwrap();
    FsMediaLibrary::handle_for(&path).unwrap()
}

pub fn write_video(dir: &Path, name: &str, size: usize) -> AssetHandle {
    let path = dir.join(name);
    std::fs::write(&path, vec![0x42u8; size]).unwrap();
    FsMediaLibrary::handle_for(&path).unwrap()
}

/// Picker con esito fisso; opzionalmente resta aperto finché `release()` o `dismiss()`
pub struct ScriptedPicker {
    outcome: PickerOutcome,
    hold: Option<Notify>,
    dismissed: AtomicBool,
    presented: AtomicUsize,
    modes: Mutex<Vec<SelectionMode>>,
}

impl ScriptedPicker {
    pub fn new(outcome: PickerOutcome) -> Self {
        Self {
            outcome,
            hold: None,
            dismissed: AtomicBool::new(false),
            presented: AtomicUsize::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    pub fn selecting(assets: Vec<AssetHandle>) -> Self {
        Self::new(PickerOutcome::Selected(assets))
    }

    pub fn held(outcome: PickerOutcome) -> Self {
        Self {
            hold: Some(Notify::new()),
            ..Self::new(outcome)
        }
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.notify_one();
        }
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn last_mode(&self) -> Option<SelectionMode> {
        self.modes.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl MediaPicker for ScriptedPicker {
    async fn present(&self, mode: SelectionMode) -> PickerOutcome {
        self.presented.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().unwrap().push(mode);

        if let Some(hold) = &self.hold {
            hold.notified().await;
        }

        if self.dismissed.swap(false, Ordering::SeqCst) {
            PickerOutcome::Cancelled
        } else {
            self.outcome.clone()
        }
    }

    fn dismiss(&self) {
        self.dismissed.store(true, Ordering::SeqCst);
        self.release();
    }
}

/// Library on the filesystem that counts every access
#[derive(Default)]
pub struct CountingLibrary {
    inner: FsMediaLibrary,
    accesses: AtomicUsize,
}

impl CountingLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLibrary for CountingLibrary {
    async fn read(&self, asset: &AssetHandle) -> Result<Vec<u8>, PickerError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.read(asset).await
    }

    async fn byte_size(&self, asset: &AssetHandle) -> Result<u64, PickerError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.byte_size(asset).await
    }

    async fn copy_to(&self, asset: &AssetHandle, destination: &Path) -> Result<u64, PickerError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.inner.copy_to(asset, destination).await
    }
}
