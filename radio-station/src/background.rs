//! Background image rotator
//!
//! Every interval, pick a random background image and publish its 1-based
//! index to the `bi` slot. The client loads `image-<bi>.jpg`, so only the
//! contiguous run `image-1.jpg`, `image-2.jpg`, ... counts; other files in
//! the directory are ignored. Images are counted once at construction.

use crate::clock::ObserverRegistry;
use crate::publisher::PositionPublisher;
use radio_common::events::RadioEvent;
use rand::Rng;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const IMAGE_PREFIX: &str = "image-";
const IMAGE_SUFFIX: &str = ".jpg";

pub struct BackgroundRotator {
    core: Arc<RotatorCore>,
    task: tokio::sync::Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

struct RotatorCore {
    publisher: Arc<PositionPublisher>,
    observers: ObserverRegistry,
    image_count: u32,
    interval: Duration,
}

impl BackgroundRotator {
    /// Count the images in `dir`. A missing directory counts as zero images.
    pub fn new(dir: &Path, publisher: Arc<PositionPublisher>, interval: Duration) -> Self {
        let image_count = count_images(dir);
        info!("Background rotator: {} images in {}", image_count, dir.display());
        Self {
            core: Arc::new(RotatorCore {
                publisher,
                observers: ObserverRegistry::new(),
                image_count,
                interval,
            }),
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn image_count(&self) -> u32 {
        self.core.image_count
    }

    pub fn add_observer(&self, observer: crate::clock::Observer) -> usize {
        self.core.observers.register(observer)
    }

    /// Pick and publish a new background. Returns the chosen index, or
    /// `None` when there are no images.
    pub fn rotate(&self) -> Option<u32> {
        self.core.rotate()
    }

    /// Spawn the rotation loop (rotate, sleep, repeat). No-op if running.
    pub async fn start(&self) {
        let mut guard = self.task.lock().await;
        if guard.as_ref().is_some_and(|(_, join)| !join.is_finished()) {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let core = Arc::clone(&self.core);
        let join = tokio::spawn(async move {
            loop {
                core.rotate();
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(core.interval) => {}
                }
            }
            debug!("Background rotator exited");
        });
        *guard = Some((shutdown_tx, join));
        info!("Background rotator started (every {:?})", self.core.interval);
    }

    /// Stop the rotation loop, waiting at most `timeout`
    pub async fn stop(&self, timeout: Duration) {
        let Some((shutdown_tx, mut join)) = self.task.lock().await.take() else {
            return;
        };
        let _ = shutdown_tx.send(true);
        if tokio::time::timeout(timeout, &mut join).await.is_err() {
            warn!("Background rotator did not stop within {:?}, aborting", timeout);
            join.abort();
        }
    }
}

impl RotatorCore {
    fn rotate(&self) -> Option<u32> {
        if self.image_count == 0 {
            warn!("No background images available");
            return None;
        }
        let index = rand::thread_rng().gen_range(1..=self.image_count);
        self.publisher.publish_background_index(index);
        debug!("Background index {}", index);
        self.observers.notify(&RadioEvent::BackgroundChanged {
            background_index: index,
            timestamp: radio_common::time::now(),
        });
        Some(index)
    }
}

/// Length of the run `image-1.jpg ..= image-N.jpg` present in `dir`
fn count_images(dir: &Path) -> u32 {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to list backgrounds in {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut indices = BTreeSet::new();
    let mut ignored = 0usize;
    for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        if !path.is_file() {
            continue;
        }
        match path.file_name().and_then(|n| n.to_str()).and_then(image_index) {
            Some(index) => {
                indices.insert(index);
            }
            None => ignored += 1,
        }
    }

    let mut count = 0u32;
    while indices.contains(&(count + 1)) {
        count += 1;
    }
    if ignored > 0 || indices.len() > count as usize {
        warn!(
            "Ignoring {} background files in {}: expected image-1.jpg .. image-N.jpg",
            ignored + indices.len() - count as usize,
            dir.display()
        );
    }
    count
}

/// `image-<n>.jpg` yields `n`. The digits must be exactly what the client
/// formats (`n >= 1`, no leading zeros).
fn image_index(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(IMAGE_PREFIX)?.strip_suffix(IMAGE_SUFFIX)?;
    if digits.is_empty()
        || digits.starts_with('0')
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}
