//! Rebuilds the index when files appear in the document directory.

use super::{IndexService, RebuildOutcome};
use crate::error::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};

/// A running watcher. Dropping it stops both notify and the rebuild task.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl DocumentWatcher {
    /// Watch `service`'s document directory recursively.
    ///
    /// Creation events that arrive within `debounce` of each other trigger a
    /// single rebuild.
    pub fn spawn(service: Arc<IndexService>, debounce: Duration) -> Result<Self> {
        let dir = service.documents_dir().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
                for path in event.paths.into_iter().filter(|p| !p.is_dir()) {
                    let _ = tx.send(path);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Document watcher error: {}", e),
        })?;
        watcher.watch(&dir, RecursiveMode::Recursive)?;
        info!("Watching {:?} for new documents", dir);

        let task = tokio::spawn(coalesce(rx, debounce, move |paths| {
            let service = Arc::clone(&service);
            async move { rebuild_for(&service, paths).await }
        }));

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn rebuild_for(service: &IndexService, paths: BTreeSet<PathBuf>) {
    info!("{} new document(s) detected; rebuilding index", paths.len());
    for path in &paths {
        debug!("  {}", display_relative(service.documents_dir(), path));
    }
    match service.rebuild().await {
        Ok(RebuildOutcome::Installed { chunks, generation, .. }) => {
            info!("Index generation {} ready ({} chunks)", generation, chunks)
        }
        Ok(RebuildOutcome::Empty) => info!("No indexable content after change"),
        Err(e) => warn!("Rebuild after change failed: {}", e),
    }
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Group paths into de-duplicated batches.
///
/// A batch opens with the first path received and closes `window` later;
/// `on_batch` runs once per batch.
async fn coalesce<F, Fut>(mut rx: mpsc::UnboundedReceiver<PathBuf>, window: Duration, mut on_batch: F)
where
    F: FnMut(BTreeSet<PathBuf>) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut flush_timer: Option<Pin<Box<Sleep>>> = None;

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(path) = maybe else { break; };
                pending.insert(path);
                if flush_timer.is_none() {
                    flush_timer = Some(Box::pin(sleep(window)));
                }
            }
            _ = async {
                if let Some(timer) = &mut flush_timer {
                    timer.await;
                }
            }, if flush_timer.is_some() => {
                flush_timer = None;
                if !pending.is_empty() {
                    on_batch(std::mem::take(&mut pending)).await;
                }
            }
        }
    }

    if !pending.is_empty() {
        on_batch(pending).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::testing::KeywordEmbedder;
    use std::sync::Mutex;

    async fn wait_for_install(service: &IndexService) -> bool {
        for _ in 0..100 {
            if service.status().installed {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_files_in_subdirectory_trigger_one_rebuild() {
        let docs = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        let service = Arc::new(IndexService::new(
            docs.path().to_path_buf(),
            index_dir.path().to_path_buf(),
            ChunkingConfig::default(),
            Arc::new(KeywordEmbedder::new()),
        ));

        let _watcher = DocumentWatcher::spawn(Arc::clone(&service), Duration::from_millis(500)).unwrap();

        let sub = docs.path().join("handbook");
        std::fs::create_dir(&sub).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        for i in 0..5 {
            std::fs::write(sub.join(format!("rule{}.txt", i)), format!("Campus rule number {}.", i)).unwrap();
        }

        assert!(wait_for_install(&service).await);
        let status = service.status();
        assert_eq!(status.chunks, 5);

        // modify events from the writes must not cause another rebuild
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(service.status().generation, status.generation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_produces_one_batch() {
        let (tx, rx) = mpsc::unbounded_channel();
        let batches: Arc<Mutex<Vec<BTreeSet<PathBuf>>>> = Arc::default();

        let sink = Arc::clone(&batches);
        let task = tokio::spawn(coalesce(rx, Duration::from_millis(2000), move |paths| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().unwrap().push(paths) }
        }));

        for name in ["a.txt", "b.pdf", "a.txt", "c.docx"] {
            tx.send(PathBuf::from(name)).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(3000)).await;

        tx.send(PathBuf::from("d.html")).unwrap();
        drop(tx);
        task.await.unwrap();

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(
            batches[0].iter().map(|p| p.to_str().unwrap()).collect::<Vec<_>>(),
            vec!["a.txt", "b.pdf", "c.docx"]
        );
        assert_eq!(batches[1].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_without_events_never_fires() {
        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
        let fired = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&fired);
        drop(tx);
        coalesce(rx, Duration::from_millis(50), move |_| {
            let counter = Arc::clone(&counter);
            async move { *counter.lock().unwrap() += 1 }
        })
        .await;

        assert_eq!(*fired.lock().unwrap(), 0);
    }
}
