//! File-change driven synchronization.
//!
//! notify's backend thread forwards raw events into a channel. A single worker
//! thread owns the [`ChangePipeline`] and handles events one at a time.

mod debounce;
mod handler;

pub use debounce::{Clock, Debouncer, SystemClock, DEBOUNCE_WINDOW};
pub use handler::{read_game_marker, read_score_record, ChangeHandler, GameOutcome, ScoreOutcome};

use crossbeam_channel::{select, Receiver, Sender, TryRecvError};
use notify::{
    event::{EventKind, ModifyKind},
    Config, Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::{
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crate::config::{CURRENT_GAME_FILE, HIGHSCORES_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Game,
    Score,
}

/// Maps a path to the kind of change it represents, by exact file name.
pub fn classify(path: &Path) -> Option<ChangeKind> {
    match path.file_name()?.to_str()? {
        CURRENT_GAME_FILE => Some(ChangeKind::Game),
        HIGHSCORES_FILE => Some(ChangeKind::Score),
        _ => None,
    }
}

/// Whether a notify event kind can mean "the file content changed".
///
/// Only modifications count; a newly created file is handled once its
/// content is written.
pub fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(
            ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Name(_) | ModifyKind::Other
        )
    )
}

/// Result of one dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Game(GameOutcome),
    Score(ScoreOutcome),
}

/// Filter, debounce and dispatch, in that order.
pub struct ChangePipeline<C: Clock = SystemClock> {
    debouncer: Debouncer<C>,
    handler: ChangeHandler,
}

impl ChangePipeline<SystemClock> {
    pub fn new(handler: ChangeHandler) -> Self {
        ChangePipeline::with_debouncer(handler, Debouncer::new())
    }
}

impl<C: Clock> ChangePipeline<C> {
    pub fn with_debouncer(handler: ChangeHandler, debouncer: Debouncer<C>) -> Self {
        ChangePipeline { debouncer, handler }
    }

    pub fn handle_event(&mut self, event: &Event) -> Vec<Dispatch> {
        if !is_content_change(&event.kind) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter_map(|path| self.handle_path(path))
            .collect()
    }

    /// Returns `None` when the path was ignored or debounced.
    pub fn handle_path(&mut self, path: &Path) -> Option<Dispatch> {
        if path.is_dir() {
            return None;
        }
        let kind = classify(path)?;
        if !self.debouncer.accept(path) {
            return None;
        }

        Some(match kind {
            ChangeKind::Game => Dispatch::Game(self.handler.on_game_change(path)),
            ChangeKind::Score => Dispatch::Score(self.handler.on_score_change(path)),
        })
    }
}

/// A running watch on one directory plus the worker thread handling it.
pub struct FileWatcher {
    dir: PathBuf,
    watcher: Option<RecommendedWatcher>,
    stop_sender: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Subscribes to `dir` (non-recursive) and starts handling its events.
    pub fn start<C: Clock + 'static>(
        dir: &Path,
        pipeline: ChangePipeline<C>,
    ) -> Result<FileWatcher, notify::Error> {
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        let (stop_sender, stop_receiver) = crossbeam_channel::bounded(1);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = event_sender.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let worker = thread::Builder::new()
            .name("scorehawk-watcher".into())
            .spawn(move || process_events(pipeline, event_receiver, stop_receiver))
            .map_err(notify::Error::io)?;

        tracing::info!("Watching for changes in {}", dir.display());

        Ok(FileWatcher {
            dir: dir.to_path_buf(),
            watcher: Some(watcher),
            stop_sender: Some(stop_sender),
            worker: Some(worker),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Unsubscribes, then waits for the worker. An event already being
    /// handled runs to completion; queued ones are dropped.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.dir) {
                tracing::debug!("Failed to unwatch {}: {}", self.dir.display(), e);
            }
        }

        if let Some(stop_sender) = self.stop_sender.take() {
            let _ = stop_sender.try_send(());
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("File watcher thread panicked");
            }
            tracing::info!("File watcher stopped");
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(TryRecvError::Empty))
}

fn process_events<C: Clock>(
    mut pipeline: ChangePipeline<C>,
    events: Receiver<notify::Result<Event>>,
    stop: Receiver<()>,
) {
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(events) -> message => {
                let Ok(result) = message else { break };
                if stop_requested(&stop) {
                    break;
                }
                match result {
                    Ok(event) => {
                        pipeline.handle_event(&event);
                    }
                    Err(e) => tracing::warn!("File watch error: {}", e),
                }
            }
        }
    }
}
