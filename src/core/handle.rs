use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};

use super::studio::Studio;
use crate::export::Notification;
use crate::scene::{SceneState, Snapshot, UiMode};

type SceneEdit = Box<dyn FnOnce(&mut SceneState) + Send>;

/// Commands to the background studio task
pub enum StudioCommand {
    /// Mutate the live scene
    Edit(SceneEdit),
    SetMode(UiMode),
    Commit,
    Undo,
    Redo,
    Import {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Result<(), Notification>>,
    },
    PointerDown,
    PointerUp,
    /// Current live scene as a snapshot
    Snapshot(oneshot::Sender<Snapshot>),
    /// Flush everything and stop
    Shutdown,
}

/// Handle to the studio running on its own task.
///
/// The task sleeps until the earliest pending flush deadline and otherwise
/// waits for commands, so debounce timers fire without any polling.
#[derive(Clone)]
pub struct StudioHandle {
    cmd_tx: mpsc::UnboundedSender<StudioCommand>,
}

impl StudioHandle {
    /// Spawn the studio loop. The returned join handle yields the studio back
    /// after shutdown.
    pub fn spawn(studio: Studio) -> (Self, JoinHandle<Studio>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(studio, cmd_rx));
        (Self { cmd_tx }, task)
    }

    pub fn edit(&self, f: impl FnOnce(&mut SceneState) + Send + 'static) {
        let _ = self.cmd_tx.send(StudioCommand::Edit(Box::new(f)));
    }

    pub fn set_mode(&self, mode: UiMode) {
        let _ = self.cmd_tx.send(StudioCommand::SetMode(mode));
    }

    pub fn commit(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Commit);
    }

    pub fn undo(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Undo);
    }

    pub fn redo(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Redo);
    }

    pub fn pointer_down(&self) {
        let _ = self.cmd_tx.send(StudioCommand::PointerDown);
    }

    pub fn pointer_up(&self) {
        let _ = self.cmd_tx.send(StudioCommand::PointerUp);
    }

    pub async fn import_settings(&self, bytes: Vec<u8>) -> Result<(), Notification> {
        let (reply, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(StudioCommand::Import { bytes, reply });
        rx.await
            .unwrap_or_else(|_| Err(Notification::error("Studio is not running")))
    }

    /// `None` once the studio has stopped
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(StudioCommand::Snapshot(reply));
        rx.await.ok()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Shutdown);
    }
}

/// Wait for the task to finish after a shutdown request
pub async fn join(task: JoinHandle<Studio>) -> Result<Studio, JoinError> {
    task.await
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run(mut studio: Studio, mut cmd_rx: mpsc::UnboundedReceiver<StudioCommand>) -> Studio {
    loop {
        let deadline = studio.next_deadline();
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(StudioCommand::Shutdown) | None => break,
                    Some(StudioCommand::Edit(f)) => studio.edit(f),
                    Some(StudioCommand::SetMode(mode)) => studio.set_mode(mode),
                    Some(StudioCommand::Commit) => {
                        studio.commit();
                    }
                    Some(StudioCommand::Undo) => {
                        studio.undo();
                    }
                    Some(StudioCommand::Redo) => {
                        studio.redo();
                    }
                    Some(StudioCommand::Import { bytes, reply }) => {
                        let _ = reply.send(studio.import_settings(&bytes));
                    }
                    Some(StudioCommand::PointerDown) => studio.pointer_down(),
                    Some(StudioCommand::PointerUp) => studio.pointer_up().await,
                    Some(StudioCommand::Snapshot(reply)) => {
                        let _ = reply.send(Snapshot::capture(studio.scene()));
                    }
                }
            }
            _ = sleep_until_deadline(deadline) => {
                studio.tick(Instant::now()).await;
            }
        }
    }

    studio.shutdown().await;
    studio
}
