//! Progress events and the channel they travel over.
//!
//! Every long-running operation runs as one task owning an [`EventSender`].
//! The caller holds the matching [`EventStream`]; the stream ends when the
//! task finishes and drops its sender. A stream that ends without any
//! [`Event::Error`] is a successful run.

use crate::error::EngineError;
use sm_core::{Direction, File, Version};
use std::fmt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What happened to a file or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// A script is being applied in this direction
    Migrate(Direction),
    /// Stored scripts of a recorded version are being rewritten
    Refresh,
    /// Written to a dump
    Dumped,
    /// Loaded from a dump
    Restored,
}

/// A file or table an operation is working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub name: String,
    pub version: Option<Version>,
    pub action: FileAction,
}

impl FileEvent {
    pub fn migrate(file: &File) -> Self {
        Self {
            name: file.file_name().to_string(),
            version: Some(file.version()),
            action: FileAction::Migrate(file.direction()),
        }
    }

    pub fn refresh(file: &File) -> Self {
        Self {
            name: file.file_name().to_string(),
            version: Some(file.version()),
            action: FileAction::Refresh,
        }
    }

    pub fn table(name: impl Into<String>, action: FileAction) -> Self {
        Self {
            name: name.into(),
            version: None,
            action,
        }
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.action {
            FileAction::Migrate(Direction::Up) => "+",
            FileAction::Migrate(Direction::Down) => "-",
            FileAction::Refresh => "~",
            FileAction::Dumped => ">",
            FileAction::Restored => "<",
        };
        write!(f, "{} {}", marker, self.name)
    }
}

/// One item on an operation's event stream.
#[derive(Debug)]
pub enum Event {
    Status(String),
    File(FileEvent),
    Error(EngineError),
}

/// Producing half of an event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Send an event. Returns false once the stream has been dropped.
    pub async fn send(&self, event: Event) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn status(&self, message: impl Into<String>) -> bool {
        self.send(Event::Status(message.into())).await
    }

    pub async fn file(&self, event: FileEvent) -> bool {
        self.send(Event::File(event)).await
    }

    pub async fn error(&self, error: EngineError) -> bool {
        log::debug!("Operation failed: {}", error);
        self.send(Event::Error(error)).await
    }
}

/// Consuming half of an event channel.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
}

impl EventStream {
    /// Next event, or `None` once the producer is done.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Drain the stream, keeping only the errors.
    pub async fn errors(mut self) -> Vec<EngineError> {
        let mut errors = Vec::new();
        while let Some(event) = self.next().await {
            if let Event::Error(e) = event {
                errors.push(e);
            }
        }
        errors
    }

    /// Drain the stream, keeping every event.
    pub async fn collect(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// A channel that carries one event at a time.
pub fn channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::channel(1);
    (EventSender { tx }, EventStream { rx })
}

/// How forwarding a sub-operation's stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// The sub-operation finished; this many of its events were errors.
    Completed { errors: usize },
    /// Cancellation was observed first.
    Cancelled,
}

impl Forwarded {
    /// True when the sub-operation finished without errors.
    pub fn is_clean(self) -> bool {
        self == Forwarded::Completed { errors: 0 }
    }
}

/// Relay `sub` into `out` until it ends, watching `cancel` at the same time.
///
/// On cancellation nothing more is relayed. The sub-operation is expected to
/// watch a child of `cancel` and roll back; its stream is drained so that it
/// has released the connection before this returns.
pub async fn forward(
    sub: &mut EventStream,
    out: &EventSender,
    cancel: &CancellationToken,
) -> Forwarded {
    let mut errors = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Cancellation requested, waiting for the running step to stop");
                while sub.next().await.is_some() {}
                return Forwarded::Cancelled;
            }
            event = sub.next() => match event {
                Some(event) => {
                    if matches!(event, Event::Error(_)) {
                        errors += 1;
                    }
                    out.send(event).await;
                }
                None => return Forwarded::Completed { errors },
            },
        }
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
