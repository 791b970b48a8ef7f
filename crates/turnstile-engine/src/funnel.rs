//! The input funnel: a rendezvous hand-off from producer threads into
//! the world's input inbox.
//!
//! ```text
//! Producer(s)                 Funnel thread                Scheduler
//!     |                            |                           |
//!     |--submit(input)------------>| input_rx.recv()           |
//!     |   [bounded(0): blocks      | inbox_tx.send(input)      |
//!     |    until accepted]         |   [unbounded]------------>| pull_inbox()
//!     |                            |                           | drain_input()
//! ```
//!
//! The funnel never takes the exclusivity token. Input reaches the
//! input queue at the start of the next turn.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, Receiver, Sender};
use thiserror::Error;
use tracing::{info, trace, warn};

use turnstile_core::event::InputEvent;
use turnstile_core::id::{ActorId, MobId};

/// A producer hand-off failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The world has shut down and accepts nothing further.
    #[error("world has shut down")]
    Shutdown,
}

/// Cloneable producer side of the funnel.
#[derive(Clone, Debug)]
pub struct InputHandle {
    tx: Sender<InputEvent>,
}

impl InputHandle {
    /// Hand `input` to the funnel, blocking until it is accepted.
    pub fn submit(&self, input: InputEvent) -> Result<(), SubmitError> {
        self.tx.send(input).map_err(|_| SubmitError::Shutdown)
    }

    /// Submit a line typed by an actor.
    pub fn submit_actor(
        &self,
        actor: ActorId,
        text: impl Into<String>,
        wait_turns: i32,
    ) -> Result<(), SubmitError> {
        self.submit(InputEvent::actor(actor, text, wait_turns))
    }

    /// Submit a command issued by a mob's AI.
    pub fn submit_mob(
        &self,
        mob: MobId,
        text: impl Into<String>,
        wait_turns: i32,
    ) -> Result<(), SubmitError> {
        self.submit(InputEvent::mob(mob, text, wait_turns))
    }
}

/// Spawn the funnel thread.
///
/// It forwards everything submitted through the returned handle into
/// `inbox` until `shutdown` disconnects or the inbox is dropped.
pub(crate) fn spawn_funnel(
    inbox: Sender<InputEvent>,
    shutdown: Receiver<()>,
) -> std::io::Result<(InputHandle, JoinHandle<()>)> {
    let (tx, rx) = crossbeam_channel::bounded(0);
    let handle = thread::Builder::new()
        .name("turnstile-funnel".into())
        .spawn(move || run(rx, inbox, shutdown))?;
    Ok((InputHandle { tx }, handle))
}

fn run(input: Receiver<InputEvent>, inbox: Sender<InputEvent>, shutdown: Receiver<()>) {
    info!("input funnel started");
    let mut forwarded: u64 = 0;
    loop {
        select! {
            recv(shutdown) -> _ => {
                warn!(forwarded, "input funnel received shutdown");
                break;
            }
            recv(input) -> msg => {
                let Ok(event) = msg else {
                    break;
                };
                trace!(source = ?event.source, wait = event.wait_turns, "funnel accepted input");
                if inbox.send(event).is_err() {
                    warn!(forwarded, "input inbox closed; funnel stopping");
                    break;
                }
                forwarded += 1;
            }
        }
    }
    info!(forwarded, "input funnel stopped");
}
