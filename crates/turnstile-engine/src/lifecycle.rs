//! Lifecycle signal channels: actor presence transitions serviced by the
//! scheduler.
//!
//! Each channel is a rendezvous. A caller blocks until the scheduler has
//! taken the signal, then until it has finished servicing it, so presence
//! changes are totally ordered with turn processing and with each other.

use crossbeam_channel::{Receiver, Sender};

use turnstile_core::id::{ActorId, ConnectionId, RoomId};

use crate::funnel::SubmitError;

/// A lifecycle request paired with its completion acknowledgment.
#[derive(Debug)]
pub(crate) struct Signal<T> {
    pub payload: T,
    pub done: Sender<()>,
}

impl<T> Signal<T> {
    /// Tell the caller the signal has been serviced.
    pub fn ack(self) {
        // The caller may have given up waiting.
        let _ = self.done.send(());
    }
}

/// Cloneable producer side of the lifecycle channels.
#[derive(Clone, Debug)]
pub struct LifecycleHandle {
    enter: Sender<Signal<(ActorId, RoomId)>>,
    leave: Sender<Signal<ActorId>>,
    logout: Sender<Signal<ConnectionId>>,
    zombie: Sender<Signal<(ActorId, bool)>>,
}

impl LifecycleHandle {
    /// Bring an actor into the world at `room`.
    pub fn enter_world(&self, actor: ActorId, room: RoomId) -> Result<(), SubmitError> {
        rendezvous(&self.enter, (actor, room))
    }

    /// Take an actor out of the world.
    pub fn leave_world(&self, actor: ActorId) -> Result<(), SubmitError> {
        rendezvous(&self.leave, actor)
    }

    /// End the session bound to `connection`.
    pub fn logout(&self, connection: ConnectionId) -> Result<(), SubmitError> {
        rendezvous(&self.logout, connection)
    }

    /// Flag or unflag an actor as disconnected-but-resumable.
    pub fn set_zombie(&self, actor: ActorId, zombie: bool) -> Result<(), SubmitError> {
        rendezvous(&self.zombie, (actor, zombie))
    }
}

fn rendezvous<T>(tx: &Sender<Signal<T>>, payload: T) -> Result<(), SubmitError> {
    let (done, acked) = crossbeam_channel::bounded(1);
    tx.send(Signal { payload, done })
        .map_err(|_| SubmitError::Shutdown)?;
    acked.recv().map_err(|_| SubmitError::Shutdown)
}

/// Scheduler side of the lifecycle channels.
#[derive(Debug)]
pub(crate) struct LifecycleReceivers {
    pub enter: Receiver<Signal<(ActorId, RoomId)>>,
    pub leave: Receiver<Signal<ActorId>>,
    pub logout: Receiver<Signal<ConnectionId>>,
    pub zombie: Receiver<Signal<(ActorId, bool)>>,
}

/// Create the four rendezvous channels.
pub(crate) fn lifecycle_channels() -> (LifecycleHandle, LifecycleReceivers) {
    let (enter_tx, enter_rx) = crossbeam_channel::bounded(0);
    let (leave_tx, leave_rx) = crossbeam_channel::bounded(0);
    let (logout_tx, logout_rx) = crossbeam_channel::bounded(0);
    let (zombie_tx, zombie_rx) = crossbeam_channel::bounded(0);
    (
        LifecycleHandle {
            enter: enter_tx,
            leave: leave_tx,
            logout: logout_tx,
            zombie: zombie_tx,
        },
        LifecycleReceivers {
            enter: enter_rx,
            leave: leave_rx,
            logout: logout_rx,
            zombie: zombie_rx,
        },
    )
}
