mod events;
mod presence;
mod registry;
mod rooms;
mod sessions;
mod util;

use std::sync::Arc;

pub use events::*;
pub use presence::*;
pub use registry::*;
pub use rooms::*;
pub use sessions::*;
pub use util::*;

use crossbeam::channel::unbounded;

/// The codedeck collab system, facilitating room synchronization, presence, and chat.
pub struct Collab {
    context: CollabContext,

    pub rooms: RoomSync,
    event_receiver: EventReceiver,
}

/// A type passed to various components of the collab system, to access state and emit events.
#[derive(Clone)]
pub struct CollabContext {
    pub registry: Arc<dyn RoomRegistry>,
    pub presence: Arc<PresenceTracker>,
    pub sessions: Arc<SessionStore>,

    event_sender: EventSender,
}

impl Collab {
    pub fn new<R>(registry: R) -> Self
    where
        R: RoomRegistry + 'static,
    {
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            registry: Arc::new(registry),
            presence: Arc::new(PresenceTracker::new()),
            sessions: Arc::new(SessionStore::new()),
            event_sender,
        };

        let rooms = RoomSync::new(&context);

        Self {
            context,
            rooms,
            event_receiver,
        }
    }

    /// Registers a new, unbound session connection.
    pub fn create_session(&self) -> Arc<SessionConnection> {
        self.context.sessions.create()
    }

    /// Returns a receiver for the events emitted towards clients.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }
}

impl CollabContext {
    pub fn emit(&self, event: CollabEvent, recipients: Recipients) {
        self.event_sender
            .send((event, recipients))
            .expect("event is sent");
    }
}
