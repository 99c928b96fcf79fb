use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::SendError};
use uuid::Uuid;

use crate::models::{RoomId, UserId};

/// Identity of one live transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a live connection's outbound queue.
///
/// The socket itself belongs to the connection's writer task; sending here
/// never touches the network, and fails once that task is gone.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub owner: UserId,
    outbound: UnboundedSender<String>,
}

impl Connection {
    /// A new connection handle and the receiving end its writer task drains.
    pub fn open(owner: UserId) -> (Connection, UnboundedReceiver<String>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let connection = Connection {
            id: ConnectionId::new(),
            owner,
            outbound,
        };
        (connection, rx)
    }

    pub fn send(&self, frame: String) -> Result<(), SendError<String>> {
        self.outbound.send(frame)
    }
}

#[derive(Default)]
struct Indices {
    by_connection: HashMap<ConnectionId, (RoomId, Connection)>,
    by_room: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl Indices {
    fn detach(&mut self, id: ConnectionId) -> Option<RoomId> {
        let (room_id, _) = self.by_connection.remove(&id)?;
        if let Some(members) = self.by_room.get_mut(&room_id) {
            members.remove(&id);
            if members.is_empty() {
                self.by_room.remove(&room_id);
            }
        }
        Some(room_id)
    }
}

/// Live connections indexed by identity and by room.
///
/// Both indices sit behind one mutex and are only ever changed together.
/// The lock is never held across an await point.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Indices>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Indices> {
        // Indices are consistent after every statement, so a poisoned guard is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registering a known connection again moves it to `room_id`.
    pub fn register(&self, connection: Connection, room_id: RoomId) {
        let id = connection.id;
        let owner = connection.owner;
        let mut guard = self.lock();
        guard.detach(id);
        guard.by_room.entry(room_id).or_default().insert(id);
        guard.by_connection.insert(id, (room_id, connection));
        let in_room = guard.by_room.get(&room_id).map_or(0, HashSet::len);
        drop(guard);

        tracing::debug!(
            connection = ?id,
            %room_id,
            user_id = %owner,
            in_room,
            "connection registered"
        );
    }

    /// Unknown ids are ignored.
    pub fn unregister(&self, id: ConnectionId) {
        let removed = self.lock().detach(id);
        if let Some(room_id) = removed {
            tracing::debug!(connection = ?id, %room_id, "connection unregistered");
        }
    }

    /// Copy of the connections registered for `room_id` right now.
    pub fn connections_in_room(&self, room_id: RoomId) -> Vec<Connection> {
        let guard = self.lock();
        let Some(members) = guard.by_room.get(&room_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| guard.by_connection.get(id))
            .map(|(_, connection)| connection.clone())
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().by_connection.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
