use serde::Serialize;

use crate::{models::RoomId, registry::ConnectionRegistry};

/// Fans a payload out to every connection registered for a room.
#[derive(Clone)]
pub struct RoomBroadcaster {
    registry: ConnectionRegistry,
}

impl RoomBroadcaster {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Returns how many connections accepted the payload.
    ///
    /// Connections whose writer has gone away are dropped from the registry;
    /// nothing here fails the caller.
    pub fn broadcast<T: Serialize>(&self, room_id: RoomId, payload: &T) -> usize {
        let frame = match serde_json::to_string(payload) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(%room_id, error = %err, "could not encode broadcast payload");
                return 0;
            }
        };

        let connections = self.registry.connections_in_room(room_id);
        let mut delivered = 0;
        for connection in connections {
            match connection.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::warn!(
                        %room_id,
                        connection = ?connection.id,
                        "dropping dead connection during broadcast"
                    );
                    self.registry.unregister(connection.id);
                }
            }
        }
        delivered
    }
}
