//! Session abstraction.
//!
//! A session is one connected client as seen by a [`Room`]. The transport
//! behind it is an infrastructure concern; rooms only need identity, a
//! display name and a way to deliver text.

use std::sync::{Arc, Weak};

use super::{ClientName, Room, SessionId};

/// One connected client.
///
/// Delivery methods return `false` when the underlying connection is gone;
/// rooms treat that as a disconnect and evict the session.
#[cfg_attr(test, mockall::automock)]
pub trait Session: Send + Sync {
    /// Stable identity of this connection.
    fn id(&self) -> SessionId;

    /// Display name, absent until the client identifies.
    fn display_name(&self) -> Option<ClientName>;

    /// Set the display name. Returns `false` if a name was already set.
    fn identify(&self, name: ClientName) -> bool;

    /// Deliver a chat line attributed to `from`.
    fn send(&self, from: &str, message: &str) -> bool;

    /// Deliver a join/leave notification about `client_name`.
    ///
    /// An empty `message` means "status only" (used for the roster sent to
    /// a newcomer).
    fn send_connection_status(&self, client_name: &str, is_connected: bool, message: &str) -> bool;

    /// Tell the client it now lives in `room_name`.
    fn send_room_changed(&self, room_name: &str) -> bool;

    /// Room this session currently belongs to, if it is still alive.
    fn current_room(&self) -> Option<Arc<Room>>;

    /// Point the back-reference at `room`.
    fn set_current_room(&self, room: Weak<Room>);
}
