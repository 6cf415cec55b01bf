//! Room entity: membership, message routing and lifecycle.
//!
//! A room moves through `Active → Empty → Closing → Defunct`. It closes as
//! soon as its membership drops to zero, migrates any stragglers to the
//! lobby, asks the registry to forget it and clears its name. The lobby is
//! exempt and never closes.
//!
//! Every read or write of the membership list, including delivery (which
//! evicts dead sessions in place), happens under the room's own mutex.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use super::{
    command::{self, ChatCommand, ChatInput},
    error::RoomError,
    registry::RoomRegistry,
    session::Session,
    value_object::{ClientName, RoomName, SessionId, Timestamp},
};

/// A named broadcast domain.
pub struct Room {
    state: Mutex<RoomState>,
    is_lobby: bool,
    created_at: Timestamp,
    registry: Weak<dyn RoomRegistry>,
}

struct RoomState {
    /// `None` once the room is defunct
    name: Option<RoomName>,
    members: Vec<Arc<dyn Session>>,
}

impl RoomState {
    fn contains(&self, id: &SessionId) -> bool {
        self.members.iter().any(|m| &m.id() == id)
    }

    /// Run `deliver` for every member and drop the ones it fails for.
    fn deliver_each(&mut self, room_name: &str, mut deliver: impl FnMut(&Arc<dyn Session>) -> bool) {
        self.members.retain(|member| {
            let delivered = deliver(member);
            if !delivered {
                tracing::info!("Removed client '{}' from '{}'", member.id(), room_name);
            }
            delivered
        });
    }

    fn deliver_status(&mut self, room_name: &str, client_name: &str, is_connected: bool, message: &str) {
        self.deliver_each(room_name, |member| {
            member.send_connection_status(client_name, is_connected, message)
        });
    }
}

impl Room {
    /// Create an ordinary room.
    pub fn new(name: RoomName, registry: Weak<dyn RoomRegistry>, created_at: Timestamp) -> Self {
        Self::build(name, registry, created_at, false)
    }

    /// Create the lobby. It is exempt from closing.
    pub fn new_lobby(name: RoomName, registry: Weak<dyn RoomRegistry>, created_at: Timestamp) -> Self {
        Self::build(name, registry, created_at, true)
    }

    fn build(
        name: RoomName,
        registry: Weak<dyn RoomRegistry>,
        created_at: Timestamp,
        is_lobby: bool,
    ) -> Self {
        Self {
            state: Mutex::new(RoomState {
                name: Some(name),
                members: Vec::new(),
            }),
            is_lobby,
            created_at,
            registry,
        }
    }

    pub fn is_lobby(&self) -> bool {
        self.is_lobby
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Room name, or `None` once the room is defunct.
    pub async fn name(&self) -> Option<RoomName> {
        self.state.lock().await.name.clone()
    }

    pub async fn is_defunct(&self) -> bool {
        self.state.lock().await.name.is_none()
    }

    pub async fn member_count(&self) -> usize {
        self.state.lock().await.members.len()
    }

    /// Display names of identified members, in join order.
    pub async fn member_names(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .members
            .iter()
            .filter_map(|m| m.display_name().map(ClientName::into_string))
            .collect()
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.state.lock().await.contains(id)
    }

    /// Names of all live rooms, for the room browser.
    pub async fn room_names(&self) -> Vec<String> {
        match self.registry.upgrade() {
            Some(registry) => registry.get_rooms().await,
            None => Vec::new(),
        }
    }

    /// Add `session` to this room.
    ///
    /// Adding a session that is already a member is a logged no-op. A
    /// session without a display name joins silently; a named one is
    /// announced to the room and receives the current roster.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Defunct` if the room has closed.
    pub async fn add_client(self: &Arc<Self>, session: Arc<dyn Session>) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        if state.name.is_none() {
            return Err(RoomError::Defunct);
        }
        self.admit(&mut state, session);
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    /// Add several sessions at once without triggering cleanup.
    ///
    /// Used to migrate members of a closing room into the lobby, which never
    /// closes itself.
    pub async fn add_clients(
        self: &Arc<Self>,
        sessions: Vec<Arc<dyn Session>>,
    ) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        if state.name.is_none() {
            return Err(RoomError::Defunct);
        }
        for session in sessions {
            self.admit(&mut state, session);
        }
        Ok(())
    }

    /// Announce a member that identified after joining.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::NotAMember` if `session` is not in this room.
    pub async fn announce_client(&self, session: &Arc<dyn Session>) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let Some(room_name) = state.name.clone() else {
            return Err(RoomError::Defunct);
        };
        if !state.contains(&session.id()) {
            return Err(RoomError::NotAMember(session.id().to_string()));
        }
        Self::announce(&mut state, session, &room_name);
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    /// Remove `session`, whether or not it was a member.
    ///
    /// An ordinary room that ends up empty closes. Otherwise the remaining
    /// members are told the session left.
    pub async fn remove_client(&self, session: &Arc<dyn Session>) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let Some(room_name) = state.name.clone() else {
            tracing::debug!("Ignoring removal of '{}' from a closed room", session.id());
            return Err(RoomError::Defunct);
        };

        let id = session.id();
        let before = state.members.len();
        state.members.retain(|m| m.id() != id);
        if state.members.len() < before {
            tracing::info!("Client '{}' left '{}'", id, room_name);
        }

        if !state.members.is_empty()
            && let Some(client_name) = session.display_name()
        {
            state.deliver_status(
                room_name.as_str(),
                client_name.as_str(),
                false,
                &format!("left the room {room_name}"),
            );
        }
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    /// Send a join/leave notification about `client_name` to every member.
    ///
    /// Members whose connection is dead are evicted during the same pass.
    pub async fn send_connection_status(
        &self,
        client_name: &ClientName,
        is_connected: bool,
        message: &str,
    ) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let Some(room_name) = state.name.clone() else {
            return Err(RoomError::Defunct);
        };
        state.deliver_status(room_name.as_str(), client_name.as_str(), is_connected, message);
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    /// Handle one inbound chat line from `sender`.
    ///
    /// The line is a command, a private message or a broadcast, never more
    /// than one. Unknown or malformed commands are swallowed. Lines from a
    /// session that has not identified yet are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Defunct` if the room has closed.
    pub async fn send_message(
        self: &Arc<Self>,
        sender: &Arc<dyn Session>,
        text: &str,
    ) -> Result<(), RoomError> {
        if self.is_defunct().await {
            return Err(RoomError::Defunct);
        }
        let Some(sender_name) = sender.display_name() else {
            tracing::debug!("Ignoring message from unidentified session '{}'", sender.id());
            return Ok(());
        };

        match ChatInput::parse(text) {
            ChatInput::Command(command) => {
                self.process_command(sender, &sender_name, command).await;
                Ok(())
            }
            ChatInput::PrivateMessage(recipients) => {
                self.send_private_message(sender, &sender_name, &recipients, text)
                    .await
            }
            ChatInput::Broadcast => self.broadcast(&sender_name, text).await,
        }
    }

    /// Close the room if nobody is in it.
    ///
    /// The lobby stays open.
    pub async fn close_if_empty(&self) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        if state.name.is_none() {
            return Err(RoomError::Defunct);
        }
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    /// Close the room now, migrating any members to the lobby.
    ///
    /// Closing the lobby is a no-op.
    pub async fn close(&self) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        if state.name.is_none() {
            return Err(RoomError::Defunct);
        }
        if self.is_lobby {
            tracing::debug!("Refusing to close the lobby");
            return Ok(());
        }
        self.close_locked(&mut state).await;
        Ok(())
    }

    fn admit(self: &Arc<Self>, state: &mut RoomState, session: Arc<dyn Session>) {
        let Some(room_name) = state.name.clone() else {
            return;
        };
        let id = session.id();
        session.set_current_room(Arc::downgrade(self));
        if state.contains(&id) {
            tracing::info!("Client '{}' is already in '{}'", id, room_name);
            return;
        }

        state.members.push(Arc::clone(&session));
        tracing::info!("Client '{}' joined '{}'", id, room_name);

        if !session.send_room_changed(room_name.as_str()) {
            tracing::info!("Removed client '{}' from '{}'", id, room_name);
            state.members.retain(|m| m.id() != id);
            return;
        }
        Self::announce(state, &session, &room_name);
    }

    /// Joined broadcast plus catch-up roster for the newcomer.
    fn announce(state: &mut RoomState, session: &Arc<dyn Session>, room_name: &RoomName) {
        let Some(client_name) = session.display_name() else {
            return;
        };
        state.deliver_status(
            room_name.as_str(),
            client_name.as_str(),
            true,
            &format!("joined the room {room_name}"),
        );

        let id = session.id();
        if !state.contains(&id) {
            return;
        }
        let roster_delivered = state
            .members
            .iter()
            .filter(|m| m.id() != id)
            .filter_map(|m| m.display_name())
            .all(|name| session.send_connection_status(name.as_str(), true, ""));
        if !roster_delivered {
            tracing::info!("Removed client '{}' from '{}'", id, room_name);
            state.members.retain(|m| m.id() != id);
        }
    }

    async fn process_command(
        self: &Arc<Self>,
        sender: &Arc<dyn Session>,
        sender_name: &ClientName,
        command: ChatCommand,
    ) {
        tracing::info!("'{}' issued /{}", sender_name, command.name());
        match command {
            ChatCommand::CreateRoom(name) => {
                let Some(registry) = self.registry.upgrade() else {
                    return;
                };
                match registry.create_new_room(name.clone()).await {
                    Ok(room) => {
                        // Closed again unless the creator makes it inside, even if
                        // this future is dropped halfway through the move
                        let pending = UnclaimedRoom(Some(Arc::clone(&room)));
                        match registry
                            .move_session(Arc::clone(sender), Some(Arc::clone(self)), room)
                            .await
                        {
                            Ok(()) => pending.claim(),
                            Err(e) => {
                                tracing::warn!("Failed to move '{}' into '{}': {}", sender_name, name, e);
                            }
                        }
                    }
                    Err(e) => tracing::debug!("createroom ignored: {}", e),
                }
            }
            ChatCommand::JoinRoom(name) => {
                let Some(registry) = self.registry.upgrade() else {
                    return;
                };
                if let Err(e) = registry.join_room(&name, Arc::clone(sender)).await {
                    tracing::debug!("joinroom ignored: {}", e);
                }
            }
            ChatCommand::Roll => {
                let text = command::roll(&mut rand::rng());
                self.reply_to_sender(sender, sender_name, &text).await;
            }
            ChatCommand::Flip => {
                let text = command::flip(&mut rand::rng());
                self.reply_to_sender(sender, sender_name, &text).await;
            }
            ChatCommand::Malformed(_) | ChatCommand::Unknown(_) => {
                tracing::debug!("Swallowed command from '{}'", sender_name);
            }
        }
    }

    async fn reply_to_sender(&self, sender: &Arc<dyn Session>, sender_name: &ClientName, text: &str) {
        if !sender.send(sender_name.as_str(), text) {
            let _ = self.remove_client(sender).await;
        }
    }

    async fn send_private_message(
        &self,
        sender: &Arc<dyn Session>,
        sender_name: &ClientName,
        recipients: &[String],
        text: &str,
    ) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let Some(room_name) = state.name.clone() else {
            return Err(RoomError::Defunct);
        };
        let sender_id = sender.id();

        state.deliver_each(room_name.as_str(), |member| {
            if member.id() == sender_id {
                return true;
            }
            match member.display_name() {
                Some(name) if recipients.iter().any(|r| r == name.as_str()) => {
                    member.send(sender_name.as_str(), text)
                }
                _ => true,
            }
        });

        if !sender.send(sender_name.as_str(), text) {
            tracing::info!("Removed client '{}' from '{}'", sender_id, room_name);
            state.members.retain(|m| m.id() != sender_id);
        }
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    async fn broadcast(&self, sender_name: &ClientName, text: &str) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        let Some(room_name) = state.name.clone() else {
            return Err(RoomError::Defunct);
        };
        tracing::debug!(
            "{}: Sending message to {} clients",
            room_name,
            state.members.len()
        );
        state.deliver_each(room_name.as_str(), |member| {
            member.send(sender_name.as_str(), text)
        });
        self.cleanup_if_empty(&mut state).await;
        Ok(())
    }

    async fn cleanup_if_empty(&self, state: &mut RoomState) {
        if self.is_lobby || state.name.is_none() || !state.members.is_empty() {
            return;
        }
        self.close_locked(state).await;
    }

    async fn close_locked(&self, state: &mut RoomState) {
        let Some(room_name) = state.name.clone() else {
            return;
        };
        tracing::info!("Closing room '{}'", room_name);
        let registry = self.registry.upgrade();

        if !state.members.is_empty() {
            let migrating: Vec<Arc<dyn Session>> = state.members.drain(..).collect();
            tracing::info!("Migrating {} client(s) to the lobby", migrating.len());
            match &registry {
                Some(registry) => {
                    if let Err(e) = registry.lobby().add_clients(migrating).await {
                        tracing::error!("Failed to migrate clients to the lobby: {}", e);
                    }
                }
                None => tracing::warn!("Registry is gone; dropping members of '{}'", room_name),
            }
        }

        if let Some(registry) = registry {
            registry.cleanup_room(&room_name).await;
        }
        state.name = None;
        tracing::info!("Room '{}' closed", room_name);
    }
}

/// A room created for a move that has not completed yet.
///
/// Dropping it unclaimed closes the room if it is still empty, so a name is
/// never held by a room nobody entered.
struct UnclaimedRoom(Option<Arc<Room>>);

impl UnclaimedRoom {
    fn claim(mut self) {
        self.0 = None;
    }
}

impl Drop for UnclaimedRoom {
    fn drop(&mut self) {
        let Some(room) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = room.close_if_empty().await {
                        tracing::debug!("Unclaimed room already closed: {}", e);
                    }
                });
            }
            Err(e) => tracing::warn!("Cannot close unclaimed room without a runtime: {}", e),
        }
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("is_lobby", &self.is_lobby)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
