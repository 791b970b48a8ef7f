//! The outbound dispatcher: the high-frequency message tick.
//!
//! Each tick drains, in order, the system, outbound payload, broadcast,
//! client text and message queues and hands the results to the network.
//! Every connection that received message text this tick then gets one
//! prompt redraw, in first-delivery order.

use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use turnstile_core::catalog::BuffFlag;
use turnstile_core::event::Message;
use turnstile_core::id::{ActorId, ConnectionId};

use crate::config::GameConfig;
use crate::world_core::{turn_context, WorldCore};

/// Moves the cursor to column 1 and erases the line, so output does not
/// land in the middle of a half-typed command.
pub const LINE_REFRESH: &str = "\x1b[1G\x1b[2K";

/// What one message tick delivered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// System commands serviced.
    pub system: u32,
    /// Structured payloads sent.
    pub payloads: u32,
    /// Broadcasts sent.
    pub broadcasts: u32,
    /// Web client text sent.
    pub client_text: u32,
    /// Individual message deliveries.
    pub deliveries: u32,
    /// Prompts redrawn.
    pub prompts: u32,
}

impl WorldCore {
    /// Deliver everything queued for the network.
    pub fn message_tick(&mut self, config: &GameConfig) -> DispatchStats {
        let mut stats = DispatchStats::default();

        // 1. System commands.
        for event in self.queues.system.take_generation() {
            stats.system += 1;
            match event.command.as_str() {
                "reload" => {
                    self.queues.broadcast("Reloading flat files...", false);
                    let mut ctx = turn_context!(self, config);
                    self.hooks.reload_data(&mut ctx);
                    self.queues.broadcast("Done.\r\n", true);
                }
                other => warn!(command = other, "unknown system command"),
            }
        }

        // 2. Structured payloads.
        for payload in self.queues.outbound.take_generation() {
            let Some(actor) = self.state.actors.get(&payload.actor) else {
                debug!(actor = %payload.actor, module = %payload.module, "payload for offline actor");
                continue;
            };
            if !self.network.supports_channel(actor.connection, &payload.module) {
                continue;
            }
            match serde_json::to_string(&payload.payload) {
                Ok(json) => {
                    let frame = format!("{} {json}", payload.module);
                    self.network.send_to(actor.connection, frame.as_bytes());
                    stats.payloads += 1;
                }
                Err(e) => error!(module = %payload.module, error = %e, "payload did not serialize"),
            }
        }

        // 3. Broadcasts.
        for broadcast in self.queues.broadcast.take_generation() {
            if broadcast.skip_line_refresh {
                self.network.broadcast(broadcast.text.as_bytes());
            } else {
                let framed = format!("{LINE_REFRESH}{}", broadcast.text);
                self.network.broadcast(framed.as_bytes());
            }
            stats.broadcasts += 1;
        }

        // 4. Web client text.
        for text in self.queues.client_text.take_generation() {
            if !self.network.is_websocket(text.connection) {
                continue;
            }
            self.network.send_to(text.connection, text.text.as_bytes());
            stats.client_text += 1;
        }

        // 5. Messages.
        let mut redraw: IndexMap<ConnectionId, ActorId> = IndexMap::new();
        for message in self.queues.message.take_generation() {
            stats.deliveries += self.deliver(&message, &mut redraw);
        }

        // 6. Prompts.
        for (connection, actor) in redraw {
            if let Some(actor) = self.state.actors.get(&actor) {
                self.network
                    .send_to(connection, actor.command_prompt().as_bytes());
                stats.prompts += 1;
            }
        }

        trace!(?stats, "message tick");
        stats
    }

    /// Send one message to its actor and/or room. Returns deliveries made.
    fn deliver(&mut self, message: &Message, redraw: &mut IndexMap<ConnectionId, ActorId>) -> u32 {
        let framed = format!("{LINE_REFRESH}{}", message.text);
        let mut delivered = 0;

        if let Some(id) = message.actor {
            if let Some(actor) = self.state.actors.get(&id) {
                if !(message.is_communication && actor.deafened) {
                    self.network.send_to(actor.connection, framed.as_bytes());
                    redraw.entry(actor.connection).or_insert(id);
                    delivered += 1;
                }
            }
        }

        let Some(room) = message.room else {
            return delivered;
        };
        let Some(room) = self.state.rooms.get(&room) else {
            debug!(room = %room, "message for unloaded room");
            return delivered;
        };
        for &id in &room.players {
            if message.actor == Some(id) || message.exclude.contains(&id) {
                continue;
            }
            let Some(listener) = self.state.actors.get(&id) else {
                continue;
            };
            if message.is_communication && listener.deafened {
                continue;
            }
            if message.is_quiet && !listener.character.has_buff_flag(BuffFlag::SuperHearing) {
                continue;
            }
            self.network.send_to(listener.connection, framed.as_bytes());
            redraw.entry(listener.connection).or_insert(id);
            delivered += 1;
        }
        delivered
    }
}
