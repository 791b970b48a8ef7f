//! Room action drain: delayed area effects and grenade detonations.
//!
//! Action text is a verb plus up to two arguments:
//!
//! - `detonate <item>`: blast everyone in the room.
//! - `detonate <target> <item>`: a player target spares mobs, a mob
//!   target spares players.
//! - `wildfire`: start a lingering wildfire.
//!
//! Items may be named or given as `!<spec>:<uid>`.

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use turnstile_core::catalog::ItemKind;
use turnstile_core::event::{BuffChange, BuffEvent, InputEvent, RoomActionEvent, Target};
use turnstile_core::id::{ActorId, MobId, RoomId};
use turnstile_core::room::RoomEffect;

use crate::config::GameConfig;
use crate::metrics::TurnMetrics;
use crate::world_core::WorldCore;

const BLAST_LINE: &str = "--- --- --- --- --- --- --- --- --- --- --- ---";

/// A room action split into its verb and arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedAction {
    /// First word.
    pub verb: String,
    /// Up to two further words; the second keeps any spaces.
    pub args: SmallVec<[String; 2]>,
}

impl ParsedAction {
    /// Split action text into at most three parts.
    pub fn parse(action: &str) -> Self {
        let mut parts = action.splitn(3, ' ');
        let verb = parts.next().unwrap_or_default().to_string();
        let args = parts.filter(|p| !p.is_empty()).map(str::to_string).collect();
        Self { verb, args }
    }

    /// The explicit target, present only in the two-argument form.
    pub fn target(&self) -> Option<&str> {
        match self.args.as_slice() {
            [target, _] => Some(target),
            _ => None,
        }
    }

    /// The item argument: the last one given.
    pub fn item(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Whether this is a detonation.
    pub fn is_detonation(&self) -> bool {
        self.verb == "detonate"
    }
}

impl WorldCore {
    /// Drain one generation of the room action queue.
    pub(crate) fn drain_room_actions(&mut self, m: &mut TurnMetrics, config: &GameConfig) {
        let turns_per_round = config.turns_per_round();

        for mut action in self.queues.room_action.take_generation() {
            trace!(room = %action.room, wait = action.wait_turns, action = %action.action, "room action");
            if action.wait_turns > 0 {
                if u64::from(action.wait_turns) % turns_per_round == 0 {
                    self.warn_of_detonation(&action);
                }
                action.wait_turns -= 1;
                self.queues.room_action.requeue(action);
                m.room_actions_requeued += 1;
                continue;
            }
            if self.fire_room_action(action, m, config) {
                m.room_actions_fired += 1;
            } else {
                m.events_dropped += 1;
            }
        }
    }

    /// Tell the room a pending grenade is about to go off.
    fn warn_of_detonation(&mut self, action: &RoomActionEvent) {
        let parsed = ParsedAction::parse(&action.action);
        if !parsed.is_detonation() {
            return;
        }
        let Some(room) = self.state.rooms.get(&action.room) else {
            return;
        };
        let name = parsed
            .item()
            .and_then(|n| room.find_on_floor(n, &self.state.catalog))
            .and_then(|item| self.state.catalog.item(item.spec))
            .map(|spec| spec.name.clone());
        if let Some(name) = name {
            self.queues.room_text(
                action.room,
                format!("The {name} looks like it's about to explode..."),
                &[],
            );
        }
    }

    /// Fire an action whose delay has run out. Returns `false` if dropped.
    fn fire_room_action(
        &mut self,
        action: RoomActionEvent,
        m: &mut TurnMetrics,
        config: &GameConfig,
    ) -> bool {
        let Ok(room) = self.state.room_mut(action.room) else {
            debug!(room = %action.room, "room action for unloaded room");
            return false;
        };

        if let Some(effect) = RoomEffect::from_name(&action.action) {
            if room.add_effect(effect) {
                let neighbours = room.neighbours();
                self.queues
                    .room_text(action.room, "A wildfire burns through the area!", &[]);
                for exit in neighbours {
                    self.queues.room_text(exit, "You notice a wildfire start!", &[]);
                }
            }
            return true;
        }

        let parsed = ParsedAction::parse(&action.action);
        if !parsed.is_detonation() {
            warn!(room = %action.room, action = %action.action, "unknown room action");
            return false;
        }
        self.detonate(&action, &parsed, m, config)
    }

    fn detonate(
        &mut self,
        action: &RoomActionEvent,
        parsed: &ParsedAction,
        m: &mut TurnMetrics,
        config: &GameConfig,
    ) -> bool {
        let Some(item_name) = parsed.item() else {
            return false;
        };
        let Some(room) = self.state.rooms.get_mut(&action.room) else {
            return false;
        };
        let Some(item) = room.find_on_floor(item_name, &self.state.catalog) else {
            debug!(room = %action.room, item = item_name, "detonation: item not on floor");
            return false;
        };
        let Some(spec) = self.state.catalog.item(item.spec).cloned() else {
            return false;
        };
        if spec.kind != ItemKind::Grenade {
            return false;
        }
        room.remove_item(item);
        let players = room.players.clone();
        let mobs = room.mobs.clone();
        let neighbours = room.neighbours();
        m.detonations += 1;

        let here = action.room;
        self.queues.room_text(here, BLAST_LINE, &[]);
        self.queues
            .room_text(here, format!("The {} EXPLODES!", spec.name), &[]);
        self.queues.room_text(here, BLAST_LINE, &[]);
        for exit in neighbours {
            self.queues
                .room_text(exit, "You hear a large !!!EXPLOSION!!!", &[]);
        }

        if spec.buff_ids.is_empty() {
            return true;
        }

        let target = parsed
            .target()
            .and_then(|name| self.state.find_in_room(here, name));
        let hit_players = !matches!(target, Some(Target::Mob(_)));
        let hit_mobs = !matches!(target, Some(Target::Actor(_)));

        if let Some(effect) = spec.area_effect {
            self.queues.room_action.requeue(RoomActionEvent {
                room: here,
                source: action.source,
                action: effect.name().to_string(),
                wait_turns: 0,
            });
        }

        let source_actor = action.source.and_then(Target::actor);

        if hit_players {
            for player in players {
                if let Some(source) = source_actor {
                    if source != player && !config.pvp.allows_area_damage() {
                        continue;
                    }
                }
                for &buff in &spec.buff_ids {
                    self.queues.push(BuffEvent {
                        target: Target::Actor(player),
                        change: BuffChange::Apply(buff),
                    });
                }
            }
        }

        if hit_mobs {
            for mob in mobs {
                for &buff in &spec.buff_ids {
                    self.queues.push(BuffEvent {
                        target: Target::Mob(mob),
                        change: BuffChange::Apply(buff),
                    });
                }
                if let Some(source) = source_actor {
                    self.provoke_mob(mob, source, here);
                }
            }
        }
        true
    }

    /// Make a blasted mob go after whoever threw the grenade.
    fn provoke_mob(&mut self, mob: MobId, source: ActorId, here: RoomId) {
        let Ok(source_room) = self.state.actor(source).map(|a| a.character.room) else {
            return;
        };
        let shorthand = format!("@{source}");
        let exit = self
            .state
            .rooms
            .get(&here)
            .and_then(|r| r.exit_toward(source_room))
            .map(|(name, _)| name.to_string());
        let Ok(brute) = self.state.mob_mut(mob) else {
            return;
        };
        brute.character.track_player_damage(source, 0);
        if brute.character.aggro.is_some() {
            return;
        }

        if brute.character.room == source_room {
            brute.prevent_idle = true;
            brute.character.aggro = Some(Target::Actor(source));
            self.queues
                .push(InputEvent::mob(mob, format!("attack {shorthand}"), 0));
        } else if let Some(exit) = exit {
            brute.prevent_idle = true;
            brute.character.aggro = Some(Target::Actor(source));
            self.queues.push(InputEvent::mob(mob, format!("go {exit}"), 0));
            self.queues
                .push(InputEvent::mob(mob, format!("attack {shorthand}"), 0));
        }
    }
}
