//! Quest queue drain: token grants, revocations and completion rewards.

use tracing::{debug, trace, warn};

use turnstile_core::catalog::{QuestRewards, QuestSpec};
use turnstile_core::event::{BuffChange, BuffEvent, QuestEvent, Target};
use turnstile_core::id::{ActorId, RoomId};
use turnstile_core::quest::TokenRequest;

use crate::metrics::TurnMetrics;
use crate::world_core::WorldCore;

const FINAL_STEP: &str = "end";
const FIRST_STEP: &str = "start";

/// What a quest event did to the actor's log.
enum QuestChange {
    Granted,
    Revoked,
    Unchanged,
}

impl WorldCore {
    /// Drain one generation of the quest queue.
    pub(crate) fn drain_quests(&mut self, m: &mut TurnMetrics) {
        for event in self.queues.quest.take_generation() {
            trace!(actor = %event.actor, token = %event.token, "quest event");
            match self.apply_quest_event(&event) {
                QuestChange::Granted => m.quests_granted += 1,
                QuestChange::Revoked => m.quests_revoked += 1,
                QuestChange::Unchanged => m.events_dropped += 1,
            }
        }
    }

    fn apply_quest_event(&mut self, event: &QuestEvent) -> QuestChange {
        let Some(request) = TokenRequest::parse(&event.token) else {
            warn!(actor = %event.actor, token = %event.token, "malformed quest token");
            return QuestChange::Unchanged;
        };
        let token = request.token();
        let Some(spec) = self.state.catalog.quest(token.quest).cloned() else {
            debug!(quest = %token.quest, "quest event for unknown quest");
            return QuestChange::Unchanged;
        };
        let Ok(actor) = self.state.actor_mut(event.actor) else {
            debug!(actor = %event.actor, "quest event for missing actor");
            return QuestChange::Unchanged;
        };

        let token = match request {
            TokenRequest::Revoke(token) => {
                return if actor.character.quests.clear(token.quest) {
                    QuestChange::Revoked
                } else {
                    QuestChange::Unchanged
                };
            }
            TokenRequest::Grant(token) => token,
        };
        if !actor.character.quests.give(&spec, &token) {
            return QuestChange::Unchanged;
        }

        let name = &spec.name;
        let (log, text) = match token.step.as_str() {
            FIRST_STEP => (
                format!("Given a new quest: {name}"),
                format!("You have been given a new quest: {name}!"),
            ),
            FINAL_STEP => (
                format!("Completed a quest: {name}"),
                format!("You have completed the quest: {name}!"),
            ),
            _ => (
                format!("Made progress on a quest: {name}"),
                format!("You've made progress on the quest: {name}!"),
            ),
        };
        if !spec.secret {
            actor.log_event("quest", log);
            self.queues.send_text(event.actor, text);
        }
        if token.step == FINAL_STEP {
            self.grant_rewards(event.actor, &spec);
        }
        QuestChange::Granted
    }

    fn grant_rewards(&mut self, id: ActorId, spec: &QuestSpec) {
        let QuestRewards {
            player_message,
            room_message,
            quest_token,
            gold,
            item,
            buff,
            experience,
            skill,
            room,
        } = &spec.rewards;

        let Ok(here) = self.state.actor(id).map(|a| a.character.room) else {
            return;
        };

        if let Some(text) = player_message {
            self.queues.send_text(id, text.clone());
        }
        if let Some(text) = room_message {
            self.queues.room_text(here, text.clone(), &[id]);
        }
        if let Some(token) = quest_token {
            self.queues.push(QuestEvent {
                actor: id,
                token: token.clone(),
            });
        }

        if *gold > 0 {
            if let Ok(actor) = self.state.actor_mut(id) {
                actor.character.gold = actor.character.gold.saturating_add(*gold);
                self.queues.send_text(id, format!("You receive {gold} gold!"));
            }
        }

        if let Some(item_id) = *item {
            match self.state.catalog.item(item_id).cloned() {
                Some(item_spec) => {
                    let item = self.state.new_item(item_id);
                    if let Ok(actor) = self.state.actor_mut(id) {
                        actor.character.store_item(item);
                        self.queues
                            .send_text(id, format!("You receive {}!", item_spec.name));
                    }
                    if let Some(token) = item_spec.quest_token {
                        self.queues.push(QuestEvent { actor: id, token });
                    }
                }
                None => warn!(quest = %spec.id, item = %item_id, "reward item not in catalog"),
            }
        }

        if let Some(buff) = *buff {
            self.queues.push(BuffEvent {
                target: Target::Actor(id),
                change: BuffChange::Apply(buff),
            });
        }

        if *experience > 0 {
            if let Ok(actor) = self.state.actor_mut(id) {
                actor.character.grant_xp(*experience);
                self.queues.send_text(
                    id,
                    format!("You gain {experience} experience points (quest progress)."),
                );
            }
        }

        if let Some(skill) = skill {
            if let Ok(actor) = self.state.actor_mut(id) {
                if actor.character.skill_level(&skill.name) < skill.level {
                    let now = actor.character.train_skill(&skill.name, skill.level);
                    self.queues.send_text(
                        id,
                        format!("Your {} skill is now level {now}!", skill.name),
                    );
                }
            }
        }

        if let Some(to) = *room {
            self.move_by_quest(id, here, to);
        }
    }

    fn move_by_quest(&mut self, id: ActorId, from: RoomId, to: RoomId) {
        let Ok(name) = self.state.actor(id).map(|a| a.character.name.clone()) else {
            return;
        };
        if let Err(e) = self.state.move_actor(id, to) {
            warn!(actor = %id, room = %to, error = %e, "quest reward room unavailable");
            return;
        }
        self.queues.send_text(id, "You are suddenly moved to a new place!");
        self.queues.room_text(
            from,
            format!("{name} is suddenly moved to a new place!"),
            &[id],
        );
    }
}
