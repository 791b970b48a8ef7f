//! Input queue drain and command dispatch.
//!
//! Each actor gets at most one throttled command per turn. Inputs with a
//! negative wait are system-injected chains (login commands, prompts) and
//! bypass the throttle entirely. Mob input is never throttled.

use std::collections::HashSet;

use tracing::{debug, error, trace, warn};

use turnstile_core::event::{InputEvent, Target};
use turnstile_core::id::{ActorId, MobId};

use crate::config::GameConfig;
use crate::metrics::TurnMetrics;
use crate::world_core::{turn_context, WorldCore};

/// Split a line at the first space into a lower-cased command word and
/// the untouched remainder.
pub fn split_command(line: &str) -> (String, &str) {
    match line.split_once(' ') {
        Some((command, rest)) => (command.to_lowercase(), rest),
        None => (line.to_lowercase(), ""),
    }
}

/// Insert a space after a leading `` ` `` or `.` so `.hello` reads as `. hello`.
pub fn expand_shortcut(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(c @ ('`' | '.')) if line.len() > 1 => format!("{c} {}", chars.as_str()),
        _ => line.to_string(),
    }
}

impl WorldCore {
    /// Drain one generation of the input queue.
    pub(crate) fn drain_input(&mut self, m: &mut TurnMetrics, config: &GameConfig) {
        let mut granted: HashSet<ActorId> = HashSet::new();

        for mut input in self.queues.input.take_generation() {
            trace!(source = ?input.source, wait = input.wait_turns, text = %input.text, "input");
            let actor = match input.source {
                Target::Mob(mob) => {
                    if input.wait_turns <= 0 {
                        self.process_mob_input(mob, &input.text, config);
                        m.inputs_dispatched += 1;
                    } else {
                        input.wait_turns -= 1;
                        self.queues.input.requeue(input);
                        m.inputs_requeued += 1;
                    }
                    continue;
                }
                Target::Actor(actor) => actor,
            };

            if input.wait_turns < 0 {
                self.process_actor_input(actor, &input.text, config);
                m.inputs_dispatched += 1;
                continue;
            }

            if granted.contains(&actor) {
                self.queues.input.requeue(input);
                m.inputs_requeued += 1;
                continue;
            }

            if input.wait_turns == 0 {
                self.process_actor_input(actor, &input.text, config);
                granted.insert(actor);
                m.inputs_dispatched += 1;
            } else {
                input.wait_turns -= 1;
                self.queues.input.requeue(input);
                m.inputs_requeued += 1;
            }
        }
    }

    /// Interpret one line of actor input.
    fn process_actor_input(&mut self, actor: ActorId, text: &str, config: &GameConfig) {
        let turn = self.turn;
        let Ok(a) = self.state.actor_mut(actor) else {
            warn!(actor = %actor, "input for actor not online");
            return;
        };
        let connection = a.connection;

        let mut line = text.to_string();
        let mut clear_prompt = false;
        if let Some(prompt) = a.prompt.as_mut() {
            if prompt.questions.pop_front().is_some() {
                prompt.answers.push(line.trim().to_string());
                line = prompt.command_line();
            } else {
                clear_prompt = true;
            }
        }
        if clear_prompt {
            a.prompt = None;
        }

        let line = line.trim();
        let mut handled = false;
        let mut command = String::new();
        let mut rest = "";
        let expanded;

        if !line.is_empty() {
            a.last_input_turn = turn;

            if line.chars().count() == 2 {
                if let Some(commands) = a.macros.get(line).cloned() {
                    handled = true;
                    for (wait, part) in commands.split(';').enumerate() {
                        if part.is_empty() {
                            continue;
                        }
                        let wait = i32::try_from(wait).unwrap_or(i32::MAX);
                        self.queues.push(InputEvent::actor(actor, part, wait));
                    }
                }
            }

            if !handled {
                expanded = expand_shortcut(line);
                (command, rest) = split_command(&expanded);
                let mut ctx = turn_context!(self, config);
                handled = match self.commands.actor_command(&mut ctx, actor, &command, rest) {
                    Ok(handled) => handled,
                    Err(e) => {
                        error!(actor = %actor, command = %command, error = %e, "command failed");
                        false
                    }
                };
            }
        }

        if !handled && !command.is_empty() {
            debug!(actor = %actor, command = %command, "command not recognized");
            self.bad_input.track(&command, rest);
            self.queues.send_text(
                actor,
                format!("{command} not recognized. Type help for commands."),
            );
            self.queues
                .push(InputEvent::actor(actor, "emote @looks a little confused", 0));
        }

        // The command may have logged the actor out.
        if let Ok(a) = self.state.actor(actor) {
            let prompt = a.command_prompt();
            self.network.send_to(connection, prompt.as_bytes());
        }
    }

    /// Interpret one line of mob input.
    fn process_mob_input(&mut self, mob: MobId, text: &str, config: &GameConfig) {
        if !self.state.mobs.contains_key(&mob) {
            warn!(mob = %mob, "input for mob not live");
            return;
        }
        if text.is_empty() {
            return;
        }
        let (command, rest) = split_command(text);
        let mut ctx = turn_context!(self, config);
        let handled = match self.commands.mob_command(&mut ctx, mob, &command, rest) {
            Ok(handled) => handled,
            Err(e) => {
                error!(mob = %mob, command = %command, error = %e, "mob command failed");
                false
            }
        };
        if !handled && !command.is_empty() {
            self.queues.push(InputEvent::mob(
                mob,
                format!("emote looks a little confused ({command} {rest})."),
                0,
            ));
        }
    }
}
