//! Unit-test scaffolding: a core over the shared fixture world, wired to
//! recording collaborators.

use std::sync::{Arc, Mutex};

use turnstile_core::error::CommandError;
use turnstile_core::event::Target;
use turnstile_core::id::{ActorId, MobId};
use turnstile_test_utils::fixtures::{sample_state, KNOWN_COMMANDS};
use turnstile_test_utils::{
    MemoryPersistence, NetworkLog, PersistLog, RecordingNetwork, RecordingScripts, ScriptLog,
};

use crate::hooks::{CommandHandler, TurnContext};
use crate::world_core::{Collaborators, WorldCore};

type Lines = Arc<Mutex<Vec<(Target, String)>>>;

/// Recognizes the fixture command words and records every offered line.
struct EchoCommands {
    lines: Lines,
}

impl EchoCommands {
    fn offer(&self, source: Target, command: &str, rest: &str) -> bool {
        let line = if rest.is_empty() {
            command.to_string()
        } else {
            format!("{command} {rest}")
        };
        self.lines.lock().unwrap().push((source, line));
        KNOWN_COMMANDS.contains(&command)
    }
}

impl CommandHandler for EchoCommands {
    fn actor_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        actor: ActorId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        Ok(self.offer(Target::Actor(actor), command, rest))
    }

    fn mob_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        mob: MobId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        Ok(self.offer(Target::Mob(mob), command, rest))
    }
}

pub(crate) struct TestCore {
    pub core: WorldCore,
    pub net: NetworkLog,
    pub saved: PersistLog,
    pub scripts: ScriptLog,
    lines: Lines,
}

impl TestCore {
    /// Command lines offered by `source`, in dispatch order.
    pub fn lines(&self, source: Target) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, l)| l.clone())
            .collect()
    }
}

pub(crate) fn test_core_with(network: RecordingNetwork, scripts: RecordingScripts) -> TestCore {
    let persistence = MemoryPersistence::new();
    let lines = Lines::default();
    let (net, saved, script_log) = (network.log(), persistence.log(), scripts.log());
    let commands = EchoCommands {
        lines: Arc::clone(&lines),
    };
    TestCore {
        core: WorldCore::new(
            sample_state(),
            Collaborators::new(persistence, scripts, network, commands),
        ),
        net,
        saved,
        scripts: script_log,
        lines,
    }
}

pub(crate) fn test_core() -> TestCore {
    test_core_with(RecordingNetwork::new(), RecordingScripts::new())
}
