// ABOUTME: Role and persona instruction text, the tool-usage guide, and the pool of agent names.
// ABOUTME: BuiltinPersonas is the default PersonaProvider; NamePool hands out each name at most once.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use aether_core::AgentRole;

const CEO_INSTRUCTIONS: &str = "You are the CEO of Aether Swarm and the only agent who talks with the client. \
    Your job is to deliver the product the client asks for. Ask the client for clarification when you need it \
    and keep them informed about progress. You cannot do the work yourself: hire a team and delegate.";

const PROJECT_MANAGER_INSTRUCTIONS: &str = "You are the Project Manager. You break large requests into small, \
    well-described work items, assign them to Coders and Testers, and track them until they are completed. \
    You do not write or test code yourself.";

const CODER_INSTRUCTIONS: &str = "You are a Coder. You write and modify code to satisfy the work items \
    assigned to you. When an item is done, complete it with a short note and hand testing work to a Tester.";

const TESTER_INSTRUCTIONS: &str = "You are a Tester. You verify the behavior of code written by the Coders \
    and report what you find. You do not modify the application's source code.";

/// The six thinking hats, in the order they are offered to the hire tool.
const HATS: [(&str, &str); 6] = [
    (
        "blue",
        "You keep the process on track. Set the agenda, decide who should work on what, \
         and drive the team toward the objective rather than producing content yourself.",
    ),
    (
        "white",
        "You are objective and data-driven. Work from facts and available information, \
         call out what is missing, and avoid opinion.",
    ),
    (
        "red",
        "You speak from intuition. Share gut reactions, likes and worries openly, \
         without needing to justify them.",
    ),
    (
        "black",
        "You are the careful critic. Look for risks, weaknesses and reasons a plan might fail, \
         and say so plainly.",
    ),
    (
        "yellow",
        "You are the optimist. Look for value and benefits, and explain why an idea can work.",
    ),
    (
        "green",
        "You are the creative one. Offer alternatives, new ideas and unusual approaches.",
    ),
];

/// Static reference text embedded in every agent's system instructions.
pub const TOOL_USAGE_GUIDE: &str = "Tools you may have, depending on your role:\n\
    - message: send a message to one agent by name and wait for the reply. You cannot message yourself.\n\
    - broadcast: send one message to every other agent; replies come back one per line as \"name: reply\".\n\
    - hire: hire a new agent with a role and a personality hat. You are told the new agent's name.\n\
    - createWorkItem: create a work item with a title and a description. The id is assigned for you.\n\
    - assignWorkItem: assign a work item id to an agent by name. The agent is notified.\n\
    - getWorkItemDetail: read the status, assignee and comments of a work item.\n\
    - completeWorkItem: mark a work item completed, optionally with a note.\n\n\
    Tool results that start with \"Error:\" mean the action did not happen. Read them and adjust.";

/// Source of the instruction text composed into a new agent's prompt.
pub trait PersonaProvider: Send + Sync {
    fn role_instructions(&self, role: AgentRole) -> String;

    /// Instruction text for a persona tag, or None if the tag is unknown.
    fn persona_instructions(&self, tag: &str) -> Option<String>;

    /// Every tag `persona_instructions` accepts.
    fn persona_tags(&self) -> Vec<String>;
}

/// Built-in roles and the six thinking-hat personas.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPersonas;

impl PersonaProvider for BuiltinPersonas {
    fn role_instructions(&self, role: AgentRole) -> String {
        match role {
            AgentRole::Ceo => CEO_INSTRUCTIONS,
            AgentRole::ProjectManager => PROJECT_MANAGER_INSTRUCTIONS,
            AgentRole::Coder => CODER_INSTRUCTIONS,
            AgentRole::Tester => TESTER_INSTRUCTIONS,
        }
        .to_string()
    }

    fn persona_instructions(&self, tag: &str) -> Option<String> {
        let tag = tag.trim();
        HATS.iter()
            .find(|(color, _)| color.eq_ignore_ascii_case(tag))
            .map(|(_, text)| text.to_string())
    }

    fn persona_tags(&self) -> Vec<String> {
        HATS.iter().map(|(color, _)| color.to_string()).collect()
    }
}

pub const DEFAULT_NAMES: [&str; 50] = [
    "Aaliyah", "Alejandro", "Ananya", "Bao", "Carlos", "Chen", "Chiamaka", "Chloe", "David",
    "Elena", "Fatima", "Freja", "Gabriel", "Hassan", "Ibrahim", "Isabella", "Jakub", "Jamal",
    "Javier", "Ji-hoon", "Katarina", "Kenji", "Lamar", "Lei", "Liam", "Lin", "Maria", "Mateo",
    "Mei", "Mohammed", "Nikolai", "Nkechi", "Noah", "Olga", "Omar", "Priya", "Quang", "Raj",
    "Ryu", "Samira", "Santiago", "Sofia", "Sven", "Tariq", "Tatiana", "Wei", "Yara", "Yuki",
    "Zane", "Zoe",
];

/// A finite supply of agent names. Each name is handed out at most once.
#[derive(Debug, Clone)]
pub struct NamePool {
    remaining: VecDeque<String>,
}

impl NamePool {
    /// A pool that hands out `names` in the given order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remaining: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The default names in a fresh random order.
    pub fn shuffled() -> Self {
        let mut names: Vec<&str> = DEFAULT_NAMES.to_vec();
        names.shuffle(&mut rand::thread_rng());
        Self::new(names)
    }

    /// Next unused name, or None once the pool is exhausted.
    pub fn next_name(&mut self) -> Option<String> {
        self.remaining.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_role_has_instructions() {
        for role in AgentRole::ALL {
            assert!(!BuiltinPersonas.role_instructions(role).is_empty());
        }
    }

    #[test]
    fn persona_lookup_is_case_insensitive() {
        assert!(BuiltinPersonas.persona_instructions("Blue").is_some());
        assert!(BuiltinPersonas.persona_instructions(" GREEN ").is_some());
        assert!(BuiltinPersonas.persona_instructions("purple").is_none());
        assert_eq!(BuiltinPersonas.persona_tags().len(), 6);
    }

    #[test]
    fn deterministic_pool_follows_given_order_then_runs_out() {
        let mut pool = NamePool::new(["Priya", "Kenji"]);
        assert_eq!(pool.next_name().as_deref(), Some("Priya"));
        assert_eq!(pool.next_name().as_deref(), Some("Kenji"));
        assert_eq!(pool.next_name(), None);
    }

    #[test]
    fn shuffled_pool_hands_out_each_default_name_once() {
        let mut pool = NamePool::shuffled();
        let mut seen = HashSet::new();
        while let Some(name) = pool.next_name() {
            assert!(seen.insert(name), "name handed out twice");
        }
        assert_eq!(seen.len(), DEFAULT_NAMES.len());
    }
}
