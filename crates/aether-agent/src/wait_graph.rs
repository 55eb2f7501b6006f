// ABOUTME: Swarm-wide record of which agent loops are blocked waiting on which other agents.
// ABOUTME: A wait that would close a cycle is refused, so serialized agents never block each other forever.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

type Edges = HashMap<String, Vec<String>>;

/// Directed "waits for" edges between agents. An edge `a -> b` exists while
/// a tool in `a`'s running loop is waiting for `b` to answer. Edges from
/// concurrent broadcast branches and background deliveries all land here,
/// so a cycle is visible even when no single call chain contains it.
#[derive(Debug, Default)]
pub struct WaitGraph {
    edges: Mutex<Edges>,
}

impl WaitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Edges> {
        self.edges.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record that `waiter` is about to wait for `target`. Returns `None`
    /// if `target` already waits, directly or through others, on any agent
    /// in `chain`; those agents all hold their turn and are waiting on
    /// `waiter`, so the wait could never end. The edge lives as long as the
    /// returned guard.
    pub fn try_wait(
        self: &Arc<Self>,
        waiter: &str,
        target: &str,
        chain: &[String],
    ) -> Option<WaitEdge> {
        let mut edges = self.lock();
        if reaches(&edges, target, chain) {
            return None;
        }
        edges
            .entry(waiter.to_string())
            .or_default()
            .push(target.to_string());
        Some(WaitEdge {
            graph: Arc::clone(self),
            waiter: waiter.to_string(),
            target: target.to_string(),
        })
    }

    /// Agents `waiter` is currently waiting for.
    pub fn waiting_on(&self, waiter: &str) -> Vec<String> {
        self.lock().get(waiter).cloned().unwrap_or_default()
    }

    fn release(&self, waiter: &str, target: &str) {
        let mut edges = self.lock();
        if let Some(targets) = edges.get_mut(waiter) {
            if let Some(i) = targets.iter().position(|t| t == target) {
                targets.swap_remove(i);
            }
            if targets.is_empty() {
                edges.remove(waiter);
            }
        }
    }
}

fn reaches(edges: &Edges, start: &str, chain: &[String]) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if chain.iter().any(|n| n == node) {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(node) {
            stack.extend(next.iter().map(String::as_str));
        }
    }
    false
}

/// A recorded wait. Dropping it removes the edge.
#[derive(Debug)]
pub struct WaitEdge {
    graph: Arc<WaitGraph>,
    waiter: String,
    target: String,
}

impl Drop for WaitEdge {
    fn drop(&mut self) {
        self.graph.release(&self.waiter, &self.target);
    }
}
