//! Workflow graph construction and ordering.
//!
//! A descriptor's orchestration pattern is lowered into one explicit
//! dependency graph, whatever the pattern name: pipelines chain agents by
//! position, hub-and-spoke fans out from the hub, hierarchical workflows
//! take their edges straight from the declared interfaces. Execution
//! order always comes from a Kahn topological sort, so a cycle is caught
//! before any agent runs.

use agentloom_core::{AgentConfig, WorkflowError};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// The recognized orchestration patterns after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Pipeline,
    HubAndSpoke,
    Hierarchical,
}

impl Pattern {
    /// Normalize a descriptor pattern name.
    ///
    /// Event-driven descriptors execute as pipelines and collaborative
    /// ones as hierarchies; those labels describe intent the runtime does
    /// not distinguish further. Anything else is a descriptor error.
    pub fn parse(name: &str) -> Result<Self, WorkflowError> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pipeline" | "sequential" | "eventdriven" => Ok(Pattern::Pipeline),
            "hubandspoke" | "hubspoke" => Ok(Pattern::HubAndSpoke),
            "hierarchical" | "collaborative" => Ok(Pattern::Hierarchical),
            _ => Err(WorkflowError::Descriptor(format!(
                "unknown orchestration pattern '{name}'"
            ))),
        }
    }
}

/// An explicit dependency graph over agent ids.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    /// Agent id -> ids it depends on, deterministic order.
    parents: BTreeMap<String, BTreeSet<String>>,
}

impl WorkflowGraph {
    /// Lower a pattern plus declared connections into a graph.
    pub fn build(
        pattern: Pattern,
        agents: &[AgentConfig],
        connections: &[(String, String)],
    ) -> Result<Self, WorkflowError> {
        if agents.is_empty() {
            return Err(WorkflowError::Descriptor("no agents to orchestrate".into()));
        }

        let mut parents: BTreeMap<String, BTreeSet<String>> = agents
            .iter()
            .map(|a| (a.agent_id.clone(), BTreeSet::new()))
            .collect();

        match pattern {
            Pattern::Pipeline => {
                // Chain strictly by declared position
                let mut ordered: Vec<&AgentConfig> = agents.iter().collect();
                ordered.sort_by_key(|a| (a.position, a.agent_id.clone()));
                for pair in ordered.windows(2) {
                    if let Some(deps) = parents.get_mut(&pair[1].agent_id) {
                        deps.insert(pair[0].agent_id.clone());
                    }
                }
            }
            Pattern::HubAndSpoke => {
                let hub = pick_hub(agents, connections);
                for agent in agents {
                    if agent.agent_id != hub {
                        if let Some(deps) = parents.get_mut(&agent.agent_id) {
                            deps.insert(hub.clone());
                        }
                    }
                }
            }
            Pattern::Hierarchical => {
                // Edges come from the declared interfaces plus connections
                for agent in agents {
                    for dep in &agent.dependencies {
                        if let Some(deps) = parents.get_mut(&agent.agent_id) {
                            deps.insert(dep.clone());
                        }
                    }
                    for out in &agent.outputs_to {
                        if let Some(deps) = parents.get_mut(out) {
                            deps.insert(agent.agent_id.clone());
                        }
                    }
                }
                for (from, to) in connections {
                    if let Some(deps) = parents.get_mut(to) {
                        deps.insert(from.clone());
                    }
                }
            }
        }

        let graph = Self { parents };
        // A cycle is a build-time error regardless of pattern
        graph.topo_order()?;
        Ok(graph)
    }

    /// Kahn topological sort; deterministic (lexicographic among ready
    /// nodes). Errors on a cycle, naming the agents stuck in it.
    pub fn topo_order(&self) -> Result<Vec<String>, WorkflowError> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .parents
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (id, deps) in &self.parents {
            for dep in deps {
                children.entry(dep.as_str()).or_default().push(id.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.parents.len());

        while let Some(&id) = ready.iter().next() {
            ready.remove(id);
            order.push(id.to_string());
            for &child in children.get(id).into_iter().flatten() {
                let degree = in_degree.get_mut(child).filter(|d| **d > 0);
                if let Some(degree) = degree {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(child);
                    }
                }
            }
        }

        if order.len() != self.parents.len() {
            let stuck: Vec<String> = self
                .parents
                .keys()
                .filter(|id| !order.contains(id))
                .cloned()
                .collect();
            return Err(WorkflowError::DependencyCycle(stuck.join(", ")));
        }
        Ok(order)
    }

    /// The agents `agent_id` waits on.
    pub fn dependencies_of(&self, agent_id: &str) -> Vec<&str> {
        self.parents
            .get(agent_id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Agents whose dependencies are all in `done` and that are not in
    /// `done` or `running` themselves.
    pub fn ready_agents(&self, done: &HashSet<String>, running: &HashSet<String>) -> Vec<String> {
        self.parents
            .iter()
            .filter(|(id, deps)| {
                !done.contains(*id)
                    && !running.contains(*id)
                    && deps.iter().all(|d| done.contains(d))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// The hub is the agent with the most outgoing connections; ties and the
/// no-connections case fall back to declared outputs, then to position.
fn pick_hub(agents: &[AgentConfig], connections: &[(String, String)]) -> String {
    let mut outgoing: HashMap<&str, usize> = HashMap::new();
    for (from, _) in connections {
        *outgoing.entry(from.as_str()).or_default() += 1;
    }

    let mut best: Option<(&AgentConfig, usize)> = None;
    for agent in agents {
        let score = outgoing
            .get(agent.agent_id.as_str())
            .copied()
            .unwrap_or_else(|| agent.outputs_to.len());
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score
                    || (score == current_score
                        && (agent.position, &agent.agent_id)
                            < (current.position, &current.agent_id))
            }
        };
        if better {
            best = Some((agent, score));
        }
    }
    best.map(|(a, _)| a.agent_id.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, position: u32) -> AgentConfig {
        let mut c = AgentConfig::standalone(id, "role");
        c.position = position;
        c
    }

    fn agent_with_deps(id: &str, position: u32, deps: &[&str]) -> AgentConfig {
        let mut c = agent(id, position);
        c.dependencies = deps.iter().map(|d| d.to_string()).collect();
        c
    }

    #[test]
    fn pattern_parsing_normalizes() {
        assert_eq!(Pattern::parse("Pipeline").unwrap(), Pattern::Pipeline);
        assert_eq!(Pattern::parse("hub_and_spoke").unwrap(), Pattern::HubAndSpoke);
        assert_eq!(Pattern::parse("Hub-and-Spoke").unwrap(), Pattern::HubAndSpoke);
        assert_eq!(Pattern::parse("sequential").unwrap(), Pattern::Pipeline);
        assert_eq!(Pattern::parse("event_driven").unwrap(), Pattern::Pipeline);
        assert_eq!(Pattern::parse("collaborative").unwrap(), Pattern::Hierarchical);
        assert!(Pattern::parse("quantum").is_err());
    }

    #[test]
    fn pipeline_chains_by_position() {
        let agents = vec![agent("c", 3), agent("a", 1), agent("b", 2)];
        let graph = WorkflowGraph::build(Pattern::Pipeline, &agents, &[]).unwrap();
        assert_eq!(graph.topo_order().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(graph.dependencies_of("b"), vec!["a"]);
        assert_eq!(graph.dependencies_of("c"), vec!["b"]);
    }

    #[test]
    fn hub_and_spoke_fans_out_from_hub() {
        let agents = vec![agent("hub", 1), agent("s1", 2), agent("s2", 3)];
        let connections = vec![
            ("hub".to_string(), "s1".to_string()),
            ("hub".to_string(), "s2".to_string()),
        ];
        let graph = WorkflowGraph::build(Pattern::HubAndSpoke, &agents, &connections).unwrap();
        let order = graph.topo_order().unwrap();
        assert_eq!(order[0], "hub");
        assert_eq!(graph.dependencies_of("s1"), vec!["hub"]);
        assert_eq!(graph.dependencies_of("s2"), vec!["hub"]);
    }

    #[test]
    fn hierarchical_uses_declared_interfaces() {
        let agents = vec![
            agent_with_deps("root", 1, &[]),
            agent_with_deps("left", 2, &["root"]),
            agent_with_deps("right", 3, &["root"]),
            agent_with_deps("sink", 4, &["left", "right"]),
        ];
        let graph = WorkflowGraph::build(Pattern::Hierarchical, &agents, &[]).unwrap();
        let order = graph.topo_order().unwrap();
        assert_eq!(order.first().map(String::as_str), Some("root"));
        assert_eq!(order.last().map(String::as_str), Some("sink"));

        // left and right are both ready once root is done
        let done: HashSet<String> = ["root".to_string()].into();
        let ready = graph.ready_agents(&done, &HashSet::new());
        assert_eq!(ready, vec!["left", "right"]);
    }

    #[test]
    fn cycle_is_rejected_at_build() {
        let agents = vec![
            agent_with_deps("a", 1, &["b"]),
            agent_with_deps("b", 2, &["a"]),
        ];
        let err = WorkflowGraph::build(Pattern::Hierarchical, &agents, &[]).unwrap_err();
        assert!(matches!(err, WorkflowError::DependencyCycle(_)));
        assert!(err.to_string().contains("a"));
    }

    #[test]
    fn connections_add_hierarchical_edges() {
        let agents = vec![agent("x", 1), agent("y", 2)];
        let connections = vec![("x".to_string(), "y".to_string())];
        let graph = WorkflowGraph::build(Pattern::Hierarchical, &agents, &connections).unwrap();
        assert_eq!(graph.dependencies_of("y"), vec!["x"]);
    }

    #[test]
    fn empty_roster_is_an_error() {
        assert!(WorkflowGraph::build(Pattern::Pipeline, &[], &[]).is_err());
    }
}
