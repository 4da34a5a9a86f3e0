use keystone_core::GraphError;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    dependencies: Vec<usize>,
}

/// Validated, acyclic agent dependency graph.
///
/// Agents are grouped into waves: wave 0 holds agents without dependencies,
/// and every agent sits in the wave after its deepest dependency. Within a
/// wave, agents keep their declaration order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    waves: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Build the graph from `(agent, dependencies)` declarations.
    ///
    /// Fails on duplicate agent names, dependencies on unknown agents, and
    /// cycles (including self-dependencies).
    pub fn new<I, N, D>(declarations: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (N, Vec<D>)>,
        N: Into<String>,
        D: Into<String>,
    {
        let declarations: Vec<(String, Vec<String>)> = declarations
            .into_iter()
            .map(|(name, deps)| (name.into(), deps.into_iter().map(Into::into).collect()))
            .collect();

        let mut index = HashMap::with_capacity(declarations.len());
        for (i, (name, _)) in declarations.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(GraphError::DuplicateAgent(name.clone()));
            }
        }

        let mut nodes = Vec::with_capacity(declarations.len());
        for (name, deps) in declarations {
            let mut resolved: Vec<usize> = Vec::with_capacity(deps.len());
            for dep in deps {
                let Some(&idx) = index.get(&dep) else {
                    return Err(GraphError::UnknownDependency {
                        agent: name,
                        dependency: dep,
                    });
                };
                if !resolved.contains(&idx) {
                    resolved.push(idx);
                }
            }
            nodes.push(Node {
                name,
                dependencies: resolved,
            });
        }

        let mut graph = Self {
            nodes,
            index,
            waves: Vec::new(),
        };
        graph.check_acyclic()?;
        graph.waves = graph.layout_waves();
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut marks: Vec<Option<Mark>> = vec![None; self.nodes.len()];
        let mut stack = Vec::new();
        for start in 0..self.nodes.len() {
            if let Some(cycle) = self.dfs_cycle(start, &mut marks, &mut stack) {
                let path = cycle
                    .into_iter()
                    .map(|i| self.nodes[i].name.clone())
                    .collect();
                return Err(GraphError::Cycle { path });
            }
        }
        Ok(())
    }

    fn dfs_cycle(
        &self,
        id: usize,
        marks: &mut [Option<Mark>],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        match marks[id] {
            // back edge: the cycle is the stack suffix starting at `id`
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|&n| n == id).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(id);
                return Some(cycle);
            }
            Some(Mark::Done) => return None,
            None => {}
        }
        marks[id] = Some(Mark::InProgress);
        stack.push(id);
        for &dep in &self.nodes[id].dependencies {
            if let Some(cycle) = self.dfs_cycle(dep, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks[id] = Some(Mark::Done);
        None
    }

    /// Longest-path layering. Only called on an acyclic graph.
    fn layout_waves(&self) -> Vec<Vec<usize>> {
        let mut level: Vec<Option<usize>> = vec![None; self.nodes.len()];
        for id in 0..self.nodes.len() {
            self.level_of(id, &mut level);
        }
        let depth = level.iter().flatten().max().map_or(0, |m| m + 1);
        let mut waves = vec![Vec::new(); depth];
        for (id, l) in level.into_iter().enumerate() {
            if let Some(l) = l {
                waves[l].push(id);
            }
        }
        waves
    }

    fn level_of(&self, id: usize, level: &mut [Option<usize>]) -> usize {
        if let Some(l) = level[id] {
            return l;
        }
        let l = self.nodes[id]
            .dependencies
            .iter()
            .map(|&dep| self.level_of(dep, level) + 1)
            .max()
            .unwrap_or(0);
        level[id] = Some(l);
        l
    }

    /// Agent names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no agents.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `name` is a node of the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Direct dependencies of `name`, in declaration order.
    pub fn dependencies(&self, name: &str) -> Option<Vec<&str>> {
        let &idx = self.index.get(name)?;
        Some(
            self.nodes[idx]
                .dependencies
                .iter()
                .map(|&d| self.nodes[d].name.as_str())
                .collect(),
        )
    }

    /// Execution waves, earliest first.
    pub fn waves(&self) -> Vec<Vec<&str>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|&i| self.nodes[i].name.as_str()).collect())
            .collect()
    }

    /// Index of the wave `name` runs in.
    pub fn wave_of(&self, name: &str) -> Option<usize> {
        let &idx = self.index.get(name)?;
        self.waves.iter().position(|wave| wave.contains(&idx))
    }
}
