use std::collections::{BTreeMap, BTreeSet};

use super::source::Source;
use crate::error::ConfigError;

/// Checks the source graph induced by `source:<id>` inputs and overlays: every edge
/// must name a known source and the graph must be acyclic.
pub fn validate_source_dependencies(
    sources: &BTreeMap<String, Source>,
) -> Result<(), ConfigError> {
    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, source) in sources {
        let targets = edges.entry(id.as_str()).or_default();
        for referenced in source.referenced_sources() {
            if !sources.contains_key(referenced) {
                return Err(ConfigError::UnknownReference(format!(
                    "source {id} references unknown source {referenced}"
                )));
            }
            targets.push(referenced);
        }
    }

    let mut walk = CycleWalk {
        edges: &edges,
        done: BTreeSet::new(),
        stack: Vec::new(),
    };
    for id in edges.keys().copied() {
        walk.visit(id)?;
    }
    Ok(())
}

struct CycleWalk<'a> {
    edges: &'a BTreeMap<&'a str, Vec<&'a str>>,
    done: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
}

impl<'a> CycleWalk<'a> {
    fn visit(&mut self, id: &'a str) -> Result<(), ConfigError> {
        if let Some(start) = self.stack.iter().position(|entry| *entry == id) {
            let cycle = self.stack[start..]
                .iter()
                .chain(std::iter::once(&id))
                .copied()
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ConfigError::DependencyCycle(cycle));
        }
        if self.done.contains(id) {
            return Ok(());
        }

        let edges = self.edges;
        self.stack.push(id);
        if let Some(next) = edges.get(id) {
            for referenced in next.iter().copied() {
                self.visit(referenced)?;
            }
        }
        self.stack.pop();
        self.done.insert(id);
        Ok(())
    }
}
