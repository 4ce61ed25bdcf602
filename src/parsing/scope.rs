//! Names of the processes and workflows a body of code can invoke.

use std::collections::BTreeMap;

use crate::language::{Include, ProcessBlock};

/// Where a name visible in scope was introduced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    Process,     // defined in this file
    Subworkflow, // named workflow defined in this file
    Include,     // brought in from another file, possibly aliased
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRegistry {
    names: BTreeMap<String, Origin>,
}

impl ScopeRegistry {
    pub fn new() -> ScopeRegistry {
        ScopeRegistry {
            names: BTreeMap::new(),
        }
    }

    /// Gather everything a file's workflows can call: its processes, its
    /// subworkflows, and the names its includes make visible.
    pub fn build(processes: &[ProcessBlock], subworkflows: &[&str], includes: &[Include]) -> ScopeRegistry {
        let mut registry = ScopeRegistry::new();

        for process in processes {
            registry.insert(process.name, Origin::Process);
        }
        for name in subworkflows {
            registry.insert(name, Origin::Subworkflow);
        }
        for include in includes {
            for import in &include.imports {
                registry.insert(import.visible(), Origin::Include);
            }
        }

        registry
    }

    /// Register a name. A name already present keeps its first origin.
    pub fn insert(&mut self, name: &str, origin: Origin) {
        self.names
            .entry(name.to_string())
            .or_insert(origin);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .contains_key(name)
    }

    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.names
            .get(name)
            .copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names
            .keys()
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.names
            .is_empty()
    }
}
