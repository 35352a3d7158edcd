use super::assertions::Assertion;
use super::runner::ScenarioRunner;
use super::steps::{PropValue, ScenarioStep};
use super::workspace::TestStore;
use anyhow::Result;

/// Default workspace for scenarios that only need one
pub const WS: &str = "default";

/// Fluent builder for E2E test scenarios
pub struct Scenario {
    name: String,
    store: Option<TestStore>,
    steps: Vec<ScenarioStep>,
    pending: Option<ScenarioStep>,
}

impl Scenario {
    /// Create a new scenario with the default workspace initialized
    pub fn new(name: &str) -> Self {
        Self::bare(name).init_workspace(WS)
    }

    /// Create a new scenario with no workspace at all
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            store: None,
            steps: Vec::new(),
            pending: None,
        }
    }

    /// Run the scenario against a prepared store root
    pub fn with_store(mut self, store: TestStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Add a workspace
    pub fn init_workspace(mut self, name: &str) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::InitWorkspace {
            name: name.to_string(),
        });
        self
    }

    /// Start writing a node in the default workspace
    pub fn node(self, path: &str) -> Self {
        self.node_in(WS, path)
    }

    /// Start writing a node in a given workspace
    pub fn node_in(mut self, workspace: &str, path: &str) -> Self {
        self.flush();
        self.pending = Some(ScenarioStep::WriteNode {
            workspace: workspace.to_string(),
            path: path.to_string(),
            props: Vec::new(),
        });
        self
    }

    /// Add a string property to the node being written
    pub fn text(self, name: &str, value: &str) -> Self {
        self.prop(name, PropValue::Text(value.to_string()))
    }

    /// Add a strong reference to the node at `target`
    pub fn reference(self, name: &str, target: &str) -> Self {
        self.prop(name, PropValue::RefTo(target.to_string()))
    }

    /// Add a weak reference to the node at `target`
    pub fn weak_reference(self, name: &str, target: &str) -> Self {
        self.prop(name, PropValue::WeakRefTo(target.to_string()))
    }

    /// Add a multi-valued strong reference
    pub fn references(self, name: &str, targets: &[&str]) -> Self {
        self.prop(
            name,
            PropValue::RefsTo(targets.iter().map(|t| t.to_string()).collect()),
        )
    }

    fn prop(mut self, name: &str, value: PropValue) -> Self {
        match self.pending.as_mut() {
            Some(ScenarioStep::WriteNode { props, .. }) => props.push((name.to_string(), value)),
            _ => panic!("property '{}' added outside of a node() builder", name),
        }
        self
    }

    /// Remove a node in the default workspace
    pub fn remove(self, path: &str, recursive: bool) -> Self {
        self.remove_in(WS, path, recursive)
    }

    /// Remove a node in a given workspace
    pub fn remove_in(mut self, workspace: &str, path: &str, recursive: bool) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::RemoveNode {
            workspace: workspace.to_string(),
            path: path.to_string(),
            recursive,
        });
        self
    }

    /// Remove a workspace
    pub fn remove_workspace(mut self, name: &str) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::RemoveWorkspace {
            name: name.to_string(),
        });
        self
    }

    /// Reopen the store from disk
    pub fn reopen(mut self) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::Reopen);
        self
    }

    /// Delete the index directory
    pub fn wipe_indexes(mut self) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::WipeIndexes);
        self
    }

    /// Rebuild indexes from records
    pub fn rebuild(mut self) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::RebuildIndexes);
        self
    }

    /// Add an assertion
    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.flush();
        self.steps.push(ScenarioStep::Assert(assertion));
        self
    }

    fn flush(&mut self) {
        if let Some(step) = self.pending.take() {
            self.steps.push(step);
        }
    }

    /// Run the scenario, returning the store root for further inspection
    pub fn run(mut self) -> Result<TestStore> {
        self.flush();
        let store = match self.store {
            Some(store) => store,
            None => TestStore::empty()?,
        };
        let mut runner = ScenarioRunner::new(&self.name, store)?;
        for (i, step) in self.steps.iter().enumerate() {
            runner.execute(i, step)?;
        }
        Ok(runner.into_store())
    }
}
