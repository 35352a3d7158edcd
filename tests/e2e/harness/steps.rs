use super::assertions::Assertion;

/// A property value in a scenario step
#[derive(Debug, Clone)]
pub enum PropValue {
    /// Plain string property
    Text(String),
    /// Strong reference to the node at a path in the same workspace
    RefTo(String),
    /// Weak reference to the node at a path in the same workspace
    WeakRefTo(String),
    /// Multi-valued strong reference to several paths
    RefsTo(Vec<String>),
}

/// All possible actions in a test scenario
#[derive(Debug)]
pub enum ScenarioStep {
    /// Create a workspace
    InitWorkspace { name: String },
    /// Write (create or replace) a node
    WriteNode {
        workspace: String,
        path: String,
        props: Vec<(String, PropValue)>,
    },
    /// Remove a node
    RemoveNode {
        workspace: String,
        path: String,
        recursive: bool,
    },
    /// Remove a whole workspace
    RemoveWorkspace { name: String },
    /// Drop the store handle and open the root again
    Reopen,
    /// Delete the index directory behind the store's back
    WipeIndexes,
    /// Rebuild indexes from records
    RebuildIndexes,
    /// Check an assertion at this point
    Assert(Assertion),
}
