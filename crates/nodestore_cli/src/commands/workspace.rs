//! Workspace lifecycle commands.

use super::{explain, Context};
use anyhow::Result;
use console::style;

/// Create a workspace holding only a root node.
pub fn init(ctx: &Context, name: &str) -> Result<()> {
    let _lock = ctx.lock()?;
    let store = ctx.open()?;
    let uuid = store.workspace_init(name).map_err(explain)?;

    println!("{} Initialized workspace {}", style("✓").green(), style(name).bold());
    println!("  Root node: {}", uuid);
    Ok(())
}

/// Print every workspace, marking the selected one.
pub fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open()?;
    let workspaces = store.workspace_list().map_err(explain)?;

    if workspaces.is_empty() {
        println!("No workspaces. Create one with 'nodestore workspace init <name>'.");
        return Ok(());
    }

    for name in workspaces {
        if name == ctx.workspace() {
            println!("* {}", style(name).green());
        } else {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// Remove a workspace and deindex all of its nodes.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    let _lock = ctx.lock()?;
    let store = ctx.open()?;
    store.workspace_remove(name).map_err(explain)?;

    println!("{} Removed workspace {}", style("✓").green(), style(name).bold());
    Ok(())
}
