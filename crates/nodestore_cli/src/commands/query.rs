//! Index lookup commands.

use super::{explain, Context};
use anyhow::{bail, Result};
use console::style;

/// Resolve a jcr:uuid to its node.
pub fn uuid(ctx: &Context, uuid: &str) -> Result<()> {
    let store = ctx.open()?;
    let Some(location) = store
        .index()
        .node_location_for_uuid(uuid, false)
        .map_err(explain)?
    else {
        bail!("No node indexed for {}", uuid);
    };

    let node = store
        .read_node(&location.workspace, &location.path)
        .map_err(explain)?;
    println!("{}", style(&location).bold());
    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}

/// List the nodes referencing the node at `path`.
pub fn referrers(ctx: &Context, path: &str, weak: bool) -> Result<()> {
    let store = ctx.open()?;
    let referrers = store
        .read_node_referrers(ctx.workspace(), path, weak)
        .map_err(explain)?;

    let kind = if weak { "weak" } else { "strong" };
    if referrers.is_empty() {
        println!("No {} referrers for {}:{}", kind, ctx.workspace(), path);
        return Ok(());
    }

    println!(
        "{} {} referrer(s):",
        style(referrers.len()).cyan(),
        kind
    );
    for location in referrers {
        println!("  {}", location);
    }
    Ok(())
}
