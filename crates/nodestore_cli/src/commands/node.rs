//! Node read/write commands.

use super::{explain, Context};
use anyhow::{bail, Context as _, Result};
use console::style;
use nodestore_core::{Node, PropertyType};
use serde_json::Value;

/// Create or replace the node at `path` from `name=value[:Type]` properties.
pub fn put(ctx: &Context, path: &str, props: &[String]) -> Result<()> {
    let mut node = Node::new();
    for prop in props {
        let (name, value, ty) = parse_prop(prop)?;
        match (node.properties.get_mut(&name), node.types.get(&name)) {
            // Repeating a property makes it multi-valued
            (Some(existing), Some(existing_ty)) if *existing_ty == ty => {
                if let Value::Array(values) = existing {
                    values.push(value);
                } else {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
            (Some(_), _) => bail!("property {} given twice with different types", name),
            (None, _) => node.set_property(name, value, ty),
        }
    }

    let _lock = ctx.lock()?;
    let store = ctx.open()?;
    let uuid = store
        .write_node(ctx.workspace(), path, node)
        .map_err(explain)
        .with_context(|| format!("Failed to write {}:{}", ctx.workspace(), path))?;

    println!("{} {}:{}", style("✓").green(), ctx.workspace(), path);
    println!("  jcr:uuid: {}", uuid);
    Ok(())
}

/// Print the node at `path` as JSON, properties with their types.
pub fn get(ctx: &Context, path: &str) -> Result<()> {
    let store = ctx.open()?;
    let node = store.read_node(ctx.workspace(), path).map_err(explain)?;
    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}

/// List the children of the node at `path`.
pub fn ls(ctx: &Context, path: &str) -> Result<()> {
    let store = ctx.open()?;
    if !store.node_exists(ctx.workspace(), path).map_err(explain)? {
        bail!("No node at {}:{}", ctx.workspace(), path);
    }

    let listing = store.ls(ctx.workspace(), path).map_err(explain)?;
    for dir in &listing.dirs {
        println!("{}/", style(dir).cyan());
    }
    Ok(())
}

/// Remove the node at `path`.
pub fn rm(ctx: &Context, path: &str, recursive: bool) -> Result<()> {
    let _lock = ctx.lock()?;
    let store = ctx.open()?;
    store
        .remove(ctx.workspace(), path, recursive)
        .map_err(explain)?;

    println!("{} Removed {}:{}", style("✓").green(), ctx.workspace(), path);
    Ok(())
}

/// Parses `name=value` or `name=value:Type`.
///
/// The suffix only counts as a type when it names a known tag, so values
/// such as `nt:unstructured` stay intact.
fn parse_prop(raw: &str) -> Result<(String, Value, PropertyType)> {
    let Some((name, rest)) = raw.split_once('=') else {
        bail!("expected name=value[:Type], got '{}'", raw);
    };
    if name.is_empty() {
        bail!("property name missing in '{}'", raw);
    }

    let (text, ty) = match rest.rsplit_once(':') {
        Some((text, tag)) => match tag.parse::<PropertyType>() {
            Ok(PropertyType::Other(_)) | Err(_) => (rest, PropertyType::String),
            Ok(ty) => (text, ty),
        },
        None => (rest, PropertyType::String),
    };

    let value = match ty {
        PropertyType::Long => Value::from(
            text.parse::<i64>()
                .with_context(|| format!("'{}' is not a Long", text))?,
        ),
        PropertyType::Double => Value::from(
            text.parse::<f64>()
                .with_context(|| format!("'{}' is not a Double", text))?,
        ),
        PropertyType::Boolean => Value::from(
            text.parse::<bool>()
                .with_context(|| format!("'{}' is not a Boolean", text))?,
        ),
        _ => Value::from(text),
    };

    Ok((name.to_string(), value, ty))
}
