use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use wls_sdk::{
    HistoryLayout, HistoryNode, NodeId, ObjectKey, RecordMeta, StateChange, StoreConfig,
    WorldLine, WorldState, Wls,
};

use crate::cli::*;

const DEFAULT_ROOT: &str = ".wls";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    let config = StoreConfig::load_or_default(&root)?;
    debug!(?config, "loaded config");
    let wls = Wls::open(&config)
        .with_context(|| format!("opening store at {}", root.display()))?;
    let format = cli.format;

    match cli.command {
        Command::Create(args) => cmd_create(&wls, format, args),
        Command::List => cmd_list(&wls, format),
        Command::Rename(args) => {
            wls.rename(&args.worldline, &args.name)?;
            done(format, &format!("Renamed {} to {}", args.worldline.bold(), args.name.bold()))
        }
        Command::Delete(args) => {
            wls.delete(&args.worldline)?;
            done(format, &format!("Deleted world-line {}", args.worldline.bold()))
        }
        Command::Record(args) => cmd_record(&wls, format, args),
        Command::Get(args) => cmd_get(&wls, format, args),
        Command::State(args) => cmd_state(&wls, format, args),
        Command::Log(args) => cmd_log(&wls, format, args),
        Command::Show(args) => cmd_show(&wls, format, args),
        Command::Goto(args) => {
            let line = wls.load(&args.worldline)?;
            let node = resolve_node(&line, &args.node)?;
            wls.move_to(&args.worldline, &node)?;
            print_move(format, "goto", Some(node))
        }
        Command::Back(args) => print_move(format, "back", wls.move_back(&args.worldline)?),
        Command::Forward(args) => print_move(format, "forward", wls.move_forward(&args.worldline)?),
        Command::Latest(args) => print_move(format, "latest", wls.move_to_latest(&args.worldline)?),
    }
}

// ---- Commands ----

fn cmd_create(wls: &Wls, format: OutputFormat, args: CreateArgs) -> anyhow::Result<()> {
    let name = args.name.unwrap_or_else(|| args.id.clone());
    wls.create(&args.id, &name)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": args.id, "name": name })),
        OutputFormat::Text => {
            println!("{} Created world-line {} ({})", "✓".green().bold(), args.id.bold(), name);
            Ok(())
        }
    }
}

fn cmd_list(wls: &Wls, format: OutputFormat) -> anyhow::Result<()> {
    let summaries = wls.list()?;
    if format == OutputFormat::Json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("No world-lines.");
    }
    for s in &summaries {
        println!("{}  {}  {}", s.id.yellow().bold(), s.name, format!("({} nodes)", s.node_count).dimmed());
    }
    Ok(())
}

fn cmd_record(wls: &Wls, format: OutputFormat, args: RecordArgs) -> anyhow::Result<()> {
    let key = ObjectKey::parse(&args.key)?;
    let value = serde_json::from_str(&args.value).unwrap_or(Value::String(args.value));

    let mut meta = RecordMeta::empty();
    if let Some(author) = args.author {
        meta = meta.by(author);
    }
    if let Some(message) = args.message {
        meta = meta.note(message);
    }

    let node = wls.record(&args.worldline, &key, &value, meta)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "node": node, "key": key })),
        OutputFormat::Text => {
            println!("{} Recorded {} at {}", "✓".green().bold(), key.to_string().cyan(), node.short_id().yellow());
            Ok(())
        }
    }
}

fn cmd_get(wls: &Wls, format: OutputFormat, args: GetArgs) -> anyhow::Result<()> {
    let key = ObjectKey::parse(&args.key)?;
    let value = wls.get_current_value(&args.worldline, key.object_type(), key.id())?;
    match (format, value) {
        (OutputFormat::Json, value) => print_json(&value),
        (OutputFormat::Text, Some(value)) => print_json(&value),
        (OutputFormat::Text, None) => {
            println!("{} is not in the world at the cursor", key.to_string().cyan());
            Ok(())
        }
    }
}

fn cmd_state(wls: &Wls, format: OutputFormat, args: StateArgs) -> anyhow::Result<()> {
    let state = match &args.at {
        Some(prefix) => {
            let line = wls.load(&args.worldline)?;
            wls.snapshots_at(&args.worldline, &resolve_node(&line, prefix)?)?
        }
        None => wls.current_state(&args.worldline)?,
    };
    match format {
        OutputFormat::Json => print_json(&state),
        OutputFormat::Text => {
            print_state(&state);
            Ok(())
        }
    }
}

fn cmd_log(wls: &Wls, format: OutputFormat, args: LogArgs) -> anyhow::Result<()> {
    let line = wls.load(&args.worldline)?;
    let limit = args.limit.unwrap_or(usize::MAX);

    if format == OutputFormat::Json {
        let layout = line.compute_layout();
        let nodes: Vec<Value> = line
            .history()
            .iter()
            .rev()
            .take(limit)
            .map(|node| {
                let place = layout.get(&node.id);
                json!({
                    "node": node,
                    "depth": place.map(|p| p.depth),
                    "branch": place.map(|p| p.branch),
                })
            })
            .collect();
        return print_json(&json!({ "cursor": line.cursor(), "nodes": nodes }));
    }

    if line.is_empty() {
        println!("No history.");
        return Ok(());
    }

    let on_path = line.current_path();
    if args.graph {
        let layout = line.compute_layout();
        for id in graph_rows(&line, &layout, limit) {
            let (Some(node), Some(place)) = (line.node(id), layout.get(id)) else {
                continue;
            };
            let mut lanes = String::new();
            for lane in 0..layout.branch_count() {
                lanes.push_str(if lane == place.branch { "● " } else { "│ " });
            }
            println!("{}{}", lanes.dimmed(), node_line(&line, node, &on_path));
        }
    } else {
        for node in line.history().iter().rev().take(limit) {
            println!("{}", node_line(&line, node, &on_path));
        }
    }
    Ok(())
}

/// The newest `limit` nodes, in graph order.
fn graph_rows<'a>(line: &WorldLine, layout: &'a HistoryLayout, limit: usize) -> Vec<&'a NodeId> {
    let newest: HashSet<&NodeId> = line
        .history()
        .iter()
        .rev()
        .take(limit)
        .map(|node| &node.id)
        .collect();
    layout
        .order()
        .iter()
        .filter(|id| newest.contains(id))
        .collect()
}

fn cmd_show(wls: &Wls, format: OutputFormat, args: NodeArgs) -> anyhow::Result<()> {
    let line = wls.load(&args.worldline)?;
    let id = resolve_node(&line, &args.node)?;
    let Some(node) = line.node(&id) else {
        bail!("node {id} vanished");
    };

    let state = line.state_at(&id)?;
    let before = match &node.parent_id {
        Some(parent) => line.state_at(parent)?,
        None => WorldState::new(),
    };
    let changes = before.diff(&state);

    if format == OutputFormat::Json {
        return print_json(&json!({
            "node": node,
            "stateDigest": state.digest(),
            "changes": changes,
            "state": state,
        }));
    }

    println!("{} {}", "node".bold(), node.id.to_string().yellow());
    println!("  {}  {}", "time:".dimmed(), node.timestamp);
    if let Some(parent) = &node.parent_id {
        println!("  {}  {}", "parent:".dimmed(), parent.short_id().yellow());
    }
    if let Some(author) = &node.author {
        println!("  {}  {}", "author:".dimmed(), author);
    }
    if let Some(description) = &node.description {
        println!("  {}  {}", "note:".dimmed(), description);
    }

    println!("\n{}", "changes".bold());
    if changes.is_empty() {
        println!("  (re-recorded identical values)");
    }
    for change in &changes {
        match change {
            StateChange::Added(s) => println!("  {} {}:{} {}", "+".green(), s.object_type, s.id, s.digest.short_hex().dimmed()),
            StateChange::Changed { from, to } => println!(
                "  {} {}:{} {} → {}",
                "~".yellow(),
                to.object_type,
                to.id,
                from.digest.short_hex().dimmed(),
                to.digest.short_hex()
            ),
            StateChange::Removed(s) => println!("  {} {}:{}", "-".red(), s.object_type, s.id),
        }
    }

    println!("\n{} {}", "state".bold(), state.digest().short_hex().dimmed());
    print_state(&state);
    Ok(())
}

// ---- Helpers ----

/// Find a node by full id or unique prefix.
fn resolve_node(line: &WorldLine, prefix: &str) -> anyhow::Result<NodeId> {
    let exact = NodeId::new(prefix);
    if line.node(&exact).is_some() {
        return Ok(exact);
    }
    let matches: Vec<&HistoryNode> = line
        .history()
        .iter()
        .filter(|n| n.id.as_str().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("no node in {} matches {prefix:?}", line.id()),
        many => bail!("{prefix:?} is ambiguous: {} nodes match", many.len()),
    }
}

fn node_line(line: &WorldLine, node: &HistoryNode, on_path: &HashSet<NodeId>) -> String {
    let marker = if line.cursor() == Some(&node.id) {
        "*".green().bold()
    } else if on_path.contains(&node.id) {
        "|".green()
    } else {
        " ".normal()
    };
    let objects: Vec<String> = node
        .changed_objects
        .iter()
        .map(|s| format!("{}:{}", s.object_type, s.id))
        .collect();
    let mut text = format!(
        "{} {} {} [{}]",
        marker,
        node.id.short_id().yellow(),
        node.timestamp.to_string().dimmed(),
        objects.join(", ").cyan()
    );
    if let Some(author) = &node.author {
        text.push_str(&format!(" <{author}>"));
    }
    if let Some(description) = &node.description {
        text.push_str(&format!(" {description}"));
    }
    text
}

fn print_state(state: &WorldState) {
    if state.is_empty() {
        println!("  (empty world)");
    }
    for s in state.iter() {
        println!("  {}:{}  {}", s.object_type.cyan(), s.id, s.digest.to_hex().dimmed());
    }
}

fn print_move(format: OutputFormat, direction: &str, moved: Option<NodeId>) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "move": direction, "cursor": moved })),
        OutputFormat::Text => {
            match moved {
                Some(node) => println!("{} Cursor at {}", "✓".green().bold(), node.short_id().yellow()),
                None => println!("Cursor did not move ({direction})"),
            }
            Ok(())
        }
    }
}

fn done(format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "ok": true })),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), message);
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
