//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `outliner_core` linkage with deterministic output.
//! - Print the fully unfolded outline of a snapshot file when one is given.

use log::error;
use outliner_core::service::editor;
use outliner_core::{Graph, NodeRef, Tree, ROOT_THING};
use std::process::ExitCode;

const PREVIEW_CHARS: usize = 80;

fn main() -> ExitCode {
    println!("outliner_core ping={}", outliner_core::ping());
    println!("outliner_core version={}", outliner_core::core_version());

    if let Ok(log_dir) = std::env::var("OUTLINER_LOG_DIR") {
        if let Err(err) = outliner_core::init_logging(outliner_core::default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match print_outline(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_outline module=cli status=error");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn print_outline(path: &str) -> Result<(), String> {
    let graph = outliner_core::load_snapshot(path).map_err(|err| err.to_string())?;
    let tree = outliner_core::from_root(&graph, ROOT_THING);
    let tree = editor::unfold(&graph, &tree, tree.root()).map_err(|err| err.to_string())?;

    let mut lines = Vec::new();
    render(&graph, &tree, tree.root(), 0, &mut lines);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn render(graph: &Graph, tree: &Tree, node: NodeRef, depth: usize, lines: &mut Vec<String>) {
    let Some(thing) = tree.thing(node) else {
        return;
    };
    let text = outliner_core::preview_text(graph, thing, PREVIEW_CHARS);
    lines.push(format!("{}- {text}", "  ".repeat(depth)));
    if tree.expanded(node) {
        for child in tree.children(node) {
            render(graph, tree, *child, depth + 1, lines);
        }
    }
}
