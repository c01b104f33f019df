//! `copper netlist`: generate, number and place the netlist.

use std::error::Error;
use std::fs;

use copper_diagnostics::DiagnosticSink;
use copper_netlist::{generate_netlist, report, LegacyNetlist};

use crate::pipeline;
use crate::{GlobalArgs, NetlistArgs};

/// Runs the netlist command.
pub fn run(args: &NetlistArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    // Step 1: elaborate
    let project = pipeline::load_project(global)?;
    let config = &project.config.netlist;

    // Step 2: legacy designators, if any
    let legacy = match (&config.legacy, args.fresh) {
        (Some(path), false) => match LegacyNetlist::load(&project.root.join(path)) {
            Ok(legacy) => Some(legacy),
            Err(e) => {
                log::warn!("ignoring legacy netlist `{path}`: {e}");
                None
            }
        },
        _ => None,
    };

    // Step 3: generate
    if !global.quiet {
        eprintln!("  Generating {}", project.config.project.top);
    }
    let sink = DiagnosticSink::new();
    let netlist = generate_netlist(&project.design, legacy.as_ref(), &config.placement, &sink);
    pipeline::render_diagnostics(&sink, &project.source_db, global);

    // Step 4: write
    let text = report::render(&netlist);
    match args.output.as_ref().or(config.output.as_ref()) {
        Some(path) => {
            let path = project.root.join(path);
            fs::write(&path, text)
                .map_err(|e| format!("cannot write `{}`: {e}", path.display()))?;
            if !global.quiet {
                eprintln!(
                    "       Wrote {} components, {} nets to {}",
                    netlist.components.len(),
                    netlist.networks.len(),
                    path.display()
                );
            }
        }
        None => print!("{text}"),
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}
