//! `copper sim`: run the design on the tick simulator.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use copper_common::Rail;
use copper_config::Stimulus;
use copper_ir::OperandId;
use copper_sim::{SimError, SimOptions, Schedule, Simulator, VcdRecorder};

use crate::pipeline;
use crate::{GlobalArgs, SimArgs};

/// Runs the sim command.
pub fn run(args: &SimArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    // Step 1: elaborate
    let project = pipeline::load_project(global)?;
    let config = &project.config.sim;
    let ticks = args.ticks.unwrap_or(config.ticks);

    // Step 2: simulator, stimulus and watch list
    let options = SimOptions {
        max_depth: config.max_depth,
        conflict_ticks: config.conflict_ticks,
    };
    let mut sim = Simulator::new(&project.design, options);
    let schedule = build_schedule(&sim, &project.config.stimulus, ticks)?;
    let names = if args.watch.is_empty() {
        &config.watch
    } else {
        &args.watch
    };
    let watch = watch_list(&sim, names)?;

    if let Some(path) = args.vcd.as_ref().or(config.vcd.as_ref()) {
        let path = project.root.join(path);
        let file = File::create(&path)
            .map_err(|e| format!("cannot create `{}`: {e}", path.display()))?;
        sim.set_recorder(Box::new(VcdRecorder::new(BufWriter::new(file))));
    }

    // Step 3: run
    if !global.quiet {
        eprintln!(
            "  Simulating {} for {ticks} ticks",
            project.config.project.top
        );
    }
    let trace = match sim.run(ticks, &schedule, &watch) {
        Ok(trace) => trace,
        Err(SimError::Halted(halt)) => {
            eprintln!("error: simulation halted: {halt}");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    print!("{}", trace.render(&project.design));

    // Step 4: explain
    if let Some(name) = &args.explain {
        let id = sim.resolve(name)?;
        let tick = args.at.unwrap_or(ticks.saturating_sub(1));
        let tree = sim.explain(id, args.bit, tick, args.depth)?;
        print!("{tree}");
    }

    Ok(0)
}

/// Turns per-pin stimulus into a force schedule covering `ticks`.
///
/// A pin is forced only on the ticks its stimulus describes; the simulator
/// holds the last forced value afterwards.
pub fn build_schedule(
    sim: &Simulator<'_>,
    stimulus: &BTreeMap<String, Stimulus>,
    ticks: u32,
) -> Result<Schedule, SimError> {
    let mut schedule = Schedule::new();
    for (name, stim) in stimulus {
        let pin = sim.resolve(name)?;
        let width = sim.design().operand(pin).width();
        for tick in (0..ticks).filter(|&t| stim.changes_at(t)) {
            if let Some(value) = stim.value_at(tick) {
                schedule.add(tick, pin, Rail::from_value(value, width));
            }
        }
    }
    Ok(schedule)
}

/// Resolves watched names, defaulting to the top-level ports.
pub fn watch_list(sim: &Simulator<'_>, names: &[String]) -> Result<Vec<OperandId>, SimError> {
    if names.is_empty() {
        return Ok(sim.design().ports().to_vec());
    }
    names.iter().map(|name| sim.resolve(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TOGGLE: &str = r#"{"modules": [{"name": "top", "params": [
        {"name": "clk", "direction": "in"},
        {"name": "q", "direction": "out"}], "items": [
        {"kind": "wire", "name": "nq"},
        {"kind": "instance", "module": "not", "name": "inv",
         "args": [{"kind": "ref", "name": "q"}, {"kind": "ref", "name": "nq"}]},
        {"kind": "instance", "module": "reg", "name": "ff",
         "args": [{"kind": "ref", "name": "clk"}, {"kind": "ref", "name": "nq"}, {"kind": "ref", "name": "q"}]}]}]}"#;

    fn project(config: &str, design: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("copper.toml"), config).unwrap();
        fs::write(tmp.path().join("design.json"), design).unwrap();
        tmp
    }

    fn global_for(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            project: Some(dir.display().to_string()),
        }
    }

    fn args() -> SimArgs {
        SimArgs {
            ticks: None,
            vcd: None,
            watch: Vec::new(),
            explain: None,
            bit: 0,
            at: None,
            depth: 16,
        }
    }

    fn design(json: &str) -> copper_ir::Design {
        let source = copper_ir::ast::DesignSource::from_json(json).unwrap();
        let sink = copper_diagnostics::DiagnosticSink::new();
        copper_elaborate::elaborate(&source, "top", &sink)
    }

    #[test]
    fn schedule_forces_described_ticks_only() {
        let d = design(TOGGLE);
        let sim = Simulator::new(&d, SimOptions::default());
        let mut stimulus = BTreeMap::new();
        stimulus.insert("clk".to_string(), Stimulus::Pattern("0101".into()));
        let schedule = build_schedule(&sim, &stimulus, 8).unwrap();
        assert_eq!(schedule.len(), 4);
        let clk = sim.resolve("clk").unwrap();
        assert_eq!(schedule.at(1), &[(clk, Rail::from_value(1, 1))]);
        assert!(schedule.at(5).is_empty());
    }

    #[test]
    fn schedule_rejects_unknown_pins() {
        let d = design(TOGGLE);
        let sim = Simulator::new(&d, SimOptions::default());
        let mut stimulus = BTreeMap::new();
        stimulus.insert("rst".to_string(), Stimulus::Values(vec![1]));
        assert!(matches!(
            build_schedule(&sim, &stimulus, 4),
            Err(SimError::UnknownOperand { .. })
        ));
    }

    #[test]
    fn watch_defaults_to_ports() {
        let d = design(TOGGLE);
        let sim = Simulator::new(&d, SimOptions::default());
        assert_eq!(watch_list(&sim, &[]).unwrap(), d.ports().to_vec());
        let q = sim.resolve("q").unwrap();
        assert_eq!(watch_list(&sim, &["q".to_string()]).unwrap(), vec![q]);
    }

    #[test]
    fn run_writes_vcd() {
        let tmp = project(
            "[project]\nname = \"t\"\ntop = \"top\"\n[sim]\nticks = 4\nvcd = \"out.vcd\"\n[stimulus]\nclk = \"0101\"\n",
            TOGGLE,
        );
        assert_eq!(run(&args(), &global_for(tmp.path())).unwrap(), 0);
        let vcd = fs::read_to_string(tmp.path().join("out.vcd")).unwrap();
        assert!(vcd.contains("$var wire 1 \" q $end"));
        assert!(vcd.contains("#3\n1!"));
    }

    #[test]
    fn halted_run_exits_with_one() {
        let tmp = project(
            "[project]\nname = \"t\"\ntop = \"top\"\n",
            r#"{"modules": [{"name": "top", "params": [{"name": "y", "direction": "out"}], "items": [
                {"kind": "instance", "module": "not", "name": "u",
                 "args": [{"kind": "ref", "name": "y"}, {"kind": "ref", "name": "y"}]}]}]}"#,
        );
        assert_eq!(run(&args(), &global_for(tmp.path())).unwrap(), 1);
    }

    #[test]
    fn explain_needs_a_known_operand() {
        let tmp = project("[project]\nname = \"t\"\ntop = \"top\"\n[sim]\nticks = 2\n", TOGGLE);
        let explain = SimArgs {
            explain: Some("nosuch".into()),
            ..args()
        };
        assert!(run(&explain, &global_for(tmp.path())).is_err());
    }
}
