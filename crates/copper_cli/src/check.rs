//! `copper check`: elaborate and validate without producing output.

use std::error::Error;

use crate::pipeline;
use crate::GlobalArgs;

/// Runs the check command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let project = pipeline::load_project(global)?;
    let design = &project.design;
    if !global.quiet {
        eprintln!(
            "    Checked {} ({} operands, {} parts, {} pulls)",
            project.config.project.top,
            design.operands().len(),
            design.parts().len(),
            design.pulls().len()
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global_for(dir: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            project: Some(dir.display().to_string()),
        }
    }

    #[test]
    fn clean_design_passes() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("copper.toml"),
            "[project]\nname = \"t\"\ntop = \"top\"\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("design.json"),
            r#"{"modules": [{"name": "top", "params": [
                {"name": "a", "direction": "in"},
                {"name": "y", "direction": "out"}], "items": [
                {"kind": "instance", "module": "not", "name": "u",
                 "args": [{"kind": "ref", "name": "a"}, {"kind": "ref", "name": "y"}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(run(&global_for(tmp.path())).unwrap(), 0);
    }

    #[test]
    fn missing_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(run(&global_for(tmp.path())).is_err());
    }
}
