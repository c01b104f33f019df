//! Shared pipeline helpers for CLI commands.
//!
//! Every command starts the same way: find the project, load its
//! configuration and design document, then elaborate the top module.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use copper_config::{load_config, ProjectConfig, CONFIG_FILE};
use copper_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use copper_elaborate::elaborate;
use copper_ir::ast::DesignSource;
use copper_ir::Design;
use copper_source::SourceDb;

use crate::GlobalArgs;

/// A loaded and elaborated project.
#[derive(Debug)]
pub struct Project {
    /// Directory containing `copper.toml`.
    pub root: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
    /// The elaborated, validated design.
    pub design: Design,
    /// Source files named by the design document, for diagnostics.
    pub source_db: SourceDb,
}

/// Walks up from `start` looking for the nearest directory containing `copper.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// `--project` may name the directory or its `copper.toml`. Otherwise walks
/// up from the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn Error>> {
    match &global.project {
        Some(path) => {
            let p = PathBuf::from(path);
            if p.is_file() {
                Ok(p.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")))
            } else {
                Ok(p)
            }
        }
        None => find_project_root(&std::env::current_dir()?),
    }
}

/// Registers the design's source files in file-id order.
///
/// A file that cannot be read still takes its id so later spans resolve to
/// the right slot.
pub fn load_sources(root: &Path, files: &[String]) -> SourceDb {
    let mut db = SourceDb::new();
    for file in files {
        if let Err(e) = db.load_file(&root.join(file)) {
            log::warn!("cannot read source `{file}`: {e}");
            db.add_missing(file.as_str());
        }
    }
    db
}

/// Loads the project configuration and design, then elaborates the top module.
///
/// Diagnostics are rendered to stderr. Any elaboration error fails the load.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn Error>> {
    let root = resolve_project_root(global)?;
    let config = load_config(&root)?;

    let design_path = root.join(&config.project.design);
    let text = fs::read_to_string(&design_path)
        .map_err(|e| format!("cannot read design `{}`: {e}", design_path.display()))?;
    let source = DesignSource::from_json(&text)
        .map_err(|e| format!("malformed design `{}`: {e}", design_path.display()))?;
    log::debug!(
        "loaded {} module(s) from {}",
        source.modules.len(),
        design_path.display()
    );

    let source_db = load_sources(&root, &source.files);
    let sink = DiagnosticSink::new();
    let design = elaborate(&source, &config.project.top, &sink);
    render_diagnostics(&sink, &source_db, global);
    if sink.has_errors() {
        return Err(format!(
            "could not elaborate `{}` due to {} error(s)",
            config.project.top,
            sink.error_count()
        )
        .into());
    }

    Ok(Project {
        root,
        config,
        design,
        source_db,
    })
}

/// Renders all diagnostics from a sink to stderr.
///
/// Warnings and notes are skipped under `--quiet`. Returns the number of
/// diagnostics rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, source_db: &SourceDb, global: &GlobalArgs) -> usize {
    let renderer = TerminalRenderer::new(global.color);
    let mut count = 0;
    for diag in sink.take_all() {
        if global.quiet && diag.severity != Severity::Error {
            continue;
        }
        eprintln!("{}", renderer.render(&diag, source_db));
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOGGLE: &str = r#"{"modules": [{"name": "top", "params": [
        {"name": "clk", "direction": "in"},
        {"name": "q", "direction": "out"}], "items": [
        {"kind": "wire", "name": "nq"},
        {"kind": "instance", "module": "not", "name": "inv",
         "args": [{"kind": "ref", "name": "q"}, {"kind": "ref", "name": "nq"}]},
        {"kind": "instance", "module": "reg", "name": "ff",
         "args": [{"kind": "ref", "name": "clk"}, {"kind": "ref", "name": "nq"}, {"kind": "ref", "name": "q"}]}]}]}"#;

    fn global_for(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            project: Some(dir.display().to_string()),
        }
    }

    fn write_project(dir: &Path, design: &str) {
        fs::write(
            dir.join(CONFIG_FILE),
            "[project]\nname = \"t\"\ntop = \"top\"\n",
        )
        .unwrap();
        fs::write(dir.join("design.json"), design).unwrap();
    }

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), TOGGLE);
        assert_eq!(find_project_root(tmp.path()).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), TOGGLE);
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_missing() {
        let tmp = TempDir::new().unwrap();
        let err = find_project_root(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("could not find copper.toml"));
    }

    #[test]
    fn project_flag_accepts_the_config_file() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), TOGGLE);
        let global = GlobalArgs {
            project: Some(tmp.path().join(CONFIG_FILE).display().to_string()),
            ..global_for(tmp.path())
        };
        assert_eq!(resolve_project_root(&global).unwrap(), tmp.path());
    }

    #[test]
    fn load_project_elaborates_the_top() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), TOGGLE);
        let project = load_project(&global_for(tmp.path())).unwrap();
        assert_eq!(project.config.project.top, "top");
        assert!(project.design.find("q").is_some());
        assert_eq!(project.design.ports().len(), 2);
    }

    #[test]
    fn elaboration_errors_fail_the_load() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            r#"{"modules": [{"name": "top", "items": [
                {"kind": "instance", "module": "nosuch", "name": "u", "args": []}]}]}"#,
        );
        let err = load_project(&global_for(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("could not elaborate `top`"));
    }

    #[test]
    fn malformed_design_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "{not json");
        let err = load_project(&global_for(tmp.path())).unwrap_err();
        assert!(err.to_string().starts_with("malformed design"));
    }

    #[test]
    fn unreadable_sources_keep_their_slot() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.cu"), "module b;\n").unwrap();
        let db = load_sources(tmp.path(), &["a.cu".to_string(), "b.cu".to_string()]);
        let b = db
            .file(copper_source::FileId::from_raw(1))
            .expect("second file registered");
        assert_eq!(b.line_text(0), "module b;");
    }
}
