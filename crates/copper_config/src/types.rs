//! Configuration types deserialized from `copper.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `copper.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata and the design to load.
    pub project: ProjectMeta,
    /// Netlist generation settings.
    #[serde(default)]
    pub netlist: NetlistConfig,
    /// Simulation settings.
    #[serde(default)]
    pub sim: SimConfig,
    /// Per-pin stimulus for forceable top-level inputs.
    #[serde(default)]
    pub stimulus: BTreeMap<String, Stimulus>,
}

/// Core project metadata required in every `copper.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Name of the top-level module.
    pub top: String,
    /// Path to the parsed design document, relative to the project directory.
    #[serde(default = "default_design")]
    pub design: String,
}

fn default_design() -> String {
    "design.json".to_string()
}

/// Settings for the `netlist` command.
#[derive(Debug, Default, Deserialize)]
pub struct NetlistConfig {
    /// Previously exported netlist whose designators and net codes are kept.
    pub legacy: Option<String>,
    /// Where the rendered listing is written. Stdout when absent.
    pub output: Option<String>,
    /// Manual placement directives keyed by component name or reference.
    #[serde(default)]
    pub placement: BTreeMap<String, String>,
}

/// Settings for the `sim` command.
#[derive(Debug, Deserialize)]
pub struct SimConfig {
    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Evaluation depth above which a run halts as runaway.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Consecutive conflicting ticks tolerated before a run halts.
    #[serde(default)]
    pub conflict_ticks: u32,
    /// Operands recorded in the trace. Accepts a string or a list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub watch: Vec<String>,
    /// Optional VCD output path.
    pub vcd: Option<String>,
}

fn default_ticks() -> u32 {
    16
}

fn default_max_depth() -> usize {
    10_000
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            max_depth: default_max_depth(),
            conflict_ticks: 0,
            watch: Vec::new(),
            vcd: None,
        }
    }
}

/// Values forced onto one input pin, one entry per tick.
///
/// Either a string of `0`/`1` characters or a list of integers. The last
/// entry holds for every later tick.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Stimulus {
    /// `"0110"`: one bit per tick.
    Pattern(String),
    /// `[0, 3, 5]`: one value per tick.
    Values(Vec<u32>),
}

impl Stimulus {
    /// Number of ticks explicitly described.
    pub fn len(&self) -> usize {
        match self {
            Stimulus::Pattern(p) => p.chars().count(),
            Stimulus::Values(v) => v.len(),
        }
    }

    /// Returns `true` if no tick is described.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `tick`, holding the last entry past the end.
    ///
    /// Returns `None` for an empty stimulus.
    pub fn value_at(&self, tick: u32) -> Option<u32> {
        let last = self.len().checked_sub(1)?;
        let idx = (tick as usize).min(last);
        match self {
            Stimulus::Pattern(p) => p.chars().nth(idx).map(|c| u32::from(c == '1')),
            Stimulus::Values(v) => v.get(idx).copied(),
        }
    }

    /// Returns `true` if this tick starts a new entry.
    pub fn changes_at(&self, tick: u32) -> bool {
        (tick as usize) < self.len()
    }
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        s: Stimulus,
    }

    fn stimulus(src: &str) -> Stimulus {
        toml::from_str::<Wrapper>(src).unwrap().s
    }

    #[test]
    fn stimulus_pattern() {
        let s = stimulus("s = \"0110\"");
        assert_eq!(s, Stimulus::Pattern("0110".to_string()));
        assert_eq!(s.value_at(0), Some(0));
        assert_eq!(s.value_at(1), Some(1));
        assert_eq!(s.value_at(3), Some(0));
        assert_eq!(s.value_at(100), Some(0));
    }

    #[test]
    fn stimulus_values_hold_last() {
        let s = stimulus("s = [1, 5, 7]");
        assert_eq!(s.value_at(1), Some(5));
        assert_eq!(s.value_at(9), Some(7));
        assert!(s.changes_at(2));
        assert!(!s.changes_at(3));
    }

    #[test]
    fn empty_stimulus_has_no_value() {
        assert_eq!(Stimulus::Values(Vec::new()).value_at(0), None);
    }

    #[test]
    fn sim_defaults() {
        let sim = SimConfig::default();
        assert_eq!(sim.ticks, 16);
        assert_eq!(sim.max_depth, 10_000);
        assert_eq!(sim.conflict_ticks, 0);
        assert!(sim.watch.is_empty());
    }

    #[test]
    fn watch_single_string() {
        #[derive(Deserialize)]
        struct W {
            sim: SimConfig,
        }
        let w: W = toml::from_str("[sim]\nwatch = \"q\"").unwrap();
        assert_eq!(w.sim.watch, vec!["q"]);
        let w: W = toml::from_str("[sim]\nwatch = [\"q\", \"clk\"]").unwrap();
        assert_eq!(w.sim.watch, vec!["q", "clk"]);
    }
}
