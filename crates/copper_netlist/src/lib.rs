//! Netlist generation for elaborated copper designs.
//!
//! Turns a validated [`Design`] into a physical netlist: networks with their
//! pin connections, one component per part and a connector carrying the
//! top-level ports.
//!
//! # Pipeline
//!
//! 1. **Generate**: resolve every part pin and port bit to a network
//!    ([`GenContext`]).
//! 2. **Number**: assign reference designators and net codes, keeping the
//!    ones a legacy netlist already used ([`refdes`]).
//! 3. **Place**: row placement, then manual directives ([`placement`]).
//!
//! [`report::render`] prints the result.
//!
//! # Usage
//!
//! ```ignore
//! let netlist = generate_netlist(&design, legacy.as_ref(), &config.netlist.placement, &sink);
//! print!("{}", copper_netlist::report::render(&netlist));
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod legacy;
pub mod placement;
pub mod refdes;
pub mod report;
pub mod tree;

pub use context::GenContext;
pub use error::{GenError, ImportError, PlacementError};
pub use legacy::LegacyNetlist;
pub use tree::ComponentTree;

use std::collections::BTreeMap;

use copper_diagnostics::DiagnosticSink;
use copper_ir::{Arena, Component, ComponentId, Connector, Design, Networks};

/// A generated, numbered and placed netlist.
#[derive(Debug)]
pub struct Netlist {
    /// Every network, merged ones included.
    pub networks: Networks,
    /// One component per part.
    pub components: Arena<ComponentId, Component>,
    /// The connector carrying the top-level ports.
    pub connector: Connector,
}

/// Runs the whole pipeline on a validated design.
///
/// Generation and placement problems are reported to `sink`; the netlist is
/// returned regardless.
pub fn generate_netlist(
    design: &Design,
    legacy: Option<&LegacyNetlist>,
    placement: &BTreeMap<String, String>,
    sink: &DiagnosticSink,
) -> Netlist {
    let mut ctx = GenContext::new(design);
    ctx.generate_design(sink);
    let (mut networks, mut components, mut connector) = ctx.finish();

    refdes::assign_references(&mut components, &connector, legacy);
    refdes::assign_net_codes(&mut networks, legacy);

    placement::auto_place(&mut components, &mut connector);
    placement::apply_directives(&mut components, &mut connector, placement, sink);

    Netlist {
        networks,
        components,
        connector,
    }
}
