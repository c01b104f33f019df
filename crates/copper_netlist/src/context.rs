//! The generation pass: operands to networks.
//!
//! [`GenContext`] resolves every (operand, bit) to a [`Network`] exactly
//! once. Constants resolve to the supply nets, bound pins and slices forward
//! to what they view, plain wires alias the network of their writer, and
//! wired buses become wired-AND nodes that merge every driver's network.
//!
//! [`Network`]: copper_ir::Network

use std::collections::{HashMap, HashSet};

use copper_diagnostics::DiagnosticSink;
use copper_ir::{
    Arena, ComponentId, Component, Conn, Connector, Design, Endpoint, NetKind, NetworkId,
    Networks, OperandId, OperandKind, PartId, PinBinding, RailKind,
};

use crate::error::GenError;

/// Reference of the top-level connector.
pub const CONNECTOR_REF: &str = "J1";

/// State of one generation pass over a design.
pub struct GenContext<'d> {
    design: &'d Design,
    networks: Networks,
    components: Arena<ComponentId, Component>,
    connector: Connector,
    gnd: NetworkId,
    vcc: NetworkId,
    wired: HashMap<String, NetworkId>,
    bit_cache: HashMap<(OperandId, u32), NetworkId>,
    part_components: HashMap<PartId, ComponentId>,
    in_progress: HashSet<(OperandId, u32)>,
}

impl<'d> GenContext<'d> {
    /// Creates a context with only `GND` and `VCC`.
    pub fn new(design: &'d Design) -> Self {
        let mut networks = Networks::new();
        let gnd = networks.register(RailKind::Gnd.net_name(), NetKind::Plain);
        let vcc = networks.register(RailKind::Vcc.net_name(), NetKind::Plain);
        Self {
            design,
            networks,
            components: Arena::new(),
            connector: Connector::new(CONNECTOR_REF),
            gnd,
            vcc,
            wired: HashMap::new(),
            bit_cache: HashMap::new(),
            part_components: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// The design being generated.
    pub fn design(&self) -> &'d Design {
        self.design
    }

    /// Networks created so far.
    pub fn networks(&self) -> &Networks {
        &self.networks
    }

    /// Components created so far.
    pub fn components(&self) -> &Arena<ComponentId, Component> {
        &self.components
    }

    /// The top-level connector.
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Network of a supply rail.
    pub fn rail(&self, rail: RailKind) -> NetworkId {
        match rail {
            RailKind::Gnd => self.gnd,
            RailKind::Vcc => self.vcc,
        }
    }

    /// Consumes the context, returning networks, components and connector.
    pub fn finish(self) -> (Networks, Arena<ComponentId, Component>, Connector) {
        (self.networks, self.components, self.connector)
    }

    /// Net name of bit `bit` (0-based) of an operand.
    ///
    /// Width-1 operands use their plain name; wider ones append the
    /// absolute index.
    pub fn net_name(&self, id: OperandId, bit: u32) -> String {
        let op = self.design.operand(id);
        let name = self.design.name(id);
        if op.width() == 1 {
            name.to_string()
        } else {
            format!("{name}[{}]", op.range.abs(bit))
        }
    }

    fn named(&mut self, name: String) -> NetworkId {
        match self.networks.lookup(&name) {
            Some(id) => id,
            None => self.networks.register(name, NetKind::Plain),
        }
    }

    /// Resolves bit `bit` (0-based) of `id` to its network.
    ///
    /// Repeated calls return the same network for the life of the context.
    ///
    /// # Panics
    ///
    /// Panics if `id` is writable and its writers were never validated.
    pub fn generate(&mut self, id: OperandId, bit: u32) -> Result<NetworkId, GenError> {
        if let Some(&net) = self.bit_cache.get(&(id, bit)) {
            return Ok(net);
        }
        let design = self.design;
        let op = design.operand(id);
        assert!(
            op.is_validated(),
            "generating unvalidated operand `{}`",
            design.name(id)
        );
        if !self.in_progress.insert((id, bit)) {
            return Err(GenError::AliasLoop {
                name: design.name(id).to_string(),
                bit: op.range.abs(bit),
                span: op.span,
            });
        }
        let result = self.resolve(id, bit);
        self.in_progress.remove(&(id, bit));
        let net = result?;
        self.bit_cache.insert((id, bit), net);
        log::trace!("{} -> {}", self.net_name(id, bit), self.networks.get(net).name);
        Ok(net)
    }

    fn resolve(&mut self, id: OperandId, bit: u32) -> Result<NetworkId, GenError> {
        let design = self.design;
        let op = design.operand(id);
        match &op.kind {
            OperandKind::Const { value } => Ok(if (*value >> bit) & 1 == 1 {
                self.vcc
            } else {
                self.gnd
            }),
            OperandKind::InPin {
                binding: Some(b), ..
            } => self.generate(*b, bit),
            OperandKind::InPin { binding: None, .. } => Ok(self.named(self.net_name(id, bit))),
            OperandKind::Field { .. } => {
                let (target, inner) = design.forward(id, bit);
                self.generate(target, inner)
            }
            OperandKind::Wire { wired: true, .. } => self.resolve_wired(id, bit),
            OperandKind::Wire { .. } | OperandKind::OutPin { .. } => {
                let abs = op.range.abs(bit);
                match op.covering_writers(abs).next() {
                    Some(w) => self.generate(w.source, w.range.offset(abs)),
                    None => Ok(self.named(self.net_name(id, bit))),
                }
            }
            OperandKind::Driven { part, pins, .. } => {
                let component = self.component(*part);
                let pin = pins[bit as usize];
                let name = format!("{}.{pin}", design.part(*part).name);
                let net = self.named(name);
                self.networks.connect(
                    net,
                    Conn {
                        endpoint: Endpoint::Component(component),
                        pin,
                    },
                );
                Ok(net)
            }
        }
    }

    /// Creates the wired-AND of one bus bit and merges every covering
    /// driver into it.
    ///
    /// The node is cached before its drivers are visited, so a bus that
    /// feeds itself resolves to the node being built. A failing driver
    /// uncaches it again.
    fn resolve_wired(&mut self, id: OperandId, bit: u32) -> Result<NetworkId, GenError> {
        let name = self.net_name(id, bit);
        let wand = match self.wired.get(&name) {
            Some(&wand) => wand,
            None => {
                let wand = self.networks.register(
                    name.clone(),
                    NetKind::WiredAnd {
                        subnets: Vec::new(),
                    },
                );
                self.wired.insert(name, wand);
                wand
            }
        };
        self.bit_cache.insert((id, bit), wand);

        let design = self.design;
        let op = design.operand(id);
        let abs = op.range.abs(bit);
        for w in op.covering_writers(abs) {
            match self.generate(w.source, w.range.offset(abs)) {
                Ok(driver) => self.networks.add_driver(wand, driver),
                Err(err) => {
                    self.bit_cache.remove(&(id, bit));
                    return Err(err);
                }
            }
        }
        Ok(wand)
    }

    /// The component of a part, created on first use.
    fn component(&mut self, part: PartId) -> ComponentId {
        if let Some(&c) = self.part_components.get(&part) {
            return c;
        }
        let spec = self.design.part(part);
        let c = self.components.alloc(Component::new(
            spec.name.clone(),
            part,
            spec.prefix,
            spec.value.clone(),
            spec.pins.len() as u16,
        ));
        self.part_components.insert(part, c);
        c
    }

    /// Generates every part and every top-level port.
    ///
    /// Each part becomes a component with every pin connected; each port
    /// bit becomes a connector pin. A failing pin is reported to `sink` and
    /// left unconnected.
    pub fn generate_design(&mut self, sink: &DiagnosticSink) {
        let design = self.design;
        for (part_id, part) in design.parts().iter() {
            let component = self.component(part_id);
            for (pin, binding) in part.numbered_pins() {
                let net = match binding {
                    PinBinding::Rail(rail) => Ok(self.rail(rail)),
                    PinBinding::Operand { operand, bit } => self.generate(operand, bit),
                    PinBinding::Output { operand, bit } => {
                        if let Err(err) = self.generate(operand, bit) {
                            sink.emit(err.to_diagnostic());
                        }
                        continue;
                    }
                };
                match net {
                    Ok(net) => self.networks.connect(
                        net,
                        Conn {
                            endpoint: Endpoint::Component(component),
                            pin,
                        },
                    ),
                    Err(err) => sink.emit(err.to_diagnostic()),
                }
            }
        }

        for &port in design.ports() {
            for bit in 0..design.operand(port).width() {
                match self.generate(port, bit) {
                    Ok(net) => {
                        let name = self.networks.get(net).name.clone();
                        let pin = self.connector.add_pin(name);
                        self.networks.connect(
                            net,
                            Conn {
                                endpoint: Endpoint::Connector,
                                pin,
                            },
                        );
                    }
                    Err(err) => sink.emit(err.to_diagnostic()),
                }
            }
        }
        log::debug!(
            "generated {} networks, {} components, {} connector pins",
            self.networks.len(),
            self.components.len(),
            self.connector.pins.len()
        );
    }
}
