use super::{BuiltinModule, Params};
use crate::errors::ElabError;
use copper_ir::{
    BitRange, Design, DriveLogic, GateFunc, Instance, Operand, OperandKind, PartSpec, PinBinding,
    RailKind,
};
use copper_source::Span;

/// A bank of `width` identical gates in one IC.
///
/// Parameters `a`, `b` (binary functions only) and `y`. Pins are grouped
/// per bit (`a`, `b`, `y`) followed by GND and VCC.
pub struct Gate {
    name: &'static str,
    func: GateFunc,
    open_collector: bool,
}

impl Gate {
    /// Creates a gate kind.
    pub fn new(name: &'static str, func: GateFunc, open_collector: bool) -> Self {
        Self {
            name,
            func,
            open_collector,
        }
    }
}

impl BuiltinModule for Gate {
    fn name(&self) -> &'static str {
        self.name
    }

    fn params(&self) -> &'static [&'static str] {
        if self.func.arity() == 1 {
            &["a", "y"]
        } else {
            &["a", "b", "y"]
        }
    }

    fn instantiate(
        &self,
        design: &mut Design,
        width: u32,
        suffix: &str,
        span: Span,
    ) -> Result<Instance, ElabError> {
        let mut params = Params::new(design, suffix, span);
        let inputs: Vec<_> = self
            .params()
            .iter()
            .filter(|p| **p != "y")
            .map(|p| params.input(p, width))
            .collect();
        let y = params.output("y", width);
        let instance = params.finish(self.name);

        let part_name = format!("gate{suffix}");
        let value = if width == 1 {
            self.name.to_string()
        } else {
            format!("{} x{width}", self.name)
        };
        let part = design.add_part(PartSpec {
            name: part_name.clone(),
            prefix: "U",
            value,
            pins: Vec::new(),
            span,
        });

        let group = inputs.len() as u16 + 1;
        let out_pins: Vec<u16> = (0..width as u16).map(|i| i * group + group).collect();
        let driven = design.add_operand(Operand::new(
            design.interner().get_or_intern(&part_name),
            BitRange::of_width(width),
            OperandKind::Driven {
                part,
                logic: DriveLogic::Gate {
                    func: self.func,
                    inputs: inputs.clone(),
                    open_collector: self.open_collector,
                },
                pins: out_pins,
            },
            span,
        ));

        let mut pins = Vec::new();
        for bit in 0..width {
            pins.extend(
                inputs
                    .iter()
                    .map(|&operand| PinBinding::Operand { operand, bit }),
            );
            pins.push(PinBinding::Output {
                operand: driven,
                bit,
            });
        }
        pins.push(PinBinding::Rail(RailKind::Gnd));
        pins.push(PinBinding::Rail(RailKind::Vcc));
        design.part_mut(part).pins = pins;

        design
            .add_writer(y, BitRange::of_width(width), driven, span)
            .map_err(|e| ElabError::operand(e, span))?;
        log::trace!("gate `{part_name}`: {} x{width}", self.func);
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nand_pins_and_driver() {
        let mut design = Design::new();
        let gate = Gate::new("nand", GateFunc::Nand, false);
        let inst = gate.instantiate(&mut design, 2, "/u1", Span::DUMMY).unwrap();
        assert_eq!(inst.params.len(), 3);
        assert_eq!(design.name(inst.params[0]), "a/u1");
        assert_eq!(design.name(inst.params[2]), "y/u1");
        assert!(inst.is_inst_param_in(&design, 1));
        assert!(!inst.is_inst_param_in(&design, 2));

        let (_, part) = design.parts().iter().next().unwrap();
        assert_eq!(part.name, "gate/u1");
        assert_eq!(part.value, "nand x2");
        assert_eq!(part.pins.len(), 8);
        assert_eq!(part.pins[6], PinBinding::Rail(RailKind::Gnd));

        let y = design.operand(inst.params[2]);
        assert_eq!(y.writers().len(), 1);
        let driven = design.operand(y.writers()[0].source);
        match &driven.kind {
            OperandKind::Driven { pins, .. } => assert_eq!(pins, &vec![3, 6]),
            other => panic!("expected driven operand, got {other:?}"),
        }
        assert!(matches!(part.pins[2], PinBinding::Output { bit: 0, .. }));
        assert!(matches!(part.pins[5], PinBinding::Output { bit: 1, .. }));
    }

    #[test]
    fn unary_gate_has_two_params() {
        let mut design = Design::new();
        let gate = Gate::new("oc_not", GateFunc::Not, true);
        let inst = gate.instantiate(&mut design, 1, "/n", Span::DUMMY).unwrap();
        assert_eq!(inst.params.len(), 2);
        let (_, part) = design.parts().iter().next().unwrap();
        assert_eq!(part.pins.len(), 4);
        assert_eq!(part.value, "oc_not");
    }
}
