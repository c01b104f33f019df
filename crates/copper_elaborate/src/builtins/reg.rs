use super::{BuiltinModule, Params};
use crate::errors::ElabError;
use copper_ir::{
    BitRange, Design, DriveLogic, Instance, Operand, OperandKind, PartSpec, PinBinding, RailKind,
};
use copper_source::Span;

/// A rising-edge register of configurable width.
///
/// Parameters `clk`, `d`, `q`. Pin 1 is the clock, then `d`/`q` pairs per
/// bit, then GND and VCC.
pub struct Register;

impl BuiltinModule for Register {
    fn name(&self) -> &'static str {
        "reg"
    }

    fn params(&self) -> &'static [&'static str] {
        &["clk", "d", "q"]
    }

    fn instantiate(
        &self,
        design: &mut Design,
        width: u32,
        suffix: &str,
        span: Span,
    ) -> Result<Instance, ElabError> {
        let mut params = Params::new(design, suffix, span);
        let clk = params.input("clk", 1);
        let d = params.input("d", width);
        let q = params.output("q", width);
        let instance = params.finish(self.name());

        let part_name = format!("reg{suffix}");
        let part = design.add_part(PartSpec {
            name: part_name.clone(),
            prefix: "U",
            value: format!("reg x{width}"),
            pins: Vec::new(),
            span,
        });
        let q_pins: Vec<u16> = (0..width as u16).map(|i| 3 + 2 * i).collect();
        let driven = design.add_operand(Operand::new(
            design.interner().get_or_intern(&part_name),
            BitRange::of_width(width),
            OperandKind::Driven {
                part,
                logic: DriveLogic::Register { clk, d },
                pins: q_pins,
            },
            span,
        ));

        let mut pins = vec![PinBinding::Operand {
            operand: clk,
            bit: 0,
        }];
        for bit in 0..width {
            pins.push(PinBinding::Operand { operand: d, bit });
            pins.push(PinBinding::Output {
                operand: driven,
                bit,
            });
        }
        pins.push(PinBinding::Rail(RailKind::Gnd));
        pins.push(PinBinding::Rail(RailKind::Vcc));
        design.part_mut(part).pins = pins;

        design
            .add_writer(q, BitRange::of_width(width), driven, span)
            .map_err(|e| ElabError::operand(e, span))?;
        Ok(instance)
    }
}
