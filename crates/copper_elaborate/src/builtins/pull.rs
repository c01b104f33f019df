use super::{BuiltinModule, Params};
use crate::errors::ElabError;
use copper_ir::{Design, Instance, PartSpec, PinBinding, Pull, RailKind};
use copper_source::Span;

/// One resistor per bus bit between a supply rail and the bus.
///
/// The single parameter `bus` is an input: the module only reads the nets
/// it attaches to.
pub struct PullResistor {
    up: bool,
}

impl PullResistor {
    /// A pull-up (`true`) or pull-down (`false`).
    pub fn new(up: bool) -> Self {
        Self { up }
    }
}

impl BuiltinModule for PullResistor {
    fn name(&self) -> &'static str {
        if self.up {
            "pullup"
        } else {
            "pulldown"
        }
    }

    fn params(&self) -> &'static [&'static str] {
        &["bus"]
    }

    fn instantiate(
        &self,
        design: &mut Design,
        width: u32,
        suffix: &str,
        span: Span,
    ) -> Result<Instance, ElabError> {
        let mut params = Params::new(design, suffix, span);
        let bus = params.input("bus", width);
        let instance = params.finish(self.name());

        let rail = if self.up { RailKind::Vcc } else { RailKind::Gnd };
        for bit in 0..width {
            let part = design.add_part(PartSpec {
                name: format!("pull.{bit}{suffix}"),
                prefix: "R",
                value: "10k".to_string(),
                pins: vec![
                    PinBinding::Rail(rail),
                    PinBinding::Operand { operand: bus, bit },
                ],
                span,
            });
            design.add_pull(Pull {
                target: bus,
                bit,
                up: self.up,
                part,
            });
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_resistor_per_bit() {
        let mut design = Design::new();
        let inst = PullResistor::new(false)
            .instantiate(&mut design, 3, "/pd", Span::DUMMY)
            .unwrap();
        assert_eq!(design.parts().len(), 3);
        let names: Vec<_> = design.parts().values().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["pull.0/pd", "pull.1/pd", "pull.2/pd"]);
        assert!(design.pulls().iter().all(|p| !p.up && p.target == inst.params[0]));
        assert_eq!(
            design.parts().values().next().unwrap().pins[0],
            PinBinding::Rail(RailKind::Gnd)
        );
        assert!(inst.is_inst_param_in(&design, 0));
    }
}
