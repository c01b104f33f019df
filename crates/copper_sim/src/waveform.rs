//! Waveform recording for simulation output.
//!
//! The [`WaveformRecorder`] trait abstracts waveform output. [`VcdRecorder`]
//! writes the IEEE 1364 Value Change Dump format, one time unit per tick,
//! readable by GTKWave, Surfer and other viewers.

use std::io::Write;

use copper_common::Rail;
use copper_ir::OperandId;

use crate::error::SimError;

/// Receives the watched operands of a run and their changes.
pub trait WaveformRecorder {
    /// Registers an operand for recording.
    fn register_signal(&mut self, id: OperandId, name: &str, width: u32) -> Result<(), SimError>;

    /// Opens a new scope (hierarchy level) in the waveform.
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records the value of an operand from `tick` on.
    fn record_change(&mut self, tick: u64, id: OperandId, value: Rail) -> Result<(), SimError>;

    /// Finalizes the output (trailer, flush).
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// VCD format recorder.
///
/// Signal identifiers use printable ASCII characters starting from `!`.
pub struct VcdRecorder<W: Write> {
    writer: W,
    id_map: Vec<(OperandId, String, u32)>, // (operand, id_code, width)
    header_written: bool,
    current_tick: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a recorder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            id_map: Vec::new(),
            header_written: false,
            current_tick: None,
        }
    }

    /// Consumes the recorder, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ensure_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  copper {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1ns")?;
        writeln!(self.writer, "$end")?;
        Ok(())
    }

    /// Identifier code for the `index`-th registered signal.
    fn make_id_code(index: usize) -> String {
        let mut code = String::new();
        let mut idx = index;
        loop {
            code.push((b'!' + (idx % 94) as u8) as char);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        code
    }

    fn format_value(value: Rail, width: u32) -> String {
        if width == 1 {
            value.lane(0).vcd_char().to_string()
        } else {
            format!("b{}", value.to_bit_string(width))
        }
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn register_signal(&mut self, id: OperandId, name: &str, width: u32) -> Result<(), SimError> {
        self.ensure_header()?;
        let code = Self::make_id_code(self.id_map.len());
        // VCD references cannot contain whitespace
        let reference: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        writeln!(self.writer, "$var wire {width} {code} {reference} $end")?;
        self.id_map.push((id, code, width));
        Ok(())
    }

    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.ensure_header()?;
        writeln!(self.writer, "$scope module {name} $end")?;
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        Ok(())
    }

    fn record_change(&mut self, tick: u64, id: OperandId, value: Rail) -> Result<(), SimError> {
        self.ensure_header()?;
        if self.current_tick != Some(tick) {
            if self.current_tick.is_none() {
                writeln!(self.writer, "$enddefinitions $end")?;
            }
            writeln!(self.writer, "#{tick}")?;
            self.current_tick = Some(tick);
        }
        let (_, code, width) = self
            .id_map
            .iter()
            .find(|(sid, _, _)| *sid == id)
            .ok_or(SimError::UnregisteredSignal(id.as_raw()))?;
        let text = Self::format_value(value, *width);
        if *width == 1 {
            writeln!(self.writer, "{text}{code}")?;
        } else {
            writeln!(self.writer, "{text} {code}")?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        if self.current_tick.is_none() {
            self.ensure_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> OperandId {
        OperandId::from_raw(raw)
    }

    fn output(rec: VcdRecorder<Vec<u8>>) -> String {
        String::from_utf8(rec.into_inner()).unwrap()
    }

    #[test]
    fn id_codes() {
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(0), "!");
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(93), "~");
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(94).len(), 2);
    }

    #[test]
    fn declarations() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.begin_scope("top").unwrap();
        rec.register_signal(id(0), "clk", 1).unwrap();
        rec.register_signal(id(4), "count", 4).unwrap();
        rec.end_scope().unwrap();
        rec.finalize().unwrap();
        let out = output(rec);
        assert!(out.starts_with("$version"));
        assert!(out.contains("$timescale\n  1ns\n$end"));
        assert!(out.contains("$scope module top $end"));
        assert!(out.contains("$var wire 1 ! clk $end"));
        assert!(out.contains("$var wire 4 \" count $end"));
        assert!(out.ends_with("$upscope $end\n$enddefinitions $end\n"));
    }

    #[test]
    fn changes_are_grouped_by_tick() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.begin_scope("top").unwrap();
        rec.register_signal(id(0), "clk", 1).unwrap();
        rec.register_signal(id(1), "bus", 3).unwrap();
        rec.end_scope().unwrap();
        rec.record_change(0, id(0), Rail::from_value(0, 1)).unwrap();
        rec.record_change(0, id(1), Rail::from_planes(0b001, 0b010)).unwrap();
        rec.record_change(2, id(0), Rail::from_value(1, 1)).unwrap();
        rec.finalize().unwrap();
        let out = output(rec);
        let body: Vec<_> = out
            .lines()
            .skip_while(|l| *l != "$enddefinitions $end")
            .skip(1)
            .collect();
        assert_eq!(body, vec!["#0", "0!", "bz01 \"", "#2", "1!"]);
    }

    #[test]
    fn conflicting_lane_is_x() {
        let mut rec = VcdRecorder::new(Vec::new());
        rec.register_signal(id(0), "bus", 1).unwrap();
        rec.record_change(0, id(0), Rail::from_planes(1, 1)).unwrap();
        assert!(output(rec).contains("\nx!\n"));
    }

    #[test]
    fn unregistered_signal_is_an_error() {
        let mut rec = VcdRecorder::new(Vec::new());
        let err = rec.record_change(0, id(9), Rail::FLOAT).unwrap_err();
        assert!(matches!(err, SimError::UnregisteredSignal(9)));
    }
}
