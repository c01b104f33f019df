//! The memoized evaluator.
//!
//! Values are computed on demand per (operand, tick) and cached. An operand's
//! value is a [`Rail`] whose lane `i` is bit `lo + i` of the operand. A slice
//! reads only the lanes it views, and those lanes only evaluate the writers
//! or gate inputs they depend on, so loops are detected per bit. Ticks
//! are evaluated lazily, but a register reads one tick back, so public entry
//! points fill earlier ticks in order before answering; this keeps the
//! evaluation depth bounded by the combinational depth of the design.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use copper_common::{lane_mask, Logic, Rail};
use copper_ir::{Design, DriveLogic, GateFunc, OperandId, OperandKind};

use crate::depgraph;
use crate::error::{Halt, SimError};
use crate::harness::{Schedule, Trace};
use crate::waveform::WaveformRecorder;
use crate::SimOptions;

/// Simulates one design.
pub struct Simulator<'d> {
    design: &'d Design,
    options: SimOptions,
    memo: HashMap<(OperandId, u32), Rail>,
    /// Partial reads, keyed by (operand, tick, first lane, lane count).
    lanes_memo: HashMap<(OperandId, u32, u32, u32), Rail>,
    in_progress: HashSet<(OperandId, u32, u32, u32)>,
    depth: usize,
    forces: HashMap<OperandId, BTreeMap<u32, Rail>>,
    /// Pulled lanes per network root operand, as (up, down) masks.
    pulls: HashMap<OperandId, (u32, u32)>,
    /// Ticks at which each writable carried a drive conflict.
    conflicts: HashMap<OperandId, BTreeSet<u32>>,
    recorder: Option<Box<dyn WaveformRecorder>>,
}

impl<'d> Simulator<'d> {
    /// Creates a simulator over a validated design.
    pub fn new(design: &'d Design, options: SimOptions) -> Self {
        let mut pulls: HashMap<OperandId, (u32, u32)> = HashMap::new();
        for pull in design.pulls() {
            let (root, bit) = design
                .net_root(pull.target, pull.bit)
                .unwrap_or_else(|| design.root(pull.target, pull.bit));
            let masks = pulls.entry(root).or_default();
            if pull.up {
                masks.0 |= 1 << bit;
            } else {
                masks.1 |= 1 << bit;
            }
        }
        log::debug!(
            "simulator over {} operands, {} pulled roots",
            design.operands().len(),
            pulls.len()
        );
        Self {
            design,
            options,
            memo: HashMap::new(),
            lanes_memo: HashMap::new(),
            in_progress: HashSet::new(),
            depth: 0,
            forces: HashMap::new(),
            pulls,
            conflicts: HashMap::new(),
            recorder: None,
        }
    }

    /// The simulated design.
    pub fn design(&self) -> &'d Design {
        self.design
    }

    /// Attaches a waveform recorder used by [`run`](Self::run).
    pub fn set_recorder(&mut self, recorder: Box<dyn WaveformRecorder>) {
        self.recorder = Some(recorder);
    }

    /// Number of cached (operand, tick) values.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Looks an operand up by name.
    pub fn resolve(&self, name: &str) -> Result<OperandId, SimError> {
        self.design.find(name).ok_or_else(|| SimError::UnknownOperand {
            name: name.to_string(),
        })
    }

    /// Forces an unbound forceable input pin to `value` from `tick` on.
    pub fn force(&mut self, pin: OperandId, tick: u32, value: u32) -> Result<(), SimError> {
        let width = self.design.operand(pin).width();
        self.force_rail(pin, tick, Rail::from_value(value, width))
    }

    /// Forces an input pin to arbitrary lane states, floating included.
    ///
    /// Every cached value at `tick` or later is dropped.
    pub fn force_rail(&mut self, pin: OperandId, tick: u32, value: Rail) -> Result<(), SimError> {
        let op = self.design.operand(pin);
        if !matches!(
            op.kind,
            OperandKind::InPin {
                binding: None,
                forceable: true
            }
        ) {
            return Err(SimError::NotForceable {
                name: self.design.name(pin).to_string(),
            });
        }
        self.forces
            .entry(pin)
            .or_default()
            .insert(tick, value.masked(op.width()));
        self.invalidate_from(tick);
        Ok(())
    }

    fn invalidate_from(&mut self, tick: u32) {
        let before = self.memo.len();
        self.memo.retain(|&(_, t), _| t < tick);
        self.lanes_memo.retain(|&(_, t, _, _), _| t < tick);
        for ticks in self.conflicts.values_mut() {
            ticks.retain(|&t| t < tick);
        }
        log::trace!("dropped {} cached values from tick {tick}", before - self.memo.len());
    }

    /// Value of an operand at a tick.
    pub fn value(&mut self, id: OperandId, tick: u32) -> Result<Rail, SimError> {
        self.guarded(|sim| {
            for t in 0..tick {
                if !sim.memo.contains_key(&(id, t)) {
                    sim.eval(id, t)?;
                }
            }
            sim.eval(id, tick)
        })
    }

    /// State of one bit (0-based from the low index) at a tick.
    pub fn bit(&mut self, id: OperandId, bit: u32, tick: u32) -> Result<Logic, SimError> {
        self.check_bit(id, bit)?;
        Ok(self.value(id, tick)?.lane(bit))
    }

    pub(crate) fn check_bit(&self, id: OperandId, bit: u32) -> Result<(), SimError> {
        let width = self.design.operand(id).width();
        if bit >= width {
            return Err(SimError::BitOutOfRange {
                name: self.design.name(id).to_string(),
                bit,
                width,
            });
        }
        Ok(())
    }

    /// Evaluates every operand at `tick`.
    pub fn settle(&mut self, tick: u32) -> Result<(), SimError> {
        let design = self.design;
        self.guarded(|sim| {
            for id in design.operands().ids() {
                sim.eval(id, tick)?;
            }
            Ok(())
        })
    }

    /// Runs ticks `0..ticks`, applying `schedule` and sampling `watch`.
    ///
    /// The static loop check runs first. Every tick settles the whole design,
    /// so loops, runaways and conflicts anywhere halt the run. An attached
    /// recorder receives every change of a watched operand and is finalized
    /// whether or not the run halts.
    pub fn run(
        &mut self,
        ticks: u32,
        schedule: &Schedule,
        watch: &[OperandId],
    ) -> Result<Trace, SimError> {
        depgraph::preflight(self.design)?;
        let mut recorder = self.recorder.take();
        let mut trace = Trace::new(watch);
        let result = self.run_ticks(ticks, schedule, &mut trace, recorder.as_deref_mut());
        let finalized = match recorder.as_deref_mut() {
            Some(rec) => rec.finalize(),
            None => Ok(()),
        };
        self.recorder = recorder;
        result?;
        finalized?;
        log::debug!("ran {ticks} ticks, {} cached values", self.memo.len());
        Ok(trace)
    }

    fn run_ticks(
        &mut self,
        ticks: u32,
        schedule: &Schedule,
        trace: &mut Trace,
        mut recorder: Option<&mut (dyn WaveformRecorder + 'static)>,
    ) -> Result<(), SimError> {
        if let Some(rec) = recorder.as_deref_mut() {
            rec.begin_scope("top")?;
            for &id in trace.watched() {
                rec.register_signal(id, self.design.name(id), self.design.operand(id).width())?;
            }
            rec.end_scope()?;
        }
        for tick in 0..ticks {
            for &(pin, value) in schedule.at(tick) {
                self.force_rail(pin, tick, value)?;
            }
            self.settle(tick)?;
            let watched: Vec<OperandId> = trace.watched().to_vec();
            for id in watched {
                let value = self.value(id, tick)?;
                let changed = trace.push(id, value);
                if let (true, Some(rec)) = (changed, recorder.as_deref_mut()) {
                    rec.record_change(u64::from(tick), id, value)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Halt>,
    ) -> Result<T, SimError> {
        let result = f(self);
        if result.is_err() {
            self.in_progress.clear();
            self.depth = 0;
        }
        result.map_err(SimError::Halted)
    }

    pub(crate) fn eval(&mut self, id: OperandId, tick: u32) -> Result<Rail, Halt> {
        if let Some(&value) = self.memo.get(&(id, tick)) {
            return Ok(value);
        }
        let width = self.design.operand(id).width();
        self.enter(id, tick, 0, width)?;
        let value = self.compute(id, tick)?;
        self.leave(id, tick, 0, width);
        self.memo.insert((id, tick), value);
        Ok(value)
    }

    /// Lanes `offset..offset + width` of `id`, moved down to lane 0.
    ///
    /// Only the sources of those lanes are evaluated, so a slice of a bus
    /// may feed other bits of the same bus.
    pub(crate) fn eval_lanes(
        &mut self,
        id: OperandId,
        tick: u32,
        offset: u32,
        width: u32,
    ) -> Result<Rail, Halt> {
        if offset == 0 && width == self.design.operand(id).width() {
            return self.eval(id, tick);
        }
        if let Some(&value) = self.memo.get(&(id, tick)) {
            return Ok(value.extract(offset, width));
        }
        let key = (id, tick, offset, width);
        if let Some(&value) = self.lanes_memo.get(&key) {
            return Ok(value);
        }
        self.enter(id, tick, offset, width)?;
        let raw = self.raw_lanes(id, tick, offset, width)?;
        let value = self.apply_pulls(id, raw, offset, width);
        self.leave(id, tick, offset, width);
        self.lanes_memo.insert(key, value);
        Ok(value)
    }

    fn enter(&mut self, id: OperandId, tick: u32, offset: u32, width: u32) -> Result<(), Halt> {
        if !self.in_progress.insert((id, tick, offset, width)) {
            return Err(Halt::CombinationalLoop {
                operand: self.design.name(id).to_string(),
                tick,
            });
        }
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Halt::Runaway {
                operand: self.design.name(id).to_string(),
                tick,
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self, id: OperandId, tick: u32, offset: u32, width: u32) {
        self.depth -= 1;
        self.in_progress.remove(&(id, tick, offset, width));
    }

    fn compute(&mut self, id: OperandId, tick: u32) -> Result<Rail, Halt> {
        let design = self.design;
        let op = design.operand(id);
        let width = op.width();
        let raw = self.raw_lanes(id, tick, 0, width)?;
        if op.is_writable() {
            self.track_conflict(id, raw, tick)?;
        }
        Ok(self.apply_pulls(id, raw, 0, width))
    }

    /// Lanes `offset..offset + width` of `id` before its pulls apply.
    pub(crate) fn raw_lanes(
        &mut self,
        id: OperandId,
        tick: u32,
        offset: u32,
        width: u32,
    ) -> Result<Rail, Halt> {
        let design = self.design;
        let op = design.operand(id);
        let raw = match &op.kind {
            OperandKind::Const { value } => {
                Rail::from_value(*value, op.width()).extract(offset, width)
            }
            OperandKind::InPin {
                binding: Some(b), ..
            } => self.eval_lanes(*b, tick, offset, width)?,
            OperandKind::InPin { binding: None, .. } => {
                self.forced(id, tick).extract(offset, width)
            }
            OperandKind::Field { target } => {
                let outer = design.operand(*target).range;
                let inner = (op.range.lo - outer.lo) as u32 + offset;
                self.eval_lanes(*target, tick, inner, width)?
            }
            OperandKind::OutPin { .. } | OperandKind::Wire { .. } => {
                self.merge_writers(id, tick, offset, width)?
            }
            OperandKind::Driven { logic, .. } => match logic {
                DriveLogic::Gate {
                    func,
                    inputs,
                    open_collector,
                } => {
                    let mut values = Vec::with_capacity(inputs.len());
                    for &input in inputs {
                        values.push(self.eval_lanes(input, tick, offset, width)?);
                    }
                    let out = gate(*func, &values).masked(width);
                    if *open_collector {
                        out.open_collector()
                    } else {
                        out
                    }
                }
                DriveLogic::Register { clk, d } => {
                    let whole = if tick == 0 {
                        Rail::from_value(0, op.width())
                    } else if self.rose(*clk, tick)? {
                        self.eval(*d, tick - 1)?.masked(op.width())
                    } else {
                        self.eval(id, tick - 1)?
                    };
                    whole.extract(offset, width)
                }
            },
        };
        Ok(raw)
    }

    /// The value last forced on `pin` at or before `tick`; floating if none.
    pub(crate) fn forced(&self, pin: OperandId, tick: u32) -> Rail {
        self.forces
            .get(&pin)
            .and_then(|forces| forces.range(..=tick).next_back())
            .map(|(_, &value)| value)
            .unwrap_or(Rail::FLOAT)
    }

    pub(crate) fn is_forced(&self, pin: OperandId, tick: u32) -> bool {
        self.forces
            .get(&pin)
            .is_some_and(|forces| forces.range(..=tick).next_back().is_some())
    }

    /// Plane-wise union of the writers of lanes `offset..offset + width`,
    /// before pulls.
    pub(crate) fn merge_writers(
        &mut self,
        id: OperandId,
        tick: u32,
        offset: u32,
        width: u32,
    ) -> Result<Rail, Halt> {
        let design = self.design;
        let op = design.operand(id);
        let lo = op.range.abs(offset);
        let hi = lo + width as i32 - 1;
        let mut merged = Rail::FLOAT;
        for w in op.writers() {
            let (from, to) = (w.range.lo.max(lo), w.range.hi.min(hi));
            if from > to {
                continue;
            }
            let n = (to - from + 1) as u32;
            let value = self.eval_lanes(w.source, tick, w.range.offset(from), n)?;
            merged = merged.merge(value.masked(n).place((from - lo) as u32));
        }
        Ok(merged)
    }

    /// Whether the low lane of `clk` went from 0 to 1 between `tick - 1` and `tick`.
    pub(crate) fn rose(&mut self, clk: OperandId, tick: u32) -> Result<bool, Halt> {
        let now = self.eval_lanes(clk, tick, 0, 1)?.lane(0);
        let before = self.eval_lanes(clk, tick - 1, 0, 1)?.lane(0);
        Ok(before == Logic::Zero && now == Logic::One)
    }

    pub(crate) fn pulled(&self, id: OperandId) -> Option<(u32, u32)> {
        self.pulls.get(&id).copied()
    }

    fn apply_pulls(&self, id: OperandId, raw: Rail, offset: u32, width: u32) -> Rail {
        match self.pulls.get(&id) {
            Some(&(up, down)) => raw.pull(up >> offset, down >> offset, width),
            None => raw,
        }
    }

    fn track_conflict(&mut self, id: OperandId, merged: Rail, tick: u32) -> Result<(), Halt> {
        let width = self.design.operand(id).width();
        let lanes = merged.conflicts() & lane_mask(width);
        let ticks = self.conflicts.entry(id).or_default();
        if lanes == 0 {
            ticks.remove(&tick);
            return Ok(());
        }
        ticks.insert(tick);
        let streak = (0..=tick).rev().take_while(|t| ticks.contains(t)).count() as u32;
        let operand = self.design.name(id).to_string();
        if streak > self.options.conflict_ticks {
            return Err(Halt::DriveConflict {
                operand,
                lanes,
                tick,
                streak,
            });
        }
        log::warn!("drive conflict on `{operand}` at tick {tick} (lanes {lanes:#x})");
        Ok(())
    }
}

/// Dual-rail evaluation of a gate function.
pub fn gate(func: GateFunc, inputs: &[Rail]) -> Rail {
    let a = inputs.first().copied().unwrap_or(Rail::FLOAT);
    let b = inputs.get(1).copied().unwrap_or(Rail::FLOAT);
    match func {
        GateFunc::And => a & b,
        GateFunc::Or => a | b,
        GateFunc::Nand => !(a & b),
        GateFunc::Nor => !(a | b),
        GateFunc::Xor => a ^ b,
        GateFunc::Not => !a,
        GateFunc::Buf => a,
    }
}
