// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Interprets an [`AssembledClass`] starting from its `main`, capturing printed lines.

use std::cmp::Ordering;

use calligraphy_compiler::{ArithOp, Cond};
use tracing::{debug, trace};

use crate::assembler::{AssembledClass, Insn, Kind, MethodCode, PrintKind};
use crate::errors::RunError;

const ENTRY_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Double(f64),
    Str(String),
    /// `System.out`.
    Out,
    Null,
    /// Unset local, or the upper half of a double.
    Top,
}

impl Value {
    fn width(&self) -> usize {
        match self {
            Value::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Runs assembled programs with a step budget and a call depth limit.
#[derive(Clone, Debug)]
pub struct Sandbox {
    step_limit: u64,
    max_call_depth: usize,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            step_limit: 1_000_000,
            max_call_depth: 512,
        }
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Run `main` and return every line it printed.
    pub fn run(&self, class: &AssembledClass) -> Result<Vec<String>, RunError> {
        let entry = class
            .find("main", ENTRY_DESCRIPTOR)
            .ok_or(RunError::NoEntryPoint)?;
        let mut machine = Machine {
            class,
            sandbox: self,
            output: vec![],
            steps: 0,
        };
        machine.invoke(entry, vec![Value::Null], 0)?;
        debug!(
            class = %class.name,
            lines = machine.output.len(),
            steps = machine.steps,
            "program finished"
        );
        Ok(machine.output)
    }
}

struct Machine<'a> {
    class: &'a AssembledClass,
    sandbox: &'a Sandbox,
    output: Vec<String>,
    steps: u64,
}

/// One activation: locals, operand stack and the method they belong to.
struct Frame<'a> {
    method: &'a MethodCode,
    locals: Vec<Value>,
    stack: Vec<Value>,
    pc: usize,
}

impl<'a> Frame<'a> {
    fn underflow(&self) -> RunError {
        RunError::StackUnderflow {
            method: self.method.name.clone(),
            pc: self.pc,
        }
    }

    fn confused(&self, expected: &'static str) -> RunError {
        RunError::TypeConfusion {
            method: self.method.name.clone(),
            pc: self.pc,
            expected,
        }
    }

    fn pop(&mut self) -> Result<Value, RunError> {
        self.stack.pop().ok_or_else(|| self.underflow())
    }

    fn pop_int(&mut self) -> Result<i32, RunError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            _ => Err(self.confused("int")),
        }
    }

    fn pop_double(&mut self) -> Result<f64, RunError> {
        match self.pop()? {
            Value::Double(d) => Ok(d),
            _ => Err(self.confused("double")),
        }
    }

    fn pop_string(&mut self) -> Result<String, RunError> {
        match self.pop()? {
            Value::Str(s) => Ok(s),
            _ => Err(self.confused("string")),
        }
    }

    fn local(&self, slot: u16) -> Result<&Value, RunError> {
        self.locals
            .get(usize::from(slot))
            .ok_or_else(|| RunError::BadLocal {
                method: self.method.name.clone(),
                slot,
            })
    }

    fn set_local(&mut self, slot: u16, value: Value) -> Result<(), RunError> {
        let index = usize::from(slot);
        let width = value.width();
        if index + width > self.locals.len() {
            return Err(RunError::BadLocal {
                method: self.method.name.clone(),
                slot,
            });
        }
        self.locals[index] = value;
        if width == 2 {
            self.locals[index + 1] = Value::Top;
        }
        Ok(())
    }
}

impl<'a> Machine<'a> {
    fn invoke(
        &mut self,
        index: usize,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Option<Value>, RunError> {
        if depth > self.sandbox.max_call_depth {
            return Err(RunError::CallDepth(self.sandbox.max_call_depth));
        }
        let class: &'a AssembledClass = self.class;
        let method = &class.methods[index];
        trace!(method = %method.name, depth, "invoke");

        let mut frame = Frame {
            method,
            locals: vec![Value::Top; usize::from(method.locals_limit)],
            stack: vec![],
            pc: 0,
        };
        let mut slot = 0u16;
        for arg in args {
            let width = arg.width() as u16;
            frame.set_local(slot, arg)?;
            slot += width;
        }

        loop {
            self.steps += 1;
            if self.steps > self.sandbox.step_limit {
                return Err(RunError::StepLimit(self.sandbox.step_limit));
            }
            let Some(insn) = method.code.get(frame.pc) else {
                return Err(RunError::FellOffEnd {
                    method: method.name.clone(),
                });
            };
            let mut next = frame.pc + 1;

            match insn {
                Insn::PushInt(n) => frame.stack.push(Value::Int(*n)),
                Insn::PushDouble(d) => frame.stack.push(Value::Double(*d)),
                Insn::PushString(s) => frame.stack.push(Value::Str(s.clone())),
                Insn::Load(kind, slot) => {
                    let value = frame.local(*slot)?.clone();
                    let matches = matches!(
                        (kind, &value),
                        (Kind::Int, Value::Int(_))
                            | (Kind::Double, Value::Double(_))
                            | (Kind::Reference, Value::Str(_) | Value::Null | Value::Out)
                    );
                    if !matches {
                        return Err(frame.confused(kind_name(*kind)));
                    }
                    frame.stack.push(value);
                }
                Insn::Store(kind, slot) => {
                    let value = match kind {
                        Kind::Int => Value::Int(frame.pop_int()?),
                        Kind::Double => Value::Double(frame.pop_double()?),
                        Kind::Reference => match frame.pop()? {
                            v @ (Value::Str(_) | Value::Null | Value::Out) => v,
                            _ => return Err(frame.confused("reference")),
                        },
                    };
                    frame.set_local(*slot, value)?;
                }
                Insn::Arith(Kind::Double, op) => {
                    let right = frame.pop_double()?;
                    let left = frame.pop_double()?;
                    let result = match op {
                        ArithOp::Add => left + right,
                        ArithOp::Sub => left - right,
                        ArithOp::Mul => left * right,
                        ArithOp::Mod => left % right,
                    };
                    frame.stack.push(Value::Double(result));
                }
                Insn::Arith(_, op) => {
                    let right = frame.pop_int()?;
                    let left = frame.pop_int()?;
                    let result = match op {
                        ArithOp::Add => left.wrapping_add(right),
                        ArithOp::Sub => left.wrapping_sub(right),
                        ArithOp::Mul => left.wrapping_mul(right),
                        ArithOp::Mod => {
                            if right == 0 {
                                return Err(RunError::DivideByZero {
                                    method: method.name.clone(),
                                });
                            }
                            left.wrapping_rem(right)
                        }
                    };
                    frame.stack.push(Value::Int(result));
                }
                Insn::Iinc { slot, delta } => {
                    let Value::Int(n) = frame.local(*slot)? else {
                        return Err(frame.confused("int"));
                    };
                    let n = n.wrapping_add(i32::from(*delta));
                    frame.set_local(*slot, Value::Int(n))?;
                }
                Insn::IfCmp(cond, target) => {
                    let right = frame.pop_int()?;
                    let left = frame.pop_int()?;
                    if holds(*cond, left.cmp(&right)) {
                        next = *target;
                    }
                }
                Insn::If(cond, target) => {
                    let value = frame.pop_int()?;
                    if holds(*cond, value.cmp(&0)) {
                        next = *target;
                    }
                }
                Insn::Dcmpg | Insn::Dcmpl => {
                    let right = frame.pop_double()?;
                    let left = frame.pop_double()?;
                    let result = match left.partial_cmp(&right) {
                        Some(Ordering::Less) => -1,
                        Some(Ordering::Equal) => 0,
                        Some(Ordering::Greater) => 1,
                        None if matches!(insn, Insn::Dcmpl) => -1,
                        None => 1,
                    };
                    frame.stack.push(Value::Int(result));
                }
                Insn::Goto(target) => next = *target,
                Insn::GetOut => frame.stack.push(Value::Out),
                Insn::Println(print) => {
                    let text = match print {
                        PrintKind::Int => frame.pop_int()?.to_string(),
                        PrintKind::Boolean => (frame.pop_int()? != 0).to_string(),
                        PrintKind::Double => format_double(frame.pop_double()?),
                        PrintKind::String => frame.pop_string()?,
                    };
                    if frame.pop()? != Value::Out {
                        return Err(frame.confused("java/io/PrintStream"));
                    }
                    self.output.push(text);
                }
                Insn::CompareTo => {
                    let right = frame.pop_string()?;
                    let left = frame.pop_string()?;
                    frame.stack.push(Value::Int(compare_to(&left, &right)));
                }
                Insn::InvokeStatic(callee) => {
                    let count = class.methods[*callee].signature.params.len();
                    if frame.stack.len() < count {
                        return Err(frame.underflow());
                    }
                    let args = frame.stack.split_off(frame.stack.len() - count);
                    if let Some(value) = self.invoke(*callee, args, depth + 1)? {
                        frame.stack.push(value);
                    }
                }
                Insn::Return(None) => return Ok(None),
                Insn::Return(Some(_)) => return frame.pop().map(Some),
                Insn::Pop => {
                    frame.pop()?;
                }
                Insn::Pop2 => {
                    if frame.pop()?.width() == 1 {
                        frame.pop()?;
                    }
                }
            }
            frame.pc = next;
        }
    }
}

fn kind_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Int => "int",
        Kind::Double => "double",
        Kind::Reference => "reference",
    }
}

fn holds(cond: Cond, ordering: Ordering) -> bool {
    match cond {
        Cond::Eq => ordering.is_eq(),
        Cond::Ne => ordering.is_ne(),
        Cond::Lt => ordering.is_lt(),
        Cond::Ge => ordering.is_ge(),
        Cond::Gt => ordering.is_gt(),
        Cond::Le => ordering.is_le(),
    }
}

/// `String.compareTo`: the first differing UTF-16 unit decides, otherwise the length.
fn compare_to(left: &str, right: &str) -> i32 {
    let mut l = left.encode_utf16();
    let mut r = right.encode_utf16();
    loop {
        match (l.next(), r.next()) {
            (Some(a), Some(b)) if a != b => return i32::from(a) - i32::from(b),
            (Some(_), Some(_)) => {}
            (Some(_), None) => return 1 + l.count() as i32,
            (None, Some(_)) => return -1 - r.count() as i32,
            (None, None) => return 0,
        }
    }
}

/// `Double.toString`: plain decimal in [1e-3, 1e7), scientific with `E` outside it.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = d.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{d:?}");
    }
    let scientific = format!("{d:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}
