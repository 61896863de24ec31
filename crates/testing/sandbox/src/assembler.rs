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

//! A small assembler for the subset of Jasmin the compiler emits.
//!
//! Text goes in, an [`AssembledClass`] with labels and call targets resolved comes out. Every
//! method is then run through a word-counting stack verifier, so unbalanced code is refused here
//! rather than misbehaving at run time.

use std::collections::HashMap;

use calligraphy_compiler::{ArithOp, Assembler, Cond};
use tracing::{debug, trace};

use crate::errors::AssembleError;

/// Operand kinds as the verifier and interpreter see them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Int,
    Double,
    Reference,
}

impl Kind {
    /// Stack and local-slot words taken by a value of this kind.
    pub fn width(self) -> usize {
        match self {
            Kind::Double => 2,
            _ => 1,
        }
    }
}

/// A parsed method descriptor such as `(DI)D`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Kind>,
    pub returns: Option<Kind>,
}

impl Signature {
    pub fn parse(descriptor: &str) -> Option<Self> {
        let (params, ret) = descriptor.strip_prefix('(')?.split_once(')')?;
        let mut kinds = vec![];
        let mut rest = params;
        while !rest.is_empty() {
            let (kind, tail) = parse_field(rest)?;
            kinds.push(kind);
            rest = tail;
        }
        let returns = match ret {
            "V" => None,
            _ => match parse_field(ret)? {
                (kind, "") => Some(kind),
                _ => return None,
            },
        };
        Some(Self {
            params: kinds,
            returns,
        })
    }

    pub fn param_words(&self) -> usize {
        self.params.iter().map(|k| k.width()).sum()
    }
}

fn parse_field(s: &str) -> Option<(Kind, &str)> {
    match s.as_bytes().first()? {
        b'I' | b'Z' => Some((Kind::Int, &s[1..])),
        b'D' => Some((Kind::Double, &s[1..])),
        b'L' => {
            let end = s.find(';')?;
            Some((Kind::Reference, &s[end + 1..]))
        }
        b'[' => parse_field(&s[1..]).map(|(_, rest)| (Kind::Reference, rest)),
        _ => None,
    }
}

/// The `println` overloads the sandbox knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintKind {
    Int,
    Boolean,
    Double,
    String,
}

impl PrintKind {
    fn from_descriptor(descriptor: &str) -> Option<Self> {
        match descriptor {
            "(I)V" => Some(PrintKind::Int),
            "(Z)V" => Some(PrintKind::Boolean),
            "(D)V" => Some(PrintKind::Double),
            "(Ljava/lang/String;)V" => Some(PrintKind::String),
            _ => None,
        }
    }

    fn kind(self) -> Kind {
        match self {
            PrintKind::Int | PrintKind::Boolean => Kind::Int,
            PrintKind::Double => Kind::Double,
            PrintKind::String => Kind::Reference,
        }
    }
}

/// One resolved instruction. Jump targets are instruction indexes within the method, call
/// targets are method indexes within the class.
#[derive(Clone, Debug, PartialEq)]
pub enum Insn {
    PushInt(i32),
    PushDouble(f64),
    PushString(String),
    Load(Kind, u16),
    Store(Kind, u16),
    Arith(Kind, ArithOp),
    Iinc { slot: u16, delta: i16 },
    IfCmp(Cond, usize),
    If(Cond, usize),
    Dcmpg,
    Dcmpl,
    Goto(usize),
    GetOut,
    Println(PrintKind),
    CompareTo,
    InvokeStatic(usize),
    Return(Option<Kind>),
    Pop,
    Pop2,
}

impl Insn {
    fn target_mut(&mut self) -> Option<&mut usize> {
        match self {
            Insn::IfCmp(_, t) | Insn::If(_, t) | Insn::Goto(t) | Insn::InvokeStatic(t) => Some(t),
            _ => None,
        }
    }

    /// Words popped and pushed.
    fn stack_effect(&self, class: &AssembledClass) -> (usize, usize) {
        match self {
            Insn::PushInt(_) | Insn::PushString(_) | Insn::GetOut => (0, 1),
            Insn::PushDouble(_) => (0, 2),
            Insn::Load(kind, _) => (0, kind.width()),
            Insn::Store(kind, _) => (kind.width(), 0),
            Insn::Arith(kind, _) => (kind.width() * 2, kind.width()),
            Insn::Iinc { .. } | Insn::Goto(_) => (0, 0),
            Insn::IfCmp(..) | Insn::Pop2 => (2, 0),
            Insn::If(..) | Insn::Pop => (1, 0),
            Insn::Dcmpg | Insn::Dcmpl => (4, 1),
            Insn::Println(print) => (1 + print.kind().width(), 0),
            Insn::CompareTo => (2, 1),
            Insn::InvokeStatic(index) => {
                let signature = &class.methods[*index].signature;
                (
                    signature.param_words(),
                    signature.returns.map_or(0, Kind::width),
                )
            }
            Insn::Return(kind) => (kind.map_or(0, Kind::width), 0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodCode {
    pub name: String,
    pub descriptor: String,
    pub signature: Signature,
    pub stack_limit: u16,
    pub locals_limit: u16,
    pub code: Vec<Insn>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssembledClass {
    pub name: String,
    pub methods: Vec<MethodCode>,
}

impl AssembledClass {
    /// Index of the method with this name and descriptor.
    pub fn find(&self, name: &str, descriptor: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn method(&self, name: &str) -> Option<&MethodCode> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Assembles the compiler's Jasmin dialect into an [`AssembledClass`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JasminSubset;

impl Assembler for JasminSubset {
    type Output = AssembledClass;
    type Error = AssembleError;

    fn assemble(&self, source: &str) -> Result<AssembledClass, AssembleError> {
        assemble(source)
    }
}

enum Pending {
    Label(String),
    Call(String),
}

struct MethodInProgress {
    method: MethodCode,
    labels: HashMap<String, usize>,
    jumps: Vec<(usize, String)>,
}

struct CallFixup {
    line: usize,
    method: usize,
    index: usize,
    target: String,
}

pub fn assemble(source: &str) -> Result<AssembledClass, AssembleError> {
    let mut class_name = None;
    let mut methods = vec![];
    let mut current: Option<MethodInProgress> = None;
    let mut calls = vec![];

    for (number, raw) in source.lines().enumerate() {
        let line = number + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with(';') {
            continue;
        }

        if text.starts_with('.') {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            match tokens[0] {
                ".class" => {
                    let Some(name) = tokens.last().filter(|_| tokens.len() > 1) else {
                        return Err(syntax(line, ".class needs a name"));
                    };
                    class_name = Some(name.to_string());
                }
                ".super" => {}
                ".method" => {
                    if current.is_some() {
                        return Err(syntax(line, "nested .method"));
                    }
                    current = Some(begin_method(line, &tokens)?);
                }
                ".limit" => {
                    let Some(in_progress) = current.as_mut() else {
                        return Err(AssembleError::OutsideMethod { line });
                    };
                    let value = tokens
                        .get(2)
                        .and_then(|v| v.parse::<u16>().ok())
                        .ok_or_else(|| syntax(line, "bad .limit value"))?;
                    match tokens.get(1) {
                        Some(&"stack") => in_progress.method.stack_limit = value,
                        Some(&"locals") => in_progress.method.locals_limit = value,
                        _ => return Err(syntax(line, "unknown .limit")),
                    }
                }
                ".end" if tokens.get(1) == Some(&"method") => {
                    let Some(in_progress) = current.take() else {
                        return Err(syntax(line, ".end method without .method"));
                    };
                    methods.push(finish_method(in_progress)?);
                }
                other => return Err(syntax(line, &format!("unknown directive {other}"))),
            }
            continue;
        }

        let Some(in_progress) = current.as_mut() else {
            return Err(AssembleError::OutsideMethod { line });
        };

        if let Some(label) = text.strip_suffix(':') {
            let at = in_progress.method.code.len();
            if in_progress.labels.insert(label.to_string(), at).is_some() {
                return Err(AssembleError::DuplicateLabel {
                    line,
                    label: label.to_string(),
                });
            }
            continue;
        }

        let (mnemonic, operand) = match text.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (text, ""),
        };
        let (insn, pending) = parse_insn(line, mnemonic, operand)?;
        let index = in_progress.method.code.len();
        in_progress.method.code.push(insn);
        match pending {
            Some(Pending::Label(label)) => in_progress.jumps.push((index, label)),
            Some(Pending::Call(target)) => calls.push(CallFixup {
                line,
                method: methods.len(),
                index,
                target,
            }),
            None => {}
        }
    }

    if let Some(in_progress) = current {
        return Err(AssembleError::UnterminatedMethod {
            method: in_progress.method.name,
        });
    }
    let name = class_name.ok_or(AssembleError::MissingClass)?;
    let mut class = AssembledClass { name, methods };

    for call in calls {
        let resolved = resolve_call(&class, &call.target).ok_or(AssembleError::UnknownMethod {
            line: call.line,
            target: call.target.clone(),
        })?;
        if let Some(slot) = class.methods[call.method].code[call.index].target_mut() {
            *slot = resolved;
        }
    }

    for method in &class.methods {
        verify(&class, method)?;
    }
    debug!(class = %class.name, methods = class.methods.len(), "assembled class");
    Ok(class)
}

fn syntax(line: usize, message: &str) -> AssembleError {
    AssembleError::Syntax {
        line,
        message: message.to_string(),
    }
}

fn begin_method(line: usize, tokens: &[&str]) -> Result<MethodInProgress, AssembleError> {
    if !tokens.contains(&"static") {
        return Err(syntax(line, "only static methods are supported"));
    }
    let Some(head) = tokens.last().filter(|_| tokens.len() > 1) else {
        return Err(syntax(line, ".method needs a name"));
    };
    let Some(open) = head.find('(') else {
        return Err(syntax(line, "method has no descriptor"));
    };
    let (name, descriptor) = head.split_at(open);
    let signature =
        Signature::parse(descriptor).ok_or_else(|| syntax(line, "malformed descriptor"))?;
    trace!(name, descriptor, "method");
    Ok(MethodInProgress {
        method: MethodCode {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature,
            stack_limit: 0,
            locals_limit: 0,
            code: vec![],
        },
        labels: HashMap::new(),
        jumps: vec![],
    })
}

fn finish_method(mut in_progress: MethodInProgress) -> Result<MethodCode, AssembleError> {
    for (index, label) in in_progress.jumps {
        let Some(&target) = in_progress.labels.get(&label) else {
            return Err(AssembleError::UndefinedLabel {
                method: in_progress.method.name,
                label,
            });
        };
        if let Some(slot) = in_progress.method.code[index].target_mut() {
            *slot = target;
        }
    }
    Ok(in_progress.method)
}

fn resolve_call(class: &AssembledClass, target: &str) -> Option<usize> {
    let open = target.find('(')?;
    let (path, descriptor) = target.split_at(open);
    let (owner, name) = path.rsplit_once('/')?;
    if owner != class.name {
        return None;
    }
    class.find(name, descriptor)
}

fn parse_cond(suffix: &str) -> Option<Cond> {
    match suffix {
        "eq" => Some(Cond::Eq),
        "ne" => Some(Cond::Ne),
        "lt" => Some(Cond::Lt),
        "ge" => Some(Cond::Ge),
        "gt" => Some(Cond::Gt),
        "le" => Some(Cond::Le),
        _ => None,
    }
}

fn parse_kind(prefix: &str) -> Option<Kind> {
    match prefix {
        "i" => Some(Kind::Int),
        "d" => Some(Kind::Double),
        "a" => Some(Kind::Reference),
        _ => None,
    }
}

fn parse_arith(mnemonic: &str) -> Option<(Kind, ArithOp)> {
    let kind = parse_kind(mnemonic.get(..1)?).filter(|k| *k != Kind::Reference)?;
    let op = match mnemonic.get(1..)? {
        "add" => ArithOp::Add,
        "sub" => ArithOp::Sub,
        "mul" => ArithOp::Mul,
        "rem" => ArithOp::Mod,
        _ => return None,
    };
    Some((kind, op))
}

fn unquote(line: usize, literal: &str) -> Result<String, AssembleError> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .ok_or_else(|| syntax(line, "unterminated string"))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\')) => out.push(c),
            _ => return Err(syntax(line, "bad escape in string")),
        }
    }
    Ok(out)
}

fn parse_insn(
    line: usize,
    mnemonic: &str,
    operand: &str,
) -> Result<(Insn, Option<Pending>), AssembleError> {
    let int_operand = |low: i32, high: i32| {
        operand
            .parse::<i32>()
            .ok()
            .filter(|n| (low..=high).contains(n))
            .ok_or_else(|| syntax(line, &format!("bad operand for {mnemonic}: {operand}")))
    };
    let slot_operand = || {
        operand
            .parse::<u16>()
            .map_err(|_| syntax(line, &format!("bad slot for {mnemonic}: {operand}")))
    };
    let label = || {
        if operand.is_empty() {
            Err(syntax(line, &format!("{mnemonic} needs a label")))
        } else {
            Ok(Some(Pending::Label(operand.to_string())))
        }
    };

    let insn = match mnemonic {
        "iconst_m1" => Insn::PushInt(-1),
        "dconst_0" => Insn::PushDouble(0.0),
        "dconst_1" => Insn::PushDouble(1.0),
        "bipush" => Insn::PushInt(int_operand(i8::MIN.into(), i8::MAX.into())?),
        "sipush" => Insn::PushInt(int_operand(i16::MIN.into(), i16::MAX.into())?),
        "ldc" if operand.starts_with('"') => Insn::PushString(unquote(line, operand)?),
        "ldc" => Insn::PushInt(int_operand(i32::MIN, i32::MAX)?),
        "ldc2_w" => Insn::PushDouble(
            operand
                .parse::<f64>()
                .map_err(|_| syntax(line, &format!("bad double constant {operand}")))?,
        ),
        "iinc" => {
            let mut parts = operand.split_whitespace();
            let slot = parts.next().and_then(|s| s.parse::<u16>().ok());
            let delta = parts.next().and_then(|d| d.parse::<i16>().ok());
            match (slot, delta) {
                (Some(slot), Some(delta)) => Insn::Iinc { slot, delta },
                _ => return Err(syntax(line, "iinc needs a slot and a delta")),
            }
        }
        "dcmpg" => Insn::Dcmpg,
        "dcmpl" => Insn::Dcmpl,
        "goto" => return Ok((Insn::Goto(0), label()?)),
        "getstatic" => {
            if operand != "java/lang/System/out Ljava/io/PrintStream;" {
                return Err(AssembleError::UnsupportedMember {
                    line,
                    member: operand.to_string(),
                });
            }
            Insn::GetOut
        }
        "invokevirtual" => {
            if operand == "java/lang/String/compareTo(Ljava/lang/String;)I" {
                Insn::CompareTo
            } else {
                operand
                    .strip_prefix("java/io/PrintStream/println")
                    .and_then(PrintKind::from_descriptor)
                    .map(Insn::Println)
                    .ok_or_else(|| AssembleError::UnsupportedMember {
                        line,
                        member: operand.to_string(),
                    })?
            }
        }
        "invokestatic" => {
            return Ok((
                Insn::InvokeStatic(0),
                Some(Pending::Call(operand.to_string())),
            ));
        }
        "return" => Insn::Return(None),
        "ireturn" => Insn::Return(Some(Kind::Int)),
        "dreturn" => Insn::Return(Some(Kind::Double)),
        "areturn" => Insn::Return(Some(Kind::Reference)),
        "pop" => Insn::Pop,
        "pop2" => Insn::Pop2,
        m => {
            if let Some(n) = m.strip_prefix("iconst_") {
                match n.parse::<i32>() {
                    Ok(n @ 0..=5) => Insn::PushInt(n),
                    _ => return Err(unknown(line, m)),
                }
            } else if let Some(cond) = m.strip_prefix("if_icmp") {
                let cond = parse_cond(cond).ok_or_else(|| unknown(line, m))?;
                return Ok((Insn::IfCmp(cond, 0), label()?));
            } else if let Some(cond) = m.strip_prefix("if") {
                let cond = parse_cond(cond).ok_or_else(|| unknown(line, m))?;
                return Ok((Insn::If(cond, 0), label()?));
            } else if let Some(prefix) = m.strip_suffix("load").filter(|p| p.len() == 1) {
                let kind = parse_kind(prefix).ok_or_else(|| unknown(line, m))?;
                Insn::Load(kind, slot_operand()?)
            } else if let Some(prefix) = m.strip_suffix("store").filter(|p| p.len() == 1) {
                let kind = parse_kind(prefix).ok_or_else(|| unknown(line, m))?;
                Insn::Store(kind, slot_operand()?)
            } else if let Some((kind, op)) = parse_arith(m) {
                Insn::Arith(kind, op)
            } else {
                return Err(unknown(line, m));
            }
        }
    };
    Ok((insn, None))
}

fn unknown(line: usize, mnemonic: &str) -> AssembleError {
    AssembleError::UnknownInstruction {
        line,
        mnemonic: mnemonic.to_string(),
    }
}

/// Walk every reachable path through the method counting stack words. Each instruction must be
/// reached with one consistent depth, never underflow, stay within `.limit stack`, and touch
/// only slots below `.limit locals`.
fn verify(class: &AssembledClass, method: &MethodCode) -> Result<(), AssembleError> {
    let name = || method.name.clone();
    let mut depths: Vec<Option<usize>> = vec![None; method.code.len()];
    let mut work = vec![(0usize, 0usize)];

    while let Some((pc, depth)) = work.pop() {
        let Some(insn) = method.code.get(pc) else {
            return Err(AssembleError::FallsOffEnd { method: name() });
        };
        match depths[pc] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(AssembleError::StackMismatch {
                    method: name(),
                    index: pc,
                    expected: seen,
                    found: depth,
                });
            }
            None => depths[pc] = Some(depth),
        }

        let (pops, pushes) = insn.stack_effect(class);
        if depth < pops {
            return Err(AssembleError::StackUnderflow {
                method: name(),
                index: pc,
            });
        }
        let after = depth - pops + pushes;
        if after > usize::from(method.stack_limit) {
            return Err(AssembleError::StackLimit {
                method: name(),
                depth: after,
                limit: method.stack_limit,
            });
        }

        let touched = match insn {
            Insn::Load(kind, slot) | Insn::Store(kind, slot) => {
                Some(usize::from(*slot) + kind.width())
            }
            Insn::Iinc { slot, .. } => Some(usize::from(*slot) + 1),
            _ => None,
        };
        if let Some(end) = touched
            && end > usize::from(method.locals_limit)
        {
            return Err(AssembleError::LocalOutOfRange {
                method: name(),
                slot: u16::try_from(end - 1).unwrap_or(u16::MAX),
                limit: method.locals_limit,
            });
        }

        match insn {
            Insn::Return(kind) => {
                if *kind != method.signature.returns {
                    return Err(AssembleError::BadReturn {
                        method: name(),
                        index: pc,
                    });
                }
            }
            Insn::Goto(target) => work.push((*target, after)),
            Insn::IfCmp(_, target) | Insn::If(_, target) => {
                work.push((*target, after));
                work.push((pc + 1, after));
            }
            _ => work.push((pc + 1, after)),
        }
    }
    Ok(())
}
