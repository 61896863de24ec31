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

//! The instructions and directives codegen emits, and their textual form.

use std::fmt::Display;

use crate::ast::{ArithOp, Comparator};
use crate::labels::Label;

/// Instruction families for loads, stores, arithmetic and returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Int,
    Double,
    Reference,
}

impl Family {
    fn prefix(self) -> &'static str {
        match self {
            Family::Int => "i",
            Family::Double => "d",
            Family::Reference => "a",
        }
    }
}

/// Branch conditions, shared by `if<cc>` and `if_icmp<cc>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl Cond {
    pub fn negate(self) -> Self {
        match self {
            Cond::Eq => Cond::Ne,
            Cond::Ne => Cond::Eq,
            Cond::Lt => Cond::Ge,
            Cond::Ge => Cond::Lt,
            Cond::Gt => Cond::Le,
            Cond::Le => Cond::Gt,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Ge => "ge",
            Cond::Gt => "gt",
            Cond::Le => "le",
        }
    }
}

impl From<Comparator> for Cond {
    fn from(value: Comparator) -> Self {
        match value {
            Comparator::Eq => Cond::Eq,
            Comparator::Ne => Cond::Ne,
            Comparator::Gt => Cond::Gt,
            Comparator::Lt => Cond::Lt,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Rendered as the shortest constant push for the value.
    PushInt(i32),
    PushDouble(f64),
    PushString(String),
    Load(Family, u16),
    Store(Family, u16),
    Arith(Family, ArithOp),
    Iinc { slot: u16, delta: i16 },
    /// `if_icmp<cc>`: compare two ints.
    IfCmp(Cond, Label),
    /// `if<cc>`: compare one int against zero.
    If(Cond, Label),
    /// Compare two doubles; an unordered pair gives 1.
    Dcmpg,
    /// Compare two doubles; an unordered pair gives -1.
    Dcmpl,
    Goto(Label),
    GetStatic { field: String, descriptor: String },
    InvokeVirtual { method: String, descriptor: String },
    InvokeStatic { method: String, descriptor: String },
    /// `None` is the bare `return` of a void method.
    Return(Option<Family>),
    Pop,
    Pop2,
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::PushInt(-1) => write!(f, "iconst_m1"),
            Op::PushInt(n @ 0..=5) => write!(f, "iconst_{n}"),
            Op::PushInt(n) if i8::try_from(*n).is_ok() => write!(f, "bipush {n}"),
            Op::PushInt(n) if i16::try_from(*n).is_ok() => write!(f, "sipush {n}"),
            Op::PushInt(n) => write!(f, "ldc {n}"),
            Op::PushDouble(d) if d.to_bits() == 0f64.to_bits() => write!(f, "dconst_0"),
            Op::PushDouble(d) if *d == 1.0 => write!(f, "dconst_1"),
            Op::PushDouble(d) => write!(f, "ldc2_w {d:?}"),
            Op::PushString(s) => write!(f, "ldc {}", quote(s)),
            Op::Load(family, slot) => write!(f, "{}load {slot}", family.prefix()),
            Op::Store(family, slot) => write!(f, "{}store {slot}", family.prefix()),
            Op::Arith(family, op) => {
                let mnemonic = match op {
                    ArithOp::Add => "add",
                    ArithOp::Sub => "sub",
                    ArithOp::Mul => "mul",
                    ArithOp::Mod => "rem",
                };
                write!(f, "{}{mnemonic}", family.prefix())
            }
            Op::Iinc { slot, delta } => write!(f, "iinc {slot} {delta}"),
            Op::IfCmp(cond, label) => write!(f, "if_icmp{} {label}", cond.suffix()),
            Op::If(cond, label) => write!(f, "if{} {label}", cond.suffix()),
            Op::Dcmpg => write!(f, "dcmpg"),
            Op::Dcmpl => write!(f, "dcmpl"),
            Op::Goto(label) => write!(f, "goto {label}"),
            Op::GetStatic { field, descriptor } => write!(f, "getstatic {field} {descriptor}"),
            Op::InvokeVirtual { method, descriptor } => {
                write!(f, "invokevirtual {method}{descriptor}")
            }
            Op::InvokeStatic { method, descriptor } => {
                write!(f, "invokestatic {method}{descriptor}")
            }
            Op::Return(None) => write!(f, "return"),
            Op::Return(Some(family)) => write!(f, "{}return", family.prefix()),
            Op::Pop => write!(f, "pop"),
            Op::Pop2 => write!(f, "pop2"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Class { access: String, name: String },
    Super(String),
    Method {
        access: String,
        name: String,
        descriptor: String,
    },
    LimitStack(u16),
    LimitLocals(u16),
    EndMethod,
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::Class { access, name } => write!(f, ".class {access} {name}"),
            Directive::Super(name) => write!(f, ".super {name}"),
            Directive::Method {
                access,
                name,
                descriptor,
            } => write!(f, ".method {access} static {name}{descriptor}"),
            Directive::LimitStack(n) => write!(f, ".limit stack {n}"),
            Directive::LimitLocals(n) => write!(f, ".limit locals {n}"),
            Directive::EndMethod => write!(f, ".end method"),
        }
    }
}

/// One line of generated assembly.
#[derive(Clone, Debug, PartialEq)]
pub enum Line {
    Directive(Directive),
    Label(Label),
    Op(Op),
    Blank,
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Directive(d) => write!(f, "{d}"),
            Line::Label(l) => write!(f, "{l}:"),
            Line::Op(op) => write!(f, "{op}"),
            Line::Blank => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(-1, "iconst_m1"; "minus one")]
    #[test_case(0, "iconst_0"; "zero")]
    #[test_case(5, "iconst_5"; "five")]
    #[test_case(6, "bipush 6"; "byte")]
    #[test_case(-2, "bipush -2"; "negative byte")]
    #[test_case(1000, "sipush 1000"; "short")]
    #[test_case(100_000, "ldc 100000"; "constant pool")]
    fn test_int_push_forms(value: i32, expected: &str) {
        assert_eq!(Op::PushInt(value).to_string(), expected);
    }

    #[test]
    fn test_double_push_forms() {
        assert_eq!(Op::PushDouble(0.0).to_string(), "dconst_0");
        assert_eq!(Op::PushDouble(1.0).to_string(), "dconst_1");
        assert_eq!(Op::PushDouble(2.5).to_string(), "ldc2_w 2.5");
        assert_eq!(Op::PushDouble(-0.0).to_string(), "ldc2_w -0.0");
    }

    #[test]
    fn test_string_literals_are_escaped() {
        assert_eq!(
            Op::PushString("say \"hi\"".to_string()).to_string(),
            "ldc \"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_family_mnemonics() {
        assert_eq!(Op::Load(Family::Double, 3).to_string(), "dload 3");
        assert_eq!(Op::Store(Family::Reference, 1).to_string(), "astore 1");
        assert_eq!(Op::Arith(Family::Int, ArithOp::Mod).to_string(), "irem");
        assert_eq!(Op::Return(Some(Family::Double)).to_string(), "dreturn");
        assert_eq!(Op::Return(None).to_string(), "return");
        assert_eq!(Op::Iinc { slot: 2, delta: -1 }.to_string(), "iinc 2 -1");
    }

    #[test]
    fn test_branches() {
        assert_eq!(Op::IfCmp(Cond::Ge, Label(4)).to_string(), "if_icmpge L4");
        assert_eq!(Op::If(Cond::Eq, Label(1)).to_string(), "ifeq L1");
        assert_eq!(Cond::from(Comparator::Lt).negate(), Cond::Ge);
        assert_eq!(Cond::from(Comparator::Gt).negate(), Cond::Le);
        assert_eq!(Line::Label(Label(9)).to_string(), "L9:");
        assert_eq!(Op::Dcmpl.to_string(), "dcmpl");
    }
}
