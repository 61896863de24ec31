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

/// The syntax tree handed over by the parser, checked by the checker and converted by codegen
/// into assembly lines.
use std::fmt::Display;

use strum::EnumString;

/// A stable identity for a node, assigned once when the tree is built. Annotations are keyed by
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// (line, column) in the physical source.
pub type LineCol = (usize, usize);

/// A keyword token kept as text; the checker decides what it means.
#[derive(Debug, PartialEq, Clone)]
pub struct Keyword {
    pub text: String,
    pub line_col: LineCol,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub methods: Vec<MethodDecl>,
    /// Top-level statements, wrapped into the entry point.
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodDecl {
    pub id: NodeId,
    pub line_col: LineCol,
    pub access: Option<Keyword>,
    pub return_type: Keyword,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Param {
    pub id: NodeId,
    pub line_col: LineCol,
    pub node: ParamNode,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ParamNode {
    /// `number x`: declares a binding in the method scope.
    Declared { type_kw: Keyword, name: String },
    /// An expression in parameter position. Typed, but binds nothing.
    Expr(Expr),
}

/// The arithmetic operators. `Mod` is spelled `/` in source and lowers to a remainder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Mod,
}

impl Display for ArithOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Mod => write!(f, "/"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumString)]
pub enum Comparator {
    #[strum(serialize = "~~")]
    Eq,
    #[strum(serialize = "!~")]
    Ne,
    #[strum(serialize = "above")]
    Gt,
    #[strum(serialize = "below")]
    Lt,
}

impl Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "~~"),
            Self::Ne => write!(f, "!~"),
            Self::Gt => write!(f, "above"),
            Self::Lt => write!(f, "below"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub line_col: LineCol,
    pub node: ExprNode,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprNode {
    Int(i32),
    Double(f64),
    Bool(bool),
    /// String literal contents, without the surrounding quotes.
    Str(String),
    Var(String),
    Binary(ArithOp, Box<Expr>, Box<Expr>),
    Compare(Comparator, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, PartialEq, Clone)]
pub struct CondArm {
    pub condition: Expr,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElseArm {
    pub statements: Vec<Stmt>,
}

/// The `left op right` test of a `for` header.
#[derive(Debug, PartialEq, Clone)]
pub struct LoopCondition {
    pub id: NodeId,
    pub line_col: LineCol,
    pub op: Comparator,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub node: StmtNode,
    /// The position from the physical source code.
    pub line_col: LineCol,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StmtNode {
    Declare {
        type_kw: Keyword,
        name: String,
        init: Option<Expr>,
    },
    /// Re-assignment of an existing variable.
    Assign {
        name: String,
        value: Expr,
    },
    Cond {
        arms: Vec<CondArm>,
        otherwise: Option<ElseArm>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        init: Box<Stmt>,
        condition: LoopCondition,
        step: Box<Stmt>,
        body: Vec<Stmt>,
    },
    Print(Expr),
    Return(Option<Expr>),
    Increment(String),
    Decrement(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl StmtNode {
    pub fn is_value_return(&self) -> bool {
        matches!(self, StmtNode::Return(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_comparator_tokens() {
        assert_eq!(Comparator::from_str("~~").unwrap(), Comparator::Eq);
        assert_eq!(Comparator::from_str("!~").unwrap(), Comparator::Ne);
        assert_eq!(Comparator::from_str("above").unwrap(), Comparator::Gt);
        assert_eq!(Comparator::from_str("below").unwrap(), Comparator::Lt);
        assert!(Comparator::from_str("==").is_err());
        assert_eq!(Comparator::Gt.to_string(), "above");
    }
}
