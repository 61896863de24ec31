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

//! Semantic checking and stack-machine code generation for Calligraphy syntax trees.
//!
//! The parser lives elsewhere and hands over a tree built with [`AstBuilder`]. [`check`] resolves
//! names and types into [`Annotations`]; [`generate`] lowers the tree plus annotations into
//! Jasmin-style [`Assembly`] text. [`compile`] runs both passes.

mod annotations;
mod assemble;
mod ast;
mod builder;
mod checker;
mod codegen;
mod errors;
mod labels;
mod opcode;
mod options;
mod program;
mod scope;
mod types;

pub use crate::annotations::Annotations;
pub use crate::assemble::{Assembler, AssemblyError, BuildError, compile_and_assemble};
pub use crate::ast::{
    ArithOp, Comparator, CondArm, ElseArm, Expr, ExprNode, Keyword, LineCol, LoopCondition,
    MethodDecl, NodeId, Param, ParamNode, Program, Stmt, StmtNode,
};
pub use crate::builder::AstBuilder;
pub use crate::checker::{Checker, check};
pub use crate::codegen::{CodegenState, compile, generate};
pub use crate::errors::{CompileContext, CompileError};
pub use crate::labels::{Label, LabelAllocator};
pub use crate::opcode::{Cond, Directive, Family, Line, Op};
pub use crate::options::CompileOptions;
pub use crate::program::Assembly;
pub use crate::scope::{ScopeId, Scopes, Symbol};
pub use crate::types::{Access, DataType, TypeKeyword};
