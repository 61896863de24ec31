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

use std::fmt::Display;

use thiserror::Error;

use crate::ast::{LineCol, NodeId};
use crate::types::DataType;

/// Where in the source a compile error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileContext {
    pub line_col: LineCol,
}

impl CompileContext {
    pub fn new(line_col: LineCol) -> Self {
        Self { line_col }
    }
}

impl Display for CompileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} col {}", self.line_col.0, self.line_col.1)
    }
}

/// Errors raised while checking or generating a program. The first one aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("{0}: unknown variable {1}")]
    UnknownVariable(CompileContext, String),
    #[error("{0}: unknown method {1}")]
    UnknownMethod(CompileContext, String),
    #[error("{0}: {1} names a method, not a variable")]
    NotAVariable(CompileContext, String),
    #[error("{0}: {1} names a variable, not a method")]
    NotAMethod(CompileContext, String),
    #[error("{context}: type mismatch, expected {expected} but found {found}")]
    TypeMismatch {
        context: CompileContext,
        expected: DataType,
        found: DataType,
    },
    #[error("{0}: expected a BOOLEAN condition, found {1}")]
    NonBooleanCondition(CompileContext, DataType),
    #[error("{0}: method {1} has no access qualifier")]
    MissingAccessQualifier(CompileContext, String),
    #[error("{0}: unknown access qualifier {1}")]
    UnknownAccessQualifier(CompileContext, String),
    #[error("{0}: unknown type keyword {1}")]
    UnknownTypeKeyword(CompileContext, String),
    #[error("{0}: variable {1} cannot be declared VOID")]
    VoidVariable(CompileContext, String),
    #[error("{0}: method {1} must end with a return statement")]
    MissingReturn(CompileContext, String),
    #[error("{0}: return outside of a method")]
    ReturnOutsideMethod(CompileContext),
    #[error("{context}: method {method} takes {expected} argument(s), {found} given")]
    ArgumentCount {
        context: CompileContext,
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("{0}: duplicate variable in scope: {1}")]
    DuplicateVariable(CompileContext, String),
    #[error("{0}: duplicate method: {1}")]
    DuplicateMethod(CompileContext, String),
    #[error("{0}: cannot step {1} of type {2}, only NUMBER variables can be stepped")]
    NonIntegerStep(CompileContext, String, DataType),
    #[error("{context}: {operation} is not supported for {data_type}")]
    UnsupportedOperand {
        context: CompileContext,
        operation: String,
        data_type: DataType,
    },
    #[error("{0}: a VOID value cannot be used here")]
    VoidValue(CompileContext),
    #[error("{0}: node {1:?} was never annotated by the checker")]
    MissingAnnotation(CompileContext, NodeId),
}

impl CompileError {
    pub fn context(&self) -> &CompileContext {
        match self {
            CompileError::UnknownVariable(c, _)
            | CompileError::UnknownMethod(c, _)
            | CompileError::NotAVariable(c, _)
            | CompileError::NotAMethod(c, _)
            | CompileError::NonBooleanCondition(c, _)
            | CompileError::MissingAccessQualifier(c, _)
            | CompileError::UnknownAccessQualifier(c, _)
            | CompileError::UnknownTypeKeyword(c, _)
            | CompileError::VoidVariable(c, _)
            | CompileError::MissingReturn(c, _)
            | CompileError::ReturnOutsideMethod(c)
            | CompileError::DuplicateVariable(c, _)
            | CompileError::DuplicateMethod(c, _)
            | CompileError::NonIntegerStep(c, _, _)
            | CompileError::VoidValue(c)
            | CompileError::MissingAnnotation(c, _) => c,
            CompileError::TypeMismatch { context, .. }
            | CompileError::ArgumentCount { context, .. }
            | CompileError::UnsupportedOperand { context, .. } => context,
        }
    }
}
