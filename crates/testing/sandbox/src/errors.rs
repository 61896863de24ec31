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

use thiserror::Error;

/// Why a piece of assembly text was refused. Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: unknown instruction {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },
    #[error("line {line}: unsupported member {member}")]
    UnsupportedMember { line: usize, member: String },
    #[error("line {line}: label {label} defined twice")]
    DuplicateLabel { line: usize, label: String },
    #[error("method {method}: jump to undefined label {label}")]
    UndefinedLabel { method: String, label: String },
    #[error("method {method} has no .end method")]
    UnterminatedMethod { method: String },
    #[error("line {line}: instruction outside of a method")]
    OutsideMethod { line: usize },
    #[error("no .class directive")]
    MissingClass,
    #[error("line {line}: no method {target} in this class")]
    UnknownMethod { line: usize, target: String },
    #[error("method {method}: stack underflow at instruction {index}")]
    StackUnderflow { method: String, index: usize },
    #[error(
        "method {method}: instruction {index} reached with stack depth {found}, expected {expected}"
    )]
    StackMismatch {
        method: String,
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("method {method}: stack depth {depth} exceeds .limit stack {limit}")]
    StackLimit {
        method: String,
        depth: usize,
        limit: u16,
    },
    #[error("method {method}: local slot {slot} exceeds .limit locals {limit}")]
    LocalOutOfRange { method: String, slot: u16, limit: u16 },
    #[error("method {method}: execution can run past the last instruction")]
    FallsOffEnd { method: String },
    #[error("method {method}: return at instruction {index} does not match the descriptor")]
    BadReturn { method: String, index: usize },
}

/// Failures while interpreting an assembled class.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RunError {
    #[error("class has no main([Ljava/lang/String;)V")]
    NoEntryPoint,
    #[error("step limit of {0} exceeded")]
    StepLimit(u64),
    #[error("call depth limit of {0} exceeded")]
    CallDepth(usize),
    #[error("{method}: / by zero")]
    DivideByZero { method: String },
    #[error("{method}: expected {expected} at instruction {pc}")]
    TypeConfusion {
        method: String,
        pc: usize,
        expected: &'static str,
    },
    #[error("{method}: operand stack empty at instruction {pc}")]
    StackUnderflow { method: String, pc: usize },
    #[error("{method}: local slot {slot} is out of range")]
    BadLocal { method: String, slot: u16 },
    #[error("{method}: ran past the last instruction")]
    FellOffEnd { method: String },
}
