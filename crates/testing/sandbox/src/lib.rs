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

//! Test support for the Calligraphy compiler: a Jasmin-subset assembler with a light stack
//! verifier, and an interpreter that runs the assembled class and captures what it prints.

mod assembler;
mod errors;
mod machine;

use std::sync::Once;

use calligraphy_compiler::{CompileOptions, Program, compile_and_assemble};
use eyre::WrapErr;

pub use crate::assembler::{
    AssembledClass, Insn, JasminSubset, Kind, MethodCode, PrintKind, Signature, assemble,
};
pub use crate::errors::{AssembleError, RunError};
pub use crate::machine::{Sandbox, Value, format_double};

static LOGGING_INIT: Once = Once::new();

/// Install a test-writer subscriber once per process.
pub fn init_logging() {
    LOGGING_INIT.call_once(|| {
        let main_subscriber = tracing_subscriber::fmt()
            .compact()
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(main_subscriber).ok();
    });
}

/// Compile, assemble and run a program with default options, returning its printed lines.
pub fn run_program(program: &Program) -> eyre::Result<Vec<String>> {
    run_program_with(program, CompileOptions::default(), &Sandbox::default())
}

pub fn run_program_with(
    program: &Program,
    options: CompileOptions,
    sandbox: &Sandbox,
) -> eyre::Result<Vec<String>> {
    init_logging();
    let class = compile_and_assemble(program, options, &JasminSubset)
        .wrap_err("building program")?;
    sandbox
        .run(&class)
        .wrap_err_with(|| format!("running class {}", class.name))
}
