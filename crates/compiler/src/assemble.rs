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
use tracing::debug;

use crate::ast::Program;
use crate::codegen::compile;
use crate::errors::CompileError;
use crate::options::CompileOptions;

/// Something that turns assembly text into a loadable class.
pub trait Assembler {
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn assemble(&self, source: &str) -> Result<Self::Output, Self::Error>;
}

/// The assembler refused the text we generated.
#[derive(Debug, Error)]
#[error("assembly of class {class_name} ({line_count} lines) was rejected: {message}")]
pub struct AssemblyError {
    pub class_name: String,
    pub line_count: usize,
    pub message: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Check, generate and assemble a program in one go.
pub fn compile_and_assemble<A: Assembler>(
    program: &Program,
    options: CompileOptions,
    assembler: &A,
) -> Result<A::Output, BuildError> {
    let assembly = compile(program, options)?;
    let text = assembly.to_text();
    debug!(class = %assembly.class_name, bytes = text.len(), "assembling");
    assembler.assemble(&text).map_err(|e| {
        BuildError::Assembly(AssemblyError {
            class_name: assembly.class_name.clone(),
            line_count: assembly.lines.len(),
            message: e.to_string(),
            source: Box::new(e),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;

    #[derive(Debug, Error)]
    #[error("no thanks")]
    struct Refusal;

    struct Refuses;

    impl Assembler for Refuses {
        type Output = ();
        type Error = Refusal;

        fn assemble(&self, _source: &str) -> Result<(), Refusal> {
            Err(Refusal)
        }
    }

    struct Echo;

    impl Assembler for Echo {
        type Output = String;
        type Error = Refusal;

        fn assemble(&self, source: &str) -> Result<String, Refusal> {
            Ok(source.to_string())
        }
    }

    #[test]
    fn test_rejection_is_wrapped() {
        let mut b = AstBuilder::new();
        let hello = b.string("hi");
        let print = b.print(hello);
        let program = b.program(vec![], vec![print]);
        let err = match compile_and_assemble(&program, CompileOptions::default(), &Refuses) {
            Err(BuildError::Assembly(err)) => err,
            other => panic!("expected an assembly error, got {other:?}"),
        };
        assert_eq!(err.class_name, "main");
        assert_eq!(err.message, "no thanks");
        assert!(err.to_string().contains("rejected: no thanks"));
    }

    #[test]
    fn test_compile_errors_stop_before_assembly() {
        let mut b = AstBuilder::new();
        let missing = b.var("nope");
        let print = b.print(missing);
        let program = b.program(vec![], vec![print]);
        let err = compile_and_assemble(&program, CompileOptions::default(), &Echo).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Compile(CompileError::UnknownVariable(_, _))
        ));
    }

    #[test]
    fn test_text_is_handed_over() {
        let mut b = AstBuilder::new();
        let hello = b.string("hi");
        let print = b.print(hello);
        let program = b.program(vec![], vec![print]);
        let text = compile_and_assemble(&program, CompileOptions::default(), &Echo).unwrap();
        assert!(text.starts_with(".class public main\n"));
        assert!(text.contains("ldc \"hi\"\n"));
    }
}
