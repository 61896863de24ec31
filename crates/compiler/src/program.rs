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

use itertools::Itertools;

use crate::opcode::{Directive, Line};

/// The result of compilation: the ordered lines of one class.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub class_name: String,
    pub lines: Vec<Line>,
}

impl Assembly {
    /// The text handed to an assembler, one line per instruction, label or directive.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.iter().join("\n");
        text.push('\n');
        text
    }

    /// The lines of the named method between its `.limit` directives and `.end method`.
    pub fn method_body(&self, name: &str) -> Option<&[Line]> {
        let start = self.lines.iter().position(|l| {
            matches!(l, Line::Directive(Directive::Method { name: n, .. }) if n == name)
        })?;
        let body_start = self.lines[start + 1..]
            .iter()
            .position(|l| {
                !matches!(
                    l,
                    Line::Directive(Directive::LimitStack(_) | Directive::LimitLocals(_))
                )
            })
            .map(|p| start + 1 + p)?;
        let end = self.lines[body_start..]
            .iter()
            .position(|l| matches!(l, Line::Directive(Directive::EndMethod)))
            .map(|p| body_start + p)?;
        Some(&self.lines[body_start..end])
    }

    /// Names of all methods, in emission order.
    pub fn method_names(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                Line::Directive(Directive::Method { name, .. }) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Display for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
