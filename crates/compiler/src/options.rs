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

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompileOptions {
    /// Name of the emitted class, and the owner used for every static call.
    pub class_name: String,
    /// Operand stack limit written for every method. Not derived from the code.
    pub stack_limit: u16,
    /// Local slot limit written for every method. Not derived from the code.
    pub locals_limit: u16,
    /// Whether to wrap the top-level statements into `main([Ljava/lang/String;)V`.
    pub entry_point: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            class_name: "main".to_string(),
            stack_limit: 99,
            locals_limit: 99,
            entry_point: true,
        }
    }
}
