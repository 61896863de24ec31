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

use std::collections::HashMap;

use crate::ast::NodeId;
use crate::scope::Symbol;
use crate::types::DataType;

/// Side tables filled by the checker and read by codegen: at most one type and one symbol per
/// node. Re-checking a node replaces its previous entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    types: HashMap<NodeId, DataType>,
    symbols: HashMap<NodeId, Symbol>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&self, id: NodeId) -> Option<DataType> {
        self.types.get(&id).copied()
    }

    pub fn symbol_of(&self, id: NodeId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub(crate) fn set_type(&mut self, id: NodeId, data_type: DataType) -> DataType {
        self.types.insert(id, data_type);
        data_type
    }

    pub(crate) fn set_symbol(&mut self, id: NodeId, symbol: Symbol) {
        self.symbols.insert(id, symbol);
    }

    pub fn typed_nodes(&self) -> usize {
        self.types.len()
    }

    pub fn bound_nodes(&self) -> usize {
        self.symbols.len()
    }
}
