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

use tracing::{trace, warn};

use crate::types::DataType;

/// What a name resolves to. Variables and methods share one namespace per scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Variable {
        name: String,
        data_type: DataType,
        /// First local slot; doubles also own `slot + 1`.
        slot: u16,
    },
    Method {
        name: String,
        return_type: DataType,
        params: Vec<DataType>,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable { name, .. } | Symbol::Method { name, .. } => name,
        }
    }
}

/// Handle to a scope record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
struct ScopeRecord {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Symbol>,
    next_slot: u16,
}

/// Nested lexical environments, kept as an arena of records linked to their parents.
///
/// A new scope starts allocating slots where its parent's counter stood when it was opened.
/// Closing a scope never gives its slots back to the parent's counter, but sibling scopes
/// opened from the same parent start from the same slot.
#[derive(Debug, Clone)]
pub struct Scopes {
    records: Vec<ScopeRecord>,
    current: ScopeId,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            records: vec![ScopeRecord {
                parent: None,
                symbols: HashMap::new(),
                next_slot: 0,
            }],
            current: ScopeId(0),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// How many scopes deep we are; the root is depth 0.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.current;
        while let Some(parent) = self.records[scope.0].parent {
            depth += 1;
            scope = parent;
        }
        depth
    }

    /// Start a new lexical scope under the current one.
    pub fn open_scope(&mut self) -> ScopeId {
        let next_slot = self.records[self.current.0].next_slot;
        let id = ScopeId(self.records.len());
        self.records.push(ScopeRecord {
            parent: Some(self.current),
            symbols: HashMap::new(),
            next_slot,
        });
        self.current = id;
        trace!(scope = id.0, next_slot, "opened scope");
        id
    }

    /// Return to the parent of the current scope.
    pub fn close_scope(&mut self) {
        match self.records[self.current.0].parent {
            Some(parent) => {
                trace!(scope = self.current.0, "closed scope");
                self.current = parent;
            }
            None => warn!("attempted to close the root scope"),
        }
    }

    /// The slot the next variable declared in the current scope will receive.
    pub fn next_free_slot(&self) -> u16 {
        self.records[self.current.0].next_slot
    }

    /// Declare a variable in the current scope, allocating its slot(s).
    /// Returns None if the name is already declared directly in this scope.
    pub fn declare_variable(&mut self, name: &str, data_type: DataType) -> Option<Symbol> {
        let record = &mut self.records[self.current.0];
        if record.symbols.contains_key(name) {
            return None;
        }
        let slot = record.next_slot;
        record.next_slot += data_type.slot_width();
        let symbol = Symbol::Variable {
            name: name.to_string(),
            data_type,
            slot,
        };
        record.symbols.insert(name.to_string(), symbol.clone());
        trace!(name, %data_type, slot, "declared variable");
        Some(symbol)
    }

    /// Take slots in the current scope without binding a name to them, returning the first.
    pub fn reserve_slots(&mut self, data_type: DataType) -> u16 {
        let record = &mut self.records[self.current.0];
        let slot = record.next_slot;
        record.next_slot += data_type.slot_width();
        trace!(%data_type, slot, "reserved anonymous slot");
        slot
    }

    /// Declare a method in the current scope. Methods take no slots.
    /// Returns None if the name is already declared directly in this scope.
    pub fn declare_method(
        &mut self,
        name: &str,
        return_type: DataType,
        params: Vec<DataType>,
    ) -> Option<Symbol> {
        let record = &mut self.records[self.current.0];
        if record.symbols.contains_key(name) {
            return None;
        }
        let symbol = Symbol::Method {
            name: name.to_string(),
            return_type,
            params,
        };
        record.symbols.insert(name.to_string(), symbol.clone());
        Some(symbol)
    }

    /// Resolve a name through the current scope and then its parents. Never fails; the caller
    /// decides what a missing name means.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let record = &self.records[id.0];
            if let Some(symbol) = record.symbols.get(name) {
                return Some(symbol);
            }
            scope = record.parent;
        }
        None
    }
}
