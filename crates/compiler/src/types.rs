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

//! Value types and the source keywords that name them.

use strum::{Display, EnumString};

use crate::opcode::Family;

/// The closed set of value types. Types are compared by equality only; no coercion or widening
/// is ever performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DataType {
    Int,
    Double,
    String,
    Boolean,
    Void,
}

impl DataType {
    /// Number of local slots a variable of this type occupies.
    pub fn slot_width(self) -> u16 {
        match self {
            DataType::Double => 2,
            _ => 1,
        }
    }

    /// The single-symbol descriptor used in method signatures.
    pub fn descriptor(self) -> &'static str {
        match self {
            DataType::Int => "I",
            DataType::Double => "D",
            DataType::String => "Ljava/lang/String;",
            DataType::Boolean => "Z",
            DataType::Void => "V",
        }
    }

    /// The load/store/return instruction family for values of this type. Booleans travel as
    /// integers. `Void` has no family.
    pub fn family(self) -> Option<Family> {
        match self {
            DataType::Int | DataType::Boolean => Some(Family::Int),
            DataType::Double => Some(Family::Double),
            DataType::String => Some(Family::Reference),
            DataType::Void => None,
        }
    }

    /// Build a full method descriptor such as `(ID)Ljava/lang/String;`.
    pub fn method_descriptor(params: &[DataType], return_type: DataType) -> String {
        let mut descriptor = String::from("(");
        for param in params {
            descriptor.push_str(param.descriptor());
        }
        descriptor.push(')');
        descriptor.push_str(return_type.descriptor());
        descriptor
    }
}

/// Type keywords as they appear in source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
pub enum TypeKeyword {
    #[strum(serialize = "number")]
    Number,
    #[strum(serialize = "duplicate")]
    Duplicate,
    #[strum(serialize = "rope")]
    Rope,
    #[strum(serialize = "flag")]
    Flag,
    #[strum(serialize = "nothing")]
    Nothing,
}

impl TypeKeyword {
    pub fn data_type(self) -> DataType {
        match self {
            TypeKeyword::Number => DataType::Int,
            TypeKeyword::Duplicate => DataType::Double,
            TypeKeyword::Rope => DataType::String,
            TypeKeyword::Flag => DataType::Boolean,
            TypeKeyword::Nothing => DataType::Void,
        }
    }
}

/// Access qualifiers on method declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
pub enum Access {
    #[strum(serialize = "loud")]
    Loud,
    #[strum(serialize = "covered")]
    Covered,
    #[strum(serialize = "quite")]
    Quite,
}

impl Access {
    /// The qualifier written into the `.method` directive.
    pub fn directive(self) -> &'static str {
        match self {
            Access::Loud => "public",
            Access::Covered => "protected",
            Access::Quite => "private",
        }
    }
}
