// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The predeclared type names.
//!
//! Builtins are ordinary identifiers to the lexer; the parser looks them up
//! here when it builds a type.

/// A predeclared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    Any,
    Bool,
    Byte,
    Bytes,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Map,
    Vector,
    Array,
}

impl BuiltinType {
    /// Every builtin, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::Any,
        Self::Bool,
        Self::Byte,
        Self::Bytes,
        Self::String,
        Self::Int,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Uint,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Float32,
        Self::Float64,
        Self::Map,
        Self::Vector,
        Self::Array,
    ];

    /// Looks up a builtin by name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.as_str() == name)
    }

    /// Returns the source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Map => "map",
            Self::Vector => "vector",
            Self::Array => "array",
        }
    }

    /// `byte` and every sized or unsized integer.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Int
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
        )
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_number(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// `map`, `vector` and `array`, which take type arguments.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Map | Self::Vector | Self::Array)
    }
}

impl std::fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
