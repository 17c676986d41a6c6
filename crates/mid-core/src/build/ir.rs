// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The intermediate representation handed to generators.
//!
//! **DDD Context:** Build
//!
//! The IR is a plain tree of owned values: no positions, no scopes, no
//! handles into a symbol table. Everything a generator needs has already been
//! resolved by the time [`build`](super::build) returns, so the tree
//! serialises losslessly as JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Tag;
use crate::ast;

/// Errors from encoding or decoding the IR.
#[derive(Debug, Error)]
pub enum IrError {
    #[error("cannot encode IR: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("cannot decode IR: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A field declared with more than one name has no single name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field declares {} names: {}", .names.len(), .names.join(", "))]
pub struct AmbiguousName {
    pub names: Vec<String>,
}

// ============================================================================
// Containers
// ============================================================================

/// Every package of a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ir {
    /// Sorted by name.
    pub packages: Vec<Package>,
}

impl Ir {
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|package| package.name == name)
    }

    /// Encodes the IR as pretty-printed JSON.
    ///
    /// Every map in the IR is ordered, so equal values encode identically.
    pub fn encode(&self) -> Result<String, IrError> {
        serde_json::to_string_pretty(self).map_err(IrError::Encode)
    }

    pub fn decode(json: &str) -> Result<Self, IrError> {
        serde_json::from_str(json).map_err(IrError::Decode)
    }

    /// Gives every bean the id `allocate` returns for its `pkg.Bean` key.
    pub fn assign_bean_ids(&mut self, mut allocate: impl FnMut(&str) -> u32) {
        for package in &mut self.packages {
            for file in &mut package.files {
                for bean in &mut file.beans {
                    let key = format!("{}.{}", package.name, bean.name);
                    bean.id = Some(allocate(&key));
                }
            }
        }
    }
}

/// One package: its files and the packages they import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    /// Import path by package id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: BTreeMap<String, String>,
    /// Sorted by filename.
    pub files: Vec<File>,
}

impl Package {
    /// Finds a bean declared in any file of the package.
    #[must_use]
    pub fn find_bean(&self, name: &str) -> Option<&Bean> {
        self.files
            .iter()
            .flat_map(|file| &file.beans)
            .find(|bean| bean.name == name)
    }

    pub fn beans(&self) -> impl Iterator<Item = &Bean> {
        self.files.iter().flat_map(|file| &file.beans)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub package: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beans: Vec<Bean>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decls: Vec<GenDecl>,
    /// Names left unresolved after linking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanKind {
    Struct,
    Protocol,
    Service,
    Enum,
}

impl From<ast::BeanKind> for BeanKind {
    fn from(kind: ast::BeanKind) -> Self {
        match kind {
            ast::BeanKind::Struct => Self::Struct,
            ast::BeanKind::Protocol => Self::Protocol,
            ast::BeanKind::Service => Self::Service,
            ast::BeanKind::Enum => Self::Enum,
        }
    }
}

impl fmt::Display for BeanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Struct => "struct",
            Self::Protocol => "protocol",
            Self::Service => "service",
            Self::Enum => "enum",
        })
    }
}

/// A struct, protocol, service or enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bean {
    /// Set by [`Ir::assign_bean_ids`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub kind: BeanKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub name: String,
    /// The types named by `extends` markers, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<Type>,
    #[serde(default, skip_serializing_if = "Tag::is_empty")]
    pub tag: Tag,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Bean {
    /// Finds a field, method or member by name.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.names.iter().any(|n| n == name))
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn tag_value(&self, key: &str) -> String {
        self.tag.get(key)
    }

    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tag.has_key(key)
    }
}

/// A field, service method or enum member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    /// `required` / `optional` markers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Absent for enum members.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub ty: Option<Type>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// An enum member's value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
    #[serde(default, skip_serializing_if = "Tag::is_empty")]
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Field {
    /// Returns the field's only name, `None` for an unnamed parameter.
    pub fn name(&self) -> Result<Option<&str>, AmbiguousName> {
        match self.names.as_slice() {
            [] => Ok(None),
            [name] => Ok(Some(name.as_str())),
            names => Err(AmbiguousName {
                names: names.to_vec(),
            }),
        }
    }

    /// Returns the raw literal text of an enum member's value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.default {
            Some(Expr::Lit { value, .. }) => Some(value.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag_value(&self, key: &str) -> String {
        self.tag.get(key)
    }

    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tag.has_key(key)
    }

    /// Sets `key` in the field's tag.
    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tag.set(key, value);
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.options.iter().any(|option| option == "required")
    }
}

/// The `import` and `const` declarations of one `GenDecl`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenDecl {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consts: Vec<ConstSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    /// The alias, `.` or `_`; empty when none was given.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// The unquoted import path.
    pub package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub name: String,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

// ============================================================================
// Types and values
// ============================================================================

/// A lowered type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Type {
    Basic {
        name: String,
    },
    Array {
        elem: Box<Type>,
        size: ArraySize,
    },
    Vector {
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    /// A named bean type. `package` is empty for a local name.
    Struct {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        package: String,
        name: String,
    },
    Func {
        #[serde(default)]
        params: Vec<Field>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Box<Type>>,
    },
    /// Lowered from a malformed type.
    Invalid,
}

const INT_TYPES: [&str; 11] = [
    "byte", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64",
];

impl Type {
    fn basic_name(&self) -> Option<&str> {
        match self {
            Self::Basic { name } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        self.basic_name().is_some_and(|name| INT_TYPES.contains(&name))
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self.basic_name(), Some("float32" | "float64"))
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.basic_name() == Some("bool")
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.basic_name() == Some("string")
    }

    #[must_use]
    pub const fn is_struct(&self) -> bool {
        matches!(self, Self::Struct { .. })
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// `bytes` counts as a vector of bytes.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector { .. }) || self.basic_name() == Some("bytes")
    }

    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map { .. })
    }

    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns a struct type's name joined to its package by `sep`, or just
    /// the name when it is local. Other types render as with `Display`.
    #[must_use]
    pub fn qualified(&self, sep: &str) -> String {
        match self {
            Self::Struct { package, name } if !package.is_empty() => {
                format!("{package}{sep}{name}")
            }
            Self::Struct { name, .. } => name.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { name } => f.write_str(name),
            Self::Array { elem, size } => write!(f, "array<{elem}, {size}>"),
            Self::Vector { elem } => write!(f, "vector<{elem}>"),
            Self::Map { key, value } => write!(f, "map<{key}, {value}>"),
            Self::Struct { package, name } if package.is_empty() => f.write_str(name),
            Self::Struct { package, name } => write!(f, "{package}.{name}"),
            Self::Func { params, result } => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &param.ty {
                        Some(ty) => write!(f, "{ty}")?,
                        None => f.write_str("invalid")?,
                    }
                    for name in &param.names {
                        write!(f, " {name}")?;
                    }
                }
                f.write_str(")")?;
                if let Some(result) = result {
                    write!(f, " {result}")?;
                }
                Ok(())
            }
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

/// The size of an `array<T, N>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArraySize {
    Literal(u64),
    /// A named constant; `value` is `None` when it is not an integer.
    Const { name: String, value: Option<u64> },
    Invalid,
}

impl ArraySize {
    /// Returns the number of elements, when known.
    #[must_use]
    pub const fn len(&self) -> Option<u64> {
        match self {
            Self::Literal(n) | Self::Const { value: Some(n), .. } => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{n}"),
            Self::Const { name, .. } => f.write_str(name),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LitKind {
    Int,
    Float,
    Char,
    String,
}

impl From<ast::LitKind> for LitKind {
    fn from(kind: ast::LitKind) -> Self {
        match kind {
            ast::LitKind::Int => Self::Int,
            ast::LitKind::Float => Self::Float,
            ast::LitKind::Char => Self::Char,
            ast::LitKind::String => Self::String,
        }
    }
}

/// A constant value or enum member value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    /// A reference to another constant.
    Ident(String),
    /// A literal, with its raw source text.
    Lit { kind: LitKind, value: String },
    Type(Type),
    Invalid,
}

impl Expr {
    /// Returns the value of an integer literal.
    #[must_use]
    pub fn int_value(&self) -> Option<u64> {
        match self {
            Self::Lit {
                kind: LitKind::Int,
                value,
            } => parse_int(value),
            _ => None,
        }
    }
}

/// Parses a decimal, `0x` hexadecimal or leading-zero octal literal.
pub(crate) fn parse_int(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => f.write_str(name),
            Self::Lit { value, .. } => f.write_str(value),
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(name: &str) -> Type {
        Type::Basic {
            name: name.to_string(),
        }
    }

    fn field(names: &[&str]) -> Field {
        Field {
            ty: Some(basic("string")),
            names: names.iter().map(|n| (*n).to_string()).collect(),
            ..Field::default()
        }
    }

    #[test]
    fn type_predicates() {
        assert!(basic("int32").is_int());
        assert!(basic("byte").is_int());
        assert!(!basic("float32").is_int());
        assert!(basic("float64").is_float());
        assert!(basic("bool").is_bool());
        assert!(basic("string").is_string());
        assert!(basic("bytes").is_vector());
        assert!(
            Type::Vector {
                elem: Box::new(basic("int8"))
            }
            .is_vector()
        );
        assert!(!basic("any").is_vector());
        assert!(Type::Invalid.is_invalid());
    }

    #[test]
    fn type_display() {
        let ty = Type::Map {
            key: Box::new(basic("string")),
            value: Box::new(Type::Array {
                elem: Box::new(Type::Struct {
                    package: "geo".into(),
                    name: "Point".into(),
                }),
                size: ArraySize::Const {
                    name: "N".into(),
                    value: Some(3),
                },
            }),
        };
        assert_eq!(ty.to_string(), "map<string, array<geo.Point, N>>");

        let method = Type::Func {
            params: vec![field(&["id"]), field(&[])],
            result: Some(Box::new(Type::Struct {
                package: String::new(),
                name: "User".into(),
            })),
        };
        assert_eq!(method.to_string(), "(string id, string) User");
    }

    #[test]
    fn qualified_uses_separator() {
        let remote = Type::Struct {
            package: "geo".into(),
            name: "Point".into(),
        };
        assert_eq!(remote.qualified("::"), "geo::Point");
        let local = Type::Struct {
            package: String::new(),
            name: "User".into(),
        };
        assert_eq!(local.qualified("::"), "User");
        assert_eq!(basic("int").qualified("::"), "int");
    }

    #[test]
    fn field_name_is_ambiguous_with_many_names() {
        assert_eq!(field(&[]).name(), Ok(None));
        assert_eq!(field(&["A"]).name(), Ok(Some("A")));
        let err = field(&["A", "B"]).name().unwrap_err();
        assert_eq!(err.to_string(), "field declares 2 names: A, B");
    }

    #[test]
    fn field_tags() {
        let mut f = field(&["Name"]);
        assert!(!f.has_tag("json"));
        f.add_tag("json", "name");
        f.add_tag("db", "user_name");
        assert_eq!(f.tag_value("json"), "name");
        assert_eq!(f.tag.as_str(), r#"json:"name" db:"user_name""#);
    }

    #[test]
    fn int_literals() {
        let lit = |value: &str| Expr::Lit {
            kind: LitKind::Int,
            value: value.into(),
        };
        assert_eq!(lit("42").int_value(), Some(42));
        assert_eq!(lit("0x2A").int_value(), Some(42));
        assert_eq!(lit("052").int_value(), Some(42));
        assert_eq!(lit("0").int_value(), Some(0));
        assert_eq!(lit("99999999999999999999999").int_value(), None);
        let float = Expr::Lit {
            kind: LitKind::Float,
            value: "1.5".into(),
        };
        assert_eq!(float.int_value(), None);
        assert_eq!(Expr::Ident("N".into()).int_value(), None);
    }

    #[test]
    fn assign_bean_ids_uses_qualified_key() {
        let bean = |name: &str| Bean {
            id: None,
            kind: BeanKind::Struct,
            doc: String::new(),
            name: name.into(),
            extends: Vec::new(),
            tag: Tag::default(),
            fields: Vec::new(),
            comment: String::new(),
        };
        let mut ir = Ir {
            packages: vec![Package {
                name: "app".into(),
                imports: BTreeMap::new(),
                files: vec![File {
                    filename: "a.mid".into(),
                    package: "app".into(),
                    beans: vec![bean("A"), bean("B")],
                    ..File::default()
                }],
            }],
        };
        let mut keys = Vec::new();
        ir.assign_bean_ids(|key| {
            keys.push(key.to_string());
            u32::try_from(keys.len()).unwrap() * 10
        });
        assert_eq!(keys, ["app.A", "app.B"]);
        let package = ir.package("app").unwrap();
        assert_eq!(package.find_bean("B").unwrap().id, Some(20));
        assert!(ir.package("other").is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Ir::decode("{").unwrap_err();
        assert!(err.to_string().starts_with("cannot decode IR"));
    }
}
