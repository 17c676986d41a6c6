// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type expression parsing.
//!
//! Covers named and qualified types, the `map`, `array` and `vector`
//! containers, and service method signatures.

use ecow::EcoString;

use crate::ast::{
    ArrayType, BasicLit, Expr, Field, FieldList, FuncType, LitKind, MapType, StructType, Type,
    VectorType,
};
use crate::source_analysis::{BuiltinType, Pos, TokenKind};

use super::{MAX_NESTING_DEPTH, Parser};

impl Parser<'_> {
    /// Consumes the current literal token.
    pub(super) fn parse_basic_lit(&mut self) -> BasicLit {
        let token = self.advance();
        let kind = match token.kind() {
            TokenKind::Int(_) => LitKind::Int,
            TokenKind::Float(_) => LitKind::Float,
            TokenKind::Char(_) => LitKind::Char,
            _ => LitKind::String,
        };
        BasicLit {
            pos: token.span().pos(),
            kind,
            value: token.kind().as_str().map(EcoString::from).unwrap_or_default(),
        }
    }

    /// Parses a type name.
    ///
    /// Anything but an identifier is reported and yields [`Type::Bad`]
    /// without consuming input.
    pub(super) fn parse_type_name(&mut self) -> Type {
        let pos = self.current_pos();
        if !matches!(self.current_kind(), TokenKind::Ident(_)) {
            self.error_expected("type");
            return Type::Bad { from: pos, to: pos };
        }
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            let span = self.current_token().span();
            self.error(span, "type nesting too deep");
            return Type::Bad { from: pos, to: pos };
        }

        let ident = self.parse_ident();
        if self.check(&TokenKind::Period) {
            self.advance();
            let name = self.parse_ident();
            return Type::Struct(StructType {
                package: Some(ident),
                name,
            });
        }

        let Some(builtin) = BuiltinType::lookup(&ident.name) else {
            return Type::Struct(StructType {
                package: None,
                name: ident,
            });
        };
        self.nesting_depth += 1;
        let ty = match builtin {
            BuiltinType::Map => self.parse_map_type(ident.pos),
            BuiltinType::Array => self.parse_array_type(ident.pos),
            BuiltinType::Vector => self.parse_vector_type(ident.pos),
            _ => Type::Basic {
                name: ident,
                builtin,
            },
        };
        self.nesting_depth -= 1;
        ty
    }

    /// `map<Key, Value>`
    fn parse_map_type(&mut self, pos: Pos) -> Type {
        self.expect(&TokenKind::Less);
        let key = self.parse_type_name();
        self.expect(&TokenKind::Comma);
        let value = self.parse_type_name();
        let closing = self.expect(&TokenKind::Greater);
        Type::Map(Box::new(MapType {
            pos,
            key,
            value,
            closing,
        }))
    }

    /// `array<Elem, Size>` where the size is an integer or a constant name.
    fn parse_array_type(&mut self, pos: Pos) -> Type {
        self.expect(&TokenKind::Less);
        let elem = self.parse_type_name();
        self.expect(&TokenKind::Comma);
        let size = match self.current_kind() {
            TokenKind::Int(_) => Expr::Lit(self.parse_basic_lit()),
            TokenKind::Ident(_) => Expr::Ident(self.parse_ident()),
            _ => {
                let at = self.current_pos();
                self.error_expected("array size");
                Expr::Bad { from: at, to: at }
            }
        };
        let closing = self.expect(&TokenKind::Greater);
        Type::Array(Box::new(ArrayType {
            pos,
            elem,
            size,
            closing,
        }))
    }

    /// `vector<Elem>`
    fn parse_vector_type(&mut self, pos: Pos) -> Type {
        self.expect(&TokenKind::Less);
        let elem = self.parse_type_name();
        let closing = self.expect(&TokenKind::Greater);
        Type::Vector(Box::new(VectorType { pos, elem, closing }))
    }

    /// Parses `(Params) [Result]` after a method name.
    ///
    /// A result is only taken from the line of the `(`, and only if it is
    /// not itself the start of the next method.
    pub(super) fn parse_signature(&mut self) -> Type {
        let open_line = self.line_of(self.current_pos());
        let opening = self.expect(&TokenKind::LeftParen);

        let mut list = Vec::new();
        let mut closing = None;
        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            let ty = self.parse_type_name();
            let mut names = Vec::new();
            let mut stop = false;
            match self.current_kind() {
                TokenKind::Ident(_) => {
                    names.push(self.parse_ident());
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                    }
                }
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RightParen => {}
                other => {
                    let message = format!("unexpected token {other} after type");
                    let span = self.current_token().span();
                    self.error(span, message);
                    closing = Some(self.current_pos());
                    stop = true;
                }
            }
            list.push(Field {
                doc: None,
                options: Vec::new(),
                ty: Some(ty),
                names,
                default: None,
                tag: None,
                comment: None,
            });
            if stop {
                break;
            }
        }
        let closing = match closing {
            Some(pos) => pos,
            None => self.expect(&TokenKind::RightParen),
        };

        let takes_result = matches!(self.current_kind(), TokenKind::Ident(_))
            && self.line_of(self.current_pos()) == open_line
            && !matches!(self.peek_kind(1), TokenKind::LeftParen);
        let result = takes_result.then(|| self.parse_type_name());

        Type::Func(Box::new(FuncType {
            params: FieldList {
                opening,
                list,
                closing,
            },
            result,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::semantic_analysis::SymbolTable;
    use crate::source_analysis::{Diagnostic, FileSet, parse_file};

    use super::*;
    use crate::ast::Decl;

    /// Parses `ty` as the type of a single field and returns it.
    fn field_type(ty: &str) -> (Type, Vec<Diagnostic>) {
        let source = format!("package t\nstruct S {{ {ty} F }}");
        let mut fset = FileSet::new();
        let mut symbols = SymbolTable::new();
        let (parsed, diagnostics) = parse_file(&mut fset, &mut symbols, "t.mid", &source).unwrap();
        let Decl::Bean(bean) = &parsed.file.decls[0] else {
            panic!("expected bean");
        };
        (bean.fields.list[0].ty.clone().unwrap(), diagnostics)
    }

    #[test]
    fn basic_types() {
        for builtin in BuiltinType::ALL.iter().filter(|b| !b.is_container()) {
            let (ty, diagnostics) = field_type(builtin.as_str());
            assert!(diagnostics.is_empty());
            assert!(matches!(ty, Type::Basic { builtin: b, .. } if b == *builtin));
        }
    }

    #[test]
    fn named_and_qualified() {
        let (ty, _) = field_type("User");
        assert!(matches!(ty, Type::Struct(StructType { package: None, .. })));
        let (ty, diagnostics) = field_type("common.Address");
        assert!(diagnostics.is_empty());
        let Type::Struct(StructType {
            package: Some(package),
            name,
        }) = ty
        else {
            panic!("expected qualified type");
        };
        assert_eq!(package.name, "common");
        assert_eq!(name.name, "Address");
    }

    #[test]
    fn nested_containers() {
        let (ty, diagnostics) = field_type("map<string, array<vector<int8>, 3>>");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let Type::Map(map) = ty else {
            panic!("expected map");
        };
        assert!(matches!(map.key, Type::Basic { builtin: BuiltinType::String, .. }));
        let Type::Array(array) = &map.value else {
            panic!("expected array");
        };
        assert!(matches!(array.elem, Type::Vector(_)));
        assert!(matches!(&array.size, Expr::Lit(lit) if lit.value == "3"));
    }

    #[test]
    fn missing_angle_bracket() {
        let (ty, diagnostics) = field_type("vector<int32");
        assert!(matches!(ty, Type::Vector(_)));
        assert_eq!(diagnostics[0].message, "expected '>', found 'IDENT' F");
    }

    #[test]
    fn bad_array_size() {
        let (ty, diagnostics) = field_type("array<int32, \"x\">");
        let Type::Array(array) = ty else {
            panic!("expected array");
        };
        assert!(matches!(array.size, Expr::Bad { .. }));
        assert_eq!(
            diagnostics[0].message,
            "expected array size, found 'STRING' \"x\""
        );
    }

    #[test]
    fn unexpected_token_in_parameters() {
        let source = "package t\nservice S { Get(int32 = ) }";
        let mut fset = FileSet::new();
        let mut symbols = SymbolTable::new();
        let (_, diagnostics) = parse_file(&mut fset, &mut symbols, "t.mid", source).unwrap();
        assert_eq!(diagnostics[0].message, "unexpected token = after type");
    }
}
