// src/extractor/types.rs
//! Type-use resolution: every type reference maps to an erased id, a precise
//! id, and an erased signature fragment for routine signatures.
//!
//! Resolutions are memoized per `(type, context)`. The cache is load-bearing,
//! not an optimization: the ids it hands out participate in structural keys,
//! so a second resolution of the same reference must return the ids the
//! first one produced.

use smallvec::SmallVec;

use crate::facts::FactSink;
use crate::ir::{Builtin, ClassId, ClassKind, TypeRef};
use crate::labels::Label;

use super::Extractor;

/// Where a type reference occurs. Return-position uses erase type variables
/// out of the public signature; generic-argument uses are cached separately
/// from ordinary ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeContext {
    Ordinary,
    Return,
    GenericArg,
}

/// The dual identity of one type use.
#[derive(Debug, Clone)]
pub struct TypeUse {
    pub erased: Label,
    pub precise: Label,
    pub signature: String,
}

/// Erasure of a type reference: type arguments dropped, type variables
/// replaced by the root type, nullability forgotten.
pub(crate) fn erase_ref(ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Builtin { builtin, .. } => TypeRef::builtin(*builtin),
        TypeRef::Class { class, .. } => TypeRef::class(*class),
        TypeRef::TypeParam { .. } => TypeRef::builtin(Builtin::Any),
        TypeRef::Array { element, .. } => TypeRef::Array {
            element: Box::new(erase_ref(element)),
            nullable: false,
        },
    }
}

impl<S: FactSink> Extractor<'_, S> {
    pub(crate) fn use_type(&mut self, ty: &TypeRef, ctx: TypeContext) -> TypeUse {
        if let Some(hit) = self.type_uses.get(&(ty.clone(), ctx)) {
            return hit.clone();
        }
        let result = self.resolve_type(ty, ctx);
        self.type_uses.insert((ty.clone(), ctx), result.clone());
        result
    }

    fn resolve_type(&mut self, ty: &TypeRef, ctx: TypeContext) -> TypeUse {
        match ty {
            TypeRef::Builtin { builtin, nullable } => {
                let signature = format!("lang.{}", builtin.name());
                let erased = self.type_label(&format!("type;{signature}"), &signature);
                let precise = if *nullable {
                    self.type_label(
                        &format!("type;{signature};nullable"),
                        &format!("{signature}?"),
                    )
                } else {
                    erased
                };
                TypeUse {
                    erased,
                    precise,
                    signature,
                }
            }
            TypeRef::Class {
                class,
                args,
                nullable,
            } => self.class_type_use(*class, args, *nullable),
            TypeRef::TypeParam { param, nullable } => {
                let label = self.type_param_label(*param);
                let name = self.unit.type_param(*param).name.clone();
                let erased = if ctx == TypeContext::Return {
                    // type variables erase out of public signatures
                    self.use_type(&TypeRef::builtin(Builtin::Any), TypeContext::Ordinary)
                        .erased
                } else {
                    label
                };
                let precise = if *nullable {
                    let key = format!("{};nullable", self.type_param_key(*param));
                    self.type_label(&key, &format!("{name}?"))
                } else {
                    label
                };
                TypeUse {
                    erased,
                    precise,
                    // the signature fragment is always the erased view
                    signature: "lang.Any".to_string(),
                }
            }
            TypeRef::Array { element, nullable } => {
                let elem = self.use_type(element, TypeContext::Ordinary);
                let signature = format!("{}[]", elem.signature);
                let erased =
                    self.type_label(&format!("array;{{{}}}", elem.erased), &signature);
                let precise_key = if *nullable {
                    format!("array;{{{}}};nullable", elem.precise)
                } else {
                    format!("array;{{{}}}", elem.precise)
                };
                let precise_sig = if *nullable {
                    format!("{signature}?")
                } else {
                    signature.clone()
                };
                let precise = self.type_label(&precise_key, &precise_sig);
                TypeUse {
                    erased,
                    precise,
                    signature,
                }
            }
        }
    }

    fn class_type_use(&mut self, class: ClassId, args: &[TypeRef], nullable: bool) -> TypeUse {
        let source = self.class_label(class);
        self.ensure_external_class(class, source);
        let qname = self.qualified_class_name(class);

        let (base, base_key) = if args.is_empty() {
            (source, format!("class;{qname}"))
        } else {
            let arg_uses: SmallVec<[TypeUse; 4]> = args
                .iter()
                .map(|arg| self.use_type(arg, TypeContext::GenericArg))
                .collect();
            let arg_list = arg_uses
                .iter()
                .map(|u| format!("{{{}}}", u.precise))
                .collect::<Vec<_>>()
                .join(",");
            let key = format!("class;{qname}<{arg_list}>");
            let instance = match self.labels.get(&key) {
                Some(label) => label,
                None => {
                    let label = self.labels.intern(&key);
                    self.emit_class_instance(class, label, source, &arg_uses);
                    label
                }
            };
            (instance, key)
        };

        let precise = if nullable {
            self.type_label(&format!("{base_key};nullable"), &format!("{qname}?"))
        } else {
            base
        };
        TypeUse {
            erased: source,
            precise,
            signature: qname,
        }
    }

    /// Row for one parameterized instance of a class, written on the
    /// instance's first use.
    fn emit_class_instance(
        &mut self,
        class: ClassId,
        label: Label,
        source: Label,
        args: &[TypeUse],
    ) {
        let unit = self.unit;
        let c = unit.class(class);
        let pkg = self.extract_package(&c.package);
        if matches!(c.kind, ClassKind::Interface) {
            self.facts.interface(label, &c.name, pkg, source);
        } else {
            self.facts.class(label, &c.name, pkg, source);
            if matches!(c.kind, ClassKind::Enum) {
                self.facts.is_enum_type(label);
            }
        }
        for (idx, arg) in args.iter().enumerate() {
            self.facts.type_arg(arg.precise, idx as i32, label);
        }
        self.facts.is_parameterized(label);
        self.facts.erasure(label, source);
        let loc = self.location(c.span);
        self.facts.has_location(label, loc);
    }

    /// First reference to an external class writes its shallow declaration
    /// row; a source class gets its full row from the declaration walk.
    fn ensure_external_class(&mut self, class: ClassId, label: Label) {
        let unit = self.unit;
        let c = unit.class(class);
        if !c.is_external || !self.externals_emitted.insert(class) {
            return;
        }
        let pkg = self.extract_package(&c.package);
        if matches!(c.kind, ClassKind::Interface) {
            self.facts.interface(label, &c.name, pkg, label);
        } else {
            self.facts.class(label, &c.name, pkg, label);
            if matches!(c.kind, ClassKind::Enum) {
                self.facts.is_enum_type(label);
            }
        }
    }

    /// Get-or-intern a type id, writing its description row on first use.
    pub(crate) fn type_label(&mut self, key: &str, signature: &str) -> Label {
        if let Some(label) = self.labels.get(key) {
            return label;
        }
        let label = self.labels.intern(key);
        self.facts.type_entity(label, signature);
        label
    }
}
