// src/extractor/synthesis.rs
//! Entities with no direct source counterpart: singleton instance fields,
//! the per-class initializer routine, and closure classes for local
//! routines.

use crate::errors::Diag;
use crate::facts::{ExprTag, FactSink, StmtTag};
use crate::ir::{Builtin, ClassId, ClassKind, Expr, FieldId, Member, RoutineId, TypeRef};
use crate::labels::Label;

use super::{Extractor, TypeContext};

/// A fabricated field: its label plus the conventional name.
pub(crate) struct FieldSynth {
    pub label: Label,
    pub name: String,
}

/// Identities fabricated for one local routine's closure class.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClosureIds {
    pub class: Label,
    pub ctor: Label,
    pub routine: Label,
}

impl<S: FactSink> Extractor<'_, S> {
    /// The static instance field a singleton object carries.
    pub(crate) fn object_instance(&mut self, class: ClassId) -> FieldSynth {
        let unit = self.unit;
        let c = unit.class(class);
        if !matches!(c.kind, ClassKind::Object { companion: false }) {
            self.report(Diag::NotAnObject { name: c.name.clone() }, c.span);
        }
        let class_label = self.class_label(class);
        let label = self
            .labels
            .intern(&format!("field;{{{class_label}}};INSTANCE"));
        FieldSynth {
            label,
            name: "INSTANCE".to_string(),
        }
    }

    /// The static field the enclosing class carries for its companion.
    pub(crate) fn companion_instance(&mut self, class: ClassId) -> Option<FieldSynth> {
        let unit = self.unit;
        let c = unit.class(class);
        if !matches!(c.kind, ClassKind::Object { companion: true }) {
            self.report(Diag::NotACompanion { name: c.name.clone() }, c.span);
            return None;
        }
        let Some(outer) = c.enclosing else {
            self.report(Diag::NotACompanion { name: c.name.clone() }, c.span);
            return None;
        };
        let outer_label = self.class_label(outer);
        let label = self
            .labels
            .intern(&format!("field;{{{outer_label}}};{}", c.name));
        Some(FieldSynth {
            label,
            name: c.name.clone(),
        })
    }

    /// Fixed modifiers of fabricated members: visible, owned by the type,
    /// not reassignable.
    pub(crate) fn emit_synthetic_modifiers(&mut self, id: Label) {
        self.facts.modifier(id, "public");
        self.facts.modifier(id, "static");
        self.facts.modifier(id, "final");
    }

    /// One routine per type aggregating field initializers and instance
    /// initializer blocks, in declaration order. External declarations have
    /// no source body and get none.
    pub(crate) fn extract_init_routine(&mut self, class: ClassId, class_label: Label) {
        let unit = self.unit;
        let c = unit.class(class);
        if c.is_external {
            return;
        }
        let label = self.init_routine_label(class_label);
        let ret = self.use_type(&TypeRef::builtin(Builtin::Unit), TypeContext::Return);
        self.facts.routine(
            label,
            "<obinit>",
            "<obinit>()",
            ret.erased,
            ret.precise,
            class_label,
            label,
        );
        let loc = self.location(c.span);
        self.facts.has_location(label, loc);

        let block = self.labels.fresh();
        self.facts.stmt(block, StmtTag::Block, label, 0, label);
        self.facts.has_location(block, loc);

        let mut idx = 0i32;
        for &member in &c.members {
            match member {
                Member::Field(f) => {
                    let fd = unit.field(f);
                    if fd.is_static {
                        continue;
                    }
                    if let Some(init) = &fd.init {
                        self.extract_field_init(f, init, label, block, idx);
                        idx += 1;
                    }
                }
                Member::Property(p) => {
                    let Some(backing) = unit.property(p).backing_field else {
                        continue;
                    };
                    let fd = unit.field(backing);
                    if fd.is_static {
                        continue;
                    }
                    if let Some(init) = &fd.init {
                        self.extract_field_init(backing, init, label, block, idx);
                        idx += 1;
                    }
                }
                Member::InitBlock(b) => {
                    let bd = unit.init_block(b);
                    if bd.is_static {
                        continue;
                    }
                    for stmt in &bd.stmts {
                        self.extract_stmt(stmt, label, block, idx);
                        idx += 1;
                    }
                }
                _ => {}
            }
        }
    }

    /// One field initializer becomes an assignment statement in the
    /// initializer routine's body.
    fn extract_field_init(
        &mut self,
        field: FieldId,
        init: &Expr,
        obinit: Label,
        block: Label,
        idx: i32,
    ) {
        let unit = self.unit;
        let fd = unit.field(field);
        let loc = self.location(fd.span);

        let stmt_id = self.labels.fresh();
        self.facts.stmt(stmt_id, StmtTag::Expr, block, idx, obinit);
        self.facts.has_location(stmt_id, loc);

        let assign = self.labels.fresh();
        let ty = self.use_type(&init.ty, TypeContext::Ordinary);
        self.facts
            .expr(assign, ExprTag::Assign, ty.erased, ty.precise, stmt_id, 0);
        self.facts.has_location(assign, loc);
        self.facts.enclosing_routine(assign, obinit);
        self.facts.enclosing_stmt(assign, stmt_id);

        let lhs = self.labels.fresh();
        let lhs_ty = self.use_type(&fd.ty, TypeContext::Ordinary);
        self.facts
            .expr(lhs, ExprTag::VarAccess, lhs_ty.erased, lhs_ty.precise, assign, 0);
        self.facts.has_location(lhs, loc);
        self.facts.enclosing_routine(lhs, obinit);
        self.facts.enclosing_stmt(lhs, stmt_id);
        let field_label = self.field_label(field);
        self.facts.variable_binding(lhs, field_label);

        self.extract_expr_expr(init, obinit, assign, 1, stmt_id);
    }

    /// Fabricated identities for a local routine's closure class, allocated
    /// once per routine.
    pub(crate) fn closure_ids(&mut self, routine: RoutineId) -> ClosureIds {
        if let Some(ids) = self.closures.get(&routine) {
            return *ids;
        }
        let ids = ClosureIds {
            class: self.labels.fresh(),
            ctor: self.labels.fresh(),
            routine: self.labels.fresh(),
        };
        self.closures.insert(routine, ids);
        ids
    }

    /// The package-less class fabricated around a local routine: the routine
    /// as its single member, plus a constructor whose body is one super-call
    /// to the root type's constructor.
    pub(crate) fn extract_closure_class(&mut self, routine: RoutineId) -> Label {
        let ids = self.closure_ids(routine);
        if !self.closures_emitted.insert(routine) {
            return ids.class;
        }
        let unit = self.unit;
        let r = unit.routine(routine);
        let pkg = self.extract_package("");
        self.facts.class(ids.class, "", pkg, ids.class);
        let loc = self.location(r.span);
        self.facts.has_location(ids.class, loc);

        self.extract_routine(routine, ids.class);

        self.facts
            .constructor(ids.ctor, "", "", ids.class, ids.class, ids.class, ids.ctor);
        self.facts.has_location(ids.ctor, loc);
        let block = self.labels.fresh();
        self.facts.stmt(block, StmtTag::Block, ids.ctor, 0, ids.ctor);
        self.facts.has_location(block, loc);
        let super_call = self.labels.fresh();
        self.facts
            .stmt(super_call, StmtTag::SuperCtorInvoke, block, 0, ids.ctor);
        self.facts.has_location(super_call, loc);

        // the closure extends the root type; bind its no-argument constructor
        let any = self.use_type(&TypeRef::builtin(Builtin::Any), TypeContext::Ordinary);
        let base_ctor = self
            .labels
            .intern(&format!("callable;{{{}}};Any()", any.erased));
        self.facts.callable_binding(super_call, base_ctor);

        self.emit_synthetic_modifiers(ids.class);
        self.facts.extends_reftype(ids.class, any.erased);
        ids.class
    }
}
