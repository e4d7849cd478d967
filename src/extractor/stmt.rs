// src/extractor/stmt.rs
//! Statement dispatch: routine bodies, blocks and the statement forms a
//! block can hold.

use crate::errors::Diag;
use crate::facts::{ExprTag, FactSink, StmtTag};
use crate::ir::{Body, Expr, Stmt, SyntheticBodyKind, ValueId};
use crate::labels::Label;

use super::{Extractor, TypeContext};

impl<S: FactSink> Extractor<'_, S> {
    pub(crate) fn extract_body(&mut self, body: &Body, routine: Label) {
        match body {
            Body::Block { stmts, span } => {
                let block = self.labels.fresh();
                self.facts.stmt(block, StmtTag::Block, routine, 0, routine);
                let loc = self.location(*span);
                self.facts.has_location(block, loc);
                for (i, stmt) in stmts.iter().enumerate() {
                    self.extract_stmt(stmt, routine, block, i as i32);
                }
            }
            Body::Synthetic(kind) => {
                let code = match kind {
                    SyntheticBodyKind::EnumValues => 1,
                    SyntheticBodyKind::EnumValueOf => 2,
                };
                self.facts.synthetic_body(routine, code);
            }
        }
    }

    pub(crate) fn extract_stmt(&mut self, s: &Stmt, routine: Label, parent: Label, idx: i32) {
        match s {
            Stmt::Expr(e) => self.extract_expr_stmt(e, routine, parent, idx),
            Stmt::Local { var, init, span } => {
                let stmt_id = self.labels.fresh();
                self.facts
                    .stmt(stmt_id, StmtTag::LocalDecl, parent, idx, routine);
                let loc = self.location(*span);
                self.facts.has_location(stmt_id, loc);
                self.extract_local_decl_expr(*var, init.as_ref(), routine, stmt_id, 1, stmt_id);
            }
            Stmt::LocalRoutine { routine: target, span } => {
                if self.unit.routine(*target).is_local() {
                    let class = self.extract_closure_class(*target);
                    let stmt_id = self.labels.fresh();
                    self.facts
                        .stmt(stmt_id, StmtTag::LocalTypeDecl, parent, idx, routine);
                    self.facts.stmt_type_decl(stmt_id, class);
                    let loc = self.location(*span);
                    self.facts.has_location(stmt_id, loc);
                } else {
                    self.report(Diag::LocalRoutineExpected, *span);
                }
            }
        }
    }

    /// The declaration expression of a local variable (also used for catch
    /// parameters, which have no initializer).
    pub(crate) fn extract_local_decl_expr(
        &mut self,
        var: ValueId,
        init: Option<&Expr>,
        routine: Label,
        parent: Label,
        idx: i32,
        enclosing: Label,
    ) {
        let unit = self.unit;
        let decl = unit.value(var);
        let var_label = match self.value_labels.get(&var) {
            Some(label) => *label,
            None => {
                let label = self.labels.fresh();
                self.value_labels.insert(var, label);
                label
            }
        };
        let expr_id = self.labels.fresh();
        let loc = self.location(decl.span);
        let ty = self.use_type(&decl.ty, TypeContext::Ordinary);
        self.facts
            .local_var(var_label, &decl.name, ty.erased, ty.precise, expr_id);
        self.facts.has_location(var_label, loc);
        self.facts
            .expr(expr_id, ExprTag::LocalDecl, ty.erased, ty.precise, parent, idx);
        self.facts.has_location(expr_id, loc);
        self.facts.enclosing_routine(expr_id, routine);
        self.facts.enclosing_stmt(expr_id, enclosing);
        if let Some(init) = init {
            self.extract_expr_expr(init, routine, expr_id, 0, enclosing);
        }
    }
}
