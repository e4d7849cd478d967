// src/extractor/slots.rs
//! The attachment protocol between a node and its parent.
//!
//! A node being lowered does not know whether its parent expects a statement
//! or an expression at the slot it occupies. Each lowering rule therefore
//! normalizes its [`Slot`] first: statement-shaped constructs call
//! [`Slot::into_stmt`], expression-shaped ones [`Slot::into_expr`]. Both
//! conversions are total. When the slot already has the right flavor it is
//! returned unchanged; otherwise exactly one wrapper entity is synthesized
//! at the original slot and the converted slot points at the wrapper's fixed
//! inner position 0.

use crate::facts::{ExprTag, FactSink, StmtTag};
use crate::ir::Expr;
use crate::labels::Label;

use super::{Extractor, TypeContext};

/// A statement-position attachment point.
#[derive(Debug, Clone, Copy)]
pub struct StmtSlot {
    pub parent: Label,
    pub idx: i32,
}

/// An expression-position attachment point, which also names the nearest
/// enclosing statement.
#[derive(Debug, Clone, Copy)]
pub struct ExprSlot {
    pub parent: Label,
    pub idx: i32,
    pub enclosing_stmt: Label,
}

/// Where the next produced entity must be wired into its parent.
#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Stmt(StmtSlot),
    Expr(ExprSlot),
}

impl Slot {
    pub fn stmt(parent: Label, idx: i32) -> Self {
        Slot::Stmt(StmtSlot { parent, idx })
    }

    pub fn expr(parent: Label, idx: i32, enclosing_stmt: Label) -> Self {
        Slot::Expr(ExprSlot {
            parent,
            idx,
            enclosing_stmt,
        })
    }

    /// Statement-position view of this slot. An expression slot gains a
    /// wrapper expression of the node's static type holding the statement;
    /// the wrapper becomes the enclosing statement for its own children.
    pub(crate) fn into_stmt<S: FactSink>(
        self,
        x: &mut Extractor<'_, S>,
        e: &Expr,
        routine: Label,
    ) -> StmtSlot {
        match self {
            Slot::Stmt(slot) => slot,
            Slot::Expr(slot) => {
                let wrapper = x.labels.fresh();
                let ty = x.use_type(&e.ty, TypeContext::Ordinary);
                x.facts.expr(
                    wrapper,
                    ExprTag::StmtWrapper,
                    ty.erased,
                    ty.precise,
                    slot.parent,
                    slot.idx,
                );
                let loc = x.location(e.span);
                x.facts.has_location(wrapper, loc);
                x.facts.enclosing_routine(wrapper, routine);
                x.facts.enclosing_stmt(wrapper, slot.enclosing_stmt);
                StmtSlot {
                    parent: wrapper,
                    idx: 0,
                }
            }
        }
    }

    /// Expression-position view of this slot. A statement slot gains an
    /// expression-statement wrapper, which is its own enclosing statement.
    pub(crate) fn into_expr<S: FactSink>(
        self,
        x: &mut Extractor<'_, S>,
        e: &Expr,
        routine: Label,
    ) -> ExprSlot {
        match self {
            Slot::Expr(slot) => slot,
            Slot::Stmt(slot) => {
                let wrapper = x.labels.fresh();
                x.facts
                    .stmt(wrapper, StmtTag::Expr, slot.parent, slot.idx, routine);
                let loc = x.location(e.span);
                x.facts.has_location(wrapper, loc);
                ExprSlot {
                    parent: wrapper,
                    idx: 0,
                    enclosing_stmt: wrapper,
                }
            }
        }
    }
}
