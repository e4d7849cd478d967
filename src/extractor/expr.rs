// src/extractor/expr.rs
//! Expression lowering: recursive descent over expression trees, including
//! the resugaring of builtin-operator calls and the synthesis of implicit
//! entities at call sites.

use crate::errors::Diag;
use crate::facts::{ExprTag, FactSink, StmtTag};
use crate::ir::{
    Builtin, CallOrigin, ClassKind, ConstValue, Expr, ExprKind, Member, NodeId, RoutineId,
    RoutineKind, RoutineParent, Span, TypeOperator, TypeRef, ValueKind,
};
use crate::labels::Label;

use super::{ExprSlot, Extractor, Slot, TypeContext};

/// Intrinsic comparison markers, the entity they resugar to, and the origin
/// tag a well-formed front end attaches to them.
const COMPARISON_INTRINSICS: &[(&str, ExprTag, CallOrigin)] = &[
    ("less", ExprTag::Lt, CallOrigin::Less),
    ("lessOrEqual", ExprTag::Le, CallOrigin::LessEq),
    ("greater", ExprTag::Gt, CallOrigin::Greater),
    ("greaterOrEqual", ExprTag::Ge, CallOrigin::GreaterEq),
    ("eq", ExprTag::Eq, CallOrigin::Eq),
    ("refEq", ExprTag::Eq, CallOrigin::RefEq),
    ("ieee754Eq", ExprTag::Eq, CallOrigin::Eq),
];

/// Intrinsic markers the engine does not model. They are reported and
/// skipped; they must never abort extraction.
const UNHANDLED_INTRINSICS: &[&str] = &[
    "throwClassCast",
    "throwIllegalState",
    "noBranchMatched",
    "illegalArgument",
    "logicalAnd",
    "logicalOr",
];

const ARRAY_INTRINSICS: &[&str] = &[
    "arrayOf",
    "doubleArrayOf",
    "floatArrayOf",
    "longArrayOf",
    "intArrayOf",
    "charArrayOf",
    "shortArrayOf",
    "byteArrayOf",
    "booleanArrayOf",
];

const NUMERIC_CLASSES: &[&str] = &["Int", "Byte", "Short", "Long", "Float", "Double"];

impl<S: FactSink> Extractor<'_, S> {
    pub(crate) fn extract_expr_stmt(&mut self, e: &Expr, routine: Label, parent: Label, idx: i32) {
        self.extract_expr(e, routine, Slot::stmt(parent, idx));
    }

    pub(crate) fn extract_expr_expr(
        &mut self,
        e: &Expr,
        routine: Label,
        parent: Label,
        idx: i32,
        enclosing: Label,
    ) {
        self.extract_expr(e, routine, Slot::expr(parent, idx, enclosing));
    }

    /// Row, location, enclosing-routine and enclosing-statement for one
    /// expression entity. Every expression goes through here.
    fn expr_entity(&mut self, e: &Expr, tag: ExprTag, slot: &ExprSlot, routine: Label) -> Label {
        let ty = self.use_type(&e.ty, TypeContext::Ordinary);
        let id = self.labels.fresh();
        self.facts
            .expr(id, tag, ty.erased, ty.precise, slot.parent, slot.idx);
        let loc = self.location(e.span);
        self.facts.has_location(id, loc);
        self.facts.enclosing_routine(id, routine);
        self.facts.enclosing_stmt(id, slot.enclosing_stmt);
        id
    }

    fn stmt_entity(&mut self, tag: StmtTag, parent: Label, idx: i32, routine: Label, span: Span) -> Label {
        let id = self.labels.fresh();
        self.facts.stmt(id, tag, parent, idx, routine);
        let loc = self.location(span);
        self.facts.has_location(id, loc);
        id
    }

    /// A synthesized type-access child.
    pub(crate) fn extract_type_access(
        &mut self,
        ty: &TypeRef,
        routine: Label,
        parent: Label,
        idx: i32,
        span: Span,
        enclosing: Label,
    ) -> Label {
        let ty_use = self.use_type(ty, TypeContext::Ordinary);
        let id = self.labels.fresh();
        self.facts
            .expr(id, ExprTag::TypeAccess, ty_use.erased, ty_use.precise, parent, idx);
        let loc = self.location(span);
        self.facts.has_location(id, loc);
        self.facts.enclosing_routine(id, routine);
        self.facts.enclosing_stmt(id, enclosing);
        id
    }

    /// Type-argument accesses at `start`, `start+1`, … (or descending when
    /// `reverse` holds, for the negative tail of a call's children).
    fn extract_type_args(
        &mut self,
        args: &[TypeRef],
        parent: Label,
        routine: Label,
        enclosing: Label,
        start: i32,
        reverse: bool,
    ) {
        let step = if reverse { -1 } else { 1 };
        for (i, arg) in args.iter().enumerate() {
            let ty_use = self.use_type(arg, TypeContext::GenericArg);
            let id = self.labels.fresh();
            self.facts.expr(
                id,
                ExprTag::TypeAccess,
                ty_use.erased,
                ty_use.precise,
                parent,
                start + i as i32 * step,
            );
            self.facts.enclosing_routine(id, routine);
            self.facts.enclosing_stmt(id, enclosing);
        }
    }

    pub(crate) fn extract_expr(&mut self, e: &Expr, routine: Label, slot: Slot) {
        match &e.kind {
            ExprKind::Block { stmts } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::Block, slot.parent, slot.idx, routine, e.span);
                for (i, stmt) in stmts.iter().enumerate() {
                    self.extract_stmt(stmt, routine, id, i as i32);
                }
            }
            ExprKind::While { condition, body } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::While, slot.parent, slot.idx, routine, e.span);
                self.loop_targets.insert(e.id, id);
                self.extract_expr_expr(condition, routine, id, 0, id);
                if let Some(body) = body {
                    self.extract_expr_stmt(body, routine, id, 1);
                }
                self.loop_targets.remove(&e.id);
            }
            ExprKind::DoWhile { condition, body } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::DoWhile, slot.parent, slot.idx, routine, e.span);
                self.loop_targets.insert(e.id, id);
                self.extract_expr_expr(condition, routine, id, 0, id);
                if let Some(body) = body {
                    self.extract_expr_stmt(body, routine, id, 1);
                }
                self.loop_targets.remove(&e.id);
            }
            ExprKind::Break { target, label } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::Break, slot.parent, slot.idx, routine, e.span);
                self.extract_jump(id, *target, label.as_deref(), e.span);
            }
            ExprKind::Continue { target, label } => {
                let slot = slot.into_stmt(self, e, routine);
                let id =
                    self.stmt_entity(StmtTag::Continue, slot.parent, slot.idx, routine, e.span);
                self.extract_jump(id, *target, label.as_deref(), e.span);
            }
            ExprKind::Return { value } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::Return, slot.parent, slot.idx, routine, e.span);
                self.extract_expr_expr(value, routine, id, 0, id);
            }
            ExprKind::Throw { value } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::Throw, slot.parent, slot.idx, routine, e.span);
                self.extract_expr_expr(value, routine, id, 0, id);
            }
            ExprKind::Try {
                body,
                catches,
                finally,
            } => {
                let slot = slot.into_stmt(self, e, routine);
                let id = self.stmt_entity(StmtTag::Try, slot.parent, slot.idx, routine, e.span);
                self.extract_expr_stmt(body, routine, id, -1);
                if let Some(finally) = finally {
                    self.extract_expr_stmt(finally, routine, id, -2);
                }
                for (i, catch) in catches.iter().enumerate() {
                    let catch_id =
                        self.stmt_entity(StmtTag::Catch, id, i as i32, routine, catch.span);
                    let param_ty = self.unit.value(catch.param).ty.clone();
                    self.extract_type_access(&param_ty, routine, catch_id, -1, catch.span, catch_id);
                    self.extract_local_decl_expr(catch.param, None, routine, catch_id, 0, catch_id);
                    self.extract_expr_stmt(&catch.handler, routine, catch_id, 1);
                }
            }
            ExprKind::DelegatingConstructorCall {
                target,
                args,
                dispatch_receiver,
            } => {
                let slot = slot.into_stmt(self, e, routine);
                self.extract_delegating_call(
                    e,
                    *target,
                    args,
                    dispatch_receiver.as_deref(),
                    slot.parent,
                    slot.idx,
                    routine,
                );
            }
            ExprKind::InstanceInit { class } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::Call, &slot, routine);
                let class_label = self.class_label(*class);
                let init = self.init_routine_label(class_label);
                self.facts.callable_binding(id, init);
            }
            ExprKind::ConstructorCall {
                target,
                args,
                qualifier,
                type_args,
            } => {
                let slot = slot.into_expr(self, e, routine);
                self.extract_constructor_call(
                    e,
                    *target,
                    args,
                    qualifier.as_deref(),
                    type_args,
                    slot,
                    routine,
                );
            }
            ExprKind::EnumConstructorCall { target, args } => {
                let slot = slot.into_expr(self, e, routine);
                self.extract_constructor_call(e, *target, args, None, &[], slot, routine);
            }
            ExprKind::Call { .. } => {
                let slot = slot.into_expr(self, e, routine);
                self.extract_call(e, slot, routine);
            }
            ExprKind::StringTemplate { parts } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::StringTemplate, &slot, routine);
                for (i, part) in parts.iter().enumerate() {
                    self.extract_expr_expr(part, routine, id, i as i32, slot.enclosing_stmt);
                }
            }
            ExprKind::Const(value) => {
                let slot = slot.into_expr(self, e, routine);
                self.extract_literal(e, value, &slot, routine);
            }
            ExprKind::GetValue { target } => {
                let slot = slot.into_expr(self, e, routine);
                let unit = self.unit;
                let decl = unit.value(*target);
                match decl.kind {
                    ValueKind::RoutineReceiver => {
                        self.expr_entity(e, ExprTag::ThisAccess, &slot, routine);
                    }
                    ValueKind::ClassReceiver { owner } => {
                        // qualified by the class whose instance it denotes
                        let id = self.expr_entity(e, ExprTag::ThisAccess, &slot, routine);
                        let qualifier = TypeRef::class(owner);
                        self.extract_type_access(
                            &qualifier,
                            routine,
                            id,
                            0,
                            e.span,
                            slot.enclosing_stmt,
                        );
                    }
                    ValueKind::Local | ValueKind::Param => {
                        let id = self.expr_entity(e, ExprTag::VarAccess, &slot, routine);
                        match self.value_labels.get(target) {
                            Some(label) => {
                                let label = *label;
                                self.facts.variable_binding(id, label);
                            }
                            None => self.report(
                                Diag::UnboundValue {
                                    name: decl.name.clone(),
                                },
                                e.span,
                            ),
                        }
                    }
                }
            }
            ExprKind::GetField { target } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::VarAccess, &slot, routine);
                let field = self.field_label(*target);
                self.facts.variable_binding(id, field);
            }
            ExprKind::GetEnumConst { target } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::VarAccess, &slot, routine);
                let constant = self.enum_const_label(*target);
                self.facts.variable_binding(id, constant);
            }
            ExprKind::GetSingleton { class } => {
                let slot = slot.into_expr(self, e, routine);
                let instance = match self.unit.class(*class).kind {
                    ClassKind::Object { companion: true } => self.companion_instance(*class),
                    _ => Some(self.object_instance(*class)),
                };
                if let Some(instance) = instance {
                    let id = self.expr_entity(e, ExprTag::VarAccess, &slot, routine);
                    self.facts.variable_binding(id, instance.label);
                }
            }
            ExprKind::SetValue { target, value } => {
                let slot = slot.into_expr(self, e, routine);
                let lhs_ty = self.unit.value(*target).ty.clone();
                let binding = self.value_labels.get(target).copied();
                let name = self.unit.value(*target).name.clone();
                if binding.is_none() {
                    self.report(Diag::UnboundValue { name }, e.span);
                }
                self.extract_assignment(e, &lhs_ty, binding, value, &slot, routine);
            }
            ExprKind::SetField { target, value } => {
                let slot = slot.into_expr(self, e, routine);
                let lhs_ty = self.unit.field(*target).ty.clone();
                let binding = Some(self.field_label(*target));
                self.extract_assignment(e, &lhs_ty, binding, value, &slot, routine);
            }
            ExprKind::When { branches, origin } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::When, &slot, routine);
                if *origin == Some(CallOrigin::If) {
                    self.facts.when_if(id);
                }
                for (i, branch) in branches.iter().enumerate() {
                    let branch_id = self.labels.fresh();
                    self.facts.when_branch(branch_id, id, i as i32);
                    let loc = self.location(branch.span);
                    self.facts.has_location(branch_id, loc);
                    self.extract_expr_expr(
                        &branch.condition,
                        routine,
                        branch_id,
                        0,
                        slot.enclosing_stmt,
                    );
                    self.extract_expr_stmt(&branch.result, routine, branch_id, 1);
                    if branch.is_else {
                        self.facts.when_branch_else(branch_id);
                    }
                }
            }
            ExprKind::GetClass { argument } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::GetClass, &slot, routine);
                self.extract_expr_expr(argument, routine, id, 0, slot.enclosing_stmt);
            }
            ExprKind::TypeOp {
                op,
                operand,
                type_operand,
            } => {
                let slot = slot.into_expr(self, e, routine);
                // casts put the type access first; instance tests put the
                // operand first
                let (tag, type_first) = match op {
                    TypeOperator::Cast => (ExprTag::Cast, true),
                    TypeOperator::ImplicitCast => (ExprTag::ImplicitCast, true),
                    TypeOperator::ImplicitNotNull => (ExprTag::ImplicitNotNull, true),
                    TypeOperator::CoerceToUnit => (ExprTag::CoerceToUnit, true),
                    TypeOperator::SafeCast => (ExprTag::SafeCast, true),
                    TypeOperator::InstanceOf => (ExprTag::InstanceOf, false),
                    TypeOperator::NotInstanceOf => (ExprTag::NotInstanceOf, false),
                };
                let id = self.expr_entity(e, tag, &slot, routine);
                if type_first {
                    self.extract_type_access(type_operand, routine, id, 0, e.span, slot.enclosing_stmt);
                    self.extract_expr_expr(operand, routine, id, 1, slot.enclosing_stmt);
                } else {
                    self.extract_expr_expr(operand, routine, id, 0, slot.enclosing_stmt);
                    self.extract_type_access(type_operand, routine, id, 1, e.span, slot.enclosing_stmt);
                }
            }
            ExprKind::Vararg { elements } => {
                let slot = slot.into_expr(self, e, routine);
                let id = self.expr_entity(e, ExprTag::Vararg, &slot, routine);
                for (i, element) in elements.iter().enumerate() {
                    self.extract_expr_expr(element, routine, id, i as i32, slot.enclosing_stmt);
                }
            }
        }
    }

    fn extract_literal(&mut self, e: &Expr, value: &ConstValue, slot: &ExprSlot, routine: Label) {
        let (tag, text) = match value {
            ConstValue::Int(v) => (ExprTag::IntLit, Some(v.to_string())),
            ConstValue::Long(v) => (ExprTag::LongLit, Some(v.to_string())),
            ConstValue::Float(v) => (ExprTag::FloatLit, Some(v.to_string())),
            ConstValue::Double(v) => (ExprTag::DoubleLit, Some(v.to_string())),
            ConstValue::Bool(v) => (ExprTag::BoolLit, Some(v.to_string())),
            ConstValue::Char(v) => (ExprTag::CharLit, Some(v.to_string())),
            ConstValue::Str(v) => (ExprTag::StringLit, Some(v.clone())),
            ConstValue::Null => (ExprTag::NullLit, None),
        };
        let id = self.expr_entity(e, tag, slot, routine);
        if let Some(text) = text {
            self.facts.name_string(id, &text);
        }
    }

    fn extract_jump(&mut self, id: Label, target: NodeId, text: Option<&str>, span: Span) {
        if let Some(text) = text {
            self.facts.name_string(id, text);
        }
        match self.loop_targets.get(&target) {
            Some(loop_id) => {
                let loop_id = *loop_id;
                self.facts.jump_target(id, loop_id);
            }
            None => self.report(Diag::MissingLoopTarget, span),
        }
    }

    fn extract_assignment(
        &mut self,
        e: &Expr,
        lhs_ty: &TypeRef,
        binding: Option<Label>,
        value: &Expr,
        slot: &ExprSlot,
        routine: Label,
    ) {
        let id = self.expr_entity(e, ExprTag::Assign, slot, routine);
        let lhs = self.labels.fresh();
        let ty = self.use_type(lhs_ty, TypeContext::Ordinary);
        self.facts
            .expr(lhs, ExprTag::VarAccess, ty.erased, ty.precise, id, 0);
        let loc = self.location(e.span);
        self.facts.has_location(lhs, loc);
        self.facts.enclosing_routine(lhs, routine);
        self.facts.enclosing_stmt(lhs, slot.enclosing_stmt);
        if let Some(binding) = binding {
            self.facts.variable_binding(lhs, binding);
        }
        self.extract_expr_expr(value, routine, id, 1, slot.enclosing_stmt);
    }

    fn extract_delegating_call(
        &mut self,
        e: &Expr,
        target: RoutineId,
        args: &[Option<Expr>],
        dispatch_receiver: Option<&Expr>,
        parent: Label,
        idx: i32,
        routine: Label,
    ) {
        let Some(current) = self.current_routine else {
            self.report(Diag::NoCurrentRoutine, e.span);
            return;
        };
        let unit = self.unit;
        let target_routine = unit.routine(target);
        if target_routine.kind != RoutineKind::Constructor {
            self.report(Diag::DelegationTargetNotConstructor, e.span);
            return;
        }
        let target_class = match target_routine.parent {
            RoutineParent::Class(c) => Some(c),
            _ => None,
        };
        let current_class = match unit.routine(current).parent {
            RoutineParent::Class(c) => Some(c),
            _ => None,
        };
        let tag = if target_class == current_class {
            StmtTag::CtorInvoke
        } else {
            StmtTag::SuperCtorInvoke
        };
        let id = self.stmt_entity(tag, parent, idx, routine, e.span);
        let callee = self.routine_label(target);
        self.facts.callable_binding(id, callee);
        for (i, arg) in args.iter().enumerate() {
            if let Some(arg) = arg {
                self.extract_expr_expr(arg, routine, id, i as i32, id);
            }
        }
        if let Some(receiver) = dispatch_receiver {
            self.extract_expr_expr(receiver, routine, id, -1, id);
        }
    }

    fn extract_constructor_call(
        &mut self,
        e: &Expr,
        target: RoutineId,
        args: &[Option<Expr>],
        qualifier: Option<&Expr>,
        type_args: &[TypeRef],
        slot: ExprSlot,
        routine: Label,
    ) {
        let id = self.expr_entity(e, ExprTag::New, &slot, routine);
        let ctor = self.routine_label(target);
        self.facts.callable_binding(id, ctor);
        for (i, arg) in args.iter().enumerate() {
            if let Some(arg) = arg {
                self.extract_expr_expr(arg, routine, id, i as i32, slot.enclosing_stmt);
            }
        }
        if let Some(qualifier) = qualifier {
            self.extract_expr_expr(qualifier, routine, id, -2, slot.enclosing_stmt);
        }
        // access to the constructed type at the conventional position
        let type_access =
            self.extract_type_access(&e.ty, routine, id, -3, e.span, slot.enclosing_stmt);
        if !type_args.is_empty() {
            self.extract_type_args(type_args, type_access, routine, slot.enclosing_stmt, 0, false);
        }
    }

    // --- builtin-call recognition ---------------------------------------

    /// Structural match against a routine declaration: owning package and
    /// type, routine name, and (for extension-style builtins) the
    /// nullability of the receiver type.
    fn is_routine_named(
        &self,
        target: RoutineId,
        pkg: &str,
        class: &str,
        name: &str,
        nullable_receiver: bool,
    ) -> bool {
        let unit = self.unit;
        let r = unit.routine(target);
        if r.name != name {
            return false;
        }
        match r.extension_receiver {
            Some(ext) => match &unit.value(ext).ty {
                TypeRef::Builtin { builtin, nullable } => {
                    *nullable == nullable_receiver && pkg == "lang" && builtin.name() == class
                }
                TypeRef::Class {
                    class: c, nullable, ..
                } => {
                    let decl = unit.class(*c);
                    *nullable == nullable_receiver && decl.package == pkg && decl.name == class
                }
                _ => false,
            },
            None => match r.parent {
                RoutineParent::Class(c) => {
                    let decl = unit.class(c);
                    decl.package == pkg && decl.name == class
                }
                _ => false,
            },
        }
    }

    fn is_numeric_routine(&self, target: RoutineId, name: &str) -> bool {
        NUMERIC_CLASSES
            .iter()
            .any(|class| self.is_routine_named(target, "lang", class, name, false))
    }

    /// A compiler-inserted marker routine of the internal package.
    fn is_intrinsic(&self, target: RoutineId, name: &str) -> bool {
        let r = self.unit.routine(target);
        r.name == name
            && matches!(r.parent, RoutineParent::Package)
            && r.package == "lang.internal"
    }

    fn extract_call(&mut self, e: &Expr, slot: ExprSlot, routine: Label) {
        let ExprKind::Call {
            target,
            origin,
            dispatch_receiver,
            extension_receiver: _,
            args,
            type_args,
        } = &e.kind
        else {
            return;
        };
        let target = *target;
        let origin = *origin;
        let receiver = dispatch_receiver.as_deref();

        // `!=` arrives as `not` applied to a builtin equality call; resugar
        // the pair into one inequality entity over the inner operands.
        if self.is_routine_named(target, "lang", "Boolean", "not", false) && args.is_empty() {
            if let Some(inner) = receiver {
                if let ExprKind::Call {
                    target: inner_target,
                    args: inner_args,
                    dispatch_receiver: inner_receiver,
                    ..
                } = &inner.kind
                {
                    let matched = match origin {
                        Some(CallOrigin::NotEq) => {
                            self.is_intrinsic(*inner_target, "eq")
                                || self.is_intrinsic(*inner_target, "ieee754Eq")
                        }
                        Some(CallOrigin::NotRefEq) => self.is_intrinsic(*inner_target, "refEq"),
                        _ => false,
                    };
                    if matched {
                        let id = self.expr_entity(e, ExprTag::Ne, &slot, routine);
                        self.extract_binop_args(
                            id,
                            inner_receiver.as_deref(),
                            inner_args,
                            routine,
                            slot.enclosing_stmt,
                            inner.span,
                        );
                        return;
                    }
                }
            }
        }

        // arithmetic is recognized by signature; the origin tag is only
        // cross-checked, and a disagreement is reported but never changes
        // the operator the signature implies
        let arithmetic: &[(&str, ExprTag, CallOrigin)] = &[
            ("plus", ExprTag::Add, CallOrigin::Add),
            ("minus", ExprTag::Sub, CallOrigin::Sub),
            ("div", ExprTag::Div, CallOrigin::Div),
            ("rem", ExprTag::Rem, CallOrigin::Rem),
        ];
        for (name, tag, expected_origin) in arithmetic {
            let recognized = self.is_numeric_routine(target, name)
                || (*name == "plus"
                    && self.is_routine_named(target, "lang", "String", "plus", false));
            if recognized {
                if origin != Some(*expected_origin) {
                    self.report(
                        Diag::OriginMismatch {
                            name: (*name).to_string(),
                        },
                        e.span,
                    );
                }
                let id = self.expr_entity(e, *tag, &slot, routine);
                self.extract_binop_dispatch(
                    id,
                    receiver,
                    args,
                    routine,
                    slot.enclosing_stmt,
                    e.span,
                );
                return;
            }
        }
        if self.is_routine_named(target, "lang", "String", "plus", true) {
            // concatenation with a nullable receiver keeps its call form;
            // the null-handling expansion the front end defers is preserved
            self.extract_routine_call(e, target, slot, routine, true);
            return;
        }

        for (name, tag, expected_origin) in COMPARISON_INTRINSICS {
            if self.is_intrinsic(target, name) {
                if origin != Some(*expected_origin) {
                    // proceed with the operator the signature implies
                    self.report(
                        Diag::OriginMismatch {
                            name: (*name).to_string(),
                        },
                        e.span,
                    );
                }
                let id = self.expr_entity(e, *tag, &slot, routine);
                self.extract_binop_args(id, receiver, args, routine, slot.enclosing_stmt, e.span);
                return;
            }
        }

        if self.is_intrinsic(target, "checkNotNull") {
            if origin != Some(CallOrigin::NotNull) {
                self.report(
                    Diag::OriginMismatch {
                        name: "checkNotNull".to_string(),
                    },
                    e.span,
                );
            }
            let id = self.expr_entity(e, ExprTag::NotNull, &slot, routine);
            self.extract_unary_arg(id, receiver, args, routine, slot.enclosing_stmt, e.span);
            return;
        }

        for name in UNHANDLED_INTRINSICS {
            if self.is_intrinsic(target, name) {
                self.report(
                    Diag::UnhandledBuiltin {
                        name: (*name).to_string(),
                    },
                    e.span,
                );
                return;
            }
        }

        if self.is_routine_named(target, "lang", "Any", "toString", true) {
            // nullable-receiver toString keeps its call form, as above
            self.extract_routine_call(e, target, slot, routine, true);
            return;
        }

        if self.is_intrinsic(target, "enumValues") {
            self.extract_enum_intrinsic(e, "values", type_args, slot, routine);
            return;
        }
        if self.is_intrinsic(target, "enumValueOf") {
            self.extract_enum_intrinsic(e, "valueOf", type_args, slot, routine);
            return;
        }

        if self.is_intrinsic(target, "arrayOfNulls") {
            let id = self.expr_entity(e, ExprTag::ArrayNew, &slot, routine);
            if type_args.len() == 1 {
                self.extract_type_args(type_args, id, routine, slot.enclosing_stmt, -1, false);
            } else {
                self.report(
                    Diag::WrongTypeArgCount {
                        expected: 1,
                        found: type_args.len(),
                    },
                    e.span,
                );
            }
            if args.len() == 1 {
                match &args[0] {
                    Some(dim) => {
                        self.extract_expr_expr(dim, routine, id, 0, slot.enclosing_stmt)
                    }
                    None => self.report(Diag::MissingOperand { side: "array size" }, e.span),
                }
            } else {
                self.report(
                    Diag::WrongArgumentCount {
                        expected: 1,
                        found: args.len(),
                    },
                    e.span,
                );
            }
            return;
        }

        if ARRAY_INTRINSICS.iter().any(|n| self.is_intrinsic(target, n)) {
            self.extract_array_literal(e, target, args, type_args, slot, routine);
            return;
        }

        self.extract_routine_call(e, target, slot, routine, true);
    }

    /// A call that is not resugared: the generic call entity with receiver
    /// at −1, extension receiver at 0, value arguments from there, and type
    /// arguments descending from −2. A local routine's call is rebound to
    /// its closure class member, with an adjacent construction of the
    /// closure type.
    fn extract_routine_call(
        &mut self,
        e: &Expr,
        target: RoutineId,
        slot: ExprSlot,
        routine: Label,
        with_type_args: bool,
    ) {
        let ExprKind::Call {
            dispatch_receiver,
            extension_receiver,
            args,
            type_args,
            ..
        } = &e.kind
        else {
            return;
        };
        let id = self.expr_entity(e, ExprTag::Call, &slot, routine);
        if with_type_args && !type_args.is_empty() {
            self.extract_type_args(type_args, id, routine, slot.enclosing_stmt, -2, true);
        }

        if self.unit.routine(target).is_local() {
            let ids = self.closure_ids(target);
            self.facts.callable_binding(id, ids.routine);
            let new_id = self.labels.fresh();
            self.facts
                .expr(new_id, ExprTag::New, ids.class, ids.class, id, -1);
            let loc = self.location(e.span);
            self.facts.has_location(new_id, loc);
            self.facts.enclosing_routine(new_id, routine);
            self.facts.enclosing_stmt(new_id, slot.enclosing_stmt);
            self.facts.callable_binding(new_id, ids.ctor);
        } else {
            let callee = self.routine_label(target);
            self.facts.callable_binding(id, callee);
            if let Some(receiver) = dispatch_receiver {
                self.extract_expr_expr(receiver, routine, id, -1, slot.enclosing_stmt);
            }
        }

        let mut offset = 0;
        if let Some(receiver) = extension_receiver {
            self.extract_expr_expr(receiver, routine, id, 0, slot.enclosing_stmt);
            offset = 1;
        }
        for (i, arg) in args.iter().enumerate() {
            if let Some(arg) = arg {
                self.extract_expr_expr(arg, routine, id, i as i32 + offset, slot.enclosing_stmt);
            }
        }
    }

    /// `enumValues`/`enumValueOf`: rewritten as a call to the reified enum
    /// type's own member.
    fn extract_enum_intrinsic(
        &mut self,
        e: &Expr,
        member: &str,
        type_args: &[TypeRef],
        slot: ExprSlot,
        routine: Label,
    ) {
        if type_args.len() != 1 {
            self.report(
                Diag::WrongTypeArgCount {
                    expected: 1,
                    found: type_args.len(),
                },
                e.span,
            );
            return;
        }
        let TypeRef::Class { class, .. } = &type_args[0] else {
            self.report(Diag::EnumTypeExpected, e.span);
            return;
        };
        let unit = self.unit;
        let found = unit.class(*class).members.iter().find_map(|m| match m {
            Member::Routine(r) if unit.routine(*r).name == member => Some(*r),
            _ => None,
        });
        match found {
            Some(target) => self.extract_routine_call(e, target, slot, routine, false),
            None => self.report(
                Diag::EnumMemberNotFound {
                    name: member.to_string(),
                },
                e.span,
            ),
        }
    }

    /// The `arrayOf` family: an array-creation entity with the element type
    /// access at −1, the initializer holding the vararg elements at −2, and
    /// a synthesized dimension literal at 0.
    fn extract_array_literal(
        &mut self,
        e: &Expr,
        target: RoutineId,
        args: &[Option<Expr>],
        type_args: &[TypeRef],
        slot: ExprSlot,
        routine: Label,
    ) {
        let id = self.expr_entity(e, ExprTag::ArrayNew, &slot, routine);
        if self.is_intrinsic(target, "arrayOf") {
            if type_args.len() == 1 {
                self.extract_type_args(type_args, id, routine, slot.enclosing_stmt, -1, false);
            } else {
                self.report(
                    Diag::WrongTypeArgCount {
                        expected: 1,
                        found: type_args.len(),
                    },
                    e.span,
                );
            }
        } else {
            match &e.ty {
                TypeRef::Array { element, .. } => {
                    let element = (**element).clone();
                    self.extract_type_access(&element, routine, id, -1, e.span, slot.enclosing_stmt);
                }
                _ => self.report(Diag::ArrayTypeExpected, e.span),
            }
        }
        if args.len() != 1 {
            self.report(
                Diag::WrongArgumentCount {
                    expected: 1,
                    found: args.len(),
                },
                e.span,
            );
            return;
        }
        match &args[0] {
            Some(Expr {
                kind: ExprKind::Vararg { elements },
                ..
            }) => {
                let init = self.labels.fresh();
                let ty = self.use_type(&e.ty, TypeContext::Ordinary);
                self.facts
                    .expr(init, ExprTag::ArrayInit, ty.erased, ty.precise, id, -2);
                let loc = self.location(e.span);
                self.facts.has_location(init, loc);
                self.facts.enclosing_routine(init, routine);
                self.facts.enclosing_stmt(init, slot.enclosing_stmt);
                for (i, element) in elements.iter().enumerate() {
                    self.extract_expr_expr(element, routine, init, i as i32, slot.enclosing_stmt);
                }
                // the dimension of the created array, as a literal
                let dim = self.labels.fresh();
                let int_use = self.use_type(&TypeRef::builtin(Builtin::Int), TypeContext::Ordinary);
                self.facts
                    .expr(dim, ExprTag::IntLit, int_use.erased, int_use.precise, id, 0);
                self.facts.has_location(dim, loc);
                self.facts.enclosing_routine(dim, routine);
                self.facts.enclosing_stmt(dim, slot.enclosing_stmt);
                let text = elements.len().to_string();
                self.facts.name_string(dim, &text);
            }
            _ => {
                let name = self.unit.routine(target).name.clone();
                self.report(Diag::VarargExpected { name }, e.span);
            }
        }
    }

    // --- operand extraction for resugared operators ---------------------

    /// Binary form with the receiver as the left operand: receiver at 0,
    /// single value argument at 1.
    fn extract_binop_dispatch(
        &mut self,
        id: Label,
        receiver: Option<&Expr>,
        args: &[Option<Expr>],
        routine: Label,
        enclosing: Label,
        span: Span,
    ) {
        match receiver {
            Some(receiver) => self.extract_expr_expr(receiver, routine, id, 0, enclosing),
            None => self.report(Diag::MissingDispatchReceiver, span),
        }
        if args.is_empty() {
            self.report(Diag::MissingOperand { side: "right operand" }, span);
            return;
        }
        if args.len() > 1 {
            self.report(Diag::ExtraArguments, span);
        }
        match &args[0] {
            Some(arg) => self.extract_expr_expr(arg, routine, id, 1, enclosing),
            None => self.report(Diag::MissingOperand { side: "right operand" }, span),
        }
    }

    /// Binary form over two value arguments; a dispatch receiver would be
    /// inconsistent input.
    fn extract_binop_args(
        &mut self,
        id: Label,
        receiver: Option<&Expr>,
        args: &[Option<Expr>],
        routine: Label,
        enclosing: Label,
        span: Span,
    ) {
        if receiver.is_some() {
            self.report(Diag::UnexpectedDispatchReceiver, span);
        }
        if args.is_empty() {
            self.report(Diag::MissingOperand { side: "left operand" }, span);
            return;
        }
        match &args[0] {
            Some(arg) => self.extract_expr_expr(arg, routine, id, 0, enclosing),
            None => self.report(Diag::MissingOperand { side: "left operand" }, span),
        }
        if args.len() < 2 {
            self.report(Diag::MissingOperand { side: "right operand" }, span);
            return;
        }
        match &args[1] {
            Some(arg) => self.extract_expr_expr(arg, routine, id, 1, enclosing),
            None => self.report(Diag::MissingOperand { side: "right operand" }, span),
        }
        if args.len() > 2 {
            self.report(Diag::ExtraArguments, span);
        }
    }

    fn extract_unary_arg(
        &mut self,
        id: Label,
        receiver: Option<&Expr>,
        args: &[Option<Expr>],
        routine: Label,
        enclosing: Label,
        span: Span,
    ) {
        if receiver.is_some() {
            self.report(Diag::UnexpectedDispatchReceiver, span);
        }
        if args.is_empty() {
            self.report(Diag::MissingOperand { side: "operand" }, span);
            return;
        }
        match &args[0] {
            Some(arg) => self.extract_expr_expr(arg, routine, id, 0, enclosing),
            None => self.report(Diag::MissingOperand { side: "operand" }, span),
        }
        if args.len() > 1 {
            self.report(Diag::ExtraArguments, span);
        }
    }
}
