// src/extractor/tests.rs

use super::{Extractor, TypeContext};
use crate::errors::{Diag, DiagnosticLog};
use crate::facts::{MemorySink, Relation, StmtTag, Value};
use crate::ir::*;
use crate::labels::Label;

const SPAN: Span = Span {
    line: 1,
    column: 1,
    end_line: 1,
    end_column: 2,
};

struct UnitBuilder {
    unit: Unit,
    next_node: u32,
}

impl UnitBuilder {
    fn new() -> Self {
        Self {
            unit: Unit {
                path: "demo/main.q".to_string(),
                classes: Vec::new(),
                routines: Vec::new(),
                values: Vec::new(),
                fields: Vec::new(),
                properties: Vec::new(),
                enum_constants: Vec::new(),
                type_aliases: Vec::new(),
                init_blocks: Vec::new(),
                type_params: Vec::new(),
                top_level: Vec::new(),
            },
            next_node: 0,
        }
    }

    fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn expr(&mut self, ty: TypeRef, kind: ExprKind) -> Expr {
        Expr {
            id: self.node(),
            ty,
            span: SPAN,
            kind,
        }
    }

    fn int_lit(&mut self, v: i32) -> Expr {
        self.expr(int_ty(), ExprKind::Const(ConstValue::Int(v)))
    }

    fn bool_lit(&mut self, v: bool) -> Expr {
        self.expr(
            TypeRef::builtin(Builtin::Boolean),
            ExprKind::Const(ConstValue::Bool(v)),
        )
    }

    fn class(&mut self, name: &str, package: &str, kind: ClassKind) -> ClassId {
        let id = ClassId(self.unit.classes.len() as u32);
        self.unit.classes.push(Class {
            name: name.to_string(),
            package: package.to_string(),
            kind,
            enclosing: None,
            type_params: Vec::new(),
            supertypes: Vec::new(),
            members: Vec::new(),
            is_external: false,
            span: SPAN,
        });
        id
    }

    fn nest(&mut self, inner: ClassId, outer: ClassId) {
        self.unit.classes[inner.index()].enclosing = Some(outer);
    }

    fn external(&mut self, class: ClassId) {
        self.unit.classes[class.index()].is_external = true;
    }

    fn routine(
        &mut self,
        name: &str,
        package: &str,
        kind: RoutineKind,
        parent: RoutineParent,
        return_type: TypeRef,
    ) -> RoutineId {
        let id = RoutineId(self.unit.routines.len() as u32);
        self.unit.routines.push(Routine {
            name: name.to_string(),
            package: package.to_string(),
            kind,
            parent,
            type_params: Vec::new(),
            params: Vec::new(),
            extension_receiver: None,
            dispatch_receiver: None,
            return_type,
            body: None,
            span: SPAN,
        });
        id
    }

    fn value(&mut self, name: &str, ty: TypeRef, kind: ValueKind) -> ValueId {
        let id = ValueId(self.unit.values.len() as u32);
        self.unit.values.push(ValueDecl {
            name: name.to_string(),
            ty,
            kind,
            span: SPAN,
        });
        id
    }

    fn param_of(&mut self, routine: RoutineId, name: &str, ty: TypeRef) -> ValueId {
        let value = self.value(name, ty, ValueKind::Param);
        self.unit.routines[routine.index()].params.push(value);
        value
    }

    fn field(&mut self, name: &str, ty: TypeRef, owner: ClassId, init: Option<Expr>) -> FieldId {
        let id = FieldId(self.unit.fields.len() as u32);
        self.unit.fields.push(Field {
            name: name.to_string(),
            ty,
            owner,
            is_static: false,
            init,
            span: SPAN,
        });
        id
    }

    fn property(&mut self, name: &str, owner: ClassId, is_mutable: bool) -> PropertyId {
        let id = PropertyId(self.unit.properties.len() as u32);
        self.unit.properties.push(Property {
            name: name.to_string(),
            owner,
            is_mutable,
            is_final: false,
            is_external: false,
            getter: None,
            setter: None,
            backing_field: None,
            span: SPAN,
        });
        id
    }

    fn type_param(&mut self, name: &str, index: u32, parent: TypeParamParent) -> TypeParamId {
        let id = TypeParamId(self.unit.type_params.len() as u32);
        self.unit.type_params.push(TypeParam {
            name: name.to_string(),
            index,
            parent,
            span: SPAN,
        });
        id
    }

    fn enum_const(&mut self, name: &str, owner: ClassId) -> EnumConstId {
        let id = EnumConstId(self.unit.enum_constants.len() as u32);
        self.unit.enum_constants.push(EnumConst {
            name: name.to_string(),
            owner,
            span: SPAN,
        });
        id
    }

    fn init_block(&mut self, stmts: Vec<Stmt>) -> InitBlockId {
        let id = InitBlockId(self.unit.init_blocks.len() as u32);
        self.unit.init_blocks.push(InitBlock {
            is_static: false,
            stmts,
            span: SPAN,
        });
        id
    }

    fn body(&mut self, routine: RoutineId, stmts: Vec<Stmt>) {
        self.unit.routines[routine.index()].body = Some(Body::Block { stmts, span: SPAN });
    }

    fn member_of(&mut self, class: ClassId, member: Member) {
        self.unit.classes[class.index()].members.push(member);
    }

    fn top(&mut self, member: Member) {
        self.unit.top_level.push(member);
    }

    /// Package-level `main` with the given body, registered at file scope.
    fn main_routine(&mut self, stmts: Vec<Stmt>) -> RoutineId {
        let main = self.routine(
            "main",
            "demo",
            RoutineKind::Function,
            RoutineParent::Package,
            unit_ty(),
        );
        self.body(main, stmts);
        self.top(Member::Routine(main));
        main
    }

    /// External `lang.Int` stub with its `plus` member, as a front end
    /// would declare it for builtin arithmetic.
    fn lang_int_plus(&mut self) -> RoutineId {
        let int_class = self.class("Int", "lang", ClassKind::Class);
        self.external(int_class);
        let plus = self.routine(
            "plus",
            "lang",
            RoutineKind::Function,
            RoutineParent::Class(int_class),
            int_ty(),
        );
        self.param_of(plus, "other", int_ty());
        plus
    }

    /// A compiler-inserted marker routine of the internal package.
    fn intrinsic(&mut self, name: &str, return_type: TypeRef) -> RoutineId {
        self.routine(
            name,
            "lang.internal",
            RoutineKind::Function,
            RoutineParent::Package,
            return_type,
        )
    }

    fn finish(self) -> Unit {
        self.unit
    }
}

fn int_ty() -> TypeRef {
    TypeRef::builtin(Builtin::Int)
}

fn unit_ty() -> TypeRef {
    TypeRef::builtin(Builtin::Unit)
}

fn extract(unit: &Unit) -> (MemorySink, DiagnosticLog) {
    let mut extractor = Extractor::new(unit, MemorySink::new());
    extractor.extract();
    extractor.finish()
}

fn label(value: &Value) -> Label {
    match value {
        Value::Label(l) => *l,
        other => panic!("expected a label, got {other:?}"),
    }
}

fn text(value: &Value) -> &str {
    match value {
        Value::Text(s) => s,
        other => panic!("expected text, got {other:?}"),
    }
}

fn int(value: &Value) -> i64 {
    match value {
        Value::Int(n) => *n,
        other => panic!("expected an integer, got {other:?}"),
    }
}

/// `stmts` rows with the given tag.
fn stmts_with_tag<'a>(sink: &'a MemorySink, tag: StmtTag) -> Vec<&'a [Value]> {
    sink.relation(Relation::Stmts)
        .into_iter()
        .filter(|row| text(&row[1]) == tag.name())
        .collect()
}

/// `stmts` rows under a parent, ordered by position.
fn stmts_under<'a>(sink: &'a MemorySink, parent: Label) -> Vec<&'a [Value]> {
    let mut rows: Vec<_> = sink
        .relation(Relation::Stmts)
        .into_iter()
        .filter(|row| label(&row[2]) == parent)
        .collect();
    rows.sort_by_key(|row| int(&row[3]));
    rows
}

/// `exprs` rows under a parent, ordered by position.
fn exprs_under<'a>(sink: &'a MemorySink, parent: Label) -> Vec<&'a [Value]> {
    let mut rows: Vec<_> = sink
        .relation(Relation::Exprs)
        .into_iter()
        .filter(|row| label(&row[4]) == parent)
        .collect();
    rows.sort_by_key(|row| int(&row[5]));
    rows
}

fn exprs_with_tag<'a>(sink: &'a MemorySink, tag: &str) -> Vec<&'a [Value]> {
    sink.relation(Relation::Exprs)
        .into_iter()
        .filter(|row| text(&row[1]) == tag)
        .collect()
}

#[test]
fn singleton_object_gets_instance_field() {
    let mut b = UnitBuilder::new();
    let config = b.class("Config", "demo", ClassKind::Object { companion: false });
    b.top(Member::Class(config));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let classes = sink.relation(Relation::Classes);
    let class_row = classes.iter().find(|r| text(&r[1]) == "Config").unwrap();
    let class_id = label(&class_row[0]);

    let fields = sink.relation(Relation::Fields);
    let instance = fields.iter().find(|r| text(&r[1]) == "INSTANCE").unwrap();
    let instance_id = label(&instance[0]);
    assert_eq!(label(&instance[2]), class_id, "typed as the singleton");
    assert_eq!(label(&instance[4]), class_id, "owned by the singleton");

    let objects = sink.relation(Relation::ClassObject);
    assert_eq!(objects.len(), 1);
    assert_eq!(label(&objects[0][0]), class_id);
    assert_eq!(label(&objects[0][1]), instance_id);

    let modifiers: Vec<&str> = sink
        .relation(Relation::Modifiers)
        .into_iter()
        .filter(|r| label(&r[0]) == instance_id)
        .map(|r| text(&r[1]))
        .collect();
    assert_eq!(modifiers, ["public", "static", "final"]);
}

#[test]
fn companion_object_field_lands_on_enclosing_type() {
    let mut b = UnitBuilder::new();
    let owner = b.class("Box", "demo", ClassKind::Class);
    let companion = b.class("Companion", "demo", ClassKind::Object { companion: true });
    b.nest(companion, owner);
    b.member_of(owner, Member::Class(companion));
    b.top(Member::Class(owner));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let classes = sink.relation(Relation::Classes);
    let owner_id = label(&classes.iter().find(|r| text(&r[1]) == "Box").unwrap()[0]);
    let companion_id = label(
        &classes
            .iter()
            .find(|r| text(&r[1]) == "Companion")
            .unwrap()[0],
    );

    let fields = sink.relation(Relation::Fields);
    let instance = fields.iter().find(|r| text(&r[1]) == "Companion").unwrap();
    assert_eq!(label(&instance[4]), owner_id, "field lives on the enclosing type");

    let rows = sink.relation(Relation::ClassCompanionObject);
    assert_eq!(rows.len(), 1);
    assert_eq!(label(&rows[0][0]), owner_id);
    assert_eq!(label(&rows[0][1]), label(&instance[0]));
    assert_eq!(label(&rows[0][2]), companion_id);
}

#[test]
fn init_routine_aggregates_initializers_in_declaration_order() {
    let mut b = UnitBuilder::new();
    let holder = b.class("Holder", "demo", ClassKind::Class);
    let first_init = b.int_lit(1);
    let a = b.field("a", int_ty(), holder, Some(first_init));
    let block_stmt = b.int_lit(7);
    let block = b.init_block(vec![Stmt::Expr(block_stmt)]);
    let second_init = b.int_lit(2);
    let c = b.field("c", int_ty(), holder, Some(second_init));
    b.member_of(holder, Member::Field(a));
    b.member_of(holder, Member::InitBlock(block));
    b.member_of(holder, Member::Field(c));
    b.top(Member::Class(holder));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let routines = sink.relation(Relation::Routines);
    let obinit = routines.iter().find(|r| text(&r[1]) == "<obinit>").unwrap();
    let obinit_id = label(&obinit[0]);

    let block_row = stmts_with_tag(&sink, StmtTag::Block)
        .into_iter()
        .find(|r| label(&r[2]) == obinit_id)
        .unwrap();
    let block_id = label(&block_row[0]);

    let body = stmts_under(&sink, block_id);
    assert_eq!(body.len(), 3);
    let mut leading: Vec<String> = Vec::new();
    for (i, row) in body.iter().enumerate() {
        assert_eq!(int(&row[3]), i as i64);
        let children = exprs_under(&sink, label(&row[0]));
        leading.push(text(&children[0][1]).to_string());
    }
    // two initializer assignments interleaved with the block's statement
    assert_eq!(leading, ["assign", "int_lit", "assign"]);
}

#[test]
fn sibling_loops_resolve_their_own_breaks() {
    let mut b = UnitBuilder::new();
    let make_loop = |b: &mut UnitBuilder| {
        let loop_node = b.node();
        let brk = b.expr(
            unit_ty(),
            ExprKind::Break {
                target: loop_node,
                label: None,
            },
        );
        let body = b.expr(unit_ty(), ExprKind::Block { stmts: vec![Stmt::Expr(brk)] });
        let condition = b.bool_lit(true);
        Expr {
            id: loop_node,
            ty: unit_ty(),
            span: SPAN,
            kind: ExprKind::While {
                condition: Box::new(condition),
                body: Some(Box::new(body)),
            },
        }
    };
    let first = make_loop(&mut b);
    let second = make_loop(&mut b);
    b.main_routine(vec![Stmt::Expr(first), Stmt::Expr(second)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let loops = stmts_with_tag(&sink, StmtTag::While);
    assert_eq!(loops.len(), 2);
    assert_eq!(sink.count(Relation::JumpTarget), 2);

    for loop_row in loops {
        let loop_id = label(&loop_row[0]);
        let body_block = stmts_under(&sink, loop_id)
            .into_iter()
            .find(|r| text(&r[1]) == "block")
            .unwrap();
        let brk = stmts_under(&sink, label(&body_block[0]))
            .into_iter()
            .find(|r| text(&r[1]) == "break")
            .unwrap();
        let jump = sink
            .relation(Relation::JumpTarget)
            .into_iter()
            .find(|r| label(&r[0]) == label(&brk[0]))
            .unwrap();
        assert_eq!(label(&jump[1]), loop_id, "break targets its own loop");
    }
}

#[test]
fn break_outside_loop_logs_severe_and_emits_no_edge() {
    let mut b = UnitBuilder::new();
    let stray = b.node();
    let brk = b.expr(
        unit_ty(),
        ExprKind::Break {
            target: stray,
            label: None,
        },
    );
    b.main_routine(vec![Stmt::Expr(brk)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert_eq!(sink.count(Relation::JumpTarget), 0);
    assert!(log.any(|d| matches!(d, Diag::MissingLoopTarget)));
    assert!(log.severe_count() > 0);
}

#[test]
fn numeric_plus_resugars_to_add() {
    let mut b = UnitBuilder::new();
    let plus = b.lang_int_plus();
    let lhs = b.int_lit(1);
    let rhs = b.int_lit(2);
    let call = b.expr(
        int_ty(),
        ExprKind::Call {
            target: plus,
            origin: Some(CallOrigin::Add),
            dispatch_receiver: Some(Box::new(lhs)),
            extension_receiver: None,
            args: vec![Some(rhs)],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let adds = exprs_with_tag(&sink, "add");
    assert_eq!(adds.len(), 1);
    assert!(exprs_with_tag(&sink, "call").is_empty());

    let operands = exprs_under(&sink, label(&adds[0][0]));
    assert_eq!(operands.len(), 2);
    assert_eq!(int(&operands[0][5]), 0);
    assert_eq!(text(&operands[0][1]), "int_lit");
    assert_eq!(int(&operands[1][5]), 1);
    assert_eq!(text(&operands[1][1]), "int_lit");
}

#[test]
fn mismatched_origin_still_resugars_but_logs_severe() {
    let mut b = UnitBuilder::new();
    let plus = b.lang_int_plus();
    let lhs = b.int_lit(1);
    let rhs = b.int_lit(2);
    let call = b.expr(
        int_ty(),
        ExprKind::Call {
            target: plus,
            origin: Some(CallOrigin::Sub),
            dispatch_receiver: Some(Box::new(lhs)),
            extension_receiver: None,
            args: vec![Some(rhs)],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert_eq!(exprs_with_tag(&sink, "add").len(), 1);
    assert!(log.any(|d| matches!(d, Diag::OriginMismatch { .. })));
}

#[test]
fn comparison_intrinsic_resugars_over_value_arguments() {
    let mut b = UnitBuilder::new();
    let less = b.intrinsic("less", TypeRef::builtin(Builtin::Boolean));
    let lhs = b.int_lit(1);
    let rhs = b.int_lit(2);
    let call = b.expr(
        TypeRef::builtin(Builtin::Boolean),
        ExprKind::Call {
            target: less,
            origin: Some(CallOrigin::Less),
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![Some(lhs), Some(rhs)],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());
    let lts = exprs_with_tag(&sink, "lt");
    assert_eq!(lts.len(), 1);
    let operands = exprs_under(&sink, label(&lts[0][0]));
    assert_eq!(operands.len(), 2);
}

#[test]
fn missing_operand_leaves_position_unfilled() {
    let mut b = UnitBuilder::new();
    let less = b.intrinsic("less", TypeRef::builtin(Builtin::Boolean));
    let lhs = b.int_lit(1);
    let call = b.expr(
        TypeRef::builtin(Builtin::Boolean),
        ExprKind::Call {
            target: less,
            origin: Some(CallOrigin::Less),
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![Some(lhs), None],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    let lts = exprs_with_tag(&sink, "lt");
    assert_eq!(lts.len(), 1);
    let operands = exprs_under(&sink, label(&lts[0][0]));
    assert_eq!(operands.len(), 1, "only the left operand is attached");
    assert!(log.any(|d| matches!(d, Diag::MissingOperand { .. })));
}

#[test]
fn not_null_intrinsic_resugars_to_unary_entity() {
    let mut b = UnitBuilder::new();
    let check = b.intrinsic("checkNotNull", int_ty());
    let operand = b.int_lit(5);
    let call = b.expr(
        int_ty(),
        ExprKind::Call {
            target: check,
            origin: Some(CallOrigin::NotNull),
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![Some(operand)],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());
    let rows = exprs_with_tag(&sink, "not_null");
    assert_eq!(rows.len(), 1);
    let operands = exprs_under(&sink, label(&rows[0][0]));
    assert_eq!(operands.len(), 1);
    assert_eq!(int(&operands[0][5]), 0);
}

#[test]
fn unhandled_intrinsic_is_reported_and_skipped() {
    let mut b = UnitBuilder::new();
    let marker = b.intrinsic("logicalAnd", TypeRef::builtin(Builtin::Boolean));
    let call = b.expr(
        TypeRef::builtin(Builtin::Boolean),
        ExprKind::Call {
            target: marker,
            origin: None,
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![],
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(exprs_with_tag(&sink, "call").is_empty());
    assert!(log.any(|d| matches!(d, Diag::UnhandledBuiltin { .. })));
}

#[test]
fn expression_in_statement_position_gets_one_wrapper() {
    let mut b = UnitBuilder::new();
    let lit = b.int_lit(42);
    b.main_routine(vec![Stmt::Expr(lit)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let wrappers = stmts_with_tag(&sink, StmtTag::Expr);
    assert_eq!(wrappers.len(), 1);
    let inner = exprs_under(&sink, label(&wrappers[0][0]));
    assert_eq!(inner.len(), 1);
    assert_eq!(int(&inner[0][5]), 0, "wrapped entity sits at the fixed inner position");
    assert_eq!(text(&inner[0][1]), "int_lit");
}

#[test]
fn statement_in_expression_position_gets_one_wrapper() {
    let mut b = UnitBuilder::new();
    let block = b.expr(int_ty(), ExprKind::Block { stmts: vec![] });
    let ret = b.expr(
        TypeRef::builtin(Builtin::Nothing),
        ExprKind::Return {
            value: Box::new(block),
        },
    );
    b.main_routine(vec![Stmt::Expr(ret)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let wrappers = exprs_with_tag(&sink, "stmt_wrapper");
    assert_eq!(wrappers.len(), 1);
    let return_row = &stmts_with_tag(&sink, StmtTag::Return)[0];
    assert_eq!(label(&wrappers[0][4]), label(&return_row[0]));
    assert_eq!(int(&wrappers[0][5]), 0);

    let wrapped = stmts_under(&sink, label(&wrappers[0][0]));
    assert_eq!(wrapped.len(), 1);
    assert_eq!(text(&wrapped[0][1]), "block");
    assert_eq!(int(&wrapped[0][3]), 0);
}

#[test]
fn cast_and_instance_test_order_children_differently() {
    let mut b = UnitBuilder::new();
    let cast_operand = b.int_lit(1);
    let cast = b.expr(
        int_ty(),
        ExprKind::TypeOp {
            op: TypeOperator::Cast,
            operand: Box::new(cast_operand),
            type_operand: int_ty(),
        },
    );
    let test_operand = b.int_lit(2);
    let test = b.expr(
        TypeRef::builtin(Builtin::Boolean),
        ExprKind::TypeOp {
            op: TypeOperator::InstanceOf,
            operand: Box::new(test_operand),
            type_operand: int_ty(),
        },
    );
    b.main_routine(vec![Stmt::Expr(cast), Stmt::Expr(test)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let cast_row = &exprs_with_tag(&sink, "cast")[0];
    let cast_children = exprs_under(&sink, label(&cast_row[0]));
    assert_eq!(text(&cast_children[0][1]), "type_access");
    assert_eq!(text(&cast_children[1][1]), "int_lit");

    let test_row = &exprs_with_tag(&sink, "instance_of")[0];
    let test_children = exprs_under(&sink, label(&test_row[0]));
    assert_eq!(text(&test_children[0][1]), "int_lit");
    assert_eq!(text(&test_children[1][1]), "type_access");
}

#[test]
fn constructor_call_uses_conventional_negative_positions() {
    let mut b = UnitBuilder::new();
    let owner = b.class("Box", "demo", ClassKind::Class);
    let ctor = b.routine(
        "<init>",
        "demo",
        RoutineKind::Constructor,
        RoutineParent::Class(owner),
        TypeRef::class(owner),
    );
    b.param_of(ctor, "size", int_ty());
    b.member_of(owner, Member::Routine(ctor));
    b.top(Member::Class(owner));

    let arg = b.int_lit(9);
    let call = b.expr(
        TypeRef::class(owner),
        ExprKind::ConstructorCall {
            target: ctor,
            args: vec![Some(arg)],
            qualifier: None,
            type_args: vec![],
        },
    );
    b.main_routine(vec![Stmt::Expr(call)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    let news = exprs_with_tag(&sink, "new");
    assert_eq!(news.len(), 1);
    let new_id = label(&news[0][0]);
    let children = exprs_under(&sink, new_id);
    assert_eq!(int(&children[0][5]), -3);
    assert_eq!(text(&children[0][1]), "type_access");
    assert_eq!(int(&children[1][5]), 0);
    assert_eq!(text(&children[1][1]), "int_lit");

    let ctor_row = &sink.relation(Relation::Constructors)[0];
    let binding = sink
        .relation(Relation::CallableBinding)
        .into_iter()
        .find(|r| label(&r[0]) == new_id)
        .unwrap();
    assert_eq!(label(&binding[1]), label(&ctor_row[0]));
}

#[test]
fn same_class_delegation_is_a_constructor_invocation() {
    let mut b = UnitBuilder::new();
    let owner = b.class("Box", "demo", ClassKind::Class);
    let primary = b.routine(
        "<init>",
        "demo",
        RoutineKind::Constructor,
        RoutineParent::Class(owner),
        TypeRef::class(owner),
    );
    b.param_of(primary, "size", int_ty());
    let secondary = b.routine(
        "<init>",
        "demo",
        RoutineKind::Constructor,
        RoutineParent::Class(owner),
        TypeRef::class(owner),
    );
    let arg = b.int_lit(1);
    let delegate = b.expr(
        unit_ty(),
        ExprKind::DelegatingConstructorCall {
            target: primary,
            args: vec![Some(arg)],
            dispatch_receiver: None,
        },
    );
    b.body(secondary, vec![Stmt::Expr(delegate)]);
    b.member_of(owner, Member::Routine(primary));
    b.member_of(owner, Member::Routine(secondary));
    b.top(Member::Class(owner));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());
    assert_eq!(stmts_with_tag(&sink, StmtTag::CtorInvoke).len(), 1);
    assert!(stmts_with_tag(&sink, StmtTag::SuperCtorInvoke).is_empty());
}

#[test]
fn local_routine_call_goes_through_synthesized_closure() {
    let mut b = UnitBuilder::new();
    let main = b.routine(
        "main",
        "demo",
        RoutineKind::Function,
        RoutineParent::Package,
        unit_ty(),
    );
    let helper = b.routine(
        "helper",
        "demo",
        RoutineKind::Function,
        RoutineParent::Routine(main),
        unit_ty(),
    );
    b.body(helper, vec![]);
    let call = b.expr(
        unit_ty(),
        ExprKind::Call {
            target: helper,
            origin: None,
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![],
            type_args: vec![],
        },
    );
    b.body(
        main,
        vec![
            Stmt::LocalRoutine {
                routine: helper,
                span: SPAN,
            },
            Stmt::Expr(call),
        ],
    );
    b.top(Member::Routine(main));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());

    // the package-less closure class, its constructor, and the super call
    let closure = sink
        .relation(Relation::Classes)
        .into_iter()
        .find(|r| text(&r[1]).is_empty())
        .unwrap();
    let closure_id = label(&closure[0]);
    let ctor_row = &sink.relation(Relation::Constructors)[0];
    assert_eq!(label(&ctor_row[5]), closure_id);
    assert_eq!(stmts_with_tag(&sink, StmtTag::SuperCtorInvoke).len(), 1);

    let decl_stmt = stmts_with_tag(&sink, StmtTag::LocalTypeDecl);
    assert_eq!(decl_stmt.len(), 1);
    let link = &sink.relation(Relation::StmtTypeDecl)[0];
    assert_eq!(label(&link[1]), closure_id);

    // the call binds the closure member and constructs the closure type
    let calls = exprs_with_tag(&sink, "call");
    assert_eq!(calls.len(), 1);
    let call_id = label(&calls[0][0]);
    let news = exprs_with_tag(&sink, "new");
    assert_eq!(news.len(), 1);
    assert_eq!(label(&news[0][4]), call_id);
    assert_eq!(int(&news[0][5]), -1);
    let new_binding = sink
        .relation(Relation::CallableBinding)
        .into_iter()
        .find(|r| label(&r[0]) == label(&news[0][0]))
        .unwrap();
    assert_eq!(label(&new_binding[1]), label(&ctor_row[0]));
}

#[test]
fn enum_constant_on_generic_owner_is_skipped() {
    let mut b = UnitBuilder::new();
    let shades = b.class("Shade", "demo", ClassKind::Enum);
    let tp = b.type_param("T", 0, TypeParamParent::Class(shades));
    b.unit.classes[shades.index()].type_params.push(tp);
    let red = b.enum_const("RED", shades);
    b.member_of(shades, Member::EnumConst(red));
    b.top(Member::Class(shades));
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.any(|d| matches!(d, Diag::EnumOwnerHasTypeParams { .. })));
    assert!(
        !sink
            .relation(Relation::Fields)
            .iter()
            .any(|r| text(&r[1]) == "RED"),
        "unsupported constant is skipped"
    );
}

#[test]
fn property_without_getter_is_reported() {
    let mut b = UnitBuilder::new();
    let owner = b.class("Holder", "demo", ClassKind::Class);
    let title = b.property("title", owner, false);
    b.member_of(owner, Member::Property(title));
    b.top(Member::Class(owner));
    let unit = b.finish();

    let (_, log) = extract(&unit);
    assert!(log.any(|d| matches!(d, Diag::PropertyWithoutGetter { .. })));
}

#[test]
fn type_uses_are_memoized_per_context() {
    let b = UnitBuilder::new();
    let unit = b.finish();
    let mut extractor = Extractor::new(&unit, MemorySink::new());
    let ty = TypeRef::Builtin {
        builtin: Builtin::Int,
        nullable: true,
    };
    let first = extractor.use_type(&ty, TypeContext::Ordinary);
    let second = extractor.use_type(&ty, TypeContext::Ordinary);
    assert_eq!(first.erased, second.erased);
    assert_eq!(first.precise, second.precise);
    assert_ne!(first.erased, first.precise);
    let (sink, _) = extractor.finish();
    // one description row per distinct type id, not per resolution
    assert_eq!(sink.count(Relation::Types), 2);
}

#[test]
fn extraction_is_deterministic_across_runs() {
    let build = || {
        let mut b = UnitBuilder::new();
        let holder = b.class("Holder", "demo", ClassKind::Class);
        let init = b.int_lit(3);
        let count = b.field("count", int_ty(), holder, Some(init));
        b.member_of(holder, Member::Field(count));
        b.top(Member::Class(holder));
        let lit = b.int_lit(42);
        b.main_routine(vec![Stmt::Expr(lit)]);
        b.finish()
    };
    let (first, _) = extract(&build());
    let (second, _) = extract(&build());
    assert_eq!(first.rows(), second.rows());
}

#[test]
fn every_expression_names_its_enclosing_routine_and_statement() {
    let mut b = UnitBuilder::new();
    let lhs = b.int_lit(1);
    let tmpl_part = b.expr(
        TypeRef::builtin(Builtin::String),
        ExprKind::Const(ConstValue::Str("x".to_string())),
    );
    let tmpl = b.expr(
        TypeRef::builtin(Builtin::String),
        ExprKind::StringTemplate {
            parts: vec![tmpl_part],
        },
    );
    b.main_routine(vec![Stmt::Expr(lhs), Stmt::Expr(tmpl)]);
    let unit = b.finish();

    let (sink, log) = extract(&unit);
    assert!(log.is_empty());
    let exprs = sink.relation(Relation::Exprs);
    let routine_edges = sink.count(Relation::EnclosingRoutine);
    let stmt_edges = sink.count(Relation::EnclosingStmt);
    assert_eq!(routine_edges, exprs.len());
    assert_eq!(stmt_edges, exprs.len());
}
