// src/facts.rs
//! The relational fact base the engine appends to.
//!
//! A [`FactSink`] is an append-only destination for typed tuples; the
//! [`Facts`] facade exposes one emit method per relation so call sites stay
//! schema-checked. The engine ships two sinks: [`MemorySink`] for tests and
//! [`TextSink`] writing one `relation(col,…)` line per tuple.

use std::fmt;
use std::io::{self, Write};

use crate::labels::Label;

/// Every relation in the fact schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Classes,
    Interfaces,
    IsEnumType,
    IsParameterized,
    Erasure,
    TypeArgs,
    Types,
    ExtendsReftype,
    ImplInterface,
    EnclosingReftype,
    ClassObject,
    ClassCompanionObject,
    TypeVars,
    Routines,
    Constructors,
    ExtensionRoutine,
    Params,
    ParamName,
    Fields,
    Properties,
    PropertyGetters,
    PropertySetters,
    PropertyBackingFields,
    TypeAliases,
    Packages,
    Files,
    Locations,
    HasLocation,
    Stmts,
    Exprs,
    EnclosingRoutine,
    EnclosingStmt,
    CallableBinding,
    VariableBinding,
    LocalVars,
    NameStrings,
    WhenIf,
    WhenBranch,
    WhenBranchElse,
    JumpTarget,
    SyntheticBody,
    Modifiers,
    StmtTypeDecl,
}

impl Relation {
    pub fn name(self) -> &'static str {
        match self {
            Relation::Classes => "classes",
            Relation::Interfaces => "interfaces",
            Relation::IsEnumType => "is_enum_type",
            Relation::IsParameterized => "is_parameterized",
            Relation::Erasure => "erasure",
            Relation::TypeArgs => "type_args",
            Relation::Types => "types",
            Relation::ExtendsReftype => "extends_reftype",
            Relation::ImplInterface => "impl_interface",
            Relation::EnclosingReftype => "enclosing_reftype",
            Relation::ClassObject => "class_object",
            Relation::ClassCompanionObject => "class_companion_object",
            Relation::TypeVars => "type_vars",
            Relation::Routines => "routines",
            Relation::Constructors => "constructors",
            Relation::ExtensionRoutine => "extension_routine",
            Relation::Params => "params",
            Relation::ParamName => "param_name",
            Relation::Fields => "fields",
            Relation::Properties => "properties",
            Relation::PropertyGetters => "property_getters",
            Relation::PropertySetters => "property_setters",
            Relation::PropertyBackingFields => "property_backing_fields",
            Relation::TypeAliases => "type_aliases",
            Relation::Packages => "packages",
            Relation::Files => "files",
            Relation::Locations => "locations",
            Relation::HasLocation => "has_location",
            Relation::Stmts => "stmts",
            Relation::Exprs => "exprs",
            Relation::EnclosingRoutine => "enclosing_routine",
            Relation::EnclosingStmt => "enclosing_stmt",
            Relation::CallableBinding => "callable_binding",
            Relation::VariableBinding => "variable_binding",
            Relation::LocalVars => "local_vars",
            Relation::NameStrings => "name_strings",
            Relation::WhenIf => "when_if",
            Relation::WhenBranch => "when_branch",
            Relation::WhenBranchElse => "when_branch_else",
            Relation::JumpTarget => "jump_target",
            Relation::SyntheticBody => "synthetic_body",
            Relation::Modifiers => "modifiers",
            Relation::StmtTypeDecl => "stmt_type_decl",
        }
    }

    /// All relations, in schema order. Used by the `relations` command.
    pub fn all() -> &'static [Relation] {
        use Relation::*;
        &[
            Classes,
            Interfaces,
            IsEnumType,
            IsParameterized,
            Erasure,
            TypeArgs,
            Types,
            ExtendsReftype,
            ImplInterface,
            EnclosingReftype,
            ClassObject,
            ClassCompanionObject,
            TypeVars,
            Routines,
            Constructors,
            ExtensionRoutine,
            Params,
            ParamName,
            Fields,
            Properties,
            PropertyGetters,
            PropertySetters,
            PropertyBackingFields,
            TypeAliases,
            Packages,
            Files,
            Locations,
            HasLocation,
            Stmts,
            Exprs,
            EnclosingRoutine,
            EnclosingStmt,
            CallableBinding,
            VariableBinding,
            LocalVars,
            NameStrings,
            WhenIf,
            WhenBranch,
            WhenBranchElse,
            JumpTarget,
            SyntheticBody,
            Modifiers,
            StmtTypeDecl,
        ]
    }
}

/// Kind column of the `stmts` relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtTag {
    Block,
    Expr,
    LocalDecl,
    While,
    DoWhile,
    Throw,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    CtorInvoke,
    SuperCtorInvoke,
    LocalTypeDecl,
}

impl StmtTag {
    pub fn name(self) -> &'static str {
        match self {
            StmtTag::Block => "block",
            StmtTag::Expr => "expr",
            StmtTag::LocalDecl => "local_decl",
            StmtTag::While => "while",
            StmtTag::DoWhile => "do_while",
            StmtTag::Throw => "throw",
            StmtTag::Break => "break",
            StmtTag::Continue => "continue",
            StmtTag::Return => "return",
            StmtTag::Try => "try",
            StmtTag::Catch => "catch",
            StmtTag::CtorInvoke => "ctor_invoke",
            StmtTag::SuperCtorInvoke => "super_ctor_invoke",
            StmtTag::LocalTypeDecl => "local_type_decl",
        }
    }
}

/// Kind column of the `exprs` relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprTag {
    Add,
    Sub,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    NotNull,
    Call,
    New,
    IntLit,
    LongLit,
    FloatLit,
    DoubleLit,
    BoolLit,
    CharLit,
    StringLit,
    NullLit,
    StringTemplate,
    VarAccess,
    ThisAccess,
    Assign,
    LocalDecl,
    When,
    GetClass,
    Cast,
    ImplicitCast,
    ImplicitNotNull,
    CoerceToUnit,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
    TypeAccess,
    ArrayNew,
    ArrayInit,
    Vararg,
    /// Wrapper holding a statement that occurs in expression position.
    StmtWrapper,
}

impl ExprTag {
    pub fn name(self) -> &'static str {
        match self {
            ExprTag::Add => "add",
            ExprTag::Sub => "sub",
            ExprTag::Div => "div",
            ExprTag::Rem => "rem",
            ExprTag::Lt => "lt",
            ExprTag::Le => "le",
            ExprTag::Gt => "gt",
            ExprTag::Ge => "ge",
            ExprTag::Eq => "eq",
            ExprTag::Ne => "ne",
            ExprTag::NotNull => "not_null",
            ExprTag::Call => "call",
            ExprTag::New => "new",
            ExprTag::IntLit => "int_lit",
            ExprTag::LongLit => "long_lit",
            ExprTag::FloatLit => "float_lit",
            ExprTag::DoubleLit => "double_lit",
            ExprTag::BoolLit => "bool_lit",
            ExprTag::CharLit => "char_lit",
            ExprTag::StringLit => "string_lit",
            ExprTag::NullLit => "null_lit",
            ExprTag::StringTemplate => "string_template",
            ExprTag::VarAccess => "var_access",
            ExprTag::ThisAccess => "this_access",
            ExprTag::Assign => "assign",
            ExprTag::LocalDecl => "local_decl",
            ExprTag::When => "when",
            ExprTag::GetClass => "get_class",
            ExprTag::Cast => "cast",
            ExprTag::ImplicitCast => "implicit_cast",
            ExprTag::ImplicitNotNull => "implicit_not_null",
            ExprTag::CoerceToUnit => "coerce_to_unit",
            ExprTag::SafeCast => "safe_cast",
            ExprTag::InstanceOf => "instance_of",
            ExprTag::NotInstanceOf => "not_instance_of",
            ExprTag::TypeAccess => "type_access",
            ExprTag::ArrayNew => "array_new",
            ExprTag::ArrayInit => "array_init",
            ExprTag::Vararg => "vararg",
            ExprTag::StmtWrapper => "stmt_wrapper",
        }
    }
}

/// One column of a tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Label(Label),
    Int(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Label(label) => write!(f, "{label}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        _ => write!(f, "{ch}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<Label> for Value {
    fn from(label: Label) -> Self {
        Value::Label(label)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Append-only destination for fact tuples.
pub trait FactSink {
    fn write(&mut self, relation: Relation, row: Vec<Value>);
}

/// Sink collecting rows in memory; the test workhorse.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<(Relation, Vec<Value>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[(Relation, Vec<Value>)] {
        &self.rows
    }

    /// Rows of one relation, in emission order.
    pub fn relation(&self, relation: Relation) -> Vec<&[Value]> {
        self.rows
            .iter()
            .filter(|(r, _)| *r == relation)
            .map(|(_, row)| row.as_slice())
            .collect()
    }

    pub fn count(&self, relation: Relation) -> usize {
        self.rows.iter().filter(|(r, _)| *r == relation).count()
    }
}

impl FactSink for MemorySink {
    fn write(&mut self, relation: Relation, row: Vec<Value>) {
        self.rows.push((relation, row));
    }
}

/// Sink writing one line per tuple to any `io::Write`.
pub struct TextSink<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// The first write error, if any occurred. Checked once at the end of a
    /// run rather than per tuple.
    pub fn finish(mut self) -> io::Result<W> {
        match self.error.take() {
            Some(e) => Err(e),
            None => {
                self.out.flush()?;
                Ok(self.out)
            }
        }
    }
}

impl<W: Write> FactSink for TextSink<W> {
    fn write(&mut self, relation: Relation, row: Vec<Value>) {
        if self.error.is_some() {
            return;
        }
        let mut line = String::from(relation.name());
        line.push('(');
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&value.to_string());
        }
        line.push_str(")\n");
        if let Err(e) = self.out.write_all(line.as_bytes()) {
            self.error = Some(e);
        }
    }
}

/// Schema-checked emit methods, one per relation. The leading column is
/// always the subject label.
pub struct Facts<S: FactSink> {
    sink: S,
}

impl<S: FactSink> Facts<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn emit(&mut self, relation: Relation, row: Vec<Value>) {
        self.sink.write(relation, row);
    }

    pub fn class(&mut self, id: Label, name: &str, pkg: Label, source: Label) {
        self.emit(
            Relation::Classes,
            vec![id.into(), name.into(), pkg.into(), source.into()],
        );
    }

    pub fn interface(&mut self, id: Label, name: &str, pkg: Label, source: Label) {
        self.emit(
            Relation::Interfaces,
            vec![id.into(), name.into(), pkg.into(), source.into()],
        );
    }

    pub fn is_enum_type(&mut self, id: Label) {
        self.emit(Relation::IsEnumType, vec![id.into()]);
    }

    pub fn is_parameterized(&mut self, id: Label) {
        self.emit(Relation::IsParameterized, vec![id.into()]);
    }

    pub fn erasure(&mut self, id: Label, erased: Label) {
        self.emit(Relation::Erasure, vec![id.into(), erased.into()]);
    }

    pub fn type_arg(&mut self, arg: Label, idx: i32, parent: Label) {
        self.emit(
            Relation::TypeArgs,
            vec![arg.into(), idx.into(), parent.into()],
        );
    }

    /// Textual description of a type id, emitted once per distinct id.
    pub fn type_entity(&mut self, id: Label, signature: &str) {
        self.emit(Relation::Types, vec![id.into(), signature.into()]);
    }

    pub fn extends_reftype(&mut self, sub: Label, sup: Label) {
        self.emit(Relation::ExtendsReftype, vec![sub.into(), sup.into()]);
    }

    pub fn impl_interface(&mut self, sub: Label, iface: Label) {
        self.emit(Relation::ImplInterface, vec![sub.into(), iface.into()]);
    }

    pub fn enclosing_reftype(&mut self, inner: Label, outer: Label) {
        self.emit(Relation::EnclosingReftype, vec![inner.into(), outer.into()]);
    }

    pub fn class_object(&mut self, class: Label, instance: Label) {
        self.emit(Relation::ClassObject, vec![class.into(), instance.into()]);
    }

    pub fn class_companion_object(&mut self, parent: Label, instance: Label, companion: Label) {
        self.emit(
            Relation::ClassCompanionObject,
            vec![parent.into(), instance.into(), companion.into()],
        );
    }

    pub fn type_var(&mut self, id: Label, name: &str, idx: i32, parent: Label) {
        self.emit(
            Relation::TypeVars,
            vec![id.into(), name.into(), idx.into(), parent.into()],
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn routine(
        &mut self,
        id: Label,
        name: &str,
        signature: &str,
        ret_erased: Label,
        ret_precise: Label,
        parent: Label,
        source: Label,
    ) {
        self.emit(
            Relation::Routines,
            vec![
                id.into(),
                name.into(),
                signature.into(),
                ret_erased.into(),
                ret_precise.into(),
                parent.into(),
                source.into(),
            ],
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn constructor(
        &mut self,
        id: Label,
        name: &str,
        signature: &str,
        ret_erased: Label,
        ret_precise: Label,
        parent: Label,
        source: Label,
    ) {
        self.emit(
            Relation::Constructors,
            vec![
                id.into(),
                name.into(),
                signature.into(),
                ret_erased.into(),
                ret_precise.into(),
                parent.into(),
                source.into(),
            ],
        );
    }

    pub fn extension_routine(&mut self, id: Label, recv_erased: Label, recv_precise: Label) {
        self.emit(
            Relation::ExtensionRoutine,
            vec![id.into(), recv_erased.into(), recv_precise.into()],
        );
    }

    pub fn param(
        &mut self,
        id: Label,
        ty_erased: Label,
        ty_precise: Label,
        idx: i32,
        routine: Label,
    ) {
        self.emit(
            Relation::Params,
            vec![
                id.into(),
                ty_erased.into(),
                ty_precise.into(),
                idx.into(),
                routine.into(),
                id.into(),
            ],
        );
    }

    pub fn param_name(&mut self, id: Label, name: &str) {
        self.emit(Relation::ParamName, vec![id.into(), name.into()]);
    }

    pub fn field(
        &mut self,
        id: Label,
        name: &str,
        ty_erased: Label,
        ty_precise: Label,
        parent: Label,
    ) {
        self.emit(
            Relation::Fields,
            vec![
                id.into(),
                name.into(),
                ty_erased.into(),
                ty_precise.into(),
                parent.into(),
                id.into(),
            ],
        );
    }

    pub fn property(&mut self, id: Label, name: &str) {
        self.emit(Relation::Properties, vec![id.into(), name.into()]);
    }

    pub fn property_getter(&mut self, prop: Label, getter: Label) {
        self.emit(Relation::PropertyGetters, vec![prop.into(), getter.into()]);
    }

    pub fn property_setter(&mut self, prop: Label, setter: Label) {
        self.emit(Relation::PropertySetters, vec![prop.into(), setter.into()]);
    }

    pub fn property_backing_field(&mut self, prop: Label, field: Label) {
        self.emit(
            Relation::PropertyBackingFields,
            vec![prop.into(), field.into()],
        );
    }

    pub fn type_alias(&mut self, id: Label, name: &str, target: Label) {
        self.emit(
            Relation::TypeAliases,
            vec![id.into(), name.into(), target.into()],
        );
    }

    pub fn package(&mut self, id: Label, name: &str) {
        self.emit(Relation::Packages, vec![id.into(), name.into()]);
    }

    pub fn file(&mut self, id: Label, path: &str) {
        self.emit(Relation::Files, vec![id.into(), path.into()]);
    }

    pub fn location(
        &mut self,
        id: Label,
        file: Label,
        start_line: i32,
        start_col: i32,
        end_line: i32,
        end_col: i32,
    ) {
        self.emit(
            Relation::Locations,
            vec![
                id.into(),
                file.into(),
                start_line.into(),
                start_col.into(),
                end_line.into(),
                end_col.into(),
            ],
        );
    }

    pub fn has_location(&mut self, id: Label, loc: Label) {
        self.emit(Relation::HasLocation, vec![id.into(), loc.into()]);
    }

    pub fn stmt(&mut self, id: Label, tag: StmtTag, parent: Label, idx: i32, routine: Label) {
        self.emit(
            Relation::Stmts,
            vec![
                id.into(),
                tag.name().into(),
                parent.into(),
                idx.into(),
                routine.into(),
            ],
        );
    }

    pub fn expr(
        &mut self,
        id: Label,
        tag: ExprTag,
        ty_erased: Label,
        ty_precise: Label,
        parent: Label,
        idx: i32,
    ) {
        self.emit(
            Relation::Exprs,
            vec![
                id.into(),
                tag.name().into(),
                ty_erased.into(),
                ty_precise.into(),
                parent.into(),
                idx.into(),
            ],
        );
    }

    pub fn enclosing_routine(&mut self, expr: Label, routine: Label) {
        self.emit(Relation::EnclosingRoutine, vec![expr.into(), routine.into()]);
    }

    pub fn enclosing_stmt(&mut self, expr: Label, stmt: Label) {
        self.emit(Relation::EnclosingStmt, vec![expr.into(), stmt.into()]);
    }

    pub fn callable_binding(&mut self, caller: Label, callee: Label) {
        self.emit(Relation::CallableBinding, vec![caller.into(), callee.into()]);
    }

    pub fn variable_binding(&mut self, access: Label, decl: Label) {
        self.emit(Relation::VariableBinding, vec![access.into(), decl.into()]);
    }

    pub fn local_var(
        &mut self,
        id: Label,
        name: &str,
        ty_erased: Label,
        ty_precise: Label,
        decl_expr: Label,
    ) {
        self.emit(
            Relation::LocalVars,
            vec![
                id.into(),
                name.into(),
                ty_erased.into(),
                ty_precise.into(),
                decl_expr.into(),
            ],
        );
    }

    pub fn name_string(&mut self, id: Label, text: &str) {
        self.emit(Relation::NameStrings, vec![id.into(), text.into()]);
    }

    pub fn when_if(&mut self, id: Label) {
        self.emit(Relation::WhenIf, vec![id.into()]);
    }

    pub fn when_branch(&mut self, branch: Label, parent: Label, idx: i32) {
        self.emit(
            Relation::WhenBranch,
            vec![branch.into(), parent.into(), idx.into()],
        );
    }

    pub fn when_branch_else(&mut self, branch: Label) {
        self.emit(Relation::WhenBranchElse, vec![branch.into()]);
    }

    pub fn jump_target(&mut self, jump: Label, target: Label) {
        self.emit(Relation::JumpTarget, vec![jump.into(), target.into()]);
    }

    pub fn synthetic_body(&mut self, routine: Label, kind: i32) {
        self.emit(Relation::SyntheticBody, vec![routine.into(), kind.into()]);
    }

    pub fn modifier(&mut self, id: Label, name: &str) {
        self.emit(Relation::Modifiers, vec![id.into(), name.into()]);
    }

    /// Links a local type-declaration statement to the class it declares.
    pub fn stmt_type_decl(&mut self, stmt: Label, class: Label) {
        self.emit(Relation::StmtTypeDecl, vec![stmt.into(), class.into()]);
    }
}
