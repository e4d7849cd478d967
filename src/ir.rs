// src/ir.rs
//! The typed input tree handed over by a front-end compiler.
//!
//! A [`Unit`] is one input file after parsing and type checking: flat arenas
//! of declarations plus the nested statement/expression trees of routine
//! bodies. The extraction engine only ever reads this structure; it is built
//! elsewhere and arrives fully resolved (every reference is a typed index
//! into one of the arenas).

use serde::{Deserialize, Serialize};

/// Source location of a node (1-indexed lines/columns, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Index of a class-like declaration in [`Unit::classes`].
    ClassId
);
arena_id!(
    /// Index of a routine (function or constructor) in [`Unit::routines`].
    RoutineId
);
arena_id!(
    /// Index of a value declaration (local, parameter, receiver) in [`Unit::values`].
    ValueId
);
arena_id!(
    /// Index of a field in [`Unit::fields`].
    FieldId
);
arena_id!(
    /// Index of a property in [`Unit::properties`].
    PropertyId
);
arena_id!(
    /// Index of an enum constant in [`Unit::enum_constants`].
    EnumConstId
);
arena_id!(
    /// Index of a type alias in [`Unit::type_aliases`].
    TypeAliasId
);
arena_id!(
    /// Index of an initializer block in [`Unit::init_blocks`].
    InitBlockId
);
arena_id!(
    /// Index of a type parameter in [`Unit::type_params`].
    TypeParamId
);
arena_id!(
    /// Identity of one statement/expression node within a unit. Break and
    /// continue name their target loop by its `NodeId`.
    NodeId
);

/// One input file, fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Path of the source file, as the front end reported it.
    pub path: String,
    pub classes: Vec<Class>,
    pub routines: Vec<Routine>,
    pub values: Vec<ValueDecl>,
    pub fields: Vec<Field>,
    pub properties: Vec<Property>,
    pub enum_constants: Vec<EnumConst>,
    pub type_aliases: Vec<TypeAlias>,
    pub init_blocks: Vec<InitBlock>,
    pub type_params: Vec<TypeParam>,
    /// Declarations at file scope, in source order.
    pub top_level: Vec<Member>,
}

impl Unit {
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }
    pub fn routine(&self, id: RoutineId) -> &Routine {
        &self.routines[id.index()]
    }
    pub fn value(&self, id: ValueId) -> &ValueDecl {
        &self.values[id.index()]
    }
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }
    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.index()]
    }
    pub fn enum_const(&self, id: EnumConstId) -> &EnumConst {
        &self.enum_constants[id.index()]
    }
    pub fn type_alias(&self, id: TypeAliasId) -> &TypeAlias {
        &self.type_aliases[id.index()]
    }
    pub fn init_block(&self, id: InitBlockId) -> &InitBlock {
        &self.init_blocks[id.index()]
    }
    pub fn type_param(&self, id: TypeParamId) -> &TypeParam {
        &self.type_params[id.index()]
    }
}

/// A member of a class body or the file scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Class(ClassId),
    Routine(RoutineId),
    Property(PropertyId),
    Field(FieldId),
    EnumConst(EnumConstId),
    TypeAlias(TypeAliasId),
    InitBlock(InitBlockId),
}

/// Shape of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    /// A singleton object declaration; `companion` marks the companion form
    /// nested inside another class.
    Object { companion: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    /// Dotted package path; empty for the root package.
    pub package: String,
    pub kind: ClassKind,
    /// Enclosing class, if this is a nested declaration.
    pub enclosing: Option<ClassId>,
    pub type_params: Vec<TypeParamId>,
    pub supertypes: Vec<TypeRef>,
    pub members: Vec<Member>,
    /// True for body-less declarations imported from a dependency.
    pub is_external: bool,
    pub span: Span,
}

/// Whether a routine is an ordinary function or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineKind {
    Function,
    Constructor,
}

/// Where a routine is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineParent {
    Class(ClassId),
    /// Package-level routine in the named package.
    Package,
    /// Local routine declared inside another routine's body.
    Routine(RoutineId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    /// Package of the routine itself (for package-level routines) or of its
    /// owning class. Builtin-call recognition matches on this.
    pub package: String,
    pub kind: RoutineKind,
    pub parent: RoutineParent,
    pub type_params: Vec<TypeParamId>,
    /// Ordinary value parameters, in declaration order.
    pub params: Vec<ValueId>,
    /// Extension receiver parameter, if the routine extends a type.
    pub extension_receiver: Option<ValueId>,
    /// Implicit instance receiver for member routines.
    pub dispatch_receiver: Option<ValueId>,
    pub return_type: TypeRef,
    pub body: Option<Body>,
    pub span: Span,
}

impl Routine {
    pub fn is_local(&self) -> bool {
        matches!(self.parent, RoutineParent::Routine(_))
    }
}

/// A routine body: ordinary statements, or a compiler-synthesized body for
/// enum reflection members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Body {
    Block { stmts: Vec<Stmt>, span: Span },
    Synthetic(SyntheticBodyKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntheticBodyKind {
    EnumValues,
    EnumValueOf,
}

/// What kind of value a [`ValueDecl`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Local,
    Param,
    /// The implicit `this` parameter of a member routine.
    RoutineReceiver,
    /// The instance receiver a class provides to its own member bodies.
    /// Reads of it denote the instance of `owner` (possibly an outer class).
    ClassReceiver { owner: ClassId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueDecl {
    pub name: String,
    pub ty: TypeRef,
    pub kind: ValueKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub owner: ClassId,
    pub is_static: bool,
    /// Field initializer expression, when the source declares one.
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub owner: ClassId,
    pub is_mutable: bool,
    /// Structurally final: no override can replace its accessors.
    pub is_final: bool,
    pub is_external: bool,
    pub getter: Option<RoutineId>,
    pub setter: Option<RoutineId>,
    pub backing_field: Option<FieldId>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConst {
    pub name: String,
    pub owner: ClassId,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    pub package: String,
    pub type_params: Vec<TypeParamId>,
    pub target: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitBlock {
    pub is_static: bool,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeParamParent {
    Class(ClassId),
    Routine(RoutineId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub index: u32,
    pub parent: TypeParamParent,
    pub span: Span,
}

/// Builtin value types of the `lang` package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Unit,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Any,
    Nothing,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Unit => "Unit",
            Builtin::Boolean => "Boolean",
            Builtin::Char => "Char",
            Builtin::Byte => "Byte",
            Builtin::Short => "Short",
            Builtin::Int => "Int",
            Builtin::Long => "Long",
            Builtin::Float => "Float",
            Builtin::Double => "Double",
            Builtin::String => "String",
            Builtin::Any => "Any",
            Builtin::Nothing => "Nothing",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Builtin::Byte
                | Builtin::Short
                | Builtin::Int
                | Builtin::Long
                | Builtin::Float
                | Builtin::Double
        )
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Builtin { builtin: Builtin, nullable: bool },
    Class {
        class: ClassId,
        args: Vec<TypeRef>,
        nullable: bool,
    },
    TypeParam { param: TypeParamId, nullable: bool },
    /// An array of the element type.
    Array { element: Box<TypeRef>, nullable: bool },
}

impl TypeRef {
    pub fn builtin(builtin: Builtin) -> Self {
        TypeRef::Builtin {
            builtin,
            nullable: false,
        }
    }

    pub fn class(class: ClassId) -> Self {
        TypeRef::Class {
            class,
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            TypeRef::Builtin { nullable, .. }
            | TypeRef::Class { nullable, .. }
            | TypeRef::TypeParam { nullable, .. }
            | TypeRef::Array { nullable, .. } => *nullable,
        }
    }
}

/// A statement inside a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// Declaration of a local variable, optionally initialized.
    Local {
        var: ValueId,
        init: Option<Expr>,
        span: Span,
    },
    /// Declaration of a local routine; extraction synthesizes a closure
    /// class for it.
    LocalRoutine { routine: RoutineId, span: Span },
}

/// Origin tag a front end attaches to desugared nodes. Extraction uses it to
/// recognize which surface operator a lowered call stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOrigin {
    Add,
    Sub,
    Div,
    Rem,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eq,
    RefEq,
    NotEq,
    NotRefEq,
    NotNull,
    If,
}

/// Constant values carried by literal nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConstValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

/// Type-operator forms: casts and instance tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOperator {
    Cast,
    ImplicitCast,
    ImplicitNotNull,
    CoerceToUnit,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub ty: TypeRef,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenBranch {
    pub condition: Expr,
    pub result: Expr,
    pub is_else: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catch {
    pub param: ValueId,
    pub handler: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Sequence of statements in expression position.
    Block { stmts: Vec<Stmt> },
    Const(ConstValue),
    /// Concatenation of string parts, kept undesugared.
    StringTemplate { parts: Vec<Expr> },
    /// Read of a local, parameter or receiver.
    GetValue { target: ValueId },
    GetField { target: FieldId },
    GetEnumConst { target: EnumConstId },
    /// Read of a singleton object's instance.
    GetSingleton { class: ClassId },
    SetValue { target: ValueId, value: Box<Expr> },
    SetField { target: FieldId, value: Box<Expr> },
    Call {
        target: RoutineId,
        origin: Option<CallOrigin>,
        dispatch_receiver: Option<Box<Expr>>,
        extension_receiver: Option<Box<Expr>>,
        /// Positional arguments; an absent entry is a hole the front end
        /// left unfilled (defaulted argument).
        args: Vec<Option<Expr>>,
        type_args: Vec<TypeRef>,
    },
    ConstructorCall {
        target: RoutineId,
        args: Vec<Option<Expr>>,
        /// Instance qualifier for constructing an inner class.
        qualifier: Option<Box<Expr>>,
        type_args: Vec<TypeRef>,
    },
    /// Constructor call inside an enum constant's initialization.
    EnumConstructorCall {
        target: RoutineId,
        args: Vec<Option<Expr>>,
    },
    /// Constructor delegating to another constructor of this class or a
    /// superclass.
    DelegatingConstructorCall {
        target: RoutineId,
        args: Vec<Option<Expr>>,
        dispatch_receiver: Option<Box<Expr>>,
    },
    /// Call site of the synthesized instance-initializer routine.
    InstanceInit { class: ClassId },
    When {
        branches: Vec<WhenBranch>,
        origin: Option<CallOrigin>,
    },
    While {
        condition: Box<Expr>,
        body: Option<Box<Expr>>,
    },
    DoWhile {
        condition: Box<Expr>,
        body: Option<Box<Expr>>,
    },
    Break {
        /// Node id of the enclosing loop this jump targets.
        target: NodeId,
        label: Option<String>,
    },
    Continue {
        target: NodeId,
        label: Option<String>,
    },
    Return { value: Box<Expr> },
    Throw { value: Box<Expr> },
    Try {
        body: Box<Expr>,
        catches: Vec<Catch>,
        finally: Option<Box<Expr>>,
    },
    GetClass { argument: Box<Expr> },
    TypeOp {
        op: TypeOperator,
        operand: Box<Expr>,
        type_operand: TypeRef,
    },
    Vararg { elements: Vec<Expr> },
}
