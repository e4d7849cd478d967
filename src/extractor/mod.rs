// src/extractor/mod.rs
//! Lowering of a typed [`Unit`] into relational facts.
//!
//! The extractor walks declarations top-down and hands routine bodies to the
//! statement/expression walker. Every emitted entity gets a label from the
//! [`LabelStore`]; declaration labels are interned from structural keys so a
//! later reference re-derives the same identity, while statements,
//! expressions and synthesized wrappers get fresh labels. All traversal
//! state is owned by the `Extractor` value, so independent units can be
//! extracted by independent instances.

mod declarations;
mod expr;
mod slots;
mod stmt;
mod synthesis;
mod types;

#[cfg(test)]
mod tests;

pub use slots::{ExprSlot, Slot, StmtSlot};
pub use types::{TypeContext, TypeUse};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{Diag, DiagnosticLog};
use crate::facts::{FactSink, Facts};
use crate::ir::{
    ClassId, FieldId, NodeId, PropertyId, RoutineId, RoutineKind, RoutineParent, Span,
    TypeParamId, TypeParamParent, TypeRef, Unit, ValueId,
};
use crate::labels::{Label, LabelStore};

use synthesis::ClosureIds;

pub struct Extractor<'a, S: FactSink> {
    unit: &'a Unit,
    labels: LabelStore,
    facts: Facts<S>,
    log: DiagnosticLog,
    file_label: Label,
    /// Innermost-loop labels keyed by the loop expression's node id. Entries
    /// live exactly as long as the loop's own extraction.
    loop_targets: FxHashMap<NodeId, Label>,
    /// Memoized type-use resolutions. Hits must return the ids produced the
    /// first time, because those ids feed structural keys elsewhere.
    type_uses: FxHashMap<(TypeRef, TypeContext), TypeUse>,
    routine_labels: FxHashMap<RoutineId, Label>,
    /// Labels of parameters and locals once declared, for access binding.
    value_labels: FxHashMap<ValueId, Label>,
    /// Fabricated identities per local routine.
    closures: FxHashMap<RoutineId, ClosureIds>,
    closures_emitted: FxHashSet<RoutineId>,
    packages_emitted: FxHashSet<Label>,
    /// External classes whose shallow declaration row has been written.
    externals_emitted: FxHashSet<ClassId>,
    current_routine: Option<RoutineId>,
}

impl<'a, S: FactSink> Extractor<'a, S> {
    pub fn new(unit: &'a Unit, sink: S) -> Self {
        let mut labels = LabelStore::new();
        let mut facts = Facts::new(sink);
        let file_label = labels.intern(&format!("file;{}", unit.path));
        facts.file(file_label, &unit.path);
        Self {
            unit,
            labels,
            facts,
            log: DiagnosticLog::new(),
            file_label,
            loop_targets: FxHashMap::default(),
            type_uses: FxHashMap::default(),
            routine_labels: FxHashMap::default(),
            value_labels: FxHashMap::default(),
            closures: FxHashMap::default(),
            closures_emitted: FxHashSet::default(),
            packages_emitted: FxHashSet::default(),
            externals_emitted: FxHashSet::default(),
            current_routine: None,
        }
    }

    /// Extract every top-level declaration of the unit.
    pub fn extract(&mut self) {
        let unit = self.unit;
        for member in &unit.top_level {
            self.extract_member(*member, self.file_label);
        }
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn finish(self) -> (S, DiagnosticLog) {
        (self.facts.into_sink(), self.log)
    }

    pub(crate) fn report(&mut self, diag: Diag, span: Span) {
        self.log.report(diag, Some(span));
    }

    /// Location label for a span, interned and written once.
    pub(crate) fn location(&mut self, span: Span) -> Label {
        let key = format!(
            "loc;{{{}}};{};{};{};{}",
            self.file_label, span.line, span.column, span.end_line, span.end_column
        );
        if let Some(label) = self.labels.get(&key) {
            return label;
        }
        let label = self.labels.intern(&key);
        self.facts.location(
            label,
            self.file_label,
            span.line as i32,
            span.column as i32,
            span.end_line as i32,
            span.end_column as i32,
        );
        label
    }

    /// Package label, interned and written once. The empty name is the root
    /// package.
    pub(crate) fn extract_package(&mut self, name: &str) -> Label {
        let label = self.labels.intern(&format!("package;{name}"));
        if self.packages_emitted.insert(label) {
            self.facts.package(label, name);
        }
        label
    }

    /// Dotted-and-nested qualified name of a class: `pkg.Outer$Inner`.
    pub(crate) fn qualified_class_name(&self, id: ClassId) -> String {
        let unit = self.unit;
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let class = unit.class(c);
            segments.push(class.name.as_str());
            current = class.enclosing;
        }
        segments.reverse();
        let path = segments.join("$");
        let pkg = &unit.class(id).package;
        if pkg.is_empty() {
            path
        } else {
            format!("{pkg}.{path}")
        }
    }

    pub(crate) fn class_label(&mut self, id: ClassId) -> Label {
        let key = format!("class;{}", self.qualified_class_name(id));
        self.labels.intern(&key)
    }

    /// Routine name as it appears in the fact base: constructors take their
    /// class's name.
    pub(crate) fn routine_display_name(&self, id: RoutineId) -> String {
        let unit = self.unit;
        let r = unit.routine(id);
        match (r.kind, r.parent) {
            (RoutineKind::Constructor, RoutineParent::Class(c)) => unit.class(c).name.clone(),
            _ => r.name.clone(),
        }
    }

    /// Joined erased parameter signatures: `(lang.Int,demo.Box)`. Pure text,
    /// so structural keys never depend on labels that are still being
    /// assigned.
    pub(crate) fn routine_signature_text(&self, id: RoutineId) -> String {
        let unit = self.unit;
        let r = unit.routine(id);
        let mut parts = Vec::new();
        if let Some(ext) = r.extension_receiver {
            parts.push(self.type_signature_text(&unit.value(ext).ty));
        }
        for &param in &r.params {
            parts.push(self.type_signature_text(&unit.value(param).ty));
        }
        format!("({})", parts.join(","))
    }

    /// Erased textual signature of a type.
    pub(crate) fn type_signature_text(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Builtin { builtin, .. } => format!("lang.{}", builtin.name()),
            TypeRef::Class { class, .. } => self.qualified_class_name(*class),
            TypeRef::TypeParam { .. } => "lang.Any".to_string(),
            TypeRef::Array { element, .. } => {
                format!("{}[]", self.type_signature_text(element))
            }
        }
    }

    pub(crate) fn routine_label(&mut self, id: RoutineId) -> Label {
        if let Some(label) = self.routine_labels.get(&id) {
            return *label;
        }
        let unit = self.unit;
        let r = unit.routine(id);
        let label = if r.is_local() {
            self.closure_ids(id).routine
        } else {
            let parent = match r.parent {
                RoutineParent::Class(c) => self.class_label(c),
                RoutineParent::Package | RoutineParent::Routine(_) => {
                    self.extract_package(&r.package)
                }
            };
            let name = self.routine_display_name(id);
            let sig = self.routine_signature_text(id);
            self.labels
                .intern(&format!("callable;{{{parent}}};{name}{sig}"))
        };
        self.routine_labels.insert(id, label);
        label
    }

    pub(crate) fn field_label(&mut self, id: FieldId) -> Label {
        let owner = self.unit.field(id).owner;
        let parent = self.class_label(owner);
        let name = &self.unit.field(id).name;
        self.labels.intern(&format!("field;{{{parent}}};{name}"))
    }

    pub(crate) fn property_label(&mut self, id: PropertyId) -> Label {
        let owner = self.unit.property(id).owner;
        let parent = self.class_label(owner);
        let name = &self.unit.property(id).name;
        self.labels.intern(&format!("property;{{{parent}}};{name}"))
    }

    pub(crate) fn enum_const_label(&mut self, id: crate::ir::EnumConstId) -> Label {
        let owner = self.unit.enum_const(id).owner;
        let parent = self.class_label(owner);
        let name = &self.unit.enum_const(id).name;
        self.labels
            .intern(&format!("enum_const;{{{parent}}};{name}"))
    }

    pub(crate) fn type_param_key(&mut self, id: TypeParamId) -> String {
        let tp = self.unit.type_param(id);
        let parent = match tp.parent {
            TypeParamParent::Class(c) => self.class_label(c),
            TypeParamParent::Routine(r) => self.routine_label(r),
        };
        let name = &self.unit.type_param(id).name;
        format!("typevar;{{{parent}}};{name}")
    }

    pub(crate) fn type_param_label(&mut self, id: TypeParamId) -> Label {
        let key = self.type_param_key(id);
        self.labels.intern(&key)
    }

    /// Structural key of the synthesized instance-initializer routine.
    pub(crate) fn init_routine_label(&mut self, class_label: Label) -> Label {
        self.labels
            .intern(&format!("callable;{{{class_label}}};<obinit>()"))
    }
}
