// src/extractor/declarations.rs
//! Declaration extraction: classes, routines, fields, properties, enum
//! constants and type aliases, recursing into members and bodies.

use crate::errors::Diag;
use crate::facts::FactSink;
use crate::ir::{
    ClassId, ClassKind, EnumConstId, FieldId, Member, PropertyId, RoutineId, RoutineKind,
    TypeAliasId, TypeParamId, TypeParamParent, TypeRef, ValueId,
};
use crate::labels::Label;

use super::types::erase_ref;
use super::{Extractor, TypeContext, TypeUse};

impl<S: FactSink> Extractor<'_, S> {
    pub(crate) fn extract_member(&mut self, member: Member, parent: Label) {
        match member {
            Member::Class(id) => {
                self.extract_class(id);
            }
            Member::Routine(id) => {
                self.extract_routine(id, parent);
            }
            Member::Property(id) => self.extract_property(id, parent),
            Member::Field(id) => {
                self.extract_field(id, parent);
            }
            Member::EnumConst(id) => self.extract_enum_const(id, parent),
            Member::TypeAlias(id) => self.extract_type_alias(id),
            Member::InitBlock(_) => {
                // folded into the synthesized initializer routine
            }
        }
    }

    pub(crate) fn extract_class(&mut self, id: ClassId) -> Label {
        let unit = self.unit;
        let c = unit.class(id);
        let label = self.class_label(id);
        let pkg = self.extract_package(&c.package);
        if matches!(c.kind, ClassKind::Interface) {
            self.facts.interface(label, &c.name, pkg, label);
        } else {
            self.facts.class(label, &c.name, pkg, label);
            if matches!(c.kind, ClassKind::Enum) {
                self.facts.is_enum_type(label);
            }
        }
        let loc = self.location(c.span);
        self.facts.has_location(label, loc);

        if let Some(outer) = c.enclosing {
            let outer_label = self.class_label(outer);
            self.facts.enclosing_reftype(label, outer_label);
            if matches!(c.kind, ClassKind::Object { companion: true }) {
                // the enclosing class carries a fabricated static field
                // holding the companion instance
                if let Some(instance) = self.companion_instance(id) {
                    let ty = self.use_type(&TypeRef::class(id), TypeContext::Ordinary);
                    self.facts
                        .field(instance.label, &instance.name, ty.erased, ty.precise, outer_label);
                    self.facts.has_location(instance.label, loc);
                    self.emit_synthetic_modifiers(instance.label);
                    self.facts
                        .class_companion_object(outer_label, instance.label, label);
                }
            }
        }

        for &tp in &c.type_params {
            self.extract_type_param(tp);
        }
        for &member in &c.members {
            self.extract_member(member, label);
        }
        self.extract_init_routine(id, label);

        if matches!(c.kind, ClassKind::Object { companion: false }) {
            // singleton objects expose a fabricated static INSTANCE field
            let instance = self.object_instance(id);
            let ty = self.use_type(&TypeRef::class(id), TypeContext::Ordinary);
            self.facts
                .field(instance.label, &instance.name, ty.erased, ty.precise, label);
            self.facts.has_location(instance.label, loc);
            self.emit_synthetic_modifiers(instance.label);
            self.facts.class_object(label, instance.label);
        }

        self.extract_supertypes(id, label);
        label
    }

    fn extract_supertypes(&mut self, id: ClassId, label: Label) {
        let unit = self.unit;
        let c = unit.class(id);
        for supertype in &c.supertypes {
            let sup = self.use_type(supertype, TypeContext::Ordinary);
            let super_is_interface = match supertype {
                TypeRef::Class { class, .. } => {
                    matches!(unit.class(*class).kind, ClassKind::Interface)
                }
                _ => false,
            };
            if super_is_interface && !matches!(c.kind, ClassKind::Interface) {
                self.facts.impl_interface(label, sup.precise);
            } else {
                self.facts.extends_reftype(label, sup.precise);
            }
        }
    }

    pub(crate) fn extract_type_param(&mut self, id: TypeParamId) -> Label {
        let unit = self.unit;
        let tp = unit.type_param(id);
        let label = self.type_param_label(id);
        let parent = match tp.parent {
            TypeParamParent::Class(c) => self.class_label(c),
            TypeParamParent::Routine(r) => self.routine_label(r),
        };
        self.facts.type_var(label, &tp.name, tp.index as i32, parent);
        let loc = self.location(tp.span);
        self.facts.has_location(label, loc);
        label
    }

    pub(crate) fn extract_routine(&mut self, id: RoutineId, parent: Label) -> Label {
        let unit = self.unit;
        let r = unit.routine(id);
        let previous = self.current_routine.replace(id);

        for &tp in &r.type_params {
            self.extract_type_param(tp);
        }
        let loc = self.location(r.span);
        let label = self.routine_label(id);

        let offset = if r.extension_receiver.is_some() { 1 } else { 0 };
        let mut param_sigs = Vec::new();
        for (i, &param) in r.params.iter().enumerate() {
            let ty = self.extract_value_param(param, label, i as i32 + offset);
            param_sigs.push(ty.signature);
        }
        if let Some(ext) = r.extension_receiver {
            // the extended type's receiver occupies position 0
            let ext_ty = unit.value(ext).ty.clone();
            let ext_use = self.use_type(&ext_ty, TypeContext::Ordinary);
            self.facts
                .extension_routine(label, ext_use.erased, ext_use.precise);
            let ty = self.extract_value_param(ext, label, 0);
            param_sigs.insert(0, ty.signature);
        }

        let name = self.routine_display_name(id);
        let signature = format!("{name}({})", param_sigs.join(","));
        match r.kind {
            RoutineKind::Constructor => {
                let ret = self.use_type(&erase_ref(&r.return_type), TypeContext::Return);
                self.facts
                    .constructor(label, &name, &signature, ret.erased, ret.precise, parent, label);
            }
            RoutineKind::Function => {
                let ret = self.use_type(&r.return_type, TypeContext::Return);
                self.facts
                    .routine(label, &name, &signature, ret.erased, ret.precise, parent, label);
            }
        }
        self.facts.has_location(label, loc);

        if let Some(body) = &r.body {
            self.extract_body(body, label);
        }

        self.current_routine = previous;
        label
    }

    pub(crate) fn extract_value_param(
        &mut self,
        value: ValueId,
        routine: Label,
        idx: i32,
    ) -> TypeUse {
        let unit = self.unit;
        let decl = unit.value(value);
        let label = self
            .labels
            .intern(&format!("params;{{{routine}}};{idx}"));
        self.value_labels.insert(value, label);
        let ty = self.use_type(&decl.ty, TypeContext::Ordinary);
        self.facts.param(label, ty.erased, ty.precise, idx, routine);
        let loc = self.location(decl.span);
        self.facts.has_location(label, loc);
        self.facts.param_name(label, &decl.name);
        ty
    }

    pub(crate) fn extract_field(&mut self, id: FieldId, parent: Label) -> Label {
        let unit = self.unit;
        let f = unit.field(id);
        let label = self.field_label(id);
        let ty = self.use_type(&f.ty, TypeContext::Ordinary);
        self.facts
            .field(label, &f.name, ty.erased, ty.precise, parent);
        let loc = self.location(f.span);
        self.facts.has_location(label, loc);
        label
    }

    pub(crate) fn extract_property(&mut self, id: PropertyId, parent: Label) {
        let unit = self.unit;
        let p = unit.property(id);
        let label = self.property_label(id);
        self.facts.property(label, &p.name);
        let loc = self.location(p.span);
        self.facts.has_location(label, loc);

        match p.getter {
            Some(getter) => {
                let getter_label = self.extract_routine(getter, parent);
                self.facts.property_getter(label, getter_label);
            }
            None if p.is_external || p.is_final => {}
            None => self.report(
                Diag::PropertyWithoutGetter {
                    name: p.name.clone(),
                },
                p.span,
            ),
        }
        match p.setter {
            Some(setter) => {
                if !p.is_mutable {
                    self.report(
                        Diag::ImmutablePropertyWithSetter {
                            name: p.name.clone(),
                        },
                        p.span,
                    );
                }
                let setter_label = self.extract_routine(setter, parent);
                self.facts.property_setter(label, setter_label);
            }
            None if !p.is_mutable || p.is_external || p.is_final => {}
            None => self.report(
                Diag::MutablePropertyWithoutSetter {
                    name: p.name.clone(),
                },
                p.span,
            ),
        }
        if let Some(backing) = p.backing_field {
            let field_label = self.extract_field(backing, parent);
            self.facts.property_backing_field(label, field_label);
        }
    }

    pub(crate) fn extract_enum_const(&mut self, id: EnumConstId, parent: Label) {
        let unit = self.unit;
        let ec = unit.enum_const(id);
        let owner = unit.class(ec.owner);
        if !matches!(owner.kind, ClassKind::Enum) {
            self.report(
                Diag::EnumConstOwnerNotEnum {
                    name: ec.name.clone(),
                },
                ec.span,
            );
            return;
        }
        if !owner.type_params.is_empty() {
            self.report(
                Diag::EnumOwnerHasTypeParams {
                    name: owner.name.clone(),
                },
                ec.span,
            );
            return;
        }
        let label = self.enum_const_label(id);
        let ty = self.use_type(&TypeRef::class(ec.owner), TypeContext::Ordinary);
        self.facts
            .field(label, &ec.name, ty.erased, ty.precise, parent);
        let loc = self.location(ec.span);
        self.facts.has_location(label, loc);
    }

    pub(crate) fn extract_type_alias(&mut self, id: TypeAliasId) {
        let unit = self.unit;
        let ta = unit.type_alias(id);
        if !ta.type_params.is_empty() {
            // extracted without its parameters
            self.report(
                Diag::AliasTypeParams {
                    name: ta.name.clone(),
                },
                ta.span,
            );
        }
        let label = self
            .labels
            .intern(&format!("type_alias;{};{}", ta.package, ta.name));
        let target = self.use_type(&ta.target, TypeContext::Ordinary);
        self.facts.type_alias(label, &ta.name, target.precise);
        let loc = self.location(ta.span);
        self.facts.has_location(label, loc);
    }
}
