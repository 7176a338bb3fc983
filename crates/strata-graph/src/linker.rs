//! Builds a [`Graph`] out of the raw records of one import.
//!
//! Linking runs once all records are available. Every name mentioned
//! anywhere (superclasses, member types, annotation values, reference
//! owners) is routed through the [`StubRegistry`], so a name gets the same
//! [`TypeId`] whether or not a record for it exists. Names with a record
//! become imported nodes, the rest become stubs.

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use strata_classfile::{
    Annotation, ClassKind, CodeUnitKind, ConstValue, ElementValue, MemberReference, Modifiers,
    RawClass, RawCodeUnit, RawField, ReferenceKind,
};
use tracing::{debug, warn};

use crate::error::LinkError;
use crate::graph::{Graph, ROOT_TYPE};
use crate::ids::{AccessId, AnnotationId, MemberId, TargetId, TypeId};
use crate::model::{
    Access, AccessKind, AccessTarget, AnnotationNode, AnnotationOwner, AnnotationValue,
    MemberKind, MemberNode, NestedAnnotation, TargetKind, TypeKind, TypeNode,
};
use crate::registry::StubRegistry;

pub const PRIMITIVE_TYPES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// What to do when two structurally different records claim one name.
///
/// Structurally identical duplicates are always collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    Fail,
    FirstWins,
}

#[derive(Debug, Default)]
pub struct Linker {
    registry: StubRegistry,
    duplicates: DuplicatePolicy,
}

impl Linker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues with a registry that readers already populated.
    pub fn with_registry(registry: StubRegistry) -> Self {
        Self {
            registry,
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn link(self, classes: Vec<RawClass>) -> Result<Graph, LinkError> {
        let classes = dedupe(classes, self.duplicates)?;

        let mut builder = Builder::new(&self.registry);
        let root = builder.type_ref(ROOT_TYPE);
        let imported: HashMap<TypeId, usize> = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (builder.type_ref(&class.name), idx))
            .collect();
        let pending: Vec<PendingType> = classes
            .iter()
            .map(|class| builder.link_class(class))
            .collect();

        let Builder {
            interface_hints,
            members,
            annotations,
            targets,
            accesses,
            ..
        } = builder;
        let (names, by_name) = self.registry.into_parts();

        let mut types: Vec<TypeNode> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let id = TypeId::from_idx(idx);
                match imported.get(&id) {
                    Some(&class_idx) => {
                        imported_node(id, root, &classes[class_idx], &pending[class_idx])
                    }
                    None => stub_node(id, root, name, &by_name, &interface_hints),
                }
            })
            .collect();

        let mut edges = Vec::new();
        for node in &types {
            edges.extend(node.supertype.map(|supertype| (supertype, node.id)));
            edges.extend(node.interfaces.iter().map(|interface| (*interface, node.id)));
        }
        for (supertype, subtype) in edges {
            let subtypes = &mut types[supertype.idx()].subtypes;
            if !subtypes.contains(&subtype) {
                subtypes.push(subtype);
            }
        }

        debug!(
            target = "strata.graph",
            types = types.len(),
            imported = classes.len(),
            stubs = types.len() - classes.len(),
            members = members.len(),
            targets = targets.len(),
            accesses = accesses.len(),
            "linked type graph"
        );

        Ok(Graph {
            types,
            by_name,
            members,
            annotations,
            targets,
            accesses,
            root,
            reverse: OnceCell::new(),
            dependency_index: OnceCell::new(),
        })
    }
}

fn dedupe(classes: Vec<RawClass>, policy: DuplicatePolicy) -> Result<Vec<RawClass>, LinkError> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<RawClass> = Vec::with_capacity(classes.len());
    for class in classes {
        let Some(&existing) = positions.get(&class.name) else {
            positions.insert(class.name.clone(), out.len());
            out.push(class);
            continue;
        };
        let Some(reason) = conflict_reason(&out[existing], &class) else {
            continue;
        };
        match policy {
            DuplicatePolicy::Fail => {
                return Err(LinkError::ClassIdentityConflict {
                    name: class.name,
                    reason,
                })
            }
            DuplicatePolicy::FirstWins => warn!(
                target = "strata.graph",
                class = %class.name,
                reason = %reason,
                "ignoring conflicting duplicate definition"
            ),
        }
    }
    Ok(out)
}

/// `None` when both records describe the same structure.
fn conflict_reason(first: &RawClass, second: &RawClass) -> Option<String> {
    if first.kind != second.kind {
        return Some(format!("kind {:?} vs {:?}", first.kind, second.kind));
    }
    if first.super_class != second.super_class {
        return Some(format!(
            "superclass {} vs {}",
            first.super_class.as_deref().unwrap_or("<none>"),
            second.super_class.as_deref().unwrap_or("<none>")
        ));
    }
    if first.interfaces != second.interfaces {
        return Some("interfaces differ".to_string());
    }
    if field_keys(&first.fields) != field_keys(&second.fields) {
        return Some("fields differ".to_string());
    }
    if code_unit_keys(&first.code_units) != code_unit_keys(&second.code_units) {
        return Some("methods differ".to_string());
    }
    None
}

fn field_keys(fields: &[RawField]) -> Vec<(&str, &str)> {
    fields
        .iter()
        .map(|field| (field.name.as_str(), field.descriptor.as_str()))
        .collect()
}

fn code_unit_keys(units: &[RawCodeUnit]) -> Vec<(&str, &str)> {
    units
        .iter()
        .map(|unit| (unit.name.as_str(), unit.descriptor.as_str()))
        .collect()
}

struct PendingType {
    supertype: Option<TypeId>,
    interfaces: Vec<TypeId>,
    enclosing_type: Option<TypeId>,
    members: Vec<MemberId>,
    annotations: Vec<AnnotationId>,
}

struct Builder<'r> {
    registry: &'r StubRegistry,
    /// Stubs known to be interfaces from how they were referenced.
    interface_hints: HashSet<TypeId>,
    members: Vec<MemberNode>,
    annotations: Vec<AnnotationNode>,
    targets: Vec<AccessTarget>,
    target_ids: HashMap<(TargetKind, TypeId, String, String), TargetId>,
    accesses: Vec<Access>,
}

impl<'r> Builder<'r> {
    fn new(registry: &'r StubRegistry) -> Self {
        Self {
            registry,
            interface_hints: HashSet::new(),
            members: Vec::new(),
            annotations: Vec::new(),
            targets: Vec::new(),
            target_ids: HashMap::new(),
            accesses: Vec::new(),
        }
    }

    /// Registers `name`, and for arrays every component type below it.
    fn type_ref(&mut self, name: &str) -> TypeId {
        if let Some(component) = name.strip_suffix("[]") {
            self.type_ref(component);
        }
        self.registry.get_or_create(name)
    }

    fn link_class(&mut self, class: &RawClass) -> PendingType {
        let id = self.type_ref(&class.name);
        let supertype = class.super_class.as_deref().map(|name| self.type_ref(name));
        let interfaces: Vec<TypeId> = class
            .interfaces
            .iter()
            .map(|name| self.type_ref(name))
            .collect();
        self.interface_hints.extend(interfaces.iter().copied());
        let enclosing_type = class
            .enclosing_class
            .as_deref()
            .map(|name| self.type_ref(name));

        let annotations = class
            .annotations
            .iter()
            .map(|annotation| self.annotation(AnnotationOwner::Type(id), annotation))
            .collect();

        let mut members = Vec::with_capacity(class.fields.len() + class.code_units.len());
        for field in &class.fields {
            members.push(self.field(id, class, field));
        }
        for unit in &class.code_units {
            members.push(self.code_unit(id, class, unit));
        }

        PendingType {
            supertype,
            interfaces,
            enclosing_type,
            members,
            annotations,
        }
    }

    fn field(&mut self, owner: TypeId, class: &RawClass, field: &RawField) -> MemberId {
        let id = MemberId::from_idx(self.members.len());
        let return_type = self.type_ref(&field.field_type.java_name());
        let annotations = field
            .annotations
            .iter()
            .map(|annotation| self.annotation(AnnotationOwner::Member(id), annotation))
            .collect();

        self.members.push(MemberNode {
            id,
            owner,
            kind: MemberKind::Field,
            name: field.name.clone(),
            full_name: format!("{}.{}", class.name, field.name),
            descriptor: field.descriptor.clone(),
            parameters: Vec::new(),
            return_type,
            throws: Vec::new(),
            modifiers: field.modifiers,
            signature: field.signature.clone(),
            annotations,
            accesses: Vec::new(),
        });
        id
    }

    fn code_unit(&mut self, owner: TypeId, class: &RawClass, unit: &RawCodeUnit) -> MemberId {
        let id = MemberId::from_idx(self.members.len());
        let parameter_names: Vec<String> = unit
            .method_descriptor
            .params
            .iter()
            .map(|param| param.java_name())
            .collect();
        let parameters = parameter_names
            .iter()
            .map(|name| self.type_ref(name))
            .collect();
        let return_type = self.type_ref(&unit.method_descriptor.return_type.java_name());
        let throws = unit.throws.iter().map(|name| self.type_ref(name)).collect();
        let annotations = unit
            .annotations
            .iter()
            .map(|annotation| self.annotation(AnnotationOwner::Member(id), annotation))
            .collect();
        let accesses = unit
            .references
            .iter()
            .map(|reference| self.access(id, reference))
            .collect();

        self.members.push(MemberNode {
            id,
            owner,
            kind: match unit.kind {
                CodeUnitKind::Method => MemberKind::Method,
                CodeUnitKind::Constructor => MemberKind::Constructor,
                CodeUnitKind::StaticInitializer => MemberKind::StaticInitializer,
            },
            name: unit.name.clone(),
            full_name: code_unit_full_name(&class.name, &unit.name, &parameter_names),
            descriptor: unit.descriptor.clone(),
            parameters,
            return_type,
            throws,
            modifiers: unit.modifiers,
            signature: unit.signature.clone(),
            annotations,
            accesses,
        });
        id
    }

    fn access(&mut self, origin: MemberId, reference: &MemberReference) -> AccessId {
        let (target_kind, kind) = match reference.kind {
            ReferenceKind::GetField | ReferenceKind::GetStatic => {
                (TargetKind::Field, AccessKind::FieldRead)
            }
            ReferenceKind::PutField | ReferenceKind::PutStatic => {
                (TargetKind::Field, AccessKind::FieldWrite)
            }
            _ if reference.is_constructor_call() => {
                (TargetKind::Constructor, AccessKind::ConstructorCall)
            }
            _ => (TargetKind::Method, AccessKind::MethodCall),
        };
        let target = self.target(target_kind, reference);

        let id = AccessId::from_idx(self.accesses.len());
        self.accesses.push(Access {
            id,
            origin,
            target,
            kind,
            line: reference.line,
        });
        id
    }

    fn target(&mut self, kind: TargetKind, reference: &MemberReference) -> TargetId {
        let owner = self.type_ref(&reference.owner);
        if reference.owner_is_interface {
            self.interface_hints.insert(owner);
        }

        let key = (
            kind,
            owner,
            reference.name.clone(),
            reference.descriptor.clone(),
        );
        if let Some(id) = self.target_ids.get(&key) {
            return *id;
        }

        let id = TargetId::from_idx(self.targets.len());
        let parameters = reference
            .parameter_types
            .iter()
            .map(|name| self.type_ref(name))
            .collect();
        let return_type = self.type_ref(&reference.value_type);
        let full_name = match kind {
            TargetKind::Field => format!("{}.{}", reference.owner, reference.name),
            TargetKind::Method | TargetKind::Constructor => code_unit_full_name(
                &reference.owner,
                &reference.name,
                &reference.parameter_types,
            ),
        };
        self.targets.push(AccessTarget {
            id,
            kind,
            owner,
            name: reference.name.clone(),
            descriptor: reference.descriptor.clone(),
            parameters,
            return_type,
            full_name,
            resolved: OnceCell::new(),
        });
        self.target_ids.insert(key, id);
        id
    }

    fn annotation(&mut self, owner: AnnotationOwner, annotation: &Annotation) -> AnnotationId {
        let type_id = self.type_ref(&annotation.type_name);
        let values = self.annotation_values(&annotation.elements);
        let id = AnnotationId::from_idx(self.annotations.len());
        self.annotations.push(AnnotationNode {
            id,
            owner,
            type_id,
            values,
        });
        id
    }

    fn annotation_values(
        &mut self,
        elements: &[(String, ElementValue)],
    ) -> Vec<(String, AnnotationValue)> {
        elements
            .iter()
            .map(|(name, value)| (name.clone(), self.annotation_value(value)))
            .collect()
    }

    fn annotation_value(&mut self, value: &ElementValue) -> AnnotationValue {
        match value {
            ElementValue::Const(constant) => match constant {
                ConstValue::Byte(v) => AnnotationValue::Byte(*v),
                ConstValue::Char(v) => AnnotationValue::Char(*v),
                ConstValue::Short(v) => AnnotationValue::Short(*v),
                ConstValue::Int(v) => AnnotationValue::Int(*v),
                ConstValue::Long(v) => AnnotationValue::Long(*v),
                ConstValue::Float(v) => AnnotationValue::Float(*v),
                ConstValue::Double(v) => AnnotationValue::Double(*v),
                ConstValue::Boolean(v) => AnnotationValue::Boolean(*v),
                ConstValue::String(v) => AnnotationValue::String(v.clone()),
            },
            ElementValue::Enum {
                type_name,
                const_name,
            } => AnnotationValue::Enum {
                type_id: self.type_ref(type_name),
                constant: const_name.clone(),
            },
            ElementValue::Class(name) => AnnotationValue::Class(self.type_ref(name)),
            ElementValue::Annotation(nested) => {
                AnnotationValue::Annotation(Box::new(NestedAnnotation {
                    type_id: self.type_ref(&nested.type_name),
                    values: self.annotation_values(&nested.elements),
                }))
            }
            ElementValue::Array(values) => AnnotationValue::Array(
                values
                    .iter()
                    .map(|value| self.annotation_value(value))
                    .collect(),
            ),
        }
    }
}

fn code_unit_full_name(owner: &str, name: &str, parameters: &[String]) -> String {
    format!("{owner}.{name}({})", parameters.join(", "))
}

fn imported_node(id: TypeId, root: TypeId, class: &RawClass, pending: &PendingType) -> TypeNode {
    // Only the root may lack a superclass; keep the chain intact for
    // anything else that omits one.
    let supertype = match pending.supertype {
        Some(supertype) => Some(supertype),
        None if id != root => Some(root),
        None => None,
    };
    TypeNode {
        id,
        name: class.name.clone(),
        simple_name: class.simple_name.clone(),
        package_name: class.package_name().to_string(),
        kind: match class.kind {
            ClassKind::Class => TypeKind::Class,
            ClassKind::Interface => TypeKind::Interface,
            ClassKind::Enum => TypeKind::Enum,
            ClassKind::Annotation => TypeKind::Annotation,
        },
        modifiers: class.modifiers,
        fully_imported: true,
        supertype,
        interfaces: pending.interfaces.clone(),
        enclosing_type: pending.enclosing_type,
        component_type: None,
        source_file: class.source_file.clone(),
        signature: class.signature.clone(),
        members: pending.members.clone(),
        annotations: pending.annotations.clone(),
        subtypes: Vec::new(),
    }
}

fn stub_node(
    id: TypeId,
    root: TypeId,
    name: &str,
    by_name: &HashMap<String, TypeId>,
    interface_hints: &HashSet<TypeId>,
) -> TypeNode {
    let (kind, component_type) = if let Some(component) = name.strip_suffix("[]") {
        (TypeKind::Array, by_name.get(component).copied())
    } else if PRIMITIVE_TYPES.contains(&name) {
        (TypeKind::Primitive, None)
    } else if interface_hints.contains(&id) {
        (TypeKind::Interface, None)
    } else {
        (TypeKind::Class, None)
    };

    let (package_name, simple_name) = match name.rsplit_once('.') {
        Some((package, simple)) => (package.to_string(), simple.to_string()),
        _ => (String::new(), name.to_string()),
    };
    let supertype = (id != root && kind != TypeKind::Primitive).then_some(root);

    TypeNode {
        id,
        name: name.to_string(),
        simple_name,
        package_name,
        kind,
        modifiers: Modifiers::EMPTY,
        fully_imported: false,
        supertype,
        interfaces: Vec::new(),
        enclosing_type: None,
        component_type,
        source_file: None,
        signature: None,
        members: Vec::new(),
        annotations: Vec::new(),
        subtypes: Vec::new(),
    }
}
