use once_cell::sync::OnceCell;
use strata_classfile::Modifiers;

use crate::ids::{AccessId, AnnotationId, MemberId, TargetId, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Primitive,
    Array,
}

#[derive(Debug)]
pub struct TypeNode {
    pub id: TypeId,
    /// Qualified binary name; unique within a graph.
    pub name: String,
    pub simple_name: String,
    pub package_name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    /// `false` for stubs built only from a name seen at a reference site.
    pub fully_imported: bool,
    pub supertype: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub enclosing_type: Option<TypeId>,
    /// Element type one level down, for arrays.
    pub component_type: Option<TypeId>,
    pub source_file: Option<String>,
    pub signature: Option<String>,
    pub members: Vec<MemberId>,
    pub annotations: Vec<AnnotationId>,
    /// Types naming this one as superclass or interface.
    pub subtypes: Vec<TypeId>,
}

impl TypeNode {
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Annotation)
    }

    pub fn is_array(&self) -> bool {
        self.kind == TypeKind::Array
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
    StaticInitializer,
}

#[derive(Debug)]
pub struct MemberNode {
    pub id: MemberId,
    pub owner: TypeId,
    pub kind: MemberKind,
    pub name: String,
    /// `Owner.name` for fields, `Owner.name(p1, p2)` for code units.
    pub full_name: String,
    pub descriptor: String,
    /// Empty for fields.
    pub parameters: Vec<TypeId>,
    /// The field type for fields; `void` for code units returning nothing.
    pub return_type: TypeId,
    pub throws: Vec<TypeId>,
    pub modifiers: Modifiers,
    pub signature: Option<String>,
    pub annotations: Vec<AnnotationId>,
    /// Accesses made by this member's body, in bytecode order.
    pub accesses: Vec<AccessId>,
}

impl MemberNode {
    pub fn is_code_unit(&self) -> bool {
        self.kind != MemberKind::Field
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationOwner {
    Type(TypeId),
    Member(MemberId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode {
    pub id: AnnotationId,
    pub owner: AnnotationOwner,
    pub type_id: TypeId,
    pub values: Vec<(String, AnnotationValue)>,
}

impl AnnotationNode {
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        find_value(&self.values, name)
    }
}

/// An annotation used as a value inside another annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedAnnotation {
    pub type_id: TypeId,
    pub values: Vec<(String, AnnotationValue)>,
}

impl NestedAnnotation {
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        find_value(&self.values, name)
    }
}

fn find_value<'a>(values: &'a [(String, AnnotationValue)], name: &str) -> Option<&'a AnnotationValue> {
    values
        .iter()
        .find_map(|(element, value)| (element == name).then_some(value))
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    String(String),
    Byte(i8),
    /// UTF-16 code unit, as stored in the class file.
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Enum { type_id: TypeId, constant: String },
    Class(TypeId),
    Annotation(Box<NestedAnnotation>),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    pub(crate) fn collect_types(&self, out: &mut Vec<TypeId>) {
        match self {
            AnnotationValue::Enum { type_id, .. } | AnnotationValue::Class(type_id) => {
                out.push(*type_id)
            }
            AnnotationValue::Annotation(nested) => {
                out.push(nested.type_id);
                for (_, value) in &nested.values {
                    value.collect_types(out);
                }
            }
            AnnotationValue::Array(values) => {
                for value in values {
                    value.collect_types(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Field,
    Method,
    Constructor,
}

/// The unresolved owner, name and descriptor recorded at a reference site.
///
/// One target exists per distinct (kind, owner, name, descriptor); every
/// access naming it shares its resolution cell.
#[derive(Debug)]
pub struct AccessTarget {
    pub id: TargetId,
    pub kind: TargetKind,
    /// Declared owner, as written in the bytecode.
    pub owner: TypeId,
    pub name: String,
    pub descriptor: String,
    pub parameters: Vec<TypeId>,
    /// Field type, or return type for code units.
    pub return_type: TypeId,
    pub full_name: String,
    pub(crate) resolved: OnceCell<Option<MemberId>>,
}

impl AccessTarget {
    /// `field <Owner.name>`, `method <Owner.name(int)>`, ...
    pub fn description(&self) -> String {
        let kind = match self.kind {
            TargetKind::Field => "field",
            TargetKind::Method => "method",
            TargetKind::Constructor => "constructor",
        };
        format!("{kind} <{}>", self.full_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    FieldRead,
    FieldWrite,
    MethodCall,
    ConstructorCall,
}

impl AccessKind {
    pub fn is_field_access(self) -> bool {
        matches!(self, AccessKind::FieldRead | AccessKind::FieldWrite)
    }
}

/// One reference instruction inside one member's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub id: AccessId,
    pub origin: MemberId,
    pub target: TargetId,
    pub kind: AccessKind,
    /// `0` when the class was compiled without line numbers.
    pub line: u32,
}
