//! The per-unit record handed to the graph builder.
//!
//! A [`RawClass`] is a [`ClassFile`] with every name converted to binary form,
//! modifiers decoded, members split into fields and code units, and nested
//! class metadata folded in.

use crate::annotation::Annotation;
use crate::classfile::{ClassFile, ClassMember};
use crate::code::MemberReference;
use crate::descriptor::{
    internal_to_binary, parse_field_descriptor, parse_method_descriptor, FieldType,
    MethodDescriptor,
};
use crate::error::Result;
use crate::modifiers::{ModifierTarget, Modifiers};

const ACC_INTERFACE: u16 = 0x0200;
const ACC_ANNOTATION: u16 = 0x2000;
const ACC_ENUM: u16 = 0x4000;

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    pub fn from_access_flags(flags: u16) -> Self {
        if flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }

    /// Annotation types are interfaces too.
    pub fn is_interface(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    /// Binary name, e.g. `com.example.Outer$Inner`.
    pub name: String,
    /// Empty for anonymous classes.
    pub simple_name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub major_version: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub enclosing_class: Option<String>,
    pub source_file: Option<String>,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<RawField>,
    /// Methods, constructors and the static initializer, in declaration order.
    pub code_units: Vec<RawCodeUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub descriptor: String,
    pub field_type: FieldType,
    pub modifiers: Modifiers,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeUnitKind {
    Method,
    Constructor,
    StaticInitializer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCodeUnit {
    pub kind: CodeUnitKind,
    pub name: String,
    pub descriptor: String,
    pub method_descriptor: MethodDescriptor,
    pub modifiers: Modifiers,
    pub signature: Option<String>,
    /// Binary names from the `Exceptions` attribute.
    pub throws: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Field accesses and calls in bytecode order.
    pub references: Vec<MemberReference>,
}

impl RawClass {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_classfile(ClassFile::parse(bytes)?)
    }

    pub fn from_classfile(class: ClassFile) -> Result<Self> {
        let name = internal_to_binary(&class.this_class);
        let kind = ClassKind::from_access_flags(class.access_flags);

        let own_entry = class.own_inner_class_entry().cloned();
        let (flags, simple_name, enclosing_class) = match &own_entry {
            Some(entry) => (
                entry.access_flags,
                entry.inner_name.clone().unwrap_or_default(),
                entry
                    .outer_class
                    .as_deref()
                    .or(class.enclosing_method.as_ref().map(|m| m.class.as_str()))
                    .map(internal_to_binary),
            ),
            None => (
                class.access_flags,
                top_level_simple_name(&name).to_string(),
                class
                    .enclosing_method
                    .as_ref()
                    .map(|m| internal_to_binary(&m.class)),
            ),
        };

        let fields = class
            .fields
            .into_iter()
            .map(RawField::from_member)
            .collect::<Result<Vec<_>>>()?;
        let code_units = class
            .methods
            .into_iter()
            .map(RawCodeUnit::from_member)
            .collect::<Result<Vec<_>>>()?;

        Ok(RawClass {
            name,
            simple_name,
            kind,
            modifiers: Modifiers::from_access_flags(flags, ModifierTarget::Class),
            major_version: class.major_version,
            super_class: class.super_class.as_deref().map(internal_to_binary),
            interfaces: class.interfaces.iter().map(|i| internal_to_binary(i)).collect(),
            enclosing_class,
            source_file: class.source_file,
            signature: class.signature,
            annotations: merge_annotations(
                class.runtime_visible_annotations,
                class.runtime_invisible_annotations,
            ),
            fields,
            code_units,
        })
    }

    pub fn package_name(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// `package-info` and `module-info` units carry no type of their own.
    pub fn is_package_info(&self) -> bool {
        matches!(
            top_level_simple_name(&self.name),
            "package-info" | "module-info"
        )
    }

    pub fn methods(&self) -> impl Iterator<Item = &RawCodeUnit> {
        self.code_units_of(CodeUnitKind::Method)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &RawCodeUnit> {
        self.code_units_of(CodeUnitKind::Constructor)
    }

    pub fn static_initializer(&self) -> Option<&RawCodeUnit> {
        self.code_units_of(CodeUnitKind::StaticInitializer).next()
    }

    fn code_units_of(&self, kind: CodeUnitKind) -> impl Iterator<Item = &RawCodeUnit> {
        self.code_units.iter().filter(move |unit| unit.kind == kind)
    }
}

impl RawField {
    fn from_member(member: ClassMember) -> Result<Self> {
        Ok(RawField {
            field_type: parse_field_descriptor(&member.descriptor)?,
            modifiers: Modifiers::from_access_flags(member.access_flags, ModifierTarget::Field),
            annotations: merge_annotations(
                member.runtime_visible_annotations,
                member.runtime_invisible_annotations,
            ),
            name: member.name,
            descriptor: member.descriptor,
            signature: member.signature,
        })
    }
}

impl RawCodeUnit {
    fn from_member(member: ClassMember) -> Result<Self> {
        let kind = match member.name.as_str() {
            CONSTRUCTOR_NAME => CodeUnitKind::Constructor,
            STATIC_INITIALIZER_NAME => CodeUnitKind::StaticInitializer,
            _ => CodeUnitKind::Method,
        };
        Ok(RawCodeUnit {
            kind,
            method_descriptor: parse_method_descriptor(&member.descriptor)?,
            modifiers: Modifiers::from_access_flags(member.access_flags, ModifierTarget::Method),
            throws: member
                .exceptions
                .iter()
                .map(|name| internal_to_binary(name))
                .collect(),
            annotations: merge_annotations(
                member.runtime_visible_annotations,
                member.runtime_invisible_annotations,
            ),
            references: member.code.map(|code| code.references).unwrap_or_default(),
            name: member.name,
            descriptor: member.descriptor,
            signature: member.signature,
        })
    }
}

fn merge_annotations(mut visible: Vec<Annotation>, invisible: Vec<Annotation>) -> Vec<Annotation> {
    visible.extend(invisible);
    visible
}

fn top_level_simple_name(binary_name: &str) -> &str {
    binary_name
        .rsplit_once('.')
        .map_or(binary_name, |(_, simple)| simple)
}
