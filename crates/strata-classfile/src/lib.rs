//! Reader for JVM class files.
//!
//! [`ClassFile::parse`] decodes one class container; [`RawClass`] is the
//! binary-name view of it that the graph builder consumes.

#![forbid(unsafe_code)]

mod annotation;
mod classfile;
mod code;
mod constant_pool;
mod descriptor;
mod error;
mod modifiers;
mod raw;
mod reader;

pub use crate::annotation::{descriptor_to_type_name, Annotation, ConstValue, ElementValue};
pub use crate::classfile::{
    ClassFile, ClassMember, Code, EnclosingMethod, InnerClassInfo, CLASSFILE_MAGIC,
};
pub use crate::code::{LineNumberEntry, MemberReference, ReferenceKind};
pub use crate::descriptor::{
    class_constant_to_type_name, internal_to_binary, parse_field_descriptor,
    parse_method_descriptor,
};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result, Section};
pub use crate::modifiers::{Modifier, ModifierTarget, Modifiers};
pub use crate::raw::{
    ClassKind, CodeUnitKind, RawClass, RawCodeUnit, RawField, CONSTRUCTOR_NAME,
    STATIC_INITIALIZER_NAME,
};
