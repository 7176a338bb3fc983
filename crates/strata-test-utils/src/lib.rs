//! Utilities shared by strata tests.
//!
//! [`ClassFileBuilder`] writes real class-file bytes so tests never depend on
//! checked-in binaries or a `javac` on `PATH`. With the `fixture-fs` feature,
//! [`ClassDir`] lays those bytes out on disk as a class directory or a jar.

mod classfile;

#[cfg(feature = "fixture-fs")]
mod fixture_fs;

pub use classfile::{
    class_literal, AnnotationSpec, ClassFileBuilder, FieldSpec, Insn, MemberRefSpec, MethodSpec,
    ValueSpec,
    ACC_ABSTRACT, ACC_ANNOTATION, ACC_ENUM, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE, ACC_PROTECTED,
    ACC_PUBLIC, ACC_STATIC, ACC_SUPER, ACC_SYNCHRONIZED,
};

#[cfg(feature = "fixture-fs")]
pub use fixture_fs::ClassDir;
