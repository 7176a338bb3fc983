//! The linked, queryable model of an imported set of classes.
//!
//! [`Linker::link`] turns [`strata_classfile::RawClass`] records into a
//! frozen [`Graph`]. Types referenced but never supplied become stub nodes;
//! member references resolve lazily through [`Graph::resolve`].

#![forbid(unsafe_code)]

mod dependency;
mod error;
mod graph;
mod ids;
mod linker;
mod model;
mod registry;
mod resolve;

pub use crate::dependency::{Dependency, Evidence};
pub use crate::error::LinkError;
pub use crate::graph::{Graph, ROOT_TYPE};
pub use crate::ids::{AccessId, AnnotationId, MemberId, TargetId, TypeId};
pub use crate::linker::{DuplicatePolicy, Linker, PRIMITIVE_TYPES};
pub use crate::model::{
    Access, AccessKind, AccessTarget, AnnotationNode, AnnotationOwner, AnnotationValue,
    MemberKind, MemberNode, NestedAnnotation, TargetKind, TypeKind, TypeNode,
};
pub use crate::registry::StubRegistry;
pub use strata_classfile::{Modifier, Modifiers};
