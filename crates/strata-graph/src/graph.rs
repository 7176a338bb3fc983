//! The frozen, read-only type graph produced by one import.

use std::collections::{HashMap, HashSet, VecDeque};

use once_cell::sync::OnceCell;

use crate::dependency::{Dependency, DependencyIndex};
use crate::ids::{AccessId, AnnotationId, MemberId, TargetId, TypeId};
use crate::model::{
    Access, AccessKind, AccessTarget, AnnotationNode, AnnotationOwner, MemberKind, MemberNode,
    TypeNode,
};
use crate::resolve::ReverseIndex;

pub const ROOT_TYPE: &str = "java.lang.Object";

#[derive(Debug)]
pub struct Graph {
    pub(crate) types: Vec<TypeNode>,
    pub(crate) by_name: HashMap<String, TypeId>,
    pub(crate) members: Vec<MemberNode>,
    pub(crate) annotations: Vec<AnnotationNode>,
    pub(crate) targets: Vec<AccessTarget>,
    pub(crate) accesses: Vec<Access>,
    pub(crate) root: TypeId,
    pub(crate) reverse: OnceCell<ReverseIndex>,
    pub(crate) dependency_index: OnceCell<DependencyIndex>,
}

impl Graph {
    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.iter()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.by_name.get(name).map(|id| &self.types[id.idx()])
    }

    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.idx()]
    }

    pub fn member(&self, id: MemberId) -> &MemberNode {
        &self.members[id.idx()]
    }

    pub fn access(&self, id: AccessId) -> &Access {
        &self.accesses[id.idx()]
    }

    pub fn target(&self, id: TargetId) -> &AccessTarget {
        &self.targets[id.idx()]
    }

    pub fn annotation(&self, id: AnnotationId) -> &AnnotationNode {
        &self.annotations[id.idx()]
    }

    /// The universal root type, `java.lang.Object`.
    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn targets(&self) -> impl Iterator<Item = &AccessTarget> {
        self.targets.iter()
    }

    pub fn accesses(&self) -> impl Iterator<Item = &Access> {
        self.accesses.iter()
    }

    // Hierarchy

    pub fn supertype(&self, id: TypeId) -> Option<TypeId> {
        self.type_node(id).supertype
    }

    /// The superclass chain, nearest first.
    pub fn super_classes(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.supertype(id);
        while let Some(next) = current {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            current = self.supertype(next);
        }
        chain
    }

    pub fn interfaces(&self, id: TypeId) -> &[TypeId] {
        &self.type_node(id).interfaces
    }

    /// Every interface implemented or extended by `id` or its superclasses,
    /// breadth first: own interfaces, then those of each superclass in chain
    /// order, each expanded through its own super-interfaces.
    pub fn all_interfaces(&self, id: TypeId) -> Vec<TypeId> {
        let mut queue: VecDeque<TypeId> = self.interfaces(id).iter().copied().collect();
        for class in self.super_classes(id) {
            queue.extend(self.interfaces(class).iter().copied());
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        while let Some(next) = queue.pop_front() {
            if next == id || !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.interfaces(next).iter().copied());
        }
        out
    }

    /// Superclass chain followed by [`Graph::all_interfaces`].
    pub fn all_supertypes(&self, id: TypeId) -> Vec<TypeId> {
        let mut out = self.super_classes(id);
        for interface in self.all_interfaces(id) {
            if !out.contains(&interface) {
                out.push(interface);
            }
        }
        out
    }

    /// Direct subtypes: subclasses and, for interfaces, implementors and
    /// extending interfaces.
    pub fn sub_classes(&self, id: TypeId) -> &[TypeId] {
        &self.type_node(id).subtypes
    }

    pub fn all_sub_classes(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = HashSet::from([id]);
        let mut queue: VecDeque<TypeId> = self.sub_classes(id).iter().copied().collect();
        let mut out = Vec::new();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.sub_classes(next).iter().copied());
        }
        out
    }

    pub fn is_assignable_to(&self, id: TypeId, other: TypeId) -> bool {
        id == other || self.all_supertypes(id).contains(&other)
    }

    // Members

    pub fn members(&self, id: TypeId) -> impl Iterator<Item = &MemberNode> {
        self.type_node(id)
            .members
            .iter()
            .map(|member| self.member(*member))
    }

    fn members_of_kind(&self, id: TypeId, kind: MemberKind) -> impl Iterator<Item = &MemberNode> {
        self.members(id).filter(move |member| member.kind == kind)
    }

    pub fn fields(&self, id: TypeId) -> impl Iterator<Item = &MemberNode> {
        self.members_of_kind(id, MemberKind::Field)
    }

    pub fn methods(&self, id: TypeId) -> impl Iterator<Item = &MemberNode> {
        self.members_of_kind(id, MemberKind::Method)
    }

    pub fn constructors(&self, id: TypeId) -> impl Iterator<Item = &MemberNode> {
        self.members_of_kind(id, MemberKind::Constructor)
    }

    pub fn static_initializer(&self, id: TypeId) -> Option<&MemberNode> {
        self.members_of_kind(id, MemberKind::StaticInitializer)
            .next()
    }

    pub fn field(&self, id: TypeId, name: &str) -> Option<&MemberNode> {
        self.fields(id).find(|field| field.name == name)
    }

    /// Looks a method or constructor (`<init>`) up by name and parameter
    /// type names.
    pub fn code_unit(&self, id: TypeId, name: &str, parameters: &[&str]) -> Option<&MemberNode> {
        self.members(id).find(|member| {
            member.is_code_unit()
                && member.name == name
                && member.parameters.len() == parameters.len()
                && member
                    .parameters
                    .iter()
                    .zip(parameters)
                    .all(|(param, expected)| self.type_node(*param).name == *expected)
        })
    }

    // Accesses

    pub fn accesses_from_member(&self, id: MemberId) -> impl Iterator<Item = &Access> {
        self.member(id)
            .accesses
            .iter()
            .map(|access| self.access(*access))
    }

    pub fn accesses_from_type(&self, id: TypeId) -> impl Iterator<Item = &Access> {
        self.type_node(id)
            .members
            .iter()
            .flat_map(|member| self.accesses_from_member(*member))
    }

    pub fn field_accesses_from_type(&self, id: TypeId) -> impl Iterator<Item = &Access> {
        self.accesses_from_type(id)
            .filter(|access| access.kind.is_field_access())
    }

    pub fn method_calls_from_type(&self, id: TypeId) -> impl Iterator<Item = &Access> {
        self.accesses_from_type(id)
            .filter(|access| access.kind == AccessKind::MethodCall)
    }

    pub fn constructor_calls_from_type(&self, id: TypeId) -> impl Iterator<Item = &Access> {
        self.accesses_from_type(id)
            .filter(|access| access.kind == AccessKind::ConstructorCall)
    }

    /// The member an access lands on, if it is part of this graph.
    pub fn resolved_target(&self, id: AccessId) -> Option<MemberId> {
        self.resolve(self.access(id).target)
    }

    pub fn accesses_to_member(&self, id: MemberId) -> &[AccessId] {
        &self.reverse_index().by_member[id.idx()]
    }

    /// Accesses whose resolved target is declared by `id`.
    pub fn accesses_to_type(&self, id: TypeId) -> &[AccessId] {
        &self.reverse_index().by_type[id.idx()]
    }

    // Dependencies

    pub fn dependencies(&self, id: TypeId) -> &[Dependency] {
        &self.dependency_index().outgoing[id.idx()]
    }

    /// Dependencies of other types on `id`.
    pub fn dependents(&self, id: TypeId) -> impl Iterator<Item = &Dependency> {
        let index = self.dependency_index();
        index.incoming[id.idx()]
            .iter()
            .map(move |(origin, position)| &index.outgoing[origin.idx()][*position])
    }

    // Annotations

    pub fn annotations_of(&self, owner: AnnotationOwner) -> impl Iterator<Item = &AnnotationNode> {
        let ids = match owner {
            AnnotationOwner::Type(id) => &self.type_node(id).annotations,
            AnnotationOwner::Member(id) => &self.member(id).annotations,
        };
        ids.iter().map(|id| self.annotation(*id))
    }

    pub fn is_annotated_with(&self, owner: AnnotationOwner, type_name: &str) -> bool {
        self.annotations_of(owner)
            .any(|annotation| self.type_node(annotation.type_id).name == type_name)
    }
}
