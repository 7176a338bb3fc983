use std::collections::HashMap;

use crate::graph::Graph;
use crate::ids::{AccessId, AnnotationId, MemberId, TypeId};
use crate::model::MemberKind;

/// Why one type depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evidence {
    /// A field access or call whose declared owner is the target.
    Access(AccessId),
    Superclass,
    Interface,
    /// An annotation of the type or one of its members that names the
    /// target, either as its own type or inside a value.
    Annotation(AnnotationId),
    FieldType(MemberId),
    ParameterType(MemberId),
    ReturnType(MemberId),
    Throws(MemberId),
}

/// A deduplicated edge between two types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub origin: TypeId,
    pub target: TypeId,
    /// Every relation inducing this edge, in discovery order. Never empty.
    pub evidence: Vec<Evidence>,
}

impl Dependency {
    pub fn representative(&self) -> &Evidence {
        &self.evidence[0]
    }
}

#[derive(Debug)]
pub(crate) struct DependencyIndex {
    pub(crate) outgoing: Vec<Vec<Dependency>>,
    /// Per target: (origin, position in the origin's outgoing list).
    pub(crate) incoming: Vec<Vec<(TypeId, usize)>>,
}

struct Collector<'g> {
    graph: &'g Graph,
    origin: TypeId,
    positions: HashMap<TypeId, usize>,
    out: Vec<Dependency>,
}

impl<'g> Collector<'g> {
    fn add(&mut self, target: TypeId, evidence: Evidence) {
        let target = self.graph.element_type(target);
        if target == self.origin || self.graph.type_node(target).is_primitive() {
            return;
        }
        match self.positions.get(&target) {
            Some(&position) => {
                let dependency = &mut self.out[position];
                if !dependency.evidence.contains(&evidence) {
                    dependency.evidence.push(evidence);
                }
            }
            None => {
                self.positions.insert(target, self.out.len());
                self.out.push(Dependency {
                    origin: self.origin,
                    target,
                    evidence: vec![evidence],
                });
            }
        }
    }

    fn add_annotation(&mut self, id: AnnotationId) {
        let annotation = self.graph.annotation(id);
        let mut types = vec![annotation.type_id];
        for (_, value) in &annotation.values {
            value.collect_types(&mut types);
        }
        for ty in types {
            self.add(ty, Evidence::Annotation(id));
        }
    }
}

impl Graph {
    /// Strips array dimensions: `String[][]` -> `String`.
    pub(crate) fn element_type(&self, mut id: TypeId) -> TypeId {
        while let Some(component) = self.type_node(id).component_type {
            id = component;
        }
        id
    }

    fn collect_dependencies(&self, origin: TypeId) -> Vec<Dependency> {
        let node = self.type_node(origin);
        if !node.fully_imported {
            return Vec::new();
        }

        let mut collector = Collector {
            graph: self,
            origin,
            positions: HashMap::new(),
            out: Vec::new(),
        };

        for access in self.accesses_from_type(origin) {
            collector.add(self.target(access.target).owner, Evidence::Access(access.id));
        }
        if let Some(supertype) = node.supertype {
            collector.add(supertype, Evidence::Superclass);
        }
        for interface in &node.interfaces {
            collector.add(*interface, Evidence::Interface);
        }
        for annotation in &node.annotations {
            collector.add_annotation(*annotation);
        }
        for member in self.members(origin) {
            for annotation in &member.annotations {
                collector.add_annotation(*annotation);
            }
        }
        for member in self.members(origin) {
            match member.kind {
                MemberKind::Field => collector.add(member.return_type, Evidence::FieldType(member.id)),
                MemberKind::Method | MemberKind::Constructor | MemberKind::StaticInitializer => {
                    for parameter in &member.parameters {
                        collector.add(*parameter, Evidence::ParameterType(member.id));
                    }
                    collector.add(member.return_type, Evidence::ReturnType(member.id));
                    for thrown in &member.throws {
                        collector.add(*thrown, Evidence::Throws(member.id));
                    }
                }
            }
        }

        collector.out
    }

    pub(crate) fn dependency_index(&self) -> &DependencyIndex {
        self.dependency_index.get_or_init(|| {
            let outgoing: Vec<Vec<Dependency>> = (0..self.types.len())
                .map(|idx| self.collect_dependencies(TypeId::from_idx(idx)))
                .collect();

            let mut incoming = vec![Vec::new(); self.types.len()];
            for (origin, dependencies) in outgoing.iter().enumerate() {
                for (position, dependency) in dependencies.iter().enumerate() {
                    incoming[dependency.target.idx()].push((TypeId::from_idx(origin), position));
                }
            }
            DependencyIndex { outgoing, incoming }
        })
    }
}
