//! Member resolution: maps an [`AccessTarget`] to the member it denotes.
//!
//! Lookup follows reflection-style rules. Fields are searched on the declared
//! owner and its superclass chain (interfaces only when the owner is one).
//! Constructors are not inherited and are only looked up on the owner.
//! Methods are searched on a class owner and its superclass chain, then
//! across interfaces breadth first; an interface owner searches itself and
//! its super-interfaces before falling back to the root type. When the
//! interface search finds several declarations, those overridden by a more
//! specific candidate are dropped and the first remaining one in traversal
//! order wins.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::graph::Graph;
use crate::ids::{AccessId, MemberId, TargetId, TypeId};
use crate::model::{AccessTarget, MemberKind, TargetKind};

#[derive(Debug)]
pub(crate) struct ReverseIndex {
    pub(crate) by_member: Vec<Vec<AccessId>>,
    pub(crate) by_type: Vec<Vec<AccessId>>,
}

impl Graph {
    /// Resolves `target`, computing the answer at most once per graph.
    ///
    /// Concurrent first calls may each run the search; all of them observe
    /// the single value that was stored.
    pub fn resolve(&self, target: TargetId) -> Option<MemberId> {
        let target = self.target(target);
        *target.resolved.get_or_init(|| {
            let resolved = self.resolve_uncached(target);
            if resolved.is_none() {
                trace!(
                    target = "strata.graph",
                    access_target = %target.full_name,
                    "access target does not resolve to an imported member"
                );
            }
            resolved
        })
    }

    fn resolve_uncached(&self, target: &AccessTarget) -> Option<MemberId> {
        match target.kind {
            TargetKind::Field => self.resolve_field(target),
            TargetKind::Constructor => self.resolve_constructor(target),
            TargetKind::Method => self.resolve_method(target),
        }
    }

    fn resolve_field(&self, target: &AccessTarget) -> Option<MemberId> {
        let owner = target.owner;
        if self.type_node(owner).is_interface() {
            let mut search = vec![owner];
            search.extend(self.all_interfaces(owner));
            return search
                .into_iter()
                .find_map(|ty| self.find_field(ty, target));
        }

        std::iter::once(owner)
            .chain(self.super_classes(owner))
            .find_map(|ty| self.find_field(ty, target))
    }

    fn resolve_constructor(&self, target: &AccessTarget) -> Option<MemberId> {
        self.find_code_unit(target.owner, target, MemberKind::Constructor)
    }

    fn resolve_method(&self, target: &AccessTarget) -> Option<MemberId> {
        let owner = target.owner;
        let in_classes = || {
            std::iter::once(owner)
                .chain(self.super_classes(owner))
                .find_map(|ty| self.find_code_unit(ty, target, MemberKind::Method))
        };

        if self.type_node(owner).is_interface() {
            // `java.lang.Object` only after every super-interface.
            return self
                .find_code_unit(owner, target, MemberKind::Method)
                .or_else(|| self.resolve_in_interfaces(owner, target))
                .or_else(in_classes);
        }
        in_classes().or_else(|| self.resolve_in_interfaces(owner, target))
    }

    fn resolve_in_interfaces(&self, owner: TypeId, target: &AccessTarget) -> Option<MemberId> {
        let candidates: Vec<MemberId> = self
            .interface_search_order(owner)
            .into_iter()
            .filter_map(|ty| self.find_code_unit(ty, target, MemberKind::Method))
            .collect();
        self.most_specific(&candidates)
    }

    /// Interfaces of `owner` and of its superclasses in breadth-first order.
    fn interface_search_order(&self, owner: TypeId) -> Vec<TypeId> {
        let mut queue: VecDeque<TypeId> = VecDeque::new();
        queue.extend(self.interfaces(owner));
        for class in self.super_classes(owner) {
            queue.extend(self.interfaces(class));
        }

        let mut seen = HashSet::from([owner]);
        let mut order = Vec::new();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            queue.extend(self.interfaces(next));
        }
        order
    }

    /// Drops candidates declared by a proper supertype of another candidate's
    /// declaring type, then takes the first survivor.
    fn most_specific(&self, candidates: &[MemberId]) -> Option<MemberId> {
        candidates.iter().copied().find(|candidate| {
            let declaring = self.member(*candidate).owner;
            !candidates.iter().any(|other| {
                let other_owner = self.member(*other).owner;
                other_owner != declaring && self.all_supertypes(other_owner).contains(&declaring)
            })
        })
    }

    fn find_field(&self, ty: TypeId, target: &AccessTarget) -> Option<MemberId> {
        let mut by_name = self
            .fields(ty)
            .filter(|field| field.name == target.name)
            .peekable();
        let first = by_name.peek().map(|field| field.id);
        by_name
            .find(|field| field.descriptor == target.descriptor)
            .map(|field| field.id)
            .or(first)
    }

    /// Matches by name and parameter types, preferring an exact descriptor
    /// match so a bridge method does not shadow the declaration it bridges.
    fn find_code_unit(
        &self,
        ty: TypeId,
        target: &AccessTarget,
        kind: MemberKind,
    ) -> Option<MemberId> {
        let mut first = None;
        for member in self.members(ty) {
            if member.kind != kind
                || member.name != target.name
                || member.parameters != target.parameters
            {
                continue;
            }
            if member.descriptor == target.descriptor {
                return Some(member.id);
            }
            first.get_or_insert(member.id);
        }
        first
    }

    pub(crate) fn reverse_index(&self) -> &ReverseIndex {
        self.reverse.get_or_init(|| {
            let mut by_member = vec![Vec::new(); self.members.len()];
            let mut by_type = vec![Vec::new(); self.types.len()];
            for access in &self.accesses {
                if let Some(member) = self.resolve(access.target) {
                    by_member[member.idx()].push(access.id);
                    by_type[self.member(member).owner.idx()].push(access.id);
                }
            }
            ReverseIndex { by_member, by_type }
        })
    }
}
