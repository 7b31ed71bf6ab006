//! Looking members up in classes known by canonical name.

use super::{ClassLookup, JavaReactor, Resolver};
use crate::scope::Member;
use kiln_core::{Attribute, Diagnostic};
use tracing::debug;

/// Answer to a non-blocking member lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberLookup {
    /// Every field, method and member class of that name.
    Found(Vec<Member>),
    NotFound,
    /// The class is still loading. The running reaction will be re-run
    /// once it is known.
    Pending,
}

impl Resolver {
    /// The members named `member` of the class `canonical_name`.
    ///
    /// A missing class counts as a class without members. Each missing
    /// class and member pair is reported once per run.
    pub fn resolve_members(
        &mut self,
        reactor: &mut JavaReactor,
        canonical_name: &str,
        member: &str,
    ) -> MemberLookup {
        let members = match self.klass(reactor, canonical_name) {
            ClassLookup::Pending => {
                if let Some(requester) = reactor.current() {
                    let classes = self.classes_node(reactor);
                    self.watch(reactor, requester, Attribute::new(classes, canonical_name));
                }
                return MemberLookup::Pending;
            }
            ClassLookup::Found(id) => self.class(id).members(member),
            ClassLookup::NotFound => Vec::new(),
        };

        if !members.is_empty() {
            return MemberLookup::Found(members);
        }
        debug!(class = canonical_name, member, "member not found");
        if self
            .member_misses
            .insert((canonical_name.to_string(), member.to_string()))
        {
            reactor.report(Diagnostic::MemberNotFound {
                class: canonical_name.to_string(),
                member: member.to_string(),
            });
        }
        MemberLookup::NotFound
    }
}
