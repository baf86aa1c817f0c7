//! Content-addressed arena of member arrays.
//!
//! Every combined node refers to one registered array by id. Ids are issued in
//! strictly increasing order and never reused, so a stale id can always be
//! told apart from a live one. Arrays are immutable and shared (`Rc<[Node]>`),
//! which makes [`MemberArrayRegistry::copy`] cheap.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use log::debug;

use crate::error::{CodecError, CodecResult};
use crate::node::{Node, MAX_COMBINED_ID};

/// Default number of live arrays above which housekeeping runs.
pub const DEFAULT_HOUSEKEEPING_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct MemberArrayRegistry {
    /// Indexed by id; `None` once reclaimed.
    entries: Vec<Option<Rc<[Node]>>>,
    lookup: HashMap<Rc<[Node]>, u32>,
    /// Number of `Some` entries.
    live: usize,
    housekeeping_threshold: usize,
}

impl Default for MemberArrayRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_HOUSEKEEPING_THRESHOLD)
    }
}

impl MemberArrayRegistry {
    pub fn new(housekeeping_threshold: usize) -> Self {
        Self {
            entries: Vec::new(),
            lookup: HashMap::new(),
            live: 0,
            housekeeping_threshold,
        }
    }

    /// Number of live arrays.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of ids issued so far, including reclaimed ones.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn housekeeping_threshold(&self) -> usize {
        self.housekeeping_threshold
    }

    pub fn set_housekeeping_threshold(&mut self, threshold: usize) {
        self.housekeeping_threshold = threshold;
    }

    /// Register a sorted, duplicate-free member array and return its id.
    ///
    /// An equal live array keeps its id.
    pub fn register_member_array(&mut self, members: &[Node]) -> CodecResult<u32> {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]), "members must be sorted and unique");
        if members.contains(&Node::INVALID) {
            return Err(CodecError::InvalidMember);
        }
        if let Some(&id) = self.lookup.get(members) {
            return Ok(id);
        }
        let id = self.entries.len() as u32;
        if id > MAX_COMBINED_ID {
            return Err(CodecError::IdOutOfRange {
                id,
                max: MAX_COMBINED_ID,
            });
        }
        let array: Rc<[Node]> = Rc::from(members);
        self.entries.push(Some(array.clone()));
        self.lookup.insert(array, id);
        self.live += 1;
        Ok(id)
    }

    pub fn lookup_member_array(&self, id: u32) -> CodecResult<Rc<[Node]>> {
        match self.entries.get(id as usize) {
            None => Err(CodecError::UnknownMemberArrayId { id }),
            Some(None) => Err(CodecError::ReclaimedMemberArrayId { id }),
            Some(Some(array)) => Ok(array.clone()),
        }
    }

    /// Ids of all arrays reachable from the given roots.
    pub fn reachable(&self, roots: impl IntoIterator<Item = Node>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from_iter(roots);

        while let Some(node) = queue.pop_front() {
            if !node.is_combined() {
                continue;
            }
            let id = node.combined_id();
            if visited.insert(id) {
                if let Some(Some(array)) = self.entries.get(id as usize) {
                    queue.extend(array.iter().copied().filter(|m| m.is_combined()));
                }
            }
        }

        visited
    }

    /// Sweep if the number of live arrays exceeds the threshold.
    ///
    /// Returns whether a sweep ran.
    pub fn trigger_housekeeping(&mut self, roots: &[Node]) -> bool {
        self.trigger_housekeeping_above(roots, self.housekeeping_threshold)
    }

    /// Like [`trigger_housekeeping`][Self::trigger_housekeeping], with an explicit threshold.
    pub fn trigger_housekeeping_above(&mut self, roots: &[Node], threshold: usize) -> bool {
        if self.live <= threshold {
            return false;
        }
        self.housekeep(roots);
        true
    }

    /// Release every array not reachable from `roots`. Returns the number of released arrays.
    pub fn housekeep(&mut self, roots: &[Node]) -> usize {
        debug!("Housekeeping: {} live arrays, {} roots", self.live, roots.len());

        let alive = self.reachable(roots.iter().copied());

        let mut released = 0;
        for (id, entry) in self.entries.iter_mut().enumerate() {
            if entry.is_some() && !alive.contains(&(id as u32)) {
                if let Some(array) = entry.take() {
                    self.lookup.remove(&array);
                    released += 1;
                }
            }
        }
        self.live -= released;

        debug!("Housekeeping: released {}, {} live", released, self.live);
        released
    }

    /// Independent snapshot. Arrays are shared, bookkeeping is not.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::{CombinedType, MatchOperator};

    fn leaf(arg: u32) -> Node {
        Node::leaf(false, MatchOperator::Equals, false, arg, 0)
    }

    #[test]
    fn test_register_dedup() {
        let mut registry = MemberArrayRegistry::default();
        let id1 = registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        let id2 = registry.register_member_array(&[leaf(0), leaf(2)]).unwrap();
        let id3 = registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        assert_eq!(id1, id3);
        assert!(id2 > id1);
        assert_eq!(registry.len(), 2);
        assert_eq!(&*registry.lookup_member_array(id2).unwrap(), &[leaf(0), leaf(2)]);
    }

    #[test]
    fn test_register_invalid() {
        let mut registry = MemberArrayRegistry::default();
        assert_eq!(
            registry.register_member_array(&[leaf(0), Node::INVALID]),
            Err(CodecError::InvalidMember)
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = MemberArrayRegistry::default();
        assert_eq!(
            registry.lookup_member_array(5),
            Err(CodecError::UnknownMemberArrayId { id: 5 })
        );
    }

    #[test]
    fn test_housekeep() {
        let mut registry = MemberArrayRegistry::default();
        let inner = registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        let inner_node = Node::combined(inner, CombinedType::Or);
        let outer = registry.register_member_array(&[leaf(2), inner_node]).unwrap();
        let outer_node = Node::combined(outer, CombinedType::And);
        let garbage = registry.register_member_array(&[leaf(3), leaf(4)]).unwrap();

        let released = registry.housekeep(&[outer_node]);
        assert_eq!(released, 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.size(), 3);
        assert!(registry.lookup_member_array(inner).is_ok());
        assert!(registry.lookup_member_array(outer).is_ok());
        assert_eq!(
            registry.lookup_member_array(garbage),
            Err(CodecError::ReclaimedMemberArrayId { id: garbage })
        );

        // Ids are never reused, even for an equal array.
        let again = registry.register_member_array(&[leaf(3), leaf(4)]).unwrap();
        assert_eq!(again, 3);
    }

    #[test]
    fn test_trigger_housekeeping_threshold() {
        let mut registry = MemberArrayRegistry::new(2);
        registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        registry.register_member_array(&[leaf(0), leaf(2)]).unwrap();
        assert!(!registry.trigger_housekeeping(&[]));
        registry.register_member_array(&[leaf(0), leaf(3)]).unwrap();
        assert!(registry.trigger_housekeeping(&[]));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_trigger_housekeeping_above() {
        let mut registry = MemberArrayRegistry::new(10);
        let kept = registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        registry.register_member_array(&[leaf(0), leaf(2)]).unwrap();
        let root = Node::combined(kept, CombinedType::And);

        assert!(!registry.trigger_housekeeping_above(&[root], 2));
        assert!(registry.trigger_housekeeping_above(&[root], 1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.housekeeping_threshold(), 10);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut registry = MemberArrayRegistry::default();
        let id = registry.register_member_array(&[leaf(0), leaf(1)]).unwrap();
        let mut copy = registry.copy();
        copy.housekeep(&[]);
        assert!(copy.lookup_member_array(id).is_err());
        assert!(registry.lookup_member_array(id).is_ok());
    }
}
