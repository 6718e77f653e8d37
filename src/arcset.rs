use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A labeled head -> modifier dependency arc. Ordered by head, then modifier, then relation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabeledArc {
  pub head: usize,
  pub modifier: usize,
  pub relation: String,
}

impl LabeledArc {
  pub fn new(head: usize, modifier: usize, relation: impl Into<String>) -> Self {
    Self {
      head,
      modifier,
      relation: relation.into(),
    }
  }

  /// Does this arc pass the query? `None` matches anything
  fn matches(&self, head: Option<usize>, modifier: Option<usize>, relation: Option<&str>) -> bool {
    head.is_none_or(|h| h == self.head)
      && modifier.is_none_or(|m| m == self.modifier)
      && relation.is_none_or(|r| r == self.relation)
  }
}

impl fmt::Display for LabeledArc {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}-{}->{})", self.head, self.relation, self.modifier)
  }
}

/// Arcs committed so far. Does not enforce single-headedness, that's the transition
/// system's job. The seen_* caches are kept in sync by `add` and ignored by equality.
#[derive(Debug, Clone, Default)]
pub struct ArcSet {
  arcs: Vec<LabeledArc>,
  seen_heads: HashSet<usize>,
  seen_modifiers: HashSet<usize>,
  seen_arcs: HashSet<(usize, usize)>,
}

impl ArcSet {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn with_capacity(size: usize) -> Self {
    Self {
      arcs: Vec::with_capacity(size),
      ..Default::default()
    }
  }

  pub fn from_arcs<I>(arcs: I) -> Self
  where
    I: IntoIterator<Item = LabeledArc>,
  {
    let mut set = Self::new();
    for arc in arcs {
      set.add(arc);
    }
    set
  }

  pub fn add(&mut self, arc: LabeledArc) {
    self.seen_heads.insert(arc.head);
    self.seen_modifiers.insert(arc.modifier);
    self.seen_arcs.insert((arc.head, arc.modifier));
    self.arcs.push(arc);
  }

  pub fn clear(&mut self) {
    self.arcs.clear();
    self.seen_heads.clear();
    self.seen_modifiers.clear();
    self.seen_arcs.clear();
  }

  pub fn len(&self) -> usize {
    self.arcs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn index(&self, i: usize) -> Option<&LabeledArc> {
    self.arcs.get(i)
  }

  pub fn last(&self) -> Option<&LabeledArc> {
    self.arcs.last()
  }

  pub fn iter(&self) -> impl Iterator<Item = &LabeledArc> {
    self.arcs.iter()
  }

  /// All arcs matching the filters, in insertion order. A `None` filter matches anything.
  pub fn get(
    &self,
    head: Option<usize>,
    modifier: Option<usize>,
    relation: Option<&str>,
  ) -> Vec<&LabeledArc> {
    self
      .arcs
      .iter()
      .filter(|arc| arc.matches(head, modifier, relation))
      .collect()
  }

  /// Does `modifier` already have a head?
  pub fn has_head(&self, modifier: usize) -> bool {
    self.seen_modifiers.contains(&modifier)
  }

  /// Does `head` have any modifier?
  pub fn has_modifiers(&self, head: usize) -> bool {
    self.seen_heads.contains(&head)
  }

  pub fn has_arc(&self, head: usize, modifier: usize) -> bool {
    self.seen_arcs.contains(&(head, modifier))
  }

  /// A copy with arcs ordered by (head, modifier)
  pub fn sorted(&self) -> Self {
    let mut copy = self.clone();
    copy.arcs.sort();
    copy
  }

  /// Merge-diff of two sorted copies. Returns (only in self, only in other).
  pub fn diff(&self, other: &ArcSet) -> (ArcSet, ArcSet) {
    let left = self.sorted();
    let right = other.sorted();

    let mut left_only = ArcSet::with_capacity(left.len());
    let mut right_only = ArcSet::with_capacity(right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
      match left.arcs[i].cmp(&right.arcs[j]) {
        Ordering::Equal => {
          i += 1;
          j += 1;
        }
        Ordering::Less => {
          left_only.add(left.arcs[i].clone());
          i += 1;
        }
        Ordering::Greater => {
          right_only.add(right.arcs[j].clone());
          j += 1;
        }
      }
    }
    for arc in &left.arcs[i..] {
      left_only.add(arc.clone());
    }
    for arc in &right.arcs[j..] {
      right_only.add(arc.clone());
    }

    (left_only, right_only)
  }
}

impl PartialEq for ArcSet {
  fn eq(&self, other: &Self) -> bool {
    if self.len() != other.len() {
      return false;
    }
    if self.is_empty() {
      return true;
    }
    self.sorted().arcs == other.sorted().arcs
  }
}

impl Eq for ArcSet {}

impl FromIterator<LabeledArc> for ArcSet {
  fn from_iter<I: IntoIterator<Item = LabeledArc>>(iter: I) -> Self {
    Self::from_arcs(iter)
  }
}

impl fmt::Display for ArcSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, arc) in self.arcs.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "{}", arc)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn arcs(v: &[(usize, usize, &str)]) -> ArcSet {
    v.iter()
      .map(|(h, m, r)| LabeledArc::new(*h, *m, *r))
      .collect()
  }

  #[test]
  fn test_get_filters() {
    let set = arcs(&[(0, 1, "root"), (1, 2, "nsubj"), (1, 3, "obj"), (3, 4, "det")]);

    assert_eq!(set.get(Some(1), None, None).len(), 2);
    assert_eq!(set.get(None, Some(4), None), vec![&LabeledArc::new(3, 4, "det")]);
    assert_eq!(set.get(None, None, Some("obj")).len(), 1);
    assert_eq!(set.get(Some(1), None, Some("det")).len(), 0);
    assert_eq!(set.get(None, None, None).len(), 4);
  }

  #[test]
  fn test_membership_caches() {
    let mut set = ArcSet::new();
    assert!(!set.has_head(2));
    set.add(LabeledArc::new(1, 2, "nsubj"));

    assert!(set.has_head(2));
    assert!(!set.has_head(1));
    assert!(set.has_modifiers(1));
    assert!(!set.has_modifiers(2));
    assert!(set.has_arc(1, 2));
    assert!(!set.has_arc(2, 1));

    set.clear();
    assert!(!set.has_head(2));
    assert!(!set.has_arc(1, 2));
  }

  #[test]
  fn test_add_does_not_dedupe() {
    let mut set = ArcSet::new();
    set.add(LabeledArc::new(1, 2, "a"));
    set.add(LabeledArc::new(3, 2, "b"));
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(None, Some(2), None).len(), 2);
  }

  #[test]
  fn test_equal_ignores_order() {
    let a = arcs(&[(0, 1, "root"), (1, 2, "x"), (1, 3, "y")]);
    let b = arcs(&[(1, 3, "y"), (0, 1, "root"), (1, 2, "x")]);
    let c = arcs(&[(1, 3, "z"), (0, 1, "root"), (1, 2, "x")]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(ArcSet::new(), ArcSet::new());
  }

  #[test]
  fn test_diff() {
    let gold = arcs(&[(0, 2, "root"), (2, 1, "nsubj"), (2, 3, "obj")]);
    let pred = arcs(&[(2, 3, "obj"), (0, 2, "root"), (3, 1, "nsubj"), (2, 4, "punct")]);

    let (gold_only, pred_only) = gold.diff(&pred);
    assert_eq!(gold_only, arcs(&[(2, 1, "nsubj")]));
    assert_eq!(pred_only, arcs(&[(3, 1, "nsubj"), (2, 4, "punct")]));

    let (left, right) = gold.diff(&ArcSet::new());
    assert_eq!(left, gold);
    assert!(right.is_empty());
  }

  #[test]
  fn test_diff_relation_mismatch() {
    let a = arcs(&[(1, 2, "nsubj")]);
    let b = arcs(&[(1, 2, "obj")]);
    let (left, right) = a.diff(&b);
    assert_eq!(left, a);
    assert_eq!(right, b);
  }

  #[test]
  fn test_copy_is_independent() {
    let mut a = arcs(&[(0, 1, "root")]);
    let b = a.clone();
    a.add(LabeledArc::new(1, 2, "x"));
    assert_eq!(b.len(), 1);
    assert!(!b.has_head(2));
  }

  #[test]
  fn test_last_and_index() {
    let set = arcs(&[(0, 1, "root"), (1, 2, "x")]);
    assert_eq!(set.last(), Some(&LabeledArc::new(1, 2, "x")));
    assert_eq!(set.index(0), Some(&LabeledArc::new(0, 1, "root")));
    assert_eq!(set.index(2), None);
    assert_eq!(ArcSet::new().last(), None);
    assert_eq!(set.to_string(), "(0-root->1)\n(1-x->2)");
  }

  fn arb_arcs() -> impl Strategy<Value = Vec<LabeledArc>> {
    proptest::collection::vec(
      (0usize..8, 0usize..8, prop_oneof!["a", "b", "c"])
        .prop_map(|(h, m, r)| LabeledArc::new(h, m, r)),
      0..12,
    )
  }

  proptest! {
    #[test]
    fn diff_with_self_is_empty(v in arb_arcs()) {
      let set: ArcSet = v.into_iter().collect();
      let (left, right) = set.diff(&set);
      prop_assert!(left.is_empty());
      prop_assert!(right.is_empty());
    }

    #[test]
    fn equal_is_reflexive_symmetric_and_order_invariant(
      (v, shuffled) in arb_arcs().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
      w in arb_arcs(),
    ) {
      let a: ArcSet = v.into_iter().collect();
      let shuffled: ArcSet = shuffled.into_iter().collect();
      let b: ArcSet = w.into_iter().collect();
      prop_assert!(a == a);
      prop_assert!(a == shuffled);
      prop_assert_eq!(a == b, b == a);
    }
  }
}
