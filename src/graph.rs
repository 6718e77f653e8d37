use std::fmt;

use crate::lattice::Morpheme;

pub const ROOT_FORM: &str = "ROOT";

/// A node of the dependency graph under construction. Caches its own head and
/// modifiers as arcs get committed, so legality checks don't have to scan the arc set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepNode {
  pub id: usize,
  pub morpheme: Morpheme,
  head: Option<(usize, String)>,
  modifiers: Vec<usize>,
}

impl DepNode {
  pub fn new(id: usize, morpheme: Morpheme) -> Self {
    Self {
      id,
      morpheme,
      head: None,
      modifiers: Vec::new(),
    }
  }

  /// The artificial root, always node 0
  pub fn root() -> Self {
    Self::new(0, Morpheme::new(ROOT_FORM, ROOT_FORM, ROOT_FORM, ROOT_FORM))
  }

  pub fn is_root(&self) -> bool {
    self.id == 0
  }

  pub fn head(&self) -> Option<usize> {
    self.head.as_ref().map(|(h, _)| *h)
  }

  pub fn relation(&self) -> Option<&str> {
    self.head.as_ref().map(|(_, rel)| rel.as_str())
  }

  pub fn has_head(&self) -> bool {
    self.head.is_some()
  }

  pub fn modifiers(&self) -> &[usize] {
    &self.modifiers
  }

  pub(crate) fn set_head(&mut self, head: usize, relation: &str) {
    self.head = Some((head, relation.to_string()));
  }

  pub(crate) fn add_modifier(&mut self, modifier: usize) {
    if let Err(pos) = self.modifiers.binary_search(&modifier) {
      self.modifiers.insert(pos, modifier);
    }
  }
}

impl fmt::Display for DepNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.id, self.morpheme)
  }
}
