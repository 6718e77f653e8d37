use std::fmt;

/// LIFO of node ids. Empty/out of range accesses return `None` rather than panicking,
/// since an empty stack is a normal parser state that callers branch on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStack(Vec<usize>);

impl IndexStack {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn with_capacity(size: usize) -> Self {
    Self(Vec::with_capacity(size))
  }

  pub fn clear(&mut self) {
    self.0.clear();
  }

  pub fn push(&mut self, val: usize) {
    self.0.push(val);
  }

  pub fn pop(&mut self) -> Option<usize> {
    self.0.pop()
  }

  /// Element `index` positions below the top; `index(0)` is the top
  pub fn index(&self, index: usize) -> Option<usize> {
    if index >= self.len() {
      return None;
    }
    Some(self.0[self.len() - 1 - index])
  }

  pub fn peek(&self) -> Option<usize> {
    self.index(0)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Bottom to top
  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &usize> {
    self.0.iter()
  }
}

impl FromIterator<usize> for IndexStack {
  fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl fmt::Display for IndexStack {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (idx, val) in self.0.iter().enumerate() {
      if idx > 0 {
        write!(f, ",")?;
      }
      write!(f, "{}", val)?;
    }
    write!(f, "]")
  }
}
