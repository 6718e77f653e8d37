//! Morphological input to the parser: morphemes, tokens with their candidate
//! analyses, the lattice of all segmentations of a token, and the spellouts
//! (paths) through it.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::arcset::ArcSet;

pub const SPELLOUT_SEPARATOR: &str = "|";

/// A morpheme is an edge `from -> to` in its token's lattice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
  pub id: usize,
  pub from: usize,
  pub to: usize,
  pub form: String,
  pub lemma: String,
  pub cpos: String,
  pub pos: String,
  pub features: BTreeMap<String, String>,
  pub token_id: usize,
}

impl Morpheme {
  pub fn new(form: &str, lemma: &str, cpos: &str, pos: &str) -> Self {
    Self {
      id: 0,
      from: 0,
      to: 0,
      form: form.to_string(),
      lemma: lemma.to_string(),
      cpos: cpos.to_string(),
      pos: pos.to_string(),
      features: BTreeMap::new(),
      token_id: 0,
    }
  }

  /// A bare morpheme with only a surface form
  pub fn word(form: &str) -> Self {
    Self::new(form, form, "", "")
  }

  /// One bare morpheme per word, in order
  pub fn words<S: AsRef<str>>(forms: &[S]) -> Vec<Self> {
    forms.iter().map(|f| Self::word(f.as_ref())).collect()
  }

  /// `form:lemma:CPOS:POS`, then `:name=value,...` if there are features.
  /// Two morphemes with the same label are the same analysis.
  pub fn label(&self) -> String {
    let mut label = format!("{}:{}:{}:{}", self.form, self.lemma, self.cpos, self.pos);
    for (idx, (name, value)) in self.features.iter().enumerate() {
      label.push(if idx == 0 { ':' } else { ',' });
      label.push_str(name);
      label.push('=');
      label.push_str(value);
    }
    label
  }

  pub fn with_feature(mut self, name: &str, value: &str) -> Self {
    self.features.insert(name.to_string(), value.to_string());
    self
  }
}

impl fmt::Display for Morpheme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.form)?;
    if !self.cpos.is_empty() {
      write!(f, "/{}", self.cpos)?;
    }
    Ok(())
  }
}

/// A surface token and its candidate analyses, each an ordered morpheme sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub form: String,
  pub analyses: Vec<Vec<Morpheme>>,
}

impl Token {
  pub fn new(form: &str, analyses: Vec<Vec<Morpheme>>) -> Self {
    Self {
      form: form.to_string(),
      analyses,
    }
  }

  pub fn num_morphemes(&self) -> usize {
    self.analyses.iter().map(|a| a.len()).sum()
  }
}

/// One path through a lattice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spellout(pub Vec<Morpheme>);

impl Spellout {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Morpheme> {
    self.0.iter()
  }

  /// Just the segmentation: forms joined by `|`. Not unique, tags are dropped.
  pub fn forms(&self) -> String {
    self
      .0
      .iter()
      .map(|m| m.form.as_str())
      .collect::<Vec<_>>()
      .join(SPELLOUT_SEPARATOR)
  }
}

/// Canonical form: morpheme labels joined by `|`. Used as a lookup key and MD label suffix.
impl fmt::Display for Spellout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, m) in self.0.iter().enumerate() {
      if idx > 0 {
        write!(f, "{}", SPELLOUT_SEPARATOR)?;
      }
      write!(f, "{}", m.label())?;
    }
    Ok(())
  }
}

/// The morpheme graph of a single token. Every path from `start` to `end` is a spellout.
#[derive(Debug, Clone)]
pub struct Lattice {
  pub token: String,
  pub morphemes: Vec<Morpheme>,
  start: usize,
  end: usize,
  out: HashMap<usize, Vec<usize>>,
  spellouts: OnceCell<Vec<Spellout>>,
}

impl Lattice {
  /// Builds a lattice from morpheme edges. The lowest `from` is the start node and
  /// the highest `to` is the end node. Edges must not form cycles.
  pub fn new(token: &str, morphemes: Vec<Morpheme>) -> Self {
    let start = morphemes.iter().map(|m| m.from).min().unwrap_or(0);
    let end = morphemes.iter().map(|m| m.to).max().unwrap_or(0);

    let mut out: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, m) in morphemes.iter().enumerate() {
      out.entry(m.from).or_default().push(idx);
    }

    Self {
      token: token.to_string(),
      morphemes,
      start,
      end,
      out,
      spellouts: OnceCell::new(),
    }
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn end(&self) -> usize {
    self.end
  }

  /// Lazily walks every start -> end path, depth first, as morpheme indices.
  /// Restartable: each call starts a fresh walk.
  pub fn paths(&self) -> Paths<'_> {
    let stack = if self.morphemes.is_empty() {
      Vec::new()
    } else {
      vec![(self.start, 0)]
    };
    Paths {
      lattice: self,
      stack,
      path: Vec::new(),
    }
  }

  /// The morphemes along `path`, as returned by [`Lattice::paths`]
  pub fn spellout(&self, path: &[usize]) -> Spellout {
    Spellout(path.iter().map(|idx| self.morphemes[*idx].clone()).collect())
  }

  /// All distinct spellouts, in path discovery order. Generated once, later calls
  /// return the same slice.
  pub fn spellouts(&self) -> &[Spellout] {
    self.spellouts.get_or_init(|| {
      let mut seen = HashSet::new();
      self
        .paths()
        .map(|path| self.spellout(&path))
        .filter(|spellout| seen.insert(spellout.to_string()))
        .collect()
    })
  }

  /// Index of the spellout with the same canonical string as `spellout`, i.e. the same
  /// morpheme labels in the same order. Lattice positions and ids are not compared.
  pub fn find(&self, spellout: &Spellout) -> Option<usize> {
    self.find_str(&spellout.to_string())
  }

  #[cfg(test)]
  pub(crate) fn spellouts_generated(&self) -> Option<&[Spellout]> {
    self.spellouts.get().map(|v| v.as_slice())
  }

  pub fn find_str(&self, canonical: &str) -> Option<usize> {
    self
      .spellouts()
      .iter()
      .position(|s| s.to_string() == canonical)
  }
}

impl PartialEq for Lattice {
  fn eq(&self, other: &Self) -> bool {
    self.token == other.token && self.morphemes == other.morphemes
  }
}

/// Each analysis becomes its own chain of edges; all chains share the start and end node.
impl From<&Token> for Lattice {
  fn from(token: &Token) -> Self {
    let end = token.num_morphemes().max(1);
    let mut next_node = 1;
    let mut morphemes = Vec::with_capacity(token.num_morphemes());

    for analysis in token.analyses.iter() {
      let mut from = 0;
      for (idx, m) in analysis.iter().enumerate() {
        let to = if idx + 1 == analysis.len() {
          end
        } else {
          next_node += 1;
          next_node - 1
        };
        let mut m = m.clone();
        m.id = morphemes.len();
        m.from = from;
        m.to = to;
        morphemes.push(m);
        from = to;
      }
    }

    Lattice::new(&token.form, morphemes)
  }
}

impl fmt::Display for Lattice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:", self.token)?;
    for m in self.morphemes.iter() {
      write!(f, " {}-{}:{}", m.from, m.to, m)?;
    }
    Ok(())
  }
}

/// Depth-first path walk over a lattice, see [`Lattice::paths`]
pub struct Paths<'a> {
  lattice: &'a Lattice,
  /// (node, next outgoing edge to try)
  stack: Vec<(usize, usize)>,
  path: Vec<usize>,
}

impl Iterator for Paths<'_> {
  type Item = Vec<usize>;

  fn next(&mut self) -> Option<Self::Item> {
    let lattice = self.lattice;
    while let Some((node, next_edge)) = self.stack.last_mut() {
      let edges = lattice
        .out
        .get(&*node)
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

      if *next_edge >= edges.len() {
        // exhausted this node, backtrack over the edge that led here
        self.stack.pop();
        self.path.pop();
        continue;
      }

      let edge = edges[*next_edge];
      *next_edge += 1;
      self.path.push(edge);

      let to = lattice.morphemes[edge].to;
      if to == lattice.end {
        let found = self.path.clone();
        self.path.pop();
        return Some(found);
      }
      self.stack.push((to, 0));
    }
    None
  }
}

/// The spellout chosen for one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
  pub token: String,
  pub spellout: Spellout,
}

impl Mapping {
  pub fn new(token: &str, spellout: Spellout) -> Self {
    Self {
      token: token.to_string(),
      spellout,
    }
  }
}

impl fmt::Display for Mapping {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} => {}", self.token, self.spellout)
  }
}

/// Gold reference for the morphology-aware oracle: one mapping per token, in token
/// order, and the arcs over the morpheme nodes those mappings produce (root is node 0).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphGold {
  pub mappings: Vec<Mapping>,
  pub arcs: ArcSet,
}

impl MorphGold {
  pub fn new(mappings: Vec<Mapping>, arcs: ArcSet) -> Self {
    Self { mappings, arcs }
  }
}
