use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

use crate::arceager::SimpleConfiguration;
use crate::morph::MorphConfiguration;
use crate::utils::TransitionError;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

pub const MD_PREFIX: &str = "MD-";

/// What a transition does, independent of its registry code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
  Shift,
  Reduce,
  LeftArc(String),
  RightArc(String),
  /// Resolve the next lattice to the spellout with this canonical string
  Disambiguate(String),
}

impl fmt::Display for Move {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Shift => write!(f, "Shift"),
      Self::Reduce => write!(f, "Reduce"),
      Self::LeftArc(rel) => write!(f, "LeftArc-{}", rel),
      Self::RightArc(rel) => write!(f, "RightArc-{}", rel),
      Self::Disambiguate(spellout) => write!(f, "{}{}", MD_PREFIX, spellout),
    }
  }
}

impl FromStr for Move {
  type Err = TransitionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    regex_static!(LABEL, r"^(Shift|Reduce|LeftArc|RightArc|MD)(?:-(.+))?$");

    let malformed = || TransitionError::MalformedLabel(s.to_string());
    let caps = LABEL.captures(s).ok_or_else(malformed)?;
    let arg = caps.get(2).map(|m| m.as_str().to_string());
    match (&caps[1], arg) {
      ("Shift", None) => Ok(Self::Shift),
      ("Reduce", None) => Ok(Self::Reduce),
      ("LeftArc", Some(rel)) => Ok(Self::LeftArc(rel)),
      ("RightArc", Some(rel)) => Ok(Self::RightArc(rel)),
      ("MD", Some(spellout)) => Ok(Self::Disambiguate(spellout)),
      _ => Err(malformed()),
    }
  }
}

/// An interned transition: a stable registry code plus the label it was registered under.
/// Equality and hashing only look at the code.
#[derive(Debug, Clone)]
pub struct Transition {
  code: u32,
  label: Rc<str>,
}

impl Transition {
  pub fn code(&self) -> u32 {
    self.code
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn to_move(&self) -> Result<Move, TransitionError> {
    self.label.parse()
  }
}

impl PartialEq for Transition {
  fn eq(&self, other: &Self) -> bool {
    self.code == other.code
  }
}

impl Eq for Transition {}

impl Hash for Transition {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.code.hash(state);
  }
}

impl fmt::Display for Transition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label)
  }
}

#[derive(Debug, Default)]
struct Registry {
  labels: Vec<Rc<str>>,
  codes: HashMap<Rc<str>, u32>,
}

/// Append-only label <-> code table. Cloning the handle shares the table, so every
/// system and oracle of a run sees the same codes. Only one derivation should append
/// at a time.
#[derive(Debug, Clone, Default)]
pub struct Transitions(Rc<RefCell<Registry>>);

impl Transitions {
  pub fn new() -> Self {
    Default::default()
  }

  /// Interns `label`, returning its transition and whether it was already registered
  pub fn add(&self, label: &str) -> (Transition, bool) {
    let mut registry = self.0.borrow_mut();
    if let Some((label, code)) = registry.codes.get_key_value(label) {
      return (
        Transition {
          code: *code,
          label: label.clone(),
        },
        true,
      );
    }

    let code = registry.labels.len() as u32;
    let label: Rc<str> = label.into();
    registry.labels.push(label.clone());
    registry.codes.insert(label.clone(), code);
    (Transition { code, label }, false)
  }

  pub fn add_move(&self, m: &Move) -> Transition {
    self.add(&m.to_string()).0
  }

  pub fn get(&self, code: u32) -> Result<Transition, TransitionError> {
    let registry = self.0.borrow();
    registry
      .labels
      .get(code as usize)
      .map(|label| Transition {
        code,
        label: label.clone(),
      })
      .ok_or(TransitionError::UnknownTransition(code))
  }

  pub fn code_of(&self, label: &str) -> Option<u32> {
    self.0.borrow().codes.get(label).copied()
  }

  pub fn label_of(&self, code: u32) -> Option<String> {
    self.0.borrow().labels.get(code as usize).map(|l| l.to_string())
  }

  pub fn len(&self) -> usize {
    self.0.borrow().labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// A parser state. Each transition system works on exactly one variant; handing it
/// the other is a `TransitionError::WrongConfiguration`.
#[derive(Debug, Clone, PartialEq)]
pub enum Configuration {
  Simple(SimpleConfiguration),
  Morph(MorphConfiguration),
}

impl Configuration {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Simple(_) => SimpleConfiguration::KIND,
      Self::Morph(_) => MorphConfiguration::KIND,
    }
  }

  pub fn terminal(&self) -> bool {
    match self {
      Self::Simple(c) => c.terminal(),
      Self::Morph(c) => c.terminal(),
    }
  }

  pub fn last_transition(&self) -> Option<&Transition> {
    match self {
      Self::Simple(c) => c.last_transition.as_ref(),
      Self::Morph(c) => c.simple.last_transition.as_ref(),
    }
  }

  /// The arc-eager part of the state, which both variants have
  pub fn simple(&self) -> &SimpleConfiguration {
    match self {
      Self::Simple(c) => c,
      Self::Morph(c) => &c.simple,
    }
  }

  pub fn as_simple(&self) -> Result<&SimpleConfiguration, TransitionError> {
    match self {
      Self::Simple(c) => Ok(c),
      other => Err(TransitionError::WrongConfiguration {
        expected: SimpleConfiguration::KIND,
        found: other.kind(),
      }),
    }
  }

  pub fn as_morph(&self) -> Result<&MorphConfiguration, TransitionError> {
    match self {
      Self::Morph(c) => Ok(c),
      other => Err(TransitionError::WrongConfiguration {
        expected: MorphConfiguration::KIND,
        found: other.kind(),
      }),
    }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Simple(c) => write!(f, "{}", c),
      Self::Morph(c) => write!(f, "{}", c),
    }
  }
}

/// Picks one transition for a configuration
pub trait Decision {
  fn transition(&self, conf: &Configuration) -> Result<Transition, TransitionError>;
}

/// A decision backed by a gold reference, which must be set before asking for transitions
pub trait Oracle: Decision {
  type Gold;

  fn set_gold(&mut self, gold: Self::Gold);
}

pub trait TransitionSystem {
  /// Raw input `init` builds the initial configuration from
  type Input: ?Sized;
  type Oracle: Oracle;

  fn init(&self, input: &Self::Input) -> Configuration;

  /// Applies `transition` to a copy of `from`; `from` itself is never modified
  fn transition(
    &self,
    from: &Configuration,
    transition: &Transition,
  ) -> Result<Configuration, TransitionError>;

  /// Transition families, with open-ended families written as `<prefix>*`
  fn transition_types(&self) -> Vec<String>;

  /// Lazily yields every transition legal from `conf`
  fn possible_transitions<'a>(
    &'a self,
    conf: &'a Configuration,
  ) -> Result<Box<dyn Iterator<Item = Transition> + 'a>, TransitionError>;

  fn oracle(&self) -> Self::Oracle;
}

/// Drives `decision` from `init` until the configuration is terminal, recording every state
pub fn derive<S, D>(
  system: &S,
  init: Configuration,
  decision: &D,
) -> Result<ConfigurationSequence, TransitionError>
where
  S: TransitionSystem + ?Sized,
  D: Decision + ?Sized,
{
  let mut seq = ConfigurationSequence::new();
  let mut current = init;
  while !current.terminal() {
    let transition = decision.transition(&current)?;
    let next = system.transition(&current, &transition)?;
    seq.push(std::mem::replace(&mut current, next));
  }
  seq.push(current);
  Ok(seq)
}

/// Configurations of one derivation in the order they were produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSequence(Vec<Configuration>);

impl ConfigurationSequence {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn push(&mut self, conf: Configuration) {
    self.0.push(conf);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn last(&self) -> Option<&Configuration> {
    self.0.last()
  }

  /// Oldest first
  pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Configuration> {
    self.0.iter()
  }

  /// Transitions applied along the derivation, oldest first
  pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
    self.0.iter().filter_map(|c| c.last_transition())
  }

  /// Column-aligned trace, newest configuration first
  pub fn render(&self) -> String {
    let rows = self
      .0
      .iter()
      .rev()
      .map(|conf| conf.to_string())
      .collect::<Vec<_>>();
    let rows = rows
      .iter()
      .map(|row| row.split('\t').collect::<Vec<_>>())
      .collect::<Vec<_>>();

    let mut widths: Vec<usize> = Vec::new();
    for row in rows.iter() {
      for (col, cell) in row.iter().enumerate() {
        let width = cell.chars().count();
        if col == widths.len() {
          widths.push(width);
        } else if widths[col] < width {
          widths[col] = width;
        }
      }
    }

    let mut out = String::new();
    for row in rows.iter() {
      let mut line = String::new();
      for (col, cell) in row.iter().enumerate() {
        line.push_str(cell);
        if col + 1 < row.len() {
          let pad = widths[col] - cell.chars().count() + 2;
          line.extend(std::iter::repeat_n(' ', pad));
        }
      }
      out.push_str(line.trim_end());
      out.push('\n');
    }
    out
  }

  /// Counts identical transitions walking back from the newest configuration of both
  /// sequences, stopping at the first mismatch. This is a shared suffix: two derivations
  /// that only differ in their first step share `len - 1`.
  pub fn shared_transitions(&self, other: &ConfigurationSequence) -> usize {
    self
      .0
      .iter()
      .rev()
      .zip(other.0.iter().rev())
      .take_while(|(a, b)| a.last_transition() == b.last_transition())
      .count()
  }
}

impl fmt::Display for ConfigurationSequence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.render())
  }
}
