use std::fmt;

use tracing::{debug, trace};

use crate::arcset::{ArcSet, LabeledArc};
use crate::graph::DepNode;
use crate::lattice::Morpheme;
use crate::stack::IndexStack;
use crate::transition::{
  Configuration, Decision, Move, Oracle, Transition, TransitionSystem, Transitions,
};
use crate::utils::TransitionError;

/// Stack/queue/arcs state of an arc-eager derivation. The queue is an [`IndexStack`]
/// whose top is the front of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleConfiguration {
  pub nodes: Vec<DepNode>,
  pub stack: IndexStack,
  pub queue: IndexStack,
  pub arcs: ArcSet,
  pub last_transition: Option<Transition>,
}

impl SimpleConfiguration {
  pub const KIND: &'static str = "arc-eager";

  /// Root is node 0 and starts on the stack; `morphemes` become nodes 1..=n on the queue
  pub fn new(morphemes: Vec<Morpheme>) -> Self {
    let mut conf = Self::empty(morphemes.len() + 1);
    for (idx, m) in morphemes.into_iter().enumerate() {
      conf.nodes.push(DepNode::new(idx + 1, m));
    }
    for id in (1..conf.nodes.len()).rev() {
      conf.queue.push(id);
    }
    conf
  }

  /// Just the root, on the stack
  pub fn empty(capacity: usize) -> Self {
    let mut nodes = Vec::with_capacity(capacity);
    nodes.push(DepNode::root());
    let mut stack = IndexStack::with_capacity(capacity);
    stack.push(0);
    Self {
      nodes,
      stack,
      queue: IndexStack::with_capacity(capacity),
      arcs: ArcSet::with_capacity(capacity),
      last_transition: None,
    }
  }

  pub fn terminal(&self) -> bool {
    self.stack.is_empty() && self.queue.is_empty()
  }

  pub fn has_head(&self, id: usize) -> bool {
    self
      .nodes
      .get(id)
      .map(|n| n.has_head())
      .unwrap_or_else(|| self.arcs.has_head(id))
  }

  /// Commits an arc, updating both the arc set and the nodes' caches
  pub fn add_arc(&mut self, head: usize, modifier: usize, relation: &str) {
    if let Some(node) = self.nodes.get_mut(modifier) {
      node.set_head(head, relation);
    }
    if let Some(node) = self.nodes.get_mut(head) {
      node.add_modifier(modifier);
    }
    self.arcs.add(LabeledArc::new(head, modifier, relation));
  }

  /// Why `m` can't be applied here, or Ok if it can
  fn check(&self, m: &Move) -> Result<(), &'static str> {
    let top = self.stack.peek();
    let front = self.queue.peek();
    match m {
      Move::Shift => front.map(|_| ()).ok_or("queue is empty"),
      Move::Reduce => match top {
        None => Err("stack is empty"),
        // once the input is used up nothing can attach the top anymore
        Some(s) if !self.has_head(s) && front.is_some() => Err("stack top has no head"),
        Some(_) => Ok(()),
      },
      Move::LeftArc(_) => match (top, front) {
        (None, _) => Err("stack is empty"),
        (_, None) => Err("queue is empty"),
        (Some(0), _) => Err("root can't be a modifier"),
        (Some(s), _) if self.has_head(s) => Err("stack top already has a head"),
        _ => Ok(()),
      },
      Move::RightArc(_) => match (top, front) {
        (None, _) => Err("stack is empty"),
        (_, None) => Err("queue is empty"),
        (_, Some(b)) if self.has_head(b) => Err("queue front already has a head"),
        _ => Ok(()),
      },
      Move::Disambiguate(_) => Err("not a morphological configuration"),
    }
  }

  /// Applies a move in place. Callers copy first.
  fn apply(&mut self, m: &Move) -> Result<(), &'static str> {
    self.check(m)?;
    match m {
      Move::Shift => {
        let b = self.queue.pop().ok_or("queue is empty")?;
        self.stack.push(b);
      }
      Move::Reduce => {
        self.stack.pop();
      }
      Move::LeftArc(rel) => {
        let s = self.stack.pop().ok_or("stack is empty")?;
        let b = self.queue.peek().ok_or("queue is empty")?;
        self.add_arc(b, s, rel);
      }
      Move::RightArc(rel) => {
        let s = self.stack.peek().ok_or("stack is empty")?;
        let b = self.queue.pop().ok_or("queue is empty")?;
        self.add_arc(s, b, rel);
        self.stack.push(b);
      }
      Move::Disambiguate(_) => return Err("not a morphological configuration"),
    }
    Ok(())
  }
}

/// Writes a queue front first
pub(crate) fn fmt_queue(f: &mut fmt::Formatter<'_>, queue: &IndexStack) -> fmt::Result {
  write!(f, "[")?;
  for (idx, id) in queue.iter().rev().enumerate() {
    if idx > 0 {
      write!(f, ",")?;
    }
    write!(f, "{}", id)?;
  }
  write!(f, "]")
}

/// One tab-separated trace row: transition, stack, queue, arc count
impl fmt::Display for SimpleConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(t) = &self.last_transition {
      write!(f, "{}", t)?;
    }
    write!(f, "\t{}\t", self.stack)?;
    fmt_queue(f, &self.queue)?;
    write!(f, "\tA={}", self.arcs.len())
  }
}

#[derive(Debug, Clone)]
pub struct ArcEager {
  transitions: Transitions,
  /// Every structural transition, in enumeration order
  moves: Vec<(Move, Transition)>,
}

impl ArcEager {
  pub fn new(relations: &[&str]) -> Self {
    Self::with_registry(relations, Transitions::new())
  }

  /// Registers Shift, Reduce and an arc transition per relation in `transitions`
  pub fn with_registry(relations: &[&str], transitions: Transitions) -> Self {
    let mut moves = vec![Move::Shift, Move::Reduce];
    moves.extend(relations.iter().map(|r| Move::LeftArc(r.to_string())));
    moves.extend(relations.iter().map(|r| Move::RightArc(r.to_string())));

    let moves = moves
      .into_iter()
      .map(|m| {
        let t = transitions.add_move(&m);
        (m, t)
      })
      .collect();

    Self { transitions, moves }
  }

  pub fn transitions(&self) -> &Transitions {
    &self.transitions
  }

  /// Applies `transition` to `conf` in place
  pub(crate) fn apply(
    &self,
    conf: &mut SimpleConfiguration,
    transition: &Transition,
  ) -> Result<(), TransitionError> {
    let m = transition.to_move()?;
    conf
      .apply(&m)
      .map_err(|reason| TransitionError::illegal(transition, reason))?;
    conf.last_transition = Some(transition.clone());
    trace!(
      transition = %transition,
      stack = conf.stack.len(),
      queue = conf.queue.len(),
      arcs = conf.arcs.len(),
      "applied arc-eager transition"
    );
    Ok(())
  }

  pub(crate) fn legal<'a>(
    &'a self,
    conf: &'a SimpleConfiguration,
  ) -> impl Iterator<Item = Transition> + 'a {
    self
      .moves
      .iter()
      .filter(move |(m, _)| conf.check(m).is_ok())
      .map(|(_, t)| t.clone())
  }
}

impl TransitionSystem for ArcEager {
  type Input = [Morpheme];
  type Oracle = ArcEagerOracle;

  fn init(&self, morphemes: &[Morpheme]) -> Configuration {
    Configuration::Simple(SimpleConfiguration::new(morphemes.to_vec()))
  }

  fn transition(
    &self,
    from: &Configuration,
    transition: &Transition,
  ) -> Result<Configuration, TransitionError> {
    let mut conf = from.as_simple()?.clone();
    self.apply(&mut conf, transition)?;
    Ok(Configuration::Simple(conf))
  }

  fn transition_types(&self) -> Vec<String> {
    vec![
      "Shift".to_string(),
      "Reduce".to_string(),
      "LeftArc-*".to_string(),
      "RightArc-*".to_string(),
    ]
  }

  fn possible_transitions<'a>(
    &'a self,
    conf: &'a Configuration,
  ) -> Result<Box<dyn Iterator<Item = Transition> + 'a>, TransitionError> {
    Ok(Box::new(self.legal(conf.as_simple()?)))
  }

  fn oracle(&self) -> ArcEagerOracle {
    ArcEagerOracle::new(self.transitions.clone())
  }
}

/// Static arc-eager oracle: LeftArc, then RightArc if either builds a gold arc, then
/// Reduce once the stack top is done, otherwise Shift. Reconstructs any projective gold tree.
#[derive(Debug, Clone)]
pub struct ArcEagerOracle {
  transitions: Transitions,
  gold: Option<ArcSet>,
}

impl ArcEagerOracle {
  pub fn new(transitions: Transitions) -> Self {
    Self {
      transitions,
      gold: None,
    }
  }

  /// Does `s` still have gold dependents to its right that are unattached?
  fn has_pending_dependents(gold: &ArcSet, conf: &SimpleConfiguration, s: usize) -> bool {
    gold
      .get(Some(s), None, None)
      .iter()
      .any(|arc| arc.modifier > s && !conf.has_head(arc.modifier))
  }

  pub(crate) fn decide(&self, conf: &SimpleConfiguration) -> Result<Transition, TransitionError> {
    let gold = self.gold.as_ref().ok_or(TransitionError::MissingGold)?;

    let m = match (conf.stack.peek(), conf.queue.peek()) {
      (Some(s), Some(b)) => {
        if let Some(arc) = gold.get(Some(b), Some(s), None).first() {
          Move::LeftArc(arc.relation.clone())
        } else if let Some(arc) = gold.get(Some(s), Some(b), None).first() {
          Move::RightArc(arc.relation.clone())
        } else if conf.has_head(s) && !Self::has_pending_dependents(gold, conf, s) {
          Move::Reduce
        } else {
          Move::Shift
        }
      }
      (Some(_), None) => Move::Reduce,
      (None, Some(_)) => Move::Shift,
      (None, None) => return Err(TransitionError::NoLegalTransition),
    };

    let transition = self.transitions.add_move(&m);
    debug!(transition = %transition, "arc-eager oracle");
    Ok(transition)
  }
}

impl Decision for ArcEagerOracle {
  fn transition(&self, conf: &Configuration) -> Result<Transition, TransitionError> {
    self.decide(conf.as_simple()?)
  }
}

impl Oracle for ArcEagerOracle {
  type Gold = ArcSet;

  fn set_gold(&mut self, gold: ArcSet) {
    self.gold = Some(gold);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transition::{derive, ConfigurationSequence};

  fn gold(v: &[(usize, usize, &str)]) -> ArcSet {
    v.iter().map(|(h, m, r)| LabeledArc::new(*h, *m, *r)).collect()
  }

  fn labels(system: &ArcEager, conf: &Configuration) -> Vec<String> {
    system
      .possible_transitions(conf)
      .unwrap()
      .map(|t| t.label().to_string())
      .collect()
  }

  #[test]
  fn test_init() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a", "b", "c"]));
    let c = conf.as_simple().unwrap();

    assert_eq!(c.nodes.len(), 4);
    assert_eq!(c.stack.peek(), Some(0));
    assert_eq!(c.queue.peek(), Some(1));
    assert_eq!(c.queue.len(), 3);
    assert!(c.arcs.is_empty());
    assert!(!conf.terminal());
    assert_eq!(conf.to_string(), "\t[0]\t[1,2,3]\tA=0");
  }

  #[test]
  fn test_init_from_runtime_input() {
    let system = ArcEager::new(&["root"]);
    let line = String::from("tagged input");
    let mut morphemes = Morpheme::words(&line.split(' ').collect::<Vec<_>>());
    morphemes[0].cpos = "JJ".to_string();
    let conf = system.init(&morphemes);
    drop(line);
    drop(morphemes);

    let c = conf.as_simple().unwrap();
    assert_eq!(c.nodes.len(), 3);
    assert_eq!(c.nodes[1].morpheme.form, "tagged");
    assert_eq!(c.nodes[1].morpheme.cpos, "JJ");
    assert_eq!(c.nodes[2].to_string(), "2:input");
  }

  #[test]
  fn test_possible_transitions() {
    let system = ArcEager::new(&["root", "x"]);
    let conf = system.init(&Morpheme::words(&["a", "b"]));
    assert_eq!(
      labels(&system, &conf),
      vec!["Shift", "RightArc-root", "RightArc-x"]
    );

    let (shift, _) = system.transitions().add("Shift");
    let conf = system.transition(&conf, &shift).unwrap();
    assert_eq!(
      labels(&system, &conf),
      vec!["Shift", "LeftArc-root", "LeftArc-x", "RightArc-root", "RightArc-x"]
    );
  }

  #[test]
  fn test_transition_types() {
    let system = ArcEager::new(&["root"]);
    assert_eq!(
      system.transition_types(),
      vec!["Shift", "Reduce", "LeftArc-*", "RightArc-*"]
    );
  }

  #[test]
  fn test_illegal_transitions() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a"]));

    let (reduce, _) = system.transitions().add("Reduce");
    let (left, _) = system.transitions().add("LeftArc-root");
    let (md, _) = system.transitions().add("MD-a");

    for t in [reduce, left, md] {
      assert!(
        matches!(
          system.transition(&conf, &t),
          Err(TransitionError::IllegalTransition { .. })
        ),
        "{t} should be illegal"
      );
    }
  }

  #[test]
  fn test_transition_leaves_input_untouched() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a", "b"]));
    let before = conf.clone();

    for t in system.possible_transitions(&conf).unwrap().collect::<Vec<_>>() {
      let next = system.transition(&conf, &t).unwrap();
      assert_ne!(next, conf);
      assert_eq!(conf, before);
    }
  }

  #[test]
  fn test_right_arc_caches_on_nodes() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a"]));
    let (ra, _) = system.transitions().add("RightArc-root");
    let next = system.transition(&conf, &ra).unwrap();
    let c = next.as_simple().unwrap();

    assert_eq!(c.nodes[1].head(), Some(0));
    assert_eq!(c.nodes[0].modifiers(), &[1]);
    assert!(c.arcs.has_arc(0, 1));
    assert_eq!(c.stack.peek(), Some(1));
    assert_eq!(c.last_transition.as_ref(), Some(&ra));
  }

  #[test]
  fn test_oracle_needs_gold() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a"]));
    assert_eq!(
      system.oracle().transition(&conf),
      Err(TransitionError::MissingGold)
    );
  }

  #[test]
  fn test_oracle_is_deterministic() {
    let system = ArcEager::new(&["root"]);
    let conf = system.init(&Morpheme::words(&["a", "b"]));
    let mut oracle = system.oracle();
    oracle.set_gold(gold(&[(0, 2, "root"), (2, 1, "nsubj")]));

    let first = oracle.transition(&conf).unwrap();
    assert_eq!(oracle.transition(&conf).unwrap(), first);
    assert_eq!(first.label(), "Shift");
  }

  #[test]
  fn test_oracle_reproduces_gold() {
    // A is the root's only child; B and C both depend on A
    let system = ArcEager::new(&["root", "nsubj", "obj"]);
    let gold_arcs = gold(&[(0, 1, "root"), (1, 2, "nsubj"), (1, 3, "obj")]);
    let mut oracle = system.oracle();
    oracle.set_gold(gold_arcs.clone());

    let init = system.init(&Morpheme::words(&["A", "B", "C"]));
    let seq = derive(&system, init.clone(), &oracle).unwrap();

    let last = seq.last().unwrap().as_simple().unwrap();
    assert!(last.terminal());
    assert_eq!(last.arcs, gold_arcs);

    let mut expected = ConfigurationSequence::new();
    let mut conf = init;
    expected.push(conf.clone());
    for label in [
      "RightArc-root",
      "RightArc-nsubj",
      "Reduce",
      "RightArc-obj",
      "Reduce",
      "Reduce",
      "Reduce",
    ] {
      let (t, existed) = system.transitions().add(label);
      assert!(existed);
      conf = system.transition(&conf, &t).unwrap();
      expected.push(conf.clone());
    }

    assert_eq!(seq.len(), 8);
    assert_eq!(seq.shared_transitions(&expected), seq.len());
    assert_eq!(seq, expected);
  }

  #[test]
  fn test_oracle_left_arcs() {
    let system = ArcEager::new(&["root", "nsubj", "det", "advmod"]);
    let gold_arcs = gold(&[(0, 3, "root"), (3, 2, "nsubj"), (2, 1, "det"), (3, 4, "advmod")]);
    let mut oracle = system.oracle();
    oracle.set_gold(gold_arcs.clone());

    let init = system.init(&Morpheme::words(&["the", "dog", "barked", "loudly"]));
    let seq = derive(&system, init, &oracle).unwrap();
    let last = seq.last().unwrap().as_simple().unwrap();

    assert_eq!(last.arcs, gold_arcs);
    // one arc per non-root node, every modifier headed exactly once
    assert_eq!(last.arcs.len(), last.nodes.len() - 1);
    for id in 1..last.nodes.len() {
      assert_eq!(last.arcs.get(None, Some(id), None).len(), 1);
    }
    // terminal exactly when both stack and queue are empty
    for conf in seq.iter() {
      let c = conf.as_simple().unwrap();
      assert_eq!(conf.terminal(), c.stack.is_empty() && c.queue.is_empty());
    }

    let transitions = seq.transitions().map(|t| t.label()).collect::<Vec<_>>();
    assert_eq!(
      transitions,
      vec![
        "Shift",
        "LeftArc-det",
        "Shift",
        "LeftArc-nsubj",
        "RightArc-root",
        "RightArc-advmod",
        "Reduce",
        "Reduce",
        "Reduce",
      ]
    );
  }

  #[test]
  fn test_terminal_has_no_transitions() {
    let system = ArcEager::new(&["root"]);
    let mut oracle = system.oracle();
    oracle.set_gold(gold(&[(0, 1, "root")]));
    let seq = derive(&system, system.init(&Morpheme::words(&["a"])), &oracle).unwrap();
    let last = seq.last().unwrap();

    assert!(last.terminal());
    assert_eq!(system.possible_transitions(last).unwrap().count(), 0);
    assert_eq!(oracle.transition(last), Err(TransitionError::NoLegalTransition));
  }
}
