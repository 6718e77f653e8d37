use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::arceager::{fmt_queue, ArcEager, ArcEagerOracle, SimpleConfiguration};
use crate::graph::DepNode;
use crate::lattice::{Lattice, Mapping, MorphGold, Token};
use crate::stack::IndexStack;
use crate::transition::{
  Configuration, Decision, Move, Oracle, Transition, TransitionSystem, Transitions, MD_PREFIX,
};
use crate::utils::TransitionError;

/// Arc-eager state plus the lattices still waiting to be resolved. Nodes are only
/// created when a lattice is disambiguated, so node ids follow the chosen spellouts.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphConfiguration {
  pub simple: SimpleConfiguration,
  pub lattices: Vec<Rc<Lattice>>,
  /// Lattice indices, next to resolve on top
  pub lattice_queue: IndexStack,
  pub mappings: Vec<Mapping>,
}

impl MorphConfiguration {
  pub const KIND: &'static str = "arc-eager-morph";

  pub fn new(lattices: Vec<Lattice>) -> Self {
    // upper bound: every morpheme of every lattice ends up a node
    let capacity = lattices.iter().map(|l| l.morphemes.len()).sum::<usize>() + 1;

    let mut lattice_queue = IndexStack::with_capacity(lattices.len());
    for id in (0..lattices.len()).rev() {
      lattice_queue.push(id);
    }

    Self {
      simple: SimpleConfiguration::empty(capacity),
      mappings: Vec::with_capacity(lattices.len()),
      lattices: lattices.into_iter().map(Rc::new).collect(),
      lattice_queue,
    }
  }

  pub fn from_tokens(tokens: &[Token]) -> Self {
    Self::new(tokens.iter().map(Lattice::from).collect())
  }

  pub fn terminal(&self) -> bool {
    self.simple.terminal() && self.lattice_queue.is_empty()
  }

  /// The input queue ran dry and there are lattices left: only MD transitions may fire
  pub fn needs_disambiguation(&self) -> bool {
    self.simple.queue.is_empty() && !self.lattice_queue.is_empty()
  }

  /// The lattice the next MD transition will resolve
  pub fn next_lattice(&self) -> Option<&Lattice> {
    self
      .lattice_queue
      .peek()
      .and_then(|id| self.lattices.get(id))
      .map(|l| l.as_ref())
  }

  /// Resolves the next lattice to the spellout whose canonical string is `spellout`.
  /// Its morphemes become fresh nodes, queued in order.
  fn disambiguate(&mut self, transition: &Transition, spellout: &str) -> Result<(), TransitionError> {
    if !self.simple.queue.is_empty() {
      return Err(TransitionError::illegal(transition, "queue is not empty"));
    }
    let lattice_id = self
      .lattice_queue
      .peek()
      .ok_or_else(|| TransitionError::illegal(transition, "lattice queue is empty"))?;
    let lattice = self.lattices[lattice_id].clone();
    let idx = lattice
      .find_str(spellout)
      .ok_or_else(|| TransitionError::SpelloutNotFound {
        token: lattice.token.clone(),
        spellout: spellout.to_string(),
      })?;
    let spellout = lattice.spellouts()[idx].clone();
    self.lattice_queue.pop();

    let num_nodes = self.simple.nodes.len();
    for (i, m) in spellout.iter().enumerate() {
      let mut m = m.clone();
      m.id = num_nodes + i;
      m.token_id = lattice_id;
      self.simple.nodes.push(DepNode::new(num_nodes + i, m));
    }
    for i in (0..spellout.len()).rev() {
      self.simple.queue.push(num_nodes + i);
    }

    debug!(
      token = %lattice.token,
      spellout = %spellout,
      first_node = num_nodes,
      morphemes = spellout.len(),
      "resolved lattice"
    );
    self.mappings.push(Mapping::new(&lattice.token, spellout));
    self.simple.last_transition = Some(transition.clone());
    Ok(())
  }
}

/// Trace row: transition, stack, queue, pending lattices, arc count
impl fmt::Display for MorphConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(t) = &self.simple.last_transition {
      write!(f, "{}", t)?;
    }
    write!(f, "\t{}\t", self.simple.stack)?;
    fmt_queue(f, &self.simple.queue)?;
    write!(f, "\tL=")?;
    fmt_queue(f, &self.lattice_queue)?;
    write!(f, "\tA={}", self.simple.arcs.len())
  }
}

/// Arc-eager with a morphological disambiguation (MD) step: whenever the input queue
/// empties, the next token's lattice must be resolved to one spellout before parsing
/// continues.
#[derive(Debug, Clone)]
pub struct ArcEagerMorph {
  eager: ArcEager,
}

impl ArcEagerMorph {
  pub fn new(relations: &[&str]) -> Self {
    Self {
      eager: ArcEager::new(relations),
    }
  }

  pub fn with_registry(relations: &[&str], transitions: Transitions) -> Self {
    Self {
      eager: ArcEager::with_registry(relations, transitions),
    }
  }

  pub fn transitions(&self) -> &Transitions {
    self.eager.transitions()
  }
}

impl TransitionSystem for ArcEagerMorph {
  type Input = [Lattice];
  type Oracle = ArcEagerMorphOracle;

  fn init(&self, lattices: &[Lattice]) -> Configuration {
    Configuration::Morph(MorphConfiguration::new(lattices.to_vec()))
  }

  fn transition(
    &self,
    from: &Configuration,
    transition: &Transition,
  ) -> Result<Configuration, TransitionError> {
    let mut conf = from.as_morph()?.clone();
    match transition.to_move()? {
      Move::Disambiguate(spellout) => {
        conf.disambiguate(transition, &spellout)?;
        trace!(
          transition = %transition,
          queue = conf.simple.queue.len(),
          lattices = conf.lattice_queue.len(),
          "applied morphological transition"
        );
      }
      _ if conf.needs_disambiguation() => {
        return Err(TransitionError::illegal(
          transition,
          "next lattice must be disambiguated first",
        ));
      }
      _ => self.eager.apply(&mut conf.simple, transition)?,
    }
    Ok(Configuration::Morph(conf))
  }

  fn transition_types(&self) -> Vec<String> {
    let mut types = self.eager.transition_types();
    types.push(format!("{}*", MD_PREFIX));
    types
  }

  fn possible_transitions<'a>(
    &'a self,
    conf: &'a Configuration,
  ) -> Result<Box<dyn Iterator<Item = Transition> + 'a>, TransitionError> {
    let conf = conf.as_morph()?;
    match conf.next_lattice() {
      Some(lattice) if conf.needs_disambiguation() => {
        let transitions = self.transitions();
        let mut seen = HashSet::new();
        Ok(Box::new(
          lattice
            .paths()
            .map(move |path| lattice.spellout(&path).to_string())
            .filter(move |spellout| seen.insert(spellout.clone()))
            .map(move |spellout| transitions.add_move(&Move::Disambiguate(spellout))),
        ))
      }
      _ => Ok(Box::new(self.eager.legal(&conf.simple))),
    }
  }

  fn oracle(&self) -> ArcEagerMorphOracle {
    ArcEagerMorphOracle::new(self.transitions().clone())
  }
}

/// Picks the gold spellout for each lattice (by token position) and defers to the
/// arc-eager oracle in between.
#[derive(Debug, Clone)]
pub struct ArcEagerMorphOracle {
  eager: ArcEagerOracle,
  transitions: Transitions,
  gold: Option<Vec<Mapping>>,
}

impl ArcEagerMorphOracle {
  pub fn new(transitions: Transitions) -> Self {
    Self {
      eager: ArcEagerOracle::new(transitions.clone()),
      transitions,
      gold: None,
    }
  }

  fn decide(&self, conf: &MorphConfiguration) -> Result<Transition, TransitionError> {
    let gold = self.gold.as_ref().ok_or(TransitionError::MissingGold)?;

    match conf.next_lattice() {
      Some(lattice) if conf.needs_disambiguation() => {
        let position = conf.mappings.len();
        let mapping = gold
          .get(position)
          .ok_or(TransitionError::GoldExhausted(position))?;
        let idx = lattice
          .find(&mapping.spellout)
          .ok_or_else(|| TransitionError::SpelloutNotFound {
            token: lattice.token.clone(),
            spellout: mapping.spellout.to_string(),
          })?;

        let spellout = lattice.spellouts()[idx].to_string();
        let transition = self.transitions.add_move(&Move::Disambiguate(spellout));
        debug!(transition = %transition, position, "morph oracle");
        Ok(transition)
      }
      _ => self.eager.decide(&conf.simple),
    }
  }
}

impl Decision for ArcEagerMorphOracle {
  fn transition(&self, conf: &Configuration) -> Result<Transition, TransitionError> {
    self.decide(conf.as_morph()?)
  }
}

impl Oracle for ArcEagerMorphOracle {
  type Gold = MorphGold;

  fn set_gold(&mut self, gold: MorphGold) {
    self.gold = Some(gold.mappings);
    self.eager.set_gold(gold.arcs);
  }
}
