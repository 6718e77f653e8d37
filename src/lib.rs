//! Transition-based dependency parsing.
//!
//! A [`TransitionSystem`] advances a [`Configuration`] one [`Transition`] at a time
//! until it is terminal. [`ArcEager`] is the plain stack/queue system;
//! [`ArcEagerMorph`] adds a morphological disambiguation step that resolves each
//! token's [`Lattice`] to a single spellout before its morphemes are parsed. Both come
//! with static oracles that reproduce a gold analysis, for generating training
//! derivations.
//!
//! ```
//! use arceager::{derive, ArcEager, ArcSet, LabeledArc, Morpheme, Oracle, TransitionSystem};
//!
//! let system = ArcEager::new(&["root", "nsubj"]);
//! let gold: ArcSet = vec![LabeledArc::new(0, 2, "root"), LabeledArc::new(2, 1, "nsubj")]
//!   .into_iter()
//!   .collect();
//!
//! let mut oracle = system.oracle();
//! oracle.set_gold(gold.clone());
//!
//! let words = Morpheme::words(&["dogs", "bark"]);
//! let seq = derive(&system, system.init(&words), &oracle).unwrap();
//! assert_eq!(seq.last().unwrap().simple().arcs, gold);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod arceager;
pub mod arcset;
pub mod graph;
pub mod lattice;
pub mod morph;
pub mod stack;
pub mod transition;
pub mod utils;

pub use crate::arceager::{ArcEager, ArcEagerOracle, SimpleConfiguration};
pub use crate::arcset::{ArcSet, LabeledArc};
pub use crate::graph::DepNode;
pub use crate::lattice::{Lattice, Mapping, Morpheme, MorphGold, Spellout, Token};
pub use crate::morph::{ArcEagerMorph, ArcEagerMorphOracle, MorphConfiguration};
pub use crate::stack::IndexStack;
pub use crate::transition::{
  derive, Configuration, ConfigurationSequence, Decision, Move, Oracle, Transition,
  TransitionSystem, Transitions,
};
pub use crate::utils::{Err, TransitionError};
