use thiserror::Error;

/// Boxed static error type
pub type Err = Box<dyn std::error::Error + 'static>;

/// Caller-contract violations. None of these are recoverable within a derivation:
/// they mean the driver or the gold data disagrees with the transition system,
/// so the derivation should be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("wrong configuration type: expected {expected}, got {found}")]
  WrongConfiguration {
    expected: &'static str,
    found: &'static str,
  },
  #[error("illegal transition {transition}: {reason}")]
  IllegalTransition { transition: String, reason: String },
  #[error("unknown transition code {0}")]
  UnknownTransition(u32),
  #[error("malformed transition label {0:?}")]
  MalformedLabel(String),
  #[error("oracle needs a gold reference, use set_gold")]
  MissingGold,
  #[error("spellout {spellout:?} not found in lattice of token {token:?}")]
  SpelloutNotFound { token: String, spellout: String },
  #[error("gold has no mapping for token #{0}")]
  GoldExhausted(usize),
  #[error("no legal transition from a non-terminal configuration")]
  NoLegalTransition,
}

impl TransitionError {
  pub(crate) fn illegal(transition: impl ToString, reason: impl ToString) -> Self {
    Self::IllegalTransition {
      transition: transition.to_string(),
      reason: reason.to_string(),
    }
  }
}
