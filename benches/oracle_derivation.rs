use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arceager::{
  derive, ArcEager, ArcEagerMorph, ArcSet, Configuration, Decision, LabeledArc, Lattice, Mapping,
  MorphGold, Morpheme, Oracle, Spellout, Token, TransitionSystem,
};

fn derive_len<S: TransitionSystem, D: Decision>(system: &S, init: &Configuration, oracle: &D) -> usize {
  derive(system, init.clone(), oracle).unwrap().len()
}

/// A right-branching chain: every word heads the next one
fn chain(n: usize) -> (Vec<Morpheme>, ArcSet) {
  let words = (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>();
  let words = Morpheme::words(&words);
  let arcs = (1..=n)
    .map(|m| LabeledArc::new(m - 1, m, if m == 1 { "root" } else { "dep" }))
    .collect();
  (words, arcs)
}

/// Tokens with two analyses each, one and two morphemes long. Gold picks the split one.
fn ambiguous(n: usize) -> (Vec<Lattice>, MorphGold) {
  let mut lattices = Vec::with_capacity(n);
  let mut mappings = Vec::with_capacity(n);
  for _ in 0..n {
    let token = Token::new(
      "ab",
      vec![
        vec![Morpheme::new("ab", "ab", "NN", "NN")],
        vec![
          Morpheme::new("a", "a", "DT", "DT"),
          Morpheme::new("b", "b", "NN", "NN"),
        ],
      ],
    );
    mappings.push(Mapping::new("ab", Spellout(token.analyses[1].clone())));
    lattices.push(Lattice::from(&token));
  }
  let arcs = (1..=2 * n)
    .map(|m| LabeledArc::new(m - 1, m, if m == 1 { "root" } else { "dep" }))
    .collect();
  (lattices, MorphGold::new(mappings, arcs))
}

fn criterion_benchmark(c: &mut Criterion) {
  let relations = ["root", "dep"];

  let system = ArcEager::new(&relations);
  let (words, gold) = chain(40);
  let mut oracle = system.oracle();
  oracle.set_gold(gold);
  let init = system.init(&words);

  c.bench_function("arc-eager oracle, 40 words", |b| {
    b.iter(|| derive_len(black_box(&system), black_box(&init), black_box(&oracle)))
  });

  let morph = ArcEagerMorph::new(&relations);
  let (lattices, gold) = ambiguous(20);
  let mut morph_oracle = morph.oracle();
  morph_oracle.set_gold(gold);
  let morph_init = morph.init(&lattices);

  c.bench_function("arc-eager-morph oracle, 20 ambiguous tokens", |b| {
    b.iter(|| derive_len(black_box(&morph), black_box(&morph_init), black_box(&morph_oracle)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
