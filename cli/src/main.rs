use std::env;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arceager::{
  derive, ArcEager, ArcEagerMorph, ArcSet, ConfigurationSequence, Err, LabeledArc, Lattice,
  Mapping, MorphGold, Morpheme, Oracle, Spellout, Token, TransitionSystem,
};

const RELATIONS: &[&str] = &["root", "nsubj", "det", "advmod"];

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} [options]

Runs the static oracle over a built-in sentence and reports the derivation.

Options:
  -h, --help    Print this message
  -t, --trace   Print every configuration, newest first
  -a, --arcs    Print the final tree, one node per line with its head and relation
  -m, --morph   Use the morphological system (lattice input with MD transitions)

Set RUST_LOG (e.g. RUST_LOG=arceager=trace) to see transitions as they are applied.",
    prog_name
  )
}

fn gold_arcs(v: &[(usize, usize, &str)]) -> ArcSet {
  v.iter().map(|(h, m, r)| LabeledArc::new(*h, *m, *r)).collect()
}

fn simple_derivation() -> Result<ConfigurationSequence, Err> {
  let system = ArcEager::new(RELATIONS);
  let mut oracle = system.oracle();
  oracle.set_gold(gold_arcs(&[
    (0, 3, "root"),
    (3, 2, "nsubj"),
    (2, 1, "det"),
    (3, 4, "advmod"),
  ]));

  let sentence = [
    ("the", "DT"),
    ("dog", "NN"),
    ("barked", "VB"),
    ("loudly", "RB"),
  ]
  .iter()
  .map(|(form, tag)| Morpheme::new(form, form, tag, tag))
  .collect::<Vec<_>>();

  let seq = derive(&system, system.init(&sentence), &oracle)?;
  Ok(seq)
}

fn morph_derivation() -> Result<ConfigurationSequence, Err> {
  let hdog = Token::new(
    "hdog",
    vec![
      vec![Morpheme::new("hdog", "hdog", "NN", "NN")],
      vec![
        Morpheme::new("h", "h", "DT", "DT"),
        Morpheme::new("dog", "dog", "NN", "NN").with_feature("num", "S"),
      ],
    ],
  );
  let barked = Token::new(
    "barked",
    vec![vec![Morpheme::new("barked", "bark", "VB", "VB")]],
  );
  let lattices = vec![Lattice::from(&hdog), Lattice::from(&barked)];

  let system = ArcEagerMorph::new(RELATIONS);
  let mut oracle = system.oracle();
  oracle.set_gold(MorphGold::new(
    vec![
      Mapping::new("hdog", Spellout(hdog.analyses[1].clone())),
      Mapping::new("barked", Spellout(barked.analyses[0].clone())),
    ],
    gold_arcs(&[(0, 3, "root"), (3, 2, "nsubj"), (2, 1, "det")]),
  ));

  let seq = derive(&system, system.init(&lattices), &oracle)?;
  Ok(seq)
}

struct Args {
  print_trace: bool,
  print_arcs: bool,
  morph: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = match iter.next() {
      Some(name) => name,
      None => return Err(Self::make_error_message("bad argument vector", "cli")),
    };

    let mut print_trace = false;
    let mut print_arcs = false;
    let mut morph = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-t" || o == "--trace" {
        print_trace = true;
      } else if o == "-a" || o == "--arcs" {
        print_arcs = true;
      } else if o == "-m" || o == "--morph" {
        morph = true;
      } else {
        return Err(Self::make_error_message(
          &format!("unknown option {}", o),
          prog_name,
        ));
      }
    }

    Ok(Self {
      print_trace,
      print_arcs,
      morph,
    })
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let seq = if opts.morph {
    morph_derivation()
  } else {
    simple_derivation()
  };
  let seq = match seq {
    Ok(seq) => seq,
    Err(e) => {
      warn!(error = %e, "derivation aborted");
      return Err(e);
    }
  };

  let last = match seq.last() {
    Some(last) => last,
    None => return Ok(()),
  };
  info!(kind = last.kind(), configurations = seq.len(), "derived");

  println!(
    "Derived {} configuration{} with {} transition{}",
    seq.len(),
    if seq.len() == 1 { "" } else { "s" },
    seq.transitions().count(),
    if seq.transitions().count() == 1 { "" } else { "s" },
  );
  println!(
    "{}",
    seq
      .transitions()
      .map(|t| t.label())
      .collect::<Vec<_>>()
      .join(" ")
  );

  if opts.print_trace {
    println!("\n{}", seq);
  }

  if opts.print_arcs {
    let conf = last.simple();
    println!();
    for node in conf.nodes.iter().filter(|n| !n.is_root()) {
      let head = node.head().map_or("_".to_string(), |h| h.to_string());
      println!(
        "{}\t{}\t{}\t{}\t{}",
        node.id,
        node.morpheme.form,
        node.morpheme.cpos,
        head,
        node.relation().unwrap_or("_")
      );
    }
    println!("\n{}", conf.arcs.sorted());
  }

  Ok(())
}
