//! Past removal preserves models.

mod common;

use indexmap::IndexSet;
use ltlsat_engine::{
    remove_past, Backend, EnumerationBackend, FixpointBackend, Module, PastRemover,
    PastRemoverOptions, PipelineError, Removal, Solver, SolverOptions, Verdict,
};
use ltlsat_logic::proptest_generators::arb_ltlp_shape;
use ltlsat_logic::{
    evaluate, free_symbols, has_class, holds, Alphabet, Foltlp, FragmentId, Ltl, Ltlp, Node, Sort,
    Symbol, Tag, TagClass, Trace,
};
use proptest::prelude::*;

/// Extend a source trace with the value every fresh proposition must take.
fn extend(removal: &Removal, trace: &Trace) -> Vec<IndexSet<Symbol>> {
    let mut steps = trace.steps().to_vec();
    for (fresh, definition) in &removal.definitions {
        let values = evaluate(definition, &Trace::new(steps.clone())).unwrap();
        for (step, value) in steps.iter_mut().zip(values) {
            if value {
                step.insert(fresh.clone());
            }
        }
    }
    steps
}

fn all_hold(requirements: &[Node], steps: &[IndexSet<Symbol>]) -> bool {
    let trace = Trace::new(steps.to_vec());
    requirements.iter().all(|r| holds(r, &trace).unwrap())
}

/// Every trace over `props` of length 1 to `max_len`.
fn traces(props: &[Symbol], max_len: usize) -> Vec<Trace> {
    let mut out = Vec::new();
    for len in 1..=max_len {
        let bits = len * props.len();
        for assignment in 0..(1u64 << bits) {
            out.push(Trace::from_fn(len, props, |i, s| {
                let k = props.iter().position(|p| p == s).unwrap();
                (assignment >> (i * props.len() + k)) & 1 == 1
            }));
        }
    }
    out
}

#[test]
fn yesterday_alone_is_unsat_before_and_after() {
    common::init_tracing();
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    m.require(b.yesterday(&b.proposition("p").unwrap()).unwrap())
        .unwrap();

    let out = remove_past().apply(&m).unwrap();
    let names: Vec<_> = out.declarations().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["p", "_past0"]);
    let rendered: Vec<String> = out.requirements().iter().map(|r| r.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "_past0",
            "((! _past0) & (G (((X _past0) -> p) & (p -> (wX _past0)))))",
        ]
    );
    assert!(out
        .requirements()
        .iter()
        .all(|r| r.fragment() == FragmentId::Ltl));

    assert_eq!(
        FixpointBackend::default().check(&out).unwrap(),
        Verdict::Unsat
    );
    assert!(EnumerationBackend::default()
        .find_model(&m)
        .unwrap()
        .is_none());
}

#[test]
fn tracking_axiom_alone_is_sat_and_pins_the_previous_value() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    let yp = b.yesterday(&b.proposition("p").unwrap()).unwrap();
    m.require(&yp).unwrap();
    let removal = PastRemover::default().remove(&m).unwrap();

    let mut axiom_only = removal.module.without_requirements();
    axiom_only
        .require(&removal.module.requirements()[1])
        .unwrap();
    assert_eq!(
        FixpointBackend::default().check(&axiom_only).unwrap(),
        Verdict::Sat
    );

    let [(fresh, definition)] = removal.definitions.as_slice() else {
        panic!("expected one fresh proposition, got {:?}", removal.definitions);
    };
    assert_eq!(definition, yp.node());

    let p = m.lookup("p").unwrap().symbol().clone();
    let source = Trace::from_fn(3, [&p], |i, _| i != 1);
    let steps = extend(&removal, &source);
    let fresh_values: Vec<bool> = steps.iter().map(|s| s.contains(fresh)).collect();
    assert_eq!(fresh_values, vec![false, true, false]);
    assert!(all_hold(axiom_only.requirements(), &steps));

    for i in 0..steps.len() {
        let mut flipped = steps.clone();
        if !flipped[i].shift_remove(fresh) {
            flipped[i].insert(fresh.clone());
        }
        assert!(!all_hold(axiom_only.requirements(), &flipped), "flip at {i}");
    }
}

#[test]
fn eventually_yesterday_is_sat() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    m.require(b.eventually(&b.yesterday(&b.proposition("p").unwrap()).unwrap()).unwrap())
        .unwrap();
    let solver = remove_past() | Solver::new(FixpointBackend::default());
    assert_eq!(solver.check(&m).unwrap(), Verdict::Sat);
}

#[test]
fn historically_and_eventually_not_is_unsat() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    let p = b.proposition("p").unwrap();
    // G H p forces p everywhere
    m.require(b.always(&b.historically(&p).unwrap()).unwrap())
        .unwrap();
    m.require(b.eventually(&b.not(&p).unwrap()).unwrap())
        .unwrap();
    let solver = remove_past() | Solver::new(FixpointBackend::default());
    assert_eq!(solver.check(&m).unwrap(), Verdict::Unsat);
}

#[test]
fn since_needs_its_anchor() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p", "q"]);
    let p = b.proposition("p").unwrap();
    let q = b.proposition("q").unwrap();
    m.require(b.eventually(&b.since(&p, &q).unwrap()).unwrap())
        .unwrap();
    m.require(b.always(&b.not(&q).unwrap()).unwrap()).unwrap();
    let solver = remove_past() | Solver::new(FixpointBackend::default());
    assert_eq!(solver.check(&m).unwrap(), Verdict::Unsat);
}

#[test]
fn fresh_prefix_is_configurable_and_avoids_clashes() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltlp>();
    let mut m = common::propositional_module(&sigma, &["p", "aux0"]);
    m.require(b.once(&b.proposition("p").unwrap()).unwrap())
        .unwrap();
    let remover = PastRemover::new(PastRemoverOptions {
        fresh_prefix: "aux".to_string(),
    });
    let out = remover.run(&m).unwrap();
    let names: Vec<_> = out.declarations().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["p", "aux0", "aux1", "aux2"]);
}

#[test]
fn future_modules_pass_through() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Ltl>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    m.require(b.always(&b.proposition("p").unwrap()).unwrap())
        .unwrap();
    let removal = PastRemover::default().remove(&m).unwrap();
    assert_eq!(removal.module, m);
    assert!(removal.definitions.is_empty());
}

#[test]
fn fresh_propositions_do_not_capture_bound_variables() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Foltlp>();
    let mut m = common::propositional_module(&sigma, &["p"]);
    let bound = sigma.symbol("_past0", Sort::Boolean);
    let local = b.exists(&bound, &b.proposition("_past0").unwrap()).unwrap();
    let previous = b.yesterday(&b.proposition("p").unwrap()).unwrap();
    m.require(b.and(&local, &previous).unwrap()).unwrap();

    let removal = PastRemover::default().remove(&m).unwrap();
    let names: Vec<_> = removal.module.declarations().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["p", "_past1"]);
    assert!(removal.module.lookup("_past0").is_none());
    let (fresh, definition) = &removal.definitions[0];
    assert_ne!(fresh, &bound);
    assert_eq!(definition, &*previous);
    let free = free_symbols(&removal.module.requirements()[0]);
    assert!(!free.contains(&bound));
    assert!(free.contains(fresh));
}

#[test]
fn first_order_past_over_declared_variables_is_removed() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Foltlp>();
    let mut m = Module::new(&sigma);
    let x = m.declare("x", Sort::Integer).unwrap();
    let zero = b.equal(&b.var(x.symbol()).unwrap(), &b.constant(0).unwrap()).unwrap();
    m.require(b.eventually(&b.once(&zero).unwrap()).unwrap())
        .unwrap();

    let out = remove_past().apply(&m).unwrap();
    assert!(out
        .requirements()
        .iter()
        .all(|r| !has_class(TagClass::Past, r) && FragmentId::Foltl.includes(r.fragment())));
    assert_eq!(out.declarations().len(), 3);
}

#[test]
fn past_over_quantified_variables_is_unsupported() {
    let sigma = Alphabet::new();
    let b = sigma.builder::<Foltlp>();
    let y = sigma.symbol("y", Sort::Integer);
    let zero = b.equal(&b.var(&y).unwrap(), &b.constant(0).unwrap()).unwrap();
    let body = b.yesterday(&zero).unwrap();

    let mut m = Module::new(&sigma);
    m.require(b.exists(&y, &body).unwrap()).unwrap();
    assert!(matches!(
        remove_past().apply(&m),
        Err(PipelineError::Unsupported {
            tag: Tag::Yesterday,
            ..
        })
    ));

    // a declaration of the same name does not make the bound occurrence free
    let mut shadowed = Module::new(&sigma);
    shadowed.declare("y", Sort::Integer).unwrap();
    shadowed.require(b.forall(&y, &body).unwrap()).unwrap();
    assert!(matches!(
        PastRemover::default().run(&shadowed),
        Err(PipelineError::Unsupported {
            tag: Tag::Yesterday,
            ..
        })
    ));
    assert!(matches!(
        PastRemover::default().remove_formula(&mut shadowed.clone(), &b.exists(&y, &body).unwrap()),
        Err(PipelineError::Unsupported { .. })
    ));
}

fn source_module(sigma: &Alphabet, shape_root: &Node) -> Module {
    let mut m = common::propositional_module(sigma, &["p", "q"]);
    m.require(shape_root).unwrap();
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn models_extend_uniquely(shape in arb_ltlp_shape(2, 3)) {
        let sigma = Alphabet::new();
        let props: Vec<Symbol> = ["p", "q"]
            .iter()
            .map(|n| sigma.symbol(n, ltlsat_logic::Sort::Boolean))
            .collect();
        let formula = shape.build(&sigma, &props).unwrap();
        let m = source_module(&sigma, &formula);
        let removal = PastRemover::default().remove(&m).unwrap();
        let produced = removal.module.requirements();
        prop_assert!(produced.iter().all(|r| r.fragment() == FragmentId::Ltl));

        for trace in traces(&props, 3) {
            let expected = holds(&formula, &trace).unwrap();
            let steps = extend(&removal, &trace);
            prop_assert_eq!(all_hold(produced, &steps), expected, "trace {}", trace);

            for (fresh, _) in &removal.definitions {
                for i in 0..steps.len() {
                    let mut flipped = steps.clone();
                    if !flipped[i].shift_remove(fresh) {
                        flipped[i].insert(fresh.clone());
                    }
                    prop_assert!(
                        !all_hold(produced, &flipped),
                        "flipping {} at {} on {}", fresh, i, trace
                    );
                }
            }
        }
    }

    #[test]
    fn fixpoint_after_removal_agrees_with_enumeration(shape in arb_ltlp_shape(2, 3)) {
        let sigma = Alphabet::new();
        let props: Vec<Symbol> = ["p", "q"]
            .iter()
            .map(|n| sigma.symbol(n, ltlsat_logic::Sort::Boolean))
            .collect();
        let m = source_module(&sigma, &shape.build(&sigma, &props).unwrap());
        let options = SolverOptions { max_trace_length: 3, max_propositions: 8, timeout_secs: 0 };
        let found = EnumerationBackend::new(options.clone()).find_model(&m).unwrap();
        let verdict = (remove_past() | Solver::new(FixpointBackend::new(options)))
            .check(&m)
            .unwrap();
        if found.is_some() {
            prop_assert_ne!(verdict, Verdict::Unsat);
        }
        if verdict == Verdict::Unsat {
            prop_assert!(found.is_none());
        }
    }
}
