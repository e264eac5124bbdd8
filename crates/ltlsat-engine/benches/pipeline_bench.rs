use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ltlsat_engine::{remove_past, FixpointBackend, Module, Solver};
use ltlsat_logic::{Alphabet, Formula, Ltlp, Sort};

/// `G(req_i -> F(grant_i S req_i))` for each client, plus mutual exclusion of grants.
fn arbiter(sigma: &Alphabet, clients: usize) -> Module {
    let b = sigma.builder::<Ltlp>();
    let mut m = Module::new(sigma);
    let mut grants: Vec<Formula<Ltlp>> = Vec::new();
    for i in 0..clients {
        m.declare(&format!("req{i}"), Sort::Boolean).unwrap();
        m.declare(&format!("grant{i}"), Sort::Boolean).unwrap();
        let req = b.proposition(&format!("req{i}")).unwrap();
        let grant = b.proposition(&format!("grant{i}")).unwrap();
        let served = b.eventually(&b.since(&grant, &req).unwrap()).unwrap();
        m.require(b.always(&b.implies(&req, &served).unwrap()).unwrap())
            .unwrap();
        grants.push(grant);
    }
    for (i, gi) in grants.iter().enumerate() {
        for gj in &grants[i + 1..] {
            let both = b.and(gi, gj).unwrap();
            m.require(b.always(&b.not(&both).unwrap()).unwrap()).unwrap();
        }
    }
    m
}

fn bench_remove_past(c: &mut Criterion) {
    let sigma = Alphabet::new();
    let module = arbiter(&sigma, 3);
    let transform = remove_past();
    c.bench_function("remove_past_arbiter3", |b| {
        b.iter(|| transform.apply(black_box(&module)).unwrap())
    });
}

fn bench_fixpoint_check(c: &mut Criterion) {
    let sigma = Alphabet::new();
    let module = arbiter(&sigma, 2);
    let solver = remove_past() | Solver::new(FixpointBackend::default());
    c.bench_function("fixpoint_arbiter2", |b| {
        b.iter(|| solver.check(black_box(&module)).unwrap())
    });
}

fn bench_interning(c: &mut Criterion) {
    c.bench_function("intern_nested_until", |b| {
        b.iter(|| {
            let sigma = Alphabet::new();
            let f = sigma.builder::<Ltlp>();
            let p = f.proposition("p").unwrap();
            let mut acc = p.clone();
            for _ in 0..256 {
                acc = f.until(&acc, &f.yesterday(&p).unwrap()).unwrap();
            }
            black_box(acc)
        })
    });
}

criterion_group!(
    benches,
    bench_remove_past,
    bench_fixpoint_check,
    bench_interning
);
criterion_main!(benches);
