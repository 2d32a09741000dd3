// Criterion benchmarks for provider dispatch.
//
// Uses the in-process sample provider plus a few copies of a word-splitting
// provider, so no shared libraries are needed.
//
// Run:
//   cargo bench -p patronus

use std::ffi::CStr;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use patronus::{Annotation, AnnotationKind, Checker, Properties};
use patronus_provider::{Check, Failure};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Flags every word longer than `N` bytes.
struct LongWords<const N: usize>;

impl<const N: usize> Check for LongWords<N> {
    const NAME: &'static CStr = match N {
        8 => c"Long words (8)",
        10 => c"Long words (10)",
        _ => c"Long words",
    };

    fn check(&self, _: &Properties, text: &str) -> Result<Vec<Annotation>, Failure> {
        let base = text.as_ptr() as usize;
        Ok(text
            .split_whitespace()
            .filter(|w| w.len() > N)
            .map(|w| {
                Annotation::with_suggestions(
                    w.as_ptr() as usize - base,
                    w.len(),
                    "Consider a shorter word",
                    AnnotationKind::Style,
                    [shortened(w, N)],
                )
            })
            .collect())
    }
}

/// The first `n` characters of `word`.
fn shortened(word: &str, n: usize) -> &str {
    match word.char_indices().nth(n) {
        Some((end, _)) => &word[..end],
        None => word,
    }
}

fn corpus(paragraphs: usize) -> String {
    "Hello. It is true that mistakes are good. Extraordinarily verbose \
     sentences sometimes accumulate unnecessarily complicated vocabulary. \
     Übermäßig verschachtelte Sätze überfordern Leserinnen. "
        .repeat(paragraphs)
}

fn checker() -> Checker {
    let mut checker = Checker::new();
    checker.register_check(patronus_sample::Sample).ok();
    checker.register_check(LongWords::<8>).ok();
    checker.register_check(LongWords::<10>).ok();
    checker
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_check(c: &mut Criterion) {
    let checker = checker();
    let props = Properties::new("en_US");

    // Panics inside a provider come back as faults; none may occur here.
    let warmup = checker.check(&props, &corpus(1));
    assert_eq!(warmup.failures().count(), 0, "fixture provider failed");
    assert!(warmup.annotations().any(|a| a.message() == "Consider a shorter word"));
    drop(warmup);

    let mut group = c.benchmark_group("check");
    for paragraphs in [1, 32, 512] {
        let text = corpus(paragraphs);
        group.bench_with_input(BenchmarkId::new("sequential", paragraphs), &text, |b, text| {
            b.iter(|| checker.check(&props, text).len())
        });
        group.bench_with_input(BenchmarkId::new("parallel", paragraphs), &text, |b, text| {
            b.iter(|| checker.check_parallel(&props, text).len())
        });
    }
    group.finish();
}

fn bench_copy_out(c: &mut Criterion) {
    let checker = checker();
    let props = Properties::new("en");
    let text = corpus(32);
    c.bench_function("check_to_annotations", |b| {
        b.iter(|| checker.check(&props, &text).to_annotations())
    });
}

criterion_group!(benches, bench_check, bench_copy_out);
criterion_main!(benches);
