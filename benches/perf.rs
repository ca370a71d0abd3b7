use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use less_engine::{CompileOptions, LessEngine};

struct Case {
    name: &'static str,
    source: &'static str,
}

fn compile_benchmarks(c: &mut Criterion) {
    let cases = [
        Case {
            name: "baseline",
            source: include_str!("../fixtures/benchmark.less"),
        },
        Case {
            name: "mixins",
            source: include_str!("../fixtures/mixins.less"),
        },
        Case {
            name: "arithmetic",
            source: include_str!("../fixtures/arithmetic.less"),
        },
    ];

    for case in &cases {
        bench_case(c, case);
    }
}

fn bench_case(c: &mut Criterion, case: &Case) {
    let mut group = c.benchmark_group(format!("less_compile/{}", case.name));
    group.throughput(Throughput::Bytes(case.source.len() as u64));

    for minify in [false, true] {
        let engine = LessEngine::with_options(CompileOptions { minify });
        let id = BenchmarkId::new(case.name, if minify { "min" } else { "pretty" });
        group.bench_with_input(id, &engine, |b, engine| {
            b.iter(|| engine.compile(case.source).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, compile_benchmarks);
criterion_main!(benches);
