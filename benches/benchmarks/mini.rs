use std::hint::black_box;

use criterion::{criterion_group, Criterion};

use minicycle::{parse_mini_or_panic, Pattern, Span, Time};

// ---------------------------------------------------------------------------------------------

fn create_pattern() -> Pattern<String> {
    // musical nonsense, trying to excessively use most of the supported features
    parse_mini_or_panic(
        r#"
[{g@2 h}%4 ! !],
[[a b c d](3,8,7)]
[[0 1]!2 <a b>!4] [x|y|z],
[0 .. 12]
[<[7? 2? 3?] [3 2 0]>@6 . [a,b,c,d,e,f]*2],
[bd*<2 3> sn?0.3 hh(5,8)]
"#,
    )
}

// ---------------------------------------------------------------------------------------------

pub fn parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mini");
    group.bench_function("Parse", |b| b.iter(|| black_box(create_pattern())));
    group.finish();
}

pub fn sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mini");
    let pattern = create_pattern();
    group.bench_function("Sample", |b| {
        let mut cycle = 0u64;
        b.iter(|| {
            let span = Span::new(Time::from(cycle), Time::from(cycle + 1));
            cycle += 1;
            black_box(pattern.events_in(span))
        })
    });
    group.finish();
}

// ---------------------------------------------------------------------------------------------

criterion_group! {
    name = mini;
    config = Criterion::default();
    targets = parse, sample
}
