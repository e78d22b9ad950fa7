//! Benchmarks for setregex compilation, matching and set operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use setregex::{compile, compile_all, compile_with, Flags};

const EMAIL: &str = r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}";
const LOOKAROUND: &str = r"(?=.*[0-9])(?=.*[A-Z])(?!.*\s)[\w@#$%]{8,32}";

fn long_input(len: usize) -> String {
    "abcdefghij".chars().cycle().take(len).collect()
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_email", |b| b.iter(|| compile(black_box(EMAIL)).unwrap()));
    c.bench_function("compile_lookaround", |b| {
        b.iter(|| compile(black_box(LOOKAROUND)).unwrap())
    });
    c.bench_function("compile_bounded_repetition", |b| {
        b.iter(|| compile(black_box("[a-f]{10,200}")).unwrap())
    });
}

fn bench_matching(c: &mut Criterion) {
    let email = compile(EMAIL).unwrap();
    c.bench_function("match_email", |b| {
        b.iter(|| email.matches(black_box("someone.else+tag@example.co.uk")))
    });

    let password = compile(LOOKAROUND).unwrap();
    c.bench_function("match_lookaround", |b| {
        b.iter(|| password.matches(black_box("Sup3rSecret#Pass")))
    });

    // linear even for patterns that backtrack badly elsewhere
    let nested = compile("(a|aa)*b").unwrap();
    let input = "a".repeat(10_000);
    c.bench_function("match_nested_star_10k", |b| {
        b.iter(|| nested.matches(black_box(&input)))
    });

    let letters = compile("[a-j]*").unwrap();
    let input = long_input(100_000);
    c.bench_function("match_100k_str", |b| b.iter(|| letters.matches(black_box(&input))));
    c.bench_function("match_100k_reader", |b| {
        b.iter(|| letters.match_reader(black_box(input.as_bytes())).unwrap())
    });
    let utf16: Vec<u16> = input.encode_utf16().collect();
    c.bench_function("match_100k_utf16", |b| {
        b.iter(|| letters.match_utf16(black_box(utf16.iter().copied())))
    });

    let folded = compile_with(
        "[a-j]*",
        Flags {
            case_insensitive: true,
            ..Flags::default()
        },
    )
    .unwrap();
    let upper = input.to_uppercase();
    c.bench_function("match_100k_case_insensitive", |b| {
        b.iter(|| folded.matches(black_box(&upper)))
    });
}

fn bench_set_operations(c: &mut Criterion) {
    let group = compile_all(&[EMAIL, r".*@example\.com", r"[^@]*"], Flags::default()).unwrap();
    c.bench_function("intersect", |b| {
        b.iter(|| group[0].intersect(black_box(&group[1])).unwrap())
    });
    c.bench_function("is_subset_of", |b| {
        b.iter(|| group[0].is_subset_of(black_box(&group[1])).unwrap())
    });
    c.bench_function("do_intersect_disjoint", |b| {
        b.iter(|| group[0].do_intersect(black_box(&group[2])).unwrap())
    });
    c.bench_function("minimize_email", |b| b.iter(|| black_box(&group[0]).minimize()));
}

criterion_group!(benches, bench_compile, bench_matching, bench_set_operations);
criterion_main!(benches);
