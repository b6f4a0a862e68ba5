//! Serialization benchmarks for docsearch
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docsearch::index::{BuildConfig, EntryType, SearchDataBuilder, Symbol};
use docsearch::output::{pretty_print, PrettyPrintOptions};

/// A synthetic API: namespaces with classes, each with a few overloaded methods
fn create_symbols(namespaces: usize) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for n in 0..namespaces {
        let namespace = format!("Namespace{n}");
        symbols.push(Symbol::new(
            EntryType::Namespace,
            namespace.as_str(),
            format!("namespace{namespace}.html"),
        ));
        for c in 0..10 {
            let class = format!("Class{c}");
            let url = format!("class{namespace}_1_1{class}.html");
            symbols.push(
                Symbol::new(EntryType::Class, class.as_str(), url.as_str())
                    .prefix([namespace.as_str()])
                    .keyword(format!("{}{c}", namespace.to_lowercase()), None, 0),
            );
            for m in 0..5 {
                symbols.push(
                    Symbol::new(EntryType::Func, format!("method{m}"), format!("{url}#a{m}"))
                        .prefix([namespace.as_str(), class.as_str()])
                        .params(["int", "const std::string&"]),
                );
                symbols.push(
                    Symbol::new(EntryType::Func, format!("method{m}"), format!("{url}#b{m}"))
                        .prefix([namespace.as_str(), class.as_str()])
                        .params(["float"])
                        .suffix(" const"),
                );
            }
        }
    }
    symbols
}

fn build(symbols: &[Symbol], config: &BuildConfig) -> Vec<u8> {
    let mut builder = SearchDataBuilder::new(config.clone());
    builder.add_symbols(symbols).expect("Failed to add symbols");
    builder.finish().expect("Failed to serialize")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for namespaces in [1, 10, 50] {
        let symbols = create_symbols(namespaces);
        group.bench_with_input(
            BenchmarkId::from_parameter(symbols.len()),
            &symbols,
            |b, symbols| b.iter(|| build(black_box(symbols), &BuildConfig::default())),
        );
    }
    group.finish();
}

fn bench_merging(c: &mut Criterion) {
    let symbols = create_symbols(10);
    let configs = [
        ("merged", BuildConfig::default()),
        (
            "unmerged",
            BuildConfig {
                merge_subtrees: false,
                merge_prefixes: false,
                ..Default::default()
            },
        ),
    ];

    let mut group = c.benchmark_group("merging");
    for (name, config) in &configs {
        group.bench_function(*name, |b| b.iter(|| build(black_box(&symbols), config)));
    }
    group.finish();
}

fn bench_pretty_print(c: &mut Criterion) {
    let data = build(&create_symbols(10), &BuildConfig::default());
    let options = PrettyPrintOptions::default();

    c.bench_function("pretty_print", |b| {
        b.iter(|| pretty_print(black_box(&data), &options).expect("Failed to print"))
    });
}

criterion_group!(benches, bench_build, bench_merging, bench_pretty_print);
criterion_main!(benches);
