use criterion::{criterion_group, criterion_main, Criterion};
use trec_core::collection::Collection;
use trec_core::corpus::TrecDocument;
use trec_core::tokenizer::Analyzer;

const WORDS: &[&str] = &[
    "oil", "tanker", "spill", "bank", "interest", "rate", "inflation", "market", "shares", "profit",
    "election", "minister", "trade", "export", "currency", "bond", "energy", "coal", "steel", "wildlife",
];

fn synthetic_corpus(n: usize) -> Vec<TrecDocument> {
    (0..n)
        .map(|i| {
            let text = (0..40).map(|j| WORDS[(i * 7 + j * 13 + j * j) % WORDS.len()]).collect::<Vec<_>>().join(" ");
            TrecDocument { docno: format!("SYN-{i}"), text }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let analyzer = Analyzer::default();
    let (collection, _) = Collection::build(&synthetic_corpus(2_000), &analyzer);
    let retriever = collection.retriever();
    let query = collection
        .space()
        .query_vector(&analyzer.analyze("oil tanker spill wildlife"), &collection.dictionaries.terms);
    c.bench_function("rank_2000_docs", |b| b.iter(|| retriever.rank(&query)));
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
