use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use trec_core::collection::{Collection, Run};
use trec_core::config::Config;
use trec_core::corpus::load_corpus;
use trec_core::lookup::lookup;
use trec_core::persist::{write_file, IndexPaths};
use trec_core::qrels::load_qrels;
use trec_core::report::{write_performance_report, write_results};
use trec_core::tokenizer::Analyzer;
use trec_core::topics::load_topics;
use trec_core::QueryVariant;
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trec-indexer")]
#[command(about = "Build a TF-IDF index over a TREC collection and evaluate ranked retrieval", long_about = None)]
struct Cli {
    /// JSON config file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the corpus, build and validate the indexes, write them out
    Build(BuildArgs),
    /// Rank every topic against a built index and evaluate against qrels
    Query(QueryArgs),
    /// Look terms up interactively (one per line on stdin, `quit` to stop)
    Lookup(LookupArgs),
    /// Build, then query, optionally followed by interactive lookup
    Run {
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value_t = false)]
        interactive: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Directory holding the TREC `*.txt` files
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Output directory for index files and reports
    #[arg(long)]
    output: Option<PathBuf>,
    /// Stopword list, one word per line
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Exit non-zero when validation finds inconsistencies
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args)]
struct QueryArgs {
    /// Index directory written by `build` (defaults to the output directory)
    #[arg(long)]
    index: Option<PathBuf>,
    #[arg(long)]
    topics: Option<PathBuf>,
    #[arg(long)]
    qrels: Option<PathBuf>,
    /// Variant written to the results file: title, title+desc or title+narr
    #[arg(long)]
    variant: Option<String>,
    /// Keep at most this many results per topic and variant
    #[arg(long)]
    max_results: Option<usize>,
}

#[derive(Args)]
struct LookupArgs {
    #[arg(long)]
    index: Option<PathBuf>,
    #[arg(long)]
    stopwords: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Build(args) => {
            args.apply(&mut config);
            build(&config)?.finish(args.strict)
        }
        Commands::Query(args) => {
            args.apply(&mut config)?;
            let analyzer = Analyzer::from_optional_file(config.stopwords.as_deref());
            let collection = Collection::load(&IndexPaths::new(&config.output_dir))?;
            query(&config, &collection, &analyzer)
        }
        Commands::Lookup(args) => {
            if let Some(index) = args.index { config.output_dir = index; }
            if args.stopwords.is_some() { config.stopwords = args.stopwords; }
            let analyzer = Analyzer::from_optional_file(config.stopwords.as_deref());
            let collection = Collection::load(&IndexPaths::new(&config.output_dir))?;
            interactive_lookup(&collection, &analyzer)
        }
        Commands::Run { build: build_args, query: query_args, interactive } => {
            build_args.apply(&mut config);
            query_args.apply(&mut config)?;
            let built = build(&config)?;
            query(&config, &built.collection, &built.analyzer)?;
            if interactive {
                interactive_lookup(&built.collection, &built.analyzer)?;
            }
            built.finish(build_args.strict)
        }
    }
}

impl BuildArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(c) = &self.corpus { config.corpus_dir = c.clone(); }
        if let Some(o) = &self.output { config.output_dir = o.clone(); }
        if let Some(s) = &self.stopwords { config.stopwords = Some(s.clone()); }
    }
}

impl QueryArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(i) = &self.index { config.output_dir = i.clone(); }
        if let Some(t) = &self.topics { config.topics = t.clone(); }
        if let Some(q) = &self.qrels { config.qrels = q.clone(); }
        if let Some(v) = &self.variant { config.results_variant = v.parse::<QueryVariant>()?; }
        if self.max_results.is_some() { config.max_results = self.max_results; }
        Ok(())
    }
}

/// A collection built in memory, with what went wrong while producing it.
struct Built {
    collection: Collection,
    analyzer: Analyzer,
    inconsistencies: usize,
    saved: bool,
}

impl Built {
    /// The command's exit status once everything else has run.
    fn finish(&self, strict: bool) -> Result<()> {
        if !self.saved {
            bail!("index files could not all be written");
        }
        if strict && self.inconsistencies > 0 {
            bail!("index validation found {} inconsistencies", self.inconsistencies);
        }
        Ok(())
    }
}

/// Build and save the index. A failed save is logged and reported through
/// `Built::finish`, so callers can still query the in-memory collection.
fn build(config: &Config) -> Result<Built> {
    let analyzer = Analyzer::from_optional_file(config.stopwords.as_deref());
    let documents = load_corpus(&config.corpus_dir)?;
    if documents.is_empty() {
        bail!("no documents found under {}", config.corpus_dir.display());
    }
    let (collection, inconsistencies) = Collection::build(&documents, &analyzer);

    let paths = IndexPaths::new(&config.output_dir);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let saved = match collection.save(&paths, &collection.meta(inconsistencies, created_at)) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = format!("{err:#}"), "index not fully saved");
            false
        }
    };

    if inconsistencies > 0 {
        tracing::error!(inconsistencies, "index failed validation");
    }
    println!(
        "Indexed {} documents ({} terms) into {}",
        collection.total_documents(),
        collection.dictionaries.terms.len(),
        config.output_dir.display()
    );
    Ok(Built { collection, analyzer, inconsistencies, saved })
}

fn query(config: &Config, collection: &Collection, analyzer: &Analyzer) -> Result<()> {
    let queries = load_topics(&config.topics)?;
    let judgments = load_qrels(&config.qrels)?;
    let run = collection.run_topics(&queries, &judgments, analyzer, config.max_results);
    write_outputs(config, &run)?;
    println!("Processed {} topics, {} ranked results", queries.len(), run.results.len());
    Ok(())
}

fn write_outputs(config: &Config, run: &Run) -> Result<()> {
    let paths = IndexPaths::new(&config.output_dir);
    let results_path = paths.file(&config.results_file);
    let report_path = paths.file(&config.report_file);

    let variant = config.results_variant;
    let results = write_file(&results_path, |w| write_results(w, run.for_variant(variant)).map(|_| ()));
    let report = write_file(&report_path, |w| write_performance_report(w, &run.report));

    let mut failed = 0;
    for outcome in [results, report] {
        if let Err(err) = outcome {
            tracing::error!(error = format!("{err:#}"), "failed to write query output");
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} query output file(s) could not be written");
    }
    if run.for_variant(variant).next().is_none() {
        tracing::warn!(variant = variant.label(), "no results found for any query");
    }
    tracing::info!(results = %results_path.display(), report = %report_path.display(), "query outputs written");
    Ok(())
}

fn interactive_lookup(collection: &Collection, analyzer: &Analyzer) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "\nEnter a term to search (or 'quit' to exit): ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let term = line.trim();
        if term.eq_ignore_ascii_case("quit") {
            break;
        }
        if term.is_empty() {
            continue;
        }
        writeln!(stdout, "{}", lookup(collection, analyzer, term))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const CORPUS: &str = "\
<DOC>
<DOCNO>FT911-1</DOCNO>
<TEXT>
Oil tanker spill off the coast.
</TEXT>
</DOC>
<DOC>
<DOCNO>FT911-2</DOCNO>
<TEXT>
Central bank raises interest rates.
</TEXT>
</DOC>
";

    const TOPICS: &str = "<top>\n<num> Number: 401\n<title> oil spill\n</top>\n";

    fn config(root: &Path) -> Config {
        let corpus = root.join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("a.txt"), CORPUS).unwrap();
        fs::write(root.join("topics.txt"), TOPICS).unwrap();
        fs::write(root.join("main.qrels"), "401 0 FT911-1 1\n").unwrap();
        Config {
            corpus_dir: corpus,
            topics: root.join("topics.txt"),
            qrels: root.join("main.qrels"),
            output_dir: root.join("out"),
            ..Config::default()
        }
    }

    #[test]
    fn failed_index_write_still_allows_queries() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        fs::create_dir_all(IndexPaths::new(&config.output_dir).meta()).unwrap();

        let built = build(&config).unwrap();
        assert!(!built.saved);
        assert!(IndexPaths::new(&config.output_dir).forward_dump().is_file());

        query(&config, &built.collection, &built.analyzer).unwrap();
        let results = fs::read_to_string(config.output_dir.join(&config.results_file)).unwrap();
        assert!(results.starts_with("401     FT911-1"));
        assert!(config.output_dir.join(&config.report_file).is_file());

        let err = built.finish(false).unwrap_err();
        assert!(err.to_string().contains("could not all be written"));
    }

    #[test]
    fn strict_fails_only_on_inconsistencies() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let mut built = build(&config).unwrap();
        assert!(built.saved);
        assert!(built.finish(true).is_ok());

        built.inconsistencies = 2;
        assert!(built.finish(false).is_ok());
        assert!(built.finish(true).is_err());
    }
}
