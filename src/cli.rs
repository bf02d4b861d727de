//! CLI argument parsing.
//!
//! Grounded on the teacher's `src/cli/args.rs` (`clap` derive, `Styles`
//! builder for cargo-matching colors) and `src/main.rs`'s subcommand-enum
//! shape, scoped down to the five operations this crate's core exposes.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(name = "codanna-xref")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-reference index and call-graph analyzer")]
#[command(styles = clap_cargo_style())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LangArg {
    Python,
    C,
    Cpp,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Function,
    Method,
    All,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DirectionArg {
    Forward,
    Backward,
    Both,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Node,
    Scc,
    Hybrid,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum IntraSccArg {
    None,
    Shortest,
    Bounded,
}

#[derive(Subcommand)]
pub enum Command {
    /// Index a file or directory and write an `IndexData` JSON document.
    Index {
        /// File or directory to index.
        path: PathBuf,

        /// Language to parse as. Defaults to every language whose extension
        /// is seen during the walk.
        #[arg(long, value_enum)]
        lang: Option<LangArg>,

        /// Output file for the index JSON. Defaults to `index.json`.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Use the rayon-backed parallel driver.
        #[arg(long)]
        parallel: bool,
    },

    /// Query a saved index by key, name, or regex.
    Query {
        /// Path to an `IndexData` JSON document.
        #[arg(long = "in")]
        input: PathBuf,

        /// Exact symbol, as JSON (e.g. `{"type":"function","name":"main"}`).
        #[arg(long, conflicts_with_all = ["name", "regex"])]
        key: Option<String>,

        /// Exact symbol name.
        #[arg(long, conflicts_with_all = ["key", "regex"])]
        name: Option<String>,

        /// Regex over symbol names.
        #[arg(long, conflicts_with_all = ["key", "name"])]
        regex: Option<String>,

        /// Restrict `--name`/`--regex` to a symbol kind.
        #[arg(long, value_enum, default_value = "all")]
        kind: KindArg,
    },

    /// Build a call graph from a saved index and write a `CallGraph` JSON
    /// document.
    Graph {
        /// Path to an `IndexData` JSON document.
        #[arg(long = "in")]
        input: PathBuf,

        /// Output file for the graph JSON.
        #[arg(long = "out")]
        output: PathBuf,

        /// Expand ambiguous calls into one `May` edge per candidate target
        /// (default: record as unresolved instead).
        #[arg(long)]
        expand_calls: bool,

        #[arg(long, value_enum, default_value = "forward")]
        direction: DirectionArg,

        /// JSON file containing a `[PureDefinition]` array of entrypoints to
        /// prune reachability to.
        #[arg(long)]
        entrypoints: Option<PathBuf>,

        /// Skip SCC computation.
        #[arg(long)]
        no_scc: bool,
    },

    /// Enumerate paths between two nodes in a saved call graph.
    Paths {
        /// Path to a `CallGraph` JSON document.
        #[arg(long = "in")]
        input: PathBuf,

        #[arg(long)]
        src: usize,

        #[arg(long)]
        dst: usize,

        /// Maximum number of paths to return.
        #[arg(long, default_value_t = 10)]
        k: usize,

        #[arg(long)]
        max_depth: Option<usize>,

        #[arg(long, value_enum, default_value = "node")]
        mode: ModeArg,

        #[arg(long, value_enum, default_value = "none")]
        intra_scc: IntraSccArg,

        /// Bound on intra-SCC expansion hops (only used with `--intra-scc`
        /// other than `none`).
        #[arg(long, default_value_t = 16)]
        intra_scc_step_cap: usize,
    },

    /// Print every node of a saved call graph in SCC-topological BFS order.
    Bfs {
        /// Path to a `CallGraph` JSON document.
        #[arg(long = "in")]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "forward")]
        direction: DirectionArg,

        /// Comma-separated starting node indices. Defaults to the
        /// zero-in-degree SCC roots.
        #[arg(long, value_delimiter = ',')]
        start: Option<Vec<usize>>,
    },
}
