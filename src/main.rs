mod cli;

use std::path::Path;

use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, Command, DirectionArg, IntraSccArg, KindArg, LangArg, ModeArg};
use codanna_xref::graph::{
    bfs_traverse_graph, build_call_graph, find_paths, CallGraph, Direction, GraphConstructOptions,
    IntraSccStrategy, PathReturnMode,
};
use codanna_xref::index::{CrossRefIndex, Query, TypeFilter};
use codanna_xref::model::{PureDefinition, Symbol};
use codanna_xref::parsing::Language;
use codanna_xref::{indexer, logging, persist, Settings};

fn main() {
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("configuration error: {e}, using defaults");
        Settings::default()
    });
    logging::init_with_config(&settings.logging);

    let cli = Cli::parse();

    if let Err(e) = run(cli.command, &settings) {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Index { path, lang, out, parallel } => {
            cmd_index(path, lang, out, parallel || settings.indexing.parallel)
        }
        Command::Query { input, key, name, regex, kind } => cmd_query(input, key, name, regex, kind),
        Command::Graph { input, output, expand_calls, direction, entrypoints, no_scc } => {
            cmd_graph(input, output, expand_calls, direction, entrypoints, no_scc)
        }
        Command::Paths { input, src, dst, k, max_depth, mode, intra_scc, intra_scc_step_cap } => {
            cmd_paths(input, src, dst, k, max_depth, mode, intra_scc, intra_scc_step_cap)
        }
        Command::Bfs { input, direction, start } => cmd_bfs(input, direction, start),
    }
}

fn lang_to_language(lang: LangArg) -> Language {
    match lang {
        LangArg::Python => Language::Python,
        LangArg::C => Language::C,
        LangArg::Cpp => Language::Cpp,
    }
}

fn kind_to_filter(kind: KindArg) -> TypeFilter {
    match kind {
        KindArg::Function => TypeFilter::Function,
        KindArg::Method => TypeFilter::Method,
        KindArg::All => TypeFilter::All,
    }
}

fn direction_from_arg(direction: DirectionArg) -> Direction {
    match direction {
        DirectionArg::Forward => Direction::Forward,
        DirectionArg::Backward => Direction::Backward,
        DirectionArg::Both => Direction::Both,
    }
}

fn cmd_index(
    path: std::path::PathBuf,
    lang: Option<LangArg>,
    out: Option<std::path::PathBuf>,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let language = lang
        .map(lang_to_language)
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension)
        })
        .unwrap_or(Language::Python);
    let processor = codanna_xref::parsing::processor_for(language);

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} indexing {msg}").unwrap());
    bar.set_message(path.display().to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(120));

    let (index, stats) = if parallel {
        indexer::index_repository_parallel(&path, processor.as_ref())
    } else {
        indexer::index_repository(&path, processor.as_ref())
    };

    bar.finish_with_message(format!(
        "{} files indexed, {} skipped",
        stats.files_indexed, stats.files_skipped
    ));

    let out_path = out.unwrap_or_else(|| Path::new("index.json").to_path_buf());
    persist::save_index(&index, &out_path)?;
    println!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_query(
    input: std::path::PathBuf,
    key: Option<String>,
    name: Option<String>,
    regex: Option<String>,
    kind: KindArg,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = persist::load_index(&input)?;
    let type_filter = kind_to_filter(kind);

    let query = if let Some(key_json) = key {
        let symbol: Symbol = serde_json::from_str(&key_json)?;
        Query::ByKey { symbol }
    } else if let Some(name) = name {
        Query::ByName { name, type_filter }
    } else if let Some(pattern) = regex {
        Query::ByNameRegex { pattern, type_filter }
    } else {
        return Err("query requires one of --key, --name, --regex".into());
    };

    let results = index.handle_query(&query)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["symbol", "definitions", "references"]);
    for (symbol, info) in &results {
        table.add_row(vec![
            symbol_label(symbol),
            info.definitions.len().to_string(),
            info.references.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn symbol_label(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Function { name } => name.clone(),
        Symbol::Method { name, class_name: Some(class) } => format!("{class}.{name}"),
        Symbol::Method { name, class_name: None } => name.clone(),
    }
}

fn cmd_graph(
    input: std::path::PathBuf,
    output: std::path::PathBuf,
    expand_calls: bool,
    direction: DirectionArg,
    entrypoints: Option<std::path::PathBuf>,
    no_scc: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let index: CrossRefIndex = persist::load_index(&input)?;

    let entrypoints = entrypoints
        .map(|path| -> Result<Vec<PureDefinition>, Box<dyn std::error::Error>> {
            let bytes = std::fs::read(path)?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .transpose()?;

    let options = GraphConstructOptions {
        expand_calls,
        direction: direction_from_arg(direction),
        entrypoints,
        compute_scc: !no_scc,
    };

    let graph = build_call_graph(&index, &options);
    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&output, json)?;
    println!(
        "wrote {} ({} nodes, {} edges, {} unresolved)",
        output.display(),
        graph.stats.num_nodes,
        graph.stats.num_edges,
        graph.stats.unresolved_calls
    );
    Ok(())
}

fn load_graph(path: &Path) -> Result<CallGraph, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[allow(clippy::too_many_arguments)]
fn cmd_paths(
    input: std::path::PathBuf,
    src: usize,
    dst: usize,
    k: usize,
    max_depth: Option<usize>,
    mode: ModeArg,
    intra_scc: IntraSccArg,
    intra_scc_step_cap: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(&input)?;

    let return_mode = match mode {
        ModeArg::Node => PathReturnMode::Node,
        ModeArg::Scc => PathReturnMode::Scc,
        ModeArg::Hybrid => PathReturnMode::Hybrid,
    };
    let strategy = match intra_scc {
        IntraSccArg::None => IntraSccStrategy::None,
        IntraSccArg::Shortest => IntraSccStrategy::Shortest,
        IntraSccArg::Bounded => IntraSccStrategy::BoundedEnumerate,
    };

    let result = find_paths(&graph, src, dst, k, max_depth, return_mode, strategy, intra_scc_step_cap)?;
    if result.paths.is_empty() {
        println!("no paths found");
        return Ok(());
    }
    for path in &result.paths {
        match path {
            codanna_xref::graph::PathValue::Node(p) => println!("{p}"),
            codanna_xref::graph::PathValue::Scc(p) => println!("{p}"),
            codanna_xref::graph::PathValue::Hybrid(p) => println!("{p}"),
        }
    }
    Ok(())
}

fn cmd_bfs(
    input: std::path::PathBuf,
    direction: DirectionArg,
    start: Option<Vec<usize>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(&input)?;
    let order = bfs_traverse_graph(&graph, direction_from_arg(direction), start.as_deref());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["order", "file", "line"]);
    for (i, node) in order.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            node.location.file_path.display().to_string(),
            node.location.start_lineno.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
