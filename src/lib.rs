//! Cross-reference index and call-graph analyzer for source repositories.
//!
//! `model` holds the flat data types; `parsing` turns source files into
//! `Symbol`/`Definition`/`Reference` values per language; `index` maintains
//! the bidirectional cross-reference store; `indexer` drives a repository
//! walk; `graph` builds and queries the call graph; `persist` is the JSON
//! encoder; `config`/`logging`/`error` are the ambient stack shared by the
//! library and the `codanna-xref` binary.

pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod indexer;
pub mod logging;
pub mod model;
pub mod parsing;
pub mod persist;

pub use config::{IndexingConfig, LoggingConfig, Settings};
pub use error::{GraphError, IndexError, QueryError};
pub use index::CrossRefIndex;
pub use indexer::{index_repository, index_repository_parallel, IndexStats};
pub use model::{
    CodeLocation, Definition, FunctionLikeInfo, IndexData, PureDefinition, PureReference,
    Reference, Symbol, SymbolDefinition, SymbolReference,
};
pub use parsing::{processor_for, Language, LanguageProcessor};
