//! Front end for pipeline configuration files.
//!
//! Source text is tokenized, parsed into a [`ConfigUnit`](ast::ConfigUnit) and
//! evaluated into an ordered [`ConfigTree`] plus a [`SelectorRegistry`].

pub mod ast;
pub mod closure;
pub mod config;
pub mod error;
mod eval;
pub mod export;
pub mod lexer;
pub mod merge;
pub mod parser;
pub mod resolver;
pub mod selector;
pub mod value;

pub use closure::{BoundClosure, ClosureContext, ClosureValue};
pub use config::{ConfigParser, ParseOptions, ParsedConfig, PluginSpec};
pub use error::{ConfigError, ErrorKind, Result, Span};
pub use merge::deep_merge;
pub use resolver::{FsResolver, IncludeCache, IncludeRecord, PathResolver};
pub use selector::{Selector, SelectorKey, SelectorKind, SelectorRegistry};
pub use value::{ConfigTree, Value};
