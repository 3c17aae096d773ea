//! code2map: slice source files into per-symbol fragments, with a
//! human-readable catalog and a machine-readable map of where each symbol went.

pub mod collector;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod grammar;
pub mod index;
pub mod info;
pub mod map;
pub mod parts;
pub mod pipeline;
pub mod reader;
pub mod references;
pub mod scanner;
pub mod slicer;
pub mod symbols;
pub mod types;

pub use crate::error::Error;
pub use crate::frontend::{FrontEnd, TreeSitterFrontEnd};
pub use crate::pipeline::{BatchReport, FileReport, OutputLayout, RunOptions, run_batch, run_file};
pub use crate::symbols::SymbolTable;
pub use crate::types::{Fragment, MapEntry, Symbol, SymbolKind, Warning, WarningKind};
