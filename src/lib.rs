#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod error;
pub mod host;
pub mod path;

mod hashutil;

pub mod program;

pub mod graph;
pub use graph::{BuilderState, DefaultBuilderState, FileInfo, ReferenceGraph, ReferenceMap, ReferencedSet, Signature};

pub mod state;
pub use state::{construct_state, BuilderProgramState};

pub mod iterator;
pub use iterator::Affected;

mod diagnostics;

pub mod facade;
pub use facade::{BaseBuilderProgram, BuilderCore, DiagnosticsBuilderProgram, EmitAndDiagnosticsBuilderProgram};

#[cfg(test)]
pub(crate) mod test_support;
