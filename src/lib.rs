//! gffrewrite turns legacy, flat GFF annotation files (one top-level `ORF`, `tRNA`, `ncRNA`, ...
//! row followed by its `CDS`, intron, UTR and `noncoding_exon` rows) into
//! [GFF3](https://github.com/The-Sequence-Ontology/Specifications/blob/master/gff3.md) with an
//! explicit gene → mRNA → CDS/exon hierarchy.
//!
//! The input is read in a single pass. Rows are grouped into gene models, each model is
//! checked and rewritten as soon as it is complete, and every structural problem found
//! along the way is recorded as a [Diagnostic](diagnostics::Diagnostic). Problems never stop
//! the run: the number of diagnostics is the outcome of the run, and 0 means the file is
//! clean.
//!
//! The main entry point is [rewrite](rewriter::rewrite).

pub mod diagnostics;
pub mod emitter;
pub mod model;
pub mod options;
pub mod reader;
pub mod rewriter;
pub mod rewriter_utils;
pub mod writer;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics, Severity};
pub use options::RewriteOptions;
pub use rewriter::{rewrite, RewriteSummary, Rewriter};
