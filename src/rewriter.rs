use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Diagnostics, Severity};
use crate::emitter::{emit_model, Route};
use crate::model::{Accumulator, GeneModel};
use crate::options::RewriteOptions;
use crate::reader::{Feature, FeatureClass};
use crate::rewriter_utils::{COMMENT_PREFIX, FASTA_DIRECTIVE};
use crate::writer::GffWriter;
use anyhow::Context;
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// Counters of one rewrite run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Number of input lines, including comments and blank lines.
    pub lines_read: usize,
    /// Number of input lines copied to the output unchanged.
    pub lines_passed_through: usize,
    /// Number of gene models flushed.
    pub models: usize,
    /// Number of records written by the emitters.
    pub records_emitted: usize,
    /// Number of diagnostics recorded. This is the exit status of the run.
    pub diagnostics: usize,
}

impl RewriteSummary {
    /// The process exit code for this run: the diagnostic count, saturated so that a
    /// run with problems never exits with 0.
    pub fn exit_code(&self) -> i32 {
        self.diagnostics.min(255) as i32
    }
}

/// The streaming driver: reads legacy GFF lines one at a time and writes GFF3.
///
/// Comment lines, the `##FASTA` trailer (and everything after it) and passthrough
/// features are written as soon as they are read. Subfeatures are buffered under the
/// open gene model, which is rewritten and written as one block when the next top-level
/// feature arrives, when the FASTA trailer starts, or when [Rewriter::finish] is called.
///
/// Diagnostics are handed to the sink as soon as they are recorded.
pub struct Rewriter<W: Write, S: DiagnosticSink> {
    writer: GffWriter<W>,
    sink: S,
    options: RewriteOptions,
    accumulator: Accumulator,
    diagnostics: Diagnostics,
    summary: RewriteSummary,
    in_fasta: bool,
}

impl<W: Write, S: DiagnosticSink> Rewriter<W, S> {
    pub fn new(writer: W, sink: S, options: RewriteOptions) -> Rewriter<W, S> {
        Rewriter {
            writer: GffWriter::new(writer),
            sink,
            options,
            accumulator: Accumulator::new(),
            diagnostics: Diagnostics::streaming(),
            summary: RewriteSummary::default(),
            in_fasta: false,
        }
    }

    /// Processes the next input line. `line` may still carry its line terminator.
    ///
    /// Only failures to write the output are returned as errors; problems with the
    /// input itself become diagnostics.
    pub fn process_line(&mut self, line: &str) -> anyhow::Result<()> {
        let line = line.trim_end_matches(['\n', '\r']);
        self.summary.lines_read += 1;
        let lnum = self.summary.lines_read;

        if self.in_fasta || line.starts_with(COMMENT_PREFIX) {
            if line.starts_with(FASTA_DIRECTIVE) && !self.in_fasta {
                // the open model belongs before the sequences
                self.flush()?;
                self.in_fasta = true;
            }
            return self.pass_through(line);
        }

        let feature = match Feature::parse_line(line) {
            Ok(f) => f,
            Err(e) => {
                self.diagnostics.push(
                    Severity::Warning,
                    DiagnosticKind::MalformedRecord,
                    None,
                    lnum,
                    e.to_string(),
                );
                self.diagnostics.forward_to(&mut self.sink);
                return Ok(());
            }
        };

        match feature.class() {
            FeatureClass::TopLevel(kind) => {
                if let Some(previous) = self.accumulator.open(feature, kind, lnum) {
                    self.emit(previous)?;
                }
            }
            FeatureClass::Subfeature(kind) => {
                if let Err(orphan) = self.accumulator.append(kind, feature) {
                    self.diagnostics.push(
                        Severity::Warning,
                        DiagnosticKind::OrphanSubfeature,
                        orphan.id(),
                        lnum,
                        format!("{} with no preceding top-level feature", orphan.ty),
                    );
                }
            }
            FeatureClass::Passthrough => self.pass_through(line)?,
            FeatureClass::Unknown => self.diagnostics.push(
                Severity::Warning,
                DiagnosticKind::UnknownFeatureType,
                feature.id(),
                lnum,
                format!("unexpected feature type ({})", feature.ty),
            ),
        }

        self.diagnostics.forward_to(&mut self.sink);
        Ok(())
    }

    /// Processes the next raw input line. A line that is not valid UTF-8 is reported as
    /// malformed and dropped; the run goes on with the next line.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.process_line(line),
            Err(e) => {
                self.summary.lines_read += 1;
                self.diagnostics.push(
                    Severity::Warning,
                    DiagnosticKind::MalformedRecord,
                    None,
                    self.summary.lines_read,
                    format!("line is not valid UTF-8 ({})", e),
                );
                self.diagnostics.forward_to(&mut self.sink);
                Ok(())
            }
        }
    }

    /// Flushes the last gene model and the output.
    pub fn finish(mut self) -> anyhow::Result<RewriteSummary> {
        self.flush()?;
        self.writer.finish()?;
        self.summary.diagnostics = self.diagnostics.len();
        Ok(self.summary)
    }

    /// The diagnostic counter. Entries are handed to the sink as they are recorded and
    /// are not kept here.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn pass_through(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_line(line)?;
        self.summary.lines_passed_through += 1;
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        match self.accumulator.finish() {
            Some(model) => self.emit(model),
            None => Ok(()),
        }
    }

    fn emit(&mut self, model: GeneModel) -> anyhow::Result<()> {
        let before = self.diagnostics.len();
        debug!(
            "flushing {} {} from line {} ({:?}, {} subfeature(s))",
            model.anchor.ty,
            model.id().unwrap_or("<no ID>"),
            model.line,
            Route::of(&model),
            model.n_subfeatures()
        );

        let records = emit_model(model, &self.options, &mut self.diagnostics);
        self.writer.write_block(&records)?;
        self.summary.models += 1;
        self.summary.records_emitted += records.len();

        if self.diagnostics.len() > before {
            debug!(
                "{} diagnostic(s) for this model",
                self.diagnostics.len() - before
            );
        }
        self.diagnostics.forward_to(&mut self.sink);
        Ok(())
    }
}

/// Rewrites a whole legacy GFF stream.
///
/// # Arguments
///
/// * `reader`: the input lines.
/// * `writer`: receives the GFF3 output.
/// * `sink`: receives every diagnostic, once, in the order it was recorded.
/// * `options`: the collapse and exon options and the exemption allow-list.
///
/// # Returns
///
/// The run counters. The run is clean when [RewriteSummary::diagnostics] is 0.
///
/// # Examples
///
/// ```
/// use gffrewrite::diagnostics::Diagnostic;
/// use gffrewrite::options::RewriteOptions;
/// use gffrewrite::rewriter::rewrite;
///
/// let input = "##gff-version\t3\n\
///              chr1\tCGD\tORF\t100\t400\t.\t+\t.\tID=g1;orf_classification=Verified\n\
///              chr1\tCGD\tCDS\t100\t400\t.\t+\t.\tParent=g1;orf_classification=Verified\n";
/// let mut out = Vec::new();
/// let mut diags: Vec<Diagnostic> = Vec::new();
/// let summary = rewrite(input.as_bytes(), &mut out, &mut diags, &RewriteOptions::default()).unwrap();
///
/// assert_eq!(summary.diagnostics, 0);
/// assert_eq!(String::from_utf8(out).unwrap().lines().count(), 4);
/// ```
pub fn rewrite<R: BufRead, W: Write, S: DiagnosticSink>(
    mut reader: R,
    writer: W,
    sink: S,
    options: &RewriteOptions,
) -> anyhow::Result<RewriteSummary> {
    let mut rewriter = Rewriter::new(writer, sink, options.clone());
    let mut buf = Vec::new();
    for lnum in 1usize.. {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("could not read input line {}", lnum))?;
        if n == 0 {
            break;
        }
        rewriter.process_bytes(&buf)?;
    }
    let summary = rewriter.finish()?;

    info!(
        "Processed {}/{} lines ({} gene models, {} records written), found {} error(s)",
        summary.lines_passed_through,
        summary.lines_read,
        summary.models,
        summary.records_emitted,
        summary.diagnostics
    );
    Ok(summary)
}
