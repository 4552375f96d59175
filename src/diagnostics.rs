use tracing::{error, warn};

/// How much of the current gene model a diagnostic costs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The gene model (or the rest of it) was dropped.
    FatalForModel,
    /// Output was still produced, on a best-effort basis.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::FatalForModel => write!(f, "fatal"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The class of problem a diagnostic reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A row that could not be split into nine columns or has bad coordinates.
    MalformedRecord,
    /// A subfeature row that appears before any top-level row.
    OrphanSubfeature,
    /// A row whose type is neither top-level, subfeature nor passthrough.
    UnknownFeatureType,
    /// A gene model whose parts do not fit together.
    StructuralViolation,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::MalformedRecord => write!(f, "MalformedRecord"),
            DiagnosticKind::OrphanSubfeature => write!(f, "OrphanSubfeature"),
            DiagnosticKind::UnknownFeatureType => write!(f, "UnknownFeatureType"),
            DiagnosticKind::StructuralViolation => write!(f, "StructuralViolation"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One reported problem, with enough context to find it in the input.
///
/// `line` is the 1-based input line of the offending row, or of the anchor row when the
/// problem concerns a whole gene model. `feature_id` is the id of the gene model (or of
/// the row itself) when one is known.
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub feature_id: Option<String>,
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: ", self.line)?;
        if let Some(id) = &self.feature_id {
            write!(f, "{}: ", id)?;
        }
        write!(f, "{} ({}, {})", self.message, self.kind, self.severity)
    }
}

/// Receives every diagnostic once, in the order it was recorded.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`: fatal ones at the error level, the rest as
/// warnings.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::FatalForModel => error!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// The diagnostics of one run.
///
/// A collector made with [Diagnostics::new] keeps every entry for the whole run. One made
/// with [Diagnostics::streaming] drops entries once they have been forwarded to a sink,
/// so that memory does not grow with the number of problems in the input; it still
/// counts them. In both modes no entry is forwarded twice.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    forwarded: usize,
    recorded: usize,
    retain: bool,
}

impl Default for Diagnostics {
    fn default() -> Diagnostics {
        Diagnostics {
            entries: Vec::new(),
            forwarded: 0,
            recorded: 0,
            retain: true,
        }
    }
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    /// A collector that only holds the entries not yet forwarded.
    pub fn streaming() -> Diagnostics {
        Diagnostics {
            retain: false,
            ..Default::default()
        }
    }

    pub fn push(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        feature_id: Option<&str>,
        line: usize,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            severity,
            kind,
            feature_id: feature_id.map(str::to_string),
            line,
            message: message.into(),
        });
        self.recorded += 1;
    }

    /// Records a non-fatal structural problem of the gene model `id` anchored at `line`.
    pub fn violation(&mut self, id: &str, line: usize, message: impl Into<String>) {
        self.push(
            Severity::Warning,
            DiagnosticKind::StructuralViolation,
            Some(id),
            line,
            message,
        )
    }

    /// Records a structural problem that stops the emission of the gene model.
    pub fn fatal(&mut self, id: Option<&str>, line: usize, message: impl Into<String>) {
        self.push(
            Severity::FatalForModel,
            DiagnosticKind::StructuralViolation,
            id,
            line,
            message,
        )
    }

    /// Sends every entry recorded since the last call to `sink`.
    pub fn forward_to<S: DiagnosticSink>(&mut self, sink: &mut S) {
        for d in &self.entries[self.forwarded..] {
            sink.report(d);
        }
        if self.retain {
            self.forwarded = self.entries.len();
        } else {
            self.entries.clear();
            self.forwarded = 0;
        }
    }

    /// The entries still held. For a streaming collector these are only the entries
    /// not yet forwarded.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries recorded since the collector was made, forwarded or not.
    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Number of held entries of the given kind.
    pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
