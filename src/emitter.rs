//! Rewriting of flushed gene models.
//!
//! A closed [GeneModel] is handed to exactly one emitter, chosen from the type of its
//! anchor: non-coding models go to [rna::emit_rna], coding ones to [orf::emit_orf]. The
//! emitters return the rewritten records of the model, in output order, and record every
//! problem they find in the run's [Diagnostics].

pub mod introns;
pub mod orf;
pub mod rna;

use crate::diagnostics::Diagnostics;
use crate::model::GeneModel;
use crate::options::RewriteOptions;
use crate::reader::{Feature, TopLevelKind};
use crate::rewriter_utils::{Strand, PARENT_FEATURE_TYPE_KEY, PARENT_KEY, TRNASCAN_MARKER};

/// Which emitter rewrites a gene model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Rna,
    Coding,
}

impl Route {
    /// Chooses the emitter for `model`.
    ///
    /// tRNAscan predictions are always RNA models. A pseudogene is coding when it has at
    /// least one CDS row and non-coding otherwise.
    pub fn of(model: &GeneModel) -> Route {
        if model.anchor.attributes.raw().contains(TRNASCAN_MARKER) {
            return Route::Rna;
        }
        match model.kind {
            TopLevelKind::Orf | TopLevelKind::UOrf => Route::Coding,
            TopLevelKind::Pseudogene if model.cds.is_empty() => Route::Rna,
            TopLevelKind::Pseudogene => Route::Coding,
            TopLevelKind::TRna
            | TopLevelKind::NcRna
            | TopLevelKind::RRna
            | TopLevelKind::SnoRna
            | TopLevelKind::SnRna
            | TopLevelKind::RepeatRegion => Route::Rna,
        }
    }
}

/// Rewrites one closed gene model.
pub fn emit_model(
    model: GeneModel,
    options: &RewriteOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<Feature> {
    match Route::of(&model) {
        Route::Rna => rna::emit_rna(model, diagnostics),
        Route::Coding => orf::emit_orf(model, options, diagnostics),
    }
}

/// An element of the sorted layout of a gene model: an exon-like block (an exon, or a
/// CDS) or a coding intron between two blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Block(Feature),
    Intron(Feature),
}

impl Segment {
    pub(crate) fn feature(&self) -> &Feature {
        match self {
            Segment::Block(f) | Segment::Intron(f) => f,
        }
    }
}

/// Context for checking the layout of one gene model.
pub(crate) struct LayoutCheck<'a> {
    pub id: &'a str,
    pub line: usize,
    pub strand: Option<Strand>,
    /// Name of the block type in messages (`exon` or `CDS`).
    pub block_name: &'static str,
    /// Skip the "block in an intron position" check and the negative-strand contiguity
    /// check. Set for allow-listed legacy models only.
    pub exempt: bool,
}

/// Checks that a layout sorted in transcription order alternates block, intron, block,
/// and that each element starts right after the previous one ends.
///
/// Returns the number of violations recorded.
pub(crate) fn check_layout(
    segments: &[Segment],
    check: &LayoutCheck,
    diagnostics: &mut Diagnostics,
) -> usize {
    let before = diagnostics.len();
    let mut last: Option<(u64, u64)> = None;

    for (i, seg) in segments.iter().enumerate() {
        let is_even = i % 2 == 0;
        let sf = seg.feature();
        match seg {
            Segment::Block(_) if !is_even && !check.exempt => diagnostics.violation(
                check.id,
                check.line,
                format!("expected intron at position {}, found {}", i, sf.ty),
            ),
            Segment::Intron(_) if is_even => diagnostics.violation(
                check.id,
                check.line,
                format!(
                    "expected {} at position {}, found {}",
                    check.block_name, i, sf.ty
                ),
            ),
            _ => {}
        }

        if let Some((last_start, last_end)) = last {
            match check.strand {
                Some(Strand::Positive) => {
                    if last_end.checked_add(1) != Some(sf.start) {
                        diagnostics.violation(
                            check.id,
                            check.line,
                            format!(
                                "{} start={}, expected {}",
                                sf.ty,
                                sf.start,
                                last_end.saturating_add(1)
                            ),
                        );
                    }
                }
                Some(Strand::Negative) => {
                    if last_start.checked_sub(1) != Some(sf.end) && !check.exempt {
                        diagnostics.violation(
                            check.id,
                            check.line,
                            format!(
                                "{} end={}, expected {}",
                                sf.ty,
                                sf.end,
                                last_start.saturating_sub(1)
                            ),
                        );
                    }
                }
                None => {}
            }
        }
        last = Some((sf.start, sf.end));
    }

    diagnostics.len() - before
}

/// Checks the attribute column of a coding intron. It must be `Parent=<id>`, optionally
/// followed by `parent_feature_type=<type>`, and the parent must be the gene model.
pub(crate) fn check_intron_attributes(
    intron: &Feature,
    id: &str,
    line: usize,
    diagnostics: &mut Diagnostics,
) {
    let has_value = |v: &Option<String>| v.as_deref().is_some_and(|v| !v.is_empty());
    // stray separators are dropped by the attribute parser, so look at the raw column
    let clean_separators = !intron.attributes.raw().split(';').any(str::is_empty);
    let well_formed = clean_separators
        && match intron.attributes.pairs() {
            [(k, v)] => k == PARENT_KEY && has_value(v),
            [(k, v), (k2, v2)] => {
                k == PARENT_KEY && has_value(v) && k2 == PARENT_FEATURE_TYPE_KEY && has_value(v2)
            }
            _ => false,
        };
    if !well_formed {
        diagnostics.violation(
            id,
            line,
            format!("unexpected attributes in intron: '{}'", intron.attributes.raw()),
        );
        return;
    }
    match intron.attributes.parent() {
        Some(parent) if parent == id => {}
        parent => diagnostics.violation(
            id,
            line,
            format!(
                "intron Parent={} does not match gene id {}",
                parent.unwrap_or_default(),
                id
            ),
        ),
    }
}
