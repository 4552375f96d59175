use crate::diagnostics::Diagnostics;
use crate::emitter::introns::filter_coding_introns;
use crate::emitter::{check_intron_attributes, check_layout, LayoutCheck, Segment};
use crate::model::GeneModel;
use crate::reader::{Attributes, Feature};
use crate::rewriter_utils::{sort_by_strand, EXON_SUFFIX, ID_KEY, PARENT_KEY, TRANSCRIPT_SUFFIX};
use tracing::debug;

/// Rewrites a non-coding gene model (tRNA, ncRNA, rRNA, snoRNA, snRNA, repeat_region, or
/// a pseudogene without CDS).
///
/// The RNA row is written unchanged. Its `noncoding_exon` rows are merged with its coding
/// introns, sorted in transcription order and checked for alternation and contiguity.
/// Exons are then written in that order with fresh ids `{id}-T-E{n}` and the RNA as
/// parent, and introns are written as they are, once their `Parent` has been checked.
///
/// A model with CDS rows is not an RNA model: it is reported as fatal and nothing is
/// written for it.
pub fn emit_rna(model: GeneModel, diagnostics: &mut Diagnostics) -> Vec<Feature> {
    let GeneModel {
        anchor,
        line,
        cds,
        introns,
        exons,
        ..
    } = model;

    let id = match anchor.id() {
        Some(id) => id.to_string(),
        None => {
            diagnostics.fatal(
                None,
                line,
                format!("unable to parse ID from {} feature", anchor.ty),
            );
            return Vec::new();
        }
    };

    if !cds.is_empty() {
        diagnostics.fatal(
            Some(&id),
            line,
            format!("found {} unexpected CDS feature(s) for RNA", cds.len()),
        );
        return Vec::new();
    }

    let coding = filter_coding_introns(introns, &id, line, diagnostics);

    let mut segments: Vec<Segment> = exons
        .into_iter()
        .map(Segment::Block)
        .chain(coding.introns.into_iter().map(Segment::Intron))
        .collect();
    let strand = anchor.strand();
    sort_by_strand(&mut segments, strand, |s| s.feature().start);

    let check = LayoutCheck {
        id: &id,
        line,
        strand,
        block_name: "exon",
        exempt: false,
    };
    let n_violations = check_layout(&segments, &check, diagnostics);
    if n_violations > 0 {
        debug!("{} layout violation(s) for RNA {}", n_violations, id);
    }

    let mut out = Vec::with_capacity(segments.len() + 1);
    out.push(anchor);

    let mut exon_number = 1usize;
    for seg in segments {
        match seg {
            Segment::Block(exon) => {
                // noncoding exons hang off the RNA itself, not off a transcript
                let attrs = Attributes::from_pairs([
                    (
                        ID_KEY.to_string(),
                        format!("{}{}{}{}", id, TRANSCRIPT_SUFFIX, EXON_SUFFIX, exon_number),
                    ),
                    (PARENT_KEY.to_string(), id.clone()),
                ]);
                out.push(exon.derive(&exon.ty, exon.start, exon.end, attrs));
                exon_number += 1;
            }
            Segment::Intron(intron) => {
                check_intron_attributes(&intron, &id, line, diagnostics);
                out.push(intron);
            }
        }
    }

    out
}
