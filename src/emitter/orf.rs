use crate::diagnostics::Diagnostics;
use crate::emitter::introns::filter_coding_introns;
use crate::emitter::{check_intron_attributes, check_layout, LayoutCheck, Segment};
use crate::model::GeneModel;
use crate::options::RewriteOptions;
use crate::reader::{Attributes, Feature, TopLevelKind};
use crate::rewriter_utils::{
    sort_by_strand, CDS_STR, EXON_STR, EXON_SUFFIX, GENE_STR, ID_KEY, MRNA_STR,
    ORF_CLASSIFICATION_KEY, PARENT_KEY, PROTEIN_SUFFIX, PSEUDOGENE_STR, TRANSCRIPT_SUFFIX,
    UNKNOWN_FIELD, UORF_CLASSIFICATION,
};
use std::collections::HashMap;
use tracing::debug;

/// Rewrites a coding gene model (ORF, uORF, or a pseudogene with CDS) into a
/// gene → mRNA → CDS (→ exon) hierarchy.
///
/// The records are produced in this order:
///
/// 1. a `gene` (or `pseudogene`) spanning the anchor, extended outwards by its UTRs,
///    with the anchor's attributes;
/// 2. an `mRNA` on the same span with id `{id}-T` and parent `{id}`;
/// 3. the CDS: either one CDS `{id}-P` from the first to the last coding base when
///    `make_single_cds` is set, or every CDS row re-parented to `{id}-T`;
/// 4. when `print_exons` is set, exons `{id}-T-E{n}` built from each CDS and the UTRs
///    touching it, plus one exon for each UTR that touches no CDS.
///
/// Problems with the CDS layout are reported but do not stop the rewrite. An anchor
/// without an `ID`, an anchor that already has a `Parent`, or a model without any CDS
/// cannot be rewritten; these are reported as fatal and the model is cut short.
pub fn emit_orf(
    model: GeneModel,
    options: &RewriteOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<Feature> {
    let GeneModel {
        anchor,
        kind,
        line,
        cds,
        introns,
        utrs,
        ..
    } = model;
    let mut out = Vec::with_capacity(cds.len() * 2 + utrs.len() + 3);

    let id = match anchor.id() {
        Some(id) => id.to_string(),
        None => {
            diagnostics.fatal(
                None,
                line,
                format!("unable to parse ID from {} feature", anchor.ty),
            );
            return out;
        }
    };
    let strand = anchor.strand();
    let transcript_id = format!("{}{}", id, TRANSCRIPT_SUFFIX);
    let protein_id = format!("{}{}", id, PROTEIN_SUFFIX);

    // UTRs may push the gene outwards, never inwards
    let gene_start = utrs.iter().map(|u| u.start).fold(anchor.start, u64::min);
    let gene_end = utrs.iter().map(|u| u.end).fold(anchor.end, u64::max);

    let gene_type = match kind {
        TopLevelKind::Pseudogene => PSEUDOGENE_STR,
        _ => GENE_STR,
    };
    out.push(anchor.derive(gene_type, gene_start, gene_end, anchor.attributes.clone()));

    if anchor.attributes.contains_key(PARENT_KEY) {
        diagnostics.fatal(
            Some(&id),
            line,
            format!("{} already has a Parent attribute", anchor.ty),
        );
        return out;
    }

    out.push(anchor.derive(
        MRNA_STR,
        gene_start,
        gene_end,
        transcript_attributes(&anchor.attributes, &id, &transcript_id),
    ));

    // CDS extent and classification
    let mut extent: Option<(u64, u64)> = None;
    let mut classification: Option<String> = None;
    for c in &cds {
        extent = Some(match extent {
            Some((lo, hi)) => (lo.min(c.start), hi.max(c.end)),
            None => (c.start, c.end),
        });

        if c.score != UNKNOWN_FIELD {
            diagnostics.violation(&id, line, format!("unexpected CDS score '{}'", c.score));
        }
        if c.phase != UNKNOWN_FIELD {
            diagnostics.violation(&id, line, format!("unexpected CDS phase '{}'", c.phase));
        }
        if c.strand != anchor.strand {
            diagnostics.violation(
                &id,
                line,
                format!(
                    "CDS strand '{}' does not match {} strand '{}'",
                    c.strand, anchor.ty, anchor.strand
                ),
            );
        }
        if c.seqid != anchor.seqid {
            diagnostics.violation(
                &id,
                line,
                format!(
                    "CDS seqid ({}) does not match {} seqid ({})",
                    c.seqid, anchor.ty, anchor.seqid
                ),
            );
        }

        let oc: Option<String> = match kind {
            TopLevelKind::UOrf => Some(UORF_CLASSIFICATION.to_string()),
            _ => c
                .attributes
                .get(ORF_CLASSIFICATION_KEY)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        };

        if options.make_single_cds {
            if oc.is_none() && kind != TopLevelKind::Pseudogene && kind != TopLevelKind::UOrf {
                diagnostics.violation(
                    &id,
                    line,
                    format!(
                        "could not parse orf_classification for CDS at {}-{}",
                        c.start, c.end
                    ),
                );
            }
            match &classification {
                Some(prev) if oc.as_ref() != Some(prev) => diagnostics.violation(
                    &id,
                    line,
                    format!(
                        "CDS orf_classification mismatch ('{}' vs. '{}')",
                        oc.as_deref().unwrap_or_default(),
                        prev
                    ),
                ),
                _ => classification = oc,
            }
        }
    }

    let Some((cds_min, cds_max)) = extent else {
        diagnostics.fatal(Some(&id), line, format!("no CDS features for {}", anchor.ty));
        return out;
    };

    if options.make_single_cds && classification.is_none() && kind != TopLevelKind::Pseudogene {
        diagnostics.violation(&id, line, "could not determine the CDS orf_classification");
    }

    if cds_min != anchor.start {
        diagnostics.violation(
            &id,
            line,
            format!(
                "minimum CDS coordinate ({}) not equal to minimum {} coordinate ({})",
                cds_min, anchor.ty, anchor.start
            ),
        );
    }
    if cds_max != anchor.end {
        diagnostics.violation(
            &id,
            line,
            format!(
                "maximum CDS coordinate ({}) not equal to maximum {} coordinate ({})",
                cds_max, anchor.ty, anchor.end
            ),
        );
    }

    if options.make_single_cds {
        let mut pairs = vec![
            (ID_KEY.to_string(), protein_id.clone()),
            (PARENT_KEY.to_string(), transcript_id.clone()),
        ];
        if let Some(oc) = &classification {
            pairs.push((ORF_CLASSIFICATION_KEY.to_string(), oc.clone()));
        }
        out.push(anchor.derive(CDS_STR, cds_min, cds_max, Attributes::from_pairs(pairs)));
    }

    let coding = filter_coding_introns(introns, &id, line, diagnostics);
    let mut segments: Vec<Segment> = cds
        .into_iter()
        .map(Segment::Block)
        .chain(coding.introns.into_iter().map(Segment::Intron))
        .collect();
    sort_by_strand(&mut segments, strand, |s| s.feature().start);

    let check = LayoutCheck {
        id: &id,
        line,
        strand,
        block_name: CDS_STR,
        exempt: options.is_exempt(&id),
    };
    let n_violations = check_layout(&segments, &check, diagnostics);
    if n_violations > 0 {
        debug!("{} CDS/intron layout violation(s) for {}", n_violations, id);
    }

    let mut exons = ExonBuilder::new(&utrs);
    for seg in segments {
        match seg {
            Segment::Block(c) => {
                if options.print_exons {
                    exons.add_cds(&c);
                }
                if !options.make_single_cds {
                    let attrs = cds_attributes(&c.attributes, &protein_id, &transcript_id);
                    out.push(c.derive(&c.ty, c.start, c.end, attrs));
                }
            }
            Segment::Intron(intron) => check_intron_attributes(&intron, &id, line, diagnostics),
        }
    }

    if options.print_exons {
        let mut derived = exons.finish();
        sort_by_strand(&mut derived, strand, |f| f.start);
        for (n, exon) in derived.into_iter().enumerate() {
            let attrs = Attributes::from_pairs([
                (
                    ID_KEY.to_string(),
                    format!("{}{}{}", transcript_id, EXON_SUFFIX, n + 1),
                ),
                (PARENT_KEY.to_string(), transcript_id.clone()),
            ]);
            out.push(exon.derive(EXON_STR, exon.start, exon.end, attrs));
        }
    }

    out
}

/// The anchor's attributes with its id replaced by the transcript id, and a `Parent`
/// pointing to the gene inserted right after it.
fn transcript_attributes(attrs: &Attributes, gene_id: &str, transcript_id: &str) -> Attributes {
    let mut pairs = Vec::with_capacity(attrs.len() + 1);
    let mut id_done = false;
    for (k, v) in attrs.pairs() {
        if k == ID_KEY && !id_done {
            pairs.push((ID_KEY.to_string(), Some(transcript_id.to_string())));
            pairs.push((PARENT_KEY.to_string(), Some(gene_id.to_string())));
            id_done = true;
        } else {
            pairs.push((k.clone(), v.clone()));
        }
    }
    Attributes::from_entries(pairs)
}

/// A CDS row's attributes with the protein id first and the parent set to the
/// transcript. Any id the row carried is dropped; a missing parent is added.
fn cds_attributes(attrs: &Attributes, protein_id: &str, transcript_id: &str) -> Attributes {
    let parent = (PARENT_KEY.to_string(), Some(transcript_id.to_string()));
    let mut pairs = vec![(ID_KEY.to_string(), Some(protein_id.to_string()))];
    let mut has_parent = false;
    for (k, v) in attrs.pairs() {
        if k == ID_KEY {
            continue;
        }
        if k == PARENT_KEY {
            if !has_parent {
                pairs.push(parent.clone());
                has_parent = true;
            }
        } else {
            pairs.push((k.clone(), v.clone()));
        }
    }
    if !has_parent {
        pairs.push(parent);
    }
    Attributes::from_entries(pairs)
}

/// Joins CDS intervals with the UTRs that abut them.
///
/// A UTR ending right before a CDS extends the exon to the left, a UTR starting right
/// after it extends it to the right. When several UTRs share a boundary the last one in
/// input order wins. UTRs that were never joined become exons of their own.
struct ExonBuilder<'a> {
    utrs: &'a [Feature],
    by_start: HashMap<u64, usize>,
    by_end: HashMap<u64, usize>,
    used: Vec<bool>,
    exons: Vec<Feature>,
}

impl<'a> ExonBuilder<'a> {
    fn new(utrs: &'a [Feature]) -> ExonBuilder<'a> {
        let mut by_start = HashMap::with_capacity(utrs.len());
        let mut by_end = HashMap::with_capacity(utrs.len());
        for (i, u) in utrs.iter().enumerate() {
            by_start.insert(u.start, i);
            by_end.insert(u.end, i);
        }
        ExonBuilder {
            utrs,
            by_start,
            by_end,
            used: vec![false; utrs.len()],
            exons: Vec::new(),
        }
    }

    fn add_cds(&mut self, cds: &Feature) {
        let mut start = cds.start;
        let mut end = cds.end;

        if let Some(&i) = cds.start.checked_sub(1).and_then(|p| self.by_end.get(&p)) {
            start = self.utrs[i].start;
            self.used[i] = true;
        }
        if let Some(&i) = cds.end.checked_add(1).and_then(|p| self.by_start.get(&p)) {
            end = self.utrs[i].end;
            self.used[i] = true;
        }

        self.exons
            .push(cds.derive(EXON_STR, start, end, Attributes::default()));
    }

    /// The derived exons, in no particular order.
    fn finish(mut self) -> Vec<Feature> {
        for (u, used) in self.utrs.iter().zip(self.used) {
            if !used {
                self.exons
                    .push(u.derive(EXON_STR, u.start, u.end, Attributes::default()));
            }
        }
        self.exons
    }
}
