use crate::reader::{Feature, IntronKind, SubfeatureKind, TopLevelKind};

#[derive(Clone, Debug, PartialEq, Eq)]
/// The rows of one gene model, collected between its top-level row and the next one.
///
/// # Fields
///
/// * `anchor`: The top-level row (ORF, uORF, pseudogene, or an RNA type).
/// * `kind`: The classified type of the anchor.
/// * `line`: The 1-based input line of the anchor.
/// * `cds`: CDS rows, in input order.
/// * `introns`: Intron-family rows (`intron`, `gap` and the two UTR intron types), in input
///   order, each with its kind.
/// * `exons`: `noncoding_exon` rows, in input order.
/// * `utrs`: `five_prime_UTR` and `three_prime_UTR` rows, in input order.
pub struct GeneModel {
    pub anchor: Feature,
    pub kind: TopLevelKind,
    pub line: usize,
    pub cds: Vec<Feature>,
    pub introns: Vec<(IntronKind, Feature)>,
    pub exons: Vec<Feature>,
    pub utrs: Vec<Feature>,
}

impl GeneModel {
    pub fn new(anchor: Feature, kind: TopLevelKind, line: usize) -> GeneModel {
        GeneModel {
            anchor,
            kind,
            line,
            cds: Vec::new(),
            introns: Vec::new(),
            exons: Vec::new(),
            utrs: Vec::new(),
        }
    }

    /// Adds a subfeature row to the buffer matching its kind.
    pub fn push(&mut self, kind: SubfeatureKind, feature: Feature) {
        match kind {
            SubfeatureKind::Cds => self.cds.push(feature),
            SubfeatureKind::Intron(ik) => self.introns.push((ik, feature)),
            SubfeatureKind::Utr(_) => self.utrs.push(feature),
            SubfeatureKind::NoncodingExon => self.exons.push(feature),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.anchor.id()
    }

    /// Number of buffered subfeature rows.
    pub fn n_subfeatures(&self) -> usize {
        self.cds.len() + self.introns.len() + self.exons.len() + self.utrs.len()
    }
}

/// Buffers subfeature rows under the currently open gene model.
///
/// The accumulator is either idle or holds exactly one open model. Opening a new model
/// and finishing the input both hand the previous model back to the caller by value, so
/// a model is never reused or shared once it is closed.
#[derive(Debug, Default)]
pub struct Accumulator {
    open: Option<GeneModel>,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn current(&self) -> Option<&GeneModel> {
        self.open.as_ref()
    }

    /// Starts a new gene model anchored on `anchor`, returning the model that was open
    /// before, if any. The returned model must be flushed before anything else is
    /// written.
    pub fn open(&mut self, anchor: Feature, kind: TopLevelKind, line: usize) -> Option<GeneModel> {
        self.open.replace(GeneModel::new(anchor, kind, line))
    }

    /// Appends a subfeature row to the open model. When no model is open the row is an
    /// orphan, and it is handed back as the error value.
    pub fn append(&mut self, kind: SubfeatureKind, feature: Feature) -> Result<(), Feature> {
        match self.open.as_mut() {
            Some(model) => {
                model.push(kind, feature);
                Ok(())
            }
            None => Err(feature),
        }
    }

    /// Closes the open model at the end of the input.
    pub fn finish(&mut self) -> Option<GeneModel> {
        self.open.take()
    }
}
