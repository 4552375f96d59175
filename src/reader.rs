// Parsing of legacy feature rows. Every row is split into the nine GFF columns and
// classified exactly once:
// - top-level types (ORF, pseudogene, the RNA types, repeat_region) anchor a gene model;
// - subfeature types (CDS, the intron family, UTRs, noncoding_exon) are buffered under
//   the open gene model;
// - passthrough types (chromosome, contig, LTR, ...) are copied to the output verbatim;
// - everything else is reported and dropped.
pub mod attributes;
pub mod record;
pub use attributes::Attributes;
pub use record::{
    Feature, FeatureClass, IntronKind, ParseError, SubfeatureKind, TopLevelKind, UtrKind,
};
