use crate::reader::attributes::Attributes;
use crate::rewriter_utils::{Strand, GFFFIELDS};
use thiserror::Error;

/// The reasons a feature row cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("wrong number of fields: {0}, expected 9")]
    WrongFieldCount(usize),
    #[error("invalid {field} coordinate '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
}

/// Feature types that anchor a gene model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TopLevelKind {
    Orf,
    TRna,
    Pseudogene,
    UOrf,
    NcRna,
    RRna,
    SnoRna,
    SnRna,
    RepeatRegion,
}

impl TopLevelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopLevelKind::Orf => "ORF",
            TopLevelKind::TRna => "tRNA",
            TopLevelKind::Pseudogene => "pseudogene",
            TopLevelKind::UOrf => "uORF",
            TopLevelKind::NcRna => "ncRNA",
            TopLevelKind::RRna => "rRNA",
            TopLevelKind::SnoRna => "snoRNA",
            TopLevelKind::SnRna => "snRNA",
            TopLevelKind::RepeatRegion => "repeat_region",
        }
    }
}

/// Members of the intron family. Only `Intron` and `Gap` interrupt the coding
/// sequence; the UTR variants are dropped by the intron filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntronKind {
    Intron,
    Gap,
    FivePrimeUtr,
    ThreePrimeUtr,
}

impl IntronKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntronKind::Intron => "intron",
            IntronKind::Gap => "gap",
            IntronKind::FivePrimeUtr => "five_prime_UTR_intron",
            IntronKind::ThreePrimeUtr => "three_prime_UTR_intron",
        }
    }

    pub fn is_coding(&self) -> bool {
        matches!(self, IntronKind::Intron | IntronKind::Gap)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UtrKind {
    FivePrime,
    ThreePrime,
}

/// Feature types that belong to the currently open gene model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubfeatureKind {
    Cds,
    Intron(IntronKind),
    Utr(UtrKind),
    NoncodingExon,
}

impl SubfeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubfeatureKind::Cds => "CDS",
            SubfeatureKind::Intron(k) => k.as_str(),
            SubfeatureKind::Utr(UtrKind::FivePrime) => "five_prime_UTR",
            SubfeatureKind::Utr(UtrKind::ThreePrime) => "three_prime_UTR",
            SubfeatureKind::NoncodingExon => "noncoding_exon",
        }
    }
}

/// The role of a row in the rewrite, decided once from its type column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    TopLevel(TopLevelKind),
    Subfeature(SubfeatureKind),
    Passthrough,
    Unknown,
}

impl FeatureClass {
    /// Classifies a feature type string. Matching is case sensitive, as in the
    /// legacy files.
    pub fn classify(ty: &str) -> FeatureClass {
        use FeatureClass::*;
        match ty {
            "ORF" => TopLevel(TopLevelKind::Orf),
            "tRNA" => TopLevel(TopLevelKind::TRna),
            "pseudogene" => TopLevel(TopLevelKind::Pseudogene),
            "uORF" => TopLevel(TopLevelKind::UOrf),
            "ncRNA" => TopLevel(TopLevelKind::NcRna),
            "rRNA" => TopLevel(TopLevelKind::RRna),
            "snoRNA" => TopLevel(TopLevelKind::SnoRna),
            "snRNA" => TopLevel(TopLevelKind::SnRna),
            "repeat_region" => TopLevel(TopLevelKind::RepeatRegion),

            "CDS" => Subfeature(SubfeatureKind::Cds),
            "intron" => Subfeature(SubfeatureKind::Intron(IntronKind::Intron)),
            "gap" => Subfeature(SubfeatureKind::Intron(IntronKind::Gap)),
            "five_prime_UTR_intron" => Subfeature(SubfeatureKind::Intron(IntronKind::FivePrimeUtr)),
            "three_prime_UTR_intron" => {
                Subfeature(SubfeatureKind::Intron(IntronKind::ThreePrimeUtr))
            }
            "five_prime_UTR" => Subfeature(SubfeatureKind::Utr(UtrKind::FivePrime)),
            "three_prime_UTR" => Subfeature(SubfeatureKind::Utr(UtrKind::ThreePrime)),
            "noncoding_exon" => Subfeature(SubfeatureKind::NoncodingExon),

            "chromosome"
            | "contig"
            | "long_terminal_repeat"
            | "blocked_reading_frame"
            | "centromere"
            | "retrotransposon"
            | "LTR" => Passthrough,

            _ => Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One feature row: the nine GFF columns, with the attribute column parsed.
///
/// Coordinates are 1-based and inclusive, and are kept exactly as given; a row with
/// `start > end` is not reordered. The score, strand and phase columns are kept as
/// text because legacy rows use `.` freely in all three.
pub struct Feature {
    pub seqid: String,
    pub source: String,
    pub ty: String,
    pub start: u64,
    pub end: u64,
    pub score: String,
    pub strand: String,
    pub phase: String,
    pub attributes: Attributes,
}

impl Feature {
    /// Parses one tab-delimited line. The line must not contain its newline.
    pub fn parse_line(line: &str) -> Result<Feature, ParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != GFFFIELDS {
            return Err(ParseError::WrongFieldCount(fields.len()));
        }

        let coord = |field: &'static str, value: &str| {
            value
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidCoordinate {
                    field,
                    value: value.to_string(),
                })
        };

        Ok(Feature {
            seqid: fields[0].to_string(),
            source: fields[1].to_string(),
            ty: fields[2].to_string(),
            start: coord("start", fields[3])?,
            end: coord("end", fields[4])?,
            score: fields[5].to_string(),
            strand: fields[6].to_string(),
            phase: fields[7].to_string(),
            attributes: Attributes::parse(fields[8]),
        })
    }

    /// Creates a new feature on the same sequence, source and strand as `self`,
    /// copying its score and phase.
    pub fn derive(&self, ty: &str, start: u64, end: u64, attributes: Attributes) -> Feature {
        Feature {
            seqid: self.seqid.clone(),
            source: self.source.clone(),
            ty: ty.to_string(),
            start,
            end,
            score: self.score.clone(),
            strand: self.strand.clone(),
            phase: self.phase.clone(),
            attributes,
        }
    }

    pub fn class(&self) -> FeatureClass {
        FeatureClass::classify(&self.ty)
    }

    /// The parsed strand, or `None` when the strand column is not `+` or `-`.
    pub fn strand(&self) -> Option<Strand> {
        self.strand.parse().ok()
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.id()
    }
}

impl std::fmt::Display for Feature {
    /// Writes the feature as a tab-delimited GFF row, without a trailing newline.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqid,
            self.source,
            self.ty,
            self.start,
            self.end,
            self.score,
            self.strand,
            self.phase,
            self.attributes
        )
    }
}
