use anyhow::Context;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::trace;

/// Type alias for a line source that can read from a `dyn BufRead`. It is used to
/// allow reading from either a compressed or an uncompressed GFF file.
pub type LineReader = Box<dyn BufRead>;

/// Number of tab-separated columns in a feature row.
pub const GFFFIELDS: usize = 9;

/// Marker line that starts the trailing sequence section of a GFF3 file.
pub const FASTA_DIRECTIVE: &str = "##FASTA";

pub(crate) const COMMENT_PREFIX: char = '#';

/// Value of the score, strand and phase columns when they carry no information.
pub const UNKNOWN_FIELD: &str = ".";

// Commonly-used attribute keys.
pub const ID_KEY: &str = "ID";
pub const PARENT_KEY: &str = "Parent";
pub const ORF_CLASSIFICATION_KEY: &str = "orf_classification";
pub const PARENT_FEATURE_TYPE_KEY: &str = "parent_feature_type";

// Feature types written by the emitters.
pub const GENE_STR: &str = "gene";
pub const PSEUDOGENE_STR: &str = "pseudogene";
pub const MRNA_STR: &str = "mRNA";
pub const CDS_STR: &str = "CDS";
pub const EXON_STR: &str = "exon";

// Suffixes that build the transcript, protein and exon ids from the gene id.
pub const TRANSCRIPT_SUFFIX: &str = "-T";
pub const PROTEIN_SUFFIX: &str = "-P";
pub const EXON_SUFFIX: &str = "-E";

/// Substring of the attribute column that marks tRNAscan predictions. Such records
/// are always rewritten as RNA models, whatever their feature type.
pub const TRNASCAN_MARKER: &str = "tRNAscan";

/// Classification assigned to every uORF CDS.
pub const UORF_CLASSIFICATION: &str = "Uncharacterized";

/// Legacy feature ids whose CDS/intron layout is known to break the ordering rules.
/// They are kept exempt until a curator reviews them.
pub const DEFAULT_EXEMPT_IDS: [&str; 1] = ["CAGL0G07183g"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid strand '{0}', expected '+' or '-'")]
pub struct InvalidStrand(pub String);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// The strand of a stranded feature.
///
/// Legacy rows occasionally carry `.` or `?` in the strand column. Those values are
/// kept verbatim in the record, and simply do not parse into a [Strand].
pub enum Strand {
    Positive,
    Negative,
}

impl std::str::FromStr for Strand {
    type Err = InvalidStrand;

    fn from_str(s: &str) -> Result<Strand, InvalidStrand> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => Err(InvalidStrand(s.to_string())),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

/// Sorts `items` by start coordinate in transcription order: ascending on the
/// positive strand, descending on the negative strand. Unstranded input is sorted
/// ascending. The sort is stable, so records that share a start keep their input
/// order in both directions.
pub fn sort_by_strand<T, F>(items: &mut [T], strand: Option<Strand>, start: F)
where
    F: Fn(&T) -> u64,
{
    match strand {
        Some(Strand::Negative) => items.sort_by(|a, b| start(b).cmp(&start(a))),
        _ => items.sort_by_key(|a| start(a)),
    }
}

/// Peeks at the first two bytes of `reader` and reports whether they are the gzip magic
/// number. Nothing is consumed, but `reader` must still be at the start of its stream for
/// the answer to mean anything.
///
/// An empty or one-byte stream is not gzipped. Errors from filling the buffer are
/// returned as they are.
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    if src.get(..2) == Some(&GZIP_MAGIC_NUMBER) {
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Creates a [LineReader] from the provided path. This function will automatically
/// determine if the provided path points to a gzip compressed or an uncompressed GFF
/// file, and will return the appropriate reader accordingly.
///
/// It returns [Ok]`(`[LineReader]`)` on success and an [anyhow::Error] on failure.
pub fn get_line_reader_from_path<T: AsRef<Path>>(p: T) -> anyhow::Result<LineReader> {
    let file = File::open(p.as_ref())
        .with_context(|| format!("Could not open the input file {:?}", p.as_ref()))?;
    get_line_reader_from_reader(file)
}

/// Creates a [LineReader] from the provided reader, decompressing on the fly when the
/// stream starts with the gzip magic bytes.
///
/// **Note** : It is intended that this function *take ownership* of the underlying reader, which
/// is the reason behind the `'static` lifetime bound.
pub fn get_line_reader_from_reader(r: impl Read + 'static) -> anyhow::Result<LineReader> {
    let mut inner_rdr = BufReader::new(r);
    if is_gzipped(&mut inner_rdr)? {
        trace!("auto-detected gzipped GFF file - reading via decompression");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr))))
    } else {
        Ok(Box::new(inner_rdr))
    }
}
