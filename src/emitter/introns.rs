use crate::diagnostics::Diagnostics;
use crate::reader::{Feature, IntronKind};
use crate::rewriter_utils::sort_by_strand;

/// The coding introns of a gene model, in transcription order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodingIntrons {
    pub introns: Vec<Feature>,
    /// Number of diagnostics recorded while filtering.
    pub violations: usize,
}

/// Drops the UTR introns of a gene model and checks the order of what remains.
///
/// The strand is read from the first intron. The introns are sorted in transcription
/// order and walked once: a coding intron (`intron` or `gap`) may not follow a
/// `three_prime_UTR_intron`, and a `five_prime_UTR_intron` may not follow a coding
/// intron. Only the coding introns are returned.
///
/// When the strand is neither `+` nor `-` the introns cannot be ordered; a fatal
/// diagnostic is recorded and no intron is returned.
pub fn filter_coding_introns(
    mut introns: Vec<(IntronKind, Feature)>,
    id: &str,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> CodingIntrons {
    let Some((_, first)) = introns.first() else {
        return CodingIntrons::default();
    };
    let Some(strand) = first.strand() else {
        diagnostics.fatal(
            Some(id),
            line,
            format!("cannot order introns on strand '{}'", first.strand),
        );
        return CodingIntrons {
            introns: Vec::new(),
            violations: 1,
        };
    };

    sort_by_strand(&mut introns, Some(strand), |(_, f)| f.start);

    let before = diagnostics.len();
    let mut intron_seen = false;
    let mut three_prime_utr_intron_seen = false;
    let mut coding = Vec::with_capacity(introns.len());

    for (kind, feat) in introns {
        match kind {
            IntronKind::Intron | IntronKind::Gap => {
                if three_prime_utr_intron_seen {
                    diagnostics.violation(
                        id,
                        line,
                        format!(
                            "{} at {}-{} appears after a three_prime_UTR_intron",
                            kind.as_str(),
                            feat.start,
                            feat.end
                        ),
                    );
                }
                intron_seen = true;
                coding.push(feat);
            }
            IntronKind::FivePrimeUtr => {
                if intron_seen {
                    diagnostics.violation(
                        id,
                        line,
                        format!(
                            "five_prime_UTR_intron at {}-{} appears after a coding intron",
                            feat.start, feat.end
                        ),
                    );
                }
            }
            IntronKind::ThreePrimeUtr => three_prime_utr_intron_seen = true,
        }
    }

    CodingIntrons {
        introns: coding,
        violations: diagnostics.len() - before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intron(kind: IntronKind, start: u64, end: u64, strand: &str) -> (IntronKind, Feature) {
        let line = format!(
            "chr1\tCGD\t{}\t{}\t{}\t.\t{}\t.\tParent=g1",
            kind.as_str(),
            start,
            end,
            strand
        );
        (kind, Feature::parse_line(&line).unwrap())
    }

    #[test]
    fn test_empty() {
        let mut diags = Diagnostics::new();
        let res = filter_coding_introns(Vec::new(), "g1", 1, &mut diags);
        assert!(res.introns.is_empty());
        assert_eq!(res.violations, 0);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_utr_introns_are_dropped() {
        let mut diags = Diagnostics::new();
        let input = vec![
            intron(IntronKind::ThreePrimeUtr, 900, 950, "+"),
            intron(IntronKind::Intron, 300, 350, "+"),
            intron(IntronKind::FivePrimeUtr, 10, 50, "+"),
            intron(IntronKind::Gap, 500, 510, "+"),
        ];
        let res = filter_coding_introns(input, "g1", 1, &mut diags);
        assert_eq!(res.violations, 0);
        let starts: Vec<u64> = res.introns.iter().map(|f| f.start).collect();
        assert_eq!(starts, vec![300, 500]);
    }

    #[test]
    fn test_order_violations_follow_strand() {
        // on the minus strand the 3' UTR intron at 100 comes last, so this is clean
        let mut diags = Diagnostics::new();
        let input = vec![
            intron(IntronKind::ThreePrimeUtr, 100, 150, "-"),
            intron(IntronKind::Intron, 300, 350, "-"),
        ];
        let res = filter_coding_introns(input.clone(), "g1", 1, &mut diags);
        assert_eq!(res.violations, 0);
        assert_eq!(res.introns.len(), 1);

        // the same rows on the plus strand put the coding intron after the 3' UTR one
        let plus: Vec<(IntronKind, Feature)> = input
            .into_iter()
            .map(|(k, mut f)| {
                f.strand = String::from("+");
                (k, f)
            })
            .collect();
        let res = filter_coding_introns(plus, "g1", 1, &mut diags);
        assert_eq!(res.violations, 1);
        assert_eq!(res.introns.len(), 1);

        let input = vec![
            intron(IntronKind::Intron, 300, 350, "+"),
            intron(IntronKind::FivePrimeUtr, 400, 450, "+"),
        ];
        let res = filter_coding_introns(input, "g1", 1, &mut diags);
        assert_eq!(res.violations, 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_bad_strand() {
        let mut diags = Diagnostics::new();
        let input = vec![intron(IntronKind::Intron, 300, 350, ".")];
        let res = filter_coding_introns(input, "g1", 7, &mut diags);
        assert!(res.introns.is_empty());
        assert_eq!(res.violations, 1);
        assert_eq!(
            diags.entries()[0].severity,
            crate::diagnostics::Severity::FatalForModel
        );
        assert_eq!(diags.entries()[0].line, 7);
    }
}
