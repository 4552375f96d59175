use crate::rewriter_utils::DEFAULT_EXEMPT_IDS;
use std::collections::HashSet;

#[derive(Clone, Debug)]
/// Configuration options for rewriting gene models.
///
/// # Fields
///
/// * `make_single_cds`: If `true`, the CDS records of a coding model are collapsed into a
///   single CDS spanning from the first to the last coding base, introns included. All the
///   CDS records of the model must then agree on their `orf_classification`.
/// * `print_exons`: If `true`, exon records are derived for coding models by joining each
///   CDS with the UTRs that touch it.
/// * `exempt_ids`: Gene model ids that are not checked for a CDS in an intron position, nor
///   for coordinate gaps on the negative strand. The default list holds the legacy models
///   whose layout is known to break these rules.
///
/// # Examples
///
/// ```rust
/// use gffrewrite::options::RewriteOptions;
///
/// let opts = RewriteOptions::new(true, false);
/// assert!(opts.make_single_cds);
/// assert!(opts.is_exempt("CAGL0G07183g"));
///
/// let strict = RewriteOptions::new(true, false).with_exempt_ids(Vec::<String>::new());
/// assert!(!strict.is_exempt("CAGL0G07183g"));
/// ```
pub struct RewriteOptions {
    pub make_single_cds: bool,
    pub print_exons: bool,
    pub exempt_ids: HashSet<String>,
}

impl Default for RewriteOptions {
    fn default() -> RewriteOptions {
        RewriteOptions {
            make_single_cds: false,
            print_exons: false,
            exempt_ids: DEFAULT_EXEMPT_IDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RewriteOptions {
    /// Constructs a new `RewriteOptions` with the default exemption list.
    pub fn new(make_single_cds: bool, print_exons: bool) -> RewriteOptions {
        RewriteOptions {
            make_single_cds,
            print_exons,
            ..Default::default()
        }
    }

    /// Replaces the exemption list.
    pub fn with_exempt_ids<I, T>(mut self, ids: I) -> RewriteOptions
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exempt_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Adds ids to the exemption list.
    pub fn add_exempt_ids<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exempt_ids.extend(ids.into_iter().map(Into::into));
    }

    pub fn is_exempt(&self, id: &str) -> bool {
        self.exempt_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = RewriteOptions::default();
        assert!(!opts.make_single_cds);
        assert!(!opts.print_exons);
        assert!(opts.is_exempt("CAGL0G07183g"));
        assert!(!opts.is_exempt("orf19.1"));
    }

    #[test]
    fn test_exempt_ids() {
        let mut opts = RewriteOptions::new(false, true).with_exempt_ids(["a"]);
        opts.add_exempt_ids(vec![String::from("b")]);
        assert!(opts.print_exons);
        assert!(opts.is_exempt("a"));
        assert!(opts.is_exempt("b"));
        assert!(!opts.is_exempt("CAGL0G07183g"));
    }
}
