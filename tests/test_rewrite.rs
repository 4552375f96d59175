use gffrewrite::{rewrite, Diagnostic, DiagnosticKind, RewriteOptions, Severity};

const HEADER: &str = "##gff-version\t3\n";

fn run(input: &str, options: &RewriteOptions) -> anyhow::Result<(Vec<String>, Vec<Diagnostic>)> {
    let mut out = Vec::new();
    let mut diags: Vec<Diagnostic> = Vec::new();
    let summary = rewrite(input.as_bytes(), &mut out, &mut diags, options)?;
    assert_eq!(summary.diagnostics, diags.len());
    let lines = String::from_utf8(out)?
        .lines()
        .map(str::to_string)
        .collect();
    Ok((lines, diags))
}

fn cols(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

/// A two-exon ORF on the given strand, with UTRs on both ends.
fn two_exon_orf(strand: &str) -> String {
    let rows = [
        "ORF\t100\t400\tID=orf19.1;Name=ACT1;orf_classification=Verified",
        "five_prime_UTR\t50\t99\tParent=orf19.1",
        "CDS\t100\t200\tParent=orf19.1;orf_classification=Verified",
        "intron\t201\t299\tParent=orf19.1;parent_feature_type=ORF",
        "CDS\t300\t400\tParent=orf19.1;orf_classification=Verified",
        "three_prime_UTR\t401\t450\tParent=orf19.1",
    ];
    rows.iter()
        .map(|r| {
            let f = cols(r);
            format!(
                "Ca22chr1A_C_albicans_SC5314\tCGD\t{}\t{}\t{}\t.\t{}\t.\t{}\n",
                f[0], f[1], f[2], strand, f[3]
            )
        })
        .collect()
}

#[test]
fn test_minimal_orf() -> anyhow::Result<()> {
    let input = "chr1\tCGD\tORF\t100\t400\t.\t+\t.\tID=g1;orf_classification=Verified\n\
                 chr1\tCGD\tCDS\t100\t400\t.\t+\t.\tParent=g1;orf_classification=Verified\n";
    let (lines, diags) = run(input, &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);

    let types: Vec<&str> = lines.iter().map(|l| cols(l)[2]).collect();
    assert_eq!(types, vec!["gene", "mRNA", "CDS"]);
    assert_eq!(cols(&lines[1])[8], "ID=g1-T;Parent=g1;orf_classification=Verified");
    assert_eq!(cols(&lines[2])[8], "ID=g1-P;Parent=g1-T;orf_classification=Verified");
    Ok(())
}

#[test]
fn test_passthrough_order_is_kept() -> anyhow::Result<()> {
    let input = format!(
        "{}# comment one\n\
         chr1\tCGD\tchromosome\t1\t5000\t.\t.\t.\tID=chr1\n\
         {}\
         # comment two\n\
         chr1\tCGD\tcentromere\t900\t1000\t.\t.\t.\tID=CEN1\n\
         ##FASTA\n\
         >chr1\n\
         ACGT\n\
         # not a comment any more\n",
        HEADER,
        two_exon_orf("+")
    );
    let (lines, diags) = run(&input, &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);

    let passthrough: Vec<&String> = lines
        .iter()
        .filter(|l| l.starts_with('#') || l.starts_with('>') || l.as_str() == "ACGT" || {
            let t = cols(l)[2];
            t == "chromosome" || t == "centromere"
        })
        .collect();
    assert_eq!(
        passthrough,
        vec![
            "##gff-version\t3",
            "# comment one",
            "chr1\tCGD\tchromosome\t1\t5000\t.\t.\t.\tID=chr1",
            "# comment two",
            "chr1\tCGD\tcentromere\t900\t1000\t.\t.\t.\tID=CEN1",
            "##FASTA",
            ">chr1",
            "ACGT",
            "# not a comment any more",
        ]
    );

    // the gene model is written as one block where it was flushed, before the trailer
    assert_eq!(lines[3], "# comment two");
    let types: Vec<&str> = lines[5..9].iter().map(|l| cols(l)[2]).collect();
    assert_eq!(types, vec!["gene", "mRNA", "CDS", "CDS"]);
    assert_eq!(lines[9], "##FASTA");
    Ok(())
}

#[test]
fn test_span_extension_and_exons() -> anyhow::Result<()> {
    let opts = RewriteOptions::new(false, true);
    for strand in ["+", "-"] {
        let (lines, diags) = run(&two_exon_orf(strand), &opts)?;
        assert!(diags.is_empty(), "{}: {:?}", strand, diags);

        let gene = cols(&lines[0]);
        assert_eq!((gene[3], gene[4]), ("50", "450"));
        let mrna = cols(&lines[1]);
        assert_eq!((mrna[3], mrna[4]), ("50", "450"));

        let exons: Vec<(String, String, String)> = lines
            .iter()
            .map(|l| cols(l))
            .filter(|c| c[2] == "exon")
            .map(|c| (c[3].to_string(), c[4].to_string(), c[8].to_string()))
            .collect();
        let expected = match strand {
            "+" => [("50", "200"), ("300", "450")],
            _ => [("300", "450"), ("50", "200")],
        };
        assert_eq!(exons.len(), 2);
        for (n, ((s, e, attrs), (xs, xe))) in exons.iter().zip(expected).enumerate() {
            assert_eq!((s.as_str(), e.as_str()), (xs, xe));
            assert_eq!(
                attrs,
                &format!("ID=orf19.1-T-E{};Parent=orf19.1-T", n + 1)
            );
        }
    }
    Ok(())
}

#[test]
fn test_collapsed_cds() -> anyhow::Result<()> {
    let (lines, diags) = run(&two_exon_orf("+"), &RewriteOptions::new(true, false))?;
    assert!(diags.is_empty(), "{:?}", diags);

    let cds: Vec<Vec<&str>> = lines
        .iter()
        .map(|l| cols(l))
        .filter(|c| c[2] == "CDS")
        .collect();
    assert_eq!(cds.len(), 1);
    assert_eq!((cds[0][3], cds[0][4]), ("100", "400"));
    assert_eq!(
        cds[0][8],
        "ID=orf19.1-P;Parent=orf19.1-T;orf_classification=Verified"
    );
    Ok(())
}

#[test]
fn test_clean_models_are_contiguous() -> anyhow::Result<()> {
    let rows = [
        ("ncRNA", 1000, 1500, "ID=nc1"),
        ("noncoding_exon", 1000, 1100, "Parent=nc1"),
        ("intron", 1101, 1199, "Parent=nc1"),
        ("noncoding_exon", 1200, 1300, "Parent=nc1"),
        ("intron", 1301, 1399, "Parent=nc1"),
        ("noncoding_exon", 1400, 1500, "Parent=nc1"),
    ];
    let input: String = rows
        .iter()
        .map(|(ty, s, e, attrs)| format!("chr1\tCGD\t{}\t{}\t{}\t.\t+\t.\t{}\n", ty, s, e, attrs))
        .collect();
    let (lines, diags) = run(&input, &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);

    // every emitted exon and intron starts right after the previous one ends
    let spans: Vec<(u64, u64)> = lines[1..]
        .iter()
        .map(|l| cols(l))
        .map(|c| -> anyhow::Result<(u64, u64)> { Ok((c[3].parse()?, c[4].parse()?)) })
        .collect::<anyhow::Result<_>>()?;
    assert_eq!(spans.len(), 5);
    for pair in spans.windows(2) {
        assert_eq!(pair[1].0, pair[0].1 + 1, "{:?}", pair);
    }
    Ok(())
}

#[test]
fn test_per_exon_cds_in_transcription_order() -> anyhow::Result<()> {
    let (lines, diags) = run(&two_exon_orf("-"), &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);

    let cds: Vec<(u64, u64)> = lines
        .iter()
        .map(|l| cols(l))
        .filter(|c| c[2] == "CDS")
        .map(|c| (c[3].parse().unwrap(), c[4].parse().unwrap()))
        .collect();
    assert_eq!(cds, vec![(300, 400), (100, 200)]);
    Ok(())
}

#[test]
fn test_empty_attribute_values_stay_valid() -> anyhow::Result<()> {
    let input = "chr1\tCGD\tORF\t100\t400\t.\t+\t.\tID=g1;Note=;orf_classification=Verified\n\
                 chr1\tCGD\tCDS\t100\t400\t.\t+\t.\tParent=g1;Note=\n";
    let (lines, diags) = run(input, &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(cols(&lines[1])[8], "ID=g1-T;Parent=g1;Note=;orf_classification=Verified");
    assert_eq!(cols(&lines[2])[8], "ID=g1-P;Parent=g1-T;Note=");
    Ok(())
}

#[test]
fn test_span_mismatch_is_reported_but_emitted() -> anyhow::Result<()> {
    let input = "chr1\tCGD\tORF\t100\t400\t.\t+\t.\tID=g1;orf_classification=Verified\n\
                 chr1\tCGD\tCDS\t150\t400\t.\t+\t.\tParent=g1;orf_classification=Verified\n";
    let (lines, diags) = run(input, &RewriteOptions::default())?;

    assert_eq!(lines.len(), 3);
    assert!(!diags.is_empty());
    assert!(diags
        .iter()
        .all(|d| d.kind == DiagnosticKind::StructuralViolation && d.severity == Severity::Warning));
    assert_eq!(diags[0].feature_id.as_deref(), Some("g1"));
    assert_eq!(diags[0].line, 1);
    Ok(())
}

#[test]
fn test_rna_models() -> anyhow::Result<()> {
    let input = "chr1\tCGD\ttRNA\t1000\t1100\t.\t-\t.\tID=tP(UGG)1;Note=tRNAscan-SE\n\
                 chr1\tCGD\tnoncoding_exon\t1000\t1030\t.\t-\t.\tParent=tP(UGG)1\n\
                 chr1\tCGD\tintron\t1031\t1060\t.\t-\t.\tParent=tP(UGG)1\n\
                 chr1\tCGD\tnoncoding_exon\t1061\t1100\t.\t-\t.\tParent=tP(UGG)1\n\
                 chr1\tCGD\tpseudogene\t2000\t2300\t.\t+\t.\tID=p1\n\
                 chr1\tCGD\tnoncoding_exon\t2000\t2300\t.\t+\t.\tParent=p1\n";
    let (lines, diags) = run(input, &RewriteOptions::default())?;
    assert!(diags.is_empty(), "{:?}", diags);

    let rows: Vec<Vec<&str>> = lines.iter().map(|l| cols(l)).collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0][8], "ID=tP(UGG)1;Note=tRNAscan-SE");
    assert_eq!((rows[1][3], rows[1][8]), ("1061", "ID=tP(UGG)1-T-E1;Parent=tP(UGG)1"));
    assert_eq!(rows[2][2], "intron");
    assert_eq!((rows[3][3], rows[3][8]), ("1000", "ID=tP(UGG)1-T-E2;Parent=tP(UGG)1"));
    // a pseudogene without CDS is written as an RNA model
    assert_eq!(rows[4][2], "pseudogene");
    assert_eq!(rows[5][8], "ID=p1-T-E1;Parent=p1");
    Ok(())
}

#[test]
fn test_problems_do_not_stop_the_run() -> anyhow::Result<()> {
    let input = format!(
        "chr1\tCGD\tCDS\t1\t9\t.\t+\t.\tParent=nobody\n\
         chr1\tCGD\tORF\t10\t90\t.\t+\t.\tID=g0;Parent=x\n\
         chr1\tCGD\tCDS\t10\t90\t.\t+\t.\tParent=g0\n\
         chr1\tCGD\tweird_type\t1\t9\t.\t+\t.\tID=w1\n\
         not a gff line\n\
         {}",
        two_exon_orf("+")
    );
    let (lines, diags) = run(&input, &RewriteOptions::default())?;

    let kinds: Vec<DiagnosticKind> = diags.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::OrphanSubfeature,
            DiagnosticKind::UnknownFeatureType,
            DiagnosticKind::MalformedRecord,
            DiagnosticKind::StructuralViolation,
        ]
    );
    assert_eq!(diags[3].severity, Severity::FatalForModel);
    assert_eq!(diags[3].line, 2);

    // the parented ORF stops after its gene row, the next model is complete
    let types: Vec<&str> = lines.iter().map(|l| cols(l)[2]).collect();
    assert_eq!(types, vec!["gene", "gene", "mRNA", "CDS", "CDS"]);
    Ok(())
}

#[test]
fn test_gzipped_input() -> anyhow::Result<()> {
    use flate2::{write::GzEncoder, Compression};
    use gffrewrite::rewriter_utils::get_line_reader_from_reader;
    use std::io::Write;

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(two_exon_orf("+").as_bytes())?;
    let gz = enc.finish()?;

    let reader = get_line_reader_from_reader(std::io::Cursor::new(gz))?;
    let mut out = Vec::new();
    let mut diags: Vec<Diagnostic> = Vec::new();
    let summary = rewrite(reader, &mut out, &mut diags, &RewriteOptions::default())?;
    assert_eq!(summary.diagnostics, 0);
    assert_eq!(summary.lines_read, 6);
    assert_eq!(summary.records_emitted, 4);
    Ok(())
}
