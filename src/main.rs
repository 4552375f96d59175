use anyhow::Context;
use clap::Parser;
use gffrewrite::diagnostics::TracingSink;
use gffrewrite::options::RewriteOptions;
use gffrewrite::rewriter::rewrite;
use gffrewrite::rewriter_utils::get_line_reader_from_path;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Rewrite a legacy GFF file into GFF3 with gene, mRNA, CDS and exon features.
///
/// The exit status is the number of problems found (capped at 255), so 0 means the input
/// was rewritten cleanly.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input GFF file, optionally gzip compressed.
    #[arg(short, long)]
    file: PathBuf,

    /// Output file. Defaults to standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write one CDS spanning all coding exons instead of one CDS per exon.
    #[arg(long)]
    make_single_cds: bool,

    /// Derive exon features from the CDS and UTR features.
    #[arg(long)]
    print_exons: bool,

    /// Gene id whose legacy CDS layout is accepted as is. May be repeated.
    #[arg(long = "exempt-id", value_name = "ID")]
    exempt_ids: Vec<String>,

    /// Do not accept the built-in legacy layouts.
    #[arg(long)]
    no_default_exemptions: bool,

    /// Also write the log to this file.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

fn init_logging(log: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
    };

    let file_layer = match log {
        Some(p) => {
            let f = File::create(p)
                .with_context(|| format!("could not create the log file {}", p.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(f))
                    .with_ansi(false)
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_ref())?;

    let mut options = RewriteOptions::new(args.make_single_cds, args.print_exons);
    if args.no_default_exemptions {
        options = options.with_exempt_ids(Vec::<String>::new());
    }
    options.add_exempt_ids(args.exempt_ids);
    debug!("rewrite options: {:?}", options);

    let reader = get_line_reader_from_path(&args.file)?;
    let writer: Box<dyn Write> = match &args.output {
        Some(p) => {
            let f = File::create(p)
                .with_context(|| format!("could not create the output file {}", p.display()))?;
            Box::new(BufWriter::with_capacity(4194304, f))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let summary = rewrite(reader, writer, TracingSink, &options)
        .with_context(|| format!("failed to rewrite {}", args.file.display()))?;

    std::process::exit(summary.exit_code());
}
