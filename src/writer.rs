use crate::reader::Feature;
use anyhow::Context;
use std::io::Write;

/// Writes GFF3 lines to an output stream and counts them.
///
/// Passthrough lines are written byte for byte, rewritten records as their nine
/// tab-separated columns. Every line ends with a single `\n`.
pub struct GffWriter<W: Write> {
    inner: W,
    lines_written: usize,
}

impl<W: Write> GffWriter<W> {
    pub fn new(inner: W) -> GffWriter<W> {
        GffWriter {
            inner,
            lines_written: 0,
        }
    }

    /// Writes `line` unchanged, followed by a newline.
    pub fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        writeln!(self.inner, "{}", line).context("could not write to the output")?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Feature) -> anyhow::Result<()> {
        writeln!(self.inner, "{}", record).context("could not write to the output")?;
        self.lines_written += 1;
        Ok(())
    }

    /// Writes the records of one gene model, in order.
    pub fn write_block(&mut self, records: &[Feature]) -> anyhow::Result<()> {
        for r in records {
            self.write_record(r)?;
        }
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flushes the output and gives back the underlying stream.
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.inner.flush().context("could not flush the output")?;
        Ok(self.inner)
    }
}
