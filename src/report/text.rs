//! 纯文本兜底输出

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::RenderFault;
use crate::models::ResultSet;
use crate::report::layout::case_heading;
use crate::report::{sibling_path, ReportRenderer};

/// 记录之间的分隔线
pub const SEPARATOR_WIDTH: usize = 80;

/// 纯文本输出
pub struct PlainTextReportRenderer;

impl ReportRenderer for PlainTextReportRenderer {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn destination(&self, base: &Path) -> PathBuf {
        sibling_path(base, "", "txt")
    }

    fn render(&self, results: &ResultSet, destination: &Path) -> Result<(), RenderFault> {
        let file = File::create(destination).map_err(|e| RenderFault::io(destination, e))?;
        let mut writer = BufWriter::new(file);
        write_entries(&mut writer, results).map_err(|e| RenderFault::io(destination, e))?;
        debug!("纯文本报告已写入: {}", destination.display());
        Ok(())
    }
}

fn write_entries<W: Write>(writer: &mut W, results: &ResultSet) -> std::io::Result<()> {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    for (ordinal, entry) in results.numbered() {
        writeln!(writer, "{}", case_heading(ordinal, entry))?;
        writeln!(writer)?;
        writeln!(writer, "Headings:")?;
        for heading in entry.headings() {
            writeln!(writer, "- {}", heading)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Case Description:")?;
        writeln!(writer, "{}", entry.paragraphs().join("\n\n"))?;
        writeln!(writer)?;
        writeln!(writer, "{}", separator)?;
        writeln!(writer)?;
    }
    writer.flush()
}
