//! PDF 输出（printpdf 内置字体）

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::error::RenderFault;
use crate::models::ResultSet;
use crate::report::layout::{
    case_heading, layout_entry, wrap_words, Line, LineStyle, TITLE_SIZE, TITLE_WIDTH,
};
use crate::report::{sibling_path, ReportRenderer};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const LAYER_NAME: &str = "Layer 1";
const DOCUMENT_TITLE: &str = "Case Studies";

/// 每页可写的行数：(PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT，向下取整
const LINES_PER_PAGE: usize = 44;

/// 完整版：每条记录一页，内容超出时续页
pub struct PdfReportRenderer;

impl ReportRenderer for PdfReportRenderer {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn destination(&self, base: &Path) -> PathBuf {
        sibling_path(base, "", "pdf")
    }

    fn render(&self, results: &ResultSet, destination: &Path) -> Result<(), RenderFault> {
        let (doc, page, layer) =
            PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        let regular = builtin_font(&doc, BuiltinFont::Helvetica)?;
        let bold = builtin_font(&doc, BuiltinFont::HelveticaBold)?;

        let mut cursor = PageCursor::new(doc.get_page(page).get_layer(layer));
        for (index, lines) in paginate_entries(results).iter().enumerate() {
            if index > 0 {
                cursor.new_page(&doc);
            }
            for line in lines {
                match line.style {
                    LineStyle::Title => cursor.write(&line.text, TITLE_SIZE, &bold),
                    LineStyle::Label => cursor.write(&line.text, 12.0, &bold),
                    LineStyle::Body => cursor.write(&line.text, 10.0, &regular),
                    LineStyle::Blank => cursor.skip(),
                }
            }
        }

        save(doc, destination)
    }
}

/// 简化版：只有一种字体，只列序号和标题
pub struct SimplePdfReportRenderer;

impl ReportRenderer for SimplePdfReportRenderer {
    fn name(&self) -> &'static str {
        "simplified_pdf"
    }

    fn destination(&self, base: &Path) -> PathBuf {
        sibling_path(base, "_simplified", "pdf")
    }

    fn render(&self, results: &ResultSet, destination: &Path) -> Result<(), RenderFault> {
        let (doc, page, layer) =
            PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        let font = builtin_font(&doc, BuiltinFont::Helvetica)?;

        let lines: Vec<String> = results
            .numbered()
            .flat_map(|(ordinal, entry)| wrap_words(&case_heading(ordinal, entry), TITLE_WIDTH))
            .collect();

        let mut cursor = PageCursor::new(doc.get_page(page).get_layer(layer));
        for (index, chunk) in lines.chunks(LINES_PER_PAGE).enumerate() {
            if index > 0 {
                cursor.new_page(&doc);
            }
            for line in chunk {
                cursor.write(line, 11.0, &font);
            }
        }

        save(doc, destination)
    }
}

/// 按页拆分：每条记录从新页开始，超过一页的部分续页，不会产生空白页
fn paginate_entries(results: &ResultSet) -> Vec<Vec<Line>> {
    if results.is_empty() {
        return vec![vec![Line {
            text: "No case studies were extracted.".to_string(),
            style: LineStyle::Label,
        }]];
    }

    let mut pages = Vec::new();
    for (ordinal, entry) in results.numbered() {
        let lines = layout_entry(ordinal, entry);
        pages.extend(lines.chunks(LINES_PER_PAGE).map(<[Line]>::to_vec));
    }
    pages
}

/// 当前页和写入位置
struct PageCursor {
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor {
    fn new(layer: PdfLayerReference) -> Self {
        Self {
            layer,
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn write(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(to_latin1(text), size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT;
    }

    fn skip(&mut self) {
        self.y -= LINE_HEIGHT;
    }

    fn new_page(&mut self, doc: &PdfDocumentReference) {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.layer = doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }
}

fn builtin_font(
    doc: &PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, RenderFault> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderFault::Pdf(e.to_string()))
}

fn save(doc: PdfDocumentReference, destination: &Path) -> Result<(), RenderFault> {
    let file = File::create(destination).map_err(|e| RenderFault::io(destination, e))?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| RenderFault::Pdf(e.to_string()))
}

/// 内置字体只支持 Latin-1，其它字符替换为 '?'
fn to_latin1(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if (c as u32) <= 0xFF { c } else { '?' })
        .collect()
}
