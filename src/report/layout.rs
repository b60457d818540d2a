//! 报告排版：把一条记录拆成受行宽限制的文本行

use crate::models::CaseEntry;

/// 标题每行最多字符数（14pt 粗体下不超出页面）
pub const TITLE_WIDTH: usize = 65;
/// 标题字号
pub const TITLE_SIZE: f32 = 14.0;
/// 正文每行最多字符数
pub const BODY_WIDTH: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Label,
    Body,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new("", LineStyle::Blank)
    }
}

/// `Case {n}: {title}`
pub fn case_heading(ordinal: usize, entry: &CaseEntry) -> String {
    format!("Case {}: {}", ordinal, entry.title())
}

/// 一条记录的完整排版
pub fn layout_entry(ordinal: usize, entry: &CaseEntry) -> Vec<Line> {
    let mut lines: Vec<Line> = wrap_words(&case_heading(ordinal, entry), TITLE_WIDTH)
        .into_iter()
        .map(|l| Line::new(l, LineStyle::Title))
        .collect();

    lines.push(Line::blank());
    lines.push(Line::new("Headings:", LineStyle::Label));
    for heading in entry.headings() {
        for chunk in wrap_words(&format!("- {}", heading), BODY_WIDTH) {
            lines.push(Line::new(chunk, LineStyle::Body));
        }
    }

    lines.push(Line::blank());
    lines.push(Line::new("Case Description:", LineStyle::Label));
    for (i, paragraph) in entry.paragraphs().iter().enumerate() {
        if i > 0 {
            lines.push(Line::blank());
        }
        for chunk in chunk_text(paragraph, BODY_WIDTH) {
            lines.push(Line::new(chunk, LineStyle::Body));
        }
    }

    lines
}

/// 按单词折行，超长单词硬切
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for piece in chunk_text(word, width) {
            let needed = if current.is_empty() {
                piece.chars().count()
            } else {
                current.chars().count() + 1 + piece.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// 按固定字符数切块
pub fn chunk_text(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}
