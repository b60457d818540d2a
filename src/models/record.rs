//! 抽取结果的数据模型
//!
//! `ResultSet` 与发现的链接列表按下标一一对应，只追加不回滚。

use serde::Serialize;

/// 列表页上发现的一个目标文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetLink {
    pub url: String,
}

impl TargetLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// 从一个目标页面抽取出的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    pub primary_title: String,
    pub section_headings: Vec<String>,
    /// 找不到案例小节时为空，而不是缺失
    pub section_paragraphs: Vec<String>,
}

impl ExtractionRecord {
    /// 缺少标题时使用的占位标题
    pub fn unknown_title(ordinal: usize) -> String {
        format!("Unknown Title {}", ordinal)
    }
}

/// 处理失败的目标用它占住原来的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPlaceholder {
    pub primary_title: String,
    pub error: String,
}

impl ErrorPlaceholder {
    pub fn new(ordinal: usize, error: impl Into<String>) -> Self {
        Self {
            primary_title: format!("Error processing link {}", ordinal),
            error: error.into(),
        }
    }
}

/// 结果集中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseEntry {
    Extracted(ExtractionRecord),
    Failed(ErrorPlaceholder),
}

impl CaseEntry {
    pub fn title(&self) -> &str {
        match self {
            CaseEntry::Extracted(record) => &record.primary_title,
            CaseEntry::Failed(placeholder) => &placeholder.primary_title,
        }
    }

    pub fn headings(&self) -> &[String] {
        match self {
            CaseEntry::Extracted(record) => &record.section_headings,
            CaseEntry::Failed(_) => &[],
        }
    }

    /// 占位记录的正文就是错误描述
    pub fn paragraphs(&self) -> &[String] {
        match self {
            CaseEntry::Extracted(record) => &record.section_paragraphs,
            CaseEntry::Failed(placeholder) => std::slice::from_ref(&placeholder.error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CaseEntry::Failed(_))
    }
}

/// 按发现顺序排列的结果集
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    entries: Vec<CaseEntry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push_record(&mut self, record: ExtractionRecord) {
        self.entries.push(CaseEntry::Extracted(record));
    }

    pub fn push_placeholder(&mut self, placeholder: ErrorPlaceholder) {
        self.entries.push(CaseEntry::Failed(placeholder));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CaseEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaseEntry> {
        self.entries.iter()
    }

    /// 序号（从 1 开始）与记录
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &CaseEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failed()).count()
    }

    pub fn extracted_count(&self) -> usize {
        self.len() - self.failed_count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a CaseEntry;
    type IntoIter = std::slice::Iter<'a, CaseEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_title_carries_ordinal() {
        let placeholder = ErrorPlaceholder::new(3, "timeout");
        assert_eq!(placeholder.primary_title, "Error processing link 3");

        let entry = CaseEntry::Failed(placeholder);
        assert!(entry.headings().is_empty());
        assert_eq!(entry.paragraphs(), ["timeout".to_string()]);
    }

    #[test]
    fn test_result_set_counts_and_order() {
        let mut results = ResultSet::new();
        results.push_record(ExtractionRecord {
            primary_title: "First".to_string(),
            section_headings: vec![],
            section_paragraphs: vec![],
        });
        results.push_placeholder(ErrorPlaceholder::new(2, "boom"));

        assert_eq!(results.len(), 2);
        assert_eq!(results.extracted_count(), 1);
        assert_eq!(results.failed_count(), 1);
        let titles: Vec<_> = results.numbered().map(|(n, e)| (n, e.title())).collect();
        assert_eq!(titles, vec![(1, "First"), (2, "Error processing link 2")]);
    }
}
