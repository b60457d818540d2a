//! 声明式抽取规则
//!
//! 每条规则是 `(字段, 定位方式, 取值方式)`，定位方式可以有多个备选，按顺序尝试。

use std::fmt;

/// 抽取的目标字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// 列表页上的链接容器
    ListingLink,
    /// 主标题
    Title,
    /// 所有二级标题
    Headings,
    /// 案例小节正文
    CaseSection,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::ListingLink => "listing_link",
            Field::Title => "title",
            Field::Headings => "headings",
            Field::CaseSection => "case_section",
        };
        f.write_str(name)
    }
}

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// 按标签名
    Tag(String),
    /// 按标签 + class
    Class { tag: String, class: String },
    /// 按标签 + 任一属性等于给定值（例如 id 或 name）
    Attr {
        tag: String,
        attrs: Vec<String>,
        value: String,
    },
    /// 按标签 + 规整后的文本完全相等（任一）
    Text { tag: String, texts: Vec<String> },
}

impl Marker {
    pub fn tag(tag: &str) -> Self {
        Marker::Tag(tag.to_string())
    }

    pub fn class(tag: &str, class: &str) -> Self {
        Marker::Class {
            tag: tag.to_string(),
            class: class.to_string(),
        }
    }

    pub fn attr(tag: &str, attrs: &[&str], value: &str) -> Self {
        Marker::Attr {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|a| a.to_string()).collect(),
            value: value.to_string(),
        }
    }

    pub fn text(tag: &str, texts: &[&str]) -> Self {
        Marker::Text {
            tag: tag.to_string(),
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// 对应的 CSS 选择器
    pub fn css(&self) -> String {
        match self {
            Marker::Tag(tag) => tag.clone(),
            Marker::Class { tag, class } => format!("{}.{}", tag, class),
            Marker::Attr { tag, attrs, value } => attrs
                .iter()
                .map(|attr| format!("{}[{}=\"{}\"]", tag, attr, value))
                .collect::<Vec<_>>()
                .join(", "),
            Marker::Text { tag, .. } => tag.clone(),
        }
    }

    /// 选择器之外还需要比较的文本
    pub fn required_texts(&self) -> Option<&[String]> {
        match self {
            Marker::Text { texts, .. } => Some(texts),
            _ => None,
        }
    }
}

/// 取值方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRule {
    /// 第一个匹配元素的文本
    FirstText,
    /// 所有匹配元素的文本，按文档顺序
    AllText,
    /// 容器内第一个 `a[href]` 的链接
    Href,
    /// 向后遍历兄弟元素，收集 `collect` 标签的文本，遇到 `stop` 标签为止
    SiblingsUntil { collect: String, stop: String },
}

/// 一条抽取规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: Field,
    pub markers: Vec<Marker>,
    pub capture: CaptureRule,
}

impl FieldRule {
    pub fn new(field: Field, markers: Vec<Marker>, capture: CaptureRule) -> Self {
        Self {
            field,
            markers,
            capture,
        }
    }
}

/// 一组页面布局规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSchema {
    pub rules: Vec<FieldRule>,
}

impl ExtractionSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// 案例库页面的默认规则
    pub fn case_studies() -> Self {
        Self::new(vec![
            FieldRule::new(
                Field::ListingLink,
                vec![Marker::class("div", "h5")],
                CaptureRule::Href,
            ),
            FieldRule::new(Field::Title, vec![Marker::tag("h1")], CaptureRule::FirstText),
            FieldRule::new(Field::Headings, vec![Marker::tag("h2")], CaptureRule::AllText),
            FieldRule::new(
                Field::CaseSection,
                vec![
                    Marker::attr("h2", &["id", "name"], "The-Case"),
                    Marker::text("h2", &["The Case", "The Cases"]),
                ],
                CaptureRule::SiblingsUntil {
                    collect: "p".to_string(),
                    stop: "h2".to_string(),
                },
            ),
        ])
    }

    pub fn rule(&self, field: Field) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self::case_studies()
    }
}
