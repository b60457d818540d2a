//! 结构抽取器
//!
//! 规则在构建时编译成选择器，之后对任何页面都不会报错：
//! 找不到的字段使用默认值（占位标题 / 空列表），并记录 warn 日志。

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::ExtractionError;
use crate::extraction::schema::{CaptureRule, ExtractionSchema, Field, FieldRule};
use crate::models::{ExtractionRecord, TargetLink};

/// 编译后的定位方式
#[derive(Debug)]
struct CompiledMarker {
    selector: Selector,
    texts: Option<Vec<String>>,
}

/// 编译后的规则
#[derive(Debug)]
struct CompiledRule {
    markers: Vec<CompiledMarker>,
    capture: CaptureRule,
}

/// 结构抽取器
#[derive(Debug)]
pub struct StructuralExtractor {
    origin: Url,
    link_selector: Selector,
    listing: CompiledRule,
    title: CompiledRule,
    headings: CompiledRule,
    case_section: CompiledRule,
}

impl StructuralExtractor {
    /// 编译抽取规则
    ///
    /// # 参数
    /// - `schema`: 页面布局规则
    /// - `origin`: 相对链接补全用的站点地址
    pub fn new(schema: &ExtractionSchema, origin: &str) -> Result<Self, ExtractionError> {
        let origin = Url::parse(origin).map_err(|source| ExtractionError::InvalidOrigin {
            origin: origin.to_string(),
            source,
        })?;

        Ok(Self {
            origin,
            link_selector: parse_selector("a[href]")?,
            listing: compile(schema, Field::ListingLink)?,
            title: compile(schema, Field::Title)?,
            headings: compile(schema, Field::Headings)?,
            case_section: compile(schema, Field::CaseSection)?,
        })
    }

    /// 使用默认规则
    pub fn case_studies(origin: &str) -> Result<Self, ExtractionError> {
        Self::new(&ExtractionSchema::case_studies(), origin)
    }

    /// 从列表页抽取目标链接，保持页面顺序
    ///
    /// 没有匹配时返回空列表，由调用方决定是否算失败。
    pub fn extract_listing(&self, markup: &str) -> Vec<TargetLink> {
        let document = Html::parse_document(markup);
        let mut links = Vec::new();

        for container in select_marked(&document, &self.listing) {
            let href = match self.listing.capture {
                CaptureRule::Href => container
                    .select(&self.link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href")),
                _ => container.value().attr("href"),
            };

            let Some(href) = href.map(str::trim).filter(|h| !h.is_empty()) else {
                debug!("链接容器中没有 href，跳过");
                continue;
            };

            match self.resolve(href) {
                Some(url) => links.push(TargetLink::new(url)),
                None => warn!("无法解析链接: {}", href),
            }
        }

        links
    }

    /// 从目标页面抽取案例记录
    ///
    /// # 参数
    /// - `markup`: 渲染后的 HTML
    /// - `ordinal`: 目标序号（从 1 开始），用于占位标题和日志
    pub fn extract_record(&self, markup: &str, ordinal: usize) -> ExtractionRecord {
        let document = Html::parse_document(markup);

        // 只看第一个匹配元素，文本为空同样视为缺失
        let primary_title = self
            .capture(&document, &self.title)
            .and_then(|values| values.into_iter().next())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                warn!("[案例 {}] ⚠️ 未找到标题，使用占位标题", ordinal);
                ExtractionRecord::unknown_title(ordinal)
            });

        let section_headings = self
            .capture(&document, &self.headings)
            .unwrap_or_default();

        let section_paragraphs = match self.capture(&document, &self.case_section) {
            Some(paragraphs) => paragraphs,
            None => {
                warn!("[案例 {}] ⚠️ 未找到 'The Case' 小节", ordinal);
                Vec::new()
            }
        };

        ExtractionRecord {
            primary_title,
            section_headings,
            section_paragraphs,
        }
    }

    /// 按规则的取值方式读取内容，一个元素都没匹配到时返回 `None`
    fn capture(&self, document: &Html, rule: &CompiledRule) -> Option<Vec<String>> {
        let found = select_marked(document, rule);
        let first = found.first()?;
        let values = match &rule.capture {
            CaptureRule::FirstText => vec![element_text(first)],
            CaptureRule::AllText => found.iter().map(element_text).collect(),
            CaptureRule::Href => found
                .iter()
                .filter_map(|el| el.select(&self.link_selector).next())
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.trim().to_string())
                .collect(),
            CaptureRule::SiblingsUntil { collect, stop } => collect_siblings(first, collect, stop),
        };
        Some(values)
    }

    /// 相对链接补全为绝对地址
    fn resolve(&self, href: &str) -> Option<String> {
        match Url::parse(href) {
            Ok(url) => Some(url.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.origin.join(href).ok().map(|u| u.to_string())
            }
            Err(_) => None,
        }
    }
}

/// 按备选顺序定位：第一个有结果的定位方式生效
fn select_marked<'a>(document: &'a Html, rule: &CompiledRule) -> Vec<ElementRef<'a>> {
    for marker in &rule.markers {
        let found: Vec<ElementRef<'a>> = document
            .select(&marker.selector)
            .filter(|el| match &marker.texts {
                Some(texts) => {
                    let text = element_text(el);
                    texts.iter().any(|t| *t == text)
                }
                None => true,
            })
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn collect_siblings(marker: &ElementRef<'_>, collect: &str, stop: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    for sibling in marker.next_siblings().filter_map(ElementRef::wrap) {
        let name = sibling.value().name();
        if name == stop {
            break;
        }
        if name == collect {
            paragraphs.push(element_text(&sibling));
        }
    }
    paragraphs
}

/// 元素文本：去掉首尾空白，内部连续空白合并为一个空格
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn compile(schema: &ExtractionSchema, field: Field) -> Result<CompiledRule, ExtractionError> {
    let rule: &FieldRule = schema.rule(field).ok_or_else(|| ExtractionError::MissingRule {
        field: field.to_string(),
    })?;

    let markers = rule
        .markers
        .iter()
        .map(|marker| {
            Ok(CompiledMarker {
                selector: parse_selector(&marker.css())?,
                texts: marker.required_texts().map(|t| t.to_vec()),
            })
        })
        .collect::<Result<Vec<_>, ExtractionError>>()?;

    Ok(CompiledRule {
        markers,
        capture: rule.capture.clone(),
    })
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::schema::Marker;

    fn extractor() -> StructuralExtractor {
        StructuralExtractor::case_studies("https://x.test").unwrap()
    }

    #[test]
    fn test_listing_resolves_relative_links() {
        let markup = r#"
            <html><body>
                <div class="h5"><a href="/a">A</a></div>
                <div class="other"><a href="/skip">skip</a></div>
                <div class="h5"><a href="/b">B</a></div>
            </body></html>
        "#;
        let links = extractor().extract_listing(markup);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/a", "https://x.test/b"]);
    }

    #[test]
    fn test_listing_keeps_absolute_links_and_skips_empty_containers() {
        let markup = r#"
            <div class="h5"><a href="https://other.test/c">C</a></div>
            <div class="h5"><span>no link</span></div>
            <div class="h5 featured"><a href="cases/d">D</a></div>
        "#;
        let links = extractor().extract_listing(markup);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://other.test/c", "https://x.test/cases/d"]
        );
    }

    #[test]
    fn test_listing_without_containers_is_empty() {
        assert!(extractor().extract_listing("<p>nothing</p>").is_empty());
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let record = extractor().extract_record("<h2>Background</h2><p>x</p>", 7);
        assert_eq!(record.primary_title, "Unknown Title 7");
        assert_eq!(record.section_headings, vec!["Background"]);
        assert!(record.section_paragraphs.is_empty());
    }

    #[test]
    fn test_case_section_stops_at_next_heading() {
        let markup = r#"
            <article>
                <h1>  Wrong-Site   Surgery </h1>
                <h2>Background</h2>
                <p>ignored</p>
                <h2 id="The-Case">The Case</h2>
                <p>one</p>
                <div>not a paragraph</div>
                <p>two</p>
                <p>three</p>
                <h2>Commentary</h2>
                <p>four</p>
                <p>five</p>
            </article>
        "#;
        let record = extractor().extract_record(markup, 1);
        assert_eq!(record.primary_title, "Wrong-Site Surgery");
        assert_eq!(
            record.section_headings,
            vec!["Background", "The Case", "Commentary"]
        );
        assert_eq!(record.section_paragraphs, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_case_section_found_by_text_when_marker_missing() {
        let markup = r#"
            <h1>T</h1>
            <h2>The Cases</h2>
            <p>alpha <b>beta</b></p>
        "#;
        let record = extractor().extract_record(markup, 1);
        assert_eq!(record.section_paragraphs, vec!["alpha beta"]);
    }

    #[test]
    fn test_empty_first_title_is_not_skipped() {
        let markup = "<h1>   </h1><h1>Second Heading</h1><h2 id=\"The-Case\">The Case</h2><p>x</p>";
        let record = extractor().extract_record(markup, 3);
        assert_eq!(record.primary_title, "Unknown Title 3");
        assert_eq!(record.section_paragraphs, vec!["x"]);
    }

    #[test]
    fn test_capture_rule_is_honoured_for_record_fields() {
        let mut schema = ExtractionSchema::case_studies();
        for rule in &mut schema.rules {
            match rule.field {
                Field::Headings => rule.capture = CaptureRule::FirstText,
                Field::CaseSection => rule.capture = CaptureRule::AllText,
                _ => {}
            }
        }
        let extractor = StructuralExtractor::new(&schema, "https://x.test").unwrap();
        let markup = r#"
            <h1>T</h1>
            <h2>Background</h2>
            <h2 id="The-Case">The Case</h2>
            <p>not collected</p>
        "#;
        let record = extractor.extract_record(markup, 1);
        assert_eq!(record.section_headings, vec!["Background"]);
        assert_eq!(record.section_paragraphs, vec!["The Case"]);
    }

    #[test]
    fn test_case_section_found_by_name_attribute() {
        let markup = r#"<h2 name="The-Case">Case</h2><p>a</p><p>b</p>"#;
        let record = extractor().extract_record(markup, 2);
        assert_eq!(record.section_paragraphs, vec!["a", "b"]);
    }

    #[test]
    fn test_custom_schema_layout() {
        let schema = ExtractionSchema::new(vec![
            FieldRule::new(
                Field::ListingLink,
                vec![Marker::class("li", "item")],
                CaptureRule::Href,
            ),
            FieldRule::new(Field::Title, vec![Marker::tag("h3")], CaptureRule::FirstText),
            FieldRule::new(Field::Headings, vec![Marker::tag("h4")], CaptureRule::AllText),
            FieldRule::new(
                Field::CaseSection,
                vec![Marker::attr("h4", &["id"], "summary")],
                CaptureRule::SiblingsUntil {
                    collect: "p".to_string(),
                    stop: "h4".to_string(),
                },
            ),
        ]);
        let extractor = StructuralExtractor::new(&schema, "https://y.test").unwrap();

        let links = extractor.extract_listing(r#"<li class="item"><a href="/z">z</a></li>"#);
        assert_eq!(links, vec![TargetLink::new("https://y.test/z")]);

        let record = extractor.extract_record(
            r#"<h3>Title</h3><h4 id="summary">S</h4><p>p1</p><h4>Next</h4><p>p2</p>"#,
            1,
        );
        assert_eq!(record.primary_title, "Title");
        assert_eq!(record.section_paragraphs, vec!["p1"]);
    }

    #[test]
    fn test_missing_rule_is_rejected() {
        let schema = ExtractionSchema::new(vec![]);
        let err = StructuralExtractor::new(&schema, "https://x.test").unwrap_err();
        assert!(matches!(err, ExtractionError::MissingRule { .. }));
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(StructuralExtractor::case_studies("not a url").is_err());
    }
}
