//! 结构抽取
//!
//! 纯函数：输入渲染后的 HTML，输出链接列表或案例记录，不做任何 I/O。
//! 页面布局由 `ExtractionSchema` 描述，支持新布局只需要新增规则。

pub mod extractor;
pub mod schema;

pub use extractor::StructuralExtractor;
pub use schema::{CaptureRule, ExtractionSchema, Field, FieldRule, Marker};
