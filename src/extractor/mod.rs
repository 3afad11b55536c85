//! 提取模块：从响应体中提取指纹匹配所需的标签数据
pub mod html_extractor;

pub use self::html_extractor::{HtmlExtractor, HtmlExtraction};
