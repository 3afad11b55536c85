//! HTML标签提取器
//! 负责从HTML中提取script-src和meta标签

use std::cell::RefCell;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// HTML提取结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HtmlExtraction {
    pub script_srcs: Vec<String>,
    /// (小写name/property, content)
    pub meta_tags: Vec<(String, String)>,
}

/// 分词回调，收集script-src与meta标签
#[derive(Debug, Default)]
struct ExtractSink {
    extraction: RefCell<HtmlExtraction>,
}

impl TokenSink for ExtractSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            self_closing,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => {
                    self.extract_script_src(&attrs);
                    // 脚本内容按原始文本处理，避免JS字符串中的标签被误识别
                    if !self_closing {
                        return TokenSinkResult::RawData(RawKind::ScriptData);
                    }
                }
                "meta" => self.extract_meta_tag(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl ExtractSink {
    /// 提取script-src
    fn extract_script_src(&self, attrs: &[Attribute]) {
        if let Some(attr) = attrs.iter().find(|attr| attr.name.local.as_ref() == "src") {
            let src = attr.value.trim();
            if !src.is_empty() {
                self.extraction.borrow_mut().script_srcs.push(src.to_string());
            }
        }
    }

    /// 提取meta标签，name优先于property
    fn extract_meta_tag(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut property = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => name = Some(attr.value.to_lowercase()),
                "property" => property = Some(attr.value.to_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        if let (Some(n), Some(c)) = (name.or(property), content) {
            self.extraction.borrow_mut().meta_tags.push((n, c));
        }
    }
}

/// HTML提取器
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self
    }

    /// 从HTML字符串提取标签
    pub fn extract(&self, html: &str) -> HtmlExtraction {
        let tokenizer = Tokenizer::new(ExtractSink::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.extraction.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="Author" content="test_user">
            <meta name="generator" content="WordPress 6.0" />
            <meta property="og:site_name" content="Demo">
            <script src="/vue.global.js"></script>
        "#;

        let result = HtmlExtractor::new().extract(html);

        assert_eq!(
            result.script_srcs,
            vec!["/jquery.min.js".to_string(), "/vue.global.js".to_string()]
        );

        assert_eq!(
            result.meta_tags,
            vec![
                ("author".to_string(), "test_user".to_string()),
                ("generator".to_string(), "WordPress 6.0".to_string()),
                ("og:site_name".to_string(), "Demo".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_script_markup_is_ignored() {
        let html = r#"
            <script>var tpl = '<meta name="x" content="y"><img src="/fake.js">';</script>
            <script src="/real.js"></script>
        "#;

        let result = HtmlExtractor::new().extract(html);

        assert_eq!(result.script_srcs, vec!["/real.js".to_string()]);
        assert!(result.meta_tags.is_empty());
    }

    #[test]
    fn test_non_html_body() {
        let result = HtmlExtractor::new().extract("{\"status\": \"ok\"}");
        assert_eq!(result, HtmlExtraction::default());
    }
}
