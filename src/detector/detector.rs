//! 检测器核心：整合各类分析器，输出检测结果
use std::collections::BTreeSet;

use reqwest::header::HeaderMap;
use tracing::debug;

use super::analyzer::{
    Analyzer, CookieAnalyzer, HeaderAnalyzer, HtmlAnalyzer, MetaAnalyzer, ScriptAnalyzer,
};
use crate::compiler::{CompiledRuleLibrary, RuleCompiler};
use crate::config::RuleSource;
use crate::error::WhatstackResult;
use crate::extractor::HtmlExtractor;
use crate::rule::{RuleLibrary, RuleLoader, Technology};
use crate::utils::{DetectedMap, DetectionUpdater, HeaderConverter};

/// 指纹识别接口：根据已获取的响应头与响应体返回技术名称集合，不发起网络请求
pub trait Fingerprint {
    fn fingerprint(&self, headers: &HeaderMap, body: &[u8]) -> BTreeSet<String>;
}

/// 技术检测器
#[derive(Debug, Clone)]
pub struct TechDetector {
    compiled_lib: CompiledRuleLibrary,
}

impl TechDetector {
    /// 加载规则库并编译，规则库无法加载时返回错误
    pub async fn new(source: &RuleSource) -> WhatstackResult<Self> {
        let rule_lib = RuleLoader::load(source).await?;
        Ok(Self::from_rule_library(&rule_lib))
    }

    /// 从已加载的规则库创建检测器
    pub fn from_rule_library(rule_lib: &RuleLibrary) -> Self {
        Self {
            compiled_lib: RuleCompiler::compile(rule_lib),
        }
    }

    /// 已编译的技术数量
    pub fn tech_count(&self) -> usize {
        self.compiled_lib.tech_patterns.len()
    }

    /// 核心检测接口（HeaderMap + Body），结果按名称排序
    pub fn detect(&self, headers: &HeaderMap, body: &[u8]) -> Vec<Technology> {
        // 1. 转换Header格式并解析Cookie
        let header_hashmap = HeaderConverter::to_hashmap(headers);
        let single_header_map = HeaderConverter::to_single_value(&header_hashmap);
        let cookies = HeaderConverter::parse_cookies(&header_hashmap);

        // 2. 提取HTML内容和标签
        let html = String::from_utf8_lossy(body);
        let extraction = HtmlExtractor::new().extract(&html);

        // 3. 执行各类分析
        let mut detected = DetectedMap::new();
        <HeaderAnalyzer as Analyzer<_, _>>::analyze(&self.compiled_lib, &single_header_map, &mut detected);
        <CookieAnalyzer as Analyzer<_, _>>::analyze(&self.compiled_lib, &cookies, &mut detected);
        <HtmlAnalyzer as Analyzer<_, _>>::analyze(&self.compiled_lib, html.as_ref(), &mut detected);
        <ScriptAnalyzer as Analyzer<_, _>>::analyze(&self.compiled_lib, extraction.script_srcs.as_slice(), &mut detected);
        <MetaAnalyzer as Analyzer<_, _>>::analyze(&self.compiled_lib, extraction.meta_tags.as_slice(), &mut detected);

        // 4. 应用关联推导规则
        DetectionUpdater::apply_implies(&self.compiled_lib, &mut detected);

        // 5. 转换为最终结果
        let mut technologies: Vec<Technology> = detected
            .into_iter()
            .map(|(name, (confidence, version))| {
                // 推导出的技术可能不在规则库中，此时无分类
                let categories = self
                    .compiled_lib
                    .tech_patterns
                    .get(&name)
                    .map(|tech| {
                        tech.category_ids
                            .iter()
                            .filter_map(|cat_id| self.compiled_lib.category_map.get(cat_id).cloned())
                            .collect()
                    })
                    .unwrap_or_default();

                Technology {
                    name,
                    confidence,
                    version,
                    categories,
                }
            })
            .collect();
        technologies.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("检测完成，共识别{}项技术", technologies.len());
        technologies
    }
}

impl Fingerprint for TechDetector {
    fn fingerprint(&self, headers: &HeaderMap, body: &[u8]) -> BTreeSet<String> {
        self.detect(headers, body)
            .iter()
            .map(Technology::to_string)
            .collect()
    }
}
