//! 检测分析器：负责Header/Cookie/HTML/Script/Meta等维度的匹配
use std::collections::HashMap;
use tracing::debug;

use crate::compiler::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule};
use crate::utils::{DetectedMap, DetectionUpdater, VersionExtractor};

/// 所有分析器的通用抽象
/// 泛型约束：P-规则集类型，D-数据源类型（均允许动态大小类型）
pub trait Analyzer<P: ?Sized, D: ?Sized> {
    /// 分析器类型名称，用于日志输出
    const TYPE_NAME: &'static str;

    /// 从编译后的技术规则中获取当前分析器对应的规则集
    fn get_patterns(tech: &CompiledTechRule) -> Option<&P>;

    /// 单个技术的匹配逻辑
    fn match_logic(tech_name: &str, patterns: &P, data: &D, detected: &mut DetectedMap);

    /// 通用分析骨架：遍历技术 → 规则判空 → 调用匹配逻辑
    fn analyze(compiled_lib: &CompiledRuleLibrary, data: &D, detected: &mut DetectedMap)
    where
        Self: Sized,
    {
        for tech in compiled_lib.tech_patterns.values() {
            let Some(patterns) = Self::get_patterns(tech) else {
                continue;
            };
            Self::match_logic(&tech.name, patterns, data, detected);
        }
    }
}

/// 匹配成功通用处理：日志输出 + 检测结果更新
fn handle_match_success(
    analyzer_type: &str,
    tech_name: &str,
    target_key: &str,
    pattern: &CompiledPattern,
    version: Option<String>,
    detected: &mut DetectedMap,
) {
    debug!(
        "[{}]匹配成功 | 技术: {} | 匹配项: {} | 版本: {:?} | 规则: {}",
        analyzer_type, tech_name, target_key, version, pattern.describe()
    );
    DetectionUpdater::update(detected, tech_name, Some(pattern.confidence), version);
}

/// 在单个值上依次尝试模式，命中第一条即返回
fn match_first(
    analyzer_type: &str,
    tech_name: &str,
    target_key: &str,
    patterns: &[CompiledPattern],
    value: &str,
    detected: &mut DetectedMap,
) -> bool {
    for pattern in patterns {
        if let Some(captures) = pattern.captures(value) {
            let version = VersionExtractor::extract(&pattern.version_template, &captures);
            handle_match_success(analyzer_type, tech_name, target_key, pattern, version, detected);
            return true;
        }
    }
    false
}

/// Header分析器
pub struct HeaderAnalyzer;

impl Analyzer<HashMap<String, Vec<CompiledPattern>>, HashMap<String, String>> for HeaderAnalyzer {
    const TYPE_NAME: &'static str = "Header";

    fn get_patterns(tech: &CompiledTechRule) -> Option<&HashMap<String, Vec<CompiledPattern>>> {
        tech.header_patterns.as_ref()
    }

    fn match_logic(
        tech_name: &str,
        header_patterns: &HashMap<String, Vec<CompiledPattern>>,
        headers: &HashMap<String, String>,
        detected: &mut DetectedMap,
    ) {
        for (header_name, patterns) in header_patterns {
            let Some(header_value) = headers.get(header_name) else {
                continue;
            };
            match_first(Self::TYPE_NAME, tech_name, header_name, patterns, header_value, detected);
        }
    }
}

/// Cookie分析器
pub struct CookieAnalyzer;

impl Analyzer<HashMap<String, Vec<CompiledPattern>>, HashMap<String, Vec<String>>> for CookieAnalyzer {
    const TYPE_NAME: &'static str = "Cookie";

    fn get_patterns(tech: &CompiledTechRule) -> Option<&HashMap<String, Vec<CompiledPattern>>> {
        tech.cookie_patterns.as_ref()
    }

    fn match_logic(
        tech_name: &str,
        cookie_patterns: &HashMap<String, Vec<CompiledPattern>>,
        cookies: &HashMap<String, Vec<String>>,
        detected: &mut DetectedMap,
    ) {
        for (cookie_name, patterns) in cookie_patterns {
            let Some(values) = cookies.get(cookie_name) else {
                continue;
            };
            for value in values {
                if match_first(Self::TYPE_NAME, tech_name, cookie_name, patterns, value, detected) {
                    break;
                }
            }
        }
    }
}

/// HTML分析器
pub struct HtmlAnalyzer;

impl Analyzer<[CompiledPattern], str> for HtmlAnalyzer {
    const TYPE_NAME: &'static str = "HTML";

    fn get_patterns(tech: &CompiledTechRule) -> Option<&[CompiledPattern]> {
        tech.html_patterns.as_deref()
    }

    fn match_logic(tech_name: &str, patterns: &[CompiledPattern], html: &str, detected: &mut DetectedMap) {
        // 每条命中的模式都累加置信度
        for pattern in patterns {
            if let Some(captures) = pattern.captures(html) {
                let version = VersionExtractor::extract(&pattern.version_template, &captures);
                handle_match_success(Self::TYPE_NAME, tech_name, "body", pattern, version, detected);
            }
        }
    }
}

/// Script分析器（script-src）
pub struct ScriptAnalyzer;

impl Analyzer<[CompiledPattern], [String]> for ScriptAnalyzer {
    const TYPE_NAME: &'static str = "Script";

    fn get_patterns(tech: &CompiledTechRule) -> Option<&[CompiledPattern]> {
        tech.script_patterns.as_deref()
    }

    fn match_logic(tech_name: &str, patterns: &[CompiledPattern], script_srcs: &[String], detected: &mut DetectedMap) {
        for src in script_srcs {
            match_first(Self::TYPE_NAME, tech_name, src, patterns, src, detected);
        }
    }
}

/// Meta分析器
pub struct MetaAnalyzer;

impl Analyzer<HashMap<String, Vec<CompiledPattern>>, [(String, String)]> for MetaAnalyzer {
    const TYPE_NAME: &'static str = "Meta";

    fn get_patterns(tech: &CompiledTechRule) -> Option<&HashMap<String, Vec<CompiledPattern>>> {
        tech.meta_patterns.as_ref()
    }

    fn match_logic(
        tech_name: &str,
        meta_patterns: &HashMap<String, Vec<CompiledPattern>>,
        meta_tags: &[(String, String)],
        detected: &mut DetectedMap,
    ) {
        for (meta_name, content) in meta_tags {
            let Some(patterns) = meta_patterns.get(meta_name) else {
                continue;
            };
            match_first(Self::TYPE_NAME, tech_name, meta_name, patterns, content, detected);
        }
    }
}
