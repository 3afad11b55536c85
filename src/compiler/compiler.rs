//! 规则编译器核心
//! 仅负责将原始规则编译为可执行的正则模式

use std::collections::HashMap;
use std::time::Instant;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule};
use crate::error::WhatstackResult;
use crate::rule::{RuleLibrary, TechRule};

/// Wappalyzer 模式字段分隔符（`正则\;version:\1\;confidence:50`）
const FIELD_SEPARATOR: &str = "\\;";
const DEFAULT_CONFIDENCE: u8 = 100;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则库
    pub fn compile(rule_lib: &RuleLibrary) -> CompiledRuleLibrary {
        let start = Instant::now();
        let mut compiled_tech_rules = HashMap::new();
        let mut category_map = HashMap::new();

        // 1. 构建分类映射（ID -> 名称）
        for cat_rule in rule_lib.category_rules.values() {
            category_map.insert(cat_rule.id, cat_rule.name.clone());
        }

        // 2. 编译每个技术规则
        let mut compile_stats = CompileStats::default();
        for (tech_name, tech_rule) in &rule_lib.tech_rules {
            let compiled_tech = Self::compile_tech_rule(tech_name, tech_rule, &mut compile_stats);
            compiled_tech_rules.insert(tech_name.clone(), compiled_tech);
        }

        // 3. 输出编译统计
        debug!("规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "编译统计：HTML模式{}条、Script模式{}条、Header模式{}条、Cookie模式{}条、Meta模式{}条、跳过{}条",
            compile_stats.html_count,
            compile_stats.script_count,
            compile_stats.header_count,
            compile_stats.cookie_count,
            compile_stats.meta_count,
            compile_stats.skipped_count
        );

        CompiledRuleLibrary {
            tech_patterns: compiled_tech_rules,
            category_map,
        }
    }

    /// 编译单个技术规则
    fn compile_tech_rule(
        tech_name: &str,
        tech_rule: &TechRule,
        stats: &mut CompileStats,
    ) -> CompiledTechRule {
        let html_patterns = Self::compile_pattern_list(tech_name, tech_rule.html.as_ref(), stats, PatternKind::Html);
        let script_patterns = Self::compile_script_patterns(tech_name, tech_rule, stats);
        let meta_patterns = Self::compile_keyed_patterns(tech_name, tech_rule.meta.as_ref(), stats, PatternKind::Meta);
        let header_patterns = Self::compile_keyed_patterns(tech_name, tech_rule.headers.as_ref(), stats, PatternKind::Header);
        let cookie_patterns = Self::compile_keyed_patterns(tech_name, tech_rule.cookies.as_ref(), stats, PatternKind::Cookie);

        CompiledTechRule {
            name: tech_name.to_string(),
            html_patterns,
            script_patterns,
            meta_patterns,
            header_patterns,
            cookie_patterns,
            category_ids: tech_rule.category_ids.clone(),
            implies: tech_rule.implies.as_ref().map(Self::parse_implies).unwrap_or_default(),
        }
    }

    /// 编译列表型模式（html/script），无法编译的单条模式跳过
    fn compile_pattern_list(
        tech_name: &str,
        value: Option<&Value>,
        stats: &mut CompileStats,
        kind: PatternKind,
    ) -> Option<Vec<CompiledPattern>> {
        let raw_patterns: Vec<&str> = match value? {
            Value::String(s) => vec![s.as_str()],
            Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
            other => {
                warn!("技术{}的{:?}规则类型不支持：{}", tech_name, kind, other);
                return None;
            }
        };

        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            match Self::compile_single_pattern(raw) {
                Ok(pattern) => {
                    patterns.push(pattern);
                    stats.record(kind);
                }
                Err(e) => {
                    warn!("技术{}的{:?}模式编译失败，已跳过：{} ({})", tech_name, kind, raw, e);
                    stats.skipped_count += 1;
                }
            }
        }

        if patterns.is_empty() {
            None
        } else {
            Some(patterns)
        }
    }

    /// 编译Script模式（合并scripts和scriptSrc，均匹配script-src）
    fn compile_script_patterns(
        tech_name: &str,
        tech_rule: &TechRule,
        stats: &mut CompileStats,
    ) -> Option<Vec<CompiledPattern>> {
        let mut patterns = Vec::new();

        for value in [tech_rule.scripts.as_ref(), tech_rule.script_src.as_ref()] {
            if let Some(mut compiled) = Self::compile_pattern_list(tech_name, value, stats, PatternKind::Script) {
                patterns.append(&mut compiled);
            }
        }

        if patterns.is_empty() {
            None
        } else {
            Some(patterns)
        }
    }

    /// 编译键值对型模式（meta/header/cookie），键统一小写
    fn compile_keyed_patterns(
        tech_name: &str,
        value: Option<&HashMap<String, Value>>,
        stats: &mut CompileStats,
        kind: PatternKind,
    ) -> Option<HashMap<String, Vec<CompiledPattern>>> {
        let mut keyed_patterns = HashMap::new();
        for (key, val) in value? {
            if let Some(patterns) = Self::compile_pattern_list(tech_name, Some(val), stats, kind) {
                keyed_patterns.insert(key.to_lowercase(), patterns);
            }
        }

        if keyed_patterns.is_empty() {
            None
        } else {
            Some(keyed_patterns)
        }
    }

    /// 编译单个模式：拆分版本/置信度字段，清理不兼容语法后按忽略大小写编译
    pub fn compile_single_pattern(raw_pattern: &str) -> WhatstackResult<CompiledPattern> {
        static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\(\?(?:=|!|<=|<!)[^()]*\)").expect("look-around regex is valid")
        });

        let mut fields = raw_pattern.split(FIELD_SEPARATOR);
        let regex_part = fields.next().unwrap_or_default();

        let mut version_template = None;
        let mut confidence = DEFAULT_CONFIDENCE;
        for field in fields {
            if let Some(template) = field.strip_prefix("version:") {
                version_template = Some(template.to_string());
            } else if let Some(conf) = field.strip_prefix("confidence:") {
                confidence = conf.trim().parse::<u8>().unwrap_or(DEFAULT_CONFIDENCE).min(100);
            }
        }

        // 移除PCRE分隔符
        let mut cleaned = regex_part;
        if cleaned.len() >= 2 && cleaned.starts_with('/') && cleaned.ends_with('/') {
            cleaned = &cleaned[1..cleaned.len() - 1];
        }

        // 移除环视语法（regex crate不支持）
        let cleaned = LOOK_AROUND_REGEX.replace_all(cleaned, "");

        let regex = Regex::new(&format!("(?i){}", cleaned))?;

        Ok(CompiledPattern {
            regex,
            confidence,
            version_template,
        })
    }

    /// 解析implies规则，去掉 `\;confidence:` 等附加字段
    fn parse_implies(implies: &Value) -> Vec<String> {
        let raw: Vec<&str> = match implies {
            Value::String(s) => s.split(',').collect(),
            Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        raw.into_iter()
            .filter_map(|item| item.split(FIELD_SEPARATOR).next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    Html,
    Script,
    Header,
    Cookie,
    Meta,
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    html_count: usize,
    script_count: usize,
    header_count: usize,
    cookie_count: usize,
    meta_count: usize,
    skipped_count: usize,
}

impl CompileStats {
    fn record(&mut self, kind: PatternKind) {
        match kind {
            PatternKind::Html => self.html_count += 1,
            PatternKind::Script => self.script_count += 1,
            PatternKind::Header => self.header_count += 1,
            PatternKind::Cookie => self.cookie_count += 1,
            PatternKind::Meta => self.meta_count += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_pattern_with_version_and_confidence() {
        let pattern = RuleCompiler::compile_single_pattern(r"nginx(?:/([\d.]+))?\;version:\1\;confidence:75").unwrap();

        assert_eq!(pattern.confidence, 75);
        assert_eq!(pattern.version_template.as_deref(), Some(r"\1"));
        assert!(pattern.regex.is_match("NGINX/1.25.3"));
    }

    #[test]
    fn test_compile_pattern_strips_delimiters_and_lookaround() {
        let pattern = RuleCompiler::compile_single_pattern(r"/jquery(?!-migrate)[.-]min\.js/").unwrap();

        assert_eq!(pattern.confidence, 100);
        assert!(pattern.regex.is_match("/static/jquery.min.js"));
    }

    #[test]
    fn test_compile_invalid_pattern_fails() {
        assert!(RuleCompiler::compile_single_pattern(r"([unclosed").is_err());
    }

    #[test]
    fn test_compile_library_skips_bad_patterns() {
        let mut rule_lib = RuleLibrary::default();
        let rule: TechRule = serde_json::from_value(json!({
            "cats": [22],
            "headers": { "Server": "^Caddy" },
            "html": ["([broken", "<!-- caddy -->"],
            "implies": ["Go\\;confidence:50", " "]
        }))
        .unwrap();
        rule_lib.tech_rules.insert("Caddy".to_string(), rule);

        let compiled = RuleCompiler::compile(&rule_lib);
        let caddy = &compiled.tech_patterns["Caddy"];

        assert_eq!(caddy.html_patterns.as_ref().unwrap().len(), 1);
        assert!(caddy.header_patterns.as_ref().unwrap().contains_key("server"));
        assert_eq!(caddy.implies, vec!["Go".to_string()]);
        assert!(caddy.script_patterns.is_none());
    }

    #[test]
    fn test_parse_implies_comma_string() {
        let implies = RuleCompiler::parse_implies(&json!("PHP, MySQL"));
        assert_eq!(implies, vec!["PHP".to_string(), "MySQL".to_string()]);
    }
}
