//! 编译后模式模型
//! 正则编译后的结构

use std::collections::HashMap;
use regex::{Captures, Regex};

/// 编译后的正则模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub confidence: u8,
    pub version_template: Option<String>,
}

impl CompiledPattern {
    /// 匹配输入，返回捕获结果
    pub fn captures<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        self.regex.captures(input)
    }

    /// 规则描述（日志用）
    pub fn describe(&self) -> &str {
        self.regex.as_str()
    }
}

/// 技术编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledTechRule {
    pub name: String,
    pub html_patterns: Option<Vec<CompiledPattern>>,
    pub script_patterns: Option<Vec<CompiledPattern>>,
    pub meta_patterns: Option<HashMap<String, Vec<CompiledPattern>>>,
    pub header_patterns: Option<HashMap<String, Vec<CompiledPattern>>>,
    pub cookie_patterns: Option<HashMap<String, Vec<CompiledPattern>>>,
    pub category_ids: Vec<u32>,
    pub implies: Vec<String>,
}

/// 编译后的规则库
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleLibrary {
    pub tech_patterns: HashMap<String, CompiledTechRule>,
    pub category_map: HashMap<u32, String>, // 分类ID -> 分类名称
}
