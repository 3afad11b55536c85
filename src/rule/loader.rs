//! 规则加载管理器
//! 负责从嵌入式规则库或本地规则文件加载规则库，全程离线

use std::collections::HashMap;
use std::path::Path;
use serde::Deserialize;
use tracing::debug;

use super::model::{CategoryRule, RuleLibrary, TechRule};
use crate::config::RuleSource;
use crate::error::{WhatstackError, WhatstackResult};

/// 编译期嵌入的默认指纹库（Wappalyzer JSON格式）
static EMBEDDED_FINGERPRINTS: &str = include_str!("../../data/fingerprints.json");

/// 规则文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFileType {
    /// wappalyzer / wappalyzergo 指纹JSON
    WappalyzerJson,
    /// MessagePack编码的RuleLibrary
    Msgpack,
}

impl RuleFileType {
    /// 根据扩展名判断规则文件类型
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp") => RuleFileType::Msgpack,
            _ => RuleFileType::WappalyzerJson,
        }
    }
}

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 按规则来源加载规则库，空规则库视为加载失败
    pub async fn load(source: &RuleSource) -> WhatstackResult<RuleLibrary> {
        let rule_lib = match source {
            RuleSource::Embedded => {
                debug!("加载嵌入式规则库");
                Self::parse_wappalyzer_json(EMBEDDED_FINGERPRINTS.as_bytes())?
            }
            RuleSource::File(path) => Self::load_from_file(path).await?,
        };

        if rule_lib.tech_rules.is_empty() {
            return Err(WhatstackError::RuleLoadError(
                "fingerprint database contains no technologies".to_string(),
            ));
        }

        debug!(
            "规则库加载完成，技术规则数：{}，分类规则数：{}",
            rule_lib.tech_rules.len(),
            rule_lib.category_rules.len()
        );
        Ok(rule_lib)
    }

    /// 从本地文件加载规则库
    async fn load_from_file(path: &Path) -> WhatstackResult<RuleLibrary> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            WhatstackError::RuleLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("读取规则文件 {}，大小：{} 字节", path.display(), data.len());

        match RuleFileType::from_path(path) {
            RuleFileType::Msgpack => Self::parse_msgpack(&data),
            RuleFileType::WappalyzerJson => Self::parse_wappalyzer_json(&data),
        }
    }

    /// 解析 Wappalyzer 指纹JSON（`apps` 或 `technologies`，可选 `categories`）
    pub fn parse_wappalyzer_json(data: &[u8]) -> WhatstackResult<RuleLibrary> {
        #[derive(Debug, Deserialize)]
        struct WappalyzerFingerprints {
            #[serde(alias = "technologies")]
            apps: HashMap<String, TechRule>,
            #[serde(default)]
            categories: HashMap<String, CategoryRule>,
        }

        let fingerprints: WappalyzerFingerprints = serde_json::from_slice(data)
            .map_err(|e| WhatstackError::RuleParseError(e.to_string()))?;

        let category_rules = if fingerprints.categories.is_empty() {
            Self::get_default_categories()
        } else {
            // 分类ID以JSON键为准
            fingerprints
                .categories
                .into_iter()
                .map(|(key, mut cat)| {
                    if let Ok(id) = key.parse::<u32>() {
                        cat.id = id;
                    }
                    (key, cat)
                })
                .collect()
        };

        Ok(RuleLibrary {
            tech_rules: fingerprints.apps,
            category_rules,
        })
    }

    /// 解析msgpack格式规则
    pub fn parse_msgpack(data: &[u8]) -> WhatstackResult<RuleLibrary> {
        rmp_serde::from_slice(data).map_err(|e| WhatstackError::MsgPackError(e.to_string()))
    }

    /// 获取默认分类
    fn get_default_categories() -> HashMap<String, CategoryRule> {
        let mut categories = HashMap::new();
        let default_cats = vec![
            (1, "CMS"), (2, "Message Boards"), (3, "Database Managers"), (4, "Documentation"),
            (5, "Widgets"), (6, "Ecommerce"), (7, "Photo Galleries"), (8, "Wikis"),
            (9, "Hosting Panels"), (10, "Analytics"), (11, "Blogs"), (12, "JavaScript Frameworks"),
            (13, "Issue Trackers"), (14, "Video Players"), (15, "Comment Systems"), (16, "Security"),
            (17, "Font Scripts"), (18, "Web Frameworks"), (19, "Miscellaneous"), (20, "Editors"),
            (22, "Web Servers"), (23, "Caching"), (27, "Programming Languages"), (31, "CDN"),
            (34, "Databases"), (57, "Static Site Generator"), (59, "JavaScript Libraries"),
            (62, "PaaS"), (64, "Reverse Proxies"), (66, "UI Frameworks"),
        ];

        for (id, name) in default_cats {
            categories.insert(id.to_string(), CategoryRule {
                name: name.to_string(),
                priority: None,
                id,
            });
        }

        categories
    }
}
