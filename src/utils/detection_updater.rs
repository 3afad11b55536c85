//! 检测结果更新工具
//! 负责更新检测结果（叠加置信度、保留版本）

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::compiler::CompiledRuleLibrary;

/// 推导技术的默认置信度
const IMPLIED_CONFIDENCE: u8 = 50;

/// 检测中间结果：技术名 -> (置信度, 版本)
pub type DetectedMap = HashMap<String, (u8, Option<String>)>;

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 更新检测结果：置信度累加（上限100），保留首个版本
    pub fn update(
        detected: &mut DetectedMap,
        tech_name: &str,
        confidence: Option<u8>,
        version: Option<String>,
    ) {
        let conf = confidence.unwrap_or(100);

        match detected.entry(tech_name.to_string()) {
            Entry::Occupied(mut entry) => {
                let (existing_conf, existing_version) = entry.get_mut();
                *existing_conf = existing_conf.saturating_add(conf).min(100);

                if existing_version.is_none() {
                    *existing_version = version;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((conf.min(100), version));
            }
        }
    }

    /// 应用关联推导规则（implies），逐层推导直到不再新增
    pub fn apply_implies(compiled_lib: &CompiledRuleLibrary, detected: &mut DetectedMap) {
        let mut pending: Vec<String> = detected.keys().cloned().collect();

        while let Some(tech_name) = pending.pop() {
            let Some(tech) = compiled_lib.tech_patterns.get(&tech_name) else {
                continue;
            };

            for implied in &tech.implies {
                if !detected.contains_key(implied) {
                    detected.insert(implied.clone(), (IMPLIED_CONFIDENCE, None));
                    pending.push(implied.clone());
                }
            }
        }
    }
}
