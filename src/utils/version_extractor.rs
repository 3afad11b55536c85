//! 版本号提取
//! 模板中的 `\N` / `$N` 替换为第N个捕获分组，另支持三元模板 `\N?有值:无值`

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\$](\d+)").expect("placeholder regex is valid"));

static TERNARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\\(\d+)\?([^:]*):(.*)$").expect("ternary regex is valid"));

/// 版本提取工具
pub struct VersionExtractor;

impl VersionExtractor {
    /// 按模板从捕获结果中生成版本号
    ///
    /// 模板为空、没有任何分组提供非空值，或结果中仍残留 `\`、`$` 时返回None
    pub fn extract(version_template: &Option<String>, captures: &Captures) -> Option<String> {
        let template = version_template.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let template = Self::resolve_ternary(template, captures);

        let mut substituted = false;
        let version = PLACEHOLDER_REGEX.replace_all(&template, |placeholder: &Captures| {
            let group = placeholder[1]
                .parse::<usize>()
                .ok()
                .filter(|&index| index > 0 && index < captures.len());
            match group {
                Some(index) => {
                    let value = Self::group_value(captures, index);
                    substituted |= !value.is_empty();
                    value.to_string()
                }
                // 超出分组范围的占位符原样保留，后续判定为无效
                None => placeholder[0].to_string(),
            }
        });

        let version = version.trim();
        if !substituted || version.is_empty() || version.contains(['\\', '$']) {
            return None;
        }
        Some(version.to_string())
    }

    fn group_value<'c>(captures: &'c Captures, index: usize) -> &'c str {
        captures.get(index).map_or("", |m| m.as_str().trim())
    }

    /// 三元模板：分组有值取前一分支，否则取后一分支
    fn resolve_ternary<'a>(template: &'a str, captures: &Captures) -> Cow<'a, str> {
        let Some(parts) = TERNARY_REGEX.captures(template) else {
            return Cow::Borrowed(template);
        };

        let has_value = parts[1]
            .parse::<usize>()
            .is_ok_and(|index| !Self::group_value(captures, index).is_empty());

        let branch = if has_value { &parts[2] } else { &parts[3] };
        Cow::Owned(branch.to_string())
    }
}
