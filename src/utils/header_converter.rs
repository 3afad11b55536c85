//! Header格式转换工具
//! 将HeaderMap转换为匹配用的小写键映射，并解析Cookie

use std::collections::HashMap;
use reqwest::header::HeaderMap;
use tracing::warn;

/// 单次转换允许的最大Header条目数
const MAX_HEADER_ENTRIES: usize = 1000;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为HashMap<String, Vec<String>>，键统一小写
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (index, (key, value)) in header_map.iter().enumerate() {
            if index >= MAX_HEADER_ENTRIES {
                warn!("Header条目超过{}条，剩余部分忽略", MAX_HEADER_ENTRIES);
                break;
            }

            let key_str = key.as_str().to_lowercase();
            let value_str = String::from_utf8_lossy(value.as_bytes()).into_owned();

            map.entry(key_str).or_default().push(value_str);
        }

        map
    }

    /// 转换为单值HashMap<String, String>，取第一个非空值；全为空时保留键，值为空串
    pub fn to_single_value(hashmap: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
        hashmap
            .iter()
            .map(|(key, values)| {
                let value = values.iter().find(|v| !v.is_empty()).cloned().unwrap_or_default();
                (key.clone(), value)
            })
            .collect()
    }

    /// 从 set-cookie / cookie 头解析Cookie，名称小写，忽略 deleted 值
    pub fn parse_cookies(hashmap: &HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
        let mut cookies: HashMap<String, Vec<String>> = HashMap::new();

        for raw in hashmap.get("set-cookie").into_iter().flatten() {
            // Set-Cookie 只有第一段是键值，其余为属性
            if let Some(core_kv) = raw.split(';').next() {
                Self::push_cookie_pair(core_kv, &mut cookies);
            }
        }

        for raw in hashmap.get("cookie").into_iter().flatten() {
            for core_kv in raw.split(';') {
                Self::push_cookie_pair(core_kv, &mut cookies);
            }
        }

        cookies
    }

    fn push_cookie_pair(core_kv: &str, cookies: &mut HashMap<String, Vec<String>>) {
        let Some((name, value)) = core_kv.trim().split_once('=') else {
            return;
        };
        let (name, value) = (name.trim(), value.trim());

        if name.is_empty() || value.eq_ignore_ascii_case("deleted") {
            return;
        }

        cookies
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SERVER, SET_COOKIE};

    fn sample_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx/1.25.3"));
        headers.append(SET_COOKIE, HeaderValue::from_static("PHPSESSID=abc123; path=/; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("old_session=deleted; Max-Age=0"));
        headers.append("x-empty", HeaderValue::from_static(""));
        headers
    }

    #[test]
    fn test_to_hashmap_lowercases_keys() {
        let map = HeaderConverter::to_hashmap(&sample_headers());

        assert_eq!(map["server"], vec!["nginx/1.25.3".to_string()]);
        assert_eq!(map["set-cookie"].len(), 2);
    }

    #[test]
    fn test_to_single_value_prefers_non_empty() {
        let mut headers = sample_headers();
        headers.append("x-empty", HeaderValue::from_static("later"));
        let single = HeaderConverter::to_single_value(&HeaderConverter::to_hashmap(&headers));

        assert_eq!(single["server"], "nginx/1.25.3");
        assert_eq!(single["x-empty"], "later");
    }

    #[test]
    fn test_to_single_value_keeps_empty_header() {
        let map = HeaderConverter::to_hashmap(&sample_headers());
        let single = HeaderConverter::to_single_value(&map);

        assert_eq!(single.get("x-empty").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_cookies() {
        let mut map = HeaderConverter::to_hashmap(&sample_headers());
        map.insert("cookie".to_string(), vec!["Laravel_Session=xyz; theme=dark".to_string()]);

        let cookies = HeaderConverter::parse_cookies(&map);

        assert_eq!(cookies["phpsessid"], vec!["abc123".to_string()]);
        assert_eq!(cookies["laravel_session"], vec!["xyz".to_string()]);
        assert!(cookies.contains_key("theme"));
        assert!(!cookies.contains_key("old_session"));
        assert!(!cookies.contains_key("path"));
    }
}
