//! 扫描流程：抓取 → 初始化检测器 → 指纹识别 → 生成结果

use std::future::Future;

use tracing::debug;
use url::Url;

use crate::config::ScanConfig;
use crate::detector::{Fingerprint, TechDetector};
use crate::error::{WhatstackError, WhatstackResult};
use crate::fetcher::Fetcher;
use crate::report::Report;

/// 按配置扫描目标域名
pub async fn scan(config: &ScanConfig) -> WhatstackResult<Report> {
    let url = Fetcher::target_url(&config.domain)?;
    let fetcher = Fetcher::new()?;
    scan_url(&fetcher, &url, || TechDetector::new(&config.rule_source)).await
}

/// 扫描指定地址；检测器在页面抓取成功后才初始化，抓取失败时不会调用
pub async fn scan_url<D, F, Fut>(fetcher: &Fetcher, url: &Url, init_detector: F) -> WhatstackResult<Report>
where
    D: Fingerprint,
    F: FnOnce() -> Fut,
    Fut: Future<Output = WhatstackResult<D>>,
{
    let page = fetcher.fetch(url).await?;

    let detector = init_detector()
        .await
        .map_err(|e| WhatstackError::DetectorInitError(Box::new(e)))?;

    let technologies = detector.fingerprint(&page.headers, &page.body);
    debug!("{} 识别结果：{:?}", page.url, technologies);

    Ok(Report::new(technologies, page.server()))
}
