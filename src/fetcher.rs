//! 页面抓取：对 https://<domain> 发起一次GET请求
//! 客户端使用默认设置（无超时、无重试、默认跟随重定向）

use reqwest::header::{HeaderMap, SERVER};
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{WhatstackError, WhatstackResult};

const USER_AGENT: &str = concat!("whatstack/", env!("CARGO_PKG_VERSION"));

/// 抓取到的页面（仅状态码为200时产生）
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// 重定向后的最终地址
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Server头，缺失或为空时返回None
    pub fn server(&self) -> Option<String> {
        let value = self.headers.get(SERVER)?;
        let server = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
        if server.is_empty() {
            None
        } else {
            Some(server)
        }
    }
}

/// 页面抓取器
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// 创建默认客户端
    pub fn new() -> WhatstackResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(WhatstackError::HttpError)?;
        Ok(Self { client })
    }

    /// 使用外部构建的客户端
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// 由域名构建请求地址 https://<domain>
    pub fn target_url(domain: &str) -> WhatstackResult<Url> {
        let url = Url::parse(&format!("https://{}", domain))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(WhatstackError::InvalidInput(format!("invalid domain: {}", domain)));
        }
        Ok(url)
    }

    /// 发起GET请求：先校验状态码，再读取完整响应体
    pub async fn fetch(&self, url: &Url) -> WhatstackResult<FetchedPage> {
        debug!("请求 {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(WhatstackError::HttpError)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WhatstackError::UnexpectedStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(WhatstackError::BodyReadError)?;

        debug!(
            "响应完成：{} 状态码{}，Header{}条，响应体{}字节",
            final_url,
            status,
            headers.len(),
            body.len()
        );

        Ok(FetchedPage {
            url: final_url,
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use super::Fetcher;

    /// 启动只应答一次的本地HTTP服务，返回其地址
    pub(crate) async fn serve_once(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            // 读完请求头再应答
            while read < buf.len() {
                let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    /// 测试用抓取器，绕过系统代理
    pub(crate) fn local_fetcher() -> Fetcher {
        Fetcher::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{local_fetcher, serve_once};
    use super::*;

    #[test]
    fn test_target_url() {
        let url = Fetcher::target_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_target_url_rejects_invalid_domain() {
        assert!(Fetcher::target_url("exa mple.com").is_err());
        assert!(Fetcher::target_url("").is_err());
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nServer: ECS (dcb/7F84)\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>",
        )
        .await;

        let page = local_fetcher().fetch(&url).await.unwrap();

        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.server().as_deref(), Some("ECS (dcb/7F84)"));
        assert_eq!(page.body, b"<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;

        let err = local_fetcher().fetch(&url).await.unwrap_err();

        assert!(matches!(err, WhatstackError::UnexpectedStatus(404)));
        assert_eq!(err.to_string(), "Error: Received status code 404 from the server");
    }

    #[tokio::test]
    async fn test_fetch_truncated_body_is_error() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort").await;

        let err = local_fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, WhatstackError::BodyReadError(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let err = local_fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, WhatstackError::HttpError(_)));
    }

    #[test]
    fn test_empty_server_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, reqwest::header::HeaderValue::from_static("  "));
        let page = FetchedPage {
            url: Url::parse("https://example.com/").unwrap(),
            status: StatusCode::OK,
            headers,
            body: Vec::new(),
        };

        assert_eq!(page.server(), None);
    }
}
