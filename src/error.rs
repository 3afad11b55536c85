//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum WhatstackError {
    // 输入相关错误
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid domain")]
    UrlError(#[from] UrlParseError),

    // 网络相关错误
    #[error("Error fetching the domain")]
    HttpError(#[source] reqwest::Error),
    #[error("Error: Received status code {0} from the server")]
    UnexpectedStatus(u16),
    #[error("Error reading response body")]
    BodyReadError(#[source] reqwest::Error),

    // 规则相关错误
    #[error("rule load failed: {0}")]
    RuleLoadError(String),
    #[error("rule parse failed: {0}")]
    RuleParseError(String),
    #[error("MessagePack decode failed: {0}")]
    MsgPackError(String),
    #[error("regex compile failed")]
    RegexCompileError(#[from] RegexError),

    // 检测相关错误
    #[error("Error initializing detector")]
    DetectorInitError(#[source] Box<WhatstackError>),

    // 基础错误
    #[error("I/O failure")]
    IoError(#[from] IoError),
}

// 全局Result类型
pub type WhatstackResult<T> = Result<T, WhatstackError>;
