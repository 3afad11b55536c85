//! whatstack - 网站技术栈识别工具

// 导出全局错误类型
pub use self::error::{WhatstackError, WhatstackResult};

// 导出配置模块
pub use self::config::{RuleSource, ScanConfig, ScanConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{CategoryRule, RuleFileType, RuleLibrary, RuleLoader, TechRule, Technology};

// 导出提取模块核心接口
pub use self::extractor::{HtmlExtraction, HtmlExtractor};

// 导出工具模块核心接口
pub use self::utils::{DetectionUpdater, HeaderConverter, VersionExtractor};

// 导出编译模块核心接口
pub use self::compiler::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, RuleCompiler};

// 导出检测模块核心接口
pub use self::detector::{Fingerprint, TechDetector};

// 导出抓取与输出
pub use self::fetcher::{FetchedPage, Fetcher};
pub use self::report::Report;
pub use self::scanner::{scan, scan_url};

// 声明所有子模块
pub mod cli;
pub mod compiler;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod report;
pub mod rule;
pub mod scanner;
pub mod utils;
