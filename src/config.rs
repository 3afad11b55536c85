//! 扫描配置，由CLI参数构建后显式传入驱动流程

use std::path::PathBuf;

use crate::error::{WhatstackError, WhatstackResult};

/// 指纹规则来源
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RuleSource {
    /// 编译期嵌入的规则库
    #[default]
    Embedded,
    /// 本地规则文件（`.mp` 为MessagePack，其余按Wappalyzer JSON解析）
    File(PathBuf),
}

/// 单次扫描配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    // 目标域名，请求地址为 https://<domain>
    pub domain: String,
    // 结果输出文件（覆盖写）
    pub output: Option<PathBuf>,
    // 规则来源
    pub rule_source: RuleSource,
    // 是否启用详细日志
    pub verbose: bool,
}

impl ScanConfig {
    /// 以域名开始构建配置
    pub fn builder(domain: impl Into<String>) -> ScanConfigBuilder {
        ScanConfigBuilder::new(domain)
    }
}

/// 配置构建器
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    domain: String,
    output: Option<PathBuf>,
    rule_source: RuleSource,
    verbose: bool,
}

impl ScanConfigBuilder {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            output: None,
            rule_source: RuleSource::default(),
            verbose: false,
        }
    }

    /// 空路径视为未设置
    pub fn output(mut self, path: Option<PathBuf>) -> Self {
        self.output = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn rules_file(mut self, path: Option<PathBuf>) -> Self {
        self.rule_source = match path.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => RuleSource::File(p),
            None => RuleSource::Embedded,
        };
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 校验并生成配置，域名为空时返回输入错误
    pub fn build(self) -> WhatstackResult<ScanConfig> {
        let domain = self.domain.trim().to_string();
        if domain.is_empty() {
            return Err(WhatstackError::InvalidInput(
                "Please provide a domain using the -d flag.".to_string(),
            ));
        }

        Ok(ScanConfig {
            domain,
            output: self.output,
            rule_source: self.rule_source,
            verbose: self.verbose,
        })
    }
}
