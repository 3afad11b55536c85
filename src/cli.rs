//! 命令行参数定义与入口流程

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::ScanConfig;
use crate::error::WhatstackResult;
use crate::report::Report;
use crate::scanner;

/// whatstack - detect the technologies used by a website
#[derive(Parser, Debug)]
#[command(name = "whatstack", author, version, about, long_about = None)]
pub struct Args {
    /// Domain to analyze (requested as https://<domain>)
    #[arg(short = 'd', long = "domain")]
    pub domain: Option<String>,

    /// Output file to save the stack (overwritten)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Fingerprint database: wappalyzer JSON, or .mp MessagePack
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// 转换为扫描配置，缺少域名时返回输入错误
    pub fn into_config(self) -> WhatstackResult<ScanConfig> {
        ScanConfig::builder(self.domain.unwrap_or_default())
            .output(self.output)
            .rules_file(self.rules)
            .verbose(self.verbose)
            .build()
    }
}

/// 初始化日志：输出到stderr，-v 时启用debug，否则优先使用 RUST_LOG
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("whatstack=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// 执行扫描并输出到stdout
pub async fn run(config: ScanConfig) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_writer(&config, &mut out).await
}

/// 执行扫描，结果写入指定输出
pub async fn run_with_writer<W: Write>(config: &ScanConfig, out: &mut W) -> anyhow::Result<()> {
    let report = scanner::scan(config).await?;
    emit_report(&report, config.output.as_deref(), out)
}

/// 输出结果到控制台，指定了输出文件时再保存
pub fn emit_report<W: Write>(report: &Report, output: Option<&Path>, out: &mut W) -> anyhow::Result<()> {
    report.write_console(out)?;

    if let Some(path) = output {
        report.save(path).context("Error saving to file")?;
        writeln!(out, "✅ Results saved to {}", path.display())?;
    }

    out.flush()?;
    Ok(())
}
