//! 结果输出：控制台展示与纯文本文件保存

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::WhatstackResult;

/// 未识别到任何技术时的提示
pub const NO_TECHNOLOGIES_MESSAGE: &str = "No technologies detected.";

/// 单次扫描结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub technologies: BTreeSet<String>,
    pub server: Option<String>,
}

impl Report {
    /// 空的Server值视为缺失
    pub fn new(technologies: BTreeSet<String>, server: Option<String>) -> Self {
        Self {
            technologies,
            server: server.filter(|s| !s.trim().is_empty()),
        }
    }

    /// 控制台格式
    pub fn write_console<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n🔍 Technologies detected:")?;
        if self.technologies.is_empty() {
            writeln!(out, "{}", NO_TECHNOLOGIES_MESSAGE)?;
        } else {
            for tech in &self.technologies {
                writeln!(out, "- {}", tech)?;
            }
        }

        if let Some(server) = &self.server {
            writeln!(out, "🖥️  Server: {}", server)?;
        }
        Ok(())
    }

    /// 文件格式：每行一个技术名，最后是可选的Server行
    pub fn write_plain<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for tech in &self.technologies {
            writeln!(out, "{}", tech)?;
        }
        if let Some(server) = &self.server {
            writeln!(out, "Server: {}", server)?;
        }
        Ok(())
    }

    /// 保存到文件，已存在的文件会被覆盖
    pub fn save(&self, path: &Path) -> WhatstackResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_plain(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn techs(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn console(report: &Report) -> String {
        let mut out = Vec::new();
        report.write_console(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_console_lists_each_technology_once() {
        let report = Report::new(techs(&["Nginx:1.25.3", "PHP", "WordPress:6.4.2"]), Some("nginx".to_string()));

        assert_eq!(
            console(&report),
            "\n🔍 Technologies detected:\n- Nginx:1.25.3\n- PHP\n- WordPress:6.4.2\n🖥️  Server: nginx\n"
        );
    }

    #[test]
    fn test_console_empty_set() {
        let report = Report::new(BTreeSet::new(), Some("ECS".to_string()));
        let output = console(&report);

        assert!(output.contains(NO_TECHNOLOGIES_MESSAGE));
        assert!(output.contains("🖥️  Server: ECS"));
        assert!(!output.contains("- "));
    }

    #[test]
    fn test_empty_server_is_omitted() {
        let report = Report::new(techs(&["PHP"]), Some("   ".to_string()));
        assert_eq!(report.server, None);
        assert!(!console(&report).contains("Server"));

        let mut plain = Vec::new();
        report.write_plain(&mut plain).unwrap();
        assert_eq!(plain, b"PHP\n");
    }

    #[test]
    fn test_save_overwrites_file() {
        let path = std::env::temp_dir().join(format!("whatstack-report-{}.txt", std::process::id()));

        Report::new(techs(&["Nginx", "PHP", "WordPress"]), Some("nginx".to_string()))
            .save(&path)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Nginx\nPHP\nWordPress\nServer: nginx\n");

        Report::new(BTreeSet::new(), Some("ECS".to_string())).save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Server: ECS\n");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join(format!("whatstack-missing-{}", std::process::id()))
            .join("out.txt");

        assert!(Report::default().save(&path).is_err());
    }
}
