//! 工具模块：Header转换、版本提取、检测结果更新
pub mod detection_updater;
pub mod header_converter;
pub mod version_extractor;

pub use self::detection_updater::{DetectionUpdater, DetectedMap};
pub use self::header_converter::HeaderConverter;
pub use self::version_extractor::VersionExtractor;
