use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 输出
///
/// 默认级别为 `info`（`verbose` 时为 `debug`），可通过 `RUST_LOG` 覆盖。
/// 重复调用时保留第一次的设置。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n图像判定日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI 图像判定批处理");
    info!("🌐 API: {}", config.api_url);
    if config.compare_modes {
        info!("⚖️ 运行模式: 三种判定模式比较");
    } else {
        info!("🔎 判定模式: {}", config.judge_mode);
    }
    info!("⏱️ 图像间隔: {} ms", config.item_delay_ms);
    info!("{}", "=".repeat(60));
}

/// 记录图像加载信息
///
/// # 参数
/// - `total`: 图像总数
/// - `folder`: 图像目录
pub fn log_images_loaded(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 张待判定的图像", folder, total);
    info!("💡 按 Ctrl-C 可随时停止\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `accuracy`: 正确率文本
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, accuracy: &str, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("🎯 正确率: {}", accuracy);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_header() {
        let path = std::env::temp_dir().join(format!("aoi_header_{}.txt", std::process::id()));
        init_log_file(&path.to_string_lossy()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("图像判定日志 - "));
    }
}
