use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 給人看的單行格式
    #[default]
    Compact,
    /// 給部署環境的日誌收集器
    Json,
}

/// `RUST_LOG` 優先；否則只開本 crate 的 info (verbose 時 debug)
fn env_filter(verbose: bool) -> EnvFilter {
    let default_directives = if verbose {
        "autohaus_data=debug,info"
    } else {
        "autohaus_data=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// 日誌一律寫到 stderr，stdout 留給指令輸出；重複初始化只提示不中斷
pub fn init(format: LogFormat, verbose: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let result = match format {
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("⚠️ Logger already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init(LogFormat::Json, false);
        init(LogFormat::Compact, true);
        tracing::info!("still logging");
    }
}
