mod adapters;
mod config;
mod event;
mod log;
mod message;
mod plugins;

use std::sync::{Arc, RwLock};
use tokio::sync::Mutex as AsyncMutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = "config.toml".to_string();

    let app_config = config::load_or_init(&config_path).await?;
    let config = Arc::new(RwLock::new(app_config));
    let save_lock = Arc::new(AsyncMutex::new(()));

    plugins::do_init(config.clone(), save_lock.clone(), config_path.clone()).await?;

    let bots: Vec<_> = {
        let guard = config.read().unwrap();
        guard.bots.iter().filter(|b| b.enabled).cloned().collect()
    };

    if bots.is_empty() {
        crate::warn!(target: "System", "config.toml 中没有启用的 Bot，无事可做");
        return Ok(());
    }

    let mut handles = Vec::new();
    for bot in bots {
        match adapters::find_adapter(&bot.protocol) {
            Some(adapter) => {
                crate::info!(target: "System", "启动适配器 [{}]", adapter.protocol);
                handles.push(tokio::spawn((adapter.handler)(
                    bot,
                    config.clone(),
                    save_lock.clone(),
                    config_path.clone(),
                )));
            }
            None => crate::warn!(target: "System", "未知协议 [{}]，已跳过", bot.protocol),
        }
    }

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
