use crate::info;
use crate::plugins;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::fs;
use toml::Value;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    // Bot 连接配置
    #[serde(default = "default_bots")]
    pub bots: Vec<BotConfig>,

    // 插件配置（每个插件一张表）
    #[serde(flatten)]
    pub plugins: HashMap<String, Value>,
}

impl AppConfig {
    pub async fn save(&self, path: &str) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).await?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bots: default_bots(),
            plugins: HashMap::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotConfig {
    // 是否启用此 Bot
    #[serde(default = "default_true")]
    pub enabled: bool,

    // 协议类型 (例如 "onebot")
    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_protocol() -> String {
    "onebot".to_string()
}

fn default_bots() -> Vec<BotConfig> {
    vec![
        // 控制台适配器：本地调试用
        BotConfig {
            enabled: true,
            protocol: "console".to_string(),
            url: None,
            access_token: None,
        },
        // OneBot 适配器：生成占位配置，默认禁用以防误连
        BotConfig {
            enabled: false,
            protocol: "onebot".to_string(),
            url: Some("ws://127.0.0.1:3001".to_string()),
            access_token: Some("YOUR_TOKEN_HERE".to_string()),
        },
    ]
}

/// 读取配置文件；不存在则生成默认配置，缺失的插件表用各插件默认值补全
pub async fn load_or_init(path: &str) -> Result<AppConfig> {
    let (mut config, mut dirty) = match fs::read_to_string(path).await {
        Ok(text) => (toml::from_str::<AppConfig>(&text)?, false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(target: "System", "未找到 {}，写入默认配置", path);
            (AppConfig::default(), true)
        }
        Err(e) => return Err(e.into()),
    };

    for plugin in plugins::get_plugins() {
        if !config.plugins.contains_key(plugin.name) {
            config
                .plugins
                .insert(plugin.name.to_string(), (plugin.default_config)());
            dirty = true;
        }
    }

    if dirty {
        config.save(path).await?;
    }

    Ok(config)
}

/// 辅助函数：构建默认配置 Value，并确保包含 enabled 字段
pub fn build_config<T: Serialize>(data: T) -> Value {
    let mut val = Value::try_from(data).unwrap_or(Value::Table(Default::default()));
    if let Value::Table(ref mut map) = val
        && !map.contains_key("enabled")
    {
        map.insert("enabled".to_string(), Value::Boolean(true));
    }
    val
}
