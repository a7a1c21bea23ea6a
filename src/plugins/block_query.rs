use crate::adapters::onebot::{LockedWriter, send_msg};
use crate::config::build_config;
use crate::event::Context;
use crate::info;
use crate::plugins::{PluginError, get_config};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use toml::Value;

pub mod format;
pub mod parser;
pub mod query;

// =============================
//          Config
// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Config {
    enabled: bool,
    #[serde(default = "default_base_url")]
    api_base_url: String,
}

fn default_base_url() -> String {
    "http://110.42.14.118:21003".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enabled: true,
            api_base_url: default_base_url(),
        }
    }
}

pub fn default_config() -> Value {
    build_config(Config::default())
}

// =============================
//          Lifecycle
// =============================

pub fn init(ctx: Context) -> BoxFuture<'static, Result<(), PluginError>> {
    Box::pin(async move {
        let config: Config = get_config(&ctx, "block_query").unwrap_or_default();
        if !config.api_base_url.starts_with("http") {
            return Err(format!("api_base_url 不是合法的 HTTP 地址: {}", config.api_base_url).into());
        }
        info!(target: "Plugin/BlockQuery", "方块日志接口: {}", config.api_base_url);
        Ok(())
    })
}

// =============================
//          Main Logic
// =============================

/// 方块日志查询：匹配群消息中的固定中文语法，向日志服务发起一次查询并回复结果
pub fn handle(
    ctx: Context,
    writer: LockedWriter,
) -> BoxFuture<'static, Result<Option<Context>, PluginError>> {
    Box::pin(async move {
        let msg = match ctx.as_message() {
            Some(m) => m,
            None => return Ok(Some(ctx)),
        };

        // 仅响应群消息
        if !msg.is_group() {
            return Ok(Some(ctx));
        }

        // 语法不匹配的消息静默放行，不算错误
        let command = match parser::parse(msg.text().trim()) {
            Some(c) => c,
            None => return Ok(Some(ctx)),
        };

        let group_id = msg.group_id();
        let user_id = msg.user_id();

        let config: Config = get_config(&ctx, "block_query").unwrap_or_default();

        // 每条指令独立的连接作用域，不跨指令复用
        let transport = query::HttpTransport::new(config.api_base_url);
        let outcome = query::run(&transport, &command).await;
        let reply = format::render(&command, &outcome);

        send_msg(&ctx, writer, group_id, Some(user_id), reply).await?;
        Ok(None)
    })
}

#[cfg(test)]
mod tests {
    use super::parser;
    use super::query::{ApiResponse, QueryOutcome, Transport, TransportError, run};

    struct CannedTransport(&'static str);

    impl Transport for CannedTransport {
        async fn get(
            &self,
            _path: &'static str,
            _params: Vec<(&'static str, String)>,
        ) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse {
                status: 200,
                body: self.0.as_bytes().to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn point_query_end_to_end() {
        let command = parser::parse("查询-主世界-方块-具体-(10,64,-5)").unwrap();
        let transport = CannedTransport(
            r#"[{"time":1700000000000,"x":10,"y":64,"z":-5,"material":"stone","username":"Alice","action":1}]"#,
        );

        let outcome = run(&transport, &command).await;
        let reply = super::format::render(&command, &outcome);

        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "📋 坐标 (10,64,-5) 共1条：");
        assert!(lines[1].contains("坐标(10,64,-5)"));
        assert!(lines[1].contains("stone"));
        assert!(lines[1].contains("玩家 Alice"));
        assert!(lines[1].contains("动作: 放置"));
    }

    #[tokio::test]
    async fn empty_body_yields_not_found_message() {
        let command = parser::parse("查询-下界-方块-范围-(1,2,3),4").unwrap();
        let transport = CannedTransport("[]");

        let outcome = run(&transport, &command).await;
        assert_eq!(outcome, QueryOutcome::NotFound);
        assert_eq!(
            super::format::render(&command, &outcome),
            "未找到对应方块记录。"
        );
    }
}
