use super::parser::{Mode, ParsedCommand};
use crate::error;
use serde::Deserialize;
use std::future::Future;

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// 日志服务返回的一条方块记录，顺序照单全收，不在本地重排
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockRecord {
    /// 毫秒级时间戳
    pub time: i64,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub material: String,
    pub username: String,
    /// 0=破坏 1=放置 2=使用，其余原样透传
    pub action: i64,
}

/// 一次查询的结果分类，调用方和测试按种类断言，不解析文案
#[derive(Debug, PartialEq)]
pub enum QueryOutcome {
    /// 范围查询缺半径（解析归一化后不应出现，防御性保留）
    MissingRadius,
    /// 上游返回非 200
    UpstreamError(u16),
    /// 查询成功但没有记录
    NotFound,
    Records(Vec<BlockRecord>),
    /// 网络或解码失败，详情已写入日志
    InternalFailure,
}

pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// 查询传输层。生产实现走 HTTP，测试注入假实现。
pub trait Transport {
    fn get(
        &self,
        path: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// 真实 HTTP 传输：每次调用新建客户端，不跨指令保留连接池
pub struct HttpTransport {
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = reqwest::Client::new()
            .get(&url)
            .query(&params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }
}

/// 把解析后的指令翻译为一次日志服务查询
pub async fn run<T: Transport>(transport: &T, command: &ParsedCommand) -> QueryOutcome {
    let world = command.world.wire_id().to_string();

    let (path, params): (&'static str, Vec<(&'static str, String)>) = match command.mode {
        Mode::Point => (
            "/query-blocks",
            vec![
                ("x", command.x.to_string()),
                ("y", command.y.to_string()),
                ("z", command.z.to_string()),
                ("world", world),
            ],
        ),
        Mode::Range => {
            let radius = match command.radius {
                Some(r) => r,
                None => return QueryOutcome::MissingRadius,
            };
            (
                "/query-range-blocks",
                vec![
                    ("x", command.x.to_string()),
                    ("y", command.y.to_string()),
                    ("z", command.z.to_string()),
                    ("radius", radius.to_string()),
                    ("world", world),
                ],
            )
        }
    };

    let response = match transport.get(path, params).await {
        Ok(r) => r,
        Err(e) => {
            error!(target: "Plugin/BlockQuery", "查询请求失败: {}", e);
            return QueryOutcome::InternalFailure;
        }
    };

    if response.status != 200 {
        return QueryOutcome::UpstreamError(response.status);
    }

    // null 与空数组都视为没有记录
    let mut body = response.body;
    let records: Option<Vec<BlockRecord>> = match simd_json::from_slice(&mut body) {
        Ok(v) => v,
        Err(e) => {
            error!(target: "Plugin/BlockQuery", "响应解析失败: {}", e);
            return QueryOutcome::InternalFailure;
        }
    };

    match records {
        Some(list) if !list.is_empty() => QueryOutcome::Records(list),
        _ => QueryOutcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::block_query::parser::parse;
    use std::sync::Mutex;

    /// 记录被请求的路径与参数，返回预设应答
    struct FakeTransport {
        status: u16,
        body: &'static str,
        calls: Mutex<Vec<(&'static str, Vec<(&'static str, String)>)>>,
    }

    impl FakeTransport {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        async fn get(
            &self,
            path: &'static str,
            params: Vec<(&'static str, String)>,
        ) -> Result<ApiResponse, TransportError> {
            self.calls.lock().unwrap().push((path, params));
            Ok(ApiResponse {
                status: self.status,
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    struct BrokenTransport;

    impl Transport for BrokenTransport {
        async fn get(
            &self,
            _path: &'static str,
            _params: Vec<(&'static str, String)>,
        ) -> Result<ApiResponse, TransportError> {
            Err("connection refused".into())
        }
    }

    #[tokio::test]
    async fn point_command_hits_point_endpoint() {
        let transport = FakeTransport::new(200, "[]");
        let command = parse("查询-主世界-方块-具体-(10,64,-5)").unwrap();

        run(&transport, &command).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (path, params) = &calls[0];
        assert_eq!(*path, "/query-blocks");
        assert_eq!(
            *params,
            vec![
                ("x", "10".to_string()),
                ("y", "64".to_string()),
                ("z", "-5".to_string()),
                ("world", "minecraft:overworld".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn range_command_hits_range_endpoint_with_radius() {
        let transport = FakeTransport::new(200, "[]");
        let command = parse("查询-末地-方块-范围-(0,0,0),5").unwrap();

        run(&transport, &command).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (path, params) = &calls[0];
        assert_eq!(*path, "/query-range-blocks");
        assert!(params.contains(&("radius", "5".to_string())));
        assert!(params.contains(&("world", "minecraft:the_end".to_string())));
    }

    #[tokio::test]
    async fn promoted_point_command_behaves_like_range() {
        let transport = FakeTransport::new(200, "[]");
        let promoted = parse("查询-末地-方块-具体-(0,0,0),5").unwrap();
        let explicit = parse("查询-末地-方块-范围-(0,0,0),5").unwrap();
        assert_eq!(promoted, explicit);

        run(&transport, &promoted).await;
        assert_eq!(transport.calls()[0].0, "/query-range-blocks");
    }

    #[tokio::test]
    async fn range_without_radius_does_not_dispatch() {
        let transport = FakeTransport::new(200, "[]");
        let command = parse("查询-主世界-方块-范围-(1,2,3)").unwrap();

        let outcome = run(&transport, &command).await;

        assert_eq!(outcome, QueryOutcome::MissingRadius);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn non_200_status_maps_to_upstream_error() {
        let transport = FakeTransport::new(502, "");
        let command = parse("查询-主世界-方块-具体-(1,2,3)").unwrap();

        assert_eq!(
            run(&transport, &command).await,
            QueryOutcome::UpstreamError(502)
        );
    }

    #[tokio::test]
    async fn empty_array_and_null_map_to_not_found() {
        let command = parse("查询-主世界-方块-具体-(1,2,3)").unwrap();

        let empty = FakeTransport::new(200, "[]");
        assert_eq!(run(&empty, &command).await, QueryOutcome::NotFound);

        let null = FakeTransport::new(200, "null");
        assert_eq!(run(&null, &command).await, QueryOutcome::NotFound);
    }

    #[tokio::test]
    async fn records_are_decoded_in_received_order() {
        let body = r#"[
            {"time":1700000000000,"x":1,"y":2,"z":3,"material":"stone","username":"Alice","action":0},
            {"time":1690000000000,"x":4,"y":5,"z":6,"material":"dirt","username":"Bob","action":7}
        ]"#;
        let transport = FakeTransport::new(200, body);
        let command = parse("查询-主世界-方块-范围-(0,0,0),10").unwrap();

        match run(&transport, &command).await {
            QueryOutcome::Records(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].username, "Alice");
                assert_eq!(records[1].username, "Bob");
                assert_eq!(records[1].action, 7);
            }
            other => panic!("期望 Records，得到 {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_internal_failure() {
        let transport = FakeTransport::new(200, "{not json");
        let command = parse("查询-主世界-方块-具体-(1,2,3)").unwrap();

        assert_eq!(
            run(&transport, &command).await,
            QueryOutcome::InternalFailure
        );
    }

    #[tokio::test]
    async fn transport_error_maps_to_internal_failure() {
        let command = parse("查询-主世界-方块-具体-(1,2,3)").unwrap();

        assert_eq!(
            run(&BrokenTransport, &command).await,
            QueryOutcome::InternalFailure
        );
    }
}
