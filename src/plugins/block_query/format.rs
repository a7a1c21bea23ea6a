use super::parser::{Mode, ParsedCommand};
use super::query::{BlockRecord, QueryOutcome};
use chrono::{Local, TimeZone};

/// 把查询结果渲染为一段回复文本，每种结果恰好一条
pub fn render(command: &ParsedCommand, outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::MissingRadius => "范围查询需要指定半径，例如：…,(radius)".to_string(),
        QueryOutcome::UpstreamError(status) => format!("API 查询失败: {}", status),
        QueryOutcome::NotFound => "未找到对应方块记录。".to_string(),
        QueryOutcome::InternalFailure => "查询执行失败，请检查日志。".to_string(),
        QueryOutcome::Records(records) => render_records(command, records),
    }
}

fn render_records(command: &ParsedCommand, records: &[BlockRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);

    lines.push(match command.mode {
        Mode::Point => format!(
            "📋 坐标 ({},{},{}) 共{}条：",
            command.x,
            command.y,
            command.z,
            records.len()
        ),
        Mode::Range => format!(
            "🔍 范围查询 ±{} ({},{},{}) 共{}条：",
            command.radius.unwrap_or(0),
            command.x,
            command.y,
            command.z,
            records.len()
        ),
    });

    for record in records {
        // 具体查询回显查询坐标；范围查询的结果分布在多个位置，回显记录自身坐标
        let (cx, cy, cz) = match command.mode {
            Mode::Point => (command.x, command.y, command.z),
            Mode::Range => (record.x, record.y, record.z),
        };

        lines.push(format!(
            "[{}] 坐标({},{},{}) — {} — 玩家 {} — 动作: {}",
            format_time(record.time),
            cx,
            cy,
            cz,
            record.material,
            record.username,
            action_label(record.action)
        ));
    }

    lines.join("\n")
}

/// 动作码转文案，未知值原样带回
pub fn action_label(code: i64) -> String {
    match code {
        0 => "破坏".to_string(),
        1 => "放置".to_string(),
        2 => "使用".to_string(),
        n => format!("未知({})", n),
    }
}

/// 毫秒时间戳转本地时间。chrono 拒绝的极端值退回原始数值，不让一条坏记录毁掉整段回复。
fn format_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("时间戳{}", millis))
}
