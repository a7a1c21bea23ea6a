use regex::Regex;
use std::sync::OnceLock;

/// 游戏世界选择符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum World {
    Overworld,
    TheEnd,
    Nether,
}

impl World {
    /// 日志服务使用的世界标识
    pub fn wire_id(self) -> &'static str {
        match self {
            World::Overworld => "minecraft:overworld",
            World::TheEnd => "minecraft:the_end",
            World::Nether => "minecraft:the_nether",
        }
    }
}

/// 查询模式：具体坐标 / 半径范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Point,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub world: World,
    pub mode: Mode,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub radius: Option<u32>,
}

static COMMAND_RE: OnceLock<Regex> = OnceLock::new();

fn command_re() -> &'static Regex {
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"^查询-(主世界|末地|下界)-方块-(具体|范围)-\((-?\d+),(-?\d+),(-?\d+)\)(?:,(\d+))?$")
            .expect("指令语法正则不合法")
    })
}

/// 解析方块查询指令。返回 None 表示语法不匹配，调用方应静默忽略。
///
/// 语法: `查询-{世界}-方块-{模式}-({x},{y},{z})[,{半径}]`
pub fn parse(raw: &str) -> Option<ParsedCommand> {
    let caps = command_re().captures(raw)?;

    let world = match &caps[1] {
        "主世界" => World::Overworld,
        "末地" => World::TheEnd,
        _ => World::Nether,
    };
    let mut mode = match &caps[2] {
        "具体" => Mode::Point,
        _ => Mode::Range,
    };

    // 数字超出范围按不匹配处理
    let x = caps[3].parse().ok()?;
    let y = caps[4].parse().ok()?;
    let z = caps[5].parse().ok()?;
    let radius: Option<u32> = match caps.get(6) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };

    // 带半径的具体查询一律按范围查询处理，半径为 0 也是
    if mode == Mode::Point && radius.is_some() {
        mode = Mode::Range;
    }

    Some(ParsedCommand {
        world,
        mode,
        x,
        y,
        z,
        radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point_command() {
        let cmd = parse("查询-主世界-方块-具体-(10,64,-5)").unwrap();
        assert_eq!(cmd.world, World::Overworld);
        assert_eq!(cmd.mode, Mode::Point);
        assert_eq!((cmd.x, cmd.y, cmd.z), (10, 64, -5));
        assert_eq!(cmd.radius, None);
    }

    #[test]
    fn parses_range_command() {
        let cmd = parse("查询-末地-方块-范围-(0,0,0),5").unwrap();
        assert_eq!(cmd.world, World::TheEnd);
        assert_eq!(cmd.mode, Mode::Range);
        assert_eq!(cmd.radius, Some(5));
    }

    #[test]
    fn parses_nether_and_negative_coordinates() {
        let cmd = parse("查询-下界-方块-具体-(-120,-64,-3)").unwrap();
        assert_eq!(cmd.world, World::Nether);
        assert_eq!((cmd.x, cmd.y, cmd.z), (-120, -64, -3));
    }

    #[test]
    fn point_with_radius_is_promoted_to_range() {
        let cmd = parse("查询-主世界-方块-具体-(1,2,3),7").unwrap();
        assert_eq!(cmd.mode, Mode::Range);
        assert_eq!(cmd.radius, Some(7));
    }

    #[test]
    fn point_with_zero_radius_is_still_promoted() {
        let cmd = parse("查询-主世界-方块-具体-(1,2,3),0").unwrap();
        assert_eq!(cmd.mode, Mode::Range);
        assert_eq!(cmd.radius, Some(0));
    }

    #[test]
    fn range_with_zero_radius_stays_range() {
        let cmd = parse("查询-主世界-方块-范围-(1,2,3),0").unwrap();
        assert_eq!(cmd.mode, Mode::Range);
        assert_eq!(cmd.radius, Some(0));
    }

    #[test]
    fn range_without_radius_parses_with_none() {
        // 缺半径由查询层给出指引，不是语法错误
        let cmd = parse("查询-主世界-方块-范围-(1,2,3)").unwrap();
        assert_eq!(cmd.mode, Mode::Range);
        assert_eq!(cmd.radius, None);
    }

    #[test]
    fn rejects_non_matching_text() {
        for raw in [
            "",
            "你好",
            "查询-主世界-方块-具体-(1,2)",
            "查询-主世界-方块-具体-(1,2,3",
            "查询-主世界-方块-具体-(1.5,2,3)",
            "查询-主世界-方块-精确-(1,2,3)",
            "查询-地狱-方块-具体-(1,2,3)",
            "查询-主世界-方块-具体-(1, 2, 3)",
            "前缀 查询-主世界-方块-具体-(1,2,3)",
            "查询-主世界-方块-具体-(1,2,3) 后缀",
            "查询-主世界-方块-范围-(1,2,3),-5",
        ] {
            assert!(parse(raw).is_none(), "不应匹配: {raw}");
        }
    }

    #[test]
    fn rejects_overflowing_numbers() {
        assert!(parse("查询-主世界-方块-具体-(99999999999999999999,0,0)").is_none());
        assert!(parse("查询-主世界-方块-范围-(0,0,0),99999999999").is_none());
    }
}
