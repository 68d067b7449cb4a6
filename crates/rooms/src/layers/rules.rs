use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// What a keyword rule says about a layer whose name it matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Annotation layers; never geometry.
    Text,
    Room,
    /// Wall substrings that survive every later exclusion.
    WallPriority,
    Wall,
    DoorWindow,
    Exclude,
    /// Fixture substrings that exclude even without an exclusion keyword.
    ExcludeFixture,
}

/// A set of case-insensitive substrings sharing one [`RuleKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordRule {
    pub kind: RuleKind,
    /// Lower runs first within the wall/door/exclusion pass.
    pub priority: u8,
    pub keywords: Vec<String>,
    /// The rule does not apply when the name contains this substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless: Option<String>,
}

impl KeywordRule {
    pub fn new(kind: RuleKind, priority: u8, keywords: &[&str]) -> Self {
        Self {
            kind,
            priority,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            unless: None,
        }
    }

    pub fn unless(mut self, guard: &str) -> Self {
        self.unless = Some(guard.to_string());
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        if let Some(guard) = &self.unless {
            if name.contains(&guard.to_lowercase()) {
                return false;
            }
        }
        self.keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| name.contains(&k.to_lowercase()))
    }
}

/// Ordered keyword rules driving the layer classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleTable {
    pub rules: Vec<KeywordRule>,
}

impl RuleTable {
    pub fn new(mut rules: Vec<KeywordRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// True if any rule of `kind` matches `name`.
    pub fn matches(&self, kind: RuleKind, name: &str) -> bool {
        self.rules
            .iter()
            .filter(|r| r.kind == kind)
            .any(|r| r.matches(name))
    }

    /// Rules in ascending priority order.
    pub fn ordered(&self) -> Vec<&KeywordRule> {
        let mut rules: Vec<&KeywordRule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    pub fn is_text(&self, name: &str) -> bool {
        self.matches(RuleKind::Text, name)
    }

    pub fn is_wall(&self, name: &str) -> bool {
        self.matches(RuleKind::Wall, name) || self.is_protected_wall(name)
    }

    pub fn is_protected_wall(&self, name: &str) -> bool {
        self.matches(RuleKind::WallPriority, name)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new(
                RuleKind::Text,
                0,
                &[
                    "TEXT", "DIM", "TITLE", "标注", "文字", "标题", "编号", "图框", "图例",
                    "ANNOTATION", "LABEL", "NUMBER", "NOTE", "备注", "MARK", "符号", "SYMBOL",
                ],
            ),
            KeywordRule::new(
                RuleKind::Room,
                0,
                &[
                    "ROOM", "房间", "房", "SPACE", "空间", "AREA", "区域", "ARCH-ROOM", "A-ROOM",
                    "A-ZONE",
                ],
            ),
            KeywordRule::new(RuleKind::WallPriority, 1, &["隔墙", "砖墙"]),
            KeywordRule::new(
                RuleKind::Wall,
                2,
                &[
                    "WALL", "墙", "墙体", "A-WALL", "S-WALL", "WALX", "ARCH-WALL", "墙线", "QA", "QZ",
                    "MQ", "QIANG", "BZ", "柱", "建-墙", "结构-墙", "建筑-墙", "剪力墙", "承重墙",
                ],
            ),
            KeywordRule::new(
                RuleKind::DoorWindow,
                3,
                &[
                    "DOOR", "门", "A-DOOR", "WINDOW", "窗", "A-WINDOW", "DOOR_WINDOW", "OPENING",
                    "建-窗", "建-门", "门窗",
                ],
            ),
            KeywordRule::new(
                RuleKind::Exclude,
                4,
                &[
                    // furniture
                    "FURN", "家具", "DESK", "TABLE", "CHAIR", "BED", "SOFA", "桌", "椅", "床", "沙发",
                    "柜", "橱", "MOVABLE",
                    // equipment
                    "EQUIP", "设备", "洁具", "卫生间", "装饰", "灯", "电气", "ELEC", "暖通", "HVAC",
                    "给排水", "PLUMBING", "空调", "AC", "AIR",
                    // finishes and fittings
                    "地坪", "踏步", "栏杆", "分隔", "填充", "轮廓线", "面层线", "平顶", "CEILING",
                    "天花", "FLOOR", "地面", "STAIR", "楼梯", "RAILING", "扶手", "DECORATION",
                    "FINISHING", "饰面", "PATTERN", "图案",
                    // everything else that is not a wall
                    "GRID", "轴网", "COLUMN", "BEAM", "梁", "LANDSCAPE", "景观", "VEGETATION", "植被",
                    "SITE", "场地", "LINE", "线条", "LAYOUT", "布局",
                ],
            ),
            KeywordRule::new(RuleKind::ExcludeFixture, 5, &["灯", "洁具", "栏杆", "踏步", "暖通", "家具"]),
            KeywordRule::new(RuleKind::ExcludeFixture, 5, &["隔断"]).unless("墙"),
        ])
    }
}

/// Thresholds for classifying layers by their entity histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StructuralRules {
    /// A room layer needs more polylines than this (or any hatch).
    pub room_min_polylines: usize,
    /// ... and a polyline to line ratio above this when it has lines.
    pub room_polyline_line_ratio: f64,
    /// An unnamed layer is a wall when it has more line-ish entities than this.
    pub wall_min_lines: usize,
    /// ... and a line to text ratio above this when it has text.
    pub wall_line_text_ratio: f64,
}

impl Default for StructuralRules {
    fn default() -> Self {
        Self {
            room_min_polylines: 5,
            room_polyline_line_ratio: 0.5,
            wall_min_lines: 20,
            wall_line_text_ratio: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = RuleTable::default();
        assert!(table.is_wall("a-wall-new"));
        assert!(table.is_text("Room Labels Text"));
        assert!(table.matches(RuleKind::DoorWindow, "A-Door"));
        assert!(!table.matches(RuleKind::DoorWindow, "A-WALL"));
    }

    #[test]
    fn test_guarded_rule() {
        let rule = KeywordRule::new(RuleKind::ExcludeFixture, 5, &["隔断"]).unless("墙");
        assert!(rule.matches("隔断"));
        assert!(!rule.matches("隔断墙"));
    }

    #[test]
    fn test_empty_keywords_never_match() {
        let rule = KeywordRule::new(RuleKind::Exclude, 4, &[""]);
        assert!(!rule.matches("anything"));
    }

    #[test]
    fn test_rules_are_ordered_by_priority() {
        let table = RuleTable::new(vec![
            KeywordRule::new(RuleKind::Exclude, 9, &["X"]),
            KeywordRule::new(RuleKind::Wall, 1, &["W"]),
        ]);
        let kinds: Vec<RuleKind> = table.ordered().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RuleKind::Wall, RuleKind::Exclude]);
    }
}
