use crate::common::{coerce_number, lenient};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// # Summary
/// 交易信号的生命周期状态。
///
/// # Invariants
/// - `Active` 与 `Partial` 视为持仓中，其余 (包括无法识别的状态) 为已平仓状态。
/// - 无法识别的状态文本保存在 `Unknown` 中，不会导致整表解析失败。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SignalStatus {
    // 持仓中
    #[default]
    Active,
    // 部分止盈，仍有剩余仓位
    Partial,
    // 手动离场
    Exited,
    // 触发止损
    Stopped,
    // 全部目标达成
    AllTarget,
    // 表格中无法识别的状态，保留原文
    Unknown(String),
}

impl SignalStatus {
    /// 是否仍处于持仓状态
    pub fn is_active(&self) -> bool {
        matches!(self, SignalStatus::Active | SignalStatus::Partial)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SignalStatus::Unknown(_))
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    /// # Summary
    /// 解析表格中的状态文本。
    ///
    /// # Logic
    /// 1. 忽略大小写，空格与连字符统一视为下划线。
    /// 2. 空白单元格视为 `Active` (新录入的信号通常尚未填写状态)。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "" | "ACTIVE" => Ok(SignalStatus::Active),
            "PARTIAL" => Ok(SignalStatus::Partial),
            "EXITED" | "EXIT" => Ok(SignalStatus::Exited),
            "STOPPED" | "SL_HIT" => Ok(SignalStatus::Stopped),
            "ALL_TARGET" | "ALL_TARGETS" => Ok(SignalStatus::AllTarget),
            _ => Err(format!("Unknown SignalStatus: {}", s)),
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Active => write!(f, "ACTIVE"),
            SignalStatus::Partial => write!(f, "PARTIAL"),
            SignalStatus::Exited => write!(f, "EXITED"),
            SignalStatus::Stopped => write!(f, "STOPPED"),
            SignalStatus::AllTarget => write!(f, "ALL_TARGET"),
            SignalStatus::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for SignalStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignalStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = lenient::text(deserializer)?;
        Ok(raw.parse().unwrap_or(SignalStatus::Unknown(raw)))
    }
}

/// # Summary
/// 一条交易信号记录，对应表格中的一行。
///
/// # Invariants
/// - `id` 在信号的整个生命周期内唯一且不会复用，包括进入已平仓状态之后。
/// - `sheet_index` 单调递增，数值越大代表越新的行。
/// - 只有 [`TrackedField`] 列出的字段参与差异比较。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    // 信号唯一标识
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    // 表格行号，用作最近变更的决胜依据
    #[serde(default, deserialize_with = "lenient::index")]
    pub sheet_index: u64,
    #[serde(default)]
    pub status: SignalStatus,
    #[serde(default, deserialize_with = "lenient::text")]
    pub instrument: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub symbol: String,
    // 表格中的 "type" 列 (如 CE / PE / FUT)
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub stop_loss: Option<f64>,
    // 有序目标价序列
    #[serde(default, deserialize_with = "lenient::numbers")]
    pub targets: Vec<f64>,
    #[serde(rename = "trailingSL", default, deserialize_with = "lenient::number")]
    pub trailing_sl: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pnl_points: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pnl_rupees: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub comment: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub targets_hit: u32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,
    // 当前市价
    #[serde(default, deserialize_with = "lenient::number")]
    pub cmp: Option<f64>,
    // 隔夜持仓 (Buy Today Sell Tomorrow) 标记
    #[serde(rename = "isBTST", default, deserialize_with = "lenient::flag")]
    pub is_btst: bool,
    // 其余不参与比较的列，原样透传给展示层
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Signal {
    /// 是否仍处于持仓状态 (ACTIVE 或 PARTIAL)
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 是否已平仓
    pub fn is_closed(&self) -> bool {
        !self.is_active()
    }
}

/// # Summary
/// 参与差异比较的信号字段。
///
/// # Invariants
/// - `name()` 返回的名称与表格列名一致，作为 `ChangeSet` 中的字段标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedField {
    Status,
    Instrument,
    Symbol,
    Type,
    Action,
    EntryPrice,
    StopLoss,
    Targets,
    TrailingSl,
    PnlPoints,
    PnlRupees,
    Comment,
    TargetsHit,
    Quantity,
    Cmp,
    IsBtst,
}

impl TrackedField {
    /// 全部受跟踪字段
    pub const ALL: [TrackedField; 16] = [
        TrackedField::Status,
        TrackedField::Instrument,
        TrackedField::Symbol,
        TrackedField::Type,
        TrackedField::Action,
        TrackedField::EntryPrice,
        TrackedField::StopLoss,
        TrackedField::Targets,
        TrackedField::TrailingSl,
        TrackedField::PnlPoints,
        TrackedField::PnlRupees,
        TrackedField::Comment,
        TrackedField::TargetsHit,
        TrackedField::Quantity,
        TrackedField::Cmp,
        TrackedField::IsBtst,
    ];

    /// 字段在表格中的列名
    pub fn name(self) -> &'static str {
        match self {
            TrackedField::Status => "status",
            TrackedField::Instrument => "instrument",
            TrackedField::Symbol => "symbol",
            TrackedField::Type => "type",
            TrackedField::Action => "action",
            TrackedField::EntryPrice => "entryPrice",
            TrackedField::StopLoss => "stopLoss",
            TrackedField::Targets => "targets",
            TrackedField::TrailingSl => "trailingSL",
            TrackedField::PnlPoints => "pnlPoints",
            TrackedField::PnlRupees => "pnlRupees",
            TrackedField::Comment => "comment",
            TrackedField::TargetsHit => "targetsHit",
            TrackedField::Quantity => "quantity",
            TrackedField::Cmp => "cmp",
            TrackedField::IsBtst => "isBTST",
        }
    }
}

/// # Summary
/// 表格原始单元格，保留源数据的 JSON 形态，比较时才做数字转换。
///
/// # Invariants
/// - 源数据可能把数字序列化为字符串，`"123.0"` 与 `123` 数值相等。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(pub Value);

impl Cell {
    /// 转换为数字，无法转换时返回 None
    pub fn as_number(&self) -> Option<f64> {
        coerce_number(&self.0)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell(serde_json::json!(v))
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell(Value::String(v.to_string()))
    }
}

/// # Summary
/// 自选列表条目。
///
/// # Invariants
/// - `symbol` 在同一快照内唯一，仅在会话内有效。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(default)]
    pub price: Cell,
    #[serde(default)]
    pub change: Cell,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// # Summary
/// 一次抓取得到的完整表格快照，生成后不再修改。
///
/// # Invariants
/// - `extras` 保存信号与自选之外的其它集合，引擎不解读其内容。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl Snapshot {
    /// 按 id 查找信号
    pub fn signal(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    /// 按代码查找自选条目
    pub fn watch(&self, symbol: &str) -> Option<&WatchlistEntry> {
        self.watchlist.iter().find(|w| w.symbol == symbol)
    }
}
