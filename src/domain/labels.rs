//! ドメインサービス: 検出ラベルのアイコン
//!
//! 物体検出モデルが返すラベルを表示用の絵文字に対応付ける。
//! 対応表は静的な設定データで、照合は大文字小文字を区別しない。

/// 対応表に無いラベルに使うアイコン
pub const DEFAULT_ICON: &str = "📦";

/// ラベル → アイコン
const LABEL_ICONS: &[(&str, &str)] = &[
    ("person", "🧑"),
    ("car", "🚗"),
    ("dog", "🐕"),
    ("cat", "🐱"),
    ("bus", "🚌"),
    ("truck", "🚛"),
    ("bicycle", "🚲"),
    ("motorcycle", "🏍️"),
    ("bird", "🐦"),
    ("horse", "🐴"),
    ("chair", "🪑"),
    ("bottle", "🍾"),
    ("tv", "📺"),
    ("laptop", "💻"),
    ("phone", "📱"),
    ("book", "📖"),
    ("cup", "☕"),
    ("clock", "🕐"),
    ("umbrella", "☂️"),
    ("backpack", "🎒"),
    ("handbag", "👜"),
    ("knife", "🔪"),
    ("fork", "🍴"),
    ("airplane", "✈️"),
    ("boat", "⛵"),
    ("train", "🚆"),
    ("bed", "🛏️"),
];

/// ラベルに対応するアイコンを返す
///
/// ラベルが未設定・空・未知の場合は [`DEFAULT_ICON`]。
pub fn resolve_icon(label: Option<&str>) -> &'static str {
    let Some(label) = label else {
        return DEFAULT_ICON;
    };

    let key = label.to_lowercase();
    LABEL_ICONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}
