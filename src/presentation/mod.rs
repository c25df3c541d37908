/// プレゼンテーション層モジュール
///
/// ドメイン層の状態とUI表示の橋渡しを行います。
/// プレゼンテーション層はドメイン層に依存しますが、その逆はありません。
///
/// # モジュール
/// - `input`: 対話セッションの入力解析
/// - `output`: コマンド結果・エラー・セッション画面の出力（人間向け・機械向け）
/// - `progress`: アップロード進捗の表示

pub mod input;
pub mod output;
pub mod progress;
