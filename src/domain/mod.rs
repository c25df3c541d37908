//! ドメイン層
//!
//! セッション状態の集約と、それを操作するコントローラー群。
//! 外部との通信は `api::VideoSearchApi` と `playback::MediaElement` の背後に隠す。

pub mod error;
pub mod formatter;
pub mod labels;
pub mod playback;
pub mod progress;
pub mod search;
pub mod session;
pub mod upload;
pub mod validator;
