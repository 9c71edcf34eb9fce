//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。

pub mod battery;
pub mod buttons;
pub mod console;
pub mod drive_control;
pub mod status;
pub mod usage;

// タスク関数を再エクスポート
pub use battery::battery_task;
pub use buttons::buttons_task;
pub use console::console_task;
pub use drive_control::drive_control_task;
pub use status::status_task;
pub use usage::usage_commit_task;
