//! App - アプリケーション層
//!
//! - **AppBuilder**: handler の登録と起動時検証
//! - **Runtime**: 期限が来た run の実行ループ
//! - **DigestDispatcher**: 日次ダイジェストの集計と送信

pub mod builder;
pub mod dispatcher;
pub mod runtime;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatcher::{DigestDeps, DigestDispatcher, schedule_first_run};
pub use self::runtime::{Runtime, TickSummary};
