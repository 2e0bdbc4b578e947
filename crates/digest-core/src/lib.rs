//! digest-core
//!
//! Daily digest emails: once a day, every subscribed user receives a summary of
//! yesterday's task activity in the projects they follow.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, events, projects, users, bundles, calendar, errors）
//! - **ports**: 抽象化レイヤー（stores, Mailer, TemplateRenderer, JobScheduler, Clock）
//! - **app**: アプリケーションロジック（builder, runtime, dispatcher）
//! - **typed**: 型付き Job API（Task trait, Handler trait, TypedRegistry）
//! - **impls**: 実装（in-memory stores, scheduler, Handlebars, SMTP）
//! - **config**: 環境変数からの設定
//! - **observability**: run report

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;
