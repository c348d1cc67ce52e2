//! Point of Pain 病名表示のE2E検証
//!
//! Excelフィクスチャの行ごとに人体図キャンバスをクリックし、
//! 表示された病名が想定どおりかを照合する。

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fixture;
pub mod inspect;
pub mod scenario;
