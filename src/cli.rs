use clap::{Parser, Subcommand};
use pop_verify_common::LocationId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pop-verify")]
#[command(about = "Point of Pain 病名表示のE2E検証ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 設定済みのシナリオをブラウザで実行
    Run {
        /// 実行するロケーション（複数指定可、省略時は全件）
        #[arg(short, long = "location")]
        locations: Vec<LocationId>,

        /// フィクスチャのExcelファイル
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// シート名
        #[arg(short, long)]
        sheet: Option<String>,

        /// シナリオを同時実行
        #[arg(long)]
        parallel: bool,

        /// ヘッドレスで起動
        #[arg(long)]
        headless: bool,
    },

    /// フィクスチャの一致行と座標を表示（ブラウザ不要）
    Inspect {
        /// ロケーション
        #[arg(short, long)]
        location: LocationId,

        /// Primary Anatomy（省略時は設定済みシナリオの値）
        #[arg(short, long)]
        anatomy: Option<String>,

        /// フィクスチャのExcelファイル
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// シート名
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// フィクスチャに固定のクリック座標を書き込む
    UpdateCoords {
        /// フィクスチャのExcelファイル
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// シート名
        #[arg(short, long)]
        sheet: Option<String>,

        /// ドライラン（書き込まずに結果を表示）
        #[arg(long)]
        dry_run: bool,

        /// 確認せずに上書き
        #[arg(short, long)]
        yes: bool,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// デフォルト設定を書き出す
        #[arg(long)]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_locations() {
        let cli = Cli::parse_from(["pop-verify", "-v", "run", "--location", "1", "-l", "2", "--parallel"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { locations, parallel, headless, .. } => {
                assert_eq!(locations, vec![LocationId(1), LocationId(2)]);
                assert!(parallel);
                assert!(!headless);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_location() {
        assert!(Cli::try_parse_from(["pop-verify", "inspect", "--location", "abc"]).is_err());
    }

    #[test]
    fn test_parse_update_coords() {
        let cli = Cli::parse_from(["pop-verify", "update-coords", "--dry-run"]);
        match cli.command {
            Commands::UpdateCoords { dry_run, yes, .. } => {
                assert!(dry_run);
                assert!(!yes);
            }
            _ => panic!("expected update-coords"),
        }
    }
}
