use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Confirm;
use pop_verify::{cli, config, fixture, inspect, scenario};
use cli::{Cli, Commands};
use config::Config;
use pop_verify_common::TestCase;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "pop_verify=debug,pop_verify_common=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "********",
        _ => "未設定",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定ファイルの読み込みに失敗しました")?;
    config.apply_env();

    match cli.command {
        Commands::Run { locations, workbook, sheet, parallel, headless } => {
            println!("🩺 pop-verify - Point of Pain 検証\n");
            println!("開始: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

            if let Some(path) = workbook {
                config.workbook = path;
            }
            if let Some(name) = sheet {
                config.sheet = name;
            }
            config.headless |= headless;

            // ブラウザを立ち上げる前に失敗させる
            config.credentials()?;
            let cases = config.select_scenarios(&locations)?;
            println!(
                "✔ {}件のシナリオ ({}){}\n",
                cases.len(),
                config.workbook.display(),
                if parallel { " - 同時実行" } else { "" }
            );

            let results = scenario::run_all(Arc::new(config), cases, parallel).await;

            println!("\n=== 全体結果 ===");
            let mut failed = 0;
            for (case, result) in &results {
                match result {
                    Ok(outcome) => println!(
                        "✔ {} - {}/{} 一致",
                        case.title(),
                        outcome.reconciliation.matched.len(),
                        outcome.reconciliation.total()
                    ),
                    Err(e) => {
                        failed += 1;
                        println!("✗ {}\n    {}", case.title(), e);
                    }
                }
            }

            if failed > 0 {
                bail!("{}/{} シナリオが失敗しました", failed, results.len());
            }
            println!("\n✅ 全シナリオ成功");
        }

        Commands::Inspect { location, anatomy, workbook, sheet } => {
            let configured = config.scenarios.iter().find(|s| s.location == location).cloned();
            let case = match (configured, anatomy) {
                (Some(mut case), Some(anatomy)) => {
                    case.primary_anatomy = anatomy;
                    case
                }
                (Some(case), None) => case,
                (None, anatomy) => {
                    let mut case = TestCase::new(location.0, "Foot/Ankle/Leg", (0.0, 0.0));
                    if let Some(anatomy) = anatomy {
                        case.primary_anatomy = anatomy;
                    }
                    case
                }
            };

            let workbook = workbook.unwrap_or_else(|| config.workbook.clone());
            let sheet = sheet.unwrap_or_else(|| config.sheet.clone());
            inspect::inspect(&workbook, &sheet, &case)?;
        }

        Commands::UpdateCoords { workbook, sheet, dry_run, yes } => {
            println!("📍 pop-verify - 座標更新\n");
            let workbook = workbook.unwrap_or_else(|| config.workbook.clone());
            let sheet = sheet.unwrap_or_else(|| config.sheet.clone());

            println!("対象: {} / {}", workbook.display(), sheet);
            for o in &config.coordinate_overrides {
                println!("  Location {} ({}) → {}", o.location, o.primary_anatomy, o.point);
            }

            if !dry_run && !yes {
                let proceed = Confirm::new()
                    .with_prompt("ファイルを上書きしますか？")
                    .default(false)
                    .interact()?;
                if !proceed {
                    println!("中止しました");
                    return Ok(());
                }
            }

            let summary = fixture::update::update_coordinates(
                &workbook,
                &sheet,
                &config.coordinate_overrides,
                dry_run,
            )?;

            for row in &summary.updated {
                println!("  ✔ Location {} \"{}\" → {}", row.location, row.condition, row.point);
            }
            println!("更新行数: {}", summary.updated.len());
            println!("内容ハッシュ (前): {}", summary.digest_before);
            println!("内容ハッシュ (後): {}", summary.digest_after);

            if summary.written {
                println!(
                    "\n✅ 保存しました{}",
                    if summary.changed() { "" } else { "（内容の変更なし）" }
                );
            } else {
                println!("\nドライランのため書き込みは行っていません");
            }
        }

        Commands::Config { show, init } => {
            if init {
                let defaults = Config::default();
                defaults.save()?;
                println!("✔ デフォルト設定を書き出しました: {}", Config::config_path()?.display());
                config = defaults;
                config.apply_env();
            }

            if show || !init {
                println!("設定: {}", Config::config_path()?.display());
                println!("  URL: {}", config.base_url);
                println!("  ユーザー名: {}", config.username.as_deref().unwrap_or("未設定"));
                println!("  パスワード: {}", mask(&config.password));
                println!("  WebDriver: {} ({})", config.webdriver_url, config.browser);
                println!("  ヘッドレス: {}", config.headless);
                println!("  フィクスチャ: {} / {}", config.workbook.display(), config.sheet);
                println!("  スクリーンショット: {}", config.screenshot_dir.display());
                println!("  シナリオ:");
                for case in &config.scenarios {
                    println!("    {} - フォールバック {}", case.title(), case.fallback_coordinates);
                }
            }
        }
    }

    Ok(())
}
