//! シナリオ実行
//!
//! 1シナリオ = 1ブラウザセッション。フィクスチャの各行について
//! キャンバスをクリックし、表示された病名を集めて最後に照合する。

pub mod flow;
pub mod plan;
pub mod report;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{PopVerifyError, Result};
use crate::extractor::extract_conditions;
use crate::fixture;
use fantoccini::elements::Element;
use plan::{PlannedPoint, ScenarioPlan};
use pop_verify_common::{reconcile, LocationId, Reconciliation, TestCase, ValidationLog, ValidationResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// 成功したシナリオの結果
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub plan: ScenarioPlan,
    pub reconciliation: Reconciliation,
}

/// スクリーンショットのパス（例: location-1-point-3.png）
pub fn screenshot_path(dir: &Path, location: LocationId, point: usize, suffix: Option<&str>) -> PathBuf {
    let name = match suffix {
        Some(s) => format!("location-{}-point-{}-{}.png", location, point, s),
        None => format!("location-{}-point-{}.png", location, point),
    };
    dir.join(name)
}

/// 1シナリオを実行
pub async fn run_scenario(config: &Config, case: &TestCase) -> Result<ScenarioOutcome> {
    let sheet = fixture::load_sheet(&config.workbook, Some(&config.sheet))?;
    let plan = ScenarioPlan::build(case, &sheet)?;
    println!("{}", report::render_plan(&plan));

    let session = BrowserSession::connect(config).await?;
    let driven = tokio::time::timeout(config.timeouts.scenario(), drive(&session, config, &plan)).await;
    if let Err(e) = session.close().await {
        warn!("failed to close browser session: {}", e);
    }

    let log = match driven {
        Ok(log) => log?,
        Err(_) => {
            return Err(PopVerifyError::Timeout(format!(
                "{} ({}ms)",
                case.title(),
                config.timeouts.scenario_ms
            )))
        }
    };

    let reconciliation = reconcile(&log);
    println!("{}", report::render_reconciliation(&plan, &reconciliation));
    let reconciliation = reconciliation.into_result(case.location, &case.primary_anatomy)?;

    println!("✔ Location {} のテストが完了しました", case.location);
    Ok(ScenarioOutcome { plan, reconciliation })
}

async fn drive(session: &BrowserSession, config: &Config, plan: &ScenarioPlan) -> Result<ValidationLog> {
    flow::login(session, config).await?;
    let canvas = flow::open_canvas(session, config, &plan.case.navigation).await?;

    println!("=== キャンバスをクリック ({}地点) ===", plan.points.len());
    let mut log = ValidationLog::new();
    for point in &plan.points {
        let result = click_point(session, config, plan, &canvas, point).await?;
        log = log.record(result);
    }
    Ok(log)
}

async fn click_point(
    session: &BrowserSession,
    config: &Config,
    plan: &ScenarioPlan,
    canvas: &Element,
    planned: &PlannedPoint,
) -> Result<ValidationResult> {
    let t = &config.timeouts;
    let location = plan.case.location;
    let number = planned.index + 1;

    println!("[{}/{}] 病名: {}", number, plan.points.len(), planned.condition);
    println!("    座標 {} をクリック", planned.point);

    session.click_canvas(canvas, planned.point, false).await?;
    session.sleep(t.click_gap()).await;
    session.click_canvas(canvas, planned.point, true).await?;

    session.sleep(t.settle()).await;
    session.settle(t.navigation()).await;
    session
        .screenshot(&screenshot_path(&config.screenshot_dir, location, number, None))
        .await?;

    match flow::click_progression_button(session).await? {
        Some(name) => println!("    ✔ {} ボタンを押下", name),
        None => {
            println!("    ✗ 座標 {} でボタンが見つかりません", planned.point);
            let path = screenshot_path(&config.screenshot_dir, location, number, Some("no-button"));
            if let Err(e) = session.screenshot(&path).await {
                warn!("failed to capture screenshot: {}", e);
            }
            let visible_buttons = session.visible_button_names().await.unwrap_or_default();
            return Err(PopVerifyError::NoActionableButton {
                location,
                point: number,
                x: planned.point.x,
                y: planned.point.y,
                visible_buttons,
            });
        }
    }

    session.settle(t.navigation()).await;
    session.sleep(t.settle()).await;

    let extraction = extract_conditions(session, &plan.expected).await?;
    println!(
        "    表示された病名: {}件 - {} ({})",
        extraction.conditions.len(),
        extraction.conditions.join(", "),
        extraction.source
    );

    Ok(ValidationResult {
        expected_condition: planned.condition.clone(),
        displayed_conditions: extraction.conditions,
        coordinates: planned.point,
    })
}

/// 複数シナリオを実行（parallel = true なら同時実行）
///
/// 1つが失敗しても他のシナリオは続行する。
pub async fn run_all(
    config: Arc<Config>,
    cases: Vec<TestCase>,
    parallel: bool,
) -> Vec<(TestCase, Result<ScenarioOutcome>)> {
    let mut results = Vec::with_capacity(cases.len());

    if !parallel {
        for case in cases {
            let result = run_scenario(&config, &case).await;
            results.push((case, result));
        }
        return results;
    }

    let handles: Vec<_> = cases
        .iter()
        .cloned()
        .map(|case| {
            let config = Arc::clone(&config);
            tokio::spawn(async move { run_scenario(&config, &case).await })
        })
        .collect();

    for (case, handle) in cases.into_iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(PopVerifyError::Config(format!("シナリオ実行タスクが異常終了: {}", e))),
        };
        results.push((case, result));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_path() {
        let dir = Path::new("test-results");
        assert_eq!(
            screenshot_path(dir, LocationId(2), 3, None),
            PathBuf::from("test-results/location-2-point-3.png")
        );
        assert_eq!(
            screenshot_path(dir, LocationId(1), 1, Some("no-button")),
            PathBuf::from("test-results/location-1-point-1-no-button.png")
        );
    }
}
