use crate::error::{PopVerifyError, Result};
use pop_verify_common::{LocationId, ResolvedPoint, TestCase};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 待機時間（ミリ秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// 画面遷移・URL変化の待機
    pub navigation_ms: u64,
    /// キャンバス表示の待機
    pub canvas_ms: u64,
    /// クリック後の描画待ち
    pub settle_ms: u64,
    /// クリックとダブルクリックの間隔
    pub click_gap_ms: u64,
    /// シナリオ全体
    pub scenario_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 15_000,
            canvas_ms: 20_000,
            settle_ms: 2_000,
            click_gap_ms: 500,
            scenario_ms: 90_000,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn canvas(&self) -> Duration {
        Duration::from_millis(self.canvas_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn click_gap(&self) -> Duration {
        Duration::from_millis(self.click_gap_ms)
    }

    pub fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }
}

/// 座標更新ユーティリティで書き込む値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateOverride {
    pub location: LocationId,
    pub primary_anatomy: String,
    pub point: ResolvedPoint,
}

impl CoordinateOverride {
    pub fn defaults() -> Vec<Self> {
        vec![
            CoordinateOverride {
                location: LocationId(1),
                primary_anatomy: "Foot/Ankle/Leg".into(),
                point: ResolvedPoint::new(378.0, 73.0),
            },
            CoordinateOverride {
                location: LocationId(2),
                primary_anatomy: "Foot/Ankle/Leg".into(),
                point: ResolvedPoint::new(385.0, 348.0),
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub webdriver_url: String,
    pub browser: String,
    pub headless: bool,
    pub workbook: PathBuf,
    pub sheet: String,
    pub screenshot_dir: PathBuf,
    pub timeouts: Timeouts,
    pub scenarios: Vec<TestCase>,
    pub coordinate_overrides: Vec<CoordinateOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PopVerifyError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pop-verify").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            base_url: "https://orthopop-dev.brainweber.net".into(),
            username: None,
            password: None,
            webdriver_url: "http://localhost:9515".into(),
            browser: "chrome".into(),
            headless: false,
            workbook: PathBuf::from("test-data/condition-list.xlsx"),
            sheet: "Multi User Version".into(),
            screenshot_dir: PathBuf::from("test-results"),
            timeouts: Timeouts::default(),
            scenarios: TestCase::defaults(),
            coordinate_overrides: CoordinateOverride::defaults(),
        }
    }

    /// 環境変数を優先して上書き
    pub fn apply_env(&mut self) {
        if let Ok(user) = std::env::var("POP_USERNAME") {
            self.username = Some(user);
        }
        if let Ok(pass) = std::env::var("POP_PASSWORD") {
            self.password = Some(pass);
        }
        if let Ok(url) = std::env::var("POP_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(PopVerifyError::MissingCredentials),
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url.trim_end_matches('/'))
    }

    /// 指定ロケーションのシナリオ（空なら全件）
    pub fn select_scenarios(&self, locations: &[LocationId]) -> Result<Vec<TestCase>> {
        if locations.is_empty() {
            return Ok(self.scenarios.clone());
        }

        locations
            .iter()
            .map(|loc| {
                self.scenarios
                    .iter()
                    .find(|s| s.location == *loc)
                    .cloned()
                    .ok_or_else(|| {
                        PopVerifyError::Config(format!("Location {} のシナリオが設定されていません", loc))
                    })
            })
            .collect()
    }
}
