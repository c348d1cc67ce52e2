//! WebDriverセッション
//!
//! fantoccini経由でブラウザを操作する。待機はすべてタイムアウト付きのポーリング。

pub mod locator;

use crate::config::Config;
use crate::error::{PopVerifyError, Result};
use fantoccini::actions::{InputSource, MouseActions, PointerAction, MOUSE_BUTTON_LEFT};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use locator::{Candidate, Query, Role, INDEX_ATTR};
use pop_verify_common::ResolvedPoint;
use serde_json::json;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const LABEL_ATTR: &str = "data-pop-label";

/// ブラウザの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl std::str::FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            _ => Err(format!("Unknown browser: {}. Use chrome or firefox", s)),
        }
    }
}

/// WebDriverに渡すcapabilities
pub fn capabilities(kind: BrowserKind, headless: bool) -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();

    match kind {
        BrowserKind::Chrome => {
            let mut args = vec!["--no-sandbox".to_string(), "--window-size=1280,720".to_string()];
            if headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                args.push("--disable-dev-shm-usage".to_string());
            }
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let mut args = vec!["--width=1280".to_string(), "--height=720".to_string()];
            if headless {
                args.push("--headless".to_string());
            }
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
    }

    caps
}

/// キャンバス左上からの位置を要素中心からのオフセットに変換
///
/// WebDriverのポインタ操作は要素の中心が原点になる。
pub fn center_offset(point: ResolvedPoint, width: f64, height: f64) -> (i32, i32) {
    (
        (point.x - width / 2.0).round() as i32,
        (point.y - height / 2.0).round() as i32,
    )
}

/// ブラウザ1セッション（シナリオごとに1つ）
pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    pub async fn connect(config: &Config) -> Result<Self> {
        let kind: BrowserKind = config.browser.parse().map_err(PopVerifyError::Config)?;
        debug!(url = %config.webdriver_url, ?kind, "connecting to WebDriver");

        let client = ClientBuilder::native()
            .capabilities(capabilities(kind, config.headless))
            .connect(&config.webdriver_url)
            .await?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!(url, "navigating");
        self.client.goto(url).await?;
        Ok(())
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn wait_until<F, Fut>(&self, timeout: Duration, what: &str, mut check: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if check().await.unwrap_or(false) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PopVerifyError::Timeout(format!("{} ({}ms)", what, timeout.as_millis())));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn script_bool(&self, script: &str, args: Vec<serde_json::Value>) -> Result<bool> {
        let value = self.client.execute(script, args).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// 読み込み完了まで待つ
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        self.wait_until(timeout, "page load", || {
            self.script_bool(locator::READY_SCRIPT, vec![])
        })
        .await
    }

    /// 読み込み完了まで待つ（タイムアウトしても続行）
    pub async fn settle(&self, timeout: Duration) {
        if let Err(e) = self.wait_for_load(timeout).await {
            debug!("settle: {}", e);
        }
    }

    /// URLに文字列が含まれるまで待つ
    pub async fn wait_for_url_containing(&self, fragment: &str, timeout: Duration) -> Result<()> {
        self.wait_until(timeout, &format!("URL containing {}", fragment), || async {
            let url = self.client.current_url().await?;
            Ok::<bool, PopVerifyError>(url.as_str().contains(fragment))
        })
        .await
    }

    /// 本文にテキストが表示されるまで待つ
    pub async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<()> {
        self.wait_until(timeout, &format!("text \"{}\"", text), || {
            self.script_bool(locator::BODY_CONTAINS_SCRIPT, vec![json!(text)])
        })
        .await
    }

    /// 候補を列挙（番号属性が付く）
    pub async fn candidates(&self, query: &Query) -> Result<Vec<Candidate>> {
        let value = self
            .client
            .execute(
                locator::CANDIDATES_SCRIPT,
                vec![json!(query.css), json!(query.source.as_str()), json!(INDEX_ATTR)],
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 条件に合う要素を取得（見つからなければ None）
    pub async fn try_find(&self, query: &Query) -> Result<Option<Element>> {
        let candidates = self.candidates(query).await?;
        let Some(index) = query.select(&candidates) else {
            return Ok(None);
        };
        let css = format!("[{}=\"{}\"]", INDEX_ATTR, index);
        Ok(Some(self.client.find(Locator::Css(&css)).await?))
    }

    pub async fn find(&self, query: &Query) -> Result<Element> {
        self.try_find(query)
            .await?
            .ok_or_else(|| PopVerifyError::ElementNotFound(query.description.clone()))
    }

    /// 要素が現れるまで待って取得
    pub async fn wait_for(&self, query: &Query, timeout: Duration) -> Result<Element> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(Some(element)) = self.try_find(query).await {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PopVerifyError::Timeout(query.description.clone()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn click(&self, query: &Query, timeout: Duration) -> Result<()> {
        debug!(target = %query.description, "click");
        self.wait_for(query, timeout).await?.click().await?;
        Ok(())
    }

    /// 表示されているか（エラーは非表示扱い）
    pub async fn is_visible(&self, query: &Query) -> bool {
        match self.try_find(query).await {
            Ok(Some(element)) => element.is_displayed().await.unwrap_or(false),
            _ => false,
        }
    }

    /// ラベル名で入力欄を探して値を入れる
    pub async fn fill_by_label(&self, label: &str, value: &str, timeout: Duration) -> Result<()> {
        self.wait_until(timeout, &format!("input labelled \"{}\"", label), || {
            self.script_bool(locator::LABEL_SCRIPT, vec![json!(label), json!(LABEL_ATTR)])
        })
        .await?;

        let css = format!("[{}]", LABEL_ATTR);
        let input = self.client.find(Locator::Css(&css)).await?;
        input.clear().await?;
        input.send_keys(value).await?;
        Ok(())
    }

    /// 表示中のボタン名一覧（診断用）
    pub async fn visible_button_names(&self) -> Result<Vec<String>> {
        let candidates = self.candidates(&Query::css(Role::Button.css())).await?;
        Ok(candidates
            .into_iter()
            .filter(|c| c.visible)
            .map(|c| locator::collapse_whitespace(&c.name))
            .filter(|n| !n.is_empty())
            .collect())
    }

    /// キャンバスの指定位置をクリック（double = true でダブルクリック）
    pub async fn click_canvas(&self, canvas: &Element, point: ResolvedPoint, double: bool) -> Result<()> {
        let (_, _, width, height) = canvas.rectangle().await?;
        let (x, y) = center_offset(point, width, height);
        debug!(%point, offset_x = x, offset_y = y, double, "canvas click");

        let mut mouse = MouseActions::new("mouse".to_string()).then(PointerAction::MoveToElement {
            element: canvas.clone(),
            duration: None,
            x: x.into(),
            y: y.into(),
        });
        let clicks = if double { 2 } else { 1 };
        for _ in 0..clicks {
            mouse = mouse
                .then(PointerAction::Down { button: MOUSE_BUTTON_LEFT })
                .then(PointerAction::Up { button: MOUSE_BUTTON_LEFT });
        }

        self.client.perform_actions(mouse).await?;
        Ok(())
    }

    /// スクリーンショットを保存
    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self.client.screenshot().await?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, png)?;
        debug!(path = %path.display(), "screenshot saved");
        Ok(())
    }

    /// 要素のtextContent一覧
    pub async fn texts(&self, css: &str) -> Result<Vec<String>> {
        let value = self.client.execute(locator::TEXTS_SCRIPT, vec![json!(css)]).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 自身のテキストに文字列を含む要素のtextContent一覧
    pub async fn texts_containing(&self, needle: &str) -> Result<Vec<String>> {
        let value = self
            .client
            .execute(locator::TEXT_SEARCH_SCRIPT, vec![json!(needle)])
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
