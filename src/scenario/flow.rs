//! ログインからキャンバス表示までの画面操作

use crate::browser::locator::{Query, Role};
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::Result;
use fantoccini::elements::Element;
use pop_verify_common::NavigationPlan;
use tracing::info;

const DASHBOARD_URL_FRAGMENT: &str = "/dashboard/";
const DASHBOARD_TEXT: &str = "Begin your OrthoPoP Journey";
const POINT_OF_PAIN_CARD: &str = "Point of Pain";

/// キャンバス操作後に押すボタン（優先順）
pub const PROGRESSION_BUTTONS: [&str; 3] = ["Proceed", "Continue", "Next"];

/// ログインしてダッシュボードを待つ
pub async fn login(session: &BrowserSession, config: &Config) -> Result<()> {
    let (username, password) = config.credentials()?;
    let t = &config.timeouts;

    session.goto(&config.login_url()).await?;
    session.wait_for_load(t.navigation()).await?;

    session.fill_by_label("Username", username, t.navigation()).await?;
    session.fill_by_label("Password", password, t.navigation()).await?;
    session.click(&Query::role(Role::Button, "log in"), t.navigation()).await?;

    session
        .wait_for_url_containing(DASHBOARD_URL_FRAGMENT, t.navigation())
        .await?;
    session.wait_for_text(DASHBOARD_TEXT, t.navigation()).await?;
    info!("logged in");
    Ok(())
}

/// Point of Pain から部位・ビュー・レイヤーを選び、キャンバスを返す
pub async fn open_canvas(
    session: &BrowserSession,
    config: &Config,
    nav: &NavigationPlan,
) -> Result<Element> {
    let t = &config.timeouts;
    let step = t.navigation();

    session
        .click(&Query::css_with_text("div.cursor-pointer", POINT_OF_PAIN_CARD), step)
        .await?;
    session.settle(step).await;

    session.click(&Query::role(Role::Button, "Accept"), step).await?;
    session
        .click(
            &Query::css_with_text("div", &nav.region_label).nth(nav.region_index),
            step,
        )
        .await?;
    session.click(&Query::role(Role::Img, &nav.side_label), step).await?;
    session.click(&Query::role(Role::Button, "Continue"), step).await?;
    session.click(&Query::role(Role::Button, "Close"), step).await?;
    session.click(&Query::role(Role::Img, &nav.view_label), step).await?;
    session.click(&Query::role(Role::Img, &nav.layer_label), step).await?;
    session.click(&Query::title(&nav.tissue_title), step).await?;

    let canvas = session
        .wait_for(&Query::css("canvas").visible(), t.canvas())
        .await?;

    // キャンバスが操作可能になるまで待つ
    session.sleep(t.settle()).await;
    session.settle(step).await;
    info!(region = %nav.region_label, view = %nav.view_label, "canvas ready");
    Ok(canvas)
}

/// 画面上のボタン操作
#[allow(async_fn_in_trait)]
pub trait ButtonBar {
    /// 名前に一致するボタンが表示されているか
    async fn button_visible(&self, name: &str) -> bool;

    async fn press_button(&self, name: &str) -> Result<()>;
}

impl ButtonBar for BrowserSession {
    async fn button_visible(&self, name: &str) -> bool {
        self.is_visible(&Query::role(Role::Button, name)).await
    }

    async fn press_button(&self, name: &str) -> Result<()> {
        self.find(&Query::role(Role::Button, name)).await?.click().await?;
        Ok(())
    }
}

/// Proceed → Continue → Next の順で表示中のボタンを探して押す
///
/// 押したボタン名を返す。どれも無ければ None。
pub async fn click_progression_button<B: ButtonBar>(bar: &B) -> Result<Option<&'static str>> {
    for name in PROGRESSION_BUTTONS {
        if bar.button_visible(name).await {
            bar.press_button(name).await?;
            return Ok(Some(name));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeBar {
        visible: Vec<&'static str>,
        asked: RefCell<Vec<String>>,
        pressed: RefCell<Vec<String>>,
    }

    impl FakeBar {
        fn showing(visible: &[&'static str]) -> Self {
            Self {
                visible: visible.to_vec(),
                asked: RefCell::new(Vec::new()),
                pressed: RefCell::new(Vec::new()),
            }
        }
    }

    impl ButtonBar for FakeBar {
        async fn button_visible(&self, name: &str) -> bool {
            self.asked.borrow_mut().push(name.to_string());
            self.visible.iter().any(|v| *v == name)
        }

        async fn press_button(&self, name: &str) -> Result<()> {
            self.pressed.borrow_mut().push(name.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_proceed_preferred_over_others() {
        let bar = FakeBar::showing(&["Next", "Continue", "Proceed"]);
        assert_eq!(click_progression_button(&bar).await.unwrap(), Some("Proceed"));
        assert_eq!(*bar.pressed.borrow(), vec!["Proceed"]);
        assert_eq!(*bar.asked.borrow(), vec!["Proceed"]);
    }

    #[tokio::test]
    async fn test_continue_only_when_proceed_hidden() {
        let bar = FakeBar::showing(&["Next", "Continue"]);
        assert_eq!(click_progression_button(&bar).await.unwrap(), Some("Continue"));
        assert_eq!(*bar.pressed.borrow(), vec!["Continue"]);
        assert_eq!(*bar.asked.borrow(), vec!["Proceed", "Continue"]);
    }

    #[tokio::test]
    async fn test_next_is_last_resort() {
        let bar = FakeBar::showing(&["Back", "Next"]);
        assert_eq!(click_progression_button(&bar).await.unwrap(), Some("Next"));
        assert_eq!(*bar.asked.borrow(), vec!["Proceed", "Continue", "Next"]);
    }

    #[tokio::test]
    async fn test_none_when_no_progression_button() {
        let bar = FakeBar::showing(&["Back", "Close"]);
        assert_eq!(click_progression_button(&bar).await.unwrap(), None);
        assert!(bar.pressed.borrow().is_empty());
    }
}
