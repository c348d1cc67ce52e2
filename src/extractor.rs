//! 結果一覧から病名を抽出
//!
//! 構造的なセレクタを優先順に試し、どれも要素を返さなければ
//! 想定病名でのテキスト検索に切り替える。

use crate::browser::BrowserSession;
use crate::error::Result;
use pop_verify_common::{normalize_texts, ConditionProbe, ExtractionSource};

/// 結果画面への問い合わせ
#[allow(async_fn_in_trait)]
pub trait ResultView {
    /// CSSに一致する要素のテキスト（空のものも含む）
    async fn texts_by_css(&self, css: &str) -> Result<Vec<String>>;

    /// 自身のテキストに文字列を含む要素のテキスト（大文字小文字無視）
    async fn texts_containing(&self, needle: &str) -> Result<Vec<String>>;
}

impl ResultView for BrowserSession {
    async fn texts_by_css(&self, css: &str) -> Result<Vec<String>> {
        self.texts(css).await
    }

    async fn texts_containing(&self, needle: &str) -> Result<Vec<String>> {
        BrowserSession::texts_containing(self, needle).await
    }
}

/// 抽出結果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub source: ExtractionSource,
    /// 正規化済み（前後空白除去・小文字）の病名
    pub conditions: Vec<String>,
}

/// 表示中の病名を抽出
pub async fn extract_conditions<V: ResultView>(view: &V, expected: &[String]) -> Result<Extraction> {
    for probe in ConditionProbe::ORDER {
        let texts = view.texts_by_css(probe.css()).await?;
        if !texts.is_empty() {
            tracing::debug!(%probe, elements = texts.len(), "condition probe matched");
            return Ok(Extraction {
                source: ExtractionSource::Probe(probe),
                conditions: normalize_texts(texts),
            });
        }
    }

    let mut found = Vec::new();
    for condition in expected.iter().filter(|c| !c.trim().is_empty()) {
        found.extend(view.texts_containing(condition.trim()).await?);
    }

    let source = if found.is_empty() {
        ExtractionSource::Nothing
    } else {
        ExtractionSource::TextSearch
    };

    Ok(Extraction {
        source,
        conditions: normalize_texts(found),
    })
}
