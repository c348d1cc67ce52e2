//! 結果一覧の抽出に使うセレクタ群
//!
//! 画面のマークアップは固定されていないため、優先順に試して
//! 最初に要素が見つかったものを採用する。

/// 構造的なセレクタ（優先順）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionProbe {
    /// 結果アイテム専用の属性
    ResultItem,
    /// data-testid に "condition" を含む
    TestIdContains,
    /// class に "condition" を含む
    ClassContains,
    /// 汎用のリスト要素
    ListItem,
}

impl ConditionProbe {
    /// 試行順
    pub const ORDER: [ConditionProbe; 4] = [
        ConditionProbe::ResultItem,
        ConditionProbe::TestIdContains,
        ConditionProbe::ClassContains,
        ConditionProbe::ListItem,
    ];

    pub fn css(&self) -> &'static str {
        match self {
            ConditionProbe::ResultItem => r#"[data-testid="condition-item"]"#,
            ConditionProbe::TestIdContains => r#"[data-testid*="condition"]"#,
            ConditionProbe::ClassContains => r#"[class*="condition"]"#,
            ConditionProbe::ListItem => r#"ul > div, ul > li, [role="listitem"]"#,
        }
    }
}

impl std::fmt::Display for ConditionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css())
    }
}

/// どの方法で病名を取得したか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSource {
    Probe(ConditionProbe),
    /// 想定病名でのテキスト検索
    TextSearch,
    /// 何も見つからなかった
    Nothing,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionSource::Probe(p) => write!(f, "selector {}", p),
            ExtractionSource::TextSearch => write!(f, "text search"),
            ExtractionSource::Nothing => write!(f, "none"),
        }
    }
}

/// 要素テキストを正規化し、空のものを除く
pub fn normalize_texts<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| crate::types::normalize_text(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}
