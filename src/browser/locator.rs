//! 要素の探し方（ロール・名前・テキスト）
//!
//! 候補要素はページ側のスクリプトで列挙して番号を振り、
//! どれを使うかの判定はRust側で行う。

use regex::Regex;

lazy_static::lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NEVER: Regex = Regex::new(r"[^\s\S]").unwrap();
}

/// 候補に振る番号の属性名
pub const INDEX_ATTR: &str = "data-pop-idx";

/// 空白を1つにまとめて前後を除去
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// 大文字小文字を無視した部分一致パターン（空白の差は無視）
pub fn name_pattern(name: &str) -> Regex {
    let escaped = collapse_whitespace(name)
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!("(?i){}", escaped)).unwrap_or_else(|_| NEVER.clone())
}

/// 要素の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Button,
    Img,
}

impl Role {
    pub fn css(&self) -> &'static str {
        match self {
            Role::Button => {
                r#"button, [role="button"], input[type="submit"], input[type="button"]"#
            }
            Role::Img => r#"img, [role="img"], svg[aria-label]"#,
        }
    }
}

/// 候補の名前の取り方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// aria-label → alt → title → テキスト → value
    Accessible,
    /// title属性
    Title,
    /// テキスト全体
    Text,
}

impl NameSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameSource::Accessible => "accessible",
            NameSource::Title => "title",
            NameSource::Text => "text",
        }
    }
}

/// ページ側で列挙した候補
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Candidate {
    pub name: String,
    pub visible: bool,
}

/// 要素の検索条件
#[derive(Debug, Clone)]
pub struct Query {
    pub css: String,
    pub name: Option<Regex>,
    pub source: NameSource,
    pub visible_only: bool,
    pub nth: usize,
    pub description: String,
}

impl Query {
    /// ロールと名前で探す（非表示の要素は除く）
    pub fn role(role: Role, name: &str) -> Self {
        Self {
            css: role.css().to_string(),
            name: Some(name_pattern(name)),
            source: NameSource::Accessible,
            visible_only: true,
            nth: 0,
            description: format!("{:?} \"{}\"", role, name),
        }
    }

    /// title属性で探す
    pub fn title(title: &str) -> Self {
        Self {
            css: "[title]".to_string(),
            name: Some(name_pattern(title)),
            source: NameSource::Title,
            visible_only: true,
            nth: 0,
            description: format!("title \"{}\"", title),
        }
    }

    /// CSSで絞り、テキストを含むものを探す
    pub fn css_with_text(css: &str, text: &str) -> Self {
        Self {
            css: css.to_string(),
            name: Some(name_pattern(text)),
            source: NameSource::Text,
            visible_only: false,
            nth: 0,
            description: format!("{} has text \"{}\"", css, text),
        }
    }

    /// CSSのみ
    pub fn css(css: &str) -> Self {
        Self {
            css: css.to_string(),
            name: None,
            source: NameSource::Text,
            visible_only: false,
            nth: 0,
            description: css.to_string(),
        }
    }

    /// 表示中の要素に限定
    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn nth(mut self, n: usize) -> Self {
        self.nth = n;
        self
    }

    fn accepts(&self, candidate: &Candidate) -> bool {
        if self.visible_only && !candidate.visible {
            return false;
        }
        match &self.name {
            Some(re) => re.is_match(&collapse_whitespace(&candidate.name)),
            None => true,
        }
    }

    /// 条件に合う候補の番号（nth番目）
    pub fn select(&self, candidates: &[Candidate]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| self.accepts(c))
            .map(|(i, _)| i)
            .nth(self.nth)
    }
}

/// 候補を列挙して番号を振るスクリプト
pub const CANDIDATES_SCRIPT: &str = r#"
const [selector, source, attr] = arguments;
document.querySelectorAll('[' + attr + ']').forEach(e => e.removeAttribute(attr));
return Array.from(document.querySelectorAll(selector)).map((e, i) => {
  e.setAttribute(attr, String(i));
  let name = '';
  if (source === 'title') {
    name = e.getAttribute('title') || '';
  } else if (source === 'text') {
    name = e.textContent || '';
  } else {
    name = e.getAttribute('aria-label') || e.getAttribute('alt') || e.getAttribute('title')
      || (e.innerText || e.textContent || '').trim() || e.value || '';
  }
  const style = window.getComputedStyle(e);
  const visible = style.visibility !== 'hidden' && style.display !== 'none'
    && e.getClientRects().length > 0;
  return { name: String(name), visible };
});
"#;

/// ラベルから入力欄を探して印を付けるスクリプト
pub const LABEL_SCRIPT: &str = r#"
const [label, attr] = arguments;
const want = label.trim().toLowerCase();
document.querySelectorAll('[' + attr + ']').forEach(e => e.removeAttribute(attr));
let target = null;
for (const l of document.querySelectorAll('label')) {
  if ((l.textContent || '').trim().toLowerCase().includes(want) && l.control) {
    target = l.control;
    break;
  }
}
if (!target) {
  target = Array.from(document.querySelectorAll('input, textarea')).find(e =>
    [e.getAttribute('aria-label'), e.getAttribute('placeholder'), e.getAttribute('name')]
      .some(v => v && v.toLowerCase().includes(want)));
}
if (!target) return false;
target.setAttribute(attr, 'label');
return true;
"#;

/// 要素のtextContentを返すスクリプト
pub const TEXTS_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll(arguments[0])).map(e => e.textContent || '');
"#;

/// 自身のテキストに文字列を含む要素を探すスクリプト（大文字小文字無視）
pub const TEXT_SEARCH_SCRIPT: &str = r#"
const want = arguments[0].toLowerCase();
const skip = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'HEAD', 'TITLE']);
const out = [];
for (const e of document.body ? document.body.querySelectorAll('*') : []) {
  if (skip.has(e.tagName)) continue;
  const own = Array.from(e.childNodes)
    .filter(n => n.nodeType === Node.TEXT_NODE)
    .map(n => n.textContent)
    .join(' ')
    .replace(/\s+/g, ' ')
    .toLowerCase();
  if (own.includes(want)) out.push(e.textContent || '');
}
return out;
"#;

/// 読み込み完了か
pub const READY_SCRIPT: &str = "return document.readyState === 'complete';";

/// 本文に文字列が含まれるか
pub const BODY_CONTAINS_SCRIPT: &str =
    "return !!document.body && (document.body.innerText || '').includes(arguments[0]);";
