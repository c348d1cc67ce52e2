use pop_verify_common::LocationId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopVerifyError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログイン情報が設定されていません。`POP_USERNAME` / `POP_PASSWORD` または config.json で設定してください")]
    MissingCredentials,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フィクスチャ読み込みエラー: {0}")]
    FixtureLoad(String),

    #[error("シートが見つかりません: {sheet}（存在するシート: {}）", .available.join(", "))]
    SheetNotFound { sheet: String, available: Vec<String> },

    #[error("Location {location} / Anatomy \"{anatomy}\" に一致する行がExcelにありません")]
    NoMatchingRows { location: LocationId, anatomy: String },

    #[error(
        "Location {location} 地点{point} ({x}, {y}) で Proceed/Continue/Next ボタンが見つかりません（表示中のボタン: [{}]）",
        .visible_buttons.join(", ")
    )]
    NoActionableButton {
        location: LocationId,
        point: usize,
        x: f64,
        y: f64,
        visible_buttons: Vec<String>,
    },

    #[error("WebDriverエラー: {0}")]
    WebDriver(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("Excel書き込みエラー: {0}")]
    ExcelWrite(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pop_verify_common::Error),
}

impl From<fantoccini::error::CmdError> for PopVerifyError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        PopVerifyError::WebDriver(e.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for PopVerifyError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        PopVerifyError::WebDriver(format!("セッション開始失敗: {}", e))
    }
}

impl From<calamine::Error> for PopVerifyError {
    fn from(e: calamine::Error) -> Self {
        PopVerifyError::FixtureLoad(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for PopVerifyError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PopVerifyError::ExcelWrite(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PopVerifyError>;
