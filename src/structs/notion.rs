use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// database query / block children 共用的分頁回應
#[derive(Debug, Deserialize)]
pub struct PaginatedList<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: PageProperties,
    pub cover: Option<FileObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Title")]
    pub title: Option<TitleProperty>,
    #[serde(rename = "Slug")]
    pub slug: Option<RichTextProperty>,
    #[serde(rename = "Summary")]
    pub summary: Option<RichTextProperty>,
    #[serde(rename = "Date")]
    pub date: Option<DateProperty>,
    #[serde(rename = "Tags")]
    pub tags: Option<MultiSelectProperty>,
    #[serde(rename = "Status")]
    pub status: Option<SelectProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<RichTextSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextProperty {
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateProperty {
    pub date: Option<DateValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateValue {
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiSelectProperty {
    #[serde(default)]
    pub multi_select: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectProperty {
    pub select: Option<SelectOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// page cover 與 image block 共用的檔案參照
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileObject {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub external: Option<FileUrl>,
    pub file: Option<FileUrl>,
}

impl FileObject {
    /// 依 `type` 選擇 external 或 Notion 託管的 file 網址
    pub fn url(&self) -> Option<&str> {
        let external = self.external.as_ref().map(|f| f.url.as_str());
        let hosted = self.file.as_ref().map(|f| f.url.as_str());

        let url = match self.kind.as_deref() {
            Some("external") => external,
            Some("file") => hosted,
            _ => external.or(hosted),
        };

        url.filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextSpan {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub annotations: Annotations,
    pub href: Option<String>,
}

#[cfg(test)]
impl RichTextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Default::default()
        }
    }
}

/// 串接所有 span 的純文字
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|span| span.plain_text.as_str()).collect()
}

/// 尚未解碼的 block，保留原始 payload 讓單一 block 的錯誤不影響整份文件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotionBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[cfg(test)]
impl NotionBlock {
    pub fn new(kind: &str, payload: Value) -> Self {
        let mut map = Map::new();
        map.insert(kind.to_string(), payload);
        Self {
            id: String::new(),
            kind: Some(kind.to_string()),
            payload: map,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatabaseQuery<'a> {
    pub filter: Value,
    pub sorts: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<&'a str>,
    pub page_size: u32,
}
