use crate::{
    errors::BlockError,
    structs::notion::{FileObject, NotionBlock, RichTextSpan},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// 支援的 block 種類，其餘一律歸到 Unsupported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<RichTextSpan>),
    Heading {
        level: u8,
        text: Vec<RichTextSpan>,
    },
    BulletedListItem(Vec<RichTextSpan>),
    NumberedListItem(Vec<RichTextSpan>),
    Code {
        language: String,
        text: Vec<RichTextSpan>,
    },
    Image {
        url: String,
        caption: Vec<RichTextSpan>,
    },
    Quote(Vec<RichTextSpan>),
    Unsupported(String),
}

#[derive(Deserialize)]
struct TextPayload {
    rich_text: Vec<RichTextSpan>,
}

#[derive(Deserialize)]
struct CodePayload {
    rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Deserialize)]
struct ImagePayload {
    #[serde(flatten)]
    source: FileObject,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
}

impl TryFrom<&NotionBlock> for Block {
    type Error = BlockError;

    fn try_from(block: &NotionBlock) -> Result<Self, Self::Error> {
        let kind = block.kind.as_deref().ok_or(BlockError::MissingType)?;

        let decoded = match kind {
            "paragraph" => Block::Paragraph(payload::<TextPayload>(block, kind)?.rich_text),
            "heading_1" | "heading_2" | "heading_3" => Block::Heading {
                level: kind.as_bytes()[kind.len() - 1] - b'0',
                text: payload::<TextPayload>(block, kind)?.rich_text,
            },
            "bulleted_list_item" => {
                Block::BulletedListItem(payload::<TextPayload>(block, kind)?.rich_text)
            }
            "numbered_list_item" => {
                Block::NumberedListItem(payload::<TextPayload>(block, kind)?.rich_text)
            }
            "code" => {
                let code = payload::<CodePayload>(block, kind)?;
                Block::Code {
                    language: code.language.unwrap_or_default(),
                    text: code.rich_text,
                }
            }
            "image" => {
                let image = payload::<ImagePayload>(block, kind)?;
                let url = image
                    .source
                    .url()
                    .ok_or_else(|| BlockError::Malformed {
                        kind: kind.to_string(),
                        reason: "image has no url".to_string(),
                    })?
                    .to_string();
                Block::Image {
                    url,
                    caption: image.caption,
                }
            }
            "quote" => Block::Quote(payload::<TextPayload>(block, kind)?.rich_text),
            other => Block::Unsupported(other.to_string()),
        };

        Ok(decoded)
    }
}

fn payload<T: DeserializeOwned>(block: &NotionBlock, kind: &str) -> Result<T, BlockError> {
    let value = block
        .payload
        .get(kind)
        .ok_or_else(|| BlockError::MissingPayload {
            kind: kind.to_string(),
        })?;

    serde_json::from_value(value.clone()).map_err(|err| BlockError::Malformed {
        kind: kind.to_string(),
        reason: err.to_string(),
    })
}

/// 目錄項目，和文章一起存進資料庫
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub html: String,
    pub toc: Vec<TocEntry>,
}
