use crate::{
    errors::BlockError,
    services::blocks::{render_block, Fragment, ListKind, Toc},
    structs::{
        blocks::{Block, ParsedDocument},
        notion::NotionBlock,
    },
};

/// 一次解析的累加狀態，每次呼叫 `parse_blocks` 都重新建立
#[derive(Default)]
struct ParseSession {
    html: String,
    toc: Toc,
    open_list: Option<ListKind>,
}

impl ParseSession {
    fn push(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Html(html) => {
                self.close_list();
                self.html.push_str(&html);
            }
            Fragment::ListItem { kind, html } => {
                if self.open_list != Some(kind) {
                    self.close_list();
                    self.html.push_str(&format!("<{}>", kind.tag()));
                    self.open_list = Some(kind);
                }
                self.html.push_str(&html);
            }
        }
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.open_list.take() {
            self.html.push_str(&format!("</{}>", kind.tag()));
        }
    }

    fn finish(mut self) -> ParsedDocument {
        self.close_list();
        ParsedDocument {
            html: self.html,
            toc: self.toc.into_entries(),
        }
    }
}

fn render_raw_block(raw: &NotionBlock, toc: &mut Toc) -> Result<Option<Fragment>, BlockError> {
    let block = Block::try_from(raw)?;
    Ok(render_block(&block, toc))
}

/// 依序渲染整份文件；單一 block 失敗只記錄並略過
pub fn parse_blocks(blocks: &[NotionBlock]) -> ParsedDocument {
    let mut session = ParseSession::default();

    for raw in blocks {
        match render_raw_block(raw, &mut session.toc) {
            Ok(Some(fragment)) => session.push(fragment),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("skip block {}: {}", raw.id, err);
            }
        }
    }

    session.finish()
}
