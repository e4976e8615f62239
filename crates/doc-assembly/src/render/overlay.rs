use lopdf::{Document, ObjectId};
use std::collections::BTreeMap;

use super::format::display_value;
use super::text::{encode_win_ansi, pdf_literal, text_width, wrap_text};
use super::{add_page_font, fmt_num, helvetica_font, page_box, pdf_error, RenderError};
use crate::mapping::{Alignment, OverlayTarget, PageBox, RenderOp, RenderPlan};

const OVERLAY_FONT: &str = "DAOvl";

/// One wrapped line positioned at its left edge and baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub text: String,
}

/// Wraps `text` for `target` and positions every line, rejecting any that leave `bounds`
/// or overflow the box.
pub fn layout_lines(
    key: &str,
    target: &OverlayTarget,
    text: &str,
    bounds: PageBox,
) -> Result<Vec<PlacedLine>, RenderError> {
    let line_height = target.effective_line_height();
    let mut placed = Vec::new();

    for (index, line) in wrap_text(text, target.font_size, target.max_width)
        .into_iter()
        .enumerate()
    {
        let width = text_width(&line, target.font_size);
        if width > target.max_width {
            return Err(RenderError::LineTooWide {
                key: key.to_string(),
                width,
                max_width: target.max_width,
            });
        }
        let x = match target.alignment {
            Alignment::Left => target.x,
            Alignment::Center => target.x - width / 2.0,
            Alignment::Right => target.x - width,
        };
        let y = target.y - index as f32 * line_height;

        if !bounds.contains(x, y) || !bounds.contains(x + width, y + target.font_size) {
            return Err(RenderError::OutOfBounds {
                key: key.to_string(),
                page: target.page,
                x,
                y,
            });
        }
        placed.push(PlacedLine { x, y, width, text: line });
    }
    Ok(placed)
}

pub(crate) fn draw(doc: &mut Document, plan: &RenderPlan) -> Result<(), RenderError> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut streams: BTreeMap<usize, Vec<u8>> = BTreeMap::new();

    for op in &plan.operations {
        let RenderOp::Draw { key, target, value } = op else {
            return Err(RenderError::FieldKindMismatch {
                field: op.key().to_string(),
                expected: "an overlay target",
                actual: "an acroform target",
            });
        };
        let page_id = pages
            .get(target.page)
            .copied()
            .ok_or(RenderError::PageOutOfRange {
                page: target.page,
                pages: pages.len(),
            })?;

        let text = display_value(value, plan.date_format);
        let lines = layout_lines(key, target, &text, page_box(doc, page_id))?;
        let stream = streams.entry(target.page).or_default();
        for line in lines {
            stream.extend_from_slice(
                format!(
                    "BT /{OVERLAY_FONT} {} Tf {} {} Td ",
                    fmt_num(target.font_size),
                    fmt_num(line.x),
                    fmt_num(line.y)
                )
                .as_bytes(),
            );
            stream.extend_from_slice(&pdf_literal(&encode_win_ansi(&line.text)));
            stream.extend_from_slice(b" Tj ET\n");
        }
    }

    if streams.values().all(Vec::is_empty) {
        return Ok(());
    }

    let font_id = helvetica_font(doc);
    for (page, body) in streams {
        if body.is_empty() {
            continue;
        }
        let page_id = pages[page];
        add_page_font(doc, page_id, OVERLAY_FONT, font_id)?;

        let mut content = b"q 0 g\n".to_vec();
        content.extend_from_slice(&body);
        content.extend_from_slice(b"Q\n");
        doc.add_page_contents(page_id, content).map_err(pdf_error)?;
    }
    Ok(())
}
