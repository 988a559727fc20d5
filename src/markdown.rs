//! A small markdown subset for AI-generated text.
//!
//! Supports `#`..`######` headings, `*`/`-` bullet items, blank-line separated
//! paragraphs and `**strong**` spans. Everything else is kept as literal
//! text; nothing is ever interpreted as markup for another format.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Inline {
    Text(String),
    Strong(String),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    List(Vec<Vec<Inline>>),
    Paragraph(Vec<Inline>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

fn inlines(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if start > 0 {
            out.push(Inline::Text(rest[..start].to_string()));
        }
        out.push(Inline::Strong(after[..end].trim().to_string()));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        out.push(Inline::Text(rest.to_string()));
    }
    out
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..]
        .strip_prefix(' ')
        .map(|text| (level as u8, text.trim()))
}

fn bullet(line: &str) -> Option<&str> {
    line.strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))
        .map(str::trim)
}

pub fn parse(text: &str) -> Document {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<Inline> = Vec::new();
    let mut items: Vec<Vec<Inline>> = Vec::new();

    fn flush(blocks: &mut Vec<Block>, paragraph: &mut Vec<Inline>, items: &mut Vec<Vec<Inline>>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
        if !items.is_empty() {
            blocks.push(Block::List(std::mem::take(items)));
        }
    }

    for raw in text.lines() {
        let line = raw.trim();

        if line.is_empty() {
            flush(&mut blocks, &mut paragraph, &mut items);
        } else if let Some((level, content)) = heading(line) {
            flush(&mut blocks, &mut paragraph, &mut items);
            blocks.push(Block::Heading {
                level,
                content: inlines(content),
            });
        } else if let Some(item) = bullet(line) {
            if !paragraph.is_empty() {
                blocks.push(Block::Paragraph(std::mem::take(&mut paragraph)));
            }
            items.push(inlines(item));
        } else {
            if !items.is_empty() {
                blocks.push(Block::List(std::mem::take(&mut items)));
            }
            if !paragraph.is_empty() {
                paragraph.push(Inline::LineBreak);
            }
            paragraph.extend(inlines(line));
        }
    }
    flush(&mut blocks, &mut paragraph, &mut items);

    Document { blocks }
}

fn write_inlines(f: &mut fmt::Formatter<'_>, content: &[Inline]) -> fmt::Result {
    for inline in content {
        match inline {
            Inline::Text(t) | Inline::Strong(t) => f.write_str(t)?,
            Inline::LineBreak => f.write_str("\n")?,
        }
    }
    Ok(())
}

/// Plain terminal text: headings underlined, bullets as `  • item`.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match block {
                Block::Heading { content, .. } => {
                    let mut title = String::new();
                    for inline in content {
                        if let Inline::Text(t) | Inline::Strong(t) = inline {
                            title.push_str(t);
                        }
                    }
                    writeln!(f, "{title}")?;
                    writeln!(f, "{}", "-".repeat(title.chars().count()))?;
                }
                Block::List(items) => {
                    for item in items {
                        f.write_str("  • ")?;
                        write_inlines(f, item)?;
                        writeln!(f)?;
                    }
                }
                Block::Paragraph(content) => {
                    write_inlines(f, content)?;
                    writeln!(f)?;
                }
            }
        }
        Ok(())
    }
}
