//! Indented code block fencing.
//!
//! Gogs renders lines indented by four spaces as code. Such runs are
//! wrapped in a fenced block with an explicit language so GitHub can
//! highlight them.

const INDENT: &str = "    ";

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Fences every maximal run of lines indented by at least four spaces.
///
/// Blank lines inside a run stay in the block; blank lines ending a run go
/// after the closing fence. Lines inside existing fences are left alone, so
/// the output is a fixed point.
#[must_use]
pub fn fence_indented_code(text: &str, language: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_fence = false;
    let mut in_block = false;
    let mut blanks = 0usize;

    for line in text.lines() {
        if in_block {
            if line.trim().is_empty() {
                blanks += 1;
                continue;
            }
            if line.starts_with(INDENT) {
                out.extend(std::iter::repeat_n("\n", blanks));
                blanks = 0;
                out.push_str(&line[INDENT.len()..]);
                out.push('\n');
                continue;
            }
            out.push_str("```\n");
            out.extend(std::iter::repeat_n("\n", blanks));
            blanks = 0;
            in_block = false;
        }

        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && line.starts_with(INDENT) && !line.trim().is_empty() {
            out.push_str("```");
            out.push_str(language);
            out.push('\n');
            out.push_str(&line[INDENT.len()..]);
            out.push('\n');
            in_block = true;
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    if in_block {
        out.push_str("```\n");
        out.extend(std::iter::repeat_n("\n", blanks));
    }

    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}
