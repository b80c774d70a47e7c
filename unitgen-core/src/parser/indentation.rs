//! Logical-line indentation, checked the way CPython's tokenizer does it
//!
//! tree-sitter only looks at indentation where it changes block structure, so
//! an indented line that follows no block opener parses cleanly, and so does a
//! tab/space mix that means different things at tab sizes 1 and 8. Both are
//! caught here over the raw text. Lines inside brackets, strings or after a
//! backslash continuation are not logical line starts and are not measured.

/// Indentation width at tab size 8 (`col`) and tab size 1 (`alt_col`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Indent {
    col: usize,
    alt_col: usize,
}

impl Indent {
    /// Measure leading whitespace; returns the indent and its length in bytes
    fn measure(line: &str) -> (Indent, usize) {
        let mut indent = Indent::default();
        let mut width = 0;
        for ch in line.chars() {
            match ch {
                ' ' => {
                    indent.col += 1;
                    indent.alt_col += 1;
                }
                '\t' => {
                    indent.col = (indent.col / 8 + 1) * 8;
                    indent.alt_col += 1;
                }
                // form feed resets the column
                '\x0c' => indent = Indent::default(),
                _ => break,
            }
            width += 1;
        }
        (indent, width)
    }
}

#[derive(Debug, Clone, Copy)]
struct Quote {
    delimiter: char,
    triple: bool,
}

/// Tracks what a physical line leaves open for the next one
#[derive(Debug, Default)]
struct LineScanner {
    depth: usize,
    quote: Option<Quote>,
    continued: bool,
    last_significant: Option<char>,
}

impl LineScanner {
    fn at_logical_start(&self) -> bool {
        self.depth == 0 && self.quote.is_none() && !self.continued
    }

    fn scan(&mut self, line: &str) {
        self.continued = false;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];

            if let Some(quote) = self.quote {
                if ch == '\\' {
                    if i + 1 == chars.len() {
                        // escaped newline, the string goes on
                        return;
                    }
                    i += 2;
                    continue;
                }
                if ch == quote.delimiter {
                    if !quote.triple {
                        self.quote = None;
                    } else if chars[i..].starts_with(&[ch, ch, ch]) {
                        self.quote = None;
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            match ch {
                '#' => break,
                '\'' | '"' => {
                    let triple = chars[i..].starts_with(&[ch, ch, ch]);
                    self.quote = Some(Quote {
                        delimiter: ch,
                        triple,
                    });
                    self.last_significant = Some(ch);
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                '\\' if i + 1 == chars.len() => {
                    self.continued = true;
                    return;
                }
                _ => {}
            }
            if !ch.is_whitespace() {
                self.last_significant = Some(ch);
            }
            i += 1;
        }

        // Only triple-quoted strings span lines without a backslash
        if self.quote.is_some_and(|quote| !quote.triple) {
            self.quote = None;
        }
    }
}

/// Report the first logical line whose indentation CPython rejects
///
/// Returns the 1-indexed line and the 1-indexed column of its first token.
pub(super) fn check_indentation(source: &str) -> Option<(u32, u32)> {
    let mut stack = vec![Indent::default()];
    let mut scanner = LineScanner::default();
    let mut opens_block = false;

    for (index, raw_line) in source.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let mut rest = line;

        if scanner.at_logical_start() {
            let (indent, width) = Indent::measure(line);
            rest = &line[width..];
            // Blank and comment-only lines do not take part in indentation
            if rest.is_empty() || rest.starts_with('#') {
                continue;
            }
            if !accept_indent(&mut stack, indent, opens_block) {
                return Some((index as u32 + 1, width as u32 + 1));
            }
        }

        scanner.scan(rest);
        if scanner.at_logical_start() {
            opens_block = scanner.last_significant == Some(':');
        }
    }

    None
}

/// Apply one logical line's indent to the stack of open blocks
fn accept_indent(stack: &mut Vec<Indent>, indent: Indent, opens_block: bool) -> bool {
    let top = stack.last().copied().unwrap_or_default();

    if indent.col > top.col {
        // Must open a block, and must also be deeper at tab size 1
        if !opens_block || indent.alt_col <= top.alt_col {
            return false;
        }
        stack.push(indent);
        return true;
    }

    // A block opener needs an indented body
    if opens_block {
        return false;
    }

    while stack.len() > 1 && stack.last().is_some_and(|open| indent.col < open.col) {
        stack.pop();
    }
    stack.last() == Some(&indent)
}
