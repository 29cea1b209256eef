/// Accumulates markdown while keeping whitespace under control
///
/// Text runs collapse to single spaces, and block boundaries never stack
/// more than one blank line.
#[derive(Debug, Default)]
pub(crate) struct MarkdownWriter {
    buf: String,
}

impl MarkdownWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends document text, collapsing whitespace runs
    ///
    /// A leading space is dropped when the buffer already ends in whitespace.
    pub(crate) fn text(&mut self, text: &str) {
        let collapsed = collapse_runs(text);
        let content = if collapsed.starts_with(' ') && self.ends_with_whitespace() {
            &collapsed[1..]
        } else {
            collapsed.as_str()
        };
        self.buf.push_str(content);
    }

    /// Appends markdown syntax verbatim
    pub(crate) fn raw(&mut self, markdown: &str) {
        self.buf.push_str(markdown);
    }

    /// Ends the current block; the next content starts after one blank line
    pub(crate) fn block_break(&mut self) {
        let trimmed = self.buf.trim_end().len();
        self.buf.truncate(trimmed);
        if !self.buf.is_empty() {
            self.buf.push_str("\n\n");
        }
    }

    /// Markdown hard line break
    pub(crate) fn line_break(&mut self) {
        let trimmed = self.buf.trim_end_matches(' ').len();
        self.buf.truncate(trimmed);
        self.buf.push_str("  \n");
    }

    /// The accumulated markdown, untrimmed
    pub(crate) fn into_inner(self) -> String {
        self.buf
    }

    /// The accumulated markdown without leading or trailing blank lines
    pub(crate) fn finish(self) -> String {
        self.buf.trim().to_string()
    }

    fn ends_with_whitespace(&self) -> bool {
        self.buf.ends_with(' ') || self.buf.ends_with('\n')
    }
}

/// Replaces every whitespace run with one space, keeping edge spaces
fn collapse_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
