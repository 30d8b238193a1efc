//! Indentation-aware text emission.
//!
//! [`CodePrinter`] is the emission context threaded through conversion
//! rendering: expressions come back as strings while supporting
//! statements (temporaries, guards, scoped resources) are printed into the
//! printer in order.

const INDENT: &str = "  ";

#[derive(Debug, Clone, Default)]
pub struct CodePrinter {
    contents: String,
    indentation: usize,
}

impl CodePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print `text` followed by a newline. Every line of a multi-line
    /// string is indented at the current level; blank lines stay empty.
    pub fn print(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().split('\n') {
            if !line.is_empty() {
                for _ in 0..self.indentation {
                    self.contents.push_str(INDENT);
                }
                self.contents.push_str(line);
            }
            self.contents.push('\n');
        }
    }

    pub fn print_empty_line(&mut self) {
        self.contents.push('\n');
    }

    /// Print `header {`, the indented body, then `}`.
    pub fn print_brace_block<R>(
        &mut self,
        header: impl AsRef<str>,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.print(format!("{} {{", header.as_ref()));
        self.indent();
        let result = body(self);
        self.outdent();
        self.print("}");
        result
    }

    pub fn indent(&mut self) {
        self.indentation += 1;
    }

    pub fn outdent(&mut self) {
        self.indentation = self.indentation.saturating_sub(1);
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Printed text so far.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn finalize(self) -> String {
        self.contents
    }
}
