use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

/// A fenced code block grammar for one language: an opener made of three
/// backticks and the language tag, the content, and a closer made of three
/// backticks.
///
/// Whitespace right after the opener and right before the closer is not
/// part of the content. The content itself may span any number of lines.
#[derive(Clone, Debug)]
pub struct CodeFence {
    opener: String,
    extension: String,
    pattern: Regex,
}

impl CodeFence {
    /// Creates a fence for blocks tagged with `tag`, whose saved files use
    /// `extension` (without the leading dot).
    pub fn new(tag: &str, extension: &str) -> Self {
        let opener = format!("```{tag}");
        let pattern = format!(r"(?s){}\s*(.*?)\s*```", regex::escape(&opener));
        Self {
            opener,
            extension: extension.to_owned(),
            pattern: Regex::new(&pattern).expect("escaped fence pattern"),
        }
    }

    /// Creates a fence for Python blocks.
    #[inline]
    pub fn python() -> Self {
        Self::new("python", "py")
    }

    /// Returns the opening delimiter, e.g. ```` ```python ````.
    #[inline]
    pub fn opener(&self) -> &str {
        &self.opener
    }

    /// Returns the file extension for saved blocks.
    #[inline]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Checks whether `text` contains the opening delimiter at all.
    ///
    /// This is a cheap pre-check; the block may still be incomplete.
    #[inline]
    pub fn appears_in(&self, text: &str) -> bool {
        text.contains(&self.opener)
    }

    /// Returns the content of the first complete block in `text`.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Writes the content of the first complete block in `text` to `path`,
    /// replacing any existing file.
    ///
    /// Returns `Ok(None)` without touching the filesystem when there is no
    /// complete block.
    pub fn save<P: AsRef<Path>>(
        &self,
        text: &str,
        path: P,
    ) -> io::Result<Option<PathBuf>> {
        let path = path.as_ref();
        let Some(code) = self.extract(text) else {
            debug!("no {} block found", self.opener);
            return Ok(None);
        };
        fs::write(path, code)?;
        debug!("saved {} bytes to {}", code.len(), path.display());
        Ok(Some(path.to_path_buf()))
    }
}

impl Default for CodeFence {
    #[inline]
    fn default() -> Self {
        Self::python()
    }
}
