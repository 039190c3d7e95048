//! Splitting a thread's source into instructions.
//!
//! Every remaining line is one atomic instruction. Parsing is total: anything
//! that is not a comment or blank is kept verbatim.

use std::slice::Iter;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Same-line `/* … */` comment. `.` does not match a line break, so block
    /// comments spanning lines are left in place.
    static ref BLOCK_COMMENT: Regex = Regex::new(r"/\*.+?\*/").expect("valid pattern");
}

/// The ordered instructions of one simulated thread.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ThreadProgram {
    instructions: Vec<String>,
}

impl ThreadProgram {
    pub fn parse(src: &str) -> Self {
        let stripped = BLOCK_COMMENT.replace_all(src, "");
        let instructions = stripped
            .split('\n')
            .filter(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("//")
            })
            .map(str::to_owned)
            .collect();
        ThreadProgram { instructions }
    }

    #[inline]
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, String> {
        self.instructions.iter()
    }
}

impl From<&str> for ThreadProgram {
    #[inline]
    fn from(src: &str) -> Self {
        ThreadProgram::parse(src)
    }
}

impl FromIterator<String> for ThreadProgram {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        ThreadProgram {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl AsRef<[String]> for ThreadProgram {
    #[inline]
    fn as_ref(&self) -> &[String] {
        &self.instructions
    }
}

impl<'a> IntoIterator for &'a ThreadProgram {
    type Item = &'a String;
    type IntoIter = Iter<'a, String>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
