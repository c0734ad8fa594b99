use std::fs;
use std::ops::Deref;
use std::path::Path;

use fnv::FnvHashSet;
use lazy_static::lazy_static;

lazy_static! {
    /// The process wide stop-word set, loaded once from the bundled resource.
    pub static ref STOPWORDS: StopWords = default_stopwords();
}

#[cfg(feature = "stopwords")]
fn default_stopwords() -> StopWords {
    StopWords::from_file(Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/stopwords.txt"))
}

#[cfg(not(feature = "stopwords"))]
fn default_stopwords() -> StopWords {
    StopWords::default()
}

/// A set of words excluded from frequency ranking.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: FnvHashSet<String>,
}

impl Deref for StopWords {
    type Target = FnvHashSet<String>;

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl StopWords {
    /// Read stop-words from a newline delimited file.
    ///
    /// A missing or unreadable file yields an empty set, so filtering becomes
    /// a no-op instead of an error.
    pub fn from_file<T: AsRef<Path>>(path: T) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_lines(&content),
            Err(_) => StopWords::default(),
        }
    }

    pub fn from_words<I, T>(words: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.to_string().to_lowercase())
                .collect(),
        }
    }

    fn from_lines(content: &str) -> Self {
        Self {
            words: content
                .lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "stopwords")]
    #[test]
    fn bundled_stopwords_are_loaded() {
        assert!(STOPWORDS.contains("the"));
        assert!(STOPWORDS.contains("and"));
    }

    #[test]
    fn missing_file_yields_empty_set() {
        let words = StopWords::from_file("/definitely/not/here.txt");
        assert!(words.is_empty());
    }

    #[test]
    fn lines_are_normalized() {
        let words = StopWords::from_lines("The\n  and \n\nOR\n");
        assert!(words.contains("the"));
        assert!(words.contains("and"));
        assert!(words.contains("or"));
        assert_eq!(words.len(), 3);
    }
}
