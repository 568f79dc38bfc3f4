//! Name corpora read from plain-text files.
//!
//! Place-name files hold one candidate per line. Pair files hold two
//! tab-separated words per line; lines that do not split into exactly two
//! fields are skipped with a warning.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::settings::MapSettings;

/// Non-blank lines of a place-name file, kept as written.
pub fn load_place_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// Tab-separated word pairs. Trailing empty fields are dropped before
/// counting, so `"a\tb\t"` is still a pair.
pub fn read_string_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let mut pairs = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts: Vec<&str> = line.split('\t').collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        match parts.as_slice() {
            [first, second] => pairs.push((first.to_string(), second.to_string())),
            _ => warn!(file = %path.display(), line = i + 1, "no string pair found"),
        }
    }
    Ok(pairs)
}

/// Everything read from the configured books.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Corpus {
    pub place_names: Vec<String>,
    pub noun_adjectives: Vec<(String, String)>,
    pub noun_verbs: Vec<(String, String)>,
}

impl Corpus {
    /// Read `<book>_place_names.txt`, `<book>_noun_adjective_pairs.txt` and
    /// `<book>_noun_verb_pairs.txt` for every book in the settings.
    pub fn load(settings: &MapSettings) -> Result<Self> {
        let mut corpus = Corpus::default();
        for book in &settings.books {
            let file = |suffix: &str| settings.corpus_dir.join(format!("{book}_{suffix}.txt"));

            let place_names = file("place_names");
            let names = load_place_names(&place_names).map_err(|_| {
                MapError::Configuration(format!(
                    "unable to read place name file {}. Is \"{book}\" a valid book?",
                    place_names.display()
                ))
            })?;
            corpus.place_names.extend(names);
            corpus
                .noun_adjectives
                .extend(read_string_pairs(&file("noun_adjective_pairs"))?);
            corpus.noun_verbs.extend(read_string_pairs(&file("noun_verb_pairs"))?);
        }
        debug!(
            place_names = corpus.place_names.len(),
            noun_adjectives = corpus.noun_adjectives.len(),
            noun_verbs = corpus.noun_verbs.len(),
            "loaded name corpus"
        );
        Ok(corpus)
    }

    pub fn is_empty(&self) -> bool {
        self.place_names.is_empty() && self.noun_adjectives.is_empty() && self.noun_verbs.is_empty()
    }
}
