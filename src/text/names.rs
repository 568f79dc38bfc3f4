//! Label text sources.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::corpus::Corpus;

/// Supplies the words that go on the map. Each call consumes randomness, so
/// callers must ask for names in a fixed order to stay reproducible.
pub trait NameSource {
    /// A proper name for a land, region or sea.
    fn place_name(&mut self) -> String;
    /// A descriptive name such as "Grey Stone" for features.
    fn compiled_name(&mut self) -> String;
}

/// Place names longer than this multiple of the average are skipped.
pub const MAX_LENGTH_VS_AVERAGE: f64 = 2.0;

const BUILTIN_PLACE_NAMES: &[&str] = &[
    "Arvandor", "Belmarch", "Caldreth", "Dunmere", "Elsworth", "Fennick", "Galdor", "Harrowmere",
    "Ismere", "Jorvik", "Kelden", "Lorn", "Maradun", "Norwick", "Orlen", "Pellam", "Quarrow",
    "Ravenholt", "Sarn", "Tamsk", "Ulmar", "Vesk", "Wendmoor", "Yarrow",
];

const BUILTIN_NOUN_ADJECTIVES: &[(&str, &str)] = &[
    ("stone", "grey"),
    ("crown", "broken"),
    ("wolf", "white"),
    ("ash", "cold"),
    ("spire", "lonely"),
    ("thorn", "black"),
    ("hollow", "deep"),
    ("fire", "red"),
];

const BUILTIN_NOUN_VERBS: &[(&str, &str)] = &[
    ("wind", "howling"),
    ("water", "falling"),
    ("giant", "sleeping"),
    ("serpent", "winding"),
    ("bell", "ringing"),
    ("raven", "watching"),
];

/// Names drawn at random from a loaded corpus.
#[derive(Clone, Debug)]
pub struct CorpusNames {
    rng: ChaCha8Rng,
    place_names: Vec<String>,
    noun_adjectives: Vec<(String, String)>,
    noun_verbs: Vec<(String, String)>,
}

impl CorpusNames {
    pub fn new(rng: ChaCha8Rng, corpus: Corpus) -> Self {
        let corpus = if corpus.is_empty() { builtin() } else { corpus };
        Self {
            rng,
            place_names: filter_long_names(corpus.place_names),
            noun_adjectives: corpus.noun_adjectives,
            noun_verbs: corpus.noun_verbs,
        }
    }

    fn pick_pair(&mut self) -> Option<String> {
        let use_verbs = match (self.noun_adjectives.is_empty(), self.noun_verbs.is_empty()) {
            (true, true) => return None,
            (true, false) => true,
            (false, true) => false,
            (false, false) => self.rng.gen_bool(0.5),
        };
        let list = if use_verbs { &self.noun_verbs } else { &self.noun_adjectives };
        let (noun, word) = list.choose(&mut self.rng)?;
        Some(format!("{} {}", title_case(word), title_case(noun)))
    }
}

impl NameSource for CorpusNames {
    fn place_name(&mut self) -> String {
        self.place_names
            .choose(&mut self.rng)
            .map(|name| title_case(name))
            .unwrap_or_default()
    }

    fn compiled_name(&mut self) -> String {
        match self.pick_pair() {
            Some(name) => name,
            None => self.place_name(),
        }
    }
}

fn builtin() -> Corpus {
    let own = |pairs: &[(&str, &str)]| -> Vec<(String, String)> {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    };
    Corpus {
        place_names: BUILTIN_PLACE_NAMES.iter().map(|s| s.to_string()).collect(),
        noun_adjectives: own(BUILTIN_NOUN_ADJECTIVES),
        noun_verbs: own(BUILTIN_NOUN_VERBS),
    }
}

/// Drop names more than [`MAX_LENGTH_VS_AVERAGE`] times the average length.
fn filter_long_names(names: Vec<String>) -> Vec<String> {
    if names.is_empty() {
        return names;
    }
    let average = names.iter().map(|n| n.chars().count()).sum::<usize>() as f64 / names.len() as f64;
    let limit = average * MAX_LENGTH_VS_AVERAGE;
    names
        .into_iter()
        .filter(|n| n.chars().count() as f64 <= limit)
        .collect()
}

/// Capitalise the first letter of every word.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
