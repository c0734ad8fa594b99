use fnv::FnvHashMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::stopwords::StopWords;

lazy_static! {
    /// Runs of at least two ASCII letters; applied to lowercased text.
    static ref TOKEN_RE: Regex = Regex::new("[A-Za-z]{2,}").unwrap();
}

/// Split `text` into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Word tokens followed by the adjacent-word bigrams built from them.
pub fn tokenize_with_bigrams(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let bigrams: Vec<String> = tokens
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect();
    tokens.into_iter().chain(bigrams).collect()
}

/// Return the `top_n` most frequent tokens after stop-word removal.
///
/// Ordering is frequency descending with first-occurrence tie-break, no
/// duplicates. When filtering removes every token the unfiltered counts are
/// ranked instead, so a snippet dominated by common words still yields data.
pub fn most_common(tokens: &[String], stopwords: &StopWords, top_n: usize) -> Vec<String> {
    let filtered: Vec<&String> = tokens
        .iter()
        .filter(|token| !stopwords.contains(token.as_str()))
        .collect();
    let pool: Vec<&String> = if filtered.is_empty() {
        tokens.iter().collect()
    } else {
        filtered
    };

    let mut counts: FnvHashMap<&str, usize> = FnvHashMap::default();
    let mut order: Vec<&String> = Vec::new();
    for token in pool {
        let count = counts.entry(token.as_str()).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    order.sort_by_key(|token| std::cmp::Reverse(counts[token.as_str()]));
    order.into_iter().take(top_n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords() -> StopWords {
        StopWords::from_words(vec!["the", "and", "of", "to", "new"])
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(tokenize("").is_empty());
        assert!(most_common(&[], &stopwords(), 10).is_empty());
    }

    #[test]
    fn tokens_are_lowercase_alphabetic() {
        let tokens = tokenize("Bitcoin hits $42,000 -- a 7% jump!");
        assert_eq!(tokens, vec!["bitcoin", "hits", "jump"]);
    }

    #[test]
    fn single_letters_are_dropped(){
        assert_eq!(tokenize("a b cd"), vec!["cd"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let tokens = tokenize_with_bigrams("alpha beta gamma");
        assert_eq!(
            tokens,
            vec!["alpha", "beta", "gamma", "alpha beta", "beta gamma"]
        );
    }

    #[test]
    fn ranked_by_frequency_then_first_occurrence() {
        let tokens = tokenize("cat dog cat bird dog cat");
        let ranked = most_common(&tokens, &stopwords(), 10);
        assert_eq!(ranked, vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn no_stopword_survives_filtering() {
        let tokens = tokenize("the price of bitcoin and the future of money");
        let ranked = most_common(&tokens, &stopwords(), 10);
        for token in &ranked {
            assert!(!stopwords().contains(token.as_str()), "{} is a stop-word", token);
        }
        assert!(ranked.contains(&"bitcoin".to_string()));
    }

    #[test]
    fn all_stopwords_falls_back_to_unfiltered() {
        let tokens = tokenize("the and the of");
        let ranked = most_common(&tokens, &stopwords(), 10);
        assert_eq!(ranked, vec!["the", "and", "of"]);
    }

    #[test]
    fn respects_top_n_and_dedup() {
        let tokens = tokenize("one two three four five one two");
        let ranked = most_common(&tokens, &stopwords(), 3);
        assert_eq!(ranked.len(), 3);
        let mut unique = ranked.clone();
        unique.dedup();
        assert_eq!(unique, ranked);
        assert!(most_common(&tokens, &stopwords(), 0).is_empty());
    }

    #[test]
    fn ranking_is_idempotent() {
        let tokens = tokenize_with_bigrams("bitcoin rally stalls as bitcoin miners sell");
        let first = most_common(&tokens, &stopwords(), 5);
        let second = most_common(&tokens, &stopwords(), 5);
        assert_eq!(first, second);
    }
}
