//! Answer scoring: edit-distance similarity, the correctness policy, and
//! positional character diffs for feedback.

use serde::{Deserialize, Serialize};

/// Similarity at or above which a non-identical answer is accepted.
pub const CORRECT_THRESHOLD: f64 = 0.9;

/// Similarity below which two strings are shown whole instead of character by character.
pub const UNRELATED_THRESHOLD: f64 = 0.3;

/// Similarity above which a wrong answer gets a character hint.
pub const HINT_THRESHOLD: f64 = 0.2;

/// Calculate Levenshtein distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Use two rows instead of full matrix for memory efficiency
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };

            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Normalized similarity in `[0, 1]`: `(max_len - distance) / max_len`.
///
/// Both empty is `1.0`; exactly one empty is `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Outcome of judging one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    pub similarity: f64,
}

/// Judge an answer against the reference, ignoring case.
///
/// Correct when the lower-cased strings are equal or their similarity reaches
/// [`CORRECT_THRESHOLD`].
pub fn judge(user_answer: &str, reference_answer: &str) -> Verdict {
    let user = user_answer.to_lowercase();
    let reference = reference_answer.to_lowercase();

    let similarity = similarity(&user, &reference);
    Verdict {
        is_correct: user == reference || similarity >= CORRECT_THRESHOLD,
        similarity,
    }
}

/// Tag attached to a character in a positional diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffTag {
    /// Same character at the same position in both strings.
    Match,
    /// Character from the first (user) string with no positional match.
    MismatchA,
    /// Character from the second (reference) string with no positional match.
    MismatchB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedChar {
    pub ch: char,
    pub tag: DiffTag,
}

/// Both sides of a positional diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharDiff {
    pub a: Vec<TaggedChar>,
    pub b: Vec<TaggedChar>,
}

/// Compare `a` and `b` index by index, without shifting for insertions or deletions.
///
/// Positions past the end of one string contribute nothing to that side.
pub fn char_diff(a: &str, b: &str) -> CharDiff {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());

    let mut diff = CharDiff {
        a: Vec::with_capacity(a_chars.len()),
        b: Vec::with_capacity(b_chars.len()),
    };

    for i in 0..max_len {
        match (a_chars.get(i), b_chars.get(i)) {
            (Some(&ca), Some(&cb)) if ca == cb => {
                diff.a.push(TaggedChar { ch: ca, tag: DiffTag::Match });
                diff.b.push(TaggedChar { ch: cb, tag: DiffTag::Match });
            }
            (ca, cb) => {
                if let Some(&ch) = ca {
                    diff.a.push(TaggedChar { ch, tag: DiffTag::MismatchA });
                }
                if let Some(&ch) = cb {
                    diff.b.push(TaggedChar { ch, tag: DiffTag::MismatchB });
                }
            }
        }
    }

    diff
}

/// Feedback comparison between an answer and the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Comparison {
    /// Both strings are the same.
    Identical { text: String },
    /// Too different for a character view to help.
    Unrelated { user: String, reference: String },
    /// Positional character comparison.
    Aligned { diff: CharDiff },
}

/// Choose how to present `user` against `reference`.
pub fn compare(user: &str, reference: &str) -> Comparison {
    if user == reference {
        return Comparison::Identical {
            text: reference.to_string(),
        };
    }

    if similarity(user, reference) < UNRELATED_THRESHOLD {
        return Comparison::Unrelated {
            user: user.to_string(),
            reference: reference.to_string(),
        };
    }

    Comparison::Aligned {
        diff: char_diff(user, reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(side: &[TaggedChar]) -> Vec<DiffTag> {
        side.iter().map(|c| c.tag).collect()
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("saturday", "sunday"), 3);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("c\u{1ea3}m \u{1a1}n", "cam on"), 2);
    }

    #[test]
    fn test_similarity_edges() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "hello"), 0.0);
        assert_eq!(similarity("hello", ""), 0.0);
        for s in ["a", "hello", "thank you", "tạm biệt"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_similarity_is_normalized_distance() {
        assert_eq!(similarity("helo", "hello"), 0.8);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let s = similarity("kitten", "sitting");
        assert!((s - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("hello", "helo"),
            ("goodbye", "good bye"),
            ("thank you", "thanks"),
            ("", "x"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_judge_exact_and_case() {
        let verdict = judge("hello", "hello");
        assert!(verdict.is_correct);
        assert_eq!(verdict.similarity, 1.0);

        assert!(judge("HeLLo", "hello").is_correct);
    }

    #[test]
    fn test_judge_threshold() {
        // 12 of 13 characters survive one edit: above the threshold
        let verdict = judge("accomodation", "accommodation");
        assert!(verdict.is_correct);
        assert!(verdict.similarity >= CORRECT_THRESHOLD);

        // One edit on five characters is 0.8: below it
        let verdict = judge("helo", "hello");
        assert!(!verdict.is_correct);
        assert_eq!(verdict.similarity, 0.8);

        assert!(!judge("xyz", "hello").is_correct);
    }

    #[test]
    fn test_judge_is_pure() {
        let first = judge("thank yu", "Thank you");
        let second = judge("thank yu", "Thank you");
        assert_eq!(first, second);
    }

    #[test]
    fn test_char_diff_positional() {
        let diff = char_diff("helo", "hello");
        assert_eq!(
            tags(&diff.a),
            vec![DiffTag::Match, DiffTag::Match, DiffTag::Match, DiffTag::MismatchA]
        );
        assert_eq!(
            tags(&diff.b),
            vec![
                DiffTag::Match,
                DiffTag::Match,
                DiffTag::Match,
                DiffTag::MismatchB,
                DiffTag::MismatchB
            ]
        );
        assert_eq!(diff.b.iter().map(|c| c.ch).collect::<String>(), "hello");
    }

    #[test]
    fn test_char_diff_does_not_realign() {
        // A missing first letter shifts every later position
        let diff = char_diff("ello", "hello");
        assert!(diff.a.iter().all(|c| c.tag == DiffTag::MismatchA));
        assert!(diff.b.iter().all(|c| c.tag == DiffTag::MismatchB));
    }

    #[test]
    fn test_char_diff_empty_side() {
        let diff = char_diff("", "abc");
        assert!(diff.a.is_empty());
        assert_eq!(diff.b.len(), 3);
    }

    #[test]
    fn test_compare_modes() {
        assert_eq!(
            compare("hello", "hello"),
            Comparison::Identical { text: "hello".into() }
        );
        assert!(matches!(compare("xyz", "hello"), Comparison::Unrelated { .. }));
        assert!(matches!(compare("helo", "hello"), Comparison::Aligned { .. }));
    }
}
