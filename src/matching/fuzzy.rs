/// Similarity score between two strings on a 0..=100 scale.
///
/// Indel ratio: twice the longest common subsequence over the combined length,
/// rounded. Equal strings score 100 and an empty side against a non-empty one
/// scores 0. The scorer is symmetric and does not case-fold: callers lower-case
/// (or use [`super::comparison_key`]) before scoring.
///
/// ```
/// use bookarr::matching::similarity;
///
/// assert_eq!(similarity("tolkien", "tolkien"), 100);
/// assert_eq!(similarity("abc", "xyz"), 0);
/// assert_eq!(similarity("iain banks", "iain m banks"), 91);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn similarity(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let ratio = rapidfuzz::fuzz::ratio(a.chars(), b.chars());
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
