use super::Match;

/// Drop matches that are small compared to the changed text around them, so
/// the surrounding change is reported as one replacement.
///
/// `matches` must end with the zero-size sentinel; the last entry is always
/// kept. A match is kept when it touches its previous or next neighbour, or
/// when its length in characters exceeds `threshold` times the larger of the
/// two distances (old side, new side) between those neighbours.
pub fn remove_orphans(matches: &[Match], old_words: &[String], new_words: &[String], threshold: f64) -> Vec<Match> {
    let Some((&last, candidates)) = matches.split_last() else {
        return Vec::new();
    };

    let mut kept = Vec::with_capacity(matches.len());
    let mut previous = Match::new(0, 0, 0);

    for (index, &current) in candidates.iter().enumerate() {
        let next = matches[index + 1];

        let touches_previous =
            previous.end_in_old() == current.start_in_old && previous.end_in_new() == current.start_in_new;
        let touches_next = current.end_in_old() == next.start_in_old && current.end_in_new() == next.start_in_new;

        if touches_previous || touches_next {
            kept.push(current);
        } else {
            let old_distance = char_len(&old_words[previous.end_in_old()..next.start_in_old]);
            let new_distance = char_len(&new_words[previous.end_in_new()..next.start_in_new]);
            let match_length = char_len(&new_words[current.start_in_new..current.end_in_new()]);

            if match_length as f64 > old_distance.max(new_distance) as f64 * threshold {
                kept.push(current);
            } else {
                tracing::trace!(
                    old = current.start_in_old,
                    new = current.start_in_new,
                    size = current.size,
                    "dropped orphan match"
                );
            }
        }
        // measured from the last examined match, kept or not
        previous = current;
    }

    kept.push(last);
    kept
}

fn char_len(words: &[String]) -> usize {
    words.iter().map(|w| w.chars().count()).sum()
}
