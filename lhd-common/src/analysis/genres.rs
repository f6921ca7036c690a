//! Genre tallies for the top-artists bar chart

use serde::Serialize;
use std::collections::HashMap;

/// Occurrences of one genre across the artist list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    /// Title-cased genre name
    pub genre: String,
    pub count: usize,
}

/// Count genres across artists
///
/// Raw genre strings are counted first and title-cased afterwards. Output is
/// ordered by first occurrence.
pub fn count_genres<'a, I, G>(genre_lists: I) -> Vec<GenreCount>
where
    I: IntoIterator<Item = G>,
    G: IntoIterator<Item = &'a String>,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();

    for genre in genre_lists.into_iter().flatten() {
        let count = counts.entry(genre.as_str()).or_insert_with(|| {
            order.push(genre.as_str());
            0
        });
        *count += 1;
    }

    order
        .into_iter()
        .map(|genre| GenreCount {
            genre: title_case(genre),
            count: counts[genre],
        })
        .collect()
}

/// Capitalise the first letter of every word, lower-case the rest
///
/// A "word" starts after any non-alphabetic character, so
/// `"k-pop"` becomes `"K-Pop"` and `"hip hop"` becomes `"Hip Hop"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}
