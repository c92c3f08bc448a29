//! Greedy longest-match phrase merging.
//!
//! At each unconsumed position the widest window that forms a known phrase
//! is merged into one `_`-joined token and scanning resumes right after it.
//! Positions where no window of two or more tokens matches emit the token
//! unchanged. A dictionary with no phrases passes every token through.

use crate::dictionary::{PhraseDictionary, JOINER};
use crate::payload::{Payload, Segment};

/// Rewrite `tokens`, merging every recognized phrase run.
pub fn transform<S: AsRef<str>>(dictionary: &PhraseDictionary, tokens: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut candidate = String::new();
    let mut j = 0;
    while j < tokens.len() {
        let remaining = tokens.len() - j;
        let widest = dictionary.max_length().min(remaining);
        let mut consumed = 1;
        for width in (2..=widest).rev() {
            if !dictionary.has_length(width) {
                continue;
            }
            join_window(&tokens[j..j + width], &mut candidate);
            if dictionary.contains(width, &candidate) {
                consumed = width;
                break;
            }
        }
        if consumed > 1 {
            out.push(std::mem::take(&mut candidate));
        } else {
            out.push(tokens[j].as_ref().to_string());
        }
        j += consumed;
    }
    out
}

fn join_window<S: AsRef<str>>(window: &[S], buf: &mut String) {
    buf.clear();
    for (i, token) in window.iter().enumerate() {
        if i > 0 {
            buf.push(JOINER);
        }
        buf.push_str(token.as_ref());
    }
}

pub fn transform_segment(dictionary: &PhraseDictionary, segment: &Segment) -> Segment {
    Segment { id: segment.id, tokens: transform(dictionary, &segment.tokens) }
}

/// Apply [`transform`] to every segment, keeping ids and order.
pub fn transform_payload(dictionary: &PhraseDictionary, payload: &Payload) -> Payload {
    Payload {
        document_id: payload.document_id.clone(),
        segments: payload.segments.iter().map(|s| transform_segment(dictionary, s)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(phrases: &[(&str, i64)]) -> PhraseDictionary {
        let mut b = PhraseDictionary::builder();
        for (p, n) in phrases {
            b.insert(p, *n);
        }
        b.build()
    }

    fn run(d: &PhraseDictionary, input: &[&str]) -> Vec<String> {
        transform(d, input)
    }

    #[test]
    fn longest_match_wins() {
        let d = dict(&[("new_york", 2), ("new_york_city", 3)]);
        assert_eq!(run(&d, &["new", "york", "city"]), vec!["new_york_city"]);
        assert_eq!(run(&d, &["new", "york", "state"]), vec!["new_york", "state"]);
    }

    #[test]
    fn matches_do_not_overlap() {
        let d = dict(&[("a_b", 2)]);
        assert_eq!(run(&d, &["a", "b", "a", "b"]), vec!["a_b", "a_b"]);
        assert_eq!(run(&d, &["a", "a", "b", "b"]), vec!["a", "a_b", "b"]);
    }

    #[test]
    fn greedy_consumption_blocks_later_overlap() {
        let d = dict(&[("a_b", 2), ("b_c", 2)]);
        assert_eq!(run(&d, &["a", "b", "c"]), vec!["a_b", "c"]);
    }

    #[test]
    fn unmatched_tokens_pass_through_in_place() {
        let d = dict(&[("united_states", 2)]);
        assert_eq!(run(&d, &["the", "united", "states", "of", "america"]), vec![
            "the",
            "united_states",
            "of",
            "america"
        ]);
        assert_eq!(run(&d, &["nothing", "here"]), vec!["nothing", "here"]);
    }

    #[test]
    fn window_past_end_falls_back_to_shorter() {
        let d = dict(&[("x_y", 2), ("p_q_r_s", 4)]);
        assert_eq!(run(&d, &["z", "x", "y"]), vec!["z", "x_y"]);
    }

    #[test]
    fn gaps_in_lengths_are_misses() {
        let d = dict(&[("a_b", 2), ("a_b_c_d", 4)]);
        assert_eq!(run(&d, &["a", "b", "c"]), vec!["a_b", "c"]);
        assert_eq!(run(&d, &["a", "b", "c", "d"]), vec!["a_b_c_d"]);
    }

    #[test]
    fn empty_dictionary_is_identity() {
        let d = PhraseDictionary::empty();
        assert_eq!(d.max_length(), 0);
        assert_eq!(run(&d, &["new", "york", "city"]), vec!["new", "york", "city"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let d = dict(&[("a_b", 2)]);
        assert!(run(&d, &[]).is_empty());
    }

    #[test]
    fn payload_ids_and_order_survive() {
        let d = dict(&[("new_york", 2)]);
        let input = Payload::new("doc-7")
            .with_segment(Segment::new(9, ["in", "new", "york"]))
            .with_segment(Segment::new(2, ["new"]))
            .with_segment(Segment::new(5, Vec::<String>::new()));
        let out = transform_payload(&d, &input);
        assert_eq!(out.document_id, "doc-7");
        let ids: Vec<_> = out.segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
        assert_eq!(out.segments[0].tokens, vec!["in", "new_york"]);
        assert_eq!(out.segments[1].tokens, vec!["new"]);
        assert!(out.segments[2].tokens.is_empty());
    }
}
