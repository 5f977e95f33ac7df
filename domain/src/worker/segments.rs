//! Turning a flat transcript plus speaker turns into timed segments.

use entity_api::transcription_segment::SegmentInput;
use speech_ai::types::diarization::Diarization;

pub(crate) fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0) as i64
}

/// Splits the words of `text` across `n` slices by word-count ratio.
///
/// Slice `i` gets words `[i*total/n, (i+1)*total/n)`, so the last slice always ends at
/// the final word.
pub(crate) fn distribute_words(text: &str, n: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let total = words.len();

    (0..n)
        .map(|i| {
            let start = i * total / n;
            let end = ((i + 1) * total / n).min(total);
            words[start..end].join(" ")
        })
        .collect()
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Whether `text` contains any of `fillers` as whole words, ignoring case and punctuation.
pub(crate) fn has_filler(text: &str, fillers: &[String]) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(normalize)
        .filter(|word| !word.is_empty())
        .collect();

    fillers.iter().any(|filler| {
        let needle: Vec<String> = filler.split_whitespace().map(normalize).collect();
        !needle.is_empty() && words.windows(needle.len()).any(|window| window == needle.as_slice())
    })
}

/// One segment per speaker turn, each carrying its proportional share of the transcript.
pub(crate) fn from_diarization(
    text: &str,
    diarization: &Diarization,
    fillers: &[String],
) -> Vec<SegmentInput> {
    let slices = distribute_words(text, diarization.segments.len());

    diarization
        .segments
        .iter()
        .zip(slices)
        .map(|(turn, slice)| SegmentInput {
            speaker_id: Some(turn.speaker.clone()),
            start_time_ms: seconds_to_ms(turn.start),
            end_time_ms: seconds_to_ms(turn.end),
            has_fillers: has_filler(&slice, fillers),
            text: slice,
        })
        .collect()
}

/// The whole transcript as one unattributed segment at `[0, 0]`.
pub(crate) fn single(text: &str, has_fillers: bool) -> SegmentInput {
    SegmentInput {
        speaker_id: None,
        start_time_ms: 0,
        end_time_ms: 0,
        text: text.to_string(),
        has_fillers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_ai::types::diarization::DiarizationSegment;

    fn turn(speaker: &str, start: f64, end: f64) -> DiarizationSegment {
        DiarizationSegment {
            speaker: speaker.to_string(),
            start,
            end,
            duration: end - start,
        }
    }

    #[test]
    fn ten_words_over_two_segments_split_in_half() {
        let slices = distribute_words("w0 w1 w2 w3 w4 w5 w6 w7 w8 w9", 2);
        assert_eq!(slices, vec!["w0 w1 w2 w3 w4", "w5 w6 w7 w8 w9"]);
    }

    #[test]
    fn uneven_split_loses_no_words() {
        let slices = distribute_words("a b c d e f g", 3);
        assert_eq!(slices, vec!["a b", "c d", "e f g"]);
        assert_eq!(slices.join(" "), "a b c d e f g");
    }

    #[test]
    fn more_segments_than_words_leaves_some_empty() {
        let slices = distribute_words("hello world", 3);
        assert_eq!(slices, vec!["", "hello", "world"]);
        assert!(distribute_words("anything", 0).is_empty());
    }

    #[test]
    fn filler_matching_ignores_case_and_punctuation() {
        let fillers = vec!["ну".to_string(), "как бы".to_string()];
        assert!(has_filler("Ну, давайте начнём", &fillers));
        assert!(has_filler("это, Как бы, важно", &fillers));
        assert!(!has_filler("нужно начать", &fillers));
        assert!(!has_filler("как мы", &fillers));
    }

    #[test]
    fn diarized_segments_carry_speaker_timing_and_words() {
        let diarization = Diarization {
            segments: vec![turn("SPEAKER_00", 0.0, 2.5), turn("SPEAKER_01", 2.5, 5.0123)],
            num_speakers: 2,
        };

        let segments = from_diarization("ну привет всем добрый день", &diarization, &["ну".to_string()]);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker_id.as_deref(), Some("SPEAKER_00"));
        assert_eq!(segments[0].text, "ну привет");
        assert!(segments[0].has_fillers);
        assert_eq!(segments[1].start_time_ms, 2500);
        assert_eq!(segments[1].end_time_ms, 5012);
        assert_eq!(segments[1].text, "всем добрый день");
        assert!(!segments[1].has_fillers);
    }

    #[test]
    fn single_segment_spans_zero_to_zero() {
        let segment = single("hello world", false);
        assert_eq!((segment.start_time_ms, segment.end_time_ms), (0, 0));
        assert_eq!(segment.speaker_id, None);
        assert_eq!(segment.text, "hello world");
    }
}
