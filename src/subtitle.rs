use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^.!?\n]+[.!?]*").expect("sentence regex")
});

const MIN_CUE_SECONDS: f64 = 1.0;

/// Split a script into caption-sized sentences, collapsing whitespace.
pub fn split_sentences(script: &str) -> Vec<String> {
    SENTENCES
        .find_iter(script)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect()
}

fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

/// Build a WebVTT track for the script, spreading cues across the voiceover
/// duration proportionally to each sentence's length. Returns the document
/// and the number of cues.
pub fn build_webvtt(script: &str, total_secs: f64, language: Option<&str>) -> (String, usize) {
    let mut sentences = split_sentences(script);
    if sentences.is_empty() {
        sentences.push(script.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    let total_secs = total_secs.max(MIN_CUE_SECONDS);
    let total_weight: usize = sentences.iter().map(|s| s.chars().count().max(1)).sum();

    let mut doc = String::from("WEBVTT\nKind: captions\n");
    doc.push_str(&format!("Language: {}\n\n", language.unwrap_or("en-US")));

    let mut elapsed_weight = 0usize;
    let mut start = 0.0;
    for (idx, sentence) in sentences.iter().enumerate() {
        elapsed_weight += sentence.chars().count().max(1);
        let end = if idx + 1 == sentences.len() {
            total_secs
        } else {
            total_secs * elapsed_weight as f64 / total_weight as f64
        };

        doc.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            format_timestamp(start),
            format_timestamp(end),
            sentence
        ));
        start = end;
    }

    (doc, sentences.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_vtt_formatted() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(3.5), "00:00:03.500");
        assert_eq!(format_timestamp(3661.25), "01:01:01.250");
    }

    #[test]
    fn sentences_split_on_terminators() {
        let sentences = split_sentences("First beat. Second   beat! Third?");
        assert_eq!(sentences, vec!["First beat.", "Second beat!", "Third?"]);
    }

    #[test]
    fn cues_cover_the_full_duration_in_order() {
        let script = "Short one. This sentence is quite a bit longer than the first. End.";
        let (doc, count) = build_webvtt(script, 30.0, None);
        assert_eq!(count, 3);
        assert!(doc.starts_with("WEBVTT\n"));
        assert!(doc.contains("Language: en-US"));
        // Last cue ends exactly at the voiceover duration.
        assert!(doc.contains("--> 00:00:30.000"));
        // Longer sentences get proportionally longer cues.
        let first_end = doc
            .lines()
            .find(|l| l.starts_with("00:00:00.000 --> "))
            .and_then(|l| l.split(" --> ").nth(1))
            .map(str::to_string)
            .expect("first cue line");
        assert!(first_end < "00:00:10.000".to_string());
    }

    #[test]
    fn scriptless_input_yields_single_cue() {
        let (doc, count) = build_webvtt("no terminator here", 5.0, Some("de-DE"));
        assert_eq!(count, 1);
        assert!(doc.contains("Language: de-DE"));
        assert!(doc.contains("no terminator here"));
    }
}
