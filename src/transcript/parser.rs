use crate::models::Utterance;

/// Parse a raw transcript into an ordered sequence of utterances
///
/// Each non-blank line either starts a new utterance (optional `[timestamp]`
/// prefix followed by `Speaker:` and the spoken text) or continues the
/// previous one. Continuation lines are space-joined into `text` and
/// newline-joined into `raw_text`. A continuation with no preceding
/// utterance starts an anonymous one.
///
/// Total and deterministic: malformed input never fails, it just degrades
/// to continuations or anonymous utterances. Empty input yields an empty
/// sequence.
pub fn parse_transcript(raw: &str) -> Vec<Utterance> {
    // Match: optional [timestamp] prefix, then "Speaker:" and the rest
    let speaker_re = regex::Regex::new(r"^\s*(?:\[([^\]]*)\]\s*)?([^:\n]+):\s*(.*)$").unwrap();

    let mut utterances: Vec<Utterance> = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(cap) = speaker_re.captures(line) {
            let speaker = cap[2].trim().to_string();
            let text = cap[3].trim().to_string();
            utterances.push(Utterance {
                index: utterances.len(),
                speaker,
                text,
                raw_text: line.to_string(),
            });
        } else if let Some(last) = utterances.last_mut() {
            if !last.text.is_empty() {
                last.text.push(' ');
            }
            last.text.push_str(line.trim());
            last.raw_text.push('\n');
            last.raw_text.push_str(line);
        } else {
            utterances.push(Utterance {
                index: 0,
                speaker: String::new(),
                text: line.trim().to_string(),
                raw_text: line.to_string(),
            });
        }
    }

    utterances
}
