//! The content-filtering transducer (SPEC_FULL §4.7): strips
//! `<TOOLCALL>...</TOOLCALL>` and `<THINKING>...</THINKING>` sentinels from
//! model output before it reaches a `content` event.
//!
//! Sentinels may split across chunk boundaries, so the filter buffers any
//! text that could still be the prefix of a sentinel tag rather than
//! emitting it early.

const START_TOOLCALL: &str = "<TOOLCALL>";
const END_TOOLCALL: &str = "</TOOLCALL>";
const START_THINKING: &str = "<THINKING>";
const END_THINKING: &str = "</THINKING>";
const START_TAGS: &[&str] = &[START_TOOLCALL, START_THINKING];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InsideToolcall,
    InsideThinking,
}

/// A stateful sentinel-stripping transducer. Feed it model output chunks via
/// [`push`](Self::push); call [`finish`](Self::finish) once at end of stream
/// to flush (or discard) whatever remains buffered.
pub struct ContentFilter {
    state: State,
    pending: String,
}

impl ContentFilter {
    /// Creates a filter in the `Normal` (pass-through) state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Normal,
            pending: String::new(),
        }
    }

    /// Feeds `chunk` through the filter, returning the text (if any) that is
    /// now safe to emit as a `content` event. Never returns partial sentinel
    /// fragments.
    #[must_use]
    pub fn push(&mut self, chunk: &str) -> String {
        self.pending.push_str(chunk);
        let mut out = String::new();

        loop {
            match self.state {
                State::Normal => {
                    let next = START_TAGS
                        .iter()
                        .filter_map(|tag| self.pending.find(tag).map(|pos| (pos, *tag)))
                        .min_by_key(|(pos, _)| *pos);

                    let Some((pos, tag)) = next else {
                        let keep = longest_partial_suffix(&self.pending, START_TAGS);
                        let emit_len = self.pending.len() - keep;
                        out.push_str(&self.pending[..emit_len]);
                        self.pending.drain(..emit_len);
                        break;
                    };

                    out.push_str(&self.pending[..pos]);
                    self.state = if tag == START_TOOLCALL {
                        State::InsideToolcall
                    } else {
                        State::InsideThinking
                    };
                    self.pending.drain(..pos + tag.len());
                }
                State::InsideToolcall | State::InsideThinking => {
                    let end_tag = if self.state == State::InsideToolcall {
                        END_TOOLCALL
                    } else {
                        END_THINKING
                    };
                    match self.pending.find(end_tag) {
                        Some(pos) => {
                            self.pending.drain(..pos + end_tag.len());
                            self.state = State::Normal;
                        }
                        None => break,
                    }
                }
            }
        }

        out
    }

    /// Flushes the filter at end of stream. Text held back only because it
    /// might have been a sentinel prefix is emitted; text swallowed inside
    /// an unterminated sentinel is discarded.
    #[must_use]
    pub fn finish(self) -> String {
        match self.state {
            State::Normal => self.pending,
            State::InsideToolcall | State::InsideThinking => String::new(),
        }
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// The longest suffix of `haystack` that is a prefix of any `needle`, so the
/// caller can hold it back in case the next chunk completes the tag.
fn longest_partial_suffix(haystack: &str, needles: &[&str]) -> usize {
    let max_len = needles.iter().map(|n| n.len()).max().unwrap_or(0);
    let limit = haystack.len().min(max_len.saturating_sub(1));
    for k in (1..=limit).rev() {
        let start = haystack.len() - k;
        if !haystack.is_char_boundary(start) {
            continue;
        }
        let suffix = &haystack[start..];
        if needles.iter().any(|n| n.starts_with(suffix)) {
            return k;
        }
    }
    0
}
