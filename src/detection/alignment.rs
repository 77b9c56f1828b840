/*!
 * Local word alignment between verse text and a transcript window.
 *
 * A Smith-Waterman style dynamic program over words: matches score
 * positively by tier, mismatches and skipped words negatively, and the
 * best-scoring local region is traced back into monotonic matched pairs.
 * Both endpoints of the result are always matched words.
 */

use crate::detection::fuzzy::{MatchKind, WordMatcher};
use crate::detection::tokens::WordToken;

/// Upper bound on DP cells per alignment
const MAX_CELLS: usize = 2_000_000;

const STOP: u8 = 0;
const DIAG: u8 = 1;
const UP: u8 = 2;
const LEFT: u8 = 3;

/// One matched word pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPair {
    /// Index into the verse tokens
    pub verse_index: usize,
    /// Index into the transcript window tokens
    pub window_index: usize,
    pub kind: MatchKind,
}

/// Scores used by the dynamic program.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentScoring {
    pub exact: i32,
    pub equivalent: i32,
    pub fuzzy: i32,
    pub mismatch: i32,
    /// Transcript word with no verse counterpart
    pub skip_transcript: i32,
    /// Verse word the speaker left out
    pub skip_verse: i32,
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        Self {
            exact: 30,
            equivalent: 26,
            fuzzy: 20,
            mismatch: -10,
            skip_transcript: -8,
            skip_verse: -10,
        }
    }
}

impl AlignmentScoring {
    fn for_kind(&self, kind: MatchKind) -> i32 {
        match kind {
            MatchKind::Exact => self.exact,
            MatchKind::Equivalent => self.equivalent,
            MatchKind::Fuzzy => self.fuzzy,
        }
    }
}

/// Matched pairs in increasing verse and window order.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    pub pairs: Vec<AlignedPair>,
    pub score: i32,
}

impl Alignment {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn first(&self) -> Option<&AlignedPair> {
        self.pairs.first()
    }

    pub fn last(&self) -> Option<&AlignedPair> {
        self.pairs.last()
    }

    /// Sum of match weights.
    pub fn weighted_matches(&self) -> f32 {
        self.pairs.iter().map(|p| p.kind.weight()).sum()
    }

    /// Shift window indices, for alignments computed on a sub-slice.
    pub fn offset_window(mut self, offset: usize) -> Self {
        for pair in &mut self.pairs {
            pair.window_index += offset;
        }
        self
    }
}

/// Align with default scoring.
pub fn align(verse: &[WordToken], window: &[WordToken], matcher: &WordMatcher) -> Alignment {
    align_with(verse, window, matcher, &AlignmentScoring::default())
}

pub fn align_with(verse: &[WordToken], window: &[WordToken], matcher: &WordMatcher, scoring: &AlignmentScoring) -> Alignment {
    let n = verse.len();
    if n == 0 || window.is_empty() {
        return Alignment::default();
    }
    let m = window.len().min(MAX_CELLS / n).max(1);
    let width = m + 1;

    let mut score = vec![0i32; (n + 1) * width];
    let mut trace = vec![STOP; (n + 1) * width];
    let mut best = (0i32, 0usize, 0usize);

    for i in 1..=n {
        for j in 1..=m {
            let step = matcher
                .compare(&verse[i - 1].text, &window[j - 1].text)
                .map_or(scoring.mismatch, |kind| scoring.for_kind(kind));
            let diag = score[(i - 1) * width + j - 1] + step;
            let up = score[(i - 1) * width + j] + scoring.skip_verse;
            let left = score[i * width + j - 1] + scoring.skip_transcript;

            let mut value = 0;
            let mut dir = STOP;
            if diag > value {
                value = diag;
                dir = DIAG;
            }
            if up > value {
                value = up;
                dir = UP;
            }
            if left > value {
                value = left;
                dir = LEFT;
            }

            score[i * width + j] = value;
            trace[i * width + j] = dir;
            if value > best.0 {
                best = (value, i, j);
            }
        }
    }

    let (best_score, mut i, mut j) = best;
    let mut pairs = Vec::new();
    while i > 0 && j > 0 {
        match trace[i * width + j] {
            DIAG => {
                if let Some(kind) = matcher.compare(&verse[i - 1].text, &window[j - 1].text) {
                    pairs.push(AlignedPair {
                        verse_index: i - 1,
                        window_index: j - 1,
                        kind,
                    });
                }
                i -= 1;
                j -= 1;
            }
            UP => i -= 1,
            LEFT => j -= 1,
            _ => break,
        }
    }
    pairs.reverse();

    Alignment {
        pairs,
        score: best_score,
    }
}
