//! Landmark frame replay from a recorded s-expression file.
//!
//! One frame per line:
//!
//! ```text
//! (:t 0.000 :hand nil)
//! (:t 0.033 :hand ((0.51 0.82 0.0) (0.55 0.78 -0.01) ...))
//! ```
//!
//! `:t` is seconds since the start of the recording and must not go
//! backwards.  `:hand` is `nil` when no hand was detected, otherwise a
//! list of `(x y z)` points in capture order.  Blank lines and lines
//! starting with `;` are skipped.

use std::io::BufRead;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::dispatch::{DispatchLoop, DispatchOutcome};
use crate::hand::{FingerStates, LandmarkPoint, LandmarkSnapshot};
use crate::sexp;

/// One recorded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Offset from the start of the recording.
    pub offset: Duration,
    /// Landmarks, or `None` if no hand was detected.
    pub hand: Option<Vec<LandmarkPoint>>,
}

impl Frame {
    /// Parse a single frame line.
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let value = sexp::parse(line)?;

        let t = sexp::get_f64(&value, "t").context("frame missing numeric :t")?;
        if !t.is_finite() || t < 0.0 {
            bail!("frame :t must be a non-negative number, got {}", t);
        }

        let hand_value = sexp::get(&value, "hand").context("frame missing :hand")?;
        let hand = if sexp::is_nil(hand_value) {
            None
        } else {
            let items = sexp::list_items(hand_value).context(":hand must be a list of points")?;
            let points = items
                .into_iter()
                .enumerate()
                .map(|(i, p)| parse_point(p).with_context(|| format!("point {}", i)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Some(points)
        };

        let offset = Duration::try_from_secs_f64(t)
            .with_context(|| format!("frame :t {} is out of range", t))?;
        Ok(Self { offset, hand })
    }
}

fn parse_point(value: &lexpr::Value) -> anyhow::Result<LandmarkPoint> {
    let coords = sexp::list_items(value)
        .context("expected (x y z)")?
        .into_iter()
        .map(|c| sexp::as_f64(c).map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .context("coordinates must be numbers")?;
    match coords.as_slice() {
        [x, y, z] => Ok(LandmarkPoint::new(*x, *y, *z)),
        _ => bail!("expected 3 coordinates, got {}", coords.len()),
    }
}

/// Streaming frame reader enforcing capture order.
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    last_offset: Duration,
    buf: String,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            last_offset: Duration::ZERO,
            buf: String::new(),
        }
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        loop {
            self.buf.clear();
            let n = self
                .reader
                .read_line(&mut self.buf)
                .with_context(|| format!("reading line {}", self.line_no + 1))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let frame = Frame::parse(line).with_context(|| format!("line {}", self.line_no))?;
            if frame.offset < self.last_offset {
                bail!(
                    "line {}: frame at {:?} is earlier than previous frame at {:?}",
                    self.line_no,
                    frame.offset,
                    self.last_offset
                );
            }
            self.last_offset = frame.offset;
            return Ok(Some(frame));
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = anyhow::Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

fn finger_summary(hand: Option<&[LandmarkPoint]>) -> String {
    hand.and_then(|points| LandmarkSnapshot::from_points(points).ok())
        .map(|snap| FingerStates::from_snapshot(&snap).summary())
        .unwrap_or_else(|| "?".to_string())
}

/// Counts from a finished replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub invoked: u64,
}

/// Feed every frame to the loop, timestamped relative to `base`.
///
/// Stops at the first read or parse error; frames already processed
/// keep their effects.
pub fn replay<I>(frames: I, dispatch: &mut DispatchLoop, base: Instant) -> anyhow::Result<ReplaySummary>
where
    I: IntoIterator<Item = anyhow::Result<Frame>>,
{
    let mut summary = ReplaySummary::default();
    for frame in frames {
        let frame = frame?;
        let now = base
            .checked_add(frame.offset)
            .with_context(|| format!("frame at {:?} overflows the clock", frame.offset))?;
        let outcome = dispatch.tick_points(frame.hand.as_deref(), now);
        summary.frames += 1;
        if outcome.invoked() {
            summary.invoked += 1;
        }
        match outcome {
            DispatchOutcome::Absent | DispatchOutcome::NoGesture => {}
            other => debug!(
                "t={:.3}s [{}] {:?}",
                frame.offset.as_secs_f64(),
                finger_summary(frame.hand.as_deref()),
                other
            ),
        }
    }
    info!(
        "Replay finished: {} frame(s), {} action(s) invoked",
        summary.frames, summary.invoked
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ActionRegistry;
    use crate::hand::gesture::make_hand;
    use crate::hand::{Finger, GestureClassifier, GestureId};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn hand_line(t: f64, points: &[LandmarkPoint]) -> String {
        let pts: Vec<String> = points
            .iter()
            .map(|p| format!("({} {} {})", p.x, p.y, p.z))
            .collect();
        format!("(:t {} :hand ({}))", t, pts.join(" "))
    }

    #[test]
    fn test_parse_absent_frame() {
        let frame = Frame::parse("(:t 0.5 :hand nil)").unwrap();
        assert_eq!(frame.offset, Duration::from_millis(500));
        assert!(frame.hand.is_none());
    }

    #[test]
    fn test_parse_hand_frame() {
        let line = hand_line(0.1, &make_hand(&[Finger::Thumb]));
        let frame = Frame::parse(&line).unwrap();
        let hand = frame.hand.unwrap();
        assert_eq!(hand.len(), 21);
        assert!((hand[4].y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Frame::parse("(:hand nil)").is_err());
        assert!(Frame::parse("(:t -1 :hand nil)").is_err());
        assert!(Frame::parse("(:t 0)").is_err());
        assert!(Frame::parse("(:t 0 :hand ((1 2)))").is_err());
        assert!(Frame::parse("(:t 0 :hand ((1 2 a)))").is_err());
        assert!(Frame::parse("(:t 0 :hand 7)").is_err());
    }

    #[test]
    fn test_parse_rejects_huge_offset() {
        let err = Frame::parse("(:t 99999999999999999999999.0 :hand nil)").unwrap_err();
        assert!(err.to_string().contains("out of range"), "got {}", err);
    }

    #[test]
    fn test_finger_summary() {
        assert_eq!(finger_summary(Some(make_hand(&[Finger::Thumb]).as_slice())), "T - - - -");
        assert_eq!(finger_summary(Some(&make_hand(&[])[..20])), "?");
        assert_eq!(finger_summary(None), "?");
    }

    #[test]
    fn test_reader_skips_comments_and_blanks() {
        let input = "; recorded\n\n(:t 0 :hand nil)\n   \n(:t 0.1 :hand nil)\n";
        let frames: Vec<Frame> = FrameReader::new(Cursor::new(input))
            .collect::<anyhow::Result<_>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].offset, Duration::from_millis(100));
    }

    #[test]
    fn test_reader_rejects_time_going_backwards() {
        let input = "(:t 1.0 :hand nil)\n(:t 0.5 :hand nil)\n";
        let mut reader = FrameReader::new(Cursor::new(input));
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 2"), "got {}", err);
    }

    #[test]
    fn test_reader_reports_line_number() {
        let input = "(:t 0 :hand nil)\n(:t oops\n";
        let err = FrameReader::new(Cursor::new(input))
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"), "got {:#}", err);
    }

    #[test]
    fn test_replay_dispatches_with_cooldown() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ActionRegistry::new();
        let f = fired.clone();
        registry.register(GestureId::Like, move || -> anyhow::Result<()> {
            f.lock().unwrap().push(GestureId::Like);
            Ok(())
        });
        let mut dispatch =
            DispatchLoop::new(GestureClassifier::default(), registry, Duration::from_secs(1));

        let like = make_hand(&[Finger::Thumb]);
        let mut lines = vec!["(:t 0 :hand nil)".to_string()];
        for t in [0.1, 0.2, 0.6, 1.2] {
            lines.push(hand_line(t, &like));
        }
        // Malformed frame: too few points, treated as no gesture.
        lines.push(hand_line(2.5, &like[..20]));
        let input = lines.join("\n");

        let summary = replay(
            FrameReader::new(Cursor::new(input)),
            &mut dispatch,
            Instant::now(),
        )
        .unwrap();

        assert_eq!(summary.frames, 6);
        assert_eq!(summary.invoked, 2);
        assert_eq!(fired.lock().unwrap().len(), 2);
        assert_eq!(dispatch.stats().invalid, 1);
        assert_eq!(dispatch.stats().absent, 1);
        assert_eq!(dispatch.stats().suppressed, 2);
    }

    #[test]
    fn test_replay_rejects_clock_overflow() {
        let mut dispatch = DispatchLoop::new(
            GestureClassifier::default(),
            ActionRegistry::new(),
            Duration::from_secs(1),
        );
        let frames = vec![
            Ok(Frame {
                offset: Duration::ZERO,
                hand: None,
            }),
            Ok(Frame {
                offset: Duration::MAX,
                hand: None,
            }),
        ];
        let err = replay(frames, &mut dispatch, Instant::now()).unwrap_err();
        assert!(err.to_string().contains("overflows"), "got {}", err);
        assert_eq!(dispatch.stats().absent, 1);
    }
}
