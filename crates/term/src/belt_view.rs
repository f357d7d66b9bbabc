//! BeltView: maps a `LevelSnapshot` into a framebuffer.
//!
//! Pure, no I/O. Layout, top to bottom:
//!
//! ```text
//! Level 2  Fresh vegetable salad (fresh only)    Time 41.8s  Moves 22  Coins 100
//! Need: [x] Cucumber  [ ] Tomato  [ ] Broccoli
//! Only the freshest vegetables. No compromises on quality!
//!
//! > 1 |------Tom-----------Oni------|
//!   2 |--App------------------------|
//!
//! Holding: -
//! [1] order  [2] good  [3] trash   Up/Down lane   q quit
//! Wrong 1  Stashed 0  Items 7/28
//! ```

use crate::core::{GradeReport, ItemSnapshot, LevelSnapshot, Phase};
use crate::fb::{FrameBuffer, Style};
use crate::types::EndReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Row where the first lane is drawn.
const LANES_TOP: u16 = 4;
/// `"> 1 |"` before the track.
const TRACK_LEFT: u16 = 5;
const ITEM_WIDTH: u16 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct BeltView;

impl BeltView {
    pub fn render_into(
        &self,
        snap: &LevelSnapshot,
        selected_lane: u32,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.reset(viewport.width, viewport.height);

        self.draw_header(fb, snap);

        let track = track_width(viewport.width);
        // Lanes past the bottom of the screen are clipped by the framebuffer.
        for lane in 0..snap.lanes.min(fb.height() as u32) {
            let y = lane_row(lane);
            let marker = if lane == selected_lane { '>' } else { ' ' };
            let style = if lane == selected_lane {
                Style::ACCENT
            } else {
                Style::MUTED
            };
            fb.put(0, y, marker, style);
            fb.text(2, y, &(lane + 1).to_string(), style);
            fb.put(TRACK_LEFT - 1, y, '|', Style::MUTED);
            fb.hline(TRACK_LEFT, y, track, '-', Style::MUTED);
            fb.put(TRACK_LEFT + track, y, '|', Style::MUTED);
        }
        for item in snap.items.iter() {
            let y = lane_row(item.lane);
            let x = TRACK_LEFT + item_column(item.progress, track);
            draw_item(fb, x, y, item);
        }

        let mut y = lane_row(snap.lanes).saturating_add(1);
        let end = fb.text(0, y, "Holding: ", Style::PLAIN);
        match snap.held.as_ref() {
            Some(item) => draw_item(fb, end, y, item),
            None => {
                fb.text(end, y, "-", Style::MUTED);
            }
        }
        y = y.saturating_add(1);
        fb.text(
            0,
            y,
            "[1] order  [2] good  [3] trash   Up/Down lane   q quit",
            Style::MUTED,
        );
        y = y.saturating_add(1);
        let status = format!(
            "Wrong {}  Stashed {}  Items {}/{}",
            snap.wrong_in_order, snap.stashed, snap.emitted, snap.max_stream
        );
        fb.text(0, y, &status, Style::PLAIN);

        if let Some(report) = snap.report.as_ref().filter(|r| r.surfaced) {
            self.draw_result(fb, report, y.saturating_add(2));
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &LevelSnapshot, selected_lane: u32, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, selected_lane, viewport, &mut fb);
        fb
    }

    fn draw_header(&self, fb: &mut FrameBuffer, snap: &LevelSnapshot) {
        let mut x = fb.text(0, 0, &format!("Level {}  ", snap.level), Style::ACCENT);
        x = fb.text(x, 0, snap.order_title, Style::PLAIN.bold());
        if snap.strict_fresh_only {
            x = fb.text(x, 0, " (fresh only)", Style::MUTED);
        }
        let clock = format!(
            "    Time {:.1}s  Moves {}  Coins {}",
            snap.time_left_ms as f64 / 1000.0,
            snap.moves_left,
            snap.balance
        );
        fb.text(x, 0, &clock, Style::PLAIN);

        let mut x = fb.text(0, 1, "Need:", Style::PLAIN);
        for kind in snap.required {
            let (mark, style) = if snap.matched.contains(*kind) {
                ("[x] ", Style::GOOD)
            } else {
                ("[ ] ", Style::PLAIN)
            };
            x = fb.text(x + 1, 1, mark, style);
            x = fb.text(x, 1, kind.label(), style);
            x += 1;
        }

        if snap.phase == Phase::Preview {
            let preview = format!(
                "{}  (starts in {:.1}s)",
                snap.order_description,
                snap.preview_left_ms as f64 / 1000.0
            );
            fb.text(0, 2, &preview, Style::ACCENT);
        } else {
            fb.text(0, 2, snap.order_description, Style::MUTED);
        }
    }

    fn draw_result(&self, fb: &mut FrameBuffer, report: &GradeReport, y: u16) {
        let (verdict, style) = if report.passed() {
            ("PASSED", Style::GOOD.bold())
        } else {
            ("FAILED", Style::BAD.bold())
        };
        let x = fb.text(0, y, verdict, style);
        fb.text(
            x,
            y,
            &format!("  {}%  ({})", report.percent(), reason_text(report.reason)),
            Style::PLAIN,
        );
        let detail = format!(
            "Missed {}  Reward {}  Carry-over {}",
            report.grade.missed_required, report.reward, report.carry_over
        );
        fb.text(0, y + 1, &detail, Style::PLAIN);
        fb.text(0, y + 2, "Enter: continue", Style::ACCENT);
    }
}

fn draw_item(fb: &mut FrameBuffer, x: u16, y: u16, item: &ItemSnapshot) {
    let mut style = Style::freshness(item.freshness);
    if item.from_carry_over {
        style = style.on(crate::fb::Rgb::new(30, 30, 60));
    }
    fb.text(x, y, item.kind.short(), style);
}

fn reason_text(reason: EndReason) -> &'static str {
    match reason {
        EndReason::TimeUp => "time up",
        EndReason::OutOfMoves => "out of moves",
        EndReason::FinishedStream => "belt empty",
        EndReason::Aborted => "aborted",
    }
}

/// Screen row of `lane`, saturating at the bottom of the coordinate space.
fn lane_row(lane: u32) -> u16 {
    LANES_TOP.saturating_add(u16::try_from(lane).unwrap_or(u16::MAX))
}

/// Track length for a terminal `width`, leaving room for the lane prefix and
/// the closing bar.
pub fn track_width(width: u16) -> u16 {
    width.saturating_sub(TRACK_LEFT + 1).max(ITEM_WIDTH)
}

/// Column of an item's left edge within a track of `track` cells.
pub fn item_column(progress: f32, track: u16) -> u16 {
    let span = track.saturating_sub(ITEM_WIDTH) as f32;
    (progress.clamp(0.0, 1.0) * span).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_column_spans_track() {
        assert_eq!(item_column(0.0, 40), 0);
        assert_eq!(item_column(1.0, 40), 37);
        assert_eq!(item_column(0.5, 41), 19);
        assert_eq!(item_column(2.0, 10), 7);
    }

    #[test]
    fn test_track_width_has_floor() {
        assert_eq!(track_width(80), 74);
        assert_eq!(track_width(4), ITEM_WIDTH);
    }
}
