//! Gradient resolver: `linear-gradient(<angle>deg, <stop>, ...)` → stops.
//!
//! Built on `winnow` like the rest of the crate's parsers. The header
//! (`linear-gradient(`, angle, `deg`) must match exactly; individual color
//! stops are parsed leniently and malformed ones are dropped.

use crate::color::Color;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use winnow::ascii::multispace0;
use winnow::combinator::terminated;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// A gradient stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

/// A parsed linear gradient, independent of any canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
    /// CSS angle in degrees: 0 points up, increasing clockwise.
    pub angle: f32,
    pub stops: SmallVec<[GradientStop; 4]>,
}

impl LinearGradient {
    /// Start and end points for a `width × height` canvas.
    ///
    /// The line runs through the canvas center and spans the full diagonal,
    /// so every pixel falls between the first and last stop.
    pub fn endpoints(&self, width: f64, height: f64) -> (Point, Point) {
        let rad = (self.angle as f64 - 90.0).to_radians();
        let half = width.hypot(height) / 2.0;
        let (cx, cy) = (width / 2.0, height / 2.0);
        let (dx, dy) = (rad.cos() * half, rad.sin() * half);
        (Point::new(cx - dx, cy - dy), Point::new(cx + dx, cy + dy))
    }
}

/// Parse a CSS-like linear gradient.
///
/// Returns `None` when the string is not a `linear-gradient(<n>deg, ...)`
/// or when none of its stops could be parsed.
pub fn parse_linear_gradient(input: &str) -> Option<LinearGradient> {
    let lower = input.trim().to_ascii_lowercase();
    let mut rest = lower.as_str();

    let angle = parse_header.parse_next(&mut rest).ok()?;
    let body = rest.trim_end().strip_suffix(')')?;

    let raw_stops = split_top_level(body);
    let count = raw_stops.len();
    let stops: SmallVec<[GradientStop; 4]> = raw_stops
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let stop = parse_stop(raw, index, count);
            if stop.is_none() {
                log::debug!("skipping malformed gradient stop {raw:?}");
            }
            stop
        })
        .collect();

    if stops.is_empty() {
        return None;
    }
    Some(LinearGradient { angle, stops })
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn parse_header(input: &mut &str) -> ModalResult<f32> {
    let (_, _, _, _, angle, _, _, _, _) = (
        "linear-gradient",
        multispace0,
        '(',
        multispace0,
        parse_number,
        multispace0,
        "deg",
        multispace0,
        ',',
    )
        .parse_next(input)?;
    Ok(angle)
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    let start = *input;
    if input.starts_with('-') || input.starts_with('+') {
        *input = &input[1..];
    }
    let _ = take_while::<_, _, ErrMode<ContextError>>(1.., |c: char| c.is_ascii_digit())
        .parse_next(input)?;
    if input.starts_with('.') {
        *input = &input[1..];
        let _ =
            take_while::<_, _, ContextError>(0.., |c: char| c.is_ascii_digit()).parse_next(input);
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f32>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn parse_percent(input: &mut &str) -> ModalResult<f32> {
    terminated(parse_number, '%').parse_next(input)
}

/// One stop: `<color>` or `<color> <n>%`. Without a position the stop sits
/// at its proportional index among all written stops.
fn parse_stop(raw: &str, index: usize, count: usize) -> Option<GradientStop> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let explicit = raw.rsplit_once(char::is_whitespace).and_then(|(color, pos)| {
        let mut pos = pos.trim();
        let pct = parse_percent.parse_next(&mut pos).ok()?;
        pos.is_empty().then_some((color.trim(), pct))
    });

    let (color_str, offset) = match explicit {
        Some((color, pct)) => (color, pct / 100.0),
        None if count > 1 => (raw, index as f32 / (count - 1) as f32),
        None => (raw, 0.0),
    };

    let color = Color::parse(color_str)?;
    Some(GradientStop {
        offset: offset.clamp(0.0, 1.0),
        color,
    })
}

/// Split on commas that are not nested inside parentheses
/// (`rgba(0, 0, 0, 0.5) 20%` is one stop).
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
