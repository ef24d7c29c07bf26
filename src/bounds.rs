use regex::Regex;
use std::sync::OnceLock;

/// Screen-space rectangle decoded from a `[left,top][right,bottom]` descriptor.
///
/// Coordinates follow the dump convention: origin top-left, y grows downward.
/// Inverted or degenerate rectangles are passed through unchanged, so `width`,
/// `height`, and `area` may be negative or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Extracts the first `[a,b][c,d]` pattern from a descriptor string.
    ///
    /// Anything that does not match yields `None`; a missing rectangle is a
    /// normal state for dump elements, not an error. Characters around the
    /// first match are ignored.
    pub fn parse(raw: &str) -> Option<Bounds> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").expect("invalid bounds pattern")
        });
        let caps = pattern.captures(raw)?;
        let edge = |index: usize| caps.get(index)?.as_str().parse::<i32>().ok();
        Some(Bounds { left: edge(1)?, top: edge(2)?, right: edge(3)?, bottom: edge(4)? })
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Signed area; i64 so malformed extremes cannot overflow.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }
}
