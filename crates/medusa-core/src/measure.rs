//! Size estimation for diagram nodes.
//!
//! Node boxes are sized before layout ever runs, so the estimator has to be
//! deterministic and cheap. The default measurer approximates a 12px monospace
//! font from display-cell counts; embedders with real font metrics can plug in
//! their own [`TextMeasurer`].

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use rustc_hash::FxHashMap;
use unicode_width::UnicodeWidthStr;

use crate::graph::NodeText;

/// Height of one `key: value` row in a composite node.
pub const ROW_HEIGHT: f64 = 24.0;
/// Height of a single-line container label.
pub const PARENT_HEIGHT: f64 = 36.0;
/// Very long string values must not blow out layout.
pub const MAX_NODE_WIDTH: f64 = 700.0;

const IMAGE_SIZE: f64 = 80.0;
/// Extra room on containers for expand/collapse controls.
const PARENT_EXTRA_WIDTH: f64 = 80.0;
const EMPTY_SIZE: f64 = 45.0;
const TEXT_PADDING: f64 = 24.0;
const ROW_VALUE_MAX_CHARS: usize = 80;
const CACHE_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Approximates text extents from display cells. Zero factors fall back to the
/// defaults so `Default::default()` is usable as-is.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let font_size = style.font_size.max(1.0);
        let lines: Vec<&str> = text.split('\n').collect();
        let mut max_cells = 0usize;
        for line in &lines {
            max_cells = max_cells.max(line.width());
        }

        TextMetrics {
            width: max_cells as f64 * font_size * char_width_factor,
            height: lines.len() as f64 * font_size * line_height_factor,
            line_count: lines.len(),
        }
    }
}

fn image_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://.*\.(?:png|jpg|gif|svg)").expect("valid regex"))
}

/// Image URLs and base64 data URIs get a fixed square box instead of text
/// metrics.
pub fn is_content_image(text: &NodeText) -> bool {
    let NodeText::Plain(value) = text else {
        return false;
    };
    image_url_regex().is_match(value)
        || (value.starts_with("data:image/") && value.contains("base64"))
}

/// Flattens node text into the lines a renderer would display: the string
/// itself, or one `key: value` line per composite row (values truncated).
pub fn display_lines(text: &NodeText) -> String {
    match text {
        NodeText::Plain(value) => value.clone(),
        NodeText::Rows(rows) => rows
            .iter()
            .map(|(key, value)| {
                let value: String = value.chars().take(ROW_VALUE_MAX_CHARS).collect();
                format!("{key}: {value}")
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Memoizing node-size estimator.
///
/// Identical values recur heavily in real-world JSON (enum-like strings,
/// repeated small objects), so results are cached by `(text, is_parent)`. The
/// cache is dropped wholesale once it outlives [`CACHE_TTL`]; a compilation
/// pass is short-lived and the cache is cheap to rebuild.
pub struct NodeSizer {
    measurer: Box<dyn TextMeasurer + Send + Sync>,
    style: TextStyle,
    cache: FxHashMap<(NodeText, bool), Size>,
    cache_born: Instant,
}

impl std::fmt::Debug for NodeSizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSizer")
            .field("style", &self.style)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for NodeSizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeSizer {
    pub fn new() -> Self {
        Self::with_measurer(Box::new(DeterministicTextMeasurer::default()))
    }

    pub fn with_measurer(measurer: Box<dyn TextMeasurer + Send + Sync>) -> Self {
        Self {
            measurer,
            style: TextStyle::default(),
            cache: FxHashMap::default(),
            cache_born: Instant::now(),
        }
    }

    pub fn node_size(&mut self, text: &NodeText, is_parent: bool) -> Size {
        if self.cache_born.elapsed() >= CACHE_TTL {
            self.cache.clear();
            self.cache_born = Instant::now();
        }

        let key = (text.clone(), is_parent);
        if let Some(&size) = self.cache.get(&key) {
            return size;
        }

        let size = self.compute(text, is_parent);
        self.cache.insert(key, size);
        size
    }

    fn compute(&self, text: &NodeText, is_parent: bool) -> Size {
        let flat = display_lines(text);

        let mut size = if flat.is_empty() {
            Size {
                width: EMPTY_SIZE,
                height: EMPTY_SIZE,
            }
        } else {
            let metrics = self.measurer.measure(&flat, &self.style);
            let height = match text {
                NodeText::Plain(_) if metrics.line_count == 1 && is_parent => PARENT_HEIGHT,
                NodeText::Plain(_) => metrics.line_count as f64 * ROW_HEIGHT,
                NodeText::Rows(rows) => rows.len() as f64 * ROW_HEIGHT,
            };
            Size {
                width: metrics.width + TEXT_PADDING,
                height,
            }
        };

        if is_content_image(text) {
            size = Size {
                width: IMAGE_SIZE,
                height: IMAGE_SIZE,
            };
        }

        if is_parent {
            size.width += PARENT_EXTRA_WIDTH;
        }
        if size.width > MAX_NODE_WIDTH {
            size.width = MAX_NODE_WIDTH;
        }

        size
    }
}
