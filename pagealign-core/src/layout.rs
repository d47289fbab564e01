//! Page layout model
//!
//! Layout analysis happens elsewhere; pagealign consumes its result as an
//! ordered tree of regions, lines and words, each carrying an id, text and a
//! polygon in source image pixel space. The JSON form of a page is:
//!
//! ```json
//! {"id": "NL-HaNA_1.04.02_1092_0017",
//!  "regions": [{"id": "r1", "coords": [[0,0],[10,0],[10,5],[0,5]],
//!    "lines": [{"id": "l1", "coords": [[0,0],[10,0],[10,5],[0,5]],
//!      "words": [{"id": "w1", "text": "Go ", "coords": [[0,0],[4,0],[4,5],[0,5]]}]}]}]}
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::path::{Path, PathBuf};

/// A pixel position in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point(pub i64, pub i64);

impl Point {
    pub fn x(&self) -> i64 {
        self.0
    }

    pub fn y(&self) -> i64 {
        self.1
    }
}

/// Axis-aligned bounds of a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl fmt::Display for BoundingBox {
    /// IIIF region form `x,y,w,h`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// Ordered outline of a layout element, serialized as `[[x, y], ...]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: SmallVec<[Point; 4]>,
}

impl Polygon {
    /// Create a polygon from its points in drawing order
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Create a polygon from `(x, y)` pairs
    pub fn from_pairs(pairs: &[(i64, i64)]) -> Self {
        Self::new(pairs.iter().map(|&(x, y)| Point(x, y)))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box, `None` for an empty polygon
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for p in &self.points[1..] {
            min_x = min_x.min(p.0);
            min_y = min_y.min(p.1);
            max_x = max_x.max(p.0);
            max_y = max_y.max(p.1);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }

    /// Largest x coordinate (0 for an empty polygon)
    pub fn max_x(&self) -> i64 {
        self.points.iter().map(|p| p.0).max().unwrap_or(0)
    }

    /// Largest y coordinate (0 for an empty polygon)
    pub fn max_y(&self) -> i64 {
        self.points.iter().map(|p| p.1).max().unwrap_or(0)
    }
}

/// A word with its raw text, trailing separator included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutWord {
    pub id: String,
    pub text: String,
    pub coords: Polygon,
}

/// A text line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    pub id: String,
    pub coords: Polygon,
    #[serde(default)]
    pub words: Vec<LayoutWord>,
}

/// A text region, lines in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegion {
    pub id: String,
    pub coords: Polygon,
    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

/// One scanned page, regions in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    /// Page id; falls back to the file stem when loading from disk
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub regions: Vec<LayoutRegion>,
}

impl LayoutPage {
    /// Iterate over all words in reading order
    pub fn words(&self) -> impl Iterator<Item = &LayoutWord> {
        self.regions
            .iter()
            .flat_map(|r| r.lines.iter())
            .flat_map(|l| l.words.iter())
    }
}

/// A layout page together with the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDocument {
    pub source: PathBuf,
    pub page: LayoutPage,
}

impl LayoutDocument {
    pub fn new(source: impl Into<PathBuf>, page: LayoutPage) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }

    /// Load a page from its JSON representation
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut page: LayoutPage = serde_json::from_str(&content)?;
        if page.id.is_empty() {
            page.id = page_id_from_path(path);
        }
        Ok(Self::new(path, page))
    }

    pub fn page_id(&self) -> &str {
        &self.page.id
    }
}

/// File stem used as page id, e.g. `NL-HaNA_1.04.02_1092_0017`
pub fn page_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
