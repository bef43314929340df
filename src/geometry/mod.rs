//! Stamp placement geometry.
//!
//! A stamp is selected on a rasterized page preview, whose origin is the
//! top-left corner with y growing downward, and must be placed in PDF user
//! space, whose origin is the bottom-left corner with y growing upward and
//! whose units are points. The conversion is an origin flip followed by an
//! independent scale on each axis: the preview raster resolution is unrelated
//! to the physical page size, so aspect ratios need not match.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of the preview viewport the selection was made on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSize {
    /// Viewport width in pixels (must be > 0)
    pub width: f32,
    /// Viewport height in pixels (must be > 0)
    pub height: f32,
}

impl PreviewSize {
    /// Create a new preview size.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
}

impl PageSize {
    /// Create a new page size.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in preview-pixel space (origin top-left).
///
/// `x`/`y` is always the minimum corner and width/height are non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewRect {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl PreviewRect {
    /// Create a rectangle from position and dimensions.
    ///
    /// Negative dimensions are folded back so the rectangle stays normalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_signet::geometry::PreviewRect;
    ///
    /// let rect = PreviewRect::new(50.0, 50.0, 20.0, 40.0);
    /// assert_eq!(rect.width, 20.0);
    /// assert_eq!(rect.height, 40.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(x, y, x + width, y + height)
    }

    /// Create a rectangle from the drag origin and the release point.
    ///
    /// The drag may go in any direction; the result is normalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_signet::geometry::PreviewRect;
    ///
    /// let rect = PreviewRect::from_corners(70.0, 90.0, 50.0, 50.0);
    /// assert_eq!(rect, PreviewRect::new(50.0, 50.0, 20.0, 40.0));
    /// ```
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }

    /// A rectangle without area means no stamp was dragged out.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle in PDF user space (origin bottom-left, units in points).
///
/// Serialized as the ordered array `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct PdfRect {
    /// Left edge
    pub x0: f32,
    /// Bottom edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
}

impl PdfRect {
    /// The zero box used for invisible signatures.
    pub const ZERO: PdfRect = PdfRect {
        x0: 0.0,
        y0: 0.0,
        x1: 0.0,
        y1: 0.0,
    };

    /// Create a rectangle from its corner coordinates.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width in points.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height in points.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the box has no visible area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// The box as an ordered `[x0, y0, x1, y1]` array.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl From<[f32; 4]> for PdfRect {
    fn from(a: [f32; 4]) -> Self {
        PdfRect::new(a[0], a[1], a[2], a[3])
    }
}

impl From<PdfRect> for [f32; 4] {
    fn from(r: PdfRect) -> Self {
        r.to_array()
    }
}

/// Flip a preview rectangle to a bottom-left origin.
///
/// The result is still in preview pixels.
///
/// # Examples
///
/// ```
/// use pdf_signet::geometry::{flip_origin, PdfRect, PreviewRect};
///
/// let flipped = flip_origin(&PreviewRect::new(50.0, 50.0, 20.0, 40.0), 400.0);
/// assert_eq!(flipped, PdfRect::new(50.0, 310.0, 70.0, 350.0));
/// ```
pub fn flip_origin(rect: &PreviewRect, preview_height: f32) -> PdfRect {
    PdfRect {
        x0: rect.x,
        y0: preview_height - rect.y - rect.height,
        x1: rect.x + rect.width,
        y1: preview_height - rect.y,
    }
}

/// Inverse of [`flip_origin`].
pub fn unflip_origin(flipped: &PdfRect, preview_height: f32) -> PreviewRect {
    PreviewRect {
        x: flipped.x0,
        y: preview_height - flipped.y1,
        width: flipped.x1 - flipped.x0,
        height: flipped.y1 - flipped.y0,
    }
}

/// Scale a flipped preview box to page points, each axis independently.
pub fn scale_to_page(flipped: &PdfRect, preview: PreviewSize, page: PageSize) -> PdfRect {
    debug_assert!(preview.width > 0.0 && preview.height > 0.0);
    let sx = page.width / preview.width;
    let sy = page.height / preview.height;
    PdfRect {
        x0: flipped.x0 * sx,
        y0: flipped.y0 * sy,
        x1: flipped.x1 * sx,
        y1: flipped.y1 * sy,
    }
}

/// Convert a preview-pixel selection into PDF user-space placement.
///
/// `preview` dimensions must be strictly positive.
///
/// # Examples
///
/// ```
/// use pdf_signet::geometry::{preview_to_pdf, PageSize, PdfRect, PreviewRect, PreviewSize};
///
/// let rect = preview_to_pdf(
///     &PreviewRect::new(50.0, 50.0, 20.0, 40.0),
///     PreviewSize::new(200.0, 400.0),
///     PageSize::new(100.0, 200.0),
/// );
/// assert_eq!(rect, PdfRect::new(25.0, 155.0, 35.0, 175.0));
/// ```
pub fn preview_to_pdf(rect: &PreviewRect, preview: PreviewSize, page: PageSize) -> PdfRect {
    scale_to_page(&flip_origin(rect, preview.height), preview, page)
}
