//! Per-eye geometry from one frame's landmarks.
//!
//! Measures lid openness, the eye bounding box, and a box-relative pupil
//! position for each eye. Holds no state across frames.
//!
//! Pupil position comes from the iris landmarks when the landmark model
//! provides them for both eyes. Otherwise the darkest blurred pixel inside
//! each eye contour stands in for the pupil. Both eyes always use the same
//! strategy.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;

use eyemouse_common::config::{EyeLandmarks, LandmarkLayout, TuningConfig};
use eyemouse_face_model::landmark::{LandmarkPoint, PixelPoint};

/// 3-D Euclidean distance between two landmarks.
pub fn distance(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Mean position of a set of points; the origin for an empty set.
pub fn eye_center(points: &[PixelPoint]) -> PixelPoint {
    if points.is_empty() {
        return PixelPoint::default();
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    PixelPoint::new(sum_x / n, sum_y / n)
}

/// Axis-aligned bounding box of an eye contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl EyeBox {
    /// Bounding box of the given points, `None` if there are none.
    pub fn from_points(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Zero width or height, e.g. under an extreme head pose.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Position of `point` relative to the box center, scaled so the box
    /// edges sit at ±1, then multiplied by `amplification`.
    ///
    /// Degenerate boxes yield `(0.0, 0.0)`.
    pub fn relative_position(&self, point: PixelPoint, amplification: f64) -> (f64, f64) {
        if self.is_degenerate() {
            return (0.0, 0.0);
        }
        let center = self.center();
        let rx = 2.0 * (point.x - center.x) / self.width();
        let ry = 2.0 * (point.y - center.y) / self.height();
        (rx * amplification, ry * amplification)
    }
}

/// How a pupil position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PupilSource {
    Iris,
    DarkestPixel,
}

/// Pupil location and its eye-box-relative offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilEstimate {
    /// Pupil position in frame pixels.
    pub position: PixelPoint,
    /// Amplified relative offset, roughly within [-2, 2].
    pub relative_x: f64,
    pub relative_y: f64,
    pub source: PupilSource,
}

impl PupilEstimate {
    fn locate(position: PixelPoint, eye_box: &EyeBox, amplification: f64, source: PupilSource) -> Self {
        let (relative_x, relative_y) = eye_box.relative_position(position, amplification);
        Self {
            position,
            relative_x,
            relative_y,
            source,
        }
    }
}

/// Geometry of one eye in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeMeasurement {
    /// Lid-to-lid distance; smaller means more closed.
    pub openness: f64,
    pub eye_box: EyeBox,
    pub center: PixelPoint,
    pub contour: Vec<PixelPoint>,
    /// Present for both eyes or for neither.
    pub pupil: Option<PupilEstimate>,
}

/// Both eyes' geometry for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMeasurement {
    pub left: EyeMeasurement,
    pub right: EyeMeasurement,
}

impl FaceMeasurement {
    /// Pupil estimates for both eyes, if any were produced.
    pub fn pupils(&self) -> Option<(PupilEstimate, PupilEstimate)> {
        Some((self.left.pupil?, self.right.pupil?))
    }
}

/// Extracts per-eye openness, eye boxes, and pupil estimates.
#[derive(Debug, Clone)]
pub struct EyeGeometryAnalyzer {
    layout: LandmarkLayout,
    amplification: f64,
    blur_sigma: f32,
}

impl EyeGeometryAnalyzer {
    pub fn new(layout: LandmarkLayout, tuning: &TuningConfig) -> Self {
        Self {
            layout,
            amplification: tuning.pupil_amplification,
            blur_sigma: tuning.pupil_blur_sigma,
        }
    }

    /// Analyzer with the MediaPipe layout and default tuning.
    pub fn with_defaults() -> Self {
        Self::new(LandmarkLayout::default(), &TuningConfig::default())
    }

    pub fn layout(&self) -> &LandmarkLayout {
        &self.layout
    }

    /// Measure both eyes.
    ///
    /// Returns `None` when `landmarks` is too short to cover the contour and
    /// lid indices. Pupils are left empty when the frame has no iris points
    /// and no grayscale image is supplied for the darkest-pixel fallback.
    pub fn analyze(
        &self,
        landmarks: &[LandmarkPoint],
        gray: Option<&GrayImage>,
    ) -> Option<FaceMeasurement> {
        if landmarks.len() < self.layout.required_len() {
            return None;
        }

        let mut left = measure_eye(landmarks, &self.layout.left)?;
        let mut right = measure_eye(landmarks, &self.layout.right)?;

        let pupils = if self.layout.has_iris(landmarks.len()) {
            Some((
                self.iris_pupil(landmarks, &self.layout.left.iris, &left.eye_box),
                self.iris_pupil(landmarks, &self.layout.right.iris, &right.eye_box),
            ))
        } else if let Some(gray) = gray {
            self.darkest_pupil(gray, &left.contour, &left.eye_box)
                .zip(self.darkest_pupil(gray, &right.contour, &right.eye_box))
        } else {
            None
        };

        if let Some((l, r)) = pupils {
            left.pupil = Some(l);
            right.pupil = Some(r);
        }

        Some(FaceMeasurement { left, right })
    }

    /// Pupil at the mean of the iris landmarks.
    pub fn iris_pupil(
        &self,
        landmarks: &[LandmarkPoint],
        iris: &[usize],
        eye_box: &EyeBox,
    ) -> PupilEstimate {
        let points: Vec<PixelPoint> = iris.iter().map(|&i| landmarks[i].xy()).collect();
        PupilEstimate::locate(
            eye_center(&points),
            eye_box,
            self.amplification,
            PupilSource::Iris,
        )
    }

    /// Pupil at the darkest blurred pixel inside the eye contour.
    ///
    /// Pixels outside the contour are zeroed before blurring, matching a
    /// masked full-frame blur. Ties resolve to the first pixel in row-major
    /// order. Returns `None` if the contour lies outside the image.
    pub fn darkest_pupil(
        &self,
        gray: &GrayImage,
        contour: &[PixelPoint],
        eye_box: &EyeBox,
    ) -> Option<PupilEstimate> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        // Crop with enough margin that the blur kernel never reaches past it.
        // Bounds are clamped in floating point so off-frame landmarks cannot
        // overflow the integer arithmetic.
        let margin = (3.0 * f64::from(self.blur_sigma.max(0.0))).ceil() + 2.0;
        let crop = |v: f64, dim: u32| v.clamp(0.0, dim as f64) as i64;
        let x0 = crop(eye_box.min_x.floor() - margin, width);
        let y0 = crop(eye_box.min_y.floor() - margin, height);
        let x1 = crop(eye_box.max_x.ceil() + margin + 1.0, width);
        let y1 = crop(eye_box.max_y.ceil() + margin + 1.0, height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (roi_w, roi_h) = ((x1 - x0) as u32, (y1 - y0) as u32);

        let mask = contour_mask(contour, x0, y0, roi_w, roi_h);
        let masked = GrayImage::from_fn(roi_w, roi_h, |x, y| {
            if mask.get_pixel(x, y).0[0] > 0 {
                *gray.get_pixel(x0 as u32 + x, y0 as u32 + y)
            } else {
                Luma([0])
            }
        });
        let blurred = if self.blur_sigma > 0.0 {
            gaussian_blur_f32(&masked, self.blur_sigma)
        } else {
            masked
        };

        let mut darkest: Option<(u32, u32, u8)> = None;
        for (x, y, pixel) in blurred.enumerate_pixels() {
            if mask.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            let value = pixel.0[0];
            if darkest.map_or(true, |(_, _, best)| value < best) {
                darkest = Some((x, y, value));
            }
        }

        let (x, y, _) = darkest?;
        let position = PixelPoint::new((x0 + x as i64) as f64, (y0 + y as i64) as f64);
        Some(PupilEstimate::locate(
            position,
            eye_box,
            self.amplification,
            PupilSource::DarkestPixel,
        ))
    }
}

fn measure_eye(landmarks: &[LandmarkPoint], eye: &EyeLandmarks) -> Option<EyeMeasurement> {
    let contour: Vec<PixelPoint> = eye.contour.iter().map(|&i| landmarks[i].xy()).collect();
    let eye_box = EyeBox::from_points(&contour)?;
    let openness = distance(&landmarks[eye.lid_top], &landmarks[eye.lid_bottom]);
    Some(EyeMeasurement {
        openness,
        eye_box,
        center: eye_center(&contour),
        contour,
        pupil: None,
    })
}

/// Vertices further than this from the ROI are pulled in to it.
const VERTEX_LIMIT: f64 = (1 << 20) as f64;

fn roi_coord(v: f64, origin: i64) -> i32 {
    (v.round() - origin as f64).clamp(-VERTEX_LIMIT, VERTEX_LIMIT) as i32
}

/// Filled contour polygon in ROI coordinates (255 inside, 0 outside).
fn contour_mask(contour: &[PixelPoint], x0: i64, y0: i64, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut poly: Vec<Point<i32>> = Vec::with_capacity(contour.len());
    for p in contour {
        let vertex = Point::new(roi_coord(p.x, x0), roi_coord(p.y, y0));
        if poly.last() != Some(&vertex) {
            poly.push(vertex);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    if poly.len() >= 3 {
        draw_polygon_mut(&mut mask, &poly, Luma([255u8]));
    } else {
        // Collapsed contour: only the surviving vertices are inside.
        for v in &poly {
            if v.x >= 0 && v.y >= 0 && (v.x as u32) < width && (v.y as u32) < height {
                mask.put_pixel(v.x as u32, v.y as u32, Luma([255u8]));
            }
        }
    }
    mask
}
