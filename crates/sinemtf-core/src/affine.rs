use crate::rect::{polygon_area, rect_to_corners, Xywhr};
use crate::GeometryError;
use nalgebra::{DMatrix, DVector, Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 2D affine map stored as a homogeneous 3×3 matrix with last row `[0, 0, 1]`.
///
/// Serialized as its top two rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 2]", into = "[[f64; 3]; 2]")]
pub struct AffineMap {
    pub m: Matrix3<f64>,
}

impl From<[[f64; 3]; 2]> for AffineMap {
    fn from(rows: [[f64; 3]; 2]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<AffineMap> for [[f64; 3]; 2] {
    fn from(a: AffineMap) -> Self {
        a.to_rows()
    }
}

impl Default for AffineMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineMap {
    /// Wrap a homogeneous matrix; the last row is forced to `[0, 0, 1]`.
    pub fn new(mut m: Matrix3<f64>) -> Self {
        m[(2, 0)] = 0.0;
        m[(2, 1)] = 0.0;
        m[(2, 2)] = 1.0;
        Self { m }
    }

    pub fn from_rows(rows: [[f64; 3]; 2]) -> Self {
        Self::new(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2], //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn to_rows(&self) -> [[f64; 3]; 2] {
        [
            [self.m[(0, 0)], self.m[(0, 1)], self.m[(0, 2)]],
            [self.m[(1, 0)], self.m[(1, 1)], self.m[(1, 2)]],
        ]
    }

    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::from_rows([[1.0, 0.0, tx], [0.0, 1.0, ty]])
    }

    /// Clockwise rotation by `theta` radians about the origin (image `y` down).
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::from_rows([[c, -s, 0.0], [s, c, 0.0]])
    }

    /// Isotropic scaling about the origin.
    pub fn scaling(s: f64) -> Self {
        Self::from_rows([[s, 0.0, 0.0], [0.0, s, 0.0]])
    }

    /// Rotation + uniform scale + translation: `p' = s·R(theta)·p + t`.
    pub fn similarity(scale: f64, theta: f64, tx: f64, ty: f64) -> Self {
        Self::rotation(theta)
            .then(&Self::scaling(scale))
            .then(&Self::translation(tx, ty))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    }

    /// Composition: apply `self` first, then `next`.
    pub fn then(&self, next: &AffineMap) -> AffineMap {
        AffineMap {
            m: next.m * self.m,
        }
    }

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.m[(0, 0)] * self.m[(1, 1)] - self.m[(0, 1)] * self.m[(1, 0)]
    }

    /// Geometric-mean scale factor, `sqrt(|det|)`.
    #[inline]
    pub fn similarity_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Rotation of the image of the `x` axis, radians.
    #[inline]
    pub fn rotation_angle(&self) -> f64 {
        self.m[(1, 0)].atan2(self.m[(0, 0)])
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        self.m.try_inverse().map(Self::new)
    }
}

impl Mul for AffineMap {
    type Output = AffineMap;

    /// `a * b` applies `b` first.
    fn mul(self, rhs: AffineMap) -> AffineMap {
        rhs.then(&self)
    }
}

/// Degrees of freedom allowed in a fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AffineModel {
    /// Rotation, uniform scale and translation (4 DOF).
    #[default]
    Similarity,
    /// Full affine (6 DOF).
    Affine,
}

impl AffineModel {
    /// Correspondences needed for an exact fit.
    pub fn min_points(self) -> usize {
        match self {
            AffineModel::Similarity => 2,
            AffineModel::Affine => 3,
        }
    }
}

/// Which way a rectangle-to-quadrilateral fit maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitDirection {
    /// Rectangle space → quadrilateral space.
    #[default]
    Forward,
    /// Quadrilateral space → rectangle space.
    Reverse,
}

/// Robust fit tolerances. Distances are in quadrilateral (captured) pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// Quadrilaterals with a smaller area are rejected as degenerate.
    pub min_quad_area_px2: f64,
    /// Lower bound of the inlier gate.
    pub inlier_floor_px: f64,
    /// Maximum RMS residual of an accepted fit.
    pub max_residual_px: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            min_quad_area_px2: 16.0,
            inlier_floor_px: 2.0,
            max_residual_px: 5.0,
        }
    }
}

/// A fitted map and its residual statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineFit {
    pub map: AffineMap,
    pub model: AffineModel,
    /// RMS residual over the inliers (all points when the inlier set is too small).
    pub rms_residual_px: f64,
    /// Largest residual over all points.
    pub max_residual_px: f64,
    /// Inlier flag per correspondence.
    pub inliers: Vec<bool>,
}

impl AffineFit {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&b| b).count()
    }
}

/// Fit the affine map between a canonical rectangle and an ordered quadrilateral.
///
/// `quad` lists the images of the rectangle corners in [`rect_to_corners`]
/// order. With [`FitDirection::Reverse`] the returned map sends the
/// quadrilateral onto the rectangle.
pub fn estimate_rect_to_rect_affine(
    rect: &Xywhr,
    quad: &[Point2<f64>; 4],
    model: AffineModel,
    direction: FitDirection,
    params: &FitParams,
) -> Result<AffineFit, GeometryError> {
    if !rect.is_valid() {
        return Err(GeometryError::DegenerateRect);
    }
    if quad.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(GeometryError::DegenerateQuad { area: f64::NAN });
    }
    let quad_area = polygon_area(quad).abs();
    if quad_area < params.min_quad_area_px2 {
        return Err(GeometryError::DegenerateQuad { area: quad_area });
    }

    let rect_pts = rect_to_corners(rect);
    let (src, dst, quad_px_per_unit) = match direction {
        FitDirection::Forward => (rect_pts, *quad, 1.0),
        FitDirection::Reverse => {
            let rect_area = rect.width * rect.height;
            (*quad, rect_pts, (quad_area / rect_area).sqrt())
        }
    };
    estimate_affine_lmeds(&src, &dst, model, params, quad_px_per_unit)
}

/// Least-median-of-squares affine fit `dst ≈ H · src`.
///
/// `dst_px_scale` converts destination units into the pixels the tolerances
/// in `params` are expressed in.
pub fn estimate_affine_lmeds(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    model: AffineModel,
    params: &FitParams,
    dst_px_scale: f64,
) -> Result<AffineFit, GeometryError> {
    let p = model.min_points();
    let n = src.len();
    if n != dst.len() || n < p {
        return Err(GeometryError::NotEnoughPoints {
            needed: p,
            got: n.min(dst.len()),
        });
    }

    let floor = params.inlier_floor_px / dst_px_scale;
    let sigma_gain = 1.4826 * (1.0 + 5.0 / n.saturating_sub(p).max(1) as f64);

    let mut best: Option<Candidate> = None;
    for subset in combinations(n, p) {
        let s: Vec<Point2<f64>> = subset.iter().map(|&i| src[i]).collect();
        let d: Vec<Point2<f64>> = subset.iter().map(|&i| dst[i]).collect();
        let Some(map) = least_squares(&s, &d, model) else {
            continue;
        };
        let sq = squared_residuals(&map, src, dst);
        let median = median_of(&sq);
        let gate = (2.5 * sigma_gain * median.sqrt()).max(floor);
        let inliers: Vec<bool> = sq.iter().map(|&r| r <= gate * gate).collect();
        let cand = Candidate {
            median,
            inlier_count: inliers.iter().filter(|&&b| b).count(),
            total: sq.iter().sum(),
            inliers,
        };
        if best.as_ref().is_none_or(|b| cand.beats(b)) {
            best = Some(cand);
        }
    }
    let best = best.ok_or(GeometryError::NonInvertible)?;

    // a minimal subset fits itself exactly
    let trusted = best.inlier_count > p || n == p;
    let (fit_src, fit_dst): (Vec<_>, Vec<_>) = if trusted {
        src.iter()
            .zip(dst)
            .zip(&best.inliers)
            .filter(|(_, &keep)| keep)
            .map(|((a, b), _)| (*a, *b))
            .unzip()
    } else {
        (src.to_vec(), dst.to_vec())
    };
    let map = least_squares(&fit_src, &fit_dst, model).ok_or(GeometryError::NonInvertible)?;
    if map.inverse().is_none() {
        return Err(GeometryError::NonInvertible);
    }

    let sq = squared_residuals(&map, src, dst);
    let inliers = if trusted {
        best.inliers
    } else {
        vec![true; n]
    };
    let (sum, count) = sq
        .iter()
        .zip(&inliers)
        .filter(|(_, &keep)| keep)
        .fold((0.0, 0usize), |(s, c), (r, _)| (s + r, c + 1));
    let rms = (sum / count.max(1) as f64).sqrt() * dst_px_scale;
    let max = sq.iter().copied().fold(0.0_f64, f64::max).sqrt() * dst_px_scale;

    log::debug!(
        "affine fit: model={model:?} inliers={count}/{n} rms={rms:.4}px max={max:.4}px"
    );
    if rms > params.max_residual_px {
        return Err(GeometryError::ResidualTooLarge {
            rms,
            tolerance: params.max_residual_px,
        });
    }

    Ok(AffineFit {
        map,
        model,
        rms_residual_px: rms,
        max_residual_px: max,
        inliers,
    })
}

struct Candidate {
    median: f64,
    inlier_count: usize,
    total: f64,
    inliers: Vec<bool>,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        if self.median != other.median {
            return self.median < other.median;
        }
        if self.inlier_count != other.inlier_count {
            return self.inlier_count > other.inlier_count;
        }
        self.total < other.total
    }
}

fn squared_residuals(map: &AffineMap, src: &[Point2<f64>], dst: &[Point2<f64>]) -> Vec<f64> {
    src.iter()
        .zip(dst)
        .map(|(s, d)| (map.apply(*s) - d).norm_squared())
        .collect()
}

fn median_of(values: &[f64]) -> f64 {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    let n = v.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        v[n / 2]
    } else {
        0.5 * (v[n / 2 - 1] + v[n / 2])
    }
}

/// All `k`-element index subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let mut i = k;
        while i > 0 && idx[i - 1] == n - k + i - 1 {
            i -= 1;
        }
        if i == 0 {
            return out;
        }
        idx[i - 1] += 1;
        for j in i..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

fn hartley_normalization(pts: &[Point2<f64>]) -> Matrix3<f64> {
    let n = pts.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        mean_dist += ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
    }
    mean_dist /= n;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Linear least-squares fit in Hartley-normalized coordinates.
///
/// Returns `None` when the correspondences do not pin down the model
/// (coincident points, collinear points for the full affine).
fn least_squares(src: &[Point2<f64>], dst: &[Point2<f64>], model: AffineModel) -> Option<AffineMap> {
    let n = src.len();
    if n < model.min_points() {
        return None;
    }
    let t_src = hartley_normalization(src);
    let t_dst = hartley_normalization(dst);
    let norm = |t: &Matrix3<f64>, p: &Point2<f64>| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        (v[0], v[1])
    };

    let unknowns = match model {
        AffineModel::Similarity => 4,
        AffineModel::Affine => 6,
    };
    let mut a = DMatrix::<f64>::zeros(2 * n, unknowns);
    let mut b = DVector::<f64>::zeros(2 * n);
    for k in 0..n {
        let (x, y) = norm(&t_src, &src[k]);
        let (u, v) = norm(&t_dst, &dst[k]);
        match model {
            // u = a x - b y + tx ; v = b x + a y + ty
            AffineModel::Similarity => {
                a[(2 * k, 0)] = x;
                a[(2 * k, 1)] = -y;
                a[(2 * k, 2)] = 1.0;
                a[(2 * k + 1, 0)] = y;
                a[(2 * k + 1, 1)] = x;
                a[(2 * k + 1, 3)] = 1.0;
            }
            AffineModel::Affine => {
                a[(2 * k, 0)] = x;
                a[(2 * k, 1)] = y;
                a[(2 * k, 2)] = 1.0;
                a[(2 * k + 1, 3)] = x;
                a[(2 * k + 1, 4)] = y;
                a[(2 * k + 1, 5)] = 1.0;
            }
        }
        b[2 * k] = u;
        b[2 * k + 1] = v;
    }

    let svd = a.svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv > 0.0) || svd.rank(max_sv * 1e-9) < unknowns {
        return None;
    }
    let x = svd.solve(&b, 1e-15).ok()?;

    let hn = match model {
        AffineModel::Similarity => Matrix3::new(
            x[0], -x[1], x[2], //
            x[1], x[0], x[3], //
            0.0, 0.0, 1.0,
        ),
        AffineModel::Affine => Matrix3::new(
            x[0], x[1], x[2], //
            x[3], x[4], x[5], //
            0.0, 0.0, 1.0,
        ),
    };
    let t_dst_inv = t_dst.try_inverse()?;
    let map = AffineMap::new(t_dst_inv * hn * t_src);
    map.m.iter().all(|v| v.is_finite()).then_some(map)
}
