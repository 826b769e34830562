use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Projective transform between two image planes.
///
/// Throughout this workspace the convention is `p_dst ~ H * p_src`: a
/// homography estimated from scene-to-template correspondences maps scene
/// pixel coordinates into the template frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// A usable homography must be invertible; near-zero determinants come
    /// from degenerate correspondence sets (collinear points, repeated
    /// points) and are treated as estimation failures by callers.
    pub fn is_degenerate(&self) -> bool {
        self.h.determinant().abs() < 1e-10
    }
}

// Hartley normalization: translate to the centroid, scale so the mean
// distance from it is sqrt(2). Conditioning matters more than it looks;
// raw pixel coordinates make the DLT system numerically miserable.
fn normalizing_transform(pts: &[Point2<f32>]) -> Matrix3<f64> {
    let n = pts.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn apply_normalization(t: &Matrix3<f64>, pts: &[Point2<f32>]) -> Vec<Point2<f64>> {
    pts.iter()
        .map(|p| {
            let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect()
}

fn scale_to_unit_h33(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Matrix3<f64>> {
    Some(t_dst.try_inverse()? * hn * t_src)
}

// Any three collinear points make the 4-point system rank-deficient. After
// normalization legitimate quads have triangle areas of order one, so a tiny
// absolute threshold separates the two cases cleanly.
fn quad_is_degenerate(pts: &[Point2<f64>]) -> bool {
    for i in 0..4 {
        for j in (i + 1)..4 {
            for k in (j + 1)..4 {
                let ux = pts[j].x - pts[i].x;
                let uy = pts[j].y - pts[i].y;
                let vx = pts[k].x - pts[i].x;
                let vy = pts[k].y - pts[i].y;
                if (ux * vy - uy * vx).abs() < 1e-6 {
                    return true;
                }
            }
        }
    }
    false
}

/// Exact homography from four correspondences, `dst ~ H * src`.
///
/// Solves the 8x8 linear system with `h33 = 1` after Hartley normalization.
/// Returns `None` for degenerate configurations (three collinear points,
/// coincident points).
pub fn homography_from_quad(
    src: &[Point2<f32>; 4],
    dst: &[Point2<f32>; 4],
) -> Option<Homography> {
    let t_src = normalizing_transform(src);
    let t_dst = normalizing_transform(dst);
    let src_n = apply_normalization(&t_src, src);
    let dst_n = apply_normalization(&t_dst, dst);

    if quad_is_degenerate(&src_n) || quad_is_degenerate(&dst_n) {
        return None;
    }

    // Per correspondence (x,y) -> (u,v):
    //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
    //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = scale_to_unit_h33(denormalize(hn, t_src, t_dst)?)?;
    let h = Homography::new(h);
    if h.is_degenerate() {
        return None;
    }
    Some(h)
}

/// Least-squares homography from `n >= 4` correspondences, `dst ~ H * src`.
///
/// For exactly four points this delegates to [`homography_from_quad`]; for
/// more it solves the homogeneous DLT system `A h = 0` via SVD, taking the
/// right singular vector of the smallest singular value.
pub fn estimate_homography_dlt(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    if src.len() == 4 {
        let s: &[Point2<f32>; 4] = src.try_into().ok()?;
        let d: &[Point2<f32>; 4] = dst.try_into().ok()?;
        return homography_from_quad(s, d);
    }

    let t_src = normalizing_transform(src);
    let t_dst = normalizing_transform(dst);
    let src_n = apply_normalization(&t_src, src);
    let dst_n = apply_normalization(&t_dst, dst);

    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for k in 0..n {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        // [ -x -y -1   0  0  0   u*x u*y u ]
        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        // [ 0  0  0  -x -y -1   v*x v*y v ]
        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    let svd = a.svd(true, true);
    let vt = svd.v_t?;
    let last = vt.nrows().checked_sub(1)?;
    let h = vt.row(last);
    let hn = Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    let h = scale_to_unit_h33(denormalize(hn, t_src, t_dst)?)?;
    let h = Homography::new(h);
    if h.is_degenerate() {
        return None;
    }
    Some(h)
}
