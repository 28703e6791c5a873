//! Ear-clipping triangulation of simple 2D polygons.

use vcad_kernel_api::Point2;

fn cross(o: Point2, a: Point2, b: Point2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Twice the signed area (positive for counter-clockwise loops).
pub fn signed_area2(points: &[Point2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum()
}

fn inside_triangle(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Triangulate a simple counter-clockwise polygon.
///
/// Returns index triples into `points`, counter-clockwise. Anything left
/// after no more ears can be found (self-intersecting input) is fanned.
pub fn triangulate(points: &[Point2]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut out = Vec::with_capacity(points.len().saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let a = remaining[(i + m - 1) % m];
            let b = remaining[i];
            let c = remaining[(i + 1) % m];
            let (pa, pb, pc) = (points[a], points[b], points[c]);
            if cross(pa, pb, pc) <= 1e-12 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&k| k != a && k != b && k != c)
                .any(|&k| inside_triangle(points[k], pa, pb, pc))
        });

        match ear {
            Some(i) => {
                let a = remaining[(i + m - 1) % m];
                let c = remaining[(i + 1) % m];
                out.push([a, remaining[i], c]);
                remaining.remove(i);
            }
            None => break,
        }
    }

    for i in 1..remaining.len().saturating_sub(1) {
        out.push([remaining[0], remaining[i], remaining[i + 1]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_gives_two_triangles() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert_eq!(triangulate(&pts).len(), 2);
        assert!((signed_area2(&pts) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn concave_l_shape() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let tris = triangulate(&pts);
        assert_eq!(tris.len(), 4);
        let area: f64 = tris
            .iter()
            .map(|t| cross(pts[t[0]], pts[t[1]], pts[t[2]]) / 2.0)
            .sum();
        assert!((area - 3.0).abs() < 1e-12);
        assert!(tris
            .iter()
            .all(|t| cross(pts[t[0]], pts[t[1]], pts[t[2]]) > 0.0));
    }
}
