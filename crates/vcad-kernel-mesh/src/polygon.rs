//! Convex planar polygons and the planes that split them.

use vcad_kernel_api::{Point3, Vec3};

/// Tolerance used to classify points against a plane.
pub const PLANE_EPSILON: f64 = 1e-5;

/// Oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance from the origin along `normal`.
    pub w: f64,
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn new(point: Point3, normal: Vec3) -> Option<Self> {
        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            w: normal.dot(&point.coords),
        })
    }

    /// Signed distance of `p` from the plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    /// Reverse the plane orientation.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, p: &Point3) -> u8 {
        let t = self.signed_distance(p);
        if t < -PLANE_EPSILON {
            BACK
        } else if t > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Split `polygon` by this plane into the four output lists.
    ///
    /// Coplanar polygons go to `coplanar_front` or `coplanar_back` depending
    /// on whether they face the same way as the plane.
    pub fn split_polygon(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let types: Vec<u8> = polygon.vertices.iter().map(|v| self.classify(v)).collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            FRONT => front.push(polygon),
            BACK => back.push(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(&(vj - vi));
                        let t = (self.w - self.normal.dot(&vi.coords)) / denom;
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

/// A convex planar polygon with counter-clockwise winding seen from the front.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices in winding order.
    pub vertices: Vec<Point3>,
    /// Supporting plane, facing outward.
    pub plane: Plane,
}

impl Polygon {
    /// Build a polygon, computing its plane with Newell's method.
    ///
    /// Consecutive duplicate vertices are collapsed. Returns `None` for
    /// polygons with fewer than three distinct vertices or zero area.
    pub fn new(vertices: Vec<Point3>) -> Option<Self> {
        let mut verts: Vec<Point3> = Vec::with_capacity(vertices.len());
        for v in vertices {
            match verts.last() {
                Some(last) if (v - last).norm() <= PLANE_EPSILON => {}
                _ => verts.push(v),
            }
        }
        while verts.len() > 1 && (verts[0] - verts[verts.len() - 1]).norm() <= PLANE_EPSILON {
            verts.pop();
        }
        if verts.len() < 3 {
            return None;
        }

        let mut normal = Vec3::zeros();
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        if normal.norm() < 1e-12 {
            return None;
        }
        let plane = Plane::new(verts[0], normal)?;
        Some(Self {
            vertices: verts,
            plane,
        })
    }

    /// Reverse winding and plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point3 {
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, v| acc + v.coords);
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Fan triangles as vertex index triples.
    pub fn fan(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (1..self.vertices.len() - 1).map(|i| [0, i, i + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn newell_normal_follows_winding() {
        let p = square();
        assert!((p.plane.normal - Vec3::z()).norm() < 1e-12);
        let mut q = p.clone();
        q.flip();
        assert!((q.plane.normal + Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn degenerate_polygons_rejected() {
        assert!(Polygon::new(vec![Point3::origin(), Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).is_none());
        assert!(Polygon::new(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0)
        ])
        .is_none());
    }

    #[test]
    fn split_spanning_polygon() {
        let plane = Plane::new(Point3::new(0.5, 0.0, 0.0), Vec3::x()).unwrap();
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        plane.split_polygon(square(), &mut cf, &mut cb, &mut f, &mut b);
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(f.len(), 1);
        assert_eq!(b.len(), 1);
        assert!(f[0].vertices.iter().all(|v| v.x >= 0.5 - 1e-12));
        assert!(b[0].vertices.iter().all(|v| v.x <= 0.5 + 1e-12));
    }

    #[test]
    fn coplanar_goes_by_facing() {
        let plane = Plane::new(Point3::origin(), -Vec3::z()).unwrap();
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        plane.split_polygon(square(), &mut cf, &mut cb, &mut f, &mut b);
        assert_eq!(cb.len(), 1);
        assert!(cf.is_empty() && f.is_empty() && b.is_empty());
    }

    #[test]
    fn fan_of_quad() {
        let tris: Vec<_> = square().fan().collect();
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
    }
}
