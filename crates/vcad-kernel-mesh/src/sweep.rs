//! Solids built from sketch profiles: extrude, revolve, sweep and loft.
//!
//! Every constructor works on rings: the same loop of profile points placed
//! at successive stations. Consecutive rings are stitched with quads and,
//! for open shapes, the first and last rings are capped with ear-clipped
//! triangles. Orientation is fixed up afterwards from the signed volume.

use nalgebra::{Rotation3, Unit};
use vcad_kernel_api::{
    Helix, KernelError, Point2, Point3, Result, SketchProfile, SweepOptions, Vec3,
    LINEAR_TOLERANCE,
};

use crate::polygon::Polygon;
use crate::solid::MeshSolid;
use crate::triangulate::{signed_area2, triangulate};

/// Arc flattening used for extrude and revolve.
pub const PROFILE_ARC_SEGMENTS: u32 = 16;

/// Number of ring stations for a full revolution.
const REVOLVE_SEGMENTS: f64 = 32.0;

fn ccw(mut points: Vec<Point2>) -> Vec<Point2> {
    if signed_area2(&points) < 0.0 {
        points.reverse();
    }
    points
}

/// Stitch rings into a closed polygon soup.
///
/// `loop_2d` is the counter-clockwise profile used to triangulate caps.
/// With `wrap` the last ring connects back to the first and no caps are
/// emitted.
fn stitch(loop_2d: &[Point2], rings: &[Vec<Point3>], wrap: bool) -> MeshSolid {
    let n = loop_2d.len();
    let mut polygons = Vec::new();

    let stations = if wrap { rings.len() } else { rings.len() - 1 };
    for k in 0..stations {
        let (r0, r1) = (&rings[k], &rings[(k + 1) % rings.len()]);
        for i in 0..n {
            let j = (i + 1) % n;
            polygons.extend(Polygon::new(vec![r0[i], r0[j], r1[j], r1[i]]));
        }
    }

    if !wrap {
        let (first, last) = (&rings[0], &rings[rings.len() - 1]);
        for [a, b, c] in triangulate(loop_2d) {
            polygons.extend(Polygon::new(vec![first[c], first[b], first[a]]));
            polygons.extend(Polygon::new(vec![last[a], last[b], last[c]]));
        }
    }
    MeshSolid::from_polygons(polygons)
}

/// Build one solid per loop and combine them; loops nested inside an odd
/// number of other loops are holes.
fn combine_loops(
    loops: Vec<Vec<Point2>>,
    mut build: impl FnMut(&[Point2]) -> Result<MeshSolid>,
) -> Result<MeshSolid> {
    let loops: Vec<Vec<Point2>> = loops.into_iter().filter(|l| l.len() >= 3).map(ccw).collect();
    if loops.is_empty() {
        return Err(KernelError::EmptyProfile);
    }

    let mut outer = MeshSolid::empty();
    let mut holes = MeshSolid::empty();
    for (i, l) in loops.iter().enumerate() {
        let depth = loops
            .iter()
            .enumerate()
            .filter(|(k, other)| *k != i && point_in_loop(l[0], other))
            .count();
        let solid = build(l)?;
        if depth % 2 == 0 {
            outer = outer.union(&solid);
        } else {
            holes = holes.union(&solid);
        }
    }
    Ok(outer.difference(&holes))
}

fn point_in_loop(p: Point2, poly: &[Point2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let (a, b) = (poly[i], poly[(i + n - 1) % n]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

/// Extrude every loop of `profile` along `direction`.
///
/// `options.twist_angle` and `options.scale_end` rotate and scale the
/// profile about its local origin as it travels; `scale_start` and
/// `arc_segments` are ignored. A straight extrude needs one segment, a
/// twisted one gets 32 unless `path_segments` says otherwise.
pub fn extrude(
    profile: &SketchProfile,
    direction: Vec3,
    options: &SweepOptions,
) -> Result<MeshSolid> {
    if direction.norm() < LINEAR_TOLERANCE {
        return Err(KernelError::ZeroExtrusion);
    }
    let segments = match options.path_segments {
        0 if options.twist_angle != 0.0 => 32,
        0 => 1,
        n => n as usize,
    };
    combine_loops(profile.to_polyline(PROFILE_ARC_SEGMENTS), |l| {
        let rings: Vec<Vec<Point3>> = (0..=segments)
            .map(|k| {
                let t = k as f64 / segments as f64;
                let station = Station {
                    origin: profile.origin + direction * t,
                    u: profile.x_dir,
                    v: profile.y_dir,
                };
                let scale = 1.0 + (options.scale_end - 1.0) * t;
                place(l, &station, options.twist_angle * t, scale)
            })
            .collect();
        Ok(stitch(l, &rings, false))
    })
}

/// Revolve every loop of `profile` around an axis by `angle_deg`.
pub fn revolve(
    profile: &SketchProfile,
    axis_origin: Point3,
    axis_dir: Vec3,
    angle_deg: f64,
) -> Result<MeshSolid> {
    if axis_dir.norm() < LINEAR_TOLERANCE {
        return Err(KernelError::ZeroAxis);
    }
    if !(angle_deg > 0.0 && angle_deg <= 360.0 + 1e-9) {
        return Err(KernelError::InvalidAngle(angle_deg));
    }
    let axis = Unit::new_normalize(axis_dir);
    let full = (angle_deg - 360.0).abs() < 1e-9;
    let steps = ((angle_deg / 360.0 * REVOLVE_SEGMENTS).ceil() as usize).max(1);
    let stations = if full { steps } else { steps + 1 };

    combine_loops(profile.to_polyline(PROFILE_ARC_SEGMENTS), |l| {
        let base: Vec<Point3> = l.iter().map(|p| profile.to_3d(*p)).collect();
        let rings: Vec<Vec<Point3>> = (0..stations)
            .map(|k| {
                let angle = (angle_deg * k as f64 / steps as f64).to_radians();
                let rot = Rotation3::from_axis_angle(&axis, angle);
                base.iter()
                    .map(|p| axis_origin + rot * (p - axis_origin))
                    .collect()
            })
            .collect();
        Ok(stitch(l, &rings, full))
    })
}

/// Frame at one path station: position plus the two in-plane axes.
struct Station {
    origin: Point3,
    u: Vec3,
    v: Vec3,
}

fn place(l: &[Point2], station: &Station, twist: f64, scale: f64) -> Vec<Point3> {
    let (s, c) = twist.sin_cos();
    l.iter()
        .map(|p| {
            let x = scale * (c * p.x - s * p.y);
            let y = scale * (s * p.x + c * p.y);
            station.origin + station.u * x + station.v * y
        })
        .collect()
}

fn sweep_stations(
    profile: &SketchProfile,
    stations: &[Station],
    options: &SweepOptions,
) -> Result<MeshSolid> {
    let last = (stations.len() - 1).max(1) as f64;
    combine_loops(profile.to_polyline(options.arc_segments), |l| {
        let rings: Vec<Vec<Point3>> = stations
            .iter()
            .enumerate()
            .map(|(k, st)| {
                let t = k as f64 / last;
                let scale = options.scale_start + (options.scale_end - options.scale_start) * t;
                place(l, st, options.twist_angle * t, scale)
            })
            .collect();
        Ok(stitch(l, &rings, false))
    })
}

/// Sweep along a straight line. The profile's local origin follows the path.
pub fn sweep_line(
    profile: &SketchProfile,
    start: Point3,
    end: Point3,
    options: &SweepOptions,
) -> Result<MeshSolid> {
    let d = end - start;
    if d.norm() < LINEAR_TOLERANCE {
        return Err(KernelError::ZeroLengthPath);
    }
    let tangent = d.normalize();
    let projected = profile.x_dir - tangent * profile.x_dir.dot(&tangent);
    let u = if projected.norm() > 1e-9 {
        projected.normalize()
    } else {
        profile.y_dir - tangent * profile.y_dir.dot(&tangent)
    };
    let u = u.normalize();
    let v = tangent.cross(&u);

    let varies = options.twist_angle != 0.0 || options.scale_start != options.scale_end;
    let segments = match options.path_segments {
        0 if varies => 32,
        0 => 1,
        n => n as usize,
    };
    let stations: Vec<Station> = (0..=segments)
        .map(|k| Station {
            origin: start + d * (k as f64 / segments as f64),
            u,
            v,
        })
        .collect();
    sweep_stations(profile, &stations, options)
}

/// Sweep along a helix. The profile lies in the plane spanned by the
/// helix's radial direction and the binormal at each station.
pub fn sweep_helix(
    profile: &SketchProfile,
    helix: &Helix,
    options: &SweepOptions,
) -> Result<MeshSolid> {
    if helix.height.abs() < LINEAR_TOLERANCE && helix.turns.abs() < 1e-9 {
        return Err(KernelError::ZeroLengthPath);
    }
    let segments = match options.path_segments {
        0 => helix.suggested_segments(),
        n => n as usize,
    };
    let stations: Vec<Station> = (0..=segments)
        .map(|k| {
            let t = k as f64 / segments as f64;
            let origin = helix.point(t);
            let tangent = helix.tangent(t).normalize();
            let radial = Vec3::new(origin.x - helix.center.x, origin.y - helix.center.y, 0.0);
            let u = if radial.norm() > 1e-12 {
                radial.normalize()
            } else {
                Vec3::x()
            };
            Station {
                origin,
                u,
                v: tangent.cross(&u),
            }
        })
        .collect();
    sweep_stations(profile, &stations, options)
}

/// Loft through the first loop of each profile.
///
/// All profiles must flatten to the same number of points.
pub fn loft(profiles: &[SketchProfile], closed: bool) -> Result<MeshSolid> {
    if profiles.len() < 2 {
        return Err(KernelError::TooFewProfiles(profiles.len()));
    }
    let arc_segments = SweepOptions::default().arc_segments;
    let loops: Vec<Vec<Point2>> = profiles
        .iter()
        .map(|p| {
            p.to_polyline(arc_segments)
                .into_iter()
                .next()
                .map(ccw)
                .ok_or(KernelError::EmptyProfile)
        })
        .collect::<Result<_>>()?;

    let expected = loops[0].len();
    if let Some((index, l)) = loops.iter().enumerate().find(|(_, l)| l.len() != expected) {
        return Err(KernelError::ProfileMismatch {
            index,
            expected,
            found: l.len(),
        });
    }

    let rings: Vec<Vec<Point3>> = profiles
        .iter()
        .zip(&loops)
        .map(|(p, l)| l.iter().map(|q| p.to_3d(*q)).collect())
        .collect();
    Ok(stitch(&loops[0], &rings, closed))
}
