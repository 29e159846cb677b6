use geo::{EuclideanLength, LineInterpolatePoint, Point};

use crate::Branch;

/// Clamp a chainage into `[0, branch.length]`.
pub fn snap_chainage(branch: &Branch, chainage: f64) -> f64 {
    if !chainage.is_finite() {
        return 0.0;
    }
    chainage.clamp(0.0, branch.length.max(0.0))
}

/// Point on the branch geometry at a (snapped) chainage.
///
/// With a custom branch length the chainage is scaled onto the drawn line
/// (`chainage * geometry_length / length`). Returns `None` for branches
/// without a usable line.
pub fn point_at_chainage(branch: &Branch, chainage: f64) -> Option<Point<f64>> {
    if branch.geometry.0.len() < 2 {
        return None;
    }
    let geometry_length = branch.geometry.euclidean_length();
    if geometry_length <= 0.0 {
        return branch.geometry.points().next();
    }

    let chainage = snap_chainage(branch, chainage);
    let along = if branch.custom_length && branch.length > 0.0 {
        chainage * geometry_length / branch.length
    } else {
        chainage
    };

    let fraction = (along / geometry_length).clamp(0.0, 1.0);
    branch.geometry.line_interpolate_point(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BranchId;
    use geo::line_string;

    fn branch() -> Branch {
        Branch::new(
            BranchId::new(1),
            "B1",
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 50.0)],
        )
    }

    #[test]
    fn test_snap_chainage_clamps() {
        let b = branch();
        assert_eq!(snap_chainage(&b, -5.0), 0.0);
        assert_eq!(snap_chainage(&b, 75.0), 75.0);
        assert_eq!(snap_chainage(&b, 500.0), 150.0);
        assert_eq!(snap_chainage(&b, f64::NAN), 0.0);
    }

    #[test]
    fn test_point_follows_vertices() {
        let b = branch();
        let p = point_at_chainage(&b, 125.0).unwrap();
        assert!((p.x() - 100.0).abs() < 1e-9);
        assert!((p.y() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_length_scales_chainage() {
        let b = branch().with_custom_length(300.0);
        // Halfway along 300 m maps halfway along the 150 m line.
        let p = point_at_chainage(&b, 150.0).unwrap();
        assert!((p.x() - 75.0).abs() < 1e-9);
        assert!(p.y().abs() < 1e-9);
    }

    #[test]
    fn test_branch_without_line_has_no_point() {
        let mut b = branch();
        b.geometry = line_string![(x: 1.0, y: 1.0)];
        assert!(point_at_chainage(&b, 10.0).is_none());
    }
}
