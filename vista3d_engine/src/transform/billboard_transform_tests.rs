use super::*;

#[test]
fn test_stays_upright() {
    let mut billboard = BillboardTransform::new();
    billboard.set_translation(1.0, 1.0, 0.0);

    billboard.update_from_eye(Vec3::new(-4.0, 6.0, 20.0));

    let m = billboard.matrix();
    assert!(m.z_axis.truncate().abs_diff_eq(Vec3::Z, 1e-6));
    let look = m.y_axis.truncate();
    assert!(look.z.abs() < 1e-6);
    assert!(look.abs_diff_eq(Vec3::new(-5.0, 5.0, 0.0).normalize(), 1e-5));
    assert!(m.w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
}

#[test]
fn test_eye_straight_above_falls_back_to_identity() {
    let mut billboard = BillboardTransform::new();
    billboard.set_translation(2.0, 3.0, 0.0);

    billboard.update_from_eye(Vec3::new(2.0, 3.0, 50.0));

    assert!(billboard.matrix().is_finite());
    assert!(billboard.matrix().abs_diff_eq(*billboard.base().matrix(), 1e-6));
}

#[test]
fn test_rotation_is_proper() {
    let r = upright_rotation(Vec3::new(3.0, -1.0, 2.0));
    assert!((r.determinant() - 1.0).abs() < 1e-5);
}

#[test]
fn test_staleness() {
    let mut billboard = BillboardTransform::new();
    let eye = Vec3::new(0.0, 5.0, 0.0);
    billboard.update_from_eye(eye);
    assert!(!billboard.is_stale(eye));

    billboard.set_scaling(2.0, 2.0, 2.0);
    assert!(billboard.is_stale(eye));
}
