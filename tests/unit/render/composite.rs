use super::*;

#[test]
fn opaque_overlay_replaces_base() {
    let mut base = vec![10, 20, 30, 255];
    over_straight_in_place(&mut base, &[255, 255, 255, 255]).unwrap();
    assert_eq!(base, vec![255, 255, 255, 255]);
}

#[test]
fn transparent_overlay_keeps_base_and_alpha() {
    let mut base = vec![10, 20, 30, 40];
    over_straight_in_place(&mut base, &[0, 0, 0, 0]).unwrap();
    assert_eq!(base, vec![10, 20, 30, 40]);
}

#[test]
fn half_white_over_black() {
    let mut base = vec![0, 0, 0, 255];
    over_straight_in_place(&mut base, &[128, 128, 128, 128]).unwrap();
    assert_eq!(base, vec![128, 128, 128, 255]);
}

#[test]
fn mismatched_buffers_error() {
    let mut base = vec![0u8; 8];
    assert!(over_straight_in_place(&mut base, &[0u8; 4]).is_err());
}

#[test]
fn flatten_transparent_is_white() {
    assert_eq!(flatten_on_white([0, 0, 0, 0]), [255, 255, 255]);
    assert_eq!(flatten_on_white([10, 20, 30, 255]), [10, 20, 30]);
}
