use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
}

#[test]
fn over_opaque_endpoints() {
    assert_eq!(over_opaque(200, 255, 10), 200);
    assert_eq!(over_opaque(200, 0, 10), 10);
    assert_eq!(over_opaque(255, 128, 0), 128);
}
