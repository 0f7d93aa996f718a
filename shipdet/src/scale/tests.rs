use super::*;

#[test]
fn test_zero_scale_rejected() {
    assert_eq!(ScaleFactor::new(0), Err(ConfigError::ZeroScale));
}

#[test]
fn test_apply_matches_clamped_integer_division() {
    for scale in [1u32, 2, 3, 7, 35, 256, 1000] {
        let factor = ScaleFactor::new(scale).unwrap();
        for v in (0u32..70_000).step_by(97) {
            let expected = (v / scale).min(255) as u8;
            assert_eq!(factor.apply(v), expected, "v={v} scale={scale}");
        }
    }
}

#[test]
fn test_apply_truncates() {
    let factor = ScaleFactor::new(35).unwrap();
    assert_eq!(factor.apply(34u16), 0);
    assert_eq!(factor.apply(35u16), 1);
    assert_eq!(factor.apply(69u16), 1);
    assert_eq!(factor.apply(u16::MAX), 255);
}

#[test]
fn test_negative_samples_clamp_to_zero() {
    let factor = ScaleFactor::new(2).unwrap();
    assert_eq!(factor.apply(-1i16), 0);
    assert_eq!(factor.apply(-300i32), 0);
    assert_eq!(factor.apply(i32::MIN), 0);
}

#[test]
fn test_scale_band_dispatches_depth() {
    let band = BandBuffer::from(Buffer2::new(3, 1, vec![10u32, 400, 9_999_999]));
    let mut out = Buffer2::new_default(3, 1);
    ScaleFactor::new(4).unwrap().scale_band(&band, &mut out);
    assert_eq!(out.pixels(), &[2, 100, 255]);
}

#[test]
fn test_default_scale() {
    assert_eq!(ScaleFactor::default().get(), 35);
}
