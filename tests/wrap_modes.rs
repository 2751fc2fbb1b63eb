//! Out-of-range policies and construction validation.

use voxstore::{Codec, DeflateCodec, PagedVolume, Region, VolumeError, WrapMode};

fn bordered_volume() -> PagedVolume<u8> {
    PagedVolume::builder(Region::cubic(0, 7))
        .block_side_length(8)
        .border_value(9)
        .build()
        .unwrap()
}

#[test]
fn validate_rejects_out_of_range_reads() {
    let mut volume = bordered_volume();
    let err = volume
        .get_voxel(-1, 0, 0, WrapMode::Validate, 0)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VolumeError>(),
        Some(VolumeError::OutOfRange { x: -1, y: 0, z: 0 })
    ));
}

#[test]
fn clamp_reads_nearest_in_range_voxel() {
    let mut volume = bordered_volume();
    volume.set_voxel(0, 0, 0, 3, WrapMode::Validate).unwrap();

    assert_eq!(volume.get_voxel(-1, 0, 0, WrapMode::Clamp, 0).unwrap(), 3);
    assert_eq!(
        volume.get_voxel(-10, -10, -10, WrapMode::Clamp, 0).unwrap(),
        3
    );
}

#[test]
fn border_returns_caller_value_outside() {
    let mut volume = bordered_volume();
    assert_eq!(volume.get_voxel(-1, 0, 0, WrapMode::Border, 7).unwrap(), 7);

    volume.set_voxel(2, 2, 2, 5, WrapMode::Validate).unwrap();
    assert_eq!(volume.get_voxel(2, 2, 2, WrapMode::Border, 7).unwrap(), 5);
}

#[test]
fn get_voxel_at_uses_volume_border_value() {
    let mut volume = bordered_volume();
    assert_eq!(volume.get_voxel_at(-1, 0, 0).unwrap(), 9);
    assert_eq!(volume.get_voxel_at(8, 0, 0).unwrap(), 9);
    assert_eq!(volume.get_voxel_at(0, 0, 0).unwrap(), 0);
}

#[test]
fn assume_valid_skips_the_range_check() {
    let mut volume = bordered_volume();
    volume.set_voxel(7, 7, 7, 4, WrapMode::Validate).unwrap();
    assert_eq!(
        volume.get_voxel(7, 7, 7, WrapMode::AssumeValid, 0).unwrap(),
        4
    );
}

#[test]
fn writes_reject_clamp_and_border_modes() {
    let mut volume = bordered_volume();

    for mode in [WrapMode::Clamp, WrapMode::Border] {
        let err = volume.set_voxel(0, 0, 0, 1, mode).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VolumeError>(),
            Some(VolumeError::InvalidArgument { .. })
        ));
    }
}

#[test]
fn validated_writes_reject_out_of_range() {
    let mut volume = bordered_volume();
    let err = volume
        .set_voxel(8, 0, 0, 1, WrapMode::Validate)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VolumeError>(),
        Some(VolumeError::OutOfRange { .. })
    ));

    // AssumeValid writes outside the valid region are the caller's promise
    // to keep; the volume just pages in the covering block.
    volume.set_voxel(8, 0, 0, 1, WrapMode::AssumeValid).unwrap();
}

#[test]
fn construction_rejects_zero_side_length() {
    let err = PagedVolume::<u8>::new(Region::cubic(0, 31), 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VolumeError>(),
        Some(VolumeError::InvalidArgument { .. })
    ));
}

#[test]
fn construction_rejects_non_power_of_two_side_length() {
    let err = PagedVolume::<u8>::new(Region::cubic(0, 31), 24).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VolumeError>(),
        Some(VolumeError::InvalidArgument { .. })
    ));
}

#[test]
fn construction_rejects_missing_codec() {
    let codec: Option<Box<dyn Codec>> = None;
    let err = PagedVolume::<u8>::with_pager(Region::cubic(0, 31), codec, None, 16).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VolumeError>(),
        Some(VolumeError::InvalidArgument { .. })
    ));
}

#[test]
fn construction_accepts_explicit_codec_without_pager() {
    let codec: Option<Box<dyn Codec>> = Some(Box::new(DeflateCodec::best()));
    let mut volume = PagedVolume::<u8>::with_pager(Region::cubic(0, 31), codec, None, 16).unwrap();
    volume.set_voxel(1, 1, 1, 2, WrapMode::Validate).unwrap();
    assert_eq!(volume.get_voxel_at(1, 1, 1).unwrap(), 2);
}
