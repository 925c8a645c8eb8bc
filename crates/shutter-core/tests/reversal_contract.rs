//! Contract Test: Direction Reversal
//!
//! A reversed shutter presents `100 - raw` to callers and sends `100 - target`
//! to the device. Reversal is applied exactly once in each direction.
//!
//! If this test fails, someone has:
//! - Applied reversal twice (or not at all) on one of the paths
//! - Cached the logical value instead of the raw device value

mod common;

use common::*;
use shutter_core::RollerShutter;
use shutter_core::traits::Shutter;
use std::sync::Arc;

#[tokio::test]
async fn reversed_read_inverts_device_value() {
    let device = FakeDevice::new(30);

    let (plain, _) = fake_shutter("plain", &device, false);
    let (reversed, _) = fake_shutter("reversed", &device, true);

    assert_eq!(plain.refresh().await.unwrap(), pos(30));
    assert_eq!(reversed.refresh().await.unwrap(), pos(70));
    assert_eq!(reversed.raw_position(), pos(30));
}

#[tokio::test]
async fn reversed_command_inverts_target() {
    let device = FakeDevice::new(0);
    let (shutter, _) = fake_shutter("reversed", &device, true);

    shutter.set_position(pos(70)).await.unwrap();

    assert_eq!(device.commands(), vec![pos(30)]);
    assert_eq!(shutter.position().unwrap(), pos(70));
}

#[tokio::test]
async fn set_then_get_round_trips_both_ways() {
    for reverse in [false, true] {
        let device = FakeDevice::new(0);
        let (shutter, _) = fake_shutter("window", &device, reverse);

        for target in [0, 1, 49, 50, 99, 100] {
            shutter.set_position(pos(target)).await.unwrap();
            assert_eq!(
                shutter.position().unwrap(),
                pos(target),
                "reverse={reverse} target={target}"
            );
        }

        let expected_raw: Vec<_> = [0, 1, 49, 50, 99, 100]
            .into_iter()
            .map(|t| if reverse { pos(100 - t) } else { pos(t) })
            .collect();
        assert_eq!(device.commands(), expected_raw);
    }
}

#[tokio::test]
async fn polling_respects_reversal() {
    let device = FakeDevice::new(0);
    let (shutter, _) = fake_shutter("reversed", &device, true);

    shutter.start();
    device.set_position(20);
    tokio::time::sleep(SETTLE).await;
    shutter.stop();

    assert_eq!(shutter.position().unwrap(), pos(80));
}

#[tokio::test]
async fn settings_are_fixed_at_construction() {
    let device = FakeDevice::new(10);
    let candidates: Vec<Arc<dyn shutter_core::DriverFactory>> =
        vec![Arc::new(FakeFactory::new("fake", &device))];
    let shutter = RollerShutter::builder("window", "http://window.local", candidates)
        .reverse_directions(true)
        .poll_config(fast_poll())
        .build();

    shutter.start();
    tokio::time::sleep(SETTLE).await;

    assert!(shutter.reverse_directions());
    assert_eq!(shutter.poll_config(), &fast_poll());
    assert_eq!(shutter.position().unwrap(), pos(90));

    shutter.stop();
}
