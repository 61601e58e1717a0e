//! Events in, pixels out, without any hardware.

use touchtest::app::render;
use touchtest::calibrate::{LinearCalibration, Mapping, Rotation, Transform};
use touchtest::display::{Canvas, Color, PixelFormat, Surface};
use touchtest::multitouch::{MtDecoder, Protocol, Step, TouchSample};
use touchtest::{AbsoluteAxisCode, InputEvent, SynchronizationCode};

fn screen_frame(decoder: &MtDecoder, transform: &Transform) -> Vec<TouchSample> {
    decoder
        .frame()
        .iter()
        .map(|s| {
            let (x, y) = transform.apply(s.x, s.y);
            TouchSample { x, y, ..*s }
        })
        .collect()
}

fn white_pixels(canvas: &Canvas) -> usize {
    let (w, h) = canvas.size();
    let white = canvas.format().map_rgb(Color::WHITE);
    (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y) == Some(white))
        .count()
}

#[test]
fn calibrated_type_a_frame_draws_one_square_per_contact() {
    let mut decoder = MtDecoder::new(Protocol::Unslotted, 5);
    let events = [
        InputEvent::abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 200),
        InputEvent::abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 100),
        InputEvent::syn(SynchronizationCode::SYN_MT_REPORT),
        InputEvent::abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 400),
        InputEvent::abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 300),
        InputEvent::syn(SynchronizationCode::SYN_MT_REPORT),
        InputEvent::syn(SynchronizationCode::SYN_REPORT),
    ];
    let steps: Vec<Step> = events.iter().map(|ev| decoder.process(ev)).collect();
    assert_eq!(steps.last(), Some(&Step::Frame));

    // halve both axes
    let cal = LinearCalibration::parse("1 0 0 0 1 0 2 320 240").unwrap();
    let transform = Transform::new(Mapping::Linear(cal), Rotation::None, (320, 240));
    let frame = screen_frame(&decoder, &transform);
    let points: Vec<_> = frame.iter().filter(|s| s.valid).map(|s| (s.x, s.y)).collect();
    assert_eq!(points, vec![(100, 50), (200, 150)]);

    let mut canvas = Canvas::new(320, 240, PixelFormat::RGB565);
    render(&mut canvas, &frame, 7);
    assert_eq!(white_pixels(&canvas), 2 * 7 * 7);
    assert_eq!(canvas.pixel(100, 50), Some(0xffff));
    assert_eq!(canvas.pixel(106, 56), Some(0xffff));
    assert_eq!(canvas.pixel(107, 56), Some(0));
}

#[test]
fn rotated_scaled_frame_stays_on_screen() {
    let mut decoder = MtDecoder::new(Protocol::SingleTouch, 1);
    decoder.set_has_touch_key(false);
    for ev in [
        InputEvent::abs(AbsoluteAxisCode::ABS_X, 1023),
        InputEvent::abs(AbsoluteAxisCode::ABS_Y, 0),
        InputEvent::abs(AbsoluteAxisCode::ABS_PRESSURE, 10),
        InputEvent::syn(SynchronizationCode::SYN_REPORT),
    ] {
        decoder.process(&ev);
    }

    let range = |max| touchtest::calibrate::AxisRange { min: 0, max };
    // 640x480 panel shown rotated clockwise on a 480x640 screen
    let transform = Transform::new(
        Mapping::Scaled {
            x: range(1023),
            y: range(1023),
        },
        Rotation::Clockwise,
        (480, 640),
    );
    let frame = screen_frame(&decoder, &transform);
    assert_eq!((frame[0].x, frame[0].y), (0, 0));

    let mut canvas = Canvas::new(480, 640, PixelFormat::XRGB8888);
    render(&mut canvas, &frame, 4);
    assert_eq!(white_pixels(&canvas), 16);
}
