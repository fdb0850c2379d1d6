#![cfg(all(
    feature = "gc2607",
    feature = "sc202cs",
    feature = "sc035hgs",
    feature = "mira220",
    feature = "pivariety"
))]

mod common;

use cam_sensor::{
    sensors::{gc2607, mira220, pivariety, sc035hgs, sc202cs},
    CameraSensor, Error, Gc2607, Mira220, ParamDesc, ParamId, ParamValue, Pivariety, PowerControl, Sc035hgs,
    Sc202cs,
};
use common::{expect_program, read32, read8, write32, write8, Sleeps};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTx};

fn with_id(id: Vec<I2cTx>, rest: Vec<I2cTx>) -> I2cMock {
    I2cMock::new(&[id, rest].concat())
}

fn gc2607(rest: Vec<I2cTx>) -> (Gc2607<I2cMock, Sleeps>, I2cMock) {
    let a = gc2607::SCCB_ADDR;
    let i2c = with_id(vec![read8(a, 0x03f0, 0x26), read8(a, 0x03f1, 0x07)], rest);
    let cam = Gc2607::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), gc2607::CONFIG).unwrap();
    (cam, i2c)
}

fn sc202cs(rest: Vec<I2cTx>) -> (Sc202cs<I2cMock, Sleeps>, I2cMock) {
    let a = sc202cs::SCCB_ADDR;
    let i2c = with_id(vec![read8(a, 0x3107, 0xeb), read8(a, 0x3108, 0x52)], rest);
    let cam = Sc202cs::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), sc202cs::CONFIG).unwrap();
    (cam, i2c)
}

fn sc035hgs(rest: Vec<I2cTx>) -> (Sc035hgs<I2cMock, Sleeps>, I2cMock) {
    let a = sc035hgs::SCCB_ADDR;
    let i2c = with_id(vec![read8(a, 0x3107, 0x00), read8(a, 0x3108, 0x31)], rest);
    let cam = Sc035hgs::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), sc035hgs::CONFIG).unwrap();
    (cam, i2c)
}

fn mira220(rest: Vec<I2cTx>) -> (Mira220<I2cMock, Sleeps>, I2cMock) {
    let a = mira220::SCCB_ADDR;
    let i2c = with_id(vec![read8(a, 0x102c, 0x01), read8(a, 0x102b, 0x30)], rest);
    let cam = Mira220::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), mira220::CONFIG).unwrap();
    (cam, i2c)
}

fn pivariety(config: pivariety::PivarietyConfig, rest: Vec<I2cTx>) -> (Pivariety<I2cMock, Sleeps>, I2cMock) {
    let i2c = with_id(vec![read32(pivariety::SCCB_ADDR, 0x0103, 0x30)], rest);
    let cam = Pivariety::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), config).unwrap();
    (cam, i2c)
}

#[test]
fn gc2607_default_format_replays_the_program() {
    let (writes, pauses) = expect_program(gc2607::SCCB_ADDR, &gc2607::FORMATS[0].regs);
    assert_eq!(pauses, vec![5, 10]);
    let (mut cam, mut i2c) = gc2607(writes);

    cam.set_format(None).unwrap();
    assert!(cam.get_format().is(&gc2607::FORMATS[0]));
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x438));

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, pauses);
    i2c.done();
}

#[test]
fn gc2607_exposure_is_clamped_before_it_is_written() {
    let a = gc2607::SCCB_ADDR;
    let (mut cam, mut i2c) = gc2607(vec![
        // 960x540: VTS 1367 - 6
        write8(a, 0x0202, 0x05),
        write8(a, 0x0203, 0x51),
        write8(a, 0x0202, 0x00),
        write8(a, 0x0203, 0x10),
        // 1 ms at 30 fps * 1367 lines * 16 steps
        write8(a, 0x0202, 0x02),
        write8(a, 0x0203, 0x90),
    ]);

    cam.set_para_value(ParamValue::ExposureVal(0xffff)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x551));
    cam.set_para_value(ParamValue::ExposureVal(1)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x10));
    cam.set_para_value(ParamValue::ExposureTime(10)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x290));
    assert_eq!(cam.get_para_value(ParamId::ExposureTime).unwrap(), ParamValue::ExposureTime(10));

    drop(cam);
    i2c.done();
}

#[test]
fn gc2607_group_exposure_and_gain() {
    let a = gc2607::SCCB_ADDR;
    let (mut cam, mut i2c) = gc2607(vec![
        write8(a, 0x0202, 0x02),
        write8(a, 0x0203, 0x90),
        write8(a, 0x0202, 0x00).with_error(ErrorKind::Other),
    ]);

    cam.set_para_value(ParamValue::GroupExpGain { exposure_time: 10, gain_index: 5 }).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x290));
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(0));

    // a failed exposure write leaves the tracked exposure alone
    let res = cam.set_para_value(ParamValue::GroupExpGain { exposure_time: 1, gain_index: 0 });
    assert_eq!(res, Err(Error::Bus(ErrorKind::Other)));
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x290));

    drop(cam);
    i2c.done();
}

#[test]
fn formats_of_other_sensors_are_rejected() {
    let (mut cam, mut i2c) = gc2607(vec![]);

    assert_eq!(cam.set_format(Some(&pivariety::FORMATS[0])), Err(Error::InvalidArgument));
    assert_eq!(cam.set_format(Some(&sc202cs::FORMATS[0])), Err(Error::InvalidArgument));
    assert!(cam.get_format().is(&gc2607::FORMATS[0]));
    let Ok(ParamDesc::Number { max, .. }) = cam.query_para_desc(ParamId::ExposureVal) else {
        panic!("exposure is a number");
    };
    assert_eq!(max, 1367 - 6);

    let (_, _, delay) = cam.release();
    assert!(delay.0.is_empty());
    i2c.done();
}

#[test]
fn gc2607_flip_keeps_the_mirror_bit() {
    let a = gc2607::SCCB_ADDR;
    let (mut cam, mut i2c) = gc2607(vec![read8(a, 0x0101, 0x01), write8(a, 0x0101, 0x03)]);

    cam.set_para_value(ParamValue::VFlip(true)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::VFlip).unwrap(), ParamValue::VFlip(true));
    assert_eq!(cam.get_para_value(ParamId::GroupExpGain), Err(Error::NotSupported));
    // gain is fixed at 1x and only tracked
    cam.set_para_value(ParamValue::Gain(7)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(0));

    drop(cam);
    i2c.done();
}

#[test]
fn sc202cs_mirror_and_flip_are_two_bit_fields() {
    let a = sc202cs::SCCB_ADDR;
    let (mut cam, mut i2c) = sc202cs(vec![
        read8(a, 0x3221, 0x60),
        write8(a, 0x3221, 0x66),
        read8(a, 0x3221, 0x66),
        write8(a, 0x3221, 0x06),
    ]);

    cam.set_para_value(ParamValue::HMirror(true)).unwrap();
    cam.set_para_value(ParamValue::VFlip(false)).unwrap();
    assert_eq!(cam.set_para_value(ParamValue::Gain(1)), Err(Error::InvalidArgument));
    assert_eq!(cam.get_para_value(ParamId::VFlip), Err(Error::NotSupported));
    assert_eq!(cam.query_para_desc(ParamId::VFlip), Err(Error::NotSupported));
    assert_eq!(cam.set_register(0x0100, 0x1ff), Err(Error::InvalidArgument));

    drop(cam);
    i2c.done();
}

#[test]
fn sc202cs_stream_and_end_terminated_program() {
    let a = sc202cs::SCCB_ADDR;
    let format = &sc202cs::FORMATS[3];
    let (mut writes, pauses) = expect_program(a, &format.regs);
    assert_eq!(writes.len(), 11);
    writes.push(write8(a, 0x0100, 0x01));
    let (mut cam, mut i2c) = sc202cs(writes);

    cam.set_format(Some(format)).unwrap();
    cam.set_stream(true).unwrap();
    assert!(cam.stream_status());
    assert_eq!(cam.get_format().height, 900);

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, pauses);
    i2c.done();
}

#[test]
fn sc035hgs_failed_program_reports_set_format() {
    let a = sc035hgs::SCCB_ADDR;
    let (mut cam, mut i2c) = sc035hgs(vec![write8(a, 0x0103, 0x01).with_error(ErrorKind::Other)]);

    assert_eq!(cam.set_format(None), Err(Error::SetFormat(ErrorKind::Other)));
    assert_eq!(cam.query_para_desc(ParamId::HMirror), Ok(ParamDesc::SWITCH));
    assert_eq!(cam.query_para_desc(ParamId::ExposureVal), Err(Error::InvalidArgument));

    drop(cam);
    i2c.done();
}

#[test]
fn sc035hgs_soft_reset_waits_after_the_write() {
    let a = sc035hgs::SCCB_ADDR;
    let (mut cam, mut i2c) = sc035hgs(vec![
        read8(a, 0x0103, 0x00),
        write8(a, 0x0103, 0x01),
        read8(a, 0x4501, 0x00),
        write8(a, 0x4501, 0x08),
    ]);

    cam.soft_reset().unwrap();
    cam.set_test_pattern(true).unwrap();

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, vec![5]);
    i2c.done();
}

#[test]
fn mira220_exposure_is_little_register_first() {
    let a = mira220::SCCB_ADDR;
    let (mut cam, mut i2c) = mira220(vec![
        write8(a, 0x100c, 0x23),
        write8(a, 0x100d, 0x01),
        // 1 ms at 6 fps * 600 lines rounds to 4 lines, below the minimum of 8
        write8(a, 0x100c, 0x08),
        write8(a, 0x100d, 0x00),
    ]);

    cam.set_para_value(ParamValue::ExposureVal(0x123)).unwrap();
    cam.set_para_value(ParamValue::GroupExpGain { exposure_time: 10, gain_index: 3 }).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(8));
    assert_eq!(cam.set_para_value(ParamValue::Gain(1)), Err(Error::InvalidArgument));
    assert_eq!(cam.get_para_value(ParamId::Gain), Err(Error::NotSupported));
    assert_eq!(cam.query_para_desc(ParamId::Gain), Err(Error::InvalidArgument));

    drop(cam);
    i2c.done();
}

#[test]
fn mira220_stream_state_changes_only_on_success() {
    let a = mira220::SCCB_ADDR;
    let (mut cam, mut i2c) = mira220(vec![
        write8(a, 0x1003, 0x10),
        write8(a, 0x10f0, 0x01).with_error(ErrorKind::Other),
        write8(a, 0x1003, 0x10),
        write8(a, 0x10f0, 0x01),
    ]);

    assert_eq!(cam.set_stream(true), Err(Error::Bus(ErrorKind::Other)));
    assert!(!cam.stream_status());
    cam.set_stream(true).unwrap();
    assert!(cam.stream_status());

    drop(cam);
    i2c.done();
}

#[test]
fn pivariety_gain_is_written_as_a_control() {
    let a = pivariety::SCCB_ADDR;
    let (mut cam, mut i2c) = pivariety(
        pivariety::CONFIG,
        vec![
            write32(a, 0x0401, 0x009e_0903),
            write32(a, 0x0406, 16_000),
            // 10 ms over 20.282 us lines
            write32(a, 0x0401, 0x0098_0911),
            write32(a, 0x0406, 493),
        ],
    );

    cam.set_para_value(ParamValue::Gain(2000)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(960));
    cam.set_para_value(ParamValue::ExposureTime(100)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(493));
    // no-ops on this module
    cam.set_para_value(ParamValue::VFlip(true)).unwrap();
    cam.soft_reset().unwrap();

    drop(cam);
    i2c.done();
}

#[test]
fn pivariety_set_format_waits_and_restores_defaults() {
    let a = pivariety::SCCB_ADDR;
    let format = &pivariety::FORMATS[4];
    let (mut writes, pauses) = expect_program(a, &format.regs);
    assert!(pauses.is_empty());
    writes.extend([
        write32(a, 0x0401, 0x0098_0911),
        write32(a, 0x0406, 0x2dc),
        write32(a, 0x0401, 0x009e_0903),
        write32(a, 0x0406, 1954),
    ]);
    let (mut cam, mut i2c) = pivariety(pivariety::CONFIG, writes);

    cam.set_format(Some(format)).unwrap();
    assert!(cam.get_format().is(format));
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(500));

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, vec![100, 1000]);
    i2c.done();
}

#[test]
fn pivariety_failed_program_still_waits_and_keeps_the_mode() {
    let a = pivariety::SCCB_ADDR;
    let (mut cam, mut i2c) = pivariety(pivariety::CONFIG, vec![write32(a, 0x0200, 0).with_error(ErrorKind::Other)]);

    assert_eq!(cam.set_format(Some(&pivariety::FORMATS[4])), Err(Error::SetFormat(ErrorKind::Other)));
    assert!(cam.get_format().is(&pivariety::FORMATS[0]));
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x2dc));
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(500));

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, vec![100, 1000]);
    i2c.done();
}

#[test]
fn pivariety_gain_default_follows_a_low_limit() {
    let (cam, mut i2c) = pivariety(pivariety::CONFIG.with_abs_gain_limit(1200), vec![]);

    let Ok(ParamDesc::Enumeration { elements, default }) = cam.query_para_desc(ParamId::Gain) else {
        panic!("gain is an enumeration");
    };
    assert_eq!(elements.len(), 172);
    assert_eq!(default, 171);
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(default));

    drop(cam);
    i2c.done();
}

#[test]
fn pivariety_gain_limit_bounds_the_descriptor() {
    let config = pivariety::CONFIG.with_abs_gain_limit(2000);
    let a = pivariety::SCCB_ADDR;
    let (mut cam, mut i2c) = pivariety(config, vec![write32(a, 0x0401, 0x009e_0903), write32(a, 0x0406, 2000)]);

    let Ok(ParamDesc::Enumeration { elements, default }) = cam.query_para_desc(ParamId::Gain) else {
        panic!("gain is an enumeration");
    };
    assert_eq!(elements.len(), 513);
    assert_eq!(default, 500);
    cam.set_para_value(ParamValue::Gain(900)).unwrap();
    assert_eq!(cam.get_para_value(ParamId::Gain).unwrap(), ParamValue::Gain(512));

    drop(cam);
    i2c.done();
}
