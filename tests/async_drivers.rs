#![cfg(all(feature = "gc2607", feature = "sc202cs", feature = "mira220", feature = "pivariety"))]

mod common;

use cam_sensor::{
    sensors::{gc2607, mira220, pivariety, sc202cs},
    CameraSensor, Error, Gc2607, Mira220, NoPin, ParamId, ParamValue, Pivariety, PowerControl, Sc202cs,
};
use common::{expect_program, read32, read8, write32, write8, Clock, Sleeps};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::{
    digital::{Mock as PinMock, State, Transaction as PinTx},
    i2c::Mock as I2cMock,
};
use futures::executor::block_on;

#[test]
fn pivariety_async_mode_switch() {
    let a = pivariety::SCCB_ADDR;
    let format = &pivariety::FORMATS[1];
    let (writes, _) = expect_program(a, &format.regs);
    let mut expected = vec![read32(a, 0x0103, 0x30)];
    expected.extend(writes);
    expected.extend([
        write32(a, 0x0401, 0x0098_0911),
        write32(a, 0x0406, 0x2dc),
        write32(a, 0x0401, 0x009e_0903),
        write32(a, 0x0406, 1954),
        write32(a, 0x0100, 1),
    ]);
    let mut i2c = I2cMock::new(&expected);

    let cam = block_on(async {
        let mut cam = Pivariety::detect_async(i2c.clone(), PowerControl::none(), Sleeps::default(), pivariety::CONFIG)
            .await
            .unwrap();
        cam.set_format_async(Some(format)).await.unwrap();
        cam.set_stream_async(true).await.unwrap();
        cam
    });
    assert!(cam.get_format().is(format));
    assert!(cam.stream_status());

    let (_, _, delay) = cam.release();
    assert_eq!(delay.0, vec![100, 1000]);
    i2c.done();
}

#[test]
fn mira220_async_detect_and_exposure() {
    let a = mira220::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[
        read8(a, 0x102c, 0x01),
        read8(a, 0x102b, 0x30),
        write8(a, 0x100c, 0x23),
        write8(a, 0x100d, 0x01),
        write8(a, 0x1095, 0x01),
    ]);
    let pwdn = PinMock::new(&[PinTx::set(State::Low), PinTx::set(State::High)]);

    let (cam, res) = block_on(async {
        let power = PowerControl::new(None::<NoPin>, Some(pwdn));
        let mut cam = Mira220::detect_async(i2c.clone(), power, Sleeps::default(), mira220::CONFIG)
            .await
            .unwrap();
        cam.set_para_value_async(ParamValue::ExposureVal(0x123)).await.unwrap();
        cam.set_para_value_async(ParamValue::VFlip(true)).await.unwrap();
        let res = cam.set_para_value_async(ParamValue::Gain(1)).await;
        (cam, res)
    });
    assert_eq!(res, Err(Error::InvalidArgument));
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x123));
    assert_eq!(cam.get_para_value(ParamId::VFlip).unwrap(), ParamValue::VFlip(true));

    let (_, power, delay) = cam.release();
    assert_eq!(delay.0, vec![10, 10]);
    power.release().1.unwrap().done();
    i2c.done();
}

#[test]
fn async_detect_powers_off_on_a_bus_error() {
    let a = sc202cs::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(a, 0x3107, 0xeb).with_error(ErrorKind::Other)]);
    let power = PowerControl::none().with_xclk(Clock::default());

    let res = block_on(Sc202cs::detect_async(i2c.clone(), power, Sleeps::default(), sc202cs::CONFIG));
    let Err(e) = res else { panic!("detect must fail on a bus error") };
    assert_eq!(e, Error::Bus(ErrorKind::Other));
    i2c.done();
}

#[test]
fn async_set_format_rejects_foreign_modes() {
    let a = gc2607::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[
        read8(a, 0x03f0, 0x26),
        read8(a, 0x03f1, 0x07),
        write8(a, 0x0202, 0x02),
        write8(a, 0x0203, 0x90),
    ]);
    let power = PowerControl::none().with_xclk(Clock::default());

    let cam = block_on(async {
        let mut cam = Gc2607::detect_async(i2c.clone(), power, Sleeps::default(), gc2607::CONFIG)
            .await
            .unwrap();
        let res = cam.set_format_async(Some(&sc202cs::FORMATS[0])).await;
        assert_eq!(res, Err(Error::InvalidArgument));
        cam.set_para_value_async(ParamValue::GroupExpGain { exposure_time: 10, gain_index: 2 })
            .await
            .unwrap();
        cam.power_off_async().await.unwrap();
        cam
    });
    assert!(cam.get_format().is(&gc2607::FORMATS[0]));
    assert_eq!(cam.get_para_value(ParamId::ExposureVal).unwrap(), ParamValue::ExposureVal(0x290));

    let (_, power, delay) = cam.release();
    assert_eq!(delay.0, vec![2]);
    assert_eq!(power.release().2.unwrap().0, vec![24_000_000, 0]);
    i2c.done();
}
