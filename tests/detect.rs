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
    CameraSensor, Error, Gc2607, Mira220, NoPin, Pivariety, PowerControl, Sc035hgs, Sc202cs,
};
use common::{read32, read8, Clock, Sleeps};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::{
    digital::{Mock as PinMock, State, Transaction as PinTx},
    i2c::{Mock as I2cMock, Transaction as I2cTx},
};

#[test]
fn gc2607_detect_reads_both_id_bytes() {
    let addr = gc2607::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(addr, 0x03f0, 0x26), read8(addr, 0x03f1, 0x07)]);
    let rst = PinMock::new(&[PinTx::set(State::Low), PinTx::set(State::High)]);

    let cam = Gc2607::detect(
        i2c.clone(),
        PowerControl::new(Some(rst), None::<NoPin>),
        Sleeps::default(),
        gc2607::CONFIG,
    )
    .unwrap();
    assert_eq!(cam.name(), "GC2607");
    assert_eq!(cam.id().pid, 0x2607);
    assert!(cam.get_format().is(&gc2607::FORMATS[0]));
    assert!(!cam.stream_status());

    let (_, power, delay) = cam.release();
    // no XCLK generator, so only the two RESET edges
    assert_eq!(delay.0, vec![10, 10]);
    power.release().0.unwrap().done();
    i2c.done();
}

#[test]
fn xclk_is_started_for_detect_and_stopped_on_power_off() {
    let addr = gc2607::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(addr, 0x03f0, 0x26), read8(addr, 0x03f1, 0x07)]);
    let power = PowerControl::none().with_xclk(Clock::default());

    let mut cam = Gc2607::detect(i2c.clone(), power, Sleeps::default(), gc2607::CONFIG).unwrap();
    cam.power_off().unwrap();

    let (_, power, delay) = cam.release();
    // 2 ms for the clock to settle, no pins wired
    assert_eq!(delay.0, vec![2]);
    assert_eq!(power.release().2.unwrap().0, vec![24_000_000, 0]);
    i2c.done();
}

#[test]
fn failed_detect_stops_the_clock() {
    let addr = sc035hgs::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(addr, 0x3107, 0x00), read8(addr, 0x3108, 0x32)]);
    let power = PowerControl::none().with_xclk(Clock::default());

    let Err(e) = Sc035hgs::detect(i2c.clone(), power, Sleeps::default(), sc035hgs::CONFIG) else {
        panic!("detect must fail on a foreign id");
    };
    assert_eq!(e, Error::UnexpectedId { expected: 0x0031, found: 0x0032 });
    i2c.done();
}

#[test]
fn wrong_id_powers_the_sensor_back_off() {
    let addr = sc202cs::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(addr, 0x3107, 0xeb), read8(addr, 0x3108, 0x53)]);
    let rst = PinMock::new(&[
        PinTx::set(State::Low),
        PinTx::set(State::High),
        PinTx::set(State::High),
        PinTx::set(State::Low),
    ]);
    let mut rst_handle = rst.clone();

    let res = Sc202cs::detect(
        i2c.clone(),
        PowerControl::new(Some(rst), None::<NoPin>),
        Sleeps::default(),
        sc202cs::CONFIG,
    );
    let Err(e) = res else { panic!("detect must fail on a foreign id") };
    assert_eq!(e, Error::UnexpectedId { expected: 0xeb52, found: 0xeb53 });

    rst_handle.done();
    i2c.done();
}

#[test]
fn bus_error_during_detect_is_reported() {
    let mut i2c = I2cMock::new(&[
        I2cTx::write_read(pivariety::SCCB_ADDR, vec![0x01, 0x03], vec![0; 4]).with_error(ErrorKind::Other)
    ]);
    let res = Pivariety::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), pivariety::CONFIG);
    let Err(e) = res else { panic!("detect must fail on a bus error") };
    assert_eq!(e, Error::Bus(ErrorKind::Other));
    assert_eq!(e.bus_error(), Some(&ErrorKind::Other));
    i2c.done();
}

#[test]
fn pivariety_id_is_one_32_bit_register() {
    let mut i2c = I2cMock::new(&[read32(pivariety::SCCB_ADDR, 0x0103, 0x30)]);
    let cam = Pivariety::detect(i2c.clone(), PowerControl::none(), Sleeps::default(), pivariety::CONFIG).unwrap();
    assert_eq!(cam.id().pid, pivariety::PID);
    assert_eq!(cam.gain_table().last_index(), 960);
    drop(cam);
    i2c.done();
}

#[test]
fn out_of_range_format_index_is_rejected_before_power_on() {
    let mut i2c = I2cMock::new(&[]);
    let res = Gc2607::detect(
        i2c.clone(),
        PowerControl::none(),
        Sleeps::default(),
        gc2607::CONFIG.with_format_index(3),
    );
    assert!(matches!(res, Err(Error::InvalidArgument)));
    i2c.done();
}

#[test]
fn mira220_drives_pwdn_active_low() {
    let addr = mira220::SCCB_ADDR;
    let mut i2c = I2cMock::new(&[read8(addr, 0x102c, 0x01), read8(addr, 0x102b, 0x30)]);
    let pwdn = PinMock::new(&[
        // power on: assert, release
        PinTx::set(State::Low),
        PinTx::set(State::High),
        // power off: release, assert
        PinTx::set(State::High),
        PinTx::set(State::Low),
    ]);

    let mut cam = Mira220::detect(
        i2c.clone(),
        PowerControl::new(None::<NoPin>, Some(pwdn)),
        Sleeps::default(),
        mira220::CONFIG,
    )
    .unwrap();
    assert_eq!(cam.id().pid, 0x0130);
    cam.power_off().unwrap();

    let (_, power, delay) = cam.release();
    assert_eq!(delay.0, vec![10, 10, 10, 10]);
    power.release().1.unwrap().done();
    i2c.done();
}
