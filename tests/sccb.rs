mod common;

use cam_sensor::{program::RegProgram, RegList, Sccb};
use common::{expect_program, read32, read8, write32, write8, Sleeps};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
use futures::executor::block_on;

#[test]
fn program_stops_at_the_first_failed_write() {
    static REGS: [(u16, u8); 4] = [(0x0103, 0x01), (0xfefe, 3), (0x0100, 0x00), (0x3221, 0x06)];
    let mut i2c = I2cMock::new(&[write8(0x30, 0x0103, 0x01), write8(0x30, 0x0100, 0x00).with_error(ErrorKind::Other)]);
    let mut sccb = Sccb::new(i2c.clone(), 0x30);
    let mut delay = Sleeps::default();

    let res = sccb.write_program(&RegProgram::new(&REGS, 0xfefe), &mut delay);
    assert_eq!(res, Err(ErrorKind::Other));
    assert_eq!(delay.0, vec![3]);
    i2c.done();
}

static WIDE: [(u16, u32); 5] = [(0x0200, 0), (0xfffe, 20), (0x0300, 2), (0x0100, 1), (0xffff, 0)];

#[test]
fn async_reads_and_programs_match_the_blocking_frames() {
    let a = 0x0c;
    let regs = RegList::A16V32(RegProgram::terminated(&WIDE, 0xfffe, 0xffff));
    let (writes, pauses) = expect_program(a, &regs);
    assert_eq!(writes.len(), 3);
    let mut expected = vec![read32(a, 0x0103, 0x30)];
    expected.extend(writes);
    expected.push(write32(a, 0x0100, 0));
    let mut i2c = I2cMock::new(&expected);
    let mut sccb = Sccb::new(i2c.clone(), a);
    let mut delay = Sleeps::default();

    block_on(async {
        let pid: u32 = sccb.read_async(0x0103).await.unwrap();
        assert_eq!(pid, 0x30);
        sccb.write_list_async(&regs, &mut delay).await.unwrap();
        sccb.write_async(0x0100, 0u32).await.unwrap();
    });
    assert_eq!(delay.0, pauses);
    assert_eq!(delay.0, vec![20]);
    i2c.done();
}

#[test]
fn async_bit_field_update() {
    let a = 0x36;
    let mut i2c = I2cMock::new(&[read8(a, 0x3221, 0x06), write8(a, 0x3221, 0x66)]);
    let mut sccb = Sccb::new(i2c.clone(), a);

    block_on(sccb.set_reg_bits_async(0x3221, 5, 2, 0x03)).unwrap();
    assert_eq!(sccb.addr(), a);
    drop(sccb.release());
    i2c.done();
}
