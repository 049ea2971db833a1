#[macro_use]
extern crate afl;

use rtcm3::{DecodeEvent, DecoderBuilder, GpsTime};

// 1005 of reference station 2003
const STATION_FRAME: [u8; 25] = [
    0xd3, 0x00, 0x13, 0x3e, 0xd7, 0xd3, 0x02, 0x02, 0x98, 0x0e, 0xde, 0xef, 0x34, 0xb4, 0xbd, 0x62,
    0xac, 0x09, 0x41, 0x98, 0x6f, 0x33, 0x36, 0x0b, 0x98,
];

fn decode(chunksize: usize, data: &[u8]) {
    let mut decoder = DecoderBuilder::new()
        .reference_time(GpsTime::from_week_tow(2300, 0.0))
        .with_fixed_buffer::<1029>();
    for chunk in data.chunks(chunksize) {
        let mut it = decoder.consume(chunk);
        loop {
            match it.next() {
                Some(Ok(_msg)) => {},
                Some(Err(_)) => {},
                None => {
                    // We've decoded all the frames we have
                    break;
                },
            }
        }
    }

    // A partial frame may still be buffered; after it is dropped the next
    // valid frame must come through.
    decoder.reset();
    let mut it = decoder.consume(&STATION_FRAME);
    match it.next() {
        Some(Ok(msg)) => assert_eq!(msg.event, DecodeEvent::Station),
        other => panic!("{other:?}"),
    }
    assert!(it.next().is_none());
}

fn main() {
    fuzz!(|data: &[u8]| {
        if data.len() > 1 {
            let chunksize = data[0] as usize;
            if chunksize != 0 {
                decode(chunksize, &data[1..]);
            }
        }
    });
}
