//! Decodes a recorded RTCM 3 stream and prints what every frame changed.
//!
//! ```text
//! RUST_LOG=debug cargo run --example decode_file -- capture.rtcm3 [-STA=2003]
//! ```

use std::{env, fs::File, io::Read, process};

use rtcm3::{DecodeEvent, Decoder, DecoderOptions};

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: decode_file <file> [options]");
        process::exit(2);
    };
    let options: DecoderOptions = match args.collect::<Vec<_>>().join(" ").parse() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        },
    };

    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{path}: {e}");
            process::exit(1);
        },
    };

    let mut decoder = Decoder::with_options(options);
    let mut buf = [0u8; 4096];
    let (mut frames, mut errors) = (0usize, 0usize);
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                eprintln!("{path}: {e}");
                process::exit(1);
            },
        };
        let mut it = decoder.consume(&buf[..n]);
        while let Some(result) = it.next() {
            match result {
                Ok(msg) => {
                    frames += 1;
                    match msg.event {
                        DecodeEvent::Observation { completed } => {
                            for batch in completed {
                                println!(
                                    "{} epoch {}: {} satellites",
                                    msg.message_type,
                                    batch.time(),
                                    batch.len()
                                );
                            }
                        },
                        event => println!("{} {}: {:?}", msg.message_type, msg.time, event),
                    }
                },
                Err(e) => {
                    errors += 1;
                    eprintln!("{e}");
                },
            }
        }
    }

    let station = decoder.context().station();
    if station.has_position() {
        let [lat, lon, height] = station.geodetic().to_degrees();
        println!(
            "station {}: {lat:.8} {lon:.8} {height:.3}",
            station.station_id
        );
    }
    println!("{frames} frames decoded, {errors} errors");
}
