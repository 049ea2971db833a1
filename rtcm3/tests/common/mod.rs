#![allow(dead_code)]

//! Frame builders shared by the integration tests.
//!
//! Payloads are written field by field with [BitWriter], in broadcast
//! order, and wrapped into a complete frame (preamble, length, CRC24Q) by
//! [frame].

use rtcm3::{crc24q, DecoderBuilder, GpsTime, RTCM_PREAMBLE};

/// GPS week of [reference_time]
pub const WEEK: i64 = 2300;
/// Time of week of the messages built here (s)
pub const TOW: f64 = 100_010.0;

/// Coarse time given to every test decoder
pub fn reference_time() -> GpsTime {
    GpsTime::from_week_tow(WEEK, 100_000.0)
}

pub fn decoder() -> rtcm3::Decoder {
    DecoderBuilder::new()
        .reference_time(reference_time())
        .build()
}

/// 1005 of reference station 2003
pub const STATION_FRAME: [u8; 25] = [
    0xd3, 0x00, 0x13, 0x3e, 0xd7, 0xd3, 0x02, 0x02, 0x98, 0x0e, 0xde, 0xef, 0x34, 0xb4, 0xbd, 0x62,
    0xac, 0x09, 0x41, 0x98, 0x6f, 0x33, 0x36, 0x0b, 0x98,
];

/// MSB first bit writer, the mirror of the decoder's bit reader
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsigned(&mut self, width: usize, value: u64) -> &mut Self {
        assert!(
            width == 64 || value >> width == 0,
            "{value} does not fit in {width} bits"
        );
        for i in (0..width).rev() {
            if self.len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let shift = self.len % 8;
                if let Some(last) = self.bytes.last_mut() {
                    *last |= 0x80 >> shift;
                }
            }
            self.len += 1;
        }
        self
    }

    /// Two's complement
    pub fn signed(&mut self, width: usize, value: i64) -> &mut Self {
        let limit = 1i64 << (width - 1);
        assert!(
            (-limit..limit).contains(&value),
            "{value} does not fit in {width} bits"
        );
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        self.unsigned(width, value as u64 & mask)
    }

    /// GLONASS sign-magnitude
    pub fn sign_magnitude(&mut self, width: usize, value: i64) -> &mut Self {
        self.flag(value < 0).unsigned(width - 1, value.unsigned_abs())
    }

    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.unsigned(1, u64::from(value))
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        for byte in data {
            self.unsigned(8, u64::from(*byte));
        }
        self
    }

    pub fn bit_len(&self) -> usize {
        self.len
    }

    /// Payload padded with zero bits to a whole byte
    pub fn into_payload(self) -> Vec<u8> {
        self.bytes
    }

    /// Complete frame around the payload written so far
    pub fn into_frame(self) -> Vec<u8> {
        frame(&self.into_payload())
    }
}

/// Wraps `payload` into a frame with a valid CRC
pub fn frame(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() < 1024);
    let len = payload.len();
    let mut frame = vec![RTCM_PREAMBLE, (len >> 8) as u8, len as u8];
    frame.extend_from_slice(payload);
    let crc = crc24q(&frame);
    frame.extend_from_slice(&crc.to_be_bytes()[1..]);
    frame
}

/// One cell of an MSM7 message
#[derive(Debug, Clone, Copy)]
pub struct Msm7Cell {
    /// Fine pseudorange, units of 2^-29 ms
    pub pseudorange: i64,
    /// Fine phase range, units of 2^-31 ms
    pub phase_range: i64,
    /// DF407 lock time indicator
    pub lock: u16,
    /// Carrier to noise density, units of 2^-4 dB-Hz
    pub cnr: u16,
    /// Fine phase range rate, units of 0.0001 m/s
    pub rate: i64,
}

impl Default for Msm7Cell {
    fn default() -> Self {
        Self {
            pseudorange: 0,
            phase_range: 0,
            lock: 500,
            cnr: 720,
            rate: 0,
        }
    }
}

/// MSM7 message with every (satellite, signal) cell present
#[derive(Debug, Clone)]
pub struct Msm7 {
    pub message_type: u16,
    pub station_id: u16,
    /// Epoch time field (ms): GPS/Galileo time of week, GLONASS time of day
    pub epoch_ms: u64,
    pub more_follow: bool,
    /// Satellite mask bits, 1..=64
    pub satellites: Vec<u16>,
    /// Signal mask bits, 1..=32
    pub signals: Vec<u8>,
    /// Integer milliseconds of the rough range, same for every satellite
    pub rough_ms: u8,
    /// Extended satellite information, same for every satellite
    pub extended_info: u8,
    /// Rough phase range rate (m/s), same for every satellite
    pub rough_rate: i64,
    pub cell: Msm7Cell,
}

impl Msm7 {
    pub fn new(message_type: u16, satellites: &[u16], signals: &[u8]) -> Self {
        Self {
            message_type,
            station_id: 2003,
            epoch_ms: (TOW * 1000.0) as u64,
            more_follow: false,
            satellites: satellites.to_vec(),
            signals: signals.to_vec(),
            rough_ms: 70,
            extended_info: 0,
            rough_rate: 0,
            cell: Msm7Cell::default(),
        }
    }

    pub fn to_frame(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.unsigned(12, u64::from(self.message_type))
            .unsigned(12, u64::from(self.station_id));
        if (1081..=1087).contains(&self.message_type) {
            w.unsigned(3, 0).unsigned(27, self.epoch_ms);
        } else {
            w.unsigned(30, self.epoch_ms);
        }
        w.flag(self.more_follow).unsigned(3 + 7 + 2 + 2 + 1 + 3, 0);

        let satellite_mask = self
            .satellites
            .iter()
            .fold(0u64, |mask, id| mask | 1 << (64 - id));
        let signal_mask = self
            .signals
            .iter()
            .fold(0u64, |mask, id| mask | 1 << (32 - id));
        w.unsigned(64, satellite_mask).unsigned(32, signal_mask);
        let cells = self.satellites.len() * self.signals.len();
        for _ in 0..cells {
            w.flag(true);
        }

        let nsat = self.satellites.len();
        for _ in 0..nsat {
            w.unsigned(8, u64::from(self.rough_ms));
        }
        for _ in 0..nsat {
            w.unsigned(4, u64::from(self.extended_info));
        }
        for _ in 0..nsat {
            w.unsigned(10, 0);
        }
        for _ in 0..nsat {
            w.signed(14, self.rough_rate);
        }

        let c = self.cell;
        for _ in 0..cells {
            w.signed(20, c.pseudorange);
        }
        for _ in 0..cells {
            w.signed(24, c.phase_range);
        }
        for _ in 0..cells {
            w.unsigned(10, u64::from(c.lock));
        }
        for _ in 0..cells {
            w.flag(false);
        }
        for _ in 0..cells {
            w.unsigned(10, u64::from(c.cnr));
        }
        for _ in 0..cells {
            w.signed(15, c.rate);
        }
        w.into_frame()
    }
}

/// 1019 with a plausible orbit; only the fields the tests look at vary
#[derive(Debug, Clone)]
pub struct GpsEphemeris {
    pub prn: u8,
    pub iode: u8,
    pub iodc: u16,
    /// Seconds of week, multiple of 16
    pub toe: u32,
    pub health: u8,
    pub fit_flag: bool,
}

impl GpsEphemeris {
    pub fn new(prn: u8, iode: u8) -> Self {
        Self {
            prn,
            iode,
            iodc: u16::from(iode),
            toe: 100_000,
            health: 0,
            fit_flag: false,
        }
    }

    pub fn to_frame(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.unsigned(12, 1019)
            .unsigned(6, u64::from(self.prn))
            .unsigned(10, (WEEK % 1024) as u64)
            .unsigned(4, 2) // URA
            .unsigned(2, 1) // C/A on L2
            .signed(14, -12) // IDOT
            .unsigned(8, u64::from(self.iode))
            .unsigned(16, u64::from(self.toe / 16)) // toc
            .signed(8, 0) // af2
            .signed(16, -3) // af1
            .signed(22, 123_456) // af0
            .unsigned(10, u64::from(self.iodc))
            .signed(16, 1_000) // crs
            .signed(16, 12_000) // delta n
            .signed(32, 250_000_000) // M0
            .signed(16, -400) // cuc
            .unsigned(32, 42_949_673) // e, 0.005
            .signed(16, 400) // cus
            .unsigned(32, 2_701_978_419) // sqrt A, 5153.6
            .unsigned(16, u64::from(self.toe / 16))
            .signed(16, 20) // cic
            .signed(32, -900_000_000) // OMEGA0
            .signed(16, -20) // cis
            .signed(32, 650_000_000) // i0
            .signed(16, 4_000) // crc
            .signed(32, 300_000_000) // omega
            .signed(24, -20_000) // OMEGA dot
            .signed(8, -10) // TGD
            .unsigned(6, u64::from(self.health))
            .flag(false)
            .flag(self.fit_flag);
        w.into_frame()
    }
}

/// 1020 of GLONASS slot `prn` on frequency channel `channel`
pub fn glonass_ephemeris_frame(prn: u8, channel: i8, tb: u8) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.unsigned(12, 1020)
        .unsigned(6, u64::from(prn))
        .unsigned(5, (channel + 7) as u64)
        .unsigned(4, 0)
        .unsigned(5, 3) // tk hours
        .unsigned(6, 15) // tk minutes
        .unsigned(1, 0)
        .unsigned(1, 0) // Bn
        .unsigned(1, 0)
        .unsigned(7, u64::from(tb));
    // (velocity 2^-20 km/s, position 2^-11 km, acceleration 2^-30 km/s²)
    for (v, p, a) in [
        (1_048_576, 20_480_000, 3),
        (-2_097_152, -10_240_000, -2),
        (524_288, 30_720_000, 1),
    ] {
        w.sign_magnitude(24, v)
            .sign_magnitude(27, p)
            .sign_magnitude(5, a);
    }
    w.unsigned(1, 0)
        .sign_magnitude(11, 5) // gamma n
        .unsigned(3, 0)
        .sign_magnitude(22, -1_000) // tau n
        .sign_magnitude(5, 2) // delta tau n
        .unsigned(5, 1) // En
        .unsigned(1, 0)
        .unsigned(4, 3) // FT
        .unsigned(11, 100) // NT
        .unsigned(2, 1) // M
        .flag(true)
        .unsigned(11, 0)
        .sign_magnitude(32, 0)
        .unsigned(5, 7) // N4
        .sign_magnitude(22, 0)
        .unsigned(1 + 7, 0);
    w.into_frame()
}

/// 1041 of NavIC satellite `prn`. `reserved` trailing bits follow the
/// 466 bits of fields.
pub fn navic_ephemeris_frame(prn: u8, iode: u8, reserved: usize) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.unsigned(12, 1041)
        .unsigned(6, u64::from(prn))
        .unsigned(10, (WEEK - 2048) as u64)
        .signed(22, 123_456) // af0
        .signed(16, 0)
        .signed(8, 0)
        .unsigned(4, 1) // sva
        .unsigned(16, 100_000 / 16) // toc
        .signed(8, -10) // tgd
        .signed(22, 0)
        .unsigned(8, u64::from(iode))
        .unsigned(10, 0)
        .unsigned(2, 0); // health
    for _ in 0..6 {
        w.signed(15, 0);
    }
    w.signed(14, 0)
        .signed(32, 0) // m0
        .unsigned(16, 100_000 / 16) // toe
        .unsigned(32, 42_949_673) // e
        .unsigned(32, 2_701_978_419) // sqrt a
        .signed(32, 0)
        .signed(32, 0)
        .signed(22, 0)
        .signed(32, 0)
        .unsigned(reserved, 0);
    w.into_frame()
}

/// 1004 with one satellite
#[derive(Debug, Clone)]
pub struct Legacy1004 {
    pub station_id: u16,
    pub tow_ms: u64,
    pub more_follow: bool,
    pub prn: u8,
    /// L1 pseudorange modulo one light millisecond, units of 0.02 m
    pub pseudorange: u32,
    /// Integer light milliseconds
    pub ambiguity: u8,
    /// L1 phase range minus pseudorange, units of 0.0005 m
    pub phase_range: i64,
    pub lock: u8,
    /// Units of 0.25 dB-Hz
    pub cnr: u8,
    /// L2 minus L1 pseudorange, units of 0.02 m
    pub l2_range_diff: i64,
    pub l2_phase_range: i64,
}

impl Legacy1004 {
    pub fn new(prn: u8) -> Self {
        Self {
            station_id: 2003,
            tow_ms: (TOW * 1000.0) as u64,
            more_follow: false,
            prn,
            pseudorange: 1_000_000,
            ambiguity: 70,
            phase_range: 1_000,
            lock: 10,
            cnr: 180,
            l2_range_diff: 150,
            l2_phase_range: 7_000,
        }
    }

    pub fn to_frame(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.unsigned(12, 1004)
            .unsigned(12, u64::from(self.station_id))
            .unsigned(30, self.tow_ms)
            .flag(self.more_follow)
            .unsigned(5, 1)
            .unsigned(4, 0)
            .unsigned(6, u64::from(self.prn))
            .flag(false)
            .unsigned(24, u64::from(self.pseudorange))
            .signed(20, self.phase_range)
            .unsigned(7, u64::from(self.lock))
            .unsigned(8, u64::from(self.ambiguity))
            .unsigned(8, u64::from(self.cnr))
            .unsigned(2, 0)
            .signed(14, self.l2_range_diff)
            .signed(20, self.l2_phase_range)
            .unsigned(7, u64::from(self.lock))
            .unsigned(8, u64::from(self.cnr));
        w.into_frame()
    }
}

/// SSR message header; `message_type` decides which optional fields exist
fn ssr_header(w: &mut BitWriter, message_type: u16, tow: u64, count: u64) {
    w.unsigned(12, u64::from(message_type))
        .unsigned(20, tow)
        .unsigned(4, 2) // 5 s update interval
        .flag(false);
    if matches!(message_type, 1057 | 1060) {
        w.flag(false); // satellite reference datum
    }
    w.unsigned(4, 3) // IOD SSR
        .unsigned(16, 77) // provider
        .unsigned(4, 1) // solution
        .unsigned(6, count);
}

/// 1057, GPS orbit corrections: (prn, iode, radial delta in 0.1 mm)
pub fn gps_orbit_frame(tow: u64, satellites: &[(u8, u8, i64)]) -> Vec<u8> {
    let mut w = BitWriter::new();
    ssr_header(&mut w, 1057, tow, satellites.len() as u64);
    for (prn, iode, radial) in satellites {
        w.unsigned(6, u64::from(*prn))
            .unsigned(8, u64::from(*iode))
            .signed(22, *radial)
            .signed(20, 250) // along track, 0.4 mm
            .signed(20, -250)
            .signed(21, 10) // radial rate, 0.001 mm/s
            .signed(19, 0)
            .signed(19, 0);
    }
    w.into_frame()
}

/// 1058, GPS clock corrections: (prn, c0 in 0.1 mm)
pub fn gps_clock_frame(tow: u64, satellites: &[(u8, i64)]) -> Vec<u8> {
    let mut w = BitWriter::new();
    ssr_header(&mut w, 1058, tow, satellites.len() as u64);
    for (prn, c0) in satellites {
        w.unsigned(6, u64::from(*prn))
            .signed(22, *c0)
            .signed(21, 0)
            .signed(27, 0);
    }
    w.into_frame()
}

/// 1059, GPS code biases: (prn, [(signal id, bias in cm)])
pub fn gps_code_bias_frame(tow: u64, satellites: &[(u8, &[(u8, i64)])]) -> Vec<u8> {
    let mut w = BitWriter::new();
    ssr_header(&mut w, 1059, tow, satellites.len() as u64);
    for (prn, biases) in satellites {
        w.unsigned(6, u64::from(*prn))
            .unsigned(5, biases.len() as u64);
        for (mode, bias) in biases.iter() {
            w.unsigned(5, u64::from(*mode)).signed(14, *bias);
        }
    }
    w.into_frame()
}

/// 1029 of station 2003
pub fn text_frame(text: &str) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.unsigned(12, 1029)
        .unsigned(12, 2003)
        .unsigned(16, 60_000) // MJD
        .unsigned(17, 43_200)
        .unsigned(7, text.chars().count() as u64)
        .unsigned(8, text.len() as u64)
        .bytes(text.as_bytes());
    w.into_frame()
}
