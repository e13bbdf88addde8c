//! Pickle protocol-2 serialization of a metric batch.
//!
//! Carbon's pickle receiver expects a Python-pickled list of
//! `(path, (timestamp, value))` tuples. The encoder reproduces CPython's
//! `pickle.dumps(metrics, protocol=2)` byte-for-byte for that shape, so the
//! deployed carbon-cache population keeps working unmodified. The reference
//! pickler memoizes by object identity and every pickled object there is
//! distinct, so no back-references are ever emitted; memo slots are still
//! assigned in the same order CPython assigns them.

use crate::core::MetricSample;
use bytes::{BufMut, Bytes, BytesMut};

const PROTO: u8 = 0x80;
const EMPTY_LIST: u8 = b']';
const MARK: u8 = b'(';
const APPEND: u8 = b'a';
const APPENDS: u8 = b'e';
const STOP: u8 = b'.';
const BINPUT: u8 = b'q';
const LONG_BINPUT: u8 = b'r';
const BINUNICODE: u8 = b'X';
const BININT1: u8 = b'K';
const BININT2: u8 = b'M';
const BININT: u8 = b'J';
const LONG1: u8 = 0x8a;
const BINFLOAT: u8 = b'G';
const TUPLE2: u8 = 0x86;

/// CPython's list batching size for APPENDS groups.
const BATCH: usize = 1000;

/// Serialize a batch as pickle protocol 2.
///
/// The output is the bare pickle stream; framing is applied separately.
pub fn encode(batch: &[MetricSample]) -> Bytes {
    // ~70 bytes per sample for typical path lengths.
    let mut pickler = Pickler::with_capacity(16 + batch.len() * 80);
    pickler.put_header();
    match batch.len() {
        0 => {}
        1 => {
            pickler.put_sample(&batch[0]);
            pickler.buf.put_u8(APPEND);
        }
        _ => {
            for chunk in batch.chunks(BATCH) {
                pickler.buf.put_u8(MARK);
                for sample in chunk {
                    pickler.put_sample(sample);
                }
                pickler.buf.put_u8(APPENDS);
            }
        }
    }
    pickler.buf.put_u8(STOP);
    pickler.buf.freeze()
}

struct Pickler {
    buf: BytesMut,
    memo: u32,
}

impl Pickler {
    fn with_capacity(capacity: usize) -> Self {
        Pickler {
            buf: BytesMut::with_capacity(capacity),
            memo: 0,
        }
    }

    /// PROTO 2, the outer list, and its memo slot.
    fn put_header(&mut self) {
        self.buf.put_u8(PROTO);
        self.buf.put_u8(2);
        self.buf.put_u8(EMPTY_LIST);
        self.memoize();
    }

    /// `(path, (timestamp, value))` with memo slots for the string and both
    /// tuples, in CPython's assignment order.
    fn put_sample(&mut self, sample: &MetricSample) {
        self.put_str(&sample.path);
        self.put_int(sample.timestamp);
        self.put_float(sample.value);
        self.buf.put_u8(TUPLE2);
        self.memoize();
        self.buf.put_u8(TUPLE2);
        self.memoize();
    }

    fn memoize(&mut self) {
        if self.memo < 256 {
            self.buf.put_u8(BINPUT);
            self.buf.put_u8(self.memo as u8);
        } else {
            self.buf.put_u8(LONG_BINPUT);
            self.buf.put_u32_le(self.memo);
        }
        self.memo += 1;
    }

    fn put_str(&mut self, s: &str) {
        self.buf.put_u8(BINUNICODE);
        self.buf.put_u32_le(s.len() as u32);
        self.buf.put_slice(s.as_bytes());
        self.memoize();
    }

    /// BININT1/BININT2/BININT by range, LONG1 beyond the i32 range
    /// (timestamps past 2038 still encode correctly).
    fn put_int(&mut self, v: i64) {
        if (0..=0xff).contains(&v) {
            self.buf.put_u8(BININT1);
            self.buf.put_u8(v as u8);
        } else if (0x100..=0xffff).contains(&v) {
            self.buf.put_u8(BININT2);
            self.buf.put_u16_le(v as u16);
        } else if i64::from(i32::MIN) <= v && v <= i64::from(i32::MAX) {
            self.buf.put_u8(BININT);
            self.buf.put_i32_le(v as i32);
        } else {
            let le = v.to_le_bytes();
            let mut len = le.len();
            if v >= 0 {
                while len > 1 && le[len - 1] == 0 && le[len - 2] < 0x80 {
                    len -= 1;
                }
            } else {
                while len > 1 && le[len - 1] == 0xff && le[len - 2] >= 0x80 {
                    len -= 1;
                }
            }
            self.buf.put_u8(LONG1);
            self.buf.put_u8(len as u8);
            self.buf.put_slice(&le[..len]);
        }
    }

    fn put_float(&mut self, v: f64) {
        self.buf.put_u8(BINFLOAT);
        self.buf.put_f64(v);
    }
}
