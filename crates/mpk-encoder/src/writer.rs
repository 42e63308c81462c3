use mpk_wire::marker::tag;
use mpk_wire::width::write_uint;
use mpk_wire::{Marker, Signedness, Width};

use crate::error::EncodeError;

/// Producer for the supported wire subset.
///
/// `MsgPackWriter` appends tokens to an internal buffer and hands it over
/// with [`finish`](Self::finish). The plain `write_*` methods pick the
/// smallest encoding for the value, the way a conforming upstream encoder
/// would; the `*_as` variants force a specific tag so tests can exercise
/// every width the decoder accepts.
///
/// ```text
/// ┌────────────────┬─────────────────────────────────────────────────┐
/// │ Method         │ Encoding chosen                                 │
/// ├────────────────┼─────────────────────────────────────────────────┤
/// │ write_int      │ fixint, else uint8..64 (≥ 0) or int8..64 (< 0)  │
/// │ write_uint     │ fixint, else uint8..64                          │
/// │ write_f32/f64  │ float32 / float64                               │
/// │ write_bin      │ bin8, bin16 or bin32 by payload length          │
/// │ write_int_as   │ exactly the given marker, or Unrepresentable    │
/// │ write_bin_as   │ exactly the given bin marker                    │
/// └────────────────┴─────────────────────────────────────────────────┘
/// ```
///
/// All multi-byte fields are written big-endian.
#[derive(Clone, Debug, Default)]
pub struct MsgPackWriter {
    buf: Vec<u8>,
}

impl MsgPackWriter {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a writer with a pre-allocated buffer.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_nil(&mut self) -> &mut Self {
        self.buf.push(tag::NIL);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(if value { tag::TRUE } else { tag::FALSE });
        self
    }

    /// Write a signed integer using the smallest tag that holds it.
    pub fn write_int(&mut self, value: i64) -> &mut Self {
        if let Ok(unsigned) = u64::try_from(value) {
            return self.write_uint(unsigned);
        }
        if let Some(small) = i8::try_from(value).ok().filter(|v| *v >= -32) {
            self.buf.push(Marker::NegFixInt(small).to_u8());
            return self;
        }
        let marker = [Marker::I8, Marker::I16, Marker::I32]
            .into_iter()
            .find(|m| fits_signed(*m, value))
            .unwrap_or(Marker::I64);
        self.push_int(marker, u64::from_be_bytes(value.to_be_bytes()))
    }

    /// Write an unsigned integer using the smallest tag that holds it.
    pub fn write_uint(&mut self, value: u64) -> &mut Self {
        if let Some(small) = u8::try_from(value).ok().filter(|v| *v <= tag::POS_FIXINT_LAST) {
            self.buf.push(Marker::PosFixInt(small).to_u8());
            return self;
        }
        let marker = [Marker::U8, Marker::U16, Marker::U32]
            .into_iter()
            .find(|m| m.int_layout().is_some_and(|(w, _)| value <= w.max_unsigned()))
            .unwrap_or(Marker::U64);
        self.push_int(marker, value)
    }

    /// Write `value` with exactly the given integer marker.
    ///
    /// Fixint markers are accepted when the value lies in their range; the
    /// payload carried by the marker itself is ignored.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Unrepresentable`] if `marker` is not an integer tag
    /// or `value` is outside its range.
    pub fn write_int_as(&mut self, marker: Marker, value: i128) -> Result<&mut Self, EncodeError> {
        let unrepresentable = EncodeError::Unrepresentable { value, marker };
        match marker {
            Marker::PosFixInt(_) => {
                let v = u8::try_from(value)
                    .ok()
                    .filter(|v| *v <= tag::POS_FIXINT_LAST)
                    .ok_or(unrepresentable)?;
                self.buf.push(v);
                Ok(self)
            }
            Marker::NegFixInt(_) => {
                let v = i8::try_from(value)
                    .ok()
                    .filter(|v| (-32..0).contains(v))
                    .ok_or(unrepresentable)?;
                self.buf.push(Marker::NegFixInt(v).to_u8());
                Ok(self)
            }
            _ => match marker.int_layout() {
                Some((width, Signedness::Unsigned)) => {
                    let v = u64::try_from(value)
                        .ok()
                        .filter(|v| *v <= width.max_unsigned())
                        .ok_or(unrepresentable)?;
                    Ok(self.push_int(marker, v))
                }
                Some((_, Signedness::Signed)) => {
                    let v = i64::try_from(value)
                        .ok()
                        .filter(|v| fits_signed(marker, *v))
                        .ok_or(unrepresentable)?;
                    Ok(self.push_int(marker, u64::from_be_bytes(v.to_be_bytes())))
                }
                None => Err(unrepresentable),
            },
        }
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.buf.push(tag::FLOAT32);
        write_uint(&mut self.buf, u64::from(value.to_bits()), Width::W32);
        self
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.buf.push(tag::FLOAT64);
        write_uint(&mut self.buf, value.to_bits(), Width::W64);
        self
    }

    /// Write a blob with the smallest bin header that holds its length.
    ///
    /// # Errors
    ///
    /// [`EncodeError::BlobTooLarge`] if `data` is longer than `u32::MAX`.
    pub fn write_bin(&mut self, data: &[u8]) -> Result<&mut Self, EncodeError> {
        let len = u64::try_from(data.len()).unwrap_or(u64::MAX);
        let marker = [Marker::Bin8, Marker::Bin16, Marker::Bin32]
            .into_iter()
            .find(|m| m.bin_length_width().is_some_and(|w| len <= w.max_unsigned()))
            .ok_or(EncodeError::BlobTooLarge { len: data.len() })?;
        self.write_bin_as(marker, data)
    }

    /// Write a blob with exactly the given bin marker.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::Unrepresentable`] if `marker` is not a bin tag.
    /// - [`EncodeError::BlobTooLarge`] if the length does not fit the
    ///   marker's length field.
    pub fn write_bin_as(&mut self, marker: Marker, data: &[u8]) -> Result<&mut Self, EncodeError> {
        let width = marker.bin_length_width().ok_or(EncodeError::Unrepresentable {
            value: i128::try_from(data.len()).unwrap_or(i128::MAX),
            marker,
        })?;
        let len = u64::try_from(data.len())
            .ok()
            .filter(|len| *len <= width.max_unsigned())
            .ok_or(EncodeError::BlobTooLarge { len: data.len() })?;

        self.buf.push(marker.to_u8());
        write_uint(&mut self.buf, len, width);
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    /// Append bytes verbatim, e.g. a deliberately malformed tag in a test.
    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write the accumulated bytes to `w`.
    ///
    /// # Returns
    ///
    /// Total number of bytes written.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Io`] if the writer fails.
    pub fn write_to(&self, w: &mut impl std::io::Write) -> Result<usize, EncodeError> {
        w.write_all(&self.buf)?;
        Ok(self.buf.len())
    }

    /// Consume the writer and return the accumulated bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn push_int(&mut self, marker: Marker, bits: u64) -> &mut Self {
        if let Some((width, _)) = marker.int_layout() {
            self.buf.push(marker.to_u8());
            write_uint(&mut self.buf, bits, width);
        }
        self
    }
}

fn fits_signed(marker: Marker, value: i64) -> bool {
    marker.int_layout().is_some_and(|(width, _)| {
        let (min, max) = width.signed_range();
        (min..=max).contains(&value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(f: impl FnOnce(&mut MsgPackWriter)) -> Vec<u8> {
        let mut w = MsgPackWriter::new();
        f(&mut w);
        w.finish()
    }

    #[test]
    fn scalars() {
        assert_eq!(bytes(|w| { w.write_nil(); }), vec![0xC0]);
        assert_eq!(bytes(|w| { w.write_bool(false).write_bool(true); }), vec![0xC2, 0xC3]);
    }

    #[test]
    fn smallest_integer_encoding() {
        assert_eq!(bytes(|w| { w.write_int(5); }), vec![0x05]);
        assert_eq!(bytes(|w| { w.write_int(127); }), vec![0x7F]);
        assert_eq!(bytes(|w| { w.write_int(128); }), vec![0xCC, 0x80]);
        assert_eq!(bytes(|w| { w.write_int(-1); }), vec![0xFF]);
        assert_eq!(bytes(|w| { w.write_int(-32); }), vec![0xE0]);
        assert_eq!(bytes(|w| { w.write_int(-33); }), vec![0xD0, 0xDF]);
        assert_eq!(bytes(|w| { w.write_int(-200); }), vec![0xD1, 0xFF, 0x38]);
        assert_eq!(bytes(|w| { w.write_int(0x1_0000); }), vec![0xCE, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(
            bytes(|w| { w.write_int(i64::MIN); }),
            vec![0xD3, 0x80, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            bytes(|w| { w.write_uint(u64::MAX); }),
            vec![0xCF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn fixint_edges_pick_the_single_byte_form() {
        assert_eq!(bytes(|w| { w.write_uint(0).write_uint(127); }), vec![0x00, 0x7F]);
        assert_eq!(bytes(|w| { w.write_uint(128); }), vec![0xCC, 0x80]);
        assert_eq!(bytes(|w| { w.write_uint(256); }), vec![0xCD, 0x01, 0x00]);
        assert_eq!(bytes(|w| { w.write_int(-32).write_int(-1); }), vec![0xE0, 0xFF]);
        assert_eq!(bytes(|w| { w.write_int(-128); }), vec![0xD0, 0x80]);
        assert_eq!(bytes(|w| { w.write_int(-129); }), vec![0xD1, 0xFF, 0x7F]);
    }

    #[test]
    fn forced_widths() {
        let mut w = MsgPackWriter::new();
        w.write_int_as(Marker::U32, 1).unwrap();
        w.write_int_as(Marker::I64, -2).unwrap();
        w.write_int_as(Marker::PosFixInt(0), 9).unwrap();
        assert_eq!(
            w.finish(),
            vec![0xCE, 0, 0, 0, 1, 0xD3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0x09]
        );
    }

    #[test]
    fn forced_width_out_of_range() {
        let mut w = MsgPackWriter::new();
        assert!(matches!(
            w.write_int_as(Marker::U8, 256),
            Err(EncodeError::Unrepresentable { value: 256, marker: Marker::U8 })
        ));
        assert!(matches!(
            w.write_int_as(Marker::I8, -129),
            Err(EncodeError::Unrepresentable { .. })
        ));
        assert!(matches!(
            w.write_int_as(Marker::U16, -1),
            Err(EncodeError::Unrepresentable { .. })
        ));
        assert!(matches!(
            w.write_int_as(Marker::F64, 1),
            Err(EncodeError::Unrepresentable { .. })
        ));
        assert!(w.is_empty(), "failed writes must not leave partial bytes");
    }

    #[test]
    fn floats_are_big_endian() {
        let out = bytes(|w| { w.write_f32(1.0).write_f64(-2.0); });
        assert_eq!(
            out,
            vec![0xCA, 0x3F, 0x80, 0x00, 0x00, 0xCB, 0xC0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn bin_headers() {
        let mut w = MsgPackWriter::new();
        w.write_bin(b"abc").unwrap();
        assert_eq!(w.as_bytes(), &[0xC4, 0x03, b'a', b'b', b'c']);

        let big = vec![0u8; 300];
        let mut w = MsgPackWriter::new();
        w.write_bin(&big).unwrap();
        assert_eq!(&w.as_bytes()[..3], &[0xC5, 0x01, 0x2C]);
        assert_eq!(w.len(), 303);

        let mut w = MsgPackWriter::new();
        w.write_bin_as(Marker::Bin32, b"").unwrap();
        assert_eq!(w.finish(), vec![0xC6, 0, 0, 0, 0]);
    }

    #[test]
    fn bin_as_rejects_short_length_field() {
        let big = vec![0u8; 256];
        let mut w = MsgPackWriter::new();
        assert!(matches!(
            w.write_bin_as(Marker::Bin8, &big),
            Err(EncodeError::BlobTooLarge { len: 256 })
        ));
        assert!(matches!(
            w.write_bin_as(Marker::Nil, b"x"),
            Err(EncodeError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn write_to_reports_length() {
        let mut w = MsgPackWriter::new();
        w.write_int(1000).write_nil();
        let mut sink = Vec::new();
        let n = w.write_to(&mut sink).unwrap();
        assert_eq!(n, 4);
        assert_eq!(sink, vec![0xCD, 0x03, 0xE8, 0xC0]);
    }

    #[test]
    fn output_decodes_with_reader() {
        use mpk_decoder::{MsgPackReader, Outcome};

        let mut w = MsgPackWriter::new();
        w.write_int(-70_000).write_f64(0.5);
        let mut reader = MsgPackReader::new().unwrap();
        reader.feed(w.as_bytes()).unwrap();
        assert!(matches!(reader.read_int().unwrap(), Outcome::Decoded { value: -70_000, consumed: 5 }));
        assert!(matches!(reader.read_float().unwrap(), Outcome::Decoded { value, consumed: 9 } if value == 0.5));
    }
}
