use std::borrow::Cow;

use crate::error::CodecError;

/// Growth multiplier applied when a [`ByteBufferMut`] runs out of room.
pub const WIGGLE_ROOM: usize = 1;

/// Scale used by the lossy `lowp` fixed-point float encoding.
pub const LOW_PRECISION_VALUE: f64 = 1000.0;

/// Capacity of a freshly created [`ByteBufferMut`].
pub const INITIAL_CAPACITY: usize = 256;

/// A Peechy byte buffer meant for reading.
///
/// Every multi-byte integer is little-endian and fixed-width. The `var`
/// readers keep their historical names but always consume exactly 4 bytes.
///
/// Example usage:
///
/// ```
/// use std::borrow::Cow;
/// let mut bb = peechy_schema::ByteBuffer::new(&[4, 0, 0, 0, 240, 159, 141, 149, 133, 242, 210, 237]);
/// assert_eq!(bb.read_string(), Ok(Cow::Borrowed("🍕")));
/// assert_eq!(bb.read_var_float(), Ok(123.456));
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &[u8]) -> ByteBuffer {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    fn out_of_bounds(&self, wanted: usize) -> CodecError {
        CodecError::IndexOutOfBounds {
            index: self.index,
            wanted,
            len: self.data.len(),
        }
    }

    fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Try to read a boolean value starting at the current index. Any
    /// non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_byte()? != 0)
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, CodecError> {
        if self.index >= self.data.len() {
            Err(self.out_of_bounds(1))
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        match self.index.checked_add(len) {
            Some(end) if end <= self.data.len() => {
                let value = &self.data[self.index..end];
                self.index = end;
                Ok(value)
            }
            _ => Err(self.out_of_bounds(len)),
        }
    }

    pub fn read_int8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_int16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.read_fixed()?))
    }

    pub fn read_uint16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_fixed()?))
    }

    pub fn read_int32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_fixed()?))
    }

    pub fn read_uint32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_fixed()?))
    }

    /// Try to read a signed 32-bit integer. Despite the name this is the
    /// fixed 4-byte encoding, identical to [`read_int32`](Self::read_int32).
    pub fn read_var_int(&mut self) -> Result<i32, CodecError> {
        self.read_int32()
    }

    /// Try to read an unsigned 32-bit integer. Despite the name this is the
    /// fixed 4-byte encoding, identical to [`read_uint32`](Self::read_uint32).
    pub fn read_var_uint(&mut self) -> Result<u32, CodecError> {
        self.read_uint32()
    }

    /// Try to read a raw IEEE-754 32-bit float.
    pub fn read_float32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.read_fixed()?))
    }

    /// Try to read a compressed 32-bit floating-point number starting at
    /// the current index.
    pub fn read_var_float(&mut self) -> Result<f32, CodecError> {
        let first = match self.data.get(self.index) {
            Some(&first) => first,
            None => return Err(self.out_of_bounds(1)),
        };

        // Optimization: use a single byte to store zero
        if first == 0 {
            self.index += 1;
            return Ok(0.0);
        }

        let bits = u32::from_le_bytes(self.read_fixed()?);

        // Move the exponent back into place
        Ok(f32::from_bits(bits.rotate_right(9)))
    }

    /// Try to read a `lowp` value: a fixed-point integer scaled by
    /// [`LOW_PRECISION_VALUE`].
    pub fn read_low_precision_float(&mut self) -> Result<f32, CodecError> {
        Ok((self.read_var_int()? as f64 / LOW_PRECISION_VALUE) as f32)
    }

    /// Try to read a UTF-8 string prefixed by its byte length. Invalid UTF-8
    /// is replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>, CodecError> {
        let len = self.read_var_uint()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes))
    }

    /// Try to read a NUL-terminated ASCII string.
    pub fn read_alphanumeric(&mut self) -> Result<String, CodecError> {
        let start = self.index;
        match self.data[start..].iter().position(|&b| b == 0) {
            Some(offset) => {
                self.index = start + offset + 1;
                Ok(self.data[start..start + offset].iter().map(|&b| b as char).collect())
            }
            None => Err(self.out_of_bounds(self.data.len() - start + 1)),
        }
    }

    /// Try to read a byte array prefixed by its length.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_var_uint()? as usize;
        self.read_bytes(len)
    }

    fn read_typed_array<const N: usize, T>(
        &mut self,
        convert: fn([u8; N]) -> T,
    ) -> Result<Vec<T>, CodecError> {
        let bytes = self.read_byte_array()?;
        if bytes.len() % N != 0 {
            return Err(CodecError::InvalidArrayLength { len: bytes.len(), width: N });
        }
        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                convert(raw)
            })
            .collect())
    }

    pub fn read_int8_array(&mut self) -> Result<Vec<i8>, CodecError> {
        self.read_typed_array(i8::from_le_bytes)
    }

    pub fn read_int16_array(&mut self) -> Result<Vec<i16>, CodecError> {
        self.read_typed_array(i16::from_le_bytes)
    }

    pub fn read_uint16_array(&mut self) -> Result<Vec<u16>, CodecError> {
        self.read_typed_array(u16::from_le_bytes)
    }

    pub fn read_int32_array(&mut self) -> Result<Vec<i32>, CodecError> {
        self.read_typed_array(i32::from_le_bytes)
    }

    pub fn read_uint32_array(&mut self) -> Result<Vec<u32>, CodecError> {
        self.read_typed_array(u32::from_le_bytes)
    }

    pub fn read_float32_array(&mut self) -> Result<Vec<f32>, CodecError> {
        self.read_typed_array(f32::from_le_bytes)
    }
}

#[cfg(test)]
fn out_of_bounds(index: usize, wanted: usize, len: usize) -> CodecError {
    CodecError::IndexOutOfBounds { index, wanted, len }
}

#[test]
fn read_bool() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Ok(true));
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(out_of_bounds(0, 1, 0)));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], usize::MAX), Err(out_of_bounds(0, usize::MAX, 1)));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert_eq!(bb.read_bytes(1), Err(out_of_bounds(5, 1, 5)));
}

#[test]
fn read_fixed_width_integers() {
    assert_eq!(ByteBuffer::new(&[0x34, 0x12]).read_uint16(), Ok(0x1234));
    assert_eq!(ByteBuffer::new(&[0xFE, 0xFF]).read_int16(), Ok(-2));
    assert_eq!(ByteBuffer::new(&[0xFF]).read_int8(), Ok(-1));
    assert_eq!(ByteBuffer::new(&[0x78, 0x56, 0x34, 0x12]).read_uint32(), Ok(0x1234_5678));
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 0x80]).read_int32(), Ok(i32::MIN));
    assert_eq!(ByteBuffer::new(&[1, 0, 0]).read_int32(), Err(out_of_bounds(0, 4, 3)));
}

#[test]
fn read_var_int() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_int();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 4, 0)));
    assert_eq!(read(&[0]), Err(out_of_bounds(0, 4, 1)));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(0));
    assert_eq!(read(&[255, 255, 255, 255]), Ok(-1));
    assert_eq!(read(&[1, 0, 0, 0]), Ok(1));
    assert_eq!(read(&[255, 255, 255, 127]), Ok(2147483647));
    assert_eq!(read(&[0, 0, 0, 128]), Ok(-2147483648));
}

#[test]
fn read_var_uint() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_uint();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 4, 0)));
    assert_eq!(read(&[127]), Err(out_of_bounds(0, 4, 1)));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(0));
    assert_eq!(read(&[127, 0, 0, 0]), Ok(127));
    assert_eq!(read(&[128, 0, 0, 0]), Ok(128));
    assert_eq!(read(&[0, 1, 0, 0]), Ok(256));
    assert_eq!(read(&[255, 255, 255, 255]), Ok(4294967295));
}

#[test]
fn read_var_float() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_float();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 1, 0)));
    assert_eq!(read(&[0]), Ok(0.0));
    assert_eq!(read(&[133, 242, 210]), Err(out_of_bounds(0, 4, 3)));
    assert_eq!(read(&[133, 242, 210, 237]), Ok(123.456));
    assert_eq!(read(&[133, 243, 210, 237]), Ok(-123.456));
    assert_eq!(read(&[254, 255, 255, 255]), Ok(f32::MIN));
    assert_eq!(read(&[254, 254, 255, 255]), Ok(f32::MAX));
    assert_eq!(read(&[1, 1, 0, 0]), Ok(-f32::MIN_POSITIVE));
    assert_eq!(read(&[1, 0, 0, 0]), Ok(f32::MIN_POSITIVE));
    assert_eq!(read(&[255, 1, 0, 0]), Ok(f32::NEG_INFINITY));
    assert_eq!(read(&[255, 0, 0, 0]), Ok(f32::INFINITY));
    assert_eq!(read(&[255, 0, 0, 128]).map(|f| f.is_nan()), Ok(true));
}

#[test]
fn read_float32_and_lowp() {
    assert_eq!(ByteBuffer::new(&[0, 0, 128, 63]).read_float32(), Ok(1.0));
    assert_eq!(ByteBuffer::new(&[0xC4, 0x09, 0, 0]).read_low_precision_float(), Ok(2.5));
    assert_eq!(ByteBuffer::new(&[0x06, 0xFF, 0xFF, 0xFF]).read_low_precision_float(), Ok(-0.25));
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[]), Err(out_of_bounds(0, 4, 0)));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(Cow::Borrowed("")));
    assert_eq!(read(&[1, 0, 0, 0]), Err(out_of_bounds(4, 1, 4)));
    assert_eq!(read(&[1, 0, 0, 0, 97]), Ok(Cow::Borrowed("a")));
    assert_eq!(read(&[3, 0, 0, 0, 97, 98, 99]), Ok(Cow::Borrowed("abc")));
    assert_eq!(read(&[4, 0, 0, 0, 240, 159, 141, 149]), Ok(Cow::Borrowed("🍕")));
    assert_eq!(
        read(&[5, 0, 0, 0, 97, 237, 160, 188, 99]),
        Ok(Cow::Owned("a���c".to_owned()))
    );
}

#[test]
fn read_alphanumeric() {
    let read = |bytes| ByteBuffer::new(bytes).read_alphanumeric();
    assert_eq!(read(&[0]), Ok(String::new()));
    assert_eq!(read(&[97, 98, 99, 0]), Ok("abc".to_owned()));
    assert_eq!(read(&[97, 98]), Err(out_of_bounds(0, 3, 2)));

    let mut bb = ByteBuffer::new(&[65, 0, 66, 0]);
    assert_eq!(bb.read_alphanumeric(), Ok("A".to_owned()));
    assert_eq!(bb.read_alphanumeric(), Ok("B".to_owned()));
}

#[test]
fn read_typed_arrays() {
    let mut bb = ByteBuffer::new(&[8, 0, 0, 0, 1, 0, 0, 0, 255, 255, 255, 255]);
    assert_eq!(bb.read_int32_array(), Ok(vec![1, -1]));

    let mut bb = ByteBuffer::new(&[4, 0, 0, 0, 1, 0, 2, 0]);
    assert_eq!(bb.read_uint16_array(), Ok(vec![1, 2]));

    let mut bb = ByteBuffer::new(&[2, 0, 0, 0, 0xFF, 0x7F]);
    assert_eq!(bb.read_int8_array(), Ok(vec![-1, 127]));

    let mut bb = ByteBuffer::new(&[3, 0, 0, 0, 1, 2, 3]);
    assert_eq!(
        bb.read_int16_array(),
        Err(CodecError::InvalidArrayLength { len: 3, width: 2 })
    );

    let mut bb = ByteBuffer::new(&[9, 0, 0, 0, 1]);
    assert_eq!(bb.read_byte_array(), Err(out_of_bounds(4, 9, 5)));
}

#[test]
fn read_sequence() {
    let mut bb = ByteBuffer::new(&[
        0, 133, 242, 210, 237, 4, 0, 0, 0, 240, 159, 141, 149, 21, 205, 91, 7,
    ]);
    assert_eq!(bb.read_var_float(), Ok(0.0));
    assert_eq!(bb.read_var_float(), Ok(123.456));
    assert_eq!(bb.read_string(), Ok(Cow::Borrowed("🍕")));
    assert_eq!(bb.read_var_uint(), Ok(123456789));
    assert_eq!(bb.remaining(), 0);
}

/// A Peechy byte buffer meant for writing.
///
/// The backing store grows by reallocating to twice the requested size
/// (see [`WIGGLE_ROOM`]); `len()` tracks how much of it has been written.
///
/// Example usage:
///
/// ```
/// let mut bb = peechy_schema::ByteBufferMut::new();
/// bb.write_string("🍕");
/// bb.write_var_float(123.456);
/// assert_eq!(bb.data(), [4, 0, 0, 0, 240, 159, 141, 149, 133, 242, 210, 237]);
/// ```
///
#[derive(Debug, Clone)]
pub struct ByteBufferMut {
    data: Vec<u8>,
    length: usize,
}

impl Default for ByteBufferMut {
    fn default() -> Self {
        ByteBufferMut::new()
    }
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut {
            data: vec![0; INITIAL_CAPACITY],
            length: 0,
        }
    }

    /// Consumes this buffer and returns the written bytes. Use this to get
    /// the data out when you're done writing to the buffer.
    pub fn data(mut self) -> Vec<u8> {
        self.data.truncate(self.length);
        self.data
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Size of the backing store.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// A reader positioned at the start of the written bytes.
    pub fn reader(&self) -> ByteBuffer<'_> {
        ByteBuffer::new(self.as_slice())
    }

    /// Reserves `amount` bytes at the end of the buffer and returns the index
    /// where they start.
    fn grow_by(&mut self, amount: usize) -> usize {
        let start = self.length;
        if self.length + amount > self.data.len() {
            let mut data = vec![0; ((self.length + amount) * WIGGLE_ROOM) << 1];
            data[..self.length].copy_from_slice(&self.data[..self.length]);
            self.data = data;
        }
        self.length += amount;
        start
    }

    fn write_fixed<const N: usize>(&mut self, bytes: [u8; N]) {
        let start = self.grow_by(N);
        self.data[start..start + N].copy_from_slice(&bytes);
    }

    /// Write a boolean value to the end of the buffer.
    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(if value { 1 } else { 0 });
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        let start = self.grow_by(1);
        self.data[start] = value;
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        let start = self.grow_by(value.len());
        self.data[start..start + value.len()].copy_from_slice(value);
    }

    pub fn write_int8(&mut self, value: i8) {
        self.write_fixed(value.to_le_bytes());
    }

    pub fn write_int16(&mut self, value: i16) {
        self.write_fixed(value.to_le_bytes());
    }

    pub fn write_uint16(&mut self, value: u16) {
        self.write_fixed(value.to_le_bytes());
    }

    pub fn write_int32(&mut self, value: i32) {
        self.write_fixed(value.to_le_bytes());
    }

    pub fn write_uint32(&mut self, value: u32) {
        self.write_fixed(value.to_le_bytes());
    }

    /// Write a signed 32-bit integer as exactly 4 bytes.
    pub fn write_var_int(&mut self, value: i32) {
        self.write_int32(value);
    }

    /// Write an unsigned 32-bit integer as exactly 4 bytes.
    pub fn write_var_uint(&mut self, value: u32) {
        self.write_uint32(value);
    }

    /// Write a raw IEEE-754 32-bit float.
    pub fn write_float32(&mut self, value: f32) {
        self.write_fixed(value.to_le_bytes());
    }

    /// Write a compressed 32-bit floating-point number to the end of the
    /// buffer.
    pub fn write_var_float(&mut self, value: f32) {
        // Move the exponent to the first 8 bits
        let bits = value.to_bits().rotate_left(9);

        // Optimization: use a single byte to store zero and denormals (try for an exponent of 0)
        if (bits & 255) == 0 {
            self.write_byte(0);
            return;
        }

        self.write_fixed(bits.to_le_bytes());
    }

    /// Write a `lowp` value as `round(value * 1000)` in 4 bytes.
    pub fn write_low_precision_float(&mut self, value: f32) {
        let scaled = (value as f64 * LOW_PRECISION_VALUE + 0.5).floor();
        self.write_var_int(scaled as i32);
    }

    /// Write a UTF-8 string prefixed by its byte length.
    pub fn write_string(&mut self, value: &str) {
        self.write_var_uint(value.len() as u32);
        self.write_bytes(value.as_bytes());
    }

    /// Write a NUL-terminated ASCII string. Nothing is written when the
    /// string contains a non-ASCII character.
    pub fn write_alphanumeric(&mut self, value: &str) -> Result<(), CodecError> {
        if let Some(index) = value.chars().position(|c| !c.is_ascii()) {
            return Err(CodecError::NonAscii {
                index,
                text: value.to_owned(),
            });
        }
        self.write_bytes(value.as_bytes());
        self.write_byte(0);
        Ok(())
    }

    /// Write a byte array prefixed by its length.
    pub fn write_byte_array(&mut self, value: &[u8]) {
        self.write_var_uint(value.len() as u32);
        self.write_bytes(value);
    }

    fn write_typed_array<const N: usize, T: Copy>(&mut self, values: &[T], convert: fn(T) -> [u8; N]) {
        self.write_var_uint((values.len() * N) as u32);
        for &value in values {
            self.write_fixed(convert(value));
        }
    }

    pub fn write_int8_array(&mut self, value: &[i8]) {
        self.write_typed_array(value, i8::to_le_bytes);
    }

    pub fn write_int16_array(&mut self, value: &[i16]) {
        self.write_typed_array(value, i16::to_le_bytes);
    }

    pub fn write_uint16_array(&mut self, value: &[u16]) {
        self.write_typed_array(value, u16::to_le_bytes);
    }

    pub fn write_int32_array(&mut self, value: &[i32]) {
        self.write_typed_array(value, i32::to_le_bytes);
    }

    pub fn write_uint32_array(&mut self, value: &[u32]) {
        self.write_typed_array(value, u32::to_le_bytes);
    }

    pub fn write_float32_array(&mut self, value: &[f32]) {
        self.write_typed_array(value, f32::to_le_bytes);
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_bytes() {
    let mut bb = ByteBufferMut::new();
    bb.write_bytes(&[1, 2, 3]);
    bb.write_bytes(&[]);
    bb.write_bytes(&[4, 5]);
    assert_eq!(bb.data(), [1, 2, 3, 4, 5]);
}

#[test]
fn write_fixed_width_integers() {
    assert_eq!(write_once(|bb| bb.write_uint16(0x1234)), [0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_int16(-2)), [0xFE, 0xFF]);
    assert_eq!(write_once(|bb| bb.write_int8(-1)), [0xFF]);
    assert_eq!(write_once(|bb| bb.write_uint32(0x1234_5678)), [0x78, 0x56, 0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_int32(i32::MIN)), [0, 0, 0, 0x80]);
}

#[test]
fn write_var_int() {
    assert_eq!(write_once(|bb| bb.write_var_int(0)), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_int(-1)), [255, 255, 255, 255]);
    assert_eq!(write_once(|bb| bb.write_var_int(1)), [1, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_int(64)), [64, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_int(2147483647)), [255, 255, 255, 127]);
    assert_eq!(write_once(|bb| bb.write_var_int(-2147483648)), [0, 0, 0, 128]);
}

#[test]
fn write_var_uint() {
    assert_eq!(write_once(|bb| bb.write_var_uint(0)), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_uint(1)), [1, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_uint(128)), [128, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_uint(256)), [0, 1, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_uint(4294967295)), [255, 255, 255, 255]);
    for value in [0u32, 1, 127, 128, 16_384, 2_097_152, u32::MAX] {
        let mut bb = ByteBufferMut::new();
        bb.write_var_uint(value);
        assert_eq!(bb.len(), 4);
    }
}

#[test]
fn write_var_float() {
    assert_eq!(write_once(|bb| bb.write_var_float(0.0)), [0]);
    assert_eq!(write_once(|bb| bb.write_var_float(-0.0)), [0]);
    assert_eq!(write_once(|bb| bb.write_var_float(123.456)), [133, 242, 210, 237]);
    assert_eq!(write_once(|bb| bb.write_var_float(-123.456)), [133, 243, 210, 237]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::MIN)), [254, 255, 255, 255]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::MAX)), [254, 254, 255, 255]);
    assert_eq!(write_once(|bb| bb.write_var_float(-f32::MIN_POSITIVE)), [1, 1, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::MIN_POSITIVE)), [1, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::NEG_INFINITY)), [255, 1, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::INFINITY)), [255, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_var_float(f32::NAN)), [255, 0, 0, 128]);
    assert_eq!(write_once(|bb| bb.write_var_float(1.0e-40)), [0]);
}

#[test]
fn var_float_is_bit_exact() {
    for value in [1.0f32, -1.0, 0.1, 3.5e-10, 6.02e23, f32::MAX, f32::MIN_POSITIVE, -7.25] {
        let mut bb = ByteBufferMut::new();
        bb.write_var_float(value);
        let bytes = bb.data();
        let decoded = ByteBuffer::new(&bytes).read_var_float().map(f32::to_bits);
        assert_eq!(decoded, Ok(value.to_bits()));
    }
}

#[test]
fn write_float32_and_lowp() {
    assert_eq!(write_once(|bb| bb.write_float32(1.0)), [0, 0, 128, 63]);
    assert_eq!(write_once(|bb| bb.write_low_precision_float(2.5)), [0xC4, 0x09, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_low_precision_float(-0.25)), [0x06, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn write_string() {
    assert_eq!(write_once(|bb| bb.write_string("")), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_string("a")), [1, 0, 0, 0, 97]);
    assert_eq!(write_once(|bb| bb.write_string("abc")), [3, 0, 0, 0, 97, 98, 99]);
    assert_eq!(write_once(|bb| bb.write_string("🍕")), [4, 0, 0, 0, 240, 159, 141, 149]);
}

#[test]
fn write_alphanumeric() {
    let mut bb = ByteBufferMut::new();
    assert_eq!(bb.write_alphanumeric("abc"), Ok(()));
    assert_eq!(bb.as_slice(), [97, 98, 99, 0]);

    assert_eq!(
        bb.write_alphanumeric("caf\u{e9}"),
        Err(CodecError::NonAscii { index: 3, text: "caf\u{e9}".to_owned() })
    );
    assert_eq!(bb.len(), 4);
}

#[test]
fn write_typed_arrays() {
    assert_eq!(
        write_once(|bb| bb.write_int32_array(&[1, -1])),
        [8, 0, 0, 0, 1, 0, 0, 0, 255, 255, 255, 255]
    );
    assert_eq!(write_once(|bb| bb.write_uint16_array(&[1, 2])), [4, 0, 0, 0, 1, 0, 2, 0]);
    assert_eq!(write_once(|bb| bb.write_byte_array(&[7, 8])), [2, 0, 0, 0, 7, 8]);
    assert_eq!(write_once(|bb| bb.write_float32_array(&[1.0])), [4, 0, 0, 0, 0, 0, 128, 63]);
}

#[test]
fn grows_to_twice_the_requested_length() {
    let mut bb = ByteBufferMut::new();
    assert_eq!(bb.capacity(), INITIAL_CAPACITY);

    bb.write_bytes(&[1; 200]);
    assert_eq!(bb.capacity(), INITIAL_CAPACITY);

    bb.write_bytes(&[2; 100]);
    assert_eq!(bb.capacity(), 600);
    assert_eq!(bb.len(), 300);
    assert_eq!(bb.as_slice()[199], 1);
    assert_eq!(bb.as_slice()[200], 2);
}

#[test]
fn write_sequence() {
    let mut bb = ByteBufferMut::new();
    bb.write_var_float(0.0);
    bb.write_var_float(123.456);
    bb.write_string("🍕");
    bb.write_var_uint(123456789);
    assert_eq!(
        bb.data(),
        [0, 133, 242, 210, 237, 4, 0, 0, 0, 240, 159, 141, 149, 21, 205, 91, 7]
    );
}
