//! Little-endian binary encoding for key values and key data.
//!
//! Every key type and every data type stored in a persisted grove implements
//! [`BinaryCodec`]. Lengths are written as `u64`, optional values carry a one byte
//! presence flag.
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub trait BinaryCodec: Sized {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self>;
}

/// Build an [`io::Error`] of kind `InvalidData` from anything printable.
pub fn invalid_data<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

/// Write a length prefix.
pub fn write_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    writer.write_u64::<LittleEndian>(len as u64)
}

/// Read a length prefix, rejecting values that do not fit in `usize`.
pub fn read_len<R: Read>(reader: &mut R) -> io::Result<usize> {
    let len = reader.read_u64::<LittleEndian>()?;
    usize::try_from(len).map_err(invalid_data)
}

impl BinaryCodec for () {
    fn encode<W: Write>(&self, _writer: &mut W) -> io::Result<()> {
        Ok(())
    }

    fn decode<R: Read>(_reader: &mut R) -> io::Result<Self> {
        Ok(())
    }
}

impl BinaryCodec for bool {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(u8::from(*self))
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(invalid_data(format!("invalid boolean byte {other}"))),
        }
    }
}

impl BinaryCodec for u8 {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(*self)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_u8()
    }
}

macro_rules! impl_codec_for_number {
    ($ty:ty, $write:ident, $read:ident) => {
        impl BinaryCodec for $ty {
            fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
                writer.$write::<LittleEndian>(*self)
            }

            fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
                reader.$read::<LittleEndian>()
            }
        }
    };
}

impl_codec_for_number!(u32, write_u32, read_u32);
impl_codec_for_number!(u64, write_u64, read_u64);
impl_codec_for_number!(i32, write_i32, read_i32);
impl_codec_for_number!(i64, write_i64, read_i64);
impl_codec_for_number!(f64, write_f64, read_f64);

impl BinaryCodec for String {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_len(writer, self.len())?;
        writer.write_all(self.as_bytes())
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let len = read_len(reader)?;
        // grows with the bytes actually read, not with the prefix
        let mut buf = Vec::new();
        reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("string of {len} bytes ends after {}", buf.len()),
            ));
        }
        String::from_utf8(buf).map_err(invalid_data)
    }
}

impl<T: BinaryCodec> BinaryCodec for Vec<T> {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_len(writer, self.len())?;
        for item in self {
            item.encode(writer)?;
        }
        Ok(())
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let len = read_len(reader)?;
        // don't trust the prefix for the allocation size
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<T: BinaryCodec> BinaryCodec for Option<T> {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Some(value) => {
                writer.write_u8(1)?;
                value.encode(writer)
            }
            None => writer.write_u8(0),
        }
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        match reader.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(reader)?)),
            other => Err(invalid_data(format!("invalid presence byte {other}"))),
        }
    }
}
