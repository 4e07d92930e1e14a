//! Packed binary layout.
//!
//! ```text
//! header   "TMPR" | version u8 | granularity u8 | kind u8 | flags u8 | srid i32 | count u32
//! offsets  count x u32, relative to the first element, padded to 8 bytes
//! elements instants (or sequences for a sequence set), each padded to 8 bytes
//! trailer  bounding box
//! ```
//!
//! An instant is its timestamp (i64 microseconds) followed by its value. A
//! sequence inside a sequence set starts with its bound flags and instant
//! count. All integers are big-endian.

use crate::error::{Result, TemporalError};
use crate::temporal::instant::Instant;
use crate::temporal::instant_set::InstantSet;
use crate::temporal::sequence::Sequence;
use crate::temporal::sequence_set::SequenceSet;
use crate::temporal::{Granularity, Interpolation, Temporal};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::debug;
use tempora_types::bbox::{BoundingBox, STBox, SpaceExtent, Span, TBox, TimeSpan};
use tempora_types::point::GeoPoint;
use tempora_types::time::{Period, Timestamp};
use tempora_types::value::{BaseKind, Value};

pub const MAGIC: &[u8; 4] = b"TMPR";
pub const VERSION: u8 = 1;

const HEADER_LEN: usize = 16;
const ALIGN: usize = 8;

const FLAG_LINEAR: u8 = 0b0000_0001;
const FLAG_LOWER_INC: u8 = 0b0000_0010;
const FLAG_UPPER_INC: u8 = 0b0000_0100;
const FLAG_HAS_Z: u8 = 0b0000_1000;
const FLAG_GEODETIC: u8 = 0b0001_0000;

const BOX_PERIOD: u8 = 1;
const BOX_NUMERIC: u8 = 2;
const BOX_SPATIAL: u8 = 3;

const DIM_VALUE: u8 = 0b0001;
const DIM_SPACE: u8 = 0b0010;
const DIM_Z: u8 = 0b0100;
const DIM_TIME: u8 = 0b1000;

fn padded(len: usize) -> usize {
    len.div_ceil(ALIGN) * ALIGN
}

fn pad(buf: &mut BytesMut) {
    let rem = buf.len() % ALIGN;
    if rem != 0 {
        buf.put_bytes(0, ALIGN - rem);
    }
}

enum Element<'a> {
    Instant(&'a Instant),
    Sequence(&'a Sequence),
}

fn elements(temp: &Temporal) -> Vec<Element<'_>> {
    match temp {
        Temporal::Instant(inst) => vec![Element::Instant(inst)],
        Temporal::InstantSet(set) => set.instants().iter().map(Element::Instant).collect(),
        Temporal::Sequence(seq) => seq.instants().iter().map(Element::Instant).collect(),
        Temporal::SequenceSet(set) => set.sequences().iter().map(Element::Sequence).collect(),
    }
}

fn value_size(value: &Value) -> usize {
    match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => 8,
        Value::Text(s) => padded(4 + s.len()),
        Value::Point(p) => {
            if p.has_z() {
                24
            } else {
                16
            }
        }
    }
}

fn instant_size(inst: &Instant) -> usize {
    8 + value_size(inst.value())
}

fn element_size(element: &Element<'_>) -> usize {
    match element {
        Element::Instant(inst) => instant_size(inst),
        Element::Sequence(seq) => 8 + seq.instants().iter().map(instant_size).sum::<usize>(),
    }
}

fn bbox_size(bbox: &BoundingBox) -> usize {
    let dims = match bbox {
        BoundingBox::Period(_) => 1,
        BoundingBox::TBox(b) => usize::from(b.value.is_some()) + usize::from(b.time.is_some()),
        BoundingBox::STBox(b) => {
            let space = b.space.map_or(0, |s| if s.z.is_some() { 3 } else { 2 });
            space + usize::from(b.time.is_some())
        }
    };
    8 + dims * 16
}

/// Size in bytes of the packed form of `temp`, computed without encoding.
///
/// # Examples
///
/// ```
/// use tempora::storage::{encode, packed_size};
/// use tempora::{Instant, Temporal, Timestamp};
///
/// let temp = Temporal::from(Instant::new(42, Timestamp::from_secs(1))?);
/// assert_eq!(encode(&temp)?.len(), packed_size(&temp));
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn packed_size(temp: &Temporal) -> usize {
    let elements = elements(temp);
    HEADER_LEN
        + padded(4 * elements.len())
        + elements.iter().map(element_size).sum::<usize>()
        + bbox_size(&temp.bbox())
}

fn header_flags(temp: &Temporal) -> (u8, i32) {
    let mut flags = 0;
    if temp.is_linear() {
        flags |= FLAG_LINEAR;
    }
    if let Temporal::Sequence(seq) = temp {
        if seq.lower_inc() {
            flags |= FLAG_LOWER_INC;
        }
        if seq.upper_inc() {
            flags |= FLAG_UPPER_INC;
        }
    }
    let mut srid = 0;
    if let Value::Point(p) = temp.start_instant().value() {
        if p.has_z() {
            flags |= FLAG_HAS_Z;
        }
        if p.is_geodetic() {
            flags |= FLAG_GEODETIC;
        }
        srid = p.srid;
    }
    (flags, srid)
}

fn to_u32(n: usize, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| {
        TemporalError::InvalidFormat(format!("{} {} does not fit the layout", what, n))
    })
}

fn put_value(buf: &mut BytesMut, value: &Value) -> Result<()> {
    match value {
        Value::Bool(b) => {
            buf.put_u8(u8::from(*b));
            pad(buf);
        }
        Value::Int(i) => buf.put_i64(*i),
        Value::Float(f) => buf.put_f64(*f),
        Value::Text(s) => {
            buf.put_u32(to_u32(s.len(), "text length")?);
            buf.put(s.as_bytes());
            pad(buf);
        }
        Value::Point(p) => {
            buf.put_f64(p.x());
            buf.put_f64(p.y());
            if let Some(z) = p.z() {
                buf.put_f64(z);
            }
        }
    }
    Ok(())
}

fn put_instant(buf: &mut BytesMut, inst: &Instant) -> Result<()> {
    buf.put_i64(inst.timestamp().as_micros());
    put_value(buf, inst.value())
}

fn put_span(buf: &mut BytesMut, span: &Span) {
    buf.put_f64(span.min);
    buf.put_f64(span.max);
}

fn put_time(buf: &mut BytesMut, time: &TimeSpan) {
    buf.put_i64(time.tmin.as_micros());
    buf.put_i64(time.tmax.as_micros());
}

fn put_bbox(buf: &mut BytesMut, bbox: &BoundingBox) {
    match bbox {
        BoundingBox::Period(p) => {
            let bounds = u8::from(p.lower_inc()) | (u8::from(p.upper_inc()) << 1);
            buf.put_u8(BOX_PERIOD);
            buf.put_u8(DIM_TIME);
            buf.put_u8(bounds);
            pad(buf);
            buf.put_i64(p.lower().as_micros());
            buf.put_i64(p.upper().as_micros());
        }
        BoundingBox::TBox(b) => {
            let mut dims = 0;
            if b.value.is_some() {
                dims |= DIM_VALUE;
            }
            if b.time.is_some() {
                dims |= DIM_TIME;
            }
            buf.put_u8(BOX_NUMERIC);
            buf.put_u8(dims);
            pad(buf);
            if let Some(value) = &b.value {
                put_span(buf, value);
            }
            if let Some(time) = &b.time {
                put_time(buf, time);
            }
        }
        BoundingBox::STBox(b) => {
            let mut dims = 0;
            if let Some(space) = &b.space {
                dims |= DIM_SPACE;
                if space.z.is_some() {
                    dims |= DIM_Z;
                }
            }
            if b.time.is_some() {
                dims |= DIM_TIME;
            }
            buf.put_u8(BOX_SPATIAL);
            buf.put_u8(dims);
            pad(buf);
            if let Some(space) = &b.space {
                put_span(buf, &space.x);
                put_span(buf, &space.y);
                if let Some(z) = &space.z {
                    put_span(buf, z);
                }
            }
            if let Some(time) = &b.time {
                put_time(buf, time);
            }
        }
    }
}

/// Encodes `temp` into the packed layout.
///
/// Fails only when a count or a text value is too large for the 32-bit
/// length fields.
pub fn encode(temp: &Temporal) -> Result<Bytes> {
    let capacity = packed_size(temp);
    let mut buf = BytesMut::with_capacity(capacity);
    let (flags, srid) = header_flags(temp);
    let elements = elements(temp);

    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);
    buf.put_u8(temp.granularity().tag());
    buf.put_u8(temp.kind().tag());
    buf.put_u8(flags);
    buf.put_i32(srid);
    buf.put_u32(to_u32(elements.len(), "element count")?);

    let mut offset = 0;
    for element in &elements {
        buf.put_u32(to_u32(offset, "element offset")?);
        offset += element_size(element);
    }
    pad(&mut buf);

    for element in &elements {
        match element {
            Element::Instant(inst) => put_instant(&mut buf, inst)?,
            Element::Sequence(seq) => {
                let bounds = u8::from(seq.lower_inc()) | (u8::from(seq.upper_inc()) << 1);
                buf.put_u8(bounds);
                buf.put_bytes(0, 3);
                buf.put_u32(to_u32(seq.num_instants(), "instant count")?);
                for inst in seq.instants() {
                    put_instant(&mut buf, inst)?;
                }
            }
        }
    }
    put_bbox(&mut buf, &temp.bbox());

    debug_assert_eq!(buf.len(), capacity);
    Ok(buf.freeze())
}

/// Bounds-checked reader over a packed buffer.
struct Reader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    fn position(&self) -> usize {
        self.len - self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(TemporalError::UnexpectedEof);
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    fn i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    fn f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.buf.advance(n);
        Ok(())
    }

    fn align(&mut self) -> Result<()> {
        let rem = self.position() % ALIGN;
        if rem != 0 {
            self.skip(ALIGN - rem)?;
        }
        Ok(())
    }
}

struct Header {
    granularity: Granularity,
    kind: BaseKind,
    flags: u8,
    srid: i32,
    count: usize,
}

impl Header {
    fn interpolation(&self) -> Interpolation {
        if self.flags & FLAG_LINEAR != 0 {
            Interpolation::Linear
        } else {
            Interpolation::Step
        }
    }
}

fn read_header(reader: &mut Reader<'_>) -> Result<Header> {
    if reader.bytes(4)? != MAGIC {
        return Err(TemporalError::InvalidFormat("bad magic number".to_string()));
    }
    let version = reader.u8()?;
    if version != VERSION {
        return Err(TemporalError::InvalidFormat(format!(
            "unsupported layout version {}",
            version
        )));
    }
    let tag = reader.u8()?;
    let granularity = Granularity::from_tag(tag)
        .ok_or_else(|| TemporalError::InvalidFormat(format!("unknown granularity tag {}", tag)))?;
    let tag = reader.u8()?;
    let kind = BaseKind::from_tag(tag)
        .ok_or_else(|| TemporalError::InvalidFormat(format!("unknown base kind tag {}", tag)))?;
    let flags = reader.u8()?;
    let srid = reader.i32()?;
    let count = reader.u32()? as usize;
    if count == 0 {
        return Err(TemporalError::InvalidFormat("element count is zero".to_string()));
    }
    if granularity == Granularity::Instant && count != 1 {
        return Err(TemporalError::InvalidFormat(format!(
            "an instant has exactly one element, found {}",
            count
        )));
    }
    Ok(Header {
        granularity,
        kind,
        flags,
        srid,
        count,
    })
}

fn read_offsets(reader: &mut Reader<'_>, count: usize) -> Result<Vec<usize>> {
    reader.need(4 * count)?;
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(reader.u32()? as usize);
    }
    reader.align()?;
    Ok(offsets)
}

fn read_value(reader: &mut Reader<'_>, header: &Header) -> Result<Value> {
    let value = match header.kind {
        BaseKind::Bool => {
            let byte = reader.u8()?;
            reader.align()?;
            match byte {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(TemporalError::InvalidFormat(format!(
                        "invalid boolean byte {}",
                        other
                    )));
                }
            }
        }
        BaseKind::Int => Value::Int(reader.i64()?),
        BaseKind::Float => Value::Float(reader.f64()?),
        BaseKind::Text => {
            let len = reader.u32()? as usize;
            let raw = reader.bytes(len)?;
            reader.align()?;
            let text = std::str::from_utf8(raw).map_err(|e| {
                TemporalError::InvalidFormat(format!("text value is not UTF-8: {}", e))
            })?;
            Value::Text(text.to_string())
        }
        BaseKind::Point => {
            let (x, y) = (reader.f64()?, reader.f64()?);
            let mut point = if header.flags & FLAG_HAS_Z != 0 {
                GeoPoint::new_3d(x, y, reader.f64()?)
            } else {
                GeoPoint::new(x, y)
            };
            point = point.with_srid(header.srid);
            if header.flags & FLAG_GEODETIC != 0 {
                point = point.geodetic();
            }
            Value::Point(point)
        }
    };
    Ok(value)
}

fn read_instant(reader: &mut Reader<'_>, header: &Header) -> Result<Instant> {
    let t = Timestamp::from_micros(reader.i64()?);
    let value = read_value(reader, header)?;
    Instant::make(value, t, header.kind)
}

fn read_sequence(reader: &mut Reader<'_>, header: &Header) -> Result<Sequence> {
    let bounds = reader.u8()?;
    reader.skip(3)?;
    let count = reader.u32()? as usize;
    if count == 0 {
        return Err(TemporalError::InvalidFormat("sequence without instants".to_string()));
    }
    // every instant takes at least 16 bytes
    reader.need(16 * count)?;
    let mut instants = Vec::with_capacity(count);
    for _ in 0..count {
        instants.push(read_instant(reader, header)?);
    }
    Sequence::make(
        instants,
        bounds & 0b01 != 0,
        bounds & 0b10 != 0,
        header.interpolation(),
        false,
    )
}

fn read_time(reader: &mut Reader<'_>) -> Result<TimeSpan> {
    let tmin = Timestamp::from_micros(reader.i64()?);
    let tmax = Timestamp::from_micros(reader.i64()?);
    Ok(TimeSpan::new(tmin, tmax))
}

fn read_span(reader: &mut Reader<'_>) -> Result<Span> {
    let min = reader.f64()?;
    let max = reader.f64()?;
    Ok(Span::new(min, max))
}

fn read_bbox(reader: &mut Reader<'_>, header: &Header) -> Result<BoundingBox> {
    let family = reader.u8()?;
    let dims = reader.u8()?;
    let bounds = reader.u8()?;
    reader.align()?;
    let bbox = match family {
        BOX_PERIOD => {
            let lower = Timestamp::from_micros(reader.i64()?);
            let upper = Timestamp::from_micros(reader.i64()?);
            BoundingBox::Period(Period::new(lower, upper, bounds & 0b01 != 0, bounds & 0b10 != 0)?)
        }
        BOX_NUMERIC => {
            let value = if dims & DIM_VALUE != 0 {
                Some(read_span(reader)?)
            } else {
                None
            };
            let time = if dims & DIM_TIME != 0 {
                Some(read_time(reader)?)
            } else {
                None
            };
            BoundingBox::TBox(TBox::new(value, time)?)
        }
        BOX_SPATIAL => {
            let space = if dims & DIM_SPACE != 0 {
                let x = read_span(reader)?;
                let y = read_span(reader)?;
                let z = if dims & DIM_Z != 0 {
                    Some(read_span(reader)?)
                } else {
                    None
                };
                Some(SpaceExtent { x, y, z })
            } else {
                None
            };
            let time = if dims & DIM_TIME != 0 {
                Some(read_time(reader)?)
            } else {
                None
            };
            BoundingBox::STBox(STBox::new(
                space,
                time,
                header.srid,
                header.flags & FLAG_GEODETIC != 0,
            )?)
        }
        other => {
            return Err(TemporalError::InvalidFormat(format!(
                "unknown bounding box family {}",
                other
            )));
        }
    };
    Ok(bbox)
}

fn check_offset(reader: &Reader<'_>, base: usize, expected: usize) -> Result<()> {
    let actual = reader.position() - base;
    if actual != expected {
        return Err(TemporalError::InvalidFormat(format!(
            "element found at offset {}, table says {}",
            actual, expected
        )));
    }
    Ok(())
}

/// Decodes a packed value, rebuilding it through the validating constructors.
///
/// The trailing bounding box must agree with the box recomputed from the
/// decoded instants.
///
/// # Examples
///
/// ```
/// use tempora::storage::{decode, encode};
/// use tempora::{Instant, InstantSet, Temporal, Timestamp};
///
/// let t = Timestamp::from_secs;
/// let temp = Temporal::from(InstantSet::make(
///     vec![Instant::new("on", t(1))?, Instant::new("off", t(2))?],
///     false,
/// )?);
/// let bytes = encode(&temp)?;
/// assert_eq!(decode(&bytes)?, temp);
/// assert!(decode(&bytes[..bytes.len() - 1]).is_err());
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn decode(bytes: &[u8]) -> Result<Temporal> {
    let mut reader = Reader::new(bytes);
    let header = read_header(&mut reader)?;
    let offsets = read_offsets(&mut reader, header.count)?;
    let base = reader.position();

    let temp = if header.granularity == Granularity::SequenceSet {
        let mut sequences = Vec::with_capacity(header.count);
        for &offset in &offsets {
            check_offset(&reader, base, offset)?;
            sequences.push(read_sequence(&mut reader, &header)?);
        }
        Temporal::SequenceSet(SequenceSet::make(sequences, false)?)
    } else {
        let mut instants = Vec::with_capacity(header.count);
        for &offset in &offsets {
            check_offset(&reader, base, offset)?;
            instants.push(read_instant(&mut reader, &header)?);
        }
        match header.granularity {
            Granularity::Instant => instants
                .pop()
                .map(Temporal::Instant)
                .ok_or(TemporalError::EmptyInput)?,
            Granularity::InstantSet => Temporal::InstantSet(InstantSet::make(instants, false)?),
            _ => Temporal::Sequence(Sequence::make(
                instants,
                header.flags & FLAG_LOWER_INC != 0,
                header.flags & FLAG_UPPER_INC != 0,
                header.interpolation(),
                false,
            )?),
        }
    };

    let stored = read_bbox(&mut reader, &header)?;
    if stored != temp.bbox() {
        return Err(TemporalError::InvalidFormat(
            "bounding box does not match the decoded instants".to_string(),
        ));
    }
    if reader.buf.has_remaining() {
        return Err(TemporalError::InvalidFormat(format!(
            "{} trailing bytes",
            reader.buf.remaining()
        )));
    }
    debug!(
        "decoded {:?} of {} with {} elements",
        header.granularity, header.kind, header.count
    );
    Ok(temp)
}

/// Decodes only the `n`-th element through the offset table.
///
/// The element is an instant for instant-based layouts and a sequence for a
/// sequence set. Returns `Ok(None)` when `n` is out of range.
pub fn read_element(bytes: &[u8], n: usize) -> Result<Option<Temporal>> {
    let mut reader = Reader::new(bytes);
    let header = read_header(&mut reader)?;
    let offsets = read_offsets(&mut reader, header.count)?;
    let Some(&offset) = offsets.get(n) else {
        return Ok(None);
    };
    reader.skip(offset)?;
    let element = if header.granularity == Granularity::SequenceSet {
        Temporal::Sequence(read_sequence(&mut reader, &header)?)
    } else {
        Temporal::Instant(read_instant(&mut reader, &header)?)
    };
    Ok(Some(element))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn sequence(values: &[(f64, i64)], interp: Interpolation, upper_inc: bool) -> Sequence {
        let instants = values
            .iter()
            .map(|&(v, s)| Instant::new(v, t(s)).unwrap())
            .collect();
        Sequence::make(instants, true, upper_inc, interp, false).unwrap()
    }

    fn assert_round_trip(temp: &Temporal) {
        let bytes = encode(temp).unwrap();
        assert_eq!(bytes.len(), packed_size(temp));
        assert_eq!(bytes.len() % ALIGN, 0);
        assert_eq!(&decode(&bytes).unwrap(), temp);
    }

    #[test]
    fn test_round_trip_each_granularity() {
        assert_round_trip(&Temporal::Instant(Instant::new(true, t(3)).unwrap()));
        assert_round_trip(&Temporal::InstantSet(
            InstantSet::make(
                vec![Instant::new(1, t(1)).unwrap(), Instant::new(-7, t(9)).unwrap()],
                false,
            )
            .unwrap(),
        ));
        assert_round_trip(&Temporal::Sequence(sequence(
            &[(1.0, 0), (4.0, 5), (2.0, 10)],
            Interpolation::Linear,
            false,
        )));
        let set = SequenceSet::make(
            vec![
                sequence(&[(1.0, 0), (1.0, 5)], Interpolation::Step, false),
                sequence(&[(3.0, 7), (2.0, 9)], Interpolation::Step, true),
            ],
            false,
        )
        .unwrap();
        assert_round_trip(&Temporal::SequenceSet(set));
    }

    #[test]
    fn test_round_trip_points_and_text() {
        let p1 = GeoPoint::new_3d(-74.0, 40.7, 10.0).with_srid(4326).geodetic();
        let p2 = GeoPoint::new_3d(-73.9, 40.8, 12.5).with_srid(4326).geodetic();
        let seq = Sequence::make(
            vec![Instant::new(p1, t(0)).unwrap(), Instant::new(p2, t(60)).unwrap()],
            true,
            true,
            Interpolation::Linear,
            false,
        )
        .unwrap();
        assert_round_trip(&Temporal::Sequence(seq));

        let text = InstantSet::make(
            vec![
                Instant::new("a", t(0)).unwrap(),
                Instant::new("a longer label", t(1)).unwrap(),
                Instant::new("", t(2)).unwrap(),
            ],
            false,
        )
        .unwrap();
        assert_round_trip(&Temporal::InstantSet(text));
    }

    #[test]
    fn test_header_fields() {
        let temp = Temporal::Sequence(sequence(&[(1.0, 0), (2.0, 10)], Interpolation::Linear, true));
        let bytes = encode(&temp).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes[4], VERSION);
        assert_eq!(bytes[5], Granularity::Sequence.tag());
        assert_eq!(bytes[6], BaseKind::Float.tag());
        assert_eq!(bytes[7], FLAG_LINEAR | FLAG_LOWER_INC | FLAG_UPPER_INC);
        // count at 12..16, offsets of two 16-byte instants
        assert_eq!(&bytes[12..16], &2u32.to_be_bytes());
        assert_eq!(&bytes[16..20], &0u32.to_be_bytes());
        assert_eq!(&bytes[20..24], &16u32.to_be_bytes());
    }

    #[test]
    fn test_read_element() {
        let set = SequenceSet::make(
            vec![
                sequence(&[(1.0, 0), (2.0, 5)], Interpolation::Linear, true),
                sequence(&[(3.0, 7), (2.0, 9), (8.0, 12)], Interpolation::Linear, true),
            ],
            false,
        )
        .unwrap();
        let bytes = encode(&Temporal::SequenceSet(set.clone())).unwrap();
        let second = read_element(&bytes, 1).unwrap().unwrap();
        assert_eq!(second, Temporal::Sequence(set.sequences()[1].clone()));
        assert!(read_element(&bytes, 2).unwrap().is_none());
    }

    #[test]
    fn test_rejects_corrupt_input() {
        let temp = Temporal::Sequence(sequence(&[(1.0, 0), (2.0, 10)], Interpolation::Linear, true));
        let bytes = encode(&temp).unwrap().to_vec();

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(decode(&bad_magic), Err(TemporalError::InvalidFormat(_))));

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(matches!(decode(&bad_version), Err(TemporalError::InvalidFormat(_))));

        assert_eq!(decode(&bytes[..20]), Err(TemporalError::UnexpectedEof));
        assert_eq!(decode(&[]), Err(TemporalError::UnexpectedEof));

        let mut extra = bytes.clone();
        extra.extend_from_slice(&[0; 8]);
        assert!(matches!(decode(&extra), Err(TemporalError::InvalidFormat(_))));

        // swap the two timestamps: the sequence constructor rejects the order
        let mut unordered = bytes.clone();
        let (first, second) = (24..32, 40..48);
        let a = unordered[first.clone()].to_vec();
        let b = unordered[second.clone()].to_vec();
        unordered[first].copy_from_slice(&b);
        unordered[second].copy_from_slice(&a);
        assert!(matches!(
            decode(&unordered),
            Err(TemporalError::UnorderedTimestamps { .. })
        ));
    }

    #[test]
    fn test_rejects_mismatched_bbox() {
        let temp = Temporal::Instant(Instant::new(5.0, t(1)).unwrap());
        let mut bytes = encode(&temp).unwrap().to_vec();
        // value span minimum lives right after the 8-byte box header
        let at = bytes.len() - 32;
        bytes[at..at + 8].copy_from_slice(&4.0f64.to_be_bytes());
        assert!(matches!(decode(&bytes), Err(TemporalError::InvalidFormat(_))));
    }
}
