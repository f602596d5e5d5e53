//! Replay of a serialized record stream into a [`RecordSink`].

use std::collections::BTreeMap;

use tracing::debug;

use graphwire_stream::StreamReader;

use crate::error::{DecodeError, DecodeResult};
use crate::id::{ObjectId, END_OF_STREAM};
use crate::sink::RecordSink;
use crate::tag::Tag;
use crate::value::{DtypeTerm, Primitive};

/// Read records from `stream` and replay each onto `sink` until the
/// terminator record.
///
/// Each decode routine consumes exactly the bytes its matching encode
/// routine wrote; that symmetry is the format's core correctness property.
/// A stream that ends before the terminator fails with
/// [`DecodeError::Truncated`] rather than being treated as complete.
///
/// The sink receives IDs and cross-references verbatim; resolving IDs into
/// live objects is the sink's concern, not the decoder's.
pub fn deserialize_from_stream<S: RecordSink>(
    stream: &mut StreamReader,
    sink: &mut S,
) -> DecodeResult<()> {
    loop {
        let raw_id = stream.read_i64()?;
        if raw_id == END_OF_STREAM {
            sink.define_end_of_stream()?;
            return Ok(());
        }
        if raw_id < 0 {
            return Err(DecodeError::InvalidObjectId(raw_id));
        }
        let id = ObjectId::new(raw_id as u64);

        let code = stream.read_byte()?;
        let tag = Tag::from_byte(code).ok_or(DecodeError::UnknownTag(code))?;
        debug!(id = %id, tag = ?tag, "decode record");

        match tag {
            Tag::None
            | Tag::Int
            | Tag::Long
            | Tag::Float
            | Tag::Bool
            | Tag::Str
            | Tag::ListOfPrimitives => {
                let value = read_primitive_payload(tag, stream)?;
                sink.define_primitive(id, &value)?;
            }
            Tag::Tuple => {
                let members = read_id_array(stream)?;
                sink.define_tuple(id, &members)?;
            }
            Tag::List => {
                let members = read_id_array(stream)?;
                sink.define_list(id, &members)?;
            }
            Tag::File => {
                let path = read_utf8(stream, "file path")?;
                let text = read_utf8(stream, "file text")?;
                sink.define_file(id, &text, &path)?;
            }
            Tag::Dict => {
                let keys = read_id_array(stream)?;
                let values = read_id_array(stream)?;
                sink.define_dict(id, &keys, &values)?;
            }
            Tag::BuiltinExceptionInstance => {
                let type_name = read_utf8(stream, "exception type name")?;
                let args_id = read_object_id(stream)?;
                sink.define_builtin_exception_instance(id, &type_name, args_id)?;
            }
            Tag::NamedSingleton => {
                let name = read_utf8(stream, "singleton name")?;
                sink.define_named_singleton(id, &name)?;
            }
            Tag::Function => {
                let source_file_id = read_object_id(stream)?;
                let line_number = stream.read_i32()?;
                let resolutions = read_name_table(stream)?;
                sink.define_function(id, source_file_id, line_number, &resolutions)?;
            }
            Tag::Class => {
                let source_file_id = read_object_id(stream)?;
                let line_number = stream.read_i32()?;
                let resolutions = read_name_table(stream)?;
                let bases = read_id_array(stream)?;
                sink.define_class(id, source_file_id, line_number, &resolutions, &bases)?;
            }
            Tag::WithBlock => {
                let source_file_id = read_object_id(stream)?;
                let line_number = stream.read_i32()?;
                let resolutions = read_name_table(stream)?;
                sink.define_with_block(id, source_file_id, line_number, &resolutions)?;
            }
            Tag::Unconvertible => {
                let present = stream.read_byte()?;
                let module_path = if present != 0 {
                    Some(read_utf8(stream, "module path")?)
                } else {
                    None
                };
                sink.define_unconvertible(id, module_path.as_deref())?;
            }
            Tag::ClassInstance => {
                let class_id = read_object_id(stream)?;
                let members = read_name_table(stream)?;
                sink.define_class_instance(id, class_id, &members)?;
            }
            Tag::InstanceMethod => {
                let instance_id = read_object_id(stream)?;
                let method_name = read_utf8(stream, "method name")?;
                sink.define_instance_method(id, instance_id, &method_name)?;
            }
            Tag::AbortException => {
                let type_name = read_utf8(stream, "exception type name")?;
                let args_id = read_object_id(stream)?;
                sink.define_abort_exception(id, &type_name, args_id)?;
            }
            Tag::PackedHomogeneousData => {
                let dtype = read_dtype(stream)?;
                let data = stream.read_string()?;
                sink.define_packed_homogeneous_data(id, &dtype, &data)?;
            }
            Tag::RemoteObjectReference | Tag::StackTraceAsJson => {
                return Err(DecodeError::UnsupportedRecord(tag));
            }
        }
    }
}

fn read_object_id(stream: &mut StreamReader) -> DecodeResult<ObjectId> {
    let raw = stream.read_i64()?;
    if raw < 0 {
        return Err(DecodeError::InvalidObjectId(raw));
    }
    Ok(ObjectId::new(raw as u64))
}

fn read_id_array(stream: &mut StreamReader) -> DecodeResult<Vec<ObjectId>> {
    let raw = stream.read_i64s()?;
    raw.into_iter()
        .map(|i| {
            if i < 0 {
                Err(DecodeError::InvalidObjectId(i))
            } else {
                Ok(ObjectId::new(i as u64))
            }
        })
        .collect()
}

fn read_utf8(stream: &mut StreamReader, field: &'static str) -> DecodeResult<String> {
    let bytes = stream.read_string()?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
}

fn read_name_table(stream: &mut StreamReader) -> DecodeResult<BTreeMap<String, ObjectId>> {
    let count = stream.read_i32()?;
    if count < 0 {
        return Err(DecodeError::InvalidCount(count as i64));
    }
    let mut table = BTreeMap::new();
    for _ in 0..count {
        let name = read_utf8(stream, "table entry name")?;
        let id = read_object_id(stream)?;
        table.insert(name, id);
    }
    Ok(table)
}

fn read_primitive_payload(tag: Tag, stream: &mut StreamReader) -> DecodeResult<Primitive> {
    Ok(match tag {
        Tag::None => Primitive::None,
        Tag::Int => Primitive::Int(stream.read_i64()?),
        Tag::Long => Primitive::Long(read_utf8(stream, "long digits")?),
        Tag::Float => Primitive::Float(stream.read_f64()?),
        Tag::Bool => Primitive::Bool(stream.read_byte()? != 0),
        Tag::Str => Primitive::Str(read_utf8(stream, "string value")?),
        Tag::ListOfPrimitives => {
            let count = stream.read_i64()?;
            if count < 0 {
                return Err(DecodeError::InvalidCount(count));
            }
            let mut elements = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let code = stream.read_byte()?;
                let element_tag = Tag::from_byte(code).ok_or(DecodeError::UnknownTag(code))?;
                elements.push(read_primitive_payload(element_tag, stream)?);
            }
            Primitive::List(elements)
        }
        other => return Err(DecodeError::UnknownTag(other.code())),
    })
}

fn read_dtype(stream: &mut StreamReader) -> DecodeResult<DtypeTerm> {
    let code = stream.read_byte()?;
    match Tag::from_byte(code) {
        Some(Tag::None) => Ok(DtypeTerm::None),
        Some(Tag::Int) => Ok(DtypeTerm::Int(stream.read_i64()?)),
        Some(Tag::Str) => Ok(DtypeTerm::Str(read_utf8(stream, "dtype name")?)),
        Some(Tag::Tuple) => {
            let count = stream.read_i32()?;
            if count < 0 {
                return Err(DecodeError::InvalidCount(count as i64));
            }
            let mut terms = Vec::with_capacity(count as usize);
            for _ in 0..count {
                terms.push(read_dtype(stream)?);
            }
            Ok(DtypeTerm::Tuple(terms))
        }
        _ => Err(DecodeError::InvalidDtypeTag(code)),
    }
}
