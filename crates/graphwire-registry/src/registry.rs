//! The object registry: ID allocation plus record encoding.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use graphwire_stream::StreamWriter;

use crate::error::{RegistryError, RegistryResult};
use crate::id::{ObjectId, END_OF_STREAM};
use crate::sink::RecordSink;
use crate::tag::Tag;
use crate::value::{DtypeTerm, Primitive};

/// Assigns object IDs and serializes one "define" record per distinct
/// object into an append-only byte stream.
///
/// The registry owns its stream buffer and the unconvertible-ID side-set
/// exclusively. It performs no deduplication itself; callers (normally the
/// graph walker) are responsible for defining each distinct object exactly
/// once. It is single-session, single-threaded state.
///
/// Encoding happens through the [`RecordSink`] implementation, so the same
/// surface serves both fresh encoding and replay of a decoded stream.
#[derive(Clone, Debug, Default)]
pub struct ObjectRegistry {
    stream: StreamWriter,
    next_object_id: u64,
    unconvertible: HashSet<ObjectId>,
}

impl ObjectRegistry {
    /// Create an empty registry with the ID counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next unused object ID and advance the counter.
    ///
    /// Has no effect on the byte stream; the returned ID becomes the leading
    /// field of whichever record the caller encodes next for this object.
    pub fn allocate_object(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    /// O(1) membership test against the unconvertible-ID side-set.
    pub fn is_unconvertible(&self, id: ObjectId) -> bool {
        self.unconvertible.contains(&id)
    }

    /// Total bytes in the stream since creation or the last [`clear`].
    ///
    /// [`clear`]: ObjectRegistry::clear
    pub fn bytecount(&self) -> u64 {
        self.stream.bytecount()
    }

    /// Snapshot of the accumulated stream.
    pub fn as_bytes(&self) -> &[u8] {
        self.stream.as_bytes()
    }

    /// Hand off the accumulated stream, leaving the buffer empty.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.stream.take()
    }

    /// Truncate the byte stream back to empty.
    ///
    /// This is format-only: the object-ID counter and the unconvertible
    /// side-set are deliberately left intact, so IDs allocated after a clear
    /// continue from where they left off. Use [`reset`] for a genuinely
    /// fresh session.
    ///
    /// [`reset`]: ObjectRegistry::reset
    pub fn clear(&mut self) {
        self.stream.clear();
    }

    /// Clear the stream, the ID counter and the side-set.
    pub fn reset(&mut self) {
        self.stream.clear();
        self.next_object_id = 0;
        self.unconvertible.clear();
    }

    fn write_primitive(&mut self, value: &Primitive) {
        match value {
            Primitive::None => {
                self.stream.write_byte(Tag::None.code());
            }
            Primitive::Int(i) => {
                self.stream.write_byte(Tag::Int.code());
                self.stream.write_i64(*i);
            }
            Primitive::Long(digits) => {
                self.stream.write_byte(Tag::Long.code());
                self.stream.write_string(digits.as_bytes());
            }
            Primitive::Float(f) => {
                self.stream.write_byte(Tag::Float.code());
                self.stream.write_f64(*f);
            }
            Primitive::Bool(b) => {
                self.stream.write_byte(Tag::Bool.code());
                self.stream.write_byte(u8::from(*b));
            }
            Primitive::Str(s) => {
                self.stream.write_byte(Tag::Str.code());
                self.stream.write_string(s.as_bytes());
            }
            Primitive::List(elements) => {
                self.stream.write_byte(Tag::ListOfPrimitives.code());
                self.stream.write_i64(elements.len() as i64);
                for element in elements {
                    self.write_primitive(element);
                }
            }
        }
    }

    fn write_dtype(&mut self, dtype: &DtypeTerm) {
        match dtype {
            DtypeTerm::None => {
                self.stream.write_byte(Tag::None.code());
            }
            DtypeTerm::Int(i) => {
                self.stream.write_byte(Tag::Int.code());
                self.stream.write_i64(*i);
            }
            DtypeTerm::Str(s) => {
                self.stream.write_byte(Tag::Str.code());
                self.stream.write_string(s.as_bytes());
            }
            DtypeTerm::Tuple(terms) => {
                self.stream.write_byte(Tag::Tuple.code());
                self.stream.write_i32(terms.len() as i32);
                for term in terms {
                    self.write_dtype(term);
                }
            }
        }
    }

    fn write_id_array(&mut self, ids: &[ObjectId]) {
        self.stream.write_i64(ids.len() as i64);
        for id in ids {
            self.stream.write_i64(id.as_i64());
        }
    }

    /// Name-keyed ID table: int32 count, then (string, int64) pairs in
    /// BTreeMap order (sorted by name, so the encoding is deterministic).
    fn write_name_table(&mut self, table: &BTreeMap<String, ObjectId>) {
        self.stream.write_i32(table.len() as i32);
        for (name, id) in table {
            self.stream.write_string(name.as_bytes());
            self.stream.write_i64(id.as_i64());
        }
    }

    fn record_header(&mut self, id: ObjectId, tag: Tag) {
        self.stream.write_i64(id.as_i64());
        self.stream.write_byte(tag.code());
        debug!(id = %id, tag = ?tag, "define record");
    }
}

impl RecordSink for ObjectRegistry {
    fn define_primitive(&mut self, id: ObjectId, value: &Primitive) -> RegistryResult<()> {
        self.stream.write_i64(id.as_i64());
        debug!(id = %id, kind = value.kind_name(), "define primitive");
        self.write_primitive(value);
        Ok(())
    }

    fn define_tuple(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()> {
        self.record_header(id, Tag::Tuple);
        self.write_id_array(member_ids);
        Ok(())
    }

    fn define_list(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()> {
        self.record_header(id, Tag::List);
        self.write_id_array(member_ids);
        Ok(())
    }

    fn define_file(&mut self, id: ObjectId, text: &str, path: &str) -> RegistryResult<()> {
        self.record_header(id, Tag::File);
        self.stream.write_string(path.as_bytes());
        self.stream.write_string(text.as_bytes());
        Ok(())
    }

    fn define_dict(
        &mut self,
        id: ObjectId,
        key_ids: &[ObjectId],
        value_ids: &[ObjectId],
    ) -> RegistryResult<()> {
        if key_ids.len() != value_ids.len() {
            return Err(RegistryError::DictLengthMismatch {
                keys: key_ids.len(),
                values: value_ids.len(),
            });
        }
        self.record_header(id, Tag::Dict);
        self.write_id_array(key_ids);
        self.write_id_array(value_ids);
        Ok(())
    }

    fn define_builtin_exception_instance(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::BuiltinExceptionInstance);
        self.stream.write_string(type_name.as_bytes());
        self.stream.write_i64(args_id.as_i64());
        Ok(())
    }

    fn define_named_singleton(&mut self, id: ObjectId, name: &str) -> RegistryResult<()> {
        self.record_header(id, Tag::NamedSingleton);
        self.stream.write_string(name.as_bytes());
        Ok(())
    }

    fn define_instance_method(
        &mut self,
        id: ObjectId,
        instance_id: ObjectId,
        method_name: &str,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::InstanceMethod);
        self.stream.write_i64(instance_id.as_i64());
        self.stream.write_string(method_name.as_bytes());
        Ok(())
    }

    fn define_abort_exception(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::AbortException);
        self.stream.write_string(type_name.as_bytes());
        self.stream.write_i64(args_id.as_i64());
        Ok(())
    }

    fn define_unconvertible(
        &mut self,
        id: ObjectId,
        module_path: Option<&str>,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::Unconvertible);
        match module_path {
            Some(path) => {
                self.stream.write_byte(1);
                self.stream.write_string(path.as_bytes());
            }
            None => {
                self.stream.write_byte(0);
            }
        }
        self.unconvertible.insert(id);
        Ok(())
    }

    fn define_class_instance(
        &mut self,
        id: ObjectId,
        class_id: ObjectId,
        members: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::ClassInstance);
        self.stream.write_i64(class_id.as_i64());
        self.write_name_table(members);
        Ok(())
    }

    fn define_function(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::Function);
        self.stream.write_i64(source_file_id.as_i64());
        self.stream.write_i32(line_number);
        self.write_name_table(resolutions);
        Ok(())
    }

    fn define_class(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
        base_ids: &[ObjectId],
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::Class);
        self.stream.write_i64(source_file_id.as_i64());
        self.stream.write_i32(line_number);
        self.write_name_table(resolutions);
        self.write_id_array(base_ids);
        Ok(())
    }

    fn define_with_block(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::WithBlock);
        self.stream.write_i64(source_file_id.as_i64());
        self.stream.write_i32(line_number);
        self.write_name_table(resolutions);
        Ok(())
    }

    fn define_packed_homogeneous_data(
        &mut self,
        id: ObjectId,
        dtype: &DtypeTerm,
        data: &[u8],
    ) -> RegistryResult<()> {
        self.record_header(id, Tag::PackedHomogeneousData);
        self.write_dtype(dtype);
        self.stream.write_string(data);
        Ok(())
    }

    fn define_end_of_stream(&mut self) -> RegistryResult<()> {
        self.stream.write_i64(END_OF_STREAM);
        debug!("end of stream");
        Ok(())
    }
}
