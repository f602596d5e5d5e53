//! The record-sink surface: everything a record stream can be replayed into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::id::ObjectId;
use crate::value::{DtypeTerm, Primitive};

/// Receiver of "define" records, one call per record.
///
/// [`ObjectRegistry`](crate::ObjectRegistry) implements this trait as its
/// encoding surface, so a decoded stream replayed into a fresh registry
/// re-encodes byte-identically. Materializers on the decoding side implement
/// it to build live objects; [`RecordLog`] implements it to collect records
/// as plain data.
///
/// Member maps are `BTreeMap` so that name-keyed payloads serialize in a
/// deterministic (name-sorted) order.
pub trait RecordSink {
    /// One primitive value: none, int, long, float, bool, string, or a list
    /// of primitives.
    fn define_primitive(&mut self, id: ObjectId, value: &Primitive) -> RegistryResult<()>;

    /// A fixed-length heterogeneous container referencing members by ID.
    fn define_tuple(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()>;

    /// A mutable sequence referencing members by ID.
    fn define_list(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()>;

    /// One source file: its path and full text.
    fn define_file(&mut self, id: ObjectId, text: &str, path: &str) -> RegistryResult<()>;

    /// A mapping; keys and values pair positionally.
    fn define_dict(
        &mut self,
        id: ObjectId,
        key_ids: &[ObjectId],
        value_ids: &[ObjectId],
    ) -> RegistryResult<()>;

    /// An instance of a builtin exception type, by singleton name, with its
    /// args object by ID.
    fn define_builtin_exception_instance(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()>;

    /// A well-known singleton object, by name.
    fn define_named_singleton(&mut self, id: ObjectId, name: &str) -> RegistryResult<()>;

    /// A method bound to an instance.
    fn define_instance_method(
        &mut self,
        id: ObjectId,
        instance_id: ObjectId,
        method_name: &str,
    ) -> RegistryResult<()>;

    /// A computation-abort exception with its args object by ID.
    fn define_abort_exception(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()>;

    /// An object representable only as an opaque placeholder, optionally
    /// with a module-level path that locates it on the receiving side.
    fn define_unconvertible(
        &mut self,
        id: ObjectId,
        module_path: Option<&str>,
    ) -> RegistryResult<()>;

    /// A class instance: its class by ID plus its data members by name.
    fn define_class_instance(
        &mut self,
        id: ObjectId,
        class_id: ObjectId,
        members: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()>;

    /// A function: source location plus its free-variable resolution table.
    fn define_function(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()>;

    /// A class: source location, free-variable resolution table and base
    /// classes in declaration order.
    fn define_class(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
        base_ids: &[ObjectId],
    ) -> RegistryResult<()>;

    /// A with-block: source location plus its free-variable resolution table.
    fn define_with_block(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()>;

    /// Bulk homogeneous data: a type descriptor plus a raw byte blob.
    fn define_packed_homogeneous_data(
        &mut self,
        id: ObjectId,
        dtype: &DtypeTerm,
        data: &[u8],
    ) -> RegistryResult<()>;

    /// The stream terminator. Must be the last record.
    fn define_end_of_stream(&mut self) -> RegistryResult<()>;
}

/// One decoded wire record as plain data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecodedRecord {
    Primitive {
        id: ObjectId,
        value: Primitive,
    },
    Tuple {
        id: ObjectId,
        members: Vec<ObjectId>,
    },
    List {
        id: ObjectId,
        members: Vec<ObjectId>,
    },
    File {
        id: ObjectId,
        path: String,
        text: String,
    },
    Dict {
        id: ObjectId,
        keys: Vec<ObjectId>,
        values: Vec<ObjectId>,
    },
    BuiltinException {
        id: ObjectId,
        type_name: String,
        args_id: ObjectId,
    },
    NamedSingleton {
        id: ObjectId,
        name: String,
    },
    InstanceMethod {
        id: ObjectId,
        instance_id: ObjectId,
        method_name: String,
    },
    AbortException {
        id: ObjectId,
        type_name: String,
        args_id: ObjectId,
    },
    Unconvertible {
        id: ObjectId,
        module_path: Option<String>,
    },
    ClassInstance {
        id: ObjectId,
        class_id: ObjectId,
        members: BTreeMap<String, ObjectId>,
    },
    Function {
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: BTreeMap<String, ObjectId>,
    },
    Class {
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: BTreeMap<String, ObjectId>,
        bases: Vec<ObjectId>,
    },
    WithBlock {
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: BTreeMap<String, ObjectId>,
    },
    PackedData {
        id: ObjectId,
        dtype: DtypeTerm,
        data: Vec<u8>,
    },
    EndOfStream,
}

impl DecodedRecord {
    /// The object ID this record defines, if any.
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            DecodedRecord::Primitive { id, .. }
            | DecodedRecord::Tuple { id, .. }
            | DecodedRecord::List { id, .. }
            | DecodedRecord::File { id, .. }
            | DecodedRecord::Dict { id, .. }
            | DecodedRecord::BuiltinException { id, .. }
            | DecodedRecord::NamedSingleton { id, .. }
            | DecodedRecord::InstanceMethod { id, .. }
            | DecodedRecord::AbortException { id, .. }
            | DecodedRecord::Unconvertible { id, .. }
            | DecodedRecord::ClassInstance { id, .. }
            | DecodedRecord::Function { id, .. }
            | DecodedRecord::Class { id, .. }
            | DecodedRecord::WithBlock { id, .. }
            | DecodedRecord::PackedData { id, .. } => Some(*id),
            DecodedRecord::EndOfStream => None,
        }
    }
}

/// A [`RecordSink`] that collects decoded records in stream order.
#[derive(Clone, Debug, Default)]
pub struct RecordLog {
    records: Vec<DecodedRecord>,
}

impl RecordLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[DecodedRecord] {
        &self.records
    }

    /// The record that defines `id`, if present.
    pub fn record_for(&self, id: ObjectId) -> Option<&DecodedRecord> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    /// Number of records, including the terminator if seen.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records have been collected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSink for RecordLog {
    fn define_primitive(&mut self, id: ObjectId, value: &Primitive) -> RegistryResult<()> {
        self.records.push(DecodedRecord::Primitive {
            id,
            value: value.clone(),
        });
        Ok(())
    }

    fn define_tuple(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()> {
        self.records.push(DecodedRecord::Tuple {
            id,
            members: member_ids.to_vec(),
        });
        Ok(())
    }

    fn define_list(&mut self, id: ObjectId, member_ids: &[ObjectId]) -> RegistryResult<()> {
        self.records.push(DecodedRecord::List {
            id,
            members: member_ids.to_vec(),
        });
        Ok(())
    }

    fn define_file(&mut self, id: ObjectId, text: &str, path: &str) -> RegistryResult<()> {
        self.records.push(DecodedRecord::File {
            id,
            path: path.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn define_dict(
        &mut self,
        id: ObjectId,
        key_ids: &[ObjectId],
        value_ids: &[ObjectId],
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::Dict {
            id,
            keys: key_ids.to_vec(),
            values: value_ids.to_vec(),
        });
        Ok(())
    }

    fn define_builtin_exception_instance(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::BuiltinException {
            id,
            type_name: type_name.to_string(),
            args_id,
        });
        Ok(())
    }

    fn define_named_singleton(&mut self, id: ObjectId, name: &str) -> RegistryResult<()> {
        self.records.push(DecodedRecord::NamedSingleton {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    fn define_instance_method(
        &mut self,
        id: ObjectId,
        instance_id: ObjectId,
        method_name: &str,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::InstanceMethod {
            id,
            instance_id,
            method_name: method_name.to_string(),
        });
        Ok(())
    }

    fn define_abort_exception(
        &mut self,
        id: ObjectId,
        type_name: &str,
        args_id: ObjectId,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::AbortException {
            id,
            type_name: type_name.to_string(),
            args_id,
        });
        Ok(())
    }

    fn define_unconvertible(
        &mut self,
        id: ObjectId,
        module_path: Option<&str>,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::Unconvertible {
            id,
            module_path: module_path.map(str::to_string),
        });
        Ok(())
    }

    fn define_class_instance(
        &mut self,
        id: ObjectId,
        class_id: ObjectId,
        members: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::ClassInstance {
            id,
            class_id,
            members: members.clone(),
        });
        Ok(())
    }

    fn define_function(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::Function {
            id,
            source_file_id,
            line_number,
            resolutions: resolutions.clone(),
        });
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
        self.records.push(DecodedRecord::Class {
            id,
            source_file_id,
            line_number,
            resolutions: resolutions.clone(),
            bases: base_ids.to_vec(),
        });
        Ok(())
    }

    fn define_with_block(
        &mut self,
        id: ObjectId,
        source_file_id: ObjectId,
        line_number: i32,
        resolutions: &BTreeMap<String, ObjectId>,
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::WithBlock {
            id,
            source_file_id,
            line_number,
            resolutions: resolutions.clone(),
        });
        Ok(())
    }

    fn define_packed_homogeneous_data(
        &mut self,
        id: ObjectId,
        dtype: &DtypeTerm,
        data: &[u8],
    ) -> RegistryResult<()> {
        self.records.push(DecodedRecord::PackedData {
            id,
            dtype: dtype.clone(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn define_end_of_stream(&mut self) -> RegistryResult<()> {
        self.records.push(DecodedRecord::EndOfStream);
        Ok(())
    }
}
