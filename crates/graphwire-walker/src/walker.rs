//! The graph walker: cycle-safe traversal of a live object graph, emitting
//! one registry record per distinct object.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use graphwire_registry::{ObjectId, ObjectRegistry, Primitive, RecordSink};

use crate::error::{InspectError, WalkError, WalkResult};
use crate::inspect::{Kind, NativeId, ObjectInspector};

/// Resolved code metadata ready for a function/class/with-block record.
struct CodeDefinition {
    source_file_id: ObjectId,
    line_number: i32,
    resolutions: BTreeMap<String, ObjectId>,
}

/// Walks a live object graph exactly once per distinct object and drives an
/// [`ObjectRegistry`] to emit one "define" record per object reachable from
/// the roots.
///
/// The walker owns three caches for the session:
///
/// - native identity → assigned object ID (the dedup/cycle short-circuit)
/// - native identity → pure replacement object (the "converted" cache)
/// - filename → file record ID (files dedup by name, not identity)
///
/// It borrows the registry it writes into; the registry must outlive the
/// walk. One walker serves one serialization session; after a failed walk
/// the registry's partial output is invalid and must be discarded.
pub struct GraphWalker<'r, I: ObjectInspector> {
    inspector: I,
    registry: &'r mut ObjectRegistry,
    object_ids: HashMap<NativeId, ObjectId>,
    converted: HashMap<NativeId, I::Obj>,
    file_ids: HashMap<String, ObjectId>,
}

impl<'r, I: ObjectInspector> GraphWalker<'r, I> {
    /// Create a walker writing into `registry`.
    pub fn new(inspector: I, registry: &'r mut ObjectRegistry) -> Self {
        Self {
            inspector,
            registry,
            object_ids: HashMap::new(),
            converted: HashMap::new(),
            file_ids: HashMap::new(),
        }
    }

    /// Read access to the registry being written.
    pub fn registry(&self) -> &ObjectRegistry {
        self.registry
    }

    /// Recursively traverse `object`, registering every distinct reachable
    /// object, and return the root's assigned ID.
    ///
    /// Repeated calls on an already-walked object return the cached ID and
    /// append nothing.
    pub fn walk(&mut self, object: &I::Obj) -> WalkResult<ObjectId> {
        let native = self.inspector.native_id(object);
        if let Some(&id) = self.object_ids.get(&native) {
            return Ok(id);
        }

        // The converted cache is consulted before anything else so that a
        // mappable object is only ever mapped once per session.
        let subject = if let Some(replacement) = self.converted.get(&native) {
            replacement.clone()
        } else if self.inspector.can_map(object) {
            let pure = self.inspector.map_to_pure(object)?;
            self.converted.insert(native, pure.clone());
            pure
        } else {
            object.clone()
        };

        let subject_native = self.inspector.native_id(&subject);
        if let Some(&id) = self.object_ids.get(&subject_native) {
            // The replacement was already walked via some other route.
            self.object_ids.insert(native, id);
            return Ok(id);
        }

        let kind = self.inspector.classify(&subject)?;

        // A future gets no ID of its own: its resolved value is walked in
        // its place and the future's identity aliases the value's ID, so a
        // value reachable both through a future and directly is still
        // defined exactly once.
        if let Kind::Future(inner) = kind {
            let id = self.walk(&inner)?;
            self.object_ids.insert(subject_native, id);
            if subject_native != native {
                self.object_ids.insert(native, id);
            }
            return Ok(id);
        }

        // Assign the ID and mark the object seen *before* recursing into
        // children. Cyclic graphs terminate because any back-edge hits the
        // cache entry made here.
        let id = self.registry.allocate_object();
        self.object_ids.insert(subject_native, id);
        if subject_native != native {
            self.object_ids.insert(native, id);
        }
        debug!(id = %id, native = %subject_native, "walk object");

        self.register(&subject, id, kind)?;
        Ok(id)
    }

    /// Append the end-of-stream terminator record.
    pub fn finish(&mut self) -> WalkResult<()> {
        self.registry.define_end_of_stream()?;
        Ok(())
    }

    fn register(&mut self, subject: &I::Obj, id: ObjectId, kind: Kind<I::Obj>) -> WalkResult<()> {
        match kind {
            Kind::PackedData { dtype, data } => {
                self.registry
                    .define_packed_homogeneous_data(id, &dtype, &data)?;
            }
            Kind::Future(inner) => {
                // Normally unwrapped in `walk` before ID allocation; a
                // future arriving here is registered as its resolved value
                // under the same ID.
                let inner_kind = self.inspector.classify(&inner)?;
                self.register(&inner, id, inner_kind)?;
            }
            Kind::BuiltinException { name, args } => {
                let args_id = self.walk(&args)?;
                self.registry
                    .define_builtin_exception_instance(id, &name, args_id)?;
            }
            Kind::NamedSingleton(name) => {
                self.registry.define_named_singleton(id, &name)?;
            }
            Kind::WithBlock => match self.code_definition(subject)? {
                Some(def) => {
                    self.registry.define_with_block(
                        id,
                        def.source_file_id,
                        def.line_number,
                        &def.resolutions,
                    )?;
                }
                None => self.define_unconvertible(subject, id)?,
            },
            Kind::Tuple(members) => {
                let member_ids = self.walk_all(&members)?;
                self.registry.define_tuple(id, &member_ids)?;
            }
            Kind::List(members) => {
                // A list of nothing but primitives collapses into a single
                // primitive-list record instead of N member records.
                if let Some(values) = self.as_primitives(&members)? {
                    self.registry.define_primitive(id, &Primitive::List(values))?;
                } else {
                    let member_ids = self.walk_all(&members)?;
                    self.registry.define_list(id, &member_ids)?;
                }
            }
            Kind::Dict(pairs) => {
                let mut key_ids = Vec::with_capacity(pairs.len());
                let mut value_ids = Vec::with_capacity(pairs.len());
                for (key, value) in &pairs {
                    key_ids.push(self.walk(key)?);
                    value_ids.push(self.walk(value)?);
                }
                self.registry.define_dict(id, &key_ids, &value_ids)?;
            }
            Kind::Primitive(value) => {
                self.registry.define_primitive(id, &value)?;
            }
            Kind::Function => match self.code_definition(subject)? {
                Some(def) => {
                    self.registry.define_function(
                        id,
                        def.source_file_id,
                        def.line_number,
                        &def.resolutions,
                    )?;
                }
                None => self.define_unconvertible(subject, id)?,
            },
            Kind::Class { bases } => match self.code_definition(subject)? {
                Some(def) => {
                    // Bases are normally registered while walking the
                    // class's free-variable resolutions above; an
                    // unregistered base means the walker was driven wrong.
                    let mut base_ids = Vec::with_capacity(bases.len());
                    for base in &bases {
                        let base_native = self.inspector.native_id(base);
                        let base_id = self
                            .object_ids
                            .get(&base_native)
                            .copied()
                            .ok_or(WalkError::UnregisteredBase(base_native))?;
                        base_ids.push(base_id);
                    }
                    self.registry.define_class(
                        id,
                        def.source_file_id,
                        def.line_number,
                        &def.resolutions,
                        &base_ids,
                    )?;
                }
                None => self.define_unconvertible(subject, id)?,
            },
            Kind::InstanceMethod { instance, name } => {
                let instance_id = self.walk(&instance)?;
                self.registry.define_instance_method(id, instance_id, &name)?;
            }
            Kind::ClassInstance { class } => {
                let class_id = self.walk(&class)?;
                if self.registry.is_unconvertible(class_id) {
                    // An instance of an unconvertible class is itself
                    // unconvertible.
                    self.define_unconvertible(subject, id)?;
                } else {
                    let names = self.inspector.data_member_names(subject)?;
                    let mut members = BTreeMap::new();
                    for name in names {
                        let value = self.inspector.attribute(subject, &name)?;
                        let member_id = self.walk(&value)?;
                        members.insert(name, member_id);
                    }
                    self.registry.define_class_instance(id, class_id, &members)?;
                }
            }
            Kind::Unconvertible(module_path) => {
                self.registry
                    .define_unconvertible(id, module_path.as_deref())?;
            }
            Kind::Unsupported(repr) => {
                return Err(WalkError::Classification { repr });
            }
        }
        Ok(())
    }

    fn walk_all(&mut self, objects: &[I::Obj]) -> WalkResult<Vec<ObjectId>> {
        objects.iter().map(|object| self.walk(object)).collect()
    }

    /// If every element is a primitive (recursively, for nested lists),
    /// return their values; otherwise `None`.
    ///
    /// An element already in the ID cache counts as non-primitive: it either
    /// has a record of its own to reference, or it is a back-edge into the
    /// list being collapsed. Likewise a nested list seen twice during the
    /// scan. Both cases must go through `define_list`.
    fn as_primitives(&mut self, members: &[I::Obj]) -> WalkResult<Option<Vec<Primitive>>> {
        let mut seen = HashSet::new();
        self.collect_primitives(members, &mut seen)
    }

    fn collect_primitives(
        &mut self,
        members: &[I::Obj],
        seen: &mut HashSet<NativeId>,
    ) -> WalkResult<Option<Vec<Primitive>>> {
        let mut values = Vec::with_capacity(members.len());
        for member in members {
            let member_native = self.inspector.native_id(member);
            if self.object_ids.contains_key(&member_native) {
                return Ok(None);
            }
            match self.inspector.classify(member)? {
                Kind::Primitive(value) => values.push(value),
                Kind::List(inner) => {
                    if !seen.insert(member_native) {
                        return Ok(None);
                    }
                    match self.collect_primitives(&inner, seen)? {
                        Some(nested) => values.push(Primitive::List(nested)),
                        None => return Ok(None),
                    }
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    /// Resolve code metadata for a function/class/with-block: walk every
    /// free-variable resolution and register the source file.
    ///
    /// Returns `None` when the inspector cannot produce source text, in
    /// which case the caller records the object as unconvertible.
    fn code_definition(&mut self, subject: &I::Obj) -> WalkResult<Option<CodeDefinition>> {
        let descriptor = match self.inspector.code_descriptor(subject) {
            Ok(descriptor) => descriptor,
            Err(InspectError::SourceUnavailable { repr }) => {
                warn!(%repr, "source unavailable, registering as unconvertible");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let mut resolutions = BTreeMap::new();
        for chain in &descriptor.chains {
            let mut target = self.inspector.resolve_chain(chain, subject)?;
            // A resolution that was previously mapped to a pure replacement
            // must resolve to that replacement here too.
            let target_native = self.inspector.native_id(&target);
            if let Some(replacement) = self.converted.get(&target_native) {
                target = replacement.clone();
            }
            let target_id = self.walk(&target)?;
            resolutions.insert(chain.as_str().to_string(), target_id);
        }

        let source_file_id = self.file_id(&descriptor.path, &descriptor.text)?;
        Ok(Some(CodeDefinition {
            source_file_id,
            line_number: descriptor.line,
            resolutions,
        }))
    }

    /// Register a source file once per distinct filename.
    fn file_id(&mut self, path: &str, text: &str) -> WalkResult<ObjectId> {
        if let Some(&id) = self.file_ids.get(path) {
            return Ok(id);
        }
        let id = self.registry.allocate_object();
        self.registry.define_file(id, text, path)?;
        self.file_ids.insert(path.to_string(), id);
        debug!(id = %id, path, "registered source file");
        Ok(id)
    }

    fn define_unconvertible(&mut self, subject: &I::Obj, id: ObjectId) -> WalkResult<()> {
        let module_path = self.inspector.module_path(subject);
        self.registry
            .define_unconvertible(id, module_path.as_deref())?;
        Ok(())
    }
}
