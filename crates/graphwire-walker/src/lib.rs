//! Cycle-safe object-graph traversal for the graphwire serializer.
//!
//! [`GraphWalker`] traverses a live object graph exactly once per distinct
//! object and drives a `graphwire-registry` [`ObjectRegistry`] to emit one
//! record per object. The walker sees host objects only through the
//! [`ObjectInspector`] collaborator, which classifies them into the closed
//! [`Kind`] enumeration and supplies code metadata for functions and
//! classes.
//!
//! # Invariants
//!
//! - Each distinct object (by native identity, after pure replacement) is
//!   assigned exactly one ID and emits exactly one record.
//! - An object's ID is assigned and cached *before* its children are
//!   walked, so reference cycles terminate.
//! - Source files deduplicate by filename, separately from object identity.
//!
//! [`ObjectRegistry`]: graphwire_registry::ObjectRegistry

pub mod error;
pub mod inspect;
pub mod walker;

pub use error::{InspectError, InspectResult, WalkError, WalkResult};
pub use inspect::{AccessChain, CodeDescriptor, Kind, NativeId, ObjectInspector};
pub use walker::GraphWalker;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use graphwire_registry::{
        deserialize_from_stream, DecodedRecord, DtypeTerm, ObjectId, ObjectRegistry, Primitive,
        RecordLog,
    };
    use graphwire_stream::StreamReader;

    use super::*;

    struct Code {
        path: String,
        text: String,
        line: i32,
        /// Free-variable chain (dotted form) and the object it resolves to.
        chains: Vec<(String, Obj)>,
    }

    enum Node {
        Prim(Primitive),
        Tuple(Vec<Obj>),
        List(RefCell<Vec<Obj>>),
        Dict(Vec<(Obj, Obj)>),
        Function(Code),
        SourcelessFunction,
        Class { code: Code, bases: Vec<Obj> },
        WithBlock(Code),
        Instance { class: Obj, members: Vec<(String, Obj)> },
        Method { instance: Obj, name: String },
        Singleton(String),
        Exception { name: String, args: Obj },
        Future(Obj),
        Packed { dtype: DtypeTerm, data: Vec<u8> },
        Opaque { module_path: Option<String> },
        Mystery,
    }

    /// Cheaply clonable handle to a test object; identity is the Rc address.
    #[derive(Clone)]
    struct Obj(Rc<Node>);

    impl Obj {
        fn new(node: Node) -> Self {
            Obj(Rc::new(node))
        }

        fn int(i: i64) -> Self {
            Self::new(Node::Prim(Primitive::Int(i)))
        }

        fn string(s: &str) -> Self {
            Self::new(Node::Prim(Primitive::Str(s.to_string())))
        }

        fn tuple(members: Vec<Obj>) -> Self {
            Self::new(Node::Tuple(members))
        }

        fn list(members: Vec<Obj>) -> Self {
            Self::new(Node::List(RefCell::new(members)))
        }

        fn function(path: &str, line: i32, chains: Vec<(&str, Obj)>) -> Self {
            Self::new(Node::Function(Code {
                path: path.to_string(),
                text: format!("# source of {path}\n"),
                line,
                chains: chains
                    .into_iter()
                    .map(|(chain, target)| (chain.to_string(), target))
                    .collect(),
            }))
        }

        fn class(path: &str, line: i32, chains: Vec<(&str, Obj)>, bases: Vec<Obj>) -> Self {
            Self::new(Node::Class {
                code: Code {
                    path: path.to_string(),
                    text: format!("# source of {path}\n"),
                    line,
                    chains: chains
                        .into_iter()
                        .map(|(chain, target)| (chain.to_string(), target))
                        .collect(),
                },
                bases,
            })
        }

        fn native(&self) -> NativeId {
            NativeId::new(Rc::as_ptr(&self.0) as usize as u64)
        }
    }

    #[derive(Default)]
    struct TestInspector {
        /// Pairs of (impure object, pure replacement).
        mappings: Vec<(Obj, Obj)>,
    }

    impl TestInspector {
        fn with_mapping(impure: &Obj, pure: &Obj) -> Self {
            Self {
                mappings: vec![(impure.clone(), pure.clone())],
            }
        }

        fn code_of<'a>(context: &'a Obj) -> InspectResult<&'a Code> {
            match &*context.0 {
                Node::Function(code)
                | Node::Class { code, .. }
                | Node::WithBlock(code) => Ok(code),
                _ => Err(InspectError::failed("not a code object")),
            }
        }
    }

    impl ObjectInspector for TestInspector {
        type Obj = Obj;

        fn native_id(&self, object: &Obj) -> NativeId {
            object.native()
        }

        fn classify(&self, object: &Obj) -> InspectResult<Kind<Obj>> {
            Ok(match &*object.0 {
                Node::Prim(value) => Kind::Primitive(value.clone()),
                Node::Tuple(members) => Kind::Tuple(members.clone()),
                Node::List(members) => Kind::List(members.borrow().clone()),
                Node::Dict(pairs) => Kind::Dict(pairs.clone()),
                Node::Function(_) | Node::SourcelessFunction => Kind::Function,
                Node::Class { bases, .. } => Kind::Class {
                    bases: bases.clone(),
                },
                Node::WithBlock(_) => Kind::WithBlock,
                Node::Instance { class, .. } => Kind::ClassInstance {
                    class: class.clone(),
                },
                Node::Method { instance, name } => Kind::InstanceMethod {
                    instance: instance.clone(),
                    name: name.clone(),
                },
                Node::Singleton(name) => Kind::NamedSingleton(name.clone()),
                Node::Exception { name, args } => Kind::BuiltinException {
                    name: name.clone(),
                    args: args.clone(),
                },
                Node::Future(inner) => Kind::Future(inner.clone()),
                Node::Packed { dtype, data } => Kind::PackedData {
                    dtype: dtype.clone(),
                    data: data.clone(),
                },
                Node::Opaque { module_path } => Kind::Unconvertible(module_path.clone()),
                Node::Mystery => Kind::Unsupported("<mystery object>".to_string()),
            })
        }

        fn can_map(&self, object: &Obj) -> bool {
            self.mappings
                .iter()
                .any(|(impure, _)| impure.native() == object.native())
        }

        fn map_to_pure(&self, object: &Obj) -> InspectResult<Obj> {
            self.mappings
                .iter()
                .find(|(impure, _)| impure.native() == object.native())
                .map(|(_, pure)| pure.clone())
                .ok_or_else(|| InspectError::failed("no pure mapping registered"))
        }

        fn code_descriptor(&self, object: &Obj) -> InspectResult<CodeDescriptor> {
            if matches!(&*object.0, Node::SourcelessFunction) {
                return Err(InspectError::SourceUnavailable {
                    repr: "<sourceless function>".to_string(),
                });
            }
            let code = Self::code_of(object)?;
            Ok(CodeDescriptor {
                path: code.path.clone(),
                text: code.text.clone(),
                line: code.line,
                chains: code
                    .chains
                    .iter()
                    .map(|(chain, _)| AccessChain::new(chain.clone()))
                    .collect(),
            })
        }

        fn resolve_chain(&self, chain: &AccessChain, context: &Obj) -> InspectResult<Obj> {
            let code = Self::code_of(context)?;
            code.chains
                .iter()
                .find(|(dotted, _)| dotted == chain.as_str())
                .map(|(_, target)| target.clone())
                .ok_or_else(|| InspectError::failed(format!("unresolved chain {chain}")))
        }

        fn data_member_names(&self, object: &Obj) -> InspectResult<Vec<String>> {
            match &*object.0 {
                Node::Instance { members, .. } => {
                    Ok(members.iter().map(|(name, _)| name.clone()).collect())
                }
                _ => Err(InspectError::failed("not a class instance")),
            }
        }

        fn attribute(&self, object: &Obj, name: &str) -> InspectResult<Obj> {
            match &*object.0 {
                Node::Instance { members, .. } => members
                    .iter()
                    .find(|(member, _)| member == name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| InspectError::failed(format!("no attribute {name}"))),
                _ => Err(InspectError::failed("not a class instance")),
            }
        }

        fn module_path(&self, object: &Obj) -> Option<String> {
            match &*object.0 {
                Node::Opaque { module_path } => module_path.clone(),
                _ => None,
            }
        }
    }

    /// Walk the roots, terminate the stream and decode everything back
    /// into a record log.
    fn walk_and_decode_with(
        inspector: TestInspector,
        roots: &[Obj],
    ) -> (Vec<ObjectId>, RecordLog) {
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(inspector, &mut registry);
        let ids = roots
            .iter()
            .map(|root| walker.walk(root).unwrap())
            .collect();
        walker.finish().unwrap();

        let mut reader = StreamReader::new(registry.take_bytes());
        let mut log = RecordLog::new();
        deserialize_from_stream(&mut reader, &mut log).unwrap();
        (ids, log)
    }

    fn walk_and_decode(roots: &[Obj]) -> (Vec<ObjectId>, RecordLog) {
        walk_and_decode_with(TestInspector::default(), roots)
    }

    /// Records that define objects (everything but the terminator).
    fn defining_records(log: &RecordLog) -> Vec<&DecodedRecord> {
        log.records()
            .iter()
            .filter(|r| r.id().is_some())
            .collect()
    }

    #[test]
    fn walking_an_integer_yields_one_record() {
        let (ids, log) = walk_and_decode(&[Obj::int(42)]);
        assert_eq!(ids, vec![ObjectId::new(0)]);
        assert_eq!(
            log.records(),
            &[
                DecodedRecord::Primitive {
                    id: ObjectId::new(0),
                    value: Primitive::Int(42)
                },
                DecodedRecord::EndOfStream,
            ]
        );
    }

    #[test]
    fn walking_a_tuple_yields_member_records_then_the_tuple() {
        let root = Obj::tuple(vec![Obj::int(42), Obj::string("x")]);
        let (ids, log) = walk_and_decode(&[root]);

        // The tuple's ID is assigned before its children are walked.
        assert_eq!(ids, vec![ObjectId::new(0)]);
        assert_eq!(
            log.records(),
            &[
                DecodedRecord::Primitive {
                    id: ObjectId::new(1),
                    value: Primitive::Int(42)
                },
                DecodedRecord::Primitive {
                    id: ObjectId::new(2),
                    value: Primitive::Str("x".into())
                },
                DecodedRecord::Tuple {
                    id: ObjectId::new(0),
                    members: vec![ObjectId::new(1), ObjectId::new(2)]
                },
                DecodedRecord::EndOfStream,
            ]
        );
    }

    #[test]
    fn walking_a_dict_yields_key_value_then_dict_records() {
        let root = Obj::new(Node::Dict(vec![(Obj::string("a"), Obj::int(1))]));
        let (ids, log) = walk_and_decode(&[root]);
        assert_eq!(ids, vec![ObjectId::new(0)]);
        assert_eq!(
            log.records(),
            &[
                DecodedRecord::Primitive {
                    id: ObjectId::new(1),
                    value: Primitive::Str("a".into())
                },
                DecodedRecord::Primitive {
                    id: ObjectId::new(2),
                    value: Primitive::Int(1)
                },
                DecodedRecord::Dict {
                    id: ObjectId::new(0),
                    keys: vec![ObjectId::new(1)],
                    values: vec![ObjectId::new(2)]
                },
                DecodedRecord::EndOfStream,
            ]
        );
    }

    #[test]
    fn repeated_walks_return_cached_id_and_add_no_record() {
        let object = Obj::int(5);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let first = walker.walk(&object).unwrap();
        let bytes_after_first = walker.registry().bytecount();
        let second = walker.walk(&object).unwrap();
        assert_eq!(first, second);
        assert_eq!(walker.registry().bytecount(), bytes_after_first);
    }

    #[test]
    fn shared_subobject_serializes_once() {
        let shared = Obj::string("shared");
        let left = Obj::tuple(vec![shared.clone()]);
        let right = Obj::tuple(vec![shared.clone()]);
        let (ids, log) = walk_and_decode(&[left, right]);

        let records = defining_records(&log);
        // left tuple, shared string, right tuple: three distinct objects.
        assert_eq!(records.len(), 3);

        let shared_id = ObjectId::new(1);
        for &root in &ids {
            match log.record_for(root) {
                Some(DecodedRecord::Tuple { members, .. }) => {
                    assert_eq!(members, &vec![shared_id]);
                }
                other => panic!("expected tuple record, got {other:?}"),
            }
        }
    }

    #[test]
    fn self_referential_list_terminates_and_references_itself() {
        let list = Obj::list(vec![]);
        if let Node::List(members) = &*list.0 {
            members.borrow_mut().push(list.clone());
        }
        let (ids, log) = walk_and_decode(&[list]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::List {
                id: ids[0],
                members: vec![ids[0]]
            })
        );
    }

    #[test]
    fn mutually_referential_containers_terminate() {
        let a = Obj::list(vec![]);
        let b = Obj::list(vec![a.clone()]);
        if let Node::List(members) = &*a.0 {
            members.borrow_mut().push(b.clone());
        }
        let (ids, log) = walk_and_decode(&[a]);
        assert_eq!(defining_records(&log).len(), 2);
        // a references b and b references a.
        let a_id = ids[0];
        let b_id = match log.record_for(a_id) {
            Some(DecodedRecord::List { members, .. }) => members[0],
            other => panic!("expected list record, got {other:?}"),
        };
        assert_eq!(
            log.record_for(b_id),
            Some(&DecodedRecord::List {
                id: b_id,
                members: vec![a_id]
            })
        );
    }

    #[test]
    fn list_cycle_through_nested_lists_terminates() {
        let inner = Obj::list(vec![]);
        if let Node::List(members) = &*inner.0 {
            members.borrow_mut().push(inner.clone());
        }
        let outer = Obj::list(vec![Obj::int(1), inner]);
        let (ids, log) = walk_and_decode(&[outer]);

        assert_eq!(defining_records(&log).len(), 3);
        let inner_id = match log.record_for(ids[0]) {
            Some(DecodedRecord::List { members, .. }) => members[1],
            other => panic!("expected list record, got {other:?}"),
        };
        assert_eq!(
            log.record_for(inner_id),
            Some(&DecodedRecord::List {
                id: inner_id,
                members: vec![inner_id]
            })
        );
    }

    #[test]
    fn list_of_primitives_collapses_to_one_record() {
        let root = Obj::list(vec![Obj::int(1), Obj::int(2), Obj::string("three")]);
        let (ids, log) = walk_and_decode(&[root]);
        assert_eq!(
            log.records(),
            &[
                DecodedRecord::Primitive {
                    id: ids[0],
                    value: Primitive::List(vec![
                        Primitive::Int(1),
                        Primitive::Int(2),
                        Primitive::Str("three".into()),
                    ])
                },
                DecodedRecord::EndOfStream,
            ]
        );
    }

    #[test]
    fn nested_all_primitive_lists_also_collapse() {
        let root = Obj::list(vec![Obj::list(vec![Obj::int(1), Obj::int(2)]), Obj::int(3)]);
        let (ids, log) = walk_and_decode(&[root]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::Primitive {
                id: ids[0],
                value: Primitive::List(vec![
                    Primitive::List(vec![Primitive::Int(1), Primitive::Int(2)]),
                    Primitive::Int(3),
                ])
            })
        );
        assert_eq!(defining_records(&log).len(), 1);
    }

    #[test]
    fn list_with_one_non_primitive_emits_member_records() {
        let root = Obj::list(vec![Obj::int(1), Obj::tuple(vec![Obj::int(2)])]);
        let (ids, log) = walk_and_decode(&[root]);
        // list + int member + tuple + tuple's int: four records.
        assert_eq!(defining_records(&log).len(), 4);
        match log.record_for(ids[0]) {
            Some(DecodedRecord::List { members, .. }) => assert_eq!(members.len(), 2),
            other => panic!("expected list record, got {other:?}"),
        }
    }

    #[test]
    fn list_containing_already_walked_primitive_references_it() {
        let value = Obj::int(9);
        let list = Obj::list(vec![value.clone()]);
        let (ids, log) = walk_and_decode(&[value, list]);

        // The shared element keeps its single record; the list falls back
        // to member references instead of inlining a duplicate.
        assert_eq!(defining_records(&log).len(), 2);
        assert_eq!(
            log.record_for(ids[1]),
            Some(&DecodedRecord::List {
                id: ids[1],
                members: vec![ids[0]]
            })
        );
    }

    #[test]
    fn future_registers_resolved_value_under_its_own_id() {
        let future = Obj::new(Node::Future(Obj::int(9)));
        let (ids, log) = walk_and_decode(&[future]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::Primitive {
                id: ids[0],
                value: Primitive::Int(9)
            })
        );
        assert_eq!(defining_records(&log).len(), 1);
    }

    #[test]
    fn future_result_also_reachable_directly_defines_once() {
        let value = Obj::int(77);
        let future = Obj::new(Node::Future(value.clone()));
        let root = Obj::tuple(vec![future, value.clone()]);
        let (ids, log) = walk_and_decode(&[root]);

        // tuple + the shared value: two records, both tuple slots aliased.
        assert_eq!(defining_records(&log).len(), 2);
        let shared_id = match log.record_for(ids[0]) {
            Some(DecodedRecord::Tuple { members, .. }) => {
                assert_eq!(members[0], members[1]);
                members[0]
            }
            other => panic!("expected tuple record, got {other:?}"),
        };
        assert_eq!(
            log.record_for(shared_id),
            Some(&DecodedRecord::Primitive {
                id: shared_id,
                value: Primitive::Int(77)
            })
        );
    }

    #[test]
    fn future_walked_after_its_value_reuses_the_id() {
        let value = Obj::int(5);
        let future = Obj::new(Node::Future(value.clone()));
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let direct = walker.walk(&value).unwrap();
        let bytes_after_value = walker.registry().bytecount();
        let via_future = walker.walk(&future).unwrap();
        assert_eq!(direct, via_future);
        assert_eq!(walker.registry().bytecount(), bytes_after_value);
    }

    #[test]
    fn named_singleton_is_terminal() {
        let root = Obj::new(Node::Singleton("len".to_string()));
        let (ids, log) = walk_and_decode(&[root]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::NamedSingleton {
                id: ids[0],
                name: "len".into()
            })
        );
    }

    #[test]
    fn builtin_exception_walks_its_args() {
        let args = Obj::tuple(vec![Obj::string("bad value")]);
        let root = Obj::new(Node::Exception {
            name: "ValueError".to_string(),
            args,
        });
        let (ids, log) = walk_and_decode(&[root]);
        let args_id = match log.record_for(ids[0]) {
            Some(DecodedRecord::BuiltinException {
                type_name, args_id, ..
            }) => {
                assert_eq!(type_name, "ValueError");
                *args_id
            }
            other => panic!("expected exception record, got {other:?}"),
        };
        assert!(matches!(
            log.record_for(args_id),
            Some(DecodedRecord::Tuple { .. })
        ));
    }

    #[test]
    fn instance_method_walks_bound_instance() {
        let class = Obj::class("/src/thing.py", 3, vec![], vec![]);
        let instance = Obj::new(Node::Instance {
            class,
            members: vec![("x".to_string(), Obj::int(1))],
        });
        let method = Obj::new(Node::Method {
            instance: instance.clone(),
            name: "frob".to_string(),
        });
        let (ids, log) = walk_and_decode(&[method]);
        let instance_id = match log.record_for(ids[0]) {
            Some(DecodedRecord::InstanceMethod {
                instance_id,
                method_name,
                ..
            }) => {
                assert_eq!(method_name, "frob");
                *instance_id
            }
            other => panic!("expected instance method record, got {other:?}"),
        };
        assert!(matches!(
            log.record_for(instance_id),
            Some(DecodedRecord::ClassInstance { .. })
        ));
    }

    #[test]
    fn class_instance_registers_class_and_members() {
        let class = Obj::class("/src/point.py", 1, vec![], vec![]);
        let instance = Obj::new(Node::Instance {
            class,
            members: vec![
                ("y".to_string(), Obj::int(2)),
                ("x".to_string(), Obj::int(1)),
            ],
        });
        let (ids, log) = walk_and_decode(&[instance]);
        match log.record_for(ids[0]) {
            Some(DecodedRecord::ClassInstance {
                class_id, members, ..
            }) => {
                assert!(matches!(
                    log.record_for(*class_id),
                    Some(DecodedRecord::Class { .. })
                ));
                // Members come back name-sorted.
                let names: Vec<&String> = members.keys().collect();
                assert_eq!(names, vec!["x", "y"]);
            }
            other => panic!("expected class instance record, got {other:?}"),
        }
    }

    #[test]
    fn function_record_carries_file_line_and_resolutions() {
        let helper = Obj::int(7);
        let function = Obj::function("/src/lib.py", 12, vec![("helpers.seed", helper)]);
        let (ids, log) = walk_and_decode(&[function]);
        match log.record_for(ids[0]) {
            Some(DecodedRecord::Function {
                source_file_id,
                line_number,
                resolutions,
                ..
            }) => {
                assert_eq!(*line_number, 12);
                assert_eq!(resolutions.len(), 1);
                let target = resolutions["helpers.seed"];
                assert!(matches!(
                    log.record_for(target),
                    Some(DecodedRecord::Primitive { .. })
                ));
                match log.record_for(*source_file_id) {
                    Some(DecodedRecord::File { path, .. }) => {
                        assert_eq!(path, "/src/lib.py");
                    }
                    other => panic!("expected file record, got {other:?}"),
                }
            }
            other => panic!("expected function record, got {other:?}"),
        }
    }

    #[test]
    fn functions_in_the_same_file_share_one_file_record() {
        let f = Obj::function("/src/shared.py", 1, vec![]);
        let g = Obj::function("/src/shared.py", 20, vec![]);
        let (ids, log) = walk_and_decode(&[f, g]);

        let file_ids: Vec<ObjectId> = ids
            .iter()
            .map(|id| match log.record_for(*id) {
                Some(DecodedRecord::Function { source_file_id, .. }) => *source_file_id,
                other => panic!("expected function record, got {other:?}"),
            })
            .collect();
        assert_eq!(file_ids[0], file_ids[1]);

        let file_records = log
            .records()
            .iter()
            .filter(|r| matches!(r, DecodedRecord::File { .. }))
            .count();
        assert_eq!(file_records, 1);
    }

    #[test]
    fn class_base_is_registered_via_chain_resolution() {
        let base = Obj::class("/src/base.py", 1, vec![], vec![]);
        let derived = Obj::class(
            "/src/derived.py",
            5,
            vec![("Base", base.clone())],
            vec![base.clone()],
        );
        let (ids, log) = walk_and_decode(&[derived]);
        match log.record_for(ids[0]) {
            Some(DecodedRecord::Class {
                bases, resolutions, ..
            }) => {
                assert_eq!(bases.len(), 1);
                assert_eq!(resolutions["Base"], bases[0]);
                assert!(matches!(
                    log.record_for(bases[0]),
                    Some(DecodedRecord::Class { .. })
                ));
            }
            other => panic!("expected class record, got {other:?}"),
        }
    }

    #[test]
    fn class_with_unregistered_base_is_a_precondition_failure() {
        let base = Obj::class("/src/base.py", 1, vec![], vec![]);
        // The base appears in the bases list but in no chain, so nothing
        // registers it before define_class needs its ID.
        let derived = Obj::class("/src/derived.py", 5, vec![], vec![base]);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let err = walker.walk(&derived).unwrap_err();
        assert!(matches!(err, WalkError::UnregisteredBase(_)));
    }

    #[test]
    fn with_block_registers_like_a_code_object() {
        let bound = Obj::int(3);
        let block = Obj::new(Node::WithBlock(Code {
            path: "/src/session.py".to_string(),
            text: "# with block source\n".to_string(),
            line: 44,
            chains: vec![("limit".to_string(), bound)],
        }));
        let (ids, log) = walk_and_decode(&[block]);
        match log.record_for(ids[0]) {
            Some(DecodedRecord::WithBlock {
                line_number,
                resolutions,
                ..
            }) => {
                assert_eq!(*line_number, 44);
                assert!(resolutions.contains_key("limit"));
            }
            other => panic!("expected with-block record, got {other:?}"),
        }
    }

    #[test]
    fn sourceless_function_degrades_to_unconvertible() {
        let function = Obj::new(Node::SourcelessFunction);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let id = walker.walk(&function).unwrap();
        assert!(walker.registry().is_unconvertible(id));
    }

    #[test]
    fn instance_of_unconvertible_class_is_unconvertible() {
        let class = Obj::new(Node::Opaque {
            module_path: Some("ext.native".to_string()),
        });
        let instance = Obj::new(Node::Instance {
            class,
            members: vec![("x".to_string(), Obj::int(1))],
        });
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let id = walker.walk(&instance).unwrap();
        assert!(walker.registry().is_unconvertible(id));
    }

    #[test]
    fn unconvertible_marking_is_exact() {
        let opaque = Obj::new(Node::Opaque { module_path: None });
        let plain = Obj::int(1);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let opaque_id = walker.walk(&opaque).unwrap();
        let plain_id = walker.walk(&plain).unwrap();
        assert!(registry.is_unconvertible(opaque_id));
        assert!(!registry.is_unconvertible(plain_id));
    }

    #[test]
    fn unsupported_object_fails_the_walk() {
        let mystery = Obj::new(Node::Mystery);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(TestInspector::default(), &mut registry);
        let err = walker.walk(&mystery).unwrap_err();
        assert_eq!(
            err,
            WalkError::Classification {
                repr: "<mystery object>".to_string()
            }
        );
    }

    #[test]
    fn mapped_object_is_replaced_by_its_pure_form() {
        let impure = Obj::new(Node::Mystery);
        let pure = Obj::int(11);
        let inspector = TestInspector::with_mapping(&impure, &pure);
        let (ids, log) = walk_and_decode_with(inspector, &[impure]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::Primitive {
                id: ids[0],
                value: Primitive::Int(11)
            })
        );
    }

    #[test]
    fn mapped_object_and_its_replacement_share_one_id() {
        let impure = Obj::new(Node::Mystery);
        let pure = Obj::int(11);
        let inspector = TestInspector::with_mapping(&impure, &pure);
        let mut registry = ObjectRegistry::new();
        let mut walker = GraphWalker::new(inspector, &mut registry);
        let via_impure = walker.walk(&impure).unwrap();
        let via_pure = walker.walk(&pure).unwrap();
        let via_impure_again = walker.walk(&impure).unwrap();
        assert_eq!(via_impure, via_pure);
        assert_eq!(via_impure, via_impure_again);
    }

    #[test]
    fn packed_data_is_terminal() {
        let packed = Obj::new(Node::Packed {
            dtype: DtypeTerm::Str("<f8".to_string()),
            data: vec![0; 16],
        });
        let (ids, log) = walk_and_decode(&[packed]);
        assert_eq!(
            log.record_for(ids[0]),
            Some(&DecodedRecord::PackedData {
                id: ids[0],
                dtype: DtypeTerm::Str("<f8".into()),
                data: vec![0; 16]
            })
        );
    }

    #[test]
    fn record_count_equals_distinct_objects_walked() {
        let shared = Obj::int(1);
        let inner = Obj::tuple(vec![shared.clone(), shared.clone()]);
        let root = Obj::tuple(vec![inner.clone(), inner.clone(), shared.clone()]);
        let (_, log) = walk_and_decode(&[root]);
        // root, inner, shared: three distinct objects.
        assert_eq!(defining_records(&log).len(), 3);
    }
}
