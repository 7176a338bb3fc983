use pretty_assertions::assert_eq;
use strata_classfile::RawClass;
use strata_graph::{AccessKind, Graph, Linker, MemberId, TargetKind};
use strata_test_utils::{ClassFileBuilder, FieldSpec, Insn, MethodSpec, ACC_PUBLIC, ACC_STATIC};

fn link(classes: Vec<Vec<u8>>) -> Graph {
    let raws = classes
        .iter()
        .map(|bytes| RawClass::parse(bytes).unwrap())
        .collect();
    Linker::new().link(raws).unwrap()
}

fn owner_name(graph: &Graph, member: Option<MemberId>) -> Option<String> {
    member.map(|id| graph.type_node(graph.member(id).owner).name.clone())
}

fn caller(name: &str, code: Vec<Insn>) -> Vec<u8> {
    ClassFileBuilder::class(name)
        .method(MethodSpec::new("call", "()V").code(code))
        .build()
}

fn diamond_classes() -> Vec<Vec<u8>> {
    vec![
        ClassFileBuilder::interface("com.example.A")
            .method(MethodSpec::new("m", "()V"))
            .build(),
        ClassFileBuilder::interface("com.example.B")
            .method(MethodSpec::new("m", "()V"))
            .build(),
        ClassFileBuilder::interface("com.example.C")
            .implements("com.example.A")
            .implements("com.example.B")
            .build(),
        ClassFileBuilder::class("com.example.Impl")
            .implements("com.example.C")
            .method(MethodSpec::new("m", "()V"))
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::Line(5),
                Insn::invoke_interface("com.example.C", "m", "()V"),
                Insn::Return,
            ],
        ),
    ]
}

#[test]
fn field_read_and_write_resolve_to_one_member() {
    let graph = link(vec![ClassFileBuilder::class("com.example.Holder")
        .field(FieldSpec::new("value", "Ljava/lang/String;"))
        .method(MethodSpec::new("get", "()Ljava/lang/String;").code(vec![
            Insn::Line(8),
            Insn::get_field("com.example.Holder", "value", "Ljava/lang/String;"),
            Insn::Return,
        ]))
        .method(MethodSpec::new("set", "(Ljava/lang/String;)V").code(vec![
            Insn::Line(12),
            Insn::put_field("com.example.Holder", "value", "Ljava/lang/String;"),
            Insn::Return,
        ]))
        .build()]);

    let holder = graph.get("com.example.Holder").unwrap().id;
    let accesses: Vec<_> = graph.field_accesses_from_type(holder).collect();
    assert_eq!(accesses.len(), 2);
    assert_eq!(
        accesses
            .iter()
            .map(|access| (access.kind, access.line))
            .collect::<Vec<_>>(),
        vec![(AccessKind::FieldRead, 8), (AccessKind::FieldWrite, 12)]
    );
    assert_eq!(accesses[0].target, accesses[1].target);

    let field = graph.field(holder, "value").unwrap().id;
    assert_eq!(graph.resolved_target(accesses[0].id), Some(field));
    assert_eq!(graph.resolved_target(accesses[1].id), Some(field));
    assert_eq!(
        graph.accesses_to_member(field),
        &[accesses[0].id, accesses[1].id]
    );
    assert_eq!(graph.accesses_to_type(holder).len(), 2);

    let target = graph.target(accesses[0].target);
    assert_eq!(target.kind, TargetKind::Field);
    assert_eq!(target.full_name, "com.example.Holder.value");
    assert_eq!(target.description(), "field <com.example.Holder.value>");
}

#[test]
fn diamond_resolution_picks_first_interface_in_declaration_order() {
    for _ in 0..5 {
        let graph = link(diamond_classes());
        let client = graph.get("com.example.Client").unwrap().id;
        let call = graph.method_calls_from_type(client).next().unwrap();
        assert_eq!(
            owner_name(&graph, graph.resolved_target(call.id)).as_deref(),
            Some("com.example.A")
        );
    }
}

#[test]
fn more_specific_interface_declaration_wins() {
    let graph = link(vec![
        ClassFileBuilder::interface("com.example.Top")
            .method(MethodSpec::new("n", "()V"))
            .build(),
        ClassFileBuilder::interface("com.example.Refined")
            .implements("com.example.Top")
            .method(MethodSpec::new("n", "()V"))
            .build(),
        ClassFileBuilder::interface("com.example.Both")
            .implements("com.example.Top")
            .implements("com.example.Refined")
            .build(),
        caller(
            "com.example.Client",
            vec![Insn::invoke_interface("com.example.Both", "n", "()V")],
        ),
    ]);

    let target = graph.targets().next().unwrap();
    assert_eq!(
        owner_name(&graph, graph.resolve(target.id)).as_deref(),
        Some("com.example.Refined")
    );
}

#[test]
fn interface_owners_search_super_interfaces_before_object() {
    let graph = link(vec![
        ClassFileBuilder::class("java.lang.Object")
            .no_super()
            .method(MethodSpec::new("equals", "(Ljava/lang/Object;)Z"))
            .build(),
        ClassFileBuilder::interface("com.example.Cmp")
            .method(MethodSpec::new("equals", "(Ljava/lang/Object;)Z"))
            .build(),
        ClassFileBuilder::interface("com.example.MyCmp")
            .implements("com.example.Cmp")
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::invoke_interface("com.example.MyCmp", "equals", "(Ljava/lang/Object;)Z"),
                Insn::invoke_interface("com.example.MyCmp", "hashCode", "()I"),
            ],
        ),
    ]);

    let client = graph.get("com.example.Client").unwrap().id;
    let calls: Vec<_> = graph.method_calls_from_type(client).collect();
    assert_eq!(
        owner_name(&graph, graph.resolved_target(calls[0].id)).as_deref(),
        Some("com.example.Cmp")
    );
    assert_eq!(graph.resolved_target(calls[1].id), None);
}

#[test]
fn methods_resolve_through_the_superclass_chain() {
    let graph = link(vec![
        ClassFileBuilder::class("com.example.Base")
            .method(MethodSpec::new("run", "(I)V"))
            .method(MethodSpec::new("run", "(J)V"))
            .build(),
        ClassFileBuilder::class("com.example.Mid")
            .extends("com.example.Base")
            .build(),
        ClassFileBuilder::class("com.example.Leaf")
            .extends("com.example.Mid")
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::invoke_virtual("com.example.Leaf", "run", "(J)V"),
                Insn::invoke_virtual("com.example.Leaf", "missing", "()V"),
            ],
        ),
    ]);

    let client = graph.get("com.example.Client").unwrap().id;
    let calls: Vec<_> = graph.method_calls_from_type(client).collect();

    let run = graph.resolved_target(calls[0].id).unwrap();
    assert_eq!(graph.member(run).descriptor, "(J)V");
    assert_eq!(owner_name(&graph, Some(run)).as_deref(), Some("com.example.Base"));
    assert_eq!(graph.resolved_target(calls[1].id), None);

    let base = graph.get("com.example.Base").unwrap().id;
    assert_eq!(graph.accesses_to_type(base), &[calls[0].id]);
}

#[test]
fn exact_descriptor_beats_bridge_method() {
    let graph = link(vec![
        ClassFileBuilder::class("com.example.Box")
            .method(MethodSpec::new("get", "()Ljava/lang/Object;"))
            .method(MethodSpec::new("get", "()Ljava/lang/String;"))
            .build(),
        caller(
            "com.example.Client",
            vec![Insn::invoke_virtual("com.example.Box", "get", "()Ljava/lang/String;")],
        ),
    ]);

    let target = graph.targets().next().unwrap();
    let resolved = graph.resolve(target.id).unwrap();
    assert_eq!(graph.member(resolved).descriptor, "()Ljava/lang/String;");
}

#[test]
fn fields_resolve_through_superclasses_but_not_interfaces() {
    let graph = link(vec![
        ClassFileBuilder::interface("com.example.Constants")
            .field(FieldSpec::new("LIMIT", "I").access_flags(ACC_PUBLIC | ACC_STATIC))
            .build(),
        ClassFileBuilder::interface("com.example.MoreConstants")
            .implements("com.example.Constants")
            .build(),
        ClassFileBuilder::class("com.example.Parent")
            .field(FieldSpec::new("count", "I"))
            .build(),
        ClassFileBuilder::class("com.example.Child")
            .extends("com.example.Parent")
            .implements("com.example.Constants")
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::get_field("com.example.Child", "count", "I"),
                Insn::get_static("com.example.Child", "LIMIT", "I"),
                Insn::get_static("com.example.MoreConstants", "LIMIT", "I"),
            ],
        ),
    ]);

    let client = graph.get("com.example.Client").unwrap().id;
    let reads: Vec<_> = graph.field_accesses_from_type(client).collect();
    assert_eq!(
        reads
            .iter()
            .map(|access| owner_name(&graph, graph.resolved_target(access.id)))
            .collect::<Vec<_>>(),
        vec![
            Some("com.example.Parent".to_string()),
            None,
            Some("com.example.Constants".to_string()),
        ]
    );
}

#[test]
fn constructor_calls_resolve_on_the_declared_owner() {
    let graph = link(vec![
        ClassFileBuilder::class("com.example.Widget")
            .method(MethodSpec::constructor("()V"))
            .method(MethodSpec::constructor("(I)V"))
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::New("com.example.Widget".to_string()),
                Insn::construct("com.example.Widget", "(I)V"),
            ],
        ),
    ]);

    let client = graph.get("com.example.Client").unwrap().id;
    let call = graph.constructor_calls_from_type(client).next().unwrap();
    let target = graph.target(call.target);
    assert_eq!(target.kind, TargetKind::Constructor);
    assert_eq!(target.full_name, "com.example.Widget.<init>(int)");
    assert_eq!(
        target.description(),
        "constructor <com.example.Widget.<init>(int)>"
    );

    let resolved = graph.resolve(target.id).unwrap();
    assert_eq!(graph.member(resolved).descriptor, "(I)V");
}

#[test]
fn constructors_are_not_inherited() {
    let graph = link(vec![
        ClassFileBuilder::class("com.example.Base")
            .method(MethodSpec::constructor("(I)V"))
            .build(),
        ClassFileBuilder::class("com.example.Sub")
            .extends("com.example.Base")
            .method(MethodSpec::constructor("()V"))
            .build(),
        caller(
            "com.example.Client",
            vec![
                Insn::construct("com.example.Sub", "(I)V"),
                Insn::construct("com.example.Sub", "()V"),
            ],
        ),
    ]);

    let client = graph.get("com.example.Client").unwrap().id;
    let calls: Vec<_> = graph.constructor_calls_from_type(client).collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(graph.resolved_target(calls[0].id), None);

    let sub = graph.resolved_target(calls[1].id).unwrap();
    assert_eq!(graph.member(sub).descriptor, "()V");
    assert_eq!(owner_name(&graph, Some(sub)).as_deref(), Some("com.example.Sub"));
}

#[test]
fn members_of_missing_types_resolve_to_absent() {
    let graph = link(vec![caller(
        "com.example.Client",
        vec![Insn::invoke_static(
            "com.external.Util",
            "format",
            "(Ljava/lang/String;I)Ljava/lang/String;",
        )],
    )]);

    let util = graph.get("com.external.Util").unwrap();
    assert!(!util.fully_imported);
    assert!(util.members.is_empty());

    let target = graph.targets().next().unwrap();
    assert_eq!(graph.resolve(target.id), None);
    assert_eq!(target.owner, util.id);
    assert_eq!(target.name, "format");
    assert_eq!(target.descriptor, "(Ljava/lang/String;I)Ljava/lang/String;");
    assert_eq!(
        target.full_name,
        "com.external.Util.format(java.lang.String, int)"
    );
    assert_eq!(graph.type_node(target.return_type).name, "java.lang.String");
}

#[test]
fn resolution_is_memoized_and_consistent_across_threads() {
    let graph = link(diamond_classes());
    let target_ids: Vec<_> = graph.targets().map(|target| target.id).collect();

    let results: Vec<Vec<Option<MemberId>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    target_ids
                        .iter()
                        .map(|id| graph.resolve(*id))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let expected: Vec<_> = target_ids.iter().map(|id| graph.resolve(*id)).collect();
    assert!(results.iter().all(|result| result == &expected));
    assert_eq!(
        owner_name(&graph, expected[0]).as_deref(),
        Some("com.example.A")
    );
}

#[test]
fn repeated_accesses_share_one_target() {
    let graph = link(vec![caller(
        "com.example.Client",
        vec![
            Insn::Line(4),
            Insn::invoke_static("com.example.Util", "tick", "()V"),
            Insn::Line(2),
            Insn::invoke_static("com.example.Util", "tick", "()V"),
        ],
    )]);

    let client = graph.get("com.example.Client").unwrap().id;
    let calls: Vec<_> = graph.method_calls_from_type(client).collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].target, calls[1].target);
    assert_eq!(
        calls.iter().map(|call| call.line).collect::<Vec<_>>(),
        vec![4, 2]
    );
    assert_eq!(graph.targets().count(), 1);
}
