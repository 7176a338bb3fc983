use pretty_assertions::assert_eq;
use strata_classfile::{
    ClassFile, ClassKind, CodeUnitKind, ConstValue, ElementValue, Error, Modifier, RawClass,
    ReferenceKind, Section,
};
use strata_test_utils::{
    class_literal, AnnotationSpec, ClassFileBuilder, FieldSpec, Insn, MethodSpec, ValueSpec,
    ACC_ABSTRACT, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC, ACC_SYNCHRONIZED,
};

#[test]
fn reads_class_header_and_hierarchy_names() {
    let bytes = ClassFileBuilder::class("com.example.Sub")
        .extends("com.example.Base")
        .implements("com.example.First")
        .implements("java.io.Serializable")
        .source_file("Sub.java")
        .signature("Lcom/example/Base;Lcom/example/First;")
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    assert_eq!(raw.name, "com.example.Sub");
    assert_eq!(raw.simple_name, "Sub");
    assert_eq!(raw.package_name(), "com.example");
    assert_eq!(raw.kind, ClassKind::Class);
    assert_eq!(raw.super_class.as_deref(), Some("com.example.Base"));
    assert_eq!(
        raw.interfaces,
        vec!["com.example.First".to_string(), "java.io.Serializable".to_string()]
    );
    assert_eq!(raw.source_file.as_deref(), Some("Sub.java"));
    assert_eq!(
        raw.signature.as_deref(),
        Some("Lcom/example/Base;Lcom/example/First;")
    );
    assert_eq!(raw.modifiers.iter().collect::<Vec<_>>(), vec![Modifier::Public]);
    assert_eq!(raw.enclosing_class, None);
}

#[test]
fn kind_precedence_prefers_annotation_then_interface() {
    let annotation = RawClass::parse(&ClassFileBuilder::annotation_type("com.example.Marker").build())
        .unwrap();
    assert_eq!(annotation.kind, ClassKind::Annotation);
    assert!(annotation.kind.is_interface());

    let interface = RawClass::parse(&ClassFileBuilder::interface("com.example.Api").build()).unwrap();
    assert_eq!(interface.kind, ClassKind::Interface);

    let enumeration = RawClass::parse(&ClassFileBuilder::enum_type("com.example.Color").build())
        .unwrap();
    assert_eq!(enumeration.kind, ClassKind::Enum);
    assert_eq!(enumeration.super_class.as_deref(), Some("java.lang.Enum"));
}

#[test]
fn nested_class_takes_modifiers_and_enclosing_class_from_inner_classes_entry() {
    let bytes = ClassFileBuilder::class("com.example.Outer$Inner")
        .inner_class(
            "com.example.Outer$Inner",
            Some("com.example.Outer"),
            Some("Inner"),
            ACC_PRIVATE | ACC_STATIC,
        )
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    assert_eq!(raw.simple_name, "Inner");
    assert_eq!(raw.enclosing_class.as_deref(), Some("com.example.Outer"));
    assert_eq!(
        raw.modifiers.iter().collect::<Vec<_>>(),
        vec![Modifier::Private, Modifier::Static]
    );
}

#[test]
fn anonymous_class_uses_enclosing_method() {
    let bytes = ClassFileBuilder::class("com.example.Outer$1")
        .inner_class("com.example.Outer$1", None, None, 0)
        .enclosing_method("com.example.Outer", Some(("run", "()V")))
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    assert_eq!(raw.simple_name, "");
    assert_eq!(raw.enclosing_class.as_deref(), Some("com.example.Outer"));

    let class = ClassFile::parse(&bytes).unwrap();
    let enclosing = class.enclosing_method.unwrap();
    assert_eq!(
        enclosing.method,
        Some(("run".to_string(), "()V".to_string()))
    );
}

#[test]
fn records_references_with_lines_in_bytecode_order() {
    let bytes = ClassFileBuilder::class("com.example.Client")
        .field(FieldSpec::new("count", "I"))
        .method(MethodSpec::new("read", "()I").code(vec![
            Insn::Line(8),
            Insn::get_field("com.example.Client", "count", "I"),
            Insn::TableSwitch { low: 0, high: 2 },
            Insn::Line(9),
            Insn::invoke_interface("java.util.List", "size", "()I"),
            Insn::invoke_virtual("[Ljava/lang/String;", "clone", "()Ljava/lang/Object;"),
            Insn::Return,
        ]))
        .method(
            MethodSpec::new("write", "(I)V")
                .access_flags(ACC_PUBLIC | ACC_SYNCHRONIZED)
                .code(vec![
                    Insn::Line(12),
                    Insn::New("com.example.Other".to_string()),
                    Insn::construct("com.example.Other", "()V"),
                    Insn::put_static("com.example.Client", "count", "I"),
                    Insn::Return,
                ]),
        )
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    let methods: Vec<_> = raw.methods().collect();
    assert_eq!(methods.len(), 2);

    let read = &methods[0].references;
    assert_eq!(
        read.iter()
            .map(|r| (r.kind, r.owner.as_str(), r.name.as_str(), r.line))
            .collect::<Vec<_>>(),
        vec![
            (ReferenceKind::GetField, "com.example.Client", "count", 8),
            (ReferenceKind::InvokeInterface, "java.util.List", "size", 9),
            (ReferenceKind::InvokeVirtual, "java.lang.String[]", "clone", 9),
        ]
    );
    assert!(read[1].owner_is_interface);
    assert!(!read[2].owner_is_interface);

    let write = &methods[1];
    assert!(write.modifiers.contains(Modifier::Synchronized));
    assert!(write.references[0].is_constructor_call());
    assert_eq!(write.references[0].line, 12);
    assert!(write.references[1].kind.is_write());
}

#[test]
fn code_without_line_table_reports_line_zero() {
    let bytes = ClassFileBuilder::class("com.example.NoDebug")
        .method(
            MethodSpec::new("run", "()V")
                .code(vec![Insn::invoke_static("com.example.Util", "help", "()V")]),
        )
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    let unit = raw.methods().next().unwrap();
    assert_eq!(unit.references[0].line, 0);
}

#[test]
fn splits_code_units_by_kind() {
    let bytes = ClassFileBuilder::class("com.example.Units")
        .method(MethodSpec::constructor("(Ljava/lang/String;)V"))
        .method(MethodSpec::static_initializer())
        .method(
            MethodSpec::new("load", "(Ljava/lang/String;[I)Ljava/lang/Object;")
                .access_flags(ACC_PUBLIC | ACC_ABSTRACT)
                .throws("java.io.IOException"),
        )
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    assert_eq!(
        raw.code_units.iter().map(|u| u.kind).collect::<Vec<_>>(),
        vec![
            CodeUnitKind::Constructor,
            CodeUnitKind::StaticInitializer,
            CodeUnitKind::Method
        ]
    );
    assert_eq!(raw.constructors().count(), 1);
    assert!(raw.static_initializer().is_some());

    let load = raw.methods().next().unwrap();
    assert_eq!(load.throws, vec!["java.io.IOException".to_string()]);
    assert_eq!(load.method_descriptor.params.len(), 2);
    assert_eq!(
        load.method_descriptor.return_type.java_name(),
        "java.lang.Object"
    );
}

#[test]
fn reads_annotation_values() {
    let bytes = ClassFileBuilder::class("com.example.Annotated")
        .annotation(
            AnnotationSpec::new("com.example.Config")
                .value("name", ValueSpec::String("main".to_string()))
                .value("retries", ValueSpec::Int(3))
                .value("ratio", ValueSpec::Double(0.5))
                .value(
                    "mode",
                    ValueSpec::Enum {
                        type_name: "com.example.Mode".to_string(),
                        const_name: "FAST".to_string(),
                    },
                )
                .value(
                    "types",
                    ValueSpec::Array(vec![class_literal("com.example.Helper"), class_literal("int[]")]),
                )
                .value(
                    "nested",
                    ValueSpec::Annotation(AnnotationSpec::new("com.example.Inner")),
                ),
        )
        .invisible_annotation(AnnotationSpec::new("com.example.Hidden"))
        .field(FieldSpec::new("id", "J").annotation(AnnotationSpec::new("com.example.Key")))
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    assert_eq!(raw.annotations.len(), 2);
    let config = &raw.annotations[0];
    assert_eq!(config.type_name, "com.example.Config");
    assert_eq!(
        config.value("name"),
        Some(&ElementValue::Const(ConstValue::String("main".to_string())))
    );
    assert_eq!(
        config.value("retries"),
        Some(&ElementValue::Const(ConstValue::Int(3)))
    );
    assert_eq!(
        config.value("ratio"),
        Some(&ElementValue::Const(ConstValue::Double(0.5)))
    );
    assert_eq!(
        config.value("types"),
        Some(&ElementValue::Array(vec![
            ElementValue::Class("com.example.Helper".to_string()),
            ElementValue::Class("int[]".to_string()),
        ]))
    );
    assert_eq!(
        config.referenced_type_names(),
        vec![
            "com.example.Config",
            "com.example.Mode",
            "com.example.Helper",
            "int[]",
            "com.example.Inner",
        ]
    );
    assert_eq!(raw.annotations[1].type_name, "com.example.Hidden");
    assert_eq!(raw.fields[0].annotations[0].type_name, "com.example.Key");
}

#[test]
fn char_values_keep_lone_surrogates() {
    let bytes = ClassFileBuilder::class("com.example.Chars")
        .annotation(
            AnnotationSpec::new("com.example.Sep")
                .value("high", ValueSpec::Char(0xD800))
                .value("plain", ValueSpec::Char(u16::from(b'x'))),
        )
        .build();

    let raw = RawClass::parse(&bytes).unwrap();
    let sep = &raw.annotations[0];
    assert_eq!(
        sep.value("high"),
        Some(&ElementValue::Const(ConstValue::Char(0xD800)))
    );
    assert_eq!(
        sep.value("plain"),
        Some(&ElementValue::Const(ConstValue::Char(0x78)))
    );
}

#[test]
fn unknown_attributes_are_skipped() {
    let bytes = ClassFileBuilder::class("com.example.Extra")
        .attribute("com.vendor.Custom", vec![1, 2, 3, 4, 5])
        .build();
    assert_eq!(RawClass::parse(&bytes).unwrap().name, "com.example.Extra");
}

#[test]
fn bad_magic_is_reported_in_header() {
    let mut bytes = ClassFileBuilder::class("com.example.Foo").build();
    bytes[0] = 0x00;

    let err = ClassFile::parse(&bytes).unwrap_err();
    assert_eq!(err.section(), Some(Section::Header));
    assert_eq!(err.offset(), Some(0));
    assert!(matches!(err.root(), Error::InvalidMagic(_)));
}

#[test]
fn truncated_input_reports_offset() {
    let bytes = ClassFileBuilder::class("com.example.Foo").build();
    let truncated = &bytes[..bytes.len() - 1];

    let err = ClassFile::parse(truncated).unwrap_err();
    assert_eq!(err.section(), Some(Section::ClassAttributes));
    assert!(matches!(err.root(), Error::UnexpectedEof { .. }));
    assert!(err.offset().unwrap() < bytes.len());
}

#[test]
fn invalid_member_descriptor_names_the_member() {
    let bytes = ClassFileBuilder::class("com.example.Foo")
        .method(MethodSpec::new("ok", "()V"))
        .method(MethodSpec::new("broken", "(I"))
        .build();

    let err = ClassFile::parse(&bytes).unwrap_err();
    assert_eq!(err.section(), Some(Section::Method(1)));
    assert_eq!(err.root(), &Error::InvalidDescriptor("(I".to_string()));
    assert!(err.to_string().contains("method #1"));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = ClassFileBuilder::class("com.example.Foo").build();
    bytes.push(0);

    let err = ClassFile::parse(&bytes).unwrap_err();
    assert!(matches!(err.root(), Error::TrailingBytes { remaining: 1, .. }));
}
