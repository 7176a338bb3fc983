use pretty_assertions::assert_eq;
use strata_graph::{Graph, LinkError};
use strata_import::{
    ClassFileImporter, DuplicateHandling, ImportError, ImportOptions, Location, MalformedPolicy,
};
use strata_test_utils::{ClassDir, ClassFileBuilder, FieldSpec, Insn, MethodSpec};
use url::Url;

fn base() -> Vec<u8> {
    ClassFileBuilder::class("com.example.Base").build()
}

fn sub() -> Vec<u8> {
    ClassFileBuilder::class("com.example.sub.Sub")
        .extends("com.example.Base")
        .method(MethodSpec::new("run", "()V").code(vec![
            Insn::Line(3),
            Insn::invoke_static("com.example.Base", "helper", "()V"),
            Insn::Return,
        ]))
        .build()
}

fn imported_names(graph: &Graph) -> Vec<&str> {
    let mut names: Vec<_> = graph
        .types()
        .filter(|node| node.fully_imported)
        .map(|node| node.name.as_str())
        .collect();
    names.sort();
    names
}

#[test]
fn imports_directories_recursively() {
    let dir = ClassDir::new();
    dir.write_class("com.example.Base", &base());
    dir.write_class("com.example.sub.Sub", &sub());
    dir.write_file("com/example/README.txt", b"not a class file");

    let graph = ClassFileImporter::new().import_path(dir.path()).unwrap();
    assert_eq!(
        imported_names(&graph),
        vec!["com.example.Base", "com.example.sub.Sub"]
    );

    let sub = graph.get("com.example.sub.Sub").unwrap();
    assert_eq!(sub.supertype, Some(graph.get("com.example.Base").unwrap().id));
    assert_eq!(sub.package_name, "com.example.sub");
}

#[test]
fn imports_single_files_and_several_paths() {
    let dir = ClassDir::new();
    let base_path = dir.write_class("com.example.Base", &base());
    let other = ClassDir::new();
    let sub_path = other.write_class("com.example.sub.Sub", &sub());

    let graph = ClassFileImporter::new()
        .import_paths([&base_path, &sub_path])
        .unwrap();
    assert_eq!(
        imported_names(&graph),
        vec!["com.example.Base", "com.example.sub.Sub"]
    );
}

#[test]
fn imports_archives_ignoring_meta_inf() {
    let dir = ClassDir::new();
    let jar = dir.write_jar(
        "lib.jar",
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
            ("META-INF/versions/11/com/example/Base.class", vec![0xCA, 0xFE]),
            ("com/example/Base.class", base()),
            ("com/example/sub/Sub.class", sub()),
            ("com/example/notes.txt", b"ignored".to_vec()),
        ],
    );

    let graph = ClassFileImporter::new().import_path(&jar).unwrap();
    assert_eq!(
        imported_names(&graph),
        vec!["com.example.Base", "com.example.sub.Sub"]
    );
}

#[test]
fn imports_file_and_jar_urls() {
    let dir = ClassDir::new();
    dir.write_class("com.example.Base", &base());
    let jar = dir.write_jar("lib.jar", &[("com/example/sub/Sub.class", sub())]);

    let classes = Url::from_directory_path(dir.path()).unwrap();
    let entry = Url::parse(&format!(
        "jar:{}!/com/example/sub/Sub.class",
        Url::from_file_path(&jar).unwrap()
    ))
    .unwrap();

    let graph = ClassFileImporter::new()
        .import_urls([&classes, &entry])
        .unwrap();
    assert_eq!(
        imported_names(&graph),
        vec!["com.example.Base", "com.example.sub.Sub"]
    );
}

#[test]
fn missing_locations_are_reported() {
    let dir = ClassDir::new();
    let err = ClassFileImporter::new()
        .import_path(dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, ImportError::LocationNotFound(_)), "{err}");

    let jar = dir.write_jar("lib.jar", &[("com/example/Base.class", base())]);
    let err = ClassFileImporter::new()
        .import_locations([Location::ArchiveEntry {
            archive: jar,
            entry: "com/example/Missing.class".to_string(),
        }])
        .unwrap_err();
    assert!(matches!(err, ImportError::LocationNotFound(ref name) if name.ends_with("Missing.class")));

    let err = ClassFileImporter::new()
        .import_urls([&Url::parse("https://example.com/Base.class").unwrap()])
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidUrl { .. }));
}

#[test]
fn malformed_units_fail_the_import_by_default() {
    let err = ClassFileImporter::new()
        .import_bytes([("Base.class", base()), ("broken.class", vec![0xCA, 0xFE, 0xBA])])
        .unwrap_err();
    match err {
        ImportError::Malformed { source_name, error } => {
            assert_eq!(source_name, "broken.class");
            assert!(error.offset().is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_units_can_be_skipped() {
    let importer =
        ClassFileImporter::with_options(ImportOptions::default().on_malformed(MalformedPolicy::Skip));
    let import = importer
        .import_detailed([
            Location::bytes("broken.class", b"not a class".to_vec()),
            Location::bytes("Base.class", base()),
        ])
        .unwrap();

    assert_eq!(imported_names(&import.graph), vec!["com.example.Base"]);
    assert_eq!(import.skipped.len(), 1);
    assert_eq!(import.skipped[0].source_name, "broken.class");
}

#[test]
fn package_info_is_imported_only_on_request() {
    let package_info = ClassFileBuilder::interface("com.example.package-info").build();

    let graph = ClassFileImporter::new()
        .import_bytes([("package-info.class", package_info.clone()), ("Base.class", base())])
        .unwrap();
    assert!(graph.get("com.example.package-info").is_none());

    let graph = ClassFileImporter::with_options(ImportOptions::default().include_package_info(true))
        .import_bytes([("package-info.class", package_info)])
        .unwrap();
    assert!(graph.get("com.example.package-info").unwrap().fully_imported);
}

#[test]
fn conflicting_duplicates_follow_the_configured_policy() {
    let first = ClassFileBuilder::class("com.example.Base").build();
    let second = ClassFileBuilder::class("com.example.Base")
        .field(FieldSpec::new("extra", "I"))
        .build();

    let err = ClassFileImporter::new()
        .import_bytes([("a.class", first.clone()), ("b.class", second.clone())])
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::ClassIdentityConflict(LinkError::ClassIdentityConflict { ref name, .. })
            if name == "com.example.Base"
    ));

    let graph = ClassFileImporter::with_options(
        ImportOptions::default().duplicates(DuplicateHandling::FirstWins),
    )
    .import_bytes([("a.class", first), ("b.class", second)])
    .unwrap();
    let base = graph.get("com.example.Base").unwrap();
    assert!(graph.fields(base.id).next().is_none());
}

#[test]
fn parallel_reads_share_one_identity_per_name() {
    let units: Vec<_> = (0..64)
        .map(|i| {
            let name = format!("com.example.Worker{i}");
            let bytes = ClassFileBuilder::class(&name)
                .field(FieldSpec::new("shared", "Lcom/example/Shared;"))
                .method(MethodSpec::new("work", "()V").code(vec![Insn::invoke_static(
                    "com.example.Shared",
                    "tick",
                    "()V",
                )]))
                .build();
            (format!("{name}.class"), bytes)
        })
        .collect();

    for options in [ImportOptions::default(), ImportOptions::default().threads(4)] {
        let graph = ClassFileImporter::with_options(options)
            .import_bytes(units.clone())
            .unwrap();
        let shared = graph.get("com.example.Shared").unwrap();
        assert!(!shared.fully_imported);
        assert_eq!(graph.types().filter(|node| node.fully_imported).count(), 64);
        for node in graph.types().filter(|node| node.fully_imported) {
            let field = graph.field(node.id, "shared").unwrap();
            assert_eq!(field.return_type, shared.id);
        }
        assert_eq!(graph.dependents(shared.id).count(), 64);
    }
}
