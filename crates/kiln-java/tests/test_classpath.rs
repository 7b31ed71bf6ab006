//! Loading classes from class files on disk.

mod common;

use common::class_bytes;
use kiln_java::classfile::{ACC_INTERFACE, ClassFile, MemberInfo};
use kiln_java::{Cached, ClassKind, ClassLookup, ClassSource, DirectoryClassPath, JavaReactor, JavaType, LexicalScope, Resolver};
use kiln_utils::Analysis;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_class(root: &Path, canonical_name: &str, bytes: &[u8]) {
    let path = root.join(kiln_java::classpath::class_file_path(canonical_name));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_directory_class_path_searches_roots_in_order() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_class(first.path(), "p.A", b"first");
    write_class(second.path(), "p.A", b"second");
    write_class(second.path(), "p.Outer$B", b"nested");

    let classpath = DirectoryClassPath::new(vec![
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]);
    assert_eq!(classpath.read("p.A").unwrap(), Some(b"first".to_vec()));
    assert_eq!(classpath.read("p.Outer$B").unwrap(), Some(b"nested".to_vec()));
    assert_eq!(classpath.read("p.Missing").unwrap(), None);
}

#[test]
fn test_resolver_from_analysis() {
    let project = TempDir::new().unwrap();
    let classes = project.path().join("build/classes");

    let mut shape_file = ClassFile::new("q/Shape");
    shape_file.access_flags |= ACC_INTERFACE;
    shape_file.methods.push(MemberInfo::new("area", "()D"));
    shape_file.fields.push(MemberInfo::new("SIDES", "I"));
    write_class(&classes, "q.Shape", &shape_file.to_bytes());
    write_class(&classes, "q.Broken", b"not a class file");
    write_class(&classes, "q.Square", &class_bytes("q.Square"));

    let analysis = Analysis {
        classpath: vec!["build/classes".into()],
        ..Analysis::default()
    };
    let mut resolver = Resolver::from_analysis(&analysis, project.path());
    let mut reactor = JavaReactor::new();
    resolver.attach(&mut reactor);

    for name in ["q.Shape", "q.Broken", "q.Square", "q.Absent"] {
        assert_eq!(resolver.klass(&mut reactor, name), ClassLookup::Pending);
    }
    let outcome = reactor.run(&mut resolver).unwrap();
    assert!(outcome.is_success());

    let shape = resolver.class(resolver.class_named("q.Shape").unwrap());
    assert_eq!(shape.kind(), ClassKind::Interface);
    assert!(shape.method("area"));
    assert!(shape.field("SIDES"));
    assert!(resolver.class_named("q.Square").is_some());
    assert_eq!(resolver.cached("q.Broken"), Some(Cached::Miss));
    assert_eq!(resolver.cached("q.Absent"), Some(Cached::Miss));
    assert_eq!(resolver.load_attempts(), 4);
}
