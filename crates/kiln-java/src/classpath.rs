//! Where classes come from when they are not defined in source.

use crate::scope::{ClassInfo, ClassKind};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// A searchable location of class files, addressed by canonical name.
pub trait ClassSource {
    /// Bytes of the class file for `canonical_name`, `None` if there is none.
    fn read(&self, canonical_name: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Relative path of the class file holding a canonical name:
/// `a.b.C$D` lives at `a/b/C$D.class`.
pub fn class_file_path(canonical_name: &str) -> PathBuf {
    let mut path: PathBuf = canonical_name.split('.').collect();
    path.set_extension("class");
    path
}

/// Class files laid out in package directories under one or more roots.
#[derive(Debug, Clone, Default)]
pub struct DirectoryClassPath {
    roots: Vec<PathBuf>,
}

impl DirectoryClassPath {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn read_from(root: &Path, relative: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(root.join(relative)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ClassSource for DirectoryClassPath {
    fn read(&self, canonical_name: &str) -> io::Result<Option<Vec<u8>>> {
        let relative = class_file_path(canonical_name);
        for root in &self.roots {
            if let Some(bytes) = Self::read_from(root, &relative)? {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }
}

/// Class files held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryClassPath {
    classes: HashMap<String, Vec<u8>>,
}

impl MemoryClassPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, canonical_name: impl Into<String>, bytes: Vec<u8>) {
        self.classes.insert(canonical_name.into(), bytes);
    }

    #[must_use]
    pub fn with(mut self, canonical_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(canonical_name, bytes);
        self
    }
}

impl ClassSource for MemoryClassPath {
    fn read(&self, canonical_name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.classes.get(canonical_name).cloned())
    }
}

/// Last-resort loader for platform classes that have no class file on the
/// classpath.
pub trait ReflectiveLoader {
    fn load(&self, canonical_name: &str) -> Option<ClassInfo>;
}

/// The core `java.lang` types every analysis may refer to.
#[derive(Debug, Clone)]
pub struct BuiltinClasses {
    classes: HashMap<String, ClassInfo>,
}

const OBJECT: &str = "java.lang.Object";

impl BuiltinClasses {
    pub fn new() -> Self {
        let mut classes = HashMap::new();
        let mut add = |info: ClassInfo| {
            classes.insert(info.canonical_name.clone(), info);
        };

        let mut object = ClassInfo::new(OBJECT, ClassKind::Class);
        object.methods = ["equals", "hashCode", "toString", "getClass"]
            .map(str::to_string)
            .to_vec();
        add(object);

        for name in ["Comparable", "CharSequence", "Iterable", "Runnable", "Cloneable"] {
            add(ClassInfo::new(format!("java.lang.{name}"), ClassKind::Interface));
        }
        add(ClassInfo::new("java.io.Serializable", ClassKind::Interface));

        add(ClassInfo::new("java.lang.String", ClassKind::Class)
            .extends(OBJECT)
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable")
            .implements("java.lang.CharSequence"));
        add(ClassInfo::new("java.lang.Number", ClassKind::Class)
            .extends(OBJECT)
            .implements("java.io.Serializable"));
        add(ClassInfo::new("java.lang.Enum", ClassKind::Class)
            .extends(OBJECT)
            .implements("java.lang.Comparable"));
        add(ClassInfo::new("java.lang.Throwable", ClassKind::Class).extends(OBJECT));
        add(ClassInfo::new("java.lang.Exception", ClassKind::Class).extends("java.lang.Throwable"));
        add(ClassInfo::new("java.lang.RuntimeException", ClassKind::Class)
            .extends("java.lang.Exception"));

        for (name, super_type) in [
            ("Boolean", OBJECT),
            ("Character", OBJECT),
            ("Byte", "java.lang.Number"),
            ("Short", "java.lang.Number"),
            ("Integer", "java.lang.Number"),
            ("Long", "java.lang.Number"),
            ("Float", "java.lang.Number"),
            ("Double", "java.lang.Number"),
        ] {
            add(ClassInfo::new(format!("java.lang.{name}"), ClassKind::Class)
                .extends(super_type)
                .implements("java.lang.Comparable"));
        }

        Self { classes }
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.classes.contains_key(canonical_name)
    }
}

impl Default for BuiltinClasses {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectiveLoader for BuiltinClasses {
    fn load(&self, canonical_name: &str) -> Option<ClassInfo> {
        self.classes.get(canonical_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_file_path() {
        assert_eq!(
            class_file_path("a.b.C$D"),
            Path::new("a").join("b").join("C$D.class")
        );
        assert_eq!(class_file_path("Top"), PathBuf::from("Top.class"));
    }

    #[test]
    fn test_memory_class_path() {
        let classpath = MemoryClassPath::new().with("p.A", vec![1, 2, 3]);
        assert_eq!(classpath.read("p.A").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(classpath.read("p.B").unwrap(), None);
    }

    #[test]
    fn test_builtins() {
        let builtins = BuiltinClasses::new();
        let integer = builtins.load("java.lang.Integer").unwrap();
        assert_eq!(integer.super_type.as_deref(), Some("java.lang.Number"));
        assert_eq!(builtins.load(OBJECT).unwrap().super_type, None);
        assert_eq!(
            builtins.load("java.lang.Comparable").unwrap().kind,
            ClassKind::Interface
        );
        assert!(builtins.load("java.util.List").is_none());
    }
}
