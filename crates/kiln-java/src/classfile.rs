//! Reading (and, for fixtures, writing) JVM class files.
//!
//! Only the structure the resolver needs is kept: the class's own name, its
//! supertypes, and the names of its fields and methods. The constant pool is
//! decoded in full so that every entry is skipped correctly.

use crate::scope::{ClassInfo, ClassKind};
use kiln_core::{Error, Result};

pub const MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    /// Field, method and interface method references.
    Ref { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    /// `Dynamic` and `InvokeDynamic`.
    Dynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
    /// Second slot of a long or double.
    Unusable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
}

impl MemberInfo {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags: ACC_PUBLIC,
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// The decoded header of a class file. Names are binary names
/// (`java/util/Map$Entry`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| Error::ClassFormat(format!("unexpected end of data at byte {}", self.pos)))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let hi = u64::from(self.u32()?);
        let lo = u64::from(self.u32()?);
        Ok((hi << 32) | lo)
    }
}

struct Pool(Vec<Constant>);

impl Pool {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.u16()? as usize;
        if count == 0 {
            return Err(Error::ClassFormat(
                "constant pool count must be at least 1".to_string(),
            ));
        }
        // Index 0 is never used.
        let mut entries = vec![Constant::Unusable];
        while entries.len() < count {
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    Constant::Utf8(String::from_utf8_lossy(reader.take(len)?).into_owned())
                }
                3 => Constant::Integer(reader.u32()? as i32),
                4 => Constant::Float(f32::from_bits(reader.u32()?)),
                5 => Constant::Long(reader.u64()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u64()?)),
                7 => Constant::Class(reader.u16()?),
                8 => Constant::String(reader.u16()?),
                9..=11 => Constant::Ref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                12 => Constant::NameAndType {
                    name: reader.u16()?,
                    descriptor: reader.u16()?,
                },
                15 => Constant::MethodHandle {
                    kind: reader.u8()?,
                    reference: reader.u16()?,
                },
                16 => Constant::MethodType(reader.u16()?),
                17 | 18 => Constant::Dynamic {
                    bootstrap: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                19 => Constant::Module(reader.u16()?),
                20 => Constant::Package(reader.u16()?),
                other => {
                    return Err(Error::ClassFormat(format!(
                        "unknown constant pool tag {other} at entry {}",
                        entries.len()
                    )));
                }
            };
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }
        if entries.len() != count {
            return Err(Error::ClassFormat(
                "wide constant overflows the constant pool".to_string(),
            ));
        }
        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(Error::ClassFormat(format!(
                "constant {index} is not a UTF-8 entry"
            ))),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(Error::ClassFormat(format!(
                "constant {index} is not a class entry"
            ))),
        }
    }
}

fn read_members(reader: &mut Reader<'_>, pool: &Pool) -> Result<Vec<MemberInfo>> {
    let count = reader.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = reader.u16()?;
        let name = pool.utf8(reader.u16()?)?.to_string();
        let descriptor = pool.utf8(reader.u16()?)?.to_string();
        skip_attributes(reader)?;
        members.push(MemberInfo {
            access_flags,
            name,
            descriptor,
        });
    }
    Ok(members)
}

fn skip_attributes(reader: &mut Reader<'_>) -> Result<()> {
    let count = reader.u16()?;
    for _ in 0..count {
        reader.u16()?;
        let len = reader.u32()? as usize;
        reader.take(len)?;
    }
    Ok(())
}

impl ClassFile {
    /// A minimal public class extending `java/lang/Object`.
    pub fn new(this_class: impl Into<String>) -> Self {
        Self {
            minor_version: 0,
            major_version: 52,
            access_flags: ACC_PUBLIC,
            this_class: this_class.into(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Decodes a class file.
    ///
    /// # Errors
    /// Returns [`Error::ClassFormat`] on a bad magic number, a truncated
    /// file, or a constant pool entry of the wrong type.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader { bytes, pos: 0 };
        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(Error::ClassFormat(format!("bad magic number {magic:#010x}")));
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let pool = Pool::read(&mut reader)?;

        let access_flags = reader.u16()?;
        let this_class = pool.class_name(reader.u16()?)?.to_string();
        let super_class = match reader.u16()? {
            0 => None,
            index => Some(pool.class_name(index)?.to_string()),
        };
        let interface_count = reader.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(reader.u16()?)?.to_string());
        }
        let fields = read_members(&mut reader, &pool)?;
        let methods = read_members(&mut reader, &pool)?;
        skip_attributes(&mut reader)?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
        })
    }

    /// Encodes the class file with a constant pool holding only names.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pool = PoolWriter::default();
        let this_class = pool.class(&self.this_class);
        let super_class = self.super_class.as_deref().map_or(0, |name| pool.class(name));
        let interfaces: Vec<u16> = self.interfaces.iter().map(|name| pool.class(name)).collect();
        let fields: Vec<[u16; 3]> = self.fields.iter().map(|m| pool.member(m)).collect();
        let methods: Vec<[u16; 3]> = self.methods.iter().map(|m| pool.member(m)).collect();

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        out.extend_from_slice(&pool.count.to_be_bytes());
        out.extend_from_slice(&pool.bytes);
        for word in [self.access_flags, this_class, super_class, interfaces.len() as u16] {
            out.extend_from_slice(&word.to_be_bytes());
        }
        for index in interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }
        for members in [fields, methods] {
            out.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for member in members {
                for word in member {
                    out.extend_from_slice(&word.to_be_bytes());
                }
                // No attributes.
                out.extend_from_slice(&0u16.to_be_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }

    pub fn kind(&self) -> ClassKind {
        if self.access_flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if self.access_flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if self.access_flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }

    /// `java/util/Map$Entry` becomes `java.util.Map$Entry`.
    pub fn canonical_name(&self) -> String {
        self.this_class.replace('/', ".")
    }

    pub fn info(&self) -> ClassInfo {
        let mut info = ClassInfo::new(self.canonical_name(), self.kind());
        info.super_type = self.super_class.as_ref().map(|name| name.replace('/', "."));
        info.interfaces = self.interfaces.iter().map(|name| name.replace('/', ".")).collect();
        info.fields = self.fields.iter().map(|f| f.name.clone()).collect();
        info.methods = self
            .methods
            .iter()
            .filter(|m| !m.name.starts_with('<'))
            .map(|m| m.name.clone())
            .collect();
        info
    }
}

#[derive(Default)]
struct PoolWriter {
    bytes: Vec<u8>,
    count: u16,
    utf8: Vec<(String, u16)>,
}

impl PoolWriter {
    fn next(&mut self) -> u16 {
        // The pool is 1-based.
        if self.count == 0 {
            self.count = 1;
        }
        let index = self.count;
        self.count += 1;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some((_, index)) = self.utf8.iter().find(|(s, _)| s == value) {
            return *index;
        }
        let index = self.next();
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(value.as_bytes());
        self.utf8.push((value.to_string(), index));
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        let index = self.next();
        self.bytes.push(7);
        self.bytes.extend_from_slice(&name.to_be_bytes());
        index
    }

    fn member(&mut self, member: &MemberInfo) -> [u16; 3] {
        [
            member.access_flags,
            self.utf8(&member.name),
            self.utf8(&member.descriptor),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `public class p/Point` with an `int x` field, an `<init>` method, a
    /// long constant, and a `SourceFile` attribute, laid out by hand.
    fn handwritten() -> Vec<u8> {
        let mut b = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61];
        // constant_pool_count = 11 (entries 1..=10)
        b.extend_from_slice(&[0, 11]);
        let utf8 = |b: &mut Vec<u8>, s: &str| {
            b.push(1);
            b.extend_from_slice(&(s.len() as u16).to_be_bytes());
            b.extend_from_slice(s.as_bytes());
        };
        utf8(&mut b, "p/Point"); // 1
        b.extend_from_slice(&[7, 0, 1]); // 2: Class p/Point
        utf8(&mut b, "java/lang/Object"); // 3
        b.extend_from_slice(&[7, 0, 3]); // 4: Class Object
        b.extend_from_slice(&[5, 0, 0, 0, 0, 0, 0, 0, 42]); // 5-6: Long 42
        utf8(&mut b, "x"); // 7
        utf8(&mut b, "I"); // 8
        utf8(&mut b, "<init>"); // 9
        utf8(&mut b, "()V"); // 10
        // access, this, super, no interfaces
        b.extend_from_slice(&[0, 0x21, 0, 2, 0, 4, 0, 0]);
        // one field: x I, no attributes
        b.extend_from_slice(&[0, 1, 0, 1, 0, 7, 0, 8, 0, 0]);
        // one method: <init> ()V with a 2-byte attribute
        b.extend_from_slice(&[0, 1, 0, 1, 0, 9, 0, 10, 0, 1, 0, 7, 0, 0, 0, 2, 0xAB, 0xCD]);
        // no class attributes
        b.extend_from_slice(&[0, 0]);
        b
    }

    #[test]
    fn test_parse_handwritten() {
        let class = ClassFile::parse(&handwritten()).unwrap();
        assert_eq!(class.major_version, 61);
        assert_eq!(class.this_class, "p/Point");
        assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.fields, vec![MemberInfo {
            access_flags: 1,
            name: "x".to_string(),
            descriptor: "I".to_string(),
        }]);
        assert_eq!(class.methods[0].name, "<init>");
        assert_eq!(class.kind(), ClassKind::Class);

        let info = class.info();
        assert_eq!(info.canonical_name, "p.Point");
        assert_eq!(info.fields, ["x"]);
        assert!(info.methods.is_empty());
    }

    #[test]
    fn test_written_file_parses_back() {
        let mut class = ClassFile::new("a/b/Outer$Inner");
        class.access_flags |= ACC_INTERFACE | ACC_ABSTRACT;
        class.interfaces.push("java/lang/Comparable".to_string());
        class.methods.push(MemberInfo::new("compareTo", "(Ljava/lang/Object;)I"));

        let parsed = ClassFile::parse(&class.to_bytes()).unwrap();
        assert_eq!(parsed, class);
        assert_eq!(parsed.kind(), ClassKind::Interface);
        assert_eq!(parsed.canonical_name(), "a.b.Outer$Inner");
    }

    #[test]
    fn test_kind_precedence() {
        let mut class = ClassFile::new("A");
        class.access_flags = ACC_INTERFACE | ACC_ANNOTATION;
        assert_eq!(class.kind(), ClassKind::Annotation);
        class.access_flags = ACC_ENUM;
        assert_eq!(class.kind(), ClassKind::Enum);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = handwritten();
        bytes[0] = 0;
        assert!(matches!(ClassFile::parse(&bytes), Err(Error::ClassFormat(_))));
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = handwritten();
        for len in [3, 12, 40, bytes.len() - 1] {
            assert!(ClassFile::parse(&bytes[..len]).is_err(), "length {len}");
        }
    }

    #[test]
    fn test_rejects_unknown_tag() {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2, 99];
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(ClassFile::parse(&bytes), Err(Error::ClassFormat(_))));
    }

    #[test]
    fn test_rejects_zero_pool_count() {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 0];
        bytes.extend_from_slice(&[0; 8]);
        let Err(Error::ClassFormat(message)) = ClassFile::parse(&bytes) else {
            panic!("a zero constant pool count must be rejected");
        };
        assert!(message.contains("at least 1"), "{message}");
    }
}
