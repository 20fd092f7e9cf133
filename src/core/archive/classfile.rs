// ─── JVM Classfile Reader ───
// Decodes just enough of a compiled class to answer two questions: which
// interfaces does it implement, and which runtime-visible annotations does it
// carry. Fields and methods are skipped over.

use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;
const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

#[derive(Debug, Error)]
pub enum ClassfileError {
    #[error("class entry not found in archive")]
    NotFound,
    #[error("failed to read class entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad magic {0:#010x}")]
    BadMagic(u32),
    #[error("unexpected end of classfile at offset {0}")]
    Truncated(usize),
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("constant pool index {0} does not hold the expected entry")]
    BadConstantIndex(u16),
    #[error("invalid element value tag {0:#04x}")]
    BadElementValue(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Constant {
    Utf8(String),
    Class { name_index: u16 },
    /// Any entry this reader never dereferences.
    Other,
    /// Second slot of a long or double.
    Unusable,
}

/// The parts of a compiled class the extractor inspects.
#[derive(Debug, Clone)]
pub struct Classfile {
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    annotations: Vec<String>,
}

impl Classfile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassfileError> {
        let mut r = Reader::new(bytes);

        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(ClassfileError::BadMagic(magic));
        }
        // minor and major version
        r.skip(4)?;

        let pool = ConstantPool::read(&mut r)?;

        // access flags
        r.skip(2)?;
        let this_class = pool.class_name(r.u16()?)?.to_string();
        let super_index = r.u16()?;
        // java/lang/Object and module-info have no superclass
        let super_class = match super_index {
            0 => None,
            index => Some(pool.class_name(index)?.to_string()),
        };

        let interface_count = r.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(r.u16()?)?.to_string());
        }

        // fields, then methods: access, name, descriptor, attributes
        for _ in 0..2 {
            let count = r.u16()?;
            for _ in 0..count {
                r.skip(6)?;
                skip_attributes(&mut r)?;
            }
        }

        let mut annotations = Vec::new();
        let attribute_count = r.u16()?;
        for _ in 0..attribute_count {
            let name = pool.utf8(r.u16()?)?;
            let length = r.u32()? as usize;
            if name == RUNTIME_VISIBLE_ANNOTATIONS {
                let mut body = Reader::new(r.bytes(length)?);
                read_annotations(&mut body, &pool, &mut annotations)?;
            } else {
                r.skip(length)?;
            }
        }

        Ok(Self {
            this_class,
            super_class,
            interfaces,
            annotations,
        })
    }

    /// Internal name of the class itself, e.g. `com/example/Mod`.
    pub fn this_class(&self) -> &str {
        &self.this_class
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// Field descriptors of the class-level runtime-visible annotations,
    /// e.g. `Lnet/minecraftforge/fml/common/Mod;`.
    pub fn runtime_visible_annotations(&self) -> &[String] {
        &self.annotations
    }
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(r: &mut Reader<'_>) -> Result<Self, ClassfileError> {
        let count = r.u16()?;
        // slot 0 is never used
        let mut entries = vec![Constant::Unusable];
        let mut index = 1;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    // Modified UTF-8 only differs for NUL and supplementary
                    // characters, neither of which shows up in class names.
                    Constant::Utf8(String::from_utf8_lossy(r.bytes(len)?).into_owned())
                }
                7 => Constant::Class {
                    name_index: r.u16()?,
                },
                // Integer, Float, Field/Method/InterfaceMethodref,
                // NameAndType, Dynamic, InvokeDynamic
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    r.skip(4)?;
                    Constant::Other
                }
                // Long, Double
                5 | 6 => {
                    r.skip(8)?;
                    entries.push(Constant::Other);
                    index += 1;
                    Constant::Unusable
                }
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    r.skip(2)?;
                    Constant::Other
                }
                // MethodHandle
                15 => {
                    r.skip(3)?;
                    Constant::Other
                }
                tag => return Err(ClassfileError::UnknownConstantTag { tag, index }),
            };
            entries.push(constant);
            index += 1;
        }
        Ok(Self { entries })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassfileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ClassfileError::BadConstantIndex(index)),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassfileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassfileError::BadConstantIndex(index)),
        }
    }
}

fn skip_attributes(r: &mut Reader<'_>) -> Result<(), ClassfileError> {
    let count = r.u16()?;
    for _ in 0..count {
        r.skip(2)?;
        let length = r.u32()? as usize;
        r.skip(length)?;
    }
    Ok(())
}

fn read_annotations(
    r: &mut Reader<'_>,
    pool: &ConstantPool,
    out: &mut Vec<String>,
) -> Result<(), ClassfileError> {
    let count = r.u16()?;
    for _ in 0..count {
        let type_index = r.u16()?;
        out.push(pool.utf8(type_index)?.to_string());
        skip_element_pairs(r)?;
    }
    Ok(())
}

fn skip_element_pairs(r: &mut Reader<'_>) -> Result<(), ClassfileError> {
    let pairs = r.u16()?;
    for _ in 0..pairs {
        r.skip(2)?;
        skip_element_value(r)?;
    }
    Ok(())
}

fn skip_element_value(r: &mut Reader<'_>) -> Result<(), ClassfileError> {
    match r.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => r.skip(2),
        b'e' => r.skip(4),
        b'@' => {
            r.skip(2)?;
            skip_element_pairs(r)
        }
        b'[' => {
            let count = r.u16()?;
            for _ in 0..count {
                skip_element_value(r)?;
            }
            Ok(())
        }
        tag => Err(ClassfileError::BadElementValue(tag)),
    }
}

/// Big-endian cursor over the raw class bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassfileError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ClassfileError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassfileError> {
        self.bytes(len).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, ClassfileError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassfileError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassfileError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}
