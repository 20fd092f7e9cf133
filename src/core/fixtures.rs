// ─── Test Fixtures ───
// In-memory classfiles and jars for the extractor and resolver tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Assembles a minimal but well-formed classfile.
pub struct ClassBuilder {
    name: String,
    interfaces: Vec<String>,
    annotations: Vec<String>,
    long_constant: bool,
    field: bool,
    method: bool,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            interfaces: Vec::new(),
            annotations: Vec::new(),
            long_constant: false,
            field: false,
            method: false,
        }
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn annotated(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }

    pub fn with_long_constant(mut self) -> Self {
        self.long_constant = true;
        self
    }

    pub fn with_field(mut self) -> Self {
        self.field = true;
        self
    }

    pub fn with_method(mut self) -> Self {
        self.method = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_class = pool.class(&self.name);
        let super_class = pool.class("java/lang/Object");
        let interfaces: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();
        if self.long_constant {
            pool.long(0x0123_4567_89ab_cdef);
        }
        let member_name = pool.utf8("value");
        let member_descriptor = pool.utf8("I");
        let code_attribute = pool.utf8("Code");
        let annotations_attribute = pool.utf8("RuntimeVisibleAnnotations");
        let annotation_types: Vec<u16> = self.annotations.iter().map(|a| pool.utf8(a)).collect();
        let string_value = pool.utf8("examplemod");

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&61u16.to_be_bytes());
        out.extend_from_slice(&pool.count().to_be_bytes());
        out.extend_from_slice(&pool.bytes);

        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&(interfaces.len() as u16).to_be_bytes());
        for index in interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }

        for present in [self.field, self.method] {
            if !present {
                out.extend_from_slice(&0u16.to_be_bytes());
                continue;
            }
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&0x0001u16.to_be_bytes());
            out.extend_from_slice(&member_name.to_be_bytes());
            out.extend_from_slice(&member_descriptor.to_be_bytes());
            // one opaque attribute
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&code_attribute.to_be_bytes());
            out.extend_from_slice(&3u32.to_be_bytes());
            out.extend_from_slice(&[0xde, 0xad, 0x00]);
        }

        if annotation_types.is_empty() {
            out.extend_from_slice(&0u16.to_be_bytes());
            return out;
        }

        // each annotation: type, one pair `value = "examplemod"`, plus a
        // nested array pair to exercise element skipping
        let mut body = Vec::new();
        body.extend_from_slice(&(annotation_types.len() as u16).to_be_bytes());
        for type_index in annotation_types {
            body.extend_from_slice(&type_index.to_be_bytes());
            body.extend_from_slice(&2u16.to_be_bytes());
            body.extend_from_slice(&member_name.to_be_bytes());
            body.push(b's');
            body.extend_from_slice(&string_value.to_be_bytes());
            body.extend_from_slice(&member_name.to_be_bytes());
            body.push(b'[');
            body.extend_from_slice(&2u16.to_be_bytes());
            body.push(b'Z');
            body.extend_from_slice(&string_value.to_be_bytes());
            body.push(b'e');
            body.extend_from_slice(&member_descriptor.to_be_bytes());
            body.extend_from_slice(&string_value.to_be_bytes());
        }
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&annotations_attribute.to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }
}

struct Pool {
    bytes: Vec<u8>,
    next: u16,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next: 1,
        }
    }
}

impl Pool {
    /// `constant_pool_count` is one past the highest index in use.
    fn count(&self) -> u16 {
        self.next
    }

    fn slot(&mut self, width: u16) -> u16 {
        let index = self.next;
        self.next += width;
        index
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let index = self.slot(1);
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(s.as_bytes());
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let index = self.slot(1);
        self.bytes.push(7);
        self.bytes.extend_from_slice(&name_index.to_be_bytes());
        index
    }

    fn long(&mut self, value: i64) -> u16 {
        let index = self.slot(2);
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        index
    }
}

/// Zip the given `(path, contents)` entries into an in-memory jar.
pub fn jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (path, contents) in entries {
        writer.start_file(*path, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A fabric mod jar whose single entry point implements `ModInitializer`.
pub fn fabric_jar(version: &str, minecraft: &str) -> Vec<u8> {
    let manifest = format!(
        r#"{{
            "schemaVersion": 1,
            "id": "examplemod",
            "version": "{version}",
            "environment": "*",
            "entrypoints": {{ "main": ["com.example.ExampleMod"] }},
            "depends": {{ "fabricloader": ">=0.15", "minecraft": "{minecraft}" }}
        }}"#
    );
    let class = ClassBuilder::new("com/example/ExampleMod")
        .implements("net/fabricmc/api/ModInitializer")
        .build();
    jar(&[
        ("fabric.mod.json", manifest.as_bytes()),
        ("com/example/ExampleMod.class", class.as_slice()),
    ])
}

/// A forge-like jar whose mod class carries the given `@Mod` descriptor.
pub fn forge_jar(annotation: &str, version_range: &str) -> Vec<u8> {
    let manifest = format!(
        r#"
modLoader = "javafml"
loaderVersion = "[47,)"
license = "MIT"

[[mods]]
modId = "examplemod"
version = "2.0.1"
displayName = "Example Mod"

[[dependencies.examplemod]]
modId = "forge"
mandatory = true
versionRange = "[47,)"
ordering = "NONE"
side = "BOTH"

[[dependencies.examplemod]]
modId = "minecraft"
mandatory = true
versionRange = "{version_range}"
ordering = "NONE"
side = "BOTH"
"#
    );
    let helper = ClassBuilder::new("com/example/Helper").build();
    let class = ClassBuilder::new("com/example/ExampleMod")
        .annotated(annotation)
        .build();
    jar(&[
        ("META-INF/mods.toml", manifest.as_bytes()),
        ("com/example/Helper.class", helper.as_slice()),
        ("com/example/ExampleMod.class", class.as_slice()),
    ])
}
