//! A small class-file writer for tests.
//!
//! Only the structure the reader looks at is produced; bytecode is not
//! verifiable and stack sizes are fixed.

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_SYNCHRONIZED: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

const MAJOR_JAVA_17: u16 = 61;
const OBJECT: &str = "java/lang/Object";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    NameAndType(u16, u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
}

#[derive(Clone, Copy)]
enum RefKind {
    Field,
    Method,
    InterfaceMethod,
}

struct ConstantPoolWriter {
    entries: Vec<Constant>,
    indices: HashMap<Constant, u16>,
    next: u16,
}

impl ConstantPoolWriter {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            indices: HashMap::new(),
            next: 1,
        }
    }

    fn add(&mut self, constant: Constant) -> u16 {
        if let Some(&index) = self.indices.get(&constant) {
            return index;
        }
        let index = self.next;
        self.next += match constant {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        };
        self.indices.insert(constant.clone(), index);
        self.entries.push(constant);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.add(Constant::Utf8(value.to_string()))
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.add(Constant::Class(name))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.add(Constant::NameAndType(name, descriptor))
    }

    fn member_ref(&mut self, kind: RefKind, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(&internal(owner));
        let nat = self.name_and_type(name, descriptor);
        self.add(match kind {
            RefKind::Field => Constant::Fieldref(class, nat),
            RefKind::Method => Constant::Methodref(class, nat),
            RefKind::InterfaceMethod => Constant::InterfaceMethodref(class, nat),
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        push_u16(out, self.next);
        for entry in &self.entries {
            match entry {
                Constant::Utf8(value) => {
                    let bytes = encode_modified_utf8(value);
                    out.push(1);
                    push_u16(out, bytes.len() as u16);
                    out.extend_from_slice(&bytes);
                }
                Constant::Integer(value) => {
                    out.push(3);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Float(bits) => {
                    out.push(4);
                    push_u32(out, *bits);
                }
                Constant::Long(value) => {
                    out.push(5);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Constant::Double(bits) => {
                    out.push(6);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
                Constant::Class(name) => {
                    out.push(7);
                    push_u16(out, *name);
                }
                Constant::Fieldref(class, nat)
                | Constant::Methodref(class, nat)
                | Constant::InterfaceMethodref(class, nat) => {
                    out.push(match entry {
                        Constant::Fieldref(..) => 9,
                        Constant::Methodref(..) => 10,
                        _ => 11,
                    });
                    push_u16(out, *class);
                    push_u16(out, *nat);
                }
                Constant::NameAndType(name, descriptor) => {
                    out.push(12);
                    push_u16(out, *name);
                    push_u16(out, *descriptor);
                }
            }
        }
    }
}

/// An annotation instance; `type_name` is a binary name.
#[derive(Debug, Clone)]
pub struct AnnotationSpec {
    pub type_name: String,
    pub values: Vec<(String, ValueSpec)>,
}

impl AnnotationSpec {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: &str, value: ValueSpec) -> Self {
        self.values.push((name.to_string(), value));
        self
    }
}

#[derive(Debug, Clone)]
pub enum ValueSpec {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Enum { type_name: String, const_name: String },
    /// Raw return descriptor of the class literal (`Ljava/lang/Object;`, `V`).
    Class(String),
    Annotation(AnnotationSpec),
    Array(Vec<ValueSpec>),
}

/// A class literal for a binary, primitive or array type name (`int[]`, `void`).
pub fn class_literal(type_name: &str) -> ValueSpec {
    ValueSpec::Class(type_descriptor(type_name))
}

fn type_descriptor(type_name: &str) -> String {
    if let Some(component) = type_name.strip_suffix("[]") {
        return format!("[{}", type_descriptor(component));
    }
    match type_name {
        "void" => "V".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "double" => "D".to_string(),
        "float" => "F".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "short" => "S".to_string(),
        "boolean" => "Z".to_string(),
        other => format!("L{};", internal(other)),
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access_flags: ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: Vec::new(),
        }
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    code: Option<Vec<Insn>>,
    throws: Vec<String>,
    annotations: Vec<AnnotationSpec>,
}

impl MethodSpec {
    /// A public method without a code body.
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access_flags: ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            code: None,
            throws: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn constructor(descriptor: &str) -> Self {
        Self::new("<init>", descriptor).code(vec![Insn::Return])
    }

    pub fn static_initializer() -> Self {
        Self::new("<clinit>", "()V")
            .access_flags(ACC_STATIC)
            .code(vec![Insn::Return])
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn code(mut self, code: Vec<Insn>) -> Self {
        self.code = Some(code);
        self
    }

    pub fn throws(mut self, exception: &str) -> Self {
        self.throws.push(exception.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// One instruction of a code body. Owners are binary names or array
/// descriptors (`[Ljava/lang/String;`).
#[derive(Debug, Clone)]
pub enum Insn {
    /// Starts a line number table entry at the next instruction.
    Line(u16),
    GetField(MemberRefSpec),
    PutField(MemberRefSpec),
    GetStatic(MemberRefSpec),
    PutStatic(MemberRefSpec),
    InvokeVirtual(MemberRefSpec),
    InvokeSpecial(MemberRefSpec),
    InvokeStatic(MemberRefSpec),
    /// `invokestatic` through an `InterfaceMethodref`.
    InvokeStaticInterface(MemberRefSpec),
    InvokeInterface(MemberRefSpec),
    New(String),
    TableSwitch { low: i32, high: i32 },
    LookupSwitch { pairs: u32 },
    Raw(Vec<u8>),
    Return,
}

#[derive(Debug, Clone)]
pub struct MemberRefSpec {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

fn member(owner: &str, name: &str, descriptor: &str) -> MemberRefSpec {
    MemberRefSpec {
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    }
}

impl Insn {
    pub fn get_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::GetField(member(owner, name, descriptor))
    }

    pub fn put_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::PutField(member(owner, name, descriptor))
    }

    pub fn get_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::GetStatic(member(owner, name, descriptor))
    }

    pub fn put_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::PutStatic(member(owner, name, descriptor))
    }

    pub fn invoke_virtual(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::InvokeVirtual(member(owner, name, descriptor))
    }

    pub fn invoke_special(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::InvokeSpecial(member(owner, name, descriptor))
    }

    pub fn invoke_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::InvokeStatic(member(owner, name, descriptor))
    }

    pub fn invoke_interface(owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::InvokeInterface(member(owner, name, descriptor))
    }

    /// `invokespecial <init>`.
    pub fn construct(owner: &str, descriptor: &str) -> Self {
        Insn::InvokeSpecial(member(owner, "<init>", descriptor))
    }
}

/// Builds the bytes of one class file.
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    major_version: u16,
    access_flags: u16,
    name: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    source_file: Option<String>,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
    invisible_annotations: Vec<AnnotationSpec>,
    inner_classes: Vec<(String, Option<String>, Option<String>, u16)>,
    enclosing_method: Option<(String, Option<(String, String)>)>,
    extra_attributes: Vec<(String, Vec<u8>)>,
}

impl ClassFileBuilder {
    /// A public class extending `java.lang.Object`. Names are binary names.
    pub fn class(name: &str) -> Self {
        Self {
            major_version: MAJOR_JAVA_17,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            name: internal(name),
            super_class: Some(OBJECT.to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
            signature: None,
            annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            inner_classes: Vec::new(),
            enclosing_method: None,
            extra_attributes: Vec::new(),
        }
    }

    pub fn interface(name: &str) -> Self {
        Self::class(name).access_flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    pub fn annotation_type(name: &str) -> Self {
        Self::class(name)
            .access_flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
            .implements("java.lang.annotation.Annotation")
    }

    pub fn enum_type(name: &str) -> Self {
        Self::class(name)
            .access_flags(ACC_PUBLIC | ACC_FINAL | ACC_SUPER | ACC_ENUM)
            .extends("java.lang.Enum")
    }

    pub fn major_version(mut self, version: u16) -> Self {
        self.major_version = version;
        self
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn extends(mut self, name: &str) -> Self {
        self.super_class = Some(internal(name));
        self
    }

    /// Drops the superclass, as only `java.lang.Object` does.
    pub fn no_super(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(internal(name));
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn invisible_annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.invisible_annotations.push(annotation);
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        flags: u16,
    ) -> Self {
        self.inner_classes.push((
            internal(inner),
            outer.map(internal),
            inner_name.map(str::to_string),
            flags,
        ));
        self
    }

    pub fn enclosing_method(mut self, class: &str, method: Option<(&str, &str)>) -> Self {
        self.enclosing_method = Some((
            internal(class),
            method.map(|(name, descriptor)| (name.to_string(), descriptor.to_string())),
        ));
        self
    }

    /// Adds an attribute the reader does not know about.
    pub fn attribute(mut self, name: &str, body: Vec<u8>) -> Self {
        self.extra_attributes.push((name.to_string(), body));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = ConstantPoolWriter::new();
        let mut body = Vec::new();

        push_u16(&mut body, self.access_flags);
        let this_class = pool.class(&self.name);
        push_u16(&mut body, this_class);
        let super_class = self
            .super_class
            .as_deref()
            .map_or(0, |name| pool.class(name));
        push_u16(&mut body, super_class);

        push_u16(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            let index = pool.class(interface);
            push_u16(&mut body, index);
        }

        push_u16(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            push_u16(&mut body, field.access_flags);
            let name = pool.utf8(&field.name);
            let descriptor = pool.utf8(&field.descriptor);
            push_u16(&mut body, name);
            push_u16(&mut body, descriptor);

            let mut attributes = Vec::new();
            if let Some(signature) = &field.signature {
                attributes.push(signature_attribute(&mut pool, signature));
            }
            if !field.annotations.is_empty() {
                attributes.push(annotations_attribute(
                    &mut pool,
                    "RuntimeVisibleAnnotations",
                    &field.annotations,
                ));
            }
            write_attributes(&mut body, attributes);
        }

        push_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            push_u16(&mut body, method.access_flags);
            let name = pool.utf8(&method.name);
            let descriptor = pool.utf8(&method.descriptor);
            push_u16(&mut body, name);
            push_u16(&mut body, descriptor);

            let mut attributes = Vec::new();
            if let Some(code) = &method.code {
                attributes.push(code_attribute(&mut pool, code));
            }
            if !method.throws.is_empty() {
                let mut out = Vec::new();
                push_u16(&mut out, method.throws.len() as u16);
                for exception in &method.throws {
                    let index = pool.class(&internal(exception));
                    push_u16(&mut out, index);
                }
                attributes.push((pool.utf8("Exceptions"), out));
            }
            if let Some(signature) = &method.signature {
                attributes.push(signature_attribute(&mut pool, signature));
            }
            if !method.annotations.is_empty() {
                attributes.push(annotations_attribute(
                    &mut pool,
                    "RuntimeVisibleAnnotations",
                    &method.annotations,
                ));
            }
            write_attributes(&mut body, attributes);
        }

        let mut attributes = Vec::new();
        if let Some(source_file) = &self.source_file {
            let value = pool.utf8(source_file);
            attributes.push((pool.utf8("SourceFile"), value.to_be_bytes().to_vec()));
        }
        if let Some(signature) = &self.signature {
            attributes.push(signature_attribute(&mut pool, signature));
        }
        if !self.annotations.is_empty() {
            attributes.push(annotations_attribute(
                &mut pool,
                "RuntimeVisibleAnnotations",
                &self.annotations,
            ));
        }
        if !self.invisible_annotations.is_empty() {
            attributes.push(annotations_attribute(
                &mut pool,
                "RuntimeInvisibleAnnotations",
                &self.invisible_annotations,
            ));
        }
        if !self.inner_classes.is_empty() {
            let mut out = Vec::new();
            push_u16(&mut out, self.inner_classes.len() as u16);
            for (inner, outer, inner_name, flags) in &self.inner_classes {
                let inner = pool.class(inner);
                let outer = outer.as_deref().map_or(0, |name| pool.class(name));
                let inner_name = inner_name.as_deref().map_or(0, |name| pool.utf8(name));
                push_u16(&mut out, inner);
                push_u16(&mut out, outer);
                push_u16(&mut out, inner_name);
                push_u16(&mut out, *flags);
            }
            attributes.push((pool.utf8("InnerClasses"), out));
        }
        if let Some((class, method)) = &self.enclosing_method {
            let mut out = Vec::new();
            let class = pool.class(class);
            push_u16(&mut out, class);
            let method = method
                .as_ref()
                .map_or(0, |(name, descriptor)| pool.name_and_type(name, descriptor));
            push_u16(&mut out, method);
            attributes.push((pool.utf8("EnclosingMethod"), out));
        }
        for (name, attribute_body) in &self.extra_attributes {
            attributes.push((pool.utf8(name), attribute_body.clone()));
        }
        write_attributes(&mut body, attributes);

        let mut out = Vec::new();
        push_u32(&mut out, 0xCAFEBABE);
        push_u16(&mut out, 0);
        push_u16(&mut out, self.major_version);
        pool.write(&mut out);
        out.extend_from_slice(&body);
        out
    }
}

fn signature_attribute(pool: &mut ConstantPoolWriter, signature: &str) -> (u16, Vec<u8>) {
    let value = pool.utf8(signature);
    (pool.utf8("Signature"), value.to_be_bytes().to_vec())
}

fn annotations_attribute(
    pool: &mut ConstantPoolWriter,
    name: &str,
    annotations: &[AnnotationSpec],
) -> (u16, Vec<u8>) {
    let mut out = Vec::new();
    push_u16(&mut out, annotations.len() as u16);
    for annotation in annotations {
        write_annotation(pool, &mut out, annotation);
    }
    (pool.utf8(name), out)
}

fn write_annotation(pool: &mut ConstantPoolWriter, out: &mut Vec<u8>, annotation: &AnnotationSpec) {
    let type_index = pool.utf8(&type_descriptor(&annotation.type_name));
    push_u16(out, type_index);
    push_u16(out, annotation.values.len() as u16);
    for (name, value) in &annotation.values {
        let name = pool.utf8(name);
        push_u16(out, name);
        write_element_value(pool, out, value);
    }
}

fn write_element_value(pool: &mut ConstantPoolWriter, out: &mut Vec<u8>, value: &ValueSpec) {
    let (tag, index) = match value {
        ValueSpec::Byte(v) => (b'B', pool.add(Constant::Integer(*v as i32))),
        ValueSpec::Char(v) => (b'C', pool.add(Constant::Integer(*v as i32))),
        ValueSpec::Short(v) => (b'S', pool.add(Constant::Integer(*v as i32))),
        ValueSpec::Int(v) => (b'I', pool.add(Constant::Integer(*v))),
        ValueSpec::Boolean(v) => (b'Z', pool.add(Constant::Integer(*v as i32))),
        ValueSpec::Long(v) => (b'J', pool.add(Constant::Long(*v))),
        ValueSpec::Float(v) => (b'F', pool.add(Constant::Float(v.to_bits()))),
        ValueSpec::Double(v) => (b'D', pool.add(Constant::Double(v.to_bits()))),
        ValueSpec::String(v) => (b's', pool.utf8(v)),
        ValueSpec::Class(descriptor) => (b'c', pool.utf8(descriptor)),
        ValueSpec::Enum {
            type_name,
            const_name,
        } => {
            out.push(b'e');
            let type_index = pool.utf8(&type_descriptor(type_name));
            let const_index = pool.utf8(const_name);
            push_u16(out, type_index);
            push_u16(out, const_index);
            return;
        }
        ValueSpec::Annotation(nested) => {
            out.push(b'@');
            write_annotation(pool, out, nested);
            return;
        }
        ValueSpec::Array(values) => {
            out.push(b'[');
            push_u16(out, values.len() as u16);
            for value in values {
                write_element_value(pool, out, value);
            }
            return;
        }
    };
    out.push(tag);
    push_u16(out, index);
}

fn code_attribute(pool: &mut ConstantPoolWriter, insns: &[Insn]) -> (u16, Vec<u8>) {
    let mut code = Vec::new();
    let mut lines: Vec<(u16, u16)> = Vec::new();

    for insn in insns {
        let pc = code.len();
        match insn {
            Insn::Line(line) => lines.push((pc as u16, *line)),
            Insn::GetField(r) => emit_ref(pool, &mut code, 0xb4, RefKind::Field, r),
            Insn::PutField(r) => emit_ref(pool, &mut code, 0xb5, RefKind::Field, r),
            Insn::GetStatic(r) => emit_ref(pool, &mut code, 0xb2, RefKind::Field, r),
            Insn::PutStatic(r) => emit_ref(pool, &mut code, 0xb3, RefKind::Field, r),
            Insn::InvokeVirtual(r) => emit_ref(pool, &mut code, 0xb6, RefKind::Method, r),
            Insn::InvokeSpecial(r) => emit_ref(pool, &mut code, 0xb7, RefKind::Method, r),
            Insn::InvokeStatic(r) => emit_ref(pool, &mut code, 0xb8, RefKind::Method, r),
            Insn::InvokeStaticInterface(r) => {
                emit_ref(pool, &mut code, 0xb8, RefKind::InterfaceMethod, r)
            }
            Insn::InvokeInterface(r) => {
                emit_ref(pool, &mut code, 0xb9, RefKind::InterfaceMethod, r);
                code.extend_from_slice(&[1, 0]);
            }
            Insn::New(class) => {
                code.push(0xbb);
                let index = pool.class(&internal(class));
                push_u16(&mut code, index);
            }
            Insn::TableSwitch { low, high } => {
                code.push(0xaa);
                pad_switch(&mut code);
                code.extend_from_slice(&0i32.to_be_bytes());
                code.extend_from_slice(&low.to_be_bytes());
                code.extend_from_slice(&high.to_be_bytes());
                for _ in *low..=*high {
                    code.extend_from_slice(&0i32.to_be_bytes());
                }
            }
            Insn::LookupSwitch { pairs } => {
                code.push(0xab);
                pad_switch(&mut code);
                code.extend_from_slice(&0i32.to_be_bytes());
                push_u32(&mut code, *pairs);
                for key in 0..*pairs {
                    push_u32(&mut code, key);
                    code.extend_from_slice(&0i32.to_be_bytes());
                }
            }
            Insn::Raw(bytes) => code.extend_from_slice(bytes),
            Insn::Return => code.push(0xb1),
        }
    }

    let mut out = Vec::new();
    push_u16(&mut out, 8); // max_stack
    push_u16(&mut out, 8); // max_locals
    push_u32(&mut out, code.len() as u32);
    out.extend_from_slice(&code);
    push_u16(&mut out, 0); // exception_table_length

    let mut attributes = Vec::new();
    if !lines.is_empty() {
        let mut table = Vec::new();
        push_u16(&mut table, lines.len() as u16);
        for (start_pc, line) in &lines {
            push_u16(&mut table, *start_pc);
            push_u16(&mut table, *line);
        }
        attributes.push((pool.utf8("LineNumberTable"), table));
    }
    write_attributes(&mut out, attributes);

    (pool.utf8("Code"), out)
}

fn emit_ref(
    pool: &mut ConstantPoolWriter,
    code: &mut Vec<u8>,
    opcode: u8,
    kind: RefKind,
    r: &MemberRefSpec,
) {
    code.push(opcode);
    let index = pool.member_ref(kind, &r.owner, &r.name, &r.descriptor);
    push_u16(code, index);
}

/// Pads after a switch opcode so operands start at a multiple of four.
fn pad_switch(code: &mut Vec<u8>) {
    while code.len() % 4 != 0 {
        code.push(0);
    }
}

fn write_attributes(out: &mut Vec<u8>, attributes: Vec<(u16, Vec<u8>)>) {
    push_u16(out, attributes.len() as u16);
    for (name, body) in attributes {
        push_u16(out, name);
        push_u32(out, body.len() as u32);
        out.extend_from_slice(&body);
    }
}

fn internal(name: &str) -> String {
    if name.starts_with('[') {
        name.to_string()
    } else {
        name.replace('.', "/")
    }
}

fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
