use crate::annotation::{parse_annotations, Annotation};
use crate::code::{scan_references, LineNumberEntry, MemberReference};
use crate::constant_pool::ConstantPool;
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
use crate::error::{Error, Result, Section};
use crate::reader::Reader;

pub const CLASSFILE_MAGIC: u32 = 0xCAFEBABE;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal name, e.g. `com/example/Foo$Inner`.
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
    pub inner_classes: Vec<InnerClassInfo>,
    pub enclosing_method: Option<EnclosingMethod>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
    /// Internal names from the `Exceptions` attribute.
    pub exceptions: Vec<String>,
    pub code: Option<Code>,
}

#[derive(Debug, Clone)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub line_numbers: Vec<LineNumberEntry>,
    pub references: Vec<MemberReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: String,
    /// Name and descriptor, absent for classes declared in initializers.
    pub method: Option<(String, String)>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let (minor_version, major_version) =
            parse_header(&mut reader).map_err(|e| e.in_section(Section::Header, 0))?;

        let cp_start = reader.offset();
        let cp = ConstantPool::parse(&mut reader)
            .map_err(|e| e.in_section(Section::ConstantPool, cp_start))?;

        let info_start = reader.offset();
        let (access_flags, this_class, super_class) = parse_class_info(&mut reader, &cp)
            .map_err(|e| e.in_section(Section::ClassInfo, info_start))?;

        let interfaces_start = reader.offset();
        let interfaces = parse_interfaces(&mut reader, &cp)
            .map_err(|e| e.in_section(Section::Interfaces, interfaces_start))?;

        let fields = parse_members(&mut reader, &cp, MemberTable::Fields)?;
        let methods = parse_members(&mut reader, &cp, MemberTable::Methods)?;

        let attrs_start = reader.offset();
        let class_attrs = parse_attributes(&mut reader, &cp, AttributeTarget::Class)
            .and_then(|attrs| reader.ensure_empty().map(|()| attrs))
            .map_err(|e| e.in_section(Section::ClassAttributes, attrs_start))?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: class_attrs.signature,
            source_file: class_attrs.source_file,
            runtime_visible_annotations: class_attrs.runtime_visible_annotations,
            runtime_invisible_annotations: class_attrs.runtime_invisible_annotations,
            inner_classes: class_attrs.inner_classes,
            enclosing_method: class_attrs.enclosing_method,
        })
    }

    /// The `InnerClasses` entry describing this class itself, if it is nested.
    pub fn own_inner_class_entry(&self) -> Option<&InnerClassInfo> {
        self.inner_classes
            .iter()
            .find(|info| info.inner_class == self.this_class)
    }
}

fn parse_header(reader: &mut Reader<'_>) -> Result<(u16, u16)> {
    let magic = reader.read_u4()?;
    if magic != CLASSFILE_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    Ok((minor_version, major_version))
}

fn parse_class_info(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<(u16, String, Option<String>)> {
    let access_flags = reader.read_u2()?;
    let this_class = cp.get_class_name(reader.read_u2()?)?;
    let super_class_idx = reader.read_u2()?;
    let super_class = if super_class_idx == 0 {
        None
    } else {
        Some(cp.get_class_name(super_class_idx)?)
    };
    Ok((access_flags, this_class, super_class))
}

fn parse_interfaces(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<String>> {
    let interfaces_count = reader.read_u2()? as usize;
    let mut interfaces = Vec::with_capacity(interfaces_count);
    for _ in 0..interfaces_count {
        interfaces.push(cp.get_class_name(reader.read_u2()?)?);
    }
    Ok(interfaces)
}

#[derive(Clone, Copy)]
enum MemberTable {
    Fields,
    Methods,
}

impl MemberTable {
    fn section(self, index: u16) -> Section {
        match self {
            MemberTable::Fields => Section::Field(index),
            MemberTable::Methods => Section::Method(index),
        }
    }
}

fn parse_members(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    table: MemberTable,
) -> Result<Vec<ClassMember>> {
    let count_start = reader.offset();
    let count = reader
        .read_u2()
        .map_err(|e| e.in_section(table.section(0), count_start))? as usize;

    let mut members = Vec::with_capacity(count);
    for index in 0..count {
        let start = reader.offset();
        let member = parse_member(reader, cp, table)
            .map_err(|e| e.in_section(table.section(index as u16), start))?;
        members.push(member);
    }
    Ok(members)
}

fn parse_member(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    table: MemberTable,
) -> Result<ClassMember> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    match table {
        MemberTable::Fields => {
            parse_field_descriptor(&descriptor)?;
        }
        MemberTable::Methods => {
            parse_method_descriptor(&descriptor)?;
        }
    }

    let attrs = parse_attributes(reader, cp, AttributeTarget::Member)?;
    Ok(ClassMember {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        runtime_visible_annotations: attrs.runtime_visible_annotations,
        runtime_invisible_annotations: attrs.runtime_invisible_annotations,
        exceptions: attrs.exceptions,
        code: attrs.code,
    })
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    source_file: Option<String>,
    runtime_visible_annotations: Vec<Annotation>,
    runtime_invisible_annotations: Vec<Annotation>,
    inner_classes: Vec<InnerClassInfo>,
    enclosing_method: Option<EnclosingMethod>,
    exceptions: Vec<String>,
    code: Option<Code>,
    line_numbers: Vec<LineNumberEntry>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AttributeTarget {
    Class,
    Member,
    Code,
}

fn parse_attributes(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    target: AttributeTarget,
) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let mut sub = reader.sub_reader(length)?;
        let name = cp.get_utf8(name_index)?;

        match (name, target) {
            ("Signature", AttributeTarget::Class | AttributeTarget::Member) => {
                let sig_index = sub.read_u2()?;
                parsed.signature = Some(cp.get_utf8(sig_index)?.to_string());
                sub.ensure_empty()?;
            }
            ("SourceFile", AttributeTarget::Class) => {
                let index = sub.read_u2()?;
                parsed.source_file = Some(cp.get_utf8(index)?.to_string());
                sub.ensure_empty()?;
            }
            ("RuntimeVisibleAnnotations", AttributeTarget::Class | AttributeTarget::Member) => {
                let anns = parse_annotations(&mut sub, cp, "RuntimeVisibleAnnotations")?;
                parsed.runtime_visible_annotations.extend(anns);
                sub.ensure_empty()?;
            }
            ("RuntimeInvisibleAnnotations", AttributeTarget::Class | AttributeTarget::Member) => {
                let anns = parse_annotations(&mut sub, cp, "RuntimeInvisibleAnnotations")?;
                parsed.runtime_invisible_annotations.extend(anns);
                sub.ensure_empty()?;
            }
            ("InnerClasses", AttributeTarget::Class) => {
                let num = sub.read_u2()? as usize;
                let mut inners = Vec::with_capacity(num);
                for _ in 0..num {
                    let inner_class_info_index = sub.read_u2()?;
                    let outer_class_info_index = sub.read_u2()?;
                    let inner_name_index = sub.read_u2()?;
                    let inner_access_flags = sub.read_u2()?;

                    let inner_class = cp.get_class_name(inner_class_info_index)?;
                    let outer_class = if outer_class_info_index == 0 {
                        None
                    } else {
                        Some(cp.get_class_name(outer_class_info_index)?)
                    };
                    let inner_name = if inner_name_index == 0 {
                        None
                    } else {
                        Some(cp.get_utf8(inner_name_index)?.to_string())
                    };

                    inners.push(InnerClassInfo {
                        inner_class,
                        outer_class,
                        inner_name,
                        access_flags: inner_access_flags,
                    });
                }
                parsed.inner_classes.extend(inners);
                sub.ensure_empty()?;
            }
            ("EnclosingMethod", AttributeTarget::Class) => {
                let class = cp.get_class_name(sub.read_u2()?)?;
                let method_index = sub.read_u2()?;
                let method = if method_index == 0 {
                    None
                } else {
                    let (name, descriptor) = cp.get_name_and_type(method_index)?;
                    Some((name.to_string(), descriptor.to_string()))
                };
                parsed.enclosing_method = Some(EnclosingMethod { class, method });
                sub.ensure_empty()?;
            }
            ("Exceptions", AttributeTarget::Member) => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    parsed.exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
                sub.ensure_empty()?;
            }
            ("Code", AttributeTarget::Member) => {
                parsed.code = Some(parse_code(&mut sub, cp)?);
                sub.ensure_empty()?;
            }
            ("LineNumberTable", AttributeTarget::Code) => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    let start_pc = sub.read_u2()?;
                    let line = sub.read_u2()?;
                    parsed.line_numbers.push(LineNumberEntry { start_pc, line });
                }
                sub.ensure_empty()?;
            }
            _ => {
                // Unknown attribute: intentionally skipped.
            }
        }
    }

    Ok(parsed)
}

fn parse_code(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Code> {
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let bytecode = reader.read_bytes(code_length)?;

    let exception_table_length = reader.read_u2()? as usize;
    // start_pc, end_pc, handler_pc, catch_type
    reader.read_bytes(exception_table_length * 8)?;

    let attrs = parse_attributes(reader, cp, AttributeTarget::Code)?;
    let references = scan_references(bytecode, cp, &attrs.line_numbers)?;

    Ok(Code {
        max_stack,
        max_locals,
        line_numbers: attrs.line_numbers,
        references,
    })
}
