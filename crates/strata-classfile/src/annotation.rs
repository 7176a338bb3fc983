use crate::constant_pool::{ConstantPool, CpInfo};
use crate::descriptor::{parse_field_descriptor, FieldType};
use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_descriptor: String,
    /// Binary name of the annotation type, e.g. `com.example.Marker`.
    pub type_name: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub(crate) fn parse(
        reader: &mut Reader<'_>,
        cp: &ConstantPool,
        attribute: &'static str,
    ) -> Result<Self> {
        let type_index = reader.read_u2()?;
        let type_descriptor = cp.get_utf8(type_index)?.to_string();
        let type_name =
            descriptor_to_type_name(&type_descriptor).ok_or(Error::MalformedAttribute(attribute))?;

        let num_element_value_pairs = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(num_element_value_pairs);
        for _ in 0..num_element_value_pairs {
            let element_name_index = reader.read_u2()?;
            let name = cp.get_utf8(element_name_index)?.to_string();
            let value = ElementValue::parse(reader, cp, attribute)?;
            elements.push((name, value));
        }

        Ok(Self {
            type_descriptor,
            type_name,
            elements,
        })
    }

    pub fn value(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find_map(|(element, value)| (element == name).then_some(value))
    }

    /// Every type this annotation names: its own type, enum constant types,
    /// class literals, and the same for nested annotations.
    pub fn referenced_type_names(&self) -> Vec<&str> {
        let mut out = vec![self.type_name.as_str()];
        for (_, value) in &self.elements {
            value.collect_type_names(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        /// Binary name of the enum type.
        type_name: String,
        const_name: String,
    },
    /// Type name of a class literal (`java.lang.Object`, `int[]`, `void`).
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool, attribute: &'static str) -> Result<Self> {
        let tag = reader.read_u1()? as char;
        match tag {
            'B' | 'C' | 'I' | 'S' | 'Z' => {
                let idx = reader.read_u2()?;
                let value = match cp.get(idx)? {
                    CpInfo::Integer(v) => *v,
                    other => {
                        return Err(Error::ConstantPoolTypeMismatch {
                            index: idx,
                            expected: "Integer",
                            found: other.kind(),
                        })
                    }
                };

                let cv = match tag {
                    'B' => ConstValue::Byte(value as i8),
                    'C' => ConstValue::Char(value as u16),
                    'I' => ConstValue::Int(value),
                    'S' => ConstValue::Short(value as i16),
                    _ => ConstValue::Boolean(value != 0),
                };
                Ok(ElementValue::Const(cv))
            }
            'D' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Double(v) => Ok(ElementValue::Const(ConstValue::Double(*v))),
                    other => Err(Error::ConstantPoolTypeMismatch {
                        index: idx,
                        expected: "Double",
                        found: other.kind(),
                    }),
                }
            }
            'F' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Float(v) => Ok(ElementValue::Const(ConstValue::Float(*v))),
                    other => Err(Error::ConstantPoolTypeMismatch {
                        index: idx,
                        expected: "Float",
                        found: other.kind(),
                    }),
                }
            }
            'J' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Long(v) => Ok(ElementValue::Const(ConstValue::Long(*v))),
                    other => Err(Error::ConstantPoolTypeMismatch {
                        index: idx,
                        expected: "Long",
                        found: other.kind(),
                    }),
                }
            }
            's' => {
                let idx = reader.read_u2()?;
                let value = cp.get_string_constant(idx)?;
                Ok(ElementValue::Const(ConstValue::String(value)))
            }
            'e' => {
                let type_name_index = reader.read_u2()?;
                let const_name_index = reader.read_u2()?;
                let type_name = descriptor_to_type_name(cp.get_utf8(type_name_index)?)
                    .ok_or(Error::MalformedAttribute(attribute))?;
                Ok(ElementValue::Enum {
                    type_name,
                    const_name: cp.get_utf8(const_name_index)?.to_string(),
                })
            }
            'c' => {
                let class_info_index = reader.read_u2()?;
                let descriptor = cp.get_utf8(class_info_index)?;
                let name = if descriptor == "V" {
                    "void".to_string()
                } else {
                    parse_field_descriptor(descriptor)?.java_name()
                };
                Ok(ElementValue::Class(name))
            }
            '@' => Ok(ElementValue::Annotation(Box::new(Annotation::parse(
                reader, cp, attribute,
            )?))),
            '[' => {
                let num_values = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(num_values);
                for _ in 0..num_values {
                    values.push(ElementValue::parse(reader, cp, attribute)?);
                }
                Ok(ElementValue::Array(values))
            }
            _ => Err(Error::MalformedAttribute(attribute)),
        }
    }

    fn collect_type_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ElementValue::Const(_) => {}
            ElementValue::Enum { type_name, .. } => out.push(type_name),
            ElementValue::Class(name) => out.push(name),
            ElementValue::Annotation(nested) => out.extend(nested.referenced_type_names()),
            ElementValue::Array(values) => {
                for value in values {
                    value.collect_type_names(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    /// A UTF-16 code unit; lone surrogates are valid `char` values.
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

/// `Lcom/example/Foo;` -> `com.example.Foo`.
pub fn descriptor_to_type_name(desc: &str) -> Option<String> {
    match parse_field_descriptor(desc).ok()? {
        FieldType::Object(internal) => Some(internal.replace('/', ".")),
        _ => None,
    }
}

pub(crate) fn parse_annotations(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    attribute: &'static str,
) -> Result<Vec<Annotation>> {
    let num = reader.read_u2()? as usize;
    let mut anns = Vec::with_capacity(num);
    for _ in 0..num {
        anns.push(Annotation::parse(reader, cp, attribute)?);
    }
    Ok(anns)
}
