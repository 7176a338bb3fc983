use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// The structural part of a class file an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    ConstantPool,
    ClassInfo,
    Interfaces,
    Field(u16),
    Method(u16),
    ClassAttributes,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => f.write_str("header"),
            Section::ConstantPool => f.write_str("constant pool"),
            Section::ClassInfo => f.write_str("class info"),
            Section::Interfaces => f.write_str("interfaces table"),
            Section::Field(index) => write!(f, "field #{index}"),
            Section::Method(index) => write!(f, "method #{index}"),
            Section::ClassAttributes => f.write_str("class attributes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnexpectedEof {
        offset: usize,
        needed: usize,
    },
    InvalidMagic(u32),
    InvalidConstantPoolIndex(u16),
    InvalidConstantPoolTag(u8),
    ConstantPoolTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
    InvalidModifiedUtf8,
    InvalidDescriptor(String),
    InvalidOpcode {
        opcode: u8,
        pc: usize,
    },
    TrailingBytes {
        offset: usize,
        remaining: usize,
    },
    MalformedAttribute(&'static str),
    Other(&'static str),
    /// Wraps an error with the section it occurred in and the byte offset at
    /// which that section starts.
    InSection {
        section: Section,
        offset: usize,
        source: Box<Error>,
    },
}

impl Error {
    /// Attaches section information unless the error already carries it.
    ///
    /// The innermost section is the most precise, so it is never replaced.
    pub(crate) fn in_section(self, section: Section, offset: usize) -> Self {
        match self {
            Error::InSection { .. } => self,
            other => Error::InSection {
                section,
                offset,
                source: Box::new(other),
            },
        }
    }

    pub fn section(&self) -> Option<Section> {
        match self {
            Error::InSection { section, .. } => Some(*section),
            _ => None,
        }
    }

    /// Byte offset identifying where the input went wrong, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEof { offset, .. } | Error::TrailingBytes { offset, .. } => {
                Some(*offset)
            }
            Error::InSection { offset, source, .. } => source.offset().or(Some(*offset)),
            _ => None,
        }
    }

    /// The underlying error, with section wrapping stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::InSection { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof { offset, needed } => write!(
                f,
                "unexpected end of input at offset {offset} (needed {needed} more bytes)"
            ),
            Error::InvalidMagic(magic) => write!(f, "invalid classfile magic: 0x{magic:08x}"),
            Error::InvalidConstantPoolIndex(index) => {
                write!(f, "invalid constant pool index: {index}")
            }
            Error::InvalidConstantPoolTag(tag) => write!(f, "invalid constant pool tag: {tag}"),
            Error::ConstantPoolTypeMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "constant pool type mismatch at index {index}: expected {expected}, found {found}"
            ),
            Error::InvalidModifiedUtf8 => write!(f, "invalid modified UTF-8 constant"),
            Error::InvalidDescriptor(desc) => write!(f, "invalid descriptor: {desc}"),
            Error::InvalidOpcode { opcode, pc } => {
                write!(f, "invalid opcode 0x{opcode:02x} at pc {pc}")
            }
            Error::TrailingBytes { offset, remaining } => {
                write!(f, "{remaining} trailing bytes at offset {offset}")
            }
            Error::MalformedAttribute(name) => write!(f, "malformed {name} attribute"),
            Error::Other(msg) => f.write_str(msg),
            Error::InSection {
                section,
                offset,
                source,
            } => write!(f, "in {section} (starting at offset {offset}): {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InSection { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
