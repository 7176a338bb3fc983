//! Walks method bytecode and records the member references it makes.

use crate::constant_pool::{ConstantPool, MemberRefKind};
use crate::descriptor::{
    class_constant_to_type_name, parse_field_descriptor, parse_method_descriptor,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line: u16,
}

/// The instruction a [`MemberReference`] was recorded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    GetField,
    PutField,
    GetStatic,
    PutStatic,
    InvokeVirtual,
    InvokeSpecial,
    InvokeStatic,
    InvokeInterface,
}

impl ReferenceKind {
    fn from_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            GETSTATIC => ReferenceKind::GetStatic,
            PUTSTATIC => ReferenceKind::PutStatic,
            GETFIELD => ReferenceKind::GetField,
            PUTFIELD => ReferenceKind::PutField,
            INVOKEVIRTUAL => ReferenceKind::InvokeVirtual,
            INVOKESPECIAL => ReferenceKind::InvokeSpecial,
            INVOKESTATIC => ReferenceKind::InvokeStatic,
            INVOKEINTERFACE => ReferenceKind::InvokeInterface,
            _ => return None,
        })
    }

    pub fn is_field_access(self) -> bool {
        matches!(
            self,
            ReferenceKind::GetField
                | ReferenceKind::PutField
                | ReferenceKind::GetStatic
                | ReferenceKind::PutStatic
        )
    }

    pub fn is_write(self) -> bool {
        matches!(self, ReferenceKind::PutField | ReferenceKind::PutStatic)
    }
}

/// One field access or invocation found in a code body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberReference {
    pub kind: ReferenceKind,
    /// Type name of the declared owner (`com.example.Foo`, `int[]`).
    pub owner: String,
    /// The owner was referenced through an `InterfaceMethodref`.
    pub owner_is_interface: bool,
    pub name: String,
    pub descriptor: String,
    /// Parameter type names; empty for field accesses.
    pub parameter_types: Vec<String>,
    /// Field type, or return type (`void` included) for invocations.
    pub value_type: String,
    pub pc: u32,
    /// Source line, `0` if the body carries no line number table.
    pub line: u32,
}

impl MemberReference {
    pub fn is_constructor_call(&self) -> bool {
        self.kind == ReferenceKind::InvokeSpecial && self.name == "<init>"
    }
}

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

pub(crate) fn scan_references(
    code: &[u8],
    cp: &ConstantPool,
    lines: &[LineNumberEntry],
) -> Result<Vec<MemberReference>> {
    let mut sorted_lines = lines.to_vec();
    sorted_lines.sort_by_key(|entry| entry.start_pc);

    let mut out = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = code[pc];
        let len = instruction_len(code, pc)?;
        if pc + len > code.len() {
            return Err(Error::MalformedAttribute("Code"));
        }

        if let Some(kind) = ReferenceKind::from_opcode(opcode) {
            let index = u16::from_be_bytes([code[pc + 1], code[pc + 2]]);
            let member = cp.get_member_ref(index)?;
            let field_ref = member.kind == MemberRefKind::Field;
            if field_ref != kind.is_field_access() {
                return Err(Error::MalformedAttribute("Code"));
            }
            let (parameter_types, value_type) = if field_ref {
                (Vec::new(), parse_field_descriptor(&member.descriptor)?.java_name())
            } else {
                let method = parse_method_descriptor(&member.descriptor)?;
                (
                    method.params.iter().map(|param| param.java_name()).collect(),
                    method.return_type.java_name(),
                )
            };
            out.push(MemberReference {
                kind,
                owner: class_constant_to_type_name(&member.class_name)?,
                owner_is_interface: member.kind == MemberRefKind::InterfaceMethod,
                name: member.name,
                descriptor: member.descriptor,
                parameter_types,
                value_type,
                pc: pc as u32,
                line: line_for_pc(&sorted_lines, pc),
            });
        }

        pc += len;
    }
    Ok(out)
}

/// Line of the entry with the greatest `start_pc <= pc`; `0` when no entry
/// covers `pc`.
fn line_for_pc(sorted: &[LineNumberEntry], pc: usize) -> u32 {
    match sorted.partition_point(|entry| entry.start_pc as usize <= pc) {
        0 => 0,
        idx => sorted[idx - 1].line as u32,
    }
}

fn read_i4(code: &[u8], at: usize) -> Result<i32> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(Error::MalformedAttribute("Code"))
}

/// Length in bytes of the instruction starting at `pc`, operands included.
fn instruction_len(code: &[u8], pc: usize) -> Result<usize> {
    let opcode = code[pc];
    let len = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        0x12 => 2,
        0x13 | 0x14 => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let operands = pad(pc);
            let low = read_i4(code, operands + 4)?;
            let high = read_i4(code, operands + 8)?;
            if high < low {
                return Err(Error::MalformedAttribute("Code"));
            }
            let entries = (high as i64 - low as i64 + 1) as usize;
            operands - pc + 12 + entries * 4
        }
        LOOKUPSWITCH => {
            let operands = pad(pc);
            let npairs = read_i4(code, operands + 4)?;
            if npairs < 0 {
                return Err(Error::MalformedAttribute("Code"));
            }
            operands - pc + 8 + npairs as usize * 8
        }
        0xac..=0xb1 => 1,
        0xb2..=0xb8 => 3,
        0xb9 | 0xba => 5,
        0xbb => 3,
        0xbc => 2,
        0xbd => 3,
        0xbe | 0xbf => 1,
        0xc0 | 0xc1 => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(Error::MalformedAttribute("Code")),
        },
        0xc5 => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        0xca | 0xfe | 0xff => 1,
        _ => return Err(Error::InvalidOpcode { opcode, pc }),
    };
    Ok(len)
}

/// Offset of the first switch operand: the opcode is followed by 0-3 bytes of
/// padding so that operands start at a multiple of four from the code start.
fn pad(pc: usize) -> usize {
    (pc + 4) & !3
}
