use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Synchronized,
    Volatile,
    Bridge,
    Transient,
    Varargs,
    Native,
    Abstract,
    Strict,
    Synthetic,
}

impl Modifier {
    const ALL: [Modifier; 14] = [
        Modifier::Public,
        Modifier::Protected,
        Modifier::Private,
        Modifier::Static,
        Modifier::Final,
        Modifier::Synchronized,
        Modifier::Volatile,
        Modifier::Bridge,
        Modifier::Transient,
        Modifier::Varargs,
        Modifier::Native,
        Modifier::Abstract,
        Modifier::Strict,
        Modifier::Synthetic,
    ];

    fn bit(self) -> u32 {
        1 << self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Synchronized => "synchronized",
            Modifier::Volatile => "volatile",
            Modifier::Bridge => "bridge",
            Modifier::Transient => "transient",
            Modifier::Varargs => "varargs",
            Modifier::Native => "native",
            Modifier::Abstract => "abstract",
            Modifier::Strict => "strictfp",
            Modifier::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an access-flag word belongs to.
///
/// Several flag bits are reused with a different meaning depending on
/// whether they sit on a class, a field or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierTarget {
    Class,
    Field,
    Method,
}

/// A set of [`Modifier`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u32);

const ACC_PUBLIC: u16 = 0x0001;
const ACC_PRIVATE: u16 = 0x0002;
const ACC_PROTECTED: u16 = 0x0004;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const ACC_SYNCHRONIZED: u16 = 0x0020;
const ACC_VOLATILE_OR_BRIDGE: u16 = 0x0040;
const ACC_TRANSIENT_OR_VARARGS: u16 = 0x0080;
const ACC_NATIVE: u16 = 0x0100;
const ACC_ABSTRACT: u16 = 0x0400;
const ACC_STRICT: u16 = 0x0800;
const ACC_SYNTHETIC: u16 = 0x1000;

impl Modifiers {
    pub const EMPTY: Modifiers = Modifiers(0);

    pub fn from_access_flags(flags: u16, target: ModifierTarget) -> Self {
        let mut out = Modifiers::EMPTY;
        let mut set = |bit: u16, modifier: Modifier| {
            if flags & bit != 0 {
                out.insert(modifier);
            }
        };

        set(ACC_PUBLIC, Modifier::Public);
        set(ACC_PRIVATE, Modifier::Private);
        set(ACC_PROTECTED, Modifier::Protected);
        set(ACC_STATIC, Modifier::Static);
        set(ACC_FINAL, Modifier::Final);
        set(ACC_ABSTRACT, Modifier::Abstract);
        set(ACC_SYNTHETIC, Modifier::Synthetic);

        match target {
            // 0x0020 is ACC_SUPER on classes and carries no modifier.
            ModifierTarget::Class => {}
            ModifierTarget::Field => {
                set(ACC_VOLATILE_OR_BRIDGE, Modifier::Volatile);
                set(ACC_TRANSIENT_OR_VARARGS, Modifier::Transient);
            }
            ModifierTarget::Method => {
                set(ACC_SYNCHRONIZED, Modifier::Synchronized);
                set(ACC_VOLATILE_OR_BRIDGE, Modifier::Bridge);
                set(ACC_TRANSIENT_OR_VARARGS, Modifier::Varargs);
                set(ACC_NATIVE, Modifier::Native);
                set(ACC_STRICT, Modifier::Strict);
            }
        }
        out
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL
            .into_iter()
            .filter(move |modifier| self.contains(*modifier))
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut out = Modifiers::EMPTY;
        for modifier in iter {
            out.insert(modifier);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_bits_depend_on_target() {
        let flags = ACC_PUBLIC | ACC_SYNCHRONIZED | ACC_VOLATILE_OR_BRIDGE | ACC_TRANSIENT_OR_VARARGS;

        let class = Modifiers::from_access_flags(flags, ModifierTarget::Class);
        assert_eq!(class.iter().collect::<Vec<_>>(), vec![Modifier::Public]);

        let field = Modifiers::from_access_flags(flags, ModifierTarget::Field);
        assert_eq!(
            field.iter().collect::<Vec<_>>(),
            vec![Modifier::Public, Modifier::Volatile, Modifier::Transient]
        );

        let method = Modifiers::from_access_flags(flags, ModifierTarget::Method);
        assert_eq!(
            method.iter().collect::<Vec<_>>(),
            vec![
                Modifier::Public,
                Modifier::Synchronized,
                Modifier::Bridge,
                Modifier::Varargs
            ]
        );
    }
}
