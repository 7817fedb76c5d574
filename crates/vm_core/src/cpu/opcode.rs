//! Opcode table (§4.4, §6).
//!
//! Every opcode is generated from one source-of-truth list via [`opcodes!`] below, so
//! the (name, operand-kind) pairing can't drift the way copy-pasted match arms would.
//! `Inv = 0` is reserved so a zero-initialised RAM cell never decodes to a legal
//! instruction (§6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// The operand word itself is the value.
    Imm,
    /// The operand word is a register index 0–17.
    Reg,
    /// The operand word is a byte address.
    Mem,
}

macro_rules! opcodes {
    ( $( $name:ident => [$($kind:ident),*] ),* $(,)? ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(i32)]
        pub enum Opcode {
            Inv = 0,
            $( $name, )*
        }

        impl Opcode {
            /// Decode an opcode word. Returns `None` for any value not naming a
            /// variant below, a fault the caller raises as invalid-access.
            pub fn from_word(word: i32) -> Option<Opcode> {
                if word == Opcode::Inv as i32 {
                    return Some(Opcode::Inv);
                }
                $(
                    if word == Opcode::$name as i32 {
                        return Some(Opcode::$name);
                    }
                )*
                None
            }

            /// Operand kinds, in the order they must be read from the instruction
            /// stream. Destination is always first (§4.4).
            pub fn operand_kinds(self) -> &'static [OperandKind] {
                use OperandKind::*;
                match self {
                    Opcode::Inv => &[],
                    $( Opcode::$name => &[$($kind),*], )*
                }
            }

            /// Number of operand words this opcode consumes.
            pub fn operand_count(self) -> usize {
                self.operand_kinds().len()
            }
        }
    };
}

opcodes! {
    // --- MOV family ---
    MovRI => [Reg, Imm],
    MovRR => [Reg, Reg],
    MovRM => [Reg, Mem],
    MovMI => [Mem, Imm],
    MovMR => [Mem, Reg],
    MovMM => [Mem, Mem],

    // --- Stack ---
    PushI => [Imm],
    PushR => [Reg],
    PushM => [Mem],
    PopR => [Reg],
    PopM => [Mem],

    // --- Calls ---
    CallI => [Imm],
    CallR => [Reg],
    CallM => [Mem],
    Ret => [],

    // --- Arithmetic ---
    IncR => [Reg],
    IncM => [Mem],
    DecR => [Reg],
    DecM => [Mem],

    AddRI => [Reg, Imm],
    AddRR => [Reg, Reg],
    AddRM => [Reg, Mem],
    AddMI => [Mem, Imm],
    AddMR => [Mem, Reg],
    AddMM => [Mem, Mem],

    SubRI => [Reg, Imm],
    SubRR => [Reg, Reg],
    SubRM => [Reg, Mem],
    SubMI => [Mem, Imm],
    SubMR => [Mem, Reg],
    SubMM => [Mem, Mem],

    MulRI => [Reg, Imm],
    MulRR => [Reg, Reg],
    MulRM => [Reg, Mem],
    MulMI => [Mem, Imm],
    MulMR => [Mem, Reg],
    MulMM => [Mem, Mem],

    DivRI => [Reg, Imm],
    DivRR => [Reg, Reg],
    DivRM => [Reg, Mem],
    DivMI => [Mem, Imm],
    DivMR => [Mem, Reg],
    DivMM => [Mem, Mem],

    ModRI => [Reg, Imm],
    ModRR => [Reg, Reg],
    ModRM => [Reg, Mem],
    ModMI => [Mem, Imm],
    ModMR => [Mem, Reg],
    ModMM => [Mem, Mem],

    RemR => [Reg],
    RemM => [Mem],

    // --- Logic ---
    NotR => [Reg],
    NotM => [Mem],

    XorRI => [Reg, Imm],
    XorRR => [Reg, Reg],
    XorRM => [Reg, Mem],
    XorMI => [Mem, Imm],
    XorMR => [Mem, Reg],
    XorMM => [Mem, Mem],

    OrRI => [Reg, Imm],
    OrRR => [Reg, Reg],
    OrRM => [Reg, Mem],
    OrMI => [Mem, Imm],
    OrMR => [Mem, Reg],
    OrMM => [Mem, Mem],

    AndRI => [Reg, Imm],
    AndRR => [Reg, Reg],
    AndRM => [Reg, Mem],
    AndMI => [Mem, Imm],
    AndMR => [Mem, Reg],
    AndMM => [Mem, Mem],

    // --- Shifts ---
    ShlRI => [Reg, Imm],
    ShlRR => [Reg, Reg],
    ShlRM => [Reg, Mem],
    ShlMI => [Mem, Imm],
    ShlMR => [Mem, Reg],
    ShlMM => [Mem, Mem],

    ShrRI => [Reg, Imm],
    ShrRR => [Reg, Reg],
    ShrRM => [Reg, Mem],
    ShrMI => [Mem, Imm],
    ShrMR => [Mem, Reg],
    ShrMM => [Mem, Mem],

    // --- Compare ---
    CmpII => [Imm, Imm],
    CmpIR => [Imm, Reg],
    CmpIM => [Imm, Mem],
    CmpRI => [Reg, Imm],
    CmpRR => [Reg, Reg],
    CmpRM => [Reg, Mem],
    CmpMI => [Mem, Imm],
    CmpMR => [Mem, Reg],
    CmpMM => [Mem, Mem],

    // --- Jumps ---
    JmpI => [Imm],
    JmpR => [Reg],
    JmpM => [Mem],

    JeI => [Imm],
    JeR => [Reg],
    JeM => [Mem],

    JneI => [Imm],
    JneR => [Reg],
    JneM => [Mem],

    JgI => [Imm],
    JgR => [Reg],
    JgM => [Mem],

    JgeI => [Imm],
    JgeR => [Reg],
    JgeM => [Mem],

    JlI => [Imm],
    JlR => [Reg],
    JlM => [Mem],

    JleI => [Imm],
    JleR => [Reg],
    JleM => [Mem],

    // --- Print ---
    PrnII => [Imm],
    PrnIR => [Reg],
    PrnIM => [Mem],

    PrnSI => [Imm],
    PrnSR => [Reg],
    PrnSM => [Mem],

    // --- Software interrupt ---
    IntI => [Imm],
    IntR => [Reg],
    IntM => [Mem],

    // --- Pause ---
    PauseRZ => [Reg],
    PauseRNZ => [Reg],
    PauseMZ => [Mem],
    PauseMNZ => [Mem],

    // --- Halt ---
    Halt => [],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_opcode_is_reserved_at_zero() {
        assert_eq!(Opcode::Inv as i32, 0);
        assert_eq!(Opcode::from_word(0), Some(Opcode::Inv));
    }

    #[test]
    fn every_variant_round_trips_through_from_word() {
        for candidate in [
            Opcode::MovRI, Opcode::MovMM, Opcode::PushI, Opcode::PopM, Opcode::CallR,
            Opcode::Ret, Opcode::AddRI, Opcode::DivMM, Opcode::ModRR, Opcode::RemM,
            Opcode::NotR, Opcode::XorMI, Opcode::ShlRR, Opcode::CmpII, Opcode::JmpM,
            Opcode::JleI, Opcode::PrnII, Opcode::PrnSM, Opcode::IntR, Opcode::PauseMNZ,
            Opcode::Halt,
        ] {
            assert_eq!(Opcode::from_word(candidate as i32), Some(candidate));
        }
    }

    #[test]
    fn unknown_word_fails_to_decode() {
        assert_eq!(Opcode::from_word(i32::MAX), None);
    }

    #[test]
    fn operand_counts_match_the_family_shape() {
        assert_eq!(Opcode::MovRI.operand_count(), 2);
        assert_eq!(Opcode::Ret.operand_count(), 0);
        assert_eq!(Opcode::Halt.operand_count(), 0);
        assert_eq!(Opcode::PushI.operand_count(), 1);
        assert_eq!(Opcode::CmpMM.operand_count(), 2);
    }
}
